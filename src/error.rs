use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to decode streamed message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid peer address: {0}")]
    Address(String),

    #[error("BMP message length {0} does not fit the common header")]
    Encode(usize),

    #[error("Failed to build BMP header: {0}")]
    Build(String),

    #[error("Failed to write to BMP collector: {0}")]
    Write(#[source] io::Error),

    #[error("Failed to read from RIS stream: {0}")]
    Stream(#[source] io::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Forwarder is no longer accepting frames")]
    ForwarderClosed,

    #[error("Translation task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config: {0}")]
    Io(#[from] io::Error),
}
