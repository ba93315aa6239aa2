use serde_derive::Deserialize;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use crate::error::ConfigError;

pub const DEFAULT_STREAM: &str = "https://ris-live.ripe.net/v1/stream/?format=json";
pub const DEFAULT_BMP_SERVER: &str = "localhost:5000";
pub const DEFAULT_BGP_ID: Ipv4Addr = Ipv4Addr::new(1, 1, 1, 1);
pub const DEFAULT_MAX_IN_FLIGHT: usize = 1024;
pub const DEFAULT_QUEUE_DEPTH: usize = 1024;

/// Bridge configuration as read from the config file or the command line.
/// Every key is optional; missing keys fall back to the defaults above.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub stream: Option<String>,
    pub bmp_server: Option<String>,
    pub bgp_id: Option<String>,
    pub max_in_flight: Option<usize>,
    pub queue_depth: Option<usize>,
}

/// Fully resolved configuration used by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub stream: String,
    pub bmp_server: String,
    pub bgp_id: Ipv4Addr,
    pub max_in_flight: usize,
    pub queue_depth: usize,
}

pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let c = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&c)?;
    Ok(config)
}

impl Config {
    /// Values set in `overrides` win over values set in `self`.
    pub fn merge(self, overrides: Config) -> Config {
        Config {
            stream: overrides.stream.or(self.stream),
            bmp_server: overrides.bmp_server.or(self.bmp_server),
            bgp_id: overrides.bgp_id.or(self.bgp_id),
            max_in_flight: overrides.max_in_flight.or(self.max_in_flight),
            queue_depth: overrides.queue_depth.or(self.queue_depth),
        }
    }

    pub fn settings(self) -> Result<Settings, ConfigError> {
        let bgp_id = match self.bgp_id {
            Some(id) => id
                .parse::<Ipv4Addr>()
                .map_err(|_| ConfigError::Invalid(format!("bgp_id {} is not an IPv4 address", id)))?,
            None => DEFAULT_BGP_ID,
        };

        let max_in_flight = match self.max_in_flight {
            Some(0) => return Err(ConfigError::Invalid("max_in_flight must be non-zero".into())),
            Some(n) => n,
            None => DEFAULT_MAX_IN_FLIGHT,
        };

        let queue_depth = match self.queue_depth {
            Some(0) => return Err(ConfigError::Invalid("queue_depth must be non-zero".into())),
            Some(n) => n,
            None => DEFAULT_QUEUE_DEPTH,
        };

        Ok(Settings {
            stream: self.stream.unwrap_or_else(|| DEFAULT_STREAM.to_string()),
            bmp_server: self
                .bmp_server
                .unwrap_or_else(|| DEFAULT_BMP_SERVER.to_string()),
            bgp_id,
            max_in_flight,
            queue_depth,
        })
    }
}
