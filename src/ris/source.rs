use std::io::{self, BufRead, BufReader, Read};
use std::thread;
use tokio::sync::mpsc;

use crate::error::BridgeError;

pub type Line = Result<Vec<u8>, BridgeError>;

/// Newline-delimited records read from a blocking reader on a dedicated
/// thread. The sequence ends with exactly one error: either the read failure
/// or an end-of-stream error once the body closes.
#[derive(Debug)]
pub struct LineSource {
    rx: mpsc::Receiver<Line>,
}

impl LineSource {
    pub fn spawn<R>(reader: R, capacity: usize) -> Result<LineSource, BridgeError>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Line>(capacity);
        thread::Builder::new()
            .name("ris-reader".into())
            .spawn(move || read_lines(BufReader::new(reader), tx))
            .map_err(BridgeError::Stream)?;
        Ok(LineSource { rx })
    }

    pub async fn next_line(&mut self) -> Line {
        match self.rx.recv().await {
            Some(line) => line,
            None => Err(BridgeError::Stream(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "line reader stopped",
            ))),
        }
    }
}

fn read_lines<R: BufRead>(mut reader: R, tx: mpsc::Sender<Line>) {
    loop {
        let mut line = Vec::new();
        let result = match reader.read_until(b'\n', &mut line) {
            Ok(_) if line.ends_with(b"\n") => Ok(line),
            // A trailing fragment without newline means the body ended.
            Ok(_) => Err(BridgeError::Stream(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "RIS stream closed",
            ))),
            Err(e) => Err(BridgeError::Stream(e)),
        };
        let done = result.is_err();
        if tx.blocking_send(result).is_err() || done {
            log::debug!("line reader exiting");
            return;
        }
    }
}

/// Open the RIS Live HTTP stream and return its body.
pub fn open_stream(url: &str) -> Result<Box<dyn Read + Send>, BridgeError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| BridgeError::Connection(format!("{}: {}", url, e)))?;
    log::info!("connected to RIS stream {} ({})", url, response.status());
    Ok(Box::new(response.into_reader()))
}
