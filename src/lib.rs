//! Bridge from the RIPE RIS Live JSON stream to a BMP collector.
//!
//! Every BGP UPDATE seen on the stream is re-encoded as a BMP Route
//! Monitoring message and written to a single TCP connection.

pub mod bmp;
pub mod bridge;
pub mod config;
pub mod error;
pub mod ris;
