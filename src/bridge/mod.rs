// File: src/bridge/mod.rs
//
// Translation pipeline between the RIS stream and the BMP collector.

mod dispatcher;
mod forwarder;
mod translate;

pub use dispatcher::{DispatchStats, Dispatcher};
pub use forwarder::{Forwarder, FrameSender};
pub use translate::{build_per_peer_header, decode_payload, translate};
