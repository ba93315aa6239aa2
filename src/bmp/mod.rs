// Re-export types from submodules
pub use self::codec::*;
pub use self::frame::*;
pub use self::headers::*;
pub use self::types::*;

// Declare submodules
mod codec;
mod frame;
mod headers;
mod types;
