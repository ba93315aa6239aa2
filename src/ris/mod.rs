pub use self::messages::*;
pub use self::source::*;

mod messages;
mod source;
