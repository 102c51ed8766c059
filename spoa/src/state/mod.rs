mod connect;
mod handshake;
mod process;
mod state;

pub use self::connect::Connecting;
pub use self::handshake::Negotiated;
pub use self::process::Processing;
pub use self::state::{AsyncHandler, State};
