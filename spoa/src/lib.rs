#[macro_use]
extern crate tracing;

pub use haproxy_spop as spop;

mod conn;
mod error;
mod runtime;
mod server;
mod state;

pub use self::conn::Connection;
pub use self::error::{Context, Error, Result};
pub use self::runtime::{Acker, Builder, Dispatcher, Processor, Runtime};
pub use self::server::Server;
pub use self::state::{AsyncHandler, State};
