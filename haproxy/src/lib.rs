#[macro_use]
extern crate tracing;

pub use haproxy_rules as rules;
pub use haproxy_server as server;
pub use haproxy_spoe as spoe;

mod cli;
mod error;
mod model;

pub use self::cli::{Directory, Response};
pub use self::error::{Context, Error, Result};
pub use self::model::{ChannelBuffer, Connection, ConnectionId, Session, SessionId, Stream, StreamId};
