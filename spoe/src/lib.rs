#[macro_use]
extern crate tracing;

pub use haproxy_spop as spop;

mod agent;
mod applet;
mod buffer;
mod context;
mod error;
mod runtime;

pub use self::agent::{Agent, Builder as AgentBuilder};
pub use self::applet::{AckSink, Applet, Negotiated, Notification, State as AppletState};
pub use self::buffer::{Buffer, BufferPool, BufferWaiter};
pub use self::context::{
    Context as SpoeContext, Contexts, Flags as ContextFlags, FrameId, Outcome,
    State as ContextState, StreamHandle, StreamId,
};
pub use self::error::{Context, Error, Result};
pub use self::runtime::{AgentRuntime, AppletId, Decision};
