mod action;
mod caps;
mod data;
mod error;
mod frame;
mod handler;
mod version;

pub use self::action::{Action, Scope};
pub use self::caps::Capability;
pub use self::data::Typed;
pub use self::error::Error;
pub use self::frame::{
    agent::{Ack as AgentAck, Disconnect as AgentDisconnect, Hello as AgentHello},
    haproxy::{Disconnect as HaproxyDisconnect, Hello as HaproxyHello, Notify as HaproxyNotify},
    BufCodec, Codec, Disconnect, Frame, FrameId, Framer, Message, Reassembly, StreamId,
    MAX_FRAME_SIZE,
};
pub use self::handler::AsyncHandler;
pub use self::version::Version;
