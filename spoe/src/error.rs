use std::{
    error::Error as StdError,
    fmt::{Debug, Display},
    result::Result as StdResult,
};

use thiserror::Error;

pub type Result<T> = StdResult<T, Error>;

/// Errors raised by the engine side of a SPOE exchange.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Status(#[from] haproxy_spop::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// no backend server is currently UP for this agent
    #[error("resource allocation error, no server available")]
    NoServerAvailable,

    /// `frame_id`/`stream_id` on an ACK didn't match any waiting context
    #[error("frame-id not found")]
    FrameIdNotFound,

    /// the context's `process_exp` deadline elapsed
    #[error("processing timed out")]
    ProcessingTimeout,

    /// the per-stream events-per-second cap was exceeded
    #[error("events-per-second limit exceeded")]
    RateLimited,

    #[error("{context}, {source}")]
    Context {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
        context: Box<dyn Reason>,
    },
}

impl Error {
    /// Maps this error onto the status code carried in a DISCONNECT frame.
    pub fn status(&self) -> haproxy_spop::Error {
        match self {
            Error::Status(status) => *status,
            Error::NoServerAvailable => haproxy_spop::Error::ResourceAllocErr,
            Error::FrameIdNotFound => haproxy_spop::Error::FrameIdNotFound,
            Error::ProcessingTimeout => haproxy_spop::Error::Timeout,
            Error::Context { source, .. } => source
                .downcast_ref::<Error>()
                .map(Error::status)
                .unwrap_or(haproxy_spop::Error::Unknown),
            _ => haproxy_spop::Error::Unknown,
        }
    }
}

pub trait Reason: Display + Debug + Send + Sync + 'static {}

impl Reason for &'static str {}
impl Reason for String {}

pub trait Context<T, E> {
    fn context<C>(self, context: C) -> StdResult<T, Error>
    where
        C: Reason;

    fn with_context<C, F>(self, f: F) -> StdResult<T, Error>
    where
        C: Reason,
        F: FnOnce() -> C;
}

impl<T, E> Context<T, E> for StdResult<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, reason: C) -> StdResult<T, Error>
    where
        C: Reason,
    {
        self.map_err(|err| Error::Context {
            source: Box::new(err),
            context: Box::new(reason),
        })
    }

    fn with_context<C, F>(self, f: F) -> StdResult<T, Error>
    where
        C: Reason,
        F: FnOnce() -> C,
    {
        self.map_err(|err| Error::Context {
            source: Box::new(err),
            context: Box::new(f()),
        })
    }
}
