use std::{
    error::Error as StdError,
    fmt::{Debug, Display},
    result::Result as StdResult,
};

use thiserror::Error;

pub type Result<T> = StdResult<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed command: {0}")]
    BadCommand(String),

    #[error("unknown backend/server {0}")]
    UnknownServer(String),

    #[error(transparent)]
    Server(#[from] haproxy_server::Error),

    #[error(transparent)]
    Rules(#[from] haproxy_rules::Error),

    #[error("{context}, {source}")]
    Context {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
        context: Box<dyn Reason>,
    },
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
