use std::error::Error as StdError;
use std::sync::Arc;

use derive_more::derive::From;
use tower::MakeService;

use crate::{
    error::Result,
    runtime::Runtime,
    spop::{Action, Frame, Message},
    state::{Connecting, Processing},
};

pub trait AsyncHandler<S, T> {
    async fn handle_frame(self, frame: Frame) -> Result<(State<S, T>, Option<Frame>)>;
}

#[derive(Debug, From)]
pub enum State<S, T>
where
    S: MakeService<T, Vec<Message>, Response = Vec<Action>>,
{
    Connecting(Connecting<S, T>),
    Processing(Processing<S, T>),
    #[from(skip)]
    Disconnecting,
    #[from(skip)]
    Disconnected,
}

impl<S, T> State<S, T>
where
    S: MakeService<T, Vec<Message>, Response = Vec<Action>>,
{
    pub fn new(runtime: Arc<Runtime<S, T>>) -> Self {
        State::Connecting(Connecting::new(runtime))
    }
}

impl<S, T> AsyncHandler<S, T> for State<S, T>
where
    S: MakeService<T, Vec<Message>, Response = Vec<Action>>,
    S::MakeError: StdError + Send + Sync + 'static,
    S::Error: std::fmt::Display + Send + Sync + 'static,
    T: Clone,
{
    async fn handle_frame(self, frame: Frame) -> Result<(State<S, T>, Option<Frame>)> {
        match self {
            State::Connecting(connecting) => connecting.handle_frame(frame).await,
            State::Processing(processing) => processing.handle_frame(frame).await,
            State::Disconnecting | State::Disconnected => Ok((State::Disconnected, None)),
        }
    }
}
