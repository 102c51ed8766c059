use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};
use tower::MakeService;
use tracing::instrument;

use crate::{
    conn::Connection,
    runtime::Runtime,
    spop::{Action, Message, MAX_FRAME_SIZE},
};

/// Accepts SPOE connections and drives each one against a shared [`Runtime`].
#[derive(Debug)]
pub struct Server<S, T>
where
    S: MakeService<T, Vec<Message>, Response = Vec<Action>>,
{
    listener: TcpListener,
    runtime: Arc<Runtime<S, T>>,
    max_frame_size: usize,
}

impl<S, T> Server<S, T>
where
    S: MakeService<T, Vec<Message>, Response = Vec<Action>>,
{
    pub async fn bind<A: ToSocketAddrs>(addr: A, runtime: Arc<Runtime<S, T>>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;

        Ok(Server {
            listener,
            runtime,
            max_frame_size: MAX_FRAME_SIZE,
        })
    }

    pub fn max_frame_size(mut self, sz: usize) -> Self {
        self.max_frame_size = sz;
        self
    }

    #[instrument(skip(self), err, level = "debug")]
    pub async fn serve(&self) -> io::Result<()>
    where
        S: Send + Sync + 'static,
        S::Service: Send,
        S::Future: Send,
        S::MakeError: StdError + Send + Sync + 'static,
        S::Error: fmt::Display + Send + Sync + 'static,
        T: Clone + Send + 'static,
    {
        loop {
            let (io, peer) = self.listener.accept().await?;

            debug!(%peer, "agent accepted");

            let runtime = self.runtime.clone();
            let max_frame_size = self.max_frame_size;

            tokio::spawn(async move {
                let mut conn = Connection::new(runtime, io, max_frame_size);

                if let Err(err) = conn.serve().await {
                    debug!(%peer, %err, "connection closed");
                }
            });
        }
    }
}
