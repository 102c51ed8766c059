use std::cmp;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use haproxy_spop::{
    Action, AgentAck, AgentHello, BufCodec, Capability, Codec, Error as Status, Frame, FrameId,
    Framer, HaproxyHello, HaproxyNotify, Message, StreamId, Version,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tracing::instrument;

use crate::error::{Context, Error, Result};

/// The engine-side applet's place in the lifecycle of a single TCP connection
/// to an agent, per the transition table this module implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// about to send HAPROXY-HELLO
    Connect,
    /// HAPROXY-HELLO sent, waiting for AGENT-HELLO
    Connecting,
    /// no context assigned, ready to pick up work from the queue
    Idle,
    /// draining the per-activation frame budget against assigned contexts
    Processing,
    /// mid-way through a fragmented NOTIFY, more fragments to send
    SendingFragNotify,
    /// a synchronous ACK has been requested and is outstanding
    WaitingSyncAck,
    /// about to send AGENT-DISCONNECT
    Disconnect,
    /// AGENT-DISCONNECT sent, waiting for the peer to close
    Disconnecting,
    /// connection torn down, applet may be recycled
    Exit,
    /// terminal; applet object is dropped
    End,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Exit | State::End)
    }
}

/// Parameters negotiated during the HELLO handshake, mirroring the subset of
/// the agent's reply HAProxy actually honors.
#[derive(Clone, Debug, PartialEq)]
pub struct Negotiated {
    pub version: Version,
    pub max_frame_size: u32,
    pub capabilities: Vec<Capability>,
}

impl Negotiated {
    pub fn supports_pipelining(&self) -> bool {
        self.capabilities.contains(&Capability::Pipelining)
    }

    pub fn supports_async(&self) -> bool {
        self.capabilities.contains(&Capability::Async)
    }

    pub fn supports_fragmentation(&self) -> bool {
        self.capabilities.contains(&Capability::Fragmentation)
    }
}

/// Negotiates against an AGENT-HELLO reply, the mirror image of the agent
/// side's `negotiate` (which starts from the HAPROXY-HELLO instead).
#[instrument(ret, err, level = "trace")]
fn negotiate(
    supported_versions: &[Version],
    max_frame_size: u32,
    capabilities: &[Capability],
    hello: AgentHello,
) -> Result<Negotiated> {
    if !supported_versions.contains(&hello.version) {
        return Err(Status::BadVersion.into());
    }

    let max_frame_size = cmp::min(hello.max_frame_size, max_frame_size);
    let capabilities = hello
        .capabilities
        .into_iter()
        .collect::<HashSet<_>>()
        .intersection(&capabilities.iter().copied().collect::<HashSet<_>>())
        .copied()
        .collect();

    Ok(Negotiated {
        version: hello.version,
        max_frame_size,
        capabilities,
    })
}

/// A NOTIFY waiting to be handed to the applet, queued by the runtime.
#[derive(Clone, Debug)]
pub struct Notification {
    pub stream_id: StreamId,
    pub frame_id: FrameId,
    pub messages: Vec<Message>,
}

/// Where a completed ACK's actions are delivered.
pub trait AckSink {
    fn ack(&mut self, stream_id: StreamId, frame_id: FrameId, actions: Vec<Action>, aborted: bool);
}

/// One TCP connection HAProxy holds open to an agent process, driving NOTIFY
/// frames out and routing ACKs back to whatever owns the originating context.
pub struct Applet<IO> {
    codec: BufCodec<IO>,
    state: State,
    negotiated: Option<Negotiated>,
    pending: VecDeque<Notification>,
    frames_per_activation: usize,
    engine_id: String,
}

impl<IO> Applet<IO>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: IO, max_frame_size: u32, engine_id: impl Into<String>) -> Self {
        Applet {
            codec: Codec::buffered(io, Framer::new(max_frame_size)),
            state: State::Connect,
            negotiated: None,
            pending: VecDeque::new(),
            frames_per_activation: 10,
            engine_id: engine_id.into(),
        }
    }

    pub fn frames_per_activation(mut self, n: usize) -> Self {
        self.frames_per_activation = n;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn negotiated(&self) -> Option<&Negotiated> {
        self.negotiated.as_ref()
    }

    /// Queues a NOTIFY to be sent the next time this applet drains its queue.
    pub fn queue(&mut self, notification: Notification) {
        self.pending.push_back(notification);
    }

    pub fn has_work(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Runs the CONNECT/CONNECTING handshake to completion.
    #[instrument(skip(self), err, level = "debug")]
    pub async fn handshake(
        &mut self,
        supported_versions: Vec<Version>,
        capabilities: Vec<Capability>,
        max_frame_size: u32,
        handshake_timeout: Duration,
    ) -> Result<()> {
        debug_assert_eq!(self.state, State::Connect);

        let hello = Frame::HaproxyHello(HaproxyHello {
            supported_versions: supported_versions.clone(),
            max_frame_size,
            capabilities: capabilities.clone(),
            healthcheck: Some(false),
            engine_id: Some(self.engine_id.clone()),
        });

        self.codec.write_frame(hello).await?;
        self.state = State::Connecting;

        let frame = timeout(handshake_timeout, self.codec.read_frame())
            .await
            .context("agent-hello")??;

        match frame {
            Frame::AgentHello(hello) => {
                let negotiated = negotiate(&supported_versions, max_frame_size, &capabilities, hello)?;

                debug!(?negotiated, "handshake complete");

                self.negotiated = Some(negotiated);
                self.state = State::Idle;

                Ok(())
            }
            Frame::AgentDisconnect(disconnect) => {
                Err(Error::Status(disconnect.status_code.try_into().unwrap_or(Status::Unknown)))
            }
            _ => Err(Status::Invalid.into()),
        }
    }

    /// Drains up to `frames_per_activation` queued NOTIFYs, then waits for and
    /// routes the matching ACKs to `sink`. Mirrors the IDLE/PROCESSING loop:
    /// an applet only ever carries one outstanding frame budget at a time.
    #[instrument(skip(self, sink), err, level = "trace")]
    pub async fn drive<S: AckSink>(&mut self, sink: &mut S) -> Result<()> {
        if self.pending.is_empty() {
            self.state = State::Idle;
            return Ok(());
        }

        self.state = State::Processing;

        let pipelining = self
            .negotiated
            .as_ref()
            .is_some_and(Negotiated::supports_pipelining);

        let mut sent = 0;

        while sent < self.frames_per_activation {
            let Some(notification) = self.pending.pop_front() else {
                break;
            };

            let frame = Frame::HaproxyNotify(HaproxyNotify {
                fragmented: false,
                stream_id: notification.stream_id,
                frame_id: notification.frame_id,
                messages: notification.messages,
            });

            self.codec.write_frame(frame).await?;
            sent += 1;

            if !pipelining {
                self.state = State::WaitingSyncAck;
                self.recv_ack(sink).await?;
            }
        }

        if pipelining {
            for _ in 0..sent {
                self.recv_ack(sink).await?;
            }
        }

        self.state = if self.pending.is_empty() {
            State::Idle
        } else {
            State::Processing
        };

        Ok(())
    }

    async fn recv_ack<S: AckSink>(&mut self, sink: &mut S) -> Result<()> {
        match self.codec.read_frame().await? {
            Frame::AgentAck(AgentAck {
                aborted,
                stream_id,
                frame_id,
                actions,
                ..
            }) => {
                trace!(stream_id, frame_id, n = actions.len(), "ack received");

                sink.ack(stream_id, frame_id, actions, aborted);

                Ok(())
            }
            Frame::AgentDisconnect(disconnect) => {
                warn!(?disconnect, "agent closed connection");

                self.state = State::Exit;

                Err(Error::Status(
                    disconnect.status_code.try_into().unwrap_or(Status::Unknown),
                ))
            }
            _ => Err(Status::Invalid.into()),
        }
    }

    /// Sends HAPROXY-DISCONNECT and moves to DISCONNECTING.
    #[instrument(skip(self), err, level = "debug")]
    pub async fn disconnect(&mut self, status: Status, reason: impl Into<String> + std::fmt::Debug) -> Result<()> {
        self.state = State::Disconnect;

        let frame = Frame::haproxy_disconnect(status, reason);

        self.codec.write_frame(frame).await?;
        self.state = State::Disconnecting;

        Ok(())
    }

    pub fn exit(&mut self) {
        self.state = State::Exit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_picks_common_capabilities() {
        let negotiated = negotiate(
            &[Version::V2_0],
            16384,
            &[Capability::Fragmentation, Capability::Pipelining],
            AgentHello {
                version: Version::V2_0,
                max_frame_size: 8192,
                capabilities: vec![Capability::Pipelining, Capability::Async],
            },
        )
        .unwrap();

        assert_eq!(negotiated.max_frame_size, 8192);
        assert!(negotiated.supports_pipelining());
        assert!(!negotiated.supports_fragmentation());
        assert!(!negotiated.supports_async());
    }

    #[test]
    fn negotiate_rejects_unsupported_version() {
        let err = negotiate(
            &[Version::V2_0],
            16384,
            &[],
            AgentHello {
                version: Version::new(3, 0),
                max_frame_size: 16384,
                capabilities: vec![],
            },
        );

        assert!(err.is_err());
    }
}
