//! The shared `Connection`/`Session`/`Stream` substrate the SPOE, server, and
//! rule-evaluation cores all sit on top of. A `Connection` is one accepted
//! client socket; a `Session` is a PROXY-protocol-terminated unit on that
//! connection; a `Stream` is one transaction (one per HTTP request, or
//! exactly one for pure TCP mode).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use haproxy_rules::Checkpoint;
use haproxy_spoe::SpoeContext;

pub type StreamId = u64;
pub type SessionId = u64;
pub type ConnectionId = u64;

/// Monotonic id source, one per id namespace (connections, sessions, streams).
#[derive(Debug, Default)]
pub struct IdAllocator(AtomicU64);

impl IdAllocator {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// One direction of a stream's data path. Real I/O buffering lives in the
/// SPOE applet's [`haproxy_spoe::Buffer`]; this is the plain accumulation
/// buffer the rule evaluator and SPOE filter read from.
#[derive(Debug, Default)]
pub struct ChannelBuffer {
    data: Vec<u8>,
    shut: bool,
}

impl ChannelBuffer {
    pub fn push(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn shutdown(&mut self) {
        self.shut = true;
    }

    /// True once no more data is coming on this channel this cycle — one of
    /// the conditions the rule evaluator's `final_data` flag folds in.
    pub fn is_shut(&self) -> bool {
        self.shut
    }
}

/// One HTTP transaction, or the whole connection's lifetime in TCP mode.
#[derive(Debug)]
pub struct Stream {
    pub id: StreamId,
    pub request: ChannelBuffer,
    pub response: ChannelBuffer,
    /// resume point for a content-inspection rule list that yielded
    pub checkpoint: Option<Checkpoint>,
    /// at most one SPOE context per attached filter; single-filter for now
    pub spoe: Option<SpoeContext>,
}

impl Stream {
    fn new(id: StreamId) -> Self {
        Stream {
            id,
            request: ChannelBuffer::default(),
            response: ChannelBuffer::default(),
            checkpoint: None,
            spoe: None,
        }
    }

    /// `final_data` per the content-inspection rule: true once either
    /// channel has shut, independent of which direction is being evaluated.
    pub fn final_data(&self) -> bool {
        self.request.is_shut() || self.response.is_shut()
    }
}

/// A PROXY-protocol-terminated unit of a connection; owns one or more streams.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    streams: Vec<Stream>,
    stream_ids: IdAllocator,
}

impl Session {
    fn new(id: SessionId) -> Self {
        Session {
            id,
            streams: Vec::new(),
            stream_ids: IdAllocator::default(),
        }
    }

    pub fn open_stream(&mut self) -> &mut Stream {
        let id = self.stream_ids.next();
        self.streams.push(Stream::new(id));
        self.streams.last_mut().expect("just pushed")
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn stream_mut(&mut self, id: StreamId) -> Option<&mut Stream> {
        self.streams.iter_mut().find(|s| s.id == id)
    }
}

/// One accepted client socket; owns zero or more sessions (keep-alive splits
/// one connection into several sessions over its lifetime).
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub peer: SocketAddr,
    sessions: Vec<Session>,
    session_ids: IdAllocator,
}

impl Connection {
    pub fn new(id: ConnectionId, peer: SocketAddr) -> Self {
        Connection {
            id,
            peer,
            sessions: Vec::new(),
            session_ids: IdAllocator::default(),
        }
    }

    pub fn open_session(&mut self) -> &mut Session {
        let id = self.session_ids.next();
        self.sessions.push(Session::new(id));
        self.sessions.last_mut().expect("just pushed")
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_streams_and_sessions_assigns_monotonic_ids() {
        let mut conn = Connection::new(1, "127.0.0.1:0".parse().unwrap());

        let sid1 = conn.open_session().id;
        let sid2 = conn.open_session().id;

        assert_eq!(sid1, 1);
        assert_eq!(sid2, 2);

        let session = conn.session_mut(sid1).unwrap();
        let stream1 = session.open_stream().id;
        let stream2 = session.open_stream().id;

        assert_eq!(stream1, 1);
        assert_eq!(stream2, 2);
        assert_eq!(session.streams().len(), 2);
    }

    #[test]
    fn final_data_is_true_once_either_channel_shuts() {
        let mut conn = Connection::new(1, "127.0.0.1:0".parse().unwrap());
        let session = conn.open_session();
        let stream = session.open_stream();

        assert!(!stream.final_data());

        stream.response.shutdown();

        assert!(stream.final_data());
    }
}
