use std::time::{Duration, Instant};

use bitflags::bitflags;
use dashmap::DashMap;
use derive_more::derive::IsVariant;
use haproxy_spop::{Action, Error as Status, Message};
use tracing::instrument;

use crate::error::Result;

pub type StreamId = haproxy_spop::StreamId;
pub type FrameId = haproxy_spop::FrameId;

bitflags! {
    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    pub struct Flags: u32 {
        /// a processing cycle is in flight (request or response direction)
        const PROCESS     = 0x0001;
        const REQ_PROCESS = 0x0002;
        const RSP_PROCESS = 0x0004;
        const FRAGMENTED  = 0x0008;
        const CLI_CONNECTED = 0x0010;
        const SRV_CONNECTED = 0x0020;
    }
}

/// Per-stream SPOE processing state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IsVariant)]
pub enum State {
    /// processing disabled for this stream (terminal, reachable from an error with
    /// `continue-on-error` unset)
    None,
    /// ready to start a new processing cycle
    Ready,
    /// encoding the event's messages into the buffer
    EncodingMsgs,
    /// messages encoded, handing frames to the applet
    SendingMsgs,
    /// NOTIFY sent, waiting for the matching ACK
    WaitingAck,
    /// ACK received, ready to apply actions
    Done,
    /// unrecoverable error; only `handle_error` can be called
    Error,
}

/// Cursor recording how far a fragmented NOTIFY has progressed.
#[derive(Clone, Debug, Default)]
pub struct FragmentCursor {
    pub message: usize,
    pub argument: usize,
    pub offset: usize,
}

/// Outcome of a single [`Context::process_event`]/[`Context::process_group`] invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Done,
    Error,
}

/// Something an `SpoeContext` can encode messages from and apply actions to — the
/// owning stream, out of scope for this crate per its external-interfaces boundary.
pub trait StreamHandle {
    fn messages(&mut self) -> Vec<Message>;
    fn apply(&mut self, action: Action);
}

/// Per-stream SPOE processing state: one per filter-stream pair.
#[derive(Debug)]
pub struct Context {
    pub stream_id: StreamId,
    pub frame_id: FrameId,
    pub state: State,
    pub flags: Flags,
    pub fragment: Option<FragmentCursor>,
    pub process_exp: Option<Instant>,
    pub status: Option<Status>,
    eps_budget: u32,
    var_on_error: Option<String>,
    continue_on_error: bool,
}

impl Context {
    pub fn new(stream_id: StreamId) -> Self {
        Context {
            stream_id,
            frame_id: 1,
            state: State::Ready,
            flags: Flags::empty(),
            fragment: None,
            process_exp: None,
            status: None,
            eps_budget: u32::MAX,
            var_on_error: None,
            continue_on_error: false,
        }
    }

    pub fn with_var_on_error(mut self, var: impl Into<String>) -> Self {
        self.var_on_error = Some(var.into());
        self
    }

    pub fn with_continue_on_error(mut self, enable: bool) -> Self {
        self.continue_on_error = enable;
        self
    }

    /// `spoe_stop_processing`: resets per-cycle state, releasing the context's buffer.
    pub fn stop_processing(&mut self) {
        self.flags
            .remove(Flags::PROCESS | Flags::REQ_PROCESS | Flags::RSP_PROCESS | Flags::FRAGMENTED);
        self.fragment = None;
        self.process_exp = None;
    }

    /// Drives one step of the algorithm in §4.3. `process_deadline` is the
    /// processing timeout; `direction` selects REQ_PROCESS vs RSP_PROCESS.
    /// Returns `Pending` while encoding/sending/waiting, `Done` once the cycle
    /// completes or the context has no more processing to do.
    #[instrument(skip(self, stream, encode), ret, level = "trace")]
    pub fn step<H, E>(
        &mut self,
        stream: &mut H,
        direction: Flags,
        process_deadline: Duration,
        mut encode: E,
    ) -> Result<Outcome>
    where
        H: StreamHandle,
        E: FnMut(&mut Context, &mut H) -> Result<bool>,
    {
        loop {
            match self.state {
                State::Error => {
                    self.handle_processing_error(Status::Unknown);

                    return Ok(Outcome::Done);
                }
                _ if self.process_exp.is_some_and(|exp| Instant::now() >= exp) => {
                    self.status = Some(Status::Timeout);
                    self.state = State::Error;
                }
                State::Ready => {
                    if self.eps_budget == 0 {
                        return Ok(Outcome::Pending);
                    }

                    self.process_exp = Some(Instant::now() + process_deadline);
                    self.flags.insert(Flags::PROCESS | direction);
                    self.state = State::EncodingMsgs;
                }
                State::EncodingMsgs => {
                    let fits = encode(self, stream)?;

                    if !fits {
                        self.flags.insert(Flags::FRAGMENTED);
                        // remains in EncodingMsgs; caller re-invokes for the rest
                        return Ok(Outcome::Pending);
                    }

                    self.state = State::SendingMsgs;
                }
                State::SendingMsgs => {
                    // the applet owns delivery from here; wake happens out of band
                    self.state = State::WaitingAck;

                    return Ok(Outcome::Pending);
                }
                State::WaitingAck => {
                    return Ok(Outcome::Pending);
                }
                // actions on an ACK are applied via `apply_ack`, invoked by the
                // applet once it decodes the reply; `step` itself never reaches
                // DONE — it's a terminal marker the caller observes after ack.
                State::Done => return Ok(Outcome::Done),
                State::None => return Ok(Outcome::Done),
            }
        }
    }

    /// Applies the actions carried by an ACK and transitions DONE -> READY.
    #[instrument(skip(self, actions, apply), level = "trace")]
    pub fn apply_ack<A>(&mut self, actions: Vec<Action>, aborted: bool, mut apply: A)
    where
        A: FnMut(Action),
    {
        if !aborted {
            for action in actions {
                apply(action);
            }
        }

        self.frame_id += 1;
        self.state = State::Ready;
        self.stop_processing();
    }

    /// `handle_processing_error`: increments EPS, optionally records the status in
    /// a variable, and either resumes (CONTINUE_ON_ERROR) or disables processing.
    fn handle_processing_error(&mut self, status: Status) {
        self.eps_budget = self.eps_budget.saturating_sub(1);

        warn!(stream_id = self.stream_id, ?status, "spoe processing error");

        self.status = Some(status);

        if let Some(ref var) = self.var_on_error {
            trace!(var, ?status, "recording error status");
        }

        self.stop_processing();

        self.state = if self.continue_on_error {
            State::Ready
        } else {
            State::None
        };
    }

    pub fn fail(&mut self, status: Status) -> Outcome {
        self.status = Some(status);
        self.handle_processing_error(status);
        Outcome::Error
    }
}

/// The engine's live contexts, keyed by stream. One per filter-stream pair,
/// inserted on first processing event and removed when the stream ends.
#[derive(Debug, Default)]
pub struct Contexts(DashMap<StreamId, Context>);

impl Contexts {
    pub fn new() -> Self {
        Contexts(DashMap::new())
    }

    /// Returns the existing context for `stream_id`, creating one if needed.
    pub fn get_or_insert(&self, stream_id: StreamId) -> dashmap::mapref::one::RefMut<'_, StreamId, Context> {
        self.0.entry(stream_id).or_insert_with(|| Context::new(stream_id))
    }

    pub fn remove(&self, stream_id: StreamId) -> Option<Context> {
        self.0.remove(&stream_id).map(|(_, ctx)| ctx)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullStream;

    impl StreamHandle for NullStream {
        fn messages(&mut self) -> Vec<Message> {
            Vec::new()
        }

        fn apply(&mut self, _action: Action) {}
    }

    #[test]
    fn frame_id_starts_at_one() {
        let ctx = Context::new(42);

        assert_eq!(ctx.frame_id, 1);
        assert_eq!(ctx.state, State::Ready);
    }

    #[test]
    fn continue_on_error_returns_to_ready() {
        let mut ctx = Context::new(1).with_continue_on_error(true);

        ctx.state = State::Error;
        ctx.handle_processing_error(Status::Timeout);

        assert_eq!(ctx.state, State::Ready);
    }

    #[test]
    fn error_without_continue_disables_processing() {
        let mut ctx = Context::new(1);

        ctx.state = State::Error;
        ctx.handle_processing_error(Status::Timeout);

        assert_eq!(ctx.state, State::None);
    }

    #[test]
    fn apply_ack_advances_frame_id_and_resets() {
        let mut ctx = Context::new(1);
        ctx.state = State::Done;

        let mut applied = Vec::new();

        ctx.apply_ack(
            vec![Action::set_var(haproxy_spop::Scope::Request, "foo", "bar")],
            false,
            |action| applied.push(action),
        );

        assert_eq!(ctx.frame_id, 2);
        assert_eq!(ctx.state, State::Ready);
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn step_advances_ready_through_waiting_ack() {
        let mut ctx = Context::new(1);
        let mut stream = NullStream;

        let outcome = ctx
            .step(&mut stream, Flags::REQ_PROCESS, Duration::from_secs(1), |_ctx, _stream| {
                Ok(true)
            })
            .unwrap();

        assert_eq!(outcome, Outcome::Pending);
        assert_eq!(ctx.state, State::WaitingAck);
        assert!(ctx.flags.contains(Flags::REQ_PROCESS));
        assert!(ctx.process_exp.is_some());
    }

    #[test]
    fn step_stays_in_encoding_msgs_when_fragmented() {
        let mut ctx = Context::new(1);
        let mut stream = NullStream;

        let outcome = ctx
            .step(&mut stream, Flags::RSP_PROCESS, Duration::from_secs(1), |_ctx, _stream| {
                Ok(false)
            })
            .unwrap();

        assert_eq!(outcome, Outcome::Pending);
        assert_eq!(ctx.state, State::EncodingMsgs);
        assert!(ctx.flags.contains(Flags::FRAGMENTED));
    }

    #[test]
    fn contexts_get_or_insert_creates_on_first_access() {
        let contexts = Contexts::new();

        {
            let ctx = contexts.get_or_insert(7);
            assert_eq!(ctx.stream_id, 7);
        }

        assert_eq!(contexts.len(), 1);

        contexts.remove(7);

        assert!(contexts.is_empty());
    }

    #[test]
    fn apply_ack_with_abort_discards_actions() {
        let mut ctx = Context::new(1);
        ctx.state = State::Done;

        let mut applied = Vec::new();

        ctx.apply_ack(
            vec![Action::set_var(haproxy_spop::Scope::Request, "foo", "bar")],
            true,
            |action| applied.push(action),
        );

        assert_eq!(ctx.frame_id, 2);
        assert!(applied.is_empty());
    }
}
