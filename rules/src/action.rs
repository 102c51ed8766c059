use crate::sample::SampleValue;
use crate::stick::StickCounterId;

/// What a custom action asks the evaluator to do next, mirroring `ACT_RET_*`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Cont,
    Stop,
    Yield,
    Err,
}

/// Mutations an action may make against the owning stream; storage for each
/// of these lives outside this crate (stick-tables, capture buffers, the
/// stream itself) — this is the interface the evaluator calls against.
pub trait ActionContext {
    fn track(&mut self, slot: u8, key: &SampleValue) -> StickCounterId;
    fn capture(&mut self, slot: usize, value: &str, max_len: usize);
    fn close_response(&mut self);
    fn terminate(&mut self);
    fn increment_denied(&mut self);
}

/// A custom action keyword, e.g. `set-var`, `sc-inc-gpc0`.
pub trait CustomAction: Send + Sync {
    fn name(&self) -> &str;

    fn execute(&self, ctx: &mut dyn ActionContext, sample: Option<&SampleValue>) -> ActionOutcome;
}

pub enum Action {
    Accept,
    Reject,
    TrackSc { slot: u8, key: SampleValue },
    Capture { slot: usize, max_len: usize, value: String },
    /// response-only: hard-close without a normal reject
    Close,
    Custom(Box<dyn CustomAction>),
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Accept => write!(f, "Accept"),
            Action::Reject => write!(f, "Reject"),
            Action::TrackSc { slot, .. } => write!(f, "TrackSc({slot})"),
            Action::Capture { slot, .. } => write!(f, "Capture({slot})"),
            Action::Close => write!(f, "Close"),
            Action::Custom(a) => write!(f, "Custom({})", a.name()),
        }
    }
}
