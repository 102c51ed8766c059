#[macro_use]
extern crate tracing;

mod action;
mod error;
mod list;
mod point;
mod rule;
mod sample;
mod stick;

pub use self::action::{Action, ActionContext, ActionOutcome, CustomAction};
pub use self::error::{Error, Result};
pub use self::list::{Checkpoint, RuleList, Verdict};
pub use self::point::EvalPoint;
pub use self::rule::{Always, Condition, ConditionResult, Rule};
pub use self::sample::{Fetch, Sample, SampleFlags, SampleValue};
pub use self::stick::{StickCounterId, StickTable};
