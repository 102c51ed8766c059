use std::sync::Arc;

use crate::action::Action;
use crate::point::EvalPoint;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConditionResult {
    Match,
    NoMatch,
    /// not enough data yet to decide; resolved by whether the channel has
    /// reached its final state for this inspection cycle
    Miss,
}

/// A parsed ACL-like condition. `required_points` is checked against a rule
/// list's evaluation point at build time — a fetch with no bit in common is
/// a configuration error, caught once rather than on every evaluation.
pub trait Condition: Send + Sync {
    fn required_points(&self) -> EvalPoint;

    /// `final_data` is true once no more data is coming this cycle (channel
    /// shut, full, or inspect-delay expired) — see [`crate::list::RuleList::evaluate_content`].
    fn evaluate(&self, final_data: bool) -> ConditionResult;
}

/// Always matches; the unconditional form `tcp-request ... if TRUE` (or a
/// bare action with no `if`/`unless`).
pub struct Always;

impl Condition for Always {
    fn required_points(&self) -> EvalPoint {
        EvalPoint::all()
    }

    fn evaluate(&self, _final_data: bool) -> ConditionResult {
        ConditionResult::Match
    }
}

pub struct Rule {
    pub condition: Arc<dyn Condition>,
    pub action: Action,
}

impl Rule {
    pub fn new(action: Action) -> Self {
        Rule {
            condition: Arc::new(Always),
            action,
        }
    }

    pub fn with_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.condition = condition;
        self
    }
}
