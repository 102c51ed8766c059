use crate::sample::SampleValue;

/// A lightweight handle to an allocated stick-table counter slot, returned
/// by TRACK-SC. The table's storage itself is an external collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StickCounterId(pub u32);

/// The contract the rule evaluator calls against for TRACK-SC; actual
/// storage (expiry, data columns, cross-process sync) is out of scope.
pub trait StickTable {
    fn track(&self, key: &SampleValue) -> StickCounterId;
}
