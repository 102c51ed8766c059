use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("rule's condition has no fetch usable at evaluation point {point:?}")]
    IncompatibleFetch { point: crate::point::EvalPoint },

    #[error("stick-table counter slot {0} not allocated")]
    NoStickCounter(u8),

    #[error("action returned YIELD from a non-yieldable evaluation point")]
    YieldNotSupported,
}
