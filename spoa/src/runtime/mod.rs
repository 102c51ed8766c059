mod acker;
mod builder;
mod dispatch;
mod processor;
mod runtime;

pub use self::acker::Acker;
pub use self::builder::Builder;
pub use self::dispatch::Dispatcher;
pub use self::processor::Processor;
pub use self::runtime::{Runtime, MAX_PROCESS_TIME};
