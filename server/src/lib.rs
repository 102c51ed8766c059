#[macro_use]
extern crate tracing;

mod admin;
mod dns;
mod error;
mod queue;
mod server;
mod state;
mod state_file;
mod tracker;
mod weight;

pub use self::admin::{clear_admin_flag, set_admin_flag, AdminFlags};
pub use self::dns::{apply_address, evaluate as evaluate_resolution, HoldTimers, Resolution, ResolutionStatus, RmaintUpdate};
pub use self::error::{Context, Error, Result};
pub use self::queue::{Update, UpdateQueue};
pub use self::server::{CheckState, OperState, PortConfig, Server, ServerId};
pub use self::state::{apply_transition, recalc, LoadBalancer, SessionController, TransitionOptions};
pub use self::state_file::{apply as apply_state_file_record, find_match, parse_line, Record, VERSION, VERSION_HEADER};
pub use self::tracker::Topology;
pub use self::weight::{recalc_eweight, warmup_interval, Algorithm};
