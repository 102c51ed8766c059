use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::admin::AdminFlags;
use crate::weight::Algorithm;

pub type ServerId = u32;

/// Operational state, per the table in `srv_set_stopped`/`srv_set_running`/`srv_set_stopping`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl OperState {
    pub fn is_running(self) -> bool {
        matches!(self, OperState::Running | OperState::Starting)
    }
}

/// Health-check state attached to a server; paused while under MAINT.
#[derive(Clone, Copy, Debug)]
pub struct CheckState {
    pub paused: bool,
    pub health: u32,
    pub rise: u32,
}

impl CheckState {
    /// `MAINT` clears health and pauses checks; clearing it resumes at `rise`
    /// (start OK, needs one consecutive failure to fall again).
    pub fn pause(&mut self) {
        self.paused = true;
        self.health = 0;
    }

    pub fn resume(&mut self) {
        self.paused = false;
        self.health = self.rise;
    }
}

/// Explicit port, or port-offset (`MAPPORTS`) mode toggled by a signed delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortConfig {
    Fixed(u16),
    Mapped(i32),
}

#[derive(Clone, Debug)]
pub struct Server {
    pub id: ServerId,
    pub name: String,
    pub op_state: OperState,
    pub admin: AdminFlags,
    pub addr: IpAddr,
    pub port: PortConfig,
    pub check_port: Option<u16>,
    pub check: CheckState,
    /// weight as configured at startup; relative weight changes (`N%`) are
    /// taken against this, not against the current `uweight`.
    pub iweight: u32,
    pub uweight: u32,
    pub eweight: u32,
    pub wdiv: u32,
    pub wmult: u32,
    pub algorithm: Algorithm,
    pub slowstart: Duration,
    pub last_change: Instant,
    pub down_transitions: u64,
    pub backup: bool,
}

impl Server {
    pub fn new(id: ServerId, name: impl Into<String>, addr: IpAddr, port: u16) -> Self {
        Server {
            id,
            name: name.into(),
            op_state: OperState::Running,
            admin: AdminFlags::empty(),
            addr,
            port: PortConfig::Fixed(port),
            check_port: None,
            check: CheckState {
                paused: false,
                health: 1,
                rise: 1,
            },
            iweight: 1,
            uweight: 1,
            eweight: 1,
            wdiv: 1,
            wmult: 1,
            algorithm: Algorithm::Static,
            slowstart: Duration::ZERO,
            last_change: Instant::now(),
            down_transitions: 0,
            backup: false,
        }
    }

    /// Absolute port, or toggles into port-offset mode on a leading sign.
    /// Switching into `MAPPORTS` without a dedicated check port is rejected.
    pub fn set_port(&mut self, spec: &str) -> crate::error::Result<()> {
        if let Some(rest) = spec.strip_prefix(['+', '-']) {
            let sign = if spec.starts_with('-') { -1 } else { 1 };
            let offset: i32 = rest.parse().unwrap_or(0);

            if self.check_port.is_none() {
                return Err(crate::error::Error::MapPortsNeedsDedicatedCheckPort {
                    name: self.name.clone(),
                });
            }

            self.port = PortConfig::Mapped(sign * offset);
        } else if let Ok(port) = spec.parse() {
            self.port = PortConfig::Fixed(port);
        }

        Ok(())
    }
}
