use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionStatus {
    Valid,
    Nx,
    Timeout,
    Refused,
    Other,
}

/// Per-status hold durations: how long a failing status must persist before
/// `RMAINT` is raised.
#[derive(Clone, Copy, Debug)]
pub struct HoldTimers {
    pub nx: Duration,
    pub timeout: Duration,
    pub refused: Duration,
    pub other: Duration,
}

impl HoldTimers {
    fn for_status(&self, status: ResolutionStatus) -> Option<Duration> {
        match status {
            ResolutionStatus::Valid => None,
            ResolutionStatus::Nx => Some(self.nx),
            ResolutionStatus::Timeout => Some(self.timeout),
            ResolutionStatus::Refused => Some(self.refused),
            ResolutionStatus::Other => Some(self.other),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Resolution {
    pub status: ResolutionStatus,
    pub last_valid: Instant,
    pub resolved_addr: Option<IpAddr>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RmaintUpdate {
    Set,
    Clear(IpAddr),
    None,
}

/// Decides whether a resolution result should raise or clear `RMAINT`.
/// Mirrors the CLI/runtime-DNS interaction in `server.c`'s resolution
/// callback: a failing status only takes effect once it has outlasted its
/// configured hold timer, avoiding flapping on transient lookup errors.
pub fn evaluate(resolution: &Resolution, now: Instant, hold: &HoldTimers) -> RmaintUpdate {
    match resolution.status {
        ResolutionStatus::Valid => match resolution.resolved_addr {
            Some(addr) => RmaintUpdate::Clear(addr),
            None => RmaintUpdate::None,
        },
        failing => match hold.for_status(failing) {
            Some(hold) if now.saturating_duration_since(resolution.last_valid) > hold => RmaintUpdate::Set,
            _ => RmaintUpdate::None,
        },
    }
}

/// Applies a resolved address, rejecting a change of IP family at runtime.
pub fn apply_address(name: &str, current: IpAddr, resolved: IpAddr) -> Result<IpAddr> {
    let family_matches = matches!(
        (current, resolved),
        (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_))
    );

    if !family_matches {
        return Err(Error::FamilyChange {
            name: name.to_owned(),
            from: current,
            to: resolved,
        });
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const HOLD: HoldTimers = HoldTimers {
        nx: Duration::from_secs(30),
        timeout: Duration::from_secs(30),
        refused: Duration::from_secs(30),
        other: Duration::from_secs(30),
    };

    #[test]
    fn valid_resolution_clears_rmaint() {
        let now = Instant::now();
        let resolution = Resolution {
            status: ResolutionStatus::Valid,
            last_valid: now,
            resolved_addr: Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))),
        };

        assert_eq!(
            evaluate(&resolution, now, &HOLD),
            RmaintUpdate::Clear(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)))
        );
    }

    #[test]
    fn failure_within_hold_does_not_set_rmaint() {
        let now = Instant::now();
        let resolution = Resolution {
            status: ResolutionStatus::Nx,
            last_valid: now,
            resolved_addr: None,
        };

        assert_eq!(evaluate(&resolution, now, &HOLD), RmaintUpdate::None);
    }

    #[test]
    fn family_change_is_rejected() {
        let current = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let resolved = "::1".parse().unwrap();

        assert!(apply_address("s1", current, resolved).is_err());
    }

    #[test]
    fn same_family_address_change_is_accepted() {
        let current = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let resolved = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert_eq!(apply_address("s1", current, resolved).unwrap(), resolved);
    }
}
