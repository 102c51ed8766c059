use std::time::Duration;

use crate::server::OperState;

/// Load-balancing weight algorithm; only `Dynamic` ramps weight during slowstart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Static,
    Dynamic,
}

fn ceil_div(numerator: u64, denominator: u64) -> u32 {
    ((numerator + denominator - 1) / denominator) as u32
}

/// `server_recalc_eweight`: recomputes the effective weight for `elapsed`
/// time since the server's last state change, given `slowstart`, the
/// configured `uweight`, and the algorithm's `wdiv`/`wmult`. Returns the new
/// `eweight` and, if slowstart has completed, the state it transitions to.
pub fn recalc_eweight(
    op_state: OperState,
    elapsed: Duration,
    slowstart: Duration,
    uweight: u32,
    wdiv: u32,
    wmult: u32,
    algorithm: Algorithm,
) -> (u32, Option<OperState>) {
    let full = ceil_div(uweight as u64 * wdiv as u64, wmult as u64);

    if elapsed >= slowstart || slowstart.is_zero() {
        let next = (op_state == OperState::Starting).then_some(OperState::Running);

        return (full, next);
    }

    if op_state == OperState::Starting && algorithm == Algorithm::Dynamic {
        let t = elapsed.as_millis() as u64;
        let s = slowstart.as_millis() as u64;
        // minimal step: w >= 1 even at t == 0, per server.c:1157's "start
        // immediately, at least at the minimal step".
        let w = (wdiv as u64 * t + s) / s;

        (ceil_div(uweight as u64 * w, wmult as u64), None)
    } else {
        (full, None)
    }
}

/// Interval at which the warmup task re-triggers [`recalc_eweight`] while a
/// server is STARTING.
pub fn warmup_interval(slowstart: Duration) -> Duration {
    Duration::from_millis(u64::max(1000, slowstart.as_millis() as u64 / 20))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_weight_once_slowstart_elapses() {
        let (eweight, next) = recalc_eweight(
            OperState::Starting,
            Duration::from_secs(10),
            Duration::from_secs(5),
            100,
            1,
            1,
            Algorithm::Dynamic,
        );

        assert_eq!(eweight, 100);
        assert_eq!(next, Some(OperState::Running));
    }

    #[test]
    fn ramps_linearly_under_dynamic_algorithm() {
        let (eweight, next) = recalc_eweight(
            OperState::Starting,
            Duration::from_secs(2),
            Duration::from_secs(10),
            100,
            1,
            1,
            Algorithm::Dynamic,
        );

        assert!(eweight > 0 && eweight < 100);
        assert_eq!(next, None);
    }

    #[test]
    fn dynamic_ramp_guarantees_a_minimal_step_at_zero_elapsed() {
        let (eweight, next) = recalc_eweight(
            OperState::Starting,
            Duration::from_millis(0),
            Duration::from_secs(10),
            100,
            1,
            1,
            Algorithm::Dynamic,
        );

        assert_eq!(eweight, 1);
        assert_eq!(next, None);
    }

    #[test]
    fn static_algorithm_does_not_ramp() {
        let (eweight, next) = recalc_eweight(
            OperState::Starting,
            Duration::from_secs(2),
            Duration::from_secs(10),
            100,
            1,
            1,
            Algorithm::Static,
        );

        assert_eq!(eweight, 100);
        assert_eq!(next, None);
    }

    #[test]
    fn warmup_interval_has_a_one_second_floor() {
        assert_eq!(warmup_interval(Duration::from_secs(1)), Duration::from_millis(1000));
        assert_eq!(warmup_interval(Duration::from_secs(60)), Duration::from_millis(3000));
    }
}
