use std::time::Instant;

use crate::server::{OperState, Server, ServerId};
use crate::weight::{self, Algorithm};

/// Function-pointer polymorphism in the original becomes a capability
/// interface: one implementation per load-balancing algorithm.
pub trait LoadBalancer {
    fn on_server_up(&self, server: ServerId);
    fn on_server_down(&self, server: ServerId);
    fn update_weight(&self, server: ServerId, eweight: u32);
}

/// Stream-lifecycle side effects a transition may trigger; out of scope as
/// an implementation but in scope as the contract the state machine calls.
pub trait SessionController {
    fn shutdown_sessions(&self, server: ServerId);
    fn redistribute_pending(&self, server: ServerId);
    fn grab_pending(&self, server: ServerId);
}

/// Per-server config knobs governing entry-action side effects.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransitionOptions {
    pub shutdown_sessions_on_down: bool,
    pub shutdown_backup_sessions_on_up: bool,
}

/// `srv_set_stopped`/`srv_set_running`/`srv_set_stopping`: applies one
/// operational transition's entry actions. Only called from the sync point,
/// never directly against a server a producer thread might also be touching.
pub fn apply_transition(
    server: &mut Server,
    target: OperState,
    now: Instant,
    options: TransitionOptions,
    lb: &dyn LoadBalancer,
    sessions: &dyn SessionController,
) {
    if server.admin.is_maint() {
        return;
    }

    match target {
        OperState::Stopped if server.op_state != OperState::Stopped => {
            server.last_change = now;
            server.op_state = OperState::Stopped;
            server.down_transitions += 1;

            lb.on_server_down(server.id);

            if options.shutdown_sessions_on_down {
                sessions.shutdown_sessions(server.id);
            }

            sessions.redistribute_pending(server.id);
        }
        OperState::Stopping if server.op_state != OperState::Stopping => {
            server.last_change = now;
            server.op_state = OperState::Stopping;

            lb.on_server_down(server.id);
        }
        OperState::Starting | OperState::Running
            if !matches!(server.op_state, OperState::Starting | OperState::Running) =>
        {
            server.last_change = now;
            server.op_state = if server.slowstart.is_zero() {
                OperState::Running
            } else {
                OperState::Starting
            };

            recalc(server, now);

            lb.on_server_up(server.id);
            lb.update_weight(server.id, server.eweight);

            if options.shutdown_backup_sessions_on_up && !server.backup && server.eweight > 0 {
                sessions.shutdown_sessions(server.id);
            }

            sessions.grab_pending(server.id);
        }
        _ => {}
    }
}

/// Re-derives `eweight` (and advances STARTING -> RUNNING once slowstart has
/// elapsed), to be invoked both on a transition and periodically by the
/// warmup task ([`weight::warmup_interval`]) while STARTING.
pub fn recalc(server: &mut Server, now: Instant) {
    let elapsed = now.saturating_duration_since(server.last_change);

    let (eweight, next) = weight::recalc_eweight(
        server.op_state,
        elapsed,
        server.slowstart,
        server.uweight,
        server.wdiv,
        server.wmult,
        server.algorithm,
    );

    server.eweight = eweight;

    if let Some(next) = next {
        server.op_state = next;
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    #[derive(Default)]
    struct RecordingLb {
        down: Mutex<Vec<ServerId>>,
        up: Mutex<Vec<ServerId>>,
    }

    impl LoadBalancer for RecordingLb {
        fn on_server_up(&self, server: ServerId) {
            self.up.lock().unwrap().push(server);
        }
        fn on_server_down(&self, server: ServerId) {
            self.down.lock().unwrap().push(server);
        }
        fn update_weight(&self, _server: ServerId, _eweight: u32) {}
    }

    #[derive(Default)]
    struct RecordingSessions {
        shutdown: Mutex<Vec<ServerId>>,
        redistributed: Mutex<Vec<ServerId>>,
    }

    impl SessionController for RecordingSessions {
        fn shutdown_sessions(&self, server: ServerId) {
            self.shutdown.lock().unwrap().push(server);
        }
        fn redistribute_pending(&self, server: ServerId) {
            self.redistributed.lock().unwrap().push(server);
        }
        fn grab_pending(&self, _server: ServerId) {}
    }

    fn server() -> Server {
        Server::new(1, "s1", Ipv4Addr::new(127, 0, 0, 1).into(), 8080)
    }

    #[test]
    fn down_transition_redistributes_and_optionally_shuts_down() {
        let mut server = server();
        let lb = RecordingLb::default();
        let sessions = RecordingSessions::default();

        apply_transition(
            &mut server,
            OperState::Stopped,
            Instant::now(),
            TransitionOptions { shutdown_sessions_on_down: true, ..Default::default() },
            &lb,
            &sessions,
        );

        assert_eq!(server.op_state, OperState::Stopped);
        assert_eq!(server.down_transitions, 1);
        assert_eq!(lb.down.lock().unwrap().as_slice(), &[1]);
        assert_eq!(sessions.shutdown.lock().unwrap().as_slice(), &[1]);
        assert_eq!(sessions.redistributed.lock().unwrap().as_slice(), &[1]);
    }

    #[test]
    fn up_transition_with_slowstart_enters_starting() {
        let mut server = server();
        server.op_state = OperState::Stopped;
        server.slowstart = Duration::from_secs(10);
        server.algorithm = Algorithm::Dynamic;

        let lb = RecordingLb::default();
        let sessions = RecordingSessions::default();

        apply_transition(
            &mut server,
            OperState::Running,
            Instant::now(),
            TransitionOptions::default(),
            &lb,
            &sessions,
        );

        assert_eq!(server.op_state, OperState::Starting);
        assert_eq!(lb.up.lock().unwrap().as_slice(), &[1]);
    }

    #[test]
    fn maint_blocks_operational_transitions() {
        let mut server = server();
        server.admin = crate::admin::AdminFlags::FMAINT;

        let lb = RecordingLb::default();
        let sessions = RecordingSessions::default();

        apply_transition(
            &mut server,
            OperState::Stopped,
            Instant::now(),
            TransitionOptions::default(),
            &lb,
            &sessions,
        );

        assert_eq!(server.op_state, OperState::Running);
    }
}
