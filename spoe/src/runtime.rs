use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::instrument;

use crate::agent::Agent;

pub type AppletId = u64;

/// A one-second sliding-window counter, used to cap applet creation and
/// error rates the way HAProxy's `cps`/`eps` limits do.
#[derive(Debug)]
struct RateLimiter {
    limit: u32,
    window: Mutex<(Instant, u32)>,
}

impl RateLimiter {
    fn new(limit: u32) -> Self {
        RateLimiter {
            limit,
            window: Mutex::new((Instant::now(), 0)),
        }
    }

    fn allow(&self) -> bool {
        let mut window = self.window.lock().unwrap();
        let now = Instant::now();

        if now.duration_since(window.0) >= Duration::from_secs(1) {
            *window = (now, 0);
        }

        if window.1 < self.limit {
            window.1 += 1;
            true
        } else {
            false
        }
    }
}

/// Outcome of [`AgentRuntime::queue_context`]: what the caller should do
/// with the context it's trying to dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// hand the context to this already-connected, idle applet
    UseIdle(AppletId),
    /// no idle applet and room (and budget) to open one
    SpawnApplet,
    /// at capacity or rate-limited; queue the context and retry later
    Wait,
}

/// Per-agent, per-thread pool of applet connections. Tracks how many
/// applets are alive, which ones are idle, and enforces the `cps` cap on
/// how fast new ones may be opened.
#[derive(Debug)]
pub struct AgentRuntime {
    min_applets: usize,
    max_applets: usize,
    cps: Option<RateLimiter>,
    active_applets: AtomicUsize,
    next_applet_id: AtomicU64,
    idle: Mutex<VecDeque<AppletId>>,
    backend_active_servers: AtomicUsize,
}

impl AgentRuntime {
    pub fn new(agent: &Agent) -> Self {
        AgentRuntime {
            min_applets: agent.min_applets,
            max_applets: agent.max_applets,
            cps: agent.max_connections_per_sec.map(RateLimiter::new),
            active_applets: AtomicUsize::new(0),
            next_applet_id: AtomicU64::new(1),
            idle: Mutex::new(VecDeque::new()),
            backend_active_servers: AtomicUsize::new(0),
        }
    }

    /// Called by the backend whenever its active-server count changes, so
    /// [`Self::min_applets_active`] stays in sync.
    pub fn set_backend_active_servers(&self, n: usize) {
        self.backend_active_servers.store(n, Ordering::Relaxed);
    }

    /// `max(agent.min_applets, 2 * backend.active_servers)`: the floor this
    /// runtime tries to keep warm regardless of current load.
    pub fn min_applets_active(&self) -> usize {
        let backend_floor = 2 * self.backend_active_servers.load(Ordering::Relaxed);

        self.min_applets.max(backend_floor)
    }

    /// Decides how to service one more queued context: reuse an idle
    /// applet round-robin, spawn a new one, or ask the caller to wait.
    #[instrument(skip(self), ret, level = "trace")]
    pub fn queue_context(&self) -> Decision {
        if let Some(id) = self.idle.lock().unwrap().pop_front() {
            return Decision::UseIdle(id);
        }

        let active = self.active_applets.load(Ordering::Relaxed);

        if active >= self.max_applets {
            return Decision::Wait;
        }

        // the very first applet is never rate-limited: a cold agent with no
        // connections at all must still be able to establish one.
        if active > 0 {
            if let Some(ref cps) = self.cps {
                if !cps.allow() {
                    trace!("cps limit reached, deferring applet creation");

                    return Decision::Wait;
                }
            }
        }

        Decision::SpawnApplet
    }

    pub fn applet_spawned(&self) -> AppletId {
        self.active_applets.fetch_add(1, Ordering::Relaxed);
        self.next_applet_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn applet_exited(&self) {
        self.active_applets.fetch_sub(1, Ordering::Relaxed);
    }

    /// Returns an applet to the idle (round-robin) pool once it has drained
    /// its frame budget and carries no assigned context.
    pub fn release_idle(&self, id: AppletId) {
        debug!(applet_id = id, "applet idle");

        self.idle.lock().unwrap().push_back(id);
    }

    pub fn active_applets(&self) -> usize {
        self.active_applets.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Agent {
        crate::agent::Agent::builder("test").min_applets(2).max_applets(4).build()
    }

    #[test]
    fn min_applets_active_takes_the_larger_floor() {
        let runtime = AgentRuntime::new(&agent());

        assert_eq!(runtime.min_applets_active(), 2);

        runtime.set_backend_active_servers(3);

        assert_eq!(runtime.min_applets_active(), 6);
    }

    #[test]
    fn queue_context_spawns_until_max_then_waits() {
        let runtime = AgentRuntime::new(&agent());

        for _ in 0..4 {
            assert_eq!(runtime.queue_context(), Decision::SpawnApplet);
            runtime.applet_spawned();
        }

        assert_eq!(runtime.queue_context(), Decision::Wait);
    }

    #[test]
    fn queue_context_reuses_idle_applets_first() {
        let runtime = AgentRuntime::new(&agent());

        assert_eq!(runtime.queue_context(), Decision::SpawnApplet);
        let id = runtime.applet_spawned();
        runtime.release_idle(id);

        assert_eq!(runtime.queue_context(), Decision::UseIdle(id));
    }

    #[test]
    fn cps_cap_never_blocks_the_first_applet() {
        let mut agent = agent();
        agent.max_connections_per_sec = Some(0);

        let runtime = AgentRuntime::new(&agent);

        assert_eq!(runtime.queue_context(), Decision::SpawnApplet);
    }
}
