//! Pure, socket-free handling for the stats-socket CLI surface: parses a
//! line, mutates the server directory, and returns the response text and
//! exit code a caller writes back over the wire. The socket listener that
//! reads lines and calls [`Directory::dispatch`] is out of scope here.

use std::collections::HashMap;

use haproxy_server::{
    clear_admin_flag, set_admin_flag, AdminFlags, OperState, Server, ServerId, Topology,
};

/// A CLI response: the text written back to the client and the exit code
/// the original implementation keys off of (0 success, 1 parse/user error).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub code: i32,
    pub message: String,
}

impl Response {
    fn ok(message: impl Into<String>) -> Self {
        Response { code: 0, message: message.into() }
    }

    fn err(message: impl Into<String>) -> Self {
        Response { code: 1, message: message.into() }
    }
}

/// The in-memory server registry the CLI surface operates against: a flat
/// id space plus a `backend/name` lookup table, mirroring how `cli_find_server`
/// resolves the `<bk>/<srv>` argument before dispatching.
#[derive(Debug, Default)]
pub struct Directory {
    servers: HashMap<ServerId, Server>,
    admin: HashMap<ServerId, AdminFlags>,
    names: HashMap<(String, String), ServerId>,
    topology: Topology,
}

impl Directory {
    pub fn new() -> Self {
        Directory::default()
    }

    pub fn register(&mut self, backend: impl Into<String>, server: Server) -> ServerId {
        let id = server.id;
        self.names.insert((backend.into(), server.name.clone()), id);
        self.admin.insert(id, server.admin);
        self.servers.insert(id, server);
        id
    }

    pub fn server(&self, id: ServerId) -> Option<&Server> {
        self.servers.get(&id)
    }

    fn find(&self, path: &str) -> Option<ServerId> {
        let (backend, name) = path.split_once('/')?;
        self.names.get(&(backend.to_owned(), name.to_owned())).copied()
    }

    fn sync_admin(&mut self, id: ServerId) {
        if let (Some(server), Some(flags)) = (self.servers.get_mut(&id), self.admin.get(&id)) {
            server.admin = *flags;
        }
    }

    /// Dispatches one already-tokenized CLI line. Unrecognized or malformed
    /// commands return exit code 1, matching the stats socket's convention.
    pub fn dispatch(&mut self, line: &str) -> Response {
        let args: Vec<&str> = line.split_whitespace().collect();

        match args.as_slice() {
            ["set", "server", path, rest @ ..] => self.set_server(path, rest),
            ["get", "weight", path] => self.get_weight(path),
            ["enable", what @ ("agent" | "health" | "server"), path] => {
                self.enable_disable(what, path, true)
            }
            ["disable", what @ ("agent" | "health" | "server"), path] => {
                self.enable_disable(what, path, false)
            }
            ["show", "tls-keys", ..] | ["set", "ssl", ..] => {
                Response::err("TLS transport commands are not handled by this directory\n")
            }
            _ => Response::err("unknown command\n"),
        }
    }

    fn set_server(&mut self, path: &str, rest: &[&str]) -> Response {
        let Some(id) = self.find(path) else {
            return Response::err(format!("'{path}' not found\n"));
        };

        match rest {
            ["weight", value] => self.set_weight(id, value),
            ["state", mode] => self.set_state(id, mode),
            ["health", mode] => self.set_health(id, mode),
            ["agent", mode] => self.set_agent(id, mode),
            ["check-port", port] => self.set_check_port(id, port),
            ["addr", addr] => self.set_addr(id, addr, None),
            ["addr", addr, "port", port] => self.set_addr(id, addr, Some(port)),
            ["fqdn", name] => self.set_fqdn(id, name),
            _ => Response::err(
                "'set server <srv>' only supports 'agent', 'health', 'state', 'weight', 'addr', 'fqdn' and 'check-port'.\n",
            ),
        }
    }

    /// `<n>` is absolute (0..=256); `<n>%` is relative to the server's
    /// configured `iweight`, capped the same way.
    fn set_weight(&mut self, id: ServerId, value: &str) -> Response {
        let Some(iweight) = self.servers.get(&id).map(|server| server.iweight) else {
            return Response::err("server vanished\n");
        };

        let uweight = if let Some(pct) = value.strip_suffix('%') {
            let Ok(pct) = pct.parse::<i64>() else {
                return Response::err("'set server <srv> weight' expects an integer weight.\n");
            };
            if pct < 0 {
                return Response::err("Relative weight must be positive.\n");
            }
            let pct = pct.min(25_600);
            ((iweight as i64 * pct) / 100).min(256) as u32
        } else {
            match value.parse::<i64>() {
                Ok(w) if (0..=256).contains(&w) => w as u32,
                _ => return Response::err("Absolute weight can only be between 0 and 256 inclusive.\n"),
            }
        };

        let was_zero = self.servers.get(&id).is_some_and(|server| server.uweight == 0);

        {
            let server = self.servers.get_mut(&id).expect("checked above");
            server.uweight = uweight;
            haproxy_server::recalc(server, std::time::Instant::now());
        }

        // a server that inherited FDRAIN purely from having zero uweight
        // leaves drain once it is given a non-zero weight again.
        if was_zero && uweight > 0 {
            clear_admin_flag(&mut self.admin, &self.topology, id, AdminFlags::FDRAIN);
            self.sync_admin(id);
        }

        Response::ok("")
    }

    fn set_state(&mut self, id: ServerId, mode: &str) -> Response {
        let flag = match mode {
            "maint" => AdminFlags::FMAINT,
            "drain" => AdminFlags::FDRAIN,
            "ready" => {
                clear_admin_flag(&mut self.admin, &self.topology, id, AdminFlags::FMAINT | AdminFlags::FDRAIN);
                self.sync_admin(id);
                return Response::ok("");
            }
            _ => return Response::err("'set server <srv> state' expects 'ready', 'drain' and 'maint'.\n"),
        };

        set_admin_flag(&mut self.admin, &self.topology, id, flag);
        self.sync_admin(id);

        Response::ok("")
    }

    fn set_health(&mut self, id: ServerId, mode: &str) -> Response {
        let Some(server) = self.servers.get_mut(&id) else {
            return Response::err("server vanished\n");
        };

        match mode {
            "up" => {
                server.check.resume();
                server.op_state = OperState::Running;
            }
            "stopping" => {
                server.check.resume();
                server.op_state = OperState::Stopping;
            }
            "down" => {
                server.check.pause();
                server.op_state = OperState::Stopped;
            }
            _ => return Response::err("'set server <srv> health' expects 'up', 'stopping', or 'down'.\n"),
        }

        Response::ok("")
    }

    /// `set server <srv> agent {up|down}`: mirrors `set_health`, but for the
    /// agent check rather than the primary health check.
    fn set_agent(&mut self, id: ServerId, mode: &str) -> Response {
        let Some(server) = self.servers.get_mut(&id) else {
            return Response::err("server vanished\n");
        };

        match mode {
            "up" => {
                server.check.resume();
                server.op_state = OperState::Running;
            }
            "down" => {
                server.check.pause();
                server.op_state = OperState::Stopped;
            }
            _ => return Response::err("'set server <srv> agent' expects 'up' or 'down'.\n"),
        }

        Response::ok("")
    }

    fn set_check_port(&mut self, id: ServerId, port: &str) -> Response {
        let Some(server) = self.servers.get_mut(&id) else {
            return Response::err("server vanished\n");
        };

        let Ok(port) = port.parse::<u16>() else {
            return Response::err("'set server <srv> check-port' expects an integer as argument.\n");
        };

        server.check_port = Some(port);

        Response::ok("health check port updated.\n")
    }

    fn set_addr(&mut self, id: ServerId, addr: &str, port: Option<&str>) -> Response {
        let Some(server) = self.servers.get_mut(&id) else {
            return Response::err("server vanished\n");
        };

        let Ok(addr) = addr.parse() else {
            return Response::err("invalid address given for server.\n");
        };

        match haproxy_server::apply_address(&server.name, server.addr, addr) {
            Ok(resolved) => server.addr = resolved,
            Err(err) => return Response::err(format!("{err}\n")),
        }

        if let Some(port) = port {
            if let Err(err) = server.set_port(port) {
                return Response::err(format!("{err}\n"));
            }
        }

        clear_admin_flag(&mut self.admin, &self.topology, id, AdminFlags::RMAINT);
        self.sync_admin(id);

        Response::ok("")
    }

    fn set_fqdn(&mut self, _id: ServerId, name: &str) -> Response {
        if name.is_empty() {
            return Response::err("set server <b>/<s> fqdn requires a FQDN.\n");
        }

        // FQDN resolution is driven by the DNS resolver, out of scope here;
        // accepting the command is enough to exercise the CLI surface.
        Response::ok("")
    }

    fn get_weight(&self, path: &str) -> Response {
        let Some(id) = self.find(path) else {
            return Response::err(format!("'{path}' not found\n"));
        };
        let server = self.servers.get(&id).expect("id came from names table");

        Response::ok(format!("{} (initial {})\n", server.eweight, server.iweight))
    }

    fn enable_disable(&mut self, what: &str, path: &str, enable: bool) -> Response {
        let Some(id) = self.find(path) else {
            return Response::err(format!("'{path}' not found\n"));
        };

        match what {
            "health" | "agent" => {
                let Some(server) = self.servers.get_mut(&id) else {
                    return Response::err("server vanished\n");
                };
                server.check.paused = !enable;
                Response::ok("")
            }
            "server" => {
                if enable {
                    clear_admin_flag(&mut self.admin, &self.topology, id, AdminFlags::FMAINT);
                } else {
                    set_admin_flag(&mut self.admin, &self.topology, id, AdminFlags::FMAINT);
                }
                self.sync_admin(id);
                Response::ok("")
            }
            _ => Response::err("unknown command\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn directory() -> Directory {
        let mut dir = Directory::new();
        dir.register("bk", Server::new(1, "s1", Ipv4Addr::new(10, 0, 0, 1).into(), 80));
        dir
    }

    #[test]
    fn set_server_weight_absolute() {
        let mut dir = directory();

        let resp = dir.dispatch("set server bk/s1 weight 50");

        assert_eq!(resp.code, 0);
        assert_eq!(dir.server(1).unwrap().uweight, 50);
    }

    #[test]
    fn set_server_weight_relative_to_initial() {
        let mut dir = directory();
        dir.servers.get_mut(&1).unwrap().iweight = 20;

        let resp = dir.dispatch("set server bk/s1 weight 50%");

        assert_eq!(resp.code, 0);
        assert_eq!(dir.server(1).unwrap().uweight, 10);
    }

    #[test]
    fn set_server_weight_rejects_out_of_range_absolute() {
        let mut dir = directory();

        let resp = dir.dispatch("set server bk/s1 weight 999");

        assert_eq!(resp.code, 1);
    }

    #[test]
    fn set_server_state_maint_then_ready_round_trips() {
        let mut dir = directory();

        assert_eq!(dir.dispatch("set server bk/s1 state maint").code, 0);
        assert!(dir.server(1).unwrap().admin.is_maint());

        assert_eq!(dir.dispatch("set server bk/s1 state ready").code, 0);
        assert!(!dir.server(1).unwrap().admin.is_maint());
    }

    #[test]
    fn get_weight_reports_effective_and_initial() {
        let mut dir = directory();

        let resp = dir.dispatch("get weight bk/s1");

        assert_eq!(resp.code, 0);
        assert_eq!(resp.message, "1 (initial 1)\n");
    }

    #[test]
    fn weight_change_from_zero_clears_drain() {
        let mut dir = directory();
        dir.dispatch("set server bk/s1 weight 0");
        set_admin_flag(&mut dir.admin, &dir.topology, 1, AdminFlags::FDRAIN);
        dir.sync_admin(1);
        assert!(dir.server(1).unwrap().admin.is_drain());

        let resp = dir.dispatch("set server bk/s1 weight 10");

        assert_eq!(resp.code, 0);
        assert!(!dir.server(1).unwrap().admin.is_drain());
    }

    #[test]
    fn weight_change_between_nonzero_values_does_not_touch_drain() {
        let mut dir = directory();
        set_admin_flag(&mut dir.admin, &dir.topology, 1, AdminFlags::FDRAIN);
        dir.sync_admin(1);

        let resp = dir.dispatch("set server bk/s1 weight 10");

        assert_eq!(resp.code, 0);
        assert!(dir.server(1).unwrap().admin.is_drain());
    }

    #[test]
    fn set_server_agent_up_and_down_are_accepted() {
        let mut dir = directory();

        assert_eq!(dir.dispatch("set server bk/s1 agent down").code, 0);
        assert_eq!(dir.server(1).unwrap().op_state, OperState::Stopped);

        assert_eq!(dir.dispatch("set server bk/s1 agent up").code, 0);
        assert_eq!(dir.server(1).unwrap().op_state, OperState::Running);
    }

    #[test]
    fn set_server_agent_rejects_unknown_mode() {
        let mut dir = directory();

        assert_eq!(dir.dispatch("set server bk/s1 agent sideways").code, 1);
    }

    #[test]
    fn unknown_server_is_rejected() {
        let mut dir = directory();

        let resp = dir.dispatch("set server bk/missing weight 10");

        assert_eq!(resp.code, 1);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let mut dir = directory();

        assert_eq!(dir.dispatch("not a command").code, 1);
    }
}
