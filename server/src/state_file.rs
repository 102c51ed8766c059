use crate::admin::AdminFlags;
use crate::error::{Error, Result};
use crate::server::{OperState, Server};

pub const VERSION: u32 = 1;
pub const VERSION_HEADER: &str = "#1";

/// One line of a version-1 state file: whitespace-separated fields in the
/// order HAProxy writes them, kept as strings except where a field is
/// consumed directly (op/admin state, weights).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub proxy_uuid: String,
    pub proxy_name: String,
    pub srv_id: String,
    pub srv_name: String,
    pub srv_addr: String,
    pub srv_op_state: String,
    pub srv_admin_state: String,
    pub srv_uweight: String,
    pub srv_iweight: String,
    pub last_change_delta: String,
    pub check_status: String,
    pub check_result: String,
    pub check_health: String,
    pub check_state: String,
    pub agent_state: String,
    pub bk_forced_id: String,
    pub srv_forced_id: String,
    pub srv_fqdn: String,
    pub srv_port: String,
    pub srvrecord: String,
}

const FIELD_COUNT: usize = 20;

pub fn parse_line(line: &str, line_no: usize) -> Result<Record> {
    let fields: Vec<&str> = line.split_whitespace().collect();

    if fields.len() != FIELD_COUNT {
        return Err(Error::StateFile {
            line: line_no,
            reason: format!("expected {FIELD_COUNT} fields, found {}", fields.len()),
        });
    }

    Ok(Record {
        proxy_uuid: fields[0].to_owned(),
        proxy_name: fields[1].to_owned(),
        srv_id: fields[2].to_owned(),
        srv_name: fields[3].to_owned(),
        srv_addr: fields[4].to_owned(),
        srv_op_state: fields[5].to_owned(),
        srv_admin_state: fields[6].to_owned(),
        srv_uweight: fields[7].to_owned(),
        srv_iweight: fields[8].to_owned(),
        last_change_delta: fields[9].to_owned(),
        check_status: fields[10].to_owned(),
        check_result: fields[11].to_owned(),
        check_health: fields[12].to_owned(),
        check_state: fields[13].to_owned(),
        agent_state: fields[14].to_owned(),
        bk_forced_id: fields[15].to_owned(),
        srv_forced_id: fields[16].to_owned(),
        srv_fqdn: fields[17].to_owned(),
        srv_port: fields[18].to_owned(),
        srvrecord: fields[19].to_owned(),
    })
}

impl Record {
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {}",
            self.proxy_uuid,
            self.proxy_name,
            self.srv_id,
            self.srv_name,
            self.srv_addr,
            self.srv_op_state,
            self.srv_admin_state,
            self.srv_uweight,
            self.srv_iweight,
            self.last_change_delta,
            self.check_status,
            self.check_result,
            self.check_health,
            self.check_state,
            self.agent_state,
            self.bk_forced_id,
            self.srv_forced_id,
            self.srv_fqdn,
            self.srv_port,
            self.srvrecord,
        )
    }
}

/// Looks a record up against `servers` by `#<n>` numeric id or by name,
/// warning (but not failing) on a name/id mismatch — mirrors the
/// best-effort reconciliation `apply_server_state` performs across reloads.
pub fn find_match<'a>(record: &Record, servers: &'a mut [Server]) -> Option<&'a mut Server> {
    let by_id = record
        .srv_id
        .strip_prefix('#')
        .unwrap_or(&record.srv_id)
        .parse::<u32>()
        .ok()
        .and_then(|id| servers.iter_mut().find(|s| s.id == id));

    match by_id {
        Some(server) => {
            if server.name != record.srv_name {
                warn!(
                    expected = %record.srv_name,
                    found = %server.name,
                    "state file: server name mismatch for id {}",
                    record.srv_id,
                );
            }

            Some(server)
        }
        None => servers.iter_mut().find(|s| s.name == record.srv_name),
    }
}

/// Applies only the fields the original state machine trusts across a
/// reload; never regresses a server out of a configuration-set MAINT.
pub fn apply(record: &Record, server: &mut Server) {
    if let Ok(uweight) = record.srv_uweight.parse() {
        server.uweight = uweight;
    }

    if let Ok(op_state) = record.srv_op_state.parse::<u8>() {
        server.op_state = match op_state {
            0 => OperState::Stopped,
            1 => OperState::Starting,
            2 => OperState::Running,
            3 => OperState::Stopping,
            _ => server.op_state,
        };
    }

    if record.srv_admin_state.contains("CMAINT") && !server.admin.contains(AdminFlags::CMAINT) {
        server.admin.insert(AdminFlags::CMAINT);
    }
    // a server configured down (CMAINT/FMAINT already set) never gets
    // resurrected by a stale state-file record.
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const LINE: &str = "1 be0 1 s1 10.0.0.1 2 0 100 100 0 0 0 0 0 0 0 0 - 8080 -";

    #[test]
    fn parses_a_well_formed_line() {
        let record = parse_line(LINE, 2).unwrap();

        assert_eq!(record.proxy_name, "be0");
        assert_eq!(record.srv_name, "s1");
        assert_eq!(record.srv_port, "8080");
    }

    #[test]
    fn rejects_a_line_with_missing_fields() {
        assert!(parse_line("1 be0 1 s1", 2).is_err());
    }

    #[test]
    fn round_trips_through_to_line() {
        let record = parse_line(LINE, 2).unwrap();
        let rebuilt = parse_line(&record.to_line(), 2).unwrap();

        assert_eq!(record, rebuilt);
    }

    #[test]
    fn find_match_prefers_numeric_id_over_name() {
        let record = parse_line(LINE, 2).unwrap();
        let mut servers = vec![Server::new(1, "s1", Ipv4Addr::new(10, 0, 0, 1).into(), 8080)];

        assert!(find_match(&record, &mut servers).is_some());
    }

    #[test]
    fn apply_sets_uweight_from_record() {
        let record = parse_line(LINE, 2).unwrap();
        let mut server = Server::new(1, "s1", Ipv4Addr::new(10, 0, 0, 1).into(), 8080);

        apply(&record, &mut server);

        assert_eq!(server.uweight, 100);
    }
}
