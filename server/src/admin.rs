use std::collections::HashMap;

use bitflags::bitflags;

use crate::server::ServerId;
use crate::tracker::Topology;

bitflags! {
    /// Administrative flags, composable and propagated along tracker chains.
    /// Mirrors `SRV_ADMF_*`: the `F`/`C` variants are locally set, `I`
    /// variants are inherited from whatever this server tracks.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AdminFlags: u32 {
        /// forced into maintenance via the CLI/stats socket
        const FMAINT = 0x01;
        /// maintenance set at config load
        const CMAINT = 0x02;
        /// inherited maintenance, propagated from a tracked server
        const IMAINT = 0x04;
        /// maintenance driven by DNS resolution failure
        const RMAINT = 0x08;
        /// maintenance set via CLI-driven hostname/FQDN change
        const HMAINT = 0x10;
        /// forced drain via the CLI/stats socket
        const FDRAIN = 0x20;
        /// inherited drain, propagated from a tracked server
        const IDRAIN = 0x40;
    }
}

impl AdminFlags {
    pub const MAINT: Self = Self::FMAINT
        .union(Self::CMAINT)
        .union(Self::IMAINT)
        .union(Self::RMAINT)
        .union(Self::HMAINT);

    pub const DRAIN: Self = Self::FDRAIN.union(Self::IDRAIN);

    pub fn is_maint(self) -> bool {
        self.intersects(Self::MAINT)
    }

    /// MAINT (any variant) masks DRAIN: a server already down needn't also drain.
    pub fn is_drain(self) -> bool {
        !self.is_maint() && self.intersects(Self::DRAIN)
    }
}

/// Enables `mode` on `id` and propagates the inherited form of that flag to
/// every server tracking it, transitively. Mirrors `srv_set_admin_flag`.
pub fn set_admin_flag(
    admin: &mut HashMap<ServerId, AdminFlags>,
    topology: &Topology,
    id: ServerId,
    mode: AdminFlags,
) {
    let Some(flags) = admin.get_mut(&id) else { return };

    flags.insert(mode);

    let inherited = if mode.intersects(AdminFlags::MAINT) {
        AdminFlags::IMAINT
    } else if mode.intersects(AdminFlags::DRAIN) {
        AdminFlags::IDRAIN
    } else {
        return;
    };

    for tracker in topology.trackers_of(id).to_vec() {
        set_admin_flag(admin, topology, tracker, inherited);
    }
}

/// Disables `mode` on `id`. A no-op if the equivalent inherited flag is
/// still present (e.g. clearing `FMAINT` while `IMAINT` holds leaves the
/// server in maintenance).
pub fn clear_admin_flag(
    admin: &mut HashMap<ServerId, AdminFlags>,
    topology: &Topology,
    id: ServerId,
    mode: AdminFlags,
) {
    let Some(flags) = admin.get_mut(&id) else { return };

    if mode.intersects(AdminFlags::MAINT) && flags.contains(AdminFlags::MAINT & !mode) {
        return;
    }
    if mode.intersects(AdminFlags::DRAIN) && flags.contains(AdminFlags::DRAIN & !mode) {
        return;
    }

    flags.remove(mode);

    let inherited = if mode.intersects(AdminFlags::MAINT) {
        AdminFlags::IMAINT
    } else if mode.intersects(AdminFlags::DRAIN) {
        AdminFlags::IDRAIN
    } else {
        return;
    };

    for tracker in topology.trackers_of(id).to_vec() {
        clear_admin_flag(admin, topology, tracker, inherited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn propagate(edges: &[(ServerId, ServerId)], id: ServerId, mode: AdminFlags) -> HashMap<ServerId, AdminFlags> {
        let mut topology = Topology::default();
        for &(tracked, tracker) in edges {
            topology.add_tracker(tracked, tracker);
        }

        let mut flags: HashMap<ServerId, AdminFlags> = HashMap::new();
        for &(a, b) in edges {
            flags.entry(a).or_default();
            flags.entry(b).or_default();
        }
        flags.entry(id).or_default();

        set_admin_flag(&mut flags, &topology, id, mode);

        flags
    }

    #[test]
    fn maint_propagates_to_trackers_transitively() {
        // a <- b <- c (b tracks a, c tracks b)
        let flags = propagate(&[(1, 2), (2, 3)], 1, AdminFlags::FMAINT);

        assert!(flags[&1].contains(AdminFlags::FMAINT));
        assert!(flags[&2].contains(AdminFlags::IMAINT));
        assert!(flags[&3].contains(AdminFlags::IMAINT));
        assert!(flags[&1].is_maint());
        assert!(flags[&2].is_maint());
        assert!(flags[&3].is_maint());
    }

    #[test]
    fn drain_propagates_separately_from_maint() {
        let flags = propagate(&[(1, 2)], 1, AdminFlags::FDRAIN);

        assert!(flags[&1].is_drain());
        assert!(flags[&2].contains(AdminFlags::IDRAIN));
        assert!(!flags[&2].is_maint());
    }

    #[test]
    fn maint_masks_drain() {
        let mut flags = AdminFlags::FDRAIN;
        flags.insert(AdminFlags::FMAINT);

        assert!(flags.is_maint());
        assert!(!flags.is_drain());
    }

    #[test]
    fn clear_is_noop_while_inherited_flag_remains() {
        let topology = Topology::default();
        let mut admin = HashMap::from([(1, AdminFlags::FMAINT | AdminFlags::IMAINT)]);

        clear_admin_flag(&mut admin, &topology, 1, AdminFlags::FMAINT);

        assert!(admin[&1].is_maint());
        assert!(admin[&1].contains(AdminFlags::IMAINT));
    }
}
