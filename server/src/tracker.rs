use std::collections::HashMap;

use crate::server::ServerId;

/// Tracker relation between servers: `trackers_of(a)` lists servers tracking
/// `a`, i.e. the set `admin`-flag propagation fans out to when `a` changes.
#[derive(Debug, Default)]
pub struct Topology {
    trackers: HashMap<ServerId, Vec<ServerId>>,
}

impl Topology {
    pub fn add_tracker(&mut self, tracked: ServerId, tracker: ServerId) {
        self.trackers.entry(tracked).or_default().push(tracker);
    }

    pub fn trackers_of(&self, id: ServerId) -> &[ServerId] {
        self.trackers.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trackers_of_is_empty_for_untracked_server() {
        let topology = Topology::default();

        assert!(topology.trackers_of(1).is_empty());
    }

    #[test]
    fn add_tracker_builds_one_to_many_fanout() {
        let mut topology = Topology::default();
        topology.add_tracker(1, 2);
        topology.add_tracker(1, 3);

        assert_eq!(topology.trackers_of(1), &[2, 3]);
    }
}
