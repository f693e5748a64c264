//! Shared stores: deduplication set and topology peer list.
//!
//! Both are guarded by their own short-held lock so handler tasks can run
//! concurrently. Neither lock is ever held across a transport send.

use std::collections::HashSet;

use parking_lot::{Mutex, RwLock};
use rumor_proto::Value;

/// The set of values this node has already observed.
///
/// Membership is monotone for the process lifetime: once inserted, a value
/// is never evicted, since deduplication must hold for the entire run.
#[derive(Debug, Default)]
pub struct DedupStore {
    seen: Mutex<HashSet<Value>>,
}

impl DedupStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically checks membership and inserts if absent.
    ///
    /// Returns `true` iff the value was previously unseen.
    pub fn observe(&self, value: Value) -> bool {
        self.seen.lock().insert(value)
    }

    /// Returns a copy of every value seen so far, sorted for deterministic
    /// replies. Callers never observe the live set.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Value> {
        let mut values: Vec<Value> = self.seen.lock().iter().copied().collect();
        values.sort_unstable();
        values
    }

    /// Number of distinct values seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    /// Returns true if no value has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}

/// This node's current gossip targets.
///
/// A topology update replaces the list wholesale; readers never see a
/// partially applied update. Empty until the first assignment, which leaves
/// fan-out a no-op (degraded, not an error).
#[derive(Debug, Default)]
pub struct TopologyStore {
    peers: RwLock<Vec<String>>,
}

impl TopologyStore {
    /// Creates a store with no peers assigned.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the active peer list.
    pub fn set_peers(&self, peers: Vec<String>) {
        *self.peers.write() = peers;
    }

    /// Returns a defensive copy of the current peer list.
    #[must_use]
    pub fn current_peers(&self) -> Vec<String> {
        self.peers.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;

    // ========== DedupStore Tests ==========

    #[test]
    fn observe_is_idempotent() {
        let store = DedupStore::new();

        assert!(store.observe(5));
        assert!(!store.observe(5));
        assert_eq!(store.snapshot(), vec![5]);
    }

    #[test_case(&[], &[]; "empty")]
    #[test_case(&[3, 1, 2], &[1, 2, 3]; "sorted")]
    #[test_case(&[7, 7, 7], &[7]; "duplicates collapse")]
    fn snapshot_reflects_observations(observed: &[Value], expected: &[Value]) {
        let store = DedupStore::new();
        for &v in observed {
            store.observe(v);
        }
        assert_eq!(store.snapshot(), expected);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let store = DedupStore::new();
        store.observe(1);

        let before = store.snapshot();
        store.observe(2);

        assert_eq!(before, vec![1]);
        assert_eq!(store.snapshot(), vec![1, 2]);
    }

    #[test]
    fn concurrent_observe_admits_each_value_once() {
        let store = Arc::new(DedupStore::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                (0..100).filter(|&v| store.observe(v)).count()
            }));
        }

        let total_new: usize = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .sum();

        assert_eq!(total_new, 100);
        assert_eq!(store.len(), 100);
    }

    // ========== TopologyStore Tests ==========

    #[test]
    fn peers_empty_until_assigned() {
        let store = TopologyStore::new();
        assert!(store.current_peers().is_empty());
    }

    #[test]
    fn set_peers_replaces_wholesale() {
        let store = TopologyStore::new();

        store.set_peers(vec!["n2".into(), "n3".into()]);
        store.set_peers(vec!["n4".into()]);

        assert_eq!(store.current_peers(), vec!["n4".to_string()]);
    }

    #[test]
    fn current_peers_is_a_copy() {
        let store = TopologyStore::new();
        store.set_peers(vec!["n2".into()]);

        let mut copy = store.current_peers();
        copy.push("n9".into());

        assert_eq!(store.current_peers(), vec!["n2".to_string()]);
    }

    // ========== Proptest ==========

    proptest! {
        #[test]
        fn admission_count_equals_unique_values(values in prop::collection::vec(any::<Value>(), 0..200)) {
            let store = DedupStore::new();
            let admitted = values.iter().filter(|&&v| store.observe(v)).count();

            let unique: HashSet<Value> = values.iter().copied().collect();
            prop_assert_eq!(admitted, unique.len());
            prop_assert_eq!(store.snapshot().len(), unique.len());
        }
    }
}
