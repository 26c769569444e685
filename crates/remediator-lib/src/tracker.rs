//! Restart attempt tracking
//!
//! Holds the per-pod count of consecutive restart attempts. Counts live in
//! process memory only and start from zero whenever the controller restarts.

use crate::models::PodIdentity;
use dashmap::DashMap;
use tracing::debug;

/// Key-value store of attempt counts, injected into the remediation engine
pub trait AttemptStore: Send + Sync {
    /// Atomically increment the count for `identity` and return the new value.
    /// A missing record counts as zero.
    fn increment(&self, identity: &PodIdentity) -> u32;

    /// Current count for `identity` (zero if absent)
    fn get(&self, identity: &PodIdentity) -> u32;

    /// All recorded identities and their counts
    fn snapshot(&self) -> Vec<(PodIdentity, u32)>;

    /// Number of identities with a record
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory attempt store backed by a concurrent map.
///
/// Increments take the map's per-entry lock, so concurrent workers
/// never lose an update for the same identity.
#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    attempts: DashMap<PodIdentity, u32>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self {
            attempts: DashMap::new(),
        }
    }
}

impl AttemptStore for InMemoryAttemptStore {
    fn increment(&self, identity: &PodIdentity) -> u32 {
        let mut entry = self.attempts.entry(identity.clone()).or_insert(0);
        let count = entry.saturating_add(1);
        *entry = count;
        debug!(pod = %identity, attempts = count, "Recorded restart attempt");
        count
    }

    fn get(&self, identity: &PodIdentity) -> u32 {
        self.attempts.get(identity).map(|r| *r).unwrap_or(0)
    }

    fn snapshot(&self) -> Vec<(PodIdentity, u32)> {
        let mut entries: Vec<_> = self
            .attempts
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect();
        entries.sort();
        entries
    }

    fn len(&self) -> usize {
        self.attempts.len()
    }
}
