//! Versioned reference data.
//!
//! A [`ReferenceSnapshot`] is immutable once built. [`SnapshotStore`] hands out
//! `Arc` clones of the current snapshot, so a request keeps the version it
//! started with while a refresh is published.

use std::sync::{Arc, RwLock};

use crate::locality::LocalityProfileStore;
use crate::types::HistoricalRecord;

/// Locality profiles and price history at one version.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSnapshot {
    pub version: u64,
    pub profiles: LocalityProfileStore,
    pub history: Vec<HistoricalRecord>,
}

impl ReferenceSnapshot {
    pub fn new(version: u64, profiles: LocalityProfileStore, history: Vec<HistoricalRecord>) -> Self {
        Self {
            version,
            profiles,
            history,
        }
    }

    /// Built-in MMR profiles with no history.
    pub fn builtin() -> Self {
        Self::new(1, LocalityProfileStore::mmr_default(), Vec::new())
    }
}

impl Default for ReferenceSnapshot {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Holder of the current reference snapshot.
pub struct SnapshotStore {
    current: RwLock<Arc<ReferenceSnapshot>>,
}

impl SnapshotStore {
    pub fn new(snapshot: ReferenceSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot.
    pub fn current(&self) -> Arc<ReferenceSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Current snapshot version.
    pub fn version(&self) -> u64 {
        self.current().version
    }

    /// Replace the snapshot. The published version is always newer than the
    /// previous one. Returns the version assigned.
    pub fn publish(&self, profiles: LocalityProfileStore, history: Vec<HistoricalRecord>) -> u64 {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let version = guard.version + 1;
        *guard = Arc::new(ReferenceSnapshot::new(version, profiles, history));

        tracing::info!(
            version,
            localities = guard.profiles.len(),
            observations = guard.history.len(),
            "Published reference snapshot"
        );
        version
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(ReferenceSnapshot::builtin())
    }
}
