use chrono::{DateTime, Utc};
use diskwatch_common::types::DiskSnapshot;
use diskwatch_storage::SampleStore;
use diskwatch_trend::TrendEngine;
use std::sync::{Arc, RwLock};

/// Shared handle to the current snapshot set.
///
/// The snapshot vector is immutable once published: the sampler replaces
/// the whole `Arc` on each refresh and readers clone it, so a reader sees
/// either the previous complete set or the new one, never a mix.
pub struct SnapshotHandle {
    inner: RwLock<Arc<Vec<DiskSnapshot>>>,
}

impl SnapshotHandle {
    pub fn new(initial: Vec<DiskSnapshot>) -> Self {
        Self {
            inner: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn load(&self) -> Arc<Vec<DiskSnapshot>> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn store(&self, snapshots: Vec<DiskSnapshot>) {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(snapshots);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub snapshots: Arc<SnapshotHandle>,
    pub store: Arc<SampleStore>,
    pub trend: Arc<TrendEngine>,
    pub start_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_see_whole_sets_only() {
        let handle = SnapshotHandle::new(vec![DiskSnapshot::new("/", 100, 50)]);
        let before = handle.load();

        handle.store(vec![
            DiskSnapshot::new("/", 100, 40),
            DiskSnapshot::new("/data", 200, 10),
        ]);

        // The old Arc is unchanged; a fresh load sees the new set.
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].available_bytes, 50);
        let after = handle.load();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].available_bytes, 40);
    }
}
