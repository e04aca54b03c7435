use crate::state::SnapshotHandle;
use chrono::Utc;
use diskwatch_common::types::DiskSnapshot;
use diskwatch_stats::StatsProvider;
use diskwatch_storage::SampleStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{interval, timeout};

/// Per-mount outcomes of one sampling tick.
#[derive(Debug, Default)]
pub struct TickSummary {
    /// Mounts snapshotted and written this tick.
    pub sampled: usize,
    /// Mounts skipped because the provider could not read them.
    pub skipped: Vec<(String, String)>,
    /// Mounts snapshotted but whose sample write failed.
    pub write_failures: Vec<(String, String)>,
}

/// Background cadence loop: snapshots every watched mount each
/// `log_interval_secs` and appends one sample per mount, with the first
/// tick aligned to the phase of the previous run's samples.
pub struct Sampler {
    store: Arc<SampleStore>,
    snapshots: Arc<SnapshotHandle>,
    provider: Arc<Mutex<Box<dyn StatsProvider>>>,
    watchlist: Arc<Vec<String>>,
    log_interval_secs: u64,
    tick_timeout_secs: u64,
}

impl Sampler {
    pub fn new(
        store: Arc<SampleStore>,
        snapshots: Arc<SnapshotHandle>,
        provider: Box<dyn StatsProvider>,
        watchlist: Vec<String>,
        log_interval_secs: u64,
        tick_timeout_secs: u64,
    ) -> Self {
        Self {
            store,
            snapshots,
            provider: Arc::new(Mutex::new(provider)),
            watchlist: Arc::new(watchlist),
            log_interval_secs,
            tick_timeout_secs,
        }
    }

    /// How long to wait before the first tick so that the cadence keeps the
    /// phase established by a previous run.
    ///
    /// With no previous sample, ticking starts immediately. When the last
    /// sample is younger than one interval, the first tick lands exactly
    /// where the missed one would have; when it is older, the wait skips
    /// forward to the next phase boundary — overdue ticks are never
    /// replayed.
    pub fn initial_delay(now: i64, latest: Option<i64>, interval_secs: u64) -> Duration {
        let Some(latest) = latest else {
            return Duration::ZERO;
        };
        let interval = interval_secs as i64;
        let elapsed = now - latest;
        if elapsed < 0 {
            // Clock moved backwards since the last run; fall back to a
            // plain full interval.
            return Duration::from_secs(interval_secs);
        }
        if elapsed < interval {
            Duration::from_secs((interval - elapsed) as u64)
        } else {
            Duration::from_secs((interval - elapsed % interval) as u64)
        }
    }

    pub async fn run(self) {
        let delay = match self.store.latest_timestamp() {
            Ok(latest) => {
                Self::initial_delay(Utc::now().timestamp(), latest, self.log_interval_secs)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not read last sample time, sampling immediately");
                Duration::ZERO
            }
        };

        tracing::info!(
            interval_secs = self.log_interval_secs,
            mounts = self.watchlist.len(),
            delay_secs = delay.as_secs(),
            "Sampler started"
        );

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut tick = interval(Duration::from_secs(self.log_interval_secs));
        loop {
            tick.tick().await;

            let store = self.store.clone();
            let snapshots = self.snapshots.clone();
            let provider = self.provider.clone();
            let watchlist = self.watchlist.clone();

            // Snapshotting and writing are blocking work; run them off the
            // runtime and bound them so a stuck tick cannot stall the
            // cadence forever.
            let work = tokio::task::spawn_blocking(move || {
                let mut provider = provider
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let now = Utc::now().timestamp();
                let (set, summary) =
                    sample_once(provider.as_mut(), &store, &watchlist, now);
                snapshots.store(set);
                summary
            });

            match timeout(Duration::from_secs(self.tick_timeout_secs), work).await {
                Ok(Ok(summary)) => {
                    tracing::info!(
                        sampled = summary.sampled,
                        skipped = summary.skipped.len(),
                        failed_writes = summary.write_failures.len(),
                        "Sampling tick complete"
                    );
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Sampling tick panicked");
                }
                Err(_) => {
                    tracing::error!(
                        timeout_secs = self.tick_timeout_secs,
                        "Sampling tick timed out, skipping to next tick"
                    );
                }
            }
        }
    }
}

/// Snapshots every watched mount, in watchlist order. Unreadable mounts are
/// skipped and reported, never fatal.
pub fn snapshot_mounts(
    provider: &mut dyn StatsProvider,
    watchlist: &[String],
) -> (Vec<DiskSnapshot>, Vec<(String, String)>) {
    let mut set = Vec::with_capacity(watchlist.len());
    let mut skipped = Vec::new();
    for mount in watchlist {
        match provider.stats(mount) {
            Ok(stats) => {
                set.push(DiskSnapshot::new(
                    mount.clone(),
                    stats.total_bytes,
                    stats.available_bytes,
                ));
            }
            Err(e) => {
                tracing::warn!(mount = %mount, error = %e, "Skipping unreadable mount");
                skipped.push((mount.clone(), e.to_string()));
            }
        }
    }
    (set, skipped)
}

/// One full sampling pass: snapshot all mounts, then write one sample per
/// reachable mount at `now`. Writes are independent — a failed insert is
/// recorded and the rest of the batch continues.
pub fn sample_once(
    provider: &mut dyn StatsProvider,
    store: &SampleStore,
    watchlist: &[String],
    now: i64,
) -> (Vec<DiskSnapshot>, TickSummary) {
    let (set, skipped) = snapshot_mounts(provider, watchlist);
    let mut summary = TickSummary {
        skipped,
        ..TickSummary::default()
    };

    for snapshot in &set {
        match store.insert(&snapshot.mount, now, snapshot.available_bytes) {
            Ok(()) => summary.sampled += 1,
            Err(e) => {
                tracing::error!(mount = %snapshot.mount, error = %e, "Failed to write sample");
                summary
                    .write_failures
                    .push((snapshot.mount.clone(), e.to_string()));
            }
        }
    }

    (set, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diskwatch_stats::{FilesystemStats, ProviderError};
    use std::collections::HashMap;

    struct ScriptedProvider {
        mounts: HashMap<String, FilesystemStats>,
    }

    impl ScriptedProvider {
        fn new(mounts: &[(&str, u64, u64)]) -> Self {
            Self {
                mounts: mounts
                    .iter()
                    .map(|(mount, total, available)| {
                        (
                            mount.to_string(),
                            FilesystemStats {
                                total_bytes: *total,
                                available_bytes: *available,
                            },
                        )
                    })
                    .collect(),
            }
        }
    }

    impl StatsProvider for ScriptedProvider {
        fn stats(&mut self, mount: &str) -> Result<FilesystemStats, ProviderError> {
            self.mounts
                .get(mount)
                .copied()
                .ok_or_else(|| ProviderError::MountNotFound(mount.to_string()))
        }
    }

    fn watchlist(mounts: &[&str]) -> Vec<String> {
        mounts.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn first_run_ticks_immediately() {
        assert_eq!(Sampler::initial_delay(1_000_000, None, 900), Duration::ZERO);
    }

    #[test]
    fn recent_sample_resumes_the_missed_phase() {
        // Last sample 300s ago with a 900s interval: next tick in 600s.
        let now = 1_000_000;
        let delay = Sampler::initial_delay(now, Some(now - 300), 900);
        assert_eq!(delay, Duration::from_secs(600));
    }

    #[test]
    fn stale_sample_skips_to_the_next_phase_boundary() {
        // 2000s elapsed on a 900s cadence: 200s into the current phase,
        // next boundary in 700s. The overdue tick is not replayed.
        let now = 1_000_000;
        let delay = Sampler::initial_delay(now, Some(now - 2000), 900);
        assert_eq!(delay, Duration::from_secs(700));
    }

    #[test]
    fn exact_boundary_waits_one_full_interval() {
        let now = 1_000_000;
        let delay = Sampler::initial_delay(now, Some(now - 1800), 900);
        assert_eq!(delay, Duration::from_secs(900));
    }

    #[test]
    fn future_timestamp_falls_back_to_full_interval() {
        let now = 1_000_000;
        let delay = Sampler::initial_delay(now, Some(now + 50), 900);
        assert_eq!(delay, Duration::from_secs(900));
    }

    #[test]
    fn unreachable_mount_does_not_block_the_others() {
        let store = SampleStore::open_in_memory().unwrap();
        let mut provider =
            ScriptedProvider::new(&[("/", 1000, 500), ("/data", 2000, 1500)]);
        let mounts = watchlist(&["/", "/gone", "/data"]);

        let (set, summary) = sample_once(&mut provider, &store, &mounts, 100);

        assert_eq!(set.len(), 2);
        assert_eq!(summary.sampled, 2);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].0, "/gone");
        assert!(summary.write_failures.is_empty());

        assert_eq!(store.history("/", None).unwrap().len(), 1);
        assert_eq!(store.history("/data", None).unwrap().len(), 1);
        assert!(store.history("/gone", None).unwrap().is_empty());
    }

    #[test]
    fn snapshots_keep_watchlist_order() {
        let mut provider = ScriptedProvider::new(&[
            ("/b", 1000, 500),
            ("/a", 1000, 500),
            ("/c", 1000, 500),
        ]);
        let mounts = watchlist(&["/b", "/a", "/c"]);

        let (set, skipped) = snapshot_mounts(&mut provider, &mounts);
        let order: Vec<&str> = set.iter().map(|s| s.mount.as_str()).collect();
        assert_eq!(order, ["/b", "/a", "/c"]);
        assert!(skipped.is_empty());
    }

    #[test]
    fn every_tick_writes_one_sample_per_mount() {
        let store = SampleStore::open_in_memory().unwrap();
        let mut provider = ScriptedProvider::new(&[("/", 1000, 500)]);
        let mounts = watchlist(&["/"]);

        sample_once(&mut provider, &store, &mounts, 100);
        sample_once(&mut provider, &store, &mounts, 1000);

        let history = store.history("/", None).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp, 100);
        assert_eq!(history[1].timestamp, 1000);
        assert_eq!(store.latest_timestamp().unwrap(), Some(1000));
    }
}
