//! Usage trend and time-to-full forecasting.
//!
//! For each fixed lookback window the engine compares the earliest stored
//! sample inside the window against the mount's current availability and
//! derives the change direction, its magnitude, and — when the disk is
//! filling — a human-scale estimate of when it runs out.


use diskwatch_common::types::DiskSnapshot;
use diskwatch_storage::error::Result;
use diskwatch_storage::SampleStore;
use serde::Serialize;
use std::sync::Arc;

const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_YEAR: f64 = 365.2425 * SECONDS_PER_DAY;

/// A fixed lookback duration used for trend computation.
#[derive(Debug, Clone, Copy)]
pub struct LookbackWindow {
    pub label: &'static str,
    pub secs: i64,
}

/// The three windows every trend report covers, in report order.
pub const LOOKBACK_WINDOWS: [LookbackWindow; 3] = [
    LookbackWindow {
        label: "30d",
        secs: 2_592_000,
    },
    LookbackWindow {
        label: "7d",
        secs: 604_800,
    },
    LookbackWindow {
        label: "1d",
        secs: 86_400,
    },
];

/// Estimated time until a filling disk runs out of space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeToFull {
    /// No measurable consumption, or the disk is not filling.
    NotApplicable,
    Days(u64),
    Years(u64),
}

impl TimeToFull {
    /// Converts a seconds estimate into the coarser human-scale unit:
    /// years at or above one year (365.2425 days), days below.
    fn from_seconds(secs: f64) -> Self {
        if secs >= SECONDS_PER_YEAR {
            TimeToFull::Years((secs / SECONDS_PER_YEAR).round() as u64)
        } else {
            TimeToFull::Days((secs / SECONDS_PER_DAY).round() as u64)
        }
    }
}

impl std::fmt::Display for TimeToFull {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeToFull::NotApplicable => write!(f, "n/a"),
            TimeToFull::Days(1) => write!(f, "1 day"),
            TimeToFull::Days(n) => write!(f, "{n} days"),
            TimeToFull::Years(1) => write!(f, "1 year"),
            TimeToFull::Years(n) => write!(f, "{n} years"),
        }
    }
}

impl Serialize for TimeToFull {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Outcome of one lookback window for one mount.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowTrend {
    /// No historical sample inside the window. Expected for mounts newer
    /// than the window; not an error.
    InsufficientData,
    /// Availability grew or held steady over the window.
    Increasing { freed_bytes: u64 },
    /// Availability shrank over the window.
    Decreasing {
        consumed_bytes: u64,
        time_to_full: TimeToFull,
    },
}

/// One entry of a [`TrendReport`], labelled with its window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowReport {
    pub window: &'static str,
    #[serde(flatten)]
    pub trend: WindowTrend,
}

/// Trend results for one mount across all lookback windows, always in
/// {30d, 7d, 1d} order so the view layer can render a stable layout.
#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub mount: String,
    pub windows: Vec<WindowReport>,
}

/// Computes [`TrendReport`]s from the sample store and a current snapshot.
pub struct TrendEngine {
    store: Arc<SampleStore>,
}

impl TrendEngine {
    pub fn new(store: Arc<SampleStore>) -> Self {
        Self { store }
    }

    /// Evaluates every lookback window for `snapshot` as of `now` (seconds
    /// since epoch).
    ///
    /// # Errors
    ///
    /// Returns a storage error when a history read fails; "no data in
    /// window" is a [`WindowTrend::InsufficientData`] result, not an error.
    pub fn evaluate(&self, snapshot: &DiskSnapshot, now: i64) -> Result<TrendReport> {
        let mut windows = Vec::with_capacity(LOOKBACK_WINDOWS.len());
        for window in &LOOKBACK_WINDOWS {
            windows.push(WindowReport {
                window: window.label,
                trend: self.window_trend(snapshot, now, window)?,
            });
        }
        Ok(TrendReport {
            mount: snapshot.mount.clone(),
            windows,
        })
    }

    fn window_trend(
        &self,
        snapshot: &DiskSnapshot,
        now: i64,
        window: &LookbackWindow,
    ) -> Result<WindowTrend> {
        let window_start = now - window.secs;
        let Some(past) = self
            .store
            .first_sample_at_or_after(&snapshot.mount, window_start)?
        else {
            return Ok(WindowTrend::InsufficientData);
        };

        let current = snapshot.available_bytes;
        if current >= past.available_bytes {
            return Ok(WindowTrend::Increasing {
                freed_bytes: current - past.available_bytes,
            });
        }

        let consumed = past.available_bytes - current;
        // The sample's actual age, not the nominal window: the earliest
        // sample inside the window may be much newer than its start.
        let elapsed = now - past.timestamp;
        if elapsed <= 0 {
            return Ok(WindowTrend::InsufficientData);
        }

        let bytes_per_second = consumed as f64 / elapsed as f64;
        let time_to_full = if bytes_per_second == 0.0 {
            TimeToFull::NotApplicable
        } else {
            TimeToFull::from_seconds(current as f64 / bytes_per_second)
        };

        Ok(WindowTrend::Decreasing {
            consumed_bytes: consumed,
            time_to_full,
        })
    }
}
