use bytesize::ByteSize;
use serde::{Deserialize, Serialize};

/// Current usage figures for one watched mount.
///
/// Snapshots are recomputed on every sampler tick and replaced as a whole;
/// they are never persisted as a struct (only `available_bytes` is logged,
/// as a [`Sample`]).
///
/// # Examples
///
/// ```
/// use diskwatch_common::types::DiskSnapshot;
///
/// let snap = DiskSnapshot::new("/data", 1000, 250);
/// assert_eq!(snap.used_bytes, 750);
/// assert_eq!(snap.percent_used, 75);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskSnapshot {
    pub mount: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    /// Rounded percentage in 0..=100. Zero when `total_bytes` is zero.
    pub percent_used: u8,
}

impl DiskSnapshot {
    pub fn new(mount: impl Into<String>, total_bytes: u64, available_bytes: u64) -> Self {
        let used_bytes = total_bytes.saturating_sub(available_bytes);
        let percent_used = if total_bytes > 0 {
            ((used_bytes as f64 / total_bytes as f64) * 100.0).round() as u8
        } else {
            0
        };
        Self {
            mount: mount.into(),
            total_bytes,
            available_bytes,
            used_bytes,
            percent_used,
        }
    }
}

/// One persisted (mount, timestamp, available-bytes) observation.
///
/// Immutable once written. `(mount, timestamp)` is treated as unique per
/// write cycle, but the store does not enforce it; duplicate timestamps for
/// the same mount are tolerated and ordering by timestamp resolves ties
/// arbitrarily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub mount: String,
    /// Seconds since the Unix epoch, UTC.
    pub timestamp: i64,
    pub available_bytes: u64,
}

/// Render a byte count with IEC units, e.g. `"1.5 GiB"`.
pub fn format_bytes(bytes: u64) -> String {
    ByteSize(bytes).display().iec().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_invariants_hold_for_valid_inputs() {
        for (total, available) in [
            (1u64, 0u64),
            (1, 1),
            (1000, 250),
            (1000, 1000),
            (u64::MAX, 0),
            (u64::MAX, u64::MAX),
        ] {
            let snap = DiskSnapshot::new("/", total, available);
            assert_eq!(snap.used_bytes + snap.available_bytes, snap.total_bytes);
            assert!(snap.percent_used <= 100, "percent out of range for ({total}, {available})");
        }
    }

    #[test]
    fn snapshot_percent_rounds() {
        assert_eq!(DiskSnapshot::new("/", 1000, 995).percent_used, 1); // 0.5% rounds up
        assert_eq!(DiskSnapshot::new("/", 3, 1).percent_used, 67);
    }

    #[test]
    fn zero_total_does_not_divide() {
        let snap = DiskSnapshot::new("/", 0, 0);
        assert_eq!(snap.percent_used, 0);
        assert_eq!(snap.used_bytes, 0);
    }

    #[test]
    fn bytes_render_as_iec() {
        assert_eq!(format_bytes(1024), "1.0 KiB");
        assert_eq!(format_bytes(1_073_741_824), "1.0 GiB");
    }
}
