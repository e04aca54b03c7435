//! The filesystem stats boundary for diskwatch.
//!
//! The sampler talks to mounts exclusively through [`StatsProvider`]; the
//! default implementation ([`SysinfoStatsProvider`]) reads block counts via
//! the `sysinfo` disk list. Tests substitute a scripted provider.

use std::path::Path;
use sysinfo::Disks;

/// Raw byte counts for one filesystem, as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilesystemStats {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// Errors from the stats boundary.
///
/// Every variant is recoverable: the sampler skips the affected mount for
/// the current cycle and continues with the rest of the watchlist.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The path is not a mount point known to the system, or it became
    /// inaccessible (unmounted, permission lost) since the last cycle.
    #[error("mount '{0}' is not accessible")]
    MountNotFound(String),
}

/// Supplier of current usage figures for a mount path.
///
/// Implementations take `&mut self` because refreshing OS disk state is a
/// stateful operation; the sampler is the sole owner.
pub trait StatsProvider: Send {
    /// Returns current byte counts for `mount`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MountNotFound`] when the mount cannot be
    /// read this cycle.
    fn stats(&mut self, mount: &str) -> Result<FilesystemStats, ProviderError>;
}

/// [`StatsProvider`] backed by the `sysinfo` disk list.
pub struct SysinfoStatsProvider {
    disks: Disks,
}

impl SysinfoStatsProvider {
    pub fn new() -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoStatsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsProvider for SysinfoStatsProvider {
    fn stats(&mut self, mount: &str) -> Result<FilesystemStats, ProviderError> {
        self.disks.refresh_list();
        let wanted = Path::new(mount);
        self.disks
            .iter()
            .find(|disk| disk.mount_point() == wanted)
            .map(|disk| FilesystemStats {
                total_bytes: disk.total_space(),
                available_bytes: disk.available_space(),
            })
            .ok_or_else(|| ProviderError::MountNotFound(mount.to_string()))
    }
}
