//! Disk capacity guard.
//!
//! Runs once, before any working directory or artifact exists, so an
//! over-full volume fails the run fast and with nothing to clean up.

use std::path::Path;

use nix::sys::statvfs::statvfs;

use crate::errors::CapacityError;

/// Utilization snapshot of the working volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub used_percent: u8,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// Read-only check of volume utilization against a percentage threshold.
#[derive(Debug, Clone, Copy)]
pub struct CapacityGuard {
    threshold_percent: u8,
}

impl CapacityGuard {
    pub fn new(threshold_percent: u8) -> Self {
        Self { threshold_percent }
    }

    /// Fails with [`CapacityError::OverThreshold`] when utilization of the
    /// volume holding `path` is at or above the threshold.
    pub fn check(&self, path: &Path) -> Result<DiskUsage, CapacityError> {
        let stat = statvfs(path).map_err(|source| CapacityError::Statvfs {
            path: path.to_path_buf(),
            source,
        })?;

        let fragment = stat.fragment_size() as u64;
        let total = stat.blocks() as u64 * fragment;
        let available = stat.blocks_available() as u64 * fragment;
        let used = total.saturating_sub(stat.blocks_free() as u64 * fragment);

        let usage = DiskUsage {
            used_percent: used_percent(used, available),
            total_bytes: total,
            available_bytes: available,
        };

        if usage.used_percent >= self.threshold_percent {
            return Err(CapacityError::OverThreshold {
                used: usage.used_percent,
                limit: self.threshold_percent,
            });
        }
        Ok(usage)
    }
}

/// Utilization the way `df` reports it: used space over the space a
/// non-privileged writer can actually reach, rounded up.
fn used_percent(used: u64, available: u64) -> u8 {
    let reachable = used + available;
    if reachable == 0 {
        return 100;
    }
    used.saturating_mul(100).div_ceil(reachable).min(100) as u8
}
