//! CPU resource control via cgroups v2.
//!
//! Manages the `cpu.max` control file.

use std::path::Path;

use iza_common::error::{IzaError, Result};

/// Sets the CPU bandwidth limit (quota microseconds per period) for a
/// cgroup by writing `<quota> <period>` to `cpu.max`.
///
/// # Errors
///
/// Returns an error if writing to `cpu.max` fails.
pub fn set_cpu_max(cgroup_path: &Path, quota_us: u64, period_us: u64) -> Result<()> {
    let file = cgroup_path.join("cpu.max");
    std::fs::write(&file, format!("{quota_us} {period_us}")).map_err(|e| IzaError::Io {
        path: file,
        source: e,
    })?;
    tracing::debug!(quota_us, period_us, "cpu max limit set");
    Ok(())
}
