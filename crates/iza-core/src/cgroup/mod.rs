//! Cgroups v2 resource management.
//!
//! Creates a per-container scope under the unified hierarchy at
//! `/sys/fs/cgroup`, writes memory and CPU limits, and attaches the
//! container process to it.

pub mod cpu;
pub mod memory;

use std::path::{Path, PathBuf};

use iza_common::error::Result;
use iza_common::types::{ContainerId, ResourceLimits};

/// Handle to the cgroup scope of a single container.
///
/// The scope is removed when [`CgroupScope::destroy`] is called; dropping
/// an undestroyed scope removes it as a backstop. Removal failures are
/// logged, never fatal; the kernel collects an empty scope eventually.
#[derive(Debug)]
pub struct CgroupScope {
    /// Path to this container's cgroup directory.
    path: PathBuf,
    /// Whether the directory still exists and is owned by this handle.
    created: bool,
}

impl CgroupScope {
    /// Returns the scope directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(target_os = "linux")]
impl CgroupScope {
    /// Creates the cgroup scope for the given container ID.
    ///
    /// The scope is placed at `/sys/fs/cgroup/iza-<id>` with mode 0755.
    /// Enabling the `memory` and `cpu` controllers in
    /// `cgroup.subtree_control` is attempted but not required; some
    /// kernels enforce limits without explicit enablement.
    ///
    /// # Errors
    ///
    /// Returns an error if the unified hierarchy is absent or the scope
    /// directory cannot be created.
    pub fn create(container_id: &ContainerId) -> Result<Self> {
        use std::os::unix::fs::DirBuilderExt;

        if !Path::new(iza_common::constants::CGROUP_CONTROLLERS_FILE).exists() {
            return Err(iza_common::error::IzaError::Config {
                message: format!(
                    "cgroup v2 unified hierarchy not available at {}",
                    iza_common::constants::CGROUP_V2_PATH
                ),
            });
        }

        let path = PathBuf::from(iza_common::constants::CGROUP_V2_PATH).join(format!(
            "{}{container_id}",
            iza_common::constants::CGROUP_NAME_PREFIX
        ));
        std::fs::DirBuilder::new()
            .mode(0o755)
            .create(&path)
            .map_err(|e| iza_common::error::IzaError::Io {
                path: path.clone(),
                source: e,
            })?;

        let subtree = path.join("cgroup.subtree_control");
        if let Err(e) = std::fs::write(&subtree, "+memory +cpu") {
            tracing::warn!(error = %e, "could not enable cgroup controllers");
        }

        tracing::info!(path = %path.display(), "cgroup created");
        Ok(Self {
            path,
            created: true,
        })
    }

    /// Writes the hard memory limit for this scope.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `memory.max` fails.
    pub fn set_memory(&self, bytes: u64) -> Result<()> {
        memory::set_memory_max(&self.path, bytes)
    }

    /// Writes the CPU bandwidth limit for this scope.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `cpu.max` fails.
    pub fn set_cpu(&self, cpu: iza_common::limits::CpuMax) -> Result<()> {
        cpu::set_cpu_max(&self.path, cpu.quota_us, cpu.period_us)
    }

    /// Applies every requested limit to this scope.
    ///
    /// # Errors
    ///
    /// Returns an error if writing any cgroup control file fails.
    pub fn apply_limits(&self, limits: &ResourceLimits) -> Result<()> {
        if let Some(bytes) = limits.memory_bytes {
            self.set_memory(bytes)?;
        }
        if let Some(cpu) = limits.cpu {
            self.set_cpu(cpu)?;
        }
        Ok(())
    }

    /// Adds a process to this scope by writing its PID to `cgroup.procs`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `cgroup.procs` fails.
    pub fn attach(&self, pid: i32) -> Result<()> {
        let procs_path = self.path.join("cgroup.procs");
        std::fs::write(&procs_path, pid.to_string()).map_err(|e| {
            iza_common::error::IzaError::Io {
                path: procs_path,
                source: e,
            }
        })?;
        tracing::debug!(pid, "added process to cgroup");
        Ok(())
    }

    /// Removes the scope directory.
    ///
    /// Must run after the attached process has been reaped, which
    /// guarantees the scope is empty. A removal failure is logged and
    /// otherwise ignored.
    pub fn destroy(&mut self) {
        if !self.created {
            return;
        }
        self.created = false;
        match std::fs::remove_dir(&self.path) {
            Ok(()) => tracing::info!(path = %self.path.display(), "cgroup destroyed"),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "cgroup removal failed; kernel will collect it once empty"
                );
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
impl CgroupScope {
    /// Stub for non-Linux platforms.
    ///
    /// # Errors
    ///
    /// Always returns an error — cgroup management requires Linux.
    pub fn create(_container_id: &ContainerId) -> Result<Self> {
        Err(iza_common::error::IzaError::Config {
            message: "Linux required for container resource limits".into(),
        })
    }

    /// Stub for non-Linux platforms.
    ///
    /// # Errors
    ///
    /// Always returns an error — cgroup management requires Linux.
    pub fn apply_limits(&self, _limits: &ResourceLimits) -> Result<()> {
        Err(iza_common::error::IzaError::Config {
            message: "Linux required for container resource limits".into(),
        })
    }

    /// Stub for non-Linux platforms.
    ///
    /// # Errors
    ///
    /// Always returns an error — cgroup management requires Linux.
    pub fn attach(&self, _pid: i32) -> Result<()> {
        Err(iza_common::error::IzaError::Config {
            message: "Linux required for container resource limits".into(),
        })
    }

    /// Stub for non-Linux platforms.
    pub fn destroy(&mut self) {
        self.created = false;
    }
}

impl Drop for CgroupScope {
    fn drop(&mut self) {
        if self.created {
            self.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_path_uses_iza_prefix_and_container_id() {
        let scope = CgroupScope {
            path: PathBuf::from(iza_common::constants::CGROUP_V2_PATH).join("iza-42-1700000000"),
            created: false,
        };
        assert_eq!(scope.path(), Path::new("/sys/fs/cgroup/iza-42-1700000000"));
    }
}
