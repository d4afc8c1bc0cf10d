//! Container instance lifecycle.
//!
//! One `run` invocation is one [`ContainerInstance`]: it assembles the
//! rootfs, prepares the cgroup scope when limits were requested, clones
//! the child, waits for it, and tears everything down in reverse order
//! of acquisition, on the happy path and on every failure path.

use std::fmt;
use std::path::PathBuf;

use iza_common::error::Result;
use iza_common::types::{ContainerId, ResourceLimits};
use iza_core::cgroup::CgroupScope;
use iza_core::filesystem::rootfs::{self, RootfsHandle};
use iza_core::namespace::NamespaceConfig;

/// Everything a single container run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Immutable image rootfs the container is derived from.
    pub image_rootfs: PathBuf,
    /// Directory holding per-container overlay workspaces.
    pub overlay_root: PathBuf,
    /// Requested resource limits; empty means no cgroup is created.
    pub limits: ResourceLimits,
    /// Command and arguments to execute inside the container.
    pub command: Vec<String>,
    /// Namespace selection for the child.
    pub namespaces: NamespaceConfig,
}

/// Lifecycle state of a container instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    /// Instance exists; nothing allocated yet.
    Created,
    /// The writable rootfs has been assembled.
    RootfsReady,
    /// The cgroup scope exists with limits applied.
    CgroupReady,
    /// The child process is running.
    ChildRunning,
    /// The child has been reaped.
    ChildExited,
    /// All owned resources have been released. Terminal.
    CleanedUp,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::RootfsReady => write!(f, "rootfs-ready"),
            Self::CgroupReady => write!(f, "cgroup-ready"),
            Self::ChildRunning => write!(f, "child-running"),
            Self::ChildExited => write!(f, "child-exited"),
            Self::CleanedUp => write!(f, "cleaned-up"),
        }
    }
}

/// The ephemeral record of one `run` invocation.
#[derive(Debug)]
pub struct ContainerInstance {
    /// Unique identifier (`<pid>-<epoch>`).
    pub id: ContainerId,
    /// Current lifecycle state.
    pub state: ContainerState,
    rootfs: Option<RootfsHandle>,
    cgroup: Option<CgroupScope>,
    /// PID of the cloned child, once it exists.
    pub child_pid: Option<i32>,
}

impl Default for ContainerInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerInstance {
    /// Creates a new instance in the `Created` state with an ID derived
    /// from the current process.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ContainerId::for_current_process(),
            state: ContainerState::Created,
            rootfs: None,
            cgroup: None,
            child_pid: None,
        }
    }

    /// Runs the container to completion and returns the exit code to
    /// surface (the child's own, or `128 + N` for death by signal N).
    ///
    /// Whatever has been allocated is torn down before this returns,
    /// error or not: cgroup scope first, rootfs workspace second.
    ///
    /// # Errors
    ///
    /// Returns an error if rootfs assembly, cgroup setup, or process
    /// creation fails.
    #[cfg(target_os = "linux")]
    pub fn run(mut self, config: &RunConfig) -> Result<i32> {
        use crate::launcher;

        tracing::info!(id = %self.id, command = ?config.command, "starting container");

        let handle = rootfs::assemble(&config.overlay_root, &config.image_rootfs, &self.id)
            .map_err(|e| self.fail(e))?;
        let rootfs_path = handle.rootfs().to_path_buf();
        self.rootfs = Some(handle);
        self.state = ContainerState::RootfsReady;

        if !config.limits.is_empty() {
            let scope = CgroupScope::create(&self.id).map_err(|e| self.fail(e))?;
            let applied = scope.apply_limits(&config.limits);
            self.cgroup = Some(scope);
            applied.map_err(|e| self.fail(e))?;
            self.state = ContainerState::CgroupReady;
        }

        let pid = launcher::spawn(&rootfs_path, &config.command, &config.namespaces)
            .map_err(|e| self.fail(e))?;
        self.child_pid = Some(pid.as_raw());
        self.state = ContainerState::ChildRunning;

        // attach immediately after clone returns; the child's first
        // actions (hostname, chroot) are limit-insensitive
        if let Some(cgroup) = &self.cgroup {
            if let Err(e) = cgroup.attach(pid.as_raw()) {
                tracing::warn!(error = %e, "could not attach child to cgroup");
            }
        }

        let code = launcher::wait_for_exit(pid).map_err(|e| self.fail(e))?;
        self.state = ContainerState::ChildExited;
        tracing::info!(id = %self.id, code, "container exited");

        self.cleanup();
        Ok(code)
    }

    /// Stub for non-Linux platforms.
    ///
    /// # Errors
    ///
    /// Always returns an error — container execution requires Linux.
    #[cfg(not(target_os = "linux"))]
    pub fn run(self, _config: &RunConfig) -> Result<i32> {
        Err(iza_common::error::IzaError::Config {
            message: "Linux required for container execution".into(),
        })
    }

    /// Releases everything this instance still owns, in reverse order
    /// of acquisition. Idempotent; errors are logged, never returned.
    pub fn cleanup(&mut self) {
        if let Some(cgroup) = self.cgroup.as_mut() {
            cgroup.destroy();
        }
        self.cgroup = None;

        if let Some(rootfs) = self.rootfs.as_mut() {
            rootfs.teardown();
        }
        self.rootfs = None;

        self.state = ContainerState::CleanedUp;
    }

    /// Records a failure: cleans up and passes the error through.
    fn fail(&mut self, err: iza_common::error::IzaError) -> iza_common::error::IzaError {
        tracing::warn!(id = %self.id, state = %self.state, error = %err, "container setup failed");
        self.cleanup();
        err
    }
}
