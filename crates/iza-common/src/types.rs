//! Domain primitive types used across the iza workspace.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::limits::CpuMax;

/// Unique identifier for a container invocation.
///
/// The identifier is derived from the parent PID and the wall-clock epoch
/// second, which is unique enough for a single-shot runtime and keeps the
/// cgroup scope and overlay workspace names correlated with the process
/// that created them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates the ID for the current invocation (`<pid>-<epoch>`).
    #[must_use]
    pub fn for_current_process() -> Self {
        let epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(format!("{}-{epoch}", std::process::id()))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resource limits applied to a container's cgroup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Hard memory limit in bytes.
    pub memory_bytes: Option<u64>,
    /// CPU bandwidth limit.
    pub cpu: Option<CpuMax>,
}

impl ResourceLimits {
    /// Returns `true` if no limit has been requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memory_bytes.is_none() && self.cpu.is_none()
    }
}
