//! System-wide constants and default paths.

/// Default base directory for iza data.
pub const DEFAULT_DATA_DIR: &str = "/var/lib/iza";

/// Default directory holding extracted image records.
pub const DEFAULT_IMAGES_DIR: &str = "/var/lib/iza/images";

/// Default directory holding downloaded archives.
pub const DEFAULT_CACHE_DIR: &str = "/var/lib/iza/cache";

/// Default directory holding per-container overlay workspaces.
pub const DEFAULT_OVERLAY_DIR: &str = "/var/lib/iza/overlay";

/// Cgroups v2 unified hierarchy mount point.
pub const CGROUP_V2_PATH: &str = "/sys/fs/cgroup";

/// File whose presence indicates a cgroup-v2 unified hierarchy.
pub const CGROUP_CONTROLLERS_FILE: &str = "/sys/fs/cgroup/cgroup.controllers";

/// Prefix for per-container cgroup scope directories.
pub const CGROUP_NAME_PREFIX: &str = "iza-";

/// Fixed CPU bandwidth period written to `cpu.max`, in microseconds.
pub const CPU_PERIOD_US: u64 = 100_000;

/// Hostname set inside the container's UTS namespace.
pub const CONTAINER_HOSTNAME: &str = "iza-container";

/// Stack size for the cloned container child, in bytes.
pub const CHILD_STACK_SIZE: usize = 1024 * 1024;

/// Tag assumed when an image reference carries none.
pub const DEFAULT_TAG: &str = "latest";

/// Command executed when `run` is given an image but no command.
pub const DEFAULT_COMMAND: &str = "/bin/bash";

/// Kernel file listing supported filesystem types.
pub const PROC_FILESYSTEMS: &str = "/proc/filesystems";

/// User-Agent header sent with image downloads.
pub const USER_AGENT: &str = concat!("iza/", env!("CARGO_PKG_VERSION"));

/// Application name used in CLI output.
pub const APP_NAME: &str = "iza";
