//! `OverlayFS` management for the copy-on-write container rootfs.
//!
//! Stacks a writable upper layer over the read-only image rootfs and
//! presents the merged view as the container's root.

use std::path::{Path, PathBuf};

use iza_common::error::{IzaError, Result};

/// Directory layout for a single-lower `OverlayFS` mount.
#[derive(Debug, Clone)]
pub struct OverlayLayout {
    /// Read-only lower layer (the image rootfs).
    pub lower_dir: PathBuf,
    /// Writable upper layer directory.
    pub upper_dir: PathBuf,
    /// Work directory required by `OverlayFS`.
    pub work_dir: PathBuf,
    /// Final merged mount point.
    pub merged_dir: PathBuf,
}

impl OverlayLayout {
    /// Builds the standard `upper/`, `work/`, `merged/` layout inside a
    /// container workspace directory.
    #[must_use]
    pub fn in_workspace(workspace: &Path, lower_dir: impl Into<PathBuf>) -> Self {
        Self {
            lower_dir: lower_dir.into(),
            upper_dir: workspace.join("upper"),
            work_dir: workspace.join("work"),
            merged_dir: workspace.join("merged"),
        }
    }

    /// Renders the `mount(2)` option string for this layout.
    #[must_use]
    pub fn mount_options(&self) -> String {
        format!(
            "lowerdir={},upperdir={},workdir={}",
            self.lower_dir.display(),
            self.upper_dir.display(),
            self.work_dir.display()
        )
    }
}

/// Returns `true` if the running kernel advertises `OverlayFS` support.
#[must_use]
pub fn overlay_supported() -> bool {
    std::fs::read_to_string(iza_common::constants::PROC_FILESYSTEMS)
        .map(|contents| advertises_overlay(&contents))
        .unwrap_or(false)
}

/// Scans `/proc/filesystems` content for the `overlay` token.
#[must_use]
pub fn advertises_overlay(proc_filesystems: &str) -> bool {
    proc_filesystems
        .lines()
        .any(|line| line.split_whitespace().any(|token| token == "overlay"))
}

/// Mounts an `OverlayFS` with the given layout.
///
/// Creates the upper, work, and merged directories if they do not exist,
/// then issues the `mount(2)` syscall with overlay-specific options.
///
/// # Errors
///
/// Returns an error if directory creation fails or if the mount syscall
/// fails.
#[cfg(target_os = "linux")]
pub fn mount_overlay(layout: &OverlayLayout) -> Result<()> {
    use nix::mount::{mount, MsFlags};

    for dir in [&layout.upper_dir, &layout.work_dir, &layout.merged_dir] {
        std::fs::create_dir_all(dir).map_err(|e| IzaError::Io {
            path: dir.clone(),
            source: e,
        })?;
    }

    let opts = layout.mount_options();
    mount(
        Some("overlay"),
        &layout.merged_dir,
        Some("overlay"),
        MsFlags::empty(),
        Some(opts.as_str()),
    )
    .map_err(|e| IzaError::PermissionDenied {
        message: format!("overlay mount failed: {e}"),
    })?;

    tracing::info!(merged = %layout.merged_dir.display(), "overlayfs mounted");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — `OverlayFS` mounting requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn mount_overlay(_layout: &OverlayLayout) -> Result<()> {
    Err(IzaError::Config {
        message: "Linux required for overlay rootfs assembly".into(),
    })
}

/// Unmounts an `OverlayFS` at the given path.
///
/// Uses `MNT_DETACH` to lazily detach the filesystem. A target that is
/// not a mount point (or no longer exists) is not an error.
///
/// # Errors
///
/// Returns an error if the unmount syscall fails for any other reason.
#[cfg(target_os = "linux")]
pub fn unmount_overlay(merged_dir: &Path) -> Result<()> {
    use nix::errno::Errno;

    match nix::mount::umount2(merged_dir, nix::mount::MntFlags::MNT_DETACH) {
        Ok(()) => {
            tracing::info!(path = %merged_dir.display(), "overlayfs unmounted");
            Ok(())
        }
        Err(Errno::EINVAL | Errno::ENOENT) => Ok(()),
        Err(e) => Err(IzaError::PermissionDenied {
            message: format!("unmount overlay failed: {e}"),
        }),
    }
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — `OverlayFS` unmounting requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn unmount_overlay(_merged_dir: &Path) -> Result<()> {
    Err(IzaError::Config {
        message: "Linux required for overlay rootfs assembly".into(),
    })
}
