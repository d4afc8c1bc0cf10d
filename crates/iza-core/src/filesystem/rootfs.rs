//! Per-container rootfs assembly and teardown.
//!
//! Strategy selection is transparent to the caller: if the kernel
//! advertises `OverlayFS` the assembler mounts a copy-on-write overlay
//! over the image rootfs; otherwise (or when the mount itself fails) it
//! falls back to a private deep copy.

use std::path::{Path, PathBuf};

use iza_common::error::{IzaError, Result};
use iza_common::types::ContainerId;

use super::copy;
use super::overlayfs::{self, OverlayLayout};

/// Handle to an assembled container rootfs.
///
/// Teardown is safe to call exactly once regardless of strategy, and safe
/// after a partial assembly; dropping an untorn-down handle tears it down
/// as a backstop. Teardown failures are logged, never fatal.
#[derive(Debug)]
pub struct RootfsHandle {
    /// Per-container workspace directory owning all assembled state.
    workspace: PathBuf,
    /// The directory the container will use as `/`.
    rootfs: PathBuf,
    /// Whether `rootfs` is an overlay mount point that needs unmounting.
    overlay_mounted: bool,
    torn_down: bool,
}

impl RootfsHandle {
    /// Returns the path the container should use as its root.
    #[must_use]
    pub fn rootfs(&self) -> &Path {
        &self.rootfs
    }

    /// Unmounts the overlay (if one was mounted) and removes the
    /// container workspace. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if self.overlay_mounted {
            if let Err(e) = overlayfs::unmount_overlay(&self.rootfs) {
                tracing::warn!(error = %e, "overlay unmount failed during teardown");
            }
        }

        match std::fs::remove_dir_all(&self.workspace) {
            Ok(()) => tracing::debug!(path = %self.workspace.display(), "rootfs workspace removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.workspace.display(),
                    error = %e,
                    "rootfs workspace removal failed"
                );
            }
        }
    }
}

impl Drop for RootfsHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Assembles a writable rootfs for one container.
///
/// The workspace is created at `<overlay_root>/<container_id>/`. With
/// overlay support it holds `upper/`, `work/`, and the `merged/` mount;
/// with the deep-copy fallback it holds a private `rootfs/` copy.
///
/// # Errors
///
/// Returns an error if both strategies fail; a partial workspace is
/// removed before returning.
pub fn assemble(
    overlay_root: &Path,
    image_rootfs: &Path,
    container_id: &ContainerId,
) -> Result<RootfsHandle> {
    let workspace = overlay_root.join(container_id.as_str());

    if overlayfs::overlay_supported() {
        match assemble_overlay(&workspace, image_rootfs) {
            Ok(handle) => return Ok(handle),
            Err(e) => {
                tracing::warn!(error = %e, "overlay assembly failed; falling back to deep copy");
                remove_partial(&workspace);
            }
        }
    } else {
        tracing::debug!("kernel does not advertise overlay; using deep copy");
    }

    assemble_deep_copy(&workspace, image_rootfs)
}

fn assemble_overlay(workspace: &Path, image_rootfs: &Path) -> Result<RootfsHandle> {
    let layout = OverlayLayout::in_workspace(workspace, image_rootfs);
    overlayfs::mount_overlay(&layout)?;
    Ok(RootfsHandle {
        workspace: workspace.to_path_buf(),
        rootfs: layout.merged_dir,
        overlay_mounted: true,
        torn_down: false,
    })
}

fn assemble_deep_copy(workspace: &Path, image_rootfs: &Path) -> Result<RootfsHandle> {
    let rootfs = workspace.join("rootfs");
    std::fs::create_dir_all(&rootfs).map_err(|e| IzaError::Io {
        path: rootfs.clone(),
        source: e,
    })?;

    if let Err(e) = copy::copy_tree(image_rootfs, &rootfs) {
        remove_partial(workspace);
        return Err(e);
    }

    tracing::info!(path = %rootfs.display(), "rootfs deep copy assembled");
    Ok(RootfsHandle {
        workspace: workspace.to_path_buf(),
        rootfs,
        overlay_mounted: false,
        torn_down: false,
    })
}

fn remove_partial(workspace: &Path) {
    if let Err(e) = std::fs::remove_dir_all(workspace) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                path = %workspace.display(),
                error = %e,
                "could not remove partial rootfs workspace"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_image(dir: &Path) {
        std::fs::create_dir_all(dir.join("bin")).unwrap();
        std::fs::write(dir.join("bin/sh"), b"#!/bin/fake").unwrap();
        std::os::unix::fs::symlink("sh", dir.join("bin/ash")).unwrap();
    }

    #[test]
    fn deep_copy_assembly_and_teardown_leave_no_residue() {
        let image = tempfile::tempdir().unwrap();
        let overlay_root = tempfile::tempdir().unwrap();
        fake_image(image.path());

        let id = ContainerId::new("100-1700000000");
        let mut handle = assemble_deep_copy(&overlay_root.path().join(id.as_str()), image.path())
            .unwrap();
        assert!(handle.rootfs().join("bin/sh").exists());
        assert!(handle.rootfs().ends_with("100-1700000000/rootfs"));

        handle.teardown();
        assert!(!overlay_root.path().join(id.as_str()).exists());
        // second teardown is a no-op
        handle.teardown();
    }

    #[test]
    fn assemble_falls_back_when_overlay_mount_is_denied() {
        // Without CAP_SYS_ADMIN the overlay mount attempt fails and the
        // assembler must transparently produce a deep copy instead.
        let image = tempfile::tempdir().unwrap();
        let overlay_root = tempfile::tempdir().unwrap();
        fake_image(image.path());

        let id = ContainerId::new("101-1700000001");
        let mut handle = assemble(overlay_root.path(), image.path(), &id).unwrap();
        assert!(handle.rootfs().join("bin/sh").exists());

        handle.teardown();
        assert!(!overlay_root.path().join(id.as_str()).exists());
    }

    #[test]
    fn repeated_assemble_teardown_cycles_leave_overlay_root_empty() {
        let image = tempfile::tempdir().unwrap();
        let overlay_root = tempfile::tempdir().unwrap();
        fake_image(image.path());

        for round in 0..2 {
            let id = ContainerId::new(format!("102-{round}"));
            let mut handle = assemble(overlay_root.path(), image.path(), &id).unwrap();
            handle.teardown();
        }

        assert_eq!(std::fs::read_dir(overlay_root.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_image_rootfs_fails_and_removes_workspace() {
        let overlay_root = tempfile::tempdir().unwrap();
        let id = ContainerId::new("103-1700000003");

        let err = assemble(overlay_root.path(), Path::new("/nonexistent/image"), &id);
        assert!(err.is_err());
        assert!(!overlay_root.path().join(id.as_str()).exists());
    }

    #[test]
    fn drop_tears_down_the_workspace() {
        let image = tempfile::tempdir().unwrap();
        let overlay_root = tempfile::tempdir().unwrap();
        fake_image(image.path());

        let id = ContainerId::new("104-1700000004");
        {
            let _handle = assemble(overlay_root.path(), image.path(), &id).unwrap();
        }
        assert!(!overlay_root.path().join(id.as_str()).exists());
    }
}
