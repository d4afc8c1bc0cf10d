//! Recursive rootfs copying for the deep-copy fallback.
//!
//! Preserves file permissions and keeps symbolic links as links rather
//! than following them, so the copy is a faithful private rendition of
//! the image rootfs.

use std::path::Path;

use iza_common::error::{IzaError, Result};

/// Recursively copies `src` into `dst`.
///
/// Directories are recreated with the source permissions, regular files
/// are copied with their mode bits, and symbolic links are recreated
/// pointing at their original targets. Special files (device nodes,
/// FIFOs, sockets) are skipped: recreating them requires privileges the
/// fallback path cannot assume, and the child mounts fresh pseudo
/// filesystems over the directories that matter.
///
/// # Errors
///
/// Returns an error if any directory, file, or link cannot be read or
/// written.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    let metadata = std::fs::symlink_metadata(src).map_err(|e| IzaError::Io {
        path: src.to_path_buf(),
        source: e,
    })?;
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        let target = std::fs::read_link(src).map_err(|e| IzaError::Io {
            path: src.to_path_buf(),
            source: e,
        })?;
        symlink(&target, dst)?;
    } else if file_type.is_dir() {
        std::fs::create_dir_all(dst).map_err(|e| IzaError::Io {
            path: dst.to_path_buf(),
            source: e,
        })?;
        let entries = std::fs::read_dir(src).map_err(|e| IzaError::Io {
            path: src.to_path_buf(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| IzaError::Io {
                path: src.to_path_buf(),
                source: e,
            })?;
            copy_tree(&entry.path(), &dst.join(entry.file_name()))?;
        }
        // applied after the children so a read-only directory doesn't
        // block its own population
        std::fs::set_permissions(dst, metadata.permissions()).map_err(|e| IzaError::Io {
            path: dst.to_path_buf(),
            source: e,
        })?;
    } else if file_type.is_file() {
        std::fs::copy(src, dst).map_err(|e| IzaError::Io {
            path: dst.to_path_buf(),
            source: e,
        })?;
    } else {
        tracing::debug!(path = %src.display(), "skipping special file during deep copy");
    }

    Ok(())
}

#[cfg(unix)]
fn symlink(target: &Path, dst: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, dst).map_err(|e| IzaError::Io {
        path: dst.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    #[test]
    fn copies_nested_files_and_directories() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("bin")).unwrap();
        std::fs::write(src.path().join("bin/sh"), b"#!/bin/fake").unwrap();
        std::fs::write(src.path().join("etc-release"), b"test 1.0").unwrap();

        let target = dst.path().join("rootfs");
        copy_tree(src.path(), &target).unwrap();

        assert_eq!(
            std::fs::read(target.join("bin/sh")).unwrap(),
            b"#!/bin/fake"
        );
        assert_eq!(
            std::fs::read_to_string(target.join("etc-release")).unwrap(),
            "test 1.0"
        );
    }

    #[test]
    fn preserves_file_permissions() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let file = src.path().join("tool");
        std::fs::write(&file, b"x").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o755)).unwrap();

        let target = dst.path().join("rootfs");
        copy_tree(src.path(), &target).unwrap();

        let mode = std::fs::metadata(target.join("tool")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn keeps_symlinks_as_symlinks() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("busybox"), b"binary").unwrap();
        std::os::unix::fs::symlink("busybox", src.path().join("sh")).unwrap();

        let target = dst.path().join("rootfs");
        copy_tree(src.path(), &target).unwrap();

        let link = target.join("sh");
        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_link(&link).unwrap(), Path::new("busybox"));
    }

    #[test]
    fn dangling_symlinks_survive_the_copy() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("/does/not/exist", src.path().join("broken")).unwrap();

        let target = dst.path().join("rootfs");
        copy_tree(src.path(), &target).unwrap();

        let link = target.join("broken");
        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    }

    #[test]
    fn missing_source_is_an_error() {
        let dst = tempfile::tempdir().unwrap();
        let err = copy_tree(Path::new("/nonexistent/src"), &dst.path().join("rootfs")).unwrap_err();
        assert!(matches!(err, IzaError::Io { .. }));
    }
}
