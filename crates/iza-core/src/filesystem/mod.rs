//! Container rootfs assembly.
//!
//! Produces a per-container writable root filesystem from an immutable
//! image rootfs, preferring an `OverlayFS` mount and falling back to a
//! deep copy when overlay is unavailable.

pub mod copy;
pub mod overlayfs;
pub mod rootfs;
