//! # iza-image
//!
//! Image acquisition and local storage for the iza runtime.
//!
//! A `pull` resolves an image name against a static allow-list, downloads
//! the rootfs tarball over HTTPS into the cache, and extracts it into the
//! on-disk image catalog at `<images>/<name>:<tag>/rootfs/`. The catalog
//! is append-only from the runtime's point of view: records are replaced
//! wholesale by a new pull and never mutated otherwise.

pub mod archive;
pub mod download;
pub mod reference;
pub mod source;
pub mod store;
