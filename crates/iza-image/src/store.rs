//! On-disk image catalog.
//!
//! Each image record lives at `<images>/<name>:<tag>/rootfs/` and is
//! replaced wholesale by a new pull. A `manifest.json` beside the rootfs
//! records provenance; it is advisory only, and `resolve` and `list`
//! operate on the directory layout alone.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use iza_common::config::IzaConfig;
use iza_common::error::{IzaError, Result};

use crate::archive;
use crate::download;
use crate::reference::ImageReference;
use crate::source;

/// Name of the extracted userland directory inside an image record.
const ROOTFS_DIR: &str = "rootfs";

/// Name of the advisory provenance file inside an image record.
const MANIFEST_FILE: &str = "manifest.json";

/// One row of the `images` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Image name (the part before the colon).
    pub repository: String,
    /// Image tag.
    pub tag: String,
    /// Recursive size of regular files under `rootfs/`; advisory, zero
    /// when the walk fails.
    pub size_bytes: u64,
}

/// Advisory provenance written after a successful pull.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageManifest {
    /// Normalized `name:tag` reference.
    pub reference: String,
    /// URL the archive was fetched from, when pulled over the network.
    pub source_url: Option<String>,
    /// Total bytes of regular files restored from the archive.
    pub size_bytes: u64,
}

/// Manages the on-disk image catalog and download cache.
#[derive(Debug)]
pub struct ImageStore {
    images_dir: PathBuf,
    cache_dir: PathBuf,
}

impl ImageStore {
    /// Opens a store rooted at the given directories.
    ///
    /// Directories are created lazily by the operations that need them,
    /// so opening a store has no side effects.
    #[must_use]
    pub fn open(images_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }

    /// Opens the store at the default `/var/lib/iza` layout.
    #[must_use]
    pub fn with_defaults() -> Self {
        let config = IzaConfig::default();
        Self::open(config.images_dir, config.cache_dir)
    }

    /// Downloads and registers an image, returning its rootfs path.
    ///
    /// The name is resolved against the allow-list before anything is
    /// written, so an unknown name leaves both the cache and the catalog
    /// untouched. A repeated pull replaces the existing record.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown names, download failures, and
    /// extraction failures; partial state is removed first.
    pub fn pull(&self, reference: &ImageReference) -> Result<PathBuf> {
        let url = source::resolve_download_url(reference)?;

        let archive_path = self.cache_dir.join(reference.archive_file_name());
        download::download_to(&url, &archive_path)?;

        self.register_archive(reference, &archive_path, Some(&url))
    }

    /// Extracts a downloaded archive into the catalog, replacing any
    /// existing record for the reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be replaced or the archive
    /// fails to extract; a partially extracted record is removed.
    pub fn register_archive(
        &self,
        reference: &ImageReference,
        archive_path: &Path,
        source_url: Option<&str>,
    ) -> Result<PathBuf> {
        let image_dir = self.images_dir.join(reference.dir_name());
        if image_dir.exists() {
            tracing::info!(image = %reference, "replacing existing image record");
            std::fs::remove_dir_all(&image_dir).map_err(|e| IzaError::Io {
                path: image_dir.clone(),
                source: e,
            })?;
        }

        let rootfs_dir = image_dir.join(ROOTFS_DIR);
        std::fs::create_dir_all(&rootfs_dir).map_err(|e| IzaError::Io {
            path: rootfs_dir.clone(),
            source: e,
        })?;

        let size_bytes = match archive::extract_rootfs(archive_path, &rootfs_dir) {
            Ok(bytes) => bytes,
            Err(e) => {
                if let Err(rm) = std::fs::remove_dir_all(&image_dir) {
                    tracing::warn!(
                        path = %image_dir.display(),
                        error = %rm,
                        "could not remove partially extracted image"
                    );
                }
                return Err(e);
            }
        };

        let manifest = ImageManifest {
            reference: reference.to_string(),
            source_url: source_url.map(ToOwned::to_owned),
            size_bytes,
        };
        let manifest_path = image_dir.join(MANIFEST_FILE);
        let body = serde_json::to_string_pretty(&manifest)?;
        std::fs::write(&manifest_path, body).map_err(|e| IzaError::Io {
            path: manifest_path,
            source: e,
        })?;

        tracing::info!(image = %reference, bytes = size_bytes, "image registered");
        Ok(rootfs_dir)
    }

    /// Returns the rootfs path for a registered image, if present.
    #[must_use]
    pub fn resolve(&self, reference: &ImageReference) -> Option<PathBuf> {
        let rootfs = self
            .images_dir
            .join(reference.dir_name())
            .join(ROOTFS_DIR);
        rootfs.is_dir().then_some(rootfs)
    }

    /// Enumerates every image record in the catalog, sorted by name.
    ///
    /// A record is any directory directly under the images root that
    /// contains a `rootfs/` subdirectory. Sizes are advisory.
    ///
    /// # Errors
    ///
    /// Returns an error only if the images directory exists but cannot
    /// be read; a missing directory is an empty catalog.
    pub fn list(&self) -> Result<Vec<ImageRecord>> {
        let entries = match std::fs::read_dir(&self.images_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(IzaError::Io {
                    path: self.images_dir.clone(),
                    source: e,
                });
            }
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| IzaError::Io {
                path: self.images_dir.clone(),
                source: e,
            })?;
            let rootfs = entry.path().join(ROOTFS_DIR);
            if !rootfs.is_dir() {
                continue;
            }

            let dir_name = entry.file_name().to_string_lossy().into_owned();
            let (repository, tag) = match dir_name.split_once(':') {
                Some((repo, tag)) => (repo.to_owned(), tag.to_owned()),
                None => (dir_name, iza_common::constants::DEFAULT_TAG.to_owned()),
            };
            records.push(ImageRecord {
                repository,
                tag,
                size_bytes: dir_size(&rootfs),
            });
        }

        records.sort_by(|a, b| (&a.repository, &a.tag).cmp(&(&b.repository, &b.tag)));
        Ok(records)
    }

    /// Returns the images root directory.
    #[must_use]
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Returns the download cache directory.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

/// Recursive size of regular files under `path`, without following
/// symlinks. Walk errors contribute zero rather than failing.
fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };

    let mut total = 0u64;
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            total += dir_size(&entry.path());
        } else if file_type.is_file() {
            total += entry.metadata().map_or(0, |m| m.len());
        }
    }
    total
}
