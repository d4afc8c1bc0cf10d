//! Global configuration model for the iza runtime.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the iza runtime.
///
/// Every component takes its directories from here (or directly from a
/// constructor argument in tests), so the on-disk layout is decided in
/// exactly one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IzaConfig {
    /// Base directory for iza state and data.
    pub data_dir: PathBuf,
    /// Directory holding extracted image records.
    pub images_dir: PathBuf,
    /// Directory holding downloaded archives.
    pub cache_dir: PathBuf,
    /// Directory holding per-container overlay workspaces.
    pub overlay_dir: PathBuf,
}

impl Default for IzaConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(crate::constants::DEFAULT_DATA_DIR),
            images_dir: PathBuf::from(crate::constants::DEFAULT_IMAGES_DIR),
            cache_dir: PathBuf::from(crate::constants::DEFAULT_CACHE_DIR),
            overlay_dir: PathBuf::from(crate::constants::DEFAULT_OVERLAY_DIR),
        }
    }
}
