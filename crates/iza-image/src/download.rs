//! HTTPS archive download into the local cache.

use std::fs::File;
use std::path::Path;

use iza_common::constants::USER_AGENT;
use iza_common::error::{IzaError, Result};

/// Downloads `url` into `dest`, streaming the body to disk.
///
/// Redirects are followed and the request carries a stable `User-Agent`.
/// A non-2xx status, a transport error, or a premature connection close
/// fails the download; a partially written `dest` is removed before the
/// error is returned.
///
/// # Errors
///
/// Returns [`IzaError::Download`] for HTTP and transport failures and
/// [`IzaError::Io`] if the destination cannot be created.
pub fn download_to(url: &str, dest: &Path) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| IzaError::Download {
            url: url.to_owned(),
            reason: format!("could not build HTTP client: {e}"),
        })?;

    tracing::info!(url, "downloading image archive");
    let mut response = client.get(url).send().map_err(|e| IzaError::Download {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(IzaError::Download {
            url: url.to_owned(),
            reason: format!("HTTP {status}"),
        });
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| IzaError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let mut file = File::create(dest).map_err(|e| IzaError::Io {
        path: dest.to_path_buf(),
        source: e,
    })?;

    match response.copy_to(&mut file) {
        Ok(bytes) => {
            tracing::info!(bytes, path = %dest.display(), "archive downloaded");
            Ok(())
        }
        Err(e) => {
            drop(file);
            if let Err(rm) = std::fs::remove_file(dest) {
                tracing::warn!(path = %dest.display(), error = %rm, "could not remove partial download");
            }
            Err(IzaError::Download {
                url: url.to_owned(),
                reason: format!("transfer failed: {e}"),
            })
        }
    }
}
