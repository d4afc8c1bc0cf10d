//! Download source resolution.
//!
//! Image names are resolved against a static allow-list to a concrete
//! HTTPS URL of a rootfs tarball. Only `alpine` and `ubuntu` are known;
//! anything else fails before a single byte is fetched or written.

use iza_common::error::{IzaError, Result};

use crate::reference::ImageReference;

/// Alpine release used for the `latest` tag.
const ALPINE_DEFAULT_VERSION: &str = "3.20.3";

/// Ubuntu Base release used for the `latest` tag.
const UBUNTU_DEFAULT_RELEASE: &str = "24.04";

/// Resolves an image reference to its rootfs tarball URL.
///
/// # Errors
///
/// Returns [`IzaError::Config`] for names outside the allow-list.
pub fn resolve_download_url(reference: &ImageReference) -> Result<String> {
    match reference.name() {
        "alpine" => Ok(alpine_url(reference.tag())),
        "ubuntu" => Ok(ubuntu_url(reference.tag())),
        other => Err(IzaError::Config {
            message: format!("unknown image '{other}': available images are 'alpine' and 'ubuntu'"),
        }),
    }
}

/// Builds the dl-cdn.alpinelinux.org minirootfs URL for a tag.
///
/// A two-component tag like `3.18` names the branch and is completed to
/// the `.0` point release the CDN actually serves.
fn alpine_url(tag: &str) -> String {
    let version = match tag {
        "latest" => ALPINE_DEFAULT_VERSION.to_owned(),
        t if t.matches('.').count() == 1 => format!("{t}.0"),
        t => t.to_owned(),
    };
    let branch: String = version.split('.').take(2).collect::<Vec<_>>().join(".");
    let arch = alpine_arch();
    format!(
        "https://dl-cdn.alpinelinux.org/alpine/v{branch}/releases/{arch}/alpine-minirootfs-{version}-{arch}.tar.gz"
    )
}

/// Builds the cdimage.ubuntu.com Ubuntu Base URL for a release tag.
fn ubuntu_url(tag: &str) -> String {
    let release = if tag == "latest" {
        UBUNTU_DEFAULT_RELEASE
    } else {
        tag
    };
    let arch = ubuntu_arch();
    format!(
        "https://cdimage.ubuntu.com/ubuntu-base/releases/{release}/release/ubuntu-base-{release}-base-{arch}.tar.gz"
    )
}

fn alpine_arch() -> &'static str {
    match std::env::consts::ARCH {
        "aarch64" => "aarch64",
        _ => "x86_64",
    }
}

fn ubuntu_arch() -> &'static str {
    match std::env::consts::ARCH {
        "aarch64" => "arm64",
        _ => "amd64",
    }
}
