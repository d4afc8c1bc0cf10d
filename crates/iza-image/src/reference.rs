//! Image reference parsing.
//!
//! A reference is `name[:tag]`; an absent tag defaults to `latest`.
//! Equality is textual on the normalized `name:tag` form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use iza_common::constants::DEFAULT_TAG;
use iza_common::error::{IzaError, Result};

/// A parsed `name[:tag]` image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference {
    name: String,
    tag: String,
}

impl ImageReference {
    /// Parses an image reference, applying the `latest` default tag.
    ///
    /// The catalog is a flat namespace, so names are restricted to
    /// `[a-zA-Z0-9._-]`; in particular `/` is rejected, which keeps
    /// [`ImageReference::dir_name`] a single path component.
    ///
    /// # Errors
    ///
    /// Returns [`IzaError::Config`] if the name or tag is empty or
    /// contains characters outside `[a-zA-Z0-9._-]`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (name, tag) = trimmed.split_once(':').unwrap_or((trimmed, DEFAULT_TAG));

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || "._-".contains(c))
        {
            return Err(IzaError::Config {
                message: format!("invalid image name in reference '{input}'"),
            });
        }
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || "._-".contains(c)) {
            return Err(IzaError::Config {
                message: format!("invalid tag in reference '{input}'"),
            });
        }

        Ok(Self {
            name: name.to_owned(),
            tag: tag.to_owned(),
        })
    }

    /// Returns the image name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tag (never empty; defaults to `latest`).
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the catalog directory name for this reference.
    #[must_use]
    pub fn dir_name(&self) -> String {
        format!("{}:{}", self.name, self.tag)
    }

    /// Returns the cache file name for this reference.
    #[must_use]
    pub fn archive_file_name(&self) -> String {
        format!("{}:{}.tar.gz", self.name, self.tag)
    }
}

impl FromStr for ImageReference {
    type Err = IzaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_without_colon_defaults_to_latest() {
        let r = ImageReference::parse("alpine").unwrap();
        assert_eq!(r.name(), "alpine");
        assert_eq!(r.tag(), "latest");
        assert_eq!(r.to_string(), "alpine:latest");
    }

    #[test]
    fn reference_with_tag_keeps_it() {
        let r = ImageReference::parse("alpine:3.18").unwrap();
        assert_eq!(r.name(), "alpine");
        assert_eq!(r.tag(), "3.18");
        assert_eq!(r.dir_name(), "alpine:3.18");
        assert_eq!(r.archive_file_name(), "alpine:3.18.tar.gz");
    }

    #[test]
    fn equality_is_textual_after_normalization() {
        assert_eq!(
            ImageReference::parse("ubuntu").unwrap(),
            ImageReference::parse("ubuntu:latest").unwrap()
        );
        assert_ne!(
            ImageReference::parse("ubuntu:22.04").unwrap(),
            ImageReference::parse("ubuntu:24.04").unwrap()
        );
    }

    #[test]
    fn empty_or_malformed_references_are_rejected() {
        assert!(ImageReference::parse("").is_err());
        assert!(ImageReference::parse(":3.18").is_err());
        assert!(ImageReference::parse("alpine:").is_err());
        assert!(ImageReference::parse("al pine").is_err());
        assert!(ImageReference::parse("alpine:3 18").is_err());
    }

    #[test]
    fn namespaced_names_are_rejected() {
        // the catalog is flat; a `/` would nest the record below the
        // level `list` enumerates
        assert!(ImageReference::parse("library/alpine").is_err());
        assert!(ImageReference::parse("library/alpine:3.18").is_err());
    }

    #[test]
    fn from_str_round_trips() {
        let r: ImageReference = "ubuntu:22.04".parse().unwrap();
        assert_eq!(r.to_string(), "ubuntu:22.04");
    }
}
