use super::artifact_name::{ParseArtifactNameError, WheelFilename};
use super::core_metadata::WheelCoreMetadata;
use super::package_name::NormalizedPackageName;
use once_cell::sync::OnceCell;
use pep440_rs::{Pep440Error, VersionSpecifiers};
use rattler_digest::{serde::SerializableHash, Sha256};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// A single distributable file as advertised by an index listing: the parsed wheel filename, the
/// transport details needed to retrieve it, the interpreter constraint the listing declares for
/// it, and a slot for the core metadata that is attached lazily during resolution.
///
/// Descriptors are immutable once constructed apart from the one-shot metadata attachment, and
/// are shared between candidates through an `Arc` so that metadata attached by a bulk fetch is
/// visible to every candidate pointing at the same file. Two descriptors compare equal iff their
/// parsed filename tuples are equal.
#[derive(Debug, Serialize)]
pub struct ArtifactInfo {
    /// The parsed filename of the artifact.
    pub filename: WheelFilename,

    /// The location of the artifact.
    pub url: Url,

    /// Known hashes of the artifact contents.
    pub hashes: Option<ArtifactHashes>,

    /// The interpreter-version constraint the index listing declares for this file, if any. The
    /// constraint declared by the artifact's own metadata is checked separately after the
    /// metadata has been fetched.
    pub requires_python: Option<VersionSpecifiers>,

    /// Whether the file has been yanked from the index.
    pub yanked: Yanked,

    #[serde(skip)]
    metadata: OnceCell<WheelCoreMetadata>,
}

impl ArtifactInfo {
    /// Constructs a descriptor from a raw listing row. The filename is parsed against the
    /// normalized project name the listing was requested for; rows that do not describe a wheel
    /// are rejected.
    pub fn from_listing(
        project: &NormalizedPackageName,
        filename: &str,
        url: Url,
        hashes: Option<ArtifactHashes>,
        requires_python: Option<&str>,
        yanked: Yanked,
    ) -> Result<Self, InvalidArtifact> {
        let filename = WheelFilename::from_filename(filename, project)?;
        let requires_python = requires_python
            .map(VersionSpecifiers::from_str)
            .transpose()
            .map_err(InvalidArtifact::InvalidRequiresPython)?;
        Ok(Self {
            filename,
            url,
            hashes,
            requires_python,
            yanked,
            metadata: OnceCell::new(),
        })
    }

    /// Returns the core metadata if it has been attached to this descriptor.
    pub fn metadata(&self) -> Option<&WheelCoreMetadata> {
        self.metadata.get()
    }

    /// Attaches core metadata to this descriptor. A descriptor that already carries metadata is
    /// left untouched; the first attachment wins.
    pub fn set_metadata(&self, metadata: WheelCoreMetadata) {
        let _ = self.metadata.set(metadata);
    }
}

impl PartialEq for ArtifactInfo {
    fn eq(&self, other: &Self) -> bool {
        self.filename == other.filename
    }
}

impl Eq for ArtifactInfo {}

impl Display for ArtifactInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.filename)
    }
}

/// An error that can occur when constructing an [`ArtifactInfo`] from a listing row.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum InvalidArtifact {
    #[error(transparent)]
    InvalidFilename(#[from] ParseArtifactNameError),

    #[error("invalid requires-python constraint")]
    InvalidRequiresPython(#[source] Pep440Error),
}

/// Describes a set of hashes for a certain artifact. In theory all hash algorithms available via
/// Pythons `hashlib` are supported but we only support some common ones.
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ArtifactHashes {
    /// The sha256 digest of the file, when the index advertises one.
    #[serde_as(as = "Option<SerializableHash<Sha256>>")]
    pub sha256: Option<rattler_digest::Sha256Hash>,
}

impl ArtifactHashes {
    /// Returns true if this instance does not contain a single hash.
    pub fn is_empty(&self) -> bool {
        self.sha256.is_none()
    }
}

/// Whether a file has been yanked from the index, with the optional reason the index gave.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Yanked {
    /// True if the file was yanked.
    pub yanked: bool,

    /// The reason the file was yanked, if one was given.
    pub reason: Option<String>,
}

impl Yanked {
    /// A yanked marker with the given reason.
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Yanked {
            yanked: true,
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::WheelCoreMetadata;

    fn descriptor(filename: &str) -> ArtifactInfo {
        ArtifactInfo::from_listing(
            &"spam".parse().unwrap(),
            filename,
            format!("https://example.com/{filename}").parse().unwrap(),
            None,
            Some(">=3.6"),
            Yanked::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_from_listing() {
        let info = descriptor("Spam-1.2.3-py3-none-any.whl");
        assert_eq!(info.filename.version, "1.2.3".parse().unwrap());
        assert!(info.requires_python.is_some());
        assert!(info.metadata().is_none());
    }

    #[test]
    fn test_metadata_attaches_once() {
        let info = descriptor("Spam-1.2.3-py3-none-any.whl");
        let first = WheelCoreMetadata::new("Spam".parse().unwrap(), "1.2.3".parse().unwrap());
        info.set_metadata(first);

        let mut second = WheelCoreMetadata::new("Spam".parse().unwrap(), "1.2.3".parse().unwrap());
        second.requires_python = Some(">=3.12".parse().unwrap());
        info.set_metadata(second);

        // the first attachment sticks
        assert!(info.metadata().unwrap().requires_python.is_none());
    }

    #[test]
    fn test_equality_is_by_filename() {
        let a = descriptor("Spam-1.2.3-py3-none-any.whl");
        let b = descriptor("Spam-1.2.3-py3-none-any.whl");
        let c = descriptor("Spam-1.2.4-py3-none-any.whl");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
