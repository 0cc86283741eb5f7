use crate::types::{Extra, PackageName};
use pep440_rs::{Version, VersionSpecifiers};
use pep508_rs::Requirement;
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;

/// The resolver-relevant subset of a wheel's core metadata: the dependencies it declares, the
/// interpreter constraint it carries and the extras it provides.
///
/// Decoding this out of a `METADATA` file (or a PEP 658 sidecar) is the index provider's
/// concern; the resolver only ever sees the decoded form, attached to a descriptor after a bulk
/// fetch and read-only from then on.
#[derive(Debug, Clone)]
pub struct WheelCoreMetadata {
    /// The name of the distribution.
    pub name: PackageName,

    /// The version of the distribution.
    pub version: Version,

    /// The distributions this wheel depends on, one entry per `Requires-Dist` field. Entries may
    /// carry markers; the resolver evaluates and strips them during dependency gathering.
    pub requires_dist: Vec<Requirement>,

    /// The interpreter constraint declared by the wheel itself (`Requires-Python`).
    pub requires_python: Option<VersionSpecifiers>,

    /// The extras this wheel provides (`Provides-Extra`).
    pub extras: HashSet<Extra>,
}

impl WheelCoreMetadata {
    /// An empty metadata record for the given distribution version, to be filled in by the
    /// caller.
    pub fn new(name: PackageName, version: Version) -> Self {
        Self {
            name,
            version,
            requires_dist: Vec::new(),
            requires_python: None,
            extras: HashSet::new(),
        }
    }

    /// Builds a metadata record from requirement strings, the way providers and tests usually
    /// construct one. Extras are derived from `provides_extras`.
    pub fn from_requirement_strs(
        name: &str,
        version: &str,
        requires_dist: &[&str],
        requires_python: Option<&str>,
        provides_extras: &[&str],
    ) -> Result<Self, WheelCoreMetadataError> {
        let name =
            PackageName::from_str(name).map_err(|e| WheelCoreMetadataError::InvalidName(e.to_string()))?;
        let version = Version::from_str(version).map_err(WheelCoreMetadataError::InvalidVersion)?;

        let mut parsed_requires = Vec::with_capacity(requires_dist.len());
        for req in requires_dist {
            parsed_requires.push(
                Requirement::from_str(req)
                    .map_err(|e| WheelCoreMetadataError::InvalidRequirement(e.to_string()))?,
            );
        }

        let requires_python = requires_python
            .map(VersionSpecifiers::from_str)
            .transpose()
            .map_err(|e| WheelCoreMetadataError::InvalidRequiresPython(e.to_string()))?;

        let mut extras = HashSet::with_capacity(provides_extras.len());
        for extra in provides_extras {
            let extra = Extra::from_str(extra).unwrap_or_else(|never| match never {});
            extras.insert(extra);
        }

        Ok(Self {
            name,
            version,
            requires_dist: parsed_requires,
            requires_python,
            extras,
        })
    }
}

/// An error constructing a [`WheelCoreMetadata`] record.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum WheelCoreMetadataError {
    #[error("invalid Name: {0}")]
    InvalidName(String),

    #[error("invalid Version: {0}")]
    InvalidVersion(String),

    #[error("invalid Requires-Dist entry: {0}")]
    InvalidRequirement(String),

    #[error("invalid Requires-Python: {0}")]
    InvalidRequiresPython(String),
}
