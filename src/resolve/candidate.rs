use super::identity::DistributionKey;
use super::requirement::ResolveRequirement;
use crate::types::ArtifactInfo;
use pep440_rs::Version;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// A (identity, descriptor) pair that could satisfy the requirements with that identity.
///
/// Candidates live for one resolver run and are never mutated; the descriptor they share may
/// gain metadata during the run, which every candidate pointing at it observes through the
/// `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The identity this candidate was enumerated for.
    pub key: DistributionKey,

    /// The artifact backing this candidate.
    pub artifact: Arc<ArtifactInfo>,
}

impl Candidate {
    /// Creates a candidate wrapping the given descriptor for the given identity.
    pub fn new(key: DistributionKey, artifact: Arc<ArtifactInfo>) -> Self {
        Self { key, artifact }
    }

    /// The version of the backing artifact.
    pub fn version(&self) -> &Version {
        &self.artifact.filename.version
    }

    /// A candidate satisfies a requirement iff the identities match and the artifact's version
    /// lies in the requirement's specifier set.
    pub fn satisfies(&self, requirement: &ResolveRequirement) -> bool {
        &self.key == requirement.key() && requirement.contains(self.version())
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}=={}", self.key, self.version())
    }
}
