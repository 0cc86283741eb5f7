use crate::types::{ArtifactInfo, InvalidArtifact, NormalizedPackageName, WheelFilename};
use miette::Diagnostic;
use std::sync::Arc;
use thiserror::Error;

/// The contract the resolver consumes to learn about artifacts. Implementations wrap whatever
/// actually serves the listings: a remote simple-API index, a directory of wheels, or an
/// in-memory fixture like [`super::InMemoryIndex`].
///
/// The trait is object-safe on purpose: the engine holds a `&dyn ArtifactIndex` so concrete
/// providers stay swappable without touching the search. Both operations are synchronous from
/// the resolver's point of view; an implementation that wants to parallelize its I/O owns a task
/// runtime internally and joins it before returning.
pub trait ArtifactIndex {
    /// Returns all known descriptors for the given distribution, in arbitrary order. May be
    /// called multiple times across resolver runs; each run caches the filtered result itself,
    /// implementations should cache the raw listing externally.
    fn available(
        &self,
        name: &NormalizedPackageName,
    ) -> Result<Vec<Arc<ArtifactInfo>>, IndexError>;

    /// Attaches core metadata to each descriptor in the batch, in place. Descriptors that
    /// already carry metadata must be left untouched. The batch shape exists so implementations
    /// can fetch concurrently; a failure for any single descriptor is reported as an error for
    /// the whole batch and aborts the resolver run.
    fn fetch_metadata(&self, batch: &[Arc<ArtifactInfo>]) -> Result<(), IndexError>;
}

/// An error produced by an [`ArtifactIndex`] implementation. All variants are fatal to a
/// resolver run; the engine does not retry or partially recover.
#[derive(Debug, Error, Diagnostic)]
pub enum IndexError {
    /// A listing row could not be turned into a descriptor.
    #[error("invalid listing entry for '{project}'")]
    InvalidListing {
        /// The project whose listing contained the entry.
        project: NormalizedPackageName,
        /// What was wrong with the entry.
        #[source]
        source: InvalidArtifact,
    },

    /// Metadata could not be retrieved or decoded for an artifact.
    #[error("failed to fetch metadata for {filename}")]
    MetadataFetch {
        /// The artifact whose metadata fetch failed.
        filename: WheelFilename,
        /// The underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backing store failed in a provider-specific way.
    #[error("index backend error: {0}")]
    Backend(String),
}
