//! This module contains the requirement resolver: a deterministic backtracking search that picks
//! one wheel per distribution identity so that every transitive requirement is satisfied for a
//! single target environment. The lock driver invokes [`resolve`] once per environment and
//! merges the results.

mod candidate;
mod dependency_provider;
mod identity;
mod reporter;
mod requirement;
mod solve;
mod solve_options;

pub use candidate::Candidate;
pub use identity::DistributionKey;
pub use reporter::{NullReporter, Reporter};
pub use requirement::{RequirementConversionError, ResolveRequirement};
pub use solve::{
    resolve, resolve_with_reporter, PinnedPackage, Resolution, ResolutionFailure, ResolveError,
    ResolvedNode,
};
pub use solve_options::{PreReleasePolicy, ResolveOptions};
