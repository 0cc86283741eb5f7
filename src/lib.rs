//! Wheelhouse turns a set of Python distribution requirements into a reproducible set of wheel
//! pins for a concrete target environment. It is not an installer or a package manager itself:
//! it provides the resolver plumbing a lock-file tool is built around, and leaves transport,
//! metadata decoding and lock serialization to its callers.
//!
//! The core is [`resolve::resolve`]: a deterministic backtracking search over an
//! [`index::ArtifactIndex`], driven by an [`environment::ResolveEnvironment`] (marker values,
//! ordered compatibility tags, interpreter version). Extras are handled as virtual identities
//! that are forced onto the same version as their bare distribution.

#![deny(missing_docs)]

/// Contains the types that are used throughout the library.
pub mod types;

pub mod environment;
pub mod index;
pub mod resolve;
pub mod tags;

pub use environment::ResolveEnvironment;
pub use pep440_rs::{Version, VersionSpecifier, VersionSpecifiers};
pub use pep508_rs::{MarkerEnvironment, Requirement};
pub use resolve::{resolve, PinnedPackage, Resolution, ResolveError, ResolveOptions};
