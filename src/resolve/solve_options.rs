//! Contains the options that can be passed to the [`super::solve::resolve`] function.

/// Defines how pre-release versions are handled during resolution.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum PreReleasePolicy {
    /// Pre-releases are only eligible for identities where an active requirement explicitly
    /// mentions a pre-release version, e.g. `spam==1.0.0a1` or `spam>=2.0.0b0`. This emulates
    /// the behavior of mainstream installers.
    #[default]
    OnlyIfRequested,

    /// Pre-releases are eligible everywhere; the client opted in.
    Allow,
}

/// Additional options that change the behavior of [`super::solve::resolve`].
#[derive(Debug, Default, Clone)]
pub struct ResolveOptions {
    /// How pre-release versions are treated during candidate enumeration.
    pub prerelease: PreReleasePolicy,
}
