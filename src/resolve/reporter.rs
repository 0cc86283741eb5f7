use super::candidate::Candidate;
use super::identity::DistributionKey;
use super::requirement::ResolveRequirement;

/// Observation hooks for a resolver run. Every method has a no-op default; implementations can
/// surface progress to a user interface but cannot affect the search in any way.
#[allow(unused_variables)]
pub trait Reporter {
    /// Called once before the search starts, with the top-level requirements that survived
    /// marker evaluation.
    fn resolve_started(&self, requirements: &[ResolveRequirement]) {}

    /// Called whenever a requirement joins the active set, including synthesized self-pins.
    fn requirement_added(&self, requirement: &ResolveRequirement) {}

    /// Called when the engine commits a candidate for an identity.
    fn candidate_pinned(&self, candidate: &Candidate) {}

    /// Called when a guess is undone and ruled out for its identity.
    fn backtracked(&self, key: &DistributionKey, candidate: &Candidate) {}

    /// Called once when the search ends, successfully or not.
    fn resolve_finished(&self, succeeded: bool) {}
}

/// A reporter that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}
