use super::candidate::Candidate;
use super::dependency_provider::WheelProvider;
use super::identity::DistributionKey;
use super::reporter::{NullReporter, Reporter};
use super::requirement::{RequirementConversionError, ResolveRequirement};
use super::solve_options::ResolveOptions;
use crate::environment::ResolveEnvironment;
use crate::index::{ArtifactIndex, IndexError};
use crate::types::{ArtifactInfo, Extra, NormalizedPackageName};
use indexmap::IndexMap;
use miette::Diagnostic;
use pep440_rs::Version;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

/// Resolves the given requirements against an artifact index for one target environment.
///
/// `requirements` are the top-level distribution requirements; entries whose marker evaluates to
/// false for the environment are ignored. The result is the committed map: exactly one candidate
/// per identity, closed under the marker-true transitive dependencies of every committed
/// candidate.
///
/// The search is single-threaded and deterministic: given the same requirements, environment and
/// index contents, two runs return identical resolutions. The only external call that may block
/// for a while is the bulk metadata fetch on the index provider.
pub fn resolve<'r>(
    index: &dyn ArtifactIndex,
    requirements: impl IntoIterator<Item = &'r pep508_rs::Requirement>,
    env: &ResolveEnvironment,
    options: &ResolveOptions,
) -> Result<Resolution, ResolveError> {
    resolve_with_reporter(index, requirements, env, options, &NullReporter)
}

/// Like [`resolve`], with an observer for search progress. The reporter cannot influence the
/// search.
pub fn resolve_with_reporter<'r>(
    index: &dyn ArtifactIndex,
    requirements: impl IntoIterator<Item = &'r pep508_rs::Requirement>,
    env: &ResolveEnvironment,
    options: &ResolveOptions,
    reporter: &dyn Reporter,
) -> Result<Resolution, ResolveError> {
    let mut top_level = Vec::new();
    for requirement in requirements {
        if let Some(marker) = &requirement.marker {
            if !env.evaluate_marker(marker, &[]) {
                tracing::debug!("skipping '{}', marker is false", requirement.name);
                continue;
            }
        }
        top_level.push(ResolveRequirement::from_parsed(requirement)?);
    }

    reporter.resolve_started(&top_level);
    let solver = Solver {
        provider: WheelProvider::new(index, env, options),
        reporter,
    };
    let result = solver.solve(top_level);
    reporter.resolve_finished(result.is_ok());
    result
}

/// One committed entry of a [`Resolution`]: the chosen candidate and the identities of the
/// requirements its dependency list produced, in processing order.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    /// The candidate committed for this identity.
    pub candidate: Candidate,

    /// The identities this candidate depends on, self-pin edge first.
    pub dependencies: Vec<DistributionKey>,
}

/// The committed map produced by [`resolve`]: one candidate per identity, in commit order, with
/// the dependency edges the lock driver needs to serialize a lock file.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    graph: IndexMap<DistributionKey, ResolvedNode>,
}

impl Resolution {
    /// Iterates over the committed entries in commit order.
    pub fn nodes(&self) -> impl Iterator<Item = (&DistributionKey, &ResolvedNode)> {
        self.graph.iter()
    }

    /// Looks up the committed entry for an identity.
    pub fn get(&self, key: &DistributionKey) -> Option<&ResolvedNode> {
        self.graph.get(key)
    }

    /// The number of committed identities, extras-bearing virtual nodes included.
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Returns true if nothing was committed (all top-level markers were false).
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Folds the virtual extras nodes into their base distribution and returns one pin per
    /// distribution, sorted by name. This is the view a lock file is written from.
    pub fn pinned_packages(&self) -> Vec<PinnedPackage> {
        let mut by_name: IndexMap<NormalizedPackageName, PinnedPackage> = IndexMap::new();
        for (key, node) in &self.graph {
            let entry = by_name
                .entry(key.name().clone())
                .or_insert_with(|| PinnedPackage {
                    name: key.name().clone(),
                    version: node.candidate.version().clone(),
                    extras: Vec::new(),
                    artifact: node.candidate.artifact.clone(),
                    dependencies: Vec::new(),
                });

            for extra in key.extras() {
                if !entry.extras.contains(extra) {
                    entry.extras.push(extra.clone());
                }
            }
            for dependency in &node.dependencies {
                // the self-pin edge folds away in the per-distribution view
                if dependency.name() == key.name() {
                    continue;
                }
                if !entry.dependencies.contains(dependency) {
                    entry.dependencies.push(dependency.clone());
                }
            }
        }

        let mut packages: Vec<PinnedPackage> = by_name.into_values().collect();
        for package in &mut packages {
            package.extras.sort();
        }
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        packages
    }
}

/// Represents a single locked down distribution after calling [`resolve`], with the extras nodes
/// of the same distribution merged in.
#[derive(Debug, Clone)]
pub struct PinnedPackage {
    /// The name of the distribution.
    pub name: NormalizedPackageName,

    /// The selected version.
    pub version: Version,

    /// The extras that were selected either by the user or as part of the resolution, sorted.
    pub extras: Vec<Extra>,

    /// The artifact that was committed for this distribution.
    pub artifact: Arc<ArtifactInfo>,

    /// The identities this distribution depends on, deduplicated, in processing order.
    pub dependencies: Vec<DistributionKey>,
}

/// An error that can occur during resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// The index provider failed; the run was aborted.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),

    /// A requirement (top-level or from metadata) could not be converted.
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidRequirement(#[from] RequirementConversionError),

    /// The requirements cannot be satisfied together. Terminal; there is no partial result.
    #[error("resolution impossible: {0}")]
    ResolutionImpossible(Box<ResolutionFailure>),
}

/// The residual state of a failed resolution: the identity the search could not satisfy, the
/// live requirements on it, and the candidates most recently ruled out while trying.
#[derive(Debug)]
pub struct ResolutionFailure {
    /// The identity for which no acceptable candidate remained.
    pub key: DistributionKey,

    /// The requirements that were active for that identity.
    pub unsatisfied: Vec<ResolveRequirement>,

    /// The candidates that were considered and ruled out during backtracking.
    pub causes: Vec<Candidate>,
}

impl Display for ResolutionFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "no candidate of '{}' satisfies ", self.key)?;
        if self.unsatisfied.is_empty() {
            write!(f, "the environment")?;
        } else {
            for (idx, requirement) in self.unsatisfied.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "'{requirement}'")?;
            }
        }
        if !self.causes.is_empty() {
            write!(f, " (ruled out:")?;
            for cause in &self.causes {
                write!(f, " {cause}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// One committed choice plus its dependency edges, as tracked inside the search.
#[derive(Debug, Clone)]
struct PinnedNode {
    candidate: Candidate,
    dependencies: Vec<DistributionKey>,
}

/// The mutable state of the search. Guessing a candidate snapshots the whole state onto the
/// trail, so undoing a guess also discards every requirement and incompatibility that was
/// derived under it.
#[derive(Debug, Clone, Default)]
struct SearchState {
    /// Committed choices, in commit order.
    pinned: IndexMap<DistributionKey, PinnedNode>,

    /// The live requirements, grouped by identity, in the order identities first appeared.
    requirements: IndexMap<DistributionKey, Vec<ResolveRequirement>>,

    /// Candidates ruled out by backtracking, per identity.
    incompatible: IndexMap<DistributionKey, Vec<Candidate>>,
}

struct Solver<'i> {
    provider: WheelProvider<'i>,
    reporter: &'i dyn Reporter,
}

impl<'i> Solver<'i> {
    fn solve(&self, top_level: Vec<ResolveRequirement>) -> Result<Resolution, ResolveError> {
        let mut state = SearchState::default();
        for requirement in top_level {
            Self::add_requirement(&mut state, self.reporter, requirement);
        }

        // Each entry is the state before a guess, together with the guess itself.
        let mut trail: Vec<(SearchState, DistributionKey, Candidate)> = Vec::new();

        loop {
            // A pinned identity whose candidate no longer satisfies every live requirement is a
            // conflict; some guess on the trail has to be revised.
            if let Some(conflicted) = Self::find_conflict(&state) {
                tracing::debug!("conflict on {}", conflicted);
                self.backtrack(&mut state, &mut trail, &conflicted)?;
                continue;
            }

            // Pick the most constrained pending identity: fewest candidates first, earliest
            // identity on ties, which keeps the run deterministic and processes self-pins before
            // their siblings.
            let mut selected: Option<(DistributionKey, Vec<Candidate>)> = None;
            for (key, requirements) in state.requirements.iter() {
                if state.pinned.contains_key(key) {
                    continue;
                }
                let incompatible = state
                    .incompatible
                    .get(key)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                let candidates = self.provider.candidates_for(key, requirements, incompatible)?;
                let better = match &selected {
                    None => true,
                    Some((_, best)) => candidates.len() < best.len(),
                };
                if better {
                    let exhausted = candidates.is_empty();
                    selected = Some((key.clone(), candidates));
                    if exhausted {
                        break;
                    }
                }
            }

            let Some((key, mut candidates)) = selected else {
                // Every live requirement is satisfied by a pinned candidate.
                return Ok(Self::finish(state));
            };

            if candidates.is_empty() {
                self.backtrack(&mut state, &mut trail, &key)?;
                continue;
            }

            let candidate = candidates.swap_remove(0);
            trail.push((state.clone(), key.clone(), candidate.clone()));

            tracing::debug!("pinning {}", candidate);
            self.reporter.candidate_pinned(&candidate);

            let dependencies = self.provider.dependencies_of(&candidate)?;
            let edges = dependencies
                .iter()
                .map(|requirement| requirement.key().clone())
                .collect();
            state.pinned.insert(
                key,
                PinnedNode {
                    candidate,
                    dependencies: edges,
                },
            );
            for requirement in dependencies {
                Self::add_requirement(&mut state, self.reporter, requirement);
            }
        }
    }

    /// Merges a requirement into the live set, ignoring exact duplicates.
    fn add_requirement(
        state: &mut SearchState,
        reporter: &dyn Reporter,
        requirement: ResolveRequirement,
    ) {
        let entry = state.requirements.entry(requirement.key().clone()).or_default();
        if !entry.contains(&requirement) {
            reporter.requirement_added(&requirement);
            entry.push(requirement);
        }
    }

    /// Returns a pinned identity whose candidate fails one of its live requirements.
    fn find_conflict(state: &SearchState) -> Option<DistributionKey> {
        state.pinned.iter().find_map(|(key, node)| {
            let requirements = state.requirements.get(key)?;
            requirements
                .iter()
                .any(|requirement| !node.candidate.satisfies(requirement))
                .then(|| key.clone())
        })
    }

    /// Undoes the most recent guess and rules its candidate out, or fails the run when there is
    /// nothing left to undo.
    fn backtrack(
        &self,
        state: &mut SearchState,
        trail: &mut Vec<(SearchState, DistributionKey, Candidate)>,
        failed: &DistributionKey,
    ) -> Result<(), ResolveError> {
        let Some((previous, key, candidate)) = trail.pop() else {
            let unsatisfied = state.requirements.get(failed).cloned().unwrap_or_default();
            let causes = state.incompatible.get(failed).cloned().unwrap_or_default();
            return Err(ResolveError::ResolutionImpossible(Box::new(
                ResolutionFailure {
                    key: failed.clone(),
                    unsatisfied,
                    causes,
                },
            )));
        };

        tracing::debug!("backtracking: ruling out {}", candidate);
        self.reporter.backtracked(&key, &candidate);
        *state = previous;
        state
            .incompatible
            .entry(key)
            .or_default()
            .push(candidate);
        Ok(())
    }

    fn finish(state: SearchState) -> Resolution {
        let graph = state
            .pinned
            .into_iter()
            .map(|(key, node)| {
                (
                    key,
                    ResolvedNode {
                        candidate: node.candidate,
                        dependencies: node.dependencies,
                    },
                )
            })
            .collect();
        Resolution { graph }
    }
}
