use super::candidate::Candidate;
use super::identity::DistributionKey;
use super::requirement::ResolveRequirement;
use super::solve::ResolveError;
use super::solve_options::{PreReleasePolicy, ResolveOptions};
use crate::environment::ResolveEnvironment;
use crate::index::ArtifactIndex;
use crate::types::{ArtifactInfo, BuildTag, NormalizedPackageName};
use elsa::FrozenMap;
use pep440_rs::Version;
use std::cmp::Reverse;
use std::sync::Arc;

/// Per-run candidate source for the search engine: owns the filtered descriptor cache, fetches
/// metadata in bulk when the search first needs it, applies the preference order and gathers the
/// dependencies of committed candidates.
///
/// All state is owned by one resolver run; the cache is append-only so shared references into it
/// stay valid while the search mutates nothing else here.
pub(crate) struct WheelProvider<'i> {
    index: &'i dyn ArtifactIndex,
    env: &'i ResolveEnvironment,
    options: &'i ResolveOptions,

    /// Environment-compatible descriptors per distribution, sorted most preferred first.
    /// Computed once per run per name.
    filtered: FrozenMap<NormalizedPackageName, Box<Vec<Arc<ArtifactInfo>>>>,
}

impl<'i> WheelProvider<'i> {
    pub fn new(
        index: &'i dyn ArtifactIndex,
        env: &'i ResolveEnvironment,
        options: &'i ResolveOptions,
    ) -> Self {
        Self {
            index,
            env,
            options,
            filtered: FrozenMap::default(),
        }
    }

    /// The preference key of a descriptor: newest version first, then the most specific
    /// compatible tag, then the highest build disambiguator.
    fn preference_key(&self, artifact: &ArtifactInfo) -> (Version, usize, Option<BuildTag>) {
        let tag_rank = artifact
            .filename
            .all_tags_iter()
            .filter_map(|tag| self.env.tags().rank(&tag))
            .max()
            .unwrap_or(0);
        (
            artifact.filename.version.clone(),
            tag_rank,
            artifact.filename.build_tag.clone(),
        )
    }

    /// Returns the environment-compatible descriptors for a distribution, most preferred first.
    /// The first call per run queries the index and filters the listing; later calls hit the
    /// cache.
    fn compatible_artifacts(
        &self,
        name: &NormalizedPackageName,
    ) -> Result<&[Arc<ArtifactInfo>], ResolveError> {
        if let Some(cached) = self.filtered.get(name) {
            return Ok(cached);
        }

        tracing::info!("collecting artifacts for {}", name);
        let mut artifacts = self.index.available(name)?;
        artifacts.retain(|artifact| {
            if artifact.yanked.yanked {
                return false;
            }
            if !artifact
                .filename
                .all_tags_iter()
                .any(|tag| self.env.tags().is_compatible(&tag))
            {
                return false;
            }
            // The listing-declared interpreter constraint; the metadata-declared one is checked
            // again after the fetch.
            match &artifact.requires_python {
                Some(constraint) => self.env.interpreter_satisfies(constraint),
                None => true,
            }
        });

        // Sort the artifacts from most preferred to least preferred, which makes candidate
        // enumeration emit them in commit order.
        artifacts.sort_by_cached_key(|artifact| Reverse(self.preference_key(artifact)));

        Ok(self.filtered.insert(name.clone(), Box::new(artifacts)))
    }

    /// Enumerates the candidates for an identity that satisfy every active requirement and are
    /// not ruled out, most preferred first. Metadata is fetched in bulk for any retained
    /// descriptor that is still missing it.
    pub fn candidates_for(
        &self,
        key: &DistributionKey,
        requirements: &[ResolveRequirement],
        incompatible: &[Candidate],
    ) -> Result<Vec<Candidate>, ResolveError> {
        let compatible = self.compatible_artifacts(key.name())?;

        let allow_prerelease = self.options.prerelease == PreReleasePolicy::Allow
            || requirements.iter().any(ResolveRequirement::allows_prerelease);

        let mut retained: Vec<Arc<ArtifactInfo>> = compatible
            .iter()
            .filter(|artifact| {
                let version = &artifact.filename.version;
                if version.any_prerelease() && !allow_prerelease {
                    return false;
                }
                requirements.iter().all(|req| req.contains(version))
            })
            .cloned()
            .collect();

        // Everything that survived filtering is a potential commit, so its dependency list will
        // be needed; fetch what is missing in one bulk call.
        let missing: Vec<Arc<ArtifactInfo>> = retained
            .iter()
            .filter(|artifact| artifact.metadata().is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            tracing::info!(
                "fetching metadata for {} artifact(s) of {}",
                missing.len(),
                key.name()
            );
            self.index.fetch_metadata(&missing)?;
        }

        retained.retain(|artifact| {
            let metadata = artifact
                .metadata()
                .expect("metadata was attached by the bulk fetch above");
            match &metadata.requires_python {
                Some(constraint) => self.env.interpreter_satisfies(constraint),
                None => true,
            }
        });

        Ok(retained
            .into_iter()
            .map(|artifact| Candidate::new(key.clone(), artifact))
            .filter(|candidate| !incompatible.contains(candidate))
            .collect())
    }

    /// Gathers the requirements a committed candidate introduces: the synthesized self-pin first
    /// for extras-bearing identities, then the metadata's dependency list in declaration order
    /// with markers evaluated against the environment (augmented with the identity's extras) and
    /// stripped.
    pub fn dependencies_of(
        &self,
        candidate: &Candidate,
    ) -> Result<Vec<ResolveRequirement>, ResolveError> {
        let metadata = candidate
            .artifact
            .metadata()
            .expect("metadata is attached during candidate enumeration");

        tracing::debug!(
            "gathering dependencies of {}=={}",
            candidate.key,
            candidate.version()
        );

        let extras = candidate.key.extras();
        let mut requirements = Vec::with_capacity(metadata.requires_dist.len() + 1);

        // The self-pin keeps the virtual extras node and the bare distribution on the same
        // version; it goes first so it is processed before the extras' own dependencies.
        if !extras.is_empty() {
            requirements.push(ResolveRequirement::exact_pin(
                candidate.key.as_bare(),
                candidate.version().clone(),
            ));

            for extra in extras {
                if !metadata.extras.contains(extra) {
                    tracing::warn!(
                        "{}=={} does not provide extra '{}'",
                        candidate.key.name(),
                        candidate.version(),
                        extra.as_str()
                    );
                }
            }
        }

        let extra_refs: Vec<_> = extras.iter().collect();
        for entry in &metadata.requires_dist {
            if let Some(marker) = &entry.marker {
                if !self.env.evaluate_marker(marker, &extra_refs) {
                    continue;
                }
            }
            requirements.push(ResolveRequirement::from_parsed(entry)?);
        }

        Ok(requirements)
    }
}
