//! The description of the target a resolution runs against: marker values, the ordered list of
//! compatibility tags, and the interpreter version.

use crate::tags::WheelTags;
use crate::types::Extra;
use pep440_rs::{Version, VersionSpecifiers};
use pep508_rs::{MarkerEnvironment, MarkerTree};

/// The environment profile a resolver run targets. Immutable for the duration of a run.
///
/// The tag order defines artifact preference (earlier is better); the marker environment feeds
/// conditional requirement evaluation; the interpreter version is checked against both the
/// listing-declared and the metadata-declared `requires-python` constraints of every artifact.
#[derive(Debug, Clone)]
pub struct ResolveEnvironment {
    markers: MarkerEnvironment,
    tags: WheelTags,
    interpreter_version: Version,
}

impl ResolveEnvironment {
    /// Creates a profile from marker values and a tag order, taking the interpreter version from
    /// the `python_full_version` marker.
    pub fn new(markers: MarkerEnvironment, tags: WheelTags) -> Self {
        let interpreter_version = markers.python_full_version.version.clone();
        Self {
            markers,
            tags,
            interpreter_version,
        }
    }

    /// Creates a profile with an explicit interpreter version, for drivers that resolve for an
    /// interpreter other than the one the marker values describe.
    pub fn with_interpreter_version(mut self, interpreter_version: Version) -> Self {
        self.interpreter_version = interpreter_version;
        self
    }

    /// The marker values of this environment.
    pub fn markers(&self) -> &MarkerEnvironment {
        &self.markers
    }

    /// The ordered compatibility tags of this environment, most preferred first.
    pub fn tags(&self) -> &WheelTags {
        &self.tags
    }

    /// The interpreter version artifacts are checked against.
    pub fn interpreter_version(&self) -> &Version {
        &self.interpreter_version
    }

    /// Returns true if the given interpreter constraint accepts this environment's interpreter.
    pub fn interpreter_satisfies(&self, constraint: &VersionSpecifiers) -> bool {
        constraint.contains(&self.interpreter_version)
    }

    /// Evaluates a marker expression against this environment, optionally augmented with the
    /// given extras. An entry like `extra == "e"` holds iff `e` is among `extras`, which gives
    /// exactly the "any extra makes it true" semantics dependency gathering needs.
    pub fn evaluate_marker(&self, marker: &MarkerTree, extras: &[&Extra]) -> bool {
        let extra_strs = extras.iter().map(|e| e.as_str()).collect::<Vec<_>>();
        marker.evaluate(&self.markers, &extra_strs)
    }
}
