use crate::types::{Extra, NormalizedPackageName};
use serde_with::SerializeDisplay;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

/// The resolver's unit of choice: either a bare distribution, or the same distribution together
/// with a set of requested extras.
///
/// An extras-bearing key acts as a virtual sibling of the bare key: it resolves to its own
/// candidate, but dependency gathering synthesizes an exact-version requirement forcing the bare
/// key to the same version, so the two can never drift apart. Distinct extras sets are distinct
/// keys, which lets `spam[a]` and `spam[b]` coexist without either reprocessing the bare
/// distribution's dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay)]
pub enum DistributionKey {
    /// The distribution itself.
    Bare(NormalizedPackageName),

    /// The distribution with a non-empty set of extras, sorted and deduplicated.
    WithExtras(NormalizedPackageName, SmallVec<[Extra; 2]>),
}

impl DistributionKey {
    /// Creates a key from a name and any iterable of extras. Extras are sorted and deduplicated;
    /// an empty set yields the bare key.
    pub fn from_parts(
        name: NormalizedPackageName,
        extras: impl IntoIterator<Item = Extra>,
    ) -> Self {
        let mut extras: SmallVec<[Extra; 2]> = extras.into_iter().collect();
        if extras.is_empty() {
            return DistributionKey::Bare(name);
        }
        extras.sort();
        extras.dedup();
        DistributionKey::WithExtras(name, extras)
    }

    /// Returns the distribution name without the extras.
    pub fn name(&self) -> &NormalizedPackageName {
        match self {
            DistributionKey::Bare(name) => name,
            DistributionKey::WithExtras(name, _) => name,
        }
    }

    /// Returns the extras of this key, empty for a bare key.
    pub fn extras(&self) -> &[Extra] {
        match self {
            DistributionKey::Bare(_) => &[],
            DistributionKey::WithExtras(_, extras) => extras,
        }
    }

    /// The bare sibling of this key.
    pub fn as_bare(&self) -> DistributionKey {
        DistributionKey::Bare(self.name().clone())
    }
}

impl Display for DistributionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionKey::Bare(name) => write!(f, "{}", name),
            DistributionKey::WithExtras(name, extras) => {
                write!(f, "{}[", name)?;
                for (idx, extra) in extras.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", extra.as_str())?;
                }
                write!(f, "]")
            }
        }
    }
}
