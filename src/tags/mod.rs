//! Wheels encode the Python interpreter, ABI, and platform that they support in their filenames
//! using platform compatibility tags. This module provides the tag triple itself and the ordered
//! list of tags a target environment accepts, which doubles as the preference order used when
//! ranking otherwise equal artifacts.

use indexmap::IndexSet;
use itertools::Itertools;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// A representation of a tag triple for a wheel.
#[derive(Debug, Clone, Hash, Eq, PartialEq, SerializeDisplay, DeserializeFromStr)]
pub struct WheelTag {
    /// The interpreter name, e.g. "py"
    pub interpreter: String,

    /// The ABI that a wheel supports, e.g. "cp37m"
    pub abi: String,

    /// The OS/platform the wheel supports, e.g. "win_am64".
    pub platform: String,
}

impl FromStr for WheelTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((interpreter, abi, platform)) =
            s.split('-').map(ToOwned::to_owned).collect_tuple()
        else {
            return Err(String::from("not enough '-' separators"));
        };
        Ok(Self {
            interpreter,
            abi,
            platform,
        })
    }
}

impl Display for WheelTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", &self.interpreter, &self.abi, &self.platform)
    }
}

/// Contains an ordered set of platform tags with which compatibility of wheels can be determined.
/// The order is from most to least preferred: index position 0 is the best tag the environment
/// supports.
#[derive(Debug, Clone)]
pub struct WheelTags {
    tags: IndexSet<WheelTag>,
}

impl WheelTags {
    /// Returns an iterator over the supported tags, most preferred first.
    pub fn tags(&self) -> impl Iterator<Item = &'_ WheelTag> + '_ {
        self.tags.iter()
    }

    /// The number of tags in the order.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns true if the order contains no tags at all.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Determines the preference rank of the specified tag. Returns `None` if the tag is not
    /// supported at all. Otherwise returns `len - position`, so a higher rank means a more
    /// specific, more preferred tag; an artifact is ranked by the best rank among the tags it
    /// advertises.
    pub fn rank(&self, tag: &WheelTag) -> Option<usize> {
        self.tags.get_index_of(tag).map(|pos| self.tags.len() - pos)
    }

    /// Returns if the specified tag is compatible with this set.
    pub fn is_compatible(&self, tag: &WheelTag) -> bool {
        self.tags.contains(tag)
    }
}

impl FromIterator<WheelTag> for WheelTags {
    fn from_iter<T: IntoIterator<Item = WheelTag>>(iter: T) -> Self {
        Self {
            tags: FromIterator::from_iter(iter),
        }
    }
}
