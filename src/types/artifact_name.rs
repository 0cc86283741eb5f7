use super::{NormalizedPackageName, PackageName, ParsePackageNameError};
use crate::tags::WheelTag;
use itertools::Itertools;
use pep440_rs::Version;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Structure that contains the information that is encoded in a wheel filename.
/// See: [File Name Convention](https://www.python.org/dev/peps/pep-0427/#file-name-convention),
/// and: [PyPA Conventions](https://packaging.python.org/en/latest/specifications/),
/// for more details regarding the structure of a wheel name.
///
/// Wheels are the only artifact form this crate resolves. A listing row whose filename is not a
/// well-formed wheel name is rejected at descriptor construction with a
/// [`ParseArtifactNameError`]; source distributions are a concern of build frontends, not of a
/// lock resolver.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct WheelFilename {
    /// Distribution name, e.g. ‘django’, ‘pyramid’.
    pub distribution: PackageName,

    /// Distribution version, e.g. 1.0.
    pub version: Version,

    /// Optional build number that disambiguates otherwise identical filenames.
    pub build_tag: Option<BuildTag>,

    /// Language implementation and version tag
    /// E.g. ‘py27’, ‘py2’, ‘py3’.
    pub py_tags: Vec<String>,

    /// ABI specific tags
    /// E.g. ‘cp33m’, ‘abi3’, ‘none’.
    pub abi_tags: Vec<String>,

    /// Architecture specific tags
    /// E.g. ‘linux_x86_64’, ‘any’, ‘manylinux_2_17_x86_64’
    pub arch_tags: Vec<String>,
}

impl WheelFilename {
    /// Creates a set of all tags that are contained in this wheel name.
    pub fn all_tags(&self) -> HashSet<WheelTag> {
        HashSet::from_iter(self.all_tags_iter())
    }

    /// Returns an iterator over all the tags that are contained in this wheel name. Note that
    /// there might be duplicates in the iterator. Use [`Self::all_tags`] if you want a unique set
    /// of tags.
    pub fn all_tags_iter(&self) -> impl Iterator<Item = WheelTag> + '_ {
        self.py_tags
            .iter()
            .cartesian_product(self.abi_tags.iter())
            .cartesian_product(self.arch_tags.iter())
            .map(|((py, abi), arch)| WheelTag {
                interpreter: py.clone(),
                abi: abi.clone(),
                platform: arch.clone(),
            })
    }
}

impl Display for WheelFilename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{dist}-{ver}{build}-{py_tags}-{abi_tags}-{arch_tags}.whl",
            dist = self.distribution.as_source_str(),
            ver = self.version,
            build = self
                .build_tag
                .as_ref()
                .map_or_else(|| String::from(""), |tag| format!("-{tag}")),
            py_tags = self.py_tags.join("."),
            abi_tags = self.abi_tags.join("."),
            arch_tags = self.arch_tags.join("."),
        )
    }
}

/// A build number. Must start with a digit. Acts as a tie-breaker if two wheel file names are the
/// same in all other respects (i.e. name, version and other tags).
///
/// Sorts by the leading digits as an integer first and the remainder of the tag as a string
/// second; an absent build tag sorts below any present one.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, SerializeDisplay, DeserializeFromStr)]
pub struct BuildTag {
    number: u32,
    name: String,
}

impl Display for BuildTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.number, &self.name)
    }
}

impl FromStr for BuildTag {
    type Err = ParseArtifactNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first_alpha_idx = s.find(|c: char| c.is_ascii_alphabetic()).unwrap_or(s.len());
        let (digits, name) = s.split_at(first_alpha_idx);
        Ok(Self {
            number: digits
                .parse()
                .map_err(|_| ParseArtifactNameError::BuildTagMustStartWithDigit(s.to_owned()))?,
            name: name.to_owned(),
        })
    }
}

/// An error that can occur when parsing a wheel filename
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum ParseArtifactNameError {
    #[error("invalid artifact name")]
    InvalidName,

    #[error("package name '{0}' not found in filename: '{1}'")]
    PackageNameNotFound(NormalizedPackageName, String),

    #[error("invalid artifact extension, only wheels (.whl) are resolvable (filename='{0}')")]
    InvalidExtension(String),

    #[error(transparent)]
    InvalidPackageName(#[from] ParsePackageNameError),

    #[error("invalid version: '{0}'")]
    InvalidVersion(String),

    #[error("build tag '{0}' must start with a digit")]
    BuildTagMustStartWithDigit(String),
}

/// Split the filename into the distribution part and the rest of the filename by matching it
/// against the normalized package name. Split on each `-` until the prefix normalizes to the
/// expected package name.
///
/// E.g `trio-0.18.0-py3-none-any.whl` with normalized package name `trio`
/// should split into (`trio`, `0.18.0-py3-none-any.whl`)
fn split_into_filename_rest<'a>(
    s: &'a str,
    normalized_package_name: &NormalizedPackageName,
) -> Option<(&'a str, &'a str)> {
    for (idx, char) in s.char_indices() {
        if char == '-' {
            let (name, rest) = (&s[..idx], &s[idx + 1..]);
            let parsed = name.parse::<NormalizedPackageName>();
            if let Ok(parsed) = parsed {
                if parsed == *normalized_package_name {
                    return Some((name, rest));
                }
            }
        }
    }
    None
}

impl WheelFilename {
    /// Parse the wheel name from a filename string
    /// e.g "trio-0.18.0-py3-none-any.whl"
    pub fn from_filename(
        s: &str,
        normalized_package_name: &NormalizedPackageName,
    ) -> Result<Self, ParseArtifactNameError> {
        let Some(file_stem) = s.strip_suffix(".whl") else {
            return Err(ParseArtifactNameError::InvalidExtension(s.to_string()));
        };

        // Parse the distribution
        let Some((distribution, rest)) =
            split_into_filename_rest(file_stem, normalized_package_name)
        else {
            return Err(ParseArtifactNameError::PackageNameNotFound(
                normalized_package_name.clone(),
                s.to_string(),
            ));
        };
        let distribution = PackageName::from_str(distribution)
            .map_err(ParseArtifactNameError::InvalidPackageName)?;

        // Parse the version
        let Some((version, rest)) = rest.split_once('-') else {
            return Err(ParseArtifactNameError::InvalidName);
        };
        let version = Version::from_str(version)
            .map_err(|e| ParseArtifactNameError::InvalidVersion(e.to_string()))?;

        // Parse the platform tag
        let Some((rest, platform_tags)) = rest.rsplit_once('-') else {
            return Err(ParseArtifactNameError::InvalidName);
        };
        let arch_tags = platform_tags.split('.').map(ToOwned::to_owned).collect();

        // Parse the abi tag
        let Some((rest, abi_tag)) = rest.rsplit_once('-') else {
            return Err(ParseArtifactNameError::InvalidName);
        };
        let abi_tags = abi_tag.split('.').map(ToOwned::to_owned).collect();

        // Parse the python tag, whatever precedes it is the build tag
        let (build_tag, python_tag) = match rest.rsplit_once('-') {
            Some((build_tag, python_tag)) => (Some(build_tag), python_tag),
            None => (None, rest),
        };
        let py_tags = python_tag.split('.').map(ToOwned::to_owned).collect();
        let build_tag = build_tag
            .map(BuildTag::from_str)
            .map_or_else(|| Ok(None), |result| result.map(Some))?;

        Ok(Self {
            distribution,
            version,
            build_tag,
            py_tags,
            abi_tags,
            arch_tags,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_filename_splitting() {
        let normalized_package_name = NormalizedPackageName::from_str("trio").unwrap();
        let filename = "trio-0.18.0-py3-none-any.whl";
        let (name, rest) = split_into_filename_rest(filename, &normalized_package_name).unwrap();
        assert_eq!(name, "trio");
        assert_eq!(rest, "0.18.0-py3-none-any.whl");

        let normalized_package_name = NormalizedPackageName::from_str("trio-three").unwrap();
        let filename = "trio-three-0.18.0-py3-none-any.whl";
        let (name, rest) = split_into_filename_rest(filename, &normalized_package_name).unwrap();
        assert_eq!(name, "trio-three");
        assert_eq!(rest, "0.18.0-py3-none-any.whl");
    }

    #[test]
    fn test_wheel_name_from_str() {
        let n =
            WheelFilename::from_filename("trio-0.18.0-py3-none-any.whl", &"trio".parse().unwrap())
                .unwrap();
        assert_eq!(n.distribution, "trio".parse().unwrap());
        assert_eq!(n.version, "0.18.0".parse().unwrap());
        assert_eq!(n.build_tag, None);
        assert_eq!(n.py_tags, vec!["py3"]);
        assert_eq!(n.abi_tags, vec!["none"]);
        assert_eq!(n.arch_tags, vec!["any"]);

        assert_eq!(n.to_string(), "trio-0.18.0-py3-none-any.whl");
    }

    #[test]
    fn test_wheel_name_from_str_harder() {
        let n = WheelFilename::from_filename(
            "foo.bar-0.1b3-1local-py2.py3-none-any.whl",
            &"foo.bar".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(n.distribution, "foo.bar".parse().unwrap());
        assert_eq!(n.version, "0.1b3".parse().unwrap());
        assert_eq!(
            n.build_tag,
            Some(BuildTag {
                number: 1,
                name: String::from("local"),
            })
        );
        assert_eq!(n.py_tags, vec!["py2", "py3"],);
        assert_eq!(n.abi_tags, vec!["none"]);
        assert_eq!(n.arch_tags, vec!["any"]);

        assert_eq!(n.to_string(), "foo.bar-0.1b3-1local-py2.py3-none-any.whl");
    }

    #[test]
    fn test_many_linux() {
        let n = WheelFilename::from_filename(
            "numpy-1.26.0-pp39-pypy39_pp73-manylinux_2_17_x86_64.manylinux2014_x86_64.whl",
            &"numpy".parse().unwrap(),
        )
        .unwrap();

        assert_eq!(
            n.arch_tags,
            vec!["manylinux_2_17_x86_64", "manylinux2014_x86_64"]
        );
    }

    #[test]
    fn test_rejects_sdist_filename() {
        let err = WheelFilename::from_filename("trio-0.18.0.tar.gz", &"trio".parse().unwrap())
            .unwrap_err();
        assert!(matches!(err, ParseArtifactNameError::InvalidExtension(_)));
    }

    #[test]
    fn test_build_tag_ordering() {
        let a = BuildTag::from_str("1").unwrap();
        let b = BuildTag::from_str("2").unwrap();
        let c = BuildTag::from_str("2b").unwrap();
        assert!(a < b);
        assert!(b < c);
        assert!(None::<BuildTag> < Some(a));
    }
}
