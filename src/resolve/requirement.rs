use super::identity::DistributionKey;
use crate::types::{Extra, NormalizedPackageName, ParsePackageNameError, PackageName};
use miette::Diagnostic;
use pep440_rs::{Operator, Version, VersionSpecifier, VersionSpecifiers};
use pep508_rs::VersionOrUrl;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// A constraint on a distribution as the search engine sees it: a [`DistributionKey`] plus a
/// version specifier set. Markers have already been evaluated against the environment (and
/// stripped) by the time one of these exists.
///
/// The unparsed source string is kept for diagnostics and is part of the equality relation, so
/// two textually different requirements on the same key are both tracked.
#[derive(Debug, Clone)]
pub struct ResolveRequirement {
    key: DistributionKey,
    specifiers: Option<VersionSpecifiers>,
    source: Box<str>,
}

impl ResolveRequirement {
    /// Converts a parsed PEP 508 requirement, canonicalizing the name and extras. The caller is
    /// responsible for having evaluated any marker; it is ignored here. Direct-URL requirements
    /// are rejected: the index is the only artifact source this resolver knows.
    pub fn from_parsed(req: &pep508_rs::Requirement) -> Result<Self, RequirementConversionError> {
        let name = PackageName::from_str(&req.name)?;
        let extras = req
            .extras
            .iter()
            .flatten()
            .map(|extra| Extra::from_str(extra).unwrap_or_else(|never| match never {}));
        let key = DistributionKey::from_parts(name.into(), extras);

        let specifiers = match &req.version_or_url {
            None => None,
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => Some(specifiers.clone()),
            Some(VersionOrUrl::Url(url)) => {
                return Err(RequirementConversionError::UnsupportedUrl {
                    name: key.name().clone(),
                    url: url.to_string(),
                })
            }
        };

        // The source is re-rendered without the marker: it has been evaluated by now and must
        // not distinguish otherwise identical requirements.
        let mut source = String::from(&*req.name);
        if let Some(extras) = &req.extras {
            if !extras.is_empty() {
                source.push('[');
                source.push_str(&extras.join(","));
                source.push(']');
            }
        }
        if let Some(specifiers) = &specifiers {
            source.push_str(&specifiers.to_string());
        }

        Ok(Self {
            key,
            specifiers,
            source: source.into_boxed_str(),
        })
    }

    /// Synthesizes the exact-version requirement an extras-bearing candidate emits for its bare
    /// sibling, pinning both to the same version.
    pub fn exact_pin(key: DistributionKey, version: Version) -> Self {
        let source = format!("{}=={}", key.name(), version).into_boxed_str();
        let specifier = VersionSpecifier::new(Operator::ExactEqual, version, false)
            .expect("failed to construct equality version specifier");
        Self {
            key,
            specifiers: Some(VersionSpecifiers::from_iter([specifier])),
            source,
        }
    }

    /// The identity this requirement constrains.
    pub fn key(&self) -> &DistributionKey {
        &self.key
    }

    /// The version specifier set, if the requirement constrains versions at all.
    pub fn specifiers(&self) -> Option<&VersionSpecifiers> {
        self.specifiers.as_ref()
    }

    /// Returns true if the given version lies in this requirement's specifier set. An absent set
    /// accepts every version.
    pub fn contains(&self, version: &Version) -> bool {
        match &self.specifiers {
            None => true,
            Some(specifiers) => specifiers.contains(version),
        }
    }

    /// Returns true if the specifier set explicitly mentions a prerelease version (e.g. a
    /// `== 1.0.0a1` pin), which makes prerelease candidates eligible for this requirement even
    /// when the run does not otherwise allow them.
    pub fn allows_prerelease(&self) -> bool {
        match &self.specifiers {
            None => false,
            Some(specifiers) => specifiers
                .iter()
                .any(|specifier| specifier.version().any_prerelease()),
        }
    }
}

impl Display for ResolveRequirement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl PartialEq for ResolveRequirement {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.source == other.source
    }
}

impl Eq for ResolveRequirement {}

/// An error converting a parsed requirement into the engine's internal form.
#[derive(Debug, Error, Diagnostic)]
#[allow(missing_docs)]
pub enum RequirementConversionError {
    #[error(transparent)]
    InvalidName(#[from] ParsePackageNameError),

    #[error("requirement on '{name}' uses a direct url ({url}), which cannot be index-resolved")]
    UnsupportedUrl { name: NormalizedPackageName, url: String },
}

#[cfg(test)]
mod test {
    use super::*;

    fn requirement(s: &str) -> ResolveRequirement {
        ResolveRequirement::from_parsed(&pep508_rs::Requirement::from_str(s).unwrap()).unwrap()
    }

    #[test]
    fn test_from_parsed_canonicalizes() {
        let req = requirement("Spam[Foo,Bar]==1.2.3");
        assert_eq!(req.key().name().as_str(), "spam");
        assert_eq!(
            req.key().extras().iter().map(Extra::as_str).collect::<Vec<_>>(),
            vec!["bar", "foo"]
        );
        assert!(req.contains(&"1.2.3".parse().unwrap()));
        assert!(!req.contains(&"1.2.4".parse().unwrap()));
    }

    #[test]
    fn test_equality_is_by_key_and_source() {
        assert_eq!(requirement("Spam==1.2.3"), requirement("Spam==1.2.3"));
        assert_ne!(requirement("Spam==1.2.3"), requirement("Spam >=1.2.3"));
    }

    #[test]
    fn test_exact_pin() {
        let key = DistributionKey::Bare("spam".parse().unwrap());
        let pin = ResolveRequirement::exact_pin(key, "1.2.3".parse().unwrap());
        assert!(pin.contains(&"1.2.3".parse().unwrap()));
        assert!(!pin.contains(&"1.2.3.post1".parse().unwrap()));
        assert_eq!(pin.to_string(), "spam==1.2.3");
    }

    #[test]
    fn test_prerelease_detection() {
        assert!(requirement("spam==1.0.0a1").allows_prerelease());
        assert!(!requirement("spam>=1.0").allows_prerelease());
    }

    #[test]
    fn test_url_requirement_is_rejected() {
        let parsed =
            pep508_rs::Requirement::from_str("spam @ https://example.com/spam-1.0-py3-none-any.whl")
                .unwrap();
        let err = ResolveRequirement::from_parsed(&parsed).unwrap_err();
        assert!(matches!(err, RequirementConversionError::UnsupportedUrl { .. }));
    }
}
