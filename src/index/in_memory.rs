use super::provider::{ArtifactIndex, IndexError};
use crate::types::{
    ArtifactHashes, ArtifactInfo, NormalizedPackageName, WheelCoreMetadata, WheelFilename, Yanked,
};
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// An [`ArtifactIndex`] backed by plain maps. Used by the test suite and by drivers that want a
/// hermetic resolution (e.g. re-resolving against the artifacts recorded in an existing lock).
///
/// Metadata is registered up front but only attached to a descriptor when the resolver asks for
/// it through [`ArtifactIndex::fetch_metadata`], so the laziness contract is exercised for real:
/// a descriptor the search never considers keeps an empty metadata slot.
#[derive(Default)]
pub struct InMemoryIndex {
    artifacts: HashMap<NormalizedPackageName, Vec<Arc<ArtifactInfo>>>,
    metadata: HashMap<WheelFilename, WheelCoreMetadata>,
    fetched: Cell<usize>,
}

impl InMemoryIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a wheel with its metadata. The project is derived from the metadata's name; the
    /// URL is synthesized from the filename.
    pub fn add_wheel(
        &mut self,
        filename: &str,
        metadata: WheelCoreMetadata,
    ) -> Result<(), IndexError> {
        self.add_wheel_with_listing(filename, None, Yanked::default(), metadata)
    }

    /// Registers a wheel together with the listing-level details an index would advertise for
    /// it: the declared `requires-python` constraint and the yanked flag.
    pub fn add_wheel_with_listing(
        &mut self,
        filename: &str,
        requires_python: Option<&str>,
        yanked: Yanked,
        metadata: WheelCoreMetadata,
    ) -> Result<(), IndexError> {
        let project: NormalizedPackageName = metadata.name.clone().into();
        let url: Url = format!("https://index.example/files/{filename}")
            .parse()
            .expect("filename forms a valid url path segment");
        let info = ArtifactInfo::from_listing(
            &project,
            filename,
            url,
            Some(ArtifactHashes::default()),
            requires_python,
            yanked,
        )
        .map_err(|source| IndexError::InvalidListing {
            project: project.clone(),
            source,
        })?;

        self.metadata.insert(info.filename.clone(), metadata);
        self.artifacts.entry(project).or_default().push(Arc::new(info));
        Ok(())
    }

    /// The number of descriptors whose metadata has been attached so far. Lets tests assert that
    /// metadata is fetched lazily and at most once per descriptor.
    pub fn metadata_fetches(&self) -> usize {
        self.fetched.get()
    }
}

impl ArtifactIndex for InMemoryIndex {
    fn available(
        &self,
        name: &NormalizedPackageName,
    ) -> Result<Vec<Arc<ArtifactInfo>>, IndexError> {
        Ok(self.artifacts.get(name).cloned().unwrap_or_default())
    }

    fn fetch_metadata(&self, batch: &[Arc<ArtifactInfo>]) -> Result<(), IndexError> {
        for info in batch {
            if info.metadata().is_some() {
                continue;
            }
            let metadata = self.metadata.get(&info.filename).ok_or_else(|| {
                IndexError::MetadataFetch {
                    filename: info.filename.clone(),
                    source: "no metadata registered for this artifact".into(),
                }
            })?;
            info.set_metadata(metadata.clone());
            self.fetched.set(self.fetched.get() + 1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn metadata(name: &str, version: &str) -> WheelCoreMetadata {
        WheelCoreMetadata::from_requirement_strs(name, version, &[], None, &[]).unwrap()
    }

    #[test]
    fn test_available_unknown_project_is_empty() {
        let index = InMemoryIndex::new();
        let listed = index.available(&"nothing".parse().unwrap()).unwrap();
        assert!(listed.is_empty());
    }

    #[test]
    fn test_metadata_attached_on_fetch_only() {
        let mut index = InMemoryIndex::new();
        index
            .add_wheel("spam-1.2.3-py3-none-any.whl", metadata("spam", "1.2.3"))
            .unwrap();

        let listed = index.available(&"spam".parse().unwrap()).unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].metadata().is_none());

        index.fetch_metadata(&listed).unwrap();
        assert!(listed[0].metadata().is_some());
        assert_eq!(index.metadata_fetches(), 1);

        // a second fetch leaves the descriptor untouched
        index.fetch_metadata(&listed).unwrap();
        assert_eq!(index.metadata_fetches(), 1);
    }

    #[test]
    fn test_rejects_non_wheel_listing() {
        let mut index = InMemoryIndex::new();
        let err = index
            .add_wheel("spam-1.2.3.tar.gz", metadata("spam", "1.2.3"))
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidListing { .. }));
    }
}
