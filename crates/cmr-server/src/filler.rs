//! Synthetic demo tree generation.
//!
//! [`ObjectGenerator`] builds a balanced tree below a folder: `depth` levels
//! of `folders_per_folder` folders each, with `docs_per_folder` documents in
//! every generated folder. The starting folder itself receives no documents.
//! Objects are created as [`SystemContext`], never as a protocol caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use cmr_store::{ContentStream, NewObject, Properties, PropertyType, PropertyValue, StoreManager};
use cmr_types::{ObjectId, SystemContext};

use crate::config::FillerConfig;
use crate::error::{ServerError, ServerResult};
use crate::services::{InMemoryObjectService, VersioningState};

/// What one generator run created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillSummary {
    pub folders: usize,
    pub documents: usize,
    pub content_bytes: u64,
}

pub struct ObjectGenerator {
    objects: Arc<InMemoryObjectService>,
    registry: Arc<dyn StoreManager>,
    repository_id: String,
    config: FillerConfig,
}

impl ObjectGenerator {
    pub fn new(
        objects: Arc<InMemoryObjectService>,
        registry: Arc<dyn StoreManager>,
        repository_id: impl Into<String>,
        config: FillerConfig,
    ) -> Self {
        Self {
            objects,
            registry,
            repository_id: repository_id.into(),
            config,
        }
    }

    /// Generate the tree below `root`.
    pub fn fill(&self, root: &ObjectId) -> ServerResult<FillSummary> {
        let document_properties = self.property_types(
            &self.config.document_type,
            &self.config.document_properties,
        )?;
        let folder_properties =
            self.property_types(&self.config.folder_type, &self.config.folder_properties)?;

        let mut summary = FillSummary::default();
        let mut parents = vec![root.clone()];
        for level in 1..=self.config.depth {
            let mut next = Vec::new();
            let mut counter = 0usize;
            for parent in &parents {
                for _ in 0..self.config.folders_per_folder {
                    let folder = self.create_folder(parent, level, counter, &folder_properties)?;
                    counter += 1;
                    summary.folders += 1;
                    for doc in 0..self.config.docs_per_folder {
                        summary.content_bytes +=
                            self.create_document(&folder, level, summary.documents, doc, &document_properties)?;
                        summary.documents += 1;
                    }
                    next.push(folder);
                }
            }
            debug!(repository = %self.repository_id, level, folders = next.len(), "filler level generated");
            parents = next;
        }
        Ok(summary)
    }

    /// Resolve the configured property ids against the type.
    fn property_types(
        &self,
        type_id: &str,
        property_ids: &[String],
    ) -> ServerResult<Vec<(String, PropertyType)>> {
        let types = self.registry.type_manager(&self.repository_id)?;
        let def = types.require(type_id)?;
        property_ids
            .iter()
            .map(|id| {
                def.property(id)
                    .map(|p| (id.clone(), p.property_type))
                    .ok_or_else(|| {
                        ServerError::InvalidArgument(format!(
                            "property {id} is not defined for type {type_id}"
                        ))
                    })
            })
            .collect()
    }

    fn create_folder(
        &self,
        parent: &ObjectId,
        level: u32,
        n: usize,
        properties: &[(String, PropertyType)],
    ) -> ServerResult<ObjectId> {
        let name = format!("My_Folder-{level}-{n}");
        let spec = NewObject::new(&name, &self.config.folder_type)
            .with_properties(synthetic_properties(properties, n));
        self.objects
            .create_folder_as(&SystemContext, &self.repository_id, parent, spec)
    }

    fn create_document(
        &self,
        folder: &ObjectId,
        level: u32,
        n: usize,
        slot: u32,
        properties: &[(String, PropertyType)],
    ) -> ServerResult<u64> {
        let name = format!("My_Document-{level}-{slot}");
        let spec = NewObject::new(&name, &self.config.document_type)
            .with_properties(synthetic_properties(properties, n));
        let content = synthetic_content(&name, self.config.content_size_kb);
        let size = content.as_ref().map_or(0, ContentStream::len);
        self.objects.create_document_as(
            &SystemContext,
            &self.repository_id,
            folder,
            spec,
            content,
            VersioningState::None,
        )?;
        Ok(size)
    }
}

fn synthetic_properties(properties: &[(String, PropertyType)], n: usize) -> Properties {
    properties
        .iter()
        .map(|(id, ty)| {
            let value = match ty {
                PropertyType::String => PropertyValue::String(format!("{id} value {n}")),
                PropertyType::Integer => PropertyValue::Integer(n as i64),
                PropertyType::Boolean => PropertyValue::Boolean(n % 2 == 0),
            };
            (id.clone(), value)
        })
        .collect()
}

/// `size_kb` KiB of repeating text, or no content for zero.
fn synthetic_content(name: &str, size_kb: u32) -> Option<ContentStream> {
    if size_kb == 0 {
        return None;
    }
    const LINE: &[u8] = b"The quick brown fox jumps over the lazy dog.\n";
    let len = size_kb as usize * 1024;
    let data: Vec<u8> = LINE.iter().copied().cycle().take(len).collect();
    Some(ContentStream::new(format!("{name}.txt"), "text/plain", data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmr_store::{InMemoryStoreManager, ObjectStore, SampleTypeCreator};

    fn generator(config: FillerConfig) -> (ObjectGenerator, Arc<dyn ObjectStore>) {
        let registry: Arc<dyn StoreManager> = Arc::new(InMemoryStoreManager::new());
        registry
            .create_and_init_repository("A1", Some(SampleTypeCreator::NAME))
            .unwrap();
        let store = registry.object_store("A1").unwrap();
        let objects = Arc::new(InMemoryObjectService::new(Arc::clone(&registry)));
        (ObjectGenerator::new(objects, registry, "A1", config), store)
    }

    #[test]
    fn one_level_two_folders_one_doc_each() {
        let (generator, store) = generator(FillerConfig::default());
        let root = store.root_folder_id().clone();
        let summary = generator.fill(&root).unwrap();
        assert_eq!(summary.folders, 2);
        assert_eq!(summary.documents, 2);

        let children = store.children(&root).unwrap();
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| c.is_folder()));
        for folder in children {
            let docs = store.children(&folder.id).unwrap();
            assert_eq!(docs.len(), 1);
            assert!(!docs[0].is_folder());
            assert!(docs[0].created_by.is_none());
        }
    }

    #[test]
    fn deeper_trees_fan_out() {
        let config = FillerConfig {
            depth: 3,
            folders_per_folder: 2,
            docs_per_folder: 2,
            ..FillerConfig::default()
        };
        let (generator, store) = generator(config);
        let summary = generator.fill(&store.root_folder_id().clone()).unwrap();
        assert_eq!(summary.folders, 2 + 4 + 8);
        assert_eq!(summary.documents, 2 * 14);
        assert_eq!(store.object_count().unwrap(), 1 + 14 + 28);
    }

    #[test]
    fn content_and_properties_are_synthesized() {
        let config = FillerConfig {
            document_type: SampleTypeCreator::COMPLEX_TYPE.into(),
            folder_type: SampleTypeCreator::FOLDER_TYPE.into(),
            content_size_kb: 2,
            document_properties: vec!["StringProp".into(), "IntProp".into(), "BooleanProp".into()],
            folder_properties: vec!["IntFolderProp".into()],
            ..FillerConfig::default()
        };
        let (generator, store) = generator(config);
        let root = store.root_folder_id().clone();
        let summary = generator.fill(&root).unwrap();
        assert_eq!(summary.content_bytes, 2 * 2048);

        let folder = store.children(&root).unwrap().remove(0);
        assert_eq!(folder.type_id, SampleTypeCreator::FOLDER_TYPE);
        assert!(matches!(folder.properties["IntFolderProp"], PropertyValue::Integer(_)));
        let doc = store.children(&folder.id).unwrap().remove(0);
        assert_eq!(doc.properties.len(), 3);
        assert_eq!(doc.content().unwrap().len(), 2048);
    }

    #[test]
    fn unknown_property_fails() {
        let config = FillerConfig {
            document_properties: vec!["NoSuchProp".into()],
            ..FillerConfig::default()
        };
        let (generator, store) = generator(config);
        let err = generator.fill(&store.root_folder_id().clone()).unwrap_err();
        assert!(matches!(err, ServerError::InvalidArgument(_)));
        assert_eq!(store.object_count().unwrap(), 1);
    }

    #[test]
    fn unknown_type_fails() {
        let config = FillerConfig {
            folder_type: "NoSuchType".into(),
            ..FillerConfig::default()
        };
        let (generator, store) = generator(config);
        assert!(generator.fill(&store.root_folder_id().clone()).is_err());
    }

    #[test]
    fn zero_depth_generates_nothing() {
        let config = FillerConfig {
            depth: 0,
            ..FillerConfig::default()
        };
        let (generator, store) = generator(config);
        let summary = generator.fill(&store.root_folder_id().clone()).unwrap();
        assert_eq!(summary, FillSummary::default());
    }
}
