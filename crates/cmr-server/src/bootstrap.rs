//! Startup population of the repository registry.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use cmr_store::{create_store_manager, StoreManager};

use crate::config::BootstrapConfig;
use crate::error::ServerResult;
use crate::factory::ServiceFactory;
use crate::filler::{FillSummary, ObjectGenerator};

/// What a bootstrap run did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapOutcome {
    /// Repositories that existed and were re-initialized.
    pub initialized: Vec<String>,
    /// The configured repository, when this run created it.
    pub created: Option<String>,
    /// Filler result for a newly created repository.
    pub filled: Option<FillSummary>,
    /// Filler failure, logged and otherwise ignored.
    pub fill_error: Option<String>,
}

pub struct RepositoryBootstrapper {
    config: BootstrapConfig,
}

impl RepositoryBootstrapper {
    pub fn new(config: BootstrapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Select the registry implementation, then populate and assemble.
    pub fn bootstrap(&self) -> ServerResult<(ServiceFactory, BootstrapOutcome)> {
        let registry = create_store_manager(self.config.repository_class.as_deref())?;
        self.bootstrap_with(registry)
    }

    /// Populate `registry`, assemble the services, and run the filler if a
    /// repository was created.
    pub fn bootstrap_with(
        &self,
        registry: Arc<dyn StoreManager>,
    ) -> ServerResult<(ServiceFactory, BootstrapOutcome)> {
        let mut outcome = BootstrapOutcome::default();
        for id in registry.repository_ids()? {
            registry.init_repository(&id)?;
            outcome.initialized.push(id);
        }

        if let Some(id) = self.config.repository_id.as_deref() {
            if registry.contains(id)? {
                warn!(repository = id, "repository already exists, creation skipped");
            } else {
                registry.create_and_init_repository(id, self.config.type_creator.as_deref())?;
                outcome.created = Some(id.to_string());
            }
        }

        let factory = ServiceFactory::assemble(Arc::clone(&registry));

        if let (Some(id), true) = (outcome.created.as_deref(), self.config.filler.enabled) {
            match self.fill(&factory, id) {
                Ok(summary) => {
                    info!(
                        repository = id,
                        folders = summary.folders,
                        documents = summary.documents,
                        "repository filled"
                    );
                    outcome.filled = Some(summary);
                }
                Err(e) => {
                    error!(repository = id, error = %e, "filling repository failed");
                    outcome.fill_error = Some(e.to_string());
                }
            }
        }

        info!(
            initialized = outcome.initialized.len(),
            created = ?outcome.created,
            "bootstrap complete"
        );
        Ok((factory, outcome))
    }

    fn fill(&self, factory: &ServiceFactory, repository_id: &str) -> ServerResult<FillSummary> {
        let root = factory
            .registry()
            .object_store(repository_id)?
            .root_folder_id()
            .clone();
        let generator = ObjectGenerator::new(
            factory.raw_object_service(),
            Arc::clone(factory.registry()),
            repository_id,
            self.config.filler.clone(),
        );
        generator.fill(&root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmr_store::InMemoryStoreManager;

    use crate::config::{keys, FillerConfig, Parameters};
    use crate::error::ServerError;

    fn config(id: Option<&str>, filler: bool) -> BootstrapConfig {
        BootstrapConfig {
            repository_id: id.map(str::to_string),
            filler: FillerConfig {
                enabled: filler,
                ..FillerConfig::default()
            },
            ..BootstrapConfig::default()
        }
    }

    fn count(registry: &Arc<dyn StoreManager>, id: &str) -> usize {
        registry.object_store(id).unwrap().object_count().unwrap()
    }

    #[test]
    fn creates_configured_repository() {
        let (factory, outcome) = RepositoryBootstrapper::new(config(Some("A1"), false))
            .bootstrap()
            .unwrap();
        assert_eq!(outcome.created.as_deref(), Some("A1"));
        assert!(outcome.initialized.is_empty());
        assert_eq!(factory.registry().repository_ids().unwrap(), vec!["A1"]);
        assert_eq!(count(factory.registry(), "A1"), 1);
    }

    #[test]
    fn no_repository_configured() {
        let (factory, outcome) = RepositoryBootstrapper::new(config(None, true))
            .bootstrap()
            .unwrap();
        assert_eq!(outcome, BootstrapOutcome::default());
        assert!(factory.registry().repository_ids().unwrap().is_empty());
    }

    #[test]
    fn rerun_is_idempotent() {
        let registry: Arc<dyn StoreManager> = Arc::new(InMemoryStoreManager::new());
        let bootstrapper = RepositoryBootstrapper::new(config(Some("A1"), true));

        let (_, first) = bootstrapper.bootstrap_with(Arc::clone(&registry)).unwrap();
        assert_eq!(first.created.as_deref(), Some("A1"));
        let after_first = count(&registry, "A1");
        assert_eq!(after_first, 1 + 2 + 2);

        let (_, second) = bootstrapper.bootstrap_with(Arc::clone(&registry)).unwrap();
        assert_eq!(second.initialized, vec!["A1"]);
        assert!(second.created.is_none());
        assert!(second.filled.is_none());
        assert_eq!(count(&registry, "A1"), after_first);
    }

    #[test]
    fn default_filler_shape() {
        let (factory, outcome) = RepositoryBootstrapper::new(config(Some("A1"), true))
            .bootstrap()
            .unwrap();
        let summary = outcome.filled.unwrap();
        assert_eq!((summary.folders, summary.documents), (2, 2));

        let store = factory.registry().object_store("A1").unwrap();
        let top = store.children(store.root_folder_id()).unwrap();
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|o| o.is_folder()));
        for folder in &top {
            let docs = store.children(&folder.id).unwrap();
            assert_eq!(docs.len(), 1);
            assert!(!docs[0].is_folder());
        }
    }

    #[test]
    fn filler_failure_is_swallowed() {
        let mut cfg = config(Some("A1"), true);
        cfg.filler.document_type = "NoSuchType".into();
        let (factory, outcome) = RepositoryBootstrapper::new(cfg).bootstrap().unwrap();
        assert_eq!(outcome.created.as_deref(), Some("A1"));
        assert!(outcome.filled.is_none());
        assert!(outcome.fill_error.is_some());
        assert!(factory.registry().contains("A1").unwrap());
    }

    #[test]
    fn unknown_registry_class_fails() {
        let mut cfg = config(Some("A1"), false);
        cfg.repository_class = Some("jdbc".into());
        let err = RepositoryBootstrapper::new(cfg).bootstrap().err().unwrap();
        assert!(matches!(err, ServerError::Store(_)));
    }

    #[test]
    fn unknown_type_creator_fails() {
        let mut cfg = config(Some("A1"), false);
        cfg.type_creator = Some("nope".into());
        assert!(RepositoryBootstrapper::new(cfg).bootstrap().is_err());
    }

    #[test]
    fn from_parameters_end_to_end() {
        let params: Parameters = [
            (keys::REPOSITORY_ID, "A1"),
            (keys::TYPE_CREATOR_CLASS, "sample"),
            (keys::FILLER_ENABLE, "TRUE"),
            (keys::FILLER_DEPTH, "2"),
            (keys::FILLER_DOCUMENT_TYPE, "ComplexType"),
            (keys::FILLER_CONTENT_SIZE_KB, "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let (_, outcome) =
            RepositoryBootstrapper::new(BootstrapConfig::from_parameters(&params))
                .bootstrap()
                .unwrap();
        let summary = outcome.filled.unwrap();
        assert_eq!(summary.folders, 2 + 4);
        assert_eq!(summary.documents, 6);
        assert_eq!(summary.content_bytes, 6 * 1024);
    }
}
