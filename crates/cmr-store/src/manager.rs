use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use cmr_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryObjectStore;
use crate::traits::ObjectStore;
use crate::types::{type_creator, TypeManager};

/// Selector value for the built-in in-memory store manager.
pub const IN_MEMORY_CLASS: &str = "inmemory";

pub const PRODUCT_NAME: &str = "cmr in-memory repository";

/// Descriptive data about one repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub root_folder_id: ObjectId,
    pub product_name: String,
    pub product_version: String,
}

/// Registry of the repositories served by this process.
///
/// Repositories are created explicitly and never removed.
pub trait StoreManager: Send + Sync {
    /// Ids of all registered repositories, sorted.
    fn repository_ids(&self) -> StoreResult<Vec<String>>;

    /// Run the initialization hook of an existing repository. Repeated
    /// calls leave the repository unchanged.
    fn init_repository(&self, repository_id: &str) -> StoreResult<()>;

    /// Create and initialize a repository, optionally adding the types of
    /// the named type creator. Fails if the id is taken.
    fn create_and_init_repository(
        &self,
        repository_id: &str,
        type_creator: Option<&str>,
    ) -> StoreResult<()>;

    fn contains(&self, repository_id: &str) -> StoreResult<bool> {
        Ok(self
            .repository_ids()?
            .iter()
            .any(|id| id == repository_id))
    }

    fn object_store(&self, repository_id: &str) -> StoreResult<Arc<dyn ObjectStore>>;

    fn type_manager(&self, repository_id: &str) -> StoreResult<Arc<TypeManager>>;

    fn repository_info(&self, repository_id: &str) -> StoreResult<RepositoryInfo>;
}

struct RepositoryEntry {
    store: Arc<InMemoryObjectStore>,
    types: Arc<TypeManager>,
    initialized: bool,
}

/// [`StoreManager`] keeping every repository in process memory.
#[derive(Default)]
pub struct InMemoryStoreManager {
    repositories: RwLock<BTreeMap<String, RepositoryEntry>>,
}

impl InMemoryStoreManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entry<T>(
        &self,
        repository_id: &str,
        f: impl FnOnce(&RepositoryEntry) -> T,
    ) -> StoreResult<T> {
        let repos = self.repositories.read().map_err(StoreError::poisoned)?;
        repos
            .get(repository_id)
            .map(f)
            .ok_or_else(|| StoreError::RepositoryNotFound(repository_id.to_string()))
    }
}

impl StoreManager for InMemoryStoreManager {
    fn repository_ids(&self) -> StoreResult<Vec<String>> {
        let repos = self.repositories.read().map_err(StoreError::poisoned)?;
        Ok(repos.keys().cloned().collect())
    }

    fn init_repository(&self, repository_id: &str) -> StoreResult<()> {
        let mut repos = self.repositories.write().map_err(StoreError::poisoned)?;
        let entry = repos
            .get_mut(repository_id)
            .ok_or_else(|| StoreError::RepositoryNotFound(repository_id.to_string()))?;
        if entry.initialized {
            debug!(repository = repository_id, "repository already initialized");
        } else {
            entry.initialized = true;
            debug!(repository = repository_id, "repository initialized");
        }
        Ok(())
    }

    fn create_and_init_repository(
        &self,
        repository_id: &str,
        creator_name: Option<&str>,
    ) -> StoreResult<()> {
        if repository_id.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "repository id must not be empty".into(),
            ));
        }
        let types = match type_creator(creator_name)? {
            Some(creator) => TypeManager::with_creator(creator.as_ref())?,
            None => TypeManager::new(),
        };

        let mut repos = self.repositories.write().map_err(StoreError::poisoned)?;
        if repos.contains_key(repository_id) {
            return Err(StoreError::RepositoryExists(repository_id.to_string()));
        }
        let type_count = types.len();
        repos.insert(
            repository_id.to_string(),
            RepositoryEntry {
                store: Arc::new(InMemoryObjectStore::new(repository_id)),
                types: Arc::new(types),
                initialized: true,
            },
        );
        info!(
            repository = repository_id,
            type_creator = creator_name.unwrap_or("none"),
            types = type_count,
            "repository created"
        );
        Ok(())
    }

    fn object_store(&self, repository_id: &str) -> StoreResult<Arc<dyn ObjectStore>> {
        self.with_entry(repository_id, |e| {
            Arc::clone(&e.store) as Arc<dyn ObjectStore>
        })
    }

    fn type_manager(&self, repository_id: &str) -> StoreResult<Arc<TypeManager>> {
        self.with_entry(repository_id, |e| Arc::clone(&e.types))
    }

    fn repository_info(&self, repository_id: &str) -> StoreResult<RepositoryInfo> {
        self.with_entry(repository_id, |e| RepositoryInfo {
            id: repository_id.to_string(),
            name: repository_id.to_string(),
            description: format!("In-memory repository {repository_id}"),
            root_folder_id: e.store.root_folder_id().clone(),
            product_name: PRODUCT_NAME.to_string(),
            product_version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

/// Select a store manager implementation by its configured class name.
///
/// `None` or an empty name selects the in-memory manager.
pub fn create_store_manager(class: Option<&str>) -> StoreResult<Arc<dyn StoreManager>> {
    match class.map(str::trim) {
        None | Some("") | Some(IN_MEMORY_CLASS) => Ok(Arc::new(InMemoryStoreManager::new())),
        Some(other) => Err(StoreError::InvalidArgument(format!(
            "unknown repository class: {other}"
        ))),
    }
}
