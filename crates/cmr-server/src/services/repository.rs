use std::sync::Arc;

use tracing::debug;

use cmr_store::{RepositoryInfo, StoreManager, TypeContainer, TypeDefinition};
use cmr_types::{CallContext, Depth};

use crate::error::ServerResult;
use crate::services::{Page, Paging, RepositoryService};

/// Repository and type service over a [`StoreManager`].
pub struct InMemoryRepositoryService {
    registry: Arc<dyn StoreManager>,
}

impl InMemoryRepositoryService {
    pub fn new(registry: Arc<dyn StoreManager>) -> Self {
        Self { registry }
    }

    /// Every type of the repository that is `type_id` or derives from it.
    pub fn subtype_ids(&self, repository_id: &str, type_id: &str) -> ServerResult<Vec<String>> {
        let types = self.registry.type_manager(repository_id)?;
        types.require(type_id)?;
        let mut ids = vec![type_id.to_string()];
        let mut stack = vec![type_id.to_string()];
        while let Some(current) = stack.pop() {
            for child in types.children(Some(&current))? {
                ids.push(child.id.clone());
                stack.push(child.id.clone());
            }
        }
        Ok(ids)
    }
}

impl RepositoryService for InMemoryRepositoryService {
    fn repository_infos(&self, _ctx: &CallContext) -> ServerResult<Vec<RepositoryInfo>> {
        self.registry
            .repository_ids()?
            .iter()
            .map(|id| Ok(self.registry.repository_info(id)?))
            .collect()
    }

    fn repository_info(&self, _ctx: &CallContext, repository_id: &str) -> ServerResult<RepositoryInfo> {
        Ok(self.registry.repository_info(repository_id)?)
    }

    fn type_children(
        &self,
        _ctx: &CallContext,
        repository_id: &str,
        type_id: Option<&str>,
        paging: Paging,
    ) -> ServerResult<Page<TypeDefinition>> {
        let types = self.registry.type_manager(repository_id)?;
        let children = types
            .children(type_id)?
            .into_iter()
            .cloned()
            .collect();
        Ok(Page::of(children, paging))
    }

    fn type_descendants(
        &self,
        _ctx: &CallContext,
        repository_id: &str,
        type_id: Option<&str>,
        depth: Option<Depth>,
    ) -> ServerResult<Vec<TypeContainer>> {
        let depth = depth.unwrap_or(Depth::All).validate()?;
        debug!(repository = repository_id, ?type_id, %depth, "type descendants");
        let types = self.registry.type_manager(repository_id)?;
        Ok(types.descendants(type_id, depth)?)
    }

    fn type_definition(
        &self,
        _ctx: &CallContext,
        repository_id: &str,
        type_id: &str,
    ) -> ServerResult<TypeDefinition> {
        let types = self.registry.type_manager(repository_id)?;
        Ok(types.require(type_id)?.clone())
    }
}
