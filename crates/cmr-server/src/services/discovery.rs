use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use cmr_store::StoreManager;
use cmr_types::{CallContext, Identity};

use crate::data_objects::{listed_object_data, Include};
use crate::error::ServerResult;
use crate::services::{
    DiscoveryService, InMemoryNavigationService, InMemoryRepositoryService, ObjectList, Page,
    Paging, TypeQuery,
};

/// Type-scoped queries. Type resolution goes through the repository
/// service, folder scoping through the navigation service.
pub struct InMemoryDiscoveryService {
    registry: Arc<dyn StoreManager>,
    repository: Arc<InMemoryRepositoryService>,
    navigation: Arc<InMemoryNavigationService>,
}

impl InMemoryDiscoveryService {
    pub fn new(
        registry: Arc<dyn StoreManager>,
        repository: Arc<InMemoryRepositoryService>,
        navigation: Arc<InMemoryNavigationService>,
    ) -> Self {
        Self {
            registry,
            repository,
            navigation,
        }
    }
}

impl DiscoveryService for InMemoryDiscoveryService {
    fn query(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        query: &TypeQuery,
        include: &Include,
        paging: Paging,
    ) -> ServerResult<ObjectList> {
        let type_ids: BTreeSet<String> = if query.include_subtypes {
            self.repository
                .subtype_ids(repository_id, &query.type_id)?
                .into_iter()
                .collect()
        } else {
            self.registry
                .type_manager(repository_id)?
                .require(&query.type_id)?;
            BTreeSet::from([query.type_id.clone()])
        };

        let store = self.registry.object_store(repository_id)?;
        let scope = query
            .in_folder
            .clone()
            .unwrap_or_else(|| store.root_folder_id().clone());
        let mut matches: Vec<_> = self
            .navigation
            .descendant_objects(repository_id, &scope)?
            .into_iter()
            .filter(|obj| type_ids.contains(&obj.type_id))
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(
            repository = repository_id,
            type_id = %query.type_id,
            types = type_ids.len(),
            hits = matches.len(),
            "query evaluated"
        );

        let page = Page::of(matches, paging);
        let items = listed_object_data(store.as_ref(), &page.items, ctx.username(), include)?;
        Ok(Page {
            num_items: page.num_items - (page.items.len() - items.len()),
            items,
            has_more_items: page.has_more_items,
        })
    }

    fn content_changes(
        &self,
        _ctx: &CallContext,
        repository_id: &str,
        _paging: Paging,
    ) -> ServerResult<ObjectList> {
        self.registry.repository_info(repository_id)?;
        Ok(Page::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmr_store::{InMemoryStoreManager, NewObject, SampleTypeCreator, VersionIncrement, VersioningMode};
    use cmr_types::ErrorKind;

    fn service() -> InMemoryDiscoveryService {
        let registry: Arc<dyn StoreManager> = Arc::new(InMemoryStoreManager::new());
        registry
            .create_and_init_repository("A1", Some(SampleTypeCreator::NAME))
            .unwrap();
        let store = registry.object_store("A1").unwrap();
        let root = store.root_folder_id().clone();
        let folder = store
            .create_folder(&root, NewObject::new("f", SampleTypeCreator::FOLDER_TYPE), None)
            .unwrap();
        for (parent, name, type_id) in [
            (&root, "a", "document"),
            (&folder.id, "b", SampleTypeCreator::COMPLEX_TYPE),
            (&folder.id, "c", "document"),
        ] {
            store
                .create_document(parent, NewObject::new(name, type_id), None, VersioningMode::Unversioned, None)
                .unwrap();
        }
        store
            .create_document(
                &root,
                NewObject::new("v", SampleTypeCreator::VERSIONED_TYPE),
                None,
                VersioningMode::Versioned(VersionIncrement::Major),
                None,
            )
            .unwrap();
        let repository = Arc::new(InMemoryRepositoryService::new(Arc::clone(&registry)));
        let navigation = Arc::new(InMemoryNavigationService::new(Arc::clone(&registry)));
        InMemoryDiscoveryService::new(registry, repository, navigation)
    }

    #[test]
    fn exact_type_match() {
        let svc = service();
        let hits = svc
            .query(&CallContext::anonymous(), "A1", &TypeQuery::new("document"), &Include::default(), Paging::default())
            .unwrap();
        assert_eq!(hits.num_items, 2);
    }

    #[test]
    fn subtypes_included_on_request() {
        let svc = service();
        let mut query = TypeQuery::new("document");
        query.include_subtypes = true;
        let hits = svc
            .query(&CallContext::anonymous(), "A1", &query, &Include::default(), Paging::default())
            .unwrap();
        assert_eq!(hits.num_items, 4);
    }

    #[test]
    fn folder_scope_limits_results() {
        let svc = service();
        let ctx = CallContext::anonymous();
        let mut query = TypeQuery::new(SampleTypeCreator::FOLDER_TYPE);
        let folders = svc
            .query(&ctx, "A1", &query, &Include::default(), Paging::default())
            .unwrap();
        assert_eq!(folders.num_items, 1);

        query = TypeQuery::new("document");
        query.include_subtypes = true;
        query.in_folder = Some(folders.items[0].id.clone());
        let hits = svc
            .query(&ctx, "A1", &query, &Include::default(), Paging::new(Some(1), None))
            .unwrap();
        assert_eq!(hits.num_items, 2);
        assert_eq!(hits.items.len(), 1);
        assert!(hits.has_more_items);
    }

    #[test]
    fn unknown_type_rejected() {
        let svc = service();
        let err = svc
            .query(&CallContext::anonymous(), "A1", &TypeQuery::new("nope"), &Include::default(), Paging::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn content_changes_empty() {
        let svc = service();
        let changes = svc
            .content_changes(&CallContext::anonymous(), "A1", Paging::default())
            .unwrap();
        assert!(changes.items.is_empty());
        assert!(svc
            .content_changes(&CallContext::anonymous(), "B1", Paging::default())
            .is_err());
    }
}
