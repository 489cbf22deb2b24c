//! Defaulting decorators around the raw protocol services.
//!
//! Each wrapper substitutes its configured [`ServiceDefaults`] when a caller
//! omits max-items or depth and passes explicit values through unchanged.
//! Values above the default are not clamped.

use std::sync::Arc;

use tracing::debug;

use cmr_store::{ContentStream, Properties, RepositoryInfo, TypeContainer, TypeDefinition};
use cmr_types::{AllowableActions, CallContext, Depth, ObjectId};

use crate::data_objects::{Include, ObjectData, RenditionData};
use crate::error::ServerResult;
use crate::services::{
    CheckInRequest, DiscoveryService, NavigationService, ObjectContainer, ObjectList,
    ObjectService, Page, Paging, RepositoryService, TypeQuery, VersioningService, VersioningState,
};

/// Defaults fixed when a service is assembled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceDefaults {
    pub max_items: usize,
    pub depth: Depth,
}

impl ServiceDefaults {
    /// Type listings: 100 items, every level.
    pub const TYPES: Self = Self {
        max_items: 100,
        depth: Depth::All,
    };

    /// Object listings: 1000 items, two levels.
    pub const OBJECTS: Self = Self {
        max_items: 1000,
        depth: Depth::Levels(2),
    };

    pub fn paging(&self, paging: Paging) -> Paging {
        if paging.max_items.is_some() {
            return paging;
        }
        debug!(max_items = self.max_items, "defaulting max items");
        Paging {
            max_items: Some(self.max_items),
            ..paging
        }
    }

    pub fn depth(&self, depth: Option<Depth>) -> Option<Depth> {
        if depth.is_some() {
            return depth;
        }
        debug!(depth = %self.depth, "defaulting depth");
        Some(self.depth)
    }
}

pub struct RepositoryServiceWrapper {
    inner: Arc<dyn RepositoryService>,
    defaults: ServiceDefaults,
}

impl RepositoryServiceWrapper {
    pub fn new(inner: Arc<dyn RepositoryService>, defaults: ServiceDefaults) -> Self {
        Self { inner, defaults }
    }
}

impl RepositoryService for RepositoryServiceWrapper {
    fn repository_infos(&self, ctx: &CallContext) -> ServerResult<Vec<RepositoryInfo>> {
        self.inner.repository_infos(ctx)
    }

    fn repository_info(&self, ctx: &CallContext, repository_id: &str) -> ServerResult<RepositoryInfo> {
        self.inner.repository_info(ctx, repository_id)
    }

    fn type_children(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        type_id: Option<&str>,
        paging: Paging,
    ) -> ServerResult<Page<TypeDefinition>> {
        self.inner
            .type_children(ctx, repository_id, type_id, self.defaults.paging(paging))
    }

    fn type_descendants(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        type_id: Option<&str>,
        depth: Option<Depth>,
    ) -> ServerResult<Vec<TypeContainer>> {
        self.inner
            .type_descendants(ctx, repository_id, type_id, self.defaults.depth(depth))
    }

    fn type_definition(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        type_id: &str,
    ) -> ServerResult<TypeDefinition> {
        self.inner.type_definition(ctx, repository_id, type_id)
    }
}

pub struct NavigationServiceWrapper {
    inner: Arc<dyn NavigationService>,
    defaults: ServiceDefaults,
}

impl NavigationServiceWrapper {
    pub fn new(inner: Arc<dyn NavigationService>, defaults: ServiceDefaults) -> Self {
        Self { inner, defaults }
    }
}

impl NavigationService for NavigationServiceWrapper {
    fn children(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        include: &Include,
        paging: Paging,
    ) -> ServerResult<ObjectList> {
        self.inner
            .children(ctx, repository_id, folder_id, include, self.defaults.paging(paging))
    }

    fn descendants(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        depth: Option<Depth>,
        include: &Include,
    ) -> ServerResult<Vec<ObjectContainer>> {
        self.inner
            .descendants(ctx, repository_id, folder_id, self.defaults.depth(depth), include)
    }

    fn folder_tree(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        depth: Option<Depth>,
        include: &Include,
    ) -> ServerResult<Vec<ObjectContainer>> {
        self.inner
            .folder_tree(ctx, repository_id, folder_id, self.defaults.depth(depth), include)
    }

    fn object_parents(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        include: &Include,
    ) -> ServerResult<Vec<ObjectData>> {
        self.inner.object_parents(ctx, repository_id, object_id, include)
    }

    fn folder_parent(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
    ) -> ServerResult<ObjectData> {
        self.inner.folder_parent(ctx, repository_id, folder_id)
    }

    fn checked_out_docs(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: Option<&ObjectId>,
        include: &Include,
        paging: Paging,
    ) -> ServerResult<ObjectList> {
        self.inner.checked_out_docs(
            ctx,
            repository_id,
            folder_id,
            include,
            self.defaults.paging(paging),
        )
    }
}

pub struct ObjectServiceWrapper {
    inner: Arc<dyn ObjectService>,
    defaults: ServiceDefaults,
}

impl ObjectServiceWrapper {
    pub fn new(inner: Arc<dyn ObjectService>, defaults: ServiceDefaults) -> Self {
        Self { inner, defaults }
    }
}

impl ObjectService for ObjectServiceWrapper {
    fn create_document(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        type_id: &str,
        name: &str,
        properties: Properties,
        content: Option<ContentStream>,
        versioning: VersioningState,
    ) -> ServerResult<ObjectId> {
        self.inner.create_document(
            ctx,
            repository_id,
            folder_id,
            type_id,
            name,
            properties,
            content,
            versioning,
        )
    }

    fn create_folder(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        type_id: &str,
        name: &str,
        properties: Properties,
    ) -> ServerResult<ObjectId> {
        self.inner
            .create_folder(ctx, repository_id, folder_id, type_id, name, properties)
    }

    fn object(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        include: &Include,
    ) -> ServerResult<ObjectData> {
        self.inner.object(ctx, repository_id, object_id, include)
    }

    fn allowable_actions(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<AllowableActions> {
        self.inner.allowable_actions(ctx, repository_id, object_id)
    }

    fn update_properties(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        name: Option<String>,
        properties: Properties,
    ) -> ServerResult<ObjectId> {
        self.inner
            .update_properties(ctx, repository_id, object_id, name, properties)
    }

    fn move_object(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        target_folder_id: &ObjectId,
    ) -> ServerResult<ObjectId> {
        self.inner
            .move_object(ctx, repository_id, object_id, target_folder_id)
    }

    fn delete_object(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<()> {
        self.inner.delete_object(ctx, repository_id, object_id)
    }

    fn delete_tree(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
    ) -> ServerResult<usize> {
        self.inner.delete_tree(ctx, repository_id, folder_id)
    }

    fn content_stream(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<ContentStream> {
        self.inner.content_stream(ctx, repository_id, object_id)
    }

    fn set_content_stream(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        content: ContentStream,
    ) -> ServerResult<ObjectId> {
        self.inner
            .set_content_stream(ctx, repository_id, object_id, content)
    }

    fn delete_content_stream(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<ObjectId> {
        self.inner.delete_content_stream(ctx, repository_id, object_id)
    }

    fn renditions(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        paging: Paging,
    ) -> ServerResult<Page<RenditionData>> {
        self.inner
            .renditions(ctx, repository_id, object_id, self.defaults.paging(paging))
    }
}

/// Versioning calls take no paging or depth; the wrapper keeps the
/// assembled shape uniform.
pub struct VersioningServiceWrapper {
    inner: Arc<dyn VersioningService>,
}

impl VersioningServiceWrapper {
    pub fn new(inner: Arc<dyn VersioningService>) -> Self {
        Self { inner }
    }
}

impl VersioningService for VersioningServiceWrapper {
    fn check_out(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<ObjectId> {
        self.inner.check_out(ctx, repository_id, object_id)
    }

    fn cancel_check_out(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<()> {
        self.inner.cancel_check_out(ctx, repository_id, object_id)
    }

    fn check_in(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        request: CheckInRequest,
    ) -> ServerResult<ObjectId> {
        self.inner.check_in(ctx, repository_id, object_id, request)
    }

    fn all_versions(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        include: &Include,
    ) -> ServerResult<Vec<ObjectData>> {
        self.inner.all_versions(ctx, repository_id, object_id, include)
    }
}

pub struct DiscoveryServiceWrapper {
    inner: Arc<dyn DiscoveryService>,
    defaults: ServiceDefaults,
}

impl DiscoveryServiceWrapper {
    pub fn new(inner: Arc<dyn DiscoveryService>, defaults: ServiceDefaults) -> Self {
        Self { inner, defaults }
    }
}

impl DiscoveryService for DiscoveryServiceWrapper {
    fn query(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        query: &TypeQuery,
        include: &Include,
        paging: Paging,
    ) -> ServerResult<ObjectList> {
        self.inner
            .query(ctx, repository_id, query, include, self.defaults.paging(paging))
    }

    fn content_changes(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        paging: Paging,
    ) -> ServerResult<ObjectList> {
        self.inner
            .content_changes(ctx, repository_id, self.defaults.paging(paging))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the paging and depth values it receives.
    #[derive(Default)]
    struct Recorder {
        paging: Mutex<Vec<Paging>>,
        depth: Mutex<Vec<Option<Depth>>>,
    }

    impl RepositoryService for Recorder {
        fn repository_infos(&self, _ctx: &CallContext) -> ServerResult<Vec<RepositoryInfo>> {
            Ok(Vec::new())
        }

        fn repository_info(&self, _ctx: &CallContext, id: &str) -> ServerResult<RepositoryInfo> {
            Err(crate::error::ServerError::NotFound(id.to_string()))
        }

        fn type_children(
            &self,
            _ctx: &CallContext,
            _repository_id: &str,
            _type_id: Option<&str>,
            paging: Paging,
        ) -> ServerResult<Page<TypeDefinition>> {
            self.paging.lock().unwrap().push(paging);
            Ok(Page::empty())
        }

        fn type_descendants(
            &self,
            _ctx: &CallContext,
            _repository_id: &str,
            _type_id: Option<&str>,
            depth: Option<Depth>,
        ) -> ServerResult<Vec<TypeContainer>> {
            self.depth.lock().unwrap().push(depth);
            Ok(Vec::new())
        }

        fn type_definition(
            &self,
            _ctx: &CallContext,
            _repository_id: &str,
            type_id: &str,
        ) -> ServerResult<TypeDefinition> {
            Err(crate::error::ServerError::NotFound(type_id.to_string()))
        }
    }

    fn wrapped(defaults: ServiceDefaults) -> (Arc<Recorder>, RepositoryServiceWrapper) {
        let recorder = Arc::new(Recorder::default());
        let wrapper = RepositoryServiceWrapper::new(recorder.clone(), defaults);
        (recorder, wrapper)
    }

    #[test]
    fn omitted_values_get_defaults() {
        let (recorder, svc) = wrapped(ServiceDefaults::TYPES);
        let ctx = CallContext::anonymous();
        svc.type_children(&ctx, "A1", None, Paging::default()).unwrap();
        svc.type_descendants(&ctx, "A1", None, None).unwrap();
        assert_eq!(recorder.paging.lock().unwrap()[0].max_items, Some(100));
        assert_eq!(recorder.depth.lock().unwrap()[0], Some(Depth::All));
    }

    #[test]
    fn explicit_values_pass_through_unclamped() {
        let (recorder, svc) = wrapped(ServiceDefaults::TYPES);
        let ctx = CallContext::anonymous();
        svc.type_children(&ctx, "A1", None, Paging::new(Some(5000), Some(3)))
            .unwrap();
        svc.type_descendants(&ctx, "A1", None, Some(Depth::Levels(7)))
            .unwrap();
        let paging = recorder.paging.lock().unwrap()[0];
        assert_eq!(paging.max_items, Some(5000));
        assert_eq!(paging.skip_count, Some(3));
        assert_eq!(recorder.depth.lock().unwrap()[0], Some(Depth::Levels(7)));
    }

    #[test]
    fn skip_count_survives_defaulting() {
        let paging = ServiceDefaults::OBJECTS.paging(Paging::new(None, Some(10)));
        assert_eq!(paging.max_items, Some(1000));
        assert_eq!(paging.skip_count, Some(10));
    }

    #[test]
    fn object_defaults() {
        assert_eq!(ServiceDefaults::OBJECTS.depth(None), Some(Depth::Levels(2)));
        assert_eq!(ServiceDefaults::OBJECTS.max_items, 1000);
    }
}
