use std::sync::Arc;

use tracing::{debug, info};

use cmr_store::{
    ContentStream, NewObject, ObjectBody, ObjectStore, Properties, StoreManager, StoredObject,
    VersionIncrement, VersioningMode,
};
use cmr_types::{AllowableActions, BaseKind, CallContext, Identity, ObjectId};

use crate::actions;
use crate::data_objects::{object_data, Include, ObjectData, RenditionData};
use crate::error::{ServerError, ServerResult};
use crate::services::{ObjectService, Page, Paging, VersioningState};

/// Object CRUD and content handling over a [`StoreManager`].
///
/// The `*_as` constructors take any [`Identity`] so server-internal
/// generation can create objects without a protocol caller.
pub struct InMemoryObjectService {
    registry: Arc<dyn StoreManager>,
}

impl InMemoryObjectService {
    pub fn new(registry: Arc<dyn StoreManager>) -> Self {
        Self { registry }
    }

    pub(crate) fn store(&self, repository_id: &str) -> ServerResult<Arc<dyn ObjectStore>> {
        Ok(self.registry.object_store(repository_id)?)
    }

    /// Check that `type_id` exists, has base kind `kind`, and defines every
    /// supplied property with a matching data type.
    pub(crate) fn validate(
        &self,
        repository_id: &str,
        type_id: &str,
        kind: BaseKind,
        properties: &Properties,
    ) -> ServerResult<bool> {
        let types = self.registry.type_manager(repository_id)?;
        let def = types.require(type_id)?;
        if def.base_kind != kind {
            return Err(ServerError::InvalidArgument(format!(
                "type {type_id} is a {} type, expected {kind}",
                def.base_kind
            )));
        }
        types.validate_properties(type_id, properties)?;
        Ok(def.versionable)
    }

    pub(crate) fn to_data(
        &self,
        store: &dyn ObjectStore,
        obj: &StoredObject,
        caller: Option<&str>,
        include: &Include,
    ) -> ServerResult<ObjectData> {
        Ok(object_data(store, obj, caller, include)?)
    }

    /// A private working copy may only be changed by its owner.
    pub(crate) fn require_pwc_owner(
        &self,
        store: &dyn ObjectStore,
        obj: &StoredObject,
        caller: Option<&str>,
    ) -> ServerResult<()> {
        if let (true, Some(series_id)) = (obj.is_pwc(), obj.series_id()) {
            let state = store.lifecycle(series_id)?;
            if !state.is_held_by(caller) {
                return Err(ServerError::PermissionDenied(format!(
                    "working copy {} is checked out by {}",
                    obj.id,
                    state.owner().unwrap_or("nobody")
                )));
            }
        }
        Ok(())
    }

    /// The object a content write lands on. A series head stands for its
    /// working copy, which only the checkout holder may change.
    fn content_target(
        &self,
        store: &dyn ObjectStore,
        obj: &StoredObject,
        caller: Option<&str>,
    ) -> ServerResult<ObjectId> {
        if !matches!(obj.body, ObjectBody::VersionedDocument) {
            self.require_pwc_owner(store, obj, caller)?;
            return Ok(obj.id.clone());
        }
        let state = store.lifecycle(&obj.id)?;
        match state.pwc_id() {
            Some(pwc_id) if state.is_held_by(caller) => Ok(pwc_id.clone()),
            Some(_) => Err(ServerError::PermissionDenied(format!(
                "document {} is checked out by {}",
                obj.id,
                state.owner().unwrap_or("nobody")
            ))),
            None => Err(ServerError::Constraint(format!(
                "document {} must be checked out before its content changes",
                obj.id
            ))),
        }
    }

    pub fn create_folder_as(
        &self,
        identity: &dyn Identity,
        repository_id: &str,
        folder_id: &ObjectId,
        spec: NewObject,
    ) -> ServerResult<ObjectId> {
        self.validate(repository_id, &spec.type_id, BaseKind::Folder, &spec.properties)?;
        let store = self.store(repository_id)?;
        let folder = store.create_folder(folder_id, spec, identity.username())?;
        debug!(repository = repository_id, id = %folder.id, system = identity.is_system(), "folder created");
        Ok(folder.id)
    }

    pub fn create_document_as(
        &self,
        identity: &dyn Identity,
        repository_id: &str,
        folder_id: &ObjectId,
        spec: NewObject,
        content: Option<ContentStream>,
        versioning: VersioningState,
    ) -> ServerResult<ObjectId> {
        let versionable =
            self.validate(repository_id, &spec.type_id, BaseKind::Document, &spec.properties)?;
        let mode = match (versionable, versioning) {
            (false, VersioningState::None) => VersioningMode::Unversioned,
            (false, state) => {
                return Err(ServerError::Constraint(format!(
                    "type {} is not versionable, cannot create with state {state:?}",
                    spec.type_id
                )))
            }
            (true, VersioningState::None | VersioningState::Major) => {
                VersioningMode::Versioned(VersionIncrement::Major)
            }
            (true, VersioningState::Minor) => VersioningMode::Versioned(VersionIncrement::Minor),
            (true, VersioningState::CheckedOut) => {
                let owner = identity.username().ok_or_else(|| {
                    ServerError::PermissionDenied("anonymous callers cannot check out".into())
                })?;
                VersioningMode::CheckedOut {
                    owner: owner.to_string(),
                }
            }
        };
        let store = self.store(repository_id)?;
        let doc = store.create_document(folder_id, spec, content, mode, identity.username())?;
        debug!(repository = repository_id, id = %doc.id, system = identity.is_system(), "document created");
        Ok(doc.id)
    }
}

impl ObjectService for InMemoryObjectService {
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
        let spec = NewObject::new(name, type_id).with_properties(properties);
        self.create_document_as(ctx, repository_id, folder_id, spec, content, versioning)
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
        let spec = NewObject::new(name, type_id).with_properties(properties);
        self.create_folder_as(ctx, repository_id, folder_id, spec)
    }

    fn object(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        include: &Include,
    ) -> ServerResult<ObjectData> {
        let store = self.store(repository_id)?;
        let obj = store.get(object_id)?;
        self.to_data(store.as_ref(), &obj, ctx.username(), include)
    }

    fn allowable_actions(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<AllowableActions> {
        let store = self.store(repository_id)?;
        let obj = store.get(object_id)?;
        Ok(actions::compute_for(store.as_ref(), &obj, ctx.username())?)
    }

    fn update_properties(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        name: Option<String>,
        properties: Properties,
    ) -> ServerResult<ObjectId> {
        let store = self.store(repository_id)?;
        let obj = store.get(object_id)?;
        self.validate(repository_id, &obj.type_id, obj.base_kind(), &properties)?;
        self.require_pwc_owner(store.as_ref(), &obj, ctx.username())?;
        let updated = store.update_properties(object_id, name, properties)?;
        Ok(updated.id)
    }

    fn move_object(
        &self,
        _ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        target_folder_id: &ObjectId,
    ) -> ServerResult<ObjectId> {
        let store = self.store(repository_id)?;
        let moved = store.move_object(object_id, target_folder_id)?;
        Ok(moved.id)
    }

    fn delete_object(
        &self,
        _ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<()> {
        let store = self.store(repository_id)?;
        store.delete(object_id)?;
        debug!(repository = repository_id, id = %object_id, "object deleted");
        Ok(())
    }

    fn delete_tree(
        &self,
        _ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
    ) -> ServerResult<usize> {
        let store = self.store(repository_id)?;
        let removed = store.delete_tree(folder_id)?;
        info!(repository = repository_id, folder = %folder_id, removed, "tree deleted");
        Ok(removed)
    }

    fn content_stream(
        &self,
        _ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<ContentStream> {
        let store = self.store(repository_id)?;
        let obj = store.get(object_id)?;
        let source = if matches!(obj.body, ObjectBody::VersionedDocument) {
            store.latest_version(object_id)?
        } else {
            Some(obj)
        };
        source
            .and_then(|o| o.content().cloned())
            .ok_or_else(|| ServerError::Constraint(format!("object {object_id} has no content")))
    }

    fn set_content_stream(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        content: ContentStream,
    ) -> ServerResult<ObjectId> {
        let store = self.store(repository_id)?;
        let obj = store.get(object_id)?;
        let target = self.content_target(store.as_ref(), &obj, ctx.username())?;
        Ok(store.set_content(&target, Some(content))?.id)
    }

    fn delete_content_stream(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<ObjectId> {
        let store = self.store(repository_id)?;
        let obj = store.get(object_id)?;
        let target = self.content_target(store.as_ref(), &obj, ctx.username())?;
        Ok(store.set_content(&target, None)?.id)
    }

    fn renditions(
        &self,
        _ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        paging: Paging,
    ) -> ServerResult<Page<RenditionData>> {
        let store = self.store(repository_id)?;
        let obj = store.get(object_id)?;
        Ok(Page::of(crate::data_objects::fill_renditions(&obj), paging))
    }
}
