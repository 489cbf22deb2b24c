use std::sync::Arc;

use tracing::info;

use cmr_store::{CheckInUpdate, VersionIncrement};
use cmr_types::{BaseKind, CallContext, Identity, ObjectId};

use crate::data_objects::{Include, ObjectData};
use crate::error::{ServerError, ServerResult};
use crate::services::{CheckInRequest, InMemoryObjectService, VersioningService};

/// Check-out lifecycle operations. Validation and object conversion are
/// shared with the object service.
pub struct InMemoryVersioningService {
    objects: Arc<InMemoryObjectService>,
}

impl InMemoryVersioningService {
    pub fn new(objects: Arc<InMemoryObjectService>) -> Self {
        Self { objects }
    }
}

fn require_user(ctx: &CallContext) -> ServerResult<&str> {
    ctx.username()
        .ok_or_else(|| ServerError::PermissionDenied("anonymous callers cannot check out".into()))
}

impl VersioningService for InMemoryVersioningService {
    fn check_out(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<ObjectId> {
        let owner = require_user(ctx)?;
        let store = self.objects.store(repository_id)?;
        let pwc = store.check_out(object_id, owner)?;
        info!(repository = repository_id, id = %object_id, pwc = %pwc.id, owner, "checked out");
        Ok(pwc.id)
    }

    fn cancel_check_out(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<()> {
        let store = self.objects.store(repository_id)?;
        store.cancel_check_out(object_id, ctx.username())?;
        info!(repository = repository_id, id = %object_id, "check-out cancelled");
        Ok(())
    }

    fn check_in(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        request: CheckInRequest,
    ) -> ServerResult<ObjectId> {
        let store = self.objects.store(repository_id)?;
        let obj = store.get(object_id)?;
        self.objects
            .validate(repository_id, &obj.type_id, BaseKind::Document, &request.properties)?;
        let increment = if request.major {
            VersionIncrement::Major
        } else {
            VersionIncrement::Minor
        };
        let update = CheckInUpdate {
            content: request.content,
            properties: request.properties,
            comment: request.comment,
        };
        let committed = store.check_in(object_id, ctx.username(), increment, update)?;
        info!(
            repository = repository_id,
            id = %committed.id,
            label = committed.version_label().unwrap_or_default(),
            "checked in"
        );
        Ok(committed.id)
    }

    fn all_versions(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        include: &Include,
    ) -> ServerResult<Vec<ObjectData>> {
        let store = self.objects.store(repository_id)?;
        let obj = store.get(object_id)?;
        let series_id = obj.series_id().ok_or_else(|| {
            ServerError::Constraint(format!("object {object_id} is not versionable"))
        })?;
        store
            .versions(series_id)?
            .iter()
            .map(|v| self.objects.to_data(store.as_ref(), v, ctx.username(), include))
            .collect()
    }
}
