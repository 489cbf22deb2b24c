//! Protocol-facing object data and the fillers that populate it.
//!
//! ACLs, policies, relationships, renditions and change events are not
//! kept by the in-memory store; their fillers return empty values so the
//! response shape is complete.

use serde::{Deserialize, Serialize};

use tracing::debug;

use cmr_store::{ObjectBody, ObjectStore, Properties, StoreError, StoreResult, StoredObject};
use cmr_types::{AllowableActions, BaseKind, ObjectId};

use crate::actions;

/// Which relationships to attach to an object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeRelationships {
    #[default]
    None,
    Source,
    Target,
    Both,
}

/// Optional parts of an object response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    pub allowable_actions: bool,
    pub acl: bool,
    pub policy_ids: bool,
    pub relationships: IncludeRelationships,
    pub renditions: bool,
    pub change_event: bool,
}

impl Include {
    pub fn with_actions() -> Self {
        Self {
            allowable_actions: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ace {
    pub principal: String,
    pub permissions: Vec<String>,
    pub direct: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    pub aces: Vec<Ace>,
    pub exact: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionData {
    pub stream_id: String,
    pub mime_type: String,
    pub kind: String,
    pub length: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
    Security,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEventInfo {
    pub change_type: Option<ChangeType>,
}

/// Content stream metadata; the bytes are fetched separately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInfo {
    pub file_name: String,
    pub mime_type: String,
    pub length: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub series_id: ObjectId,
    pub label: Option<String>,
    pub is_pwc: bool,
    pub is_latest: bool,
    pub checked_out_by: Option<String>,
    pub comment: Option<String>,
}

/// One object as returned to a protocol caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectData {
    pub id: ObjectId,
    pub name: String,
    pub base_kind: BaseKind,
    pub type_id: String,
    pub parent_id: Option<ObjectId>,
    pub created_by: Option<String>,
    pub properties: Properties,
    pub content: Option<ContentInfo>,
    pub version: Option<VersionInfo>,
    pub allowable_actions: Option<AllowableActions>,
    pub acl: Option<Acl>,
    pub policy_ids: Option<Vec<ObjectId>>,
    pub relationships: Option<Vec<ObjectData>>,
    pub renditions: Option<Vec<RenditionData>>,
    pub change_event: Option<ChangeEventInfo>,
}

/// Convert a stored object, computing allowable actions for `caller` and
/// filling the optional parts `include` asks for.
pub fn object_data(
    store: &dyn ObjectStore,
    obj: &StoredObject,
    caller: Option<&str>,
    include: &Include,
) -> StoreResult<ObjectData> {
    let allowable_actions = if include.allowable_actions {
        Some(actions::compute_for(store, obj, caller)?)
    } else {
        None
    };
    let relationships = match include.relationships {
        IncludeRelationships::None => None,
        which => Some(fill_relationships(which, obj)),
    };
    let content = content_info(store, obj)?;
    Ok(ObjectData {
        id: obj.id.clone(),
        name: obj.name.clone(),
        base_kind: obj.base_kind(),
        type_id: obj.type_id.clone(),
        parent_id: obj.parent_id.clone(),
        created_by: obj.created_by.clone(),
        properties: obj.properties.clone(),
        content,
        version: version_info(store, obj)?,
        allowable_actions,
        acl: include.acl.then(|| fill_acl(obj)),
        policy_ids: include.policy_ids.then(|| fill_policy_ids(obj)),
        relationships,
        renditions: include.renditions.then(|| fill_renditions(obj)),
        change_event: include.change_event.then(|| fill_change_event_info(obj)),
    })
}

/// Convert the objects of a listing snapshot. Objects removed after the
/// snapshot was taken are left out.
pub fn listed_object_data(
    store: &dyn ObjectStore,
    objects: &[StoredObject],
    caller: Option<&str>,
    include: &Include,
) -> StoreResult<Vec<ObjectData>> {
    let mut out = Vec::with_capacity(objects.len());
    for obj in objects {
        match object_data(store, obj, caller, include) {
            Ok(data) => out.push(data),
            Err(StoreError::ObjectNotFound(id)) => debug!(%id, "listed object no longer exists"),
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

/// Series heads report the content of their latest version.
fn content_info(store: &dyn ObjectStore, obj: &StoredObject) -> StoreResult<Option<ContentInfo>> {
    let latest;
    let source = if matches!(obj.body, ObjectBody::VersionedDocument) {
        latest = store.latest_version(&obj.id)?;
        latest.as_ref()
    } else {
        Some(obj)
    };
    Ok(source.and_then(StoredObject::content).map(|c| ContentInfo {
        file_name: c.file_name.clone(),
        mime_type: c.mime_type.clone(),
        length: c.len(),
    }))
}

fn version_info(store: &dyn ObjectStore, obj: &StoredObject) -> StoreResult<Option<VersionInfo>> {
    let Some(series_id) = obj.series_id() else {
        return Ok(None);
    };
    let state = store.lifecycle(series_id)?;
    let latest = store.latest_version(series_id)?;
    let info = match &obj.body {
        ObjectBody::Version { label, comment, .. } => VersionInfo {
            series_id: series_id.clone(),
            label: Some(label.clone()),
            is_pwc: obj.is_pwc(),
            is_latest: latest.is_some_and(|v| v.id == obj.id),
            checked_out_by: state.owner().map(str::to_string),
            comment: comment.clone(),
        },
        _ => VersionInfo {
            series_id: series_id.clone(),
            label: latest
                .as_ref()
                .and_then(|v| v.version_label().map(str::to_string)),
            is_pwc: false,
            is_latest: true,
            checked_out_by: state.owner().map(str::to_string),
            comment: None,
        },
    };
    Ok(Some(info))
}

pub fn fill_acl(_obj: &StoredObject) -> Acl {
    Acl {
        aces: Vec::new(),
        exact: true,
    }
}

pub fn fill_policy_ids(_obj: &StoredObject) -> Vec<ObjectId> {
    Vec::new()
}

pub fn fill_relationships(_which: IncludeRelationships, _obj: &StoredObject) -> Vec<ObjectData> {
    Vec::new()
}

pub fn fill_renditions(_obj: &StoredObject) -> Vec<RenditionData> {
    Vec::new()
}

pub fn fill_change_event_info(_obj: &StoredObject) -> ChangeEventInfo {
    ChangeEventInfo::default()
}
