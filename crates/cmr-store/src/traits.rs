use cmr_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ContentStream, Properties, StoredObject};
use crate::version::{LifecycleState, VersionIncrement};

/// Caller-supplied part of a new object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewObject {
    pub name: String,
    pub type_id: String,
    pub properties: Properties,
}

impl NewObject {
    pub fn new(name: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: type_id.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }
}

/// How a new document participates in versioning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersioningMode {
    /// A plain document without a version series.
    Unversioned,
    /// A series head plus a first committed version.
    Versioned(VersionIncrement),
    /// A series head whose only version is a PWC held by `owner`.
    CheckedOut { owner: String },
}

/// Changes applied to a PWC when it is committed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckInUpdate {
    pub content: Option<ContentStream>,
    pub properties: Properties,
    pub comment: Option<String>,
}

/// Object tree storage for one repository.
///
/// Implementations must satisfy these invariants:
/// - Reads are safe under concurrent access.
/// - Check-out transitions on one version series are mutually exclusive:
///   of two concurrent `check_out` calls on the same series exactly one
///   succeeds and the other fails with [`StoreError::CheckedOut`].
/// - Names are unique among the children of a folder.
/// - The root folder cannot be deleted or moved.
pub trait ObjectStore: Send + Sync {
    fn repository_id(&self) -> &str;

    fn root_folder_id(&self) -> &ObjectId;

    /// Number of stored objects, including the root and all versions.
    fn object_count(&self) -> StoreResult<usize>;

    /// Read an object by id. Returns `Ok(None)` if it does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Read an object that must exist.
    fn get(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))
    }

    /// Objects filed in `folder_id`, ordered by name.
    fn children(&self, folder_id: &ObjectId) -> StoreResult<Vec<StoredObject>>;

    fn create_folder(
        &self,
        parent_id: &ObjectId,
        spec: NewObject,
        creator: Option<&str>,
    ) -> StoreResult<StoredObject>;

    /// Create a document. For versioned modes the returned object is the
    /// series head.
    fn create_document(
        &self,
        parent_id: &ObjectId,
        spec: NewObject,
        content: Option<ContentStream>,
        mode: VersioningMode,
        creator: Option<&str>,
    ) -> StoreResult<StoredObject>;

    /// Merge `properties` into the object and optionally rename it.
    fn update_properties(
        &self,
        id: &ObjectId,
        name: Option<String>,
        properties: Properties,
    ) -> StoreResult<StoredObject>;

    fn move_object(&self, id: &ObjectId, target_folder_id: &ObjectId) -> StoreResult<StoredObject>;

    /// Delete one object. Folders must be empty; deleting a series head
    /// removes every version of the series.
    fn delete(&self, id: &ObjectId) -> StoreResult<()>;

    /// Delete everything below `folder_id`, then the folder itself unless
    /// it is the root. Returns the number of filed objects removed.
    fn delete_tree(&self, folder_id: &ObjectId) -> StoreResult<usize>;

    /// Replace (`Some`) or remove (`None`) the content of a document or PWC.
    fn set_content(&self, id: &ObjectId, content: Option<ContentStream>) -> StoreResult<StoredObject>;

    /// Snapshot of the check-out state of a series.
    fn lifecycle(&self, series_id: &ObjectId) -> StoreResult<LifecycleState>;

    /// Newest committed version, or the PWC of a series created checked out.
    fn latest_version(&self, series_id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// The PWC if any, then committed versions newest first.
    fn versions(&self, series_id: &ObjectId) -> StoreResult<Vec<StoredObject>>;

    /// Check out the series `id` heads or belongs to. Returns the new PWC.
    fn check_out(&self, id: &ObjectId, owner: &str) -> StoreResult<StoredObject>;

    /// Commit the PWC of the series `id` heads or belongs to. Returns the
    /// committed version.
    fn check_in(
        &self,
        id: &ObjectId,
        caller: Option<&str>,
        increment: VersionIncrement,
        update: CheckInUpdate,
    ) -> StoreResult<StoredObject>;

    /// Discard the PWC of the series `id` heads or belongs to.
    /// Only the checkout owner may cancel.
    fn cancel_check_out(&self, id: &ObjectId, caller: Option<&str>) -> StoreResult<()>;

    /// Every PWC in the repository.
    fn checked_out(&self) -> StoreResult<Vec<StoredObject>>;
}
