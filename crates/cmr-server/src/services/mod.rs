//! The five protocol services.
//!
//! Every method takes the protocol [`CallContext`] and the target
//! repository id. Listing calls accept optional [`Paging`] and depth values;
//! the raw implementations treat a missing value as "no limit" and the
//! decorators in [`crate::wrapper`] substitute the configured defaults.

pub mod discovery;
pub mod navigation;
pub mod object;
pub mod repository;
pub mod versioning;

use serde::{Deserialize, Serialize};

use cmr_store::{
    ContentStream, Properties, RepositoryInfo, TypeContainer, TypeDefinition,
};
use cmr_types::{AllowableActions, CallContext, Depth, ObjectId};

use crate::data_objects::{Include, ObjectData, RenditionData};
use crate::error::ServerResult;

pub use discovery::InMemoryDiscoveryService;
pub use navigation::InMemoryNavigationService;
pub use object::InMemoryObjectService;
pub use repository::InMemoryRepositoryService;
pub use versioning::InMemoryVersioningService;

/// Caller-supplied paging of a listing call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub max_items: Option<usize>,
    pub skip_count: Option<usize>,
}

impl Paging {
    pub fn new(max_items: Option<usize>, skip_count: Option<usize>) -> Self {
        Self {
            max_items,
            skip_count,
        }
    }
}

/// One page of a listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more_items: bool,
    /// Number of items before paging.
    pub num_items: usize,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more_items: false,
            num_items: 0,
        }
    }

    /// Cut one page out of `items`.
    pub fn of(items: Vec<T>, paging: Paging) -> Self {
        let total = items.len();
        let skip = paging.skip_count.unwrap_or(0).min(total);
        let max = paging.max_items.unwrap_or(usize::MAX);
        let items: Vec<T> = items.into_iter().skip(skip).take(max).collect();
        Self {
            has_more_items: skip + items.len() < total,
            num_items: total,
            items,
        }
    }
}

pub type ObjectList = Page<ObjectData>;

/// An object with its descendants, for tree listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectContainer {
    pub object: ObjectData,
    pub children: Vec<ObjectContainer>,
}

/// Versioning state requested for a new document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VersioningState {
    #[default]
    None,
    Major,
    Minor,
    CheckedOut,
}

/// Changes committed together with a check-in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckInRequest {
    pub major: bool,
    pub properties: Properties,
    pub content: Option<ContentStream>,
    pub comment: Option<String>,
}

/// Scope of a type-based query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeQuery {
    pub type_id: String,
    pub include_subtypes: bool,
    /// Restrict matches to descendants of this folder.
    pub in_folder: Option<ObjectId>,
}

impl TypeQuery {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            include_subtypes: false,
            in_folder: None,
        }
    }
}

pub trait RepositoryService: Send + Sync {
    fn repository_infos(&self, ctx: &CallContext) -> ServerResult<Vec<RepositoryInfo>>;

    fn repository_info(&self, ctx: &CallContext, repository_id: &str) -> ServerResult<RepositoryInfo>;

    /// Direct subtypes of `type_id`, or the base types when it is `None`.
    fn type_children(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        type_id: Option<&str>,
        paging: Paging,
    ) -> ServerResult<Page<TypeDefinition>>;

    fn type_descendants(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        type_id: Option<&str>,
        depth: Option<Depth>,
    ) -> ServerResult<Vec<TypeContainer>>;

    fn type_definition(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        type_id: &str,
    ) -> ServerResult<TypeDefinition>;
}

pub trait NavigationService: Send + Sync {
    fn children(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        include: &Include,
        paging: Paging,
    ) -> ServerResult<ObjectList>;

    fn descendants(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        depth: Option<Depth>,
        include: &Include,
    ) -> ServerResult<Vec<ObjectContainer>>;

    /// Like [`NavigationService::descendants`], folders only.
    fn folder_tree(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        depth: Option<Depth>,
        include: &Include,
    ) -> ServerResult<Vec<ObjectContainer>>;

    fn object_parents(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        include: &Include,
    ) -> ServerResult<Vec<ObjectData>>;

    fn folder_parent(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
    ) -> ServerResult<ObjectData>;

    fn checked_out_docs(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: Option<&ObjectId>,
        include: &Include,
        paging: Paging,
    ) -> ServerResult<ObjectList>;
}

pub trait ObjectService: Send + Sync {
    #[allow(clippy::too_many_arguments)]
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
    ) -> ServerResult<ObjectId>;

    fn create_folder(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        type_id: &str,
        name: &str,
        properties: Properties,
    ) -> ServerResult<ObjectId>;

    fn object(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        include: &Include,
    ) -> ServerResult<ObjectData>;

    fn allowable_actions(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<AllowableActions>;

    fn update_properties(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        name: Option<String>,
        properties: Properties,
    ) -> ServerResult<ObjectId>;

    fn move_object(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        target_folder_id: &ObjectId,
    ) -> ServerResult<ObjectId>;

    fn delete_object(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<()>;

    /// Returns the number of objects removed.
    fn delete_tree(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
    ) -> ServerResult<usize>;

    fn content_stream(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<ContentStream>;

    fn set_content_stream(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        content: ContentStream,
    ) -> ServerResult<ObjectId>;

    fn delete_content_stream(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<ObjectId>;

    fn renditions(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        paging: Paging,
    ) -> ServerResult<Page<RenditionData>>;
}

pub trait VersioningService: Send + Sync {
    /// Returns the id of the new private working copy.
    fn check_out(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<ObjectId>;

    fn cancel_check_out(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
    ) -> ServerResult<()>;

    /// Returns the id of the committed version.
    fn check_in(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        request: CheckInRequest,
    ) -> ServerResult<ObjectId>;

    /// The private working copy first, then committed versions newest first.
    fn all_versions(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        include: &Include,
    ) -> ServerResult<Vec<ObjectData>>;
}

pub trait DiscoveryService: Send + Sync {
    fn query(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        query: &TypeQuery,
        include: &Include,
        paging: Paging,
    ) -> ServerResult<ObjectList>;

    /// The change log is not kept; always empty.
    fn content_changes(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        paging: Paging,
    ) -> ServerResult<ObjectList>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_slices_and_reports_more() {
        let page = Page::of((0..10).collect(), Paging::new(Some(3), Some(2)));
        assert_eq!(page.items, vec![2, 3, 4]);
        assert!(page.has_more_items);
        assert_eq!(page.num_items, 10);
    }

    #[test]
    fn page_without_limits_returns_everything() {
        let page = Page::of(vec!["a", "b"], Paging::default());
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_more_items);
    }

    #[test]
    fn skip_past_end_is_empty() {
        let page = Page::of(vec![1, 2], Paging::new(None, Some(5)));
        assert!(page.items.is_empty());
        assert!(!page.has_more_items);
    }

    #[test]
    fn last_page_has_no_more() {
        let page = Page::of((0..4).collect::<Vec<_>>(), Paging::new(Some(2), Some(2)));
        assert_eq!(page.items, vec![2, 3]);
        assert!(!page.has_more_items);
    }
}
