//! Allowable-actions computation.
//!
//! [`compute`] is a pure function of an [`ObjectView`], the caller's
//! username and whether the object is the repository root. The rules are
//! independent of each other; any subset may apply to one object.
//!
//! `CancelCheckOut` is visible to every caller once a private working copy
//! exists, while `CheckIn` and the content-changing actions on a versioned
//! document require the caller to hold the checkout. The object service,
//! not this module, decides who may actually cancel.
//!
//! Only the series head and its working copy carry check-out state.
//! Committed versions are immutable snapshots: they list their versions and
//! expose their content for reading, nothing else lifecycle-related.

use cmr_store::{LifecycleState, ObjectBody, ObjectStore, StoreResult, StoredObject};
use cmr_types::{Action, AllowableActions};

/// The facts about one object that capability rules depend on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectView {
    /// A document outside version control.
    Document { has_content: bool },
    Folder,
    Relationship,
    Policy,
    /// A series head or its private working copy, with the series' current
    /// check-out state.
    VersionedSeries {
        has_content: bool,
        state: LifecycleState,
    },
    /// A committed version of a series.
    CommittedVersion { has_content: bool },
}

impl ObjectView {
    /// Build the view of a stored object, reading the lifecycle state of
    /// its series when it is versioned.
    pub fn of(store: &dyn ObjectStore, obj: &StoredObject) -> StoreResult<Self> {
        Ok(match &obj.body {
            ObjectBody::Folder => Self::Folder,
            ObjectBody::Document { content } => Self::Document {
                has_content: content.is_some(),
            },
            ObjectBody::VersionedDocument => {
                let latest = store.latest_version(&obj.id)?;
                Self::VersionedSeries {
                    has_content: latest.is_some_and(|v| v.content().is_some()),
                    state: store.lifecycle(&obj.id)?,
                }
            }
            ObjectBody::Version {
                series_id, content, ..
            } => {
                let state = store.lifecycle(series_id)?;
                if state.pwc_id() == Some(&obj.id) {
                    Self::VersionedSeries {
                        has_content: content.is_some(),
                        state,
                    }
                } else {
                    Self::CommittedVersion {
                        has_content: content.is_some(),
                    }
                }
            }
        })
    }

    fn is_folder(&self) -> bool {
        matches!(self, Self::Folder)
    }

    fn is_document(&self) -> bool {
        matches!(
            self,
            Self::Document { .. } | Self::VersionedSeries { .. } | Self::CommittedVersion { .. }
        )
    }

    fn is_versioned(&self) -> bool {
        matches!(self, Self::VersionedSeries { .. } | Self::CommittedVersion { .. })
    }

    fn has_content(&self) -> bool {
        match self {
            Self::Document { has_content }
            | Self::VersionedSeries { has_content, .. }
            | Self::CommittedVersion { has_content } => *has_content,
            _ => false,
        }
    }
}

const FOLDER_ACTIONS: [Action; 8] = [
    Action::GetFolderTree,
    Action::GetDescendants,
    Action::AddObjectToFolder,
    Action::RemoveObjectFromFolder,
    Action::CreateDocument,
    Action::CreateFolder,
    Action::GetChildren,
    Action::DeleteTree,
];

/// Derive the actions `caller` may currently perform on the object.
pub fn compute(view: &ObjectView, caller: Option<&str>, is_root: bool) -> AllowableActions {
    let mut actions = AllowableActions::new();
    actions.insert(Action::DeleteObject);
    actions.insert(Action::UpdateProperties);

    if view.is_folder() || view.is_document() {
        actions.insert(Action::GetProperties);
        actions.insert(Action::MoveObject);
        if !is_root {
            actions.insert(Action::GetObjectParents);
        }
    }

    if view.is_folder() {
        if !is_root {
            actions.insert(Action::GetFolderParent);
        }
        actions.extend(FOLDER_ACTIONS);
    }

    if view.has_content() {
        actions.insert(Action::GetContentStream);
    }

    if view.is_versioned() {
        actions.insert(Action::GetAllVersions);
    }

    let held_by_caller = match view {
        ObjectView::VersionedSeries { state, .. } => {
            if state.is_checked_out() {
                actions.insert(Action::CancelCheckOut);
            } else {
                actions.insert(Action::CheckOut);
            }
            let held = state.is_held_by(caller);
            if held {
                actions.insert(Action::CheckIn);
            }
            held
        }
        _ => false,
    };

    // Content of a versioned document changes only through a held checkout.
    let content_writable = match view {
        ObjectView::Document { .. } => true,
        ObjectView::VersionedSeries { .. } => held_by_caller,
        _ => false,
    };
    if content_writable {
        actions.insert(Action::SetContentStream);
        if view.has_content() {
            actions.insert(Action::DeleteContentStream);
        }
    }

    actions
}

/// Compute the actions for a stored object in `store`.
pub fn compute_for(
    store: &dyn ObjectStore,
    obj: &StoredObject,
    caller: Option<&str>,
) -> StoreResult<AllowableActions> {
    let view = ObjectView::of(store, obj)?;
    Ok(compute(&view, caller, &obj.id == store.root_folder_id()))
}
