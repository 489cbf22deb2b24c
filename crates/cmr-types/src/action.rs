use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One capability tag of the allowable-actions vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    GetProperties,
    UpdateProperties,
    DeleteObject,
    MoveObject,
    GetObjectParents,
    GetFolderParent,
    GetFolderTree,
    GetDescendants,
    AddObjectToFolder,
    RemoveObjectFromFolder,
    CreateDocument,
    CreateFolder,
    GetChildren,
    DeleteTree,
    GetContentStream,
    DeleteContentStream,
    SetContentStream,
    CheckOut,
    CancelCheckOut,
    CheckIn,
    GetAllVersions,
}

impl Action {
    pub const ALL: [Action; 21] = [
        Action::GetProperties,
        Action::UpdateProperties,
        Action::DeleteObject,
        Action::MoveObject,
        Action::GetObjectParents,
        Action::GetFolderParent,
        Action::GetFolderTree,
        Action::GetDescendants,
        Action::AddObjectToFolder,
        Action::RemoveObjectFromFolder,
        Action::CreateDocument,
        Action::CreateFolder,
        Action::GetChildren,
        Action::DeleteTree,
        Action::GetContentStream,
        Action::DeleteContentStream,
        Action::SetContentStream,
        Action::CheckOut,
        Action::CancelCheckOut,
        Action::CheckIn,
        Action::GetAllVersions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetProperties => "GetProperties",
            Self::UpdateProperties => "UpdateProperties",
            Self::DeleteObject => "DeleteObject",
            Self::MoveObject => "MoveObject",
            Self::GetObjectParents => "GetObjectParents",
            Self::GetFolderParent => "GetFolderParent",
            Self::GetFolderTree => "GetFolderTree",
            Self::GetDescendants => "GetDescendants",
            Self::AddObjectToFolder => "AddObjectToFolder",
            Self::RemoveObjectFromFolder => "RemoveObjectFromFolder",
            Self::CreateDocument => "CreateDocument",
            Self::CreateFolder => "CreateFolder",
            Self::GetChildren => "GetChildren",
            Self::DeleteTree => "DeleteTree",
            Self::GetContentStream => "GetContentStream",
            Self::DeleteContentStream => "DeleteContentStream",
            Self::SetContentStream => "SetContentStream",
            Self::CheckOut => "CheckOut",
            Self::CancelCheckOut => "CancelCheckOut",
            Self::CheckIn => "CheckIn",
            Self::GetAllVersions => "GetAllVersions",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of operations currently permitted on one object for one caller.
///
/// Instances are computed per query and never cached: the caller identity
/// and the version lifecycle state behind them can change between calls.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowableActions(BTreeSet<Action>);

impl AllowableActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, action: Action) -> bool {
        self.0.insert(action)
    }

    pub fn extend(&mut self, actions: impl IntoIterator<Item = Action>) {
        self.0.extend(actions);
    }

    pub fn contains(&self, action: Action) -> bool {
        self.0.contains(&action)
    }

    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Action> for AllowableActions {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for AllowableActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Action::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}
