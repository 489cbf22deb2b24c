use cmr_types::{ErrorKind, ObjectId, TypeError};

/// Errors from object store and registry operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No repository is registered under this id.
    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    /// A repository with this id already exists.
    #[error("repository already exists: {0}")]
    RepositoryExists(String),

    /// The requested object was not found.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// The requested type is not defined in this repository.
    #[error("type not found: {0}")]
    TypeNotFound(String),

    /// The caller supplied a malformed or inapplicable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A sibling with the same name already exists in the folder.
    #[error("name '{name}' already exists in folder {parent}")]
    NameConflict { parent: ObjectId, name: String },

    /// The operation violates a repository constraint.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The version series already has a private working copy.
    #[error("object {id} is already checked out by {owner}")]
    CheckedOut { id: ObjectId, owner: String },

    /// The version series has no private working copy.
    #[error("object {0} is not checked out")]
    NotCheckedOut(ObjectId),

    /// The caller does not hold the checkout.
    #[error("object {id} is checked out by {owner}, not by {}", .caller.as_deref().unwrap_or("<anonymous>"))]
    NotCheckoutOwner {
        id: ObjectId,
        owner: String,
        caller: Option<String>,
    },

    /// A lock guarding shared state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RepositoryNotFound(_) | Self::ObjectNotFound(_) | Self::TypeNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidArgument(_) | Self::Type(_) => ErrorKind::InvalidArgument,
            Self::RepositoryExists(_) | Self::CheckedOut { .. } => ErrorKind::Conflict,
            Self::NameConflict { .. } | Self::Constraint(_) | Self::NotCheckedOut(_) => {
                ErrorKind::Constraint
            }
            Self::NotCheckoutOwner { .. } => ErrorKind::Permission,
            Self::LockPoisoned(_) => ErrorKind::Runtime,
        }
    }

    pub(crate) fn poisoned<E: std::fmt::Display>(e: E) -> Self {
        Self::LockPoisoned(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
