use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown base kind: {0}")]
    UnknownBaseKind(String),

    #[error("invalid depth: {0}")]
    InvalidDepth(i64),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),
}

impl TypeError {
    /// All type errors are caller mistakes.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }
}

/// Coarse classification of an error, shared by every layer.
///
/// Callers branch on the kind rather than on concrete error variants when
/// deciding whether to retry, report, or abandon a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    Permission,
    Constraint,
    Runtime,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalidArgument",
            Self::NotFound => "objectNotFound",
            Self::Conflict => "updateConflict",
            Self::Permission => "permissionDenied",
            Self::Constraint => "constraint",
            Self::Runtime => "runtime",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
