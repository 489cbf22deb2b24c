use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Tree traversal limit for descendant and folder-tree listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Depth {
    /// Return this many levels below the starting node.
    Levels(u32),
    /// Return every level.
    All,
}

impl Depth {
    /// Rejects `Levels(0)`.
    pub fn validate(&self) -> Result<Self, TypeError> {
        match self {
            Self::Levels(0) => Err(TypeError::InvalidDepth(0)),
            other => Ok(*other),
        }
    }

    /// Whether a node `level` steps below the start is still inside the limit.
    pub fn includes(&self, level: u32) -> bool {
        match self {
            Self::Levels(n) => level <= *n,
            Self::All => true,
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Levels(n) => write!(f, "{n}"),
            Self::All => f.write_str("all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_depth_is_rejected() {
        assert_eq!(Depth::Levels(0).validate(), Err(TypeError::InvalidDepth(0)));
        assert_eq!(Depth::Levels(3).validate(), Ok(Depth::Levels(3)));
        assert!(Depth::All.validate().is_ok());
    }

    #[test]
    fn includes_levels() {
        let two = Depth::Levels(2);
        assert!(two.includes(1));
        assert!(two.includes(2));
        assert!(!two.includes(3));
        assert!(Depth::All.includes(u32::MAX));
    }
}
