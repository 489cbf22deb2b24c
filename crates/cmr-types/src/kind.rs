use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Base object kind of a repository object.
///
/// The protocol-visible identifiers are `document`, `folder`,
/// `relationship` and `policy`. Parsing also accepts the namespaced
/// `cmis:` form some clients send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseKind {
    Document,
    Folder,
    Relationship,
    Policy,
}

impl BaseKind {
    pub const ALL: [BaseKind; 4] = [
        BaseKind::Document,
        BaseKind::Folder,
        BaseKind::Relationship,
        BaseKind::Policy,
    ];

    /// The protocol-visible identifier.
    pub fn value(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Folder => "folder",
            Self::Relationship => "relationship",
            Self::Policy => "policy",
        }
    }

    /// Look up a base kind by identifier.
    pub fn from_value(value: &str) -> Result<Self, TypeError> {
        let bare = value.strip_prefix("cmis:").unwrap_or(value);
        Self::ALL
            .into_iter()
            .find(|kind| kind.value() == bare)
            .ok_or_else(|| TypeError::UnknownBaseKind(value.to_string()))
    }
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl FromStr for BaseKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_value(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_roundtrip() {
        for kind in BaseKind::ALL {
            assert_eq!(BaseKind::from_value(kind.value()).unwrap(), kind);
        }
    }

    #[test]
    fn accepts_namespaced_form() {
        assert_eq!(
            BaseKind::from_value("cmis:folder").unwrap(),
            BaseKind::Folder
        );
    }

    #[test]
    fn unknown_kind_is_invalid_argument() {
        let err = BaseKind::from_value("item").unwrap_err();
        assert_eq!(err, TypeError::UnknownBaseKind("item".into()));
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn identifiers_are_case_sensitive() {
        assert!("Document".parse::<BaseKind>().is_err());
        assert_eq!("document".parse::<BaseKind>().unwrap(), BaseKind::Document);
    }

    #[test]
    fn serde_uses_protocol_identifier() {
        let json = serde_json::to_string(&BaseKind::Relationship).unwrap();
        assert_eq!(json, "\"relationship\"");
    }
}
