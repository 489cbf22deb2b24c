use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use cmr_types::{BaseKind, ObjectId};

/// A single property value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Property id to value map, ordered for stable output.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Raw content attached to a document.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStream {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ContentStream {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStream")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Kind-specific part of a stored object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "body", rename_all = "camelCase")]
pub enum ObjectBody {
    /// An unversioned document.
    Document { content: Option<ContentStream> },
    Folder,
    /// The filed head of a version series. Content lives on its versions.
    VersionedDocument,
    /// One snapshot of a version series. `label` is `pwc` for the private
    /// working copy.
    Version {
        series_id: ObjectId,
        label: String,
        content: Option<ContentStream>,
        comment: Option<String>,
    },
}

/// The label carried by a private working copy.
pub const PWC_LABEL: &str = "pwc";

/// A node of a repository's object tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub id: ObjectId,
    pub name: String,
    pub type_id: String,
    /// Filing folder. `None` for the root folder and for versions.
    pub parent_id: Option<ObjectId>,
    pub created_by: Option<String>,
    pub properties: Properties,
    pub body: ObjectBody,
}

impl StoredObject {
    pub fn base_kind(&self) -> BaseKind {
        match self.body {
            ObjectBody::Folder => BaseKind::Folder,
            ObjectBody::Document { .. }
            | ObjectBody::VersionedDocument
            | ObjectBody::Version { .. } => BaseKind::Document,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.body, ObjectBody::Folder)
    }

    /// Content carried directly by this object. Series heads carry none.
    pub fn content(&self) -> Option<&ContentStream> {
        match &self.body {
            ObjectBody::Document { content } | ObjectBody::Version { content, .. } => {
                content.as_ref()
            }
            ObjectBody::Folder | ObjectBody::VersionedDocument => None,
        }
    }

    /// Id of the version series this object heads or belongs to.
    pub fn series_id(&self) -> Option<&ObjectId> {
        match &self.body {
            ObjectBody::VersionedDocument => Some(&self.id),
            ObjectBody::Version { series_id, .. } => Some(series_id),
            ObjectBody::Document { .. } | ObjectBody::Folder => None,
        }
    }

    pub fn is_versioned(&self) -> bool {
        self.series_id().is_some()
    }

    pub fn version_label(&self) -> Option<&str> {
        match &self.body {
            ObjectBody::Version { label, .. } => Some(label),
            _ => None,
        }
    }

    pub fn is_pwc(&self) -> bool {
        self.version_label() == Some(PWC_LABEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(body: ObjectBody) -> StoredObject {
        StoredObject {
            id: ObjectId::new("10"),
            name: "doc".into(),
            type_id: "document".into(),
            parent_id: Some(ObjectId::new("1")),
            created_by: None,
            properties: Properties::new(),
            body,
        }
    }

    #[test]
    fn base_kinds() {
        assert_eq!(object(ObjectBody::Folder).base_kind(), BaseKind::Folder);
        assert_eq!(
            object(ObjectBody::VersionedDocument).base_kind(),
            BaseKind::Document
        );
        assert_eq!(
            object(ObjectBody::Document { content: None }).base_kind(),
            BaseKind::Document
        );
    }

    #[test]
    fn series_head_is_its_own_series() {
        let head = object(ObjectBody::VersionedDocument);
        assert_eq!(head.series_id(), Some(&ObjectId::new("10")));
        assert!(head.content().is_none());
    }

    #[test]
    fn version_references_series() {
        let version = object(ObjectBody::Version {
            series_id: ObjectId::new("3"),
            label: PWC_LABEL.into(),
            content: Some(ContentStream::new("a.txt", "text/plain", b"abc".to_vec())),
            comment: None,
        });
        assert_eq!(version.series_id(), Some(&ObjectId::new("3")));
        assert!(version.is_pwc());
        assert_eq!(version.content().map(ContentStream::len), Some(3));
    }

    #[test]
    fn plain_document_is_unversioned() {
        let doc = object(ObjectBody::Document { content: None });
        assert!(!doc.is_versioned());
        assert!(doc.version_label().is_none());
    }

    #[test]
    fn property_values_serialize_untagged() {
        let mut props = Properties::new();
        props.insert("StringProp".into(), PropertyValue::String("x".into()));
        props.insert("IntProp".into(), PropertyValue::Integer(4));
        let json = serde_json::to_string(&props).unwrap();
        assert_eq!(json, r#"{"IntProp":4,"StringProp":"x"}"#);
    }

    #[test]
    fn content_debug_omits_bytes() {
        let content = ContentStream::new("a.bin", "application/octet-stream", vec![0; 2048]);
        let debug = format!("{content:?}");
        assert!(debug.contains("len: 2048"));
    }
}
