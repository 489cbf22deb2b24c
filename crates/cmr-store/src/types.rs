//! Type definitions and the per-repository type manager.
//!
//! Every repository starts with the four base types, one per [`BaseKind`],
//! whose ids are the base kind identifiers. A [`TypeCreator`] selected at
//! repository creation may add subtypes. The type set is fixed once the
//! repository is created.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cmr_types::{BaseKind, Depth};

use crate::error::{StoreError, StoreResult};
use crate::object::{Properties, PropertyValue};

/// Data type of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Boolean,
    Integer,
    String,
}

impl PropertyType {
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        matches!(
            (self, value),
            (Self::Boolean, PropertyValue::Boolean(_))
                | (Self::Integer, PropertyValue::Integer(_))
                | (Self::String, PropertyValue::String(_))
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub id: String,
    pub property_type: PropertyType,
}

impl PropertyDefinition {
    pub fn new(id: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            id: id.into(),
            property_type,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub id: String,
    pub display_name: String,
    pub base_kind: BaseKind,
    pub parent_id: Option<String>,
    /// Only meaningful for document types.
    pub versionable: bool,
    /// Includes definitions inherited from the parent type once registered.
    pub property_definitions: Vec<PropertyDefinition>,
}

impl TypeDefinition {
    /// The root type of a base kind.
    pub fn base(kind: BaseKind) -> Self {
        Self {
            id: kind.value().to_string(),
            display_name: kind.value().to_string(),
            base_kind: kind,
            parent_id: None,
            versionable: false,
            property_definitions: Vec::new(),
        }
    }

    /// A subtype of the base type of `kind`.
    pub fn subtype_of(kind: BaseKind, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            base_kind: kind,
            parent_id: Some(kind.value().to_string()),
            versionable: false,
            property_definitions: Vec::new(),
        }
    }

    pub fn versionable(mut self) -> Self {
        self.versionable = true;
        self
    }

    pub fn with_property(mut self, id: impl Into<String>, property_type: PropertyType) -> Self {
        self.property_definitions
            .push(PropertyDefinition::new(id, property_type));
        self
    }

    pub fn property(&self, id: &str) -> Option<&PropertyDefinition> {
        self.property_definitions.iter().find(|p| p.id == id)
    }
}

/// A type together with its subtypes, for depth-limited listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeContainer {
    pub type_definition: TypeDefinition,
    pub children: Vec<TypeContainer>,
}

/// Immutable registry of the types known to one repository.
#[derive(Clone, Debug)]
pub struct TypeManager {
    types: BTreeMap<String, TypeDefinition>,
}

impl TypeManager {
    /// A manager holding only the base types.
    pub fn new() -> Self {
        let types = BaseKind::ALL
            .into_iter()
            .map(TypeDefinition::base)
            .map(|def| (def.id.clone(), def))
            .collect();
        Self { types }
    }

    /// A manager holding the base types plus everything `creator` defines.
    pub fn with_creator(creator: &dyn TypeCreator) -> StoreResult<Self> {
        let mut manager = Self::new();
        for def in creator.create_types() {
            manager.register(def)?;
        }
        Ok(manager)
    }

    /// Add a subtype. The parent must already be registered and share the
    /// subtype's base kind; the parent's property definitions are inherited.
    pub fn register(&mut self, mut def: TypeDefinition) -> StoreResult<()> {
        if self.types.contains_key(&def.id) {
            return Err(StoreError::InvalidArgument(format!(
                "type {} is already defined",
                def.id
            )));
        }
        let parent_id = def.parent_id.clone().ok_or_else(|| {
            StoreError::InvalidArgument(format!("type {} has no parent type", def.id))
        })?;
        let parent = self
            .types
            .get(&parent_id)
            .ok_or_else(|| StoreError::TypeNotFound(parent_id.clone()))?;
        if parent.base_kind != def.base_kind {
            return Err(StoreError::InvalidArgument(format!(
                "type {} has base kind {} but parent {} has {}",
                def.id, def.base_kind, parent.id, parent.base_kind
            )));
        }
        for inherited in &parent.property_definitions {
            if def.property(&inherited.id).is_none() {
                def.property_definitions.push(inherited.clone());
            }
        }
        self.types.insert(def.id.clone(), def);
        Ok(())
    }

    pub fn get(&self, type_id: &str) -> Option<&TypeDefinition> {
        self.types.get(type_id)
    }

    pub fn require(&self, type_id: &str) -> StoreResult<&TypeDefinition> {
        self.get(type_id)
            .ok_or_else(|| StoreError::TypeNotFound(type_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Direct subtypes of `parent`, or the base types when `parent` is `None`.
    pub fn children(&self, parent: Option<&str>) -> StoreResult<Vec<&TypeDefinition>> {
        if let Some(id) = parent {
            self.require(id)?;
        }
        Ok(self
            .types
            .values()
            .filter(|def| def.parent_id.as_deref() == parent)
            .collect())
    }

    /// Subtype trees below `parent` (or below the root of all base types),
    /// limited to `depth` levels.
    pub fn descendants(&self, parent: Option<&str>, depth: Depth) -> StoreResult<Vec<TypeContainer>> {
        self.collect_descendants(parent, depth, 1)
    }

    fn collect_descendants(
        &self,
        parent: Option<&str>,
        depth: Depth,
        level: u32,
    ) -> StoreResult<Vec<TypeContainer>> {
        if !depth.includes(level) {
            return Ok(Vec::new());
        }
        self.children(parent)?
            .into_iter()
            .map(|def| {
                Ok(TypeContainer {
                    children: self.collect_descendants(Some(&def.id), depth, level + 1)?,
                    type_definition: def.clone(),
                })
            })
            .collect()
    }

    /// Whether `type_id` is `ancestor` or derives from it.
    pub fn is_subtype_of(&self, type_id: &str, ancestor: &str) -> bool {
        let mut current = self.get(type_id);
        while let Some(def) = current {
            if def.id == ancestor {
                return true;
            }
            current = def.parent_id.as_deref().and_then(|p| self.get(p));
        }
        false
    }

    /// Check every supplied property against the type's definitions.
    pub fn validate_properties(&self, type_id: &str, properties: &Properties) -> StoreResult<()> {
        let def = self.require(type_id)?;
        for (id, value) in properties {
            let prop = def.property(id).ok_or_else(|| {
                StoreError::InvalidArgument(format!("property {id} is not defined for type {type_id}"))
            })?;
            if !prop.property_type.accepts(value) {
                return Err(StoreError::InvalidArgument(format!(
                    "property {id} of type {type_id} expects a {:?} value",
                    prop.property_type
                )));
            }
        }
        Ok(())
    }
}

impl Default for TypeManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Supplies additional types when a repository is created.
pub trait TypeCreator: Send + Sync {
    fn name(&self) -> &str;

    fn create_types(&self) -> Vec<TypeDefinition>;
}

/// A small type set exercising versioning and each property data type.
pub struct SampleTypeCreator;

impl SampleTypeCreator {
    pub const NAME: &'static str = "sample";
    pub const VERSIONED_TYPE: &'static str = "VersionedType";
    pub const COMPLEX_TYPE: &'static str = "ComplexType";
    pub const FOLDER_TYPE: &'static str = "ComplexFolderType";
}

impl TypeCreator for SampleTypeCreator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn create_types(&self) -> Vec<TypeDefinition> {
        vec![
            TypeDefinition::subtype_of(BaseKind::Document, Self::VERSIONED_TYPE)
                .versionable()
                .with_property("VersionedStringProp", PropertyType::String),
            TypeDefinition::subtype_of(BaseKind::Document, Self::COMPLEX_TYPE)
                .with_property("StringProp", PropertyType::String)
                .with_property("IntProp", PropertyType::Integer)
                .with_property("BooleanProp", PropertyType::Boolean),
            TypeDefinition::subtype_of(BaseKind::Folder, Self::FOLDER_TYPE)
                .with_property("StringFolderProp", PropertyType::String)
                .with_property("IntFolderProp", PropertyType::Integer),
        ]
    }
}

/// Resolve a type creator by the name configured for a repository.
///
/// `None` or an empty name selects no creator (base types only).
pub fn type_creator(name: Option<&str>) -> StoreResult<Option<Box<dyn TypeCreator>>> {
    match name.map(str::trim) {
        None | Some("") => Ok(None),
        Some(SampleTypeCreator::NAME) => Ok(Some(Box::new(SampleTypeCreator))),
        Some(other) => Err(StoreError::InvalidArgument(format!(
            "unknown type creator: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TypeManager {
        TypeManager::with_creator(&SampleTypeCreator).unwrap()
    }

    #[test]
    fn base_types_are_present() {
        let types = TypeManager::new();
        assert_eq!(types.len(), 4);
        for kind in BaseKind::ALL {
            let def = types.require(kind.value()).unwrap();
            assert_eq!(def.base_kind, kind);
            assert!(def.parent_id.is_none());
        }
    }

    #[test]
    fn sample_creator_adds_subtypes() {
        let types = sample();
        assert_eq!(types.len(), 7);
        assert!(types.require(SampleTypeCreator::VERSIONED_TYPE).unwrap().versionable);
        assert!(types.is_subtype_of(SampleTypeCreator::COMPLEX_TYPE, "document"));
        assert!(!types.is_subtype_of(SampleTypeCreator::FOLDER_TYPE, "document"));
    }

    #[test]
    fn register_rejects_mismatched_base_kind() {
        let mut types = TypeManager::new();
        let mut def = TypeDefinition::subtype_of(BaseKind::Document, "Odd");
        def.parent_id = Some("folder".into());
        assert!(matches!(
            types.register(def),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut types = sample();
        let dup = TypeDefinition::subtype_of(BaseKind::Document, SampleTypeCreator::COMPLEX_TYPE);
        assert!(types.register(dup).is_err());
    }

    #[test]
    fn subtypes_inherit_properties() {
        let mut types = sample();
        let child = TypeDefinition {
            parent_id: Some(SampleTypeCreator::COMPLEX_TYPE.into()),
            ..TypeDefinition::subtype_of(BaseKind::Document, "Child")
        }
        .with_property("ChildProp", PropertyType::String);
        types.register(child).unwrap();
        let def = types.require("Child").unwrap();
        assert!(def.property("ChildProp").is_some());
        assert!(def.property("IntProp").is_some());
        assert!(types.is_subtype_of("Child", "document"));
    }

    #[test]
    fn children_of_root_are_base_types() {
        let types = sample();
        let roots = types.children(None).unwrap();
        assert_eq!(roots.len(), 4);
        let docs = types.children(Some("document")).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(matches!(
            types.children(Some("missing")),
            Err(StoreError::TypeNotFound(_))
        ));
    }

    #[test]
    fn descendants_respect_depth() {
        let types = sample();
        let one = types.descendants(None, Depth::Levels(1)).unwrap();
        assert_eq!(one.len(), 4);
        assert!(one.iter().all(|c| c.children.is_empty()));

        let all = types.descendants(None, Depth::All).unwrap();
        let doc = all
            .iter()
            .find(|c| c.type_definition.id == "document")
            .unwrap();
        assert_eq!(doc.children.len(), 2);
    }

    #[test]
    fn validate_properties_checks_ids_and_types() {
        let types = sample();
        let mut props = Properties::new();
        props.insert("IntProp".into(), PropertyValue::Integer(3));
        types
            .validate_properties(SampleTypeCreator::COMPLEX_TYPE, &props)
            .unwrap();

        props.insert("IntProp".into(), PropertyValue::String("3".into()));
        assert!(types
            .validate_properties(SampleTypeCreator::COMPLEX_TYPE, &props)
            .is_err());

        let mut unknown = Properties::new();
        unknown.insert("Nope".into(), PropertyValue::Boolean(true));
        assert!(types.validate_properties("document", &unknown).is_err());
    }

    #[test]
    fn type_creator_lookup() {
        assert!(type_creator(None).unwrap().is_none());
        assert!(type_creator(Some("")).unwrap().is_none());
        assert_eq!(type_creator(Some("sample")).unwrap().unwrap().name(), "sample");
        assert!(matches!(
            type_creator(Some("com.example.Unknown")),
            Err(StoreError::InvalidArgument(_))
        ));
    }
}
