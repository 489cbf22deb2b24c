//! Object storage for the content repository.
//!
//! This crate holds everything the service layer treats as its storage
//! collaborator: the object tree of each repository, the type definitions
//! available in it, and the version series of its versioned documents.
//!
//! # Building Blocks
//!
//! - [`ObjectStore`] -- object tree of one repository
//! - [`InMemoryObjectStore`] -- `HashMap`-based tree with per-series locking
//! - [`StoreManager`] -- registry mapping repository ids to their stores
//! - [`TypeManager`] -- the fixed type set of one repository
//! - [`VersionSeries`] -- the check-out state machine of one document
//!
//! # Design Rules
//!
//! 1. Reads clone objects out of the store; callers never hold references
//!    into shared state.
//! 2. Check-out transitions on one series are serialized by that series'
//!    mutex. Different series never contend.
//! 3. Lock order is series mutex, then tree lock, then series map.
//! 4. Names are unique within a folder.
//! 5. Versions are unfiled; the series head is the filed document.

pub mod error;
pub mod manager;
pub mod memory;
pub mod object;
pub mod traits;
pub mod types;
pub mod version;

pub use error::{StoreError, StoreResult};
pub use manager::{create_store_manager, InMemoryStoreManager, RepositoryInfo, StoreManager};
pub use memory::InMemoryObjectStore;
pub use object::{ContentStream, ObjectBody, Properties, PropertyValue, StoredObject, PWC_LABEL};
pub use traits::{CheckInUpdate, NewObject, ObjectStore, VersioningMode};
pub use types::{
    type_creator, PropertyDefinition, PropertyType, SampleTypeCreator, TypeContainer, TypeCreator,
    TypeDefinition, TypeManager,
};
pub use version::{LifecycleState, VersionEntry, VersionIncrement, VersionSeries};
