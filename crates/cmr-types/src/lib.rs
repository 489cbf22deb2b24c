//! Foundation types for the content repository (CMR).
//!
//! This crate provides the identifiers, classifications, and capability
//! vocabulary shared by the store, the service layer, and the binaries.
//! Every other CMR crate depends on `cmr-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Opaque object identifier, unique within one repository
//! - [`BaseKind`] -- Coarse object classification (document, folder, ...)
//! - [`Action`] -- One capability tag of the allowable-actions vocabulary
//! - [`AllowableActions`] -- The capability set computed for one object and caller
//! - [`Depth`] -- Tree traversal limit for listing-style calls
//! - [`CallContext`] -- Identity of a remote protocol caller
//! - [`SystemContext`] -- Internal identity used only for server-side generation
//! - [`ErrorKind`] -- Cross-layer error classification

pub mod action;
pub mod depth;
pub mod error;
pub mod identity;
pub mod kind;
pub mod object;

pub use action::{Action, AllowableActions};
pub use depth::Depth;
pub use error::{ErrorKind, TypeError};
pub use identity::{CallContext, Identity, SystemContext};
pub use kind::BaseKind;
pub use object::ObjectId;
