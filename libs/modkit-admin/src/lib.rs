#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! `ModKit` admin panel contract.
//!
//! This crate holds the backend-independent half of the admin panel:
//! - `Field` / `FieldKind` descriptors produced by backends at view construction
//! - `AdminRequest`, the per-request context (action, session, view registry)
//! - `ModelView`, the view contract every backend implements
//! - built-in actions, the `ViewRegistry` and name helpers
//!
//! Backends (for example `modkit-admin-sea`) implement `ModelView` for their
//! mapped models and keep all query building on their side.

pub mod actions;
pub mod error;
pub mod fields;
pub mod helpers;
pub mod query;
pub mod registry;
pub mod request;
pub mod view;

pub use error::{AdminError, AdminResult, FormValidationError};
pub use fields::{extract_fields, Field, FieldKind};
pub use query::{DefaultSort, OrderBy, Where};
pub use registry::ViewRegistry;
pub use request::{AdminRequest, RequestAction};
pub use view::{ModelView, Record};
