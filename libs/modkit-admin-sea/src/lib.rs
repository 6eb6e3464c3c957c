#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! SeaORM backend for the ModKit admin panel.
//!
//! [`SeaModelView`] implements [`modkit_admin::ModelView`] for any SeaORM
//! entity with a single-column primary key. The database handle travels in the
//! request extensions as a [`Session`]:
//!
//! ```ignore
//! let session = Session::connect(&config.database).await?;
//! let req = AdminRequest::new(RequestAction::List)
//!     .with_registry(registry.clone())
//!     .with_extension(session.clone());
//! let rows = view.find_all(&req, 0, 20, None, &[]).await?;
//! ```

pub mod coerce;
pub mod config;
pub mod converter;
pub mod error;
pub mod filter;
pub mod hooks;
pub mod inspect;
pub mod order;
pub mod relations;
pub mod search;
pub mod session;
pub mod view;

pub use config::{AdminConfig, DatabaseConfig};
pub use converter::{DefaultConverter, ModelConverter};
pub use error::{Result, SeaAdminError};
pub use hooks::{NoHooks, ViewHooks};
pub use inspect::{ColumnInfo, RelationInfo};
pub use session::Session;
pub use view::{SeaModelView, SeaModelViewBuilder};
