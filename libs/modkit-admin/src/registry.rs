//! Registry of model views, keyed by identity.
//!
//! Relation fields reference their target by identity; backends resolve the
//! foreign view through the registry attached to the request.

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::error::{AdminError, AdminResult};
use crate::view::ModelView;

/// Cheaply cloneable, shared map of identity -> view.
#[derive(Clone, Default)]
pub struct ViewRegistry {
    views: Arc<DashMap<String, Arc<dyn ModelView>>>,
}

impl ViewRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `view` under its identity.
    ///
    /// # Errors
    /// Returns `AdminError::InvalidModel` if the identity is already taken.
    pub fn register(&self, view: Arc<dyn ModelView>) -> AdminResult<()> {
        let identity = view.identity().to_owned();
        match self.views.entry(identity.clone()) {
            Entry::Occupied(_) => Err(AdminError::InvalidModel(format!(
                "a view with identity '{identity}' is already registered"
            ))),
            Entry::Vacant(slot) => {
                debug!(identity = %identity, "registered admin view");
                slot.insert(view);
                Ok(())
            }
        }
    }

    /// # Errors
    /// Returns `AdminError::UnknownView` if nothing is registered under `identity`.
    pub fn get(&self, identity: &str) -> AdminResult<Arc<dyn ModelView>> {
        self.views
            .get(identity)
            .map(|v| Arc::clone(v.value()))
            .ok_or_else(|| AdminError::UnknownView(identity.to_owned()))
    }

    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.views.contains_key(identity)
    }

    /// Registered identities, sorted.
    #[must_use]
    pub fn identities(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.views.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("views", &self.identities())
            .finish()
    }
}
