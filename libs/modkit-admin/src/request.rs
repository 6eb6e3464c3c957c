//! Per-request context handed to every `ModelView` operation.

use std::fmt;

use http::Extensions;
use serde::{Deserialize, Serialize};

use crate::error::{AdminError, AdminResult};
use crate::registry::ViewRegistry;

/// The admin page (or API) that issued the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    List,
    Detail,
    Create,
    Edit,
    Api,
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestAction::List => "list",
            RequestAction::Detail => "detail",
            RequestAction::Create => "create",
            RequestAction::Edit => "edit",
            RequestAction::Api => "api",
        };
        f.write_str(s)
    }
}

/// Request state: the action plus typed extensions (backend session, registry).
///
/// Backends store their session with [`AdminRequest::with_extension`] and read it
/// back with [`AdminRequest::extension`].
#[derive(Clone, Debug)]
pub struct AdminRequest {
    action: RequestAction,
    extensions: Extensions,
}

impl AdminRequest {
    #[must_use]
    pub fn new(action: RequestAction) -> Self {
        Self {
            action,
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn with_extension<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.extensions.insert(value);
        self
    }

    #[must_use]
    pub fn with_registry(self, registry: ViewRegistry) -> Self {
        self.with_extension(registry)
    }

    /// Same request state under another action.
    #[must_use]
    pub fn for_action(&self, action: RequestAction) -> Self {
        Self {
            action,
            extensions: self.extensions.clone(),
        }
    }

    #[must_use]
    pub fn action(&self) -> RequestAction {
        self.action
    }

    pub fn set_action(&mut self, action: RequestAction) {
        self.action = action;
    }

    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Typed extension lookup.
    ///
    /// # Errors
    /// Returns `AdminError::MissingExtension` when no value of type `T` was attached.
    pub fn extension<T>(&self) -> AdminResult<&T>
    where
        T: Send + Sync + 'static,
    {
        self.extensions
            .get::<T>()
            .ok_or(AdminError::MissingExtension(std::any::type_name::<T>()))
    }

    /// # Errors
    /// Returns `AdminError::MissingExtension` when no registry was attached.
    pub fn registry(&self) -> AdminResult<&ViewRegistry> {
        self.extension::<ViewRegistry>()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Marker(u32);

    #[test]
    fn extension_round_trip() {
        let req = AdminRequest::new(RequestAction::List).with_extension(Marker(7));
        assert_eq!(req.extension::<Marker>().unwrap(), &Marker(7));
    }

    #[test]
    fn missing_extension_names_the_type() {
        let req = AdminRequest::new(RequestAction::List);
        let err = req.extension::<Marker>().unwrap_err();
        assert!(matches!(err, AdminError::MissingExtension(name) if name.ends_with("Marker")));
    }

    #[test]
    fn for_action_keeps_extensions() {
        let req = AdminRequest::new(RequestAction::Create).with_extension(Marker(1));
        let detail = req.for_action(RequestAction::Detail);
        assert_eq!(detail.action(), RequestAction::Detail);
        assert_eq!(detail.extension::<Marker>().unwrap(), &Marker(1));
    }
}
