//! Built-in list and row actions.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AdminError, AdminResult};
use crate::request::AdminRequest;
use crate::view::ModelView;

pub const DELETE_ACTION: &str = "delete";

/// Message shown after deleting `count` rows.
#[must_use]
pub fn delete_message(count: u64) -> String {
    if count == 1 {
        "Item was successfully deleted".to_owned()
    } else {
        format!("{count} items were successfully deleted")
    }
}

fn invalid_action(identity: &str, name: &str) -> AdminError {
    warn!(identity, action = name, "rejected unknown action");
    AdminError::ActionFailed("Invalid action".to_owned())
}

/// Dispatch a batch action offered by `view`.
///
/// # Errors
/// Returns `AdminError::ActionFailed` for actions the view does not offer and
/// propagates errors of the action itself.
pub async fn run_action<V>(
    view: &V,
    req: &AdminRequest,
    pks: &[Value],
    name: &str,
) -> AdminResult<String>
where
    V: ModelView + ?Sized,
{
    if !view.actions().iter().any(|a| a == name) {
        return Err(invalid_action(view.identity(), name));
    }
    match name {
        DELETE_ACTION => {
            let deleted = view.delete(req, pks).await?.unwrap_or_default();
            debug!(identity = view.identity(), deleted, "delete action done");
            Ok(delete_message(deleted))
        }
        _ => Err(invalid_action(view.identity(), name)),
    }
}

/// Dispatch a row action offered by `view`.
///
/// `view` and `edit` are navigation actions handled by the UI, not here.
///
/// # Errors
/// Returns `AdminError::ActionFailed` for actions that cannot be run server-side.
pub async fn run_row_action<V>(
    view: &V,
    req: &AdminRequest,
    pk: &Value,
    name: &str,
) -> AdminResult<String>
where
    V: ModelView + ?Sized,
{
    if !view.row_actions().iter().any(|a| a == name) {
        return Err(invalid_action(view.identity(), name));
    }
    match name {
        DELETE_ACTION => {
            view.delete(req, std::slice::from_ref(pk)).await?;
            Ok(delete_message(1))
        }
        _ => Err(invalid_action(view.identity(), name)),
    }
}
