//! The model view contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::actions;
use crate::error::AdminResult;
use crate::fields::{extract_fields, Field};
use crate::query::{DefaultSort, OrderBy, Where};
use crate::request::{AdminRequest, RequestAction};

/// A row as exchanged with the admin UI: field name -> JSON value.
///
/// Relation fields hold a nested record (single) or an array of records (multiple).
pub type Record = serde_json::Map<String, Value>;

/// Contract between the admin panel and a backend managing one kind of model.
///
/// Primary keys travel as JSON values: numbers or strings (as found in URLs);
/// the backend coerces them to the key column's type.
#[async_trait]
pub trait ModelView: Send + Sync {
    /// URL-safe identifier, unique within a registry.
    fn identity(&self) -> &str;

    /// Singular display name.
    fn name(&self) -> &str;

    /// Plural display name.
    fn label(&self) -> &str;

    fn icon(&self) -> Option<&str> {
        None
    }

    /// Record key holding the primary key.
    fn pk_attr(&self) -> &str;

    fn fields(&self) -> &[Field];

    fn searchable_fields(&self) -> &[String];

    fn sortable_fields(&self) -> &[String];

    fn fields_default_sort(&self) -> &[DefaultSort] {
        &[]
    }

    /// Rows per page in the list view.
    fn page_size(&self) -> u64 {
        10
    }

    fn page_size_options(&self) -> Vec<u64> {
        vec![10, 25, 50, 100]
    }

    fn get_fields_list(&self, action: RequestAction) -> Vec<&Field> {
        extract_fields(self.fields(), action)
    }

    /// Number of rows matching `filter`.
    async fn count(&self, req: &AdminRequest, filter: Option<&Where>) -> AdminResult<u64>;

    /// One page of rows. `limit == 0` means no limit.
    async fn find_all(
        &self,
        req: &AdminRequest,
        skip: u64,
        limit: u64,
        filter: Option<&Where>,
        order_by: &[OrderBy],
    ) -> AdminResult<Vec<Record>>;

    async fn find_by_pk(&self, req: &AdminRequest, pk: &Value) -> AdminResult<Option<Record>>;

    async fn find_by_pks(&self, req: &AdminRequest, pks: &[Value]) -> AdminResult<Vec<Record>>;

    async fn create(&self, req: &AdminRequest, data: Record) -> AdminResult<Record>;

    async fn edit(&self, req: &AdminRequest, pk: &Value, data: Record) -> AdminResult<Record>;

    /// Delete the rows with the given keys; returns how many were removed.
    async fn delete(&self, req: &AdminRequest, pks: &[Value]) -> AdminResult<Option<u64>>;

    /// Check submitted data before `create` or `edit` writes it.
    ///
    /// Return `AdminError::FormValidation` to reject it with per-field messages.
    async fn validate(&self, _req: &AdminRequest, _data: &Record) -> AdminResult<()> {
        Ok(())
    }

    /// Batch actions offered in the list view.
    fn actions(&self) -> Vec<String> {
        vec![actions::DELETE_ACTION.to_owned()]
    }

    /// Per-row actions offered in the list and detail views.
    fn row_actions(&self) -> Vec<String> {
        ["view", "edit", actions::DELETE_ACTION]
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Run the batch action `name` on `pks` and return the user-facing message.
    async fn handle_action(
        &self,
        req: &AdminRequest,
        pks: &[Value],
        name: &str,
    ) -> AdminResult<String> {
        actions::run_action(self, req, pks, name).await
    }

    /// Run the row action `name` on `pk` and return the user-facing message.
    async fn handle_row_action(
        &self,
        req: &AdminRequest,
        pk: &Value,
        name: &str,
    ) -> AdminResult<String> {
        actions::run_row_action(self, req, pk, name).await
    }

    fn get_pk_value(&self, record: &Record) -> Option<Value> {
        record.get(self.pk_attr()).cloned()
    }
}
