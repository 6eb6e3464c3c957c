//! Extension points of `SeaModelView`.

use async_trait::async_trait;
use modkit_admin::{AdminRequest, AdminResult, Record};
use sea_orm::{Condition, EntityTrait, Select};
use serde_json::Value as Json;

/// Per-view customisation. Every method has a default, so implementors
/// override only what they need.
#[async_trait]
pub trait ViewHooks<E>: Send + Sync + 'static
where
    E: EntityTrait,
    E::Model: Sync,
    E::ActiveModel: Send,
{
    /// Base query of the list view. Filters, search and ordering are added on top.
    fn list_query(&self, _req: &AdminRequest) -> Select<E> {
        E::find()
    }

    /// Base query of the row count; keep it consistent with [`Self::list_query`].
    fn count_query(&self, _req: &AdminRequest) -> Select<E> {
        E::find()
    }

    /// Replace the built-in full-text search for `term`.
    fn search_query(&self, _req: &AdminRequest, _term: &str) -> Option<Condition> {
        None
    }

    /// Validate submitted data before it is written.
    ///
    /// Return `AdminError::FormValidation` to reject it with per-field messages.
    async fn validate(&self, _req: &AdminRequest, _data: &Record) -> AdminResult<()> {
        Ok(())
    }

    async fn before_create(
        &self,
        _req: &AdminRequest,
        _data: &Record,
        _obj: &mut E::ActiveModel,
    ) -> AdminResult<()> {
        Ok(())
    }

    async fn after_create(&self, _req: &AdminRequest, _obj: &E::Model) -> AdminResult<()> {
        Ok(())
    }

    async fn before_edit(
        &self,
        _req: &AdminRequest,
        _data: &Record,
        _obj: &mut E::ActiveModel,
    ) -> AdminResult<()> {
        Ok(())
    }

    async fn after_edit(&self, _req: &AdminRequest, _obj: &E::Model) -> AdminResult<()> {
        Ok(())
    }

    async fn before_delete(&self, _req: &AdminRequest, _obj: &E::Model) -> AdminResult<()> {
        Ok(())
    }

    async fn after_delete(&self, _req: &AdminRequest, _obj: &E::Model) -> AdminResult<()> {
        Ok(())
    }

    /// Batch actions offered in addition to `delete`.
    fn extra_actions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Run a custom action; `Ok(None)` falls through to the built-in ones.
    async fn custom_action(
        &self,
        _req: &AdminRequest,
        _pks: &[Json],
        _name: &str,
    ) -> AdminResult<Option<String>> {
        Ok(None)
    }
}

/// Hooks that change nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<E> ViewHooks<E> for NoHooks
where
    E: EntityTrait,
    E::Model: Sync,
    E::ActiveModel: Send,
{
}
