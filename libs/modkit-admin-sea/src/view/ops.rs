//! Data operations of `SeaModelView`.

use std::collections::HashSet;

use async_trait::async_trait;
use modkit_admin::actions::{self, DELETE_ACTION};
use modkit_admin::{
    extract_fields, AdminError, AdminRequest, AdminResult, DefaultSort, Field, FieldKind,
    FormValidationError, ModelView, OrderBy, Record, RequestAction, Where,
};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnType, Condition, ConnectionTrait, DbBackend, DbErr,
    EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QuerySelect, Select,
    Value,
};
use serde_json::Value as Json;
use tracing::{debug, info, warn};

use super::SeaModelView;
use crate::coerce::{json_key, json_to_value, model_to_record, value_to_json};
use crate::error::{Result, SeaAdminError};
use crate::filter::{build_condition, column_expr};
use crate::hooks::ViewHooks;
use crate::inspect::ColumnInfo;
use crate::order::{apply_order, OrderContext};
use crate::relations::{load_relation, replace_owned};
use crate::search::search_condition;
use crate::session::Session;

/// Owner-side relation to rewrite once the row's key is known.
struct PendingRelation {
    relation: usize,
    foreign_pk: String,
    keys: Vec<Json>,
}

/// What a file field's `{"value": ..., "delete": bool}` payload asks for.
enum FileChange {
    Keep,
    Clear,
    Set(Json),
}

fn file_change(key: &str, value: &Json) -> Result<FileChange> {
    match value {
        Json::Null => Ok(FileChange::Keep),
        Json::Object(payload) => {
            if payload.get("delete").and_then(Json::as_bool).unwrap_or(false) {
                return Ok(FileChange::Clear);
            }
            match payload.get("value") {
                None | Some(Json::Null) => Ok(FileChange::Keep),
                Some(v @ (Json::String(_) | Json::Array(_) | Json::Object(_))) => {
                    Ok(FileChange::Set(v.clone()))
                }
                Some(other) => Err(SeaAdminError::FileValidation {
                    key: key.to_owned(),
                    msg: format!("unsupported file value {other}"),
                }),
            }
        }
        Json::String(_) | Json::Array(_) => Ok(FileChange::Set(value.clone())),
        other => Err(SeaAdminError::FileValidation {
            key: key.to_owned(),
            msg: format!("expected a file reference, got {other}"),
        }),
    }
}

fn is_blank(value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Key of a related item given either as a bare key or as a record.
fn key_of(value: &Json, pk_attr: &str) -> Json {
    match value {
        Json::Object(record) => record.get(pk_attr).cloned().unwrap_or(Json::Null),
        other => other.clone(),
    }
}

fn as_items(value: &Json) -> Vec<Json> {
    match value {
        Json::Null => Vec::new(),
        Json::Array(items) => items.clone(),
        single => vec![single.clone()],
    }
}

/// A value the model field rejected is reported against the form field.
fn rejected(field: &str, err: DbErr) -> SeaAdminError {
    match err {
        DbErr::Type(_) => SeaAdminError::coerce(field, "Invalid value for this field"),
        other => other.into(),
    }
}

/// Coerce `value` for `col` and store it on `obj`.
///
/// A `timestamptz` column accepts either `DateTime<Utc>` or
/// `DateTime<FixedOffset>` fields; the offset form is tried when the UTC
/// one is rejected.
fn assign<E>(
    obj: &mut E::ActiveModel,
    field: &str,
    col: &ColumnInfo<E>,
    value: &Json,
    hint: Option<&Value>,
) -> Result<()>
where
    E: EntityTrait,
    E::ActiveModel: ActiveModelTrait<Entity = E>,
{
    let coerced = json_to_value(field, &col.col_type, value, hint)?;
    match obj.try_set(col.column, coerced) {
        Ok(()) => Ok(()),
        Err(DbErr::Type(_)) if matches!(col.col_type, ColumnType::TimestampWithTimeZone) => {
            let offset = Value::ChronoDateTimeWithTimeZone(None);
            let coerced = json_to_value(field, &col.col_type, value, Some(&offset))?;
            obj.try_set(col.column, coerced).map_err(|e| rejected(field, e))
        }
        Err(e) => Err(rejected(field, e)),
    }
}

fn action_error(err: AdminError) -> AdminError {
    match err {
        AdminError::Backend(e) if e.is::<DbErr>() => AdminError::ActionFailed(e.to_string()),
        other => other,
    }
}

impl<E, H> SeaModelView<E, H>
where
    E: EntityTrait,
    E::Model: Sync + IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + Sync,
    H: ViewHooks<E>,
{
    fn session<'r>(&self, req: &'r AdminRequest) -> Result<&'r Session> {
        Ok(req.extension::<Session>()?)
    }

    fn coerce_pk(&self, pk: &Json) -> Result<Value> {
        json_to_value(&self.pk.name, &self.pk.col_type, pk, None)
    }

    /// Base query of the list view.
    pub fn get_list_query(&self, req: &AdminRequest) -> Select<E> {
        self.hooks.list_query(req)
    }

    /// Base query of the row count.
    pub fn get_count_query(&self, req: &AdminRequest) -> Select<E> {
        self.hooks.count_query(req)
    }

    /// Full-text search condition for `term` over the searchable text fields
    /// of the list view.
    pub fn get_search_query(&self, term: &str, backend: DbBackend) -> Condition {
        let columns: Vec<_> = extract_fields(&self.fields, RequestAction::List)
            .into_iter()
            .filter(|f| f.searchable && f.kind.is_text_like())
            .filter_map(|f| self.column(&f.name))
            .collect();
        search_condition(&columns, term, backend)
    }

    /// Search condition used by `count` and `find_all`: the hooks' override
    /// when they provide one, [`Self::get_search_query`] otherwise.
    pub fn build_full_text_search_query(
        &self,
        req: &AdminRequest,
        term: &str,
        backend: DbBackend,
    ) -> Condition {
        self.hooks
            .search_query(req, term)
            .unwrap_or_else(|| self.get_search_query(term, backend))
    }

    fn where_condition(
        &self,
        req: &AdminRequest,
        filter: Option<&Where>,
        backend: DbBackend,
    ) -> Result<Option<Condition>> {
        match filter {
            None => Ok(None),
            Some(Where::Search(term)) if term.trim().is_empty() => Ok(None),
            Some(Where::Search(term)) => Ok(Some(self.build_full_text_search_query(
                req,
                term.trim(),
                backend,
            ))),
            Some(Where::Filter(json)) => build_condition(json, &self.columns, backend),
        }
    }

    /// Apply `order_by` to `select`, joining related tables as needed.
    ///
    /// # Errors
    /// `SeaAdminError::UnknownField` for a field the entity cannot sort by.
    pub fn build_order_clauses(&self, select: Select<E>, order_by: &[OrderBy]) -> Result<Select<E>> {
        let ctx = OrderContext {
            columns: &self.columns,
            relations: &self.relations,
            mapping: &self.sortable_field_mapping,
        };
        apply_order(select, order_by, &ctx)
    }

    async fn find_model<C: ConnectionTrait>(&self, conn: &C, key: Value) -> Result<Option<E::Model>> {
        Ok(E::find()
            .filter(column_expr(&self.pk).eq(key))
            .one(conn)
            .await?)
    }

    async fn to_records<C: ConnectionTrait>(
        &self,
        conn: &C,
        action: RequestAction,
        models: &[E::Model],
    ) -> Result<Vec<Record>> {
        let mut records: Vec<Record> = models
            .iter()
            .map(|m| model_to_record::<E>(m, &self.columns))
            .collect();
        if models.is_empty() {
            return Ok(records);
        }
        let relation_fields: Vec<&Field> = extract_fields(&self.fields, action)
            .into_iter()
            .filter(|f| f.is_relation())
            .collect();
        for field in relation_fields {
            if let Some(rel) = self.relation(&field.name) {
                load_relation(conn, rel, &self.columns, models, &mut records).await?;
            }
        }
        Ok(records)
    }

    async fn count_inner(&self, req: &AdminRequest, filter: Option<&Where>) -> Result<u64> {
        let session = self.session(req)?;
        let mut select = self.get_count_query(req);
        if let Some(cond) = self.where_condition(req, filter, session.backend())? {
            select = select.filter(cond);
        }
        let count = select.count(session.conn()).await?;
        debug!(view = %self.identity, count, "counted rows");
        Ok(count)
    }

    async fn find_all_inner(
        &self,
        req: &AdminRequest,
        skip: u64,
        limit: u64,
        filter: Option<&Where>,
        order_by: &[OrderBy],
    ) -> Result<Vec<Record>> {
        let session = self.session(req)?;
        let mut select = self.get_list_query(req);
        if let Some(cond) = self.where_condition(req, filter, session.backend())? {
            select = select.filter(cond);
        }
        let order: Vec<OrderBy> = if order_by.is_empty() {
            self.fields_default_sort.iter().map(OrderBy::from).collect()
        } else {
            order_by.to_vec()
        };
        select = self.build_order_clauses(select, &order)?;
        if skip > 0 {
            select = select.offset(skip);
        }
        if limit > 0 {
            select = select.limit(limit);
        }

        let mut seen = HashSet::new();
        let models: Vec<E::Model> = select
            .all(session.conn())
            .await?
            .into_iter()
            .filter(|m| seen.insert(json_key(&value_to_json(m.get(self.pk.column)))))
            .collect();
        debug!(view = %self.identity, skip, limit, rows = models.len(), "listed rows");
        self.to_records(session.conn(), RequestAction::List, &models).await
    }

    async fn find_by_pk_inner(&self, req: &AdminRequest, pk: &Json) -> Result<Option<Record>> {
        let session = self.session(req)?;
        let key = self.coerce_pk(pk)?;
        let Some(model) = self.find_model(session.conn(), key).await? else {
            return Ok(None);
        };
        let mut records = self
            .to_records(session.conn(), req.action(), std::slice::from_ref(&model))
            .await?;
        Ok(records.pop())
    }

    async fn find_by_pks_inner(&self, req: &AdminRequest, pks: &[Json]) -> Result<Vec<Record>> {
        if pks.is_empty() {
            return Ok(Vec::new());
        }
        let session = self.session(req)?;
        let keys = pks
            .iter()
            .map(|pk| self.coerce_pk(pk))
            .collect::<Result<Vec<_>>>()?;
        let models = E::find()
            .filter(column_expr(&self.pk).is_in(keys))
            .all(session.conn())
            .await?;
        self.to_records(session.conn(), req.action(), &models).await
    }

    fn foreign_pk(&self, req: &AdminRequest, identity: &str) -> Result<String> {
        Ok(req.registry()?.get(identity)?.pk_attr().to_owned())
    }

    /// Replace relation keys in `data` with the related records, looked up
    /// through the views registered for the related tables.
    async fn arrange_data(
        &self,
        req: &AdminRequest,
        data: Record,
        action: RequestAction,
    ) -> Result<Record> {
        let mut arranged = Record::new();
        for field in extract_fields(&self.fields, action) {
            let Some(value) = data.get(&field.name) else {
                continue;
            };
            let FieldKind::Relation { identity, multiple } = &field.kind else {
                arranged.insert(field.name.clone(), value.clone());
                continue;
            };
            let foreign = req.registry()?.get(identity)?;
            let pk_attr = foreign.pk_attr().to_owned();
            let resolved = if *multiple {
                let keys: Vec<Json> = as_items(value)
                    .iter()
                    .map(|v| key_of(v, &pk_attr))
                    .filter(|k| !is_blank(k))
                    .collect();
                let related = if keys.is_empty() {
                    Vec::new()
                } else {
                    foreign.find_by_pks(req, &keys).await?
                };
                Json::Array(related.into_iter().map(Json::Object).collect())
            } else {
                let key = key_of(value, &pk_attr);
                if is_blank(&key) {
                    Json::Null
                } else {
                    foreign
                        .find_by_pk(req, &key)
                        .await?
                        .map_or(Json::Null, Json::Object)
                }
            };
            arranged.insert(field.name.clone(), resolved);
        }
        Ok(arranged)
    }

    fn set_column(
        &self,
        obj: &mut E::ActiveModel,
        field: &Field,
        value: &Json,
        existing: Option<&E::Model>,
    ) -> Result<()> {
        let Some(col) = self.column(&field.name) else {
            return Ok(());
        };
        let value = if field.is_file() {
            match file_change(&field.name, value)? {
                FileChange::Keep => return Ok(()),
                FileChange::Clear => Json::Null,
                FileChange::Set(v) => v,
            }
        } else {
            value.clone()
        };
        if value.is_null() && !col.nullable {
            return Err(SeaAdminError::coerce(&col.name, "This field is required"));
        }
        let hint = existing.map(|m| m.get(col.column));
        assign::<E>(obj, &field.name, col, &value, hint.as_ref())
    }

    /// Copy arranged `data` onto `obj`.
    ///
    /// Keys absent from `data` leave the column untouched. Owner-side
    /// relations are returned for [`Self::write_relations`].
    fn populate_obj(
        &self,
        req: &AdminRequest,
        action: RequestAction,
        obj: &mut E::ActiveModel,
        data: &Record,
        existing: Option<&E::Model>,
    ) -> Result<Vec<PendingRelation>> {
        let mut pending = Vec::new();
        for field in extract_fields(&self.fields, action) {
            let Some(value) = data.get(&field.name) else {
                continue;
            };
            let Some(index) = self.relations.iter().position(|r| r.name == field.name) else {
                self.set_column(obj, field, value, existing)?;
                continue;
            };
            let rel = &self.relations[index];
            if rel.owner {
                let foreign_pk = self.foreign_pk(req, &rel.identity())?;
                let keys = as_items(value)
                    .iter()
                    .map(|v| key_of(v, &foreign_pk))
                    .filter(|k| !is_blank(k))
                    .collect();
                pending.push(PendingRelation {
                    relation: index,
                    foreign_pk,
                    keys,
                });
            } else if let Some(fk) = self.column(&rel.from_col) {
                let target = key_of(value, &rel.to_col);
                if target.is_null() && !fk.nullable {
                    return Err(SeaAdminError::coerce(&field.name, "This field is required"));
                }
                assign::<E>(obj, &field.name, fk, &target, None)?;
            }
        }
        Ok(pending)
    }

    async fn write_relations<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: &E::Model,
        pending: Vec<PendingRelation>,
    ) -> Result<()> {
        for p in pending {
            let rel = &self.relations[p.relation];
            replace_owned::<E, C>(conn, rel, &self.columns, model, &p.foreign_pk, &p.keys).await?;
        }
        Ok(())
    }

    /// Re-read `model` so the returned record shows database defaults.
    async fn refresh<C: ConnectionTrait>(&self, conn: &C, model: E::Model) -> Result<E::Model> {
        let key = model.get(self.pk.column);
        Ok(self.find_model(conn, key).await?.unwrap_or(model))
    }

    async fn detail_record<C: ConnectionTrait>(&self, conn: &C, model: &E::Model) -> Result<Record> {
        let mut records = self
            .to_records(conn, RequestAction::Detail, std::slice::from_ref(model))
            .await?;
        Ok(records.pop().unwrap_or_default())
    }

    async fn create_inner(&self, req: &AdminRequest, data: Record) -> Result<Record> {
        let session = self.session(req)?;
        let data = self.arrange_data(req, data, RequestAction::Create).await?;
        ModelView::validate(self, req, &data).await?;

        let mut obj = <E::ActiveModel as ActiveModelBehavior>::new();
        let pending = self.populate_obj(req, RequestAction::Create, &mut obj, &data, None)?;
        self.hooks.before_create(req, &data, &mut obj).await?;

        let txn = session.begin().await?;
        let model = obj.insert(&txn).await?;
        self.write_relations(&txn, &model, pending).await?;
        txn.commit().await?;

        let model = self.refresh(session.conn(), model).await?;
        info!(view = %self.identity, "created row");
        self.hooks.after_create(req, &model).await?;
        self.detail_record(session.conn(), &model).await
    }

    async fn edit_inner(&self, req: &AdminRequest, pk: &Json, data: Record) -> Result<Record> {
        let session = self.session(req)?;
        let key = self.coerce_pk(pk)?;
        let existing = self
            .find_model(session.conn(), key)
            .await?
            .ok_or(SeaAdminError::Admin(AdminError::NotFound))?;
        let data = self.arrange_data(req, data, RequestAction::Edit).await?;
        ModelView::validate(self, req, &data).await?;

        let mut obj: E::ActiveModel = existing.clone().into_active_model();
        let pending = self.populate_obj(req, RequestAction::Edit, &mut obj, &data, Some(&existing))?;
        self.hooks.before_edit(req, &data, &mut obj).await?;

        let txn = session.begin().await?;
        let model = if obj.is_changed() {
            obj.update(&txn).await?
        } else {
            existing.clone()
        };
        self.write_relations(&txn, &model, pending).await?;
        txn.commit().await?;

        let model = self.refresh(session.conn(), model).await?;
        info!(view = %self.identity, pk = %pk, "updated row");
        self.hooks.after_edit(req, &model).await?;
        self.detail_record(session.conn(), &model).await
    }

    async fn delete_inner(&self, req: &AdminRequest, pks: &[Json]) -> Result<u64> {
        if pks.is_empty() {
            return Ok(0);
        }
        let session = self.session(req)?;
        let keys = pks
            .iter()
            .map(|pk| self.coerce_pk(pk))
            .collect::<Result<Vec<_>>>()?;
        let models = E::find()
            .filter(column_expr(&self.pk).is_in(keys))
            .all(session.conn())
            .await?;
        if models.is_empty() {
            return Ok(0);
        }
        for model in &models {
            self.hooks.before_delete(req, model).await?;
        }

        let txn = session.begin().await?;
        let values: Vec<Value> = models.iter().map(|m| m.get(self.pk.column)).collect();
        let result = E::delete_many()
            .filter(column_expr(&self.pk).is_in(values))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        for model in &models {
            self.hooks.after_delete(req, model).await?;
        }
        info!(view = %self.identity, deleted = result.rows_affected, "deleted rows");
        Ok(result.rows_affected)
    }

    /// Map an adapter error to what the admin UI shows: value conversion
    /// failures become form errors on the offending field.
    pub fn handle_exception(&self, err: SeaAdminError) -> AdminError {
        match err {
            SeaAdminError::Coerce { field, reason } => {
                AdminError::FormValidation(FormValidationError::new().with(field, reason))
            }
            other => {
                if other.is_db() {
                    warn!(view = %self.identity, error = %other, "database error");
                }
                other.into()
            }
        }
    }
}

#[async_trait]
impl<E, H> ModelView for SeaModelView<E, H>
where
    E: EntityTrait,
    E::Model: Sync + IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + Sync,
    H: ViewHooks<E>,
{
    fn identity(&self) -> &str {
        &self.identity
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    fn pk_attr(&self) -> &str {
        &self.pk.name
    }

    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn searchable_fields(&self) -> &[String] {
        &self.searchable_fields
    }

    fn sortable_fields(&self) -> &[String] {
        &self.sortable_fields
    }

    fn fields_default_sort(&self) -> &[DefaultSort] {
        &self.fields_default_sort
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }

    fn page_size_options(&self) -> Vec<u64> {
        self.page_size_options.clone()
    }

    async fn count(&self, req: &AdminRequest, filter: Option<&Where>) -> AdminResult<u64> {
        Ok(self.count_inner(req, filter).await?)
    }

    async fn find_all(
        &self,
        req: &AdminRequest,
        skip: u64,
        limit: u64,
        filter: Option<&Where>,
        order_by: &[OrderBy],
    ) -> AdminResult<Vec<Record>> {
        Ok(self.find_all_inner(req, skip, limit, filter, order_by).await?)
    }

    async fn find_by_pk(&self, req: &AdminRequest, pk: &Json) -> AdminResult<Option<Record>> {
        Ok(self.find_by_pk_inner(req, pk).await?)
    }

    async fn find_by_pks(&self, req: &AdminRequest, pks: &[Json]) -> AdminResult<Vec<Record>> {
        Ok(self.find_by_pks_inner(req, pks).await?)
    }

    async fn create(&self, req: &AdminRequest, data: Record) -> AdminResult<Record> {
        self.create_inner(req, data)
            .await
            .map_err(|e| self.handle_exception(e))
    }

    async fn edit(&self, req: &AdminRequest, pk: &Json, data: Record) -> AdminResult<Record> {
        self.edit_inner(req, pk, data)
            .await
            .map_err(|e| self.handle_exception(e))
    }

    async fn delete(&self, req: &AdminRequest, pks: &[Json]) -> AdminResult<Option<u64>> {
        Ok(Some(self.delete_inner(req, pks).await?))
    }

    async fn validate(&self, req: &AdminRequest, data: &Record) -> AdminResult<()> {
        self.hooks.validate(req, data).await
    }

    fn actions(&self) -> Vec<String> {
        let mut names = vec![DELETE_ACTION.to_owned()];
        names.extend(self.hooks.extra_actions());
        names
    }

    async fn handle_action(&self, req: &AdminRequest, pks: &[Json], name: &str) -> AdminResult<String> {
        let outcome = match self.hooks.custom_action(req, pks, name).await {
            Ok(Some(message)) => Ok(message),
            Ok(None) => actions::run_action(self, req, pks, name).await,
            Err(e) => Err(e),
        };
        outcome.map_err(action_error)
    }

    async fn handle_row_action(&self, req: &AdminRequest, pk: &Json, name: &str) -> AdminResult<String> {
        actions::run_row_action(self, req, pk, name)
            .await
            .map_err(action_error)
    }
}
