//! Eager loading and owner-side writes of relations.
//!
//! Related rows are read with one `IN (...)` query per relation and returned as
//! plain JSON objects; the view does not need the related entity type.

use std::collections::HashMap;

use modkit_admin::Record;
use sea_orm::sea_query::{Alias, Asterisk, Expr, Query};
use sea_orm::{ConnectionTrait, EntityTrait, FromQueryResult, ModelTrait, Value};
use serde_json::Value as Json;
use tracing::debug;

use crate::coerce::{json_key, json_to_untyped, value_to_json};
use crate::error::{Result, SeaAdminError};
use crate::inspect::{ColumnInfo, RelationInfo};

fn from_column<'a, E: EntityTrait>(
    columns: &'a [ColumnInfo<E>],
    rel: &RelationInfo,
) -> Result<&'a ColumnInfo<E>> {
    columns
        .iter()
        .find(|c| c.name == rel.from_col)
        .ok_or_else(|| SeaAdminError::UnknownField(rel.from_col.clone()))
}

/// Fill `records[i][rel.name]` with the rows related to `models[i]`.
///
/// Single relations get an object or `null`, multiple relations an array.
///
/// # Errors
/// Returns the driver error of the lookup query.
pub async fn load_relation<E, C>(
    conn: &C,
    rel: &RelationInfo,
    columns: &[ColumnInfo<E>],
    models: &[E::Model],
    records: &mut [Record],
) -> Result<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let from = from_column(columns, rel)?;
    let keys: Vec<Json> = models
        .iter()
        .map(|m| value_to_json(m.get(from.column)))
        .collect();

    let mut unique: HashMap<String, Value> = HashMap::new();
    for key in keys.iter().filter(|k| !k.is_null()) {
        unique
            .entry(json_key(key))
            .or_insert_with(|| json_to_untyped(key));
    }

    let mut grouped: HashMap<String, Vec<Json>> = HashMap::new();
    if !unique.is_empty() {
        let stmt = Query::select()
            .column(Asterisk)
            .from(Alias::new(rel.target_table.as_str()))
            .and_where(Expr::col(Alias::new(rel.to_col.as_str())).is_in(unique.into_values()))
            .to_owned();
        let rows = Json::find_by_statement(conn.get_database_backend().build(&stmt))
            .all(conn)
            .await?;
        debug!(relation = %rel.name, table = %rel.target_table, rows = rows.len(), "loaded related rows");
        for row in rows {
            if let Some(key) = row.get(&rel.to_col).filter(|k| !k.is_null()) {
                grouped.entry(json_key(key)).or_default().push(row);
            }
        }
    }

    for (record, key) in records.iter_mut().zip(&keys) {
        let related = if key.is_null() {
            Vec::new()
        } else {
            grouped.get(&json_key(key)).cloned().unwrap_or_default()
        };
        let value = if rel.multiple {
            Json::Array(related)
        } else {
            related.into_iter().next().unwrap_or(Json::Null)
        };
        record.insert(rel.name.clone(), value);
    }
    Ok(())
}

/// Point exactly the rows with `foreign_pk IN keys` at `model`.
///
/// Rows of the target table that referenced `model` and are not in `keys`
/// get their foreign key cleared first.
///
/// # Errors
/// Returns the driver error of either update.
pub async fn replace_owned<E, C>(
    conn: &C,
    rel: &RelationInfo,
    columns: &[ColumnInfo<E>],
    model: &E::Model,
    foreign_pk: &str,
    keys: &[Json],
) -> Result<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let from = from_column(columns, rel)?;
    let own_key = model.get(from.column);
    let table = Alias::new(rel.target_table.as_str());
    let fk = Alias::new(rel.to_col.as_str());
    let pk = Alias::new(foreign_pk);
    let keys: Vec<Value> = keys.iter().filter(|k| !k.is_null()).map(json_to_untyped).collect();
    let backend = conn.get_database_backend();

    let mut detach = Query::update()
        .table(table.clone())
        .value(fk.clone(), Expr::cust("NULL"))
        .and_where(Expr::col(fk.clone()).eq(own_key.clone()))
        .to_owned();
    if !keys.is_empty() {
        detach.and_where(Expr::col(pk.clone()).is_not_in(keys.clone()));
    }
    conn.execute(backend.build(&detach)).await?;

    if !keys.is_empty() {
        let attached = keys.len();
        let attach = Query::update()
            .table(table)
            .value(fk, own_key)
            .and_where(Expr::col(pk).is_in(keys))
            .to_owned();
        conn.execute(backend.build(&attach)).await?;
        debug!(relation = %rel.name, attached, "updated owned relation");
    }
    Ok(())
}
