//! JSON filter DSL compiled to a `Condition`.
//!
//! ```json
//! {"or": [{"title": {"contains": "rust"}}, {"views": {"ge": 100}}],
//!  "published": {"is_true": null}}
//! ```
//!
//! Keys of one object are ANDed; `and` / `or` take arrays of sub-filters.
//! A bare value is shorthand for `eq`.

use modkit_admin::helpers::snake_case;
use sea_orm::sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{Condition, DbBackend, EntityTrait};
use serde_json::{Map, Value as Json};

use crate::coerce::{json_to_value, like_escape};
use crate::error::{Result, SeaAdminError};
use crate::inspect::ColumnInfo;

/// `E.column`, qualified with the entity's table.
pub(crate) fn column_expr<E: EntityTrait>(col: &ColumnInfo<E>) -> Expr {
    Expr::col((E::default(), col.column))
}

/// Column rendered as text, for `LIKE` on non-character columns.
pub(crate) fn text_expr<E: EntityTrait>(col: &ColumnInfo<E>, backend: DbBackend) -> Expr {
    if col.is_textual() {
        return column_expr(col);
    }
    let target = match backend {
        DbBackend::MySql => "CHAR",
        _ => "TEXT",
    };
    Expr::expr(Func::cast_as(column_expr(col), Alias::new(target)))
}

fn never() -> SimpleExpr {
    Expr::cust("1=0")
}

fn like_operand(op: &str, operand: &Json) -> Result<String> {
    match operand {
        Json::String(s) => Ok(like_escape(s)),
        Json::Number(n) => Ok(n.to_string()),
        Json::Bool(b) => Ok(b.to_string()),
        other => Err(SeaAdminError::InvalidFilter(format!(
            "'{op}' expects a string, got {other}"
        ))),
    }
}

fn array_operand<'a>(op: &str, operand: &'a Json) -> Result<&'a [Json]> {
    operand
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| SeaAdminError::InvalidFilter(format!("'{op}' expects an array")))
}

fn build_op<E: EntityTrait>(
    col: &ColumnInfo<E>,
    op: &str,
    operand: &Json,
    backend: DbBackend,
) -> Result<Option<SimpleExpr>> {
    let value = |json: &Json| json_to_value(&col.name, &col.col_type, json, None);
    let like = |pattern: String| LikeExpr::new(pattern).escape('\\');

    let expr = match snake_case(op).as_str() {
        "eq" => column_expr(col).eq(value(operand)?),
        "neq" | "ne" => column_expr(col).ne(value(operand)?),
        "lt" => column_expr(col).lt(value(operand)?),
        "gt" => column_expr(col).gt(value(operand)?),
        "le" | "lte" => column_expr(col).lte(value(operand)?),
        "ge" | "gte" => column_expr(col).gte(value(operand)?),
        "in" => {
            let values = array_operand(op, operand)?
                .iter()
                .map(value)
                .collect::<Result<Vec<_>>>()?;
            if values.is_empty() {
                never()
            } else {
                column_expr(col).is_in(values)
            }
        }
        "not_in" => {
            let values = array_operand(op, operand)?
                .iter()
                .map(value)
                .collect::<Result<Vec<_>>>()?;
            if values.is_empty() {
                return Ok(None);
            }
            column_expr(col).is_not_in(values)
        }
        "startswith" | "starts_with" => {
            text_expr(col, backend).like(like(format!("{}%", like_operand(op, operand)?)))
        }
        "not_startswith" | "not_starts_with" => {
            text_expr(col, backend).not_like(like(format!("{}%", like_operand(op, operand)?)))
        }
        "endswith" | "ends_with" => {
            text_expr(col, backend).like(like(format!("%{}", like_operand(op, operand)?)))
        }
        "not_endswith" | "not_ends_with" => {
            text_expr(col, backend).not_like(like(format!("%{}", like_operand(op, operand)?)))
        }
        "contains" => {
            text_expr(col, backend).like(like(format!("%{}%", like_operand(op, operand)?)))
        }
        "not_contains" => {
            text_expr(col, backend).not_like(like(format!("%{}%", like_operand(op, operand)?)))
        }
        "is_true" => column_expr(col).eq(true),
        "is_false" => column_expr(col).eq(false),
        "is_null" => column_expr(col).is_null(),
        "is_not_null" => column_expr(col).is_not_null(),
        "between" | "not_between" => {
            let bounds = array_operand(op, operand)?;
            let [low, high] = bounds else {
                return Err(SeaAdminError::InvalidFilter(format!(
                    "'{op}' expects exactly two values"
                )));
            };
            let (low, high) = (value(low)?, value(high)?);
            if op.starts_with("not") {
                column_expr(col).not_between(low, high)
            } else {
                column_expr(col).between(low, high)
            }
        }
        _ => {
            return Err(SeaAdminError::InvalidFilter(format!(
                "unknown operator '{op}' on '{}'",
                col.name
            )));
        }
    };
    Ok(Some(expr))
}

fn build_group<E: EntityTrait>(
    key: &str,
    value: &Json,
    columns: &[ColumnInfo<E>],
    backend: DbBackend,
) -> Result<Option<Condition>> {
    let items = value
        .as_array()
        .ok_or_else(|| SeaAdminError::InvalidFilter(format!("'{key}' expects an array")))?;
    let is_or = key == "or";
    let mut group = if is_or { Condition::any() } else { Condition::all() };
    let mut parts = 0usize;
    for item in items {
        match build_condition(item, columns, backend)? {
            Some(cond) => {
                group = group.add(cond);
                parts += 1;
            }
            // An empty branch of an OR matches everything.
            None if is_or => return Ok(None),
            None => {}
        }
    }
    if parts == 0 {
        return Ok(if is_or {
            Some(Condition::all().add(never()))
        } else {
            None
        });
    }
    Ok(Some(group))
}

fn build_object<E: EntityTrait>(
    map: &Map<String, Json>,
    columns: &[ColumnInfo<E>],
    backend: DbBackend,
) -> Result<Option<Condition>> {
    let mut all = Condition::all();
    let mut parts = 0usize;
    for (key, value) in map {
        match key.as_str() {
            "and" | "or" => {
                if let Some(group) = build_group(key, value, columns, backend)? {
                    all = all.add(group);
                    parts += 1;
                }
            }
            field => {
                let col = columns
                    .iter()
                    .find(|c| c.name == field)
                    .ok_or_else(|| SeaAdminError::UnknownField(field.to_owned()))?;
                let ops: Vec<(&str, &Json)> = match value {
                    Json::Object(ops) => ops.iter().map(|(op, v)| (op.as_str(), v)).collect(),
                    shorthand => vec![("eq", shorthand)],
                };
                for (op, operand) in ops {
                    if let Some(expr) = build_op(col, op, operand, backend)? {
                        all = all.add(expr);
                        parts += 1;
                    }
                }
            }
        }
    }
    Ok((parts > 0).then_some(all))
}

/// Compile `filter` against the entity's columns.
///
/// Returns `None` when the filter places no restriction.
///
/// # Errors
/// `UnknownField` for a key that is not a column, `InvalidFilter` for a
/// malformed node, `Coerce` when an operand does not fit its column.
pub fn build_condition<E: EntityTrait>(
    filter: &Json,
    columns: &[ColumnInfo<E>],
    backend: DbBackend,
) -> Result<Option<Condition>> {
    match filter {
        Json::Object(map) => build_object(map, columns, backend),
        Json::Null => Ok(None),
        other => Err(SeaAdminError::InvalidFilter(format!(
            "filter must be an object, got {other}"
        ))),
    }
}
