//! ORDER BY clauses, joining related tables when sorting by a relation.

use std::collections::{HashMap, HashSet};

use modkit_admin::OrderBy;
use sea_orm::sea_query::{Alias, Expr, JoinType, Order, SimpleExpr};
use sea_orm::{EntityTrait, QueryOrder, QuerySelect, Select};

use crate::error::{Result, SeaAdminError};
use crate::filter::column_expr;
use crate::inspect::{relation_def, ColumnInfo, RelationInfo};

pub(crate) struct OrderContext<'a, E: EntityTrait> {
    pub columns: &'a [ColumnInfo<E>],
    pub relations: &'a [RelationInfo],
    /// Field name -> column used to sort it; for relations the column is on
    /// the related table.
    pub mapping: &'a HashMap<String, String>,
}

fn join_alias(relation: &RelationInfo) -> String {
    format!("{}_order", relation.name)
}

/// Apply `order_by` to `select`.
///
/// # Errors
/// `UnknownField` when a field is neither a column nor a relation of the entity.
pub(crate) fn apply_order<E: EntityTrait>(
    mut select: Select<E>,
    order_by: &[OrderBy],
    ctx: &OrderContext<'_, E>,
) -> Result<Select<E>> {
    let mut joined = HashSet::new();
    for item in order_by {
        let order = if item.descending { Order::Desc } else { Order::Asc };
        let mapped = ctx.mapping.get(&item.field);

        if let Some(rel) = ctx.relations.iter().find(|r| r.name == item.field) {
            let alias = join_alias(rel);
            if joined.insert(rel.index) {
                let def = relation_def::<E>(rel.index)
                    .ok_or_else(|| SeaAdminError::UnknownField(item.field.clone()))?;
                select = select.join_as(JoinType::LeftJoin, def, Alias::new(alias.clone()));
            }
            let target = mapped.map_or(rel.to_col.as_str(), String::as_str);
            let expr: SimpleExpr = Expr::col((Alias::new(alias), Alias::new(target))).into();
            select = select.order_by(expr, order);
            continue;
        }

        let name = mapped.unwrap_or(&item.field);
        let col = ctx
            .columns
            .iter()
            .find(|c| &c.name == name)
            .ok_or_else(|| SeaAdminError::UnknownField(item.field.clone()))?;
        let expr: SimpleExpr = column_expr(col).into();
        select = select.order_by(expr, order);
    }
    Ok(select)
}
