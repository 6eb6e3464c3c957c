//! Case-insensitive full-text search over a set of columns.

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{Condition, DbBackend, EntityTrait};

use crate::coerce::like_escape;
use crate::filter::text_expr;
use crate::inspect::ColumnInfo;

/// `LOWER(CAST(col AS TEXT)) LIKE '%term%'` ORed over `columns`.
///
/// With no columns the condition matches nothing.
pub fn search_condition<E: EntityTrait>(
    columns: &[&ColumnInfo<E>],
    term: &str,
    backend: DbBackend,
) -> Condition {
    if columns.is_empty() {
        return Condition::all().add(Expr::cust("1=0"));
    }
    let pattern = format!("%{}%", like_escape(&term.to_lowercase()));
    columns.iter().fold(Condition::any(), |cond, col| {
        cond.add(
            Expr::expr(Func::lower(text_expr(col, backend)))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
    })
}
