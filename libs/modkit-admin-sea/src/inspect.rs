//! Entity metadata read once at view construction.

use modkit_admin::helpers::{slugify_class_name, snake_case};
use modkit_admin::AdminError;
use sea_orm::sea_query::TableRef;
use sea_orm::{
    ColumnTrait, ColumnType, EntityTrait, IdenStatic, Identity, Iterable,
    PrimaryKeyToColumn, PrimaryKeyTrait, RelationDef, RelationTrait, RelationType,
};

#[derive(Clone, Debug)]
pub struct ColumnInfo<E: EntityTrait> {
    pub column: E::Column,
    pub name: String,
    pub col_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
}

impl<E: EntityTrait> ColumnInfo<E> {
    /// Character columns compare with `LIKE` without a cast.
    #[must_use]
    pub fn is_textual(&self) -> bool {
        matches!(
            self.col_type,
            ColumnType::String(_) | ColumnType::Char(_) | ColumnType::Text
        )
    }
}

/// A relation of the entity, flattened to table and column names.
///
/// `from_col` lives on the entity's own table and `to_col` on `target_table`,
/// whichever side owns the foreign key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationInfo {
    pub name: String,
    /// Position in `E::Relation::iter()`, used to rebuild the `RelationDef`.
    pub index: usize,
    pub target_table: String,
    pub from_col: String,
    pub to_col: String,
    pub multiple: bool,
    /// `true` for has-one / has-many: the foreign key is on the target table.
    pub owner: bool,
}

impl RelationInfo {
    /// Identity of the view expected to manage the target table.
    #[must_use]
    pub fn identity(&self) -> String {
        slugify_class_name(&self.target_table)
    }
}

pub struct EntityMeta<E: EntityTrait> {
    pub table: String,
    pub columns: Vec<ColumnInfo<E>>,
    pub pk: ColumnInfo<E>,
    pub pk_auto_increment: bool,
    pub relations: Vec<RelationInfo>,
}

fn table_name(table: &TableRef) -> Option<String> {
    match table {
        TableRef::Table(t) | TableRef::SchemaTable(_, t) | TableRef::DatabaseSchemaTable(_, _, t) => {
            Some(t.to_string())
        }
        _ => None,
    }
}

fn unary(identity: &Identity) -> Option<String> {
    match identity {
        Identity::Unary(col) => Some(col.to_string()),
        _ => None,
    }
}

/// Rebuild the `RelationDef` recorded at `index`.
#[must_use]
pub fn relation_def<E: EntityTrait>(index: usize) -> Option<RelationDef> {
    <E::Relation as Iterable>::iter()
        .nth(index)
        .map(|rel| rel.def())
}

/// Read columns, the primary key and relations of `E`.
///
/// # Errors
/// Returns `AdminError::InvalidModel` unless the entity has exactly one
/// primary-key column.
pub fn inspect<E: EntityTrait>() -> Result<EntityMeta<E>, AdminError> {
    let table = E::default().table_name().to_owned();

    let pk_names: Vec<String> = <E::PrimaryKey as Iterable>::iter()
        .map(|pk| pk.into_column().as_str().to_owned())
        .collect();
    if pk_names.len() != 1 {
        return Err(AdminError::InvalidModel(format!(
            "{table}: multiple PK columns not supported, implement ModelView for this model instead"
        )));
    }

    let columns: Vec<ColumnInfo<E>> = <E::Column as Iterable>::iter()
        .map(|column| {
            let def = column.def();
            let name = column.as_str().to_owned();
            ColumnInfo {
                column,
                primary_key: pk_names.contains(&name),
                name,
                col_type: def.get_column_type().clone(),
                nullable: def.is_null(),
            }
        })
        .collect();

    let pk = columns
        .iter()
        .find(|c| c.primary_key)
        .cloned()
        .ok_or_else(|| AdminError::InvalidModel(format!("{table}: primary key column not found")))?;

    let relations = <E::Relation as Iterable>::iter()
        .enumerate()
        .filter_map(|(index, rel)| {
            let def = rel.def();
            #[allow(clippy::use_debug)]
            let name = snake_case(&format!("{rel:?}"));
            let relation = RelationInfo {
                name,
                index,
                target_table: table_name(&def.to_tbl)?,
                from_col: unary(&def.from_col)?,
                to_col: unary(&def.to_col)?,
                multiple: matches!(def.rel_type, RelationType::HasMany),
                owner: def.is_owner,
            };
            Some(relation)
        })
        .collect();

    Ok(EntityMeta {
        table,
        columns,
        pk,
        pk_auto_increment: <E::PrimaryKey as PrimaryKeyTrait>::auto_increment(),
        relations,
    })
}
