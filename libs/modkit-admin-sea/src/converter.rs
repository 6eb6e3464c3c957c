//! Column and relation to admin field kind conversion.

use modkit_admin::FieldKind;
use sea_orm::ColumnType;
use sea_orm::sea_query::Iden;

use crate::inspect::RelationInfo;

/// Decides which [`FieldKind`] renders a column or relation.
pub trait ModelConverter: Send + Sync {
    fn convert_column(&self, name: &str, col_type: &ColumnType) -> FieldKind;

    fn convert_relation(&self, relation: &RelationInfo) -> FieldKind {
        FieldKind::Relation {
            identity: relation.identity(),
            multiple: relation.multiple,
        }
    }
}

/// Maps column types one-to-one; string columns are refined by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

fn string_kind(name: &str) -> FieldKind {
    let name = name.to_ascii_lowercase();
    if name.contains("email") {
        FieldKind::Email
    } else if name.contains("url") || name.contains("website") {
        FieldKind::Url
    } else if name.contains("phone") {
        FieldKind::Phone
    } else if name.contains("color") || name.contains("colour") {
        FieldKind::Color
    } else {
        FieldKind::String
    }
}

impl ModelConverter for DefaultConverter {
    fn convert_column(&self, name: &str, col_type: &ColumnType) -> FieldKind {
        match col_type {
            ColumnType::String(_) | ColumnType::Char(_) => string_kind(name),
            ColumnType::Text => FieldKind::TextArea,
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned => FieldKind::Integer,
            ColumnType::Float | ColumnType::Double => FieldKind::Float,
            ColumnType::Decimal(_) | ColumnType::Money(_) => FieldKind::Decimal,
            ColumnType::Boolean => FieldKind::Boolean,
            ColumnType::DateTime | ColumnType::Timestamp | ColumnType::TimestampWithTimeZone => {
                FieldKind::DateTime
            }
            ColumnType::Date => FieldKind::Date,
            ColumnType::Time => FieldKind::Time,
            ColumnType::Uuid => FieldKind::Uuid,
            ColumnType::Json | ColumnType::JsonBinary => FieldKind::Json,
            ColumnType::Enum { variants, .. } => FieldKind::Enum {
                choices: variants.iter().map(|v| v.to_string()).collect(),
            },
            _ => FieldKind::String,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::StringLen;

    #[test]
    fn string_columns_refined_by_name() {
        let c = DefaultConverter;
        let s = ColumnType::String(StringLen::None);
        assert_eq!(c.convert_column("contact_email", &s), FieldKind::Email);
        assert_eq!(c.convert_column("homepage_url", &s), FieldKind::Url);
        assert_eq!(c.convert_column("title", &s), FieldKind::String);
        assert_eq!(c.convert_column("body", &ColumnType::Text), FieldKind::TextArea);
    }

    #[test]
    fn numeric_and_temporal_columns() {
        let c = DefaultConverter;
        assert_eq!(c.convert_column("id", &ColumnType::Integer), FieldKind::Integer);
        assert_eq!(c.convert_column("price", &ColumnType::Decimal(None)), FieldKind::Decimal);
        assert_eq!(
            c.convert_column("at", &ColumnType::TimestampWithTimeZone),
            FieldKind::DateTime
        );
        assert_eq!(c.convert_column("ok", &ColumnType::Boolean), FieldKind::Boolean);
    }

    #[test]
    fn relation_kind_uses_target_identity() {
        let rel = RelationInfo {
            name: "posts".to_owned(),
            index: 0,
            target_table: "blog_posts".to_owned(),
            from_col: "id".to_owned(),
            to_col: "user_id".to_owned(),
            multiple: true,
            owner: true,
        };
        assert_eq!(
            DefaultConverter.convert_relation(&rel),
            FieldKind::Relation {
                identity: "blog-posts".to_owned(),
                multiple: true
            }
        );
    }
}
