//! JSON <-> `sea_orm::Value` conversion driven by the column type.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use modkit_admin::Record;
use rust_decimal::Decimal;
use sea_orm::{ColumnType, EntityTrait, ModelTrait, Value};
use serde_json::{Number, Value as Json};

use crate::error::{Result, SeaAdminError};
use crate::inspect::ColumnInfo;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
#[must_use]
pub fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Typed NULL for a column.
#[must_use]
pub fn null_of(col_type: &ColumnType) -> Value {
    match col_type {
        ColumnType::TinyInteger => Value::TinyInt(None),
        ColumnType::SmallInteger => Value::SmallInt(None),
        ColumnType::Integer => Value::Int(None),
        ColumnType::BigInteger => Value::BigInt(None),
        ColumnType::TinyUnsigned => Value::TinyUnsigned(None),
        ColumnType::SmallUnsigned => Value::SmallUnsigned(None),
        ColumnType::Unsigned => Value::Unsigned(None),
        ColumnType::BigUnsigned => Value::BigUnsigned(None),
        ColumnType::Float => Value::Float(None),
        ColumnType::Double => Value::Double(None),
        ColumnType::Decimal(_) | ColumnType::Money(_) => Value::Decimal(None),
        ColumnType::Boolean => Value::Bool(None),
        ColumnType::DateTime | ColumnType::Timestamp => Value::ChronoDateTime(None),
        ColumnType::TimestampWithTimeZone => Value::ChronoDateTimeUtc(None),
        ColumnType::Date => Value::ChronoDate(None),
        ColumnType::Time => Value::ChronoTime(None),
        ColumnType::Uuid => Value::Uuid(None),
        ColumnType::Json | ColumnType::JsonBinary => Value::Json(None),
        ColumnType::Binary(_) | ColumnType::VarBinary(_) => Value::Bytes(None),
        _ => Value::String(None),
    }
}

fn text_of(json: &Json) -> String {
    match json {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_i64(field: &str, json: &Json) -> Result<i64> {
    match json {
        Json::Number(n) => n
            .as_i64()
            .ok_or_else(|| SeaAdminError::coerce(field, format!("{n} is not an integer"))),
        Json::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| SeaAdminError::coerce(field, format!("'{s}': {e}"))),
        Json::Bool(b) => Ok(i64::from(*b)),
        other => Err(SeaAdminError::coerce(field, format!("expected integer, got {other}"))),
    }
}

fn parse_u64(field: &str, json: &Json) -> Result<u64> {
    match json {
        Json::Number(n) => n
            .as_u64()
            .ok_or_else(|| SeaAdminError::coerce(field, format!("{n} is not an unsigned integer"))),
        Json::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| SeaAdminError::coerce(field, format!("'{s}': {e}"))),
        other => Err(SeaAdminError::coerce(
            field,
            format!("expected unsigned integer, got {other}"),
        )),
    }
}

fn parse_f64(field: &str, json: &Json) -> Result<f64> {
    match json {
        Json::Number(n) => n
            .as_f64()
            .ok_or_else(|| SeaAdminError::coerce(field, format!("{n} is not a number"))),
        Json::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| SeaAdminError::coerce(field, format!("'{s}': {e}"))),
        other => Err(SeaAdminError::coerce(field, format!("expected number, got {other}"))),
    }
}

fn narrow<T: TryFrom<i64>>(field: &str, v: i64) -> Result<T> {
    T::try_from(v).map_err(|_| SeaAdminError::coerce(field, format!("{v} is out of range")))
}

fn narrow_u<T: TryFrom<u64>>(field: &str, v: u64) -> Result<T> {
    T::try_from(v).map_err(|_| SeaAdminError::coerce(field, format!("{v} is out of range")))
}

fn parse_bool(field: &str, json: &Json) -> Result<bool> {
    match json {
        Json::Bool(b) => Ok(*b),
        Json::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(SeaAdminError::coerce(field, format!("{n} is not a boolean"))),
        },
        Json::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(true),
            "false" | "off" | "no" | "0" | "" => Ok(false),
            _ => Err(SeaAdminError::coerce(field, format!("'{s}' is not a boolean"))),
        },
        other => Err(SeaAdminError::coerce(field, format!("expected boolean, got {other}"))),
    }
}

fn parse_decimal(field: &str, json: &Json) -> Result<Decimal> {
    let s = text_of(json);
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|e| SeaAdminError::coerce(field, format!("'{s}': {e}")))
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_offset_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .or_else(|| parse_naive_datetime(s).map(|naive| naive.and_utc().fixed_offset()))
}

fn str_of<'a>(field: &str, json: &'a Json) -> Result<&'a str> {
    json.as_str()
        .map(str::trim)
        .ok_or_else(|| SeaAdminError::coerce(field, format!("expected string, got {json}")))
}

/// Convert a JSON value coming from a form or URL into a value for `col_type`.
///
/// `hint` is the column's current value, when known; it selects between
/// representations the column type alone does not pin down (UTC vs fixed offset).
///
/// # Errors
/// Returns `SeaAdminError::Coerce` when the value does not fit the column.
pub fn json_to_value(
    field: &str,
    col_type: &ColumnType,
    json: &Json,
    hint: Option<&Value>,
) -> Result<Value> {
    let keep_offset = matches!(hint, Some(Value::ChronoDateTimeWithTimeZone(_)));
    if json.is_null() {
        return Ok(if keep_offset {
            Value::ChronoDateTimeWithTimeZone(None)
        } else {
            null_of(col_type)
        });
    }

    let value = match col_type {
        ColumnType::TinyInteger => Value::from(narrow::<i8>(field, parse_i64(field, json)?)?),
        ColumnType::SmallInteger => Value::from(narrow::<i16>(field, parse_i64(field, json)?)?),
        ColumnType::Integer => Value::from(narrow::<i32>(field, parse_i64(field, json)?)?),
        ColumnType::BigInteger => Value::from(parse_i64(field, json)?),
        ColumnType::TinyUnsigned => Value::from(narrow_u::<u8>(field, parse_u64(field, json)?)?),
        ColumnType::SmallUnsigned => {
            Value::from(narrow_u::<u16>(field, parse_u64(field, json)?)?)
        }
        ColumnType::Unsigned => Value::from(narrow_u::<u32>(field, parse_u64(field, json)?)?),
        ColumnType::BigUnsigned => Value::from(parse_u64(field, json)?),
        #[allow(clippy::cast_possible_truncation)]
        ColumnType::Float => Value::from(parse_f64(field, json)? as f32),
        ColumnType::Double => Value::from(parse_f64(field, json)?),
        ColumnType::Decimal(_) | ColumnType::Money(_) => Value::from(parse_decimal(field, json)?),
        ColumnType::Boolean => Value::from(parse_bool(field, json)?),
        ColumnType::DateTime | ColumnType::Timestamp => {
            let s = str_of(field, json)?;
            let dt = parse_naive_datetime(s)
                .ok_or_else(|| SeaAdminError::coerce(field, format!("'{s}' is not a datetime")))?;
            Value::from(dt)
        }
        ColumnType::TimestampWithTimeZone => {
            let s = str_of(field, json)?;
            let dt = parse_offset_datetime(s)
                .ok_or_else(|| SeaAdminError::coerce(field, format!("'{s}' is not a datetime")))?;
            if keep_offset {
                Value::from(dt)
            } else {
                Value::from(dt.with_timezone(&Utc))
            }
        }
        ColumnType::Date => {
            let s = str_of(field, json)?;
            let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| SeaAdminError::coerce(field, format!("'{s}': {e}")))?;
            Value::from(d)
        }
        ColumnType::Time => {
            let s = str_of(field, json)?;
            let t = TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
                .ok_or_else(|| SeaAdminError::coerce(field, format!("'{s}' is not a time")))?;
            Value::from(t)
        }
        ColumnType::Uuid => {
            let s = str_of(field, json)?;
            let u = uuid::Uuid::parse_str(s)
                .map_err(|e| SeaAdminError::coerce(field, format!("'{s}': {e}")))?;
            Value::from(u)
        }
        ColumnType::Json | ColumnType::JsonBinary => Value::Json(Some(Box::new(json.clone()))),
        ColumnType::Binary(_) | ColumnType::VarBinary(_) => match json {
            Json::Array(items) => {
                let bytes = items
                    .iter()
                    .map(|b| narrow_u::<u8>(field, parse_u64(field, b)?))
                    .collect::<Result<Vec<u8>>>()?;
                Value::from(bytes)
            }
            other => Value::from(text_of(other).into_bytes()),
        },
        _ => Value::from(text_of(json)),
    };
    Ok(value)
}

/// Best-effort conversion for columns whose type is only known on another table.
#[must_use]
pub fn json_to_untyped(json: &Json) -> Value {
    match json {
        Json::Null => Value::String(None),
        Json::Bool(b) => Value::from(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::from(n.as_f64().unwrap_or_default())
            }
        }
        Json::String(s) => Value::from(s.clone()),
        other => Value::from(other.to_string()),
    }
}

fn float_json(f: f64) -> Json {
    Number::from_f64(f).map_or(Json::Null, Json::Number)
}

/// Render a column value for the admin UI.
#[must_use]
pub fn value_to_json(value: Value) -> Json {
    match value {
        Value::Bool(v) => v.map_or(Json::Null, Json::Bool),
        Value::TinyInt(v) => v.map_or(Json::Null, Json::from),
        Value::SmallInt(v) => v.map_or(Json::Null, Json::from),
        Value::Int(v) => v.map_or(Json::Null, Json::from),
        Value::BigInt(v) => v.map_or(Json::Null, Json::from),
        Value::TinyUnsigned(v) => v.map_or(Json::Null, Json::from),
        Value::SmallUnsigned(v) => v.map_or(Json::Null, Json::from),
        Value::Unsigned(v) => v.map_or(Json::Null, Json::from),
        Value::BigUnsigned(v) => v.map_or(Json::Null, Json::from),
        Value::Float(v) => v.map_or(Json::Null, |f| float_json(f64::from(f))),
        Value::Double(v) => v.map_or(Json::Null, float_json),
        Value::String(v) => v.map_or(Json::Null, |s| Json::String(*s)),
        Value::Char(v) => v.map_or(Json::Null, |c| Json::String(c.to_string())),
        Value::Bytes(v) => v.map_or(Json::Null, |b| {
            Json::String(String::from_utf8_lossy(&b).into_owned())
        }),
        Value::Json(v) => v.map_or(Json::Null, |j| *j),
        Value::ChronoDate(v) => v.map_or(Json::Null, |d| Json::String(d.to_string())),
        Value::ChronoTime(v) => v.map_or(Json::Null, |t| Json::String(t.to_string())),
        Value::ChronoDateTime(v) => v.map_or(Json::Null, |dt| {
            Json::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }),
        Value::ChronoDateTimeUtc(v) => v.map_or(Json::Null, |dt| Json::String(dt.to_rfc3339())),
        Value::ChronoDateTimeLocal(v) => v.map_or(Json::Null, |dt| Json::String(dt.to_rfc3339())),
        Value::ChronoDateTimeWithTimeZone(v) => {
            v.map_or(Json::Null, |dt| Json::String(dt.to_rfc3339()))
        }
        Value::Uuid(v) => v.map_or(Json::Null, |u| Json::String(u.to_string())),
        Value::Decimal(v) => v.map_or(Json::Null, |d| Json::String(d.to_string())),
        #[cfg(feature = "pg")]
        Value::Array(_, v) => v.map_or(Json::Null, |items| {
            Json::Array((*items).into_iter().map(value_to_json).collect())
        }),
    }
}

/// Column values of `model` keyed by column name.
pub fn model_to_record<E: EntityTrait>(model: &E::Model, columns: &[ColumnInfo<E>]) -> Record {
    columns
        .iter()
        .map(|c| (c.name.clone(), value_to_json(model.get(c.column))))
        .collect()
}

/// Stable string key for grouping values read from different sources.
#[must_use]
pub fn json_key(json: &Json) -> String {
    match json {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}
