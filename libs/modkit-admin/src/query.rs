//! List query inputs: where clauses, order entries and default sort.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AdminError;

/// Restriction applied by `count` and `find_all`.
#[derive(Clone, Debug, PartialEq)]
pub enum Where {
    /// Structured filter object, e.g. `{"title": {"contains": "rust"}}`.
    Filter(serde_json::Value),
    /// Full-text search term.
    Search(String),
}

impl From<serde_json::Value> for Where {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(term) => Where::Search(term),
            other => Where::Filter(other),
        }
    }
}

impl From<&str> for Where {
    fn from(term: &str) -> Self {
        Where::Search(term.to_owned())
    }
}

/// One `ORDER BY` entry as sent by the list view: `"<field> asc|desc"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Parse a list of raw order entries.
    ///
    /// # Errors
    /// Returns `AdminError::InvalidQuery` on the first malformed entry.
    pub fn parse_list<I, S>(items: I) -> Result<Vec<OrderBy>, AdminError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        items.into_iter().map(|s| s.as_ref().parse()).collect()
    }
}

impl FromStr for OrderBy {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(2, char::is_whitespace);
        let field = parts.next().unwrap_or_default();
        let dir = parts.next().map(str::trim).unwrap_or_default();
        if field.is_empty() || dir.is_empty() {
            return Err(AdminError::InvalidQuery(format!(
                "order entry must be '<field> <asc|desc>': {s:?}"
            )));
        }
        Ok(Self {
            field: field.to_owned(),
            descending: dir.eq_ignore_ascii_case("desc"),
        })
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.descending { "desc" } else { "asc" };
        write!(f, "{} {dir}", self.field)
    }
}

/// Initial sort of the list view when the client does not pick one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultSort {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

impl From<&str> for DefaultSort {
    fn from(field: &str) -> Self {
        Self {
            field: field.to_owned(),
            descending: false,
        }
    }
}

impl From<(&str, bool)> for DefaultSort {
    fn from((field, descending): (&str, bool)) -> Self {
        Self {
            field: field.to_owned(),
            descending,
        }
    }
}

impl From<&DefaultSort> for OrderBy {
    fn from(s: &DefaultSort) -> Self {
        Self {
            field: s.field.clone(),
            descending: s.descending,
        }
    }
}
