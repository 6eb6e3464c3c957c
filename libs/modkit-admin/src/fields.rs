//! Field descriptors exposed by model views.

use serde::Serialize;

use crate::helpers::prettify_class_name;
use crate::request::RequestAction;

/// Logical kind of an admin field; drives form widgets, search and sorting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String,
    TextArea,
    Email,
    Url,
    Phone,
    Color,
    Integer,
    Decimal,
    Float,
    Boolean,
    DateTime,
    Date,
    Time,
    Uuid,
    Json,
    Enum { choices: Vec<String> },
    File { multiple: bool },
    /// Relationship to the view registered under `identity`.
    Relation { identity: String, multiple: bool },
}

impl FieldKind {
    /// Kinds whose values are matched by full-text search.
    #[must_use]
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            FieldKind::String
                | FieldKind::TextArea
                | FieldKind::Email
                | FieldKind::Url
                | FieldKind::Phone
                | FieldKind::Color
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[must_use]
#[allow(clippy::struct_excessive_bools)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub searchable: bool,
    pub orderable: bool,
    pub exclude_from_list: bool,
    pub exclude_from_detail: bool,
    pub exclude_from_create: bool,
    pub exclude_from_edit: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            label: prettify_class_name(&name),
            name,
            kind,
            required: false,
            searchable: false,
            orderable: false,
            exclude_from_list: false,
            exclude_from_detail: false,
            exclude_from_create: false,
            exclude_from_edit: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Hide the field for `action`. `Api` has no exclusion flag and is ignored.
    pub fn exclude_from(mut self, action: RequestAction) -> Self {
        self.set_excluded(action, true);
        self
    }

    pub fn set_excluded(&mut self, action: RequestAction, excluded: bool) {
        match action {
            RequestAction::List => self.exclude_from_list = excluded,
            RequestAction::Detail => self.exclude_from_detail = excluded,
            RequestAction::Create => self.exclude_from_create = excluded,
            RequestAction::Edit => self.exclude_from_edit = excluded,
            RequestAction::Api => {}
        }
    }

    #[must_use]
    pub fn is_excluded_from(&self, action: RequestAction) -> bool {
        match action {
            RequestAction::List => self.exclude_from_list,
            RequestAction::Detail => self.exclude_from_detail,
            RequestAction::Create => self.exclude_from_create,
            RequestAction::Edit => self.exclude_from_edit,
            RequestAction::Api => false,
        }
    }

    #[must_use]
    pub fn is_relation(&self) -> bool {
        matches!(self.kind, FieldKind::Relation { .. })
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self.kind, FieldKind::File { .. })
    }
}

/// Fields visible for `action`, in declaration order.
#[must_use]
pub fn extract_fields(fields: &[Field], action: RequestAction) -> Vec<&Field> {
    fields
        .iter()
        .filter(|f| !f.is_excluded_from(action))
        .collect()
}
