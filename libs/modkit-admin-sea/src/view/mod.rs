//! `ModelView` backed by a SeaORM entity.
//!
//! ```ignore
//! let view = SeaModelView::<post::Entity>::builder()
//!     .searchable_fields(["title", "body"])
//!     .fields_default_sort([("published_at", true)])
//!     .build()?;
//! registry.register(Arc::new(view))?;
//! ```

mod ops;

use std::collections::HashMap;
use std::marker::PhantomData;

use modkit_admin::helpers::{normalize_default_sort, normalize_list, prettify_class_name, slugify_class_name};
use modkit_admin::{AdminError, AdminResult, DefaultSort, Field, FieldKind, RequestAction};
use sea_orm::EntityTrait;

use crate::config::AdminConfig;
use crate::converter::{DefaultConverter, ModelConverter};
use crate::hooks::NoHooks;
use crate::inspect::{inspect, ColumnInfo, RelationInfo};

/// Admin view over the entity `E`, customised through the hooks `H`.
pub struct SeaModelView<E: EntityTrait, H = NoHooks> {
    identity: String,
    name: String,
    label: String,
    icon: Option<String>,
    table: String,
    columns: Vec<ColumnInfo<E>>,
    pk: ColumnInfo<E>,
    relations: Vec<RelationInfo>,
    fields: Vec<Field>,
    searchable_fields: Vec<String>,
    sortable_fields: Vec<String>,
    export_fields: Vec<String>,
    fields_default_sort: Vec<DefaultSort>,
    sortable_field_mapping: HashMap<String, String>,
    page_size: u64,
    page_size_options: Vec<u64>,
    hooks: H,
}

impl<E: EntityTrait> SeaModelView<E> {
    pub fn builder() -> SeaModelViewBuilder<E> {
        SeaModelViewBuilder::new()
    }

    /// View with every default.
    ///
    /// # Errors
    /// See [`SeaModelViewBuilder::build`].
    pub fn new() -> AdminResult<Self> {
        Self::builder().build()
    }
}

impl<E: EntityTrait, H> SeaModelView<E, H> {
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnInfo<E>] {
        &self.columns
    }

    #[must_use]
    pub fn relations(&self) -> &[RelationInfo] {
        &self.relations
    }

    #[must_use]
    pub fn export_fields(&self) -> &[String] {
        &self.export_fields
    }

    #[must_use]
    pub fn sortable_field_mapping(&self) -> &HashMap<String, String> {
        &self.sortable_field_mapping
    }

    #[must_use]
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub(crate) fn column(&self, name: &str) -> Option<&ColumnInfo<E>> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub(crate) fn relation(&self, name: &str) -> Option<&RelationInfo> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// Collects view options; [`SeaModelViewBuilder::build`] inspects the entity
/// and validates them.
#[must_use]
pub struct SeaModelViewBuilder<E: EntityTrait, H = NoHooks> {
    identity: Option<String>,
    name: Option<String>,
    label: Option<String>,
    icon: Option<String>,
    fields: Option<Vec<String>>,
    kinds: Vec<(String, FieldKind)>,
    labels: Vec<(String, String)>,
    exclude: Vec<(RequestAction, Vec<String>)>,
    searchable_fields: Option<Vec<String>>,
    sortable_fields: Option<Vec<String>>,
    export_fields: Option<Vec<String>>,
    fields_default_sort: Vec<DefaultSort>,
    sortable_field_mapping: HashMap<String, String>,
    page_size: u64,
    page_size_options: Vec<u64>,
    converter: Box<dyn ModelConverter>,
    hooks: H,
    _entity: PhantomData<fn() -> E>,
}

impl<E: EntityTrait> SeaModelViewBuilder<E> {
    fn new() -> Self {
        let defaults = AdminConfig::default();
        Self {
            identity: None,
            name: None,
            label: None,
            icon: None,
            fields: None,
            kinds: Vec::new(),
            labels: Vec::new(),
            exclude: Vec::new(),
            searchable_fields: None,
            sortable_fields: None,
            export_fields: None,
            fields_default_sort: Vec::new(),
            sortable_field_mapping: HashMap::new(),
            page_size: defaults.page_size,
            page_size_options: defaults.page_size_options,
            converter: Box::new(DefaultConverter),
            hooks: NoHooks,
            _entity: PhantomData,
        }
    }
}

/// Model name of `E`: the module declaring a SeaORM `Entity`, otherwise the
/// type name itself (`blog::post_tag::Entity` -> `post_tag`).
fn model_name<E>() -> &'static str {
    let path = std::any::type_name::<E>();
    let mut segments = path.rsplit("::");
    let last = segments.next().unwrap_or(path);
    if last == "Entity" {
        segments.next().unwrap_or(last)
    } else {
        last
    }
}

fn names<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items.into_iter().map(|s| s.as_ref().to_owned()).collect()
}

impl<E: EntityTrait, H> SeaModelViewBuilder<E, H> {
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Restrict and order the fields; defaults to every column then every relation.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fields = Some(names(fields));
        self
    }

    /// Override the kind picked by the converter, e.g. to declare a file field.
    pub fn field_kind(mut self, field: impl Into<String>, kind: FieldKind) -> Self {
        self.kinds.push((field.into(), kind));
        self
    }

    pub fn field_label(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.push((field.into(), label.into()));
        self
    }

    pub fn exclude_fields_from<I, S>(mut self, action: RequestAction, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude.push((action, names(fields)));
        self
    }

    pub fn exclude_fields_from_list<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_fields_from(RequestAction::List, fields)
    }

    pub fn exclude_fields_from_detail<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_fields_from(RequestAction::Detail, fields)
    }

    pub fn exclude_fields_from_create<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_fields_from(RequestAction::Create, fields)
    }

    pub fn exclude_fields_from_edit<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_fields_from(RequestAction::Edit, fields)
    }

    pub fn searchable_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.searchable_fields = Some(names(fields));
        self
    }

    pub fn sortable_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sortable_fields = Some(names(fields));
        self
    }

    pub fn export_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.export_fields = Some(names(fields));
        self
    }

    pub fn fields_default_sort<I, S>(mut self, sort: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<DefaultSort>,
    {
        self.fields_default_sort = normalize_default_sort(sort);
        self
    }

    /// Sort `field` by `column`; for a relation field the column belongs to the
    /// related table.
    pub fn sortable_field_mapping(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.sortable_field_mapping.insert(field.into(), column.into());
        self
    }

    pub fn with_config(mut self, config: &AdminConfig) -> Self {
        self.page_size = config.page_size;
        self.page_size_options.clone_from(&config.page_size_options);
        self
    }

    pub fn converter(mut self, converter: impl ModelConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn hooks<H2>(self, hooks: H2) -> SeaModelViewBuilder<E, H2> {
        SeaModelViewBuilder {
            identity: self.identity,
            name: self.name,
            label: self.label,
            icon: self.icon,
            fields: self.fields,
            kinds: self.kinds,
            labels: self.labels,
            exclude: self.exclude,
            searchable_fields: self.searchable_fields,
            sortable_fields: self.sortable_fields,
            export_fields: self.export_fields,
            fields_default_sort: self.fields_default_sort,
            sortable_field_mapping: self.sortable_field_mapping,
            page_size: self.page_size,
            page_size_options: self.page_size_options,
            converter: self.converter,
            hooks,
            _entity: PhantomData,
        }
    }

    /// Inspect the entity and assemble the view.
    ///
    /// # Errors
    /// `AdminError::InvalidModel` for a composite primary key or an option
    /// naming a field the view does not have.
    pub fn build(self) -> AdminResult<SeaModelView<E, H>> {
        let meta = inspect::<E>()?;
        let unknown = |what: &str, name: &str| {
            AdminError::InvalidModel(format!("{}: {what} names unknown field '{name}'", meta.table))
        };

        let mut all: Vec<Field> = Vec::with_capacity(meta.columns.len() + meta.relations.len());
        for col in &meta.columns {
            let generated = col.primary_key && meta.pk_auto_increment;
            let mut field = Field::new(col.name.clone(), self.converter.convert_column(&col.name, &col.col_type))
                .required(!col.nullable && !generated);
            if col.primary_key {
                field.set_excluded(RequestAction::Edit, true);
                field.set_excluded(RequestAction::Create, generated);
            }
            all.push(field);
        }
        for rel in &meta.relations {
            all.push(Field::new(rel.name.clone(), self.converter.convert_relation(rel)));
        }

        for (name, kind) in self.kinds {
            let field = all.iter_mut().find(|f| f.name == name).ok_or_else(|| unknown("field_kind", &name))?;
            field.kind = kind;
        }
        for (name, label) in self.labels {
            let field = all.iter_mut().find(|f| f.name == name).ok_or_else(|| unknown("field_label", &name))?;
            field.label = label;
        }

        let mut fields = match self.fields {
            Some(selected) => normalize_list(selected)
                .iter()
                .map(|name| {
                    all.iter()
                        .find(|f| &f.name == name)
                        .cloned()
                        .ok_or_else(|| unknown("fields", name))
                })
                .collect::<AdminResult<Vec<_>>>()?,
            None => all,
        };

        for (action, excluded) in self.exclude {
            for name in normalize_list(excluded) {
                let field = fields.iter_mut().find(|f| f.name == name).ok_or_else(|| unknown("exclude", &name))?;
                field.set_excluded(action, true);
            }
        }

        let plain: Vec<String> = fields
            .iter()
            .filter(|f| !f.is_relation() && !f.is_file())
            .map(|f| f.name.clone())
            .collect();
        let searchable_fields = normalize_list(self.searchable_fields.unwrap_or_else(|| plain.clone()));
        let sortable_fields = normalize_list(self.sortable_fields.unwrap_or(plain));
        let export_fields = normalize_list(
            self.export_fields
                .unwrap_or_else(|| fields.iter().map(|f| f.name.clone()).collect()),
        );
        for name in searchable_fields.iter().chain(&sortable_fields).chain(&export_fields) {
            if !fields.iter().any(|f| &f.name == name) {
                return Err(unknown("field list", name));
            }
        }
        for field in &mut fields {
            field.searchable = searchable_fields.contains(&field.name);
            field.orderable = sortable_fields.contains(&field.name);
        }

        for sort in &self.fields_default_sort {
            if !fields.iter().any(|f| f.name == sort.field) {
                return Err(unknown("fields_default_sort", &sort.field));
            }
        }
        for (field, column) in &self.sortable_field_mapping {
            if meta.relations.iter().any(|r| &r.name == field) {
                continue;
            }
            if !meta.columns.iter().any(|c| &c.name == column) {
                return Err(unknown("sortable_field_mapping", column));
            }
        }

        let table = meta.table;
        let name = self.name.unwrap_or_else(|| prettify_class_name(model_name::<E>()));
        let label = self.label.unwrap_or_else(|| format!("{name}s"));
        let identity = self.identity.unwrap_or_else(|| slugify_class_name(&table));

        Ok(SeaModelView {
            identity,
            name,
            label,
            icon: self.icon,
            table,
            columns: meta.columns,
            pk: meta.pk,
            relations: meta.relations,
            fields,
            searchable_fields,
            sortable_fields,
            export_fields,
            fields_default_sort: self.fields_default_sort,
            sortable_field_mapping: self.sortable_field_mapping,
            page_size: self.page_size,
            page_size_options: self.page_size_options,
            hooks: self.hooks,
        })
    }
}
