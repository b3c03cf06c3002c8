//! Record types: an ordered, frozen set of named field descriptors.
//!
//! Field order is declaration order and is also the wire order; there are no
//! field tags. A record type is identified by its declaration: two types
//! declared with identical fields are still different types.

use crate::descriptor::{DefaultValue, FieldDescriptor};
use crate::error::{SchemaError, ValidationError, ValidationErrorKind};
use crate::record::Record;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Hook run on every freshly constructed instance, after validation.
pub type PostInitFn = Arc<dyn Fn(&mut Record) -> Result<(), ValidationError> + Send + Sync>;

/// Whole-record rule run after the per-field pipeline, on construction and on every assignment.
pub type RecordCheckFn = Arc<dyn Fn(&Record) -> Result<(), ValidationError> + Send + Sync>;

/// Ordered `(name, descriptor)` pairs with a name index.
#[derive(Debug)]
pub struct Schema {
    fields: Vec<(String, FieldDescriptor)>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index_of(name).map(|i| &self.fields[i].1)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn at(&self, index: usize) -> (&str, &FieldDescriptor) {
        let (n, d) = &self.fields[index];
        (n.as_str(), d)
    }
}

struct RecordTypeInner {
    name: String,
    schema: Schema,
    post_init: Option<PostInitFn>,
    check: Option<RecordCheckFn>,
}

/// A named schema plus optional construction hook and whole-record check.
///
/// Cheap to clone; clones share the declaration.
#[derive(Clone)]
pub struct RecordType {
    inner: Arc<RecordTypeInner>,
}

impl RecordType {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Declare a record type from an ordered list of fields.
    pub fn declare<I, N>(name: impl Into<String>, fields: I) -> Result<RecordType, SchemaError>
    where
        I: IntoIterator<Item = (N, FieldDescriptor)>,
        N: Into<String>,
    {
        fields
            .into_iter()
            .fold(SchemaBuilder::new(name), |b, (n, d)| b.field(n, d))
            .build()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.inner.schema.iter()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.inner.schema.get(name)
    }

    /// Same declaration (not merely the same shape).
    pub fn same_as(&self, other: &RecordType) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Construct a validated instance. Fields not supplied start as `None`
    /// and go through default substitution like any other assignment.
    pub fn make<I, K, V>(&self, values: I) -> Result<Record, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut slots: Vec<Option<Value>> = vec![None; self.schema().len()];
        for (name, value) in values {
            let name = name.as_ref();
            let i = self
                .schema()
                .index_of(name)
                .ok_or_else(|| ValidationError::new(ValidationErrorKind::UnknownField(name.to_string())))?;
            slots[i] = Some(value.into());
        }
        Record::construct(self.clone(), slots)
    }

    /// Construct an instance with every field left to its default.
    pub fn make_empty(&self) -> Result<Record, ValidationError> {
        Record::construct(self.clone(), vec![None; self.schema().len()])
    }

    pub(crate) fn run_check(&self, record: &Record) -> Result<(), ValidationError> {
        match &self.inner.check {
            Some(check) => check(record),
            None => Ok(()),
        }
    }

    pub(crate) fn run_post_init(&self, record: &mut Record) -> Result<(), ValidationError> {
        match &self.inner.post_init {
            Some(hook) => hook(record),
            None => Ok(()),
        }
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for RecordType {}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.inner.name)
            .field("fields", &self.inner.schema.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

/// Accumulates ordered `field(name, descriptor)` calls and freezes them into a [`RecordType`].
pub struct SchemaBuilder {
    name: String,
    fields: Vec<(String, FieldDescriptor)>,
    post_init: Option<PostInitFn>,
    check: Option<RecordCheckFn>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            post_init: None,
            check: None,
        }
    }

    pub fn field(mut self, name: impl Into<String>, descriptor: impl Into<FieldDescriptor>) -> Self {
        self.fields.push((name.into(), descriptor.into()));
        self
    }

    pub fn post_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Record) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.post_init = Some(Arc::new(hook));
        self
    }

    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&Record) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(check));
        self
    }

    /// Freeze the declaration. Rejects duplicate names and constant defaults
    /// that would fail their own field's validation.
    pub fn build(self) -> Result<RecordType, SchemaError> {
        let mut index = HashMap::with_capacity(self.fields.len());
        for (i, (field, descriptor)) in self.fields.iter().enumerate() {
            if index.insert(field.clone(), i).is_some() {
                return Err(SchemaError::DuplicateField {
                    record: self.name,
                    field: field.clone(),
                });
            }
            if let Some(DefaultValue::Constant(v)) = descriptor.default_value() {
                if let Err(source) = descriptor.resolve(Some(v.clone())) {
                    return Err(SchemaError::InvalidDefault {
                        record: self.name,
                        field: field.clone(),
                        source,
                    });
                }
            }
        }
        debug!(record = %self.name, fields = self.fields.len(), "declared record type");
        Ok(RecordType {
            inner: Arc::new(RecordTypeInner {
                name: self.name,
                schema: Schema { fields: self.fields, index },
                post_init: self.post_init,
                check: self.check,
            }),
        })
    }
}

/// Record types by name, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    types: Vec<RecordType>,
    by_name: HashMap<String, usize>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record_type: RecordType) -> Result<(), SchemaError> {
        let name = record_type.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(SchemaError::DuplicateRecord(name));
        }
        self.by_name.insert(name, self.types.len());
        self.types.push(record_type);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RecordType> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    /// Like [`get`](Self::get) but reports the missing name.
    pub fn require(&self, name: &str) -> Result<&RecordType, SchemaError> {
        self.get(name).ok_or_else(|| SchemaError::UnknownRecord(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
