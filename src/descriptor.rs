//! Field descriptors: the kind and fixed configuration of one value slot.

use crate::schema::RecordType;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Zero-argument producer for a field default.
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Default substituted when a field or list element is `None`.
#[derive(Clone)]
pub enum DefaultValue {
    Constant(Value),
    /// Called once per substitution, so each instance gets a fresh value.
    Producer(DefaultFn),
}

impl DefaultValue {
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Constant(v) => v.clone(),
            DefaultValue::Producer(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            DefaultValue::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Value kind plus kind-specific options.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Boolean,
    Bytes,
    /// `max_length` counts Unicode scalar values.
    String { max_length: Option<usize> },
    Integer { signed: bool },
    List(Box<FieldDescriptor>),
    Record(RecordType),
}

/// Describes one value slot: its kind, whether it may be absent, and its default.
///
/// Built by value (`FieldDescriptor::string().optional()`); once placed in a
/// record type it is frozen and shared read-only.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    kind: FieldKind,
    optional: bool,
    default: Option<DefaultValue>,
}

impl FieldDescriptor {
    pub fn new(kind: FieldKind) -> Self {
        FieldDescriptor { kind, optional: false, default: None }
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn bytes() -> Self {
        Self::new(FieldKind::Bytes)
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String { max_length: None })
    }

    pub fn string_with_max(max_length: usize) -> Self {
        Self::new(FieldKind::String { max_length: Some(max_length) })
    }

    /// Unsigned integer.
    pub fn integer() -> Self {
        Self::new(FieldKind::Integer { signed: false })
    }

    pub fn signed_integer() -> Self {
        Self::new(FieldKind::Integer { signed: true })
    }

    pub fn list(inner: FieldDescriptor) -> Self {
        Self::new(FieldKind::List(Box::new(inner)))
    }

    pub fn record(record_type: &RecordType) -> Self {
        Self::new(FieldKind::Record(record_type.clone()))
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Constant(value.into()));
        self
    }

    pub fn with_default_fn<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Producer(Arc::new(producer)));
        self
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Human-readable kind, e.g. `list<string>` or `record Point`.
    pub fn type_name(&self) -> String {
        match &self.kind {
            FieldKind::Boolean => "boolean".to_string(),
            FieldKind::Bytes => "bytes".to_string(),
            FieldKind::String { max_length: None } => "string".to_string(),
            FieldKind::String { max_length: Some(n) } => format!("string({})", n),
            FieldKind::Integer { signed: true } => "signed integer".to_string(),
            FieldKind::Integer { signed: false } => "unsigned integer".to_string(),
            FieldKind::List(inner) => format!("list<{}>", inner.type_name()),
            FieldKind::Record(t) => format!("record {}", t.name()),
        }
    }
}

impl From<RecordType> for FieldDescriptor {
    fn from(t: RecordType) -> Self {
        Self::new(FieldKind::Record(t))
    }
}

impl From<&RecordType> for FieldDescriptor {
    fn from(t: &RecordType) -> Self {
        Self::record(t)
    }
}
