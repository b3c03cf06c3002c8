//! Error types with explicit field paths.
//!
//! Nested failures carry the chain of field names (and list element indices)
//! from the outermost record down to the failing leaf. The chain is kept
//! structured and only rendered to text by `Display`, as
//! `outer: inner element #2: leaf: message`.

use std::fmt;
use std::path::PathBuf;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named field of a record.
    Field(String),
    /// An element of a list, by index.
    Element(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Element(index) => write!(f, "inner element #{}", index),
        }
    }
}

/// Ordered path from the outermost record to the failing value.
///
/// Displays as a prefix: every segment is followed by `": "`, so an empty
/// path renders as nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names along the path, skipping element indices.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|s| match s {
            PathSegment::Field(name) => Some(name.as_str()),
            PathSegment::Element(_) => None,
        })
    }

    fn prepend(&mut self, segment: PathSegment) {
        self.0.insert(0, segment);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "{}: ", segment)?;
        }
        Ok(())
    }
}

/// What a schema check found wrong with a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationErrorKind {
    #[error("value is required")]
    Missing,
    #[error("expected {expected}, found {found}")]
    WrongType { expected: String, found: String },
    #[error("length {len} exceeds max_length {max}")]
    TooLong { len: usize, max: usize },
    #[error("unsigned integer cannot be negative (got {0})")]
    Negative(i128),
    #[error("no field named `{0}`")]
    UnknownField(String),
    #[error("{0}")]
    Rejected(String),
}

/// A value does not satisfy its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}{kind}")]
pub struct ValidationError {
    pub path: FieldPath,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind) -> Self {
        ValidationError { path: FieldPath::default(), kind }
    }

    /// A failed semantic check with a free-form message (used by record-level checks).
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::Rejected(message.into()))
    }

    /// Prepend a field name to the path.
    pub fn within_field(mut self, name: &str) -> Self {
        self.path.prepend(PathSegment::Field(name.to_string()));
        self
    }

    /// Prepend a list element index to the path.
    pub fn within_element(mut self, index: usize) -> Self {
        self.path.prepend(PathSegment::Element(index));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("truncated input: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("length {0} does not fit in memory")]
    LengthOverflow(u64),
    #[error("expected value marker 0x01, found {0:#04x}")]
    BadMarker(u8),
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBoolean(u8),
    #[error("boolean payload must be 1 byte, got {0}")]
    BooleanWidth(usize),
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(std::str::Utf8Error),
    #[error("empty payload")]
    EmptyPayload,
    #[error("integer of {0} bytes does not fit in 128 bits")]
    IntegerTooWide(usize),
    #[error("{0} trailing bytes after last field")]
    TrailingBytes(usize),
    #[error("{0}")]
    Invalid(ValidationErrorKind),
}

/// Bytes could not be decoded into a valid value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}{kind}")]
pub struct DecodeError {
    pub path: FieldPath,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind) -> Self {
        DecodeError { path: FieldPath::default(), kind }
    }

    pub fn truncated(needed: usize, available: usize) -> Self {
        Self::new(DecodeErrorKind::Truncated { needed, available })
    }

    pub fn within_field(mut self, name: &str) -> Self {
        self.path.prepend(PathSegment::Field(name.to_string()));
        self
    }

    pub fn within_element(mut self, index: usize) -> Self {
        self.path.prepend(PathSegment::Element(index));
        self
    }
}

impl From<ValidationError> for DecodeError {
    fn from(e: ValidationError) -> Self {
        DecodeError { path: e.path, kind: DecodeErrorKind::Invalid(e.kind) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("length {0} needs more than 6 length bytes")]
    LengthTooLarge(u64),
    #[error("refusing to frame an empty payload (0x00 is the absence marker)")]
    EmptyPayload,
    #[error("cannot encode {found} as {expected}")]
    Mismatch { expected: String, found: String },
}

/// Errors declaring or loading record types.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("record {record}: duplicate field `{field}`")]
    DuplicateField { record: String, field: String },
    #[error("duplicate record name: {0}")]
    DuplicateRecord(String),
    #[error("unknown record: {0}")]
    UnknownRecord(String),
    #[error("record {record}: default for `{field}` is invalid: {source}")]
    InvalidDefault {
        record: String,
        field: String,
        source: ValidationError,
    },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Any error produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
