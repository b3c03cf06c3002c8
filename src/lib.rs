//! # recordwire: schema-declared binary records
//!
//! A compact, self-describing binary serialization framework. Record types are
//! declared in-process from an ordered list of named field descriptors; record
//! instances are validated on construction and on every assignment, so a live
//! instance always satisfies its schema.
//!
//! ## Wire format
//!
//! ```text
//! Record     := 0x01 FieldEntry*            one entry per schema field, in order
//! FieldEntry := 0x00 | VarLen Payload        0x00 = absent
//! List       := 0x01 FieldEntry*             one entry per element
//! VarLen     := B                            B in 0..=249
//!             | M B1..Bk                     M in 250..=255, k = M - 249, big-endian
//! Boolean    := 0x00 | 0x01
//! Bytes      := 0x01 RAW
//! String     := 0x01 UTF8
//! Integer    := minimal big-endian two's complement
//! ```
//!
//! Fields have no tags: declaration order is the wire order.
//!
//! ## Example
//!
//! ```
//! use recordwire::{FieldDescriptor, RecordType};
//!
//! let point = RecordType::builder("Point")
//!     .field("x", FieldDescriptor::signed_integer())
//!     .field("y", FieldDescriptor::signed_integer())
//!     .field("label", FieldDescriptor::string().optional())
//!     .build()
//!     .unwrap();
//!
//! let p = point.make([("x", 3), ("y", -4)]).unwrap();
//! let bytes = p.serialize().unwrap();
//! assert_eq!(bytes, [0x01, 0x01, 0x03, 0x01, 0xFC, 0x00]);
//! assert_eq!(point.deserialize(&bytes).unwrap(), p);
//! ```
//!
//! Schemas can also be written in a small text notation, see [`parser`].

pub mod codec;
pub mod descriptor;
pub mod dump;
pub mod error;
pub mod parser;
pub mod record;
pub mod schema;
pub mod validate;
pub mod value;
pub mod varint;

pub use descriptor::{DefaultValue, FieldDescriptor, FieldKind};
pub use error::{
    DecodeError, DecodeErrorKind, EncodeError, Error, FieldPath, PathSegment, SchemaError,
    ValidationError, ValidationErrorKind,
};
pub use parser::{load, parse};
pub use record::Record;
pub use schema::{RecordType, Schema, SchemaBuilder, SchemaSet};
pub use value::Value;
