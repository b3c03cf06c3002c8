//! Encode/decode values against their field descriptors.
//!
//! Every payload self-frames: booleans are one byte, integers at least one
//! byte, and bytes/strings/lists/records start with the marker `0x01`. That
//! keeps `0x00` free to mean "absent" wherever a length prefix is expected.
//!
//! ```text
//! Record     := 0x01 FieldEntry*        (one entry per schema field)
//! List       := 0x01 FieldEntry*        (one entry per element)
//! FieldEntry := 0x00 | VarLen Payload
//! ```

use crate::descriptor::{FieldDescriptor, FieldKind};
use crate::error::{DecodeError, DecodeErrorKind, EncodeError};
use crate::record::Record;
use crate::schema::RecordType;
use crate::value::Value;
use crate::varint;
use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;
use tracing::{debug, trace};

/// Presence token for an absent field or list element.
pub const ABSENT: u8 = 0x00;

/// Leading byte of every bytes, string, list and record payload.
pub const MARKER: u8 = 0x01;

/// Widest integer payload accepted (128-bit storage).
pub const MAX_INTEGER_WIDTH: usize = 16;

impl FieldDescriptor {
    /// Encode a value of this descriptor's kind. The value is expected to have
    /// passed validation; a kind mismatch is reported rather than encoded.
    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        self.write_value(&mut out, value)?;
        Ok(out)
    }

    /// Decode one payload (without its length prefix).
    pub fn deserialize(&self, payload: &[u8]) -> Result<Value, DecodeError> {
        match self.kind() {
            FieldKind::Boolean => decode_bool(payload),
            FieldKind::Bytes => Ok(Value::Bytes(strip_marker(payload)?.to_vec())),
            FieldKind::String { .. } => {
                let raw = strip_marker(payload)?;
                let s = std::str::from_utf8(raw).map_err(|e| DecodeError::new(DecodeErrorKind::InvalidUtf8(e)))?;
                Ok(Value::String(s.to_string()))
            }
            FieldKind::Integer { signed } => decode_integer(payload, *signed).map(Value::Integer),
            FieldKind::List(inner) => decode_list(inner, payload),
            FieldKind::Record(t) => t.deserialize(payload).map(Value::Record),
        }
    }

    fn write_value(&self, w: &mut Vec<u8>, value: &Value) -> Result<(), EncodeError> {
        match (self.kind(), value) {
            (FieldKind::Boolean, Value::Bool(b)) => w.push(*b as u8),
            (FieldKind::Bytes, Value::Bytes(b)) => {
                w.push(MARKER);
                w.extend_from_slice(b);
            }
            (FieldKind::String { .. }, Value::String(s)) => {
                w.push(MARKER);
                w.extend_from_slice(s.as_bytes());
            }
            (FieldKind::Integer { signed }, Value::Integer(n)) => write_integer(w, *n, *signed)?,
            (FieldKind::List(inner), Value::List(items)) => {
                w.push(MARKER);
                for item in items {
                    write_entry(w, inner, item.as_ref())?;
                }
            }
            (FieldKind::Record(t), Value::Record(r)) if r.record_type() == t => write_record(w, r)?,
            _ => {
                return Err(EncodeError::Mismatch {
                    expected: self.type_name(),
                    found: value.kind_name(),
                })
            }
        }
        Ok(())
    }
}

impl Record {
    /// Wire form of this record.
    pub fn serialize(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        write_record(&mut out, self)?;
        Ok(out)
    }
}

impl RecordType {
    /// Decode a record and construct it through the full validation pipeline.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<Record, DecodeError> {
        self.decode_record(bytes).map_err(|e| {
            debug!(record = %self.name(), error = %e, "record decode failed");
            e
        })
    }

    fn decode_record(&self, bytes: &[u8]) -> Result<Record, DecodeError> {
        let body = strip_marker(bytes)?;
        let mut r = Cursor::new(body);
        let mut slots = Vec::with_capacity(self.schema().len());
        for (name, descriptor) in self.fields() {
            let entry = read_entry(&mut r).map_err(|e| e.within_field(name))?;
            let value = match entry {
                Some(payload) => Some(descriptor.deserialize(payload).map_err(|e| e.within_field(name))?),
                None => None,
            };
            trace!(record = %self.name(), field = name, present = value.is_some(), "decoded field");
            slots.push(value);
        }
        let rest = remaining(&r);
        if rest > 0 {
            return Err(DecodeError::new(DecodeErrorKind::TrailingBytes(rest)));
        }
        Ok(Record::construct(self.clone(), slots)?)
    }
}

fn write_record(w: &mut Vec<u8>, record: &Record) -> Result<(), EncodeError> {
    w.push(MARKER);
    for ((name, descriptor), slot) in record.record_type().fields().zip(record.slots()) {
        trace!(record = %record.record_type().name(), field = name, present = slot.is_some(), "encoding field");
        write_entry(w, descriptor, slot.as_ref())?;
    }
    Ok(())
}

/// Presence token, or length prefix plus payload.
fn write_entry(w: &mut Vec<u8>, descriptor: &FieldDescriptor, value: Option<&Value>) -> Result<(), EncodeError> {
    let Some(value) = value else {
        w.push(ABSENT);
        return Ok(());
    };
    let payload = descriptor.serialize(value)?;
    if payload.is_empty() {
        return Err(EncodeError::EmptyPayload);
    }
    varint::write_length(w, payload.len() as u64)?;
    w.extend_from_slice(&payload);
    Ok(())
}

fn remaining(r: &Cursor<&[u8]>) -> usize {
    r.get_ref().len().saturating_sub(r.position() as usize)
}

/// Read one entry; `None` for the absence token. The declared length is
/// checked against the bytes actually left.
fn read_entry<'a>(r: &mut Cursor<&'a [u8]>) -> Result<Option<&'a [u8]>, DecodeError> {
    let buf: &'a [u8] = *r.get_ref();
    let pos = r.position() as usize;
    let token = r.read_u8().map_err(|_| DecodeError::truncated(1, 0))?;
    if token == ABSENT {
        return Ok(None);
    }
    let (len, consumed) = varint::decode_usize(buf, pos)?;
    let start = pos + consumed;
    let available = buf.len() - start;
    if len > available {
        return Err(DecodeError::truncated(len, available));
    }
    r.set_position((start + len) as u64);
    Ok(Some(&buf[start..start + len]))
}

fn strip_marker(payload: &[u8]) -> Result<&[u8], DecodeError> {
    match payload.split_first() {
        None => Err(DecodeError::new(DecodeErrorKind::EmptyPayload)),
        Some((&MARKER, rest)) => Ok(rest),
        Some((&b, _)) => Err(DecodeError::new(DecodeErrorKind::BadMarker(b))),
    }
}

fn decode_bool(payload: &[u8]) -> Result<Value, DecodeError> {
    match payload {
        [0] => Ok(Value::Bool(false)),
        [1] => Ok(Value::Bool(true)),
        [b] => Err(DecodeError::new(DecodeErrorKind::InvalidBoolean(*b))),
        _ => Err(DecodeError::new(DecodeErrorKind::BooleanWidth(payload.len()))),
    }
}

fn decode_list(inner: &FieldDescriptor, payload: &[u8]) -> Result<Value, DecodeError> {
    let body = strip_marker(payload)?;
    let mut r = Cursor::new(body);
    let mut items = Vec::new();
    while remaining(&r) > 0 {
        let index = items.len();
        let item = match read_entry(&mut r).map_err(|e| e.within_element(index))? {
            Some(p) => Some(inner.deserialize(p).map_err(|e| e.within_element(index))?),
            None => None,
        };
        items.push(item);
    }
    Ok(Value::List(items))
}

/// Bytes needed for `n`: two's complement when signed, magnitude otherwise.
/// Non-negative signed values whose bit length is a multiple of 8 get an
/// extra zero byte so they do not read back as negative.
pub fn integer_width(n: i128, signed: bool) -> usize {
    let bits = if signed {
        let magnitude = (if n < 0 { !n } else { n }) as u128;
        128 - magnitude.leading_zeros() as usize + 1
    } else {
        128 - (n as u128).leading_zeros() as usize
    };
    ((bits + 7) / 8).max(1)
}

fn write_integer(w: &mut Vec<u8>, n: i128, signed: bool) -> Result<(), EncodeError> {
    let width = integer_width(n, signed);
    // Vec<u8> writes are infallible.
    if signed {
        let _ = w.write_int128::<BigEndian>(n, width);
    } else if n < 0 {
        return Err(EncodeError::Mismatch {
            expected: "unsigned integer".to_string(),
            found: "negative integer".to_string(),
        });
    } else {
        let _ = w.write_uint128::<BigEndian>(n as u128, width);
    }
    Ok(())
}

fn decode_integer(payload: &[u8], signed: bool) -> Result<i128, DecodeError> {
    let width = payload.len();
    if width == 0 {
        return Err(DecodeError::new(DecodeErrorKind::EmptyPayload));
    }
    if width > MAX_INTEGER_WIDTH {
        return Err(DecodeError::new(DecodeErrorKind::IntegerTooWide(width)));
    }
    if signed {
        Ok(BigEndian::read_int128(payload, width))
    } else {
        i128::try_from(BigEndian::read_uint128(payload, width))
            .map_err(|_| DecodeError::new(DecodeErrorKind::IntegerTooWide(width)))
    }
}
