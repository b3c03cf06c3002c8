//! Format records and values for display (indented tree text, hex).

use crate::record::Record;
use crate::value::Value;
use std::fmt::Write;

/// Lowercase hex, two digits per byte, no separators.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Parse hex text. Whitespace and an optional `0x` prefix are ignored.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits: String = text.split_whitespace().collect();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(&digits);
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(format!("invalid hex digit {:?}", bad));
    }
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| format!("invalid hex at {}: {}", i, e))
        })
        .collect()
}

/// One-line rendering of a scalar; lists and records are summarized.
pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Integer(n) => n.to_string(),
        Value::String(s) => format!("{:?}", s),
        Value::Bytes(b) => format!("0x{}", hex(b)),
        Value::List(items) => format!("[{}]", items.len()),
        Value::Record(r) => r.record_type().name().to_string(),
    }
}

/// Render a record as an indented tree, one field per line:
///
/// ```text
/// Polygon
///   name: "square"
///   points: [2]
///     #0: Point
///       x: 0
///       y: 0
///     #1: <none>
///   closed: true
/// ```
pub fn format_record(record: &Record) -> String {
    let mut out = String::new();
    out.push_str(record.record_type().name());
    out.push('\n');
    write_fields(&mut out, record, 1);
    out
}

fn write_fields(out: &mut String, record: &Record, depth: usize) {
    for (name, value) in record.iter() {
        write_entry(out, name, value, depth);
    }
}

fn write_entry(out: &mut String, label: &str, value: Option<&Value>, depth: usize) {
    let indent = "  ".repeat(depth);
    let Some(value) = value else {
        let _ = writeln!(out, "{}{}: <none>", indent, label);
        return;
    };
    let _ = writeln!(out, "{}{}: {}", indent, label, format_scalar(value));
    match value {
        Value::List(items) => {
            for (i, item) in items.iter().enumerate() {
                write_entry(out, &format!("#{}", i), item.as_ref(), depth + 1);
            }
        }
        Value::Record(r) => write_fields(out, r, depth + 1),
        _ => {}
    }
}
