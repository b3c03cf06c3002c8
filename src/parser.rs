//! Parse record schema notation into record types using PEST.
//!
//! ```text
//! record Point {
//!     x: int;
//!     y: int;
//!     label: string(32)?;
//! }
//!
//! record Polygon {
//!     name: string = "unnamed";
//!     points: list<Point>;
//!     closed: bool = false;
//! }
//! ```
//!
//! `int` is a signed integer and `uint` an unsigned one. A trailing `?` marks a
//! field (or list element) optional; `= literal` sets a constant default.
//! Records may only refer to records declared earlier in the same source.

use crate::descriptor::{FieldDescriptor, FieldKind};
use crate::error::SchemaError;
use crate::schema::{RecordType, SchemaBuilder, SchemaSet};
use crate::value::Value;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::path::Path;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct SchemaParser;

fn parse_err(msg: impl Into<String>) -> SchemaError {
    SchemaError::Parse(msg.into())
}

/// Parse schema source into a set of record types.
pub fn parse(source: &str) -> Result<SchemaSet, SchemaError> {
    let pairs = SchemaParser::parse(Rule::schema, source).map_err(|e| parse_err(e.to_string()))?;
    let pair = pairs.into_iter().next().ok_or_else(|| parse_err("empty parse"))?;
    let mut set = SchemaSet::new();
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::record_def {
            let record_type = build_record(inner, &set)?;
            set.insert(record_type)?;
        }
    }
    Ok(set)
}

/// Read and parse a schema file.
pub fn load(path: impl AsRef<Path>) -> Result<SchemaSet, SchemaError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&source)
}

fn build_record(pair: Pair<Rule>, known: &SchemaSet) -> Result<RecordType, SchemaError> {
    let mut builder: Option<SchemaBuilder> = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => builder = Some(RecordType::builder(inner.as_str())),
            Rule::field_def => {
                let b = builder.take().ok_or_else(|| parse_err("record: field before name"))?;
                builder = Some(build_field(inner, b, known)?);
            }
            _ => {}
        }
    }
    builder.ok_or_else(|| parse_err("record: missing name"))?.build()
}

fn build_field(pair: Pair<Rule>, builder: SchemaBuilder, known: &SchemaSet) -> Result<SchemaBuilder, SchemaError> {
    let mut it = pair.into_inner();
    let name = it.next().ok_or_else(|| parse_err("field: name"))?.as_str();
    let type_pair = it.next().ok_or_else(|| parse_err("field: type"))?;
    let mut descriptor = build_field_type(type_pair, known)?;
    if let Some(lit) = it.next() {
        let value = literal_value(lit, descriptor.kind())?;
        descriptor = descriptor.with_default(value);
    }
    Ok(builder.field(name, descriptor))
}

fn build_field_type(pair: Pair<Rule>, known: &SchemaSet) -> Result<FieldDescriptor, SchemaError> {
    let mut it = pair.into_inner();
    let ty = it.next().ok_or_else(|| parse_err("field type: missing"))?;
    let mut descriptor = match ty.as_rule() {
        Rule::list_type => {
            let element = ty
                .into_inner()
                .find(|p| p.as_rule() == Rule::field_type)
                .ok_or_else(|| parse_err("list: element type"))?;
            FieldDescriptor::list(build_field_type(element, known)?)
        }
        Rule::string_type => match ty.into_inner().find(|p| p.as_rule() == Rule::number) {
            Some(n) => {
                let max = n
                    .as_str()
                    .parse()
                    .map_err(|e| parse_err(format!("string({}): {}", n.as_str(), e)))?;
                FieldDescriptor::string_with_max(max)
            }
            None => FieldDescriptor::string(),
        },
        Rule::scalar_type => match ty.as_str() {
            "bool" => FieldDescriptor::boolean(),
            "bytes" => FieldDescriptor::bytes(),
            "int" => FieldDescriptor::signed_integer(),
            "uint" => FieldDescriptor::integer(),
            other => return Err(parse_err(format!("unknown scalar type: {}", other))),
        },
        Rule::record_ref => FieldDescriptor::record(known.require(ty.as_str())?),
        other => return Err(parse_err(format!("field type: unexpected {:?}", other))),
    };
    if it.next().map(|p| p.as_rule()) == Some(Rule::optional_mark) {
        descriptor = descriptor.optional();
    }
    Ok(descriptor)
}

/// Literal default. String literals become bytes for `bytes` fields; any
/// other mismatch is left for the schema builder to reject.
fn literal_value(pair: Pair<Rule>, kind: &FieldKind) -> Result<Value, SchemaError> {
    let lit = pair.into_inner().next().ok_or_else(|| parse_err("literal: empty"))?;
    let text = lit.as_str();
    match lit.as_rule() {
        Rule::int_literal => text
            .parse::<i128>()
            .map(Value::Integer)
            .map_err(|e| parse_err(format!("integer literal {}: {}", text, e))),
        Rule::bool_literal => Ok(Value::Bool(text == "true")),
        Rule::string_literal => {
            let s = unescape(&text[1..text.len() - 1]);
            Ok(match kind {
                FieldKind::Bytes => Value::Bytes(s.into_bytes()),
                _ => Value::String(s),
            })
        }
        other => Err(parse_err(format!("literal: unexpected {:?}", other))),
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
