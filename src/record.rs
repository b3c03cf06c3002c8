//! Record instances: one validated value slot per declared field.

use crate::error::{ValidationError, ValidationErrorKind};
use crate::schema::RecordType;
use crate::value::Value;
use std::fmt;

/// A live value of exactly one [`RecordType`].
///
/// Every non-optional field holds a validated value at all times. Assignments
/// go through the same pipeline as construction; a rejected assignment leaves
/// the record as it was.
#[derive(Clone, PartialEq)]
pub struct Record {
    record_type: RecordType,
    values: Vec<Option<Value>>,
}

impl Record {
    /// Validate `slots` (one per schema field, in order) into a record.
    pub(crate) fn construct(record_type: RecordType, slots: Vec<Option<Value>>) -> Result<Record, ValidationError> {
        let mut values = Vec::with_capacity(slots.len());
        for ((name, descriptor), slot) in record_type.fields().zip(slots) {
            values.push(descriptor.resolve(slot).map_err(|e| e.within_field(name))?);
        }
        let mut record = Record { record_type, values };
        record.record_type.run_check(&record)?;
        let record_type = record.record_type.clone();
        record_type.run_post_init(&mut record)?;
        Ok(record)
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    /// Value of a field; `None` when the field is absent or not declared.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let i = self.record_type.schema().index_of(name)?;
        self.values[i].as_ref()
    }

    /// Assign a field, re-running validation and the whole-record check.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ValidationError> {
        self.assign(name, Some(value.into()))
    }

    /// Reset a field to absent; it then takes its default, or fails if required.
    pub fn clear(&mut self, name: &str) -> Result<(), ValidationError> {
        self.assign(name, None)
    }

    fn assign(&mut self, name: &str, value: Option<Value>) -> Result<(), ValidationError> {
        let i = self
            .record_type
            .schema()
            .index_of(name)
            .ok_or_else(|| ValidationError::new(ValidationErrorKind::UnknownField(name.to_string())))?;
        let (_, descriptor) = self.record_type.schema().at(i);
        let resolved = descriptor.resolve(value).map_err(|e| e.within_field(name))?;
        let previous = std::mem::replace(&mut self.values[i], resolved);
        if let Err(e) = self.record_type.run_check(self) {
            self.values[i] = previous;
            return Err(e);
        }
        Ok(())
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.record_type
            .fields()
            .zip(self.values.iter())
            .map(|((name, _), v)| (name, v.as_ref()))
    }

    pub fn into_values(self) -> Vec<(String, Option<Value>)> {
        self.record_type
            .fields()
            .map(|(name, _)| name.to_string())
            .zip(self.values)
            .collect()
    }

    pub(crate) fn slots(&self) -> &[Option<Value>] {
        &self.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.record_type.name());
        for (name, value) in self.iter() {
            s.field(name, &value);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDescriptor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn range() -> RecordType {
        RecordType::builder("Range")
            .field("lo", FieldDescriptor::signed_integer())
            .field("hi", FieldDescriptor::signed_integer())
            .check(|r| {
                let lo = r.get("lo").and_then(Value::as_i128);
                let hi = r.get("hi").and_then(Value::as_i128);
                match (lo, hi) {
                    (Some(lo), Some(hi)) if lo > hi => Err(ValidationError::rejected("lo must not exceed hi").within_field("lo")),
                    _ => Ok(()),
                }
            })
            .build()
            .unwrap()
    }

    #[test]
    fn failed_assignment_keeps_previous_value() {
        let mut r = range().make([("lo", 1), ("hi", 5)]).unwrap();
        assert!(r.set("hi", "five").is_err());
        assert_eq!(r.get("hi"), Some(&Value::Integer(5)));

        let err = r.set("lo", 9).unwrap_err();
        assert_eq!(err.to_string(), "lo: lo must not exceed hi");
        assert_eq!(r.get("lo"), Some(&Value::Integer(1)));

        r.set("lo", 4).unwrap();
        assert_eq!(r.get("lo"), Some(&Value::Integer(4)));
    }

    #[test]
    fn clearing_required_field_fails() {
        let mut r = range().make([("lo", 1), ("hi", 5)]).unwrap();
        let err = r.clear("hi").unwrap_err();
        assert_eq!(err.to_string(), "hi: value is required");
        assert_eq!(r.get("hi"), Some(&Value::Integer(5)));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut r = range().make([("lo", 1), ("hi", 5)]).unwrap();
        let err = r.set("mid", 3).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::UnknownField("mid".into()));
    }

    #[test]
    fn post_init_runs_once_per_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let t = RecordType::builder("Counted")
            .field("n", FieldDescriptor::integer().with_default(0u8))
            .post_init(move |r| {
                seen.fetch_add(1, Ordering::SeqCst);
                r.set("n", 42)
            })
            .build()
            .unwrap();
        let r = t.make_empty().unwrap();
        assert_eq!(r.get("n").and_then(Value::as_u64), Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn iter_follows_declaration_order() {
        let r = range().make([("hi", 2), ("lo", 1)]).unwrap();
        let names: Vec<&str> = r.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["lo", "hi"]);
        let owned = r.into_values();
        assert_eq!(owned[1], ("hi".to_string(), Some(Value::Integer(2))));
    }
}
