//! Validation pipeline shared by every descriptor kind.
//!
//! Each assignment runs, in order:
//! 1. default substitution when the value is `None`,
//! 2. the optional check (`None` is only allowed for optional slots),
//! 3. the semantic check (`max_length`, unsigned range, whole-record check),
//! 4. the structural type check, which recurses into list elements.
//!
//! The pipeline takes the value by ownership and hands back the normalized
//! value, so a failure never leaves a half-updated value behind.

use crate::descriptor::{DefaultValue, FieldDescriptor, FieldKind};
use crate::error::{ValidationError, ValidationErrorKind};
use crate::value::Value;

impl FieldDescriptor {
    /// Run the full pipeline, returning the value to store.
    pub fn resolve(&self, value: Option<Value>) -> Result<Option<Value>, ValidationError> {
        let value = value.or_else(|| self.default_value().map(DefaultValue::produce));
        self.check_optional(&value)?;
        match value {
            None => Ok(None),
            Some(mut v) => {
                self.check(&v)?;
                self.check_type(&mut v)?;
                Ok(Some(v))
            }
        }
    }

    fn check_optional(&self, value: &Option<Value>) -> Result<(), ValidationError> {
        if value.is_none() && !self.is_optional() {
            return Err(ValidationError::new(ValidationErrorKind::Missing));
        }
        Ok(())
    }

    /// Semantic rules. A value of the wrong kind passes here and is caught by `check_type`.
    fn check(&self, value: &Value) -> Result<(), ValidationError> {
        match (self.kind(), value) {
            (FieldKind::String { max_length: Some(max) }, Value::String(s)) => {
                let len = s.chars().count();
                if len > *max {
                    return Err(ValidationError::new(ValidationErrorKind::TooLong { len, max: *max }));
                }
            }
            (FieldKind::Integer { signed: false }, Value::Integer(n)) if *n < 0 => {
                return Err(ValidationError::new(ValidationErrorKind::Negative(*n)));
            }
            (FieldKind::Record(t), Value::Record(r)) if r.record_type() == t => {
                t.run_check(r)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn check_type(&self, value: &mut Value) -> Result<(), ValidationError> {
        let matches = match (self.kind(), &mut *value) {
            (FieldKind::Boolean, Value::Bool(_)) => true,
            (FieldKind::Bytes, Value::Bytes(_)) => true,
            (FieldKind::String { .. }, Value::String(_)) => true,
            (FieldKind::Integer { .. }, Value::Integer(_)) => true,
            (FieldKind::Record(t), Value::Record(r)) => r.record_type() == t,
            (FieldKind::List(inner), Value::List(items)) => {
                for (i, item) in items.iter_mut().enumerate() {
                    *item = inner.resolve(item.take()).map_err(|e| e.within_element(i))?;
                }
                true
            }
            _ => false,
        };
        if !matches {
            return Err(ValidationError::new(ValidationErrorKind::WrongType {
                expected: self.type_name(),
                found: value.kind_name(),
            }));
        }
        Ok(())
    }
}
