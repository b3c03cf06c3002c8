//! Integration tests: declare record types, construct, serialize, deserialize,
//! and check validation failures end to end.

use recordwire::{
    DecodeErrorKind, FieldDescriptor, Record, RecordType, SchemaError, ValidationError,
    ValidationErrorKind, Value,
};

fn point_type() -> RecordType {
    RecordType::builder("Point")
        .field("x", FieldDescriptor::signed_integer())
        .field("y", FieldDescriptor::signed_integer())
        .field("label", FieldDescriptor::string().optional())
        .build()
        .expect("declare Point")
}

fn person_type() -> RecordType {
    RecordType::declare(
        "Person",
        vec![
            ("name", FieldDescriptor::string_with_max(8)),
            ("age", FieldDescriptor::integer().optional()),
        ],
    )
    .expect("declare Person")
}

fn team_type(person: &RecordType) -> RecordType {
    RecordType::builder("Team")
        .field("title", FieldDescriptor::string())
        .field("members", FieldDescriptor::list(FieldDescriptor::record(person)))
        .field("lead", FieldDescriptor::record(person).optional())
        .build()
        .expect("declare Team")
}

#[test]
fn test_point_wire_bytes() {
    let point = point_type();
    let p = point.make([("x", 3), ("y", -4)]).expect("make");
    let encoded = p.serialize().expect("serialize");
    assert_eq!(encoded, vec![0x01, 0x01, 0x03, 0x01, 0xFC, 0x00]);

    let decoded = point.deserialize(&encoded).expect("deserialize");
    assert_eq!(decoded, p);
    assert_eq!(decoded.get("label"), None);
    assert_eq!(decoded.get("x").and_then(Value::as_i64), Some(3));
    assert_eq!(decoded.get("y").and_then(Value::as_i64), Some(-4));
}

#[test]
fn test_round_trip_nested() {
    let person = person_type();
    let team = team_type(&person);
    let alice = person.make([("name", Value::from("alice")), ("age", Value::from(34))]).unwrap();
    let bob = person.make([("name", "bob")]).unwrap();
    let t = team
        .make([
            ("title", Value::from("core")),
            (
                "members",
                Value::List(vec![Some(alice.clone().into()), Some(bob.into())]),
            ),
            ("lead", alice.into()),
        ])
        .unwrap();
    let bytes = t.serialize().unwrap();
    assert_eq!(team.deserialize(&bytes).unwrap(), t);
}

#[test]
fn test_signed_integer_sign_safety() {
    let t = RecordType::declare("N", vec![("n", FieldDescriptor::signed_integer())]).unwrap();
    for n in [255i64, 256, 65535, -1, -256, i64::MAX, i64::MIN] {
        let r = t.make([("n", n)]).unwrap();
        let back = t.deserialize(&r.serialize().unwrap()).unwrap();
        assert_eq!(back.get("n").and_then(Value::as_i64), Some(n), "n = {}", n);
    }
    let r = t.make([("n", 256)]).unwrap();
    assert_eq!(r.serialize().unwrap(), vec![0x01, 0x02, 0x01, 0x00]);
}

#[test]
fn test_absent_and_empty_are_distinct() {
    let t = RecordType::builder("Blob")
        .field("s", FieldDescriptor::string().optional())
        .field("b", FieldDescriptor::bytes().optional())
        .build()
        .unwrap();

    let absent = t.make_empty().unwrap();
    let bytes = absent.serialize().unwrap();
    assert_eq!(bytes, vec![0x01, 0x00, 0x00]);
    let back = t.deserialize(&bytes).unwrap();
    assert_eq!(back.get("s"), None);
    assert_eq!(back.get("b"), None);

    let empty = t.make([("s", Value::from("")), ("b", Value::Bytes(Vec::new()))]).unwrap();
    let bytes = empty.serialize().unwrap();
    assert_eq!(bytes, vec![0x01, 0x01, 0x01, 0x01, 0x01]);
    let back = t.deserialize(&bytes).unwrap();
    assert_eq!(back.get("s").and_then(Value::as_str), Some(""));
    assert_eq!(back.get("b").and_then(Value::as_bytes), Some(&[][..]));
    assert_ne!(back, absent);
}

#[test]
fn test_required_field_rejected() {
    let err = point_type().make([("x", 1)]).unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::Missing);
    assert_eq!(err.path.field_names().collect::<Vec<_>>(), vec!["y"]);
    assert_eq!(err.to_string(), "y: value is required");
}

#[test]
fn test_defaults_fill_unsupplied_fields() {
    let t = RecordType::builder("Config")
        .field("name", FieldDescriptor::string().with_default("unnamed"))
        .field("retries", FieldDescriptor::integer().with_default(3u8))
        .field("tags", FieldDescriptor::list(FieldDescriptor::string()).with_default_fn(|| Value::List(Vec::new())))
        .build()
        .unwrap();
    let c = t.make_empty().unwrap();
    assert_eq!(c.get("name").and_then(Value::as_str), Some("unnamed"));
    assert_eq!(c.get("retries").and_then(Value::as_u64), Some(3));
    assert_eq!(c.get("tags").and_then(Value::as_list).map(|l| l.len()), Some(0));
}

#[test]
fn test_wrong_record_type_rejected() {
    let person = person_type();
    let team = team_type(&person);
    let p = point_type().make([("x", 1), ("y", 2)]).unwrap();
    let err = team
        .make([
            ("title", Value::from("t")),
            ("members", Value::List(vec![Some(p.into())])),
        ])
        .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("inner element"), "{}", text);
    assert!(text.starts_with("members: "), "{}", text);
    assert!(matches!(err.kind, ValidationErrorKind::WrongType { .. }));
}

#[test]
fn test_nested_path_on_decode() {
    let person = person_type();
    let team = team_type(&person);
    // Person { name: "ok", age: absent } and Person { name: absent, age: absent }
    let ok = vec![0x01, 0x03, 0x01, b'o', b'k', 0x00];
    let missing_name = vec![0x01, 0x00, 0x00];
    let mut members = vec![0x01, ok.len() as u8];
    members.extend_from_slice(&ok);
    members.push(missing_name.len() as u8);
    members.extend_from_slice(&missing_name);
    let mut bytes = vec![0x01, 0x02, 0x01, b't', members.len() as u8];
    bytes.extend_from_slice(&members);
    bytes.push(0x00);

    let err = team.deserialize(&bytes).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("inner element"), "{}", text);
    assert!(text.contains("name"), "{}", text);
    assert_eq!(text, "members: inner element #1: name: value is required");
    assert_eq!(err.kind, DecodeErrorKind::Invalid(ValidationErrorKind::Missing));
    assert_eq!(err.path.field_names().collect::<Vec<_>>(), vec!["members", "name"]);
}

#[test]
fn test_max_length_enforced_on_decode() {
    let person = person_type();
    let long = "abcdefghij";
    let mut bytes = vec![0x01, (long.len() + 1) as u8, 0x01];
    bytes.extend_from_slice(long.as_bytes());
    bytes.push(0x00);
    let err = person.deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind, DecodeErrorKind::Invalid(ValidationErrorKind::TooLong { len: 10, max: 8 }));
    assert_eq!(err.to_string(), "name: length 10 exceeds max_length 8");
}

#[test]
fn test_truncated_input() {
    let point = point_type();
    let p = point.make([("x", 300), ("y", -4)]).unwrap();
    let bytes = p.serialize().unwrap();
    for cut in 0..bytes.len() {
        assert!(point.deserialize(&bytes[..cut]).is_err(), "cut at {}", cut);
    }
    // declared length larger than what is left
    let err = point.deserialize(&[0x01, 0x05, 0x01]).unwrap_err();
    assert_eq!(err.kind, DecodeErrorKind::Truncated { needed: 5, available: 1 });
    assert_eq!(err.path.field_names().collect::<Vec<_>>(), vec!["x"]);
}

#[test]
fn test_trailing_bytes_rejected() {
    let point = point_type();
    let mut bytes = point.make([("x", 1), ("y", 2)]).unwrap().serialize().unwrap();
    bytes.push(0x00);
    assert_eq!(
        point.deserialize(&bytes).unwrap_err().kind,
        DecodeErrorKind::TrailingBytes(1)
    );
}

#[test]
fn test_bad_record_marker() {
    let err = point_type().deserialize(&[0x02, 0x01, 0x01, 0x01, 0x01, 0x00]).unwrap_err();
    assert_eq!(err.kind, DecodeErrorKind::BadMarker(0x02));
}

#[test]
fn test_record_check_runs_on_decode() {
    let span = RecordType::builder("Span")
        .field("start", FieldDescriptor::integer())
        .field("end", FieldDescriptor::integer())
        .check(|r: &Record| {
            let start = r.get("start").and_then(Value::as_u64);
            let end = r.get("end").and_then(Value::as_u64);
            if start > end {
                return Err(ValidationError::rejected("end before start").within_field("end"));
            }
            Ok(())
        })
        .build()
        .unwrap();
    assert!(span.make([("start", 5), ("end", 2)]).is_err());
    // start = 5, end = 2 on the wire
    let err = span.deserialize(&[0x01, 0x01, 0x05, 0x01, 0x02]).unwrap_err();
    assert_eq!(err.to_string(), "end: end before start");
}

#[test]
fn test_long_string_uses_escaped_length() {
    let t = RecordType::declare("Doc", vec![("body", FieldDescriptor::string())]).unwrap();
    let body = "x".repeat(70_000);
    let r = t.make([("body", body.as_str())]).unwrap();
    let bytes = r.serialize().unwrap();
    // 70_001 = 0x011171, three length bytes after escape 252
    assert_eq!(&bytes[..5], &[0x01, 252, 0x01, 0x11, 0x71]);
    assert_eq!(t.deserialize(&bytes).unwrap(), r);
}

#[test]
fn test_unknown_field_in_make() {
    let err = point_type().make([("z", 1)]).unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::UnknownField("z".to_string()));
}

#[test]
fn test_duplicate_field_declaration() {
    let err = RecordType::builder("D")
        .field("a", FieldDescriptor::boolean())
        .field("a", FieldDescriptor::boolean())
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateField { .. }));
}

#[test]
fn test_record_types_shared_across_threads() {
    let point = point_type();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let point = point.clone();
            std::thread::spawn(move || {
                let p = point.make([("x", i), ("y", -i)]).unwrap();
                point.deserialize(&p.serialize().unwrap()).unwrap() == p
            })
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
}
