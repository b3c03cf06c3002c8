//! Record decoder fuzz target: deserialize arbitrary bytes as a nested record.
//! Decoding must not panic, and anything that decodes must re-encode to a
//! record that decodes to the same value.
//! Build with: cargo fuzz run deserialize_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
const SCHEMA: &str = r#"
record Leaf {
	flag: bool?;
	n: int?;
	u: uint?;
	s: string(64)?;
	b: bytes?;
}

record Root {
	leaf: Leaf?;
	leaves: list<Leaf?>?;
	numbers: list<int>?;
}
"#;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let schemas = match recordwire::parse(SCHEMA) {
        Ok(s) => s,
        Err(_) => return,
    };
    let root = match schemas.get("Root") {
        Some(r) => r,
        None => return,
    };
    if let Ok(record) = root.deserialize(data) {
        let bytes = record.serialize().expect("decoded record re-encodes");
        let again = root.deserialize(&bytes).expect("re-encoded record decodes");
        assert_eq!(again, record);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run deserialize_fuzz");
}
