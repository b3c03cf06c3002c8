//! Decode a binary record against a schema file and print it as a tree.
//!
//! Usage:
//!   recordwire [OPTIONS] SCHEMA.rw RECORD [HEX]
//!   recordwire [OPTIONS] SCHEMA.rw RECORD < record.bin
//!
//! With HEX given, the record bytes are read from it (whitespace and `0x`
//! allowed); otherwise raw bytes are read from stdin.
//!
//! Options:
//!   --reencode, -r   Also print the re-serialized record as hex
//!
//! Log verbosity follows `RUST_LOG` (default `warn`); logs go to stderr.

use anyhow::Context;
use recordwire::dump::{format_record, hex, parse_hex};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!("usage: recordwire [--reencode] SCHEMA RECORD [HEX]");
    std::process::exit(1);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let reencode = if let Some(pos) = args.iter().position(|a| a == "--reencode" || a == "-r") {
        args.remove(pos);
        true
    } else {
        false
    };
    let mut args = args.into_iter();
    let (schema_path, record_name) = match (args.next(), args.next()) {
        (Some(s), Some(r)) => (s, r),
        _ => usage(),
    };
    let hex_arg = args.next();
    if args.next().is_some() {
        usage();
    }

    let schemas = recordwire::load(&schema_path).with_context(|| format!("loading schema {}", schema_path))?;
    let record_type = schemas.require(&record_name)?;

    let bytes = match hex_arg {
        Some(text) => parse_hex(&text).map_err(|e| anyhow::anyhow!(e))?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).context("reading stdin")?;
            buf
        }
    };

    let record = record_type
        .deserialize(&bytes)
        .with_context(|| format!("decoding {} ({} bytes)", record_name, bytes.len()))?;
    print!("{}", format_record(&record));
    if reencode {
        println!("{}", hex(&record.serialize()?));
    }
    Ok(())
}
