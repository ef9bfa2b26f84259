//! Decode a stream of logfmt records and re-encode it, normalized.
//!
//! Run with: `cargo run --example roundtrip`

use std::io;

use logfmt::{Decoder, Encoder, Value};

const INPUT: &str = "\
level=info msg=\"server started\" port=8080
level=warn msg=\"disk usage high\" disk=92% threshold=90%
level=error msg=\"request failed\" err=\"connection reset by peer\" retry
";

fn main() -> logfmt::Result<()> {
    let mut dec = Decoder::new(INPUT.as_bytes());
    let stdout = io::stdout();
    let mut enc = Encoder::new(stdout.lock());

    while dec.advance_record()? {
        loop {
            let key = match dec.scan_key() {
                Some(key) => key.to_vec(),
                None => break,
            };
            let owned = dec.scan_value().map(<[u8]>::to_vec);
            let value = match &owned {
                Some(v) => Value::from(v.as_slice()),
                None => Value::Nil,
            };
            enc.encode_keyval(key.as_slice(), value)?;
        }
        if let Some(err) = dec.last_error() {
            eprintln!("skipping rest of malformed record: {err}");
        }
        enc.end_record()?;
    }
    Ok(())
}
