//! Emit structured log lines with the push-model encoder.
//!
//! Run with: `cargo run --example logger`

use std::io;

use chrono::Utc;
use logfmt::Encoder;

fn main() -> logfmt::Result<()> {
    let stdout = io::stdout();
    let mut enc = Encoder::new(stdout.lock());

    let requests = [
        ("GET", "/", 200, 0.31),
        ("GET", "/static/app.css", 200, 0.08),
        ("POST", "/api/login", 401, 1.94),
    ];

    for (method, path, status, took_ms) in requests {
        let now = Utc::now();
        enc.encode_keyval("ts", &now)?;
        enc.encode_keyval("level", if status < 400 { "info" } else { "warn" })?;
        enc.encode_keyval("method", method)?;
        enc.encode_keyval("path", path)?;
        enc.encode_keyval("status", status)?;
        enc.encode_keyval("took_ms", took_ms)?;
        enc.end_record()?;
    }
    Ok(())
}
