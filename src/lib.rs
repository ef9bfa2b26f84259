//! # logfmt
//!
//! A streaming encoder and decoder for the logfmt structured-logging
//! format.
//!
//! ## What is logfmt?
//!
//! logfmt records key/value pairs in a way that balances readability for
//! humans and simplicity of computer parsing. Each record is one line of
//! whitespace-separated `key` or `key=value` tokens; values containing
//! spaces, `=`, or `"` are quoted with backslash escaping:
//!
//! ```text
//! level=info msg="listening on :8080" took_ms=1.25 peer=10.0.0.7
//! ```
//!
//! It is most commonly used as a more human friendly alternative to JSON
//! for structured logging.
//!
//! ## Decoding
//!
//! [`Decoder`] reads records from any [`std::io::Read`] source. The
//! low-level scan API yields zero-copy spans into its line buffer; the
//! owning layer collects [`Record`]s:
//!
//! ```rust
//! use logfmt::Decoder;
//!
//! let input = &b"level=info msg=\"server started\"\nlevel=warn disk=92%\n"[..];
//! let mut dec = Decoder::new(input);
//!
//! for record in dec.records() {
//!     let record = record.unwrap();
//!     if record.get("level") == Some(Some("warn")) {
//!         assert_eq!(record.get("disk"), Some(Some("92%")));
//!     }
//! }
//! ```
//!
//! Malformed input never panics: lexical faults are positioned
//! [`SyntaxError`]s scoped to the record they occur in, and scanning
//! resumes with the next record.
//!
//! ## Encoding
//!
//! [`Encoder`] writes keyvals to any [`std::io::Write`] sink, quoting
//! and escaping as needed. Keys and values are accepted as anything
//! convertible to [`Value`], including timestamps and custom
//! [`Render`] implementations:
//!
//! ```rust
//! use logfmt::Encoder;
//!
//! let mut buf = Vec::new();
//! let mut enc = Encoder::new(&mut buf);
//! enc.encode_keyval("level", "info").unwrap();
//! enc.encode_keyval("msg", "server started").unwrap();
//! enc.encode_keyval("pid", 4321).unwrap();
//! enc.end_record().unwrap();
//! drop(enc);
//!
//! assert_eq!(buf, b"level=info msg=\"server started\" pid=4321\n");
//! ```
//!
//! The one-shot [`encode_keyvals`] function and [`keyvals!`] macro cover
//! the common build-a-line case:
//!
//! ```rust
//! let line = logfmt::keyvals!("level", "error", "code", 500).unwrap();
//! assert_eq!(line, b"level=error code=500");
//! ```
//!
//! ## Serde
//!
//! Flat structs and maps map naturally onto records; [`to_string`] /
//! [`to_writer`] and [`from_str`] / [`from_reader`] adapt them:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Event {
//!     level: String,
//!     code: u32,
//! }
//!
//! let event = Event { level: "warn".to_string(), code: 404 };
//! let line = logfmt::to_string(&event).unwrap();
//! assert_eq!(line, "level=warn code=404\n");
//! assert_eq!(logfmt::from_str::<Event>(&line).unwrap(), event);
//! ```
//!
//! ## Round-trip guarantees
//!
//! Any record built from keys and values free of control characters
//! decodes back to the same pairs. One documented asymmetry: an absent
//! or `None` value encodes as the token `nil`, which decodes as the
//! three-letter text, while a value that *is* the text `nil` encodes
//! quoted (`"nil"`) to keep the two apart.

pub mod de;
pub mod decode;
pub mod encode;
pub mod error;
pub mod macros;
pub mod quote;
pub mod record;
pub mod ser;
pub mod value;

pub use de::{from_reader, from_slice, from_str, Deserializer};
pub use decode::{Decoder, Records};
pub use encode::{encode_keyvals, Encoder};
pub use error::{Error, Result, SyntaxError};
pub use quote::{escape, needs_quoting, unescape};
pub use record::{Keyval, Record};
pub use ser::{to_string, to_vec, to_writer, Serializer};
pub use value::{Render, Value};
