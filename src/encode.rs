//! Streaming logfmt encoding.
//!
//! The [`Encoder`] writes keyvals to an output stream one pair at a
//! time, separating pairs within a record by a single space and records
//! by a newline (via [`end_record`]). Keys and values are accepted as
//! anything convertible to [`Value`]; dispatch over the variants applies
//! the key-validity and value-quoting rules.
//!
//! The encoder holds no buffer: every call writes directly to the
//! sink, so bytes emitted before a mid-pair failure remain in the
//! output. Callers needing atomic keyvals should buffer upstream. A
//! failing *key* never produces output, because keys are fully resolved
//! and validated before the first write.
//!
//! ```rust
//! use logfmt::Encoder;
//!
//! let mut buf = Vec::new();
//! let mut enc = Encoder::new(&mut buf);
//! enc.encode_keyval("level", "info").unwrap();
//! enc.encode_keyval("msg", "listening on :8080").unwrap();
//! enc.end_record().unwrap();
//! drop(enc);
//!
//! assert_eq!(buf, b"level=info msg=\"listening on :8080\"\n");
//! ```
//!
//! [`end_record`]: Encoder::end_record

use std::borrow::Cow;
use std::io::Write;
use std::str;

use crate::{quote, Error, Result, Value};

const NIL: &[u8] = b"nil";

/// An encoder writing logfmt data to an output stream.
pub struct Encoder<W: Write> {
    writer: W,
    need_sep: bool,
}

impl<W: Write> Encoder<W> {
    /// Returns a new encoder that writes to `writer`.
    pub fn new(writer: W) -> Self {
        Encoder {
            writer,
            need_sep: false,
        }
    }

    /// Consumes the encoder, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes the encoding of `key` and `value` to the stream,
    /// preceded by a single space for the second and subsequent pairs
    /// of a record.
    ///
    /// # Errors
    ///
    /// - [`Error::NilKey`]: the key is [`Value::Nil`], or its
    ///   [`Render`](crate::Render) hook reported a nil-valued holder.
    /// - [`Error::InvalidKey`]: the key is empty or contains a space,
    ///   `=`, `"`, a control byte, or malformed text.
    /// - [`Error::UnsupportedType`]: the key or value is a composite
    ///   shape.
    /// - Any error a rendering hook raises, and the sink's own write
    ///   failures.
    ///
    /// Errors are per-call: the encoder stays usable for subsequent
    /// pairs.
    pub fn encode_keyval<'a, K, V>(&mut self, key: K, value: V) -> Result<()>
    where
        K: Into<Value<'a>>,
        V: Into<Value<'a>>,
    {
        let key = key.into();
        let key = resolve_key(&key)?;
        if self.need_sep {
            self.write(b" ")?;
        } else {
            self.need_sep = true;
        }
        self.write(key.as_bytes())?;
        self.write(b"=")?;
        self.write_value(&value.into())
    }

    /// Writes a newline and resets the encoder to the beginning of a
    /// new record.
    ///
    /// # Errors
    ///
    /// Returns the sink's write failure, if any; the separator state is
    /// only reset on success.
    pub fn end_record(&mut self) -> Result<()> {
        self.write(b"\n")?;
        self.need_sep = false;
        Ok(())
    }

    /// Resets the encoder to the beginning of a new record without
    /// writing anything.
    pub fn reset(&mut self) {
        self.need_sep = false;
    }

    fn write_value(&mut self, value: &Value<'_>) -> Result<()> {
        match value {
            Value::Nil => self.write(NIL),
            Value::Str(s) => self.write_text(s.as_bytes()),
            Value::Bytes(b) => self.write_text(b),
            Value::Render(r) => match r.try_render()? {
                Some(s) => self.write_text(s.as_bytes()),
                None => self.write(NIL),
            },
            Value::Display(d) => self.write_text(d.to_string().as_bytes()),
            Value::Composite(shape) => Err(Error::UnsupportedType(*shape)),
        }
    }

    fn write_text(&mut self, raw: &[u8]) -> Result<()> {
        self.write(&quote::escape(raw))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).map_err(|e| Error::io(&e))
    }
}

/// Resolves a key operand to its text, applying the key dispatch order:
/// native text is validated and used verbatim; rendering hooks are
/// invoked through their defensive contract; composite shapes and nil
/// keys fail without producing output.
fn resolve_key<'a>(key: &'a Value<'a>) -> Result<Cow<'a, str>> {
    match key {
        Value::Nil => Err(Error::NilKey),
        Value::Str(s) => {
            check_key(s)?;
            Ok(Cow::Borrowed(s.as_ref()))
        }
        Value::Bytes(b) => match str::from_utf8(b) {
            Ok(s) => {
                check_key(s)?;
                Ok(Cow::Borrowed(s))
            }
            Err(_) => Err(Error::InvalidKey),
        },
        Value::Render(r) => match r.try_render()? {
            Some(s) => {
                check_key(&s)?;
                Ok(Cow::Owned(s))
            }
            None => Err(Error::NilKey),
        },
        Value::Display(d) => {
            let s = d.to_string();
            check_key(&s)?;
            Ok(Cow::Owned(s))
        }
        Value::Composite(shape) => Err(Error::UnsupportedType(*shape)),
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty()
        || key
            .chars()
            .any(|c| c <= ' ' || c == '=' || c == '"' || c == '\u{FFFD}')
    {
        return Err(Error::InvalidKey);
    }
    Ok(())
}

/// Returns the logfmt encoding of a flat, alternating key/value
/// sequence as a single record without a trailing newline.
///
/// A trailing key without a value is paired with [`Value::Nil`]. The
/// [`keyvals!`](crate::keyvals) macro converts heterogeneous arguments
/// into the expected slice.
///
/// # Examples
///
/// ```rust
/// use logfmt::{encode_keyvals, Value};
///
/// let buf = encode_keyvals(&[
///     Value::from("key"),
///     Value::from(1),
///     Value::from("msg"),
///     Value::from("two words"),
/// ])
/// .unwrap();
/// assert_eq!(buf, b"key=1 msg=\"two words\"");
/// ```
///
/// # Errors
///
/// Fails with the first key or value formatting error; bytes written
/// for preceding pairs are discarded.
pub fn encode_keyvals(keyvals: &[Value<'_>]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut enc = Encoder::new(&mut buf);
        for pair in keyvals.chunks(2) {
            match pair {
                [key, value] => enc.encode_keyval(key, value)?,
                [key] => enc.encode_keyval(key, Value::Nil)?,
                _ => unreachable!(),
            }
        }
    }
    Ok(buf)
}
