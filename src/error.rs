//! Error types for logfmt encoding and decoding.
//!
//! Decode-side lexical faults carry the 1-based line and column of the
//! offending byte via [`SyntaxError`]. Encode-side faults describe why a
//! key or value could not be formatted. I/O failures from the underlying
//! stream are captured by message so that errors stay cheap to clone and
//! compare in tests.

use std::fmt;
use thiserror::Error;

/// A lexical fault found while decoding, positioned in the input.
///
/// Both `line` and `column` are 1-based. The column points at the
/// offending byte, or just past the offending token for faults that are
/// only detectable once the token is complete (an unterminated quote, an
/// invalid escape, a malformed key).
///
/// # Examples
///
/// ```rust
/// use logfmt::Decoder;
///
/// let mut dec = Decoder::new(&b"a=1\n=bar"[..]);
/// assert!(dec.advance_record().unwrap());
/// while dec.scan_key().is_some() {
///     dec.scan_value();
/// }
/// assert!(dec.advance_record().unwrap());
/// while dec.scan_key().is_some() {
///     dec.scan_value();
/// }
/// let err = dec.last_error().unwrap();
/// assert!(err.to_string().contains("line 2, column 1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("logfmt syntax error at line {line}, column {column}: {msg}")]
pub struct SyntaxError {
    /// Human-readable description of the fault.
    pub msg: String,
    /// 1-based line number of the record containing the fault.
    pub line: usize,
    /// 1-based column of the offending byte.
    pub column: usize,
}

impl SyntaxError {
    pub(crate) fn new(msg: impl Into<String>, line: usize, column: usize) -> Self {
        SyntaxError {
            msg: msg.into(),
            line,
            column,
        }
    }
}

/// Represents all possible errors that can occur during logfmt encoding
/// and decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The key was nil: a [`Value::Nil`](crate::Value::Nil), or a
    /// rendering hook that reported a nil-valued holder.
    #[error("nil key")]
    NilKey,

    /// The key was empty or contained a space, `=`, `"`, a control byte,
    /// or bytes that do not form valid UTF-8.
    #[error("invalid key")]
    InvalidKey,

    /// The key or value was a composite shape (sequence, mapping,
    /// aggregate, handle) that has no logfmt representation.
    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),

    /// A positioned lexical fault from the decoder.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// IO error from the underlying stream.
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error, typically raised by a user-supplied [`Render`]
    /// hook.
    ///
    /// [`Render`]: crate::Render
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use logfmt::Error;
    ///
    /// let err = Error::custom("renderer unavailable");
    /// assert!(err.to_string().contains("renderer unavailable"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns the positioned syntax error, if this is one.
    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            Error::Syntax(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn io(err: &std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
