//! Streaming logfmt decoding.
//!
//! The [`Decoder`] reads records line by line from any [`std::io::Read`]
//! source and tokenizes them on demand: [`advance_record`] moves to the
//! next line, then alternating [`scan_key`] / [`scan_value`] calls pull
//! keys and values out of it. Lexical faults are reported as positioned
//! [`SyntaxError`]s through [`last_error`] and end scanning for the
//! current record only; the next `advance_record` clears them. I/O
//! faults are fatal.
//!
//! The spans returned by `scan_key` and `scan_value` borrow the
//! decoder's internal line buffer and are valid only until the next
//! `advance_record` call. Callers that need to retain tokens can use the
//! owning layer instead: [`read_record`] and the [`records`] iterator
//! produce [`Record`]s that copy their contents out.
//!
//! ```rust
//! use logfmt::Decoder;
//!
//! let input = &b"a=1 b=\"bar\"\nc=2\n"[..];
//! let mut dec = Decoder::new(input);
//!
//! let mut pairs = Vec::new();
//! while dec.advance_record().unwrap() {
//!     while let Some(key) = dec.scan_key() {
//!         let key = String::from_utf8(key.to_vec()).unwrap();
//!         let value = dec.scan_value().map(|v| String::from_utf8_lossy(v).into_owned());
//!         pairs.push((key, value));
//!     }
//! }
//! assert_eq!(pairs.len(), 3);
//! assert_eq!(pairs[1], ("b".to_string(), Some("bar".to_string())));
//! ```
//!
//! [`advance_record`]: Decoder::advance_record
//! [`scan_key`]: Decoder::scan_key
//! [`scan_value`]: Decoder::scan_value
//! [`last_error`]: Decoder::last_error
//! [`read_record`]: Decoder::read_record
//! [`records`]: Decoder::records

use std::io::{BufRead, BufReader, Read};
use std::str;

use crate::error::SyntaxError;
use crate::record::{Keyval, Record};
use crate::{quote, Error, Result};

/// Lexer state, one value per position in the record grammar. Owned
/// exclusively by the decoder; `Done` and `Error` are terminal per line
/// and only [`Decoder::advance_record`] leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between tokens, consuming separator bytes.
    Skip,
    /// At the first byte of a key.
    Key,
    /// At the `=` that closed a key.
    Equal,
    /// The previous key has no value; emit that before rejoining `Skip`.
    NoValue,
    /// At the first byte of an unquoted value.
    UnquotedValue,
    /// At the opening quote of a quoted value.
    QuotedValue,
    /// End of the current record.
    Done,
    /// A lexical fault was recorded; no more tokens this record.
    Error,
}

/// Token classes produced by one `step` of the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// No token yet; the state advanced.
    None,
    /// A key span is in `start..end`.
    Key,
    /// A value span is in `start..end`, unescaped.
    Value,
    /// A quoted value span is in `start..end`, delimiters included,
    /// containing at least one escape.
    Quoted,
    /// The current key has no value.
    Absent,
    /// The record is exhausted.
    Eol,
}

/// A streaming decoder reading logfmt records from an input stream.
///
/// The decoder introduces its own buffering and may read data from the
/// source beyond the records requested. It does not manage the source's
/// lifecycle; dropping the decoder drops the reader.
pub struct Decoder<R: Read> {
    reader: BufReader<R>,
    line: Vec<u8>,
    line_num: usize,
    pos: usize,
    start: usize,
    end: usize,
    state: State,
    unescaped: Vec<u8>,
    err: Option<Error>,
}

impl<R: Read> Decoder<R> {
    /// Returns a new decoder that reads from `reader`.
    pub fn new(reader: R) -> Self {
        Decoder {
            reader: BufReader::new(reader),
            line: Vec::new(),
            line_num: 0,
            pos: 0,
            start: 0,
            end: 0,
            state: State::Done,
            unescaped: Vec::new(),
            err: None,
        }
    }

    /// Like [`Decoder::new`] with an explicit read-buffer capacity.
    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Decoder {
            reader: BufReader::with_capacity(capacity, reader),
            line: Vec::new(),
            line_num: 0,
            pos: 0,
            start: 0,
            end: 0,
            state: State::Done,
            unescaped: Vec::new(),
            err: None,
        }
    }

    /// Advances the decoder to the next record, which can then be
    /// scanned with [`scan_key`](Decoder::scan_key) and
    /// [`scan_value`](Decoder::scan_value).
    ///
    /// Returns `Ok(false)` at the end of the input. A lexical fault from
    /// the previous record is cleared here, since it pertained to the
    /// line it occurred on. An I/O fault is fatal: every subsequent call returns
    /// the same error.
    ///
    /// # Errors
    ///
    /// Returns the underlying stream's failure, if any. Reaching the end
    /// of input is not an error.
    pub fn advance_record(&mut self) -> Result<bool> {
        if let Some(err @ Error::Io(_)) = &self.err {
            return Err(err.clone());
        }
        self.err = None;
        self.line.clear();
        let n = match self.reader.read_until(b'\n', &mut self.line) {
            Ok(n) => n,
            Err(e) => {
                let err = Error::io(&e);
                self.err = Some(err.clone());
                return Err(err);
            }
        };
        if n == 0 {
            self.state = State::Done;
            return Ok(false);
        }
        if self.line.last() == Some(&b'\n') {
            self.line.pop();
        }
        if self.line.last() == Some(&b'\r') {
            self.line.pop();
        }
        self.line_num += 1;
        self.pos = 0;
        self.start = 0;
        self.end = 0;
        self.state = if self.line.is_empty() {
            State::Done
        } else {
            State::Skip
        };
        Ok(true)
    }

    /// Scans forward to the next key in the current record.
    ///
    /// Returns `None` when the record has no further keys, or after a
    /// lexical fault (retrievable via
    /// [`last_error`](Decoder::last_error)). Skipping
    /// [`scan_value`](Decoder::scan_value) between calls discards the
    /// previous key's value.
    ///
    /// The returned span borrows the internal line buffer and is
    /// invalidated by the next [`advance_record`](Decoder::advance_record).
    pub fn scan_key(&mut self) -> Option<&[u8]> {
        while self.err.is_none() {
            match self.step() {
                Token::Key => return Some(&self.line[self.start..self.end]),
                Token::Eol => return None,
                _ => {}
            }
        }
        None
    }

    /// Scans the value belonging to the most recently scanned key,
    /// unescaping it if it was quoted.
    ///
    /// Returns `None` when the key has no associated value: a bare key,
    /// a trailing `=` at the end of the record, or `=` immediately
    /// followed by whitespace. An explicitly quoted empty value (`k=""`)
    /// is `Some` of an empty span, distinct from the absent case.
    ///
    /// The returned span borrows decoder-internal storage and is
    /// invalidated by the next [`advance_record`](Decoder::advance_record).
    pub fn scan_value(&mut self) -> Option<&[u8]> {
        while self.err.is_none() {
            match self.step() {
                Token::Value => return Some(&self.line[self.start..self.end]),
                Token::Quoted => {
                    return match quote::unescape(&self.line[self.start..self.end]) {
                        Some(unescaped) => {
                            self.unescaped = unescaped;
                            Some(&self.unescaped)
                        }
                        None => {
                            self.fail("invalid quoted value");
                            None
                        }
                    };
                }
                Token::Absent | Token::Eol => return None,
                _ => {}
            }
        }
        None
    }

    /// The sticky error for the current record, if any.
    ///
    /// Lexical faults stay readable here until the next successful
    /// [`advance_record`](Decoder::advance_record); I/O faults stay for
    /// the life of the decoder.
    pub fn last_error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Reads and collects the next record into an owned [`Record`].
    ///
    /// Returns `Ok(None)` at the end of the input.
    ///
    /// # Errors
    ///
    /// Returns a lexical fault for the record it occurred in; the
    /// decoder stays usable and the following call continues with the
    /// next record. I/O faults are fatal.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        if !self.advance_record()? {
            return Ok(None);
        }
        let mut record = Record::new();
        loop {
            let key = match self.scan_key() {
                Some(key) => String::from_utf8_lossy(key).into_owned(),
                None => break,
            };
            let value = self
                .scan_value()
                .map(|v| String::from_utf8_lossy(v).into_owned());
            record.push(Keyval { key, value });
        }
        match &self.err {
            Some(err) => Err(err.clone()),
            None => Ok(Some(record)),
        }
    }

    /// Adapts the decoder into an iterator of owned [`Record`]s.
    ///
    /// Lexical faults are yielded as `Err` items and iteration
    /// continues with the next record; an I/O fault is yielded once and
    /// ends the iteration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use logfmt::Decoder;
    ///
    /// let mut dec = Decoder::new(&b"a=1\nb=2\n"[..]);
    /// let records: Vec<_> = dec.records().collect::<Result<_, _>>().unwrap();
    /// assert_eq!(records.len(), 2);
    /// assert_eq!(records[0].get("a"), Some(Some("1")));
    /// ```
    pub fn records(&mut self) -> Records<'_, R> {
        Records {
            dec: self,
            done: false,
        }
    }

    /// Runs the lexer until it produces a token, records a fault, or
    /// exhausts the record.
    fn step(&mut self) -> Token {
        match self.state {
            State::Skip => self.step_skip(),
            State::Key => self.step_key(),
            State::Equal => self.step_equal(),
            State::NoValue => self.step_no_value(),
            State::UnquotedValue => self.step_unquoted(),
            State::QuotedValue => self.step_quoted(),
            State::Done | State::Error => Token::Eol,
        }
    }

    fn step_skip(&mut self) -> Token {
        loop {
            if self.pos >= self.line.len() {
                self.state = State::Done;
                return Token::Eol;
            }
            match self.line[self.pos] {
                c @ (b'=' | b'"') => {
                    self.fail_unexpected(c);
                    return Token::None;
                }
                c if c > b' ' => {
                    self.state = State::Key;
                    return Token::None;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn step_key(&mut self) -> Token {
        self.start = self.pos;
        loop {
            if self.pos >= self.line.len() {
                self.end = self.pos;
                return self.emit_key(State::Done);
            }
            match self.line[self.pos] {
                b'=' => {
                    self.end = self.pos;
                    return self.emit_key(State::Equal);
                }
                b'"' => {
                    self.fail_unexpected(b'"');
                    return Token::None;
                }
                c if c <= b' ' => {
                    self.end = self.pos;
                    return self.emit_key(State::NoValue);
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Closes the key span, validating that it forms sound text. Keys
    /// with invalid UTF-8 (or the replacement character itself) cannot
    /// round-trip and are lexical faults.
    fn emit_key(&mut self, next: State) -> Token {
        match str::from_utf8(&self.line[self.start..self.end]) {
            Ok(key) if !key.contains('\u{FFFD}') => {
                self.state = next;
                Token::Key
            }
            _ => {
                self.fail("invalid key");
                Token::None
            }
        }
    }

    fn step_equal(&mut self) -> Token {
        // pos is at the '=' that closed the key
        self.pos += 1;
        if self.pos >= self.line.len() {
            self.state = State::Done;
            return Token::Absent;
        }
        match self.line[self.pos] {
            b'"' => {
                self.state = State::QuotedValue;
                Token::None
            }
            c if c > b' ' => {
                self.state = State::UnquotedValue;
                Token::None
            }
            _ => {
                self.state = State::Skip;
                Token::Absent
            }
        }
    }

    fn step_no_value(&mut self) -> Token {
        self.state = State::Skip;
        Token::Absent
    }

    fn step_unquoted(&mut self) -> Token {
        self.start = self.pos;
        loop {
            if self.pos >= self.line.len() {
                self.end = self.pos;
                self.state = State::Done;
                return Token::Value;
            }
            match self.line[self.pos] {
                c @ (b'=' | b'"') => {
                    self.fail_unexpected(c);
                    return Token::None;
                }
                c if c <= b' ' => {
                    self.end = self.pos;
                    self.state = State::Skip;
                    return Token::Value;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn step_quoted(&mut self) -> Token {
        self.start = self.pos;
        // consume the opening quote
        self.pos += 1;
        let mut saw_escape = false;
        let mut escaped = false;
        loop {
            if self.pos >= self.line.len() {
                self.fail("unterminated quoted value");
                return Token::None;
            }
            let c = self.line[self.pos];
            if escaped {
                escaped = false;
            } else if c == b'\\' {
                escaped = true;
                saw_escape = true;
            } else if c == b'"' {
                self.pos += 1;
                self.state = if self.pos >= self.line.len() {
                    State::Done
                } else {
                    State::Skip
                };
                if saw_escape {
                    // delimiters included; scan_value unescapes
                    self.end = self.pos;
                    return Token::Quoted;
                }
                // fast path: nothing to unescape, strip the delimiters
                self.start += 1;
                self.end = self.pos - 1;
                return Token::Value;
            }
            self.pos += 1;
        }
    }

    fn fail(&mut self, msg: &str) {
        self.err = Some(SyntaxError::new(msg, self.line_num, self.pos + 1).into());
        self.state = State::Error;
    }

    fn fail_unexpected(&mut self, byte: u8) {
        self.fail(&format!("unexpected {:?}", byte as char));
    }
}

/// Iterator over the remaining records of a [`Decoder`], yielding owned
/// [`Record`]s. Created by [`Decoder::records`].
pub struct Records<'a, R: Read> {
    dec: &'a mut Decoder<R>,
    done: bool,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.dec.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                if matches!(err, Error::Io(_)) {
                    self.done = true;
                }
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Simulates a stream that fails once its data runs out.
    struct FailingReader {
        data: &'static [u8],
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
            }
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn empty_input_has_no_records() {
        let mut dec = Decoder::new(&b""[..]);
        assert!(!dec.advance_record().unwrap());
        assert!(dec.last_error().is_none());
    }

    #[test]
    fn blank_line_is_an_empty_record() {
        let mut dec = Decoder::new(&b"\n"[..]);
        assert!(dec.advance_record().unwrap());
        assert!(dec.scan_key().is_none());
        assert!(!dec.advance_record().unwrap());
    }

    #[test]
    fn scan_value_without_scan_key_skips_the_key() {
        let mut dec = Decoder::new(&b"a=1 b=2"[..]);
        assert!(dec.advance_record().unwrap());
        assert_eq!(dec.scan_value(), Some(&b"1"[..]));
        assert_eq!(dec.scan_key(), Some(&b"b"[..]));
    }

    #[test]
    fn scan_key_without_scan_value_skips_the_value() {
        let mut dec = Decoder::new(&b"a=1 b=\"two words\" c=3"[..]);
        assert!(dec.advance_record().unwrap());
        assert_eq!(dec.scan_key(), Some(&b"a"[..]));
        assert_eq!(dec.scan_key(), Some(&b"b"[..]));
        assert_eq!(dec.scan_key(), Some(&b"c"[..]));
        assert_eq!(dec.scan_value(), Some(&b"3"[..]));
        assert!(dec.scan_key().is_none());
        assert!(dec.last_error().is_none());
    }

    #[test]
    fn crlf_line_endings_are_stripped() {
        let mut dec = Decoder::new(&b"a=1\r\nb=2\r\n"[..]);
        assert!(dec.advance_record().unwrap());
        assert_eq!(dec.scan_key(), Some(&b"a"[..]));
        assert_eq!(dec.scan_value(), Some(&b"1"[..]));
        assert!(dec.scan_key().is_none());
        assert!(dec.advance_record().unwrap());
        assert_eq!(dec.scan_key(), Some(&b"b"[..]));
    }

    #[test]
    fn io_faults_are_fatal_and_sticky() {
        let mut dec = Decoder::new(FailingReader { data: b"a=1\n" });
        assert!(dec.advance_record().unwrap());
        assert_eq!(dec.scan_key(), Some(&b"a"[..]));
        let err = dec.advance_record().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        // still failing on the next call
        assert!(matches!(dec.advance_record().unwrap_err(), Error::Io(_)));
        assert!(matches!(dec.last_error(), Some(Error::Io(_))));
    }

    #[test]
    fn records_iterator_stops_after_io_fault() {
        let mut dec = Decoder::new(FailingReader { data: b"a=1\n" });
        let results: Vec<_> = dec.records().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::Io(_))));
    }
}
