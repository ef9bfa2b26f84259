//! Owned record types.
//!
//! The spans produced by the borrowed scan API ([`Decoder::scan_key`] /
//! [`Decoder::scan_value`]) alias the decoder's line buffer and die at
//! the next record advance. [`Record`] is the owning counterpart for
//! callers that retain tokens: a positionally-ordered list of
//! [`Keyval`]s with duplicate keys preserved, convertible to an
//! order-preserving map when last-one-wins semantics are wanted.
//!
//! Values are stored as `String`s (lossily converted if the raw span was
//! not valid UTF-8); the raw-bytes path remains available on the scan
//! API.
//!
//! [`Decoder::scan_key`]: crate::Decoder::scan_key
//! [`Decoder::scan_value`]: crate::Decoder::scan_value

use std::slice;

use indexmap::IndexMap;

use crate::{Encoder, Result, Value};

/// One key together with its optional value.
///
/// `value` is `None` for a key that had no value at all (`key`, `key=`,
/// or `key= ` in the input), distinct from `Some` of an empty string,
/// which a quoted `key=""` produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyval {
    pub key: String,
    pub value: Option<String>,
}

impl Keyval {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Keyval {
            key: key.into(),
            value,
        }
    }
}

/// An owned logfmt record: the ordered keyvals of one line.
///
/// # Examples
///
/// ```rust
/// use logfmt::Decoder;
///
/// let mut dec = Decoder::new(&b"level=info msg=\"server started\" port=8080\n"[..]);
/// let record = dec.read_record().unwrap().unwrap();
///
/// assert_eq!(record.len(), 3);
/// assert_eq!(record.get("msg"), Some(Some("server started")));
/// assert_eq!(record.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<Keyval>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Record { fields: Vec::new() }
    }

    /// Creates an empty record with room for `capacity` keyvals.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Record {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Appends a keyval.
    pub fn push(&mut self, keyval: Keyval) {
        self.fields.push(keyval);
    }

    /// Number of keyvals in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` for a record with no keyvals (a blank line).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The value of the first keyval matching `key`.
    ///
    /// The outer `Option` is `None` when the key does not occur; the
    /// inner one is `None` when the key occurs without a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| kv.value.as_deref())
    }

    /// Iterates the keyvals in record order.
    pub fn iter(&self) -> slice::Iter<'_, Keyval> {
        self.fields.iter()
    }

    /// Converts the record into an order-preserving map.
    ///
    /// Keys keep their first-seen position; for duplicate keys the last
    /// value wins.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use logfmt::Record;
    ///
    /// let record: Record = [("a", Some("1")), ("b", None), ("a", Some("2"))]
    ///     .into_iter()
    ///     .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
    ///     .collect();
    ///
    /// let map = record.into_map();
    /// assert_eq!(map.get_index(0), Some((&"a".to_string(), &Some("2".to_string()))));
    /// assert_eq!(map["b"], None);
    /// ```
    #[must_use]
    pub fn into_map(self) -> IndexMap<String, Option<String>> {
        let mut map = IndexMap::with_capacity(self.fields.len());
        for kv in self.fields {
            map.insert(kv.key, kv.value);
        }
        map
    }

    /// Encodes the record back into one logfmt line, newline included.
    ///
    /// Absent values come out as the `nil` token; the encoder never
    /// emits a bare key.
    ///
    /// # Errors
    ///
    /// Fails if a key is empty or contains characters the format cannot
    /// carry.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        for kv in &self.fields {
            let value = match &kv.value {
                Some(v) => Value::from(v.as_str()),
                None => Value::Nil,
            };
            enc.encode_keyval(kv.key.as_str(), value)?;
        }
        enc.end_record()?;
        drop(enc);
        Ok(buf)
    }
}

impl IntoIterator for Record {
    type Item = Keyval;
    type IntoIter = std::vec::IntoIter<Keyval>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Keyval;
    type IntoIter = slice::Iter<'a, Keyval>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl FromIterator<(String, Option<String>)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Record {
            fields: iter
                .into_iter()
                .map(|(key, value)| Keyval { key, value })
                .collect(),
        }
    }
}

impl FromIterator<Keyval> for Record {
    fn from_iter<I: IntoIterator<Item = Keyval>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        [("a", Some("1")), ("d", None), ("a", Some("2"))]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn get_returns_the_first_occurrence() {
        let record = sample();
        assert_eq!(record.get("a"), Some(Some("1")));
        assert_eq!(record.get("d"), Some(None));
        assert_eq!(record.get("x"), None);
    }

    #[test]
    fn into_map_keeps_order_and_last_value() {
        let map = sample().into_map();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["a", "d"]);
        assert_eq!(map["a"], Some("2".to_string()));
    }

    #[test]
    fn encode_writes_nil_for_absent_values() {
        let line = sample().encode().unwrap();
        assert_eq!(line, b"a=1 d=nil a=2\n");
    }
}
