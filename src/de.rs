//! Serde deserialization from the logfmt wire format.
//!
//! The mirror of [`ser`](crate::ser): one record deserializes into a
//! struct or map, and a whole stream of records into a `Vec` (or other
//! sequence) of those. Scalar fields are parsed on demand from their
//! textual form: integers, floats, booleans, chars, and unit enum
//! variants all work. An absent value (`key` or `key=` in the
//! input) deserializes as `None` or `()`.
//!
//! The format's `nil` asymmetry applies here too: an encoded `None`
//! comes back as the text `nil` for string targets, because the wire
//! format cannot distinguish the sentinel from the three-letter word.
//! Absent values (bare keys) are the reliable way to round-trip `None`.
//!
//! ```rust
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Request {
//!     method: String,
//!     status: u16,
//!     took_ms: Option<f64>,
//! }
//!
//! let req: Request = logfmt::from_str("method=GET status=200 took_ms=1.25\n").unwrap();
//! assert_eq!(req.status, 200);
//! assert_eq!(req.took_ms, Some(1.25));
//! ```

use std::io;

use serde::de::{self, DeserializeOwned, Deserializer as _, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;

use crate::record::{Keyval, Record};
use crate::{Decoder, Error, Result};

/// Deserializes an instance of `T` from a string of logfmt text.
///
/// # Errors
///
/// Returns a positioned [`SyntaxError`](crate::SyntaxError) for
/// malformed input, or a description of the mismatch when the records
/// cannot populate `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_slice(s.as_bytes())
}

/// Deserializes an instance of `T` from logfmt bytes.
///
/// # Errors
///
/// See [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_reader(v)
}

/// Deserializes an instance of `T` from an I/O stream of logfmt.
///
/// # Errors
///
/// See [`from_str`]; additionally surfaces the reader's I/O failures.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut dec = Decoder::new(reader);
    let mut records = Vec::new();
    while let Some(record) = dec.read_record()? {
        records.push(record);
    }
    T::deserialize(Deserializer::from_records(records))
}

/// The logfmt serde deserializer, holding the decoded records.
pub struct Deserializer {
    records: Vec<Record>,
}

impl Deserializer {
    /// Builds a deserializer over already-decoded records.
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        Deserializer { records }
    }

    fn single_record(self) -> Result<Record> {
        let mut records = self.records;
        match records.len() {
            1 => Ok(records.pop().unwrap_or_default()),
            n => Err(Error::custom(format_args!(
                "expected a single record, found {n}"
            ))),
        }
    }
}

impl<'de> de::Deserializer<'de> for Deserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.records.len() == 1 {
            self.deserialize_map(visitor)
        } else {
            self.deserialize_seq(visitor)
        }
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        RecordDeserializer {
            record: self.single_record()?,
        }
        .deserialize_map(visitor)
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(RecordsAccess {
            records: self.records.into_iter(),
        })
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str
        string bytes byte_buf option unit unit_struct newtype_struct
        tuple_struct enum identifier ignored_any
    }
}

/// `SeqAccess` yielding one element per decoded record.
struct RecordsAccess {
    records: std::vec::IntoIter<Record>,
}

impl<'de> de::SeqAccess<'de> for RecordsAccess {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.records.next() {
            Some(record) => seed.deserialize(RecordDeserializer { record }).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.records.len())
    }
}

/// Deserializes one record as a map or struct.
struct RecordDeserializer {
    record: Record,
}

impl<'de> de::Deserializer<'de> for RecordDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_map(KeyvalsAccess {
            keyvals: self.record.into_iter(),
            value: None,
        })
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str
        string bytes byte_buf option unit unit_struct newtype_struct seq
        tuple tuple_struct enum identifier ignored_any
    }
}

/// `MapAccess` over the keyvals of one record.
struct KeyvalsAccess {
    keyvals: std::vec::IntoIter<Keyval>,
    value: Option<Option<String>>,
}

impl<'de> de::MapAccess<'de> for KeyvalsAccess {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.keyvals.next() {
            Some(kv) => {
                self.value = Some(kv.value);
                seed.deserialize(kv.key.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        let value = self
            .value
            .take()
            .ok_or_else(|| Error::custom("next_value_seed called before next_key_seed"))?;
        seed.deserialize(FieldDeserializer { value })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.keyvals.len())
    }
}

/// Deserializes one field value from its textual form.
struct FieldDeserializer {
    value: Option<String>,
}

impl FieldDeserializer {
    fn expect_value(self, expected: &str) -> Result<String> {
        match self.value {
            Some(value) => Ok(value),
            None => Err(Error::custom(format_args!(
                "expected {expected}, found an absent value"
            ))),
        }
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident: $ty:ty, $expected:expr;)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                let text = self.expect_value($expected)?;
                match text.parse::<$ty>() {
                    Ok(v) => visitor.$visit(v),
                    Err(_) => Err(Error::custom(format_args!(
                        "invalid {}: {:?}", $expected, text
                    ))),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for FieldDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(value) => visitor.visit_string(value),
            None => visitor.visit_unit(),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(value) => visitor.visit_some(FieldDeserializer { value: Some(value) }),
            None => visitor.visit_none(),
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_string(self.expect_value("a string")?)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_byte_buf(self.expect_value("bytes")?.into_bytes())
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let text = self.expect_value("a character")?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::custom(format_args!("invalid character: {text:?}"))),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let variant = self.expect_value("an enum variant")?;
        visitor.visit_enum(variant.into_deserializer())
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    deserialize_parsed! {
        deserialize_bool => visit_bool: bool, "a boolean";
        deserialize_i8 => visit_i8: i8, "an integer";
        deserialize_i16 => visit_i16: i16, "an integer";
        deserialize_i32 => visit_i32: i32, "an integer";
        deserialize_i64 => visit_i64: i64, "an integer";
        deserialize_i128 => visit_i128: i128, "an integer";
        deserialize_u8 => visit_u8: u8, "an integer";
        deserialize_u16 => visit_u16: u16, "an integer";
        deserialize_u32 => visit_u32: u32, "an integer";
        deserialize_u64 => visit_u64: u64, "an integer";
        deserialize_u128 => visit_u128: u128, "an integer";
        deserialize_f32 => visit_f32: f32, "a number";
        deserialize_f64 => visit_f64: f64, "a number";
    }

    fn deserialize_seq<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(Error::UnsupportedType("sequence"))
    }

    fn deserialize_tuple<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(Error::UnsupportedType("tuple"))
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(Error::UnsupportedType("tuple struct"))
    }

    fn deserialize_map<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(Error::UnsupportedType("map"))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(Error::UnsupportedType("struct"))
    }
}
