//! Serde serialization onto the logfmt wire format.
//!
//! This adapter maps flat Rust data onto records: a struct or map
//! serializes as one newline-terminated record, and a sequence of
//! structs/maps as one record per element. Field values must reduce to
//! text: primitives, strings, bytes, `Option`s and newtypes of those,
//! and unit enum variants. Aggregate field values (nested sequences,
//! maps, structs) fail with
//! [`Error::UnsupportedType`](crate::Error::UnsupportedType), the same
//! fail-fast rule the core encoder applies to composite operands.
//!
//! `None` fields encode as the `nil` token. Note the format's
//! round-trip asymmetry: `nil` decodes back as the three-letter text,
//! not as an absent value.
//!
//! ```rust
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Request {
//!     method: &'static str,
//!     path: &'static str,
//!     status: u16,
//!     err: Option<&'static str>,
//! }
//!
//! let line = logfmt::to_string(&Request {
//!     method: "GET",
//!     path: "/healthz",
//!     status: 200,
//!     err: None,
//! })
//! .unwrap();
//! assert_eq!(line, "method=GET path=/healthz status=200 err=nil\n");
//! ```

use std::borrow::Cow;
use std::io;

use serde::ser::{self, Impossible, Serialize, Serializer as _};

use crate::{Encoder, Error, Result, Value};

/// Serializes `value` as logfmt records into `writer`.
///
/// # Errors
///
/// Returns an error if `value` does not have a record shape (see the
/// module docs) or the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let mut serializer = Serializer::new(writer);
    value.serialize(&mut serializer)
}

/// Serializes `value` as logfmt records into a byte buffer.
///
/// # Errors
///
/// Returns an error if `value` does not have a record shape.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut buf = Vec::new();
    to_writer(&mut buf, value)?;
    Ok(buf)
}

/// Serializes `value` as logfmt records into a `String`.
///
/// # Errors
///
/// Returns an error if `value` does not have a record shape.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    // the escaper keeps the output valid UTF-8 even for byte values
    String::from_utf8(to_vec(value)?).map_err(Error::custom)
}

/// The logfmt serde serializer.
///
/// Writes through an [`Encoder`]; each serialized map or struct becomes
/// one record.
pub struct Serializer<W: io::Write> {
    enc: Encoder<W>,
    in_seq: bool,
}

impl<W: io::Write> Serializer<W> {
    pub fn new(writer: W) -> Self {
        Serializer {
            enc: Encoder::new(writer),
            in_seq: false,
        }
    }

    /// Consumes the serializer, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.enc.into_inner()
    }
}

fn not_a_record(kind: &str) -> Error {
    Error::custom(format_args!(
        "cannot encode {kind} as a logfmt record; expected a map, struct, or sequence of those"
    ))
}

impl<'a, W: io::Write> ser::Serializer for &'a mut Serializer<W> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = RowsSerializer<'a, W>;
    type SerializeTuple = RowsSerializer<'a, W>;
    type SerializeTupleStruct = Impossible<(), Error>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = RecordSerializer<'a, W>;
    type SerializeStruct = RecordSerializer<'a, W>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(RecordSerializer {
            ser: self,
            key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        self.serialize_map(None)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        if self.in_seq {
            return Err(Error::UnsupportedType("nested sequence"));
        }
        self.in_seq = true;
        Ok(RowsSerializer { ser: self })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> Result<()> {
        Err(not_a_record("a boolean"))
    }

    fn serialize_i8(self, _v: i8) -> Result<()> {
        Err(not_a_record("a number"))
    }

    fn serialize_i16(self, _v: i16) -> Result<()> {
        Err(not_a_record("a number"))
    }

    fn serialize_i32(self, _v: i32) -> Result<()> {
        Err(not_a_record("a number"))
    }

    fn serialize_i64(self, _v: i64) -> Result<()> {
        Err(not_a_record("a number"))
    }

    fn serialize_u8(self, _v: u8) -> Result<()> {
        Err(not_a_record("a number"))
    }

    fn serialize_u16(self, _v: u16) -> Result<()> {
        Err(not_a_record("a number"))
    }

    fn serialize_u32(self, _v: u32) -> Result<()> {
        Err(not_a_record("a number"))
    }

    fn serialize_u64(self, _v: u64) -> Result<()> {
        Err(not_a_record("a number"))
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        Err(not_a_record("a number"))
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        Err(not_a_record("a number"))
    }

    fn serialize_char(self, _v: char) -> Result<()> {
        Err(not_a_record("a character"))
    }

    fn serialize_str(self, _v: &str) -> Result<()> {
        Err(not_a_record("a string"))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        Err(not_a_record("bytes"))
    }

    fn serialize_none(self) -> Result<()> {
        Err(not_a_record("a bare option"))
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(not_a_record("a unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Err(not_a_record("a unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        Err(not_a_record("a unit variant"))
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        Err(not_a_record("an enum variant"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(not_a_record("a tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(not_a_record("an enum variant"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(not_a_record("an enum variant"))
    }
}

/// Serializes the fields of one map or struct as one record.
pub struct RecordSerializer<'a, W: io::Write> {
    ser: &'a mut Serializer<W>,
    key: Option<String>,
}

impl<W: io::Write> RecordSerializer<'_, W> {
    fn write_field(&mut self, key: &str, value: Field) -> Result<()> {
        self.ser.enc.encode_keyval(key, value.into_value())
    }
}

impl<W: io::Write> ser::SerializeMap for RecordSerializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = match key.serialize(FieldSerializer)? {
            Field::Nil => return Err(Error::NilKey),
            Field::Text(s) => s,
            Field::Bytes(b) => String::from_utf8(b).map_err(|_| Error::InvalidKey)?,
        };
        self.key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called before serialize_key"))?;
        let value = value.serialize(FieldSerializer)?;
        self.write_field(&key, value)
    }

    fn end(self) -> Result<()> {
        self.ser.enc.end_record()
    }
}

impl<W: io::Write> ser::SerializeStruct for RecordSerializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = value.serialize(FieldSerializer)?;
        self.write_field(key, value)
    }

    fn end(self) -> Result<()> {
        self.ser.enc.end_record()
    }
}

/// Serializes each element of a top-level sequence as its own record.
pub struct RowsSerializer<'a, W: io::Write> {
    ser: &'a mut Serializer<W>,
}

impl<W: io::Write> RowsSerializer<'_, W> {
    fn serialize_row<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut *self.ser)
    }
}

impl<W: io::Write> ser::SerializeSeq for RowsSerializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.serialize_row(value)
    }

    fn end(self) -> Result<()> {
        self.ser.in_seq = false;
        Ok(())
    }
}

impl<W: io::Write> ser::SerializeTuple for RowsSerializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.serialize_row(value)
    }

    fn end(self) -> Result<()> {
        self.ser.in_seq = false;
        Ok(())
    }
}

/// The reduced form of one field: what the encoder can carry.
enum Field {
    Nil,
    Text(String),
    Bytes(Vec<u8>),
}

impl Field {
    fn into_value(self) -> Value<'static> {
        match self {
            Field::Nil => Value::Nil,
            Field::Text(s) => Value::Str(Cow::Owned(s)),
            Field::Bytes(b) => Value::Bytes(Cow::Owned(b)),
        }
    }
}

/// Reduces a single field value to text, bytes, or nil. Aggregates are
/// rejected here, which is what makes records flat.
struct FieldSerializer;

macro_rules! serialize_display {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<Field> {
                Ok(Field::Text(v.to_string()))
            }
        )*
    };
}

impl ser::Serializer for FieldSerializer {
    type Ok = Field;
    type Error = Error;

    type SerializeSeq = Impossible<Field, Error>;
    type SerializeTuple = Impossible<Field, Error>;
    type SerializeTupleStruct = Impossible<Field, Error>;
    type SerializeTupleVariant = Impossible<Field, Error>;
    type SerializeMap = Impossible<Field, Error>;
    type SerializeStruct = Impossible<Field, Error>;
    type SerializeStructVariant = Impossible<Field, Error>;

    serialize_display! {
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_f32: f32,
        serialize_f64: f64,
        serialize_char: char,
    }

    fn serialize_str(self, v: &str) -> Result<Field> {
        Ok(Field::Text(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Field> {
        Ok(Field::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Field> {
        Ok(Field::Nil)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Field>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Field> {
        Ok(Field::Nil)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Field> {
        Ok(Field::Nil)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Field> {
        Ok(Field::Text(variant.to_owned()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Field>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Field>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::UnsupportedType("enum variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::UnsupportedType("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::UnsupportedType("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Error::UnsupportedType("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::UnsupportedType("enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::UnsupportedType("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Error::UnsupportedType("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::UnsupportedType("enum variant"))
    }
}
