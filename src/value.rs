//! Dynamic operand representation for the encoder.
//!
//! The encoder formats keys and values whose concrete types are not known
//! to it. Rather than inspecting runtime capabilities, every operand is
//! resolved at the call boundary into the closed [`Value`] union, and the
//! encoder dispatches over its variants:
//!
//! - [`Value::Nil`]: a null/absent operand; rejected for keys, written
//!   as the `nil` token for values. `From<Option<T>>` maps `None` here,
//!   so nullable references resolve before dispatch.
//! - [`Value::Str`]: native text, written verbatim or quoted as needed.
//!   Primitive conversions (integers, floats, booleans, chars) pre-render
//!   into this variant.
//! - [`Value::Bytes`]: raw byte spans, as produced by the decoder;
//!   invalid UTF-8 is escaped on output rather than passed through.
//! - [`Value::Render`]: a type carrying its own canonical text form via
//!   the [`Render`] hook. Timestamps are the archetype: `DateTime`
//!   renders as RFC 3339.
//! - [`Value::Display`]: a type whose [`std::fmt::Display`] output is
//!   its textual form. `BigInt` routes through this arm.
//! - [`Value::Composite`]: sequences, mappings, aggregates, and handles,
//!   which have no logfmt representation and always fail with
//!   [`UnsupportedType`](crate::Error::UnsupportedType).
//!
//! # Examples
//!
//! ```rust
//! use logfmt::Value;
//!
//! let v = Value::from("text");
//! assert!(matches!(v, Value::Str(_)));
//!
//! let v = Value::from(Option::<i32>::None);
//! assert!(v.is_nil());
//! ```

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone};
use num_bigint::{BigInt, BigUint};

use crate::Result;

/// A custom text-rendering capability for encoder operands.
///
/// Implement this for types that own a canonical textual form. The
/// contract is defensive by construction: `try_render` returning
/// `Ok(None)` means the underlying holder is nil, and the encoder maps that
/// outcome to [`NilKey`](crate::Error::NilKey) for keys and to the `nil`
/// token for values, without ever invoking rendering logic on absent
/// data. Any `Err` is a genuine failure and propagates unchanged.
///
/// `Option<T: Render>` implements the hook with `None => Ok(None)`, so a
/// nullable holder of a renderable type needs no extra code.
///
/// # Examples
///
/// ```rust
/// use logfmt::{Render, Result};
///
/// struct Decimal {
///     units: u32,
///     tenths: u32,
/// }
///
/// impl Render for Decimal {
///     fn try_render(&self) -> Result<Option<String>> {
///         Ok(Some(format!("{}.{}", self.units, self.tenths)))
///     }
/// }
/// ```
pub trait Render {
    /// Returns the rendered text, or `Ok(None)` when the underlying
    /// holder is nil.
    fn try_render(&self) -> Result<Option<String>>;
}

impl<T: Render> Render for Option<T> {
    fn try_render(&self) -> Result<Option<String>> {
        match self {
            Some(inner) => inner.try_render(),
            None => Ok(None),
        }
    }
}

impl<T: Render + ?Sized> Render for &T {
    fn try_render(&self) -> Result<Option<String>> {
        (**self).try_render()
    }
}

impl<Tz: TimeZone> Render for DateTime<Tz>
where
    Tz::Offset: fmt::Display,
{
    fn try_render(&self) -> Result<Option<String>> {
        Ok(Some(self.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
    }
}

/// A dynamically-typed operand for [`Encoder::encode_keyval`].
///
/// [`Encoder::encode_keyval`]: crate::Encoder::encode_keyval
#[derive(Clone)]
pub enum Value<'a> {
    /// A null/absent operand.
    Nil,
    /// Native text.
    Str(Cow<'a, str>),
    /// A raw byte span, escaped as needed on output.
    Bytes(Cow<'a, [u8]>),
    /// A type with a custom text-rendering capability.
    Render(&'a dyn Render),
    /// A type whose `Display` output is its textual form.
    Display(&'a dyn fmt::Display),
    /// A composite shape with no logfmt representation; the tag names
    /// the shape for diagnostics.
    Composite(&'static str),
}

impl<'a> Value<'a> {
    /// Wraps a [`Render`] implementor.
    pub fn render(value: &'a impl Render) -> Self {
        Value::Render(value)
    }

    /// Wraps a [`fmt::Display`] implementor.
    pub fn display(value: &'a impl fmt::Display) -> Self {
        Value::Display(value)
    }

    /// Marks a composite shape; `shape` names it in the resulting
    /// [`UnsupportedType`](crate::Error::UnsupportedType) error.
    #[must_use]
    pub const fn composite(shape: &'static str) -> Self {
        Value::Composite(shape)
    }

    /// Returns `true` for [`Value::Nil`].
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("Nil"),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            Value::Render(_) => f.write_str("Render(..)"),
            Value::Display(_) => f.write_str("Display(..)"),
            Value::Composite(shape) => f.debug_tuple("Composite").field(shape).finish(),
        }
    }
}

/// Reborrows a `Value` without copying owned contents.
impl<'a: 'b, 'b> From<&'b Value<'a>> for Value<'b> {
    fn from(value: &'b Value<'a>) -> Self {
        match value {
            Value::Nil => Value::Nil,
            Value::Str(s) => Value::Str(Cow::Borrowed(s.as_ref())),
            Value::Bytes(b) => Value::Bytes(Cow::Borrowed(b.as_ref())),
            Value::Render(r) => Value::Render(*r),
            Value::Display(d) => Value::Display(*d),
            Value::Composite(shape) => Value::Composite(*shape),
        }
    }
}

impl From<()> for Value<'_> {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => Value::Nil,
        }
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Str(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(value: &'a String) -> Self {
        Value::Str(Cow::Borrowed(value))
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Value::Str(Cow::Owned(value))
    }
}

impl<'a> From<Cow<'a, str>> for Value<'a> {
    fn from(value: Cow<'a, str>) -> Self {
        Value::Str(value)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(value: &'a [u8]) -> Self {
        Value::Bytes(Cow::Borrowed(value))
    }
}

impl From<Vec<u8>> for Value<'_> {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(Cow::Owned(value))
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Str(Cow::Borrowed(if value { "true" } else { "false" }))
    }
}

impl From<char> for Value<'_> {
    fn from(value: char) -> Self {
        Value::Str(Cow::Owned(value.to_string()))
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(value: $ty) -> Self {
                    Value::Str(Cow::Owned(value.to_string()))
                }
            }
        )*
    };
}

impl_from_primitive!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl<'a, Tz: TimeZone> From<&'a DateTime<Tz>> for Value<'a>
where
    Tz::Offset: fmt::Display,
{
    fn from(value: &'a DateTime<Tz>) -> Self {
        Value::Render(value)
    }
}

impl<'a> From<&'a BigInt> for Value<'a> {
    fn from(value: &'a BigInt) -> Self {
        Value::Display(value)
    }
}

impl<'a> From<&'a BigUint> for Value<'a> {
    fn from(value: &'a BigUint) -> Self {
        Value::Display(value)
    }
}
