//! Quoted-string escaping and unescaping.
//!
//! This module is the pure lexical helper shared by the [`Decoder`] and
//! [`Encoder`]: it converts a raw byte span to and from the format's
//! quoted representation. Quoting is applied only when a value cannot
//! survive a decode round-trip verbatim: when it contains whitespace,
//! `=`, `"`, control bytes, bytes that are not valid UTF-8, or is exactly
//! the text `nil` (which would otherwise be read back as the null-value
//! sentinel).
//!
//! Inside quotes the escape grammar is the common string-literal
//! convention: `\"`, `\\`, `\/`, `\b`, `\f`, `\n`, `\r`, `\t`, and
//! `\uXXXX` with surrogate-pair combination for characters outside the
//! basic plane.
//!
//! [`Decoder`]: crate::Decoder
//! [`Encoder`]: crate::Encoder

use std::borrow::Cow;
use std::str;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Reports whether `value` must be quoted to survive a decode
/// round-trip.
///
/// # Examples
///
/// ```rust
/// use logfmt::needs_quoting;
///
/// assert!(!needs_quoting(b"plain"));
/// assert!(needs_quoting(b"two words"));
/// assert!(needs_quoting(b"a=b"));
/// assert!(needs_quoting(b"nil"));
/// assert!(!needs_quoting(b""));
/// ```
#[must_use]
pub fn needs_quoting(value: &[u8]) -> bool {
    if value == b"nil" {
        return true;
    }
    match str::from_utf8(value) {
        Ok(s) => s
            .chars()
            .any(|c| c <= ' ' || c == '=' || c == '"' || c == '\u{FFFD}'),
        Err(_) => true,
    }
}

/// Escapes `value` for output, quoting only when required.
///
/// Returns the input verbatim when [`needs_quoting`] is false, otherwise
/// an owned quoted span in which `"`, `\`, control bytes, and invalid
/// UTF-8 sequences are escaped. Invalid bytes become the `\ufffd`
/// escape so that the output stream is always valid text; everything
/// else round-trips byte-exactly through [`unescape`].
///
/// # Examples
///
/// ```rust
/// use logfmt::escape;
///
/// assert_eq!(&*escape(b"plain"), b"plain");
/// assert_eq!(&*escape(b"two words"), b"\"two words\"");
/// assert_eq!(&*escape(b"tab\there"), b"\"tab\\there\"");
/// ```
#[must_use]
pub fn escape(value: &[u8]) -> Cow<'_, [u8]> {
    if !needs_quoting(value) {
        return Cow::Borrowed(value);
    }
    let mut out = Vec::with_capacity(value.len() + 2);
    write_quoted(&mut out, value);
    Cow::Owned(out)
}

/// Appends the quoted form of `value` to `out`, delimiters included.
pub(crate) fn write_quoted(out: &mut Vec<u8>, value: &[u8]) {
    out.push(b'"');
    let mut rest = value;
    loop {
        match str::from_utf8(rest) {
            Ok(s) => {
                escape_text(out, s);
                break;
            }
            Err(err) => {
                let valid = err.valid_up_to();
                if let Ok(s) = str::from_utf8(&rest[..valid]) {
                    escape_text(out, s);
                }
                out.extend_from_slice(b"\\ufffd");
                rest = &rest[valid + 1..];
            }
        }
    }
    out.push(b'"');
}

fn escape_text(out: &mut Vec<u8>, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(b"\\u00");
                out.push(HEX[(c as usize >> 4) & 0xf]);
                out.push(HEX[c as usize & 0xf]);
            }
            // U+2028 and U+2029 are line separators in some consumers.
            '\u{2028}' => out.extend_from_slice(b"\\u2028"),
            '\u{2029}' => out.extend_from_slice(b"\\u2029"),
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
}

/// Decodes a quoted span, delimiters included, into its raw content.
///
/// Returns `None` when the span is not a well-formed quoted value: a
/// missing delimiter, an unknown escape letter, a truncated or malformed
/// `\uXXXX` sequence, an unpaired surrogate, a stray unescaped `"`, or a
/// literal control byte. Invalid UTF-8 in literal position is replaced
/// with U+FFFD rather than rejected.
///
/// # Examples
///
/// ```rust
/// use logfmt::unescape;
///
/// assert_eq!(unescape(b"\"esc\\t\"").unwrap(), b"esc\t");
/// assert_eq!(unescape(b"\"\\u0041\"").unwrap(), b"A");
/// assert!(unescape(b"\"\\u1\"").is_none());
/// ```
#[must_use]
pub fn unescape(quoted: &[u8]) -> Option<Vec<u8>> {
    let inner = quoted.strip_prefix(b"\"")?.strip_suffix(b"\"")?;
    let mut out = Vec::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        let c = inner[i];
        match c {
            b'\\' => {
                i += 1;
                let e = *inner.get(i)?;
                i += 1;
                match e {
                    b'"' | b'\\' | b'/' => out.push(e),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'u' => {
                        let ch = unescape_unicode(inner, &mut i)?;
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    }
                    _ => return None,
                }
            }
            b'"' => return None,
            c if c < 0x20 => return None,
            c if c < 0x80 => {
                out.push(c);
                i += 1;
            }
            _ => {
                // Literal multi-byte character; invalid sequences decode
                // to U+FFFD one byte at a time.
                let window = &inner[i..(i + 4).min(inner.len())];
                let valid = match str::from_utf8(window) {
                    Ok(_) => window.len(),
                    Err(err) => err.valid_up_to(),
                };
                if valid == 0 {
                    out.extend_from_slice("\u{FFFD}".as_bytes());
                    i += 1;
                } else {
                    let ch = str::from_utf8(&window[..valid])
                        .ok()
                        .and_then(|s| s.chars().next())?;
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    i += ch.len_utf8();
                }
            }
        }
    }
    Some(out)
}

/// Decodes the `XXXX` of a `\uXXXX` escape starting at `inner[*i]`,
/// consuming a trailing low-surrogate escape when the first unit is a
/// high surrogate.
fn unescape_unicode(inner: &[u8], i: &mut usize) -> Option<char> {
    let unit = hex4(inner.get(*i..*i + 4)?)?;
    *i += 4;
    match unit {
        0xD800..=0xDBFF => {
            if inner.get(*i..*i + 2)? != b"\\u" {
                return None;
            }
            let low = hex4(inner.get(*i + 2..*i + 6)?)?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return None;
            }
            *i += 6;
            char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00))
        }
        0xDC00..=0xDFFF => None,
        _ => char::from_u32(unit),
    }
}

fn hex4(digits: &[u8]) -> Option<u32> {
    let mut v = 0u32;
    for &d in digits {
        v = v * 16 + (d as char).to_digit(16)?;
    }
    Some(v)
}
