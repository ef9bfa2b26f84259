//! The `keyvals!` macro.

/// Encodes an alternating key/value argument list as one logfmt record.
///
/// Each argument is converted with [`Value::from`], so keys and values
/// may be of mixed types. Expands to a call to [`encode_keyvals`] and
/// yields `Result<Vec<u8>>`; like that function, an odd trailing key is
/// paired with `nil` and no newline is appended.
///
/// # Examples
///
/// ```rust
/// use logfmt::keyvals;
///
/// let buf = keyvals!("level", "info", "took_ms", 42).unwrap();
/// assert_eq!(buf, b"level=info took_ms=42");
///
/// let buf = keyvals!("orphan").unwrap();
/// assert_eq!(buf, b"orphan=nil");
/// ```
///
/// [`Value::from`]: crate::Value
/// [`encode_keyvals`]: crate::encode_keyvals
#[macro_export]
macro_rules! keyvals {
    () => {
        $crate::encode_keyvals(&[] as &[$crate::Value])
    };
    ($($part:expr),+ $(,)?) => {
        $crate::encode_keyvals(&[$($crate::Value::from($part)),+])
    };
}
