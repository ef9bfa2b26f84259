//! Property-based tests for the codec's round-trip guarantees.
//!
//! These complement the table-driven integration tests by checking the
//! core invariants across generated inputs: escaping is lossless for
//! all valid text, quoting happens exactly when required, and the
//! decoder is total (no panics) over arbitrary bytes.

use proptest::prelude::*;

use logfmt::{escape, needs_quoting, unescape, Decoder, Encoder, Value};

/// Strategy for keys the format can carry verbatim.
fn valid_key() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_./:-]{1,16}").unwrap()
}

/// Encodes one `key=value` record and decodes it back.
fn round_trip_value(key: &str, value: &str) -> (String, Option<String>) {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.encode_keyval(key, value).unwrap();
    enc.end_record().unwrap();
    drop(enc);

    let mut dec = Decoder::new(buf.as_slice());
    let record = dec.read_record().unwrap().unwrap();
    assert!(dec.read_record().unwrap().is_none());
    let kv = record.iter().next().cloned().unwrap();
    (kv.key, kv.value)
}

proptest! {
    /// `unescape(escape(v)) == v` for every valid string, control
    /// characters included.
    #[test]
    fn escape_is_lossless_for_text(s in any::<String>()) {
        let escaped = escape(s.as_bytes());
        if escaped.first() == Some(&b'"') {
            let back = unescape(&escaped).expect("escape produced an undecodable span");
            prop_assert_eq!(back, s.as_bytes());
        } else {
            prop_assert_eq!(&*escaped, s.as_bytes());
        }
    }

    /// Escaped output never contains a raw control byte or newline, so
    /// records stay line-oriented whatever the value.
    #[test]
    fn escaped_output_is_line_safe(s in any::<String>()) {
        let escaped = escape(s.as_bytes());
        prop_assert!(!escaped.iter().any(|&b| b < 0x20));
    }

    /// A value is quoted iff it needs to be: unquoted output must be
    /// the value itself, byte for byte.
    #[test]
    fn quoting_happens_exactly_when_needed(s in any::<String>()) {
        let escaped = escape(s.as_bytes());
        if needs_quoting(s.as_bytes()) {
            prop_assert_eq!(escaped.first(), Some(&b'"'));
            prop_assert_eq!(escaped.last(), Some(&b'"'));
        } else {
            prop_assert_eq!(&*escaped, s.as_bytes());
        }
    }

    /// Full-pipeline round trip for a single keyval: what the encoder
    /// writes, the decoder reads back, with the two documented
    /// asymmetries (an empty value decodes as absent, and there is no
    /// bare-key output).
    #[test]
    fn keyval_round_trips(key in valid_key(), value in any::<String>()) {
        let (k, v) = round_trip_value(&key, &value);
        prop_assert_eq!(k, key);
        let expected = if value.is_empty() { None } else { Some(value) };
        prop_assert_eq!(v, expected);
    }

    /// Multi-pair records survive a round trip, order and duplicates
    /// preserved.
    #[test]
    fn records_round_trip(
        pairs in proptest::collection::vec((valid_key(), any::<String>()), 1..8)
    ) {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        for (k, v) in &pairs {
            enc.encode_keyval(k.as_str(), v.as_str()).unwrap();
        }
        enc.end_record().unwrap();
        drop(enc);

        let mut dec = Decoder::new(buf.as_slice());
        let record = dec.read_record().unwrap().unwrap();
        prop_assert_eq!(record.len(), pairs.len());
        for (kv, (k, v)) in record.iter().zip(&pairs) {
            prop_assert_eq!(&kv.key, k);
            let expected = if v.is_empty() { None } else { Some(v.clone()) };
            prop_assert_eq!(kv.value.clone(), expected);
        }
    }

    /// The decoder is total: arbitrary bytes never panic it, they only
    /// produce records or positioned errors.
    #[test]
    fn decoder_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut dec = Decoder::new(data.as_slice());
        while dec.advance_record().unwrap() {
            while dec.scan_key().is_some() {
                dec.scan_value();
            }
        }
    }

    /// Decoding is deterministic: the owning layer agrees with itself
    /// across runs over the same bytes.
    #[test]
    fn decoding_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let collect = |bytes: &[u8]| {
            let mut dec = Decoder::new(bytes);
            let results: Vec<_> = dec.records().collect();
            results
        };
        prop_assert_eq!(collect(&data), collect(&data));
    }

    /// The `nil` sentinel and the text `nil` stay distinguishable on
    /// the wire.
    #[test]
    fn nil_text_is_disambiguated(key in valid_key()) {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        enc.encode_keyval(key.as_str(), "nil").unwrap();
        enc.encode_keyval(key.as_str(), Value::Nil).unwrap();
        enc.end_record().unwrap();
        drop(enc);

        let mut dec = Decoder::new(buf.as_slice());
        let record = dec.read_record().unwrap().unwrap();
        let values: Vec<_> = record.iter().map(|kv| kv.value.clone()).collect();
        // both decode to the text "nil"; only the quoting differs on
        // the wire
        prop_assert_eq!(values, vec![Some("nil".to_string()), Some("nil".to_string())]);
        let line = String::from_utf8(buf).unwrap();
        prop_assert!(line.contains("=\"nil\""));
        prop_assert!(line.contains("=nil"));
    }
}
