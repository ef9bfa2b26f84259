//! Decoder integration tests: token scanning, error positions, and the
//! decode-then-encode passthrough.

use logfmt::{Decoder, Encoder, Error, SyntaxError, Value};

type Kvs = Vec<(String, Option<String>)>;

/// Scans `input` to completion with the borrowed scan API, panicking on
/// any lexical fault.
fn parse(input: &str) -> Vec<Kvs> {
    let mut dec = Decoder::new(input.as_bytes());
    let mut records = Vec::new();
    while dec.advance_record().unwrap() {
        let mut kvs = Kvs::new();
        loop {
            let key = match dec.scan_key() {
                Some(key) => String::from_utf8(key.to_vec()).unwrap(),
                None => break,
            };
            let value = dec
                .scan_value()
                .map(|v| String::from_utf8_lossy(v).into_owned());
            kvs.push((key, value));
        }
        assert!(
            dec.last_error().is_none(),
            "unexpected error in {input:?}: {:?}",
            dec.last_error()
        );
        records.push(kvs);
    }
    records
}

fn kvs(pairs: &[(&str, Option<&str>)]) -> Kvs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
        .collect()
}

/// Scans `input` to completion and returns the first lexical fault.
fn first_error(input: &str) -> Option<Error> {
    let mut dec = Decoder::new(input.as_bytes());
    while dec.advance_record().unwrap() {
        while dec.scan_key().is_some() {
            dec.scan_value();
        }
        if let Some(err) = dec.last_error() {
            return Some(err.clone());
        }
    }
    None
}

#[test]
fn scans_empty_input() {
    assert!(parse("").is_empty());
}

#[test]
fn scans_blank_lines_as_empty_records() {
    assert_eq!(parse("\n\n"), vec![kvs(&[]), kvs(&[])]);
}

#[test]
fn scans_absent_values() {
    assert_eq!(parse("x= "), vec![kvs(&[("x", None)])]);
    assert_eq!(parse("y="), vec![kvs(&[("y", None)])]);
    assert_eq!(parse("y"), vec![kvs(&[("y", None)])]);
}

#[test]
fn scans_simple_values() {
    assert_eq!(parse("y=f"), vec![kvs(&[("y", Some("f"))])]);
    assert_eq!(parse("a=1\n"), vec![kvs(&[("a", Some("1"))])]);
}

#[test]
fn scans_quoted_values() {
    assert_eq!(parse("y=\"\\tf\""), vec![kvs(&[("y", Some("\tf"))])]);
    assert_eq!(parse("y=\"f\"\ny=g"), parse("y=f\ny=g"));
}

#[test]
fn quoted_empty_value_is_present_but_empty() {
    assert_eq!(parse("k=\"\""), vec![kvs(&[("k", Some(""))])]);
}

#[test]
fn scans_one_line_with_every_token_shape() {
    assert_eq!(
        parse("a=1 b=\"bar\" ƒ=2h3s r=\"esc\\t\" d x=sf   "),
        vec![kvs(&[
            ("a", Some("1")),
            ("b", Some("bar")),
            ("ƒ", Some("2h3s")),
            ("r", Some("esc\t")),
            ("d", None),
            ("x", Some("sf")),
        ])]
    );
}

#[test]
fn scans_multiple_records() {
    assert_eq!(
        parse("y=f\ny=g"),
        vec![kvs(&[("y", Some("f"))]), kvs(&[("y", Some("g"))])]
    );
    assert_eq!(
        parse("a=1\nb=2\n"),
        vec![kvs(&[("a", Some("1"))]), kvs(&[("b", Some("2"))])]
    );
}

#[test]
fn skips_control_bytes_between_tokens() {
    assert_eq!(
        parse("y=f  \n\x1e y=g"),
        vec![kvs(&[("y", Some("f"))]), kvs(&[("y", Some("g"))])]
    );
}

#[test]
fn absent_value_before_more_pairs() {
    assert_eq!(
        parse("y= d y=g"),
        vec![kvs(&[("y", None), ("d", None), ("y", Some("g"))])]
    );
}

#[test]
fn quote_closure_ends_the_token() {
    // no separating space after the closing quote
    assert_eq!(
        parse("y=\"f\\n\"y=g"),
        vec![kvs(&[("y", Some("f\n")), ("y", Some("g"))])]
    );
}

#[test]
fn small_read_buffers_do_not_change_tokenization() {
    let input = "y=f ".repeat(5);
    let mut dec = Decoder::with_capacity(21, input.as_bytes());
    assert!(dec.advance_record().unwrap());
    let mut count = 0;
    while dec.scan_key().is_some() {
        assert_eq!(dec.scan_value(), Some(&b"f"[..]));
        count += 1;
    }
    assert_eq!(count, 5);
    assert!(dec.last_error().is_none());
}

#[test]
fn reports_positioned_errors() {
    let cases: &[(&str, &str, usize, usize)] = &[
        ("a=1\n=bar", "unexpected '='", 2, 1),
        ("a=1\n\"k\"=bar", "unexpected '\"'", 2, 1),
        ("a=1\nk\"ey=bar", "unexpected '\"'", 2, 2),
        ("a=1\nk=b\"ar", "unexpected '\"'", 2, 4),
        ("a=1\nk=b =ar", "unexpected '='", 2, 5),
        ("a==", "unexpected '='", 1, 3),
        ("a=1\nk=b=ar", "unexpected '='", 2, 4),
        ("a=\"1", "unterminated quoted value", 1, 5),
        ("a=\"1\\", "unterminated quoted value", 1, 6),
        ("a=\"\\t1", "unterminated quoted value", 1, 7),
        ("a=\"\\u1\"", "invalid quoted value", 1, 8),
        ("a\u{FFFD}=bar", "invalid key", 1, 5),
        ("\u{FFFD}=bar", "invalid key", 1, 4),
    ];
    for &(input, msg, line, column) in cases {
        let err = first_error(input)
            .unwrap_or_else(|| panic!("no error for {input:?}, want {msg:?}"));
        assert_eq!(
            err.as_syntax(),
            Some(&SyntaxError {
                msg: msg.to_string(),
                line,
                column,
            }),
            "input {input:?}"
        );
    }
}

#[test]
fn reports_invalid_utf8_keys() {
    assert!(first_error("ab=1").is_none());

    let mut dec = Decoder::new(&b"\x80=bar"[..]);
    assert!(dec.advance_record().unwrap());
    assert!(dec.scan_key().is_none());
    assert_eq!(
        dec.last_error().unwrap().as_syntax(),
        Some(&SyntaxError {
            msg: "invalid key".to_string(),
            line: 1,
            column: 2,
        })
    );

    // bare invalid byte at end of line
    let mut dec = Decoder::new(&b"\x80"[..]);
    assert!(dec.advance_record().unwrap());
    assert!(dec.scan_key().is_none());
    assert_eq!(dec.last_error().unwrap().as_syntax().unwrap().column, 2);
}

#[test]
fn lexical_faults_end_only_their_own_record() {
    let mut dec = Decoder::new(&b"=bad\nok=1\n"[..]);

    assert!(dec.advance_record().unwrap());
    assert!(dec.scan_key().is_none());
    assert!(dec.last_error().is_some());
    // the error is sticky for this record
    assert!(dec.scan_key().is_none());
    assert!(dec.scan_value().is_none());

    // the next advance clears it and scanning resumes
    assert!(dec.advance_record().unwrap());
    assert!(dec.last_error().is_none());
    assert_eq!(dec.scan_key(), Some(&b"ok"[..]));
    assert_eq!(dec.scan_value(), Some(&b"1"[..]));
}

#[test]
fn read_record_surfaces_faults_and_recovers() {
    let mut dec = Decoder::new(&b"a=1\n=bad\nb=2\n"[..]);
    assert_eq!(
        dec.read_record().unwrap().unwrap().get("a"),
        Some(Some("1"))
    );
    let err = dec.read_record().unwrap_err();
    assert_eq!(err.as_syntax().unwrap().line, 2);
    assert_eq!(
        dec.read_record().unwrap().unwrap().get("b"),
        Some(Some("2"))
    );
    assert!(dec.read_record().unwrap().is_none());
}

#[test]
fn records_iterator_yields_faults_inline() {
    let mut dec = Decoder::new(&b"a=1\n=bad\nb=2\n"[..]);
    let results: Vec<_> = dec.records().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2].is_ok());
}

#[test]
fn decode_then_encode_passthrough() {
    let cases: &[(&str, &str)] = &[
        ("", ""),
        ("\n", "\n"),
        ("\n  \n", "\n\n"),
        ("a=1\nb=2\n", "a=1\nb=2\n"),
        // the absent value comes back as the nil token: the encoder
        // never emits a bare key
        (
            "a=1 b=\"bar\" ƒ=2h3s r=\"esc\\t\" d x=sf   ",
            "a=1 b=bar ƒ=2h3s r=\"esc\\t\" d=nil x=sf\n",
        ),
    ];

    for &(input, want) in cases {
        let mut dec = Decoder::new(input.as_bytes());
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        while dec.advance_record().unwrap() {
            loop {
                let key = match dec.scan_key() {
                    Some(key) => key.to_vec(),
                    None => break,
                };
                let owned = dec.scan_value().map(<[u8]>::to_vec);
                let value = match &owned {
                    Some(v) => Value::from(v.as_slice()),
                    None => Value::Nil,
                };
                enc.encode_keyval(key.as_slice(), value).unwrap();
            }
            enc.end_record().unwrap();
        }
        drop(enc);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            want,
            "passthrough of {input:?}"
        );
    }
}

#[test]
fn spans_survive_until_the_next_advance() {
    let mut dec = Decoder::new(&b"a=\"x y\"\n"[..]);
    assert!(dec.advance_record().unwrap());
    assert_eq!(dec.scan_key(), Some(&b"a"[..]));
    assert_eq!(dec.scan_value(), Some(&b"x y"[..]));
}
