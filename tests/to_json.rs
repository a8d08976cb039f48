use std::collections::BTreeMap;

use jsonic::{json_enum, json_object, to_json, to_json_into};

macro_rules! flat_stringify_tt {
    ({$($tt:tt)*}) => {concat!("{", $(flat_stringify_tt!($tt),)* "}")};
    ([$($tt:tt)*]) => {concat!("[", $(flat_stringify_tt!($tt),)* "]")};
    (($literal:literal)) => {$literal};
    ($tt:tt) => {stringify!($tt)};
}

macro_rules! compact_stringify {
    ($($tt:tt)*) => {concat!($(flat_stringify_tt!{$tt}),*)};
}

macro_rules! assert_object_eq {
    (( $($input:tt)* ), {$($expected:tt)*}) => {
        assert_eq!(
            jsonic::to_json(&$($input)*).as_str(),
            compact_stringify!({$($expected)*})
        )
    };
}

#[test]
fn primitives() {
    assert_eq!(to_json(&true), "true");
    assert_eq!(to_json(&-42i32), "-42");
    assert_eq!(to_json(&18446744073709551615u64), "18446744073709551615");
    assert_eq!(to_json(&1.5f64), "1.5");
    assert_eq!(to_json(&f64::NAN), "null");
    assert_eq!(to_json(&'x'), "\"x\"");
    assert_eq!(to_json("plain"), "\"plain\"");
    assert_eq!(to_json(&None::<u32>), "null");
    assert_eq!(to_json(&Some(7u32)), "7");
}

#[test]
fn string_escaping() {
    assert_eq!(to_json("a\"b"), r#""a\"b""#);
    assert_eq!(to_json("back\\slash"), r#""back\\slash""#);
    assert_eq!(to_json("line\nbreak\ttab"), r#""line\nbreak\ttab""#);
    assert_eq!(to_json("ctrl:\u{1}"), "\"ctrl:\\u0001\"");
    // Multi-byte characters pass through unescaped.
    assert_eq!(to_json("caf\u{e9} \u{1f600}"), "\"caf\u{e9} \u{1f600}\"");
}

#[test]
fn collections() {
    assert_eq!(to_json::<[u32]>(&[]), "[]");
    assert_eq!(to_json(&vec![1, 2, 3]), "[1,2,3]");
    assert_eq!(to_json(&[[1, 2], [3, 4]]), "[[1,2],[3,4]]");

    let mut map = BTreeMap::new();
    map.insert("b".to_string(), vec![2]);
    map.insert("a".to_string(), vec![1]);
    assert_eq!(to_json(&map), r#"{"a":[1],"b":[2]}"#);
}

#[test]
fn structs_and_enums() {
    json_object! {
        struct Inner {
            enabled: bool,
        }
    }
    json_object! {
        struct Outer {
            title as "displayTitle": String,
            inner: Inner,
            notes: Vec<String>,
        }
    }
    json_enum! {
        enum Level {
            Low,
            High,
        }
    }

    assert_object_eq!((Outer {
        title: "hello".into(),
        inner: Inner { enabled: false },
        notes: vec!["a".into()],
    }), {
        "displayTitle": "hello",
        "inner": { "enabled": false },
        "notes": ["a"]
    });
    assert_eq!(to_json(&Level::High), "\"High\"");
}

#[test]
fn tagged_enum_inlines_discriminator() {
    json_object! {
        struct Move {
            dx: i32,
            dy: i32,
        }
    }
    json_enum! {
        enum Action by "op" {
            Move(Move),
        }
    }
    assert_object_eq!((Action::Move(Move { dx: 1, dy: -1 })), {
        "op": "Move",
        "dx": 1,
        "dy": (-1)
    });
}

#[test]
fn output_targets() {
    let mut out = String::from("data = ");
    let appended = to_json_into(&vec![1, 2], &mut out);
    assert_eq!(appended, "[1,2]");
    assert_eq!(out, "data = [1,2]");

    let mut sink: Vec<u8> = Vec::new();
    let written = to_json_into("abc", &mut sink);
    assert_eq!(written, "\"abc\"");
    assert_eq!(sink, b"\"abc\"");

    let mut file_like: Vec<u8> = Vec::new();
    {
        let mut writer: &mut (dyn std::io::Write + Send) = &mut file_like;
        let written = to_json_into(&7u8, writer);
        assert_eq!(written.unwrap(), 1);
    }
    assert_eq!(file_like, b"7");
}

#[test]
fn round_trips_through_decoder() {
    json_object! {
        #[derive(Debug, PartialEq, Clone)]
        struct Message {
            id: u64,
            body: String,
            tags: Vec<String>,
            score: Option<f64> = None,
        }
    }
    let message = Message {
        id: 17,
        body: "quote \" and \\ newline \n".into(),
        tags: vec!["a".into(), "b/c".into()],
        score: Some(0.5),
    };
    let text = to_json(&message);
    let back: Message = jsonic::from_json(&text).unwrap();
    assert_eq!(back, message);
}
