//! Declarative typed-object binding.
//!
//! [`json_object!`] and [`json_enum!`] generate `FromJson`/`ToJson`
//! implementations for plain structs and enums. Each generated decoder
//! builds its [`crate::dispatch::FieldTable`] on first use and shares it
//! through a `OnceLock`, so the probing work happens once per type for the
//! life of the process.

use std::borrow::Cow;

use crate::error::*;
use crate::parser::Parser;

type JsonResult<T> = Result<T, &'static DecodeError>;

/// Scans the upcoming object for the discriminator key and returns its
/// string value, leaving the cursor past the scanned object.
///
/// The first occurrence wins; the caller rewinds to the snapshot taken
/// before the scan and decodes the object as the resolved subtype.
#[doc(hidden)]
pub fn scan_discriminator<'j>(
    parser: &mut Parser<'j>,
    tag: &str,
) -> JsonResult<Option<Cow<'j, str>>> {
    if parser.enter_object_at_first_key()?.is_none() {
        return Ok(None);
    }
    loop {
        let key = parser.read_key_cow()?;
        parser.discard_colon()?;
        if key == tag {
            let value = parser.take_cow_string()?;
            parser.discard_remaining_object_fields()?;
            return Ok(Some(value));
        }
        parser.skip_value()?;
        if parser.object_step_at_key()?.is_none() {
            return Ok(None);
        }
    }
}

/// Defines a struct with generated `FromJson` and `ToJson` implementations.
///
/// Unknown keys are skipped, duplicate keys are an error, and fields absent
/// from the document are an error unless they declare a fallback with
/// `= expr`. A field can serialize under a different key with `as "key"`.
///
/// ```
/// jsonic::json_object! {
///     #[derive(Debug, PartialEq)]
///     pub struct Server {
///         host: String,
///         port: u16,
///         retries: u32 = 3,
///         name as "displayName": Option<String> = None,
///     }
/// }
///
/// let server: Server = jsonic::from_json(
///     r#"{"host": "localhost", "port": 8080}"#,
/// ).unwrap();
/// assert_eq!(server.retries, 3);
/// ```
#[macro_export]
macro_rules! json_object {
    (@name $field:ident) => {
        stringify!($field)
    };
    (@name $field:ident as $alias:literal) => {
        $alias
    };
    (@fallback $parser:ident, $name:expr) => {{
        $parser.report_error(format!("missing required field '{}'", $name));
        return Err(&$crate::error::MISSING_REQUIRED_FIELDS);
    }};
    (@fallback $parser:ident, $name:expr, = $default:expr) => {
        $default
    };
    (@decode_at $parser:ident, $index:ident, $counter:expr,) => {
        $parser.skip_value()?
    };
    (@decode_at $parser:ident, $index:ident, $counter:expr,
        ($field:ident, $name:expr) $($rest:tt)*
    ) => {
        // Constant-folded counters; arm selection is by index, never by
        // comparing key text.
        if $index == $counter {
            if $field.is_some() {
                $parser.report_error(format!("duplicate field '{}'", $name));
                return Err(&$crate::error::DUPLICATE_FIELD);
            }
            $parser.set_parent_context_key($name);
            $field = Some($crate::FromJson::json_decode($parser)?);
            $parser.clear_parent_context();
        } else {
            $crate::json_object!(
                @decode_at $parser, $index, $counter + 1usize, $($rest)*
            )
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $field:ident $(as $alias:literal)? : $ty:ty $(= $default:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($vis $field: $ty,)*
        }

        impl<'a> $crate::FromJson<'a> for $name {
            fn json_decode(
                parser: &mut $crate::parser::Parser<'a>,
            ) -> Result<Self, &'static $crate::error::DecodeError> {
                static TABLE: std::sync::OnceLock<$crate::dispatch::FieldTable> =
                    std::sync::OnceLock::new();
                static NAMES: &[&str] = &[
                    $($crate::json_object!(@name $field $(as $alias)?),)*
                ];
                let table = TABLE.get_or_init(|| $crate::dispatch::FieldTable::build(NAMES));

                $(let mut $field: Option<$ty> = None;)*
                if parser.enter_object_at_first_key()?.is_some() {
                    loop {
                        let key = parser.read_key_cow()?;
                        let resolved = table.resolve(
                            key.as_bytes(),
                            parser.config.strict_key_verification,
                        );
                        parser.discard_colon()?;
                        match resolved {
                            Some(index) => $crate::json_object!(
                                @decode_at parser, index, 0usize,
                                $((
                                    $field,
                                    $crate::json_object!(@name $field $(as $alias)?)
                                ))*
                            ),
                            None => parser.skip_value()?,
                        }
                        if parser.object_step_at_key()?.is_none() {
                            break;
                        }
                    }
                }
                Ok($name {
                    $($field: match $field {
                        Some(value) => value,
                        None => $crate::json_object!(
                            @fallback parser,
                            $crate::json_object!(@name $field $(as $alias)?)
                            $(, = $default)?
                        ),
                    },)*
                })
            }
        }

        impl $crate::ToJson for $name {
            type Kind = $crate::json::AlwaysObject;
            fn json_encode(
                &self,
                output: &mut $crate::TextWriter,
            ) -> $crate::json::AlwaysObject {
                output.start_json_object();
                $(
                    $crate::ToJson::json_encode(
                        $crate::json_object!(@name $field $(as $alias)?),
                        output,
                    );
                    output.push_colon();
                    $crate::ToJson::json_encode(&self.$field, output);
                    output.push_comma();
                )*
                output.end_json_object()
            }
        }
    };
}

/// Defines an enum with generated `FromJson` and `ToJson` implementations.
///
/// Two shapes are supported. A plain variant list maps each variant to its
/// name as a JSON string. A `by "tag"` enum wraps one payload type per
/// variant: decoding scans the object for the discriminator once, rewinds,
/// and decodes the object as the resolved payload; encoding inlines the
/// discriminator into the payload's object.
///
/// ```
/// jsonic::json_object! {
///     #[derive(Debug, PartialEq)]
///     pub struct Circle { radius: f64 }
/// }
/// jsonic::json_object! {
///     #[derive(Debug, PartialEq)]
///     pub struct Rect { w: f64, h: f64 }
/// }
/// jsonic::json_enum! {
///     #[derive(Debug, PartialEq)]
///     pub enum Shape by "kind" {
///         Circle(Circle),
///         Rect(Rect),
///     }
/// }
///
/// let shape: Shape = jsonic::from_json(
///     r#"{"kind": "Circle", "radius": 2.0}"#,
/// ).unwrap();
/// assert_eq!(shape, Shape::Circle(Circle { radius: 2.0 }));
/// ```
#[macro_export]
macro_rules! json_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($variant,)*
        }

        impl<'a> $crate::FromJson<'a> for $name {
            fn json_decode(
                parser: &mut $crate::parser::Parser<'a>,
            ) -> Result<Self, &'static $crate::error::DecodeError> {
                match parser.take_string()? {
                    $(stringify!($variant) => Ok($name::$variant),)*
                    _ => Err(&$crate::error::UNKNOWN_VARIANT),
                }
            }
        }

        impl $crate::ToJson for $name {
            type Kind = $crate::json::AlwaysString;
            fn json_encode(
                &self,
                output: &mut $crate::TextWriter,
            ) -> $crate::json::AlwaysString {
                match self {
                    $($name::$variant => {
                        $crate::ToJson::json_encode(stringify!($variant), output)
                    })*
                }
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident by $tag:literal {
            $($variant:ident ( $ty:ty )),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($variant($ty),)*
        }

        impl<'a> $crate::FromJson<'a> for $name {
            fn json_decode(
                parser: &mut $crate::parser::Parser<'a>,
            ) -> Result<Self, &'static $crate::error::DecodeError> {
                let snapshot = parser.snapshot();
                let Some(tag) = $crate::object::scan_discriminator(parser, $tag)? else {
                    return Err(&$crate::error::MISSING_DISCRIMINATOR);
                };
                match tag.as_ref() {
                    $(stringify!($variant) => {
                        parser.restore_for_retry(&snapshot);
                        Ok($name::$variant($crate::FromJson::json_decode(parser)?))
                    })*
                    _ => Err(&$crate::error::UNKNOWN_VARIANT),
                }
            }
        }

        impl $crate::ToJson for $name {
            type Kind = $crate::json::AlwaysObject;
            fn json_encode(
                &self,
                output: &mut $crate::TextWriter,
            ) -> $crate::json::AlwaysObject {
                match self {
                    $($name::$variant(inner) => {
                        output.start_json_object();
                        $crate::ToJson::json_encode($tag, output);
                        output.push_colon();
                        $crate::ToJson::json_encode(stringify!($variant), output);
                        output.push_comma();
                        output.join_parent_json_value_with_next();
                        $crate::ToJson::json_encode(inner, output)
                    })*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{from_json, to_json, JsonParserConfig};

    json_object! {
        #[derive(Debug, PartialEq)]
        struct Point {
            x: i32,
            y: i32,
        }
    }

    json_object! {
        #[derive(Debug, PartialEq)]
        struct Account {
            id: u64,
            email as "emailAddress": String,
            active: bool = true,
            nickname: Option<String> = None,
        }
    }

    json_enum! {
        #[derive(Debug, PartialEq, Clone, Copy)]
        enum Mode {
            Fast,
            Thorough,
        }
    }

    json_object! {
        #[derive(Debug, PartialEq)]
        struct Circle {
            radius: f64,
        }
    }

    json_object! {
        #[derive(Debug, PartialEq)]
        struct Rect {
            w: f64,
            h: f64,
        }
    }

    json_enum! {
        #[derive(Debug, PartialEq)]
        enum Shape by "type" {
            Circle(Circle),
            Rect(Rect),
        }
    }

    #[test]
    fn struct_round_trip() {
        let point: Point = from_json(r#"{"x": 1, "y": -2}"#).unwrap();
        assert_eq!(point, Point { x: 1, y: -2 });
        assert_eq!(to_json(&point), r#"{"x":1,"y":-2}"#);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let point: Point =
            from_json(r#"{"z": [1, {"deep": true}], "x": 1, "extra": "s", "y": 2}"#).unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });

        // Unknown keys whose masked hash lands on an occupied slot must be
        // skipped, not bound to the colliding field.
        let point: Point = from_json(r#"{"t": 9, "xx": 8, "x": 1, "y": 2}"#).unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
    }

    #[test]
    fn missing_required_field_errors() {
        let err = from_json::<Point>(r#"{"x": 1}"#).unwrap_err();
        assert!(err.to_string().contains("Missing required fields"));
        assert!(err.to_string().contains("'y'"));
    }

    #[test]
    fn duplicate_field_errors() {
        let err = from_json::<Point>(r#"{"x": 1, "x": 2, "y": 3}"#).unwrap_err();
        assert!(err.to_string().contains("Duplicate field"));
    }

    #[test]
    fn defaults_and_renames() {
        let account: Account =
            from_json(r#"{"id": 7, "emailAddress": "a@b.c"}"#).unwrap();
        assert_eq!(
            account,
            Account {
                id: 7,
                email: "a@b.c".into(),
                active: true,
                nickname: None,
            }
        );
        assert_eq!(
            to_json(&account),
            r#"{"id":7,"emailAddress":"a@b.c","active":true,"nickname":null}"#
        );
    }

    #[test]
    fn unit_enum_round_trip() {
        let mode: Mode = from_json(r#""Fast""#).unwrap();
        assert_eq!(mode, Mode::Fast);
        assert_eq!(to_json(&Mode::Thorough), r#""Thorough""#);
        assert!(from_json::<Mode>(r#""Sideways""#).is_err());
    }

    #[test]
    fn tagged_enum_decodes_by_discriminator() {
        let shape: Shape = from_json(r#"{"w": 2.0, "type": "Rect", "h": 3.0}"#).unwrap();
        assert_eq!(shape, Shape::Rect(Rect { w: 2.0, h: 3.0 }));

        let err = from_json::<Shape>(r#"{"w": 2.0}"#).unwrap_err();
        assert!(err.to_string().contains("discriminator"));

        let err = from_json::<Shape>(r#"{"type": "Pentagon"}"#).unwrap_err();
        assert!(err.to_string().contains("variant"));
    }

    #[test]
    fn tagged_enum_encodes_inline_tag() {
        let shape = Shape::Circle(Circle { radius: 1.5 });
        assert_eq!(to_json(&shape), r#"{"type":"Circle","radius":1.5}"#);
    }

    #[test]
    fn strict_key_verification_still_matches() {
        let mut config = JsonParserConfig::default();
        config.strict_key_verification = true;
        let point: Point =
            crate::from_json_with_config(r#"{"x": 1, "y": 2}"#, config).unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
    }
}
