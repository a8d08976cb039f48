//! A general-purpose JSON document model.
//!
//! [`JsonValue`] is the untyped decode target: any well-formed document can
//! be parsed into it and re-serialized. Object entries keep their insertion
//! order, and numbers that exceed the fast binary categories retain their
//! exact literal text instead of being rounded.

use std::fmt;
use std::ops::Index;

use crate::error::*;
use crate::json::AnyValue;
use crate::number::ParsedNumber;
use crate::parser::{Parser, Peek};
use crate::text_writer::TextWriter;
use crate::{FromJson, ToJson};

type JsonResult<T> = Result<T, &'static DecodeError>;

/// A decoded number, classified by the narrowest category that holds it.
///
/// Integers narrow to `Int` when they fit `i32`, widen to `Long` up to
/// `i64`, and keep their literal text as `BigInt` past that. Decimals are
/// `Double` (or `Float` when suffixed), with `BigDecimal` text preserving
/// literals whose precision a double would lose.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonNumber {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInt(String),
    BigDecimal(String),
}

impl JsonNumber {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            JsonNumber::Int(v) => Some((*v).into()),
            JsonNumber::Long(v) => Some(*v),
            JsonNumber::BigInt(text) => text.parse().ok(),
            _ => None,
        }
    }
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            JsonNumber::Int(v) => u64::try_from(*v).ok(),
            JsonNumber::Long(v) => u64::try_from(*v).ok(),
            JsonNumber::BigInt(text) => text.parse().ok(),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonNumber::Int(v) => Some((*v).into()),
            JsonNumber::Long(v) => Some(*v as f64),
            JsonNumber::Float(v) => Some((*v).into()),
            JsonNumber::Double(v) => Some(*v),
            JsonNumber::BigInt(text) | JsonNumber::BigDecimal(text) => text.parse().ok(),
        }
    }
    /// The preserved literal text, for numbers beyond the binary categories.
    pub fn literal(&self) -> Option<&str> {
        match self {
            JsonNumber::BigInt(text) | JsonNumber::BigDecimal(text) => Some(text),
            _ => None,
        }
    }
}

impl From<ParsedNumber<'_>> for JsonNumber {
    fn from(value: ParsedNumber<'_>) -> Self {
        match value {
            ParsedNumber::Int(v) => JsonNumber::Int(v),
            ParsedNumber::Long(v) => JsonNumber::Long(v),
            ParsedNumber::Float(v) => JsonNumber::Float(v),
            ParsedNumber::Double(v) => JsonNumber::Double(v),
            ParsedNumber::BigInt(text) => JsonNumber::BigInt(text.to_owned()),
            ParsedNumber::BigDecimal(text) => JsonNumber::BigDecimal(text.to_owned()),
        }
    }
}

/// An object as an insertion-ordered list of key/value entries.
///
/// Lookup is a linear scan; documents with small objects, which dominate in
/// practice, beat a hash map on both time and memory. Inserting an existing
/// key overwrites the value in place, keeping the key's original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonMap {
    entries: Vec<(String, JsonValue)>,
}

impl JsonMap {
    pub fn new() -> JsonMap {
        JsonMap::default()
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
    pub fn get_mut(&mut self, key: &str) -> Option<&mut JsonValue> {
        self.entries
            .iter_mut()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        let key = key.into();
        if let Some(existing) = self.get_mut(&key) {
            *existing = value.into();
        } else {
            self.entries.push((key, value.into()));
        }
    }
    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        let position = self.entries.iter().position(|(name, _)| name == key)?;
        Some(self.entries.remove(position).1)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl FromIterator<(String, JsonValue)> for JsonMap {
    fn from_iter<T: IntoIterator<Item = (String, JsonValue)>>(iter: T) -> Self {
        let mut map = JsonMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Any JSON value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum JsonValue {
    #[default]
    Null,
    Bool(bool),
    Number(JsonNumber),
    String(String),
    Array(Vec<JsonValue>),
    Object(JsonMap),
}

static NULL: JsonValue = JsonValue::Null;

impl JsonValue {
    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(value) => Some(value),
            _ => None,
        }
    }
    pub fn as_number(&self) -> Option<&JsonNumber> {
        match self {
            JsonValue::Number(value) => Some(value),
            _ => None,
        }
    }
    pub fn as_i64(&self) -> Option<i64> {
        self.as_number()?.as_i64()
    }
    pub fn as_u64(&self) -> Option<u64> {
        self.as_number()?.as_u64()
    }
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number()?.as_f64()
    }
    pub fn as_array(&self) -> Option<&[JsonValue]> {
        match self {
            JsonValue::Array(values) => Some(values),
            _ => None,
        }
    }
    pub fn as_object(&self) -> Option<&JsonMap> {
        match self {
            JsonValue::Object(map) => Some(map),
            _ => None,
        }
    }
    /// Missing keys and out-of-range indices resolve to `Null`, so lookup
    /// chains never panic.
    pub fn get(&self, key: &str) -> &JsonValue {
        match self {
            JsonValue::Object(map) => map.get(key).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
    pub fn get_index(&self, index: usize) -> &JsonValue {
        match self {
            JsonValue::Array(values) => values.get(index).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

impl Index<&str> for JsonValue {
    type Output = JsonValue;
    fn index(&self, key: &str) -> &JsonValue {
        self.get(key)
    }
}

impl Index<usize> for JsonValue {
    type Output = JsonValue;
    fn index(&self, index: usize) -> &JsonValue {
        self.get_index(index)
    }
}

impl From<bool> for JsonValue {
    fn from(value: bool) -> Self {
        JsonValue::Bool(value)
    }
}
impl From<i32> for JsonValue {
    fn from(value: i32) -> Self {
        JsonValue::Number(JsonNumber::Int(value))
    }
}
impl From<i64> for JsonValue {
    fn from(value: i64) -> Self {
        if let Ok(small) = i32::try_from(value) {
            JsonValue::Number(JsonNumber::Int(small))
        } else {
            JsonValue::Number(JsonNumber::Long(value))
        }
    }
}
impl From<f64> for JsonValue {
    fn from(value: f64) -> Self {
        JsonValue::Number(JsonNumber::Double(value))
    }
}
impl From<&str> for JsonValue {
    fn from(value: &str) -> Self {
        JsonValue::String(value.to_owned())
    }
}
impl From<String> for JsonValue {
    fn from(value: String) -> Self {
        JsonValue::String(value)
    }
}
impl From<JsonNumber> for JsonValue {
    fn from(value: JsonNumber) -> Self {
        JsonValue::Number(value)
    }
}
impl From<JsonMap> for JsonValue {
    fn from(value: JsonMap) -> Self {
        JsonValue::Object(value)
    }
}
impl<T: Into<JsonValue>> From<Vec<T>> for JsonValue {
    fn from(values: Vec<T>) -> Self {
        JsonValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::to_json(self))
    }
}

impl<'a> FromJson<'a> for JsonValue {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        let peek = parser.peek()?;
        match peek {
            Peek::Null => {
                parser.discard_seen_null()?;
                Ok(JsonValue::Null)
            }
            Peek::True => {
                parser.discard_seen_true()?;
                Ok(JsonValue::Bool(true))
            }
            Peek::False => {
                parser.discard_seen_false()?;
                Ok(JsonValue::Bool(false))
            }
            Peek::Array => {
                let mut values = Vec::new();
                if parser.enter_seen_array()?.is_some() {
                    loop {
                        values.push(JsonValue::json_decode(parser)?);
                        if parser.array_step()?.is_none() {
                            break;
                        }
                    }
                }
                Ok(JsonValue::Array(values))
            }
            Peek::Object => {
                let mut map = JsonMap::new();
                if parser.enter_seen_object_at_first_key()?.is_some() {
                    loop {
                        let key = parser.read_key_cow()?.into_owned();
                        parser.discard_colon()?;
                        let value = JsonValue::json_decode(parser)?;
                        map.insert(key, value);
                        if parser.object_step_at_key()?.is_none() {
                            break;
                        }
                    }
                }
                Ok(JsonValue::Object(map))
            }
            _ if parser.at_string_quote(peek) => {
                let text = parser.take_cow_string()?.into_owned();
                Ok(JsonValue::String(text))
            }
            Peek::SingleQuote => Err(&SINGLE_QUOTED_STRING),
            _ if peek.is_num() => {
                let number = crate::number::scan(parser)?;
                Ok(JsonValue::Number(number.into()))
            }
            _ => Err(&EXPECTED_VALUE),
        }
    }
}

impl ToJson for JsonNumber {
    type Kind = AnyValue;
    fn json_encode(&self, output: &mut TextWriter) -> AnyValue {
        match self {
            JsonNumber::Int(value) => {
                let mut buffer = itoa::Buffer::new();
                output.push_str(buffer.format(*value));
            }
            JsonNumber::Long(value) => {
                let mut buffer = itoa::Buffer::new();
                output.push_str(buffer.format(*value));
            }
            JsonNumber::Float(value) => {
                if value.is_finite() {
                    output.finite_f32(*value);
                } else {
                    output.push_str("null");
                }
            }
            JsonNumber::Double(value) => {
                if value.is_finite() {
                    output.finite_f64(*value);
                } else {
                    output.push_str("null");
                }
            }
            JsonNumber::BigInt(text) | JsonNumber::BigDecimal(text) => {
                output.push_str(text);
            }
        }
        AnyValue
    }
}

impl ToJson for JsonValue {
    type Kind = AnyValue;
    fn json_encode(&self, output: &mut TextWriter) -> AnyValue {
        match self {
            JsonValue::Null => output.push_str("null"),
            JsonValue::Bool(true) => output.push_str("true"),
            JsonValue::Bool(false) => output.push_str("false"),
            JsonValue::Number(number) => {
                number.json_encode(output);
            }
            JsonValue::String(text) => {
                text.as_str().json_encode(output);
            }
            JsonValue::Array(values) => {
                output.start_json_array();
                for value in values {
                    value.json_encode(output);
                    output.push_comma();
                }
                output.end_json_array();
            }
            JsonValue::Object(map) => {
                output.start_json_object();
                for (key, value) in map.iter() {
                    key.json_encode(output);
                    output.push_colon();
                    value.json_encode(output);
                    output.push_comma();
                }
                output.end_json_object();
            }
        }
        AnyValue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::from_json;

    #[test]
    fn index_chains_resolve_to_null() {
        let value: JsonValue =
            from_json(r#"{"user": {"name": "ana", "tags": ["a", "b"]}}"#).unwrap();
        assert_eq!(value["user"]["name"].as_str(), Some("ana"));
        assert_eq!(value["user"]["tags"][1].as_str(), Some("b"));
        assert!(value["user"]["missing"][7].is_null());
        assert!(value["nope"].is_null());
    }

    #[test]
    fn numbers_classify_by_magnitude() {
        let value: JsonValue = from_json("[1, 3000000000, 1.5, 123456789012345678901]").unwrap();
        assert_eq!(value[0].as_number(), Some(&JsonNumber::Int(1)));
        assert_eq!(value[1].as_number(), Some(&JsonNumber::Long(3000000000)));
        assert_eq!(value[2].as_number(), Some(&JsonNumber::Double(1.5)));
        assert_eq!(
            value[3].as_number().unwrap().literal(),
            Some("123456789012345678901")
        );
    }

    #[test]
    fn map_insert_overwrites_in_place() {
        let mut map = JsonMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("a", 3);
        assert_eq!(map.len(), 2);
        assert_eq!(map.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(map.get("a").unwrap().as_i64(), Some(3));
    }

    #[test]
    fn duplicate_document_keys_last_wins() {
        let value: JsonValue = from_json(r#"{"k": 1, "k": 2}"#).unwrap();
        assert_eq!(value["k"].as_i64(), Some(2));
        assert_eq!(value.as_object().unwrap().len(), 1);
    }

    #[test]
    fn big_literals_round_trip_exactly() {
        let text = r#"{"n":123456789012345678901234567890,"d":0.12345678901234567890123}"#;
        let value: JsonValue = from_json(text).unwrap();
        assert_eq!(
            value["n"].as_number().unwrap().literal(),
            Some("123456789012345678901234567890")
        );
        // Short decimals fold to doubles; only oversized ones keep text.
        assert!(matches!(
            value["d"].as_number(),
            Some(JsonNumber::BigDecimal(_))
        ));
        assert_eq!(crate::to_json(&value), text);
    }
}
