//! `FromJson`/`ToJson` implementations for primitives and std containers,
//! plus the escape-encoding string writer.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::*;
use crate::number::ParsedNumber;
use crate::parser::{Parser, Peek};
use crate::text_writer::TextWriter;
use crate::{FromJson, ToJson};

type JsonResult<T> = Result<T, &'static DecodeError>;

/// Marker kinds returned by [`ToJson::json_encode`], encoding at the type
/// level what shape of JSON value was produced.
pub struct AlwaysArray;
pub struct AlwaysObject;
pub struct AlwaysString;
pub struct AnyValue;

const fn build_escape_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut ch = 0;
    // Control characters without a short escape use the \u00XX form.
    while ch < 0x20 {
        table[ch] = b'u';
        ch += 1;
    }
    table[0x08] = b'b';
    table[0x0C] = b'f';
    table[b'\n' as usize] = b'n';
    table[b'\r' as usize] = b'r';
    table[b'\t' as usize] = b't';
    table[b'"' as usize] = b'"';
    table[b'\\' as usize] = b'\\';
    table
}

static ESCAPE: [u8; 256] = build_escape_table();
static HEX_DIGITS: [u8; 16] = *b"0123456789abcdef";

/// Writes string content with JSON escaping, excluding the quotes.
///
/// Runs of bytes that need no escaping are appended in bulk; only the
/// escape itself is written byte-wise.
pub(crate) fn write_json_string_content(output: &mut TextWriter, value: &str) {
    let bytes = value.as_bytes();
    let mut start = 0;
    for (index, &byte) in bytes.iter().enumerate() {
        let escape = ESCAPE[byte as usize];
        if escape == 0 {
            continue;
        }
        if start < index {
            output.push_utf8(&bytes[start..index]);
        }
        if escape == b'u' {
            let mut buffer = *b"\\u0000";
            buffer[4] = HEX_DIGITS[(byte >> 4) as usize];
            buffer[5] = HEX_DIGITS[(byte & 0xF) as usize];
            output.push_utf8(&buffer);
        } else {
            output.push_ascii(b'\\');
            output.push_ascii(escape);
        }
        start = index + 1;
    }
    if start < bytes.len() {
        output.push_utf8(&bytes[start..]);
    }
}

/// Decodes each `key: value` entry of an object through `func`.
pub fn decode_object_sequence<'a, T, F>(parser: &mut Parser<'a>, mut func: F) -> JsonResult<()>
where
    T: FromJson<'a>,
    F: FnMut(Cow<'a, str>, T) -> JsonResult<()>,
{
    if parser.enter_object_at_first_key()?.is_some() {
        loop {
            let key = parser.read_key_cow()?;
            parser.discard_colon()?;
            let value = T::json_decode(parser)?;
            func(key, value)?;
            if parser.object_step_at_key()?.is_none() {
                break;
            }
        }
    }
    Ok(())
}

/// Decodes each element of an array through `func`.
pub fn decode_array_sequence<'a, T, F>(parser: &mut Parser<'a>, mut func: F) -> JsonResult<()>
where
    T: FromJson<'a>,
    F: FnMut(T) -> JsonResult<()>,
{
    if parser.enter_array()?.is_some() {
        loop {
            func(T::json_decode(parser)?)?;
            if parser.array_step()?.is_none() {
                break;
            }
        }
    }
    Ok(())
}

/// Scans the next numeric value. `None` means an empty string stood in for
/// a missing value, which the lax option maps to the target's default.
fn scan_number<'j>(parser: &mut Parser<'j>) -> JsonResult<Option<ParsedNumber<'j>>> {
    let peek = parser.peek()?;
    if peek.is_num() {
        return Ok(Some(crate::number::scan(parser)?));
    }
    if parser.at_string_quote(peek) && parser.config.unmatched_empty_string_as_null {
        if parser.take_string()?.is_empty() {
            return Ok(None);
        }
        return Err(&INVALID_NUMERIC_LITERAL);
    }
    Err(&EXPECTED_VALUE)
}

macro_rules! signed_from_json {
    ($($ty:ty),*) => {
        $(impl<'a> FromJson<'a> for $ty {
            fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
                match scan_number(parser)? {
                    Some(number) => <$ty>::try_from(number.long()?)
                        .map_err(|_| &NUMBER_OUT_OF_RANGE),
                    None => Ok(0),
                }
            }
        })*
    };
}
signed_from_json!(i8, i16, i32, i64, isize);

macro_rules! unsigned_from_json {
    ($($ty:ty),*) => {
        $(impl<'a> FromJson<'a> for $ty {
            fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
                match scan_number(parser)? {
                    Some(number) => <$ty>::try_from(number.unsigned()?)
                        .map_err(|_| &NUMBER_OUT_OF_RANGE),
                    None => Ok(0),
                }
            }
        })*
    };
}
unsigned_from_json!(u8, u16, u32, u64, usize);

impl<'a> FromJson<'a> for i128 {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        match scan_number(parser)? {
            Some(number) => number.long_wide(),
            None => Ok(0),
        }
    }
}

impl<'a> FromJson<'a> for u128 {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        match scan_number(parser)? {
            Some(number) => number.unsigned_wide(),
            None => Ok(0),
        }
    }
}

impl<'a> FromJson<'a> for f64 {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        match scan_number(parser)? {
            Some(number) => number.double(),
            None => Ok(0.0),
        }
    }
}

impl<'a> FromJson<'a> for f32 {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        match scan_number(parser)? {
            Some(number) => number.float(),
            None => Ok(0.0),
        }
    }
}

impl<'a> FromJson<'a> for bool {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        let peek = parser.peek()?;
        match peek {
            Peek::True => {
                parser.discard_seen_true()?;
                Ok(true)
            }
            Peek::False => {
                parser.discard_seen_false()?;
                Ok(false)
            }
            _ if parser.at_string_quote(peek)
                && parser.config.unmatched_empty_string_as_null =>
            {
                if parser.take_string()?.is_empty() {
                    Ok(false)
                } else {
                    Err(&INVALID_BOOL_LITERAL)
                }
            }
            _ => Err(&INVALID_BOOL_LITERAL),
        }
    }
}

impl<'a> FromJson<'a> for String {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        Ok(parser.take_string()?.to_owned())
    }
}

impl<'a> FromJson<'a> for Box<str> {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        Ok(parser.take_string()?.into())
    }
}

impl<'a> FromJson<'a> for &'a str {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        parser.take_borrowed_string()
    }
}

impl<'a> FromJson<'a> for Cow<'a, str> {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        parser.take_cow_string()
    }
}

impl<'a> FromJson<'a> for char {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        let text = parser.take_string()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(ch),
            _ => Err(&EXPECTED_SINGLE_CHAR),
        }
    }
}

impl<'a, T: FromJson<'a>> FromJson<'a> for Option<T> {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        if parser.peek()? == Peek::Null {
            parser.discard_seen_null()?;
            Ok(None)
        } else {
            Ok(Some(T::json_decode(parser)?))
        }
    }
}

impl<'a, T: FromJson<'a>> FromJson<'a> for Box<T> {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        Ok(Box::new(T::json_decode(parser)?))
    }
}

impl<'a, T: FromJson<'a>> FromJson<'a> for Vec<T> {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        let mut values = Vec::new();
        if parser.enter_array()?.is_some() {
            loop {
                values.push(T::json_decode(parser)?);
                if parser.array_step()?.is_none() {
                    break;
                }
            }
        }
        Ok(values)
    }
}

impl<'a, T: FromJson<'a>, const N: usize> FromJson<'a> for [T; N] {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        let values: Vec<T> = Vec::json_decode(parser)?;
        values.try_into().map_err(|_| &ARRAY_LENGTH_MISMATCH)
    }
}

impl<'a, V: FromJson<'a>, S: BuildHasher + Default + 'a> FromJson<'a> for HashMap<String, V, S> {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        let mut map = HashMap::with_hasher(S::default());
        decode_object_sequence(parser, |key, value| {
            map.insert(key.into_owned(), value);
            Ok(())
        })?;
        Ok(map)
    }
}

impl<'a, V: FromJson<'a>> FromJson<'a> for BTreeMap<String, V> {
    fn json_decode(parser: &mut Parser<'a>) -> JsonResult<Self> {
        let mut map = BTreeMap::new();
        decode_object_sequence(parser, |key, value| {
            map.insert(key.into_owned(), value);
            Ok(())
        })?;
        Ok(map)
    }
}

impl ToJson for str {
    type Kind = AlwaysString;
    fn json_encode(&self, output: &mut TextWriter) -> AlwaysString {
        output.start_json_string();
        write_json_string_content(output, self);
        output.end_json_string()
    }
}

impl ToJson for String {
    type Kind = AlwaysString;
    fn json_encode(&self, output: &mut TextWriter) -> AlwaysString {
        self.as_str().json_encode(output)
    }
}

impl ToJson for Cow<'_, str> {
    type Kind = AlwaysString;
    fn json_encode(&self, output: &mut TextWriter) -> AlwaysString {
        self.as_ref().json_encode(output)
    }
}

impl ToJson for char {
    type Kind = AlwaysString;
    fn json_encode(&self, output: &mut TextWriter) -> AlwaysString {
        let mut buffer = [0u8; 4];
        self.encode_utf8(&mut buffer).json_encode(output)
    }
}

impl ToJson for bool {
    type Kind = AnyValue;
    fn json_encode(&self, output: &mut TextWriter) -> AnyValue {
        output.push_str(if *self { "true" } else { "false" });
        AnyValue
    }
}

macro_rules! itoa_to_json {
    ($($ty:ty),*) => {
        $(impl ToJson for $ty {
            type Kind = AnyValue;
            fn json_encode(&self, output: &mut TextWriter) -> AnyValue {
                let mut buffer = itoa::Buffer::new();
                output.push_str(buffer.format(*self));
                AnyValue
            }
        })*
    };
}
itoa_to_json!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl ToJson for f64 {
    type Kind = AnyValue;
    fn json_encode(&self, output: &mut TextWriter) -> AnyValue {
        if self.is_finite() {
            output.finite_f64(*self);
        } else {
            output.push_str("null");
        }
        AnyValue
    }
}

impl ToJson for f32 {
    type Kind = AnyValue;
    fn json_encode(&self, output: &mut TextWriter) -> AnyValue {
        if self.is_finite() {
            output.finite_f32(*self);
        } else {
            output.push_str("null");
        }
        AnyValue
    }
}

impl<T: ToJson> ToJson for Option<T> {
    type Kind = AnyValue;
    fn json_encode(&self, output: &mut TextWriter) -> AnyValue {
        match self {
            Some(value) => {
                value.json_encode(output);
            }
            None => output.push_str("null"),
        }
        AnyValue
    }
}

impl<T: ToJson> ToJson for [T] {
    type Kind = AlwaysArray;
    fn json_encode(&self, output: &mut TextWriter) -> AlwaysArray {
        output.start_json_array();
        for value in self {
            value.json_encode(output);
            output.push_comma();
        }
        output.end_json_array()
    }
}

impl<T: ToJson> ToJson for Vec<T> {
    type Kind = AlwaysArray;
    fn json_encode(&self, output: &mut TextWriter) -> AlwaysArray {
        self.as_slice().json_encode(output)
    }
}

impl<T: ToJson, const N: usize> ToJson for [T; N] {
    type Kind = AlwaysArray;
    fn json_encode(&self, output: &mut TextWriter) -> AlwaysArray {
        self.as_slice().json_encode(output)
    }
}

impl<V: ToJson, S> ToJson for HashMap<String, V, S> {
    type Kind = AlwaysObject;
    fn json_encode(&self, output: &mut TextWriter) -> AlwaysObject {
        output.start_json_object();
        for (key, value) in self {
            key.json_encode(output);
            output.push_colon();
            value.json_encode(output);
            output.push_comma();
        }
        output.end_json_object()
    }
}

impl<V: ToJson> ToJson for BTreeMap<String, V> {
    type Kind = AlwaysObject;
    fn json_encode(&self, output: &mut TextWriter) -> AlwaysObject {
        output.start_json_object();
        for (key, value) in self {
            key.json_encode(output);
            output.push_colon();
            value.json_encode(output);
            output.push_comma();
        }
        output.end_json_object()
    }
}

impl<'b, T: ToJson + ?Sized> ToJson for &'b T {
    type Kind = T::Kind;
    fn json_encode(&self, output: &mut TextWriter) -> T::Kind {
        (**self).json_encode(output)
    }
}

impl<T: ToJson + ?Sized> ToJson for Box<T> {
    type Kind = T::Kind;
    fn json_encode(&self, output: &mut TextWriter) -> T::Kind {
        (**self).json_encode(output)
    }
}

impl<T: ToJson + ?Sized> ToJson for Rc<T> {
    type Kind = T::Kind;
    fn json_encode(&self, output: &mut TextWriter) -> T::Kind {
        (**self).json_encode(output)
    }
}

impl<T: ToJson + ?Sized> ToJson for Arc<T> {
    type Kind = T::Kind;
    fn json_encode(&self, output: &mut TextWriter) -> T::Kind {
        (**self).json_encode(output)
    }
}
