//! A fast, low-allocation JSON serialization and deserialization library.
//!
//! Decoding is a single pass over the input: strings borrow from the
//! document whenever they contain no escapes, numbers are classified into
//! the narrowest category that holds them, and typed decoding dispatches
//! object keys through a per-type hash table built on first use.
//!
//! ```
//! jsonic::json_object! {
//!     #[derive(Debug, PartialEq)]
//!     pub struct Job {
//!         name: String,
//!         priority: u8 = 0,
//!     }
//! }
//!
//! let job: Job = jsonic::from_json(r#"{"name": "index", "priority": 2}"#).unwrap();
//! assert_eq!(jsonic::to_json(&job), r#"{"name":"index","priority":2}"#);
//! ```
//!
//! Untyped documents decode into [`JsonValue`], which preserves object
//! entry order and keeps oversized numeric literals as exact text.

pub mod byte_writer;
pub mod dispatch;
pub mod error;
pub mod json;
pub mod number;
pub mod object;
pub mod parser;
mod strings;
mod text_writer;
pub mod value;

use std::fmt;

pub use crate::byte_writer::{BytesWriter, MAX_OUTPUT_SIZE};
pub use crate::error::DecodeError;
pub use crate::strings::{escape_to_cow, escape_to_str, escape_to_string};
pub use crate::text_writer::{IntoTextWriter, TextWriter};
pub use crate::value::{JsonMap, JsonNumber, JsonValue};

use crate::parser::{ParentContext, Parser};

/// Option flags controlling how leniently the parser treats its input.
///
/// The default configuration accepts strict JSON only. Each extension is
/// opt-in and scoped to exactly the construct it names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonParserConfig {
    /// Maximum nesting depth of arrays and objects.
    pub recursion_limit: i32,
    /// Tolerate a single comma before a closing `]` or `}`.
    pub allow_trailing_commas: bool,
    /// Treat `// line` and `/* block */` comments as whitespace.
    /// Requires the `json_comments` feature.
    pub allow_comments: bool,
    /// Accept `'single quoted'` strings and keys.
    pub allow_single_quotes: bool,
    /// Accept bare identifier keys such as `{key: 1}`.
    pub allow_unquoted_keys: bool,
    /// Do not error on content after the top-level value.
    pub allow_trailing_data: bool,
    /// Keep every decimal literal as exact text instead of folding to a
    /// double.
    pub arbitrary_precision_numbers: bool,
    /// Verify resolved object keys byte-for-byte instead of trusting a
    /// collision-free hash.
    pub strict_key_verification: bool,
    /// In typed decoding, treat `""` as a missing value for non-string
    /// targets instead of a type error.
    pub unmatched_empty_string_as_null: bool,
}

impl Default for JsonParserConfig {
    fn default() -> Self {
        JsonParserConfig {
            recursion_limit: 128,
            allow_trailing_commas: false,
            allow_comments: false,
            allow_single_quotes: false,
            allow_unquoted_keys: false,
            allow_trailing_data: false,
            arbitrary_precision_numbers: false,
            strict_key_verification: false,
            unmatched_empty_string_as_null: false,
        }
    }
}

/// A type that can be decoded from JSON text.
///
/// The lifetime allows decoded values to borrow from the input document,
/// as `&str` and `Cow<str>` do for escape-free strings.
pub trait FromJson<'a>: Sized + 'a {
    fn json_decode(parser: &mut Parser<'a>) -> Result<Self, &'static DecodeError>;
}

/// A type that can be encoded to JSON text.
///
/// `Kind` records at the type level what shape the encoder produced, one of
/// the markers in [`crate::json`]. Encoding is infallible; output size
/// violations surface when the writer's content is extracted.
pub trait ToJson {
    type Kind;
    fn json_encode(&self, output: &mut TextWriter) -> Self::Kind;
}

struct ErrorContext {
    index: usize,
    note: Option<Box<str>>,
    surrounding: Option<Box<str>>,
}

/// A decoding failure with location context.
///
/// Wraps the parser's static [`DecodeError`] together with the absolute
/// byte offset, an excerpt of the surrounding input, and any dynamic note
/// the parser recorded, such as the name of a missing field.
pub struct JsonError {
    error: &'static DecodeError,
    context: Option<Box<ErrorContext>>,
}

const SURROUNDING_WINDOW: usize = 24;

impl JsonError {
    pub fn decoding_error(&self) -> &'static DecodeError {
        self.error
    }

    /// Byte offset in the input where decoding stopped.
    pub fn index(&self) -> Option<usize> {
        self.context.as_ref().map(|ctx| ctx.index)
    }

    fn plain(error: &'static DecodeError) -> JsonError {
        JsonError {
            error,
            context: None,
        }
    }

    fn extract(error: &'static DecodeError, parser: &mut Parser<'_>) -> JsonError {
        let index = parser.index;
        let mut note = parser.ctx.error.take().map(|text| text.into());
        if note.is_none() {
            if let ParentContext::ObjectKey(key) = parser.parent_context {
                note = Some(format!("while decoding field '{key}'").into_boxed_str());
            }
        }
        let start = index.saturating_sub(SURROUNDING_WINDOW / 2);
        let end = (start + SURROUNDING_WINDOW).min(parser.ctx.data.len());
        let surrounding = if start < end {
            Some(
                String::from_utf8_lossy(&parser.ctx.data[start..end])
                    .into_owned()
                    .into_boxed_str(),
            )
        } else {
            None
        };
        JsonError {
            error,
            context: Some(Box::new(ErrorContext {
                index,
                note,
                surrounding,
            })),
        }
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error.message)?;
        if let Some(context) = &self.context {
            write!(f, " at index {}", context.index)?;
            if let Some(note) = &context.note {
                write!(f, ": {note}")?;
            }
            if let Some(surrounding) = &context.surrounding {
                write!(f, " near {surrounding:?}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsonError({self})")
    }
}

impl std::error::Error for JsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error)
    }
}

fn decode<'a, T: FromJson<'a>>(parser: &mut Parser<'a>) -> Result<T, JsonError> {
    match T::json_decode(parser) {
        Ok(value) => {
            if parser.config.allow_trailing_data {
                return Ok(value);
            }
            match parser.finish() {
                Ok(()) => Ok(value),
                Err(error) => Err(JsonError::extract(error, parser)),
            }
        }
        Err(error) => Err(JsonError::extract(error, parser)),
    }
}

/// Decodes a value from JSON text with the default configuration.
pub fn from_json<'a, T: FromJson<'a>>(input: &'a str) -> Result<T, JsonError> {
    from_json_with_config(input, JsonParserConfig::default())
}

pub fn from_json_with_config<'a, T: FromJson<'a>>(
    input: &'a str,
    config: JsonParserConfig,
) -> Result<T, JsonError> {
    let mut parser = Parser::new(input, config);
    decode(&mut parser)
}

/// Decodes a value from raw bytes. String content is validated as UTF-8
/// where it is materialized; structural bytes are ASCII either way.
pub fn from_json_bytes<'a, T: FromJson<'a>>(input: &'a [u8]) -> Result<T, JsonError> {
    from_json_bytes_with_config(input, JsonParserConfig::default())
}

pub fn from_json_bytes_with_config<'a, T: FromJson<'a>>(
    input: &'a [u8],
    config: JsonParserConfig,
) -> Result<T, JsonError> {
    let mut parser = Parser::new_bytes(input, config);
    decode(&mut parser)
}

/// Encodes a value to a JSON string.
///
/// Uses the thread's pooled output buffer, so repeated calls reuse the same
/// allocation.
///
/// # Panics
/// Panics if the output exceeds [`MAX_OUTPUT_SIZE`]; use [`try_to_json`]
/// to observe that case as an error.
pub fn to_json<T: ToJson + ?Sized>(value: &T) -> String {
    match try_to_json(value) {
        Ok(output) => output,
        Err(error) => panic!("to_json failed: {error}"),
    }
}

pub fn try_to_json<T: ToJson + ?Sized>(value: &T) -> Result<String, JsonError> {
    let mut scratch = byte_writer::acquire_scratch();
    let mut writer = TextWriter::with_buffer(BytesWriter::from(&mut scratch.vec));
    value.json_encode(&mut writer);
    if writer.overflowed() {
        return Err(JsonError::plain(&error::OUTPUT_TOO_LARGE));
    }
    Ok(writer.as_str().to_owned())
}

/// Encodes a value into the given output, returning the backing-specific
/// result: `&str` of the appended content for `&mut String`/`&mut Vec<u8>`,
/// or the write result for a `dyn io::Write`.
pub fn to_json_into<'a, T: ToJson + ?Sized, O: IntoTextWriter<'a>>(
    value: &T,
    output: O,
) -> O::Output {
    let mut writer = output.into_text_writer();
    value.json_encode(&mut writer);
    O::finish_writing(writer)
}
