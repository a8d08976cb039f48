use crate::{
    byte_writer::BytesWriter,
    json::{AlwaysArray, AlwaysObject, AlwaysString},
};

/// A UTF-8 wrapper around a [BytesWriter].
///
/// Conceptually somewhere between a `String` and a `dyn std::fmt::Write`:
/// it can be backed by an owned buffer, a caller's `String` or `Vec<u8>`, or
/// a `dyn std::io::Write`, and layers JSON structural helpers on top.
///
/// The `end_json_array`/`end_json_object` helpers rewrite a trailing comma
/// into the closing bracket, which lets encoders unconditionally append a
/// comma after every element.
pub struct TextWriter<'a> {
    #[doc(hidden)]
    pub joining: bool,
    buffer: BytesWriter<'a>,
}

/// Conversion into a `TextWriter` with content extraction.
///
/// This is primarily used in [crate::to_json_into].
pub trait IntoTextWriter<'a> {
    type Output;

    /// Convert Self into TextWriter, preserving the contents.
    fn into_text_writer(self) -> TextWriter<'a>;

    /// Returns the output corresponding to content added since
    /// `into_text_writer()`. May panic when called with a writer created
    /// from a different backing type.
    fn finish_writing(buffer: TextWriter<'a>) -> Self::Output;
}

impl<'a> IntoTextWriter<'a> for &'a mut String {
    type Output = &'a str;
    fn into_text_writer(self) -> TextWriter<'a> {
        // Safety: TextWriter only ever appends valid UTF-8.
        TextWriter::with_buffer(BytesWriter::from(unsafe { self.as_mut_vec() }))
    }
    fn finish_writing(buffer: TextWriter<'a>) -> &'a str {
        buffer.into_backed_str()
    }
}

impl<'a> IntoTextWriter<'a> for &'a mut Vec<u8> {
    type Output = &'a str;
    fn into_text_writer(self) -> TextWriter<'a> {
        TextWriter::with_buffer(BytesWriter::from(self))
    }
    fn finish_writing(buffer: TextWriter<'a>) -> &'a str {
        buffer.into_backed_str()
    }
}

pub type DynWrite<'a> = &'a mut (dyn std::io::Write + Send);
impl<'a> IntoTextWriter<'a> for DynWrite<'a> {
    type Output = Result<usize, std::io::Error>;
    fn into_text_writer(self) -> TextWriter<'a> {
        TextWriter::with_buffer(BytesWriter::new_writer(self))
    }
    fn finish_writing(buffer: TextWriter<'a>) -> Result<usize, std::io::Error> {
        buffer.buffer.into_write_finish()
    }
}

impl Default for TextWriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TextWriter<'a> {
    pub(crate) fn with_buffer(buffer: BytesWriter<'a>) -> TextWriter<'a> {
        TextWriter {
            joining: false,
            buffer,
        }
    }
    pub fn new() -> TextWriter<'a> {
        TextWriter::with_buffer(BytesWriter::new())
    }
    pub fn with_capacity(capacity: usize) -> TextWriter<'a> {
        TextWriter::with_buffer(BytesWriter::with_capacity(capacity))
    }
    /// True once output was dropped for exceeding
    /// [`crate::byte_writer::MAX_OUTPUT_SIZE`].
    pub fn overflowed(&self) -> bool {
        self.buffer.overflowed()
    }
    pub fn start_json_object(&mut self) {
        if !self.joining {
            self.buffer.push(b'{');
        }
        self.joining = false;
    }
    pub fn start_json_string(&mut self) {
        if !self.joining {
            self.buffer.push(b'"');
        }
        self.joining = false;
    }
    pub fn start_json_array(&mut self) {
        if !self.joining {
            self.buffer.push(b'[');
        }
        self.joining = false;
    }
    pub fn push_comma(&mut self) {
        self.buffer.push(b',');
    }
    pub fn push_colon(&mut self) {
        self.buffer.push(b':');
    }
    pub fn end_json_array(&mut self) -> AlwaysArray {
        if let Some(ch) = self.buffer.last() {
            if *ch == b',' {
                *ch = b']'
            } else {
                self.buffer.push(b']');
            }
        }
        AlwaysArray
    }
    pub fn end_json_object(&mut self) -> AlwaysObject {
        if let Some(ch) = self.buffer.last() {
            if *ch == b',' {
                *ch = b'}'
            } else {
                self.buffer.push(b'}');
            }
        }
        AlwaysObject
    }
    pub fn end_json_string(&mut self) -> AlwaysString {
        self.buffer.push(b'"');
        AlwaysString
    }
    pub fn join_parent_json_value_with_next(&mut self) {
        debug_assert!(!self.joining);
        self.joining = true;
    }
    pub fn finite_f64(&mut self, value: f64) {
        let mut buffer = ryu::Buffer::new();
        self.buffer
            .push_bytes(buffer.format_finite(value).as_bytes());
    }
    pub fn finite_f32(&mut self, value: f32) {
        let mut buffer = ryu::Buffer::new();
        self.buffer
            .push_bytes(buffer.format_finite(value).as_bytes());
    }
    pub fn into_string(self) -> String {
        // Safety: only valid UTF-8 is ever appended.
        unsafe { String::from_utf8_unchecked(self.buffer.into_vec()) }
    }

    pub fn as_str(&self) -> &str {
        // Safety: only valid UTF-8 is ever appended.
        unsafe { std::str::from_utf8_unchecked(self.buffer.buffer_slice()) }
    }

    fn into_backed_str(self) -> &'a str {
        // Safety: only valid UTF-8 is ever appended.
        unsafe { std::str::from_utf8_unchecked(self.buffer.into_backed_with_extended_slice()) }
    }
    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_bytes(text.as_bytes());
    }
    pub(crate) fn push_ascii(&mut self, ch: u8) {
        debug_assert!(ch.is_ascii());
        self.buffer.push(ch);
    }
    pub(crate) fn push_utf8(&mut self, text: &[u8]) {
        debug_assert!(std::str::from_utf8(text).is_ok());
        self.buffer.push_bytes(text);
    }
    pub fn clear(&mut self) {
        self.buffer.clear()
    }
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl std::fmt::Write for TextWriter<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_rewrite_closes_arrays() {
        let mut writer = TextWriter::new();
        writer.start_json_array();
        writer.push_str("1");
        writer.push_comma();
        writer.push_str("2");
        writer.push_comma();
        writer.end_json_array();
        assert_eq!(writer.as_str(), "[1,2]");
    }

    #[test]
    fn empty_containers() {
        let mut writer = TextWriter::new();
        writer.start_json_object();
        writer.end_json_object();
        assert_eq!(writer.as_str(), "{}");
        writer.clear();
        writer.start_json_array();
        writer.end_json_array();
        assert_eq!(writer.as_str(), "[]");
    }

    #[test]
    fn finite_floats_round_trip_shortest() {
        let mut writer = TextWriter::new();
        writer.finite_f64(1.5);
        writer.push_comma();
        writer.finite_f64(0.1);
        assert_eq!(writer.as_str(), "1.5,0.1");
    }

    #[test]
    fn string_backing_appends() {
        let mut out = String::from("x = ");
        let mut writer = (&mut out).into_text_writer();
        writer.push_str("\"y\"");
        assert_eq!(
            <&mut String as IntoTextWriter>::finish_writing(writer),
            "\"y\""
        );
        assert_eq!(out, "x = \"y\"");
    }
}
