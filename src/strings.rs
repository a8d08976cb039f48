use std::borrow::Cow;

use memchr::memchr;

use crate::error::{DecodeError, INVALID_STRING_ESCAPE};

/// Returns the input unchanged when it contains no escape sequences.
pub fn escape_to_str(input: &str) -> Result<&str, ()> {
    if memchr(b'\\', input.as_bytes()).is_some() {
        Err(())
    } else {
        Ok(input)
    }
}

pub fn escape_to_string(input: &str) -> Result<String, ()> {
    Ok(escape_to_cow(input).map_err(|_| ())?.into_owned())
}

/// Decodes all escape sequences in `input`, borrowing when none are present.
pub fn escape_to_cow(input: &str) -> Result<Cow<'_, str>, &'static DecodeError> {
    let Some(mut index) = memchr(b'\\', input.as_bytes()) else {
        return Ok(Cow::Borrowed(input));
    };

    let bytes = input.as_bytes();
    let mut start = 0;
    let mut scratch = Vec::with_capacity(input.len() + 16);
    loop {
        scratch.extend_from_slice(&bytes[start..index]);
        index += 1;
        match parse_escape(index, bytes, &mut scratch) {
            Ok(nindex) => index = nindex,
            Err(()) => return Err(&INVALID_STRING_ESCAPE),
        }
        start = index;
        let Some(offset) = memchr(b'\\', &bytes[start..]) else {
            scratch.extend_from_slice(&bytes[start..]);
            // Escape decoding only appends whole code points, so the scratch
            // buffer stays valid UTF-8.
            debug_assert!(std::str::from_utf8(&scratch).is_ok());
            return Ok(Cow::Owned(unsafe { String::from_utf8_unchecked(scratch) }));
        };
        index = start + offset;
    }
}

/// Decodes exactly one escape sequence and appends it to the scratch space.
///
/// `index` must point at the byte following the backslash. Returns the index
/// just past the escape.
pub(crate) fn parse_escape(
    mut index: usize,
    read: &[u8],
    scratch: &mut Vec<u8>,
) -> Result<usize, ()> {
    let Some(ch) = read.get(index) else {
        return Err(());
    };
    index += 1;

    match ch {
        b'"' => scratch.push(b'"'),
        b'\'' => scratch.push(b'\''),
        b'\\' => scratch.push(b'\\'),
        b'/' => scratch.push(b'/'),
        b'b' => scratch.push(b'\x08'),
        b'f' => scratch.push(b'\x0c'),
        b'n' => scratch.push(b'\n'),
        b'r' => scratch.push(b'\r'),
        b't' => scratch.push(b'\t'),
        b'u' => return parse_unicode_escape(index, read, scratch),
        _ => return Err(()),
    }

    Ok(index)
}

/// Parses a JSON `\u` escape and appends it into the scratch space. Assumes
/// `\u` has just been read.
#[cold]
fn parse_unicode_escape(
    mut index: usize,
    read: &[u8],
    scratch: &mut Vec<u8>,
) -> Result<usize, ()> {
    let n = match read[index..] {
        [a, b, c, d, ..] => {
            index += 4;
            match decode_four_hex_digits(a, b, c, d) {
                Some(val) => val,
                None => return Err(()),
            }
        }
        _ => return Err(()),
    };

    // Non-BMP characters are encoded as a pair of hex escapes representing
    // UTF-16 surrogates. A lone trailing surrogate cannot form a code point.
    if (0xDC00..=0xDFFF).contains(&n) {
        return Err(());
    }

    if !(0xD800..=0xDBFF).contains(&n) {
        // Every u16 outside of the surrogate ranges is a legal char.
        push_codepoint(n as u32, scratch);
        return Ok(index);
    }

    // n is a leading surrogate, a trailing surrogate must follow.
    let n1 = n;
    if read.get(index..index + 2) != Some(b"\\u".as_slice()) {
        return Err(());
    }
    index += 2;

    let n2 = match read[index..] {
        [a, b, c, d, ..] => {
            index += 4;
            match decode_four_hex_digits(a, b, c, d) {
                Some(val) => val,
                None => return Err(()),
            }
        }
        _ => return Err(()),
    };

    if !(0xDC00..=0xDFFF).contains(&n2) {
        return Err(());
    }

    // This value is in range U+10000..=U+10FFFF, always a valid code point.
    let n = ((((n1 - 0xD800) as u32) << 10) | (n2 - 0xDC00) as u32) + 0x1_0000;
    push_codepoint(n, scratch);
    Ok(index)
}

/// Appends the UTF-8 encoding of a code point to the end of the buffer.
#[inline]
fn push_codepoint(n: u32, scratch: &mut Vec<u8>) {
    if n < 0x80 {
        scratch.push(n as u8);
        return;
    }
    // The callers only produce values in the valid code point ranges.
    let ch = char::from_u32(n).unwrap_or(char::REPLACEMENT_CHARACTER);
    let mut buf = [0u8; 4];
    scratch.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
}

const fn decode_hex_val_slow(val: u8) -> Option<u8> {
    match val {
        b'0'..=b'9' => Some(val - b'0'),
        b'A'..=b'F' => Some(val - b'A' + 10),
        b'a'..=b'f' => Some(val - b'a' + 10),
        _ => None,
    }
}

const fn build_hex_table(shift: usize) -> [i16; 256] {
    let mut table = [0; 256];
    let mut ch = 0;
    while ch < 256 {
        table[ch] = match decode_hex_val_slow(ch as u8) {
            Some(val) => (val as i16) << shift,
            None => -1,
        };
        ch += 1;
    }
    table
}

static HEX0: [i16; 256] = build_hex_table(0);
static HEX1: [i16; 256] = build_hex_table(4);

fn decode_four_hex_digits(a: u8, b: u8, c: u8, d: u8) -> Option<u16> {
    let a = HEX1[a as usize] as i32;
    let b = HEX0[b as usize] as i32;
    let c = HEX1[c as usize] as i32;
    let d = HEX0[d as usize] as i32;

    let codepoint = ((a | b) << 8) | c | d;

    // A single sign bit check catches any non-hex digit.
    if codepoint >= 0 {
        Some(codepoint as u16)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_strings_borrow() {
        assert!(matches!(escape_to_cow("hello").unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn simple_escapes() {
        assert_eq!(escape_to_cow("a\\nb").unwrap(), "a\nb");
        assert_eq!(escape_to_cow("a\\\"b").unwrap(), "a\"b");
        assert_eq!(escape_to_cow("a\\\\b").unwrap(), "a\\b");
        assert_eq!(escape_to_cow("\\u0001").unwrap(), "\u{1}");
        assert_eq!(escape_to_cow("\\u00e9").unwrap(), "\u{e9}");
    }

    #[test]
    fn surrogate_pairs() {
        assert_eq!(escape_to_cow("\\ud83d\\ude00").unwrap(), "\u{1f600}");
        assert!(escape_to_cow("\\ud83d").is_err());
        assert!(escape_to_cow("\\ude00").is_err());
    }

    #[test]
    fn malformed_hex() {
        assert!(escape_to_cow("\\uzzzz").is_err());
        assert!(escape_to_cow("\\u00").is_err());
        assert!(escape_to_cow("\\q").is_err());
    }
}
