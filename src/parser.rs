use std::borrow::Cow;
use std::fmt;

use crate::error::*;
use crate::JsonParserConfig;

/// Classification of the next significant byte in the input.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Peek(u8);

#[allow(non_upper_case_globals)]
impl Peek {
    pub const Null: Self = Self(b'n');
    pub const True: Self = Self(b't');
    pub const False: Self = Self(b'f');
    pub const Minus: Self = Self(b'-');
    pub const Infinity: Self = Self(b'I');
    pub const NaN: Self = Self(b'N');
    pub const String: Self = Self(b'"');
    pub const SingleQuote: Self = Self(b'\'');
    pub const Array: Self = Self(b'[');
    pub const Object: Self = Self(b'{');
}

impl fmt::Debug for Peek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            b'n' => write!(f, "Null"),
            b't' => write!(f, "True"),
            b'f' => write!(f, "False"),
            b'-' => write!(f, "Minus"),
            b'I' => write!(f, "Infinity"),
            b'N' => write!(f, "NaN"),
            b'"' => write!(f, "String"),
            b'[' => write!(f, "Array"),
            b'{' => write!(f, "Object"),
            _ => write!(f, "Peek({:?})", self.0 as char),
        }
    }
}

impl Peek {
    pub const fn new(next: u8) -> Self {
        Self(next)
    }

    pub const fn is_num(self) -> bool {
        self.0.is_ascii_digit() || matches!(self, Self::Minus | Self::Infinity | Self::NaN)
    }

    pub const fn into_inner(self) -> u8 {
        self.0
    }
}

static TRUE_REST: [u8; 3] = [b'r', b'u', b'e'];
static FALSE_REST: [u8; 4] = [b'a', b'l', b's', b'e'];
static NULL_REST: [u8; 3] = [b'u', b'l', b'l'];

/// Shared input state for one decoding call.
#[derive(Clone)]
pub struct Ctx<'j> {
    pub(crate) data: &'j [u8],
    /// Set when the input arrived as `&str` and is known valid UTF-8.
    pub(crate) utf8: bool,
    pub(crate) error: Option<Cow<'j, str>>,
}

impl<'j> Ctx<'j> {
    pub fn new(data: &'j str) -> Self {
        Self {
            data: data.as_bytes(),
            utf8: true,
            error: None,
        }
    }
    pub fn new_bytes(data: &'j [u8]) -> Self {
        Self {
            data,
            utf8: false,
            error: None,
        }
    }
    pub fn static_error(&mut self, err: &'static str) {
        if self.error.is_none() {
            self.error = Some(Cow::Borrowed(err));
        }
    }
    /// Interprets a span of the input as text, validating UTF-8 only when the
    /// input arrived as raw bytes.
    pub(crate) fn span_str(&self, start: usize, end: usize) -> Result<&'j str, &'static DecodeError> {
        let slice = &self.data[start..end];
        if self.utf8 {
            // Safety: the span boundaries are at ASCII structural bytes of an
            // input that was a valid `&str`, so the slice is valid UTF-8.
            Ok(unsafe { std::str::from_utf8_unchecked(slice) })
        } else {
            std::str::from_utf8(slice).map_err(|_| &INVALID_UTF8)
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) enum ParentContext {
    None,
    ObjectKey(&'static str),
    MissingField(&'static str),
}

/// Where a decoded string ended up: still in the input, or assembled in the
/// scratch buffer because it contained escapes.
#[derive(Clone, Copy, Debug)]
pub(crate) enum StrSpan {
    Raw { start: usize, end: usize },
    Scratch,
}

/// Per-invocation parse state: a cursor over the input buffer plus the
/// option flags and the reusable escape scratch buffer.
///
/// A `Parser` is created once per top-level decode call, mutated throughout,
/// and discarded at the end. It is never shared across threads.
#[derive(Clone)]
pub struct Parser<'j> {
    pub ctx: Ctx<'j>,
    pub index: usize,
    pub(crate) parent_context: ParentContext,
    pub remaining_depth: i32,
    pub config: JsonParserConfig,
    pub scratch: Vec<u8>,
}

impl<'j> fmt::Debug for Parser<'j> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Remaining: {}",
            &self.ctx.data[self.index..].escape_ascii()
        )
    }
}

type JsonResult<T> = Result<T, &'static DecodeError>;

/// Snapshot of the cursor for the one-time discriminator rescan.
pub struct RetrySnapshot {
    index: usize,
    recursion_depth: i32,
}

fn is_escape(ch: u8, quote: u8) -> bool {
    ch == quote || ch == b'\\' || ch < 0x20
}

fn is_ident_byte(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$'
}

/// `consume_X` methods assume the upcoming input is already known to start
/// with an `X` because the caller peeked. Calling one without peeking first
/// is likely a bug.
impl<'j> Parser<'j> {
    pub fn new(data: &'j str, config: JsonParserConfig) -> Self {
        Self {
            ctx: Ctx::new(data),
            index: 0,
            parent_context: ParentContext::None,
            remaining_depth: config.recursion_limit,
            config,
            scratch: Vec::new(),
        }
    }

    pub fn new_bytes(data: &'j [u8], config: JsonParserConfig) -> Self {
        Self {
            ctx: Ctx::new_bytes(data),
            index: 0,
            parent_context: ParentContext::None,
            remaining_depth: config.recursion_limit,
            config,
            scratch: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> RetrySnapshot {
        RetrySnapshot {
            index: self.index,
            recursion_depth: self.remaining_depth,
        }
    }

    pub fn restore_for_retry(&mut self, snapshot: &RetrySnapshot) {
        self.index = snapshot.index;
        self.remaining_depth = snapshot.recursion_depth;
        self.parent_context = ParentContext::None;
        self.ctx.error = None;
    }

    /// Records which object key is being decoded, for error reporting.
    #[doc(hidden)]
    pub fn set_parent_context_key(&mut self, key: &'static str) {
        self.parent_context = ParentContext::ObjectKey(key);
    }
    #[doc(hidden)]
    pub fn clear_parent_context(&mut self) {
        self.parent_context = ParentContext::None;
    }

    pub fn report_static_error(&mut self, error: &'static str) {
        self.ctx.error = Some(Cow::Borrowed(error));
    }
    pub fn report_error(&mut self, error: String) {
        self.ctx.error = Some(Cow::Owned(error));
    }
    pub fn clear_error(&mut self) {
        self.ctx.error = None;
    }

    /// Advances to the next significant byte and classifies it.
    pub fn peek(&mut self) -> JsonResult<Peek> {
        if let Some(next) = self.eat_whitespace() {
            Ok(Peek::new(next))
        } else {
            Err(&EOF_WHILE_PARSING_VALUE)
        }
    }

    /// True when the next significant byte opens a string under the current
    /// quote options.
    pub(crate) fn at_string_quote(&self, peek: Peek) -> bool {
        peek == Peek::String || (peek == Peek::SingleQuote && self.config.allow_single_quotes)
    }

    pub fn enter_array(&mut self) -> JsonResult<Option<Peek>> {
        if self.peek()? != Peek::Array {
            return Err(&EOF_WHILE_PARSING_LIST_FIRST_ELEMENT);
        }
        self.enter_seen_array()
    }

    pub fn enter_seen_array(&mut self) -> JsonResult<Option<Peek>> {
        debug_assert_eq!(self.ctx.data[self.index], b'[');
        self.index += 1;
        if let Some(next) = self.eat_whitespace() {
            if next == b']' {
                self.index += 1;
                Ok(None)
            } else if next == b',' {
                Err(&EXPECTED_VALUE)
            } else {
                self.remaining_depth -= 1;
                if self.remaining_depth < 0 {
                    return Err(&RECURSION_LIMIT_EXCEEDED);
                }
                Ok(Some(Peek::new(next)))
            }
        } else {
            Err(&EOF_WHILE_PARSING_LIST_FIRST_ELEMENT)
        }
    }

    pub fn array_step(&mut self) -> JsonResult<Option<Peek>> {
        if let Some(next) = self.eat_whitespace() {
            match next {
                b',' => {
                    self.index += 1;
                    match self.array_peek()? {
                        None => {
                            // Tolerated at most once, and only when enabled:
                            // a second consecutive comma never reaches here
                            // because array_peek rejects it.
                            if self.config.allow_trailing_commas {
                                self.index += 1;
                                self.remaining_depth += 1;
                                Ok(None)
                            } else {
                                Err(&TRAILING_COMMA)
                            }
                        }
                        Some(next) => Ok(Some(next)),
                    }
                }
                b']' => {
                    self.index += 1;
                    self.remaining_depth += 1;
                    Ok(None)
                }
                _ => Err(&EXPECTED_LIST_COMMA_OR_END),
            }
        } else {
            Err(&EOF_WHILE_PARSING_LIST)
        }
    }

    fn array_peek(&mut self) -> JsonResult<Option<Peek>> {
        if let Some(next) = self.eat_whitespace() {
            match next {
                b']' => Ok(None),
                b',' => Err(&EXPECTED_VALUE),
                _ => Ok(Some(Peek::new(next))),
            }
        } else {
            Err(&EOF_WHILE_PARSING_VALUE)
        }
    }

    /// Enters an object, stopping just before the first key.
    ///
    /// Returns `None` for an empty object. The cursor is left at the first
    /// byte of the key, which may be a quote or (option-gated) an unquoted
    /// identifier byte.
    pub fn enter_object_at_first_key(&mut self) -> JsonResult<Option<()>> {
        if self.peek()? != Peek::Object {
            return Err(&EXPECTED_OBJECT);
        }
        self.enter_seen_object_at_first_key()
    }

    pub fn enter_seen_object_at_first_key(&mut self) -> JsonResult<Option<()>> {
        debug_assert_eq!(self.ctx.data[self.index], b'{');
        self.index += 1;
        if let Some(next) = self.eat_whitespace() {
            match next {
                b'}' => {
                    self.index += 1;
                    Ok(None)
                }
                _ if self.at_key_start(next) => {
                    self.remaining_depth -= 1;
                    if self.remaining_depth < 0 {
                        return Err(&RECURSION_LIMIT_EXCEEDED);
                    }
                    Ok(Some(()))
                }
                b'\'' => Err(&SINGLE_QUOTED_STRING),
                _ => Err(&KEY_MUST_BE_A_STRING),
            }
        } else {
            Err(&EOF_WHILE_PARSING_OBJECT)
        }
    }

    fn at_key_start(&self, next: u8) -> bool {
        next == b'"'
            || (next == b'\'' && self.config.allow_single_quotes)
            || (self.config.allow_unquoted_keys && is_ident_byte(next))
    }

    /// Steps past `,` to the next key, or past `}` out of the object.
    pub fn object_step_at_key(&mut self) -> JsonResult<Option<()>> {
        if let Some(next) = self.eat_whitespace() {
            match next {
                b',' => {
                    self.index += 1;
                    match self.eat_whitespace() {
                        Some(b'}') => {
                            if self.config.allow_trailing_commas {
                                self.index += 1;
                                self.remaining_depth += 1;
                                Ok(None)
                            } else {
                                Err(&TRAILING_COMMA)
                            }
                        }
                        Some(b',') => Err(&KEY_MUST_BE_A_STRING),
                        Some(next) if self.at_key_start(next) => Ok(Some(())),
                        Some(b'\'') => Err(&SINGLE_QUOTED_STRING),
                        Some(_) => Err(&KEY_MUST_BE_A_STRING),
                        None => Err(&EOF_WHILE_PARSING_VALUE),
                    }
                }
                b'}' => {
                    self.index += 1;
                    self.remaining_depth += 1;
                    Ok(None)
                }
                _ => Err(&EXPECTED_OBJECT_COMMA_OR_END),
            }
        } else {
            Err(&EOF_WHILE_PARSING_OBJECT)
        }
    }

    pub fn discard_colon(&mut self) -> JsonResult<()> {
        if let Some(next) = self.eat_whitespace() {
            if next == b':' {
                self.index += 1;
                Ok(())
            } else {
                Err(&EXPECTED_COLON)
            }
        } else {
            Err(&EOF_WHILE_PARSING_OBJECT)
        }
    }

    /// Reads the key the cursor is sitting on, decoding escapes if present.
    ///
    /// Handles quoted, single-quoted (option-gated) and unquoted
    /// (option-gated) keys. A bare `null` key is surfaced as the literal key
    /// `null`, which only the exact four bytes produce.
    pub fn read_key_cow(&mut self) -> JsonResult<Cow<'j, str>> {
        let Some(next) = self.eat_whitespace() else {
            return Err(&EOF_WHILE_PARSING_OBJECT);
        };
        match next {
            b'"' => self.take_seen_string_cow(b'"'),
            b'\'' if self.config.allow_single_quotes => self.take_seen_string_cow(b'\''),
            b'\'' => Err(&SINGLE_QUOTED_STRING),
            _ if self.config.allow_unquoted_keys && is_ident_byte(next) => {
                let start = self.index;
                while let Some(&ch) = self.ctx.data.get(self.index) {
                    if !is_ident_byte(ch) {
                        break;
                    }
                    self.index += 1;
                }
                let key = self.ctx.span_str(start, self.index)?;
                Ok(Cow::Borrowed(key))
            }
            _ if is_ident_byte(next) => Err(&UNQUOTED_KEY),
            _ => Err(&KEY_MUST_BE_A_STRING),
        }
    }

    pub fn finish(&mut self) -> JsonResult<()> {
        if self.eat_whitespace().is_none() {
            Ok(())
        } else {
            Err(&TRAILING_CHARACTERS)
        }
    }

    /// May only be called when the peek was `Peek::True`.
    pub fn discard_seen_true(&mut self) -> JsonResult<()> {
        debug_assert_eq!(self.ctx.data[self.index], b't');
        self.consume_ident(TRUE_REST)
    }

    /// May only be called when the peek was `Peek::False`.
    pub fn discard_seen_false(&mut self) -> JsonResult<()> {
        debug_assert_eq!(self.ctx.data[self.index], b'f');
        self.consume_ident(FALSE_REST)
    }

    pub fn discard_seen_null(&mut self) -> JsonResult<()> {
        debug_assert_eq!(self.ctx.data[self.index], b'n');
        self.consume_ident(NULL_REST)
    }

    fn consume_ident<const SIZE: usize>(&mut self, expected: [u8; SIZE]) -> JsonResult<()> {
        match self.ctx.data.get(self.index + 1..=self.index + SIZE) {
            Some(s) if s == expected => {
                self.index += SIZE + 1;
                Ok(())
            }
            Some(_) => Err(&EXPECTED_SOME_IDENT),
            None => Err(&EOF_WHILE_PARSING_VALUE),
        }
    }

    /// Advances the cursor to the next byte requiring attention inside a
    /// string: the terminating quote, a backslash, or a control byte.
    ///
    /// Escape-free spans are classified eight bytes at a time (SWAR over a
    /// little-endian `u64`), falling back to a per-byte scan for the tail.
    fn skip_to_escape(&mut self, quote: u8) {
        // Immediately bail out on empty strings and consecutive escapes.
        if self.index == self.ctx.data.len() || is_escape(self.ctx.data[self.index], quote) {
            return;
        }
        self.index += 1;

        let rest = &self.ctx.data[self.index..];

        type Chunk = u64;
        const STEP: usize = std::mem::size_of::<Chunk>();
        const ONE_BYTES: Chunk = Chunk::MAX / 255; // 0x0101...01

        let mut chunks = rest.chunks_exact(STEP);
        let mut offset = 0;
        for chunk in &mut chunks {
            let chars = Chunk::from_le_bytes(chunk.try_into().unwrap());
            let contains_ctrl = chars.wrapping_sub(ONE_BYTES * 0x20) & !chars;
            let chars_quote = chars ^ (ONE_BYTES * Chunk::from(quote));
            let contains_quote = chars_quote.wrapping_sub(ONE_BYTES) & !chars_quote;
            let chars_backslash = chars ^ (ONE_BYTES * Chunk::from(b'\\'));
            let contains_backslash = chars_backslash.wrapping_sub(ONE_BYTES) & !chars_backslash;
            let masked = (contains_ctrl | contains_quote | contains_backslash) & (ONE_BYTES << 7);
            if masked != 0 {
                self.index += offset + masked.trailing_zeros() as usize / 8;
                return;
            }
            offset += STEP;
        }

        self.index += offset;
        self.skip_to_escape_slow(quote);
    }

    #[cold]
    #[inline(never)]
    fn skip_to_escape_slow(&mut self, quote: u8) {
        while self.index < self.ctx.data.len() && !is_escape(self.ctx.data[self.index], quote) {
            self.index += 1;
        }
    }

    /// Scans the string the cursor is inside of, decoding escapes into the
    /// scratch buffer. The cursor must be just past the opening quote.
    ///
    /// Returns where the decoded content lives; at most one scratch
    /// allocation happens per call regardless of the number of escapes.
    pub(crate) fn read_seen_string_span(&mut self, quote: u8) -> JsonResult<StrSpan> {
        debug_assert_eq!(self.ctx.data[self.index], quote);
        self.index += 1;
        let mut start = self.index;
        self.scratch.clear();
        loop {
            self.skip_to_escape(quote);
            if self.index == self.ctx.data.len() {
                return Err(&EOF_WHILE_PARSING_STRING);
            }
            let ch = self.ctx.data[self.index];
            if ch == quote {
                if self.scratch.is_empty() {
                    let span = StrSpan::Raw {
                        start,
                        end: self.index,
                    };
                    self.index += 1;
                    return Ok(span);
                }
                self.scratch
                    .extend_from_slice(&self.ctx.data[start..self.index]);
                self.index += 1;
                return Ok(StrSpan::Scratch);
            }
            if ch == b'\\' {
                self.scratch
                    .extend_from_slice(&self.ctx.data[start..self.index]);
                self.index += 1;
                match crate::strings::parse_escape(self.index, self.ctx.data, &mut self.scratch) {
                    Ok(index) => {
                        self.index = index;
                        start = index;
                    }
                    Err(()) => return Err(&INVALID_STRING_ESCAPE),
                }
                continue;
            }
            return Err(&CONTROL_CHARACTER_IN_STRING);
        }
    }

    pub(crate) fn span_as_str(&self, span: StrSpan) -> JsonResult<&str> {
        match span {
            StrSpan::Raw { start, end } => self.ctx.span_str(start, end),
            StrSpan::Scratch => {
                if self.ctx.utf8 {
                    // Safety: raw spans copied into scratch come from a valid
                    // `&str` and escape decoding appends whole code points.
                    Ok(unsafe { std::str::from_utf8_unchecked(&self.scratch) })
                } else {
                    std::str::from_utf8(&self.scratch).map_err(|_| &INVALID_UTF8)
                }
            }
        }
    }

    fn take_seen_string_cow(&mut self, quote: u8) -> JsonResult<Cow<'j, str>> {
        match self.read_seen_string_span(quote)? {
            StrSpan::Raw { start, end } => Ok(Cow::Borrowed(self.ctx.span_str(start, end)?)),
            span @ StrSpan::Scratch => Ok(Cow::Owned(self.span_as_str(span)?.to_owned())),
        }
    }

    /// Reads the next string value. The returned slice borrows either the
    /// input or the scratch buffer; convert it before the next parser call.
    pub fn take_string(&mut self) -> JsonResult<&str> {
        let peek = self.peek()?;
        if !self.at_string_quote(peek) {
            if peek == Peek::SingleQuote {
                return Err(&SINGLE_QUOTED_STRING);
            }
            return Err(&EXPECTED_STRING);
        }
        let span = self.read_seen_string_span(peek.into_inner())?;
        self.span_as_str(span)
    }

    /// Reads the next string value, borrowing from the input when possible.
    pub fn take_cow_string(&mut self) -> JsonResult<Cow<'j, str>> {
        let peek = self.peek()?;
        if !self.at_string_quote(peek) {
            if peek == Peek::SingleQuote {
                return Err(&SINGLE_QUOTED_STRING);
            }
            return Err(&EXPECTED_STRING);
        }
        self.take_seen_string_cow(peek.into_inner())
    }

    /// Reads the next string value without copying. Fails when the string
    /// contains escape sequences.
    pub fn take_borrowed_string(&mut self) -> JsonResult<&'j str> {
        match self.take_cow_string()? {
            Cow::Borrowed(value) => Ok(value),
            Cow::Owned(_) => Err(&STRING_CONTAINS_ESCAPES),
        }
    }

    /// Skips over a string without materializing its content. Escapes are
    /// still validated so malformed input fails at the same offset it would
    /// during a real decode.
    pub(crate) fn skip_seen_string(&mut self, quote: u8) -> JsonResult<()> {
        debug_assert_eq!(self.ctx.data[self.index], quote);
        self.index += 1;
        loop {
            self.skip_to_escape(quote);
            if self.index == self.ctx.data.len() {
                return Err(&EOF_WHILE_PARSING_STRING);
            }
            let ch = self.ctx.data[self.index];
            if ch == quote {
                self.index += 1;
                return Ok(());
            }
            if ch == b'\\' {
                self.index += 1;
                match skip_escape(self.index, self.ctx.data) {
                    Ok(index) => self.index = index,
                    Err(()) => return Err(&INVALID_STRING_ESCAPE),
                }
                continue;
            }
            return Err(&CONTROL_CHARACTER_IN_STRING);
        }
    }

    /// Structurally skips the next value without building anything.
    ///
    /// This is the unknown-field path: cost is proportional to the size of
    /// the skipped value and performs no allocation.
    pub fn skip_value(&mut self) -> JsonResult<()> {
        let peek = self.peek()?;
        match peek {
            Peek::Array => {
                if self.enter_seen_array()?.is_some() {
                    loop {
                        self.skip_value()?;
                        if self.array_step()?.is_none() {
                            break;
                        }
                    }
                }
                Ok(())
            }
            Peek::Object => {
                if self.enter_seen_object_at_first_key()?.is_some() {
                    loop {
                        self.skip_key()?;
                        self.discard_colon()?;
                        self.skip_value()?;
                        if self.object_step_at_key()?.is_none() {
                            break;
                        }
                    }
                }
                Ok(())
            }
            Peek::True => self.discard_seen_true(),
            Peek::False => self.discard_seen_false(),
            Peek::Null => self.discard_seen_null(),
            Peek::String => self.skip_seen_string(b'"'),
            Peek::SingleQuote if self.config.allow_single_quotes => self.skip_seen_string(b'\''),
            _ if peek.is_num() => {
                crate::number::scan(self)?;
                Ok(())
            }
            _ => Err(&EXPECTED_VALUE),
        }
    }

    /// Skips the key the cursor is sitting on without materializing it.
    pub(crate) fn skip_key(&mut self) -> JsonResult<()> {
        let Some(next) = self.eat_whitespace() else {
            return Err(&EOF_WHILE_PARSING_OBJECT);
        };
        match next {
            b'"' => self.skip_seen_string(b'"'),
            b'\'' if self.config.allow_single_quotes => self.skip_seen_string(b'\''),
            _ if self.config.allow_unquoted_keys && is_ident_byte(next) => {
                while let Some(&ch) = self.ctx.data.get(self.index) {
                    if !is_ident_byte(ch) {
                        break;
                    }
                    self.index += 1;
                }
                Ok(())
            }
            _ => Err(&KEY_MUST_BE_A_STRING),
        }
    }

    /// Skips the remaining fields of the object the parser is inside of.
    pub fn discard_remaining_object_fields(&mut self) -> JsonResult<()> {
        loop {
            match self.object_step_at_key()? {
                Some(()) => {
                    self.skip_key()?;
                    self.discard_colon()?;
                    self.skip_value()?;
                }
                None => return Ok(()),
            }
        }
    }

    #[cfg(feature = "json_comments")]
    #[cold]
    fn eat_comment(&mut self) {
        let comment_start = self.index;
        self.index += 1;
        let Some(ch) = self.ctx.data.get(self.index) else {
            return;
        };
        if *ch == b'/' {
            if let Some(offset) = memchr::memchr(b'\n', &self.ctx.data[self.index + 1..]) {
                self.index += offset + 2;
            } else {
                self.index = self.ctx.data.len();
            }
            return;
        }
        if *ch == b'*' {
            let mut index = self.index;
            while let Some(offset) = memchr::memchr(b'*', &self.ctx.data[index + 1..]) {
                index += offset + 1;
                if self.ctx.data.get(index + 1) == Some(&b'/') {
                    self.index = index + 2;
                    return;
                }
            }
            // Unterminated block comment: consume to the end so the caller
            // reports EOF, and record where the comment began.
            self.report_error(format!(
                "unterminated block comment starting at offset {comment_start}"
            ));
            self.index = self.ctx.data.len();
            return;
        }
        // A lone '/' is not whitespace; leave the cursor on the next byte so
        // the caller reports it as an unexpected character.
        self.index = comment_start;
    }

    /// Skips whitespace (and comments when enabled) and returns the next
    /// significant byte without consuming it. After each comment, whitespace
    /// and further comments are re-checked.
    fn eat_whitespace(&mut self) -> Option<u8> {
        let mut next = *self.ctx.data.get(self.index)?;
        #[cfg(feature = "json_comments")]
        if next > b'/' {
            return Some(next);
        }
        #[cfg(not(feature = "json_comments"))]
        if next > b' ' {
            return Some(next);
        }
        loop {
            match next {
                b' ' | b'\r' | b'\t' | b'\n' => self.index += 1,
                #[cfg(feature = "json_comments")]
                b'/' if self.config.allow_comments => {
                    let before = self.index;
                    self.eat_comment();
                    if self.index == before {
                        return Some(next);
                    }
                }
                _ => return Some(next),
            }
            next = *self.ctx.data.get(self.index)?;
        }
    }
}

/// Validates and steps over one escape sequence without decoding it.
fn skip_escape(mut index: usize, read: &[u8]) -> Result<usize, ()> {
    let Some(ch) = read.get(index) else {
        return Err(());
    };
    index += 1;
    match ch {
        b'"' | b'\'' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => Ok(index),
        b'u' => match read.get(index..index + 4) {
            Some(digits) if digits.iter().all(u8::is_ascii_hexdigit) => Ok(index + 4),
            _ => Err(()),
        },
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonParserConfig;

    fn parser(data: &str) -> Parser<'_> {
        Parser::new(data, JsonParserConfig::default())
    }

    #[test]
    fn peek_skips_whitespace() {
        let mut p = parser("  \n\t true");
        assert_eq!(p.peek().unwrap(), Peek::True);
        assert_eq!(p.index, 5);
    }

    #[test]
    fn string_without_escapes_borrows_input() {
        let mut p = parser("\"hello world\"");
        assert_eq!(p.take_borrowed_string().unwrap(), "hello world");
        assert!(p.finish().is_ok());
    }

    #[test]
    fn string_with_escape_uses_scratch() {
        let mut p = parser(r#""a\tb""#);
        assert_eq!(p.take_string().unwrap(), "a\tb");
        let mut p = parser(r#""a\tb""#);
        assert!(p.take_borrowed_string().is_err());
    }

    #[test]
    fn long_string_exercises_swar_path() {
        let body = "x".repeat(100);
        let input = format!("\"{body}\"");
        let mut p = parser(&input);
        assert_eq!(p.take_string().unwrap(), body);
    }

    #[test]
    fn control_byte_in_string_rejected() {
        let mut p = parser("\"a\u{1}b\"");
        assert!(p.take_string().is_err());
    }

    #[test]
    fn skip_value_handles_nesting() {
        let mut p = parser(r#"{"a":[1,{"b":"c\n"},null],"d":true}  "#);
        p.skip_value().unwrap();
        assert!(p.finish().is_ok());
    }

    #[test]
    fn comments_are_whitespace_when_enabled() {
        let mut p = parser("/*c*/ // line\n 1");
        p.config.allow_comments = true;
        assert!(p.peek().unwrap().is_num());

        let mut p = parser("/**/1");
        p.config.allow_comments = true;
        assert!(p.peek().unwrap().is_num());
    }

    #[test]
    fn comments_rejected_by_default() {
        let mut p = parser("/*c*/ 1");
        assert!(!p.peek().unwrap().is_num());
    }

    #[test]
    fn unterminated_block_comment_is_eof() {
        let mut p = parser("/* never ends");
        p.config.allow_comments = true;
        assert!(p.peek().is_err());
        assert!(p.ctx.error.as_deref().unwrap().contains("offset 0"));
    }

    #[test]
    fn single_quotes_gated() {
        let mut p = parser("'abc'");
        assert!(p.take_string().is_err());
        let mut p = parser("'abc'");
        p.config.allow_single_quotes = true;
        assert_eq!(p.take_string().unwrap(), "abc");
    }

    #[test]
    fn unquoted_keys_gated() {
        let mut p = parser("{key: 1}");
        assert!(p.enter_object_at_first_key().is_err());

        let mut p = parser("{key: 1}");
        p.config.allow_unquoted_keys = true;
        assert!(p.enter_object_at_first_key().unwrap().is_some());
        assert_eq!(p.read_key_cow().unwrap(), "key");
    }

    #[test]
    fn null_key_is_literal_null() {
        let mut p = parser("{null: 1}");
        p.config.allow_unquoted_keys = true;
        assert!(p.enter_object_at_first_key().unwrap().is_some());
        assert_eq!(p.read_key_cow().unwrap(), "null");
    }

    #[test]
    fn bytes_input_validates_utf8() {
        let mut p = Parser::new_bytes(b"\"\xff\xfe\"", JsonParserConfig::default());
        assert!(p.take_string().is_err());
        let mut p = Parser::new_bytes("\"ok\u{e9}\"".as_bytes(), JsonParserConfig::default());
        assert_eq!(p.take_string().unwrap(), "ok\u{e9}");
    }
}
