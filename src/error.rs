use std::fmt;

/// A contextless decoding error.
///
/// Decoding failures inside the parser are reported as references to static
/// instances of this type, which keeps the error path allocation free. The
/// public entry points wrap the static error into a [`crate::JsonError`]
/// that carries the buffer offset and surrounding input.
#[derive(Debug)]
pub struct DecodeError {
    pub message: &'static str,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl std::error::Error for DecodeError {}

pub static EOF_WHILE_PARSING_VALUE: DecodeError = DecodeError {
    message: "EOF while parsing value",
};
pub static EOF_WHILE_PARSING_LIST: DecodeError = DecodeError {
    message: "EOF while parsing a list",
};
pub static EOF_WHILE_PARSING_LIST_FIRST_ELEMENT: DecodeError = DecodeError {
    message: "EOF while parsing a list first element",
};
pub static EOF_WHILE_PARSING_OBJECT: DecodeError = DecodeError {
    message: "EOF while parsing object",
};
pub static EOF_WHILE_PARSING_STRING: DecodeError = DecodeError {
    message: "EOF while parsing string",
};
pub static EXPECTED_LIST_COMMA_OR_END: DecodeError = DecodeError {
    message: "Expected list comma or end",
};
pub static EXPECTED_OBJECT_COMMA_OR_END: DecodeError = DecodeError {
    message: "Expected object comma or end",
};
pub static EXPECTED_COLON: DecodeError = DecodeError {
    message: "Expected colon after key",
};
pub static EXPECTED_SOME_IDENT: DecodeError = DecodeError {
    message: "Expected some ident",
};
pub static EXPECTED_VALUE: DecodeError = DecodeError {
    message: "Expected a value",
};
pub static EXPECTED_STRING: DecodeError = DecodeError {
    message: "Expected a string value",
};
pub static EXPECTED_OBJECT: DecodeError = DecodeError {
    message: "Expected an object",
};

pub static KEY_MUST_BE_A_STRING: DecodeError = DecodeError {
    message: "Key must be a string",
};
pub static TRAILING_CHARACTERS: DecodeError = DecodeError {
    message: "Trailing characters",
};
pub static TRAILING_COMMA: DecodeError = DecodeError {
    message: "Trailing Comma",
};
pub static RECURSION_LIMIT_EXCEEDED: DecodeError = DecodeError {
    message: "Recursion limit exceeded",
};

pub static INVALID_STRING_ESCAPE: DecodeError = DecodeError {
    message: "Invalid string escape",
};
pub static CONTROL_CHARACTER_IN_STRING: DecodeError = DecodeError {
    message: "Control character detected in string",
};
pub static STRING_CONTAINS_ESCAPES: DecodeError = DecodeError {
    message: "String contains escapes",
};
pub static INVALID_UTF8: DecodeError = DecodeError {
    message: "Invalid UTF-8 in input",
};
pub static SINGLE_QUOTED_STRING: DecodeError = DecodeError {
    message: "Single quoted strings require the allow_single_quotes option",
};
pub static UNQUOTED_KEY: DecodeError = DecodeError {
    message: "Unquoted keys require the allow_unquoted_keys option",
};

pub static INVALID_NUMERIC_LITERAL: DecodeError = DecodeError {
    message: "Invalid numeric literal",
};
pub static NUMBER_OUT_OF_RANGE: DecodeError = DecodeError {
    message: "Number out of range for target type",
};
pub static LEADING_ZERO_IN_NUMBER: DecodeError = DecodeError {
    message: "Leading zero in numeric literal",
};
pub static INVALID_NUMBER_SUFFIX: DecodeError = DecodeError {
    message: "Invalid numeric literal suffix",
};

pub static UNKNOWN_VARIANT: DecodeError = DecodeError {
    message: "Unknown enum variant",
};
pub static DUPLICATE_FIELD: DecodeError = DecodeError {
    message: "Duplicate field",
};
pub static MISSING_REQUIRED_FIELDS: DecodeError = DecodeError {
    message: "Missing required fields",
};
pub static MISSING_DISCRIMINATOR: DecodeError = DecodeError {
    message: "Missing discriminator field",
};

pub static INVALID_BOOL_LITERAL: DecodeError = DecodeError {
    message: "Invalid boolean literal",
};
pub static EXPECTED_SINGLE_CHAR: DecodeError = DecodeError {
    message: "Expected a single char",
};
pub static ARRAY_LENGTH_MISMATCH: DecodeError = DecodeError {
    message: "Array length mismatch",
};

pub static OUTPUT_TOO_LARGE: DecodeError = DecodeError {
    message: "Serialized output exceeds the maximum allowed size",
};
