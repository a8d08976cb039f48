//! Numeric literal scanning and conversion.
//!
//! Literals are scanned in a single left-to-right pass that accumulates up to
//! 18 digits of magnitude in a `u64`, tracks the decimal point and exponent,
//! and classifies the result. Longer literals are not folded; their exact
//! text is kept so nothing is silently rounded away.

use crate::error::*;
use crate::parser::Parser;

type JsonResult<T> = Result<T, &'static DecodeError>;

/// A scanned numeric literal, already classified by magnitude and shape.
///
/// Integers narrow to `Int` when they fit, otherwise widen to `Long`, and
/// past 18 digits keep their literal text as `BigInt`. Decimals become
/// `Double` unless suffixed `f`/`F`, or kept as literal `BigDecimal` text
/// when precision must be preserved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedNumber<'j> {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInt(&'j str),
    BigDecimal(&'j str),
}

// Exactly representable powers of ten. 10^22 is the largest that fits a
// double without rounding.
static POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

/// Assembles a double from a decimal magnitude and a power-of-ten scale.
///
/// When both the magnitude and the scale are exactly representable the
/// result is exact. Outside that window the two roundings can drift the
/// result by an ulp, which keeps the common 15-significant-digit range
/// faithful without an arbitrary-precision pass.
fn assemble_double(magnitude: u64, scale: i32, negative: bool) -> f64 {
    let mut value = magnitude as f64;
    if scale > 0 {
        if scale as usize >= POW10.len() {
            value *= 10f64.powi(scale);
        } else {
            value *= POW10[scale as usize];
        }
    } else if scale < 0 {
        let down = -scale;
        if down as usize >= POW10.len() {
            value /= 10f64.powi(down);
        } else {
            value /= POW10[down as usize];
        }
    }
    if negative {
        -value
    } else {
        value
    }
}

fn is_literal_terminator(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\n' | b'\r' | b',' | b']' | b'}' | b':' | b'/')
}

/// Scans the numeric literal at the cursor. The caller must have peeked a
/// numeric start byte.
pub fn scan<'j>(parser: &mut Parser<'j>) -> JsonResult<ParsedNumber<'j>> {
    let data = parser.ctx.data;
    let mut index = parser.index;

    let negative = data[index] == b'-';
    if negative {
        index += 1;
    }

    match data.get(index) {
        Some(b'I') => return non_finite(parser, index, b"Infinity", negative, f64::INFINITY),
        Some(b'N') if !negative => return non_finite(parser, index, b"NaN", false, f64::NAN),
        _ => {}
    }

    let digits_start = index;
    let mut magnitude: u64 = 0;
    let mut digit_count = 0u32;
    let mut overflowed = false;

    while let Some(&ch) = data.get(index) {
        if !ch.is_ascii_digit() {
            break;
        }
        if digit_count < 18 {
            magnitude = magnitude * 10 + u64::from(ch - b'0');
        } else {
            overflowed = true;
        }
        digit_count += 1;
        index += 1;
    }
    if digit_count == 0 {
        parser.index = index;
        return Err(&INVALID_NUMERIC_LITERAL);
    }
    if digit_count > 1 && data[digits_start] == b'0' {
        parser.index = digits_start;
        return Err(&LEADING_ZERO_IN_NUMBER);
    }

    let mut frac_digits = 0i32;
    let mut is_decimal = false;

    if data.get(index) == Some(&b'.') {
        is_decimal = true;
        index += 1;
        let frac_start = index;
        while let Some(&ch) = data.get(index) {
            if !ch.is_ascii_digit() {
                break;
            }
            if digit_count < 18 {
                magnitude = magnitude * 10 + u64::from(ch - b'0');
                digit_count += 1;
                frac_digits += 1;
            } else {
                overflowed = true;
            }
            index += 1;
        }
        if index == frac_start {
            parser.index = index;
            return Err(&INVALID_NUMERIC_LITERAL);
        }
    }

    let mut exponent = 0i64;
    if matches!(data.get(index), Some(b'e') | Some(b'E')) {
        is_decimal = true;
        index += 1;
        let exp_negative = match data.get(index) {
            Some(b'-') => {
                index += 1;
                true
            }
            Some(b'+') => {
                index += 1;
                false
            }
            _ => false,
        };
        let exp_start = index;
        while let Some(&ch) = data.get(index) {
            if !ch.is_ascii_digit() {
                break;
            }
            exponent = (exponent * 10 + i64::from(ch - b'0')).min(100_000);
            index += 1;
        }
        if index == exp_start {
            parser.index = index;
            return Err(&INVALID_NUMERIC_LITERAL);
        }
        if exp_negative {
            exponent = -exponent;
        }
    }

    let literal_end = index;

    // Single trailing type suffix, never part of the kept literal text.
    let suffix = match data.get(index) {
        Some(s @ (b'l' | b'L' | b'f' | b'F' | b'd' | b'D')) => {
            index += 1;
            Some(s.to_ascii_lowercase())
        }
        _ => None,
    };

    if let Some(&ch) = data.get(index) {
        if !is_literal_terminator(ch) {
            parser.index = index;
            return Err(if suffix.is_some() {
                &INVALID_NUMBER_SUFFIX
            } else {
                &INVALID_NUMERIC_LITERAL
            });
        }
    }
    parser.index = index;

    if suffix == Some(b'l') && is_decimal {
        return Err(&INVALID_NUMBER_SUFFIX);
    }

    // Span of the literal excluding any suffix.
    let text_start = if negative { digits_start - 1 } else { digits_start };

    if !is_decimal {
        if overflowed {
            return Ok(ParsedNumber::BigInt(parser.ctx.span_str(text_start, literal_end)?));
        }
        let signed = apply_sign(magnitude, negative);
        return Ok(match suffix {
            Some(b'f') => ParsedNumber::Float(signed as f32),
            Some(b'd') => ParsedNumber::Double(signed as f64),
            Some(b'l') => ParsedNumber::Long(signed),
            _ => {
                if let Ok(small) = i32::try_from(signed) {
                    ParsedNumber::Int(small)
                } else {
                    ParsedNumber::Long(signed)
                }
            }
        });
    }

    if parser.config.arbitrary_precision_numbers && suffix.is_none() {
        return Ok(ParsedNumber::BigDecimal(
            parser.ctx.span_str(text_start, literal_end)?,
        ));
    }
    if overflowed {
        return Ok(ParsedNumber::BigDecimal(
            parser.ctx.span_str(text_start, literal_end)?,
        ));
    }

    let scale = match i32::try_from(exponent) {
        Ok(exp) => exp - frac_digits,
        Err(_) => return Err(&NUMBER_OUT_OF_RANGE),
    };
    let value = assemble_double(magnitude, scale, negative);
    Ok(match suffix {
        Some(b'f') => ParsedNumber::Float(value as f32),
        _ => ParsedNumber::Double(value),
    })
}

fn apply_sign(magnitude: u64, negative: bool) -> i64 {
    // At most 18 digits were accumulated so the magnitude always fits.
    if negative {
        -(magnitude as i64)
    } else {
        magnitude as i64
    }
}

fn non_finite<'j>(
    parser: &mut Parser<'j>,
    index: usize,
    expected: &[u8],
    negative: bool,
    value: f64,
) -> JsonResult<ParsedNumber<'j>> {
    if parser.ctx.data.get(index..index + expected.len()) == Some(expected) {
        parser.index = index + expected.len();
        Ok(ParsedNumber::Double(if negative { -value } else { value }))
    } else {
        Err(&INVALID_NUMERIC_LITERAL)
    }
}

impl<'j> ParsedNumber<'j> {
    /// Signed integral view with range checking. Decimals never coerce.
    pub fn long(&self) -> JsonResult<i64> {
        match *self {
            ParsedNumber::Int(v) => Ok(v.into()),
            ParsedNumber::Long(v) => Ok(v),
            ParsedNumber::BigInt(text) => text.parse().map_err(|_| &NUMBER_OUT_OF_RANGE),
            _ => Err(&NUMBER_OUT_OF_RANGE),
        }
    }

    pub fn unsigned(&self) -> JsonResult<u64> {
        match *self {
            ParsedNumber::Int(v) => u64::try_from(v).map_err(|_| &NUMBER_OUT_OF_RANGE),
            ParsedNumber::Long(v) => u64::try_from(v).map_err(|_| &NUMBER_OUT_OF_RANGE),
            ParsedNumber::BigInt(text) => text.parse().map_err(|_| &NUMBER_OUT_OF_RANGE),
            _ => Err(&NUMBER_OUT_OF_RANGE),
        }
    }

    pub fn long_wide(&self) -> JsonResult<i128> {
        match *self {
            ParsedNumber::Int(v) => Ok(v.into()),
            ParsedNumber::Long(v) => Ok(v.into()),
            ParsedNumber::BigInt(text) => text.parse().map_err(|_| &NUMBER_OUT_OF_RANGE),
            _ => Err(&NUMBER_OUT_OF_RANGE),
        }
    }

    pub fn unsigned_wide(&self) -> JsonResult<u128> {
        match *self {
            ParsedNumber::Int(v) => u128::try_from(v).map_err(|_| &NUMBER_OUT_OF_RANGE),
            ParsedNumber::Long(v) => u128::try_from(v).map_err(|_| &NUMBER_OUT_OF_RANGE),
            ParsedNumber::BigInt(text) => text.parse().map_err(|_| &NUMBER_OUT_OF_RANGE),
            _ => Err(&NUMBER_OUT_OF_RANGE),
        }
    }

    /// Lossy floating view; every category converts.
    pub fn double(&self) -> JsonResult<f64> {
        match *self {
            ParsedNumber::Int(v) => Ok(v.into()),
            ParsedNumber::Long(v) => Ok(v as f64),
            ParsedNumber::Float(v) => Ok(v.into()),
            ParsedNumber::Double(v) => Ok(v),
            ParsedNumber::BigInt(text) | ParsedNumber::BigDecimal(text) => {
                text.parse().map_err(|_| &INVALID_NUMERIC_LITERAL)
            }
        }
    }

    pub fn float(&self) -> JsonResult<f32> {
        match *self {
            ParsedNumber::Float(v) => Ok(v),
            ParsedNumber::BigInt(text) | ParsedNumber::BigDecimal(text) => {
                text.parse().map_err(|_| &INVALID_NUMERIC_LITERAL)
            }
            _ => Ok(self.double()? as f32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonParserConfig;

    fn scan_one(input: &str) -> JsonResult<ParsedNumber<'_>> {
        let mut parser = Parser::new(input, JsonParserConfig::default());
        parser.peek()?;
        scan(&mut parser)
    }

    #[test]
    fn integers_narrow_then_widen() {
        assert_eq!(scan_one("0").unwrap(), ParsedNumber::Int(0));
        assert_eq!(scan_one("-42").unwrap(), ParsedNumber::Int(-42));
        assert_eq!(scan_one("2147483647").unwrap(), ParsedNumber::Int(i32::MAX));
        assert_eq!(
            scan_one("2147483648").unwrap(),
            ParsedNumber::Long(2147483648)
        );
        assert_eq!(
            scan_one("-2147483649").unwrap(),
            ParsedNumber::Long(-2147483649)
        );
    }

    #[test]
    fn big_integers_keep_text() {
        assert_eq!(
            scan_one("123456789012345678901").unwrap(),
            ParsedNumber::BigInt("123456789012345678901")
        );
        assert_eq!(
            scan_one("-123456789012345678901").unwrap(),
            ParsedNumber::BigInt("-123456789012345678901")
        );
    }

    #[test]
    fn decimals_become_doubles() {
        assert_eq!(scan_one("1.5").unwrap(), ParsedNumber::Double(1.5));
        assert_eq!(scan_one("-0.25").unwrap(), ParsedNumber::Double(-0.25));
        assert_eq!(scan_one("1e3").unwrap(), ParsedNumber::Double(1000.0));
        assert_eq!(scan_one("25e-2").unwrap(), ParsedNumber::Double(0.25));
        assert_eq!(scan_one("1.25E+2").unwrap(), ParsedNumber::Double(125.0));
    }

    #[test]
    fn suffixes() {
        assert_eq!(scan_one("10l").unwrap(), ParsedNumber::Long(10));
        assert_eq!(scan_one("10L").unwrap(), ParsedNumber::Long(10));
        assert_eq!(scan_one("1.5f").unwrap(), ParsedNumber::Float(1.5));
        assert_eq!(scan_one("2F").unwrap(), ParsedNumber::Float(2.0));
        assert_eq!(scan_one("3d").unwrap(), ParsedNumber::Double(3.0));
        assert!(scan_one("1.5L").is_err());
        assert!(scan_one("10x").is_err());
    }

    #[test]
    fn malformed_literals() {
        assert!(scan_one("-").is_err());
        assert!(scan_one("1.").is_err());
        assert!(scan_one("1e").is_err());
        assert!(scan_one("1e+").is_err());
        assert!(scan_one("01").is_err());
        assert!(scan_one("1..2").is_err());
    }

    #[test]
    fn non_finite_literals() {
        assert!(matches!(
            scan_one("Infinity").unwrap(),
            ParsedNumber::Double(v) if v == f64::INFINITY
        ));
        assert!(matches!(
            scan_one("-Infinity").unwrap(),
            ParsedNumber::Double(v) if v == f64::NEG_INFINITY
        ));
        assert!(matches!(
            scan_one("NaN").unwrap(),
            ParsedNumber::Double(v) if v.is_nan()
        ));
    }

    #[test]
    fn arbitrary_precision_keeps_decimal_text() {
        let mut parser = Parser::new("3.141592653589793238462643", JsonParserConfig::default());
        parser.config.arbitrary_precision_numbers = true;
        parser.peek().unwrap();
        assert_eq!(
            scan(&mut parser).unwrap(),
            ParsedNumber::BigDecimal("3.141592653589793238462643")
        );
    }

    #[test]
    fn conversions_range_check() {
        assert_eq!(scan_one("300").unwrap().long().unwrap(), 300);
        assert!(scan_one("-1").unwrap().unsigned().is_err());
        assert!(scan_one("1.5").unwrap().long().is_err());
        assert_eq!(scan_one("1.5").unwrap().double().unwrap(), 1.5);
        assert_eq!(
            scan_one("123456789012345678901")
                .unwrap()
                .unsigned_wide()
                .unwrap(),
            123456789012345678901u128
        );
    }
}
