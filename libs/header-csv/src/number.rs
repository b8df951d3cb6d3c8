//! Integer literals with base-prefix sniffing, plus float text.
//!
//! Accepted integer forms: optional sign, then `0x`/`0X` (hex), `0o`/`0O` or
//! a leading `0` (octal), `0b`/`0B` (binary), or plain decimal. Underscores
//! may separate digits (and may directly follow a prefix).

use std::fmt;

use crate::error::CellError;

/// Parsed sign and magnitude of an integer literal.
struct Literal {
    negative: bool,
    magnitude: u64,
}

fn split_radix(digits: &str) -> (u32, &str, bool) {
    let bytes = digits.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'0' {
        match bytes[1] {
            b'x' | b'X' => return (16, &digits[2..], true),
            b'o' | b'O' => return (8, &digits[2..], true),
            b'b' | b'B' => return (2, &digits[2..], true),
            _ => return (8, &digits[1..], true),
        }
    }
    (10, digits, false)
}

fn underscores_ok(digits: &str, prefixed: bool) -> bool {
    // '_' must sit between digits; a prefix counts as a digit on its left.
    let mut prev_digit = prefixed;
    let mut prev_underscore = false;
    for b in digits.bytes() {
        if b == b'_' {
            if !prev_digit {
                return false;
            }
            prev_digit = false;
            prev_underscore = true;
        } else {
            prev_digit = true;
            prev_underscore = false;
        }
    }
    !prev_underscore
}

fn parse_literal(text: &str, kind: &'static str, signed: bool) -> Result<Literal, CellError> {
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') if signed => (true, &text[1..]),
        Some(b'+') if signed => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, digits, prefixed) = split_radix(unsigned);
    if digits.is_empty() || !underscores_ok(digits, prefixed) {
        return Err(CellError::syntax(kind, text));
    }

    let mut magnitude: u64 = 0;
    let mut overflow = false;
    for b in digits.bytes() {
        if b == b'_' {
            continue;
        }
        let digit = (b as char)
            .to_digit(radix)
            .ok_or_else(|| CellError::syntax(kind, text))?;
        match magnitude
            .checked_mul(u64::from(radix))
            .and_then(|m| m.checked_add(u64::from(digit)))
        {
            Some(m) => magnitude = m,
            // Keep scanning so malformed text still reports a syntax error.
            None => overflow = true,
        }
    }
    if overflow {
        return Err(CellError::overflow(kind, text));
    }
    Ok(Literal { negative, magnitude })
}

pub(crate) fn parse_signed(text: &str) -> Result<i64, CellError> {
    const KIND: &str = "integer";
    let lit = parse_literal(text, KIND, true)?;
    let wide = if lit.negative {
        -i128::from(lit.magnitude)
    } else {
        i128::from(lit.magnitude)
    };
    i64::try_from(wide).map_err(|_| CellError::overflow(KIND, text))
}

pub(crate) fn parse_unsigned(text: &str) -> Result<u64, CellError> {
    parse_literal(text, "unsigned integer", false).map(|lit| lit.magnitude)
}

/// `inf`, `infinity` and `nan` spellings, any case, optionally signed.
pub(crate) fn is_non_finite_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    ["inf", "infinity", "nan"]
        .iter()
        .any(|lit| unsigned.eq_ignore_ascii_case(lit))
}

/// Shortest text that parses back to `value`. Decimal exponents outside
/// `-4..21` switch to exponent form, as `%g` does.
pub(crate) fn format_float<T: fmt::Display + fmt::LowerExp>(value: T) -> String {
    let scientific = format!("{value:e}");
    // Non-finite values have no exponent and fall through to `Display`.
    match scientific.split_once('e').map(|(_, exp)| exp.parse::<i32>()) {
        Some(Ok(exp)) if !(-4..21).contains(&exp) => scientific,
        _ => value.to_string(),
    }
}
