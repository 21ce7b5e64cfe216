//! Coordinate text → signed decimal
//!
//! Accepts plain decimals (`4.5389`, `-75.6821`, `4`) and the segmented
//! "ISO" style produced by some spreadsheet exports, where only the first dot
//! is the decimal separator and later dots group digits
//! (`4.109.694.509` → `4.109694509`).
//!
//! Parsing is culture-invariant: commas, exponents and other notations are
//! rejected rather than guessed at.

use bigdecimal::BigDecimal;
use std::str::FromStr;

/// Parse coordinate text
///
/// Returns `None` for blank or unparseable input; callers treat that as
/// "no explicit coordinate supplied".
pub fn parse_coordinate(text: &str) -> Option<BigDecimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    // First dot separates the fraction; any later dots are grouping noise.
    let (integer, fraction) = match trimmed.split_once('.') {
        Some((integer, rest)) => (integer, rest.replace('.', "")),
        None => (trimmed, String::new()),
    };

    let (sign, digits) = match integer.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integer.strip_prefix('+').unwrap_or(integer)),
    };

    if !digits.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
        || (digits.is_empty() && fraction.is_empty())
    {
        return None;
    }

    let digits = if digits.is_empty() { "0" } else { digits };
    let canonical = if fraction.is_empty() {
        format!("{}{}", sign, digits)
    } else {
        format!("{}{}.{}", sign, digits, fraction)
    };

    BigDecimal::from_str(&canonical).ok()
}
