//! Scaled-integer arithmetic for GLW-wei and points.

use primitive_types::U256;
use thiserror::Error;

/// One GLW in wei.
pub const GLW_DECIMALS: u128 = 1_000_000_000_000_000_000;

/// Scale of points values (`1_000_000` = 1.0 point).
pub const POINTS_SCALE: u128 = 1_000_000;

/// Scale of multipliers (`1_000_000` = 1.0x).
pub const MULTIPLIER_SCALE: u128 = 1_000_000;

/// Scale of deposit split percentages (`1_000_000` = 100%).
pub const SPLIT_SCALE: u128 = 1_000_000;

/// Errors from parsing scaled6 decimal strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Input was empty or contained a non-digit.
    #[error("invalid scaled6 decimal: {0}")]
    Invalid(String),

    /// More than six fractional digits.
    #[error("too many fractional digits in {0}")]
    Precision(String),

    /// Value does not fit in u128.
    #[error("scaled6 value out of range: {0}")]
    Overflow(String),
}

/// Computes `floor(a * b / c)` through a 256-bit intermediate.
///
/// Returns 0 when `c == 0` and saturates at `u128::MAX`.
pub fn mul_div(a: u128, b: u128, c: u128) -> u128 {
    if c == 0 || a == 0 || b == 0 {
        return 0;
    }
    let result = U256::from(a) * U256::from(b) / U256::from(c);
    if result > U256::from(u128::MAX) {
        u128::MAX
    } else {
        result.as_u128()
    }
}

/// Converts a GLW-wei amount into scaled6 points at `rate_scaled6` points per GLW.
///
/// `glw_wei_to_points_scaled6(GLW_DECIMALS, 1_000_000) == 1_000_000`.
pub fn glw_wei_to_points_scaled6(glw_wei: u128, rate_scaled6: u128) -> u128 {
    mul_div(glw_wei, rate_scaled6, GLW_DECIMALS)
}

/// Applies a scaled6 multiplier to scaled6 points.
pub fn apply_multiplier_scaled6(points_scaled6: u128, multiplier_scaled6: u128) -> u128 {
    mul_div(points_scaled6, multiplier_scaled6, MULTIPLIER_SCALE)
}

/// Clamps a signed intermediate to an unsigned amount.
pub fn clamp_to_zero(value: i128) -> u128 {
    if value <= 0 {
        0
    } else {
        value as u128
    }
}

/// Saturating sum of points values.
pub fn add_points<I>(values: I) -> u128
where
    I: IntoIterator<Item = u128>,
{
    values
        .into_iter()
        .fold(0u128, |acc, value| acc.saturating_add(value))
}

/// Formats scaled6 points as a fixed six-decimal string (`10_500_000` -> `"10.500000"`).
pub fn format_points_scaled6(points_scaled6: u128) -> String {
    format!(
        "{}.{:06}",
        points_scaled6 / POINTS_SCALE,
        points_scaled6 % POINTS_SCALE
    )
}

/// Formats a signed scaled6 value (`-1_250_000` -> `"-1.250000"`).
pub fn format_scaled6(value: i128) -> String {
    let sign = if value < 0 { "-" } else { "" };
    format!("{}{}", sign, format_points_scaled6(value.unsigned_abs()))
}

/// Parses a decimal string into scaled6 points. Accepts at most six fractional digits.
pub fn parse_points_scaled6(input: &str) -> Result<u128, ParseError> {
    let trimmed = input.trim();
    let (whole, frac) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(ParseError::Invalid(input.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::Invalid(input.to_string()));
    }
    if frac.len() > 6 {
        return Err(ParseError::Precision(input.to_string()));
    }

    let whole_value: u128 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| ParseError::Overflow(input.to_string()))?
    };
    let frac_value: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<6}", frac);
        padded
            .parse()
            .map_err(|_| ParseError::Invalid(input.to_string()))?
    };

    whole_value
        .checked_mul(POINTS_SCALE)
        .and_then(|scaled| scaled.checked_add(frac_value))
        .ok_or_else(|| ParseError::Overflow(input.to_string()))
}
