//! # Result Formatting
//!
//! Renders raw conversion results for display and parses user-entered
//! numbers back in.
//!
//! - Magnitudes in `[min_fixed, max_fixed)` (and zero) use fixed notation,
//!   up to `max_decimals` places with trailing zeros trimmed.
//! - Everything else uses exponential notation with `mantissa_digits`
//!   decimals in the mantissa (`1.0e-7`, `2.35e12`). A nonzero value that
//!   would round to `0` in fixed notation also goes exponential.
//! - NaN and infinities are never rendered as literals.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::format::format_result;
//!
//! assert_eq!(format_result(2.5)?, "2.5");
//! assert_eq!(format_result(0.0000001)?, "1.0e-7");
//! # Ok::<(), calc_core::errors::CalcError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Marker shown in place of a result that cannot be computed
pub const UNDEFINED: &str = "undefined";

/// Display thresholds and precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Decimal places kept in fixed notation before trimming
    pub max_decimals: usize,

    /// Smallest magnitude rendered in fixed notation
    pub min_fixed: f64,

    /// Magnitudes at or above this switch to exponential notation
    pub max_fixed: f64,

    /// Decimals in the exponential mantissa
    pub mantissa_digits: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            max_decimals: 6,
            min_fixed: 1e-4,
            max_fixed: 1e9,
            mantissa_digits: 2,
        }
    }
}

impl FormatOptions {
    /// Validate option ranges.
    pub fn validate(&self) -> CalcResult<()> {
        if self.max_decimals > 15 {
            return Err(CalcError::invalid_input(
                "format.max_decimals",
                self.max_decimals.to_string(),
                "Must be at most 15",
            ));
        }
        if self.mantissa_digits > 15 {
            return Err(CalcError::invalid_input(
                "format.mantissa_digits",
                self.mantissa_digits.to_string(),
                "Must be at most 15",
            ));
        }
        if !(self.min_fixed.is_finite() && self.min_fixed > 0.0) {
            return Err(CalcError::invalid_input(
                "format.min_fixed",
                self.min_fixed.to_string(),
                "Must be a positive finite number",
            ));
        }
        if !(self.max_fixed.is_finite() && self.max_fixed > self.min_fixed) {
            return Err(CalcError::invalid_input(
                "format.max_fixed",
                self.max_fixed.to_string(),
                "Must be finite and greater than min_fixed",
            ));
        }
        Ok(())
    }

    fn is_fixed_range(&self, value: f64) -> bool {
        let magnitude = value.abs();
        magnitude == 0.0 || (magnitude >= self.min_fixed && magnitude < self.max_fixed)
    }
}

/// Format a result with default options.
pub fn format_result(value: f64) -> CalcResult<String> {
    format_result_with(value, &FormatOptions::default())
}

/// Format a result.
///
/// # Errors
///
/// `InvalidInput` when `value` is NaN or infinite.
pub fn format_result_with(value: f64, options: &FormatOptions) -> CalcResult<String> {
    if !value.is_finite() {
        return Err(CalcError::non_finite("result", value));
    }
    if options.is_fixed_range(value) {
        let text = fixed(value, options.max_decimals);
        // a nonzero value must never display as zero
        if text != "0" || value == 0.0 {
            return Ok(text);
        }
    }
    Ok(exponential(value, options.mantissa_digits))
}

/// Like [`format_result_with`] but renders non-finite values as [`UNDEFINED`].
pub fn format_or_undefined(value: f64, options: &FormatOptions) -> String {
    format_result_with(value, options).unwrap_or_else(|_| UNDEFINED.to_string())
}

/// Fixed notation with at most `decimals` places, trailing zeros trimmed.
/// Used by calculators with a fixed display precision (e.g. one decimal).
pub fn format_fixed(value: f64, decimals: usize) -> CalcResult<String> {
    if !value.is_finite() {
        return Err(CalcError::non_finite("result", value));
    }
    Ok(fixed(value, decimals))
}

fn fixed(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    let trimmed = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn exponential(value: f64, mantissa_digits: usize) -> String {
    let text = format!("{:.*e}", mantissa_digits, value);
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let mantissa = match mantissa.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            // keep "1.0e-7" rather than "1.e-7"
            format!("{}.{}", int, if frac.is_empty() { "0" } else { frac })
        }
        None => mantissa.to_string(),
    };
    format!("{}e{}", mantissa, exponent)
}

/// Parse a user-entered number.
///
/// Surrounding whitespace and `,` thousands separators are accepted.
///
/// # Example
///
/// ```rust
/// use calc_core::format::parse_number;
///
/// assert_eq!(parse_number(" 1,234.5 ")?, 1234.5);
/// assert!(parse_number("NaN").is_err());
/// # Ok::<(), calc_core::errors::CalcError>(())
/// ```
pub fn parse_number(input: &str) -> CalcResult<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CalcError::invalid_input("value", input, "A number is required"));
    }
    let cleaned = trimmed.replace(',', "");
    let value: f64 = cleaned
        .parse()
        .map_err(|_| CalcError::invalid_input("value", input, "Not a number"))?;
    if !value.is_finite() {
        return Err(CalcError::invalid_input("value", input, "Value must be a finite number"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_range_trims_zeros() {
        assert_eq!(format_result(2.5).unwrap(), "2.5");
        assert_eq!(format_result(100.0).unwrap(), "100");
        assert_eq!(format_result(0.621371192).unwrap(), "0.621371");
        assert_eq!(format_result(-40.0).unwrap(), "-40");
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(format_result(0.0001).unwrap(), "0.0001");
        assert_eq!(format_result(123456789.0).unwrap(), "123456789");
        assert_eq!(format_result(1e9).unwrap(), "1.0e9");
    }

    #[test]
    fn test_small_values_use_exponent() {
        assert_eq!(format_result(0.0000001).unwrap(), "1.0e-7");
        assert_eq!(format_result(-0.0000001).unwrap(), "-1.0e-7");
        assert_eq!(format_result(2.3456e-5).unwrap(), "2.35e-5");
    }

    #[test]
    fn test_large_values_use_exponent() {
        assert_eq!(format_result(1.5e12).unwrap(), "1.5e12");
    }

    #[test]
    fn test_zero() {
        assert_eq!(format_result(0.0).unwrap(), "0");
        assert_eq!(format_result(-0.0).unwrap(), "0");
        assert_eq!(format_result(-0.0000000001 * 0.0).unwrap(), "0");
    }

    #[test]
    fn test_non_finite() {
        assert!(format_result(f64::NAN).is_err());
        assert!(format_result(f64::NEG_INFINITY).is_err());
        let options = FormatOptions::default();
        assert_eq!(format_or_undefined(f64::INFINITY, &options), UNDEFINED);
        assert_eq!(format_or_undefined(1.25, &options), "1.25");
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(22.857142, 1).unwrap(), "22.9");
        assert_eq!(format_fixed(22.0, 1).unwrap(), "22");
        assert_eq!(format_fixed(1234.0, 0).unwrap(), "1234");
    }

    #[test]
    fn test_parse_roundtrip() {
        for &x in &[2.5, 0.0001, 0.12345678, 42.0, 123456789.0, 1e-7, 6.02e23, -17.75] {
            let text = format_result(x).unwrap();
            let back = parse_number(&text).unwrap();
            let tolerance = if x.abs() < 1e-4 || x.abs() >= 1e9 {
                x.abs() * 0.01
            } else {
                1e-6
            };
            assert!((back - x).abs() <= tolerance, "{} -> {} -> {}", x, text, back);
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42").unwrap(), 42.0);
        assert_eq!(parse_number("-0.5").unwrap(), -0.5);
        assert_eq!(parse_number("1e3").unwrap(), 1000.0);
        assert!(parse_number("").is_err());
        assert!(parse_number("abc").is_err());
        assert!(parse_number("inf").is_err());
    }

    #[test]
    fn test_custom_thresholds() {
        let options = FormatOptions {
            max_decimals: 2,
            min_fixed: 0.01,
            max_fixed: 1000.0,
            mantissa_digits: 3,
        };
        assert_eq!(format_result_with(3.14159, &options).unwrap(), "3.14");
        assert_eq!(format_result_with(1234.7, &options).unwrap(), "1.235e3");
        assert!(options.validate().is_ok());

        let bad = FormatOptions {
            min_fixed: 10.0,
            max_fixed: 1.0,
            ..FormatOptions::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_coarse_decimals_never_show_zero() {
        let options = FormatOptions {
            max_decimals: 3,
            ..FormatOptions::default()
        };
        assert!(options.validate().is_ok());
        assert_eq!(format_result_with(0.0004, &options).unwrap(), "4.0e-4");
        assert_eq!(format_result_with(-0.0004, &options).unwrap(), "-4.0e-4");
        assert_eq!(format_result_with(0.0012, &options).unwrap(), "0.001");
        assert_eq!(format_result_with(0.0, &options).unwrap(), "0");
    }
}
