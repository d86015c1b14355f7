//! # Decimal to Fraction Conversion
//!
//! Turns a decimal number into a numerator/denominator pair in lowest terms,
//! with an optional mixed-number form for improper results.
//!
//! ## Algorithm
//!
//! 1. Integers map straight to `n/1`.
//! 2. Otherwise the shortest round-trip text of the value is split at the
//!    decimal point: `d` fractional digits give a denominator of `10^d`.
//! 3. Values with more than [`FractionOptions::max_exact_digits`] fractional
//!    digits (repeating or high-precision decimals) are rounded to
//!    `1 / approximation_scale` instead. This is a precision cap: the result
//!    carries `approximated = true` so callers can say so.
//! 4. Both terms are divided by their GCD (Euclid, `gcd(x, 0) = x`).
//! 5. Positive improper results also get a mixed-number decomposition.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::fraction::to_fraction;
//!
//! let result = to_fraction(2.5)?;
//! assert_eq!(result.fraction.to_string(), "5/2");
//! assert_eq!(result.mixed.unwrap().to_string(), "2 1/2");
//! # Ok::<(), calc_core::errors::CalcError>(())
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::format::parse_number;

/// Largest magnitude (2^53) at which every integer is exactly representable
/// in an f64. Numerators beyond this would silently lose digits.
pub const MAX_EXACT_NUMERATOR: f64 = 9_007_199_254_740_992.0;

/// Upper bound on the number of values `decimal_range` will produce
const MAX_RANGE_LEN: usize = 1_000_000;

/// Tunables for decimal-to-fraction conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractionOptions {
    /// Fractional digits above which the exact expansion is abandoned
    pub max_exact_digits: usize,

    /// Denominator used for the rounded fallback (e.g. 1_000_000)
    pub approximation_scale: i64,
}

impl Default for FractionOptions {
    fn default() -> Self {
        FractionOptions {
            max_exact_digits: 10,
            approximation_scale: 1_000_000,
        }
    }
}

impl FractionOptions {
    /// Validate option ranges.
    pub fn validate(&self) -> CalcResult<()> {
        // 10^15 is the largest power of ten that keeps numerators under 2^53
        if self.max_exact_digits == 0 || self.max_exact_digits > 15 {
            return Err(CalcError::invalid_input(
                "fraction.max_exact_digits",
                self.max_exact_digits.to_string(),
                "Must be between 1 and 15",
            ));
        }
        if self.approximation_scale < 2 || self.approximation_scale as f64 > MAX_EXACT_NUMERATOR {
            return Err(CalcError::invalid_input(
                "fraction.approximation_scale",
                self.approximation_scale.to_string(),
                "Must be at least 2 and at most 2^53",
            ));
        }
        Ok(())
    }
}

/// A numerator/denominator pair with a positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: i64,
    pub denominator: i64,
}

impl Fraction {
    /// Create a fraction, moving any sign onto the numerator.
    ///
    /// # Example
    ///
    /// ```rust
    /// use calc_core::fraction::Fraction;
    ///
    /// let f = Fraction::new(3, -4)?;
    /// assert_eq!((f.numerator, f.denominator), (-3, 4));
    /// # Ok::<(), calc_core::errors::CalcError>(())
    /// ```
    pub fn new(numerator: i64, denominator: i64) -> CalcResult<Self> {
        if denominator == 0 {
            return Err(CalcError::invalid_input("denominator", "0", "Denominator cannot be zero"));
        }
        if denominator > 0 {
            return Ok(Fraction { numerator, denominator });
        }
        match (numerator.checked_neg(), denominator.checked_neg()) {
            (Some(numerator), Some(denominator)) => Ok(Fraction { numerator, denominator }),
            _ => Err(CalcError::invalid_input(
                "fraction",
                format!("{}/{}", numerator, denominator),
                "Fraction terms are out of range",
            )),
        }
    }

    /// Greatest common divisor of the two terms
    pub fn gcd(&self) -> i64 {
        gcd(self.numerator.unsigned_abs(), self.denominator.unsigned_abs()) as i64
    }

    /// Reduce to lowest terms. Idempotent.
    pub fn simplified(&self) -> Fraction {
        let divisor = self.gcd();
        if divisor <= 1 {
            return *self;
        }
        Fraction {
            numerator: self.numerator / divisor,
            denominator: self.denominator / divisor,
        }
    }

    pub fn is_simplified(&self) -> bool {
        self.gcd() == 1
    }

    /// Numerator strictly greater than the denominator
    pub fn is_improper(&self) -> bool {
        self.numerator > self.denominator
    }

    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Whole part plus proper remainder; `None` unless the fraction is improper.
    pub fn to_mixed(&self) -> Option<MixedNumber> {
        if !self.is_improper() {
            return None;
        }
        let whole = self.numerator.div_euclid(self.denominator);
        Some(MixedNumber {
            whole,
            numerator: self.numerator - whole * self.denominator,
            denominator: self.denominator,
        })
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

/// `whole + numerator/denominator`, with `0 <= numerator < denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixedNumber {
    pub whole: i64,
    pub numerator: i64,
    pub denominator: i64,
}

impl MixedNumber {
    /// Back to an improper fraction
    pub fn to_fraction(&self) -> Fraction {
        Fraction {
            numerator: self.whole * self.denominator + self.numerator,
            denominator: self.denominator,
        }
    }
}

impl fmt::Display for MixedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.numerator == 0 {
            write!(f, "{}", self.whole)
        } else {
            write!(f, "{} {}/{}", self.whole, self.numerator, self.denominator)
        }
    }
}

/// Full result of a decimal-to-fraction conversion, including the
/// intermediate form so a UI can show the working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractionConversion {
    /// The input value
    pub decimal: f64,

    /// `digits / 10^d` before reduction
    pub unsimplified: Fraction,

    /// GCD used for the reduction
    pub gcd: i64,

    /// Lowest-terms result
    pub fraction: Fraction,

    /// Present only for positive improper fractions
    pub mixed: Option<MixedNumber>,

    /// True when the precision cap rounded the input
    pub approximated: bool,
}

impl FractionConversion {
    /// Human-readable working, one line per step.
    pub fn steps(&self) -> Vec<String> {
        let mut steps = vec![format!(
            "{} {} {}",
            self.decimal,
            if self.approximated { "≈" } else { "=" },
            self.unsimplified
        )];
        if self.approximated {
            steps.push(format!(
                "Rounded to the nearest 1/{}",
                self.unsimplified.denominator
            ));
        }
        if self.gcd > 1 {
            steps.push(format!(
                "GCD({}, {}) = {}",
                self.unsimplified.numerator.unsigned_abs(),
                self.unsimplified.denominator,
                self.gcd
            ));
            steps.push(format!(
                "{} ÷ {} / {} ÷ {} = {}",
                self.unsimplified.numerator,
                self.gcd,
                self.unsimplified.denominator,
                self.gcd,
                self.fraction
            ));
        }
        if let Some(mixed) = &self.mixed {
            steps.push(format!("{} = {}", self.fraction, mixed));
        }
        steps
    }
}

/// Euclidean GCD on magnitudes. `gcd(x, 0) = x`.
pub fn gcd(a: u64, b: u64) -> u64 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Convert a decimal to a fraction using default options.
pub fn to_fraction(decimal: f64) -> CalcResult<FractionConversion> {
    to_fraction_with(decimal, &FractionOptions::default())
}

/// Convert a decimal to a fraction.
///
/// # Errors
///
/// `InvalidInput` for NaN/infinite input, or for magnitudes whose numerator
/// would exceed [`MAX_EXACT_NUMERATOR`].
pub fn to_fraction_with(decimal: f64, options: &FractionOptions) -> CalcResult<FractionConversion> {
    if !decimal.is_finite() {
        return Err(CalcError::non_finite("decimal", decimal));
    }

    if decimal.fract() == 0.0 {
        if decimal.abs() > MAX_EXACT_NUMERATOR {
            return Err(out_of_range(decimal));
        }
        let fraction = Fraction {
            numerator: decimal as i64,
            denominator: 1,
        };
        return Ok(FractionConversion {
            decimal,
            unsimplified: fraction,
            gcd: 1,
            fraction,
            mixed: None,
            approximated: false,
        });
    }

    let (unsimplified, approximated) = match expand_digits(decimal, options.max_exact_digits) {
        Some(exact) => (exact, false),
        None => (approximate(decimal, options.approximation_scale)?, true),
    };

    let fraction = unsimplified.simplified();
    Ok(FractionConversion {
        decimal,
        unsimplified,
        gcd: unsimplified.gcd(),
        fraction,
        mixed: fraction.to_mixed(),
        approximated,
    })
}

/// Exact `digits / 10^d` expansion, or `None` when the text is too long
/// or the terms would not stay exact.
fn expand_digits(decimal: f64, max_digits: usize) -> Option<Fraction> {
    // f64's Display never switches to exponent notation
    let text = decimal.abs().to_string();
    let (int_part, frac_part) = text.split_once('.')?;
    if frac_part.len() > max_digits {
        return None;
    }

    let denominator = 10_i64.checked_pow(frac_part.len() as u32)?;
    let whole: i64 = int_part.parse().ok()?;
    let digits: i64 = frac_part.parse().ok()?;
    let magnitude = whole.checked_mul(denominator)?.checked_add(digits)?;
    if magnitude as f64 > MAX_EXACT_NUMERATOR {
        return None;
    }

    let numerator = if decimal < 0.0 { -magnitude } else { magnitude };
    Some(Fraction { numerator, denominator })
}

fn approximate(decimal: f64, scale: i64) -> CalcResult<Fraction> {
    let scaled = (decimal * scale as f64).round();
    if !scaled.is_finite() || scaled.abs() > MAX_EXACT_NUMERATOR {
        return Err(out_of_range(decimal));
    }
    Fraction::new(scaled as i64, scale)
}

fn out_of_range(decimal: f64) -> CalcError {
    CalcError::invalid_input(
        "decimal",
        decimal.to_string(),
        "Value is too large to express as an exact fraction",
    )
}

/// Parse `"3/4"`, `"1 1/2"`, `"-2 3/8"` or a plain decimal into a fraction
/// in lowest terms.
///
/// # Example
///
/// ```rust
/// use calc_core::fraction::parse_fraction;
///
/// let f = parse_fraction("1 1/2")?;
/// assert_eq!((f.numerator, f.denominator), (3, 2));
/// assert_eq!(f.to_f64(), 1.5);
/// # Ok::<(), calc_core::errors::CalcError>(())
/// ```
pub fn parse_fraction(input: &str) -> CalcResult<Fraction> {
    let trimmed = input.trim();
    if !trimmed.contains('/') {
        let value = parse_number(trimmed)?;
        return Ok(to_fraction(value)?.fraction);
    }

    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    let (whole, ratio) = match parts.as_slice() {
        [ratio] => (None, *ratio),
        [whole, ratio] => (Some(*whole), *ratio),
        _ => return Err(invalid_fraction(input)),
    };

    let (num_text, den_text) = ratio.split_once('/').ok_or_else(|| invalid_fraction(input))?;
    let numerator: i64 = num_text.trim().parse().map_err(|_| invalid_fraction(input))?;
    let denominator: i64 = den_text.trim().parse().map_err(|_| invalid_fraction(input))?;
    let fraction = Fraction::new(numerator, denominator)?;

    let Some(whole_text) = whole else {
        return Ok(fraction.simplified());
    };

    if fraction.numerator < 0 {
        return Err(CalcError::invalid_input(
            "fraction",
            input,
            "Only the whole part of a mixed number may carry a sign",
        ));
    }
    let whole: i64 = whole_text.parse().map_err(|_| invalid_fraction(input))?;
    let negative = whole_text.starts_with('-');
    let magnitude = whole
        .unsigned_abs()
        .checked_mul(fraction.denominator as u64)
        .and_then(|v| v.checked_add(fraction.numerator as u64))
        .filter(|v| (*v as f64) <= MAX_EXACT_NUMERATOR)
        .ok_or_else(|| invalid_fraction(input))? as i64;

    let numerator = if negative { -magnitude } else { magnitude };
    Ok(Fraction {
        numerator,
        denominator: fraction.denominator,
    }
    .simplified())
}

fn invalid_fraction(input: &str) -> CalcError {
    CalcError::invalid_input("fraction", input, "Expected a fraction like 3/4 or 1 1/2")
}

/// Inclusive sweep `start, start + step, ..., end` without accumulated
/// floating drift. Used by route generators to pre-render result pages.
///
/// # Example
///
/// ```rust
/// use calc_core::fraction::decimal_range;
///
/// let values = decimal_range(0.01, 0.05, 0.01)?;
/// assert_eq!(values, vec![0.01, 0.02, 0.03, 0.04, 0.05]);
/// # Ok::<(), calc_core::errors::CalcError>(())
/// ```
pub fn decimal_range(start: f64, end: f64, step: f64) -> CalcResult<Vec<f64>> {
    for (field, value) in [("start", start), ("end", end), ("step", step)] {
        if !value.is_finite() {
            return Err(CalcError::non_finite(field, value));
        }
    }
    if step <= 0.0 {
        return Err(CalcError::invalid_input("step", step.to_string(), "Step must be positive"));
    }
    if end < start {
        return Err(CalcError::invalid_input(
            "end",
            end.to_string(),
            "End must not be less than start",
        ));
    }

    let span = ((end - start) / step + 1e-9).floor();
    if span >= MAX_RANGE_LEN as f64 {
        return Err(CalcError::invalid_input(
            "step",
            step.to_string(),
            format!("Range would produce more than {} values", MAX_RANGE_LEN),
        ));
    }

    Ok((0..=span as usize)
        .map(|i| ((start + i as f64 * step) * 1e10).round() / 1e10)
        .collect())
}
