//! Unit conversion engine.
//!
//! Linear categories go through the base unit:
//! `result = value * from.conversion_factor / to.conversion_factor`.
//! Affine categories use the per-pair formula table, so temperature never
//! passes through a single multiplier.

use std::fmt;

use serde::Serialize;

use super::{catalog, CategoryId, ConversionStrategy, Unit, UnitCategoryDefinition};
use crate::errors::{CalcError, CalcResult};
use crate::format::format_result;

/// Inputs for the "quick values" table on a conversion page
pub const DEFAULT_QUICK_VALUES: [f64; 8] = [1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 500.0, 1000.0];

/// Convert `value` from one unit to another within `category`.
///
/// # Errors
///
/// - `InvalidInput` if `value` is not finite, or the result overflows
/// - `UnitMismatch` if either unit is not part of `category`, or an affine
///   pair has no formula
///
/// # Example
///
/// ```rust
/// use calc_core::units::{convert, get_category, CategoryId};
///
/// let temperature = get_category(CategoryId::Temperature)?;
/// let c = temperature.unit("celsius")?;
/// let f = temperature.unit("fahrenheit")?;
/// assert_eq!(convert(100.0, c, f, temperature)?, 212.0);
/// # Ok::<(), calc_core::errors::CalcError>(())
/// ```
pub fn convert(value: f64, from: &Unit, to: &Unit, category: &UnitCategoryDefinition) -> CalcResult<f64> {
    if !value.is_finite() {
        return Err(CalcError::non_finite("value", value));
    }
    ensure_member(category, from)?;
    ensure_member(category, to)?;

    if from.id == to.id {
        return Ok(value);
    }

    let result = match &category.strategy {
        ConversionStrategy::Linear => {
            let value_in_base = value * from.conversion_factor;
            value_in_base / to.conversion_factor
        }
        ConversionStrategy::Affine { .. } => category
            .affine_formula(from.id, to.id)
            .ok_or_else(|| missing_formula(category, from, to))?
            .apply(value),
    };

    if !result.is_finite() {
        return Err(CalcError::invalid_input(
            "value",
            value.to_string(),
            format!("Converting {} to {} overflows", from.id, to.id),
        ));
    }
    Ok(result)
}

/// Convert using ids from the built-in catalog. Unknown unit ids are
/// reported as `UnitMismatch`.
///
/// # Example
///
/// ```rust
/// use calc_core::units::{convert_by_id, CategoryId};
///
/// let miles = convert_by_id(1.0, CategoryId::Length, "kilometer", "mile")?;
/// assert!((miles - 0.621371).abs() < 1e-6);
/// # Ok::<(), calc_core::errors::CalcError>(())
/// ```
pub fn convert_by_id(value: f64, category: CategoryId, from_id: &str, to_id: &str) -> CalcResult<f64> {
    let definition = catalog()?.get_category(category)?;
    let from = definition.member(from_id)?;
    let to = definition.member(to_id)?;
    convert(value, from, to, definition)
}

fn ensure_member(category: &UnitCategoryDefinition, unit: &Unit) -> CalcResult<()> {
    if category.contains(unit) {
        Ok(())
    } else {
        Err(CalcError::unit_mismatch(
            category.id.slug(),
            unit.id,
            "Unit does not belong to this category",
        ))
    }
}

fn missing_formula(category: &UnitCategoryDefinition, from: &Unit, to: &Unit) -> CalcError {
    CalcError::unit_mismatch(
        category.id.slug(),
        format!("{} -> {}", from.id, to.id),
        "No formula for this unit pair",
    )
}

// ============================================================================
// Displayed Formula
// ============================================================================

/// The "how to convert manually" formula shown next to a result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConversionFormula {
    /// `result = value * multiplier`
    Linear { multiplier: f64 },
    /// `result = (value + pre_offset) * scale + post_offset`
    Affine {
        pre_offset: f64,
        scale: f64,
        post_offset: f64,
    },
}

impl ConversionFormula {
    /// The single multiplier, if the conversion has one. Affine
    /// conversions never do.
    pub fn multiplier(&self) -> Option<f64> {
        match self {
            ConversionFormula::Linear { multiplier } => Some(*multiplier),
            ConversionFormula::Affine { .. } => None,
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            ConversionFormula::Linear { multiplier } => value * multiplier,
            ConversionFormula::Affine {
                pre_offset,
                scale,
                post_offset,
            } => (value + pre_offset) * scale + post_offset,
        }
    }
}

fn signed_term(value: f64) -> String {
    let text = format_result(value.abs()).unwrap_or_else(|_| value.abs().to_string());
    if value < 0.0 {
        format!(" - {}", text)
    } else {
        format!(" + {}", text)
    }
}

impl fmt::Display for ConversionFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ConversionFormula::Linear { multiplier } => {
                let text = format_result(multiplier).unwrap_or_else(|_| multiplier.to_string());
                write!(f, "x × {}", text)
            }
            ConversionFormula::Affine {
                pre_offset,
                scale,
                post_offset,
            } => {
                let mut text = if pre_offset == 0.0 {
                    "x".to_string()
                } else if scale == 1.0 {
                    format!("x{}", signed_term(pre_offset))
                } else {
                    format!("(x{})", signed_term(pre_offset))
                };
                if scale != 1.0 {
                    let scale = format_result(scale).unwrap_or_else(|_| scale.to_string());
                    text = format!("{} × {}", text, scale);
                }
                if post_offset != 0.0 {
                    text.push_str(&signed_term(post_offset));
                }
                f.write_str(&text)
            }
        }
    }
}

/// Formula for converting between two units of `category`.
///
/// Linear categories yield `to.conversion_factor`-relative multipliers;
/// affine categories yield their per-pair formula.
pub fn conversion_formula(from: &Unit, to: &Unit, category: &UnitCategoryDefinition) -> CalcResult<ConversionFormula> {
    ensure_member(category, from)?;
    ensure_member(category, to)?;

    match &category.strategy {
        ConversionStrategy::Linear => Ok(ConversionFormula::Linear {
            multiplier: from.conversion_factor / to.conversion_factor,
        }),
        ConversionStrategy::Affine { .. } if from.id == to.id => Ok(ConversionFormula::Affine {
            pre_offset: 0.0,
            scale: 1.0,
            post_offset: 0.0,
        }),
        ConversionStrategy::Affine { .. } => {
            let formula = category
                .affine_formula(from.id, to.id)
                .ok_or_else(|| missing_formula(category, from, to))?;
            Ok(ConversionFormula::Affine {
                pre_offset: formula.pre_offset,
                scale: formula.scale,
                post_offset: formula.post_offset,
            })
        }
    }
}

// ============================================================================
// Quick Values and Related Conversions
// ============================================================================

/// One row of a quick-values table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuickValue {
    pub input: f64,
    pub output: f64,
}

/// Convert each of `inputs`, stopping at the first failure.
pub fn quick_values(
    from: &Unit,
    to: &Unit,
    category: &UnitCategoryDefinition,
    inputs: &[f64],
) -> CalcResult<Vec<QuickValue>> {
    inputs
        .iter()
        .map(|&input| {
            Ok(QuickValue {
                input,
                output: convert(input, from, to, category)?,
            })
        })
        .collect()
}

/// Suggestions shown under a conversion: the reverse pair first, then the
/// category's other popular pairs. Unknown ids yield only popular pairs.
pub fn related_conversions<'a>(
    category: &'a UnitCategoryDefinition,
    from_id: &str,
    to_id: &str,
    limit: usize,
) -> Vec<(&'a Unit, &'a Unit)> {
    let mut related: Vec<(&Unit, &Unit)> = Vec::new();

    if from_id != to_id {
        if let (Ok(from), Ok(to)) = (category.unit(from_id), category.unit(to_id)) {
            related.push((to, from));
        }
    }

    for (from, to) in category.popular() {
        let is_current = from.id == from_id && to.id == to_id;
        let seen = related.iter().any(|(f, t)| f.id == from.id && t.id == to.id);
        if !is_current && !seen {
            related.push((from, to));
        }
    }

    related.truncate(limit);
    related
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::get_category;

    fn units(category: CategoryId, from: &str, to: &str) -> (&'static UnitCategoryDefinition, &'static Unit, &'static Unit) {
        let definition = get_category(category).unwrap();
        (definition, definition.unit(from).unwrap(), definition.unit(to).unwrap())
    }

    #[test]
    fn test_kilometer_to_mile() {
        let (length, km, mile) = units(CategoryId::Length, "kilometer", "mile");
        let result = convert(1.0, km, mile, length).unwrap();
        assert!((result - 0.621371).abs() < 1e-6);
    }

    #[test]
    fn test_temperature_formulas() {
        let temperature = get_category(CategoryId::Temperature).unwrap();
        let c = temperature.unit("celsius").unwrap();
        let f = temperature.unit("fahrenheit").unwrap();
        let k = temperature.unit("kelvin").unwrap();

        assert_eq!(convert(0.0, c, f, temperature).unwrap(), 32.0);
        assert_eq!(convert(100.0, c, f, temperature).unwrap(), 212.0);
        assert!((convert(212.0, f, c, temperature).unwrap() - 100.0).abs() < 1e-9);
        assert!((convert(0.0, c, k, temperature).unwrap() - 273.15).abs() < 1e-9);
        assert!((convert(273.15, k, c, temperature).unwrap()).abs() < 1e-9);
        assert!((convert(32.0, f, k, temperature).unwrap() - 273.15).abs() < 1e-9);
        assert!((convert(0.0, k, f, temperature).unwrap() + 459.67).abs() < 1e-9);
        assert_eq!(convert(-40.0, c, f, temperature).unwrap(), -40.0);
        assert_eq!(convert(37.5, k, k, temperature).unwrap(), 37.5);
    }

    #[test]
    fn test_identity() {
        let (weight, kg, _) = units(CategoryId::Weight, "kilogram", "pound");
        assert_eq!(convert(12.34, kg, kg, weight).unwrap(), 12.34);
    }

    #[test]
    fn test_unit_from_other_category_rejected() {
        let length = get_category(CategoryId::Length).unwrap();
        let (_, kg, _) = units(CategoryId::Weight, "kilogram", "pound");
        let meter = length.unit("meter").unwrap();
        assert!(matches!(
            convert(1.0, kg, meter, length),
            Err(CalcError::UnitMismatch { .. })
        ));
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let (length, km, mile) = units(CategoryId::Length, "kilometer", "mile");
        assert!(matches!(
            convert(f64::NAN, km, mile, length),
            Err(CalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_overflow_reclassified() {
        let (energy, kwh, ev) = units(CategoryId::Energy, "kilowatt-hour", "electronvolt");
        assert!(matches!(
            convert(1e300, kwh, ev, energy),
            Err(CalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_convert_by_id() {
        let pounds = convert_by_id(1.0, CategoryId::Weight, "kilogram", "pound").unwrap();
        assert!((pounds - 2.20462262).abs() < 1e-8);

        assert!(matches!(
            convert_by_id(1.0, CategoryId::Weight, "kilogram", "mile"),
            Err(CalcError::UnitMismatch { .. })
        ));
    }

    #[test]
    fn test_linear_formula() {
        let (length, km, mile) = units(CategoryId::Length, "kilometer", "mile");
        let formula = conversion_formula(km, mile, length).unwrap();
        let multiplier = formula.multiplier().unwrap();
        assert!((multiplier - 0.621371).abs() < 1e-6);
        assert_eq!(formula.to_string(), "x × 0.621371");
    }

    #[test]
    fn test_temperature_formula_has_no_multiplier() {
        let (temperature, c, f) = units(CategoryId::Temperature, "celsius", "fahrenheit");
        let formula = conversion_formula(c, f, temperature).unwrap();
        assert_eq!(formula.multiplier(), None);
        assert_eq!(formula.to_string(), "x × 1.8 + 32");
        assert_eq!(formula.apply(100.0), 212.0);

        let back = conversion_formula(f, c, temperature).unwrap();
        assert_eq!(back.to_string(), "(x - 32) × 0.555556");

        let (_, k, _) = units(CategoryId::Temperature, "kelvin", "celsius");
        let to_celsius = conversion_formula(k, c, temperature).unwrap();
        assert_eq!(to_celsius.to_string(), "x - 273.15");
    }

    #[test]
    fn test_quick_values() {
        let (temperature, c, f) = units(CategoryId::Temperature, "celsius", "fahrenheit");
        let rows = quick_values(c, f, temperature, &[0.0, 100.0]).unwrap();
        assert_eq!(rows, vec![
            QuickValue { input: 0.0, output: 32.0 },
            QuickValue { input: 100.0, output: 212.0 },
        ]);

        let (length, km, mile) = units(CategoryId::Length, "kilometer", "mile");
        let rows = quick_values(km, mile, length, &DEFAULT_QUICK_VALUES).unwrap();
        assert_eq!(rows.len(), DEFAULT_QUICK_VALUES.len());
    }

    #[test]
    fn test_related_conversions() {
        let length = get_category(CategoryId::Length).unwrap();
        let related = related_conversions(length, "kilometer", "mile", 3);
        assert_eq!(related.len(), 3);
        assert_eq!((related[0].0.id, related[0].1.id), ("mile", "kilometer"));
        assert!(related.iter().all(|(f, t)| !(f.id == "kilometer" && t.id == "mile")));

        let unknown = related_conversions(length, "furlong", "mile", 10);
        assert_eq!(unknown.len(), length.popular_conversions.len());
    }
}
