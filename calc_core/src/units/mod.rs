//! # Unit Types
//!
//! Categories of mutually-convertible units, the units themselves, and the
//! conversion strategy each category uses.
//!
//! ## Base Units
//!
//! Every category has one implicit base unit. A unit's `conversion_factor`
//! maps one of that unit onto the base:
//!
//! - Length: meter
//! - Weight: kilogram
//! - Temperature: degree Celsius (affine, see below)
//! - Volume: liter
//! - Area: square meter
//! - Speed: meter per second
//! - Time: second
//! - Digital: byte
//! - Pressure: pascal
//! - Energy: joule
//!
//! ## Linear vs Affine
//!
//! Linear categories convert with a single ratio of factors. Affine
//! categories (temperature) differ by both scale and offset, so each ordered
//! unit pair carries its own closed-form [`AffineFormula`].
//!
//! ## Example
//!
//! ```rust
//! use calc_core::units::{catalog, convert, CategoryId};
//!
//! let length = catalog()?.get_category(CategoryId::Length)?;
//! let km = length.unit("kilometer")?;
//! let mile = length.unit("mile")?;
//! let miles = convert(1.0, km, mile, length)?;
//! assert!((miles - 0.621371).abs() < 1e-6);
//! # Ok::<(), calc_core::errors::CalcError>(())
//! ```

pub mod catalog;
pub mod convert;

pub use catalog::{catalog, get_category, get_unit, Catalog, ConversionPath};
pub use convert::{
    conversion_formula, convert, convert_by_id, quick_values, related_conversions,
    ConversionFormula, QuickValue, DEFAULT_QUICK_VALUES,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

// ============================================================================
// Category Identifiers
// ============================================================================

/// The closed set of unit categories. Slugs are part of public URLs and
/// must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryId {
    Length,
    Weight,
    Temperature,
    Volume,
    Area,
    Speed,
    Time,
    Digital,
    Pressure,
    Energy,
}

impl CategoryId {
    /// All categories in catalog order
    pub const ALL: [CategoryId; 10] = [
        CategoryId::Length,
        CategoryId::Weight,
        CategoryId::Temperature,
        CategoryId::Volume,
        CategoryId::Area,
        CategoryId::Speed,
        CategoryId::Time,
        CategoryId::Digital,
        CategoryId::Pressure,
        CategoryId::Energy,
    ];

    /// URL slug
    pub fn slug(&self) -> &'static str {
        match self {
            CategoryId::Length => "length",
            CategoryId::Weight => "weight",
            CategoryId::Temperature => "temperature",
            CategoryId::Volume => "volume",
            CategoryId::Area => "area",
            CategoryId::Speed => "speed",
            CategoryId::Time => "time",
            CategoryId::Digital => "digital",
            CategoryId::Pressure => "pressure",
            CategoryId::Energy => "energy",
        }
    }

    /// Display name for headings
    pub fn display_name(&self) -> &'static str {
        match self {
            CategoryId::Length => "Length",
            CategoryId::Weight => "Weight",
            CategoryId::Temperature => "Temperature",
            CategoryId::Volume => "Volume",
            CategoryId::Area => "Area",
            CategoryId::Speed => "Speed",
            CategoryId::Time => "Time",
            CategoryId::Digital => "Digital Storage",
            CategoryId::Pressure => "Pressure",
            CategoryId::Energy => "Energy",
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for CategoryId {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        CategoryId::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(needle))
            .ok_or_else(|| CalcError::not_found("Category", s))
    }
}

// ============================================================================
// Units
// ============================================================================

/// One measurement unit within a category.
///
/// For linear units `value_in_base = value * conversion_factor`. Affine
/// units also carry an `offset`: `value_in_base = (value + offset) * conversion_factor`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    /// Stable slug, unique within its category
    pub id: &'static str,

    /// Display name
    pub name: &'static str,

    /// Short display symbol
    pub symbol: &'static str,

    /// Multiplier onto the category's base unit (positive, nonzero)
    pub conversion_factor: f64,

    /// Additive shift for affine families; absent for linear units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
}

impl Unit {
    /// A purely multiplicative unit
    pub const fn linear(id: &'static str, name: &'static str, symbol: &'static str, conversion_factor: f64) -> Self {
        Unit {
            id,
            name,
            symbol,
            conversion_factor,
            offset: None,
        }
    }

    /// A unit related to the base by scale and offset
    pub const fn affine(
        id: &'static str,
        name: &'static str,
        symbol: &'static str,
        conversion_factor: f64,
        offset: f64,
    ) -> Self {
        Unit {
            id,
            name,
            symbol,
            conversion_factor,
            offset: Some(offset),
        }
    }

    /// Value expressed in the base unit
    pub fn to_base(&self, value: f64) -> f64 {
        (value + self.offset.unwrap_or(0.0)) * self.conversion_factor
    }

    /// Base-unit value expressed in this unit
    pub fn from_base(&self, value: f64) -> f64 {
        value / self.conversion_factor - self.offset.unwrap_or(0.0)
    }
}

// ============================================================================
// Conversion Strategy
// ============================================================================

/// Closed-form conversion for one ordered pair of affine units:
/// `(value + pre_offset) * scale + post_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AffineFormula {
    pub from: &'static str,
    pub to: &'static str,
    pub pre_offset: f64,
    pub scale: f64,
    pub post_offset: f64,
}

impl AffineFormula {
    pub fn apply(&self, value: f64) -> f64 {
        (value + self.pre_offset) * self.scale + self.post_offset
    }
}

/// How values move between units of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConversionStrategy {
    /// Single multiplicative ratio of conversion factors
    Linear,
    /// Per-pair formula table
    Affine { formulas: &'static [AffineFormula] },
}

// ============================================================================
// Categories
// ============================================================================

/// A named grouping of mutually-convertible units. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitCategoryDefinition {
    pub id: CategoryId,

    /// Units in display order
    pub units: &'static [Unit],

    /// Curated (from, to) unit id pairs
    pub popular_conversions: &'static [(&'static str, &'static str)],

    pub strategy: ConversionStrategy,
}

impl UnitCategoryDefinition {
    /// Look up a unit by id.
    ///
    /// # Errors
    ///
    /// `NotFound` when no unit in this category has the id.
    pub fn unit(&self, unit_id: &str) -> CalcResult<&Unit> {
        self.units
            .iter()
            .find(|u| u.id == unit_id)
            .ok_or_else(|| CalcError::not_found("Unit", format!("{}/{}", self.id, unit_id)))
    }

    /// Look up a unit named as a conversion endpoint.
    ///
    /// # Errors
    ///
    /// `UnitMismatch` when the id is not a unit of this category, which is
    /// how conversions report unknown or foreign units.
    pub fn member(&self, unit_id: &str) -> CalcResult<&Unit> {
        self.unit(unit_id).map_err(|_| {
            CalcError::unit_mismatch(self.id.slug(), unit_id, "Unit does not exist in this category")
        })
    }

    /// Whether this exact unit belongs to the category
    pub fn contains(&self, unit: &Unit) -> bool {
        self.units.iter().any(|u| u == unit)
    }

    pub fn is_affine(&self) -> bool {
        matches!(self.strategy, ConversionStrategy::Affine { .. })
    }

    /// Popular pairs resolved to units
    pub fn popular(&self) -> Vec<(&Unit, &Unit)> {
        self.popular_conversions
            .iter()
            .filter_map(|(from, to)| Some((self.unit(from).ok()?, self.unit(to).ok()?)))
            .collect()
    }

    /// Formula for an ordered affine pair; `None` for linear categories
    /// or unknown pairs.
    pub fn affine_formula(&self, from_id: &str, to_id: &str) -> Option<&AffineFormula> {
        match &self.strategy {
            ConversionStrategy::Linear => None,
            ConversionStrategy::Affine { formulas } => {
                formulas.iter().find(|f| f.from == from_id && f.to == to_id)
            }
        }
    }

    /// Check the load-time invariants: at least two units, unique ids,
    /// positive factors, popular pairs that resolve, and for affine
    /// categories a formula for every ordered pair that agrees with the
    /// units' own factor/offset.
    pub fn validate(&self) -> CalcResult<()> {
        let category = self.id.slug();
        if self.units.len() < 2 {
            return Err(CalcError::invalid_catalog(category, "Category needs at least 2 units"));
        }

        for (i, unit) in self.units.iter().enumerate() {
            if self.units[..i].iter().any(|u| u.id == unit.id) {
                return Err(CalcError::invalid_catalog(
                    category,
                    format!("Duplicate unit id '{}'", unit.id),
                ));
            }
            if !(unit.conversion_factor.is_finite() && unit.conversion_factor > 0.0) {
                return Err(CalcError::invalid_catalog(
                    category,
                    format!("Unit '{}' must have a positive conversion factor", unit.id),
                ));
            }
            match (unit.offset, self.is_affine()) {
                (Some(offset), true) if offset.is_finite() => {}
                (None, false) => {}
                _ => {
                    return Err(CalcError::invalid_catalog(
                        category,
                        format!("Unit '{}' has an offset inconsistent with the category strategy", unit.id),
                    ))
                }
            }
        }

        for (from, to) in self.popular_conversions {
            if self.unit(from).is_err() || self.unit(to).is_err() {
                return Err(CalcError::invalid_catalog(
                    category,
                    format!("Popular conversion {} -> {} references an unknown unit", from, to),
                ));
            }
        }

        if let ConversionStrategy::Affine { formulas } = &self.strategy {
            self.validate_formulas(formulas)?;
        }

        log::trace!("catalog category '{}' validated ({} units)", category, self.units.len());
        Ok(())
    }

    fn validate_formulas(&self, formulas: &[AffineFormula]) -> CalcResult<()> {
        let category = self.id.slug();
        for formula in formulas {
            if self.unit(formula.from).is_err() || self.unit(formula.to).is_err() {
                return Err(CalcError::invalid_catalog(
                    category,
                    format!("Formula {} -> {} references an unknown unit", formula.from, formula.to),
                ));
            }
        }

        for from in self.units {
            for to in self.units.iter().filter(|u| u.id != from.id) {
                let matching = formulas.iter().filter(|f| f.from == from.id && f.to == to.id).count();
                if matching != 1 {
                    return Err(CalcError::invalid_catalog(
                        category,
                        format!("Expected exactly one formula for {} -> {}, found {}", from.id, to.id, matching),
                    ));
                }
                let Some(formula) = self.affine_formula(from.id, to.id) else {
                    continue;
                };
                // The per-pair table must agree with the units' own scale/offset
                for probe in [0.0, 100.0] {
                    let via_base = to.from_base(from.to_base(probe));
                    let direct = formula.apply(probe);
                    if (via_base - direct).abs() > 1e-9 * via_base.abs().max(1.0) {
                        return Err(CalcError::invalid_catalog(
                            category,
                            format!("Formula {} -> {} disagrees with unit offsets", from.id, to.id),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static PAIR_UNITS: [Unit; 2] = [
        Unit::linear("meter", "Meter", "m", 1.0),
        Unit::linear("foot", "Foot", "ft", 0.3048),
    ];

    fn small_category() -> UnitCategoryDefinition {
        UnitCategoryDefinition {
            id: CategoryId::Length,
            units: &PAIR_UNITS,
            popular_conversions: &[("meter", "foot")],
            strategy: ConversionStrategy::Linear,
        }
    }

    #[test]
    fn test_category_slug_roundtrip() {
        for id in CategoryId::ALL {
            assert_eq!(id.slug().parse::<CategoryId>().unwrap(), id);
        }
        assert_eq!("Temperature".parse::<CategoryId>().unwrap(), CategoryId::Temperature);
        assert!(matches!(
            "luminosity".parse::<CategoryId>(),
            Err(CalcError::NotFound { .. })
        ));
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&CategoryId::Digital).unwrap();
        assert_eq!(json, "\"digital\"");
        let roundtrip: CategoryId = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, CategoryId::Digital);
    }

    #[test]
    fn test_unit_lookup() {
        let category = small_category();
        assert_eq!(category.unit("foot").unwrap().symbol, "ft");
        assert!(matches!(category.unit("furlong"), Err(CalcError::NotFound { .. })));
        assert_eq!(category.member("foot").unwrap().id, "foot");
        assert_eq!(category.member("furlong").unwrap_err().error_code(), "UNIT_MISMATCH");
        assert_eq!(category.popular().len(), 1);
    }

    #[test]
    fn test_affine_unit_base_roundtrip() {
        let fahrenheit = Unit::affine("fahrenheit", "Fahrenheit", "°F", 5.0 / 9.0, -32.0);
        assert!((fahrenheit.to_base(212.0) - 100.0).abs() < 1e-12);
        assert!((fahrenheit.from_base(0.0) - 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_validation_rejects_bad_popular_pair() {
        let mut category = small_category();
        category.popular_conversions = &[("meter", "league")];
        assert!(matches!(category.validate(), Err(CalcError::InvalidCatalog { .. })));
    }

    #[test]
    fn test_validation_rejects_duplicates_and_bad_factors() {
        static DUPES: [Unit; 2] = [
            Unit::linear("meter", "Meter", "m", 1.0),
            Unit::linear("meter", "Metre", "m", 1.0),
        ];
        static ZERO: [Unit; 2] = [
            Unit::linear("meter", "Meter", "m", 1.0),
            Unit::linear("nothing", "Nothing", "-", 0.0),
        ];
        let mut category = small_category();
        category.popular_conversions = &[];

        category.units = &DUPES;
        assert!(category.validate().is_err());

        category.units = &ZERO;
        assert!(category.validate().is_err());

        category.units = &PAIR_UNITS[..1];
        assert!(category.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_missing_affine_formula() {
        static TEMPS: [Unit; 2] = [
            Unit::affine("celsius", "Celsius", "°C", 1.0, 0.0),
            Unit::affine("fahrenheit", "Fahrenheit", "°F", 5.0 / 9.0, -32.0),
        ];
        static ONE_WAY: [AffineFormula; 1] = [AffineFormula {
            from: "celsius",
            to: "fahrenheit",
            pre_offset: 0.0,
            scale: 1.8,
            post_offset: 32.0,
        }];
        let category = UnitCategoryDefinition {
            id: CategoryId::Temperature,
            units: &TEMPS,
            popular_conversions: &[],
            strategy: ConversionStrategy::Affine { formulas: &ONE_WAY },
        };
        assert!(category.validate().is_err());
    }

    #[test]
    fn test_validation_accepts_well_formed_category() {
        assert!(small_category().validate().is_ok());
    }
}
