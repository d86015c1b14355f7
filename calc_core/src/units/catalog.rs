//! Built-in unit catalog.
//!
//! Unit and category ids are embedded in crawled URLs
//! (`/convert/length/kilometer-to-mile`). Renaming or removing one is a
//! breaking change.

use once_cell::sync::Lazy;
use serde::Serialize;

use super::{AffineFormula, CategoryId, ConversionStrategy, Unit, UnitCategoryDefinition};
use crate::errors::{CalcError, CalcResult};

// ============================================================================
// Length (base: meter)
// ============================================================================

static LENGTH_UNITS: [Unit; 9] = [
    Unit::linear("millimeter", "Millimeter", "mm", 0.001),
    Unit::linear("centimeter", "Centimeter", "cm", 0.01),
    Unit::linear("meter", "Meter", "m", 1.0),
    Unit::linear("kilometer", "Kilometer", "km", 1000.0),
    Unit::linear("inch", "Inch", "in", 0.0254),
    Unit::linear("foot", "Foot", "ft", 0.3048),
    Unit::linear("yard", "Yard", "yd", 0.9144),
    Unit::linear("mile", "Mile", "mi", 1609.344),
    Unit::linear("nautical-mile", "Nautical Mile", "nmi", 1852.0),
];

static LENGTH_POPULAR: [(&str, &str); 6] = [
    ("kilometer", "mile"),
    ("mile", "kilometer"),
    ("meter", "foot"),
    ("foot", "meter"),
    ("centimeter", "inch"),
    ("inch", "centimeter"),
];

// ============================================================================
// Weight (base: kilogram)
// ============================================================================

static WEIGHT_UNITS: [Unit; 8] = [
    Unit::linear("milligram", "Milligram", "mg", 0.000001),
    Unit::linear("gram", "Gram", "g", 0.001),
    Unit::linear("kilogram", "Kilogram", "kg", 1.0),
    Unit::linear("metric-ton", "Metric Ton", "t", 1000.0),
    Unit::linear("ounce", "Ounce", "oz", 0.028349523125),
    Unit::linear("pound", "Pound", "lb", 0.45359237),
    Unit::linear("stone", "Stone", "st", 6.35029318),
    Unit::linear("us-ton", "US Ton", "ton", 907.18474),
];

static WEIGHT_POPULAR: [(&str, &str); 5] = [
    ("kilogram", "pound"),
    ("pound", "kilogram"),
    ("gram", "ounce"),
    ("ounce", "gram"),
    ("stone", "kilogram"),
];

// ============================================================================
// Temperature (base: degree Celsius, affine)
// ============================================================================

static TEMPERATURE_UNITS: [Unit; 3] = [
    Unit::affine("celsius", "Celsius", "°C", 1.0, 0.0),
    Unit::affine("fahrenheit", "Fahrenheit", "°F", 5.0 / 9.0, -32.0),
    Unit::affine("kelvin", "Kelvin", "K", 1.0, -273.15),
];

static TEMPERATURE_FORMULAS: [AffineFormula; 6] = [
    // F = C * 9/5 + 32
    AffineFormula { from: "celsius", to: "fahrenheit", pre_offset: 0.0, scale: 9.0 / 5.0, post_offset: 32.0 },
    // C = (F - 32) * 5/9
    AffineFormula { from: "fahrenheit", to: "celsius", pre_offset: -32.0, scale: 5.0 / 9.0, post_offset: 0.0 },
    // K = C + 273.15
    AffineFormula { from: "celsius", to: "kelvin", pre_offset: 0.0, scale: 1.0, post_offset: 273.15 },
    // C = K - 273.15
    AffineFormula { from: "kelvin", to: "celsius", pre_offset: -273.15, scale: 1.0, post_offset: 0.0 },
    // K = (F - 32) * 5/9 + 273.15
    AffineFormula { from: "fahrenheit", to: "kelvin", pre_offset: -32.0, scale: 5.0 / 9.0, post_offset: 273.15 },
    // F = (K - 273.15) * 9/5 + 32
    AffineFormula { from: "kelvin", to: "fahrenheit", pre_offset: -273.15, scale: 9.0 / 5.0, post_offset: 32.0 },
];

static TEMPERATURE_POPULAR: [(&str, &str); 4] = [
    ("celsius", "fahrenheit"),
    ("fahrenheit", "celsius"),
    ("celsius", "kelvin"),
    ("kelvin", "celsius"),
];

// ============================================================================
// Volume (base: liter, US customary measures)
// ============================================================================

static VOLUME_UNITS: [Unit; 10] = [
    Unit::linear("milliliter", "Milliliter", "mL", 0.001),
    Unit::linear("liter", "Liter", "L", 1.0),
    Unit::linear("cubic-meter", "Cubic Meter", "m³", 1000.0),
    Unit::linear("teaspoon", "Teaspoon", "tsp", 0.00492892159375),
    Unit::linear("tablespoon", "Tablespoon", "tbsp", 0.01478676478125),
    Unit::linear("fluid-ounce", "Fluid Ounce", "fl oz", 0.0295735295625),
    Unit::linear("cup", "Cup", "cup", 0.2365882365),
    Unit::linear("pint", "Pint", "pt", 0.473176473),
    Unit::linear("quart", "Quart", "qt", 0.946352946),
    Unit::linear("gallon", "Gallon", "gal", 3.785411784),
];

static VOLUME_POPULAR: [(&str, &str); 5] = [
    ("liter", "gallon"),
    ("gallon", "liter"),
    ("milliliter", "fluid-ounce"),
    ("cup", "milliliter"),
    ("tablespoon", "teaspoon"),
];

// ============================================================================
// Area (base: square meter)
// ============================================================================

static AREA_UNITS: [Unit; 10] = [
    Unit::linear("square-millimeter", "Square Millimeter", "mm²", 0.000001),
    Unit::linear("square-centimeter", "Square Centimeter", "cm²", 0.0001),
    Unit::linear("square-meter", "Square Meter", "m²", 1.0),
    Unit::linear("hectare", "Hectare", "ha", 10_000.0),
    Unit::linear("square-kilometer", "Square Kilometer", "km²", 1_000_000.0),
    Unit::linear("square-inch", "Square Inch", "in²", 0.00064516),
    Unit::linear("square-foot", "Square Foot", "ft²", 0.09290304),
    Unit::linear("square-yard", "Square Yard", "yd²", 0.83612736),
    Unit::linear("acre", "Acre", "ac", 4046.8564224),
    Unit::linear("square-mile", "Square Mile", "mi²", 2_589_988.110336),
];

static AREA_POPULAR: [(&str, &str); 4] = [
    ("square-meter", "square-foot"),
    ("square-foot", "square-meter"),
    ("acre", "hectare"),
    ("hectare", "acre"),
];

// ============================================================================
// Speed (base: meter per second)
// ============================================================================

static SPEED_UNITS: [Unit; 5] = [
    Unit::linear("meter-per-second", "Meter per Second", "m/s", 1.0),
    Unit::linear("kilometer-per-hour", "Kilometer per Hour", "km/h", 1.0 / 3.6),
    Unit::linear("mile-per-hour", "Mile per Hour", "mph", 0.44704),
    Unit::linear("knot", "Knot", "kn", 1852.0 / 3600.0),
    Unit::linear("foot-per-second", "Foot per Second", "ft/s", 0.3048),
];

static SPEED_POPULAR: [(&str, &str); 4] = [
    ("kilometer-per-hour", "mile-per-hour"),
    ("mile-per-hour", "kilometer-per-hour"),
    ("knot", "kilometer-per-hour"),
    ("meter-per-second", "kilometer-per-hour"),
];

// ============================================================================
// Time (base: second; month and year are Gregorian averages)
// ============================================================================

static TIME_UNITS: [Unit; 8] = [
    Unit::linear("millisecond", "Millisecond", "ms", 0.001),
    Unit::linear("second", "Second", "s", 1.0),
    Unit::linear("minute", "Minute", "min", 60.0),
    Unit::linear("hour", "Hour", "h", 3600.0),
    Unit::linear("day", "Day", "d", 86_400.0),
    Unit::linear("week", "Week", "wk", 604_800.0),
    Unit::linear("month", "Month", "mo", 2_629_746.0),
    Unit::linear("year", "Year", "yr", 31_556_952.0),
];

static TIME_POPULAR: [(&str, &str); 4] = [
    ("hour", "minute"),
    ("minute", "second"),
    ("day", "hour"),
    ("year", "day"),
];

// ============================================================================
// Digital storage (base: byte; SI and IEC prefixes)
// ============================================================================

static DIGITAL_UNITS: [Unit; 9] = [
    Unit::linear("bit", "Bit", "b", 0.125),
    Unit::linear("byte", "Byte", "B", 1.0),
    Unit::linear("kilobyte", "Kilobyte", "kB", 1e3),
    Unit::linear("megabyte", "Megabyte", "MB", 1e6),
    Unit::linear("gigabyte", "Gigabyte", "GB", 1e9),
    Unit::linear("terabyte", "Terabyte", "TB", 1e12),
    Unit::linear("kibibyte", "Kibibyte", "KiB", 1024.0),
    Unit::linear("mebibyte", "Mebibyte", "MiB", 1_048_576.0),
    Unit::linear("gibibyte", "Gibibyte", "GiB", 1_073_741_824.0),
];

static DIGITAL_POPULAR: [(&str, &str); 4] = [
    ("megabyte", "gigabyte"),
    ("gigabyte", "megabyte"),
    ("gigabyte", "gibibyte"),
    ("byte", "bit"),
];

// ============================================================================
// Pressure (base: pascal)
// ============================================================================

static PRESSURE_UNITS: [Unit; 7] = [
    Unit::linear("pascal", "Pascal", "Pa", 1.0),
    Unit::linear("kilopascal", "Kilopascal", "kPa", 1000.0),
    Unit::linear("bar", "Bar", "bar", 100_000.0),
    Unit::linear("psi", "Pound per Square Inch", "psi", 6894.757293168361),
    Unit::linear("atmosphere", "Standard Atmosphere", "atm", 101_325.0),
    Unit::linear("mmhg", "Millimeter of Mercury", "mmHg", 133.322387415),
    Unit::linear("torr", "Torr", "Torr", 101_325.0 / 760.0),
];

static PRESSURE_POPULAR: [(&str, &str); 4] = [
    ("psi", "bar"),
    ("bar", "psi"),
    ("atmosphere", "kilopascal"),
    ("kilopascal", "psi"),
];

// ============================================================================
// Energy (base: joule)
// ============================================================================

static ENERGY_UNITS: [Unit; 8] = [
    Unit::linear("joule", "Joule", "J", 1.0),
    Unit::linear("kilojoule", "Kilojoule", "kJ", 1000.0),
    Unit::linear("calorie", "Calorie", "cal", 4.184),
    Unit::linear("kilocalorie", "Kilocalorie", "kcal", 4184.0),
    Unit::linear("watt-hour", "Watt-hour", "Wh", 3600.0),
    Unit::linear("kilowatt-hour", "Kilowatt-hour", "kWh", 3_600_000.0),
    Unit::linear("btu", "British Thermal Unit", "BTU", 1055.05585262),
    Unit::linear("electronvolt", "Electronvolt", "eV", 1.602176634e-19),
];

static ENERGY_POPULAR: [(&str, &str); 4] = [
    ("kilocalorie", "kilojoule"),
    ("kilojoule", "kilocalorie"),
    ("kilowatt-hour", "btu"),
    ("joule", "calorie"),
];

/// The built-in category definitions, in [`CategoryId::ALL`] order.
pub fn builtin_categories() -> Vec<UnitCategoryDefinition> {
    vec![
        linear(CategoryId::Length, &LENGTH_UNITS, &LENGTH_POPULAR),
        linear(CategoryId::Weight, &WEIGHT_UNITS, &WEIGHT_POPULAR),
        UnitCategoryDefinition {
            id: CategoryId::Temperature,
            units: &TEMPERATURE_UNITS,
            popular_conversions: &TEMPERATURE_POPULAR,
            strategy: ConversionStrategy::Affine {
                formulas: &TEMPERATURE_FORMULAS,
            },
        },
        linear(CategoryId::Volume, &VOLUME_UNITS, &VOLUME_POPULAR),
        linear(CategoryId::Area, &AREA_UNITS, &AREA_POPULAR),
        linear(CategoryId::Speed, &SPEED_UNITS, &SPEED_POPULAR),
        linear(CategoryId::Time, &TIME_UNITS, &TIME_POPULAR),
        linear(CategoryId::Digital, &DIGITAL_UNITS, &DIGITAL_POPULAR),
        linear(CategoryId::Pressure, &PRESSURE_UNITS, &PRESSURE_POPULAR),
        linear(CategoryId::Energy, &ENERGY_UNITS, &ENERGY_POPULAR),
    ]
}

fn linear(
    id: CategoryId,
    units: &'static [Unit],
    popular_conversions: &'static [(&'static str, &'static str)],
) -> UnitCategoryDefinition {
    UnitCategoryDefinition {
        id,
        units,
        popular_conversions,
        strategy: ConversionStrategy::Linear,
    }
}

/// Validated once on first use; every later lookup is a plain scan.
static CATALOG: Lazy<CalcResult<Catalog>> = Lazy::new(|| Catalog::new(builtin_categories()));

/// The shared built-in catalog.
///
/// # Errors
///
/// `InvalidCatalog` if the built-in data fails validation.
pub fn catalog() -> CalcResult<&'static Catalog> {
    Lazy::force(&CATALOG).as_ref().map_err(|e| e.clone())
}

/// Look up a built-in category.
pub fn get_category(id: CategoryId) -> CalcResult<&'static UnitCategoryDefinition> {
    catalog()?.get_category(id)
}

/// Look up a unit in a built-in category.
pub fn get_unit(category: CategoryId, unit_id: &str) -> CalcResult<&'static Unit> {
    catalog()?.get_unit(category, unit_id)
}

/// One valid (category, from, to) route triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionPath {
    pub category: CategoryId,
    pub from: &'static str,
    pub to: &'static str,
}

impl ConversionPath {
    /// URL path segment, e.g. `length/kilometer-to-mile`
    pub fn slug(&self) -> String {
        format!("{}/{}-to-{}", self.category, self.from, self.to)
    }
}

/// Read-only registry of validated categories.
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<UnitCategoryDefinition>,
}

impl Catalog {
    /// Build a catalog, validating every category and rejecting repeated
    /// category ids.
    pub fn new(categories: Vec<UnitCategoryDefinition>) -> CalcResult<Self> {
        for (i, category) in categories.iter().enumerate() {
            if categories[..i].iter().any(|c| c.id == category.id) {
                return Err(CalcError::invalid_catalog(category.id.slug(), "Duplicate category"));
            }
            category.validate()?;
        }
        log::debug!("unit catalog loaded with {} categories", categories.len());
        Ok(Catalog { categories })
    }

    pub fn categories(&self) -> &[UnitCategoryDefinition] {
        &self.categories
    }

    /// # Errors
    ///
    /// `NotFound` when the category is not part of this catalog.
    pub fn get_category(&self, id: CategoryId) -> CalcResult<&UnitCategoryDefinition> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CalcError::not_found("Category", id.slug()))
    }

    /// Look up a category by its URL slug.
    pub fn get_category_by_slug(&self, slug: &str) -> CalcResult<&UnitCategoryDefinition> {
        self.get_category(slug.parse()?)
    }

    /// # Errors
    ///
    /// `NotFound` when either the category or the unit is missing.
    pub fn get_unit(&self, category: CategoryId, unit_id: &str) -> CalcResult<&Unit> {
        self.get_category(category)?.unit(unit_id)
    }

    /// Every ordered pair of distinct units in every category, for route
    /// and sitemap generation.
    pub fn conversion_paths(&self) -> Vec<ConversionPath> {
        self.categories
            .iter()
            .flat_map(|category| {
                category.units.iter().flat_map(move |from| {
                    category
                        .units
                        .iter()
                        .filter(move |to| to.id != from.id)
                        .map(move |to| ConversionPath {
                            category: category.id,
                            from: from.id,
                            to: to.id,
                        })
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = catalog().unwrap();
        assert_eq!(catalog.categories().len(), CategoryId::ALL.len());
        for (category, id) in catalog.categories().iter().zip(CategoryId::ALL) {
            assert_eq!(category.id, id);
            assert!(category.units.len() >= 2);
            assert!(!category.popular_conversions.is_empty());
        }
    }

    #[test]
    fn test_only_temperature_is_affine() {
        let catalog = catalog().unwrap();
        for category in catalog.categories() {
            assert_eq!(category.is_affine(), category.id == CategoryId::Temperature);
        }
    }

    #[test]
    fn test_lookups() {
        assert_eq!(get_unit(CategoryId::Length, "mile").unwrap().symbol, "mi");
        assert!(matches!(
            get_unit(CategoryId::Length, "kilogram"),
            Err(CalcError::NotFound { .. })
        ));

        let catalog = catalog().unwrap();
        assert_eq!(catalog.get_category_by_slug("speed").unwrap().id, CategoryId::Speed);
        assert!(catalog.get_category_by_slug("flux").is_err());
    }

    #[test]
    fn test_missing_category_in_custom_catalog() {
        let only_length: Vec<_> = builtin_categories()
            .into_iter()
            .filter(|c| c.id == CategoryId::Length)
            .collect();
        let catalog = Catalog::new(only_length).unwrap();
        assert!(matches!(
            catalog.get_category(CategoryId::Energy),
            Err(CalcError::NotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let mut categories = builtin_categories();
        categories.push(categories[0].clone());
        assert!(matches!(Catalog::new(categories), Err(CalcError::InvalidCatalog { .. })));
    }

    #[test]
    fn test_conversion_paths() {
        let catalog = catalog().unwrap();
        let paths = catalog.conversion_paths();
        let expected: usize = catalog
            .categories()
            .iter()
            .map(|c| c.units.len() * (c.units.len() - 1))
            .sum();
        assert_eq!(paths.len(), expected);
        assert!(paths.iter().all(|p| p.from != p.to));

        let km_to_mile = paths
            .iter()
            .find(|p| p.from == "kilometer" && p.to == "mile")
            .unwrap();
        assert_eq!(km_to_mile.slug(), "length/kilometer-to-mile");
    }
}
