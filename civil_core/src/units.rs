//! # Unit Conversion
//!
//! Category-scoped conversions for heavy civil work: volume, area, weight,
//! pressure, length, flow rate and earthwork (bank/loose/compacted yards).
//!
//! ## Design Philosophy
//!
//! Every category is a flat table of multiplicative factors relative to one
//! base unit. A conversion normalizes to the base and scales to the target:
//!
//! ```text
//! result = value / factor[from] * factor[to]
//! ```
//!
//! | Category  | Base unit |
//! |-----------|-----------|
//! | volume    | cy        |
//! | area      | sf        |
//! | weight    | lb        |
//! | pressure  | psi       |
//! | length    | ft        |
//! | flow      | gpm       |
//! | earthwork | bcy       |
//!
//! ## Example
//!
//! ```rust
//! use civil_core::units::convert;
//!
//! let cf = convert(10.0, "cy", "cf", "volume").unwrap();
//! assert_eq!(cf.result, 270.0);
//! ```

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{CalcError, CalcResult};

/// Round to a fixed number of decimal places.
///
/// Exact ties round to even (`18.125` → `18.12`, `1234.5` → `1234`). All
/// result fields go through this one helper.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    let rounded = (value * scale).round_ties_even() / scale;
    // Avoid serializing "-0.0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

// ============================================================================
// Whole-number Fields
// ============================================================================

/// A JSON number destined for an integer field: `4000` or `4000.0`
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonNumber {
    Int(i64),
    Float(f64),
}

impl JsonNumber {
    /// Truncate toward zero, rejecting non-finite and out-of-range floats.
    fn to_i64<E: de::Error>(&self) -> Result<i64, E> {
        match *self {
            JsonNumber::Int(n) => Ok(n),
            JsonNumber::Float(f)
                if f.is_finite() && f.trunc() >= i64::MIN as f64 && f.trunc() < i64::MAX as f64 =>
            {
                Ok(f.trunc() as i64)
            }
            JsonNumber::Float(f) => {
                Err(E::custom(format_args!("{} is not a representable integer", f)))
            }
        }
    }

    fn to_u32<E: de::Error>(&self) -> Result<u32, E> {
        let n = self.to_i64()?;
        u32::try_from(n)
            .map_err(|_| E::custom(format_args!("{} is out of range for a non-negative count", n)))
    }
}

/// `deserialize_with` for `i64` fields that accept integral or fractional numbers.
pub(crate) fn whole_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    JsonNumber::deserialize(deserializer)?.to_i64()
}

/// `deserialize_with` for `u32` fields that accept integral or fractional numbers.
pub(crate) fn whole_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    JsonNumber::deserialize(deserializer)?.to_u32()
}

/// Optional form of [`whole_u32`]; pair with `#[serde(default)]`.
pub(crate) fn opt_whole_u32<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u32>, D::Error> {
    Option::<JsonNumber>::deserialize(deserializer)?
        .map(|n| n.to_u32())
        .transpose()
}

// ============================================================================
// Factor Tables
// ============================================================================

const VOLUME: &[(&str, f64)] = &[
    ("cy", 1.0),
    ("cf", 27.0),
    ("ci", 46656.0),
    ("gal", 201.974026),
    ("liter", 764.554858),
    ("m3", 0.764555),
    ("barrel", 4.774),
];

const AREA: &[(&str, f64)] = &[
    ("sf", 1.0),
    ("sy", 1.0 / 9.0),
    ("si", 144.0),
    ("acre", 1.0 / 43560.0),
    ("hectare", 1.0 / 107639.0),
    ("sm", 1.0 / 10.7639),
];

const WEIGHT: &[(&str, f64)] = &[
    ("lb", 1.0),
    ("ton_short", 1.0 / 2000.0),
    ("ton_metric", 1.0 / 2204.623),
    ("kg", 1.0 / 2.204623),
    ("oz", 16.0),
    ("kip", 1.0 / 1000.0),
];

const PRESSURE: &[(&str, f64)] = &[
    ("psi", 1.0),
    ("psf", 144.0),
    ("bar", 1.0 / 14.5038),
    ("kpa", 1.0 / 0.145038),
    ("mpa", 1.0 / 145.038),
    ("ft_water", 1.0 / 0.43353),
    ("m_water", 1.0 / 1.42233),
    ("atm", 1.0 / 14.696),
];

const LENGTH: &[(&str, f64)] = &[
    ("ft", 1.0),
    ("in", 12.0),
    ("yd", 1.0 / 3.0),
    ("mi", 1.0 / 5280.0),
    ("m", 1.0 / 3.28084),
    ("km", 1.0 / 3280.84),
    ("mm", 304.8),
    ("cm", 30.48),
];

const FLOW: &[(&str, f64)] = &[
    ("gpm", 1.0),
    ("cfs", 1.0 / 448.831),
    ("lps", 1.0 / 15.8503),
    ("mgd", 1.0 / 694444.0),
    ("m3_hr", 1.0 / 4.40287),
    ("acre_ft_day", 1.0 / 226285.7),
];

// Bank (in-place), loose (swelled) and compacted (shrunk) yards
const EARTHWORK: &[(&str, f64)] = &[
    ("bcy", 1.0),
    ("lcy_25", 1.25),
    ("lcy_30", 1.30),
    ("lcy_40", 1.40),
    ("ccy_10", 0.90),
    ("ccy_15", 0.85),
    ("ccy_20", 0.80),
    ("bcf", 27.0),
];

// ============================================================================
// Categories
// ============================================================================

/// Conversion category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitCategory {
    Volume,
    Area,
    Weight,
    Pressure,
    Length,
    Flow,
    Earthwork,
}

impl UnitCategory {
    /// All categories in display order
    pub const ALL: [UnitCategory; 7] = [
        UnitCategory::Volume,
        UnitCategory::Area,
        UnitCategory::Weight,
        UnitCategory::Pressure,
        UnitCategory::Length,
        UnitCategory::Flow,
        UnitCategory::Earthwork,
    ];

    /// Lowercase key used in requests
    pub fn key(&self) -> &'static str {
        match self {
            UnitCategory::Volume => "volume",
            UnitCategory::Area => "area",
            UnitCategory::Weight => "weight",
            UnitCategory::Pressure => "pressure",
            UnitCategory::Length => "length",
            UnitCategory::Flow => "flow",
            UnitCategory::Earthwork => "earthwork",
        }
    }

    /// Base unit all factors are relative to
    pub fn base_unit(&self) -> &'static str {
        self.factors()[0].0
    }

    /// Parse a category key (case-insensitive)
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|cat| cat.key() == key)
            .ok_or_else(|| {
                let available: Vec<&str> = Self::ALL.iter().map(|c| c.key()).collect();
                CalcError::unknown_category(s, &available)
            })
    }

    /// Factor table for this category, base unit first
    pub fn factors(&self) -> &'static [(&'static str, f64)] {
        match self {
            UnitCategory::Volume => VOLUME,
            UnitCategory::Area => AREA,
            UnitCategory::Weight => WEIGHT,
            UnitCategory::Pressure => PRESSURE,
            UnitCategory::Length => LENGTH,
            UnitCategory::Flow => FLOW,
            UnitCategory::Earthwork => EARTHWORK,
        }
    }

    /// Unit keys in table order
    pub fn unit_keys(&self) -> Vec<&'static str> {
        self.factors().iter().map(|(key, _)| *key).collect()
    }

    /// Look up a unit's factor (case-insensitive)
    pub fn factor(&self, unit: &str) -> CalcResult<f64> {
        let key = unit.trim().to_lowercase();
        self.factors()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, factor)| *factor)
            .ok_or_else(|| CalcError::unknown_unit(self.key(), unit, &self.unit_keys()))
    }
}

impl std::fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ============================================================================
// Conversion Operations
// ============================================================================

/// Result of a single conversion.
///
/// ## JSON Example
///
/// ```json
/// {
///   "value": 10.0,
///   "from_unit": "cy",
///   "to_unit": "cf",
///   "category": "volume",
///   "result": 270.0,
///   "result_rounded": 270.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub value: f64,
    pub from_unit: String,
    pub to_unit: String,
    pub category: String,
    /// Converted value, 6 decimal places
    pub result: f64,
    /// Converted value, 4 decimal places
    pub result_rounded: f64,
}

/// Input for [`convert`] when called through the tool registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertInput {
    pub value: f64,
    pub from_unit: String,
    pub to_unit: String,
    pub category: String,
}

/// Input for [`bulk_convert`] when called through the tool registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConvertInput {
    pub value: f64,
    pub from_unit: String,
    pub category: String,
}

/// Convert a value between two units of the same category.
///
/// Unit and category keys are case-insensitive and echoed back lowercased.
///
/// # Errors
///
/// * `UnknownCategory` - category is not one of [`UnitCategory::ALL`]
/// * `UnknownUnit` - either unit is missing from the category's table
pub fn convert(
    value: f64,
    from_unit: &str,
    to_unit: &str,
    category: &str,
) -> CalcResult<ConversionResult> {
    let cat = UnitCategory::from_str_flexible(category)?;
    let from_factor = cat.factor(from_unit)?;
    let to_factor = cat.factor(to_unit)?;

    let result = value / from_factor * to_factor;

    Ok(ConversionResult {
        value,
        from_unit: from_unit.trim().to_lowercase(),
        to_unit: to_unit.trim().to_lowercase(),
        category: cat.key().to_string(),
        result: round_to(result, 6),
        result_rounded: round_to(result, 4),
    })
}

/// Convert a value to every unit in its category at once.
///
/// Returns unit key → converted value (6 decimal places).
pub fn bulk_convert(
    value: f64,
    from_unit: &str,
    category: &str,
) -> CalcResult<BTreeMap<String, f64>> {
    let cat = UnitCategory::from_str_flexible(category)?;
    let value_in_base = value / cat.factor(from_unit)?;

    Ok(cat
        .factors()
        .iter()
        .map(|(unit, factor)| (unit.to_string(), round_to(value_in_base * factor, 6)))
        .collect())
}

/// List the unit keys available in a category.
pub fn available_units(category: &str) -> CalcResult<Vec<&'static str>> {
    Ok(UnitCategory::from_str_flexible(category)?.unit_keys())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cy_to_cf() {
        let result = convert(1.0, "cy", "cf", "volume").unwrap();
        assert!((result.result - 27.0).abs() < 0.001);
    }

    #[test]
    fn test_psi_to_psf() {
        let result = convert(1.0, "psi", "psf", "pressure").unwrap();
        assert!((result.result - 144.0).abs() < 0.001);
    }

    #[test]
    fn test_ft_to_in() {
        let result = convert(1.0, "FT", "In", "LENGTH").unwrap();
        assert!((result.result - 12.0).abs() < 0.001);
        assert_eq!(result.from_unit, "ft");
        assert_eq!(result.to_unit, "in");
    }

    #[test]
    fn test_gpm_to_cfs() {
        let result = convert(448.831, "gpm", "cfs", "flow").unwrap();
        assert!((result.result - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rounding_precision() {
        // 1 sf -> acres is 2.2957e-5
        let result = convert(1.0, "sf", "acre", "area").unwrap();
        assert_eq!(result.result, 0.000023);
        assert_eq!(result.result_rounded, 0.0);
    }

    #[test]
    fn test_invalid_category() {
        let err = convert(1.0, "cy", "cf", "magic").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CATEGORY");
        assert!(err.to_string().contains("volume"));
    }

    #[test]
    fn test_invalid_unit() {
        let err = convert(1.0, "furlongs", "cf", "volume").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_UNIT");
        assert!(err.to_string().contains("barrel"));

        assert!(convert(1.0, "cy", "furlongs", "volume").is_err());
    }

    #[test]
    fn test_bulk_convert() {
        let all = bulk_convert(1.0, "bcy", "earthwork").unwrap();
        assert_eq!(all.len(), EARTHWORK.len());
        assert_eq!(all["bcf"], 27.0);
        assert_eq!(all["lcy_25"], 1.25);
    }

    #[test]
    fn test_bulk_convert_unknown_category() {
        assert!(bulk_convert(1.0, "cy", "magic").is_err());
    }

    #[test]
    fn test_available_units() {
        let units = available_units("Weight").unwrap();
        assert_eq!(units[0], "lb");
        assert!(units.contains(&"kip"));
    }

    #[test]
    fn test_base_units() {
        assert_eq!(UnitCategory::Volume.base_unit(), "cy");
        assert_eq!(UnitCategory::Flow.base_unit(), "gpm");
        assert_eq!(UnitCategory::Earthwork.base_unit(), "bcy");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456789, 4), 1.2346);
        assert_eq!(round_to(-0.00001, 2), 0.0);
        assert_eq!(round_to(1234.5, 0), 1234.0);
    }

    #[test]
    fn test_round_to_ties_even() {
        assert_eq!(round_to(18.125, 2), 18.12);
        assert_eq!(round_to(18.375, 2), 18.38);
        assert_eq!(round_to(0.5, 0), 0.0);
        assert_eq!(round_to(1.5, 0), 2.0);
        assert_eq!(round_to(-2.5, 0), -2.0);
    }

    #[derive(Debug, Deserialize)]
    struct Counts {
        #[serde(deserialize_with = "whole_i64")]
        days: i64,
        #[serde(deserialize_with = "whole_u32")]
        crew: u32,
        #[serde(default, deserialize_with = "opt_whole_u32")]
        psi: Option<u32>,
    }

    #[test]
    fn test_whole_numbers_accept_floats() {
        let counts: Counts =
            serde_json::from_str(r#"{"days": 10.0, "crew": 4.0, "psi": 4000.0}"#).unwrap();
        assert_eq!(counts.days, 10);
        assert_eq!(counts.crew, 4);
        assert_eq!(counts.psi, Some(4000));

        let truncated: Counts = serde_json::from_str(r#"{"days": -2.7, "crew": 3.9}"#).unwrap();
        assert_eq!(truncated.days, -2);
        assert_eq!(truncated.crew, 3);
        assert_eq!(truncated.psi, None);
    }

    #[test]
    fn test_whole_numbers_reject_out_of_range() {
        assert!(serde_json::from_str::<Counts>(r#"{"days": 1e300, "crew": 1}"#).is_err());
        assert!(serde_json::from_str::<Counts>(r#"{"days": 1, "crew": -1}"#).is_err());
        assert!(serde_json::from_str::<Counts>(r#"{"days": 1, "crew": 5000000000}"#).is_err());
        assert!(serde_json::from_str::<Counts>(r#"{"days": 1, "crew": "four"}"#).is_err());
    }

    #[test]
    fn test_category_echoed_canonical() {
        let result = convert(1.0, "CY", "CF", "  Volume ").unwrap();
        assert_eq!(result.category, "volume");
        assert_eq!(result.from_unit, "cy");
    }
}
