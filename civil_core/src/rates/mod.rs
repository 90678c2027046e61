//! # Regional Rate Tables
//!
//! Labor, material and equipment pricing by geography. The built-in tables
//! are compiled from `data/rate_tables.toml` at build time and held in a
//! process-wide [`RateCatalog`].
//!
//! ## Lookup Policy
//!
//! Region slugs are matched case-insensitively. An unknown region resolves
//! to the default region (`national`); this is a fallback, not an error.
//!
//! ## Example
//!
//! ```rust
//! use civil_core::rates::{RateCatalog, WageType};
//!
//! let catalog = RateCatalog::global();
//! let rates = catalog.get_rates("California");
//! assert_eq!(rates.wage_type, WageType::PrevailingWage);
//!
//! // Unknown regions fall back to national
//! assert_eq!(catalog.get_rates("atlantis").label, catalog.get_rates("national").label);
//! ```

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::CalcResult;

include!(concat!(env!("OUT_DIR"), "/rate_tables.rs"));

/// Region every lookup falls back to
pub const DEFAULT_REGION: &str = "national";

static BUILTIN: Lazy<RateCatalog> = Lazy::new(RateCatalog::builtin);

/// Labor agreement basis for a region's rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WageType {
    OpenShop,
    PrevailingWage,
    UnionPrevailing,
}

impl WageType {
    pub fn key(&self) -> &'static str {
        match self {
            WageType::OpenShop => "open_shop",
            WageType::PrevailingWage => "prevailing_wage",
            WageType::UnionPrevailing => "union_prevailing",
        }
    }
}

/// All-in hourly labor rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborRate {
    pub hourly: f64,
    pub overtime: f64,
    pub title: String,
}

/// Unit material price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRate {
    pub unit: String,
    pub cost: f64,
    pub description: String,
}

/// Equipment rental rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRate {
    pub daily: f64,
    pub hourly: f64,
    pub description: String,
}

/// One geography's pricing.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Utah - Prevailing Wage",
///   "wage_type": "prevailing_wage",
///   "labor": {
///     "operator": {"hourly": 92.0, "overtime": 138.0, "title": "Operator"}
///   },
///   "materials": {
///     "pipe": {"pvc_c900_8": {"unit": "LF", "cost": 18.0, "description": "8\" PVC C900"}}
///   },
///   "equipment": {}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRateTable {
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub wage_type: WageType,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub last_updated: String,
    /// Role key → rate
    #[serde(default)]
    pub labor: BTreeMap<String, LaborRate>,
    /// Category key → item key → rate
    #[serde(default)]
    pub materials: BTreeMap<String, BTreeMap<String, MaterialRate>>,
    /// Equipment type key → rate
    #[serde(default)]
    pub equipment: BTreeMap<String, EquipmentRate>,
}

impl RegionRateTable {
    /// Create an empty table.
    pub fn new(label: impl Into<String>, wage_type: WageType) -> Self {
        RegionRateTable {
            label: label.into(),
            description: String::new(),
            wage_type,
            source: String::new(),
            last_updated: String::new(),
            labor: BTreeMap::new(),
            materials: BTreeMap::new(),
            equipment: BTreeMap::new(),
        }
    }

    pub fn add_labor(&mut self, role: &str, hourly: f64, overtime: f64, title: &str) {
        self.labor.insert(
            role.to_string(),
            LaborRate {
                hourly,
                overtime,
                title: title.to_string(),
            },
        );
    }

    pub fn add_material(
        &mut self,
        category: &str,
        item: &str,
        unit: &str,
        cost: f64,
        description: &str,
    ) {
        self.materials.entry(category.to_string()).or_default().insert(
            item.to_string(),
            MaterialRate {
                unit: unit.to_string(),
                cost,
                description: description.to_string(),
            },
        );
    }

    pub fn add_equipment(
        &mut self,
        equipment_type: &str,
        daily: f64,
        hourly: f64,
        description: &str,
    ) {
        self.equipment.insert(
            equipment_type.to_string(),
            EquipmentRate {
                daily,
                hourly,
                description: description.to_string(),
            },
        );
    }

    pub fn material(&self, category: &str, item: &str) -> Option<&MaterialRate> {
        self.materials.get(category).and_then(|items| items.get(item))
    }
}

/// Region listing entry returned by [`RateCatalog::get_regions`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSummary {
    pub key: String,
    pub label: String,
    pub wage_type: WageType,
    pub description: String,
}

/// A region lookup after fallback.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRegion<'a> {
    /// Slug of the table actually used
    pub slug: &'a str,
    pub table: &'a RegionRateTable,
    /// The requested region was unknown
    pub fell_back: bool,
}

/// All region tables plus the default region.
///
/// The default region is always present: the build fails if the data file
/// lacks it, and regions are only ever inserted or replaced.
#[derive(Debug, Clone)]
pub struct RateCatalog {
    regions: BTreeMap<String, RegionRateTable>,
    default_region: String,
}

impl RateCatalog {
    /// Build a catalog from the compiled-in tables.
    pub fn builtin() -> Self {
        RateCatalog {
            regions: builtin_tables()
                .into_iter()
                .map(|(slug, table)| (slug.to_string(), table))
                .collect(),
            default_region: DEFAULT_REGION.to_string(),
        }
    }

    /// The shared, read-only built-in catalog.
    pub fn global() -> &'static RateCatalog {
        &BUILTIN
    }

    pub fn default_region(&self) -> &str {
        &self.default_region
    }

    /// The default region's table.
    pub fn default_table(&self) -> &RegionRateTable {
        &self.regions[&self.default_region]
    }

    pub fn contains(&self, region: &str) -> bool {
        self.regions.contains_key(&region.trim().to_lowercase())
    }

    /// Resolve a region slug, falling back to the default region.
    pub fn resolve(&self, region: &str) -> ResolvedRegion<'_> {
        let slug = region.trim().to_lowercase();
        match self.regions.get_key_value(&slug) {
            Some((key, table)) => ResolvedRegion {
                slug: key,
                table,
                fell_back: false,
            },
            None => {
                warn!(
                    region,
                    fallback = %self.default_region,
                    "unknown region, using default rates"
                );
                ResolvedRegion {
                    slug: &self.default_region,
                    table: self.default_table(),
                    fell_back: true,
                }
            }
        }
    }

    /// Full rate table for a region; unknown regions return the default table.
    pub fn get_rates(&self, region: &str) -> &RegionRateTable {
        self.resolve(region).table
    }

    /// Slug, label, wage type and description of every region.
    pub fn get_regions(&self) -> Vec<RegionSummary> {
        self.regions
            .iter()
            .map(|(key, table)| RegionSummary {
                key: key.clone(),
                label: table.label.clone(),
                wage_type: table.wage_type,
                description: table.description.clone(),
            })
            .collect()
    }

    /// Insert or replace a whole region table.
    pub fn replace_region(&mut self, slug: &str, table: RegionRateTable) {
        self.regions.insert(slug.trim().to_lowercase(), table);
    }

    /// Insert or replace a region from JSON shaped like [`RegionRateTable`].
    ///
    /// The catalog is unchanged if the JSON does not deserialize.
    pub fn load_region_json(&mut self, slug: &str, data: serde_json::Value) -> CalcResult<()> {
        let table: RegionRateTable = serde_json::from_value(data)?;
        self.replace_region(slug, table);
        Ok(())
    }

    /// Apply a batch of region overrides.
    pub fn apply_overrides(&mut self, overrides: BTreeMap<String, RegionRateTable>) {
        for (slug, table) in overrides {
            self.replace_region(&slug, table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_regions() {
        let catalog = RateCatalog::builtin();
        let keys: Vec<String> = catalog.get_regions().into_iter().map(|r| r.key).collect();
        for region in ["national", "utah", "mountain_west", "texas", "california", "northeast"] {
            assert!(keys.contains(&region.to_string()), "missing {}", region);
        }
    }

    #[test]
    fn test_national_rates() {
        let national = RateCatalog::global().get_rates("national");
        assert_eq!(national.labor["operator"].hourly, 75.0);
        assert_eq!(national.equipment["excavator"].daily, 450.0);
        assert_eq!(national.material("concrete", "4000_psi").map(|m| m.cost), Some(180.0));
        assert_eq!(national.wage_type, WageType::OpenShop);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let catalog = RateCatalog::global();
        let resolved = catalog.resolve("  NorthEast ");
        assert!(!resolved.fell_back);
        assert_eq!(resolved.slug, "northeast");
        assert_eq!(resolved.table.wage_type, WageType::UnionPrevailing);
    }

    #[test]
    fn test_unknown_region_falls_back() {
        let catalog = RateCatalog::global();
        let resolved = catalog.resolve("doesnotexist");
        assert!(resolved.fell_back);
        assert_eq!(resolved.slug, "national");
        assert_eq!(catalog.get_rates("doesnotexist"), catalog.default_table());
    }

    #[test]
    fn test_replace_region() {
        let mut catalog = RateCatalog::builtin();
        let mut table = RegionRateTable::new("Utah Prevailing", WageType::PrevailingWage);
        table.add_labor("operator", 92.0, 138.0, "Operator");
        catalog.replace_region("Utah_Prevailing", table);

        let rates = catalog.get_rates("utah_prevailing");
        assert_eq!(rates.labor["operator"].hourly, 92.0);
        // Shared catalog is untouched
        assert!(!RateCatalog::global().contains("utah_prevailing"));
    }

    #[test]
    fn test_load_region_json() {
        let mut catalog = RateCatalog::builtin();
        let data = serde_json::json!({
            "label": "Alaska",
            "wage_type": "prevailing_wage",
            "equipment": {
                "excavator": {"daily": 700.0, "hourly": 100.0, "description": "Excavator"}
            }
        });
        catalog.load_region_json("alaska", data).unwrap();
        assert_eq!(catalog.get_rates("alaska").equipment["excavator"].daily, 700.0);
    }

    #[test]
    fn test_load_region_json_rejects_bad_shape() {
        let mut catalog = RateCatalog::builtin();
        let data = serde_json::json!({"label": "Nowhere", "wage_type": "cash"});
        assert!(catalog.load_region_json("nowhere", data).is_err());
        assert!(!catalog.contains("nowhere"));
    }
}
