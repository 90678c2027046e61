//! # Cost Estimating
//!
//! Material, labor and equipment pricing against a [`RateCatalog`], and
//! roll-up of line items into a marked-up project estimate.
//!
//! ## Resolution
//!
//! Each lookup resolves the region (unknown → national), then the rate key
//! in that region's table, then the same key in the national table. A key
//! found nowhere produces a [`CostResult::Missing`] value listing the valid
//! keys rather than an error, so an estimate can skip it and carry on.
//!
//! ## Example
//!
//! ```rust
//! use civil_core::estimating::CostEstimator;
//! use civil_core::rates::RateCatalog;
//!
//! let estimator = CostEstimator::new(RateCatalog::global());
//! let pipe = estimator.material_cost("pipe", 100.0, Some("8"), "national");
//! assert_eq!(pipe.priced().map(|p| p.total_cost), Some(1900.0));
//!
//! let missing = estimator.material_cost("unobtainium", 100.0, None, "national");
//! assert!(missing.error().is_some());
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::errors::{CalcError, CalcResult};
use crate::rates::{RateCatalog, RegionRateTable, ResolvedRegion, WageType};
use crate::settings::EstimatorSettings;
use crate::units::round_to;

// ============================================================================
// Results
// ============================================================================

/// A priced line item, or the reason it could not be priced.
///
/// Serializes as the priced record itself, or as `{"error": ..., "available": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CostResult<T> {
    Priced(T),
    Missing(MissingRate),
}

impl<T> CostResult<T> {
    pub fn priced(&self) -> Option<&T> {
        match self {
            CostResult::Priced(value) => Some(value),
            CostResult::Missing(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CostResult::Priced(_) => None,
            CostResult::Missing(missing) => Some(&missing.error),
        }
    }

    pub fn is_priced(&self) -> bool {
        matches!(self, CostResult::Priced(_))
    }
}

/// Lookup failure for a line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingRate {
    pub error: String,
    /// Keys that would have resolved
    pub available: Vec<String>,
}

impl MissingRate {
    fn new(error: String, available: Vec<String>) -> Self {
        MissingRate { error, available }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialCost {
    /// Category key (pipe, concrete, aggregate, ...)
    pub material_type: String,
    /// Item key within the category
    pub item: String,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_cost: f64,
    pub waste_factor_pct: f64,
    pub total_cost: f64,
    pub total_with_waste: f64,
    /// Region as requested
    pub region: String,
    /// Region whose table supplied the rate
    pub resolved_region: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaborCost {
    pub labor_type: String,
    pub title: String,
    pub hours: f64,
    pub hourly_rate: f64,
    pub total_cost: f64,
    pub region: String,
    pub resolved_region: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentCost {
    pub equipment_type: String,
    /// Equipment description from the rate table
    pub equipment: String,
    pub days: f64,
    pub daily_rate: f64,
    pub total_cost: f64,
    pub region: String,
    pub resolved_region: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

// ============================================================================
// Line items
// ============================================================================

/// Kind of cost line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Material,
    Labor,
    Equipment,
}

/// Material line: category, optional size or item key, quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialItem {
    #[serde(rename = "type")]
    pub material_type: String,
    pub quantity: f64,
    #[serde(default, deserialize_with = "size_key", skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Number(f64),
    Text(String),
}

/// Accept a size as `"8"`, `"3000_psi"` or a bare number (`8` → `"8"`).
pub(crate) fn size_key<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<SizeValue>::deserialize(deserializer)?.map(|size| match size {
        SizeValue::Number(n) if n.fract() == 0.0 => format!("{}", n as i64),
        SizeValue::Number(n) => n.to_string(),
        SizeValue::Text(s) => s,
    }))
}

impl MaterialItem {
    pub fn new(material_type: &str, quantity: f64, size: Option<&str>) -> Self {
        MaterialItem {
            material_type: material_type.to_string(),
            quantity,
            size: size.map(String::from),
        }
    }
}

/// Labor line: role key and hours
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaborItem {
    #[serde(rename = "type")]
    pub labor_type: String,
    pub hours: f64,
}

impl LaborItem {
    pub fn new(labor_type: &str, hours: f64) -> Self {
        LaborItem {
            labor_type: labor_type.to_string(),
            hours,
        }
    }
}

/// Equipment line: type key and rental days
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentItem {
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub days: f64,
}

impl EquipmentItem {
    pub fn new(equipment_type: &str, days: f64) -> Self {
        EquipmentItem {
            equipment_type: equipment_type.to_string(),
            days,
        }
    }
}

/// Input for [`CostEstimator::estimate_project`].
///
/// ## JSON Example
///
/// ```json
/// {
///   "materials": [{"type": "pipe", "quantity": 500, "size": "8"}],
///   "labor": [{"type": "operator", "hours": 40}],
///   "equipment": [{"type": "excavator", "days": 5}],
///   "markup": 0.15,
///   "region": "utah"
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstimateInput {
    #[serde(default)]
    pub materials: Vec<MaterialItem>,
    #[serde(default)]
    pub labor: Vec<LaborItem>,
    #[serde(default)]
    pub equipment: Vec<EquipmentItem>,
    /// O&P fraction; settings default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<f64>,
    /// Region slug; settings default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Priced lines of one kind and their subtotal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateSection<T> {
    pub breakdown: Vec<T>,
    pub subtotal: f64,
}

/// A line item left out of an estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedItem {
    pub kind: LineKind,
    #[serde(rename = "type")]
    pub item_type: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEstimate {
    pub region: String,
    pub resolved_region: String,
    pub region_label: String,
    pub wage_type: WageType,
    pub materials: EstimateSection<MaterialCost>,
    pub labor: EstimateSection<LaborCost>,
    pub equipment: EstimateSection<EquipmentCost>,
    pub subtotal: f64,
    /// Markup as a percentage (1 dp)
    pub markup_percentage: f64,
    pub overhead_profit: f64,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedItem>,
}

// ============================================================================
// Material key normalization
// ============================================================================

/// Waste allowance by material category (%)
pub fn waste_factor_pct(category: &str) -> f64 {
    match category {
        "pipe" => 10.0,
        "concrete" => 5.0,
        _ => 0.0,
    }
}

fn normalize_category(material_type: &str) -> String {
    let key = material_type.trim().to_lowercase();
    match key.as_str() {
        "rebar" => "reinforcement".to_string(),
        "gravel" | "rock" => "aggregate".to_string(),
        "hma" | "asphalt_concrete" => "asphalt".to_string(),
        _ => key,
    }
}

/// Digits of a size token such as `8`, `8"`, `8_inch`, `#4` or `4000psi`
fn numeric_size(size: &str) -> Option<&str> {
    let mut token = size.trim().trim_start_matches('#');
    for suffix in ["_inch", "inch", "in", "\"", "_psi", "psi"] {
        if let Some(stripped) = token.strip_suffix(suffix) {
            token = stripped.trim_end();
            break;
        }
    }
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        Some(token)
    } else {
        None
    }
}

/// Item key within a category for a size token.
///
/// Returns `None` when the category has no default and no size was given.
fn item_key(category: &str, size: Option<&str>) -> Option<String> {
    let size = size.map(str::trim).filter(|s| !s.is_empty());
    match (category, size) {
        ("pipe", None) => Some("pvc_c900_8".to_string()),
        ("concrete", None) => Some("4000_psi".to_string()),
        ("reinforcement", None) => Some("rebar_4".to_string()),
        ("aggregate", None) => Some("crushed_rock_34".to_string()),
        ("asphalt", None) => Some("hma_dense".to_string()),
        (_, None) => None,
        (category, Some(size)) => {
            let numeric = numeric_size(size);
            Some(match (category, numeric) {
                ("pipe", Some(n)) => format!("pvc_c900_{}", n),
                ("concrete", Some(n)) => format!("{}_psi", n),
                ("reinforcement", Some(n)) => format!("rebar_{}", n),
                _ => size.to_lowercase(),
            })
        }
    }
}

// ============================================================================
// Estimator
// ============================================================================

/// Prices line items against a rate catalog.
#[derive(Debug, Clone)]
pub struct CostEstimator<'a> {
    catalog: &'a RateCatalog,
    settings: EstimatorSettings,
}

impl<'a> CostEstimator<'a> {
    pub fn new(catalog: &'a RateCatalog) -> Self {
        CostEstimator {
            catalog,
            settings: EstimatorSettings::default(),
        }
    }

    pub fn with_settings(catalog: &'a RateCatalog, settings: EstimatorSettings) -> Self {
        CostEstimator { catalog, settings }
    }

    pub fn catalog(&self) -> &RateCatalog {
        self.catalog
    }

    pub fn settings(&self) -> &EstimatorSettings {
        &self.settings
    }

    fn region_warnings(&self, requested: &str, resolved: &ResolvedRegion<'_>) -> Vec<String> {
        if resolved.fell_back {
            vec![format!(
                "Unknown region '{}'; using {} rates",
                requested, resolved.slug
            )]
        } else {
            Vec::new()
        }
    }

    /// Find a rate in the resolved region, then in the default table.
    ///
    /// Returns the rate and the slug of the table it came from.
    fn lookup<'t, T>(
        &'t self,
        resolved: &ResolvedRegion<'t>,
        get: impl Fn(&'t RegionRateTable) -> Option<&'t T>,
    ) -> Option<(&'t T, &'t str)> {
        if let Some(rate) = get(resolved.table) {
            return Some((rate, resolved.slug));
        }
        let fallback = self.catalog.default_region();
        get(self.catalog.default_table()).map(|rate| (rate, fallback))
    }

    /// Price a material line.
    ///
    /// `size` is normalized per category: pipe `"8"` → `pvc_c900_8`,
    /// concrete `"4000"` → `4000_psi`, reinforcement `"4"` → `rebar_4`. A
    /// full item key is used as given.
    pub fn material_cost(
        &self,
        material_type: &str,
        quantity: f64,
        size: Option<&str>,
        region: &str,
    ) -> CostResult<MaterialCost> {
        self.price_material(material_type, quantity, size, region, &self.catalog.resolve(region))
    }

    fn price_material(
        &self,
        material_type: &str,
        quantity: f64,
        size: Option<&str>,
        region: &str,
        resolved: &ResolvedRegion<'_>,
    ) -> CostResult<MaterialCost> {
        let category = normalize_category(material_type);
        let national = self.catalog.default_table();

        let known_category = resolved.table.materials.contains_key(&category)
            || national.materials.contains_key(&category);
        if !known_category {
            let available: Vec<String> = national.materials.keys().cloned().collect();
            return CostResult::Missing(MissingRate::new(
                format!(
                    "Material type '{}' not found in pricing database. Available: {}",
                    material_type,
                    available.join(", ")
                ),
                available,
            ));
        }

        let item = match item_key(&category, size) {
            Some(item) => item,
            None => {
                let available = self.material_items(resolved, &category);
                return CostResult::Missing(MissingRate::new(
                    format!(
                        "Material type '{}' needs a size. Available: {}",
                        category,
                        available.join(", ")
                    ),
                    available,
                ));
            }
        };

        let Some((rate, source)) = self.lookup(resolved, |t| t.material(&category, &item)) else {
            let available = self.material_items(resolved, &category);
            return CostResult::Missing(MissingRate::new(
                format!(
                    "Material '{}' not found for type '{}'. Available: {}",
                    item,
                    category,
                    available.join(", ")
                ),
                available,
            ));
        };

        let mut warnings = self.region_warnings(region, resolved);
        if source != resolved.slug {
            warn!(
                region = resolved.slug,
                category = %category,
                item = %item,
                "material rate missing, using national"
            );
            warnings.push(format!(
                "No '{}' rate for {}; using {} rate",
                item, resolved.slug, source
            ));
        }

        let waste = waste_factor_pct(&category);
        let total = quantity * rate.cost;

        CostResult::Priced(MaterialCost {
            material_type: category,
            item,
            description: rate.description.clone(),
            quantity,
            unit: rate.unit.clone(),
            unit_cost: rate.cost,
            waste_factor_pct: waste,
            total_cost: round_to(total, 2),
            total_with_waste: round_to(total * (1.0 + waste / 100.0), 2),
            region: region.to_string(),
            resolved_region: source.to_string(),
            warnings,
        })
    }

    /// Item keys for a category across the resolved region and national.
    fn material_items(&self, resolved: &ResolvedRegion<'_>, category: &str) -> Vec<String> {
        let mut keys: Vec<String> = [resolved.table, self.catalog.default_table()]
            .iter()
            .filter_map(|t| t.materials.get(category))
            .flat_map(|items| items.keys().cloned())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Price a labor line at the hourly rate.
    pub fn labor_cost(&self, labor_type: &str, hours: f64, region: &str) -> CostResult<LaborCost> {
        self.price_labor(labor_type, hours, region, &self.catalog.resolve(region))
    }

    fn price_labor(
        &self,
        labor_type: &str,
        hours: f64,
        region: &str,
        resolved: &ResolvedRegion<'_>,
    ) -> CostResult<LaborCost> {
        let key = labor_type.trim().to_lowercase();

        let Some((rate, source)) = self.lookup(resolved, |t| t.labor.get(&key)) else {
            let available: Vec<String> =
                self.catalog.default_table().labor.keys().cloned().collect();
            return CostResult::Missing(MissingRate::new(
                format!(
                    "Labor type '{}' not found. Available: {}",
                    labor_type,
                    available.join(", ")
                ),
                available,
            ));
        };

        let mut warnings = self.region_warnings(region, resolved);
        if source != resolved.slug {
            warn!(region = resolved.slug, labor_type = %key, "labor rate missing, using national");
            warnings.push(format!(
                "No '{}' rate for {}; using {} rate",
                key, resolved.slug, source
            ));
        }

        CostResult::Priced(LaborCost {
            labor_type: labor_type.to_string(),
            title: rate.title.clone(),
            hours,
            hourly_rate: rate.hourly,
            total_cost: round_to(hours * rate.hourly, 2),
            region: region.to_string(),
            resolved_region: source.to_string(),
            warnings,
        })
    }

    /// Price an equipment line at the daily rate.
    pub fn equipment_cost(
        &self,
        equipment_type: &str,
        days: f64,
        region: &str,
    ) -> CostResult<EquipmentCost> {
        self.price_equipment(equipment_type, days, region, &self.catalog.resolve(region))
    }

    fn price_equipment(
        &self,
        equipment_type: &str,
        days: f64,
        region: &str,
        resolved: &ResolvedRegion<'_>,
    ) -> CostResult<EquipmentCost> {
        let key = equipment_type.trim().to_lowercase();

        let Some((rate, source)) = self.lookup(resolved, |t| t.equipment.get(&key)) else {
            let available: Vec<String> =
                self.catalog.default_table().equipment.keys().cloned().collect();
            return CostResult::Missing(MissingRate::new(
                format!(
                    "Equipment '{}' not found. Available: {}",
                    equipment_type,
                    available.join(", ")
                ),
                available,
            ));
        };

        let mut warnings = self.region_warnings(region, resolved);
        if source != resolved.slug {
            warn!(
                region = resolved.slug,
                equipment_type = %key,
                "equipment rate missing, using national"
            );
            warnings.push(format!(
                "No '{}' rate for {}; using {} rate",
                key, resolved.slug, source
            ));
        }

        CostResult::Priced(EquipmentCost {
            equipment_type: equipment_type.to_string(),
            equipment: rate.description.clone(),
            days,
            daily_rate: rate.daily,
            total_cost: round_to(days * rate.daily, 2),
            region: region.to_string(),
            resolved_region: source.to_string(),
            warnings,
        })
    }

    /// Roll line items up into a marked-up estimate.
    ///
    /// Only priced items are accumulated; materials contribute their
    /// waste-adjusted total. Markup is applied once to the combined subtotal.
    /// Unpriced items are listed in `skipped`.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - markup negative or not finite
    pub fn estimate_project(&self, input: &EstimateInput) -> CalcResult<ProjectEstimate> {
        let markup = input.markup.unwrap_or(self.settings.default_markup);
        if !markup.is_finite() || markup < 0.0 {
            return Err(CalcError::invalid_input(
                "markup",
                markup.to_string(),
                "Markup must be a non-negative fraction (0.15 = 15%)",
            ));
        }
        let region = input.region.as_deref().unwrap_or(&self.settings.default_region);
        let resolved = self.catalog.resolve(region);
        debug!(
            region,
            materials = input.materials.len(),
            labor = input.labor.len(),
            equipment = input.equipment.len(),
            "estimating project"
        );

        let mut skipped = Vec::new();
        let mut skip = |kind: LineKind, item_type: &str, reason: &str| {
            warn!(?kind, item_type, reason, "skipping line item");
            skipped.push(SkippedItem {
                kind,
                item_type: item_type.to_string(),
                reason: reason.to_string(),
            });
        };

        let mut materials = Vec::new();
        for item in &input.materials {
            let size = item.size.as_deref();
            match self.price_material(&item.material_type, item.quantity, size, region, &resolved) {
                CostResult::Priced(cost) => materials.push(cost),
                CostResult::Missing(missing) => {
                    skip(LineKind::Material, &item.material_type, &missing.error)
                }
            }
        }

        let mut labor = Vec::new();
        for item in &input.labor {
            match self.price_labor(&item.labor_type, item.hours, region, &resolved) {
                CostResult::Priced(cost) => labor.push(cost),
                CostResult::Missing(missing) => {
                    skip(LineKind::Labor, &item.labor_type, &missing.error)
                }
            }
        }

        let mut equipment = Vec::new();
        for item in &input.equipment {
            match self.price_equipment(&item.equipment_type, item.days, region, &resolved) {
                CostResult::Priced(cost) => equipment.push(cost),
                CostResult::Missing(missing) => {
                    skip(LineKind::Equipment, &item.equipment_type, &missing.error)
                }
            }
        }

        let material_total: f64 = materials.iter().map(|m| m.total_with_waste).sum();
        let labor_total: f64 = labor.iter().map(|l| l.total_cost).sum();
        let equipment_total: f64 = equipment.iter().map(|e| e.total_cost).sum();

        let subtotal = material_total + labor_total + equipment_total;
        let overhead_profit = subtotal * markup;

        Ok(ProjectEstimate {
            region: region.to_string(),
            resolved_region: resolved.slug.to_string(),
            region_label: resolved.table.label.clone(),
            wage_type: resolved.table.wage_type,
            materials: EstimateSection {
                breakdown: materials,
                subtotal: round_to(material_total, 2),
            },
            labor: EstimateSection {
                breakdown: labor,
                subtotal: round_to(labor_total, 2),
            },
            equipment: EstimateSection {
                breakdown: equipment,
                subtotal: round_to(equipment_total, 2),
            },
            subtotal: round_to(subtotal, 2),
            markup_percentage: round_to(markup * 100.0, 1),
            overhead_profit: round_to(overhead_profit, 2),
            total: round_to(subtotal + overhead_profit, 2),
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn estimator() -> CostEstimator<'static> {
        CostEstimator::new(RateCatalog::global())
    }

    #[test]
    fn test_pipe_size_normalization() {
        let est = estimator();
        for size in ["8", "8\"", "8_inch", "pvc_c900_8"] {
            let result = est.material_cost("pipe", 100.0, Some(size), "national");
            let priced = result.priced().unwrap();
            assert_eq!(priced.item, "pvc_c900_8", "size {}", size);
            assert_eq!(priced.unit_cost, 19.0);
        }
    }

    #[test]
    fn test_pipe_waste_factor() {
        let result = estimator().material_cost("pipe", 100.0, None, "national");
        let priced = result.priced().unwrap();
        assert_eq!(priced.total_cost, 1900.0);
        assert_eq!(priced.total_with_waste, 2090.0);
        assert_eq!(priced.waste_factor_pct, 10.0);
    }

    #[test]
    fn test_concrete_material_cost() {
        let result = estimator().material_cost("concrete", 10.0, Some("3000"), "national");
        let priced = result.priced().unwrap();
        assert_eq!(priced.item, "3000_psi");
        assert_eq!(priced.total_cost, 1650.0);
        assert_eq!(priced.total_with_waste, 1732.5);
    }

    #[test]
    fn test_rebar_alias_and_aggregate_default() {
        let est = estimator();
        let rebar = est.material_cost("rebar", 200.0, Some("#5"), "national");
        assert_eq!(rebar.priced().unwrap().item, "rebar_5");
        assert_eq!(rebar.priced().unwrap().waste_factor_pct, 0.0);

        let rock = est.material_cost("aggregate", 20.0, None, "utah");
        assert_eq!(rock.priced().unwrap().item, "crushed_rock_34");
        assert_eq!(rock.priced().unwrap().unit_cost, 16.0);
    }

    #[test]
    fn test_unknown_material_is_error_shaped() {
        let result = estimator().material_cost("unobtainium", 100.0, None, "national");
        assert!(!result.is_priced());
        let error = result.error().unwrap();
        assert!(error.contains("unobtainium"));
        assert!(error.contains("pipe"));

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("error").is_some());
        assert!(json.get("total_cost").is_none());
    }

    #[test]
    fn test_unknown_item_lists_available() {
        let result = estimator().material_cost("pipe", 100.0, Some("96"), "national");
        match result {
            CostResult::Missing(missing) => {
                assert!(missing.available.contains(&"dip_8".to_string()))
            }
            CostResult::Priced(_) => panic!("96\" pipe should not be priced"),
        }
    }

    #[test]
    fn test_regional_key_falls_back_to_national() {
        // Texas has no 4" PVC; national does
        let result = estimator().material_cost("pipe", 10.0, Some("4"), "texas");
        let priced = result.priced().unwrap();
        assert_eq!(priced.unit_cost, 8.5);
        assert_eq!(priced.resolved_region, "national");
        assert_eq!(priced.warnings.len(), 1);
    }

    #[test]
    fn test_labor_cost_by_region() {
        let est = estimator();
        let national = est.labor_cost("operator", 10.0, "national");
        let california = est.labor_cost("Operator", 10.0, "california");
        assert_eq!(national.priced().unwrap().total_cost, 750.0);
        assert_eq!(california.priced().unwrap().hourly_rate, 125.0);
        assert_eq!(california.priced().unwrap().title, "Operating Engineer");
    }

    #[test]
    fn test_labor_falls_back_to_national_key() {
        // Plumber is only in the national and utah tables
        let result = estimator().labor_cost("plumber", 8.0, "texas");
        assert_eq!(result.priced().unwrap().hourly_rate, 68.0);
    }

    #[test]
    fn test_unknown_labor_and_equipment() {
        let est = estimator();
        assert!(est.labor_cost("astronaut", 8.0, "national").error().is_some());
        assert!(est.equipment_cost("crane_1000t", 2.0, "national").error().is_some());
    }

    #[test]
    fn test_equipment_cost() {
        let result = estimator().equipment_cost("excavator", 5.0, "northeast");
        let priced = result.priced().unwrap();
        assert_eq!(priced.daily_rate, 530.0);
        assert_eq!(priced.total_cost, 2650.0);
        assert_eq!(priced.equipment, "Excavator (generic)");
    }

    #[test]
    fn test_unknown_region_warns_in_result() {
        let result = estimator().equipment_cost("excavator", 1.0, "doesnotexist");
        let priced = result.priced().unwrap();
        assert_eq!(priced.resolved_region, "national");
        assert_eq!(priced.region, "doesnotexist");
        assert!(!priced.warnings.is_empty());
    }

    fn sample_input(markup: f64) -> EstimateInput {
        EstimateInput {
            materials: vec![MaterialItem::new("pipe", 100.0, Some("8"))],
            labor: vec![LaborItem::new("operator", 10.0)],
            equipment: vec![EquipmentItem::new("excavator", 2.0)],
            markup: Some(markup),
            region: Some("national".to_string()),
        }
    }

    #[test]
    fn test_estimate_totals() {
        let estimate = estimator().estimate_project(&sample_input(0.15)).unwrap();
        // 2090 + 750 + 900
        assert_eq!(estimate.subtotal, 3740.0);
        assert_eq!(estimate.overhead_profit, 561.0);
        assert_eq!(estimate.total, 4301.0);
        assert_eq!(estimate.markup_percentage, 15.0);
        assert_eq!(estimate.region_label, "National Average (Open Shop)");
        assert!(estimate.skipped.is_empty());
    }

    #[test]
    fn test_estimate_total_increases_with_markup() {
        let est = estimator();
        let low = est.estimate_project(&sample_input(0.10)).unwrap();
        let high = est.estimate_project(&sample_input(0.20)).unwrap();
        assert!(high.total > low.total);
    }

    #[test]
    fn test_estimate_skips_unknown_items() {
        let mut input = sample_input(0.15);
        input.materials.push(MaterialItem::new("unobtainium", 5.0, None));
        input.labor.push(LaborItem::new("wizard", 3.0));
        let estimate = estimator().estimate_project(&input).unwrap();
        assert_eq!(estimate.subtotal, 3740.0);
        assert_eq!(estimate.skipped.len(), 2);
        assert_eq!(estimate.skipped[0].kind, LineKind::Material);
        assert_eq!(estimate.skipped[1].item_type, "wizard");
    }

    #[test]
    fn test_estimate_uses_settings_defaults() {
        let settings = EstimatorSettings {
            default_region: "utah".to_string(),
            default_markup: 0.0,
            ..Default::default()
        };
        let est = CostEstimator::with_settings(RateCatalog::global(), settings);
        let input = EstimateInput {
            labor: vec![LaborItem::new("laborer", 10.0)],
            ..Default::default()
        };
        let estimate = est.estimate_project(&input).unwrap();
        assert_eq!(estimate.resolved_region, "utah");
        assert_eq!(estimate.total, 320.0);
    }

    #[test]
    fn test_negative_markup_rejected() {
        assert!(estimator().estimate_project(&sample_input(-0.5)).is_err());
    }

    #[test]
    fn test_overridden_region_is_used() {
        let mut catalog = RateCatalog::builtin();
        let mut table = RegionRateTable::new("Test Region", WageType::PrevailingWage);
        table.add_labor("operator", 100.0, 150.0, "Operator");
        catalog.replace_region("test", table);

        let est = CostEstimator::new(&catalog);
        let result = est.labor_cost("operator", 2.0, "test");
        assert_eq!(result.priced().unwrap().total_cost, 200.0);
        // Keys absent from the override still resolve through national
        assert_eq!(est.labor_cost("laborer", 1.0, "test").priced().unwrap().hourly_rate, 38.0);
    }

    /// Counts WARN events emitted from the rates module
    struct RegionWarnings(Arc<AtomicUsize>);

    impl tracing::Subscriber for RegionWarnings {
        fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
            true
        }
        fn new_span(&self, _: &tracing::span::Attributes<'_>) -> tracing::span::Id {
            tracing::span::Id::from_u64(1)
        }
        fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}
        fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}
        fn event(&self, event: &tracing::Event<'_>) {
            let meta = event.metadata();
            if *meta.level() == tracing::Level::WARN && meta.target() == "civil_core::rates" {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
        fn enter(&self, _: &tracing::span::Id) {}
        fn exit(&self, _: &tracing::span::Id) {}
    }

    #[test]
    fn test_unknown_region_resolved_once_per_estimate() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut input = sample_input(0.15);
        input.region = Some("atlantis".to_string());

        let estimate = tracing::subscriber::with_default(RegionWarnings(count.clone()), || {
            estimator().estimate_project(&input).unwrap()
        });

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(estimate.resolved_region, "national");
        assert!(estimate.labor.breakdown[0].warnings[0].contains("atlantis"));
    }
}
