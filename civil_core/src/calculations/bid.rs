//! # Bid Math
//!
//! Markup, unit price building, time & materials change orders, production
//! rates and crew day costs.
//!
//! Overhead is applied to direct cost, and profit to the overhead-loaded
//! cost, so the layers compound:
//!
//! ```text
//! bid = direct × (1 + OH%) × (1 + P%)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use civil_core::calculations::bid::{markup_bid_price, MarkupInput};
//!
//! let result = markup_bid_price(&MarkupInput::new(100_000.0)).unwrap();
//! assert_eq!(result.bid_price, 123_200.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;
use crate::units::round_to;

fn default_overhead_pct() -> f64 {
    12.0
}

fn default_profit_pct() -> f64 {
    10.0
}

fn default_one() -> f64 {
    1.0
}

fn default_unit() -> String {
    "LF".to_string()
}

/// Fraction for a percentage
fn pct(value: f64) -> f64 {
    value / 100.0
}

// ============================================================================
// Markup
// ============================================================================

/// Input for [`markup_bid_price`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupInput {
    /// Direct cost (materials + labor + equipment)
    pub direct_cost: f64,
    #[serde(default = "default_overhead_pct")]
    pub overhead_pct: f64,
    #[serde(default = "default_profit_pct")]
    pub profit_pct: f64,
}

impl MarkupInput {
    pub fn new(direct_cost: f64) -> Self {
        Self {
            direct_cost,
            overhead_pct: default_overhead_pct(),
            profit_pct: default_profit_pct(),
        }
    }

    pub fn with_markup(mut self, overhead_pct: f64, profit_pct: f64) -> Self {
        self.overhead_pct = overhead_pct;
        self.profit_pct = profit_pct;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupResult {
    pub direct_cost: f64,
    pub overhead_pct: f64,
    pub overhead: f64,
    pub overhead_loaded_cost: f64,
    pub profit_pct: f64,
    pub profit: f64,
    pub bid_price: f64,
    /// (bid / direct − 1) × 100, 0 when direct ≤ 0
    pub total_markup_on_cost_pct: f64,
    /// profit / bid × 100, 0 when bid ≤ 0
    pub margin_on_bid_pct: f64,
}

/// Bid price from direct cost with overhead and profit.
pub fn markup_bid_price(input: &MarkupInput) -> CalcResult<MarkupResult> {
    let overhead = input.direct_cost * pct(input.overhead_pct);
    let loaded = input.direct_cost + overhead;
    let profit = loaded * pct(input.profit_pct);
    let bid = loaded + profit;

    let markup_pct = if input.direct_cost > 0.0 {
        (bid / input.direct_cost - 1.0) * 100.0
    } else {
        0.0
    };
    let margin_pct = if bid > 0.0 { profit / bid * 100.0 } else { 0.0 };

    Ok(MarkupResult {
        direct_cost: round_to(input.direct_cost, 2),
        overhead_pct: input.overhead_pct,
        overhead: round_to(overhead, 2),
        overhead_loaded_cost: round_to(loaded, 2),
        profit_pct: input.profit_pct,
        profit: round_to(profit, 2),
        bid_price: round_to(bid, 2),
        total_markup_on_cost_pct: round_to(markup_pct, 2),
        margin_on_bid_pct: round_to(margin_pct, 2),
    })
}

// ============================================================================
// Unit Price
// ============================================================================

/// Input for [`unit_price`]. All cost components are per unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitPriceInput {
    pub material_per_unit: f64,
    pub labor_per_unit: f64,
    pub equipment_per_unit: f64,
    #[serde(default)]
    pub subcontractor_per_unit: f64,
    #[serde(default = "default_overhead_pct")]
    pub overhead_pct: f64,
    #[serde(default = "default_profit_pct")]
    pub profit_pct: f64,
    /// Quantity for the extended total
    #[serde(default = "default_one")]
    pub quantity: f64,
    /// Unit of measure (LF, CY, EA, ...)
    #[serde(default = "default_unit")]
    pub unit: String,
}

impl UnitPriceInput {
    pub fn new(material_per_unit: f64, labor_per_unit: f64, equipment_per_unit: f64) -> Self {
        Self {
            material_per_unit,
            labor_per_unit,
            equipment_per_unit,
            subcontractor_per_unit: 0.0,
            overhead_pct: default_overhead_pct(),
            profit_pct: default_profit_pct(),
            quantity: 1.0,
            unit: default_unit(),
        }
    }

    pub fn with_quantity(mut self, quantity: f64, unit: impl Into<String>) -> Self {
        self.quantity = quantity;
        self.unit = unit.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitPriceResult {
    pub unit: String,
    pub material_per_unit: f64,
    pub labor_per_unit: f64,
    pub equipment_per_unit: f64,
    pub subcontractor_per_unit: f64,
    pub direct_cost_per_unit: f64,
    pub overhead_pct: f64,
    pub overhead_per_unit: f64,
    pub profit_pct: f64,
    pub profit_per_unit: f64,
    pub unit_bid_price: f64,
    pub quantity: f64,
    pub extended_total: f64,
}

/// Unit bid price from cost components, extended by quantity.
pub fn unit_price(input: &UnitPriceInput) -> CalcResult<UnitPriceResult> {
    let direct = input.material_per_unit
        + input.labor_per_unit
        + input.equipment_per_unit
        + input.subcontractor_per_unit;
    let overhead = direct * pct(input.overhead_pct);
    let loaded = direct + overhead;
    let profit = loaded * pct(input.profit_pct);
    let unit_bid = loaded + profit;

    Ok(UnitPriceResult {
        unit: input.unit.clone(),
        material_per_unit: round_to(input.material_per_unit, 4),
        labor_per_unit: round_to(input.labor_per_unit, 4),
        equipment_per_unit: round_to(input.equipment_per_unit, 4),
        subcontractor_per_unit: round_to(input.subcontractor_per_unit, 4),
        direct_cost_per_unit: round_to(direct, 4),
        overhead_pct: input.overhead_pct,
        overhead_per_unit: round_to(overhead, 4),
        profit_pct: input.profit_pct,
        profit_per_unit: round_to(profit, 4),
        unit_bid_price: round_to(unit_bid, 4),
        quantity: input.quantity,
        extended_total: round_to(unit_bid * input.quantity, 2),
    })
}

// ============================================================================
// Change Order (T&M)
// ============================================================================

/// One hourly line on a T&M ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyItem {
    pub description: String,
    pub hours: f64,
    pub rate: f64,
}

impl HourlyItem {
    pub fn new(description: impl Into<String>, hours: f64, rate: f64) -> Self {
        Self {
            description: description.into(),
            hours,
            rate,
        }
    }
}

/// An [`HourlyItem`] with its extended cost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostedHourlyItem {
    pub description: String,
    pub hours: f64,
    pub rate: f64,
    pub cost: f64,
}

fn cost_hourly(items: &[HourlyItem]) -> (Vec<CostedHourlyItem>, f64) {
    let costed = items
        .iter()
        .map(|item| CostedHourlyItem {
            description: item.description.clone(),
            hours: item.hours,
            rate: item.rate,
            cost: round_to(item.hours * item.rate, 2),
        })
        .collect();
    let total = items.iter().map(|item| item.hours * item.rate).sum();
    (costed, total)
}

fn default_op_pct() -> f64 {
    15.0
}

/// Input for [`change_order_tm`].
///
/// ## JSON Example
///
/// ```json
/// {
///   "labor_items": [{"description": "Operator", "hours": 8, "rate": 95}],
///   "equipment_items": [{"description": "Excavator", "hours": 8, "rate": 120}],
///   "material_cost": 500
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeOrderInput {
    #[serde(default)]
    pub labor_items: Vec<HourlyItem>,
    #[serde(default)]
    pub equipment_items: Vec<HourlyItem>,
    #[serde(default)]
    pub material_cost: f64,
    /// Combined overhead & profit (%)
    #[serde(default = "default_op_pct")]
    pub overhead_profit_pct: f64,
    /// Bond premium (%)
    #[serde(default = "default_one")]
    pub bond_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeOrderResult {
    pub labor_items: Vec<CostedHourlyItem>,
    pub labor_total: f64,
    pub equipment_items: Vec<CostedHourlyItem>,
    pub equipment_total: f64,
    pub material_cost: f64,
    pub subtotal: f64,
    pub overhead_profit_pct: f64,
    pub overhead_profit: f64,
    pub bond_pct: f64,
    pub bond: f64,
    pub change_order_total: f64,
}

/// Time & materials change order value.
///
/// O&P is applied to the subtotal; bond to the O&P-loaded subtotal.
pub fn change_order_tm(input: &ChangeOrderInput) -> CalcResult<ChangeOrderResult> {
    let (labor_items, labor_total) = cost_hourly(&input.labor_items);
    let (equipment_items, equipment_total) = cost_hourly(&input.equipment_items);

    let subtotal = labor_total + equipment_total + input.material_cost;
    let op = subtotal * pct(input.overhead_profit_pct);
    let bond = (subtotal + op) * pct(input.bond_pct);

    Ok(ChangeOrderResult {
        labor_items,
        labor_total: round_to(labor_total, 2),
        equipment_items,
        equipment_total: round_to(equipment_total, 2),
        material_cost: round_to(input.material_cost, 2),
        subtotal: round_to(subtotal, 2),
        overhead_profit_pct: input.overhead_profit_pct,
        overhead_profit: round_to(op, 2),
        bond_pct: input.bond_pct,
        bond: round_to(bond, 2),
        change_order_total: round_to(subtotal + op + bond, 2),
    })
}

// ============================================================================
// Production Rate
// ============================================================================

fn default_hours_per_day() -> f64 {
    10.0
}

/// Input for [`production_rate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionInput {
    /// Units completed per crew day
    pub production_rate_per_day: f64,
    pub total_quantity: f64,
    #[serde(deserialize_with = "crate::units::whole_u32")]
    pub crew_size: u32,
    /// All-in hourly rate per worker, burden included
    pub crew_rate_per_hr: f64,
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: f64,
    #[serde(default)]
    pub equipment_cost_per_day: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

impl ProductionInput {
    pub fn new(
        production_rate_per_day: f64,
        total_quantity: f64,
        crew_size: u32,
        crew_rate_per_hr: f64,
    ) -> Self {
        Self {
            production_rate_per_day,
            total_quantity,
            crew_size,
            crew_rate_per_hr,
            hours_per_day: default_hours_per_day(),
            equipment_cost_per_day: 0.0,
            unit: default_unit(),
        }
    }

    pub fn with_equipment(mut self, equipment_cost_per_day: f64) -> Self {
        self.equipment_cost_per_day = equipment_cost_per_day;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionResult {
    pub unit: String,
    pub production_rate_per_day: f64,
    pub total_quantity: f64,
    pub duration_days: f64,
    pub crew_size: u32,
    pub crew_rate_per_hr: f64,
    pub hours_per_day: f64,
    pub crew_cost_per_day: f64,
    pub equipment_cost_per_day: f64,
    pub total_day_cost: f64,
    pub cost_per_unit: f64,
    pub total_direct_cost: f64,
}

/// Duration, cost per unit and total direct cost from a production rate.
///
/// A non-positive rate yields zero duration and zero cost per unit.
pub fn production_rate(input: &ProductionInput) -> CalcResult<ProductionResult> {
    let rate = input.production_rate_per_day;
    let crew_cost = f64::from(input.crew_size) * input.crew_rate_per_hr * input.hours_per_day;
    let day_cost = crew_cost + input.equipment_cost_per_day;

    let (days, cost_per_unit) = if rate > 0.0 {
        (input.total_quantity / rate, day_cost / rate)
    } else {
        (0.0, 0.0)
    };

    Ok(ProductionResult {
        unit: input.unit.clone(),
        production_rate_per_day: rate,
        total_quantity: input.total_quantity,
        duration_days: round_to(days, 1),
        crew_size: input.crew_size,
        crew_rate_per_hr: input.crew_rate_per_hr,
        hours_per_day: input.hours_per_day,
        crew_cost_per_day: round_to(crew_cost, 2),
        equipment_cost_per_day: round_to(input.equipment_cost_per_day, 2),
        total_day_cost: round_to(day_cost, 2),
        cost_per_unit: round_to(cost_per_unit, 4),
        total_direct_cost: round_to(cost_per_unit * input.total_quantity, 2),
    })
}

// ============================================================================
// Crew Day Cost
// ============================================================================

/// One crew member's hours for the day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewLaborItem {
    pub role: String,
    pub hours: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostedCrewLaborItem {
    pub role: String,
    pub hours: f64,
    pub rate: f64,
    pub cost: f64,
}

/// A piece of equipment at its daily rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewEquipmentItem {
    pub name: String,
    pub daily_rate: f64,
}

fn default_small_tools() -> f64 {
    150.0
}

fn default_burden_pct() -> f64 {
    25.0
}

/// Input for [`crew_day_cost`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewDayInput {
    #[serde(default)]
    pub labor_items: Vec<CrewLaborItem>,
    #[serde(default)]
    pub equipment_items: Vec<CrewEquipmentItem>,
    /// Daily allowance for small tools and consumables
    #[serde(default = "default_small_tools")]
    pub small_tools_consumables: f64,
    #[serde(default = "default_burden_pct")]
    pub overhead_burden_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewDayResult {
    pub labor_items: Vec<CostedCrewLaborItem>,
    pub labor_total: f64,
    pub equipment_items: Vec<CrewEquipmentItem>,
    pub equipment_total: f64,
    pub small_tools_consumables: f64,
    pub subtotal: f64,
    pub overhead_burden_pct: f64,
    pub overhead: f64,
    pub total_day_cost: f64,
}

/// Daily crew cost: labor, equipment, small tools, then overhead burden once.
pub fn crew_day_cost(input: &CrewDayInput) -> CalcResult<CrewDayResult> {
    let labor_items: Vec<CostedCrewLaborItem> = input
        .labor_items
        .iter()
        .map(|item| CostedCrewLaborItem {
            role: item.role.clone(),
            hours: item.hours,
            rate: item.rate,
            cost: round_to(item.hours * item.rate, 2),
        })
        .collect();
    let labor_total: f64 = input.labor_items.iter().map(|i| i.hours * i.rate).sum();
    let equipment_total: f64 = input.equipment_items.iter().map(|i| i.daily_rate).sum();

    let subtotal = labor_total + equipment_total + input.small_tools_consumables;
    let overhead = subtotal * pct(input.overhead_burden_pct);

    Ok(CrewDayResult {
        labor_items,
        labor_total: round_to(labor_total, 2),
        equipment_items: input.equipment_items.clone(),
        equipment_total: round_to(equipment_total, 2),
        small_tools_consumables: round_to(input.small_tools_consumables, 2),
        subtotal: round_to(subtotal, 2),
        overhead_burden_pct: input.overhead_burden_pct,
        overhead: round_to(overhead, 2),
        total_day_cost: round_to(subtotal + overhead, 2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markup() {
        // 100k × 1.12 × 1.10
        let result = markup_bid_price(&MarkupInput::new(100_000.0)).unwrap();
        assert!((result.bid_price - 123_200.0).abs() < 1.0);
        assert_eq!(result.overhead, 12_000.0);
        assert_eq!(result.profit, 11_200.0);
    }

    #[test]
    fn test_zero_markup() {
        let result = markup_bid_price(&MarkupInput::new(50_000.0).with_markup(0.0, 0.0)).unwrap();
        assert_eq!(result.bid_price, 50_000.0);
        assert_eq!(result.total_markup_on_cost_pct, 0.0);
    }

    #[test]
    fn test_markup_pct_correct() {
        let input = MarkupInput::new(100_000.0).with_markup(10.0, 10.0);
        let result = markup_bid_price(&input).unwrap();
        // 1.1 × 1.1 = 1.21 → 21%
        assert!((result.total_markup_on_cost_pct - 21.0).abs() < 0.01);
    }

    #[test]
    fn test_zero_direct_cost_has_zero_percentages() {
        let result = markup_bid_price(&MarkupInput::new(0.0)).unwrap();
        assert_eq!(result.total_markup_on_cost_pct, 0.0);
        assert_eq!(result.margin_on_bid_pct, 0.0);
    }

    #[test]
    fn test_margin_less_than_markup() {
        let result = markup_bid_price(&MarkupInput::new(100_000.0)).unwrap();
        assert!(result.margin_on_bid_pct < result.profit_pct);
    }

    #[test]
    fn test_basic_unit_price() {
        let result = unit_price(&UnitPriceInput::new(10.0, 20.0, 15.0)).unwrap();
        assert_eq!(result.direct_cost_per_unit, 45.0);
        assert!(result.unit_bid_price > 45.0);
        assert_eq!(result.unit, "LF");
    }

    #[test]
    fn test_extended_total() {
        let input = UnitPriceInput::new(10.0, 20.0, 15.0).with_quantity(1000.0, "LF");
        let result = unit_price(&input).unwrap();
        assert!((result.extended_total - result.unit_bid_price * 1000.0).abs() < 0.05);
    }

    #[test]
    fn test_change_order_totals() {
        let input = ChangeOrderInput {
            labor_items: vec![HourlyItem::new("Operator", 8.0, 95.0)],
            equipment_items: vec![HourlyItem::new("Excavator", 8.0, 120.0)],
            material_cost: 500.0,
            overhead_profit_pct: 15.0,
            bond_pct: 1.0,
        };
        let result = change_order_tm(&input).unwrap();
        assert_eq!(result.labor_total, 760.0);
        assert_eq!(result.equipment_total, 960.0);
        assert_eq!(result.subtotal, 2220.0);
        assert_eq!(result.overhead_profit, 333.0);
        assert_eq!(result.bond, 25.53);
        assert_eq!(result.change_order_total, 2578.53);
        assert_eq!(result.labor_items[0].cost, 760.0);
    }

    #[test]
    fn test_change_order_from_json_defaults() {
        let input: ChangeOrderInput = serde_json::from_str(r#"{"material_cost": 1000}"#).unwrap();
        let result = change_order_tm(&input).unwrap();
        // 1000 × 1.15 × 1.01
        assert_eq!(result.change_order_total, 1161.5);
    }

    #[test]
    fn test_production_duration() {
        let result = production_rate(&ProductionInput::new(200.0, 1000.0, 4, 50.0)).unwrap();
        assert_eq!(result.duration_days, 5.0);
        assert_eq!(result.crew_cost_per_day, 2000.0);
        assert_eq!(result.cost_per_unit, 10.0);
        assert_eq!(result.total_direct_cost, 10_000.0);
    }

    #[test]
    fn test_production_with_equipment() {
        let base = production_rate(&ProductionInput::new(200.0, 1000.0, 4, 50.0)).unwrap();
        let input = ProductionInput::new(200.0, 1000.0, 4, 50.0).with_equipment(800.0);
        let equip = production_rate(&input).unwrap();
        assert!(equip.cost_per_unit > base.cost_per_unit);
    }

    #[test]
    fn test_zero_production_rate() {
        let result = production_rate(&ProductionInput::new(0.0, 1000.0, 4, 50.0)).unwrap();
        assert_eq!(result.duration_days, 0.0);
        assert_eq!(result.cost_per_unit, 0.0);
        assert_eq!(result.total_direct_cost, 0.0);
    }

    #[test]
    fn test_crew_day_cost() {
        let input = CrewDayInput {
            labor_items: vec![
                CrewLaborItem {
                    role: "Operator".into(),
                    hours: 10.0,
                    rate: 75.0,
                },
                CrewLaborItem {
                    role: "Laborer".into(),
                    hours: 10.0,
                    rate: 38.0,
                },
            ],
            equipment_items: vec![CrewEquipmentItem {
                name: "Excavator".into(),
                daily_rate: 450.0,
            }],
            small_tools_consumables: 150.0,
            overhead_burden_pct: 25.0,
        };
        let result = crew_day_cost(&input).unwrap();
        assert_eq!(result.labor_total, 1130.0);
        assert_eq!(result.subtotal, 1730.0);
        assert_eq!(result.overhead, 432.5);
        assert_eq!(result.total_day_cost, 2162.5);
    }
}
