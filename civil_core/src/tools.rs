//! # Tool Registry
//!
//! Function-calling schemas for every calculator, and a dispatcher that runs
//! a tool by name with JSON arguments.
//!
//! ## Example
//!
//! ```rust
//! use civil_core::rates::RateCatalog;
//! use civil_core::tools::{all_tools, execute};
//! use serde_json::json;
//!
//! assert!(all_tools().len() > 20);
//!
//! let result = execute(
//!     RateCatalog::global(),
//!     "pipe_flow_full",
//!     json!({"diameter_in": 12, "slope": 0.005}),
//! ).unwrap();
//! assert!(result["flow_cfs"].as_f64().unwrap() > 1.5);
//! ```

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::calculations::{bid, earthwork, hydraulics, safety, schedule};
use crate::errors::{CalcError, CalcResult};
use crate::estimating::{CostEstimator, EstimateInput};
use crate::rates::RateCatalog;
use crate::settings::EstimatorSettings;
use crate::units;

/// A callable tool: name, description and JSON-schema parameters.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

impl ToolDefinition {
    /// OpenAI function-calling shape: `{"type": "function", "function": {...}}`
    pub fn to_function(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

fn tool(
    name: &'static str,
    description: &'static str,
    properties: Value,
    required: &[&str],
) -> ToolDefinition {
    ToolDefinition {
        name,
        description,
        parameters: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

fn number(description: &str) -> Value {
    json!({"type": "number", "description": description})
}

fn string(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn region_param() -> Value {
    string("Region key, e.g. national, utah, texas, california (default: national)")
}

static TOOLS: Lazy<Vec<ToolDefinition>> = Lazy::new(|| {
    vec![
        // Estimating
        tool(
            "calculate_material_cost",
            "Calculate material cost for construction. Use for pipe, concrete, rebar, aggregate, asphalt. Returns unit cost, total, and waste factor.",
            json!({
                "material_type": string("pipe, concrete, reinforcement (rebar), aggregate, or asphalt"),
                "quantity": number("Quantity needed"),
                "size": string("Size or item key: e.g. '8' for 8-inch pipe, '3000' or '3000_psi' for concrete, 'dip_8'"),
                "region": region_param(),
            }),
            &["material_type", "quantity"],
        ),
        tool(
            "calculate_labor_cost",
            "Calculate labor cost. Use for operator, laborer, foreman, pipe_layer, electrician, ironworker.",
            json!({
                "labor_type": string("operator, laborer, foreman, superintendent, pipe_layer, grade_checker, traffic_control, ironworker, electrician"),
                "hours": number("Number of hours"),
                "region": region_param(),
            }),
            &["labor_type", "hours"],
        ),
        tool(
            "calculate_equipment_cost",
            "Calculate equipment rental cost. Use for excavator, auger, compactor, dozer_d6, dump_truck.",
            json!({
                "equipment_type": string("excavator, excavator_20t, auger, compactor, dozer_d6, dump_truck, ..."),
                "days": number("Number of rental days"),
                "region": region_param(),
            }),
            &["equipment_type", "days"],
        ),
        tool(
            "estimate_project_cost",
            "Full project cost estimate with materials, labor, equipment, and markup.",
            json!({
                "materials": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"type": {"type": "string"}, "quantity": {"type": "number"}, "size": {"type": "string"}}},
                    "description": "List of {type, quantity, size}",
                },
                "labor": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"type": {"type": "string"}, "hours": {"type": "number"}}},
                    "description": "List of {type, hours}",
                },
                "equipment": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"type": {"type": "string"}, "days": {"type": "number"}}},
                    "description": "Optional list of {type, days}",
                },
                "markup": number("Markup as decimal, e.g. 0.15 for 15%"),
                "region": region_param(),
            }),
            &["materials", "labor"],
        ),
        tool(
            "get_regions",
            "List available rate regions with label, wage type, and description.",
            json!({}),
            &[],
        ),
        tool(
            "get_rates",
            "Return the full labor, material, and equipment rate table for a region. Unknown regions return national.",
            json!({"region": region_param()}),
            &[],
        ),
        // Schedule
        tool(
            "build_schedule",
            "Build a construction schedule with phases and dates.",
            json!({
                "project_name": {"type": "string"},
                "start_date": string("ISO date YYYY-MM-DD"),
                "duration_days": {"type": "number"},
                "phases": {"type": "array", "items": {"type": "string"}, "description": "Phase names"},
            }),
            &["project_name", "duration_days"],
        ),
        // Units
        tool(
            "convert_units",
            "Convert a value between units in one category: volume, area, weight, pressure, length, flow, earthwork.",
            json!({
                "value": number("Value to convert"),
                "from_unit": string("Source unit key, e.g. cy, sf, psi, gpm, bcy"),
                "to_unit": string("Target unit key"),
                "category": string("volume, area, weight, pressure, length, flow, or earthwork"),
            }),
            &["value", "from_unit", "to_unit", "category"],
        ),
        tool(
            "bulk_convert",
            "Convert a value to every unit in its category.",
            json!({
                "value": number("Value to convert"),
                "from_unit": string("Source unit key"),
                "category": string("volume, area, weight, pressure, length, flow, or earthwork"),
            }),
            &["value", "from_unit", "category"],
        ),
        tool(
            "available_units",
            "List unit keys available in a conversion category.",
            json!({"category": string("volume, area, weight, pressure, length, flow, or earthwork")}),
            &["category"],
        ),
        // Hydraulics
        tool(
            "pipe_flow_full",
            "Full-pipe flow capacity and velocity by Manning's equation.",
            json!({
                "diameter_in": number("Pipe inside diameter in inches"),
                "slope": number("Pipe slope in ft/ft (0.005 = 0.5%)"),
                "mannings_n": number("Manning's n (default 0.013)"),
                "pipe_material": string("Pipe material for an n lookup: pvc, hdpe, rcp, dip, cmp, vcp, cast_iron"),
            }),
            &["diameter_in", "slope"],
        ),
        tool(
            "pipe_flow_partial",
            "Partial-depth pipe flow with self-cleaning velocity checks (2.0 and 2.5 ft/s).",
            json!({
                "diameter_in": number("Pipe inside diameter in inches"),
                "slope": number("Pipe slope in ft/ft"),
                "depth_ratio": number("Flow depth / diameter, 0.01 to 1.0 (default 0.8)"),
                "mannings_n": number("Manning's n (default 0.013)"),
                "pipe_material": string("Pipe material for an n lookup"),
            }),
            &["diameter_in", "slope"],
        ),
        tool(
            "minimum_slope",
            "Minimum pipe slope to reach a self-cleaning velocity (ASCE MOP 36 / 10 States Standards).",
            json!({
                "diameter_in": number("Pipe inside diameter in inches"),
                "target_velocity_fps": number("Target velocity in ft/s (default 2.5)"),
                "mannings_n": number("Manning's n (default 0.011)"),
                "pipe_material": string("Pipe material for an n lookup"),
            }),
            &["diameter_in"],
        ),
        tool(
            "flow_to_slope",
            "Slope required to carry a target flow.",
            json!({
                "diameter_in": number("Pipe inside diameter in inches"),
                "target_flow_gpm": number("Design flow in gpm"),
                "mannings_n": number("Manning's n (default 0.013)"),
                "pipe_material": string("Pipe material for an n lookup"),
                "depth_ratio": number("Flow depth / diameter (default 1.0, full)"),
            }),
            &["diameter_in", "target_flow_gpm"],
        ),
        tool(
            "mannings_n",
            "Typical Manning's roughness coefficient for a pipe material.",
            json!({"material": string("concrete, rcp, pvc, hdpe, ductile_iron, dip, corrugated_metal, cmp, vitrified_clay, vcp, cast_iron")}),
            &["material"],
        ),
        // Earthwork
        tool(
            "trench_volume",
            "Trench excavation, bedding, backfill, and spoil haul quantities.",
            json!({
                "length_ft": number("Trench length in LF"),
                "width_ft": number("Trench bottom width in ft"),
                "depth_ft": number("Trench depth in ft"),
                "pipe_od_in": number("Pipe outside diameter in inches (default 0)"),
                "bedding_depth_in": number("Bedding depth in inches (default 6)"),
                "swell_pct": number("Soil swell percentage (default 25)"),
                "import_backfill": {"type": "boolean", "description": "Import backfill and haul all native spoil (default true)"},
            }),
            &["length_ft", "width_ft", "depth_ft"],
        ),
        tool(
            "thrust_block",
            "Thrust force at a pressure pipe fitting and the concrete block bearing area to resist it.",
            json!({
                "pipe_diameter_in": number("Pipe inside diameter in inches"),
                "test_pressure_psi": number("Design/test pressure in psi"),
                "fitting_type": string("'90', '45', '22.5', '11.25', 'tee', or 'dead_end' (default '90')"),
                "soil_bearing_psf": number("Allowable soil bearing in psf (default 2000)"),
                "safety_factor": number("Safety factor on bearing area (default 1.5)"),
            }),
            &["pipe_diameter_in", "test_pressure_psi"],
        ),
        tool(
            "asphalt_tonnage",
            "HMA tonnage and material cost for paving or trench patch.",
            json!({
                "area_sf": number("Paving area in sf"),
                "thickness_in": number("Compacted thickness in inches"),
                "density_lbcf": number("Mix density in lb/cf (default 145)"),
                "waste_pct": number("Waste percentage (default 5)"),
                "price_per_ton": number("Material price per ton (default 90)"),
            }),
            &["area_sf", "thickness_in"],
        ),
        tool(
            "concrete_volume",
            "Concrete volume and ready-mix cost for a slab, wall, or cylinder (manhole, vault).",
            json!({
                "shape": string("slab, wall, cylinder, manhole, or vault"),
                "waste_pct": number("Waste percentage (default 5)"),
                "length_ft": number("Slab or wall length in ft"),
                "width_ft": number("Slab width in ft"),
                "height_ft": number("Wall or cylinder height in ft"),
                "thickness_in": number("Slab (default 6) or wall (default 12) thickness in inches"),
                "od_ft": number("Cylinder outside diameter in ft"),
                "id_ft": number("Cylinder inside diameter in ft (default 0, solid)"),
                "psi": {"type": "integer", "description": "Strength class: 3000, 4000, or 5000 (default 4000)"},
            }),
            &["shape"],
        ),
        // Bid math
        tool(
            "markup_bid_price",
            "Bid price from direct cost with overhead on cost and profit on overhead-loaded cost.",
            json!({
                "direct_cost": number("Direct cost (materials + labor + equipment)"),
                "overhead_pct": number("Overhead percentage (default 12)"),
                "profit_pct": number("Profit percentage (default 10)"),
            }),
            &["direct_cost"],
        ),
        tool(
            "unit_price",
            "Build a unit bid price from per-unit cost components.",
            json!({
                "material_per_unit": number("Material cost per unit"),
                "labor_per_unit": number("Labor cost per unit"),
                "equipment_per_unit": number("Equipment cost per unit"),
                "subcontractor_per_unit": number("Subcontractor cost per unit (default 0)"),
                "overhead_pct": number("Overhead percentage (default 12)"),
                "profit_pct": number("Profit percentage (default 10)"),
                "quantity": number("Quantity for the extended total (default 1)"),
                "unit": string("Unit of measure (default LF)"),
            }),
            &["material_per_unit", "labor_per_unit", "equipment_per_unit"],
        ),
        tool(
            "change_order_tm",
            "Time & materials change order value with O&P and bond.",
            json!({
                "labor_items": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"description": {"type": "string"}, "hours": {"type": "number"}, "rate": {"type": "number"}}},
                    "description": "List of {description, hours, rate}",
                },
                "equipment_items": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"description": {"type": "string"}, "hours": {"type": "number"}, "rate": {"type": "number"}}},
                    "description": "List of {description, hours, rate}",
                },
                "material_cost": number("Direct material cost (default 0)"),
                "overhead_profit_pct": number("Combined O&P percentage (default 15)"),
                "bond_pct": number("Bond premium percentage (default 1)"),
            }),
            &["labor_items", "equipment_items"],
        ),
        tool(
            "production_rate",
            "Duration, cost per unit, and total direct cost from a crew production rate.",
            json!({
                "production_rate_per_day": number("Units completed per crew day"),
                "total_quantity": number("Total quantity of work"),
                "crew_size": {"type": "integer", "description": "Number of workers"},
                "crew_rate_per_hr": number("All-in hourly rate per worker"),
                "hours_per_day": number("Work hours per day (default 10)"),
                "equipment_cost_per_day": number("Daily equipment cost (default 0)"),
                "unit": string("Unit of measure (default LF)"),
            }),
            &["production_rate_per_day", "total_quantity", "crew_size", "crew_rate_per_hr"],
        ),
        tool(
            "crew_day_cost",
            "Daily crew cost including labor, equipment, small tools, and overhead burden.",
            json!({
                "labor_items": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"role": {"type": "string"}, "hours": {"type": "number"}, "rate": {"type": "number"}}},
                    "description": "List of {role, hours, rate}",
                },
                "equipment_items": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"name": {"type": "string"}, "daily_rate": {"type": "number"}}},
                    "description": "List of {name, daily_rate}",
                },
                "small_tools_consumables": number("Daily small tools allowance (default 150)"),
                "overhead_burden_pct": number("Overhead burden percentage (default 25)"),
            }),
            &["labor_items", "equipment_items"],
        ),
        // Safety
        tool(
            "trench_safety",
            "OSHA 29 CFR 1926 Subpart P protective system requirements for a trench. Reference only.",
            json!({
                "depth_ft": number("Trench depth in ft"),
                "soil_type": string("OSHA soil type A, B, or C (default B)"),
                "method": string("slope, bench, or shield (default slope)"),
            }),
            &["depth_ft"],
        ),
        tool(
            "spoil_setback_required",
            "OSHA minimum spoil setback from the trench edge.",
            json!({}),
            &[],
        ),
        tool(
            "competent_person_checklist",
            "Checklist of items a competent person evaluates per OSHA 1926.651.",
            json!({}),
            &[],
        ),
    ]
});

/// Every tool in function-calling format.
pub fn all_tools() -> Vec<Value> {
    TOOLS.iter().map(ToolDefinition::to_function).collect()
}

/// Registry entry for one tool.
pub fn tool_schema(name: &str) -> Option<&'static ToolDefinition> {
    TOOLS.iter().find(|t| t.name == name)
}

/// Names of every registered tool.
pub fn tool_names() -> Vec<&'static str> {
    TOOLS.iter().map(|t| t.name).collect()
}

// ============================================================================
// Argument shapes for tools without a dedicated input type
// ============================================================================

#[derive(Debug, Deserialize)]
struct MaterialCostArgs {
    material_type: String,
    quantity: f64,
    #[serde(default, deserialize_with = "crate::estimating::size_key")]
    size: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LaborCostArgs {
    labor_type: String,
    hours: f64,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EquipmentCostArgs {
    equipment_type: String,
    days: f64,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegionArgs {
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryArgs {
    category: String,
}

#[derive(Debug, Deserialize)]
struct MaterialArgs {
    material: String,
}

fn parse<T: DeserializeOwned>(tool: &str, arguments: Value) -> CalcResult<T> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments)
        .map_err(|e| CalcError::invalid_input("arguments", tool, e.to_string()))
}

/// Serialize a result; failure here is ours, not the caller's.
pub fn to_json<T: Serialize>(value: &T) -> CalcResult<Value> {
    serde_json::to_value(value).map_err(|e| CalcError::internal(format!("result did not serialize: {}", e)))
}

// ============================================================================
// Dispatch
// ============================================================================

/// Runs tools against one catalog and settings.
#[derive(Debug, Clone)]
pub struct Toolbox<'a> {
    estimator: CostEstimator<'a>,
}

impl<'a> Toolbox<'a> {
    pub fn new(catalog: &'a RateCatalog, settings: EstimatorSettings) -> Self {
        Toolbox {
            estimator: CostEstimator::with_settings(catalog, settings),
        }
    }

    fn region<'r>(&'r self, requested: &'r Option<String>) -> &'r str {
        requested
            .as_deref()
            .unwrap_or(&self.estimator.settings().default_region)
    }

    /// Run `name` with JSON `arguments` and return the JSON result.
    ///
    /// # Errors
    ///
    /// * `UnsupportedTool` - no tool with that name
    /// * `InvalidInput` - arguments do not match the tool's parameters
    /// * any error the tool itself raises
    pub fn execute(&self, name: &str, arguments: Value) -> CalcResult<Value> {
        debug!(tool = name, "dispatching tool");
        match name {
            "calculate_material_cost" => {
                let args: MaterialCostArgs = parse(name, arguments)?;
                to_json(&self.estimator.material_cost(
                    &args.material_type,
                    args.quantity,
                    args.size.as_deref(),
                    self.region(&args.region),
                ))
            }
            "calculate_labor_cost" => {
                let args: LaborCostArgs = parse(name, arguments)?;
                to_json(&self.estimator.labor_cost(
                    &args.labor_type,
                    args.hours,
                    self.region(&args.region),
                ))
            }
            "calculate_equipment_cost" => {
                let args: EquipmentCostArgs = parse(name, arguments)?;
                to_json(&self.estimator.equipment_cost(
                    &args.equipment_type,
                    args.days,
                    self.region(&args.region),
                ))
            }
            "estimate_project_cost" => {
                let input: EstimateInput = parse(name, arguments)?;
                to_json(&self.estimator.estimate_project(&input)?)
            }
            "get_regions" => to_json(&self.estimator.catalog().get_regions()),
            "get_rates" => {
                let args: RegionArgs = parse(name, arguments)?;
                to_json(self.estimator.catalog().get_rates(self.region(&args.region)))
            }
            "build_schedule" => {
                let input: schedule::ScheduleInput = parse(name, arguments)?;
                to_json(&schedule::build_schedule(&input)?)
            }
            "convert_units" => {
                let input: units::ConvertInput = parse(name, arguments)?;
                to_json(&units::convert(
                    input.value,
                    &input.from_unit,
                    &input.to_unit,
                    &input.category,
                )?)
            }
            "bulk_convert" => {
                let input: units::BulkConvertInput = parse(name, arguments)?;
                to_json(&units::bulk_convert(input.value, &input.from_unit, &input.category)?)
            }
            "available_units" => {
                let args: CategoryArgs = parse(name, arguments)?;
                to_json(&units::available_units(&args.category)?)
            }
            "pipe_flow_full" => {
                let input: hydraulics::PipeFlowInput = parse(name, arguments)?;
                to_json(&hydraulics::pipe_flow_full(&input)?)
            }
            "pipe_flow_partial" => {
                let input: hydraulics::PipeFlowInput = parse(name, arguments)?;
                to_json(&hydraulics::pipe_flow_partial(&input)?)
            }
            "minimum_slope" => {
                let input: hydraulics::MinimumSlopeInput = parse(name, arguments)?;
                to_json(&hydraulics::minimum_slope(&input)?)
            }
            "flow_to_slope" => {
                let input: hydraulics::FlowToSlopeInput = parse(name, arguments)?;
                to_json(&hydraulics::flow_to_slope(&input)?)
            }
            "mannings_n" => {
                let args: MaterialArgs = parse(name, arguments)?;
                let n = hydraulics::mannings_n(&args.material)?;
                Ok(json!({"material": args.material, "mannings_n": n}))
            }
            "trench_volume" => {
                let input: earthwork::TrenchInput = parse(name, arguments)?;
                to_json(&earthwork::trench_volume(&input)?)
            }
            "thrust_block" => {
                let input: earthwork::ThrustBlockInput = parse(name, arguments)?;
                to_json(&earthwork::thrust_block(&input)?)
            }
            "asphalt_tonnage" => {
                let input: earthwork::AsphaltInput = parse(name, arguments)?;
                to_json(&earthwork::asphalt_tonnage(&input)?)
            }
            "concrete_volume" => {
                let mut input: earthwork::ConcreteInput = parse(name, arguments)?;
                input.psi = input.psi.or(Some(self.estimator.settings().concrete_psi_default));
                to_json(&earthwork::concrete_volume(&input)?)
            }
            "markup_bid_price" => {
                let input: bid::MarkupInput = parse(name, arguments)?;
                to_json(&bid::markup_bid_price(&input)?)
            }
            "unit_price" => {
                let input: bid::UnitPriceInput = parse(name, arguments)?;
                to_json(&bid::unit_price(&input)?)
            }
            "change_order_tm" => {
                let input: bid::ChangeOrderInput = parse(name, arguments)?;
                to_json(&bid::change_order_tm(&input)?)
            }
            "production_rate" => {
                let input: bid::ProductionInput = parse(name, arguments)?;
                to_json(&bid::production_rate(&input)?)
            }
            "crew_day_cost" => {
                let input: bid::CrewDayInput = parse(name, arguments)?;
                to_json(&bid::crew_day_cost(&input)?)
            }
            "trench_safety" => {
                let input: safety::TrenchSafetyInput = parse(name, arguments)?;
                to_json(&safety::trench_safety(&input)?)
            }
            "spoil_setback_required" => to_json(&safety::spoil_setback_required()),
            "competent_person_checklist" => to_json(&safety::competent_person_checklist()),
            _ => Err(CalcError::unsupported_tool(name)),
        }
    }
}

/// Run a tool against `catalog` with default settings.
pub fn execute(catalog: &RateCatalog, name: &str, arguments: Value) -> CalcResult<Value> {
    Toolbox::new(catalog, EstimatorSettings::default()).execute(name, arguments)
}
