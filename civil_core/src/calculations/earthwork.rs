//! # Earthwork & Quantity Takeoff
//!
//! Trench excavation, backfill and spoil volumes, thrust block sizing for
//! pressure pipe fittings, and asphalt / concrete material quantities.
//!
//! ## Example
//!
//! ```rust
//! use civil_core::calculations::earthwork::{trench_volume, TrenchInput};
//!
//! let input = TrenchInput::new(100.0, 3.0, 5.0).with_pipe_od(8.625);
//! let result = trench_volume(&input).unwrap();
//! assert!((result.excavation_cy - 55.56).abs() < 0.01);
//! ```

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{CalcError, CalcResult};
use crate::units::round_to;

/// Approximate crushed rock bedding density (tons per cy)
pub const BEDDING_TONS_PER_CY: f64 = 1.35;

/// Approximate loose spoil density (tons per cy)
pub const SPOIL_TONS_PER_CY: f64 = 1.4;

/// Thickness assumed for a thrust block (ft)
pub const THRUST_BLOCK_THICKNESS_FT: f64 = 1.5;

/// Ready-mix price per cy by strength class
const CONCRETE_PRICES: &[(u32, f64)] = &[(3000, 166.0), (4000, 180.0), (5000, 195.0)];

/// Strength class used when none is given, and for pricing unknown classes
pub const DEFAULT_CONCRETE_PSI: u32 = 4000;

fn default_bedding_depth() -> f64 {
    6.0
}

fn default_swell_pct() -> f64 {
    25.0
}

fn default_true() -> bool {
    true
}

fn default_waste_pct() -> f64 {
    5.0
}

// ============================================================================
// Trench Volume
// ============================================================================

/// Input for [`trench_volume`].
///
/// ## JSON Example
///
/// ```json
/// {
///   "length_ft": 100.0,
///   "width_ft": 3.0,
///   "depth_ft": 5.0,
///   "pipe_od_in": 8.625,
///   "bedding_depth_in": 6.0,
///   "swell_pct": 25.0,
///   "import_backfill": true
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrenchInput {
    /// Trench length (LF)
    pub length_ft: f64,
    /// Bottom width (ft)
    pub width_ft: f64,
    /// Depth (ft)
    pub depth_ft: f64,
    /// Pipe outside diameter for the void deduction (in)
    #[serde(default)]
    pub pipe_od_in: f64,
    /// Bedding depth across the full trench width (in)
    #[serde(default = "default_bedding_depth")]
    pub bedding_depth_in: f64,
    /// Bulking of excavated soil (%)
    #[serde(default = "default_swell_pct")]
    pub swell_pct: f64,
    /// Backfill with imported material, hauling all native spoil
    #[serde(default = "default_true")]
    pub import_backfill: bool,
}

impl TrenchInput {
    pub fn new(length_ft: f64, width_ft: f64, depth_ft: f64) -> Self {
        Self {
            length_ft,
            width_ft,
            depth_ft,
            pipe_od_in: 0.0,
            bedding_depth_in: default_bedding_depth(),
            swell_pct: default_swell_pct(),
            import_backfill: true,
        }
    }

    pub fn with_pipe_od(mut self, pipe_od_in: f64) -> Self {
        self.pipe_od_in = pipe_od_in;
        self
    }

    pub fn with_bedding(mut self, bedding_depth_in: f64) -> Self {
        self.bedding_depth_in = bedding_depth_in;
        self
    }

    pub fn with_swell(mut self, swell_pct: f64) -> Self {
        self.swell_pct = swell_pct;
        self
    }

    pub fn native_backfill(mut self) -> Self {
        self.import_backfill = false;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrenchResult {
    pub length_ft: f64,
    pub width_ft: f64,
    pub depth_ft: f64,
    pub pipe_od_in: f64,
    pub excavation_cf: f64,
    pub excavation_cy: f64,
    pub pipe_void_cy: f64,
    pub bedding_cy: f64,
    pub bedding_tons: f64,
    pub backfill_cy: f64,
    pub spoil_cy: f64,
    pub spoil_tons_approx: f64,
    pub swell_pct: f64,
    pub import_backfill: bool,
}

/// Excavation, bedding, backfill and spoil quantities for a rectangular trench.
///
/// Backfill is clamped at zero when the pipe and bedding fill the trench.
pub fn trench_volume(input: &TrenchInput) -> CalcResult<TrenchResult> {
    let excavation_cf = input.length_ft * input.width_ft * input.depth_ft;
    let excavation_cy = excavation_cf / 27.0;

    let od_ft = input.pipe_od_in / 12.0;
    let pipe_void_cy = PI * (od_ft / 2.0).powi(2) * input.length_ft / 27.0;

    let bedding_cy = input.length_ft * input.width_ft * (input.bedding_depth_in / 12.0) / 27.0;
    let backfill_cy = (excavation_cy - pipe_void_cy - bedding_cy).max(0.0);

    let swell = 1.0 + input.swell_pct / 100.0;
    let spoil_cy = if input.import_backfill {
        excavation_cy * swell
    } else {
        (pipe_void_cy + bedding_cy) * swell
    };

    Ok(TrenchResult {
        length_ft: input.length_ft,
        width_ft: input.width_ft,
        depth_ft: input.depth_ft,
        pipe_od_in: input.pipe_od_in,
        excavation_cf: round_to(excavation_cf, 1),
        excavation_cy: round_to(excavation_cy, 2),
        pipe_void_cy: round_to(pipe_void_cy, 3),
        bedding_cy: round_to(bedding_cy, 2),
        bedding_tons: round_to(bedding_cy * BEDDING_TONS_PER_CY, 2),
        backfill_cy: round_to(backfill_cy, 2),
        spoil_cy: round_to(spoil_cy, 2),
        spoil_tons_approx: round_to(spoil_cy * SPOIL_TONS_PER_CY, 1),
        swell_pct: input.swell_pct,
        import_backfill: input.import_backfill,
    })
}

// ============================================================================
// Thrust Block
// ============================================================================

/// Pressure pipe fitting that develops unbalanced thrust
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fitting {
    /// Dead end or cap, T = P·A
    DeadEnd,
    /// Tee branch, T = P·A
    Tee,
    /// Horizontal bend of the given deflection, T = 2·P·A·sin(θ/2)
    Bend(f64),
}

impl Fitting {
    /// Parse a fitting token: "dead_end" / "dead" / "cap", "tee", or bend
    /// degrees such as "90", "45", "22.5", "11.25".
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let token = s.trim().to_lowercase();
        match token.as_str() {
            "dead_end" | "dead" | "cap" => Ok(Fitting::DeadEnd),
            "tee" => Ok(Fitting::Tee),
            _ => match token.parse::<f64>() {
                Ok(angle) => Self::bend(angle),
                Err(_) => Err(CalcError::invalid_input(
                    "fitting_type",
                    s,
                    "Unknown fitting type. Use '90', '45', '22.5', '11.25', 'tee', or 'dead_end'",
                )),
            },
        }
    }

    /// A bend of `angle` degrees, which must be in (0, 180].
    pub fn bend(angle: f64) -> CalcResult<Self> {
        if !angle.is_finite() || angle <= 0.0 || angle > 180.0 {
            return Err(CalcError::invalid_input(
                "fitting_type",
                angle.to_string(),
                "Bend angle must be greater than 0 and at most 180 degrees",
            ));
        }
        Ok(Fitting::Bend(angle))
    }

    /// Reported deflection angle (deg)
    pub fn angle_deg(&self) -> f64 {
        match self {
            Fitting::DeadEnd => 180.0,
            Fitting::Tee => 90.0,
            Fitting::Bend(angle) => *angle,
        }
    }

    /// Multiplier on P·A
    pub fn thrust_factor(&self) -> f64 {
        match self {
            Fitting::DeadEnd | Fitting::Tee => 1.0,
            Fitting::Bend(angle) => 2.0 * (angle.to_radians() / 2.0).sin(),
        }
    }
}

impl fmt::Display for Fitting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fitting::DeadEnd => write!(f, "Dead end / cap"),
            Fitting::Tee => write!(f, "Tee (branch)"),
            Fitting::Bend(angle) => write!(f, "{:?}° bend", angle),
        }
    }
}

/// Fitting as it arrives in JSON: `"tee"`, `"45"` or `45`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FittingSpec {
    Degrees(f64),
    Token(String),
}

impl Default for FittingSpec {
    fn default() -> Self {
        FittingSpec::Token("90".to_string())
    }
}

impl FittingSpec {
    pub fn resolve(&self) -> CalcResult<Fitting> {
        match self {
            FittingSpec::Degrees(angle) => Fitting::bend(*angle),
            FittingSpec::Token(token) => Fitting::from_str_flexible(token),
        }
    }
}

fn default_soil_bearing() -> f64 {
    2000.0
}

fn default_safety_factor() -> f64 {
    1.5
}

/// Input for [`thrust_block`].
///
/// ## JSON Example
///
/// ```json
/// {
///   "pipe_diameter_in": 8.0,
///   "test_pressure_psi": 150.0,
///   "fitting_type": "90",
///   "soil_bearing_psf": 2000.0,
///   "safety_factor": 1.5
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrustBlockInput {
    /// Pipe inside diameter (in)
    pub pipe_diameter_in: f64,
    /// Design or test pressure (psi)
    pub test_pressure_psi: f64,
    #[serde(default)]
    pub fitting_type: FittingSpec,
    /// Allowable soil bearing (psf)
    #[serde(default = "default_soil_bearing")]
    pub soil_bearing_psf: f64,
    #[serde(default = "default_safety_factor")]
    pub safety_factor: f64,
}

impl ThrustBlockInput {
    pub fn new(pipe_diameter_in: f64, test_pressure_psi: f64, fitting_type: &str) -> Self {
        Self {
            pipe_diameter_in,
            test_pressure_psi,
            fitting_type: FittingSpec::Token(fitting_type.to_string()),
            soil_bearing_psf: default_soil_bearing(),
            safety_factor: default_safety_factor(),
        }
    }

    pub fn validate(&self) -> CalcResult<()> {
        if self.soil_bearing_psf <= 0.0 {
            return Err(CalcError::invalid_input(
                "soil_bearing_psf",
                self.soil_bearing_psf.to_string(),
                "Soil bearing must be positive",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrustBlockResult {
    pub pipe_diameter_in: f64,
    pub pressure_psi: f64,
    pub fitting: String,
    pub angle_deg: f64,
    pub pipe_area_sf: f64,
    pub thrust_lbf: f64,
    pub thrust_kips: f64,
    pub soil_bearing_psf: f64,
    pub bearing_area_min_sf: f64,
    pub bearing_area_design_sf: f64,
    pub safety_factor: f64,
    pub approx_square_block_ft: f64,
    pub concrete_volume_cy_18in_thick: f64,
}

/// Thrust force at a fitting and the concrete block bearing area to resist it.
///
/// ```rust
/// use civil_core::calculations::earthwork::{thrust_block, ThrustBlockInput};
///
/// let result = thrust_block(&ThrustBlockInput::new(8.0, 150.0, "90")).unwrap();
/// assert_eq!(result.fitting, "90.0° bend");
/// ```
pub fn thrust_block(input: &ThrustBlockInput) -> CalcResult<ThrustBlockResult> {
    input.validate()?;
    let fitting = input.fitting_type.resolve()?;

    let d_ft = input.pipe_diameter_in / 12.0;
    let area_sf = PI * (d_ft / 2.0).powi(2);
    let pressure_psf = input.test_pressure_psi * 144.0;
    let thrust = fitting.thrust_factor() * pressure_psf * area_sf;

    let bearing_min = thrust / input.soil_bearing_psf;
    let bearing_design = bearing_min * input.safety_factor;

    Ok(ThrustBlockResult {
        pipe_diameter_in: input.pipe_diameter_in,
        pressure_psi: input.test_pressure_psi,
        fitting: fitting.to_string(),
        angle_deg: fitting.angle_deg(),
        pipe_area_sf: round_to(area_sf, 4),
        thrust_lbf: round_to(thrust, 0),
        thrust_kips: round_to(thrust / 1000.0, 2),
        soil_bearing_psf: input.soil_bearing_psf,
        bearing_area_min_sf: round_to(bearing_min, 3),
        bearing_area_design_sf: round_to(bearing_design, 3),
        safety_factor: input.safety_factor,
        approx_square_block_ft: round_to(bearing_design.sqrt(), 2),
        concrete_volume_cy_18in_thick: round_to(
            bearing_design * THRUST_BLOCK_THICKNESS_FT / 27.0,
            3,
        ),
    })
}

// ============================================================================
// Asphalt Tonnage
// ============================================================================

fn default_asphalt_density() -> f64 {
    145.0
}

fn default_asphalt_price() -> f64 {
    90.0
}

/// Input for [`asphalt_tonnage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsphaltInput {
    pub area_sf: f64,
    /// Compacted thickness (in)
    pub thickness_in: f64,
    /// Mix density (lb/cf), 145 for dense-graded HMA
    #[serde(default = "default_asphalt_density")]
    pub density_lbcf: f64,
    #[serde(default = "default_waste_pct")]
    pub waste_pct: f64,
    #[serde(default = "default_asphalt_price")]
    pub price_per_ton: f64,
}

impl AsphaltInput {
    pub fn new(area_sf: f64, thickness_in: f64) -> Self {
        Self {
            area_sf,
            thickness_in,
            density_lbcf: default_asphalt_density(),
            waste_pct: default_waste_pct(),
            price_per_ton: default_asphalt_price(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsphaltResult {
    pub area_sf: f64,
    pub thickness_in: f64,
    pub density_lbcf: f64,
    pub volume_cf: f64,
    pub net_tons: f64,
    pub waste_pct: f64,
    pub tons_with_waste: f64,
    pub price_per_ton: f64,
    pub material_cost: f64,
}

/// HMA tonnage and material cost for paving or trench restoration.
pub fn asphalt_tonnage(input: &AsphaltInput) -> CalcResult<AsphaltResult> {
    let volume_cf = input.area_sf * input.thickness_in / 12.0;
    let net_tons = volume_cf * input.density_lbcf / 2000.0;
    let tons_with_waste = net_tons * (1.0 + input.waste_pct / 100.0);

    Ok(AsphaltResult {
        area_sf: input.area_sf,
        thickness_in: input.thickness_in,
        density_lbcf: input.density_lbcf,
        volume_cf: round_to(volume_cf, 1),
        net_tons: round_to(net_tons, 2),
        waste_pct: input.waste_pct,
        tons_with_waste: round_to(tons_with_waste, 2),
        price_per_ton: input.price_per_ton,
        material_cost: round_to(tons_with_waste * input.price_per_ton, 2),
    })
}

// ============================================================================
// Concrete Volume
// ============================================================================

/// Concrete placement shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcreteShape {
    Slab,
    Wall,
    Cylinder,
    Manhole,
    Vault,
}

impl ConcreteShape {
    pub fn key(&self) -> &'static str {
        match self {
            ConcreteShape::Slab => "slab",
            ConcreteShape::Wall => "wall",
            ConcreteShape::Cylinder => "cylinder",
            ConcreteShape::Manhole => "manhole",
            ConcreteShape::Vault => "vault",
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "slab" => Ok(ConcreteShape::Slab),
            "wall" => Ok(ConcreteShape::Wall),
            "cylinder" => Ok(ConcreteShape::Cylinder),
            "manhole" => Ok(ConcreteShape::Manhole),
            "vault" => Ok(ConcreteShape::Vault),
            _ => Err(CalcError::invalid_input(
                "shape",
                s,
                "Unknown shape. Use 'slab', 'wall', or 'cylinder'",
            )),
        }
    }
}

/// Input for [`concrete_volume`]. Which dimensions are required depends on
/// the shape:
///
/// - slab: `length_ft`, `width_ft`, `thickness_in` (default 6)
/// - wall: `length_ft`, `height_ft`, `thickness_in` (default 12)
/// - cylinder / manhole / vault: `od_ft`, `height_ft`, `id_ft` (default 0)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcreteInput {
    pub shape: String,
    #[serde(default = "default_waste_pct")]
    pub waste_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness_in: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub od_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_ft: Option<f64>,
    /// Strength class (psi); absent means 4000
    #[serde(
        default,
        deserialize_with = "crate::units::opt_whole_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub psi: Option<u32>,
}

impl ConcreteInput {
    pub fn slab(length_ft: f64, width_ft: f64) -> Self {
        Self {
            shape: "slab".to_string(),
            waste_pct: default_waste_pct(),
            length_ft: Some(length_ft),
            width_ft: Some(width_ft),
            ..Default::default()
        }
    }

    pub fn with_thickness(mut self, thickness_in: f64) -> Self {
        self.thickness_in = Some(thickness_in);
        self
    }

    pub fn with_psi(mut self, psi: u32) -> Self {
        self.psi = Some(psi);
        self
    }

    /// The dimensions that were supplied, keyed by field name
    pub fn dimensions(&self) -> BTreeMap<String, f64> {
        [
            ("length_ft", self.length_ft),
            ("width_ft", self.width_ft),
            ("height_ft", self.height_ft),
            ("thickness_in", self.thickness_in),
            ("od_ft", self.od_ft),
            ("id_ft", self.id_ft),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect()
    }
}

fn require(value: Option<f64>, field: &str) -> CalcResult<f64> {
    value.ok_or_else(|| CalcError::missing_field(field))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcreteResult {
    pub shape: String,
    pub dimensions: BTreeMap<String, f64>,
    pub net_volume_cy: f64,
    pub waste_pct: f64,
    pub volume_with_waste_cy: f64,
    pub concrete_psi: u32,
    pub price_per_cy: f64,
    pub material_cost: f64,
    pub truck_loads_10cy: f64,
    /// Pricing fallbacks applied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Ready-mix price for a strength class, or `None` if the class is unpriced.
pub fn concrete_price_per_cy(psi: u32) -> Option<f64> {
    CONCRETE_PRICES.iter().find(|(class, _)| *class == psi).map(|(_, price)| *price)
}

/// Concrete volume, waste and ready-mix cost for a placement.
///
/// # Errors
///
/// * `InvalidInput` - unknown shape
/// * `MissingField` - a dimension required by the shape is absent
pub fn concrete_volume(input: &ConcreteInput) -> CalcResult<ConcreteResult> {
    let shape = ConcreteShape::from_str_flexible(&input.shape)?;

    let volume_cf = match shape {
        ConcreteShape::Slab => {
            let length = require(input.length_ft, "length_ft")?;
            let width = require(input.width_ft, "width_ft")?;
            length * width * input.thickness_in.unwrap_or(6.0) / 12.0
        }
        ConcreteShape::Wall => {
            let length = require(input.length_ft, "length_ft")?;
            let height = require(input.height_ft, "height_ft")?;
            length * height * input.thickness_in.unwrap_or(12.0) / 12.0
        }
        ConcreteShape::Cylinder | ConcreteShape::Manhole | ConcreteShape::Vault => {
            let od = require(input.od_ft, "od_ft")?;
            let height = require(input.height_ft, "height_ft")?;
            let id = input.id_ft.unwrap_or(0.0);
            PI / 4.0 * (od * od - id * id) * height
        }
    };

    let psi = input.psi.unwrap_or(DEFAULT_CONCRETE_PSI);
    let mut warnings = Vec::new();
    let price_per_cy = match concrete_price_per_cy(psi) {
        Some(price) => price,
        None => {
            warn!(psi, "no ready-mix price for strength class, using 4000 psi rate");
            warnings.push(format!(
                "No price for {} psi concrete; priced at the 4000 psi rate",
                psi
            ));
            concrete_price_per_cy(DEFAULT_CONCRETE_PSI).unwrap_or(180.0)
        }
    };

    let net_cy = volume_cf / 27.0;
    let with_waste_cy = net_cy * (1.0 + input.waste_pct / 100.0);

    Ok(ConcreteResult {
        shape: shape.key().to_string(),
        dimensions: input.dimensions(),
        net_volume_cy: round_to(net_cy, 3),
        waste_pct: input.waste_pct,
        volume_with_waste_cy: round_to(with_waste_cy, 3),
        concrete_psi: psi,
        price_per_cy,
        material_cost: round_to(with_waste_cy * price_per_cy, 2),
        truck_loads_10cy: round_to(with_waste_cy / 10.0, 1),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_excavation() {
        // 100 LF × 3 ft × 5 ft = 1500 cf = 55.56 cy
        let result = trench_volume(&TrenchInput::new(100.0, 3.0, 5.0)).unwrap();
        assert!((result.excavation_cy - 55.56).abs() < 0.01);
        assert_eq!(result.excavation_cf, 1500.0);
    }

    #[test]
    fn test_excavation_without_pipe_or_bedding() {
        let input = TrenchInput::new(40.0, 2.5, 6.0).with_bedding(0.0);
        let result = trench_volume(&input).unwrap();
        assert_eq!(result.excavation_cy, round_to(40.0 * 2.5 * 6.0 / 27.0, 2));
        assert_eq!(result.backfill_cy, result.excavation_cy);
        assert_eq!(result.pipe_void_cy, 0.0);
    }

    #[test]
    fn test_spoil_exceeds_excavation_with_swell() {
        let result = trench_volume(&TrenchInput::new(100.0, 3.0, 5.0)).unwrap();
        assert!(result.spoil_cy > result.excavation_cy);
    }

    #[test]
    fn test_native_backfill_hauls_displaced_volume_only() {
        let input = TrenchInput::new(100.0, 3.0, 5.0).with_pipe_od(12.0).native_backfill();
        let result = trench_volume(&input).unwrap();
        let expected = (result.pipe_void_cy + result.bedding_cy) * 1.25;
        assert!((result.spoil_cy - expected).abs() < 0.02);
        assert!(result.spoil_cy < result.excavation_cy);
    }

    #[test]
    fn test_backfill_never_negative() {
        // Tiny trench, big pipe
        let input = TrenchInput::new(10.0, 1.0, 1.0).with_pipe_od(24.0);
        let result = trench_volume(&input).unwrap();
        assert_eq!(result.backfill_cy, 0.0);
    }

    #[test]
    fn test_bedding_reduces_backfill() {
        let no_bed = trench_volume(&TrenchInput::new(100.0, 3.0, 5.0).with_bedding(0.0)).unwrap();
        let bed = trench_volume(&TrenchInput::new(100.0, 3.0, 5.0).with_bedding(6.0)).unwrap();
        assert!(bed.backfill_cy < no_bed.backfill_cy);
        // 150 cf = 5.556 cy × 1.35
        assert_eq!(bed.bedding_tons, 7.5);
    }

    #[test]
    fn test_thrust_ordering() {
        let thrust = |fitting: &str| {
            thrust_block(&ThrustBlockInput::new(8.0, 150.0, fitting))
                .unwrap()
                .thrust_lbf
        };
        let dead = thrust("dead_end");
        let t90 = thrust("90");
        let t45 = thrust("45");
        let t22 = thrust("22.5");
        assert!(t90 > dead);
        assert!(dead > t45);
        assert!(t45 > t22);
    }

    #[test]
    fn test_90_bend_thrust_factor() {
        // 2 sin(45°) = √2
        let dead = thrust_block(&ThrustBlockInput::new(12.0, 100.0, "cap")).unwrap();
        let bend = thrust_block(&ThrustBlockInput::new(12.0, 100.0, "90")).unwrap();
        let ratio = bend.thrust_lbf / dead.thrust_lbf;
        assert!((ratio - 2f64.sqrt()).abs() < 0.001);
    }

    #[test]
    fn test_tee_matches_dead_end() {
        let tee = thrust_block(&ThrustBlockInput::new(8.0, 150.0, "tee")).unwrap();
        let dead = thrust_block(&ThrustBlockInput::new(8.0, 150.0, "DEAD")).unwrap();
        assert_eq!(tee.thrust_lbf, dead.thrust_lbf);
        assert_eq!(tee.angle_deg, 90.0);
        assert_eq!(dead.angle_deg, 180.0);
        assert_eq!(dead.fitting, "Dead end / cap");
    }

    #[test]
    fn test_bearing_area_positive() {
        let result = thrust_block(&ThrustBlockInput::new(8.0, 150.0, "90")).unwrap();
        assert!(result.bearing_area_design_sf > result.bearing_area_min_sf);
        assert!(result.concrete_volume_cy_18in_thick > 0.0);
    }

    #[test]
    fn test_invalid_fitting_raises() {
        assert!(thrust_block(&ThrustBlockInput::new(8.0, 150.0, "wye")).is_err());
        assert!(thrust_block(&ThrustBlockInput::new(8.0, 150.0, "0")).is_err());
        assert!(thrust_block(&ThrustBlockInput::new(8.0, 150.0, "270")).is_err());
    }

    #[test]
    fn test_numeric_fitting_from_json() {
        let input: ThrustBlockInput =
            serde_json::from_str(r#"{"pipe_diameter_in": 8, "test_pressure_psi": 150, "fitting_type": 45}"#).unwrap();
        let result = thrust_block(&input).unwrap();
        assert_eq!(result.angle_deg, 45.0);
        assert_eq!(result.fitting, "45.0° bend");
    }

    #[test]
    fn test_default_fitting_is_90() {
        let input: ThrustBlockInput =
            serde_json::from_str(r#"{"pipe_diameter_in": 8, "test_pressure_psi": 150}"#).unwrap();
        assert_eq!(thrust_block(&input).unwrap().angle_deg, 90.0);
    }

    #[test]
    fn test_asphalt_basic() {
        // 1000 sf × 3 in = 250 cf × 145 = 36250 lb = 18.125 t, tie rounds to even
        let result = asphalt_tonnage(&AsphaltInput::new(1000.0, 3.0)).unwrap();
        assert_eq!(result.volume_cf, 250.0);
        assert_eq!(result.net_tons, 18.12);
        assert!(result.tons_with_waste > result.net_tons);
    }

    #[test]
    fn test_asphalt_cost_positive() {
        let result = asphalt_tonnage(&AsphaltInput::new(500.0, 2.0)).unwrap();
        assert!(result.material_cost > 0.0);
    }

    #[test]
    fn test_slab() {
        // 10 × 10 × 6" = 50 cf = 1.852 cy
        let result = concrete_volume(&ConcreteInput::slab(10.0, 10.0).with_thickness(6.0)).unwrap();
        assert!((result.net_volume_cy - 1.852).abs() < 0.001);
        assert_eq!(result.price_per_cy, 180.0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_slab_default_thickness() {
        let explicit =
            concrete_volume(&ConcreteInput::slab(20.0, 8.0).with_thickness(6.0)).unwrap();
        let default = concrete_volume(&ConcreteInput::slab(20.0, 8.0)).unwrap();
        assert_eq!(explicit.net_volume_cy, default.net_volume_cy);
    }

    #[test]
    fn test_manhole_ring() {
        let input = ConcreteInput {
            shape: "Manhole".to_string(),
            od_ft: Some(5.0),
            id_ft: Some(4.0),
            height_ft: Some(8.0),
            waste_pct: 0.0,
            ..Default::default()
        };
        let result = concrete_volume(&input).unwrap();
        let expected = PI / 4.0 * (25.0 - 16.0) * 8.0 / 27.0;
        assert!((result.net_volume_cy - expected).abs() < 0.001);
        assert_eq!(result.shape, "manhole");
        assert_eq!(result.dimensions.len(), 3);
    }

    #[test]
    fn test_wall_missing_height() {
        let input = ConcreteInput {
            shape: "wall".to_string(),
            length_ft: Some(20.0),
            ..Default::default()
        };
        let err = concrete_volume(&input).unwrap_err();
        assert_eq!(err, CalcError::missing_field("height_ft"));
    }

    #[test]
    fn test_invalid_shape_raises() {
        let input = ConcreteInput {
            shape: "pyramid".to_string(),
            length_ft: Some(10.0),
            ..Default::default()
        };
        let err = concrete_volume(&input).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_higher_psi_costs_more() {
        let c3 = concrete_volume(&ConcreteInput::slab(10.0, 10.0).with_psi(3000)).unwrap();
        let c5 = concrete_volume(&ConcreteInput::slab(10.0, 10.0).with_psi(5000)).unwrap();
        assert!(c5.material_cost > c3.material_cost);
    }

    #[test]
    fn test_unknown_psi_falls_back_with_warning() {
        let result = concrete_volume(&ConcreteInput::slab(10.0, 10.0).with_psi(3500)).unwrap();
        assert_eq!(result.price_per_cy, 180.0);
        assert_eq!(result.concrete_psi, 3500);
        assert_eq!(result.warnings.len(), 1);
    }
}
