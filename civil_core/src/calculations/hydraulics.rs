//! # Pipe Hydraulics
//!
//! Gravity-flow capacity, velocity and slope calculations for storm drain,
//! sanitary sewer and culvert pipe using Manning's equation.
//!
//! ## Operations
//!
//! - [`pipe_flow_full`] - Full-pipe capacity and velocity
//! - [`pipe_flow_partial`] - Capacity at a given depth ratio d/D
//! - [`minimum_slope`] - Slope for a target self-cleaning velocity
//! - [`flow_to_slope`] - Slope needed to carry a target flow
//!
//! ## Example
//!
//! ```rust
//! use civil_core::calculations::hydraulics::{pipe_flow_full, PipeFlowInput};
//!
//! let result = pipe_flow_full(&PipeFlowInput::new(12.0, 0.005)).unwrap();
//! assert!(result.flow_cfs > 1.5 && result.flow_cfs < 1.8);
//! ```

use serde::{Deserialize, Serialize};

use crate::equations::manning::{
    full_section, manning_flow, manning_slope_for_flow, manning_slope_for_velocity, partial_section,
    GPM_PER_CFS, MGD_PER_CFS,
};
use crate::errors::{CalcError, CalcResult};
use crate::units::round_to;

/// Minimum self-cleaning velocity (ft/s)
pub const MIN_VELOCITY_FPS: f64 = 2.0;

/// Recommended self-cleaning velocity (ft/s)
pub const RECOMMENDED_VELOCITY_FPS: f64 = 2.5;

/// Design standard cited by [`minimum_slope`]
pub const SLOPE_STANDARD: &str = "ASCE MOP 36 / 10 States Standards";

/// Typical Manning's n by pipe material
const MANNINGS_N: &[(&str, f64)] = &[
    ("concrete", 0.013),
    ("rcp", 0.013),
    ("pvc", 0.012),
    ("hdpe", 0.011),
    ("ductile_iron", 0.015),
    ("dip", 0.015),
    ("corrugated_metal", 0.024),
    ("cmp", 0.024),
    ("vitrified_clay", 0.013),
    ("vcp", 0.013),
    ("cast_iron", 0.013),
];

/// Look up a typical Manning's n for a pipe material.
///
/// ```rust
/// use civil_core::calculations::hydraulics::mannings_n;
///
/// assert_eq!(mannings_n("PVC").unwrap(), 0.012);
/// assert!(mannings_n("bamboo").is_err());
/// ```
pub fn mannings_n(material: &str) -> CalcResult<f64> {
    let key = material.trim().to_lowercase().replace([' ', '-'], "_");
    MANNINGS_N
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, n)| *n)
        .ok_or_else(|| {
            let known: Vec<&str> = MANNINGS_N.iter().map(|(name, _)| *name).collect();
            CalcError::invalid_input(
                "pipe_material",
                material,
                format!("Unknown pipe material. Known materials: {}", known.join(", ")),
            )
        })
}

/// Resolve roughness: explicit `n` wins, then material lookup, then default.
fn resolve_n(explicit: Option<f64>, material: Option<&str>, default: f64) -> CalcResult<f64> {
    match (explicit, material) {
        (Some(n), _) => Ok(n),
        (None, Some(material)) => mannings_n(material),
        (None, None) => Ok(default),
    }
}

fn default_depth_ratio() -> f64 {
    0.8
}

fn default_full_depth() -> f64 {
    1.0
}

fn default_target_velocity() -> f64 {
    RECOMMENDED_VELOCITY_FPS
}

// ============================================================================
// Full Pipe Flow
// ============================================================================

/// Input for full and partial pipe flow.
///
/// ## JSON Example
///
/// ```json
/// {
///   "diameter_in": 12.0,
///   "slope": 0.005,
///   "mannings_n": 0.013,
///   "depth_ratio": 0.8
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipeFlowInput {
    /// Pipe inside diameter (in)
    pub diameter_in: f64,
    /// Pipe slope (ft/ft), e.g. 0.005 for 0.5%
    pub slope: f64,
    /// Manning's n (default 0.013, concrete/RCP)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mannings_n: Option<f64>,
    /// Pipe material for an n lookup when `mannings_n` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_material: Option<String>,
    /// Flow depth as a fraction of diameter (partial flow only)
    #[serde(default = "default_depth_ratio")]
    pub depth_ratio: f64,
}

impl PipeFlowInput {
    pub fn new(diameter_in: f64, slope: f64) -> Self {
        Self {
            diameter_in,
            slope,
            mannings_n: None,
            pipe_material: None,
            depth_ratio: default_depth_ratio(),
        }
    }

    pub fn with_n(mut self, n: f64) -> Self {
        self.mannings_n = Some(n);
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.pipe_material = Some(material.into());
        self
    }

    pub fn with_depth_ratio(mut self, depth_ratio: f64) -> Self {
        self.depth_ratio = depth_ratio;
        self
    }

    fn n(&self) -> CalcResult<f64> {
        resolve_n(self.mannings_n, self.pipe_material.as_deref(), 0.013)
    }
}

/// Full-pipe capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipeFlowResult {
    pub pipe_diameter_in: f64,
    pub slope_ft_per_ft: f64,
    pub slope_pct: f64,
    pub mannings_n: f64,
    pub flow_cfs: f64,
    pub flow_gpm: f64,
    pub flow_mgd: f64,
    pub velocity_fps: f64,
    pub area_sf: f64,
    pub hydraulic_radius_ft: f64,
}

/// Full-pipe flow capacity and velocity.
///
/// Diameter and slope are not range-checked; callers pass positive values.
pub fn pipe_flow_full(input: &PipeFlowInput) -> CalcResult<PipeFlowResult> {
    let n = input.n()?;
    let section = full_section(input.diameter_in / 12.0);
    let q = manning_flow(section.area_sf, section.hydraulic_radius_ft, input.slope, n);
    let v = q / section.area_sf;

    Ok(PipeFlowResult {
        pipe_diameter_in: input.diameter_in,
        slope_ft_per_ft: input.slope,
        slope_pct: round_to(input.slope * 100.0, 4),
        mannings_n: n,
        flow_cfs: round_to(q, 4),
        flow_gpm: round_to(q * GPM_PER_CFS, 1),
        flow_mgd: round_to(q * MGD_PER_CFS, 4),
        velocity_fps: round_to(v, 3),
        area_sf: round_to(section.area_sf, 5),
        hydraulic_radius_ft: round_to(section.hydraulic_radius_ft, 5),
    })
}

// ============================================================================
// Partial Pipe Flow
// ============================================================================

/// Flow figures at the partial depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialFlow {
    pub flow_cfs: f64,
    pub flow_gpm: f64,
    pub velocity_fps: f64,
    pub area_sf: f64,
}

/// Full-pipe figures reported alongside a partial-flow result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullPipeFlow {
    pub flow_cfs: f64,
    pub flow_gpm: f64,
    pub velocity_fps: f64,
}

/// Partial-flow capacity with self-cleaning velocity checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialPipeFlowResult {
    pub pipe_diameter_in: f64,
    pub slope_ft_per_ft: f64,
    pub mannings_n: f64,
    pub depth_ratio: f64,
    pub flow_depth_ft: f64,
    pub flow_depth_in: f64,
    pub partial: PartialFlow,
    pub full_pipe: FullPipeFlow,
    /// Partial velocity ≥ 2.0 ft/s
    pub meets_min_velocity: bool,
    /// Partial velocity ≥ 2.5 ft/s
    pub meets_recommended_velocity: bool,
}

fn validate_depth_ratio(depth_ratio: f64) -> CalcResult<()> {
    if !(0.01..=1.0).contains(&depth_ratio) {
        return Err(CalcError::invalid_input(
            "depth_ratio",
            depth_ratio.to_string(),
            "depth_ratio must be between 0.01 and 1.0",
        ));
    }
    Ok(())
}

/// Partial-flow capacity at `input.depth_ratio`.
///
/// # Errors
///
/// * `InvalidInput` - depth ratio outside [0.01, 1.0]
pub fn pipe_flow_partial(input: &PipeFlowInput) -> CalcResult<PartialPipeFlowResult> {
    validate_depth_ratio(input.depth_ratio)?;
    let n = input.n()?;
    let d_ft = input.diameter_in / 12.0;

    let full = full_section(d_ft);
    let q_full = manning_flow(full.area_sf, full.hydraulic_radius_ft, input.slope, n);
    let v_full = q_full / full.area_sf;

    let partial = partial_section(d_ft, input.depth_ratio);
    let q_p = manning_flow(partial.area_sf, partial.hydraulic_radius_ft, input.slope, n);
    let v_p = if partial.area_sf > 0.0 { q_p / partial.area_sf } else { 0.0 };

    let depth_ft = input.depth_ratio * d_ft;

    Ok(PartialPipeFlowResult {
        pipe_diameter_in: input.diameter_in,
        slope_ft_per_ft: input.slope,
        mannings_n: n,
        depth_ratio: input.depth_ratio,
        flow_depth_ft: round_to(depth_ft, 3),
        flow_depth_in: round_to(depth_ft * 12.0, 2),
        partial: PartialFlow {
            flow_cfs: round_to(q_p, 4),
            flow_gpm: round_to(q_p * GPM_PER_CFS, 1),
            velocity_fps: round_to(v_p, 3),
            area_sf: round_to(partial.area_sf, 5),
        },
        full_pipe: FullPipeFlow {
            flow_cfs: round_to(q_full, 4),
            flow_gpm: round_to(q_full * GPM_PER_CFS, 1),
            velocity_fps: round_to(v_full, 3),
        },
        meets_min_velocity: v_p >= MIN_VELOCITY_FPS,
        meets_recommended_velocity: v_p >= RECOMMENDED_VELOCITY_FPS,
    })
}

// ============================================================================
// Minimum Slope
// ============================================================================

/// Input for [`minimum_slope`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimumSlopeInput {
    pub diameter_in: f64,
    #[serde(default = "default_target_velocity")]
    pub target_velocity_fps: f64,
    /// Manning's n (default 0.011, smooth-wall plastic)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mannings_n: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_material: Option<String>,
}

impl MinimumSlopeInput {
    pub fn new(diameter_in: f64) -> Self {
        Self {
            diameter_in,
            target_velocity_fps: default_target_velocity(),
            mannings_n: None,
            pipe_material: None,
        }
    }

    pub fn with_velocity(mut self, target_velocity_fps: f64) -> Self {
        self.target_velocity_fps = target_velocity_fps;
        self
    }

    pub fn with_n(mut self, n: f64) -> Self {
        self.mannings_n = Some(n);
        self
    }
}

/// Minimum slope in the units field crews use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimumSlopeResult {
    pub pipe_diameter_in: f64,
    pub target_velocity_fps: f64,
    pub mannings_n: f64,
    pub minimum_slope_ft_per_ft: f64,
    pub minimum_slope_pct: f64,
    pub drop_per_100ft_ft: f64,
    pub drop_per_100ft_in: f64,
    pub standard: String,
}

/// Minimum full-pipe slope for a target self-cleaning velocity.
pub fn minimum_slope(input: &MinimumSlopeInput) -> CalcResult<MinimumSlopeResult> {
    let n = resolve_n(input.mannings_n, input.pipe_material.as_deref(), 0.011)?;
    let r = input.diameter_in / 12.0 / 4.0;
    let slope = manning_slope_for_velocity(input.target_velocity_fps, r, n);
    let drop_ft = slope * 100.0;

    Ok(MinimumSlopeResult {
        pipe_diameter_in: input.diameter_in,
        target_velocity_fps: input.target_velocity_fps,
        mannings_n: n,
        minimum_slope_ft_per_ft: round_to(slope, 6),
        minimum_slope_pct: round_to(slope * 100.0, 4),
        drop_per_100ft_ft: round_to(drop_ft, 4),
        drop_per_100ft_in: round_to(drop_ft * 12.0, 3),
        standard: SLOPE_STANDARD.to_string(),
    })
}

// ============================================================================
// Flow to Slope
// ============================================================================

/// Input for [`flow_to_slope`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowToSlopeInput {
    pub diameter_in: f64,
    pub target_flow_gpm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mannings_n: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_material: Option<String>,
    /// d/D at which the flow is carried (default 1.0, full)
    #[serde(default = "default_full_depth")]
    pub depth_ratio: f64,
}

impl FlowToSlopeInput {
    pub fn new(diameter_in: f64, target_flow_gpm: f64) -> Self {
        Self {
            diameter_in,
            target_flow_gpm,
            mannings_n: None,
            pipe_material: None,
            depth_ratio: default_full_depth(),
        }
    }

    pub fn with_depth_ratio(mut self, depth_ratio: f64) -> Self {
        self.depth_ratio = depth_ratio;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowToSlopeResult {
    pub pipe_diameter_in: f64,
    pub target_flow_gpm: f64,
    pub target_flow_cfs: f64,
    pub mannings_n: f64,
    pub required_slope_ft_per_ft: f64,
    pub required_slope_pct: f64,
    pub resulting_velocity_fps: f64,
    pub depth_ratio: f64,
}

/// Slope needed to convey a target flow at the given depth ratio.
///
/// Depth ratios of 1.0 and above use the full-pipe section. Below 1.0 the
/// ratio must be at least 0.01, the same floor as [`pipe_flow_partial`].
pub fn flow_to_slope(input: &FlowToSlopeInput) -> CalcResult<FlowToSlopeResult> {
    let n = resolve_n(input.mannings_n, input.pipe_material.as_deref(), 0.013)?;
    let target_cfs = input.target_flow_gpm / GPM_PER_CFS;
    let d_ft = input.diameter_in / 12.0;

    let section = if input.depth_ratio >= 1.0 {
        full_section(d_ft)
    } else {
        validate_depth_ratio(input.depth_ratio)?;
        partial_section(d_ft, input.depth_ratio)
    };

    let slope = manning_slope_for_flow(target_cfs, section.area_sf, section.hydraulic_radius_ft, n);
    let velocity = target_cfs / section.area_sf;

    Ok(FlowToSlopeResult {
        pipe_diameter_in: input.diameter_in,
        target_flow_gpm: input.target_flow_gpm,
        target_flow_cfs: round_to(target_cfs, 4),
        mannings_n: n,
        required_slope_ft_per_ft: round_to(slope, 6),
        required_slope_pct: round_to(slope * 100.0, 4),
        resulting_velocity_fps: round_to(velocity, 3),
        depth_ratio: input.depth_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_flow() {
        let result = pipe_flow_full(&PipeFlowInput::new(12.0, 0.005)).unwrap();
        assert!(result.flow_cfs > 0.0);
        assert!(result.velocity_fps > 0.0);
        assert!(result.flow_gpm > 0.0);
    }

    #[test]
    fn test_known_value() {
        // 12" concrete at 0.5%: approx 1.66 cfs
        let result = pipe_flow_full(&PipeFlowInput::new(12.0, 0.005).with_n(0.013)).unwrap();
        assert!(result.flow_cfs > 1.5 && result.flow_cfs < 1.8);
        assert_eq!(result.hydraulic_radius_ft, 0.25);
        assert_eq!(result.slope_pct, 0.5);
    }

    #[test]
    fn test_larger_pipe_more_flow() {
        let q12 = pipe_flow_full(&PipeFlowInput::new(12.0, 0.005)).unwrap();
        let q24 = pipe_flow_full(&PipeFlowInput::new(24.0, 0.005)).unwrap();
        assert!(q24.flow_cfs > q12.flow_cfs);
    }

    #[test]
    fn test_rougher_pipe_less_flow() {
        let pvc = pipe_flow_full(&PipeFlowInput::new(12.0, 0.005).with_n(0.011)).unwrap();
        let cmp = pipe_flow_full(&PipeFlowInput::new(12.0, 0.005).with_material("cmp")).unwrap();
        assert_eq!(cmp.mannings_n, 0.024);
        assert!(pvc.flow_cfs > cmp.flow_cfs);
    }

    #[test]
    fn test_unknown_material_is_rejected() {
        let input = PipeFlowInput::new(12.0, 0.005).with_material("bamboo");
        assert!(pipe_flow_full(&input).is_err());
    }

    #[test]
    fn test_velocity_equals_flow_over_area() {
        let result = pipe_flow_full(&PipeFlowInput::new(10.0, 0.003)).unwrap();
        let computed_v = result.flow_cfs / result.area_sf;
        assert!((computed_v - result.velocity_fps).abs() < 0.001);
    }

    #[test]
    fn test_partial_full_depth_matches_full_flow() {
        let partial =
            pipe_flow_partial(&PipeFlowInput::new(12.0, 0.005).with_depth_ratio(1.0)).unwrap();
        let full = pipe_flow_full(&PipeFlowInput::new(12.0, 0.005)).unwrap();
        assert!((partial.partial.flow_cfs - full.flow_cfs).abs() < 0.01);
        assert!((partial.partial.velocity_fps - full.velocity_fps).abs() < 0.01);
    }

    #[test]
    fn test_half_pipe_less_than_full() {
        let result =
            pipe_flow_partial(&PipeFlowInput::new(12.0, 0.005).with_depth_ratio(0.5)).unwrap();
        assert!(result.partial.flow_cfs < result.full_pipe.flow_cfs);
        assert_eq!(result.flow_depth_in, 6.0);
    }

    #[test]
    fn test_meets_min_velocity_flag() {
        let low = pipe_flow_partial(&PipeFlowInput::new(8.0, 0.0001)).unwrap();
        assert!(!low.meets_min_velocity);

        let ok = pipe_flow_partial(&PipeFlowInput::new(8.0, 0.01)).unwrap();
        assert!(ok.meets_min_velocity);
    }

    #[test]
    fn test_invalid_depth_ratio() {
        let over = PipeFlowInput::new(12.0, 0.005).with_depth_ratio(1.5);
        assert!(pipe_flow_partial(&over).is_err());

        let under = PipeFlowInput::new(12.0, 0.005).with_depth_ratio(0.001);
        assert!(pipe_flow_partial(&under).is_err());

        let floor = PipeFlowInput::new(12.0, 0.005).with_depth_ratio(0.01);
        assert!(pipe_flow_partial(&floor).is_ok());
    }

    #[test]
    fn test_minimum_slope_positive() {
        let result = minimum_slope(&MinimumSlopeInput::new(8.0)).unwrap();
        assert!(result.minimum_slope_ft_per_ft > 0.0);
        assert_eq!(result.mannings_n, 0.011);
    }

    #[test]
    fn test_larger_pipe_needs_less_slope() {
        let s8 = minimum_slope(&MinimumSlopeInput::new(8.0)).unwrap();
        let s24 = minimum_slope(&MinimumSlopeInput::new(24.0)).unwrap();
        assert!(s24.minimum_slope_ft_per_ft < s8.minimum_slope_ft_per_ft);
    }

    #[test]
    fn test_higher_velocity_needs_more_slope() {
        let s2 = minimum_slope(&MinimumSlopeInput::new(8.0).with_velocity(2.0)).unwrap();
        let s3 = minimum_slope(&MinimumSlopeInput::new(8.0).with_velocity(3.0)).unwrap();
        assert!(s3.minimum_slope_ft_per_ft > s2.minimum_slope_ft_per_ft);
    }

    #[test]
    fn test_drop_consistent_with_slope() {
        let result = minimum_slope(&MinimumSlopeInput::new(8.0)).unwrap();
        let expected_drop = result.minimum_slope_ft_per_ft * 100.0;
        assert!((expected_drop - result.drop_per_100ft_ft).abs() < 0.0001);
    }

    #[test]
    fn test_flow_to_slope_positive() {
        let result = flow_to_slope(&FlowToSlopeInput::new(12.0, 500.0)).unwrap();
        assert!(result.required_slope_ft_per_ft > 0.0);
    }

    #[test]
    fn test_higher_flow_needs_more_slope() {
        let s1 = flow_to_slope(&FlowToSlopeInput::new(12.0, 500.0)).unwrap();
        let s2 = flow_to_slope(&FlowToSlopeInput::new(12.0, 1000.0)).unwrap();
        assert!(s2.required_slope_ft_per_ft > s1.required_slope_ft_per_ft);
    }

    #[test]
    fn test_flow_to_slope_round_trips_full_flow() {
        // Slope found for the full-pipe capacity should be the original slope
        let full = pipe_flow_full(&PipeFlowInput::new(12.0, 0.005)).unwrap();
        let back = flow_to_slope(&FlowToSlopeInput::new(12.0, full.flow_gpm)).unwrap();
        assert!((back.required_slope_ft_per_ft - 0.005).abs() < 0.00001);
    }

    #[test]
    fn test_flow_to_slope_partial_depth_needs_more_slope() {
        let full = flow_to_slope(&FlowToSlopeInput::new(12.0, 300.0)).unwrap();
        let half =
            flow_to_slope(&FlowToSlopeInput::new(12.0, 300.0).with_depth_ratio(0.5)).unwrap();
        assert!(half.required_slope_ft_per_ft > full.required_slope_ft_per_ft);
    }

    #[test]
    fn test_input_defaults_from_json() {
        let input: PipeFlowInput =
            serde_json::from_str(r#"{"diameter_in": 8, "slope": 0.004}"#).unwrap();
        assert_eq!(input.depth_ratio, 0.8);
        assert!(input.mannings_n.is_none());
    }
}
