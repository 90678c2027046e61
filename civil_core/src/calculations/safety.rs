//! # Trench Safety Reference
//!
//! Protective system dimensions per OSHA 29 CFR 1926 Subpart P: sloping,
//! benching and shielding by soil classification.
//!
//! This is reference information. Excavation safety decisions are made by a
//! competent person on site.
//!
//! ## Soil Classification (Appendix A)
//!
//! | Type | Max slope | H:V |
//! |------|-----------|-----|
//! | A    | 3/4:1     | 0.75 |
//! | B    | 1:1       | 1.0 |
//! | C    | 1.5:1     | 1.5 |

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::units::round_to;

/// Depth at or below which no protective system is required (ft)
pub const PROTECTION_THRESHOLD_FT: f64 = 4.0;

/// Minimum spoil setback from the trench edge (ft)
pub const SPOIL_SETBACK_FT: f64 = 2.0;

const DISCLAIMER: &str =
    "REFERENCE ONLY. All decisions must be made by a competent person per OSHA 29 CFR 1926.652.";

/// OSHA soil classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoilType {
    A,
    B,
    C,
}

impl SoilType {
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(SoilType::A),
            "B" => Ok(SoilType::B),
            "C" => Ok(SoilType::C),
            _ => Err(CalcError::invalid_input(
                "soil_type",
                s,
                "soil_type must be 'A', 'B', or 'C'",
            )),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SoilType::A => "A",
            SoilType::B => "B",
            SoilType::C => "C",
        }
    }

    /// Horizontal run per unit of depth for the maximum allowable slope
    pub fn h_ratio(&self) -> f64 {
        match self {
            SoilType::A => 0.75,
            SoilType::B => 1.0,
            SoilType::C => 1.5,
        }
    }

    pub fn slope_label(&self) -> &'static str {
        match self {
            SoilType::A => "3/4:1 (0.75H:1V)",
            SoilType::B => "1:1 (1H:1V)",
            SoilType::C => "1.5:1 (1.5H:1V)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SoilType::A => {
                "Cohesive soils with unconfined compressive strength ≥ 1.5 tsf \
                 (stiff clay, hardpan). No fissuring, no recent disturbance."
            }
            SoilType::B => {
                "Cohesive or granular with strength 0.5–1.5 tsf. Includes angular \
                 gravel, silty clay, previously disturbed Type A, or fissured soils."
            }
            SoilType::C => {
                "Cohesive soils with strength < 0.5 tsf, submerged soils, granular \
                 soils (sand, gravel), layered systems sloping into excavation, or \
                 soil subject to water infiltration."
            }
        }
    }
}

/// Protective system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectiveMethod {
    Slope,
    Bench,
    Shield,
}

impl ProtectiveMethod {
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "slope" => Ok(ProtectiveMethod::Slope),
            "bench" => Ok(ProtectiveMethod::Bench),
            "shield" => Ok(ProtectiveMethod::Shield),
            _ => Err(CalcError::invalid_input(
                "method",
                s,
                "method must be 'slope', 'bench', or 'shield'",
            )),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ProtectiveMethod::Slope => "slope",
            ProtectiveMethod::Bench => "bench",
            ProtectiveMethod::Shield => "shield",
        }
    }
}

fn default_soil_type() -> String {
    "B".to_string()
}

fn default_method() -> String {
    "slope".to_string()
}

/// Input for [`trench_safety`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrenchSafetyInput {
    pub depth_ft: f64,
    #[serde(default = "default_soil_type")]
    pub soil_type: String,
    #[serde(default = "default_method")]
    pub method: String,
}

impl TrenchSafetyInput {
    pub fn new(depth_ft: f64, soil_type: &str, method: &str) -> Self {
        Self {
            depth_ft,
            soil_type: soil_type.to_string(),
            method: method.to_string(),
        }
    }
}

/// Protective system requirements. Which optional fields are present depends
/// on the method and soil type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrenchSafetyResult {
    pub depth_ft: f64,
    pub soil_type: String,
    pub soil_description: String,
    pub method: String,
    pub protective_system_required: bool,
    pub disclaimer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permitted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    // Sloping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_slope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_setback_each_side_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_top_width_ft: Option<f64>,

    // Benching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_vertical_cut_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bench_slope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_bench_width_ft: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

/// Protective system dimensions and notes for a trench.
///
/// # Errors
///
/// * `InvalidInput` - soil type not A/B/C, or method not slope/bench/shield
///
/// ```rust
/// use civil_core::calculations::safety::{trench_safety, TrenchSafetyInput};
///
/// let result = trench_safety(&TrenchSafetyInput::new(8.0, "b", "slope")).unwrap();
/// assert_eq!(result.horizontal_setback_each_side_ft, Some(8.0));
/// ```
pub fn trench_safety(input: &TrenchSafetyInput) -> CalcResult<TrenchSafetyResult> {
    let soil = SoilType::from_str_flexible(&input.soil_type)?;
    let method = ProtectiveMethod::from_str_flexible(&input.method)?;
    let depth = input.depth_ft;

    let mut result = TrenchSafetyResult {
        depth_ft: depth,
        soil_type: soil.key().to_string(),
        soil_description: soil.description().to_string(),
        method: method.key().to_string(),
        protective_system_required: depth > PROTECTION_THRESHOLD_FT,
        disclaimer: DISCLAIMER.to_string(),
        ..Default::default()
    };

    if depth <= PROTECTION_THRESHOLD_FT {
        result.note = Some(
            "Trench ≤ 4 ft: Protective system not required by OSHA, \
             but competent person must still evaluate hazards."
                .to_string(),
        );
        return Ok(result);
    }

    match method {
        ProtectiveMethod::Slope => {
            let setback = depth * soil.h_ratio();
            result.required_slope = Some(soil.slope_label().to_string());
            result.horizontal_setback_each_side_ft = Some(round_to(setback, 2));
            result.additional_top_width_ft = Some(round_to(2.0 * setback, 2));
            result.notes = vec![
                format!(
                    "Maximum slope {} - for every 1 ft of depth, trench top must be wider by {:?} ft on each side.",
                    soil.slope_label(),
                    soil.h_ratio()
                ),
                "Spoil must be placed minimum 2 ft from trench edge.".to_string(),
                "All surface encumbrances and underground utilities must be addressed before excavation."
                    .to_string(),
            ];
            if soil == SoilType::C {
                result.warning = Some(
                    "Type C requires 1.5:1 slope - excavation face will be 1.5× the depth on each \
                     side. Significant right-of-way may be needed."
                        .to_string(),
                );
            }
        }
        ProtectiveMethod::Bench if soil == SoilType::C => {
            result.permitted = Some(false);
            result.note = Some("Benching is NOT permitted in Type C soil per OSHA 1926 Appendix B.".to_string());
        }
        ProtectiveMethod::Bench => {
            result.permitted = Some(true);
            result.initial_vertical_cut_ft = Some(4.0);
            result.bench_slope = Some(soil.slope_label().to_string());
            result.minimum_bench_width_ft = Some(4.0);
            result.notes = owned(&[
                "Initial vertical cut: 4 ft maximum before first bench.",
                "Each bench minimum 4 ft horizontal width.",
                "Top of excavation may be sloped or vertical depending on soil type.",
                "Simple slope (no bench) also permitted to the slope ratio shown.",
            ]);
        }
        ProtectiveMethod::Shield => {
            result.permitted = Some(true);
            result.notes = owned(&[
                "Trench shields (boxes) permitted in all soil types.",
                "Shield must extend at least 18 inches above the top of unstable soil.",
                "Workers must not be in the shield during movement.",
                "Do not place workers in front of or behind shield during repositioning.",
                "Shield must be designed by a registered PE or meet tabulated data requirements.",
                "Spoil setback: minimum 2 ft from trench edge.",
            ]);
        }
    }

    Ok(result)
}

/// Spoil placement rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoilSetback {
    pub minimum_setback_ft: f64,
    pub rule: String,
    pub note: String,
}

/// OSHA spoil setback requirement, 1926.651(j)(2).
pub fn spoil_setback_required() -> SpoilSetback {
    SpoilSetback {
        minimum_setback_ft: SPOIL_SETBACK_FT,
        rule: "OSHA 29 CFR 1926.651(j)(2)".to_string(),
        note: "Spoils, equipment, and materials must be kept at least 2 ft from the edge of an excavation."
            .to_string(),
    }
}

/// Items a competent person evaluates per OSHA 1926.651.
pub fn competent_person_checklist() -> Vec<String> {
    owned(&[
        "Soil classification (visual and manual tests per Appendix A)",
        "Surface encumbrances removed or supported",
        "Underground utilities located and protected",
        "Access and egress within 25 ft of workers for trenches ≤ 4 ft deep; required for deeper",
        "Water accumulation - dewatering if present",
        "Adjacent structures evaluated for stability",
        "Atmosphere testing if >4 ft and hazardous atmosphere suspected",
        "Daily inspection before work and after rain/freeze-thaw events",
        "Spoils placed minimum 2 ft from trench edge",
        "Protective system in place and inspected",
    ])
}
