//! # Manning's Equation
//!
//! Gravity-flow formulas for circular pipe, full and partially full.
//!
//! ## Notation
//!
//! - `Q` = Flow rate (cfs)
//! - `n` = Manning's roughness coefficient
//! - `A` = Cross-sectional flow area (sf)
//! - `P` = Wetted perimeter (ft)
//! - `R` = Hydraulic radius A/P (ft)
//! - `S` = Slope of the energy grade line, taken as pipe slope (ft/ft)
//! - `D` = Pipe inside diameter (ft), `r = D/2`
//! - `θ` = Central angle subtended by the water surface (radians)
//!
//! ## References
//!
//! - ASCE MOP 36: Gravity Sanitary Sewer Design and Construction
//! - Recommended Standards for Wastewater Facilities (10 States Standards)

use std::f64::consts::PI;

/// Gallons per minute in one cubic foot per second
pub const GPM_PER_CFS: f64 = 448.831;

/// Million gallons per day in one cubic foot per second
pub const MGD_PER_CFS: f64 = 0.646317;

/// Flow area and hydraulic radius of a (possibly partial) circular section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSection {
    /// Flow area (sf)
    pub area_sf: f64,
    /// Hydraulic radius (ft)
    pub hydraulic_radius_ft: f64,
}

/// Manning's equation solved for flow
///
/// # Formula
/// Q = (1/n) × A × R^(2/3) × S^(1/2)
///
/// # Example
/// ```rust
/// use civil_core::equations::manning::{full_section, manning_flow};
///
/// // 12" concrete pipe at 0.5%
/// let section = full_section(1.0);
/// let q = manning_flow(section.area_sf, section.hydraulic_radius_ft, 0.005, 0.013);
/// assert!(q > 1.5 && q < 1.8);
/// ```
#[inline]
pub fn manning_flow(area_sf: f64, hydraulic_radius_ft: f64, slope: f64, n: f64) -> f64 {
    (1.0 / n) * area_sf * hydraulic_radius_ft.powf(2.0 / 3.0) * slope.powf(0.5)
}

/// Manning's equation solved for slope given a flow
///
/// # Formula
/// S = (Q × n / (A × R^(2/3)))²
#[inline]
pub fn manning_slope_for_flow(
    flow_cfs: f64,
    area_sf: f64,
    hydraulic_radius_ft: f64,
    n: f64,
) -> f64 {
    ((flow_cfs * n) / (area_sf * hydraulic_radius_ft.powf(2.0 / 3.0))).powi(2)
}

/// Manning's equation solved for slope given a velocity
///
/// # Formula
/// S = (V × n / R^(2/3))²
#[inline]
pub fn manning_slope_for_velocity(velocity_fps: f64, hydraulic_radius_ft: f64, n: f64) -> f64 {
    ((velocity_fps * n) / hydraulic_radius_ft.powf(2.0 / 3.0)).powi(2)
}

/// Full circular pipe section
///
/// ```text
///       ___
///     /     \
///    |   D   |   A = πr²
///     \ ___ /    P = πD
///                R = D/4
/// ```
///
/// The hydraulic radius is returned as exactly D/4 rather than A/P.
#[inline]
pub fn full_section(diameter_ft: f64) -> FlowSection {
    let r = diameter_ft / 2.0;
    FlowSection {
        area_sf: PI * r * r,
        hydraulic_radius_ft: diameter_ft / 4.0,
    }
}

/// Central angle subtended by the water surface chord
///
/// # Formula
/// θ = 2 × acos(1 − 2 × d/D)
#[inline]
pub fn central_angle(depth_ratio: f64) -> f64 {
    2.0 * (1.0 - 2.0 * depth_ratio).acos()
}

/// Partially full circular pipe section (circular segment)
///
/// ```text
///       ___
///     /     \
///    |       |
///    |~~~~~~~|  ← water surface at depth d
///     \_____/
/// ```
///
/// # Formula
/// A = (r²/2)(θ − sin θ)
/// P = rθ
/// R = A/P (0 when P = 0)
pub fn partial_section(diameter_ft: f64, depth_ratio: f64) -> FlowSection {
    let r = diameter_ft / 2.0;
    let theta = central_angle(depth_ratio);
    let area_sf = (r * r / 2.0) * (theta - theta.sin());
    let perimeter_ft = r * theta;
    let hydraulic_radius_ft = if perimeter_ft > 0.0 { area_sf / perimeter_ft } else { 0.0 };

    FlowSection {
        area_sf,
        hydraulic_radius_ft,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_section() {
        let s = full_section(1.0);
        assert!((s.area_sf - 0.785398).abs() < 1e-6);
        assert_eq!(s.hydraulic_radius_ft, 0.25);
    }

    #[test]
    fn test_partial_section_at_full_depth() {
        let full = full_section(2.0);
        let partial = partial_section(2.0, 1.0);
        assert!((full.area_sf - partial.area_sf).abs() < 1e-9);
        assert!((full.hydraulic_radius_ft - partial.hydraulic_radius_ft).abs() < 1e-9);
    }

    #[test]
    fn test_half_full_radius_equals_full() {
        // Half-full circle has the same A/P as the full pipe
        let half = partial_section(1.0, 0.5);
        assert!((half.area_sf - PI / 8.0).abs() < 1e-9);
        assert!((half.hydraulic_radius_ft - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_zero_depth_is_degenerate() {
        let s = partial_section(1.0, 0.0);
        assert_eq!(s.area_sf, 0.0);
        assert_eq!(s.hydraulic_radius_ft, 0.0);
    }

    #[test]
    fn test_slope_inverts_flow() {
        let s = full_section(1.5);
        let q = manning_flow(s.area_sf, s.hydraulic_radius_ft, 0.004, 0.013);
        let slope = manning_slope_for_flow(q, s.area_sf, s.hydraulic_radius_ft, 0.013);
        assert!((slope - 0.004).abs() < 1e-12);
    }
}
