//! # Field Engineering Equations
//!
//! Closed-form formulas shared by the calculators. Calculation modules handle
//! input, rounding and presentation on top of these.
//!
//! ## Modules
//!
//! - [`manning`] - Manning's equation and circular-pipe flow geometry
//!
//! ## Units
//!
//! US customary throughout: feet, square feet, cubic feet per second, ft/ft
//! slopes. Pipe diameters arrive in inches and are converted by the caller.

pub mod manning;

pub use manning::{
    central_angle,
    full_section,
    manning_flow,
    manning_slope_for_flow,
    manning_slope_for_velocity,
    partial_section,
    FlowSection,
    GPM_PER_CFS,
    MGD_PER_CFS,
};
