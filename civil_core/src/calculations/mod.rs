//! # Site Calculations
//!
//! Field and estimating calculators for heavy civil work. Each calculator
//! follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable, defaults filled by serde)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `fn(&input) -> CalcResult<*Result>` - Pure calculation function
//!
//! ## Available Calculations
//!
//! - [`hydraulics`] - Manning's pipe flow, minimum slope, flow-to-slope
//! - [`earthwork`] - Trench quantities, thrust blocks, asphalt, concrete
//! - [`bid`] - Markup, unit price, T&M change orders, production, crew day
//! - [`safety`] - OSHA Subpart P trench protective systems (reference only)
//! - [`schedule`] - Phase schedule from a duration and start date

pub mod bid;
pub mod earthwork;
pub mod hydraulics;
pub mod safety;
pub mod schedule;

pub use bid::{change_order_tm, crew_day_cost, markup_bid_price, production_rate, unit_price};
pub use earthwork::{asphalt_tonnage, concrete_volume, thrust_block, trench_volume, Fitting};
pub use hydraulics::{flow_to_slope, mannings_n, minimum_slope, pipe_flow_full, pipe_flow_partial};
pub use safety::{competent_person_checklist, spoil_setback_required, trench_safety, SoilType};
pub use schedule::{build_schedule, ScheduleInput, ScheduleResult};
