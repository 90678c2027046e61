//! # civil_core - Heavy Civil Estimating and Field Calculation Engine
//!
//! `civil_core` prices construction work from regional rate tables and runs
//! the everyday calculations of underground utility and sitework
//! contractors. All inputs and outputs are JSON-serializable, and every
//! calculator is exposed as a function-calling tool through [`tools`].
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Data-Driven Rates**: Built-in tables compiled from `data/rate_tables.toml`
//!
//! ## Quick Start
//!
//! ```rust
//! use civil_core::calculations::earthwork::{trench_volume, TrenchInput};
//!
//! let result = trench_volume(&TrenchInput::new(100.0, 3.0, 6.0)).unwrap();
//! assert_eq!(result.excavation_cy, 66.67);
//!
//! // Serialize to JSON for an agent or front end
//! let json = serde_json::to_string_pretty(&result).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`rates`] - Regional labor, material and equipment rate tables
//! - [`estimating`] - Line-item pricing and project estimates
//! - [`calculations`] - Hydraulics, earthwork, bid math, safety, scheduling
//! - [`equations`] - Manning's equation and circular section geometry
//! - [`units`] - Construction unit conversions
//! - [`tools`] - Tool schemas and the JSON dispatcher
//! - [`settings`] - Estimator defaults
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod equations;
pub mod errors;
pub mod estimating;
pub mod rates;
pub mod settings;
pub mod tools;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcError, CalcResult};
pub use estimating::{CostEstimator, EstimateInput, ProjectEstimate};
pub use rates::RateCatalog;
pub use settings::EstimatorSettings;
pub use tools::Toolbox;
