//! # Estimator Settings
//!
//! Defaults applied when a request leaves a value out. Settings are plain
//! serde data so a front end can load them from a JSON file.
//!
//! ## Example
//!
//! ```rust
//! use civil_core::settings::EstimatorSettings;
//!
//! let settings: EstimatorSettings = serde_json::from_str(r#"{"default_region": "utah"}"#).unwrap();
//! assert_eq!(settings.default_region, "utah");
//! assert_eq!(settings.default_markup, 0.15);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Estimator-wide defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorSettings {
    /// Region slug used when a request names none
    pub default_region: String,

    /// Overhead & profit fraction for project estimates (0.15 = 15%)
    pub default_markup: f64,

    /// Concrete strength class (psi) when a volume request names none
    pub concrete_psi_default: u32,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        EstimatorSettings {
            default_region: "national".to_string(),
            default_markup: 0.15,
            concrete_psi_default: 4000,
        }
    }
}

impl EstimatorSettings {
    /// Validate settings values.
    pub fn validate(&self) -> CalcResult<()> {
        if self.default_region.trim().is_empty() {
            return Err(CalcError::invalid_input(
                "default_region",
                &self.default_region,
                "Default region cannot be empty",
            ));
        }
        if !self.default_markup.is_finite() || self.default_markup < 0.0 {
            return Err(CalcError::invalid_input(
                "default_markup",
                self.default_markup.to_string(),
                "Markup must be a non-negative fraction",
            ));
        }
        Ok(())
    }

    /// Load and validate settings from a JSON file.
    pub fn load(path: &Path) -> CalcResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CalcError::invalid_input("settings", path.display().to_string(), e.to_string())
        })?;
        let settings: EstimatorSettings = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EstimatorSettings::default();
        assert_eq!(settings.default_region, "national");
        assert_eq!(settings.concrete_psi_default, 4000);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: EstimatorSettings =
            serde_json::from_str(r#"{"default_markup": 0.2}"#).unwrap();
        assert_eq!(settings.default_markup, 0.2);
        assert_eq!(settings.default_region, "national");
    }

    #[test]
    fn test_negative_markup_rejected() {
        let settings = EstimatorSettings {
            default_markup: -0.1,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
