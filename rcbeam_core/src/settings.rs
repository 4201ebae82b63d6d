//! # Design Settings
//!
//! Tunable constants for the engines. Every field has a serde default, so a
//! settings file only needs to list what it overrides:
//!
//! ```json
//! { "detailing": { "allowed_diameters": [12, 16, 20], "max_bars_per_layer": 5 } }
//! ```
//!
//! Defaults follow IS 456 practice; see each field for its source.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::materials::rebar::is_standard_diameter;

/// Root settings container passed to every engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DesignSettings {
    pub flexure: FlexureSettings,
    pub shear: ShearSettings,
    pub serviceability: ServiceabilitySettings,
    pub detailing: DetailingSettings,
}

impl DesignSettings {
    /// Parse settings from JSON, filling omitted fields with defaults
    pub fn from_json(json: &str) -> CalcResult<Self> {
        let settings: DesignSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> CalcResult<()> {
        if self.flexure.max_iterations == 0 {
            return Err(CalcError::invalid_input(
                "flexure.max_iterations",
                "0",
                "At least one iteration is required",
            ));
        }
        let d = &self.detailing;
        if d.allowed_diameters.is_empty() {
            return Err(CalcError::invalid_input(
                "detailing.allowed_diameters",
                "[]",
                "At least one bar diameter is required",
            ));
        }
        if let Some(bad) = d
            .allowed_diameters
            .iter()
            .chain([d.stirrup_diameter_mm, d.hanger_diameter_mm].iter())
            .find(|&&dia| !is_standard_diameter(dia))
        {
            return Err(CalcError::invalid_input(
                "detailing.allowed_diameters",
                bad.to_string(),
                "Not a standard bar diameter",
            ));
        }
        if d.min_bars < 2 || d.min_bars > d.max_bars {
            return Err(CalcError::invalid_input(
                "detailing.min_bars",
                d.min_bars.to_string(),
                "Need at least two bars and min_bars <= max_bars",
            ));
        }
        if d.max_layers == 0 || d.max_bars_per_layer < 2 {
            return Err(CalcError::invalid_input(
                "detailing.max_layers",
                d.max_layers.to_string(),
                "Need at least one layer of two bars",
            ));
        }
        if d.max_distinct_diameters == 0 || d.max_distinct_diameters > 2 {
            return Err(CalcError::invalid_input(
                "detailing.max_distinct_diameters",
                d.max_distinct_diameters.to_string(),
                "Supported values are 1 or 2",
            ));
        }
        Ok(())
    }
}

/// Flexure engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlexureSettings {
    /// Iteration cap for the doubly reinforced loop and the capacity solver
    pub max_iterations: u32,
    /// Relative convergence tolerance on moment and neutral axis depth
    pub tolerance: f64,
    /// Band around xu,max treated as balanced, as a fraction of xu,max
    pub balanced_band: f64,
}

impl Default for FlexureSettings {
    fn default() -> Self {
        FlexureSettings {
            max_iterations: 60,
            tolerance: 1.0e-6,
            balanced_band: 0.01,
        }
    }
}

/// Shear engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShearSettings {
    /// Absolute spacing cap (26.5.1.5), mm
    pub max_spacing_mm: f64,
    /// Spacing cap as a fraction of d (26.5.1.5)
    pub max_spacing_depth_factor: f64,
    /// Stirrup yield stress cap (40.4), N/mm²
    pub stirrup_fy_cap_mpa: f64,
    /// Spacings are rounded down to a multiple of this, mm
    pub spacing_round_mm: f64,
}

impl Default for ShearSettings {
    fn default() -> Self {
        ShearSettings {
            max_spacing_mm: 300.0,
            max_spacing_depth_factor: 0.75,
            stirrup_fy_cap_mpa: 415.0,
            spacing_round_mm: 5.0,
        }
    }
}

/// Serviceability engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceabilitySettings {
    /// Factored / service load ratio used to get the service moment
    pub service_load_factor: f64,
    /// Span/depth above this multiple of the allowable ratio is an ERROR
    pub hard_limit_factor: f64,
}

impl Default for ServiceabilitySettings {
    fn default() -> Self {
        ServiceabilitySettings {
            service_load_factor: 1.5,
            hard_limit_factor: 1.5,
        }
    }
}

/// Detailing engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailingSettings {
    /// Main bar diameters the selector may use, mm
    pub allowed_diameters: Vec<u32>,
    pub min_bars: u32,
    pub max_bars: u32,
    pub max_bars_per_layer: u32,
    pub max_layers: u32,
    /// 1 = single diameter per face, 2 = allow one secondary diameter
    pub max_distinct_diameters: u32,
    /// Nominal maximum size of coarse aggregate, mm
    pub aggregate_size_mm: f64,
    /// Support zone length as a multiple of d
    pub support_zone_factor: f64,
    pub stirrup_diameter_mm: u32,
    pub stirrup_legs: u32,
    /// Nominal bars on a face with no computed requirement, mm
    pub hanger_diameter_mm: u32,
    /// Spacer bar between layers, mm
    pub spacer_diameter_mm: u32,
    /// Spacer bars are placed at this pitch along the span, mm
    pub spacer_pitch_mm: f64,
    /// Bound on flexure re-checks when a second layer lowers d
    pub max_depth_rechecks: u32,
    /// Tension lap = factor × Ld, not less than 30φ
    pub tension_lap_factor: f64,
    /// Compression lap = factor × Ld, not less than 24φ
    pub compression_lap_factor: f64,
}

impl Default for DetailingSettings {
    fn default() -> Self {
        DetailingSettings {
            allowed_diameters: vec![10, 12, 16, 20, 25, 32],
            min_bars: 2,
            max_bars: 12,
            max_bars_per_layer: 6,
            max_layers: 2,
            max_distinct_diameters: 2,
            aggregate_size_mm: 20.0,
            support_zone_factor: 2.0,
            stirrup_diameter_mm: 8,
            stirrup_legs: 2,
            hanger_diameter_mm: 12,
            spacer_diameter_mm: 25,
            spacer_pitch_mm: 1000.0,
            max_depth_rechecks: 3,
            tension_lap_factor: 1.0,
            compression_lap_factor: 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(DesignSettings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = DesignSettings::from_json(r#"{ "detailing": { "max_bars_per_layer": 4 } }"#).unwrap();
        assert_eq!(s.detailing.max_bars_per_layer, 4);
        assert_eq!(s.detailing.stirrup_legs, 2);
        assert_eq!(s.shear.max_spacing_mm, 300.0);
    }

    #[test]
    fn test_rejects_nonstandard_diameter() {
        let result = DesignSettings::from_json(r#"{ "detailing": { "allowed_diameters": [18] } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let mut s = DesignSettings::default();
        s.flexure.max_iterations = 0;
        assert!(s.validate().is_err());
    }
}
