//! # Materials
//!
//! Concrete and reinforcing steel definitions for IS 456 design.
//!
//! ## Material Types
//!
//! - **Concrete**: characteristic cube strength fck, M15 to M80
//! - **Reinforcement**: Fe250 (mild steel), Fe415 / Fe500 / Fe550 (HYSD)
//! - **Rebar catalogue**: standard diameters, areas, unit masses ([`rebar`])
//!
//! ## Example
//!
//! ```rust
//! use rcbeam_core::materials::{Material, SteelGrade};
//!
//! let m = Material::new(25.0, 500.0);
//! assert!(m.validate().is_ok());
//! assert_eq!(m.steel_grade().unwrap(), SteelGrade::Fe500);
//! assert!((m.xu_max_ratio().unwrap() - 0.46).abs() < 1e-12);
//! ```

pub mod rebar;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Modulus of elasticity of reinforcement (N/mm²)
pub const ES_MPA: f64 = 200_000.0;

/// Ultimate compressive strain in concrete in flexure
pub const CONCRETE_ULTIMATE_STRAIN: f64 = 0.0035;

/// Partial safety factor for steel (0.87 = 1 / 1.15)
pub const STEEL_DESIGN_FACTOR: f64 = 0.87;

/// Average compressive stress of the rectangular-parabolic block, as a factor of fck
pub const STRESS_BLOCK_FACTOR: f64 = 0.36;

/// Depth of the block resultant, as a factor of xu
pub const STRESS_BLOCK_CENTROID: f64 = 0.42;

/// Design compressive strength of concrete, as a factor of fck (0.67 / 1.5)
pub const CONCRETE_DESIGN_FACTOR: f64 = 0.67 / 1.5;

/// Density of plain concrete (kg/m³)
pub const CONCRETE_DENSITY_KG_M3: f64 = 2400.0;

/// Supported grades of reinforcing steel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SteelGrade {
    /// Mild steel, plain bars
    Fe250,
    /// High yield strength deformed bars
    Fe415,
    Fe500,
    Fe550,
}

impl SteelGrade {
    pub const ALL: [SteelGrade; 4] = [
        SteelGrade::Fe250,
        SteelGrade::Fe415,
        SteelGrade::Fe500,
        SteelGrade::Fe550,
    ];

    /// Characteristic yield strength fy (N/mm²)
    pub fn fy_mpa(&self) -> f64 {
        match self {
            SteelGrade::Fe250 => 250.0,
            SteelGrade::Fe415 => 415.0,
            SteelGrade::Fe500 => 500.0,
            SteelGrade::Fe550 => 550.0,
        }
    }

    /// Match a numeric yield strength to a supported grade
    pub fn from_fy(fy_mpa: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.fy_mpa() == fy_mpa)
    }

    /// HYSD bars have a cold-worked stress-strain curve and deformed surface
    pub fn is_deformed(&self) -> bool {
        !matches!(self, SteelGrade::Fe250)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SteelGrade::Fe250 => "Fe250",
            SteelGrade::Fe415 => "Fe415",
            SteelGrade::Fe500 => "Fe500",
            SteelGrade::Fe550 => "Fe550",
        }
    }

    /// xu,max / d (IS 456 38.1 Note)
    ///
    /// Tabulated values for Fe250/415/500; Fe550 uses the strain relation
    /// 0.0035 / (0.0055 + 0.87 fy / Es).
    pub fn xu_max_ratio(&self) -> f64 {
        match self {
            SteelGrade::Fe250 => 0.53,
            SteelGrade::Fe415 => 0.48,
            SteelGrade::Fe500 => 0.46,
            SteelGrade::Fe550 => {
                let fyd = STEEL_DESIGN_FACTOR * self.fy_mpa();
                CONCRETE_ULTIMATE_STRAIN / (0.0055 + fyd / ES_MPA)
            }
        }
    }

    /// Design stress (N/mm²) at a given strain, per the IS 456 design curves.
    ///
    /// Mild steel is elastic-perfectly plastic. Cold-worked bars follow
    /// Fig. 23A: stress levels of 0.80 to 1.00 fyd reached at the listed
    /// inelastic strains on top of the elastic strain.
    pub fn design_stress(&self, strain: f64) -> f64 {
        let sign = strain.signum();
        let strain = strain.abs();
        let fyd = STEEL_DESIGN_FACTOR * self.fy_mpa();

        let stress = if !self.is_deformed() {
            (ES_MPA * strain).min(fyd)
        } else {
            const LEVELS: [f64; 6] = [0.80, 0.85, 0.90, 0.95, 0.975, 1.0];
            const INELASTIC: [f64; 6] = [0.0, 0.0001, 0.0003, 0.0007, 0.0010, 0.0020];

            let point = |i: usize| {
                let s = LEVELS[i] * fyd;
                (s / ES_MPA + INELASTIC[i], s)
            };

            let (elastic_limit, _) = point(0);
            if strain <= elastic_limit {
                ES_MPA * strain
            } else {
                let mut stress = fyd;
                for i in 1..LEVELS.len() {
                    let (ea, sa) = point(i - 1);
                    let (eb, sb) = point(i);
                    if strain <= eb {
                        stress = sa + (sb - sa) * (strain - ea) / (eb - ea);
                        break;
                    }
                }
                stress
            }
        };
        sign * stress
    }
}

impl std::fmt::Display for SteelGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Concrete and steel grades of a beam.
///
/// Shared by value; not owned by any single section.
///
/// ## JSON Example
///
/// ```json
/// { "fck_mpa": 25.0, "fy_mpa": 500.0 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Characteristic cube strength of concrete (N/mm²), e.g. 25 for M25
    pub fck_mpa: f64,
    /// Characteristic yield strength of main reinforcement (N/mm²)
    pub fy_mpa: f64,
}

/// Supported concrete grade range (N/mm²)
pub const MIN_CONCRETE_GRADE: f64 = 15.0;
pub const MAX_CONCRETE_GRADE: f64 = 80.0;

impl Material {
    pub fn new(fck_mpa: f64, fy_mpa: f64) -> Self {
        Material { fck_mpa, fy_mpa }
    }

    /// Validate grades against the supported ranges.
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.fck_mpa >= MIN_CONCRETE_GRADE && self.fck_mpa <= MAX_CONCRETE_GRADE) {
            return Err(CalcError::invalid_input(
                "fck_mpa",
                self.fck_mpa.to_string(),
                format!(
                    "Concrete grade must be between M{} and M{}",
                    MIN_CONCRETE_GRADE, MAX_CONCRETE_GRADE
                ),
            ));
        }
        self.steel_grade()?;
        Ok(())
    }

    /// Supported steel grade for `fy_mpa`
    pub fn steel_grade(&self) -> CalcResult<SteelGrade> {
        SteelGrade::from_fy(self.fy_mpa).ok_or_else(|| {
            CalcError::unsupported_material(
                format!("fy = {} N/mm²", self.fy_mpa),
                "Steel grade must be one of Fe250, Fe415, Fe500, Fe550",
            )
        })
    }

    /// xu,max / d for the steel grade
    pub fn xu_max_ratio(&self) -> CalcResult<f64> {
        Ok(self.steel_grade()?.xu_max_ratio())
    }

    /// Design yield stress 0.87 fy (N/mm²)
    pub fn fyd(&self) -> f64 {
        STEEL_DESIGN_FACTOR * self.fy_mpa
    }

    /// Design compressive strength of concrete 0.447 fck (N/mm²)
    pub fn fcd(&self) -> f64 {
        CONCRETE_DESIGN_FACTOR * self.fck_mpa
    }

    /// Steel design stress at a strain (see [`SteelGrade::design_stress`])
    pub fn steel_stress(&self, strain: f64) -> CalcResult<f64> {
        Ok(self.steel_grade()?.design_stress(strain))
    }

    /// Short-term modulus of concrete Ec = 5000 √fck (N/mm²)
    pub fn ec_mpa(&self) -> f64 {
        5000.0 * self.fck_mpa.sqrt()
    }

    pub fn label(&self) -> String {
        format!("M{} / Fe{}", self.fck_mpa, self.fy_mpa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xu_max_ratios() {
        assert_eq!(SteelGrade::Fe250.xu_max_ratio(), 0.53);
        assert_eq!(SteelGrade::Fe415.xu_max_ratio(), 0.48);
        assert_eq!(SteelGrade::Fe500.xu_max_ratio(), 0.46);
        let fe550 = SteelGrade::Fe550.xu_max_ratio();
        assert!(fe550 > 0.43 && fe550 < 0.46);
    }

    #[test]
    fn test_mild_steel_elastic_plastic() {
        let g = SteelGrade::Fe250;
        assert!((g.design_stress(0.0005) - 100.0).abs() < 1e-9);
        assert!((g.design_stress(0.01) - 217.5).abs() < 1e-9);
    }

    #[test]
    fn test_cold_worked_curve_points() {
        // SP 16 Table A, Fe415: 0.00144 -> 288.7, 0.00380 -> 360.9
        let g = SteelGrade::Fe415;
        assert!((g.design_stress(0.00144) - 288.0).abs() < 1.0);
        assert!((g.design_stress(0.00380) - 360.9).abs() < 0.5);
        assert!((g.design_stress(0.01) - 0.87 * 415.0).abs() < 1e-9);
    }

    #[test]
    fn test_cold_worked_curve_is_monotonic() {
        let g = SteelGrade::Fe500;
        let mut prev = 0.0;
        for i in 0..100 {
            let s = g.design_stress(i as f64 * 0.0001);
            assert!(s >= prev);
            prev = s;
        }
    }

    #[test]
    fn test_negative_strain_is_symmetric() {
        let g = SteelGrade::Fe500;
        assert_eq!(g.design_stress(-0.002), -g.design_stress(0.002));
    }

    #[test]
    fn test_material_validation() {
        assert!(Material::new(25.0, 415.0).validate().is_ok());
        assert!(Material::new(10.0, 415.0).validate().is_err());
        assert!(Material::new(f64::NAN, 415.0).validate().is_err());
        let err = Material::new(25.0, 460.0).validate().unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_MATERIAL");
    }

    #[test]
    fn test_serialization() {
        let m = Material::new(30.0, 500.0);
        let json = serde_json::to_string(&m).unwrap();
        let roundtrip: Material = serde_json::from_str(&json).unwrap();
        assert_eq!(m, roundtrip);
    }
}
