//! # Shear Engine
//!
//! Vertical stirrup design per IS 456 40.
//!
//! ## Procedure
//!
//! 1. Nominal shear stress τv = Vu / (b d)
//! 2. Design shear strength of concrete τc from Table 19, interpolated on
//!    the tension steel percentage and concrete grade
//! 3. τv > τc,max (Table 20) is unsafe whatever the stirrups
//! 4. τv ≤ τc: minimum stirrups (26.5.1.6)
//! 5. τv > τc: Vus = Vu - τc b d, sv = 0.87 fy Asv d / Vus (40.4a)
//! 6. Spacing capped at min(0.75 d, 300 mm) and rounded down
//!
//! ## Example
//!
//! ```rust
//! use rcbeam_core::calculations::shear::{calculate, ShearInput};
//! use rcbeam_core::materials::Material;
//! use rcbeam_core::section::Section;
//! use rcbeam_core::settings::ShearSettings;
//!
//! let input = ShearInput::new(
//!     Section::rectangular(300.0, 450.0, 410.0, 25.0),
//!     Material::new(25.0, 500.0),
//!     90.0,
//!     0.63,
//! );
//! let result = calculate(&input, &ShearSettings::default()).unwrap();
//! assert!(result.is_safe);
//! assert!(result.stirrups_designed);
//! assert_eq!(result.spacing_mm, 300.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::code_refs;
use crate::errors::{no_errors, CalcError, CalcResult, DesignError, DesignStage, ErrorCode};
use crate::materials::rebar::{bar_area_mm2, is_standard_diameter};
use crate::materials::{Material, STEEL_DESIGN_FACTOR};
use crate::section::Section;
use crate::settings::ShearSettings;
use crate::tables::design_tables;
use crate::units::{kn_to_n, n_to_kn};

/// Asv / (b sv) ≥ 0.4 / (0.87 fy)
const MIN_SHEAR_STRESS_MPA: f64 = 0.4;

/// Vertical stirrup choice: bar diameter and number of legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StirrupSpec {
    pub diameter_mm: u32,
    pub legs: u32,
}

impl Default for StirrupSpec {
    fn default() -> Self {
        StirrupSpec {
            diameter_mm: 8,
            legs: 2,
        }
    }
}

impl StirrupSpec {
    pub fn new(diameter_mm: u32, legs: u32) -> Self {
        StirrupSpec { diameter_mm, legs }
    }

    /// Total leg area Asv (mm²)
    pub fn area_mm2(&self) -> f64 {
        self.legs as f64 * bar_area_mm2(self.diameter_mm)
    }

    pub fn validate(&self) -> CalcResult<()> {
        if !is_standard_diameter(self.diameter_mm) {
            return Err(CalcError::invalid_input(
                "stirrup.diameter_mm",
                self.diameter_mm.to_string(),
                "Not a standard bar diameter",
            ));
        }
        if self.legs < 2 {
            return Err(CalcError::invalid_input(
                "stirrup.legs",
                self.legs.to_string(),
                "Stirrups need at least two legs",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for StirrupSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}L-{}φ", self.legs, self.diameter_mm)
    }
}

/// Input parameters for the shear engine.
///
/// ## JSON Example
///
/// ```json
/// {
///   "section": { "width_mm": 300.0, "overall_depth_mm": 450.0,
///                "effective_depth_mm": 410.0, "cover_mm": 25.0 },
///   "material": { "fck_mpa": 25.0, "fy_mpa": 500.0 },
///   "shear_kn": 90.0,
///   "tension_steel_percent": 0.63,
///   "stirrup": { "diameter_mm": 8, "legs": 2 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShearInput {
    pub section: Section,
    pub material: Material,

    /// Factored shear force (kN); the sign is ignored
    pub shear_kn: f64,

    /// 100 Ast / (b d) of the tension steel at the section
    pub tension_steel_percent: f64,

    #[serde(default)]
    pub stirrup: StirrupSpec,
}

impl ShearInput {
    pub fn new(section: Section, material: Material, shear_kn: f64, tension_steel_percent: f64) -> Self {
        ShearInput {
            section,
            material,
            shear_kn,
            tension_steel_percent,
            stirrup: StirrupSpec::default(),
        }
    }

    pub fn with_stirrup(mut self, stirrup: StirrupSpec) -> Self {
        self.stirrup = stirrup;
        self
    }

    pub fn validate(&self) -> CalcResult<()> {
        self.section.validate()?;
        self.material.validate()?;
        self.stirrup.validate()?;
        if !self.shear_kn.is_finite() {
            return Err(CalcError::invalid_input(
                "shear_kn",
                self.shear_kn.to_string(),
                "Shear must be a finite number",
            ));
        }
        if !(self.tension_steel_percent >= 0.0 && self.tension_steel_percent.is_finite()) {
            return Err(CalcError::invalid_input(
                "tension_steel_percent",
                self.tension_steel_percent.to_string(),
                "Steel percentage must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Which rule set the adopted stirrup spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpacingGovernor {
    /// Shear carried by stirrups (40.4a)
    Strength,
    /// Minimum shear reinforcement (26.5.1.6)
    MinimumSteel,
    /// Maximum spacing min(0.75 d, 300) (26.5.1.5)
    MaximumSpacing,
}

/// Stirrup spacing for a given shear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacingDesign {
    /// Shear to be carried by stirrups Vus (kN), zero when τv ≤ τc
    pub vus_kn: f64,
    /// Spacing from 40.4(a), None when stirrups carry no shear
    pub strength_spacing_mm: Option<f64>,
    /// Spacing giving the minimum shear reinforcement
    pub minimum_spacing_mm: f64,
    /// min(0.75 d, 300)
    pub maximum_spacing_mm: f64,
    /// Adopted spacing, rounded down
    pub spacing_mm: f64,
    pub governed_by: SpacingGovernor,
}

/// Results from the shear engine.
///
/// ## JSON Example
///
/// ```json
/// {
///   "shear_kn": 90.0,
///   "tau_v_mpa": 0.732,
///   "tau_c_mpa": 0.53,
///   "tau_c_max_mpa": 3.1,
///   "steel_percent_used": 0.63,
///   "stirrups_designed": true,
///   "stirrup": { "diameter_mm": 8, "legs": 2 },
///   "spacing_mm": 300.0,
///   "is_safe": true,
///   "errors": []
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShearResult {
    /// Magnitude of the design shear (kN)
    pub shear_kn: f64,
    pub tau_v_mpa: f64,
    pub tau_c_mpa: f64,
    pub tau_c_max_mpa: f64,
    /// Steel percentage used for the τc lookup (after clamping)
    pub steel_percent_used: f64,
    /// True when τv > τc and stirrups are designed for Vus
    pub stirrups_designed: bool,
    pub stirrup: StirrupSpec,
    pub design: SpacingDesign,
    /// Adopted stirrup spacing (mm)
    pub spacing_mm: f64,
    pub errors: Vec<DesignError>,
    pub is_safe: bool,
}

impl ShearResult {
    /// Shear carried by stirrups (kN)
    pub fn vus_kn(&self) -> f64 {
        self.design.vus_kn
    }
}

/// Design shear strength of concrete τc (N/mm²) with a clamp warning.
pub fn concrete_shear_strength(fck_mpa: f64, steel_percent: f64) -> (f64, f64, Option<DesignError>) {
    let lookup = design_tables().tau_c.lookup(steel_percent, fck_mpa);
    let warning = lookup.row_clamp.map(|clamp| {
        tracing::warn!(requested = clamp.requested, used = clamp.used, "τc steel percentage clamped");
        DesignError::warning(
            ErrorCode::SteelPercentClamped,
            DesignStage::Shear,
            format!(
                "Steel percentage {:.2}% outside Table 19; {:.2}% used",
                clamp.requested, clamp.used
            ),
            code_refs::SHEAR_STRENGTH,
        )
    });
    let used = lookup.row_clamp.map_or(steel_percent, |c| c.used);
    (lookup.value, used, warning)
}

/// Maximum shear stress τc,max (N/mm²), Table 20
pub fn maximum_shear_stress(fck_mpa: f64) -> f64 {
    design_tables().tau_c_max.lookup(fck_mpa).value
}

fn round_down(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    let rounded = (value / step).floor() * step;
    if rounded > 0.0 {
        rounded
    } else {
        value
    }
}

/// Stirrup spacing for shear `shear_kn` given τc.
///
/// Shared by the shear engine and the stirrup zoning in detailing.
pub fn required_spacing_for(
    section: &Section,
    material: &Material,
    shear_kn: f64,
    tau_c_mpa: f64,
    stirrup: StirrupSpec,
    settings: &ShearSettings,
) -> SpacingDesign {
    let b = section.width_mm;
    let d = section.effective_depth_mm;
    let fy = material.fy_mpa.min(settings.stirrup_fy_cap_mpa);
    let asv = stirrup.area_mm2();

    let vus = (kn_to_n(shear_kn.abs()) - tau_c_mpa * b * d).max(0.0);
    let strength = (vus > 0.0).then(|| STEEL_DESIGN_FACTOR * fy * asv * d / vus);
    let minimum = STEEL_DESIGN_FACTOR * fy * asv / (MIN_SHEAR_STRESS_MPA * b);
    let maximum = (settings.max_spacing_depth_factor * d).min(settings.max_spacing_mm);

    let (mut raw, mut governed_by) = match strength {
        Some(sv) if sv < minimum => (sv, SpacingGovernor::Strength),
        _ => (minimum, SpacingGovernor::MinimumSteel),
    };
    if maximum < raw {
        raw = maximum;
        governed_by = SpacingGovernor::MaximumSpacing;
    }

    SpacingDesign {
        vus_kn: n_to_kn(vus),
        strength_spacing_mm: strength,
        minimum_spacing_mm: minimum,
        maximum_spacing_mm: maximum,
        spacing_mm: round_down(raw, settings.spacing_round_mm),
        governed_by,
    }
}

/// Calculate the stirrup requirement.
///
/// # Returns
///
/// * `Ok(ShearResult)` - Design with diagnostics; `is_safe` is false when
///   τv exceeds τc,max
/// * `Err(CalcError)` - Invalid input
pub fn calculate(input: &ShearInput, settings: &ShearSettings) -> CalcResult<ShearResult> {
    input.validate()?;

    let section = &input.section;
    let material = &input.material;
    let b = section.width_mm;
    let d = section.effective_depth_mm;
    let vu = input.shear_kn.abs();
    let mut errors = Vec::new();

    let tau_v = kn_to_n(vu) / (b * d);
    let (tau_c, steel_percent_used, clamp_warning) =
        concrete_shear_strength(material.fck_mpa, input.tension_steel_percent);
    errors.extend(clamp_warning);
    let tau_c_max = maximum_shear_stress(material.fck_mpa);

    if tau_v > tau_c_max {
        errors.push(DesignError::error(
            ErrorCode::ShearStressExceedsMax,
            DesignStage::Shear,
            format!(
                "τv = {:.2} N/mm² exceeds τc,max = {:.2} N/mm²; section must be enlarged",
                tau_v, tau_c_max
            ),
            code_refs::MAX_SHEAR_STRESS,
        ));
    }

    let design = required_spacing_for(section, material, vu, tau_c, input.stirrup, settings);
    let stirrups_designed = tau_v > tau_c;

    if vu == 0.0 {
        errors.push(DesignError::info(
            ErrorCode::ZeroShear,
            DesignStage::Shear,
            "Zero design shear; minimum stirrups provided",
            code_refs::NOMINAL_SHEAR,
        ));
    } else if !stirrups_designed {
        errors.push(DesignError::info(
            ErrorCode::MinimumStirrupsGovern,
            DesignStage::Shear,
            format!(
                "τv = {:.3} N/mm² ≤ τc = {:.3} N/mm²; minimum stirrups provided",
                tau_v, tau_c
            ),
            code_refs::MIN_SHEAR_REINFORCEMENT,
        ));
    }
    if design.governed_by == SpacingGovernor::MaximumSpacing {
        errors.push(DesignError::info(
            ErrorCode::MaxSpacingGoverns,
            DesignStage::Shear,
            format!("Spacing limited to {:.0} mm", design.maximum_spacing_mm),
            code_refs::MAX_STIRRUP_SPACING,
        ));
    }

    tracing::debug!(
        shear_kn = vu,
        tau_v,
        tau_c,
        spacing = design.spacing_mm,
        "shear design complete"
    );

    let is_safe = no_errors(&errors);
    Ok(ShearResult {
        shear_kn: vu,
        tau_v_mpa: tau_v,
        tau_c_mpa: tau_c,
        tau_c_max_mpa: tau_c_max,
        steel_percent_used,
        stirrups_designed,
        stirrup: input.stirrup,
        design,
        spacing_mm: design.spacing_mm,
        errors,
        is_safe,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(shear_kn: f64, pt: f64) -> ShearInput {
        ShearInput::new(
            Section::rectangular(300.0, 450.0, 410.0, 25.0),
            Material::new(25.0, 500.0),
            shear_kn,
            pt,
        )
    }

    fn run(shear_kn: f64, pt: f64) -> ShearResult {
        calculate(&input(shear_kn, pt), &ShearSettings::default()).unwrap()
    }

    #[test]
    fn test_scenario_stirrups_designed() {
        let r = run(90.0, 0.627);
        assert!((r.tau_v_mpa - 0.7317).abs() < 1e-3);
        assert!(r.tau_c_mpa > 0.50 && r.tau_c_mpa < 0.56);
        assert!(r.stirrups_designed);
        assert!(r.vus_kn() > 20.0 && r.vus_kn() < 30.0);
        assert_eq!(r.spacing_mm, 300.0);
        assert_eq!(r.design.governed_by, SpacingGovernor::MaximumSpacing);
        assert!(r.is_safe);
        assert!(r.errors.iter().all(|e| !e.is_error()));
    }

    #[test]
    fn test_zero_shear_minimum_stirrups() {
        let r = run(0.0, 0.5);
        assert!(r.is_safe);
        assert!(!r.stirrups_designed);
        assert!(r.spacing_mm > 0.0);
        let zero = r.errors.iter().find(|e| e.code == ErrorCode::ZeroShear).unwrap();
        assert_eq!(zero.clause, code_refs::NOMINAL_SHEAR);
    }

    #[test]
    fn test_low_shear_minimum_governs() {
        let r = run(40.0, 0.5);
        assert!(!r.stirrups_designed);
        assert!(r.errors.iter().any(|e| e.code == ErrorCode::MinimumStirrupsGovern));
        assert_eq!(r.design.vus_kn, 0.0);
    }

    #[test]
    fn test_high_shear_strength_governs() {
        let r = run(250.0, 1.0);
        assert_eq!(r.design.governed_by, SpacingGovernor::Strength);
        assert!(r.spacing_mm < 150.0);
        assert_eq!(r.spacing_mm % 5.0, 0.0);
        assert!(r.spacing_mm <= r.design.strength_spacing_mm.unwrap());
    }

    #[test]
    fn test_exceeds_maximum_shear_stress() {
        // τc,max for M25 = 3.1; 300 × 410 × 3.1 = 381 kN
        let r = run(400.0, 1.0);
        assert!(!r.is_safe);
        assert!(r.errors.iter().any(|e| e.code == ErrorCode::ShearStressExceedsMax));
    }

    #[test]
    fn test_steel_percent_clamped_warns() {
        let r = run(90.0, 4.0);
        assert!(r.is_safe);
        assert_eq!(r.steel_percent_used, 3.0);
        assert!(r.errors.iter().any(|e| e.code == ErrorCode::SteelPercentClamped));
    }

    #[test]
    fn test_tau_c_table_values() {
        let (tc, _, w) = concrete_shear_strength(25.0, 0.5);
        assert!((tc - 0.49).abs() < 1e-9);
        assert!(w.is_none());
        // M40 column covers higher grades
        let (tc, _, w) = concrete_shear_strength(50.0, 1.0);
        assert!((tc - 0.68).abs() < 1e-9);
        assert!(w.is_none());
    }

    #[test]
    fn test_stirrup_fy_capped() {
        let a = calculate(&input(200.0, 1.0), &ShearSettings::default()).unwrap();
        let mut high = input(200.0, 1.0);
        high.material = Material::new(25.0, 550.0);
        let b = calculate(&high, &ShearSettings::default()).unwrap();
        assert_eq!(a.design.strength_spacing_mm, b.design.strength_spacing_mm);
    }

    #[test]
    fn test_negative_shear_uses_magnitude() {
        assert_eq!(run(-90.0, 0.627).spacing_mm, run(90.0, 0.627).spacing_mm);
    }

    #[test]
    fn test_invalid_stirrup_rejected() {
        let bad = input(90.0, 0.5).with_stirrup(StirrupSpec::new(9, 2));
        assert!(calculate(&bad, &ShearSettings::default()).is_err());
        let bad = input(90.0, 0.5).with_stirrup(StirrupSpec::new(8, 1));
        assert!(calculate(&bad, &ShearSettings::default()).is_err());
    }
}
