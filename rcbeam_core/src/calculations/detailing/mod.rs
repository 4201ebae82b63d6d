//! # Detailing Engine
//!
//! Turns required steel areas into bars and stirrups (IS 456 26).
//!
//! ## Procedure
//!
//! 1. Exposure checks on cover and concrete grade (Tables 16 and 5)
//! 2. Ductile mode raises the required areas to the IS 13920 minimum and
//!    drops bars below 12 mm from the allowed set
//! 3. Each face: deterministic bar selection (see [`bar_selection`]), or a
//!    fixed combination laid out as given. A face with no requirement gets
//!    two hanger bars.
//! 4. Stirrup zoning along the span from the governing shear
//! 5. Development and lap lengths for every diameter used
//! 6. Curtailment of the span tension bars
//! 7. Ductile checks on the final arrangement
//!
//! The revised effective depth of a face with two layers is reported through
//! [`FaceReinforcement::centroid_shift_mm`]; re-running flexure with it is the
//! pipeline's job.
//!
//! ## Example
//!
//! ```rust
//! use rcbeam_core::calculations::detailing::{calculate, DetailingInput};
//! use rcbeam_core::calculations::detailing::stirrups::ShearDemand;
//! use rcbeam_core::materials::Material;
//! use rcbeam_core::section::Section;
//! use rcbeam_core::settings::DesignSettings;
//!
//! let input = DetailingInput::new(
//!     Section::rectangular(300.0, 450.0, 410.0, 25.0),
//!     Material::new(25.0, 500.0),
//!     0.0,
//!     771.0,
//!     ShearDemand { shear_kn: 90.0, tau_c_mpa: 0.53, support_spacing_mm: 300.0 },
//! );
//! let result = calculate(&input, &DesignSettings::default()).unwrap();
//! assert!(result.is_ok);
//! assert_eq!(result.bottom.combination().unwrap().to_string(), "2-12φ + 7-10φ");
//! assert!(result.bottom.centroid_shift_mm() > 0.0);
//! ```

pub mod anchorage;
pub mod bar_selection;
pub mod curtailment;
pub mod ductile;
pub mod stirrups;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::calculations::flexure::TensionFace;
use crate::calculations::shear::StirrupSpec;
use crate::code_refs;
use crate::errors::{no_errors, CalcError, CalcResult, DesignError, DesignStage, ErrorCode};
use crate::materials::rebar::{bar_area_mm2, is_standard_diameter};
use crate::materials::Material;
use crate::section::{ExposureClass, Section, SupportCondition};
use crate::settings::DesignSettings;

use anchorage::{anchorage_for, development_length, Anchorage};
use bar_selection::{arrange_bars, select_bars, BarCombination, FaceGeometry, LayerPlan};
use curtailment::{curtail, CurtailmentPoint};
use ductile::DuctileLimits;
use stirrups::{
    merge_zones, stirrup_mass_kg_per_m, uniform_stirrups, zone_stirrups, ShearDemand, SpacingCaps,
    StirrupArrangement, ZoneTag,
};

/// How the bars of one face are chosen
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BarChoice {
    /// Deterministic search over the allowed diameters
    #[default]
    Auto,
    /// Lay out this combination as given
    Fixed(BarCombination),
}

/// Reinforcement choices made outside the engine (the optimizer fixes them).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReinforcementChoice {
    pub top: BarChoice,
    pub bottom: BarChoice,
    /// Uniform stirrup spacing over the span (mm); zoned from the shear when absent
    pub stirrup_spacing_mm: Option<f64>,
}

/// Input parameters for the detailing engine.
///
/// ## JSON Example
///
/// ```json
/// {
///   "section": { "width_mm": 300.0, "overall_depth_mm": 450.0,
///                "effective_depth_mm": 410.0, "cover_mm": 25.0 },
///   "material": { "fck_mpa": 25.0, "fy_mpa": 500.0 },
///   "span_mm": 6000.0,
///   "top_required_mm2": 0.0,
///   "bottom_required_mm2": 771.0,
///   "shear": { "shear_kn": 90.0, "tau_c_mpa": 0.53, "support_spacing_mm": 300.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailingInput {
    pub section: Section,
    pub material: Material,

    #[serde(default)]
    pub exposure: ExposureClass,

    #[serde(default)]
    pub span_mm: Option<f64>,

    #[serde(default)]
    pub support: SupportCondition,

    /// Apply IS 13920 ductile detailing
    #[serde(default)]
    pub ductile: bool,

    /// Steel required on the top face (mm²), zero when none
    pub top_required_mm2: f64,
    /// Steel required on the bottom face (mm²)
    pub bottom_required_mm2: f64,

    pub shear: ShearDemand,

    #[serde(default)]
    pub stirrup: StirrupSpec,

    #[serde(default)]
    pub choice: ReinforcementChoice,
}

impl DetailingInput {
    pub fn new(
        section: Section,
        material: Material,
        top_required_mm2: f64,
        bottom_required_mm2: f64,
        shear: ShearDemand,
    ) -> Self {
        DetailingInput {
            section,
            material,
            exposure: ExposureClass::default(),
            span_mm: None,
            support: SupportCondition::default(),
            ductile: false,
            top_required_mm2,
            bottom_required_mm2,
            shear,
            stirrup: StirrupSpec::default(),
            choice: ReinforcementChoice::default(),
        }
    }

    /// Set span and support condition (builder pattern)
    pub fn with_span(mut self, span_mm: f64, support: SupportCondition) -> Self {
        self.span_mm = Some(span_mm);
        self.support = support;
        self
    }

    pub fn validate(&self) -> CalcResult<()> {
        self.section.validate()?;
        self.material.validate()?;
        self.stirrup.validate()?;
        if let Some(span) = self.span_mm {
            if !(span > 0.0 && span.is_finite()) {
                return Err(CalcError::invalid_input("span_mm", span.to_string(), "Span must be positive"));
            }
        }
        for (field, area) in [
            ("top_required_mm2", self.top_required_mm2),
            ("bottom_required_mm2", self.bottom_required_mm2),
        ] {
            if !(area >= 0.0 && area.is_finite()) {
                return Err(CalcError::invalid_input(field, area.to_string(), "Steel area must be non-negative"));
            }
        }
        if !(self.shear.support_spacing_mm > 0.0 && self.shear.support_spacing_mm.is_finite()) {
            return Err(CalcError::invalid_input(
                "shear.support_spacing_mm",
                self.shear.support_spacing_mm.to_string(),
                "Required stirrup spacing must be positive",
            ));
        }
        if let Some(s) = self.choice.stirrup_spacing_mm {
            if !(s > 0.0 && s.is_finite()) {
                return Err(CalcError::invalid_input(
                    "choice.stirrup_spacing_mm",
                    s.to_string(),
                    "Stirrup spacing must be positive",
                ));
            }
        }
        for (field, choice) in [("choice.top", &self.choice.top), ("choice.bottom", &self.choice.bottom)] {
            if let BarChoice::Fixed(combination) = choice {
                let bad = combination.groups.is_empty()
                    || combination
                        .groups
                        .iter()
                        .any(|g| g.count == 0 || !is_standard_diameter(g.diameter_mm));
                if bad || combination.bar_count() < 2 {
                    return Err(CalcError::invalid_input(
                        field,
                        combination.to_string(),
                        "Need at least two bars of standard diameters",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Face carrying the span tension steel
    fn span_tension_face(&self) -> TensionFace {
        match self.support {
            SupportCondition::Cantilever => TensionFace::Top,
            _ => TensionFace::Bottom,
        }
    }
}

/// Bars on one face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceReinforcement {
    pub face: TensionFace,
    /// Area the bars had to provide, after the ductile minimum (mm²)
    pub required_mm2: f64,
    /// Zero when no arrangement was found
    pub provided_mm2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<LayerPlan>,
    /// Hanger bars on a face with no computed requirement
    pub nominal: bool,
}

impl FaceReinforcement {
    pub fn combination(&self) -> Option<&BarCombination> {
        self.plan.as_ref().map(|p| &p.combination)
    }

    /// Loss of effective depth from a second layer (mm)
    pub fn centroid_shift_mm(&self) -> f64 {
        self.plan.as_ref().map_or(0.0, |p| p.centroid_shift_mm)
    }

    pub fn mass_kg_per_m(&self) -> f64 {
        self.plan.as_ref().map_or(0.0, |p| p.mass_kg_per_m)
    }

    pub fn smallest_bar_mm(&self) -> Option<u32> {
        self.combination().map(BarCombination::min_diameter)
    }

    /// Every bar area on the face, largest first
    fn bar_areas(&self) -> Vec<f64> {
        self.combination()
            .map(|c| c.bar_diameters().into_iter().map(bar_area_mm2).collect())
            .unwrap_or_default()
    }
}

/// Results from the detailing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailingResult {
    pub top: FaceReinforcement,
    pub bottom: FaceReinforcement,
    pub stirrups: Vec<StirrupArrangement>,
    /// One entry per bar diameter used, ascending
    pub anchorage: Vec<Anchorage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curtailment: Option<CurtailmentPoint>,
    /// Ductile limits, present in ductile mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ductile: Option<DuctileLimits>,
    /// Longitudinal bars, spacers and stirrups per metre of beam (kg/m)
    pub steel_mass_kg_per_m: f64,
    pub errors: Vec<DesignError>,
    pub is_ok: bool,
}

impl DetailingResult {
    pub fn face(&self, face: TensionFace) -> &FaceReinforcement {
        match face {
            TensionFace::Top => &self.top,
            TensionFace::Bottom => &self.bottom,
        }
    }

    /// Spacing nearest the supports (mm)
    pub fn support_spacing_mm(&self) -> f64 {
        self.stirrups.first().map_or(0.0, |z| z.spacing_mm)
    }

    /// Widest spacing anywhere on the span (mm)
    pub fn max_spacing_mm(&self) -> f64 {
        self.stirrups.iter().map(|z| z.spacing_mm).fold(0.0, f64::max)
    }
}

/// Detail the beam.
///
/// # Returns
///
/// * `Ok(DetailingResult)` - Arrangement with diagnostics
/// * `Err(CalcError)` - Invalid input
pub fn calculate(input: &DetailingInput, settings: &DesignSettings) -> CalcResult<DetailingResult> {
    input.validate()?;

    let ds = &settings.detailing;
    let section = &input.section;
    let material = &input.material;
    let mut errors = Vec::new();

    // ========================================================================
    // Exposure
    // ========================================================================
    let nominal_cover = input.exposure.nominal_cover_mm();
    if section.cover_mm < nominal_cover {
        errors.push(DesignError::warning(
            ErrorCode::CoverBelowExposure,
            DesignStage::Detailing,
            format!(
                "Cover {:.0} mm is below {:.0} mm for {} exposure",
                section.cover_mm, nominal_cover, input.exposure
            ),
            code_refs::NOMINAL_COVER,
        ));
    }
    let min_grade = input.exposure.minimum_grade_mpa();
    if material.fck_mpa < min_grade {
        errors.push(DesignError::warning(
            ErrorCode::GradeBelowExposure,
            DesignStage::Detailing,
            format!(
                "M{:.0} is below M{:.0} for {} exposure",
                material.fck_mpa, min_grade, input.exposure
            ),
            code_refs::MIN_GRADE,
        ));
    }

    // ========================================================================
    // Required areas and allowed diameters
    // ========================================================================
    let mut diameters = ds.allowed_diameters.clone();
    let mut top_required = input.top_required_mm2;
    let mut bottom_required = input.bottom_required_mm2;

    let ductile_minimum = input
        .ductile
        .then(|| ductile::minimum_steel_ratio(material) * section.width_mm * section.effective_depth_mm);
    if let Some(minimum) = ductile_minimum {
        let large: Vec<u32> = diameters
            .iter()
            .copied()
            .filter(|&d| d >= ductile::MIN_BAR_DIAMETER_MM)
            .collect();
        if !large.is_empty() {
            diameters = large;
        }
        top_required = top_required.max(minimum);
        bottom_required = bottom_required.max(minimum).max(0.5 * top_required);
    }

    // ========================================================================
    // Main bars
    // ========================================================================
    let geometry = FaceGeometry::for_section(section, input.stirrup.diameter_mm);
    let top = detail_face(
        TensionFace::Top,
        top_required,
        &input.choice.top,
        &geometry,
        &diameters,
        settings,
        &mut errors,
    );
    let bottom = detail_face(
        TensionFace::Bottom,
        bottom_required,
        &input.choice.bottom,
        &geometry,
        &diameters,
        settings,
        &mut errors,
    );

    // ========================================================================
    // Stirrups
    // ========================================================================
    let smallest_bar = [top.smallest_bar_mm(), bottom.smallest_bar_mm()]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(ds.hanger_diameter_mm);
    let limits = input.ductile.then(|| ductile::limits(section, material, smallest_bar));

    let stirrups = match input.choice.stirrup_spacing_mm {
        Some(spacing) => {
            if spacing > input.shear.support_spacing_mm {
                errors.push(DesignError::error(
                    ErrorCode::StirrupSpacingExceedsRequired,
                    DesignStage::Detailing,
                    format!(
                        "Stirrup spacing {:.0} mm exceeds the required {:.0} mm",
                        spacing, input.shear.support_spacing_mm
                    ),
                    code_refs::SHEAR_REINFORCEMENT,
                ));
            }
            uniform_stirrups(input.stirrup, spacing, input.span_mm)
        }
        None => {
            let caps = limits.map(|l| SpacingCaps {
                support_zone_mm: l.confinement_spacing_mm,
                middle_zone_mm: l.general_spacing_mm,
            });
            let zone_factor = if input.ductile {
                ds.support_zone_factor.max(ductile::CONFINEMENT_ZONE_FACTOR)
            } else {
                ds.support_zone_factor
            };
            merge_zones(zone_stirrups(
                section,
                material,
                input.span_mm,
                input.support,
                input.stirrup,
                &input.shear,
                caps,
                zone_factor,
                &settings.shear,
            ))
        }
    };

    // ========================================================================
    // Anchorage and curtailment
    // ========================================================================
    let used: BTreeSet<u32> = [&top, &bottom]
        .iter()
        .filter_map(|f| f.combination())
        .flat_map(|c| c.groups.iter().map(|g| g.diameter_mm))
        .collect();
    let anchorage: Vec<Anchorage> = used.iter().map(|&d| anchorage_for(d, material, ds)).collect();

    let curtailment = curtail_span_bars(input, &top, &bottom, &mut errors);

    // ========================================================================
    // Ductile checks
    // ========================================================================
    if let Some(l) = &limits {
        errors.extend(ductile::check_geometry(section));
        errors.extend(ductile::check_longitudinal(
            l,
            top.provided_mm2,
            bottom.provided_mm2,
            smallest_bar,
        ));
        let support_spacing = stirrups
            .iter()
            .filter(|z| z.zone != ZoneTag::Middle)
            .map(|z| z.spacing_mm)
            .fold(0.0, f64::max);
        let max_spacing = stirrups.iter().map(|z| z.spacing_mm).fold(0.0, f64::max);
        errors.extend(ductile::check_transverse(
            l,
            input.stirrup.diameter_mm,
            input.span_mm,
            support_spacing,
            max_spacing,
        ));
    }

    let steel_mass = top.mass_kg_per_m()
        + bottom.mass_kg_per_m()
        + stirrup_mass_kg_per_m(&stirrups, section, input.span_mm);

    tracing::debug!(
        top = ?top.combination().map(ToString::to_string),
        bottom = ?bottom.combination().map(ToString::to_string),
        zones = stirrups.len(),
        steel_mass,
        "detailing complete"
    );

    let is_ok = no_errors(&errors);
    Ok(DetailingResult {
        top,
        bottom,
        stirrups,
        anchorage,
        curtailment,
        ductile: limits,
        steel_mass_kg_per_m: steel_mass,
        errors,
        is_ok,
    })
}

fn detail_face(
    face: TensionFace,
    required_mm2: f64,
    choice: &BarChoice,
    geometry: &FaceGeometry,
    diameters: &[u32],
    settings: &DesignSettings,
    errors: &mut Vec<DesignError>,
) -> FaceReinforcement {
    let ds = &settings.detailing;
    let (plan, nominal) = match choice {
        BarChoice::Fixed(combination) => {
            let plan = arrange_bars(combination, geometry, ds);
            match &plan {
                None => errors.push(DesignError::error(
                    ErrorCode::NoBarArrangement,
                    DesignStage::Detailing,
                    format!("{:?} face: {} does not fit the section width", face, combination),
                    code_refs::BAR_SPACING,
                )),
                Some(p) if p.provided_area_mm2() < required_mm2 => errors.push(DesignError::error(
                    ErrorCode::ProvidedAreaInsufficient,
                    DesignStage::Detailing,
                    format!(
                        "{:?} face: {} provides {:.0} mm² < required {:.0} mm²",
                        face,
                        combination,
                        p.provided_area_mm2(),
                        required_mm2
                    ),
                    code_refs::MIN_TENSION_STEEL,
                )),
                Some(_) => {}
            }
            (plan, false)
        }
        BarChoice::Auto if required_mm2 <= 0.0 => {
            let hangers = BarCombination::single(ds.hanger_diameter_mm, 2);
            errors.push(DesignError::info(
                ErrorCode::NominalHangerBars,
                DesignStage::Detailing,
                format!("{:?} face: no steel required; {} hanger bars provided", face, hangers),
                code_refs::BAR_SPACING,
            ));
            let plan = arrange_bars(&hangers, geometry, ds);
            if plan.is_none() {
                errors.push(no_arrangement(face, required_mm2));
            }
            (plan, true)
        }
        BarChoice::Auto => {
            let plan = select_bars(required_mm2, geometry, diameters, ds);
            if plan.is_none() {
                errors.push(no_arrangement(face, required_mm2));
            }
            (plan, false)
        }
    };

    if let Some(p) = plan.as_ref().filter(|p| p.layer_count() > 1) {
        errors.push(DesignError::info(
            ErrorCode::SecondLayer,
            DesignStage::Detailing,
            format!(
                "{:?} face: {} placed in {} layers; centroid moves {:.1} mm",
                face,
                p.combination,
                p.layer_count(),
                p.centroid_shift_mm
            ),
            code_refs::BAR_SPACING,
        ));
    }

    FaceReinforcement {
        face,
        required_mm2,
        provided_mm2: plan.as_ref().map_or(0.0, LayerPlan::provided_area_mm2),
        plan,
        nominal,
    }
}

fn no_arrangement(face: TensionFace, required_mm2: f64) -> DesignError {
    DesignError::error(
        ErrorCode::NoBarArrangement,
        DesignStage::Detailing,
        format!(
            "{:?} face: no bar arrangement provides {:.0} mm² within the section width",
            face, required_mm2
        ),
        code_refs::BAR_SPACING,
    )
}

fn curtail_span_bars(
    input: &DetailingInput,
    top: &FaceReinforcement,
    bottom: &FaceReinforcement,
    errors: &mut Vec<DesignError>,
) -> Option<CurtailmentPoint> {
    let skipped = |reason: &str| {
        DesignError::info(
            ErrorCode::CurtailmentSkipped,
            DesignStage::Detailing,
            format!("Curtailment skipped: {}", reason),
            code_refs::CURTAILMENT,
        )
    };

    let span = match (input.span_mm, input.support) {
        (None, _) => {
            errors.push(skipped("no span given"));
            return None;
        }
        (_, SupportCondition::Continuous) => {
            errors.push(skipped("continuous span needs the moment envelope"));
            return None;
        }
        (Some(span), _) => span,
    };

    let face = input.span_tension_face();
    let bars = match face {
        TensionFace::Top => top,
        TensionFace::Bottom => bottom,
    };
    let Some(max_diameter) = bars.combination().map(BarCombination::max_diameter) else {
        errors.push(skipped("no bars on the tension face"));
        return None;
    };
    if bars.nominal {
        errors.push(skipped("only hanger bars on the tension face"));
        return None;
    }

    let ld = development_length(max_diameter, &input.material, false);
    let point = curtail(
        face,
        &bars.bar_areas(),
        span,
        input.support == SupportCondition::Cantilever,
        ld,
        input.section.effective_depth_mm,
    );
    if point.is_none() {
        errors.push(skipped("all bars run the full length"));
    }
    point
}
