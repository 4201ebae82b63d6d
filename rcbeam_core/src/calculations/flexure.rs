//! # Flexure Engine
//!
//! Limit state design of rectangular and flanged beams in bending per
//! IS 456 38.1 and Annex G.
//!
//! ## Procedure
//!
//! 1. Validate section, material and demand (fails fast, nothing computed)
//! 2. Tension face from the sign of the moment (positive = sagging)
//! 3. Flanged sections in sagging: effective flange width, then neutral axis
//!    in flange (rectangular of width bf) or in web (web + flange forces)
//! 4. Limiting moment Mu,lim at xu = xu,max
//! 5. Mu ≤ Mu,lim: singly reinforced, closed-form quadratic
//! 6. Mu > Mu,lim: doubly reinforced, bounded fixed-point loop on the excess
//!    moment, each pass verified by the strain-compatibility solver
//! 7. Minimum / maximum steel checks and neutral axis classification
//!
//! ## Example
//!
//! ```rust
//! use rcbeam_core::calculations::flexure::{calculate, FlexureInput, ReinforcementType};
//! use rcbeam_core::materials::Material;
//! use rcbeam_core::section::Section;
//! use rcbeam_core::settings::FlexureSettings;
//!
//! let input = FlexureInput::new(
//!     Section::rectangular(300.0, 450.0, 410.0, 25.0),
//!     Material::new(25.0, 500.0),
//!     120.0,
//! );
//! let result = calculate(&input, &FlexureSettings::default()).unwrap();
//! assert_eq!(result.reinforcement, ReinforcementType::Singly);
//! assert!(result.is_safe);
//! assert!(result.ast_required_mm2 > 700.0 && result.ast_required_mm2 < 800.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::code_refs;
use crate::errors::{no_errors, CalcError, CalcResult, DesignError, DesignStage, ErrorCode};
use crate::materials::{
    Material, SteelGrade, CONCRETE_DESIGN_FACTOR, CONCRETE_ULTIMATE_STRAIN, STRESS_BLOCK_CENTROID,
    STRESS_BLOCK_FACTOR,
};
use crate::section::{FlangeGeometry, FlangeKind, Section, SupportCondition};
use crate::settings::FlexureSettings;
use crate::units::{knm_to_nmm, nmm_to_knm};

/// Minimum tension steel coefficient, As/(b d) ≥ 0.85 / fy
const MIN_STEEL_COEFFICIENT: f64 = 0.85;

/// Maximum tension or compression steel as a fraction of b D
const MAX_STEEL_FRACTION: f64 = 0.04;

/// Flange depth ratio above which the equivalent flange depth yf is reduced
const DEEP_FLANGE_RATIO: f64 = 0.2;

/// Input parameters for the flexure engine.
///
/// ## JSON Example
///
/// ```json
/// {
///   "section": { "width_mm": 300.0, "overall_depth_mm": 450.0,
///                "effective_depth_mm": 410.0, "cover_mm": 25.0 },
///   "material": { "fck_mpa": 25.0, "fy_mpa": 500.0 },
///   "moment_knm": 120.0,
///   "span_mm": 6000.0,
///   "support": "SimplySupported"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexureInput {
    pub section: Section,
    pub material: Material,

    /// Factored moment (kN·m). Positive = sagging (tension at bottom),
    /// negative = hogging (tension at top).
    pub moment_knm: f64,

    /// Effective span (mm), needed for the effective flange width
    #[serde(default)]
    pub span_mm: Option<f64>,

    #[serde(default)]
    pub support: SupportCondition,
}

impl FlexureInput {
    pub fn new(section: Section, material: Material, moment_knm: f64) -> Self {
        FlexureInput {
            section,
            material,
            moment_knm,
            span_mm: None,
            support: SupportCondition::default(),
        }
    }

    /// Set span and support condition (builder pattern)
    pub fn with_span(mut self, span_mm: f64, support: SupportCondition) -> Self {
        self.span_mm = Some(span_mm);
        self.support = support;
        self
    }

    pub fn tension_face(&self) -> TensionFace {
        if self.moment_knm < 0.0 {
            TensionFace::Top
        } else {
            TensionFace::Bottom
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        self.section.validate()?;
        self.material.validate()?;
        if !self.moment_knm.is_finite() {
            return Err(CalcError::invalid_input(
                "moment_knm",
                self.moment_knm.to_string(),
                "Moment must be a finite number",
            ));
        }
        if let Some(span) = self.span_mm {
            if !(span > 0.0 && span.is_finite()) {
                return Err(CalcError::invalid_input(
                    "span_mm",
                    span.to_string(),
                    "Span must be positive",
                ));
            }
        }
        if let (Some(flange), TensionFace::Bottom) = (&self.section.flange, self.tension_face()) {
            if flange.isolated && flange.width_mm.is_none() {
                return Err(CalcError::missing_field("section.flange.width_mm"));
            }
            if self.span_mm.is_none() && flange.width_mm.is_none() {
                return Err(CalcError::invalid_input(
                    "span_mm",
                    "null",
                    "Flanged section needs a span or an actual flange width",
                ));
            }
        }
        Ok(())
    }
}

/// Face of the section in tension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TensionFace {
    Bottom,
    Top,
}

impl TensionFace {
    pub fn opposite(&self) -> TensionFace {
        match self {
            TensionFace::Bottom => TensionFace::Top,
            TensionFace::Top => TensionFace::Bottom,
        }
    }
}

/// Singly or doubly reinforced design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReinforcementType {
    Singly,
    Doubly,
}

/// Classification by neutral axis depth relative to xu,max
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionClass {
    UnderReinforced,
    Balanced,
    OverReinforced,
}

/// Neutral axis position in a flanged section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeutralAxisLocation {
    InFlange,
    InWeb,
}

/// Flange data used by the design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlangeAnalysis {
    /// Effective flange width bf (mm)
    pub effective_width_mm: f64,
    /// Flange thickness Df (mm)
    pub thickness_mm: f64,
    /// Moment with the neutral axis at the flange soffit (kN·m)
    pub flange_capacity_knm: f64,
    pub neutral_axis: NeutralAxisLocation,
}

/// Results from the flexure engine.
///
/// ## JSON Example
///
/// ```json
/// {
///   "moment_knm": 120.0,
///   "tension_face": "Bottom",
///   "reinforcement": "Singly",
///   "ast_required_mm2": 770.9,
///   "asc_required_mm2": 0.0,
///   "ast_min_mm2": 209.1,
///   "ast_max_mm2": 5400.0,
///   "mu_lim_knm": 168.4,
///   "xu_mm": 124.2,
///   "xu_max_mm": 188.6,
///   "xu_ratio": 0.303,
///   "classification": "UnderReinforced",
///   "iterations": 0,
///   "is_safe": true,
///   "errors": []
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexureResult {
    /// Magnitude of the design moment (kN·m)
    pub moment_knm: f64,
    pub tension_face: TensionFace,
    pub reinforcement: ReinforcementType,

    /// Required tension steel, after the minimum steel rule (mm²)
    pub ast_required_mm2: f64,
    /// Tension steel from the strength calculation alone (mm²)
    pub ast_calculated_mm2: f64,
    /// Required compression steel (mm²), zero when singly reinforced
    pub asc_required_mm2: f64,
    pub ast_min_mm2: f64,
    pub ast_max_mm2: f64,

    /// Limiting moment of resistance (kN·m)
    pub mu_lim_knm: f64,

    /// Neutral axis depth for the required steel (mm)
    pub xu_mm: f64,
    pub xu_max_mm: f64,
    /// xu / d
    pub xu_ratio: f64,
    /// xu,max / d
    pub xu_max_ratio: f64,
    pub classification: SectionClass,

    /// 100 Ast / (bw d)
    pub tension_steel_percent: f64,
    /// 100 Asc / (bw d)
    pub compression_steel_percent: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flange: Option<FlangeAnalysis>,

    /// Passes of the doubly reinforced fixed-point loop (0 when singly)
    pub iterations: u32,

    pub errors: Vec<DesignError>,
    pub is_safe: bool,
}

impl FlexureResult {
    /// Total longitudinal steel (mm²)
    pub fn total_steel_mm2(&self) -> f64 {
        self.ast_required_mm2 + self.asc_required_mm2
    }
}

/// Moment of resistance of a section with given steel areas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityResult {
    pub moment_knm: f64,
    pub xu_mm: f64,
    pub classification: SectionClass,
    /// Tension steel stress at equilibrium (N/mm²)
    pub tension_stress_mpa: f64,
    /// Compression steel stress at equilibrium (N/mm²)
    pub compression_stress_mpa: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Compression side of the section for one sense of bending.
#[derive(Debug, Clone, Copy)]
struct CompressionZone {
    web_width: f64,
    /// (bf, Df) when the flange is in compression
    flange: Option<(f64, f64)>,
    d: f64,
    d_prime: f64,
    overall_depth: f64,
}

/// Concrete force (N) and its moment about the tension steel (N·mm).
struct ConcreteForce {
    force: f64,
    moment: f64,
}

impl CompressionZone {
    fn for_bending(section: &Section, flange_width: Option<f64>) -> Self {
        CompressionZone {
            web_width: section.width_mm,
            flange: flange_width.zip(section.flange.map(|f| f.thickness_mm)),
            d: section.effective_depth_mm,
            d_prime: section.d_prime_mm(),
            overall_depth: section.overall_depth_mm,
        }
    }

    /// Equivalent flange depth yf (Annex G-2.2.1)
    fn yf(&self, xu: f64, df: f64) -> f64 {
        if df / self.d <= DEEP_FLANGE_RATIO {
            df
        } else {
            (0.15 * xu + 0.65 * df).min(df)
        }
    }

    fn concrete(&self, fck: f64, xu: f64) -> ConcreteForce {
        let block = |width: f64| {
            let force = STRESS_BLOCK_FACTOR * fck * width * xu;
            ConcreteForce {
                force,
                moment: force * (self.d - STRESS_BLOCK_CENTROID * xu),
            }
        };
        match self.flange {
            Some((bf, df)) if xu > df => {
                let web = block(self.web_width);
                let yf = self.yf(xu, df);
                let flange_force = CONCRETE_DESIGN_FACTOR * fck * (bf - self.web_width) * yf;
                ConcreteForce {
                    force: web.force + flange_force,
                    moment: web.moment + flange_force * (self.d - yf / 2.0),
                }
            }
            Some((bf, _)) => block(bf),
            None => block(self.web_width),
        }
    }
}

/// Effective flange width per IS 456 23.1.2.
///
/// Returns the width and a warning when it could not be checked against the span.
pub fn effective_flange_width(
    section: &Section,
    flange: &FlangeGeometry,
    span_mm: Option<f64>,
    support: SupportCondition,
) -> (f64, Option<DesignError>) {
    let bw = section.width_mm;
    let df = flange.thickness_mm;

    let Some(span) = span_mm else {
        // Validation guarantees an actual width here
        let actual = flange.width_mm.unwrap_or(bw);
        let warning = DesignError::warning(
            ErrorCode::FlangeWidthUnchecked,
            DesignStage::Flexure,
            format!(
                "No span given; actual flange width {:.0} mm used without the l0 rule",
                actual
            ),
            code_refs::EFFECTIVE_FLANGE_WIDTH,
        );
        return (actual, Some(warning));
    };

    let l0 = span * support.zero_moment_factor();
    let rule = match (flange.kind, flange.isolated) {
        (FlangeKind::T, false) => l0 / 6.0 + bw + 6.0 * df,
        (FlangeKind::L, false) => l0 / 12.0 + bw + 3.0 * df,
        (kind, true) => {
            let b = flange.width_mm.unwrap_or(bw);
            let overhang = l0 / (l0 / b + 4.0);
            match kind {
                FlangeKind::T => overhang + bw,
                FlangeKind::L => 0.5 * overhang + bw,
            }
        }
    };
    let width = match flange.width_mm {
        Some(actual) => rule.min(actual),
        None => rule,
    };
    (width.max(bw), None)
}

/// Classify a neutral axis depth against xu,max.
pub fn classify(xu_mm: f64, xu_max_mm: f64, band: f64) -> SectionClass {
    let ratio = xu_mm / xu_max_mm;
    if ratio < 1.0 - band {
        SectionClass::UnderReinforced
    } else if ratio <= 1.0 + band {
        SectionClass::Balanced
    } else {
        SectionClass::OverReinforced
    }
}

/// Moment of resistance of a section for given tension and compression steel.
///
/// Solves force equilibrium by strain compatibility with a bounded bisection
/// on the neutral axis depth. `flange_width_mm` is the effective flange
/// width when the flange is in compression.
pub fn moment_capacity(
    section: &Section,
    material: &Material,
    flange_width_mm: Option<f64>,
    ast_mm2: f64,
    asc_mm2: f64,
    settings: &FlexureSettings,
) -> CalcResult<CapacityResult> {
    let grade = material.steel_grade()?;
    let zone = CompressionZone::for_bending(section, flange_width_mm);
    Ok(solve_capacity(&zone, material, grade, ast_mm2, asc_mm2, settings))
}

fn solve_capacity(
    zone: &CompressionZone,
    material: &Material,
    grade: SteelGrade,
    ast: f64,
    asc: f64,
    settings: &FlexureSettings,
) -> CapacityResult {
    let fck = material.fck_mpa;
    let fcd = material.fcd();
    let xu_max = grade.xu_max_ratio() * zone.d;

    let steel = |xu: f64| {
        let eps_st = CONCRETE_ULTIMATE_STRAIN * (zone.d - xu) / xu;
        let eps_sc = CONCRETE_ULTIMATE_STRAIN * (xu - zone.d_prime) / xu;
        let fst = grade.design_stress(eps_st);
        let fsc = grade.design_stress(eps_sc);
        // Compression steel displaces concrete only when inside the block
        let displaced = if xu > zone.d_prime { fcd } else { 0.0 };
        (fst, fsc, ast * fst, asc * (fsc - displaced))
    };
    let residual = |xu: f64| {
        let (_, _, tension, comp_steel) = steel(xu);
        zone.concrete(fck, xu).force + comp_steel - tension
    };

    let mut lo = zone.d * 1.0e-9;
    let mut hi = zone.overall_depth;
    // Finer than the moment tolerance so the doubly reinforced loop can settle
    let tol = settings.tolerance * zone.d * 1.0e-3;
    let mut iterations = 0;
    let mut converged = false;

    // A negative residual at full depth means the steel cannot be balanced;
    // the result stays unconverged at xu = D.
    if residual(hi) >= 0.0 {
        while iterations < settings.max_iterations {
            iterations += 1;
            let mid = 0.5 * (lo + hi);
            if residual(mid) >= 0.0 {
                hi = mid;
            } else {
                lo = mid;
            }
            if hi - lo <= tol {
                converged = true;
                break;
            }
        }
    }

    let xu = hi;
    let (fst, fsc, tension, comp_steel) = steel(xu);
    let concrete = zone.concrete(fck, xu);
    // Lever-arm form keeps the moment conservative where the flange force jumps
    let concrete_force = (tension - comp_steel).max(0.0);
    let lever = if concrete.force > 0.0 {
        concrete.moment / concrete.force
    } else {
        0.0
    };
    let moment = concrete_force * lever + comp_steel * (zone.d - zone.d_prime);

    CapacityResult {
        moment_knm: nmm_to_knm(moment),
        xu_mm: xu,
        classification: classify(xu, xu_max, settings.balanced_band),
        tension_stress_mpa: fst,
        compression_stress_mpa: fsc,
        iterations,
        converged,
    }
}

/// Steel for a rectangular compression block of width `b` carrying `mu` (N·mm).
///
/// Closed-form root of Mu = fyd Ast (d - 0.42 xu), xu = fyd Ast / (0.36 fck b).
fn singly_rectangular_steel(mu: f64, b: f64, d: f64, fck: f64, fyd: f64) -> f64 {
    if mu <= 0.0 {
        return 0.0;
    }
    let a = STRESS_BLOCK_CENTROID * fyd * fyd / (STRESS_BLOCK_FACTOR * fck * b);
    let lin = fyd * d;
    let disc = (lin * lin - 4.0 * a * mu).max(0.0);
    (lin - disc.sqrt()) / (2.0 * a)
}

/// Neutral axis depth at which the concrete alone resists `mu` (N·mm),
/// searched on [0, xu_limit]. Used for the web case of flanged sections.
fn depth_for_moment(zone: &CompressionZone, fck: f64, mu: f64, xu_limit: f64, settings: &FlexureSettings) -> f64 {
    let mut lo = 0.0;
    let mut hi = xu_limit;
    let tol = settings.tolerance * zone.d;
    for _ in 0..settings.max_iterations {
        let mid = 0.5 * (lo + hi);
        if zone.concrete(fck, mid).moment >= mu {
            hi = mid;
        } else {
            lo = mid;
        }
        if hi - lo <= tol {
            break;
        }
    }
    hi
}

/// Calculate required flexural reinforcement.
///
/// This is a pure function: identical inputs always give identical results.
///
/// # Returns
///
/// * `Ok(FlexureResult)` - Design with any diagnostics attached
/// * `Err(CalcError)` - Invalid input; no formula was evaluated
pub fn calculate(input: &FlexureInput, settings: &FlexureSettings) -> CalcResult<FlexureResult> {
    input.validate()?;

    let section = &input.section;
    let material = &input.material;
    let grade = material.steel_grade()?;

    let b = section.width_mm;
    let d = section.effective_depth_mm;
    let overall = section.overall_depth_mm;
    let d_prime = section.d_prime_mm();
    let fck = material.fck_mpa;
    let fy = material.fy_mpa;
    let fyd = material.fyd();
    let fcd = material.fcd();

    let tension_face = input.tension_face();
    let mu = knm_to_nmm(input.moment_knm.abs());
    let mut errors = Vec::new();

    let xu_max_ratio = grade.xu_max_ratio();
    let xu_max = xu_max_ratio * d;
    let ast_min = MIN_STEEL_COEFFICIENT * b * d / fy;
    let ast_max = MAX_STEEL_FRACTION * b * overall;

    // === Effective flange (sagging only; a hogging flange is in tension) ===
    let flange_width = match (&section.flange, tension_face) {
        (Some(flange), TensionFace::Bottom) => {
            let (width, warning) = effective_flange_width(section, flange, input.span_mm, input.support);
            errors.extend(warning);
            Some(width)
        }
        _ => None,
    };
    let zone = CompressionZone::for_bending(section, flange_width);

    // === Limiting moment ===
    let limit = zone.concrete(fck, xu_max);
    let mu_lim = limit.moment;
    let ast_lim = limit.force / fyd;

    let flange = zone.flange.map(|(bf, df)| {
        let at_soffit = STRESS_BLOCK_FACTOR * fck * bf * df * (d - STRESS_BLOCK_CENTROID * df);
        FlangeAnalysis {
            effective_width_mm: bf,
            thickness_mm: df,
            flange_capacity_knm: nmm_to_knm(at_soffit),
            neutral_axis: if mu <= at_soffit || xu_max <= df {
                NeutralAxisLocation::InFlange
            } else {
                NeutralAxisLocation::InWeb
            },
        }
    });

    let mut reinforcement = ReinforcementType::Singly;
    let mut iterations = 0;
    let mut asc = 0.0;

    let ast_calculated = if mu == 0.0 {
        errors.push(DesignError::info(
            ErrorCode::ZeroMoment,
            DesignStage::Flexure,
            "Zero design moment; minimum tension steel provided",
            code_refs::MIN_TENSION_STEEL,
        ));
        0.0
    } else if mu <= mu_lim {
        // === Singly reinforced ===
        match flange {
            Some(FlangeAnalysis { neutral_axis: NeutralAxisLocation::InWeb, .. }) => {
                let xu = depth_for_moment(&zone, fck, mu, xu_max, settings);
                zone.concrete(fck, xu).force / fyd
            }
            Some(FlangeAnalysis { effective_width_mm, .. }) => {
                singly_rectangular_steel(mu, effective_width_mm, d, fck, fyd)
            }
            None => singly_rectangular_steel(mu, b, d, fck, fyd),
        }
    } else {
        // === Doubly reinforced: fixed point on the excess moment ===
        reinforcement = ReinforcementType::Doubly;
        errors.push(DesignError::info(
            ErrorCode::DoublyReinforced,
            DesignStage::Flexure,
            format!(
                "Mu = {:.1} kN·m exceeds Mu,lim = {:.1} kN·m; compression steel added",
                nmm_to_knm(mu),
                nmm_to_knm(mu_lim)
            ),
            code_refs::LIMITING_MOMENT,
        ));

        let eps_sc = CONCRETE_ULTIMATE_STRAIN * (xu_max - d_prime) / xu_max;
        let fsc = grade.design_stress(eps_sc);
        let effective_stress = fsc - fcd;

        if effective_stress <= 0.0 {
            errors.push(DesignError::error(
                ErrorCode::CompressionSteelIneffective,
                DesignStage::Flexure,
                format!(
                    "Compression steel at d' = {:.0} mm is not effective (fsc = {:.1} N/mm²)",
                    d_prime, fsc
                ),
                code_refs::STEEL_STRESS_STRAIN,
            ));
            ast_lim
        } else {
            let lever = d - d_prime;
            let mut mu2 = mu - mu_lim;
            let mut ast = ast_lim;
            let mut converged = false;

            while iterations < settings.max_iterations {
                iterations += 1;
                asc = mu2 / (effective_stress * lever);
                ast = ast_lim + asc * effective_stress / fyd;

                let capacity = solve_capacity(&zone, material, grade, ast, asc, settings);
                if !capacity.converged {
                    break;
                }
                let shortfall = mu - knm_to_nmm(capacity.moment_knm);
                if shortfall <= settings.tolerance * mu {
                    converged = true;
                    break;
                }
                mu2 += shortfall;
            }

            if !converged {
                tracing::warn!(
                    iterations,
                    moment_knm = input.moment_knm,
                    "doubly reinforced design did not converge"
                );
                errors.push(DesignError::error(
                    ErrorCode::FlexureNonConvergence,
                    DesignStage::Flexure,
                    format!(
                        "Doubly reinforced solution did not converge in {} iterations",
                        iterations
                    ),
                    code_refs::DOUBLY_REINFORCED,
                ));
            }
            ast
        }
    };

    // === Minimum and maximum steel ===
    let ast_required = if ast_calculated < ast_min {
        if mu > 0.0 {
            errors.push(DesignError::info(
                ErrorCode::MinimumSteelGoverns,
                DesignStage::Flexure,
                format!(
                    "Calculated Ast = {:.0} mm² is below the minimum {:.0} mm²",
                    ast_calculated, ast_min
                ),
                code_refs::MIN_TENSION_STEEL,
            ));
        }
        ast_min
    } else {
        ast_calculated
    };

    if ast_required > ast_max {
        errors.push(DesignError::error(
            ErrorCode::TensionSteelAboveMaximum,
            DesignStage::Flexure,
            format!(
                "Required Ast = {:.0} mm² exceeds 0.04 b D = {:.0} mm²",
                ast_required, ast_max
            ),
            code_refs::MAX_TENSION_STEEL,
        ));
    }
    if asc > ast_max {
        errors.push(DesignError::error(
            ErrorCode::CompressionSteelAboveMaximum,
            DesignStage::Flexure,
            format!(
                "Required Asc = {:.0} mm² exceeds 0.04 b D = {:.0} mm²",
                asc, ast_max
            ),
            code_refs::MAX_COMPRESSION_STEEL,
        ));
    }

    // === Neutral axis for the adopted steel ===
    let capacity = solve_capacity(&zone, material, grade, ast_required, asc, settings);
    let classification = capacity.classification;
    if classification == SectionClass::OverReinforced {
        errors.push(DesignError::error(
            ErrorCode::OverReinforced,
            DesignStage::Flexure,
            format!(
                "xu = {:.1} mm exceeds xu,max = {:.1} mm",
                capacity.xu_mm, xu_max
            ),
            code_refs::XU_MAX,
        ));
    }

    let flange = flange.map(|mut f| {
        if f.neutral_axis == NeutralAxisLocation::InFlange && capacity.xu_mm > f.thickness_mm {
            f.neutral_axis = NeutralAxisLocation::InWeb;
        }
        f
    });

    tracing::debug!(
        moment_knm = input.moment_knm,
        ast = ast_required,
        asc,
        ?reinforcement,
        "flexure design complete"
    );

    let is_safe = no_errors(&errors);
    Ok(FlexureResult {
        moment_knm: nmm_to_knm(mu),
        tension_face,
        reinforcement,
        ast_required_mm2: ast_required,
        ast_calculated_mm2: ast_calculated,
        asc_required_mm2: asc,
        ast_min_mm2: ast_min,
        ast_max_mm2: ast_max,
        mu_lim_knm: nmm_to_knm(mu_lim),
        xu_mm: capacity.xu_mm,
        xu_max_mm: xu_max,
        xu_ratio: capacity.xu_mm / d,
        xu_max_ratio,
        classification,
        tension_steel_percent: 100.0 * ast_required / (b * d),
        compression_steel_percent: 100.0 * asc / (b * d),
        flange,
        iterations,
        errors,
        is_safe,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_section() -> Section {
        Section::rectangular(300.0, 450.0, 410.0, 25.0)
    }

    fn run(moment_knm: f64) -> FlexureResult {
        let input = FlexureInput::new(test_section(), Material::new(25.0, 500.0), moment_knm);
        calculate(&input, &FlexureSettings::default()).unwrap()
    }

    #[test]
    fn test_limiting_moment() {
        // 0.36 × 25 × 300 × 188.6 × (410 - 0.42 × 188.6) = 168.4 kN·m
        let r = run(50.0);
        assert!((r.mu_lim_knm - 168.44).abs() < 0.1, "Mu,lim = {}", r.mu_lim_knm);
        assert!((r.xu_max_mm - 188.6).abs() < 1e-9);
    }

    #[test]
    fn test_singly_reinforced_scenario() {
        let r = run(120.0);
        assert_eq!(r.reinforcement, ReinforcementType::Singly);
        assert_eq!(r.classification, SectionClass::UnderReinforced);
        assert!(r.is_safe);
        assert!((r.ast_required_mm2 - 770.9).abs() < 2.0, "Ast = {}", r.ast_required_mm2);
        assert_eq!(r.asc_required_mm2, 0.0);
        assert_eq!(r.iterations, 0);
        assert!(r.errors.is_empty());
    }

    #[test]
    fn test_doubly_reinforced_scenario() {
        let r = run(250.0);
        assert_eq!(r.reinforcement, ReinforcementType::Doubly);
        assert!(r.asc_required_mm2 > 500.0 && r.asc_required_mm2 < 600.0, "Asc = {}", r.asc_required_mm2);
        assert!(r.ast_required_mm2 > 1600.0 && r.ast_required_mm2 < 1750.0, "Ast = {}", r.ast_required_mm2);
        assert!(r.iterations >= 1 && r.iterations <= FlexureSettings::default().max_iterations);
        assert_ne!(r.classification, SectionClass::OverReinforced);
        assert!(r.is_safe);
        let doubly = r.errors.iter().find(|e| e.code == ErrorCode::DoublyReinforced).unwrap();
        assert_eq!(doubly.clause, code_refs::LIMITING_MOMENT);
    }

    #[test]
    fn test_zero_moment_uses_minimum_steel() {
        let r = run(0.0);
        assert!(r.is_safe);
        assert!((r.ast_required_mm2 - 0.85 * 300.0 * 410.0 / 500.0).abs() < 1e-9);
        assert!(r.errors.iter().any(|e| e.code == ErrorCode::ZeroMoment));
    }

    #[test]
    fn test_small_moment_minimum_governs() {
        let r = run(10.0);
        assert_eq!(r.ast_required_mm2, r.ast_min_mm2);
        assert!(r.errors.iter().any(|e| e.code == ErrorCode::MinimumSteelGoverns));
    }

    #[test]
    fn test_hogging_moment_tension_top() {
        let r = run(-120.0);
        assert_eq!(r.tension_face, TensionFace::Top);
        assert!((r.ast_required_mm2 - run(120.0).ast_required_mm2).abs() < 1e-9);
    }

    #[test]
    fn test_excessive_moment_exceeds_maximum_steel() {
        let r = run(900.0);
        assert!(!r.is_safe);
        assert!(r
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::TensionSteelAboveMaximum || e.code == ErrorCode::CompressionSteelAboveMaximum));
    }

    #[test]
    fn test_round_trip_capacity() {
        let settings = FlexureSettings::default();
        for m in [20.0, 60.0, 100.0, 140.0, 165.0] {
            let r = run(m);
            let cap = moment_capacity(&test_section(), &Material::new(25.0, 500.0), None, r.ast_calculated_mm2.max(1.0), 0.0, &settings).unwrap();
            assert!(cap.moment_knm >= m * (1.0 - 1.0e-3), "M = {} cap = {}", m, cap.moment_knm);
        }
    }

    #[test]
    fn test_monotonic_steel() {
        let mut prev = 0.0;
        for i in 0..=60 {
            let r = run(i as f64 * 5.0);
            assert!(r.ast_required_mm2 >= prev - 1e-9, "M = {}", i * 5);
            prev = r.ast_required_mm2;
        }
    }

    #[test]
    fn test_invalid_input_fails_fast() {
        let mut input = FlexureInput::new(test_section(), Material::new(25.0, 500.0), 120.0);
        input.section.width_mm = 0.0;
        let err = calculate(&input, &FlexureSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let input = FlexureInput::new(test_section(), Material::new(25.0, 460.0), 120.0);
        assert!(calculate(&input, &FlexureSettings::default()).is_err());

        let input = FlexureInput::new(test_section(), Material::new(25.0, 500.0), f64::NAN);
        assert!(calculate(&input, &FlexureSettings::default()).is_err());
    }

    fn t_beam() -> Section {
        Section::rectangular(300.0, 500.0, 450.0, 25.0).with_flange(FlangeGeometry {
            kind: FlangeKind::T,
            thickness_mm: 120.0,
            width_mm: Some(1500.0),
            isolated: false,
        })
    }

    #[test]
    fn test_effective_flange_width_rule() {
        let s = t_beam();
        let flange = s.flange.unwrap();
        // l0/6 + bw + 6 Df = 6000/6 + 300 + 720 = 2020, capped at 1500
        let (w, warn) = effective_flange_width(&s, &flange, Some(6000.0), SupportCondition::SimplySupported);
        assert_eq!(w, 1500.0);
        assert!(warn.is_none());
        let (w, _) = effective_flange_width(&s, &flange, Some(3000.0), SupportCondition::SimplySupported);
        assert!((w - 1520.0_f64.min(1500.0)).abs() < 1e-9);
        let (w, _) = effective_flange_width(&s, &flange, Some(3000.0), SupportCondition::Continuous);
        assert!((w - (2100.0 / 6.0 + 300.0 + 720.0)).abs() < 1e-9);
    }

    #[test]
    fn test_t_beam_neutral_axis_in_flange() {
        let input = FlexureInput::new(t_beam(), Material::new(25.0, 415.0), 200.0)
            .with_span(6000.0, SupportCondition::SimplySupported);
        let r = calculate(&input, &FlexureSettings::default()).unwrap();
        let flange = r.flange.unwrap();
        assert_eq!(flange.neutral_axis, NeutralAxisLocation::InFlange);
        assert!(r.xu_mm <= 120.0);
        assert!(r.is_safe);
        // Wide flange needs less steel than the bare web
        let rect = FlexureInput::new(Section::rectangular(300.0, 500.0, 450.0, 25.0), Material::new(25.0, 415.0), 200.0);
        let rect = calculate(&rect, &FlexureSettings::default()).unwrap();
        assert!(r.ast_required_mm2 < rect.ast_required_mm2);
    }

    #[test]
    fn test_t_beam_neutral_axis_in_web() {
        let section = Section::rectangular(250.0, 600.0, 550.0, 25.0).with_flange(FlangeGeometry {
            kind: FlangeKind::T,
            thickness_mm: 80.0,
            width_mm: Some(800.0),
            isolated: false,
        });
        let input = FlexureInput::new(section, Material::new(25.0, 415.0), 450.0)
            .with_span(8000.0, SupportCondition::SimplySupported);
        let r = calculate(&input, &FlexureSettings::default()).unwrap();
        assert_eq!(r.flange.unwrap().neutral_axis, NeutralAxisLocation::InWeb);
        let cap = moment_capacity(&section, &Material::new(25.0, 415.0), Some(800.0), r.ast_required_mm2, r.asc_required_mm2, &FlexureSettings::default()).unwrap();
        assert_eq!(r.reinforcement, ReinforcementType::Singly);
        assert!(cap.moment_knm >= 450.0 * (1.0 - 1.0e-3), "cap = {}", cap.moment_knm);
    }

    #[test]
    fn test_hogging_t_beam_ignores_flange() {
        let input = FlexureInput::new(t_beam(), Material::new(25.0, 415.0), -150.0);
        let r = calculate(&input, &FlexureSettings::default()).unwrap();
        assert!(r.flange.is_none());
        assert_eq!(r.tension_face, TensionFace::Top);
    }

    #[test]
    fn test_flanged_without_span_warns() {
        let input = FlexureInput::new(t_beam(), Material::new(25.0, 415.0), 150.0);
        let r = calculate(&input, &FlexureSettings::default()).unwrap();
        assert!(r.errors.iter().any(|e| e.code == ErrorCode::FlangeWidthUnchecked));
        assert!(r.is_safe);
    }

    #[test]
    fn test_non_convergence_is_an_error() {
        let settings = FlexureSettings { max_iterations: 1, ..FlexureSettings::default() };
        let input = FlexureInput::new(test_section(), Material::new(25.0, 500.0), 250.0);
        let r = calculate(&input, &settings).unwrap();
        assert!(!r.is_safe);
        assert!(r.errors.iter().any(|e| e.code == ErrorCode::FlexureNonConvergence));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(run(250.0), run(250.0));
    }

    #[test]
    fn test_result_serialization() {
        let r = run(120.0);
        let json = serde_json::to_string_pretty(&r).unwrap();
        assert!(json.contains("ast_required_mm2"));
        let roundtrip: FlexureResult = serde_json::from_str(&json).unwrap();
        assert_eq!(r.reinforcement, roundtrip.reinforcement);
    }
}
