//! # Reinforcement Optimization
//!
//! Enumerate-and-filter search over geometry, material, tension bars and
//! stirrups, returning the Pareto frontier of feasible designs.
//!
//! ## Procedure
//!
//! 1. Sort and de-duplicate every option list, then enumerate candidates in
//!    lexicographic order: width, depth, fck, fy, bar diameter, bar count,
//!    stirrup diameter, legs, spacing
//! 2. Run flexure and shear once per (geometry, material, stirrup) to get
//!    the required tension steel and stirrup spacing
//! 3. Reject cheaply where possible: section unsafe, provided area short,
//!    spacing wider than required, bars do not fit, constraint violations
//! 4. Design the survivors in full with the bars and spacing fixed
//! 5. Score against the best feasible value of each objective, sort by key
//!    and build the frontier
//!
//! Candidates are evaluated in parallel; every output list is sorted
//! explicitly afterwards.
//!
//! ## Example
//!
//! ```rust
//! use rcbeam_core::calculations::design::{DesignRequest, LoadDemand};
//! use rcbeam_core::cancel::CancelToken;
//! use rcbeam_core::materials::Material;
//! use rcbeam_core::optimization::{optimize, OptimizationRequest, OptimizationStatus};
//! use rcbeam_core::section::Section;
//! use rcbeam_core::settings::DesignSettings;
//!
//! let base = DesignRequest::new(
//!     Section::rectangular(300.0, 450.0, 410.0, 25.0),
//!     Material::new(25.0, 500.0),
//!     vec![LoadDemand::new(120.0, 90.0)],
//! )
//! .with_span(6000.0);
//! let request = OptimizationRequest::new(base).with_diameters(vec![12, 16, 20]);
//! let response = optimize(&request, &DesignSettings::default(), &CancelToken::new()).unwrap();
//! assert_eq!(response.status, OptimizationStatus::Feasible);
//! assert!(response.recommended.is_some());
//! ```

pub mod beam_line;
pub mod candidate;
pub mod objectives;
pub mod pareto;

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calculations::design::{
    design_beam, evaluate_cases, governing_flexure_index, DesignRequest, SCHEMA_VERSION,
};
use crate::calculations::detailing::bar_selection::{arrange_bars, BarCombination, FaceGeometry};
use crate::calculations::detailing::{BarChoice, DetailingResult, ReinforcementChoice};
use crate::calculations::flexure::TensionFace;
use crate::calculations::shear::StirrupSpec;
use crate::cancel::CancelToken;
use crate::errors::{CalcError, CalcResult, ErrorCode};
use crate::materials::rebar::is_standard_diameter;
use crate::materials::Material;
use crate::section::Section;
use crate::settings::DesignSettings;

pub use beam_line::{standardize, BeamLineGroup, BeamLineMember, BeamLineReport, BeamLineStatus};
pub use candidate::{CandidateKey, OptimizationCandidate};
pub use objectives::{CarbonFactors, CostRates, GradeRate, ObjectiveWeights, Objectives, Quantities};
pub use pareto::{dominates, ParetoFrontier};

// ============================================================================
// Request
// ============================================================================

/// Width and overall depth options. Effective depth keeps the base
/// section's cover offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryBounds {
    pub widths_mm: Vec<f64>,
    pub depths_mm: Vec<f64>,
}

/// Inclusive range of tension bar counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl Default for CountRange {
    fn default() -> Self {
        CountRange { min: 2, max: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StirrupOptions {
    pub diameters: Vec<u32>,
    pub legs: Vec<u32>,
    pub spacings_mm: Vec<f64>,
}

impl Default for StirrupOptions {
    fn default() -> Self {
        StirrupOptions {
            diameters: vec![8],
            legs: vec![2],
            spacings_mm: vec![100.0, 150.0, 200.0],
        }
    }
}

/// Hard limits on feasible candidates. `None` means unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub max_cost: Option<f64>,
    /// 100 Ast / (b d) on the tension face
    pub max_steel_percent: Option<f64>,
    pub max_layers: Option<u32>,
    /// Designs every candidate in ductile mode and keeps only compliant ones
    pub require_ductile: bool,
}

/// Search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub weights: ObjectiveWeights,
    pub constraints: Constraints,
    pub rates: CostRates,
    /// Embodied carbon is an objective only when factors are given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbon: Option<CarbonFactors>,
    /// Worker threads (0 = rayon default)
    pub threads: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            weights: ObjectiveWeights::default(),
            constraints: Constraints::default(),
            rates: CostRates::default(),
            carbon: None,
            threads: 0,
        }
    }
}

impl OptimizationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_carbon(mut self, factors: CarbonFactors) -> Self {
        self.carbon = Some(factors);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

/// One optimization run.
///
/// ## JSON Example
///
/// ```json
/// {
///   "base": {
///     "section": { "width_mm": 300.0, "overall_depth_mm": 450.0,
///                  "effective_depth_mm": 410.0, "cover_mm": 25.0 },
///     "material": { "fck_mpa": 25.0, "fy_mpa": 500.0 },
///     "cases": [{ "moment_knm": 120.0, "shear_kn": 90.0 }],
///     "span_mm": 6000.0
///   },
///   "diameters": [12, 16, 20],
///   "count_range": { "min": 2, "max": 5 },
///   "stirrups": { "diameters": [8], "legs": [2], "spacings_mm": [100, 150, 200] },
///   "config": { "constraints": { "max_layers": 1 } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub base: DesignRequest,
    /// Base section only when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometryBounds>,
    /// Base material only when empty
    #[serde(default)]
    pub materials: Vec<Material>,
    /// Settings' allowed diameters when empty
    #[serde(default)]
    pub diameters: Vec<u32>,
    #[serde(default)]
    pub count_range: CountRange,
    #[serde(default)]
    pub stirrups: StirrupOptions,
    #[serde(default)]
    pub config: OptimizationConfig,
}

impl OptimizationRequest {
    pub fn new(base: DesignRequest) -> Self {
        OptimizationRequest {
            base,
            geometry: None,
            materials: Vec::new(),
            diameters: Vec::new(),
            count_range: CountRange::default(),
            stirrups: StirrupOptions::default(),
            config: OptimizationConfig::default(),
        }
    }

    pub fn with_geometry(mut self, widths_mm: Vec<f64>, depths_mm: Vec<f64>) -> Self {
        self.geometry = Some(GeometryBounds { widths_mm, depths_mm });
        self
    }

    pub fn with_materials(mut self, materials: Vec<Material>) -> Self {
        self.materials = materials;
        self
    }

    pub fn with_diameters(mut self, diameters: Vec<u32>) -> Self {
        self.diameters = diameters;
        self
    }

    pub fn with_counts(mut self, min: u32, max: u32) -> Self {
        self.count_range = CountRange { min, max };
        self
    }

    pub fn with_stirrup_spacings(mut self, spacings_mm: Vec<f64>) -> Self {
        self.stirrups.spacings_mm = spacings_mm;
        self
    }

    pub fn with_config(mut self, config: OptimizationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn validate(&self) -> CalcResult<()> {
        self.base.validate()?;

        if let Some(geometry) = &self.geometry {
            if geometry.widths_mm.is_empty() {
                return Err(CalcError::missing_field("geometry.widths_mm"));
            }
            if geometry.depths_mm.is_empty() {
                return Err(CalcError::missing_field("geometry.depths_mm"));
            }
            for &v in geometry.widths_mm.iter().chain(&geometry.depths_mm) {
                if !v.is_finite() || v <= 0.0 {
                    return Err(CalcError::invalid_input(
                        "geometry",
                        v.to_string(),
                        "Dimensions must be positive",
                    ));
                }
            }
        }
        for material in &self.materials {
            material.validate()?;
            material.steel_grade()?;
        }
        for &d in self.diameters.iter().chain(&self.stirrups.diameters) {
            if !is_standard_diameter(d) {
                return Err(CalcError::invalid_input(
                    "diameters",
                    d.to_string(),
                    "Not a standard bar diameter",
                ));
            }
        }
        let CountRange { min, max } = self.count_range;
        if min == 0 || min > max {
            return Err(CalcError::invalid_input(
                "count_range",
                format!("{}..={}", min, max),
                "Need 1 <= min <= max",
            ));
        }
        if self.stirrups.diameters.is_empty() {
            return Err(CalcError::missing_field("stirrups.diameters"));
        }
        if self.stirrups.legs.is_empty() {
            return Err(CalcError::missing_field("stirrups.legs"));
        }
        if self.stirrups.spacings_mm.is_empty() {
            return Err(CalcError::missing_field("stirrups.spacings_mm"));
        }
        if let Some(&legs) = self.stirrups.legs.iter().find(|&&l| l < 2) {
            return Err(CalcError::invalid_input(
                "stirrups.legs",
                legs.to_string(),
                "Stirrups need at least 2 legs",
            ));
        }
        if let Some(&s) = self.stirrups.spacings_mm.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(CalcError::invalid_input(
                "stirrups.spacings_mm",
                s.to_string(),
                "Spacing must be positive",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Response
// ============================================================================

/// Why a candidate was dropped, in the order the checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    InvalidGeometry,
    SectionUnsafe,
    AreaInsufficient,
    SpacingExceedsRequired,
    BarsDoNotFit,
    TooManyLayers,
    SteelPercentExceeded,
    DesignNotOk,
    NotDuctile,
    OverBudget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationStatus {
    Feasible,
    /// Every candidate was rejected; see the rejection summary
    NoFeasibleCandidate,
}

/// ## JSON Example
///
/// ```json
/// {
///   "schema_version": "1.0",
///   "status": "FEASIBLE",
///   "enumerated": 36,
///   "feasible": 14,
///   "rejections": { "AREA_INSUFFICIENT": 13, "SPACING_EXCEEDS_REQUIRED": 9 },
///   "frontier": { "members": [] },
///   "recommended": null
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResponse {
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub status: OptimizationStatus,
    pub enumerated: usize,
    pub feasible: usize,
    pub rejections: BTreeMap<RejectionReason, usize>,
    pub frontier: ParetoFrontier,
    pub recommended: Option<CandidateKey>,
}

impl OptimizationResponse {
    pub fn recommended_candidate(&self) -> Option<&OptimizationCandidate> {
        self.frontier.recommended()
    }
}

// ============================================================================
// Search
// ============================================================================

/// Flexure and shear demand shared by every candidate with the same
/// geometry, material and stirrup.
#[derive(Debug, Clone)]
struct Context {
    section: Section,
    material: Material,
    stirrup: StirrupSpec,
    demand: Result<Demand, RejectionReason>,
}

#[derive(Debug, Clone, Copy)]
struct Demand {
    tension_face: TensionFace,
    ast_required_mm2: f64,
    /// Spacing no steel percentage can relax: minimum stirrups and the
    /// 26.5.1.5 cap, over every case
    spacing_limit_mm: f64,
}

enum Evaluation {
    Feasible(Box<Feasible>),
    Rejected(RejectionReason),
    Cancelled,
}

struct Feasible {
    key: CandidateKey,
    tension_face: TensionFace,
    objectives: Objectives,
    effective_depth_mm: f64,
    detailing: DetailingResult,
}

/// Run the search.
///
/// # Returns
///
/// * `Ok(OptimizationResponse)` - Frontier, or `NoFeasibleCandidate` with
///   the rejection summary
/// * `Err(CalcError)` - Invalid request, or `Cancelled`
pub fn optimize(
    request: &OptimizationRequest,
    settings: &DesignSettings,
    cancel: &CancelToken,
) -> CalcResult<OptimizationResponse> {
    settings.validate()?;
    request.validate()?;

    if request.config.threads == 0 {
        return search(request, settings, cancel);
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(request.config.threads)
        .build()
        .map_err(|e| CalcError::Internal {
            message: format!("Failed to build thread pool: {}", e),
        })?;
    pool.install(|| search(request, settings, cancel))
}

fn search(
    request: &OptimizationRequest,
    settings: &DesignSettings,
    cancel: &CancelToken,
) -> CalcResult<OptimizationResponse> {
    let geometries = geometry_options(request);
    let materials = material_options(request);
    let stirrups = stirrup_options(request);
    let diameters = sorted_unique(if request.diameters.is_empty() {
        settings.detailing.allowed_diameters.clone()
    } else {
        request.diameters.clone()
    });
    let spacings = sorted_unique_f64(request.stirrups.spacings_mm.clone());

    let mut base = request.base.clone();
    base.ductile |= request.config.constraints.require_ductile;

    // Contexts in (geometry, material, stirrup) order
    let mut index = Vec::new();
    for &(width, depth) in &geometries {
        for material in &materials {
            for stirrup in &stirrups {
                index.push((width, depth, *material, *stirrup));
            }
        }
    }
    let contexts: Vec<Context> = index
        .par_iter()
        .map(|&(width, depth, material, stirrup)| build_context(&base, width, depth, material, stirrup, settings))
        .collect();
    let context_of = |gi: usize, mi: usize, si: usize| (gi * materials.len() + mi) * stirrups.len() + si;

    // ========================================================================
    // Enumerate in key order
    // ========================================================================
    let mut keys = Vec::new();
    for (gi, &(width, depth)) in geometries.iter().enumerate() {
        for (mi, material) in materials.iter().enumerate() {
            for &diameter in &diameters {
                for count in request.count_range.min..=request.count_range.max {
                    for (si, stirrup) in stirrups.iter().enumerate() {
                        for &spacing in &spacings {
                            let key = CandidateKey {
                                width_mm: width,
                                overall_depth_mm: depth,
                                fck_mpa: material.fck_mpa,
                                fy_mpa: material.fy_mpa,
                                diameter_mm: diameter,
                                count,
                                stirrup_diameter_mm: stirrup.diameter_mm,
                                stirrup_legs: stirrup.legs,
                                stirrup_spacing_mm: spacing,
                            };
                            keys.push((key, context_of(gi, mi, si)));
                        }
                    }
                }
            }
        }
    }
    let total = keys.len();
    tracing::debug!(candidates = total, contexts = contexts.len(), "enumerated optimization candidates");

    let evaluations: Vec<Evaluation> = keys
        .par_iter()
        .map(|(key, ctx)| {
            if cancel.is_cancelled() {
                return Evaluation::Cancelled;
            }
            evaluate(&base, key, &contexts[*ctx], &request.config, settings)
        })
        .collect();

    let cancelled = evaluations
        .iter()
        .filter(|e| matches!(e, Evaluation::Cancelled))
        .count();
    if cancelled > 0 {
        tracing::warn!(completed = total - cancelled, total, "optimization cancelled");
        return Err(CalcError::Cancelled {
            completed: total - cancelled,
            total,
        });
    }

    let mut rejections = BTreeMap::new();
    let mut feasible = Vec::new();
    for evaluation in evaluations {
        match evaluation {
            Evaluation::Feasible(f) => feasible.push(*f),
            Evaluation::Rejected(reason) => *rejections.entry(reason).or_insert(0) += 1,
            Evaluation::Cancelled => {}
        }
    }
    feasible.sort_by(|a, b| a.key.cmp(&b.key));

    let reference = Objectives::best_of(feasible.iter().map(|f| &f.objectives));
    let candidates: Vec<OptimizationCandidate> = match reference {
        Some(reference) => feasible
            .into_iter()
            .map(|f| OptimizationCandidate {
                key: f.key,
                tension_face: f.tension_face,
                score: f.objectives.score(&request.config.weights, &reference),
                objectives: f.objectives,
                effective_depth_mm: f.effective_depth_mm,
                detailing: f.detailing,
            })
            .collect(),
        None => Vec::new(),
    };

    let frontier = ParetoFrontier::build(&candidates);
    let status = if candidates.is_empty() {
        tracing::info!(enumerated = total, "no feasible candidate");
        OptimizationStatus::NoFeasibleCandidate
    } else {
        OptimizationStatus::Feasible
    };
    tracing::debug!(
        enumerated = total,
        feasible = candidates.len(),
        frontier = frontier.len(),
        "optimization complete"
    );

    Ok(OptimizationResponse {
        schema_version: SCHEMA_VERSION.to_string(),
        label: request.base.label.clone(),
        status,
        enumerated: total,
        feasible: candidates.len(),
        rejections,
        recommended: frontier.recommended().map(|c| c.key),
        frontier,
    })
}

fn build_context(
    base: &DesignRequest,
    width: f64,
    depth: f64,
    material: Material,
    stirrup: StirrupSpec,
    settings: &DesignSettings,
) -> Context {
    let section = if width == base.section.width_mm && depth == base.section.overall_depth_mm {
        base.section
    } else {
        base.section.resized(width, depth)
    };
    let demand = demand_for(base, &section, material, stirrup, settings);
    Context {
        section,
        material,
        stirrup,
        demand,
    }
}

fn demand_for(
    base: &DesignRequest,
    section: &Section,
    material: Material,
    stirrup: StirrupSpec,
    settings: &DesignSettings,
) -> Result<Demand, RejectionReason> {
    if section.validate().is_err() {
        return Err(RejectionReason::InvalidGeometry);
    }
    let mut request = base.clone();
    request.section = *section;
    request.material = material;
    let cases = evaluate_cases(&request, section, stirrup, settings).map_err(|_| RejectionReason::InvalidGeometry)?;
    if cases.iter().any(|c| !c.flexure.is_safe || !c.shear.is_safe) {
        return Err(RejectionReason::SectionUnsafe);
    }
    let flexure = &cases[governing_flexure_index(&cases)].flexure;
    let spacing_limit = cases
        .iter()
        .map(|c| c.shear.design.minimum_spacing_mm.min(c.shear.design.maximum_spacing_mm))
        .fold(f64::INFINITY, f64::min);
    Ok(Demand {
        tension_face: flexure.tension_face,
        ast_required_mm2: flexure.ast_required_mm2,
        spacing_limit_mm: spacing_limit,
    })
}

fn evaluate(
    base: &DesignRequest,
    key: &CandidateKey,
    context: &Context,
    config: &OptimizationConfig,
    settings: &DesignSettings,
) -> Evaluation {
    let demand = match context.demand {
        Ok(demand) => demand,
        Err(reason) => return Evaluation::Rejected(reason),
    };
    let combination = BarCombination::single(key.diameter_mm, key.count);
    if combination.area_mm2() < demand.ast_required_mm2 {
        return Evaluation::Rejected(RejectionReason::AreaInsufficient);
    }
    if key.stirrup_spacing_mm > demand.spacing_limit_mm {
        return Evaluation::Rejected(RejectionReason::SpacingExceedsRequired);
    }
    let geometry = FaceGeometry::for_section(&context.section, context.stirrup.diameter_mm);
    let Some(plan) = arrange_bars(&combination, &geometry, &settings.detailing) else {
        return Evaluation::Rejected(RejectionReason::BarsDoNotFit);
    };
    let constraints = &config.constraints;
    if constraints.max_layers.is_some_and(|max| plan.layer_count() > max) {
        return Evaluation::Rejected(RejectionReason::TooManyLayers);
    }
    let steel_percent =
        100.0 * combination.area_mm2() / (context.section.width_mm * context.section.effective_depth_mm);
    if constraints.max_steel_percent.is_some_and(|max| steel_percent > max) {
        return Evaluation::Rejected(RejectionReason::SteelPercentExceeded);
    }

    // Full design with the bars and spacing fixed
    let mut request = base.clone();
    request.section = context.section;
    request.material = context.material;
    request.stirrup = Some(context.stirrup);
    let fixed = BarChoice::Fixed(combination);
    request.choice = match demand.tension_face {
        TensionFace::Bottom => ReinforcementChoice {
            top: BarChoice::Auto,
            bottom: fixed,
            stirrup_spacing_mm: Some(key.stirrup_spacing_mm),
        },
        TensionFace::Top => ReinforcementChoice {
            top: fixed,
            bottom: BarChoice::Auto,
            stirrup_spacing_mm: Some(key.stirrup_spacing_mm),
        },
    };
    let result = design_beam(&request, settings);
    if !result.is_ok {
        // τc follows the provided bars, so the strength spacing is only known here
        let spacing = result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::StirrupSpacingExceedsRequired);
        return Evaluation::Rejected(if spacing {
            RejectionReason::SpacingExceedsRequired
        } else {
            RejectionReason::DesignNotOk
        });
    }
    if constraints.require_ductile && result.is_ductile_compliant != Some(true) {
        return Evaluation::Rejected(RejectionReason::NotDuctile);
    }
    let Some(detailing) = result.detailing else {
        return Evaluation::Rejected(RejectionReason::DesignNotOk);
    };

    let quantities = Quantities::measure(&context.section, base.span_mm, &detailing);
    let objectives = Objectives {
        cost: objectives::cost(&quantities, context.material.fck_mpa, &config.rates),
        weight_kg: objectives::weight_kg(&quantities),
        carbon_kg: config.carbon.map(|f| objectives::carbon_kg(&quantities, &f)),
        constructability: objectives::constructability(&detailing, &settings.detailing),
    };
    if constraints.max_cost.is_some_and(|max| objectives.cost > max) {
        return Evaluation::Rejected(RejectionReason::OverBudget);
    }

    Evaluation::Feasible(Box::new(Feasible {
        key: *key,
        tension_face: demand.tension_face,
        objectives,
        effective_depth_mm: result.effective_depth_mm,
        detailing,
    }))
}

fn geometry_options(request: &OptimizationRequest) -> Vec<(f64, f64)> {
    match &request.geometry {
        None => vec![(request.base.section.width_mm, request.base.section.overall_depth_mm)],
        Some(bounds) => {
            let widths = sorted_unique_f64(bounds.widths_mm.clone());
            let depths = sorted_unique_f64(bounds.depths_mm.clone());
            widths
                .iter()
                .flat_map(|&w| depths.iter().map(move |&d| (w, d)))
                .collect()
        }
    }
}

fn material_options(request: &OptimizationRequest) -> Vec<Material> {
    let mut materials = if request.materials.is_empty() {
        vec![request.base.material]
    } else {
        request.materials.clone()
    };
    materials.sort_by(|a, b| a.fck_mpa.total_cmp(&b.fck_mpa).then(a.fy_mpa.total_cmp(&b.fy_mpa)));
    materials.dedup();
    materials
}

fn stirrup_options(request: &OptimizationRequest) -> Vec<StirrupSpec> {
    let diameters = sorted_unique(request.stirrups.diameters.clone());
    let legs = sorted_unique(request.stirrups.legs.clone());
    diameters
        .iter()
        .flat_map(|&d| legs.iter().map(move |&l| StirrupSpec::new(d, l)))
        .collect()
}

fn sorted_unique(mut values: Vec<u32>) -> Vec<u32> {
    values.sort_unstable();
    values.dedup();
    values
}

fn sorted_unique_f64(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}
