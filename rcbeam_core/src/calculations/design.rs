//! # Beam Design Pipeline
//!
//! Runs one beam through every engine and collects the results.
//!
//! ## Procedure
//!
//! 1. Validate the request and settings (an invalid request still returns a
//!    [`DesignResult`], carrying an `INVALID_INPUT` error)
//! 2. Flexure and shear for every load case, in input order
//! 3. Top/bottom steel envelope over the cases
//! 4. Detailing. When a second layer lowers the effective depth, flexure is
//!    re-run with the revised depth and the bars reselected, a bounded
//!    number of times.
//! 5. Serviceability of the governing flexure case with the selected bars
//!
//! Errors are listed in a fixed order: validation, then each case in input
//! order (flexure before shear), detailing, depth re-checks, serviceability.
//!
//! `design_beam` never fails past a single beam; [`design_batch`] designs
//! many beams in parallel and returns one outcome per request, in order.
//!
//! ## Example
//!
//! ```rust
//! use rcbeam_core::calculations::design::{design_beam, DesignRequest, LoadDemand};
//! use rcbeam_core::materials::Material;
//! use rcbeam_core::section::Section;
//! use rcbeam_core::settings::DesignSettings;
//!
//! let request = DesignRequest::new(
//!     Section::rectangular(300.0, 450.0, 410.0, 25.0),
//!     Material::new(25.0, 500.0),
//!     vec![LoadDemand::new(120.0, 90.0)],
//! )
//! .with_span(6000.0);
//! let result = design_beam(&request, &DesignSettings::default());
//! assert!(result.is_ok);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calculations::detailing::bar_selection::FaceGeometry;
use crate::calculations::detailing::stirrups::ShearDemand;
use crate::calculations::detailing::{self, DetailingInput, DetailingResult, ReinforcementChoice};
use crate::calculations::flexure::{self, FlexureInput, FlexureResult, TensionFace};
use crate::calculations::serviceability::{self, ServiceabilityInput, ServiceabilityResult, TensionBarLayout};
use crate::calculations::shear::{self, ShearInput, ShearResult, StirrupSpec};
use crate::cancel::CancelToken;
use crate::code_refs;
use crate::errors::{
    no_ductile_violations, no_errors, CalcError, CalcResult, DesignError, DesignStage, ErrorCode,
};
use crate::materials::Material;
use crate::section::{ExposureClass, Section, SupportCondition};
use crate::settings::DesignSettings;

/// Version of the request/result JSON contract
pub const SCHEMA_VERSION: &str = "1.0";

/// Depth changes below this are treated as settled (mm)
const DEPTH_TOLERANCE_MM: f64 = 0.5;

/// One factored load case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadDemand {
    /// Defaults to "case-N" (1-based) when absent
    #[serde(default)]
    pub case_id: Option<String>,
    /// Positive = sagging, negative = hogging (kN·m)
    pub moment_knm: f64,
    pub shear_kn: f64,
}

impl LoadDemand {
    pub fn new(moment_knm: f64, shear_kn: f64) -> Self {
        LoadDemand {
            case_id: None,
            moment_knm,
            shear_kn,
        }
    }

    pub fn with_id(mut self, case_id: impl Into<String>) -> Self {
        self.case_id = Some(case_id.into());
        self
    }
}

/// Everything needed to design one beam.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "B1",
///   "section": { "width_mm": 300.0, "overall_depth_mm": 450.0,
///                "effective_depth_mm": 410.0, "cover_mm": 25.0 },
///   "material": { "fck_mpa": 25.0, "fy_mpa": 500.0 },
///   "cases": [ { "case_id": "ULS-1", "moment_knm": 120.0, "shear_kn": 90.0 } ],
///   "span_mm": 6000.0,
///   "support": "SimplySupported",
///   "exposure": "Moderate"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRequest {
    #[serde(default)]
    pub label: Option<String>,
    pub section: Section,
    pub material: Material,
    pub cases: Vec<LoadDemand>,

    #[serde(default)]
    pub span_mm: Option<f64>,
    #[serde(default)]
    pub support: SupportCondition,
    #[serde(default)]
    pub exposure: ExposureClass,
    /// Apply IS 13920 ductile detailing
    #[serde(default)]
    pub ductile: bool,

    /// Stirrup size and legs; the settings default when absent
    #[serde(default)]
    pub stirrup: Option<StirrupSpec>,

    /// Fixed bars or stirrup spacing; automatic selection when absent
    #[serde(default)]
    pub choice: ReinforcementChoice,
}

impl DesignRequest {
    pub fn new(section: Section, material: Material, cases: Vec<LoadDemand>) -> Self {
        DesignRequest {
            label: None,
            section,
            material,
            cases,
            span_mm: None,
            support: SupportCondition::default(),
            exposure: ExposureClass::default(),
            ductile: false,
            stirrup: None,
            choice: ReinforcementChoice::default(),
        }
    }

    /// Set the effective span (builder pattern)
    pub fn with_span(mut self, span_mm: f64) -> Self {
        self.span_mm = Some(span_mm);
        self
    }

    pub fn with_support(mut self, support: SupportCondition) -> Self {
        self.support = support;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn validate(&self) -> CalcResult<()> {
        self.section.validate()?;
        self.material.validate()?;
        self.material.steel_grade()?;
        if self.cases.is_empty() {
            return Err(CalcError::missing_field("cases"));
        }
        for (i, case) in self.cases.iter().enumerate() {
            if !case.moment_knm.is_finite() || !case.shear_kn.is_finite() {
                return Err(CalcError::invalid_input(
                    format!("cases[{}]", i),
                    format!("{} kN·m, {} kN", case.moment_knm, case.shear_kn),
                    "Demands must be finite numbers",
                ));
            }
        }
        let ids = self.case_ids();
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(CalcError::invalid_input("cases.case_id", id.clone(), "Duplicate case id"));
            }
        }
        if let Some(span) = self.span_mm {
            if !(span > 0.0 && span.is_finite()) {
                return Err(CalcError::invalid_input("span_mm", span.to_string(), "Span must be positive"));
            }
        }
        if let Some(stirrup) = &self.stirrup {
            stirrup.validate()?;
        }
        Ok(())
    }

    /// Case ids with defaults filled in, in input order
    pub fn case_ids(&self) -> Vec<String> {
        self.cases
            .iter()
            .enumerate()
            .map(|(i, c)| c.case_id.clone().unwrap_or_else(|| format!("case-{}", i + 1)))
            .collect()
    }
}

/// Flexure and shear of one load case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    pub case_id: String,
    pub flexure: FlexureResult,
    pub shear: ShearResult,
}

/// Complete design of one beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignResult {
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub cases: Vec<CaseResult>,
    /// Case needing the most tension steel
    #[serde(default)]
    pub governing_flexure_case: Option<String>,
    /// Case with the largest stirrup demand
    #[serde(default)]
    pub governing_shear_case: Option<String>,
    /// Effective depth of the final pass (mm)
    pub effective_depth_mm: f64,
    /// Flexure re-runs caused by a second layer
    pub depth_rechecks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailing: Option<DetailingResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serviceability: Option<ServiceabilityResult>,
    pub errors: Vec<DesignError>,
    pub is_ok: bool,
    /// None when ductile detailing was not requested
    #[serde(default)]
    pub is_ductile_compliant: Option<bool>,
}

impl DesignResult {
    fn invalid(label: Option<String>, err: &CalcError) -> Self {
        DesignResult {
            schema_version: SCHEMA_VERSION.to_string(),
            label,
            cases: Vec::new(),
            governing_flexure_case: None,
            governing_shear_case: None,
            effective_depth_mm: 0.0,
            depth_rechecks: 0,
            detailing: None,
            serviceability: None,
            errors: vec![err.to_design_error()],
            is_ok: false,
            is_ductile_compliant: None,
        }
    }

    fn case(&self, id: Option<&String>) -> Option<&CaseResult> {
        id.and_then(|id| self.cases.iter().find(|c| &c.case_id == id))
    }

    pub fn governing_flexure(&self) -> Option<&FlexureResult> {
        self.case(self.governing_flexure_case.as_ref()).map(|c| &c.flexure)
    }

    pub fn governing_shear(&self) -> Option<&ShearResult> {
        self.case(self.governing_shear_case.as_ref()).map(|c| &c.shear)
    }
}

/// Design one beam. Never fails; problems are reported in `errors`.
pub fn design_beam(request: &DesignRequest, settings: &DesignSettings) -> DesignResult {
    match run_pipeline(request, settings) {
        Ok(result) => result,
        Err(err) => {
            tracing::debug!(label = ?request.label, error = %err, "design request rejected");
            DesignResult::invalid(request.label.clone(), &err)
        }
    }
}

struct Pass {
    cases: Vec<CaseResult>,
    governing_flexure: usize,
    governing_shear: usize,
    detailing: DetailingResult,
}

fn run_pipeline(request: &DesignRequest, settings: &DesignSettings) -> CalcResult<DesignResult> {
    settings.validate()?;
    request.validate()?;

    let stirrup = request_stirrup(request, settings);
    let original_depth = request.section.effective_depth_mm;
    let mut section = request.section;
    let mut feedback = Vec::new();
    let mut rechecks = 0;

    // ========================================================================
    // Flexure, shear and detailing, re-run while a second layer lowers d
    // ========================================================================
    let mut pass = design_pass(request, &section, stirrup, settings)?;
    loop {
        let face = pass.cases[pass.governing_flexure].flexure.tension_face;
        let revised = original_depth - pass.detailing.face(face).centroid_shift_mm();

        if revised >= section.effective_depth_mm - DEPTH_TOLERANCE_MM {
            break;
        }
        if rechecks >= settings.detailing.max_depth_rechecks {
            tracing::warn!(label = ?request.label, rechecks, "effective depth did not settle");
            feedback.push(DesignError::error(
                ErrorCode::EffectiveDepthUnsettled,
                DesignStage::Detailing,
                format!(
                    "Effective depth still changing after {} re-checks ({:.1} → {:.1} mm)",
                    rechecks, section.effective_depth_mm, revised
                ),
                code_refs::BAR_SPACING,
            ));
            break;
        }

        let mut lowered = section.with_effective_depth(revised);
        // d' belongs to the compression bars and does not follow d
        lowered.compression_depth_mm = Some(request.section.d_prime_mm());
        tracing::debug!(rechecks, revised, "re-running flexure with revised effective depth");
        match design_pass(request, &lowered, stirrup, settings) {
            Ok(next) => {
                rechecks += 1;
                feedback.push(DesignError::info(
                    ErrorCode::EffectiveDepthRecheck,
                    DesignStage::Detailing,
                    format!(
                        "Second layer lowers d from {:.1} to {:.1} mm; flexure re-checked",
                        section.effective_depth_mm, revised
                    ),
                    code_refs::BAR_SPACING,
                ));
                section = lowered;
                pass = next;
            }
            Err(err) => {
                // The last pass stands; its bars were designed for a deeper section
                tracing::warn!(label = ?request.label, revised, error = %err, "revised effective depth rejected");
                feedback.push(DesignError::error(
                    ErrorCode::EffectiveDepthUnsettled,
                    DesignStage::Detailing,
                    format!(
                        "Second layer lowers d from {:.1} to {:.1} mm, which cannot be designed: {}",
                        section.effective_depth_mm, revised, err
                    ),
                    code_refs::BAR_SPACING,
                ));
                break;
            }
        }
    }

    // ========================================================================
    // Serviceability with the selected bars
    // ========================================================================
    let governing = &pass.cases[pass.governing_flexure].flexure;
    let serviceability = check_serviceability(request, &section, stirrup, governing, &pass.detailing, settings)?;

    // ========================================================================
    // Errors in a fixed order
    // ========================================================================
    let mut errors = Vec::new();
    for case in &pass.cases {
        let id = Some(case.case_id.as_str());
        errors.extend(case.flexure.errors.iter().cloned().map(|e| e.for_case(id)));
        errors.extend(case.shear.errors.iter().cloned().map(|e| e.for_case(id)));
    }
    errors.extend(pass.detailing.errors.iter().cloned());
    errors.extend(feedback);
    errors.extend(serviceability.errors.iter().cloned());

    let is_ok = no_errors(&errors);
    let is_ductile_compliant = request.ductile.then(|| no_ductile_violations(&errors));

    tracing::debug!(
        label = ?request.label,
        is_ok,
        rechecks,
        errors = errors.len(),
        "beam design complete"
    );

    Ok(DesignResult {
        schema_version: SCHEMA_VERSION.to_string(),
        label: request.label.clone(),
        governing_flexure_case: Some(pass.cases[pass.governing_flexure].case_id.clone()),
        governing_shear_case: Some(pass.cases[pass.governing_shear].case_id.clone()),
        cases: pass.cases,
        effective_depth_mm: section.effective_depth_mm,
        depth_rechecks: rechecks,
        detailing: Some(pass.detailing),
        serviceability: Some(serviceability),
        errors,
        is_ok,
        is_ductile_compliant,
    })
}

/// Flexure and shear of every case on `section`, in input order.
pub(crate) fn evaluate_cases(
    request: &DesignRequest,
    section: &Section,
    stirrup: StirrupSpec,
    settings: &DesignSettings,
) -> CalcResult<Vec<CaseResult>> {
    let mut cases = Vec::with_capacity(request.cases.len());
    for (case, case_id) in request.cases.iter().zip(request.case_ids()) {
        let mut flexure_input = FlexureInput::new(*section, request.material, case.moment_knm);
        flexure_input.span_mm = request.span_mm;
        flexure_input.support = request.support;
        let flexure = flexure::calculate(&flexure_input, &settings.flexure)?;

        let shear_input = ShearInput::new(*section, request.material, case.shear_kn, flexure.tension_steel_percent)
            .with_stirrup(stirrup);
        let shear = shear::calculate(&shear_input, &settings.shear)?;

        cases.push(CaseResult { case_id, flexure, shear });
    }
    Ok(cases)
}

/// Case needing the most tension steel; the first one wins ties
pub(crate) fn governing_flexure_index(cases: &[CaseResult]) -> usize {
    (0..cases.len())
        .min_by(|&a, &b| {
            cases[b]
                .flexure
                .ast_required_mm2
                .total_cmp(&cases[a].flexure.ast_required_mm2)
        })
        .unwrap_or(0)
}

/// Case with the largest Vus, then the smallest spacing; the first one wins ties
fn governing_shear_index(cases: &[CaseResult]) -> usize {
    (0..cases.len())
        .min_by(|&a, &b| {
            let (sa, sb) = (&cases[a].shear, &cases[b].shear);
            sb.vus_kn()
                .total_cmp(&sa.vus_kn())
                .then(sa.spacing_mm.total_cmp(&sb.spacing_mm))
        })
        .unwrap_or(0)
}

/// Default stirrup when the request names none
pub(crate) fn request_stirrup(request: &DesignRequest, settings: &DesignSettings) -> StirrupSpec {
    request.stirrup.unwrap_or(StirrupSpec::new(
        settings.detailing.stirrup_diameter_mm,
        settings.detailing.stirrup_legs,
    ))
}

fn design_pass(
    request: &DesignRequest,
    section: &Section,
    stirrup: StirrupSpec,
    settings: &DesignSettings,
) -> CalcResult<Pass> {
    let mut cases = evaluate_cases(request, section, stirrup, settings)?;
    let governing_flexure = governing_flexure_index(&cases);
    let governing_shear = governing_shear_index(&cases);

    // Steel envelope: tension steel on the tension face, compression steel opposite
    let mut top = 0.0_f64;
    let mut bottom = 0.0_f64;
    for case in &cases {
        let f = &case.flexure;
        let (tension, compression) = match f.tension_face {
            TensionFace::Bottom => (&mut bottom, &mut top),
            TensionFace::Top => (&mut top, &mut bottom),
        };
        *tension = tension.max(f.ast_required_mm2);
        *compression = compression.max(f.asc_required_mm2);
    }

    let mut detailing_input = DetailingInput::new(
        *section,
        request.material,
        top,
        bottom,
        shear_demand(&cases[governing_shear].shear),
    );
    detailing_input.span_mm = request.span_mm;
    detailing_input.support = request.support;
    detailing_input.exposure = request.exposure;
    detailing_input.ductile = request.ductile;
    detailing_input.stirrup = stirrup;
    detailing_input.choice = request.choice.clone();
    let selected = detailing::calculate(&detailing_input, settings)?;

    // === τc from the bars actually provided (Table 19 uses 100 As / bd) ===
    let bd = section.width_mm * section.effective_depth_mm;
    for (case, demand) in cases.iter_mut().zip(&request.cases) {
        let provided = selected.face(case.flexure.tension_face).provided_mm2;
        let ast = provided.max(case.flexure.ast_required_mm2);
        let shear_input = ShearInput::new(*section, request.material, demand.shear_kn, 100.0 * ast / bd)
            .with_stirrup(stirrup);
        case.shear = shear::calculate(&shear_input, &settings.shear)?;
    }
    let governing_shear = governing_shear_index(&cases);

    // Stirrups follow the revised shear; bar selection does not depend on it
    detailing_input.shear = shear_demand(&cases[governing_shear].shear);
    let detailing = detailing::calculate(&detailing_input, settings)?;

    Ok(Pass {
        cases,
        governing_flexure,
        governing_shear,
        detailing,
    })
}

fn shear_demand(shear: &ShearResult) -> ShearDemand {
    ShearDemand {
        shear_kn: shear.shear_kn,
        tau_c_mpa: shear.tau_c_mpa,
        support_spacing_mm: shear.spacing_mm,
    }
}

fn check_serviceability(
    request: &DesignRequest,
    section: &Section,
    stirrup: StirrupSpec,
    governing: &FlexureResult,
    detailing: &DetailingResult,
    settings: &DesignSettings,
) -> CalcResult<ServiceabilityResult> {
    let tension = detailing.face(governing.tension_face);
    let compression = detailing.face(governing.tension_face.opposite());

    let Some(plan) = tension.plan.as_ref().filter(|_| tension.provided_mm2 > 0.0) else {
        let skipped = DesignError::info(
            ErrorCode::ServiceabilitySkipped,
            DesignStage::Serviceability,
            "No tension bars selected; serviceability not checked",
            code_refs::SPAN_DEPTH,
        );
        return Ok(ServiceabilityResult {
            span_depth: None,
            lateral_stability: None,
            crack_width: None,
            errors: vec![skipped],
            is_ok: true,
        });
    };

    let geometry = FaceGeometry::for_section(section, stirrup.diameter_mm);
    let tension_bars = plan.layers.first().map(|outer| {
        let phi = outer.max_diameter() as f64;
        TensionBarLayout {
            bar_diameter_mm: phi,
            bar_spacing_mm: outer.centre_spacing_mm,
            centre_from_face_mm: outer.centre_from_face_mm,
            centre_from_side_mm: geometry.offset_mm + phi / 2.0,
        }
    });

    let input = ServiceabilityInput {
        section: *section,
        material: request.material,
        span_mm: request.span_mm,
        support: request.support,
        exposure: request.exposure,
        moment_knm: governing.moment_knm,
        ast_required_mm2: governing.ast_required_mm2,
        ast_provided_mm2: tension.provided_mm2,
        asc_provided_mm2: compression.provided_mm2,
        flange_width_mm: governing.flange.map(|f| f.effective_width_mm),
        tension_bars,
    };
    serviceability::calculate(&input, &settings.serviceability)
}

// ============================================================================
// Batch
// ============================================================================

/// Many independent beams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub schema_version: String,
    pub requests: Vec<DesignRequest>,
}

impl BatchRequest {
    pub fn new(requests: Vec<DesignRequest>) -> Self {
        BatchRequest {
            schema_version: SCHEMA_VERSION.to_string(),
            requests,
        }
    }
}

/// Outcome for one request of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "result")]
pub enum BatchOutcome {
    Designed(Box<DesignResult>),
    /// Skipped because the run was cancelled first
    Cancelled { index: usize, label: Option<String> },
}

impl BatchOutcome {
    pub fn design(&self) -> Option<&DesignResult> {
        match self {
            BatchOutcome::Designed(result) => Some(result),
            BatchOutcome::Cancelled { .. } => None,
        }
    }
}

/// Design every beam of a batch in parallel.
///
/// Outcomes are returned in request order. Cancellation is checked before
/// each beam; beams already started finish normally.
pub fn design_batch(
    batch: &BatchRequest,
    settings: &DesignSettings,
    cancel: &CancelToken,
) -> CalcResult<Vec<BatchOutcome>> {
    if batch.schema_version != SCHEMA_VERSION {
        return Err(CalcError::VersionMismatch {
            file_version: batch.schema_version.clone(),
            expected_version: SCHEMA_VERSION.to_string(),
        });
    }
    tracing::info!(beams = batch.requests.len(), "batch design started");

    let outcomes: Vec<BatchOutcome> = batch
        .requests
        .par_iter()
        .enumerate()
        .map(|(index, request)| {
            if cancel.is_cancelled() {
                BatchOutcome::Cancelled {
                    index,
                    label: request.label.clone(),
                }
            } else {
                BatchOutcome::Designed(Box::new(design_beam(request, settings)))
            }
        })
        .collect();

    let cancelled = outcomes
        .iter()
        .filter(|o| matches!(o, BatchOutcome::Cancelled { .. }))
        .count();
    if cancelled > 0 {
        tracing::warn!(cancelled, total = outcomes.len(), "batch cancelled");
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::flexure::ReinforcementType;
    use crate::errors::Severity;
    use crate::section::{FlangeGeometry, FlangeKind};

    fn scenario(moment_knm: f64, shear_kn: f64) -> DesignRequest {
        DesignRequest::new(
            Section::rectangular(300.0, 450.0, 410.0, 25.0),
            Material::new(25.0, 500.0),
            vec![LoadDemand::new(moment_knm, shear_kn)],
        )
        .with_span(6000.0)
    }

    fn run(request: &DesignRequest) -> DesignResult {
        design_beam(request, &DesignSettings::default())
    }

    #[test]
    fn test_scenario_design() {
        let result = run(&scenario(120.0, 90.0));
        assert!(result.is_ok, "{:?}", result.errors);
        let flexure = result.governing_flexure().unwrap();
        assert_eq!(flexure.reinforcement, ReinforcementType::Singly);
        let detailing = result.detailing.as_ref().unwrap();
        assert!(detailing.bottom.provided_mm2 >= flexure.ast_required_mm2);
        // The least-area bars need two layers, so flexure is re-checked once
        assert_eq!(result.depth_rechecks, 1);
        assert!(result.effective_depth_mm < 410.0);
        assert_eq!(detailing.bottom.combination().unwrap().to_string(), "7-12φ");
        assert!(410.0 - detailing.bottom.centroid_shift_mm() >= result.effective_depth_mm - DEPTH_TOLERANCE_MM);
        assert!(result.serviceability.as_ref().unwrap().crack_width.is_some());
        assert!(result.is_ductile_compliant.is_none());
    }

    #[test]
    fn test_invalid_request_returns_result() {
        let mut request = scenario(120.0, 90.0);
        request.section.width_mm = -300.0;
        let result = run(&request);
        assert!(!result.is_ok);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ErrorCode::InvalidInput);
        assert_eq!(result.errors[0].stage, DesignStage::Validation);
        assert!(result.detailing.is_none());
    }

    #[test]
    fn test_missing_cases() {
        let mut request = scenario(120.0, 90.0);
        request.cases.clear();
        let result = run(&request);
        assert_eq!(result.errors[0].code, ErrorCode::MissingField);
    }

    #[test]
    fn test_duplicate_case_ids_rejected() {
        let mut request = scenario(120.0, 90.0);
        request.cases = vec![
            LoadDemand::new(100.0, 80.0).with_id("A"),
            LoadDemand::new(120.0, 90.0).with_id("A"),
        ];
        assert!(!run(&request).is_ok);
    }

    #[test]
    fn test_governing_cases() {
        let mut request = scenario(120.0, 90.0);
        request.cases = vec![
            LoadDemand::new(120.0, 60.0).with_id("flexure"),
            LoadDemand::new(60.0, 150.0).with_id("shear"),
        ];
        let result = run(&request);
        assert_eq!(result.governing_flexure_case.as_deref(), Some("flexure"));
        assert_eq!(result.governing_shear_case.as_deref(), Some("shear"));
    }

    #[test]
    fn test_envelope_over_hogging_and_sagging() {
        let mut request = scenario(0.0, 90.0).with_support(SupportCondition::Continuous);
        request.cases = vec![LoadDemand::new(100.0, 90.0), LoadDemand::new(-140.0, 110.0)];
        let result = run(&request);
        let detailing = result.detailing.as_ref().unwrap();
        assert!(!detailing.top.nominal);
        assert!(!detailing.bottom.nominal);
        assert!(detailing.top.required_mm2 > detailing.bottom.required_mm2);
        assert_eq!(result.governing_flexure().unwrap().tension_face, TensionFace::Top);
    }

    #[test]
    fn test_errors_tagged_in_case_order() {
        let mut request = scenario(120.0, 90.0);
        request.cases = vec![LoadDemand::new(0.0, 0.0), LoadDemand::new(120.0, 90.0)];
        let result = run(&request);
        let first = result.errors.first().unwrap();
        assert_eq!(first.code, ErrorCode::ZeroMoment);
        assert_eq!(first.case_id.as_deref(), Some("case-1"));
        let stages: Vec<DesignStage> = result.errors.iter().map(|e| e.stage).collect();
        let last_case = stages.iter().rposition(|s| *s == DesignStage::Shear).unwrap();
        let first_detailing = stages.iter().position(|s| *s == DesignStage::Detailing).unwrap();
        assert!(last_case < first_detailing);
    }

    #[test]
    fn test_doubly_reinforced_scenario() {
        let result = run(&scenario(200.0, 90.0));
        let flexure = result.governing_flexure().unwrap();
        assert_eq!(flexure.reinforcement, ReinforcementType::Doubly);
        assert!(flexure.asc_required_mm2 > 0.0);
        assert!(flexure.iterations <= DesignSettings::default().flexure.max_iterations);
        let detailing = result.detailing.as_ref().unwrap();
        assert!(detailing.top.provided_mm2 >= flexure.asc_required_mm2);
        assert!(!detailing.top.nominal);
    }

    #[test]
    fn test_second_layer_triggers_depth_recheck() {
        // Ast beyond 4-32φ, the most one layer of a 300 mm web holds
        let result = run(&scenario(520.0, 120.0));
        assert!(result.depth_rechecks >= 1, "{:?}", result.errors);
        assert!(result.effective_depth_mm < 410.0);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::EffectiveDepthRecheck));
    }

    #[test]
    fn test_tau_c_uses_provided_steel() {
        let result = run(&scenario(120.0, 90.0));
        let flexure = result.governing_flexure().unwrap();
        let shear = result.governing_shear().unwrap();
        let provided = result.detailing.as_ref().unwrap().bottom.provided_mm2;
        assert!(provided > flexure.ast_required_mm2);

        let (tau_c, _, _) = shear::concrete_shear_strength(25.0, 100.0 * provided / (300.0 * result.effective_depth_mm));
        assert_eq!(shear.tau_c_mpa, tau_c);
        let (from_required, _, _) = shear::concrete_shear_strength(25.0, flexure.tension_steel_percent);
        assert!(shear.tau_c_mpa > from_required);
    }

    #[test]
    fn test_rejected_revised_depth_keeps_last_pass() {
        let mut request = scenario(120.0, 90.0);
        // d' just under d / 2, so any lower d fails validation
        request.section.compression_depth_mm = Some(204.0);
        let result = run(&request);
        let unsettled = result
            .errors
            .iter()
            .find(|e| e.code == ErrorCode::EffectiveDepthUnsettled)
            .unwrap();
        assert_eq!(unsettled.stage, DesignStage::Detailing);
        assert_eq!(unsettled.severity, Severity::Error);
        assert!(!result.is_ok);
        assert!(result.errors.iter().all(|e| e.stage != DesignStage::Validation));
        assert_eq!(result.depth_rechecks, 0);
        assert_eq!(result.effective_depth_mm, 410.0);
        assert_eq!(result.cases.len(), 1);
        assert!(result.detailing.is_some());
        assert!(result.serviceability.is_some());
    }

    #[test]
    fn test_depth_recheck_bound() {
        let mut settings = DesignSettings::default();
        settings.detailing.max_depth_rechecks = 0;
        let result = design_beam(&scenario(520.0, 120.0), &settings);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::EffectiveDepthUnsettled));
        assert!(!result.is_ok);
    }

    #[test]
    fn test_flanged_without_span_is_invalid() {
        let mut request = scenario(120.0, 90.0);
        request.span_mm = None;
        request.section = request.section.with_flange(FlangeGeometry {
            kind: FlangeKind::T,
            thickness_mm: 120.0,
            width_mm: None,
            isolated: false,
        });
        let result = run(&request);
        assert!(!result.is_ok);
        assert_eq!(result.errors[0].stage, DesignStage::Validation);
    }

    #[test]
    fn test_ductile_flag() {
        let mut request = scenario(120.0, 90.0);
        request.ductile = true;
        let result = run(&request);
        assert!(result.is_ok);
        assert_eq!(result.is_ductile_compliant, Some(true));
    }

    #[test]
    fn test_determinism() {
        let a = serde_json::to_string(&run(&scenario(200.0, 150.0))).unwrap();
        let b = serde_json::to_string(&run(&scenario(200.0, 150.0))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_batch_keeps_order() {
        let batch = BatchRequest::new(vec![
            scenario(120.0, 90.0).with_label("B1"),
            scenario(80.0, 60.0).with_label("B2"),
            scenario(160.0, 120.0).with_label("B3"),
        ]);
        let outcomes = design_batch(&batch, &DesignSettings::default(), &CancelToken::new()).unwrap();
        let labels: Vec<&str> = outcomes
            .iter()
            .filter_map(|o| o.design())
            .filter_map(|r| r.label.as_deref())
            .collect();
        assert_eq!(labels, vec!["B1", "B2", "B3"]);
    }

    #[test]
    fn test_batch_continues_past_invalid_beam() {
        let mut bad = scenario(120.0, 90.0);
        bad.material.fy_mpa = 300.0;
        let batch = BatchRequest::new(vec![bad, scenario(120.0, 90.0)]);
        let outcomes = design_batch(&batch, &DesignSettings::default(), &CancelToken::new()).unwrap();
        assert!(!outcomes[0].design().unwrap().is_ok);
        assert!(outcomes[1].design().unwrap().is_ok);
    }

    #[test]
    fn test_batch_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let batch = BatchRequest::new(vec![scenario(120.0, 90.0); 3]);
        let outcomes = design_batch(&batch, &DesignSettings::default(), &token).unwrap();
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, BatchOutcome::Cancelled { .. })));
    }

    #[test]
    fn test_batch_version_mismatch() {
        let mut batch = BatchRequest::new(vec![scenario(120.0, 90.0)]);
        batch.schema_version = "0.9".to_string();
        let err = design_batch(&batch, &DesignSettings::default(), &CancelToken::new()).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");
    }

    #[test]
    fn test_request_json_defaults() {
        let json = r#"{
            "section": { "width_mm": 300.0, "overall_depth_mm": 450.0,
                         "effective_depth_mm": 410.0, "cover_mm": 25.0 },
            "material": { "fck_mpa": 25.0, "fy_mpa": 500.0 },
            "cases": [ { "moment_knm": 120.0, "shear_kn": 90.0 } ]
        }"#;
        let request: DesignRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.support, SupportCondition::SimplySupported);
        assert_eq!(request.case_ids(), vec!["case-1".to_string()]);
        assert!(run(&request).is_ok);
    }
}
