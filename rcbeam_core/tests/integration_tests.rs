//! Integration tests for rcbeam_core.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use rcbeam_core::calculations::design::{BatchOutcome, BatchRequest, SCHEMA_VERSION};
use rcbeam_core::calculations::flexure::{self, FlexureInput, ReinforcementType, TensionFace};
use rcbeam_core::calculations::shear::{self, ShearInput};
use rcbeam_core::optimization::beam_line::{BeamLineGroup, BeamLineStatus};
use rcbeam_core::optimization::{
    dominates, OptimizationConfig, OptimizationStatus, ObjectiveWeights,
};
use rcbeam_core::settings::FlexureSettings;
use rcbeam_core::{
    design_batch, design_beam, optimize, standardize, CalcError, CancelToken, DesignRequest,
    DesignSettings, ErrorCode, LoadDemand, Material, OptimizationRequest, Section, Severity,
};

fn section() -> Section {
    Section::rectangular(300.0, 450.0, 410.0, 25.0)
}

fn material() -> Material {
    Material::new(25.0, 500.0)
}

fn request(moment_knm: f64, shear_kn: f64) -> DesignRequest {
    DesignRequest::new(section(), material(), vec![LoadDemand::new(moment_knm, shear_kn)])
        .with_span(6000.0)
        .with_label("B1")
}

fn settings() -> DesignSettings {
    DesignSettings::default()
}

mod scenario_tests {
    use super::*;

    #[test]
    fn test_singly_reinforced_scenario() {
        let result = design_beam(&request(120.0, 90.0), &settings());

        assert!(result.is_ok, "{:?}", result.errors);
        assert!(result.errors.iter().all(|e| e.severity != Severity::Error));

        let flexure = result.governing_flexure().unwrap();
        assert_eq!(flexure.reinforcement, ReinforcementType::Singly);
        assert!(flexure.is_safe);

        // Ast = 770.9 mm² at d = 410; the two-layer bars lower d and flexure is re-run there
        let first_pass = flexure::calculate(&FlexureInput::new(section(), material(), 120.0), &FlexureSettings::default()).unwrap();
        assert_abs_diff_eq!(first_pass.ast_required_mm2, 770.9, epsilon = 2.0);
        assert!(result.effective_depth_mm < 410.0);
        let revised = section().with_effective_depth(result.effective_depth_mm);
        let final_pass = flexure::calculate(&FlexureInput::new(revised, material(), 120.0), &FlexureSettings::default()).unwrap();
        assert_relative_eq!(flexure.ast_required_mm2, final_pass.ast_required_mm2);
        assert!(flexure.ast_required_mm2 > first_pass.ast_required_mm2);

        let shear = result.governing_shear().unwrap();
        assert!(shear.stirrups_designed);
        assert!(shear.vus_kn() > 0.0);

        let bottom = &result.detailing.as_ref().unwrap().bottom;
        assert!(bottom.provided_mm2 >= flexure.ast_required_mm2);
    }

    #[test]
    fn test_moment_above_limit_is_doubly_reinforced() {
        let result = design_beam(&request(250.0, 90.0), &settings());
        let flexure = result.governing_flexure().unwrap();
        assert!(flexure.moment_knm > flexure.mu_lim_knm);
        assert_eq!(flexure.reinforcement, ReinforcementType::Doubly);
        assert!(flexure.asc_required_mm2 > 0.0);
        assert!(flexure.iterations >= 1);
        assert!(flexure.is_safe);
        let detailing = result.detailing.as_ref().unwrap();
        assert!(detailing.top.provided_mm2 >= flexure.asc_required_mm2);
    }

    #[test]
    fn test_zero_moment_and_zero_shear_are_reported() {
        let result = design_beam(&request(0.0, 0.0), &settings());
        assert!(result.is_ok);
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::ZeroMoment));
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::ZeroShear));
        let flexure = result.governing_flexure().unwrap();
        assert_relative_eq!(flexure.ast_required_mm2, flexure.ast_min_mm2);
    }

    #[test]
    fn test_invalid_input_returns_result() {
        let mut bad = request(120.0, 90.0);
        bad.material = Material::new(25.0, 300.0);
        let result = design_beam(&bad, &settings());
        assert!(!result.is_ok);
        assert_eq!(result.cases.len(), 0);
        assert_eq!(result.errors.len(), 1);
    }
}

mod property_tests {
    use super::*;

    #[test]
    fn test_round_trip_capacity() {
        let flexure_settings = FlexureSettings::default();
        for m in [30.0, 80.0, 120.0, 160.0] {
            let r = flexure::calculate(&FlexureInput::new(section(), material(), m), &flexure_settings).unwrap();
            let cap = flexure::moment_capacity(
                &section(),
                &material(),
                None,
                r.ast_calculated_mm2,
                0.0,
                &flexure_settings,
            )
            .unwrap();
            assert!(cap.moment_knm >= m * (1.0 - 1.0e-3), "M = {} capacity = {}", m, cap.moment_knm);
        }
    }

    #[test]
    fn test_required_steel_monotonic_in_moment() {
        let flexure_settings = FlexureSettings::default();
        let mut previous = 0.0;
        for i in 0..=30 {
            let m = i as f64 * 10.0;
            let r = flexure::calculate(&FlexureInput::new(section(), material(), m), &flexure_settings).unwrap();
            assert!(r.total_steel_mm2() >= previous - 1e-9, "M = {}", m);
            previous = r.total_steel_mm2();
        }
    }

    #[test]
    fn test_stirrup_spacing_monotonic_in_shear() {
        let shear_settings = settings().shear;
        let mut previous = f64::INFINITY;
        for i in 0..=20 {
            let v = i as f64 * 15.0;
            let r = shear::calculate(&ShearInput::new(section(), material(), v, 0.75), &shear_settings).unwrap();
            assert!(r.spacing_mm <= previous, "V = {}", v);
            previous = r.spacing_mm;
        }
    }

    #[test]
    fn test_selected_bars_sufficient() {
        for m in [40.0, 90.0, 130.0, 160.0] {
            let result = design_beam(&request(m, 60.0), &settings());
            let flexure = result.governing_flexure().unwrap();
            let face = result.detailing.as_ref().unwrap().face(flexure.tension_face);
            assert!(face.provided_mm2 >= face.required_mm2, "M = {}", m);
        }
    }

    #[test]
    fn test_hogging_face() {
        let mut hogging = request(-120.0, 90.0);
        hogging.support = rcbeam_core::section::SupportCondition::Continuous;
        let result = design_beam(&hogging, &settings());
        assert!(result.is_ok);
        assert_eq!(result.governing_flexure().unwrap().tension_face, TensionFace::Top);
        let detailing = result.detailing.as_ref().unwrap();
        assert!(detailing.top.provided_mm2 > detailing.bottom.provided_mm2);
    }

    #[test]
    fn test_pipeline_deterministic() {
        let a = serde_json::to_string(&design_beam(&request(160.0, 140.0), &settings())).unwrap();
        let b = serde_json::to_string(&design_beam(&request(160.0, 140.0), &settings())).unwrap();
        assert_eq!(a, b);
    }
}

mod batch_tests {
    use super::*;

    #[test]
    fn test_batch_round_trip_json() {
        let batch = BatchRequest::new(vec![request(120.0, 90.0), request(60.0, 40.0)]);
        let json = serde_json::to_string(&batch).unwrap();
        let parsed: BatchRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.schema_version, SCHEMA_VERSION);

        let outcomes = design_batch(&parsed, &settings(), &CancelToken::new()).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| matches!(o, BatchOutcome::Designed(r) if r.is_ok)));
    }

    #[test]
    fn test_batch_version_mismatch() {
        let mut batch = BatchRequest::new(vec![request(120.0, 90.0)]);
        batch.schema_version = "0.9".into();
        let err = design_batch(&batch, &settings(), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, CalcError::VersionMismatch { .. }));
    }
}

mod optimization_tests {
    use super::*;

    /// 3 diameters × 4 counts × 3 spacings
    fn search() -> OptimizationRequest {
        OptimizationRequest::new(request(120.0, 90.0))
            .with_diameters(vec![12, 16, 20])
            .with_counts(2, 5)
            .with_stirrup_spacings(vec![100.0, 150.0, 200.0])
    }

    #[test]
    fn test_frontier_bounded_by_feasible() {
        let response = optimize(&search(), &settings(), &CancelToken::new()).unwrap();
        assert_eq!(response.enumerated, 36);
        assert_eq!(response.status, OptimizationStatus::Feasible);
        assert!(response.frontier.len() <= response.feasible);
        assert!(response.feasible <= response.enumerated);
    }

    #[test]
    fn test_no_member_dominates_another() {
        let weights = ObjectiveWeights {
            cost: 1.0,
            weight: 0.5,
            carbon: 0.0,
            constructability: 0.5,
        };
        let request = search().with_config(OptimizationConfig::new().with_weights(weights));
        let response = optimize(&request, &settings(), &CancelToken::new()).unwrap();
        let members = &response.frontier.members;
        for (i, a) in members.iter().enumerate() {
            for (j, b) in members.iter().enumerate() {
                if i != j {
                    assert!(!dominates(&a.objectives, &b.objectives), "{} dominates {}", a.key.label(), b.key.label());
                }
            }
        }
        // Ranked by score
        assert!(members.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn test_optimization_deterministic() {
        let a = optimize(&search(), &settings(), &CancelToken::new()).unwrap();
        let b = optimize(&search(), &settings(), &CancelToken::new()).unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_geometry_and_material_search() {
        let request = search()
            .with_geometry(vec![250.0, 300.0], vec![400.0, 450.0, 500.0])
            .with_materials(vec![Material::new(25.0, 500.0), Material::new(30.0, 415.0)]);
        let response = optimize(&request, &settings(), &CancelToken::new()).unwrap();
        assert_eq!(response.enumerated, 2 * 3 * 2 * 36);
        let recommended = response.recommended_candidate().unwrap();
        assert!(recommended.detailing.is_ok);
    }

    #[test]
    fn test_identical_beams_standardize_with_zero_delta() {
        let group = BeamLineGroup {
            name: "Line A".into(),
            members: vec![search(), search()],
        };
        let report = standardize(&group, &settings(), &CancelToken::new()).unwrap();
        assert_eq!(report.status, BeamLineStatus::Standardized);
        assert_abs_diff_eq!(report.cost_delta, 0.0);
        assert_abs_diff_eq!(report.weight_delta_kg, 0.0);
        for member in &report.members {
            assert_eq!(
                member.independent.as_ref().map(|c| c.key),
                member.standardized.as_ref().map(|c| c.key)
            );
        }
    }

    #[test]
    fn test_cancelled_optimization() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = optimize(&search(), &settings(), &cancel).unwrap_err();
        assert_eq!(err.error_code(), "CANCELLED");
    }
}
