//! IS 13920 ductile detailing of flexural members
//!
//! Requirements that can be met by detailing (minimum steel, bar sizes,
//! confinement spacing) are applied while detailing. Anything still out of
//! bounds is reported as a `DuctileViolation`, which leaves `is_ok` alone.

use serde::{Deserialize, Serialize};

use crate::code_refs;
use crate::errors::{DesignError, ErrorCode};
use crate::materials::Material;
use crate::section::Section;

/// Minimum web width (mm), 6.1.2
pub const MIN_WIDTH_MM: f64 = 200.0;

/// Minimum width / overall depth, 6.1.1
pub const MIN_WIDTH_DEPTH_RATIO: f64 = 0.3;

/// Maximum steel ratio on any face, 6.2.2
pub const MAX_STEEL_RATIO: f64 = 0.025;

/// Smallest longitudinal bar (mm)
pub const MIN_BAR_DIAMETER_MM: u32 = 12;

/// Smallest hoop (mm); 6 mm is allowed for spans up to 5 m
pub const MIN_HOOP_DIAMETER_MM: u32 = 8;
pub const SHORT_SPAN_HOOP_DIAMETER_MM: u32 = 6;
pub const SHORT_SPAN_MM: f64 = 5000.0;

/// Confinement zone length as a multiple of d, 6.3.5
pub const CONFINEMENT_ZONE_FACTOR: f64 = 2.0;

/// Absolute cap on hoop spacing in the confinement zone (mm)
const MAX_CONFINEMENT_SPACING_MM: f64 = 100.0;

/// Ductile limits for a section, reported with the detailing result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuctileLimits {
    /// 0.24 √fck / fy × b d (mm²)
    pub minimum_steel_mm2: f64,
    /// 2.5 % of b d (mm²)
    pub maximum_steel_mm2: f64,
    /// 2 d from each support face (mm)
    pub confinement_zone_mm: f64,
    /// min(d/4, 6 φmin, 100) (mm)
    pub confinement_spacing_mm: f64,
    /// d/2 (mm)
    pub general_spacing_mm: f64,
}

/// Tension steel ratio 0.24 √fck / fy
pub fn minimum_steel_ratio(material: &Material) -> f64 {
    0.24 * material.fck_mpa.sqrt() / material.fy_mpa
}

pub fn limits(section: &Section, material: &Material, smallest_bar_mm: u32) -> DuctileLimits {
    let bd = section.width_mm * section.effective_depth_mm;
    let d = section.effective_depth_mm;
    DuctileLimits {
        minimum_steel_mm2: minimum_steel_ratio(material) * bd,
        maximum_steel_mm2: MAX_STEEL_RATIO * bd,
        confinement_zone_mm: CONFINEMENT_ZONE_FACTOR * d,
        confinement_spacing_mm: (d / 4.0)
            .min(6.0 * smallest_bar_mm as f64)
            .min(MAX_CONFINEMENT_SPACING_MM),
        general_spacing_mm: d / 2.0,
    }
}

/// Section proportion checks (6.1)
pub fn check_geometry(section: &Section) -> Vec<DesignError> {
    let mut out = Vec::new();
    let b = section.width_mm;
    let ratio = b / section.overall_depth_mm;
    if b < MIN_WIDTH_MM {
        out.push(DesignError::ductile(
            ErrorCode::DuctileGeometry,
            format!("Width {:.0} mm is below {:.0} mm", b, MIN_WIDTH_MM),
            code_refs::DUCTILE_GEOMETRY,
        ));
    }
    if ratio < MIN_WIDTH_DEPTH_RATIO {
        out.push(DesignError::ductile(
            ErrorCode::DuctileGeometry,
            format!("b/D = {:.2} is below {:.1}", ratio, MIN_WIDTH_DEPTH_RATIO),
            code_refs::DUCTILE_GEOMETRY,
        ));
    }
    out
}

/// Provided steel on both faces (6.2)
pub fn check_longitudinal(
    limits: &DuctileLimits,
    top_provided_mm2: f64,
    bottom_provided_mm2: f64,
    smallest_bar_mm: u32,
) -> Vec<DesignError> {
    let mut out = Vec::new();
    for (face, area) in [("Top", top_provided_mm2), ("Bottom", bottom_provided_mm2)] {
        if area < limits.minimum_steel_mm2 {
            out.push(DesignError::ductile(
                ErrorCode::DuctileLongitudinalRatio,
                format!(
                    "{} steel {:.0} mm² is below the ductile minimum {:.0} mm²",
                    face, area, limits.minimum_steel_mm2
                ),
                code_refs::DUCTILE_LONGITUDINAL,
            ));
        }
        if area > limits.maximum_steel_mm2 {
            out.push(DesignError::ductile(
                ErrorCode::DuctileLongitudinalRatio,
                format!(
                    "{} steel {:.0} mm² exceeds 2.5 % of b d ({:.0} mm²)",
                    face, area, limits.maximum_steel_mm2
                ),
                code_refs::DUCTILE_LONGITUDINAL,
            ));
        }
    }
    if bottom_provided_mm2 < 0.5 * top_provided_mm2 {
        out.push(DesignError::ductile(
            ErrorCode::DuctileLongitudinalRatio,
            format!(
                "Bottom steel {:.0} mm² is less than half the top steel {:.0} mm²",
                bottom_provided_mm2, top_provided_mm2
            ),
            code_refs::DUCTILE_LONGITUDINAL,
        ));
    }
    if smallest_bar_mm < MIN_BAR_DIAMETER_MM {
        out.push(DesignError::ductile(
            ErrorCode::DuctileBarDiameter,
            format!(
                "{} mm bars used; ductile detailing needs at least {} mm",
                smallest_bar_mm, MIN_BAR_DIAMETER_MM
            ),
            code_refs::DUCTILE_LONGITUDINAL,
        ));
    }
    out
}

/// Hoop size and spacing (6.3)
pub fn check_transverse(
    limits: &DuctileLimits,
    hoop_diameter_mm: u32,
    span_mm: Option<f64>,
    support_zone_spacing_mm: f64,
    middle_spacing_mm: f64,
) -> Vec<DesignError> {
    let mut out = Vec::new();
    let min_hoop = match span_mm {
        Some(span) if span <= SHORT_SPAN_MM => SHORT_SPAN_HOOP_DIAMETER_MM,
        _ => MIN_HOOP_DIAMETER_MM,
    };
    if hoop_diameter_mm < min_hoop {
        out.push(DesignError::ductile(
            ErrorCode::DuctileStirrup,
            format!("{} mm hoops used; at least {} mm required", hoop_diameter_mm, min_hoop),
            code_refs::DUCTILE_TRANSVERSE,
        ));
    }
    if support_zone_spacing_mm > limits.confinement_spacing_mm {
        out.push(DesignError::ductile(
            ErrorCode::DuctileStirrup,
            format!(
                "Hoop spacing {:.0} mm within 2d of the support exceeds {:.0} mm",
                support_zone_spacing_mm, limits.confinement_spacing_mm
            ),
            code_refs::DUCTILE_TRANSVERSE,
        ));
    }
    if middle_spacing_mm > limits.general_spacing_mm {
        out.push(DesignError::ductile(
            ErrorCode::DuctileStirrup,
            format!(
                "Hoop spacing {:.0} mm exceeds d/2 = {:.0} mm",
                middle_spacing_mm, limits.general_spacing_mm
            ),
            code_refs::DUCTILE_TRANSVERSE,
        ));
    }
    out
}
