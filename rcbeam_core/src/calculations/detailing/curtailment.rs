//! Curtailment of tension bars (IS 456 26.2.3)
//!
//! At least a third of the bars (and never fewer than two) run the full
//! length. The rest stop where the continuing bars alone carry the moment,
//! extended by the larger of Ld and d. Moment diagrams assume uniform load:
//! parabolic for a simple span, quadratic from the fixed end of a cantilever.

use serde::{Deserialize, Serialize};

use crate::calculations::flexure::TensionFace;

/// Curtailment of the bars on one face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurtailmentPoint {
    pub face: TensionFace,
    pub total_bars: u32,
    pub continuing_bars: u32,
    pub curtailed_bars: u32,
    /// Where the continuing bars alone suffice, from the support (mm)
    pub theoretical_cutoff_mm: f64,
    /// Cutoff after the anchorage extension, from the support (mm)
    pub actual_cutoff_mm: f64,
    /// max(Ld, d)
    pub extension_mm: f64,
}

/// Bars that must run the full length
pub fn continuing_bars(total: u32) -> u32 {
    total.div_ceil(3).max(2).min(total)
}

/// Curtailment along a simply supported span.
///
/// `area_ratio` is continuing / provided area. The cutoff is the distance
/// from each support where M(x) = area_ratio × Mmax.
pub fn simply_supported_cutoff(span_mm: f64, area_ratio: f64) -> f64 {
    span_mm / 2.0 * (1.0 - (1.0 - area_ratio.clamp(0.0, 1.0)).sqrt())
}

/// Curtailment from the fixed end of a cantilever
pub fn cantilever_cutoff(span_mm: f64, area_ratio: f64) -> f64 {
    span_mm * (1.0 - area_ratio.clamp(0.0, 1.0).sqrt())
}

/// Curtail the bars on `face`.
///
/// `bar_areas` lists every bar on the face, largest first; the continuing
/// bars are the first ones (corner bars of the outer layer). Returns `None`
/// when nothing can be curtailed.
pub fn curtail(
    face: TensionFace,
    bar_areas: &[f64],
    span_mm: f64,
    cantilever: bool,
    development_length_mm: f64,
    effective_depth_mm: f64,
) -> Option<CurtailmentPoint> {
    let total = bar_areas.len() as u32;
    let continuing = continuing_bars(total);
    if continuing >= total {
        return None;
    }
    let provided: f64 = bar_areas.iter().sum();
    let kept: f64 = bar_areas[..continuing as usize].iter().sum();
    let ratio = kept / provided;
    let extension = development_length_mm.max(effective_depth_mm);

    let (theoretical, actual) = if cantilever {
        let x = cantilever_cutoff(span_mm, ratio);
        (x, x + extension)
    } else {
        let x = simply_supported_cutoff(span_mm, ratio);
        (x, x - extension)
    };

    // Extension runs past the support or the free end: bars go full length
    let usable = if cantilever {
        actual < span_mm
    } else {
        actual > 0.0
    };
    if !usable {
        tracing::debug!(?face, theoretical, extension, "curtailment not worthwhile");
        return None;
    }

    Some(CurtailmentPoint {
        face,
        total_bars: total,
        continuing_bars: continuing,
        curtailed_bars: total - continuing,
        theoretical_cutoff_mm: theoretical,
        actual_cutoff_mm: actual,
        extension_mm: extension,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuing_bars() {
        assert_eq!(continuing_bars(2), 2);
        assert_eq!(continuing_bars(4), 2);
        assert_eq!(continuing_bars(6), 2);
        assert_eq!(continuing_bars(7), 3);
    }

    #[test]
    fn test_simply_supported_cutoff() {
        // Half the steel continues: x = L/2 (1 - √0.5)
        let x = simply_supported_cutoff(6000.0, 0.5);
        assert!((x - 3000.0 * (1.0 - 0.5_f64.sqrt())).abs() < 1e-9);
        assert_eq!(simply_supported_cutoff(6000.0, 1.0), 3000.0);
        assert_eq!(simply_supported_cutoff(6000.0, 0.0), 0.0);
    }

    #[test]
    fn test_cantilever_cutoff() {
        assert!((cantilever_cutoff(3000.0, 0.25) - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_curtail_simple_span() {
        // Two of six continue: x = 6000 (1 - √(2/3)) ≈ 1101
        let bars = [314.16; 6];
        let p = curtail(TensionFace::Bottom, &bars, 12000.0, false, 800.0, 500.0).unwrap();
        assert_eq!(p.continuing_bars, 2);
        assert_eq!(p.curtailed_bars, 4);
        assert_eq!(p.extension_mm, 800.0);
        assert!((p.actual_cutoff_mm - (p.theoretical_cutoff_mm - 800.0)).abs() < 1e-9);
    }

    #[test]
    fn test_short_span_runs_full_length() {
        let bars = [201.06; 4];
        assert!(curtail(TensionFace::Bottom, &bars, 2000.0, false, 780.0, 410.0).is_none());
        let pair = [201.06; 2];
        assert!(curtail(TensionFace::Bottom, &pair, 8000.0, false, 780.0, 410.0).is_none());
    }
}
