//! Candidate identity and evaluated candidates.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::objectives::Objectives;
use crate::calculations::detailing::DetailingResult;
use crate::calculations::flexure::TensionFace;

/// Position of a candidate in the search space.
///
/// Ordering is lexicographic in field order, which is also the enumeration
/// order. Equality goes through the same total order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CandidateKey {
    pub width_mm: f64,
    pub overall_depth_mm: f64,
    pub fck_mpa: f64,
    pub fy_mpa: f64,
    /// Main bar diameter on the governing tension face
    pub diameter_mm: u32,
    pub count: u32,
    pub stirrup_diameter_mm: u32,
    pub stirrup_legs: u32,
    pub stirrup_spacing_mm: f64,
}

impl CandidateKey {
    pub fn label(&self) -> String {
        format!(
            "{:.0}x{:.0} M{:.0}/Fe{:.0} {}-{} {}L-{}@{:.0}",
            self.width_mm,
            self.overall_depth_mm,
            self.fck_mpa,
            self.fy_mpa,
            self.count,
            self.diameter_mm,
            self.stirrup_legs,
            self.stirrup_diameter_mm,
            self.stirrup_spacing_mm
        )
    }
}

impl PartialEq for CandidateKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CandidateKey {}

impl PartialOrd for CandidateKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CandidateKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.width_mm
            .total_cmp(&other.width_mm)
            .then(self.overall_depth_mm.total_cmp(&other.overall_depth_mm))
            .then(self.fck_mpa.total_cmp(&other.fck_mpa))
            .then(self.fy_mpa.total_cmp(&other.fy_mpa))
            .then(self.diameter_mm.cmp(&other.diameter_mm))
            .then(self.count.cmp(&other.count))
            .then(self.stirrup_diameter_mm.cmp(&other.stirrup_diameter_mm))
            .then(self.stirrup_legs.cmp(&other.stirrup_legs))
            .then(self.stirrup_spacing_mm.total_cmp(&other.stirrup_spacing_mm))
    }
}

/// A feasible candidate, fully designed.
///
/// ## JSON Example
///
/// ```json
/// {
///   "key": {
///     "width_mm": 300.0, "overall_depth_mm": 450.0,
///     "fck_mpa": 25.0, "fy_mpa": 500.0,
///     "diameter_mm": 16, "count": 4,
///     "stirrup_diameter_mm": 8, "stirrup_legs": 2, "stirrup_spacing_mm": 150.0
///   },
///   "tension_face": "Bottom",
///   "objectives": { "cost": 31250.4, "weight_kg": 2052.7, "constructability": 4.67 },
///   "score": 1.0,
///   "effective_depth_mm": 410.0,
///   "detailing": { "...": "..." }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationCandidate {
    pub key: CandidateKey,
    pub tension_face: TensionFace,
    pub objectives: Objectives,
    /// Weighted score against the best feasible value of each objective
    pub score: f64,
    /// After any second-layer re-check (mm)
    pub effective_depth_mm: f64,
    pub detailing: DetailingResult,
}

impl OptimizationCandidate {
    /// Ranking order: score, then objectives, then key
    pub fn rank(&self, other: &Self) -> Ordering {
        self.score.total_cmp(&other.score).then_with(|| {
            self.objectives
                .vector()
                .iter()
                .zip(other.objectives.vector().iter())
                .map(|(a, b)| a.total_cmp(b))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
                .then(self.key.cmp(&other.key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(diameter_mm: u32, count: u32, spacing: f64) -> CandidateKey {
        CandidateKey {
            width_mm: 300.0,
            overall_depth_mm: 450.0,
            fck_mpa: 25.0,
            fy_mpa: 500.0,
            diameter_mm,
            count,
            stirrup_diameter_mm: 8,
            stirrup_legs: 2,
            stirrup_spacing_mm: spacing,
        }
    }

    #[test]
    fn test_key_order_is_lexicographic() {
        let mut keys = vec![key(20, 2, 100.0), key(16, 5, 150.0), key(16, 4, 200.0), key(16, 4, 100.0)];
        keys.sort();
        assert_eq!(keys[0], key(16, 4, 100.0));
        assert_eq!(keys[1], key(16, 4, 200.0));
        assert_eq!(keys[2], key(16, 5, 150.0));
        assert_eq!(keys[3], key(20, 2, 100.0));
    }

    #[test]
    fn test_equality_agrees_with_order() {
        let positive = key(16, 4, 0.0);
        let negative = key(16, 4, -0.0);
        assert_eq!(positive == negative, positive.cmp(&negative) == Ordering::Equal);
        assert_ne!(positive, negative);

        let (a, b) = (key(16, 4, f64::NAN), key(16, 4, f64::NAN));
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_label() {
        assert_eq!(key(16, 4, 150.0).label(), "300x450 M25/Fe500 4-16 2L-8@150");
    }
}
