//! Objectives of a candidate design: cost, weight, embodied carbon and a
//! constructability score. All are minimised.
//!
//! Quantities are taken over the span, or over one metre of beam when the
//! span is unknown.

use serde::{Deserialize, Serialize};

use crate::calculations::detailing::bar_selection::clear_spacing_required;
use crate::calculations::detailing::DetailingResult;
use crate::materials::CONCRETE_DENSITY_KG_M3;
use crate::section::Section;
use crate::settings::DetailingSettings;

/// Constructability penalty per distinct bar diameter
const DIAMETER_PENALTY: f64 = 1.0;
/// Penalty per layer beyond the first
const LAYER_PENALTY: f64 = 2.0;
/// Penalty per main bar
const BAR_PENALTY: f64 = 0.25;
/// Clear spacing below this multiple of the minimum counts as congested
const CONGESTION_RATIO: f64 = 1.5;
const CONGESTION_PENALTY: f64 = 1.0;
/// Penalty per stirrup per metre
const STIRRUP_DENSITY_PENALTY: f64 = 0.1;

/// Concrete price at one grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeRate {
    pub fck_mpa: f64,
    /// Cost per m³
    pub rate: f64,
}

/// Unit rates. Costs are in an abstract currency unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostRates {
    /// Concrete rate by grade, interpolated and clamped at the ends
    pub concrete_per_m3: Vec<GradeRate>,
    /// Reinforcement supply, per kg
    pub steel_per_kg: f64,
    /// Cutting, bending and fixing as a fraction of the steel rate
    pub labour_factor: f64,
    /// Formwork, per m² of contact area
    pub formwork_per_m2: f64,
}

impl Default for CostRates {
    fn default() -> Self {
        let grade = |fck_mpa, rate| GradeRate { fck_mpa, rate };
        CostRates {
            concrete_per_m3: vec![
                grade(20.0, 5000.0),
                grade(25.0, 5400.0),
                grade(30.0, 5800.0),
                grade(35.0, 6200.0),
                grade(40.0, 6700.0),
            ],
            steel_per_kg: 70.0,
            labour_factor: 0.15,
            formwork_per_m2: 450.0,
        }
    }
}

impl CostRates {
    /// Concrete rate for grade `fck_mpa`
    pub fn concrete_rate(&self, fck_mpa: f64) -> f64 {
        let mut points = self.concrete_per_m3.clone();
        points.sort_by(|a, b| a.fck_mpa.total_cmp(&b.fck_mpa));
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return 0.0;
        };
        if fck_mpa <= first.fck_mpa {
            return first.rate;
        }
        if fck_mpa >= last.fck_mpa {
            return last.rate;
        }
        let i = points.partition_point(|p| p.fck_mpa <= fck_mpa);
        let (lo, hi) = (points[i - 1], points[i]);
        lo.rate + (hi.rate - lo.rate) * (fck_mpa - lo.fck_mpa) / (hi.fck_mpa - lo.fck_mpa)
    }
}

/// Embodied carbon factors (kg CO₂e).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbonFactors {
    pub concrete_per_m3: f64,
    pub steel_per_kg: f64,
}

impl Default for CarbonFactors {
    fn default() -> Self {
        CarbonFactors {
            concrete_per_m3: 300.0,
            steel_per_kg: 1.9,
        }
    }
}

/// Weights of the scalar score. Each objective is divided by its best
/// feasible value before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    pub cost: f64,
    pub weight: f64,
    pub carbon: f64,
    pub constructability: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        ObjectiveWeights {
            cost: 1.0,
            weight: 0.0,
            carbon: 0.0,
            constructability: 0.0,
        }
    }
}

/// Objective values of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Objectives {
    pub cost: f64,
    /// Steel plus concrete (kg)
    pub weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_kg: Option<f64>,
    /// Lower is easier to build
    pub constructability: f64,
}

impl Objectives {
    /// Objective vector used for dominance, in a fixed order
    pub fn vector(&self) -> Vec<f64> {
        let mut v = vec![self.cost, self.weight_kg];
        v.extend(self.carbon_kg);
        v.push(self.constructability);
        v
    }

    /// Weighted score against reference (best) values
    pub fn score(&self, weights: &ObjectiveWeights, reference: &Objectives) -> f64 {
        let ratio = |value: f64, best: f64| if best > 0.0 { value / best } else { value };
        let mut score = weights.cost * ratio(self.cost, reference.cost)
            + weights.weight * ratio(self.weight_kg, reference.weight_kg)
            + weights.constructability * ratio(self.constructability, reference.constructability);
        if let (Some(c), Some(best)) = (self.carbon_kg, reference.carbon_kg) {
            score += weights.carbon * ratio(c, best);
        }
        score
    }

    /// Component-wise minimum over `all`; None when empty
    pub fn best_of<'a>(all: impl IntoIterator<Item = &'a Objectives>) -> Option<Objectives> {
        all.into_iter().copied().reduce(|a, b| Objectives {
            cost: a.cost.min(b.cost),
            weight_kg: a.weight_kg.min(b.weight_kg),
            carbon_kg: match (a.carbon_kg, b.carbon_kg) {
                (Some(x), Some(y)) => Some(x.min(y)),
                (x, y) => x.or(y),
            },
            constructability: a.constructability.min(b.constructability),
        })
    }
}

/// Quantities of one beam.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantities {
    pub length_m: f64,
    pub concrete_m3: f64,
    pub steel_kg: f64,
    pub formwork_m2: f64,
}

impl Quantities {
    pub fn measure(section: &Section, span_mm: Option<f64>, detailing: &DetailingResult) -> Self {
        let length_m = span_mm.map_or(1.0, |s| s / 1000.0);
        // Soffit and both sides; the slab forms the top of a flanged beam
        let sides = match section.flange {
            Some(flange) => section.overall_depth_mm - flange.thickness_mm,
            None => section.overall_depth_mm,
        };
        Quantities {
            length_m,
            concrete_m3: section.gross_area_mm2() / 1.0e6 * length_m,
            steel_kg: detailing.steel_mass_kg_per_m * length_m,
            formwork_m2: (section.width_mm + 2.0 * sides) / 1000.0 * length_m,
        }
    }
}

pub fn cost(q: &Quantities, fck_mpa: f64, rates: &CostRates) -> f64 {
    q.concrete_m3 * rates.concrete_rate(fck_mpa)
        + q.steel_kg * rates.steel_per_kg * (1.0 + rates.labour_factor)
        + q.formwork_m2 * rates.formwork_per_m2
}

pub fn weight_kg(q: &Quantities) -> f64 {
    q.steel_kg + q.concrete_m3 * CONCRETE_DENSITY_KG_M3
}

pub fn carbon_kg(q: &Quantities, factors: &CarbonFactors) -> f64 {
    q.concrete_m3 * factors.concrete_per_m3 + q.steel_kg * factors.steel_per_kg
}

/// Constructability score: distinct diameters, extra layers, bar count,
/// congested layers and stirrup density.
pub fn constructability(detailing: &DetailingResult, settings: &DetailingSettings) -> f64 {
    let faces = [&detailing.top, &detailing.bottom];
    let mut diameters: Vec<u32> = faces
        .iter()
        .filter_map(|f| f.combination())
        .flat_map(|c| c.groups.iter().map(|g| g.diameter_mm))
        .collect();
    diameters.sort_unstable();
    diameters.dedup();

    let mut score = DIAMETER_PENALTY * diameters.len() as f64;
    for plan in faces.iter().filter_map(|f| f.plan.as_ref()) {
        score += LAYER_PENALTY * plan.layers.len().saturating_sub(1) as f64;
        score += BAR_PENALTY * plan.combination.bar_count() as f64;
        let congested = plan.layers.iter().any(|layer| {
            layer.bar_count() > 1
                && layer.clear_spacing_mm
                    < CONGESTION_RATIO * clear_spacing_required(layer.max_diameter(), settings)
        });
        if congested {
            score += CONGESTION_PENALTY;
        }
    }
    let stirrups_per_m = detailing
        .stirrups
        .iter()
        .map(|z| 1000.0 / z.spacing_mm)
        .fold(0.0, f64::max);
    score + STIRRUP_DENSITY_PENALTY * stirrups_per_m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concrete_rate_interpolates_and_clamps() {
        let rates = CostRates::default();
        assert_eq!(rates.concrete_rate(25.0), 5400.0);
        assert_eq!(rates.concrete_rate(27.5), 5600.0);
        assert_eq!(rates.concrete_rate(15.0), 5000.0);
        assert_eq!(rates.concrete_rate(60.0), 6700.0);
        assert_eq!(CostRates { concrete_per_m3: vec![], ..CostRates::default() }.concrete_rate(25.0), 0.0);
    }

    #[test]
    fn test_score_normalised() {
        let best = Objectives {
            cost: 100.0,
            weight_kg: 1000.0,
            carbon_kg: None,
            constructability: 4.0,
        };
        let other = Objectives {
            cost: 120.0,
            ..best
        };
        let weights = ObjectiveWeights::default();
        assert_eq!(best.score(&weights, &best), 1.0);
        assert!((other.score(&weights, &best) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_vector_includes_carbon_when_present() {
        let o = Objectives {
            cost: 1.0,
            weight_kg: 2.0,
            carbon_kg: Some(3.0),
            constructability: 4.0,
        };
        assert_eq!(o.vector(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(Objectives { carbon_kg: None, ..o }.vector(), vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_best_of() {
        let a = Objectives {
            cost: 1.0,
            weight_kg: 5.0,
            carbon_kg: None,
            constructability: 3.0,
        };
        let b = Objectives {
            cost: 2.0,
            weight_kg: 4.0,
            carbon_kg: None,
            constructability: 3.5,
        };
        let best = Objectives::best_of([&a, &b]).unwrap();
        assert_eq!((best.cost, best.weight_kg, best.constructability), (1.0, 4.0, 3.0));
        assert!(Objectives::best_of(std::iter::empty()).is_none());
    }
}
