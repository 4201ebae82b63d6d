//! Dominance and the Pareto frontier.

use serde::{Deserialize, Serialize};

use super::candidate::{CandidateKey, OptimizationCandidate};
use super::objectives::Objectives;

/// `a` dominates `b` when it is no worse in every objective and strictly
/// better in at least one.
pub fn dominates(a: &Objectives, b: &Objectives) -> bool {
    let (va, vb) = (a.vector(), b.vector());
    let no_worse = va.iter().zip(&vb).all(|(x, y)| x <= y);
    let better = va.iter().zip(&vb).any(|(x, y)| x < y);
    no_worse && better
}

/// Non-dominated candidates, best ranked first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParetoFrontier {
    pub members: Vec<OptimizationCandidate>,
}

impl ParetoFrontier {
    /// Frontier of `candidates`. Members with identical objectives are all
    /// kept, since neither dominates the other.
    pub fn build(candidates: &[OptimizationCandidate]) -> Self {
        let mut members: Vec<OptimizationCandidate> = candidates
            .iter()
            .filter(|c| !candidates.iter().any(|other| dominates(&other.objectives, &c.objectives)))
            .cloned()
            .collect();
        members.sort_by(|a, b| a.rank(b));
        ParetoFrontier { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member with the lowest weighted score
    pub fn recommended(&self) -> Option<&OptimizationCandidate> {
        self.members.first()
    }

    pub fn get(&self, key: &CandidateKey) -> Option<&OptimizationCandidate> {
        self.members.iter().find(|m| &m.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(cost: f64, weight_kg: f64, constructability: f64) -> Objectives {
        Objectives {
            cost,
            weight_kg,
            carbon_kg: None,
            constructability,
        }
    }

    #[test]
    fn test_dominates() {
        assert!(dominates(&obj(1.0, 1.0, 1.0), &obj(2.0, 1.0, 1.0)));
        assert!(!dominates(&obj(1.0, 1.0, 1.0), &obj(1.0, 1.0, 1.0)));
        assert!(!dominates(&obj(1.0, 2.0, 1.0), &obj(2.0, 1.0, 1.0)));
        assert!(!dominates(&obj(2.0, 1.0, 1.0), &obj(1.0, 2.0, 1.0)));
    }

    #[test]
    fn test_dominates_with_carbon() {
        let mut a = obj(1.0, 1.0, 1.0);
        let mut b = obj(1.0, 1.0, 1.0);
        a.carbon_kg = Some(10.0);
        b.carbon_kg = Some(12.0);
        assert!(dominates(&a, &b));
        assert!(!dominates(&b, &a));
    }
}
