//! Beam-line standardization
//!
//! Beams on one structural line are optimized independently, then re-run
//! with every member restricted to one shared bar diameter. The shared
//! diameter with the lowest total score wins, and the cost and weight of
//! standardizing are reported against the independent designs.
//!
//! Standardized candidates are scored against each member's independent
//! best objectives so both designs sit on the same scale.

use serde::{Deserialize, Serialize};

use super::candidate::OptimizationCandidate;
use super::objectives::Objectives;
use super::{optimize, OptimizationRequest, OptimizationResponse, OptimizationStatus};
use crate::calculations::design::SCHEMA_VERSION;
use crate::cancel::CancelToken;
use crate::errors::{CalcError, CalcResult};
use crate::settings::DesignSettings;

/// Beams sharing a structural line.
///
/// ## JSON Example
///
/// ```json
/// {
///   "name": "Grid B",
///   "members": [
///     { "base": { "label": "B1", "...": "..." }, "diameters": [12, 16, 20] },
///     { "base": { "label": "B2", "...": "..." }, "diameters": [16, 20, 25] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamLineGroup {
    pub name: String,
    pub members: Vec<OptimizationRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BeamLineStatus {
    Standardized,
    /// Every member is feasible alone but no single diameter suits them all
    NoSharedDesign,
    /// At least one member has no feasible design at all
    NoFeasibleCandidate,
}

/// One member's independent and standardized designs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamLineMember {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub independent: Option<OptimizationCandidate>,
    pub standardized: Option<OptimizationCandidate>,
    /// Standardized minus independent
    pub cost_delta: f64,
    pub weight_delta_kg: f64,
}

/// Outcome of restricting every member to one diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiameterTrial {
    pub diameter_mm: u32,
    /// None when some member had no feasible design with this diameter
    pub total_score: Option<f64>,
}

/// ## JSON Example
///
/// ```json
/// {
///   "schema_version": "1.0",
///   "name": "Grid B",
///   "status": "STANDARDIZED",
///   "shared_diameter_mm": 16,
///   "trials": [{ "diameter_mm": 16, "total_score": 2.04 },
///              { "diameter_mm": 20, "total_score": 2.11 }],
///   "members": [],
///   "cost_delta": 412.5,
///   "weight_delta_kg": 3.1
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamLineReport {
    pub schema_version: String,
    pub name: String,
    pub status: BeamLineStatus,
    pub shared_diameter_mm: Option<u32>,
    pub trials: Vec<DiameterTrial>,
    pub members: Vec<BeamLineMember>,
    pub cost_delta: f64,
    pub weight_delta_kg: f64,
}

struct Trial {
    diameter_mm: u32,
    picks: Vec<OptimizationCandidate>,
    total_score: f64,
    total_cost: f64,
    total_weight: f64,
}

/// Standardize the bar diameter along a beam line.
///
/// # Returns
///
/// * `Ok(BeamLineReport)` - Report; the status says whether a shared design
///   was found
/// * `Err(CalcError)` - Invalid member request, or `Cancelled`
pub fn standardize(
    group: &BeamLineGroup,
    settings: &DesignSettings,
    cancel: &CancelToken,
) -> CalcResult<BeamLineReport> {
    if group.members.is_empty() {
        return Err(CalcError::missing_field("members"));
    }

    // ========================================================================
    // Independent designs
    // ========================================================================
    let mut independent = Vec::with_capacity(group.members.len());
    for member in &group.members {
        independent.push(optimize(member, settings, cancel)?);
    }
    let references: Vec<Option<Objectives>> = independent
        .iter()
        .map(|r| Objectives::best_of(r.frontier.members.iter().map(|m| &m.objectives)))
        .collect();

    if independent.iter().any(|r| r.status == OptimizationStatus::NoFeasibleCandidate) {
        tracing::info!(line = %group.name, "beam line has a member with no feasible design");
        return Ok(report(group, BeamLineStatus::NoFeasibleCandidate, &independent, None, Vec::new()));
    }

    // ========================================================================
    // One run per shared diameter
    // ========================================================================
    let shared = shared_diameters(group, settings);
    let mut trials = Vec::new();
    let mut summaries = Vec::new();
    for &diameter in &shared {
        let mut picks = Vec::with_capacity(group.members.len());
        for (i, member) in group.members.iter().enumerate() {
            let Some(reference) = references[i] else {
                break;
            };
            let restricted = member.clone().with_diameters(vec![diameter]);
            let response = optimize(&restricted, settings, cancel)?;
            match best_against(&response, &reference, member) {
                Some(pick) => picks.push(pick),
                None => break,
            }
        }
        if picks.len() < group.members.len() {
            summaries.push(DiameterTrial {
                diameter_mm: diameter,
                total_score: None,
            });
            continue;
        }
        let total_score = picks.iter().map(|p| p.score).sum();
        summaries.push(DiameterTrial {
            diameter_mm: diameter,
            total_score: Some(total_score),
        });
        trials.push(Trial {
            diameter_mm: diameter,
            total_cost: picks.iter().map(|p| p.objectives.cost).sum(),
            total_weight: picks.iter().map(|p| p.objectives.weight_kg).sum(),
            picks,
            total_score,
        });
    }

    let best = trials.into_iter().min_by(|a, b| {
        a.total_score
            .total_cmp(&b.total_score)
            .then(a.total_cost.total_cmp(&b.total_cost))
            .then(a.total_weight.total_cmp(&b.total_weight))
            .then(a.diameter_mm.cmp(&b.diameter_mm))
    });
    let status = match best {
        Some(_) => BeamLineStatus::Standardized,
        None => BeamLineStatus::NoSharedDesign,
    };
    tracing::debug!(
        line = %group.name,
        shared = shared.len(),
        chosen = ?best.as_ref().map(|t| t.diameter_mm),
        "beam line standardized"
    );
    Ok(report(group, status, &independent, best, summaries))
}

/// Diameters every member may use, ascending
fn shared_diameters(group: &BeamLineGroup, settings: &DesignSettings) -> Vec<u32> {
    let options = |member: &OptimizationRequest| -> Vec<u32> {
        let mut ds = if member.diameters.is_empty() {
            settings.detailing.allowed_diameters.clone()
        } else {
            member.diameters.clone()
        };
        ds.sort_unstable();
        ds.dedup();
        ds
    };
    let mut shared = options(&group.members[0]);
    for member in &group.members[1..] {
        let other = options(member);
        shared.retain(|d| other.contains(d));
    }
    shared
}

/// Frontier member with the lowest score against `reference`, rescored
fn best_against(
    response: &OptimizationResponse,
    reference: &Objectives,
    member: &OptimizationRequest,
) -> Option<OptimizationCandidate> {
    let weights = &member.config.weights;
    response
        .frontier
        .members
        .iter()
        .map(|c| {
            let mut rescored = c.clone();
            rescored.score = c.objectives.score(weights, reference);
            rescored
        })
        .min_by(|a, b| a.rank(b))
}

fn report(
    group: &BeamLineGroup,
    status: BeamLineStatus,
    independent: &[OptimizationResponse],
    chosen: Option<Trial>,
    trials: Vec<DiameterTrial>,
) -> BeamLineReport {
    let shared_diameter_mm = chosen.as_ref().map(|t| t.diameter_mm);
    let mut picks = chosen.map(|t| t.picks).unwrap_or_default().into_iter();
    let members: Vec<BeamLineMember> = group
        .members
        .iter()
        .zip(independent)
        .map(|(member, response)| {
            let alone = response.recommended_candidate().cloned();
            let standardized = picks.next();
            let delta = |f: fn(&Objectives) -> f64| match (&alone, &standardized) {
                (Some(a), Some(s)) => f(&s.objectives) - f(&a.objectives),
                _ => 0.0,
            };
            BeamLineMember {
                label: member.base.label.clone(),
                cost_delta: delta(|o| o.cost),
                weight_delta_kg: delta(|o| o.weight_kg),
                independent: alone,
                standardized,
            }
        })
        .collect();

    BeamLineReport {
        schema_version: SCHEMA_VERSION.to_string(),
        name: group.name.clone(),
        status,
        shared_diameter_mm,
        trials,
        cost_delta: members.iter().map(|m| m.cost_delta).sum(),
        weight_delta_kg: members.iter().map(|m| m.weight_delta_kg).sum(),
        members,
    }
}

impl BeamLineReport {
    /// True when standardizing costs nothing over the independent designs
    pub fn is_free(&self) -> bool {
        self.status == BeamLineStatus::Standardized
            && self.cost_delta <= 0.0
            && self.weight_delta_kg <= 0.0
    }
}
