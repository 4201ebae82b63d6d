//! Stirrup zoning along the span
//!
//! Support zones of `support_zone_factor × d` take the governing spacing from
//! the shear engine. The middle zone is designed for the shear at the zone
//! boundary, from a linear shear diagram. Adjacent zones with equal spacing
//! are merged.

use serde::{Deserialize, Serialize};

use crate::calculations::shear::{required_spacing_for, StirrupSpec};
use crate::materials::rebar::unit_mass_kg_per_m;
use crate::materials::Material;
use crate::section::{Section, SupportCondition};
use crate::settings::ShearSettings;

/// Position of a stirrup zone along the span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneTag {
    Support,
    Middle,
    /// Whole span at one spacing
    Full,
}

/// Start, end and stirrup count of a zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneExtent {
    /// From the left support (or the fixed end of a cantilever), mm
    pub start_mm: f64,
    pub end_mm: f64,
    pub count: u32,
}

/// Stirrups in one zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StirrupArrangement {
    pub zone: ZoneTag,
    pub stirrup: StirrupSpec,
    pub spacing_mm: f64,
    /// None when no span is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<ZoneExtent>,
}

/// Shear demand driving the zoning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShearDemand {
    /// Governing factored shear at the support (kN)
    pub shear_kn: f64,
    /// τc of the governing case (N/mm²)
    pub tau_c_mpa: f64,
    /// Spacing required at the support (mm)
    pub support_spacing_mm: f64,
}

/// Spacing caps applied on top of the shear design (ductile detailing)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpacingCaps {
    pub support_zone_mm: f64,
    pub middle_zone_mm: f64,
}

fn round_down(value: f64, step: f64) -> f64 {
    if step > 0.0 && value >= step {
        (value / step).floor() * step
    } else {
        value
    }
}

fn zone(tag: ZoneTag, stirrup: StirrupSpec, spacing: f64, start: f64, end: f64) -> StirrupArrangement {
    let count = ((end - start) / spacing).ceil().max(1.0) as u32;
    StirrupArrangement {
        zone: tag,
        stirrup,
        spacing_mm: spacing,
        extent: Some(ZoneExtent {
            start_mm: start,
            end_mm: end,
            count,
        }),
    }
}

/// Merge neighbouring zones of equal spacing.
pub fn merge_zones(zones: Vec<StirrupArrangement>) -> Vec<StirrupArrangement> {
    let mut merged: Vec<StirrupArrangement> = Vec::with_capacity(zones.len());
    for z in zones {
        match merged.last_mut() {
            Some(prev) if prev.spacing_mm == z.spacing_mm && prev.stirrup == z.stirrup => {
                if prev.zone != z.zone {
                    prev.zone = ZoneTag::Full;
                }
                if let (Some(a), Some(b)) = (prev.extent.as_mut(), z.extent) {
                    a.end_mm = b.end_mm;
                    a.count = ((a.end_mm - a.start_mm) / prev.spacing_mm).ceil().max(1.0) as u32;
                }
            }
            _ => merged.push(z),
        }
    }
    merged
}

/// Partition the span into stirrup zones.
#[allow(clippy::too_many_arguments)]
pub fn zone_stirrups(
    section: &Section,
    material: &Material,
    span_mm: Option<f64>,
    support: SupportCondition,
    stirrup: StirrupSpec,
    demand: &ShearDemand,
    caps: Option<SpacingCaps>,
    zone_factor: f64,
    settings: &ShearSettings,
) -> Vec<StirrupArrangement> {
    let step = settings.spacing_round_mm;
    let cap = |spacing: f64, limit: Option<f64>| match limit {
        Some(l) if l < spacing => round_down(l, step),
        _ => spacing,
    };
    let support_spacing = cap(demand.support_spacing_mm, caps.map(|c| c.support_zone_mm));

    let Some(span) = span_mm else {
        return vec![StirrupArrangement {
            zone: ZoneTag::Full,
            stirrup,
            spacing_mm: support_spacing,
            extent: None,
        }];
    };

    let d = section.effective_depth_mm;
    let cantilever = support == SupportCondition::Cantilever;
    let reach = if cantilever { span } else { span / 2.0 };
    let z = (zone_factor * d).min(reach);

    // Linear shear: Vu at the support, zero at midspan (or the free end)
    let boundary_shear = demand.shear_kn * (1.0 - z / reach);
    let middle = required_spacing_for(section, material, boundary_shear, demand.tau_c_mpa, stirrup, settings);
    let middle_spacing = cap(
        middle.spacing_mm.max(support_spacing),
        caps.map(|c| c.middle_zone_mm),
    );

    let mut zones = vec![zone(ZoneTag::Support, stirrup, support_spacing, 0.0, z)];
    if cantilever {
        if z < span {
            zones.push(zone(ZoneTag::Middle, stirrup, middle_spacing, z, span));
        }
    } else {
        if span - 2.0 * z > 0.0 {
            zones.push(zone(ZoneTag::Middle, stirrup, middle_spacing, z, span - z));
        }
        zones.push(zone(ZoneTag::Support, stirrup, support_spacing, span - z, span));
    }
    merge_zones(zones)
}

/// One zone at a fixed spacing over the whole span.
pub fn uniform_stirrups(stirrup: StirrupSpec, spacing_mm: f64, span_mm: Option<f64>) -> Vec<StirrupArrangement> {
    match span_mm {
        Some(span) => vec![zone(ZoneTag::Full, stirrup, spacing_mm, 0.0, span)],
        None => vec![StirrupArrangement {
            zone: ZoneTag::Full,
            stirrup,
            spacing_mm,
            extent: None,
        }],
    }
}

/// Stirrup mass per metre of beam (kg/m)
pub fn stirrup_mass_kg_per_m(zones: &[StirrupArrangement], section: &Section, span_mm: Option<f64>) -> f64 {
    zones
        .iter()
        .map(|z| {
            let unit = stirrup_length_mm(section, z.stirrup) / 1000.0
                * unit_mass_kg_per_m(z.stirrup.diameter_mm);
            match (z.extent, span_mm) {
                (Some(e), Some(span)) => e.count as f64 * unit / (span / 1000.0),
                _ => 1000.0 / z.spacing_mm * unit,
            }
        })
        .sum()
}

/// Cut length of one stirrup: closed loop, extra legs and two 10φ hooks (mm)
pub fn stirrup_length_mm(section: &Section, stirrup: StirrupSpec) -> f64 {
    let phi = stirrup.diameter_mm as f64;
    let inner_w = section.width_mm - 2.0 * section.cover_mm;
    let inner_h = section.overall_depth_mm - 2.0 * section.cover_mm;
    let extra_legs = stirrup.legs.saturating_sub(2) as f64;
    2.0 * (inner_w + inner_h) + 20.0 * phi + extra_legs * (inner_h + 20.0 * phi)
}
