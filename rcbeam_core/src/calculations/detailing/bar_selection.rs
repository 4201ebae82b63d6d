//! # Bar Selection
//!
//! Deterministic search for the main bars of one beam face.
//!
//! Candidate sets are a single diameter, or two adjacent allowed diameters
//! with at least two of the larger size at the corners. A set is admissible
//! when it provides the required area and fits in `max_layers` layers with
//! the IS 456 26.3.2 clear spacing. All admissible sets are ranked together,
//! so a second layer is used whenever it carries the smallest area; the
//! pipeline then re-checks flexure at the lowered effective depth. The order is:
//!
//! 1. smallest provided area (exact integer key Σ n φ²)
//! 2. fewer distinct diameters
//! 3. lower steel mass, including spacer bars between layers
//! 4. larger maximum diameter
//! 5. fewer bars
//!
//! The final tie-break compares the groups themselves, so the result never
//! depends on enumeration order.

use std::cmp::Ordering;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::materials::rebar::{bar_area_mm2, unit_mass_kg_per_m};
use crate::section::Section;
use crate::settings::DetailingSettings;

/// Minimum vertical clear gap between layers (mm), 26.3.2(b)
const MIN_LAYER_GAP_MM: f64 = 15.0;

/// Bars of one diameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BarGroup {
    pub diameter_mm: u32,
    pub count: u32,
}

/// A set of main bars for one face, largest diameter first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BarCombination {
    pub groups: Vec<BarGroup>,
}

impl BarCombination {
    pub fn single(diameter_mm: u32, count: u32) -> Self {
        BarCombination {
            groups: vec![BarGroup { diameter_mm, count }],
        }
    }

    /// `large` bars at the corners plus `small` bars between them
    pub fn two(large: BarGroup, small: BarGroup) -> Self {
        let (large, small) = if large.diameter_mm >= small.diameter_mm {
            (large, small)
        } else {
            (small, large)
        };
        BarCombination {
            groups: vec![large, small],
        }
    }

    /// Σ n φ², proportional to the area and exact
    pub fn area_key(&self) -> u64 {
        self.groups
            .iter()
            .map(|g| g.count as u64 * (g.diameter_mm as u64).pow(2))
            .sum()
    }

    pub fn area_mm2(&self) -> f64 {
        PI / 4.0 * self.area_key() as f64
    }

    pub fn bar_count(&self) -> u32 {
        self.groups.iter().map(|g| g.count).sum()
    }

    pub fn max_diameter(&self) -> u32 {
        self.groups.iter().map(|g| g.diameter_mm).max().unwrap_or(0)
    }

    pub fn min_diameter(&self) -> u32 {
        self.groups.iter().map(|g| g.diameter_mm).min().unwrap_or(0)
    }

    pub fn distinct_diameters(&self) -> usize {
        let mut d: Vec<u32> = self.groups.iter().map(|g| g.diameter_mm).collect();
        d.sort_unstable();
        d.dedup();
        d.len()
    }

    /// Longitudinal mass per metre of beam (kg/m)
    pub fn mass_kg_per_m(&self) -> f64 {
        self.groups
            .iter()
            .map(|g| g.count as f64 * unit_mass_kg_per_m(g.diameter_mm))
            .sum()
    }

    /// Every bar diameter, largest first
    pub fn bar_diameters(&self) -> Vec<u32> {
        let mut bars: Vec<u32> = self
            .groups
            .iter()
            .flat_map(|g| std::iter::repeat(g.diameter_mm).take(g.count as usize))
            .collect();
        bars.sort_unstable_by(|a, b| b.cmp(a));
        bars
    }
}

impl std::fmt::Display for BarCombination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .groups
            .iter()
            .map(|g| format!("{}-{}φ", g.count, g.diameter_mm))
            .collect();
        write!(f, "{}", parts.join(" + "))
    }
}

/// One layer of bars as placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarArrangement {
    /// 1 = outermost layer
    pub layer: u32,
    pub bars: Vec<BarGroup>,
    /// Centre-to-centre spacing of adjacent bars (mm)
    pub centre_spacing_mm: f64,
    /// Clear gap between adjacent bars (mm)
    pub clear_spacing_mm: f64,
    /// Distance from the face to the bar centres (mm)
    pub centre_from_face_mm: f64,
}

impl BarArrangement {
    pub fn bar_count(&self) -> u32 {
        self.bars.iter().map(|g| g.count).sum()
    }

    pub fn max_diameter(&self) -> u32 {
        self.bars.iter().map(|g| g.diameter_mm).max().unwrap_or(0)
    }

    pub fn area_mm2(&self) -> f64 {
        self.bars
            .iter()
            .map(|g| g.count as f64 * bar_area_mm2(g.diameter_mm))
            .sum()
    }
}

/// Space available to main bars across one face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceGeometry {
    /// Width between the inside faces of the stirrup legs (mm)
    pub width_mm: f64,
    /// Face to the inside of the stirrup (cover + stirrup diameter), mm
    pub offset_mm: f64,
}

impl FaceGeometry {
    pub fn for_section(section: &Section, stirrup_diameter_mm: u32) -> Self {
        let offset = section.cover_mm + stirrup_diameter_mm as f64;
        FaceGeometry {
            width_mm: section.width_mm - 2.0 * offset,
            offset_mm: offset,
        }
    }
}

/// Bars of a combination laid out in layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPlan {
    pub combination: BarCombination,
    pub layers: Vec<BarArrangement>,
    /// Distance from the face to the centroid of all bars (mm)
    pub centroid_from_face_mm: f64,
    /// Centroid offset from the outer layer centre; lowers the effective depth (mm)
    pub centroid_shift_mm: f64,
    /// Main bar plus spacer bar mass per metre (kg/m)
    pub mass_kg_per_m: f64,
}

impl LayerPlan {
    pub fn provided_area_mm2(&self) -> f64 {
        self.combination.area_mm2()
    }

    pub fn layer_count(&self) -> u32 {
        self.layers.len() as u32
    }
}

/// Minimum horizontal clear spacing: max(φmax, aggregate + 5)
pub fn clear_spacing_required(max_diameter_mm: u32, settings: &DetailingSettings) -> f64 {
    (max_diameter_mm as f64).max(settings.aggregate_size_mm + 5.0)
}

/// Minimum vertical clear gap between layers: max(15, ⅔ aggregate, φmax)
pub fn layer_gap(max_diameter_mm: u32, settings: &DetailingSettings) -> f64 {
    MIN_LAYER_GAP_MM
        .max(2.0 * settings.aggregate_size_mm / 3.0)
        .max(max_diameter_mm as f64)
}

/// Bars of diameter `max_diameter_mm` that fit in one layer
pub fn bars_per_layer(geometry: &FaceGeometry, max_diameter_mm: u32, settings: &DetailingSettings) -> u32 {
    let phi = max_diameter_mm as f64;
    let clear = clear_spacing_required(max_diameter_mm, settings);
    if geometry.width_mm < phi {
        return 0;
    }
    let fit = ((geometry.width_mm + clear) / (phi + clear)).floor() as u32;
    fit.min(settings.max_bars_per_layer)
}

/// Split `n` bars into layers of at most `per_layer`, never leaving a
/// single bar alone in a layer.
fn layer_counts(n: u32, per_layer: u32, max_layers: u32) -> Option<Vec<u32>> {
    if per_layer < 2 || n < 2 {
        return None;
    }
    let layers = n.div_ceil(per_layer);
    if layers > max_layers {
        return None;
    }
    let mut counts = vec![per_layer; layers as usize];
    let last = n - per_layer * (layers - 1);
    if let Some(tail) = counts.last_mut() {
        *tail = last;
    }
    if layers > 1 && last == 1 {
        if per_layer < 3 {
            return None;
        }
        let k = counts.len();
        counts[k - 2] -= 1;
        counts[k - 1] += 1;
    }
    Some(counts)
}

/// Lay out a fixed combination. `None` when it does not fit.
pub fn arrange_bars(
    combination: &BarCombination,
    geometry: &FaceGeometry,
    settings: &DetailingSettings,
) -> Option<LayerPlan> {
    let phi_max = combination.max_diameter();
    let per_layer = bars_per_layer(geometry, phi_max, settings);
    let counts = layer_counts(combination.bar_count(), per_layer, settings.max_layers)?;

    let bars = combination.bar_diameters();
    let gap = layer_gap(phi_max, settings);
    let mut layers = Vec::with_capacity(counts.len());
    let mut next = 0usize;
    let mut previous: Option<(f64, f64)> = None;
    let mut moment = 0.0;
    let mut area = 0.0;

    for (i, &count) in counts.iter().enumerate() {
        let slice = &bars[next..next + count as usize];
        next += count as usize;

        let mut groups: Vec<BarGroup> = Vec::new();
        for &d in slice {
            match groups.iter_mut().find(|g| g.diameter_mm == d) {
                Some(g) => g.count += 1,
                None => groups.push(BarGroup { diameter_mm: d, count: 1 }),
            }
        }
        let layer_phi = slice.iter().copied().max().unwrap_or(phi_max) as f64;

        let centre = match previous {
            None => geometry.offset_mm + layer_phi / 2.0,
            Some((prev_centre, prev_phi)) => prev_centre + prev_phi / 2.0 + gap + layer_phi / 2.0,
        };
        previous = Some((centre, layer_phi));

        let centre_spacing = if count > 1 {
            (geometry.width_mm - layer_phi) / (count - 1) as f64
        } else {
            0.0
        };
        let arrangement = BarArrangement {
            layer: i as u32 + 1,
            bars: groups,
            centre_spacing_mm: centre_spacing,
            clear_spacing_mm: centre_spacing - layer_phi,
            centre_from_face_mm: centre,
        };
        let a = arrangement.area_mm2();
        moment += a * centre;
        area += a;
        layers.push(arrangement);
    }

    let centroid = moment / area;
    let outer = layers.first().map(|l| l.centre_from_face_mm).unwrap_or(centroid);
    let spacer_mass = (layers.len() as f64 - 1.0)
        * unit_mass_kg_per_m(settings.spacer_diameter_mm)
        * (geometry.width_mm / 1000.0)
        * (1000.0 / settings.spacer_pitch_mm);

    Some(LayerPlan {
        combination: combination.clone(),
        layers,
        centroid_from_face_mm: centroid,
        centroid_shift_mm: (centroid - outer).max(0.0),
        mass_kg_per_m: combination.mass_kg_per_m() + spacer_mass,
    })
}

/// Every candidate set for the allowed diameters, in a fixed order.
pub fn candidate_combinations(diameters: &[u32], settings: &DetailingSettings) -> Vec<BarCombination> {
    let mut ds = diameters.to_vec();
    ds.sort_unstable();
    ds.dedup();

    let mut out = Vec::new();
    for &d in &ds {
        for n in settings.min_bars..=settings.max_bars {
            out.push(BarCombination::single(d, n));
        }
    }
    if settings.max_distinct_diameters >= 2 {
        for pair in ds.windows(2) {
            let (small, large) = (pair[0], pair[1]);
            for n_large in 2..settings.max_bars {
                for n_small in 1..=(settings.max_bars - n_large) {
                    if n_large + n_small < settings.min_bars {
                        continue;
                    }
                    out.push(BarCombination::two(
                        BarGroup { diameter_mm: large, count: n_large },
                        BarGroup { diameter_mm: small, count: n_small },
                    ));
                }
            }
        }
    }
    out
}

/// Selection order between two admissible plans.
pub fn compare_plans(a: &LayerPlan, b: &LayerPlan) -> Ordering {
    a.combination
        .area_key()
        .cmp(&b.combination.area_key())
        .then(a.combination.distinct_diameters().cmp(&b.combination.distinct_diameters()))
        .then(a.mass_kg_per_m.total_cmp(&b.mass_kg_per_m))
        .then(b.combination.max_diameter().cmp(&a.combination.max_diameter()))
        .then(a.combination.bar_count().cmp(&b.combination.bar_count()))
        .then_with(|| a.combination.cmp(&b.combination))
}

/// Select bars providing at least `required_mm2`.
///
/// Returns `None` when no admissible combination exists.
pub fn select_bars(
    required_mm2: f64,
    geometry: &FaceGeometry,
    diameters: &[u32],
    settings: &DetailingSettings,
) -> Option<LayerPlan> {
    candidate_combinations(diameters, settings)
        .iter()
        .filter(|c| c.area_mm2() >= required_mm2)
        .filter_map(|c| arrange_bars(c, geometry, settings))
        .min_by(compare_plans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> FaceGeometry {
        FaceGeometry::for_section(&Section::rectangular(300.0, 450.0, 410.0, 25.0), 8)
    }

    #[test]
    fn test_geometry() {
        let g = geometry();
        assert_eq!(g.width_mm, 234.0);
        assert_eq!(g.offset_mm, 33.0);
    }

    #[test]
    fn test_bars_per_layer() {
        let s = DetailingSettings::default();
        // 16φ: clear 25 → (234 + 25) / 41 = 6.3
        assert_eq!(bars_per_layer(&geometry(), 16, &s), 6);
        // 32φ: clear 32 → (234 + 32) / 64 = 4.2
        assert_eq!(bars_per_layer(&geometry(), 32, &s), 4);
    }

    #[test]
    fn test_layer_counts_avoid_single_bar() {
        assert_eq!(layer_counts(4, 6, 2), Some(vec![4]));
        assert_eq!(layer_counts(7, 6, 2), Some(vec![5, 2]));
        assert_eq!(layer_counts(8, 4, 2), Some(vec![4, 4]));
        assert_eq!(layer_counts(9, 4, 2), None);
        assert_eq!(layer_counts(3, 2, 2), None);
    }

    #[test]
    fn test_scenario_selection() {
        let s = DetailingSettings::default();
        let plan = select_bars(770.9, &geometry(), &s.allowed_diameters, &s).unwrap();
        // Σnφ² = 988 beats 4-16φ (1024) even though it needs a second layer
        assert_eq!(
            plan.combination,
            BarCombination::two(
                BarGroup { diameter_mm: 12, count: 2 },
                BarGroup { diameter_mm: 10, count: 7 },
            )
        );
        assert!(plan.provided_area_mm2() >= 770.9);
        assert_eq!(plan.layer_count(), 2);
        assert_eq!(plan.layers[0].bar_count(), 6);
        assert_eq!(plan.layers[1].bar_count(), 3);
        assert!(plan.centroid_shift_mm > 0.0);
    }

    #[test]
    fn test_single_layer_when_only_diameters_allow() {
        let s = DetailingSettings::default();
        let plan = select_bars(770.9, &geometry(), &[16, 20], &s).unwrap();
        assert_eq!(plan.combination, BarCombination::single(16, 4));
        assert_eq!(plan.layer_count(), 1);
        assert_eq!(plan.centroid_shift_mm, 0.0);
        assert!((plan.centroid_from_face_mm - 41.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_layers_win_on_area() {
        let s = DetailingSettings::default();
        let plan = select_bars(2000.0, &geometry(), &s.allowed_diameters, &s).unwrap();
        // 2-32φ + 1-25φ fits one layer but provides 2099 mm²
        assert_eq!(plan.combination, BarCombination::single(16, 10));
        assert_eq!(plan.layer_count(), 2);
        assert!(plan.provided_area_mm2() < 2099.0);
    }

    #[test]
    fn test_selection_is_minimal() {
        let s = DetailingSettings::default();
        for required in [150.0, 420.0, 980.0, 1650.0, 2400.0, 3600.0] {
            let plan = select_bars(required, &geometry(), &s.allowed_diameters, &s).unwrap();
            assert!(plan.provided_area_mm2() >= required);
            for c in candidate_combinations(&s.allowed_diameters, &s) {
                if c.area_mm2() >= required && arrange_bars(&c, &geometry(), &s).is_some() {
                    assert!(c.area_key() >= plan.combination.area_key(), "{} beats {}", c, plan.combination);
                }
            }
        }
    }

    #[test]
    fn test_two_diameters_corners_large() {
        let c = BarCombination::two(
            BarGroup { diameter_mm: 16, count: 1 },
            BarGroup { diameter_mm: 20, count: 2 },
        );
        assert_eq!(c.groups[0].diameter_mm, 20);
        assert_eq!(c.area_key(), 2 * 400 + 256);
        assert_eq!(c.distinct_diameters(), 2);
        assert_eq!(c.to_string(), "2-20φ + 1-16φ");
    }

    #[test]
    fn test_second_layer_shifts_centroid() {
        let s = DetailingSettings::default();
        let plan = arrange_bars(&BarCombination::single(25, 6), &geometry(), &s).unwrap();
        // 25φ: clear 25 → (234 + 25) / 50 = 5 per layer → 4 + 2
        assert_eq!(plan.layer_count(), 2);
        assert_eq!(plan.layers[0].bar_count(), 4);
        assert_eq!(plan.layers[1].bar_count(), 2);
        // layer 2 centre = 45.5 + 12.5 + 25 + 12.5 = 95.5; centroid = (4 × 45.5 + 2 × 95.5) / 6
        let expected = (4.0 * 45.5 + 2.0 * 95.5) / 6.0;
        assert!((plan.centroid_from_face_mm - expected).abs() < 1e-9);
        assert!((plan.centroid_shift_mm - (expected - 45.5)).abs() < 1e-9);
        assert!(plan.mass_kg_per_m > BarCombination::single(25, 6).mass_kg_per_m());
    }

    #[test]
    fn test_too_many_bars_rejected() {
        let s = DetailingSettings::default();
        assert!(arrange_bars(&BarCombination::single(32, 12), &geometry(), &s).is_none());
        assert!(select_bars(1.0e6, &geometry(), &s.allowed_diameters, &s).is_none());
    }

    #[test]
    fn test_deterministic_order() {
        let s = DetailingSettings::default();
        let mut reversed = s.allowed_diameters.clone();
        reversed.reverse();
        let a = select_bars(1234.0, &geometry(), &s.allowed_diameters, &s);
        let b = select_bars(1234.0, &geometry(), &reversed, &s);
        assert_eq!(a, b);
    }
}
