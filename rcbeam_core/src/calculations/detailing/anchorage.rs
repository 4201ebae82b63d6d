//! Development and lap lengths (IS 456 26.2.1, 26.2.5.1)

use serde::{Deserialize, Serialize};

use crate::materials::{Material, STEEL_DESIGN_FACTOR};
use crate::settings::DetailingSettings;
use crate::tables::design_tables;

/// τbd increase for deformed bars (26.2.1.1)
const DEFORMED_BOND_FACTOR: f64 = 1.6;

/// τbd increase for bars in compression (26.2.1.1)
const COMPRESSION_BOND_FACTOR: f64 = 1.25;

/// Minimum tension lap in bar diameters
const MIN_TENSION_LAP_DIAMETERS: f64 = 30.0;

/// Minimum compression lap in bar diameters
const MIN_COMPRESSION_LAP_DIAMETERS: f64 = 24.0;

/// Anchorage data for one bar diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchorage {
    pub diameter_mm: u32,
    /// Design bond stress in tension (N/mm²)
    pub bond_stress_mpa: f64,
    pub development_length_tension_mm: f64,
    pub development_length_compression_mm: f64,
    pub lap_tension_mm: f64,
    pub lap_compression_mm: f64,
}

/// Design bond stress τbd (N/mm²), including the deformed bar and
/// compression increases.
pub fn bond_stress(material: &Material, compression: bool) -> f64 {
    // Table values stop at M40; higher grades take the M40 value
    let mut tau_bd = design_tables().tau_bd.lookup(material.fck_mpa).value;
    if material.steel_grade().map(|g| g.is_deformed()).unwrap_or(false) {
        tau_bd *= DEFORMED_BOND_FACTOR;
    }
    if compression {
        tau_bd *= COMPRESSION_BOND_FACTOR;
    }
    tau_bd
}

/// Ld = φ σs / (4 τbd) with σs = 0.87 fy
pub fn development_length(diameter_mm: u32, material: &Material, compression: bool) -> f64 {
    let sigma_s = STEEL_DESIGN_FACTOR * material.fy_mpa;
    diameter_mm as f64 * sigma_s / (4.0 * bond_stress(material, compression))
}

/// Anchorage and lap lengths for a bar diameter.
pub fn anchorage_for(diameter_mm: u32, material: &Material, settings: &DetailingSettings) -> Anchorage {
    let phi = diameter_mm as f64;
    let ld_tension = development_length(diameter_mm, material, false);
    let ld_compression = development_length(diameter_mm, material, true);
    Anchorage {
        diameter_mm,
        bond_stress_mpa: bond_stress(material, false),
        development_length_tension_mm: ld_tension,
        development_length_compression_mm: ld_compression,
        lap_tension_mm: (settings.tension_lap_factor * ld_tension).max(MIN_TENSION_LAP_DIAMETERS * phi),
        lap_compression_mm: (settings.compression_lap_factor * ld_compression)
            .max(MIN_COMPRESSION_LAP_DIAMETERS * phi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_length_fe500_m25() {
        // τbd = 1.4 × 1.6 = 2.24; Ld = 16 × 435 / 8.96 = 776.8
        let ld = development_length(16, &Material::new(25.0, 500.0), false);
        assert!((ld - 776.79).abs() < 0.01, "Ld = {}", ld);
    }

    #[test]
    fn test_compression_is_shorter() {
        let m = Material::new(25.0, 415.0);
        let t = development_length(20, &m, false);
        let c = development_length(20, &m, true);
        assert!((t / c - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_plain_bars_no_deformed_increase() {
        // Fe250, M20: τbd = 1.2; Ld = 12 × 217.5 / 4.8
        let ld = development_length(12, &Material::new(20.0, 250.0), false);
        assert!((ld - 543.75).abs() < 1e-9);
    }

    #[test]
    fn test_lap_floors() {
        let settings = DetailingSettings::default();
        let a = anchorage_for(16, &Material::new(25.0, 500.0), &settings);
        assert!(a.lap_tension_mm >= 30.0 * 16.0);
        assert!(a.lap_compression_mm >= 24.0 * 16.0);
        assert_eq!(a.lap_tension_mm, a.development_length_tension_mm);

        // High grade concrete: Ld can fall below 30φ
        let strong = anchorage_for(10, &Material::new(40.0, 250.0), &settings);
        assert_eq!(strong.lap_tension_mm, (1.0 * strong.development_length_tension_mm).max(300.0));
    }
}
