//! Reinforcing bar catalogue
//!
//! Standard bar diameters per IS 1786 with nominal areas and unit masses.

use std::f64::consts::PI;

/// Density of reinforcing steel (kg/m³)
pub const STEEL_DENSITY_KG_M3: f64 = 7850.0;

/// Standard bar diameters (mm), ascending
pub const STANDARD_DIAMETERS: [u32; 11] = [6, 8, 10, 12, 16, 20, 25, 28, 32, 36, 40];

/// Is `diameter_mm` a standard bar size
pub fn is_standard_diameter(diameter_mm: u32) -> bool {
    STANDARD_DIAMETERS.contains(&diameter_mm)
}

/// Nominal cross-sectional area πφ²/4 (mm²)
pub fn bar_area_mm2(diameter_mm: u32) -> f64 {
    let d = diameter_mm as f64;
    PI * d * d / 4.0
}

/// Area of `count` bars of one diameter (mm²)
pub fn bars_area_mm2(diameter_mm: u32, count: u32) -> f64 {
    count as f64 * bar_area_mm2(diameter_mm)
}

/// Mass per metre of one bar (kg/m), ≈ φ² / 162.2
pub fn unit_mass_kg_per_m(diameter_mm: u32) -> f64 {
    bar_area_mm2(diameter_mm) * 1.0e-6 * STEEL_DENSITY_KG_M3
}

/// Convert a steel area (mm²) running one metre into mass (kg)
pub fn area_to_mass_kg_per_m(area_mm2: f64) -> f64 {
    area_mm2 * 1.0e-6 * STEEL_DENSITY_KG_M3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_area() {
        assert!((bar_area_mm2(16) - 201.06).abs() < 0.01);
        assert!((bar_area_mm2(8) - 50.27).abs() < 0.01);
    }

    #[test]
    fn test_unit_mass_matches_rule_of_thumb() {
        for d in STANDARD_DIAMETERS {
            let rule = (d * d) as f64 / 162.2;
            assert!((unit_mass_kg_per_m(d) - rule).abs() / rule < 0.001);
        }
    }

    #[test]
    fn test_standard_diameters() {
        assert!(is_standard_diameter(20));
        assert!(!is_standard_diameter(18));
        assert!(STANDARD_DIAMETERS.windows(2).all(|w| w[0] < w[1]));
    }
}
