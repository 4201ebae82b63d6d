//! # Unit Types
//!
//! Force and moment wrappers, and the kN/N and kN·m/N·mm conversions the
//! formula modules use.
//!
//! ## SI Units (IS 456)
//!
//! The engines follow the units of IS 456 and SP 16:
//! - Length: millimetres (mm)
//! - Force: newtons (N), kilonewtons (kN)
//! - Stress: N/mm² (MPa)
//! - Moment: kN·m at the interface, N·mm inside the formulas
//!
//! Request and result structs keep plain `f64` fields with unit suffixes
//! (`moment_knm`, `width_mm`) so JSON stays flat; the conversions below are
//! used where values cross between interface and formula units.
//!
//! ## Example
//!
//! ```rust
//! use rcbeam_core::units::{KilonewtonMetres, NewtonMillimetres};
//!
//! let mu = KilonewtonMetres(120.0);
//! let mu_nmm: NewtonMillimetres = mu.into();
//! assert_eq!(mu_nmm.0, 120.0e6);
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Force Units
// ============================================================================

/// Force in newtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Newtons(pub f64);

/// Force in kilonewtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilonewtons(pub f64);

impl From<Kilonewtons> for Newtons {
    fn from(kn: Kilonewtons) -> Self {
        Newtons(kn.0 * 1000.0)
    }
}

impl From<Newtons> for Kilonewtons {
    fn from(n: Newtons) -> Self {
        Kilonewtons(n.0 / 1000.0)
    }
}

// ============================================================================
// Moment Units
// ============================================================================

/// Moment in kilonewton-metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KilonewtonMetres(pub f64);

/// Moment in newton-millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonMillimetres(pub f64);

impl From<KilonewtonMetres> for NewtonMillimetres {
    fn from(knm: KilonewtonMetres) -> Self {
        NewtonMillimetres(knm.0 * 1.0e6)
    }
}

impl From<NewtonMillimetres> for KilonewtonMetres {
    fn from(nmm: NewtonMillimetres) -> Self {
        KilonewtonMetres(nmm.0 / 1.0e6)
    }
}

/// Convert a moment in kN·m to N·mm
pub fn knm_to_nmm(moment_knm: f64) -> f64 {
    NewtonMillimetres::from(KilonewtonMetres(moment_knm)).0
}

/// Convert a moment in N·mm to kN·m
pub fn nmm_to_knm(moment_nmm: f64) -> f64 {
    KilonewtonMetres::from(NewtonMillimetres(moment_nmm)).0
}

/// Convert a force in kN to N
pub fn kn_to_n(force_kn: f64) -> f64 {
    Newtons::from(Kilonewtons(force_kn)).0
}

/// Convert a force in N to kN
pub fn n_to_kn(force_n: f64) -> f64 {
    Kilonewtons::from(Newtons(force_n)).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moment_conversion() {
        assert_eq!(knm_to_nmm(120.0), 120.0e6);
        assert_eq!(nmm_to_knm(168.4e6), 168.4);
    }

    #[test]
    fn test_force_conversion() {
        assert_eq!(kn_to_n(90.0), 90_000.0);
        assert_eq!(n_to_kn(65_215.0), 65.215);
    }

    #[test]
    fn test_serialization() {
        let mu = KilonewtonMetres(120.5);
        let json = serde_json::to_string(&mu).unwrap();
        assert_eq!(json, "120.5");
    }
}
