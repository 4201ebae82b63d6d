//! # Code Clause References
//!
//! Traceable references to the design standards used by the engines.
//! Every [`DesignError`](crate::errors::DesignError) cites one of these.
//!
//! - IS 456:2000 - Plain and Reinforced Concrete, Code of Practice
//! - IS 13920:2016 - Ductile Design and Detailing of RC Structures
//! - SP 16 - Design Aids for Reinforced Concrete to IS 456

/// Input validation (no clause, engine contract)
pub const VALIDATION: &str = "Input validation";

// Flexure
/// Limiting depth of neutral axis, xu,max/d
pub const XU_MAX: &str = "IS 456 38.1 / Note";
/// Stress block and limiting moment
pub const LIMITING_MOMENT: &str = "IS 456 Annex G-1.1";
/// Doubly reinforced section
pub const DOUBLY_REINFORCED: &str = "IS 456 Annex G-1.2";
/// Effective width of flange
pub const EFFECTIVE_FLANGE_WIDTH: &str = "IS 456 23.1.2";
/// Minimum tension reinforcement
pub const MIN_TENSION_STEEL: &str = "IS 456 26.5.1.1(a)";
/// Maximum tension reinforcement
pub const MAX_TENSION_STEEL: &str = "IS 456 26.5.1.1(b)";
/// Maximum compression reinforcement
pub const MAX_COMPRESSION_STEEL: &str = "IS 456 26.5.1.2";
/// Design stress-strain curve for reinforcement
pub const STEEL_STRESS_STRAIN: &str = "IS 456 38.1(e) / Fig. 23";

// Shear
/// Nominal shear stress
pub const NOMINAL_SHEAR: &str = "IS 456 40.1";
/// Design shear strength of concrete
pub const SHEAR_STRENGTH: &str = "IS 456 40.2.1 / Table 19";
/// Maximum shear stress with shear reinforcement
pub const MAX_SHEAR_STRESS: &str = "IS 456 40.2.3 / Table 20";
/// Design of shear reinforcement
pub const SHEAR_REINFORCEMENT: &str = "IS 456 40.4(a)";
/// Minimum shear reinforcement
pub const MIN_SHEAR_REINFORCEMENT: &str = "IS 456 26.5.1.6";
/// Maximum spacing of shear reinforcement
pub const MAX_STIRRUP_SPACING: &str = "IS 456 26.5.1.5";

// Serviceability
/// Span to effective depth ratio
pub const SPAN_DEPTH: &str = "IS 456 23.2.1";
/// Slenderness limits for lateral stability
pub const LATERAL_STABILITY: &str = "IS 456 23.3";
/// Crack width calculation
pub const CRACK_WIDTH: &str = "IS 456 Annex F";
/// Crack width limits
pub const CRACK_LIMIT: &str = "IS 456 35.3.2";

// Detailing
/// Nominal cover for exposure
pub const NOMINAL_COVER: &str = "IS 456 26.4.2 / Table 16";
/// Minimum grade for exposure
pub const MIN_GRADE: &str = "IS 456 8.2.4 / Table 5";
/// Horizontal distance between bars
pub const BAR_SPACING: &str = "IS 456 26.3.2";
/// Curtailment of tension reinforcement
pub const CURTAILMENT: &str = "IS 456 26.2.3";

// Ductile detailing
/// Beam geometry
pub const DUCTILE_GEOMETRY: &str = "IS 13920 6.1";
/// Longitudinal reinforcement
pub const DUCTILE_LONGITUDINAL: &str = "IS 13920 6.2";
/// Transverse reinforcement
pub const DUCTILE_TRANSVERSE: &str = "IS 13920 6.3";
