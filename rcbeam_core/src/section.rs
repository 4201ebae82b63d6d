//! # Beam Section Geometry
//!
//! Cross-section, support condition and exposure definitions shared by all
//! engines. A [`Section`] is validated once before any formula runs and is
//! treated as immutable afterwards; engines that need a modified depth (the
//! detailing feedback loop) build a new section with
//! [`Section::with_effective_depth`].
//!
//! ## JSON Example (T-beam)
//!
//! ```json
//! {
//!   "width_mm": 300.0,
//!   "overall_depth_mm": 500.0,
//!   "effective_depth_mm": 450.0,
//!   "cover_mm": 25.0,
//!   "flange": { "kind": "T", "thickness_mm": 120.0, "width_mm": 1500.0 }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Practical limits on beam dimensions (mm)
const MIN_WIDTH_MM: f64 = 100.0;
const MAX_WIDTH_MM: f64 = 3000.0;
const MIN_DEPTH_MM: f64 = 100.0;
const MAX_DEPTH_MM: f64 = 4000.0;

/// Flange shape of a flanged beam cast with a slab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlangeKind {
    /// Slab on both sides of the web
    T,
    /// Slab on one side (edge beam)
    L,
}

/// Flange data of a T- or L-beam.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlangeGeometry {
    pub kind: FlangeKind,

    /// Slab thickness Df (mm)
    pub thickness_mm: f64,

    /// Actual available flange width (mm), upper bound on the effective width
    #[serde(default)]
    pub width_mm: Option<f64>,

    /// Isolated beam (flange not continuous with a slab), IS 456 23.1.2(c)
    #[serde(default)]
    pub isolated: bool,
}

/// Support condition for flange width, span/depth and curtailment rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SupportCondition {
    #[default]
    SimplySupported,
    Continuous,
    Cantilever,
}

impl SupportCondition {
    pub const ALL: [SupportCondition; 3] = [
        SupportCondition::SimplySupported,
        SupportCondition::Continuous,
        SupportCondition::Cantilever,
    ];

    /// Basic span / effective depth ratio (IS 456 23.2.1)
    pub fn basic_span_depth_ratio(&self) -> f64 {
        match self {
            SupportCondition::Cantilever => 7.0,
            SupportCondition::SimplySupported => 20.0,
            SupportCondition::Continuous => 26.0,
        }
    }

    /// Distance between points of zero moment l0 as a factor of the span
    pub fn zero_moment_factor(&self) -> f64 {
        match self {
            SupportCondition::Continuous => 0.7,
            SupportCondition::SimplySupported | SupportCondition::Cantilever => 1.0,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SupportCondition::SimplySupported => "Simply supported",
            SupportCondition::Continuous => "Continuous",
            SupportCondition::Cantilever => "Cantilever",
        }
    }
}

impl std::fmt::Display for SupportCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Environmental exposure (IS 456 Table 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum ExposureClass {
    Mild,
    #[default]
    Moderate,
    Severe,
    VerySevere,
    Extreme,
}

impl ExposureClass {
    pub const ALL: [ExposureClass; 5] = [
        ExposureClass::Mild,
        ExposureClass::Moderate,
        ExposureClass::Severe,
        ExposureClass::VerySevere,
        ExposureClass::Extreme,
    ];

    /// Nominal cover to meet durability (Table 16), mm
    pub fn nominal_cover_mm(&self) -> f64 {
        match self {
            ExposureClass::Mild => 20.0,
            ExposureClass::Moderate => 30.0,
            ExposureClass::Severe => 45.0,
            ExposureClass::VerySevere => 50.0,
            ExposureClass::Extreme => 75.0,
        }
    }

    /// Minimum grade of reinforced concrete (Table 5), N/mm²
    pub fn minimum_grade_mpa(&self) -> f64 {
        match self {
            ExposureClass::Mild => 20.0,
            ExposureClass::Moderate => 25.0,
            ExposureClass::Severe => 30.0,
            ExposureClass::VerySevere => 35.0,
            ExposureClass::Extreme => 40.0,
        }
    }

    /// Surface crack width limit (35.3.2), mm
    pub fn crack_width_limit_mm(&self) -> f64 {
        match self {
            ExposureClass::Mild | ExposureClass::Moderate => 0.3,
            _ => 0.2,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExposureClass::Mild => "Mild",
            ExposureClass::Moderate => "Moderate",
            ExposureClass::Severe => "Severe",
            ExposureClass::VerySevere => "Very severe",
            ExposureClass::Extreme => "Extreme",
        }
    }
}

impl std::fmt::Display for ExposureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Beam cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Web width b (mm)
    pub width_mm: f64,

    /// Overall depth D (mm)
    pub overall_depth_mm: f64,

    /// Effective depth d to the tension steel centroid (mm)
    pub effective_depth_mm: f64,

    /// Depth d' from the compression face to the compression steel centroid (mm).
    /// Defaults to D - d.
    #[serde(default)]
    pub compression_depth_mm: Option<f64>,

    /// Clear cover to the stirrups (mm)
    pub cover_mm: f64,

    #[serde(default)]
    pub flange: Option<FlangeGeometry>,
}

impl Section {
    /// Rectangular section
    pub fn rectangular(width_mm: f64, overall_depth_mm: f64, effective_depth_mm: f64, cover_mm: f64) -> Self {
        Section {
            width_mm,
            overall_depth_mm,
            effective_depth_mm,
            compression_depth_mm: None,
            cover_mm,
            flange: None,
        }
    }

    /// Add a flange (builder pattern)
    pub fn with_flange(mut self, flange: FlangeGeometry) -> Self {
        self.flange = Some(flange);
        self
    }

    /// Copy of this section with a revised effective depth
    pub fn with_effective_depth(&self, effective_depth_mm: f64) -> Self {
        let mut revised = *self;
        revised.effective_depth_mm = effective_depth_mm;
        revised
    }

    /// Copy with new width/depth, keeping the cover-to-steel offsets
    pub fn resized(&self, width_mm: f64, overall_depth_mm: f64) -> Self {
        let offset = self.overall_depth_mm - self.effective_depth_mm;
        let mut resized = *self;
        resized.width_mm = width_mm;
        resized.overall_depth_mm = overall_depth_mm;
        resized.effective_depth_mm = overall_depth_mm - offset;
        resized
    }

    /// d' (mm)
    pub fn d_prime_mm(&self) -> f64 {
        self.compression_depth_mm
            .unwrap_or(self.overall_depth_mm - self.effective_depth_mm)
    }

    pub fn is_flanged(&self) -> bool {
        self.flange.is_some()
    }

    /// Gross concrete area per unit length (mm²), including the actual flange overhang
    pub fn gross_area_mm2(&self) -> f64 {
        let web = self.width_mm * self.overall_depth_mm;
        match self.flange {
            Some(FlangeGeometry { thickness_mm, width_mm: Some(bf), .. }) => {
                web + (bf - self.width_mm).max(0.0) * thickness_mm
            }
            _ => web,
        }
    }

    /// Validate dimensions. Runs before any formula.
    pub fn validate(&self) -> CalcResult<()> {
        check_range("width_mm", self.width_mm, MIN_WIDTH_MM, MAX_WIDTH_MM)?;
        check_range("overall_depth_mm", self.overall_depth_mm, MIN_DEPTH_MM, MAX_DEPTH_MM)?;

        if !(self.cover_mm > 0.0) {
            return Err(CalcError::invalid_input(
                "cover_mm",
                self.cover_mm.to_string(),
                "Cover must be positive",
            ));
        }
        if self.cover_mm >= self.overall_depth_mm / 2.0 {
            return Err(CalcError::invalid_input(
                "cover_mm",
                self.cover_mm.to_string(),
                "Cover must be less than half the overall depth",
            ));
        }
        if !(self.effective_depth_mm > 0.0 && self.effective_depth_mm < self.overall_depth_mm) {
            return Err(CalcError::invalid_input(
                "effective_depth_mm",
                self.effective_depth_mm.to_string(),
                "Effective depth must be positive and less than the overall depth",
            ));
        }
        if self.effective_depth_mm > self.overall_depth_mm - self.cover_mm {
            return Err(CalcError::invalid_input(
                "effective_depth_mm",
                self.effective_depth_mm.to_string(),
                "Effective depth leaves no room for the cover",
            ));
        }
        let d_prime = self.d_prime_mm();
        if !(d_prime > 0.0 && d_prime < self.effective_depth_mm / 2.0) {
            return Err(CalcError::invalid_input(
                "compression_depth_mm",
                d_prime.to_string(),
                "d' must be positive and less than half the effective depth",
            ));
        }
        if let Some(flange) = &self.flange {
            if !(flange.thickness_mm > 0.0 && flange.thickness_mm < self.overall_depth_mm) {
                return Err(CalcError::invalid_input(
                    "flange.thickness_mm",
                    flange.thickness_mm.to_string(),
                    "Flange thickness must be positive and less than the overall depth",
                ));
            }
            if let Some(bf) = flange.width_mm {
                if !(bf >= self.width_mm) {
                    return Err(CalcError::invalid_input(
                        "flange.width_mm",
                        bf.to_string(),
                        "Flange width cannot be less than the web width",
                    ));
                }
            }
        }
        Ok(())
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> CalcResult<()> {
    if !(value >= min && value <= max) {
        return Err(CalcError::invalid_input(
            field,
            value.to_string(),
            format!("Must be between {} and {} mm", min, max),
        ));
    }
    Ok(())
}
