//! # Error Types
//!
//! Two layers of errors live here:
//!
//! - [`CalcError`] is the Rust error returned by fallible operations. Engines
//!   only return it for input validation failures, before any formula runs.
//! - [`DesignError`] is the structured diagnostic attached to a result. It
//!   carries a code, a severity and the code clause it comes from. A result
//!   with an `Error`-severity entry is not acceptable; warnings and info
//!   entries never change `is_ok`.
//!
//! ## Example
//!
//! ```rust
//! use rcbeam_core::errors::{CalcError, CalcResult};
//!
//! fn validate_width(width_mm: f64) -> CalcResult<()> {
//!     if width_mm <= 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "width_mm",
//!             width_mm.to_string(),
//!             "Width must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! assert!(validate_width(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for rcbeam_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
///
/// Each variant provides specific context about what went wrong,
/// enabling programmatic error handling by report/export collaborators.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, wrong sign, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Material grade not supported by the design tables
    #[error("Unsupported material: {material} - {reason}")]
    UnsupportedMaterial { material: String, reason: String },

    /// A batch or optimization run was cancelled at a checkpoint
    #[error("Computation cancelled after {completed} of {total} units")]
    Cancelled { completed: usize, total: usize },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an UnsupportedMaterial error
    pub fn unsupported_material(material: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::UnsupportedMaterial {
            material: material.into(),
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::UnsupportedMaterial { .. } => "UNSUPPORTED_MATERIAL",
            CalcError::Cancelled { .. } => "CANCELLED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Convert a validation failure into the diagnostic attached to a result.
    pub fn to_design_error(&self) -> DesignError {
        let code = match self {
            CalcError::UnsupportedMaterial { .. } => ErrorCode::UnsupportedMaterial,
            CalcError::MissingField { .. } => ErrorCode::MissingField,
            _ => ErrorCode::InvalidInput,
        };
        DesignError::new(
            code,
            Severity::Error,
            DesignStage::Validation,
            self.to_string(),
            crate::code_refs::VALIDATION,
        )
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: err.to_string(),
        }
    }
}

// ============================================================================
// Design diagnostics
// ============================================================================

/// Severity of a design diagnostic.
///
/// Ordered from most to least severe so sorted lists read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Design is unsafe; `is_ok = false`
    Error,
    /// Fails IS 13920 ductile detailing while remaining strength-compliant
    DuctileViolation,
    /// Code-borderline, still accepted
    Warning,
    /// Advisory only
    Info,
}

impl Severity {
    pub fn display_name(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::DuctileViolation => "DUCTILE",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Pipeline stage that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DesignStage {
    Validation,
    Flexure,
    Shear,
    Serviceability,
    Detailing,
    Ductile,
}

/// Stable codes for every diagnostic the engines emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation
    InvalidInput,
    MissingField,
    UnsupportedMaterial,

    // Flexure
    ZeroMoment,
    MinimumSteelGoverns,
    DoublyReinforced,
    TensionSteelAboveMaximum,
    CompressionSteelAboveMaximum,
    CompressionSteelIneffective,
    FlexureNonConvergence,
    FlangeWidthUnchecked,
    OverReinforced,

    // Shear
    ZeroShear,
    ShearStressExceedsMax,
    SteelPercentClamped,
    MinimumStirrupsGovern,
    MaxSpacingGoverns,

    // Serviceability
    ServiceabilitySkipped,
    SpanDepthExceeded,
    SpanDepthHardLimit,
    LongSpanDeflection,
    LateralStability,
    CrackWidthExceeded,
    Uncracked,

    // Detailing
    CoverBelowExposure,
    GradeBelowExposure,
    NoBarArrangement,
    SecondLayer,
    EffectiveDepthRecheck,
    EffectiveDepthUnsettled,
    NominalHangerBars,
    ProvidedAreaInsufficient,
    StirrupSpacingExceedsRequired,
    CurtailmentSkipped,

    // Ductile detailing
    DuctileGeometry,
    DuctileLongitudinalRatio,
    DuctileBarDiameter,
    DuctileStirrup,
}

/// A structured diagnostic attached to an engine result.
///
/// ## JSON Example
///
/// ```json
/// {
///   "code": "SHEAR_STRESS_EXCEEDS_MAX",
///   "severity": "ERROR",
///   "stage": "Shear",
///   "message": "τv = 3.45 N/mm² exceeds τc,max = 3.10 N/mm²",
///   "clause": "IS 456 40.2.3 / Table 20",
///   "case_id": "ULS-1"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignError {
    pub code: ErrorCode,
    pub severity: Severity,
    pub stage: DesignStage,
    pub message: String,
    /// Standard clause reference (e.g., "IS 456 26.5.1.1")
    pub clause: String,
    /// Load case the diagnostic belongs to, when case-specific
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
}

impl DesignError {
    pub fn new(
        code: ErrorCode,
        severity: Severity,
        stage: DesignStage,
        message: impl Into<String>,
        clause: impl Into<String>,
    ) -> Self {
        DesignError {
            code,
            severity,
            stage,
            message: message.into(),
            clause: clause.into(),
            case_id: None,
        }
    }

    pub fn error(code: ErrorCode, stage: DesignStage, message: impl Into<String>, clause: &str) -> Self {
        Self::new(code, Severity::Error, stage, message, clause)
    }

    pub fn warning(code: ErrorCode, stage: DesignStage, message: impl Into<String>, clause: &str) -> Self {
        Self::new(code, Severity::Warning, stage, message, clause)
    }

    pub fn info(code: ErrorCode, stage: DesignStage, message: impl Into<String>, clause: &str) -> Self {
        Self::new(code, Severity::Info, stage, message, clause)
    }

    pub fn ductile(code: ErrorCode, message: impl Into<String>, clause: &str) -> Self {
        Self::new(code, Severity::DuctileViolation, DesignStage::Ductile, message, clause)
    }

    /// Tag the diagnostic with a load case id (builder pattern)
    pub fn for_case(mut self, case_id: Option<&str>) -> Self {
        self.case_id = case_id.map(str::to_string);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for DesignError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {:?}: {} ({})", self.severity, self.code, self.message, self.clause)
    }
}

/// True when none of the diagnostics is an `Error`
pub fn no_errors(errors: &[DesignError]) -> bool {
    !errors.iter().any(DesignError::is_error)
}

/// True when none of the diagnostics is a ductile detailing violation
pub fn no_ductile_violations(errors: &[DesignError]) -> bool {
    !errors
        .iter()
        .any(|e| e.severity == Severity::DuctileViolation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("width_mm", "-300", "Width must be positive");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("cases").error_code(), "MISSING_FIELD");
        assert_eq!(
            CalcError::Cancelled { completed: 1, total: 4 }.error_code(),
            "CANCELLED"
        );
    }

    #[test]
    fn test_validation_error_becomes_design_error() {
        let err = CalcError::invalid_input("fck_mpa", "5", "Grade below M15");
        let diag = err.to_design_error();
        assert_eq!(diag.code, ErrorCode::InvalidInput);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.stage, DesignStage::Validation);
        assert!(diag.message.contains("fck_mpa"));
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        let json = serde_json::to_string(&Severity::DuctileViolation).unwrap();
        assert_eq!(json, "\"DUCTILE_VIOLATION\"");
        let code = serde_json::to_string(&ErrorCode::ShearStressExceedsMax).unwrap();
        assert_eq!(code, "\"SHEAR_STRESS_EXCEEDS_MAX\"");
    }

    #[test]
    fn test_only_errors_affect_ok() {
        let diags = vec![
            DesignError::warning(ErrorCode::SpanDepthExceeded, DesignStage::Serviceability, "w", "x"),
            DesignError::info(ErrorCode::SecondLayer, DesignStage::Detailing, "i", "x"),
            DesignError::ductile(ErrorCode::DuctileGeometry, "d", "x"),
        ];
        assert!(no_errors(&diags));
        assert!(!no_ductile_violations(&diags));
    }
}
