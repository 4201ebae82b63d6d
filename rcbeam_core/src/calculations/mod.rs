//! # Structural Calculations
//!
//! The IS 456 engines and the pipeline that chains them. Each engine
//! follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` - Results with their diagnostics (JSON-serializable)
//! - `calculate(input, settings) -> Result<*Result, CalcError>` - Pure function;
//!   `Err` only for invalid input
//!
//! ## Available Calculations
//!
//! - [`flexure`] - Required steel for singly, doubly and flanged sections
//! - [`shear`] - Concrete shear strength and stirrup spacing
//! - [`serviceability`] - Span/depth, lateral stability and crack width
//! - [`detailing`] - Bar and stirrup selection, anchorage, curtailment
//! - [`design`] - Full beam pipeline and batch runs

pub mod design;
pub mod detailing;
pub mod flexure;
pub mod serviceability;
pub mod shear;

// Re-export commonly used types
pub use design::{design_batch, design_beam, BatchOutcome, BatchRequest, DesignRequest, DesignResult, LoadDemand};
pub use detailing::{DetailingInput, DetailingResult};
pub use flexure::{FlexureInput, FlexureResult};
pub use serviceability::{ServiceabilityInput, ServiceabilityResult};
pub use shear::{ShearInput, ShearResult, StirrupSpec};
