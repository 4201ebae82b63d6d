//! # rcbeam_core - Reinforced Concrete Beam Design Engine
//!
//! `rcbeam_core` designs reinforced concrete beams to IS 456:2000 (with
//! IS 13920 ductile detailing) and searches reinforcement options for
//! cost, weight, carbon and constructability. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **Deterministic**: Same input, same output, in the same order
//! - **Rich Errors**: Every degenerate value carries a structured diagnostic
//!
//! ## Quick Start
//!
//! ```rust
//! use rcbeam_core::{design_beam, DesignRequest, DesignSettings, LoadDemand, Material, Section};
//!
//! let request = DesignRequest::new(
//!     Section::rectangular(300.0, 450.0, 410.0, 25.0),
//!     Material::new(25.0, 500.0),
//!     vec![LoadDemand::new(120.0, 90.0)],
//! )
//! .with_span(6000.0);
//! let result = design_beam(&request, &DesignSettings::default());
//! assert!(result.is_ok);
//!
//! let json = serde_json::to_string_pretty(&result).unwrap();
//! assert!(json.contains("\"is_ok\": true"));
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Flexure, shear, serviceability, detailing and the pipeline
//! - [`optimization`] - Candidate search, Pareto frontier, beam-line standardization
//! - [`tables`] - IS 456 lookup tables
//! - [`materials`] - Concrete, steel and the rebar catalogue
//! - [`section`] - Section geometry, support conditions, exposure
//! - [`settings`] - Tunable design settings
//! - [`units`] - Unit conversions
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod cancel;
pub mod code_refs;
pub mod errors;
pub mod materials;
pub mod optimization;
pub mod section;
pub mod settings;
pub mod tables;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::design::{design_batch, design_beam, DesignRequest, DesignResult, LoadDemand};
pub use cancel::CancelToken;
pub use errors::{CalcError, CalcResult, DesignError, ErrorCode, Severity};
pub use materials::Material;
pub use optimization::{optimize, standardize, OptimizationRequest, OptimizationResponse};
pub use section::Section;
pub use settings::DesignSettings;
