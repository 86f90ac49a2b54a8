//! # hailnet_core - Hail Net Estimation Engine
//!
//! `hailnet_core` turns farm geometry or area into a priced bill of materials
//! for agricultural hail-protection netting: net dimensions, roll counts,
//! accessory quantities, discounts and per-hectare costs. Two catalogs are
//! supported, an advanced USD catalog and a basic CNY catalog, as two
//! configurations of one engine.
//!
//! ## Design Philosophy
//!
//! - **Pure core**: [`calculations::compute`] maps an input to a result with no I/O
//! - **JSON-First**: inputs, results and stored state are serde types
//! - **Degenerate, not failing**: bad numbers propagate as NaN; display layers
//!   substitute placeholders
//! - **Rich Errors**: structured error types for everything outside the core
//!
//! ## Quick Start
//!
//! ```rust
//! use hailnet_core::parameters::{AdvancedParameters, AdvancedMode, Estimator};
//!
//! let mut estimator = Estimator::new(AdvancedParameters::default());
//! estimator.update(|p| {
//!     p.mode = AdvancedMode::Precise;
//!     p.row_count = 40;
//! });
//!
//! let result = estimator.result();
//! assert_eq!(result.rolls_needed, 40);
//! println!("{}", serde_json::to_string_pretty(result).unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Net types, accessory tables, discount tiers
//! - [`rounding`] - Named rounding rules
//! - [`calculations`] - The estimation engine
//! - [`parameters`] - Persisted parameter sets and the recomputing estimator
//! - [`quotation`] - Formatted quotation model
//! - [`pdf`] - PDF rendering of quotations
//! - [`auth`] - Password gate for the advanced calculator
//! - [`store`] - Durable state with atomic saves and locking
//! - [`config`] - TOML application configuration
//! - [`errors`] - Structured error types

pub mod auth;
pub mod calculations;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod parameters;
pub mod pdf;
pub mod quotation;
pub mod rounding;
pub mod store;

// Re-export commonly used types at crate root for convenience
pub use calculations::{compute, CalculationInput, CalculationResult};
pub use errors::{CalcError, CalcResult};
pub use parameters::{AdvancedParameters, BasicParameters, Estimator, ParameterSet};
pub use quotation::Quotation;
pub use store::StateStore;
