//! rust_reliability — structural reliability analysis and code calibration.
//!
//! Purpose
//! -------
//! Calibrate design parameters (safety factors) so that the first-order
//! reliability index of an engineered component matches a target value
//! across its governing load combinations, and derive the partial safety
//! factors design codes are written in terms of.
//!
//! Key behaviors
//! -------------
//! - [`distributions`]: named marginal random variables with quantile/CDF/PDF
//!   evaluation and the standardizing transform to and from standard-normal
//!   space.
//! - [`combination`]: load-combination declarations; per-case substitution of
//!   annual-extreme ("max") versus point-in-time ("pit") load distributions.
//! - [`form`]: the first-order design-point search, as either an iterative
//!   equivalent-normal projection or an optimizer-backed constrained
//!   minimization.
//! - [`calibration`]: the outer loop adjusting the design parameter per case
//!   until the target reliability index is met, plus factor derivation.
//! - [`optimization`]: bracketing, Brent root finding, and the
//!   augmented-Lagrangian minimizer the other modules share.
//!
//! Invariants & assumptions
//! ------------------------
//! - Random variables are independent; dependence enters only through the
//!   limit-state function.
//! - Every operation is deterministic and synchronous; variables are
//!   immutable and shared by `Arc`, so per-case solves are externally
//!   parallelizable while the outer search stays sequential.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use rust_reliability::{
//!     Calibration, CalibrationMethod, EstimationMethod, LoadCombination, LoadPair,
//!     RandomVariable, VariableValues,
//! };
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let q_max = Arc::new(RandomVariable::gumbel("Q1", 1.0, 0.2)?);
//! let q_pit = Arc::new(RandomVariable::gumbel("Q1", 0.89, 0.2)?);
//! let r = Arc::new(RandomVariable::lognormal("R", 1.0, 0.15)?);
//! let z = Arc::new(RandomVariable::constant("z", 1.0)?);
//!
//! let lc = LoadCombination::new(
//!     |v: &VariableValues| v["z"] * v["R"] - v["Q1"],
//!     vec![("Q1".to_string(), LoadPair::new(q_max.clone(), q_pit))],
//!     vec![r.clone()],
//!     vec![],
//!     vec![z],
//!     vec![("Q1_max".to_string(), vec!["Q1".to_string()])],
//! )?;
//!
//! let mut nominal = BTreeMap::new();
//! nominal.insert("R".to_string(), r.quantile(0.05)?);
//! nominal.insert("Q1".to_string(), q_max.quantile(0.98)?);
//!
//! let mut calib = Calibration::new(
//!     lc,
//!     4.3,
//!     nominal,
//!     "z",
//!     EstimationMethod::Coefficient,
//!     CalibrationMethod::Optimize,
//! )?;
//! let outcome = calib.run()?;
//! println!("design value: {:.4}", outcome.design_value());
//! println!("{}", outcome.resistance_factors());
//! # Ok(())
//! # }
//! ```
pub mod calibration;
pub mod combination;
pub mod distributions;
pub mod form;
pub mod optimization;

pub use calibration::{
    CalibError, CalibResult, Calibration, CalibrationMethod, CalibrationOptions,
    CalibrationOutcome, CaseTable,
};
pub use combination::{ComboError, ComboResult, CombinationCase, LoadCombination, LoadPair};
pub use distributions::{ContinuousModel, DistError, DistResult, Marginal, RandomVariable};
pub use form::{
    DesignPoint, DesignPointSolver, EstimationMethod, FormError, FormOptions, FormResult,
    LimitState, VariableValues,
};
