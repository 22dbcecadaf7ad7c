//! Reliability-based calibration of design parameters and partial factors.
//!
//! Purpose
//! -------
//! Drive the design-point solver across every declared load-combination case
//! while searching for the design-parameter value that brings each case to
//! the target reliability index, then post-process the converged design
//! points into resistance, load, and combination factor tables.
pub mod engine;
pub mod errors;
pub mod factors;

pub use self::engine::{Calibration, CalibrationMethod, CalibrationOptions, CalibrationOutcome};
pub use self::errors::{CalibError, CalibResult};
pub use self::factors::CaseTable;
