//! Errors for the optimization helpers (bracketing, root finding, and the
//! constrained minimizer built on `argmin`).
//!
//! ## Conventions
//! - Backend (`argmin`) failures are normalized into
//!   [`OptError::SolverFailed`] with a human-readable status rather than
//!   leaking the backend error type.
//! - Objective evaluations performed inside a solver loop report failures as
//!   [`OptError::ObjectiveFailed`]; callers that need richer context capture
//!   their own error before degrading it to a status string.
use argmin::core::Error;

/// Result alias for optimization-helper operations.
pub type OptResult<T> = Result<T, OptError>;

/// Unified error type for the bracketing, root-finding and constrained
/// minimization helpers.
#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Configuration ----
    /// A tolerance needs to be positive and finite.
    InvalidTolerance { tol: f64, reason: &'static str },

    /// Maximum iterations needs to be positive.
    InvalidMaxIter { max_iter: usize },

    // ---- Bracketing ----
    /// The requested bracket is malformed.
    InvalidBracket { lo: f64, hi: f64, reason: &'static str },

    /// Geometric expansion failed to straddle a sign change.
    BracketExpansionFailed { lo: f64, hi: f64, f_lo: f64, f_hi: f64, tries: usize },

    // ---- Objective evaluations ----
    /// The objective produced a non-finite value.
    NonFiniteObjective { x: f64, value: f64 },

    /// A gradient entry came out non-finite.
    NonFiniteGradient { index: usize, value: f64 },

    /// The objective could not be evaluated; carries a human-readable status.
    ObjectiveFailed { status: String },

    // ---- Outcome ----
    /// Iteration cap reached before the residual met tolerance.
    NotConverged { iterations: usize, residual: f64 },

    /// Backend solver failed; carries a human-readable status.
    SolverFailed { status: String },

    /// The solver terminated without producing a best parameter.
    MissingSolution,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptError::InvalidTolerance { tol, reason } => {
                write!(f, "Tolerance must be finite and > 0; got {tol}. {reason}")
            }
            OptError::InvalidMaxIter { max_iter } => {
                write!(f, "Maximum iterations must be greater than zero; got {max_iter}.")
            }
            OptError::InvalidBracket { lo, hi, reason } => {
                write!(f, "Invalid bracket [{lo}, {hi}]: {reason}")
            }
            OptError::BracketExpansionFailed { lo, hi, f_lo, f_hi, tries } => {
                write!(
                    f,
                    "No sign change found after {tries} expansions; last interval \
                     [{lo}, {hi}] with values [{f_lo}, {f_hi}]."
                )
            }
            OptError::NonFiniteObjective { x, value } => {
                write!(f, "Objective returned a non-finite value {value} at x = {x}.")
            }
            OptError::NonFiniteGradient { index, value } => {
                write!(f, "Gradient entry at index {index} is non-finite: {value}")
            }
            OptError::ObjectiveFailed { status } => {
                write!(f, "Objective evaluation failed: {status}")
            }
            OptError::NotConverged { iterations, residual } => {
                write!(
                    f,
                    "Solver reached the iteration cap ({iterations}) with residual {residual}."
                )
            }
            OptError::SolverFailed { status } => {
                write!(f, "Solver failed with status: {status}")
            }
            OptError::MissingSolution => {
                write!(f, "Solver terminated without a best parameter.")
            }
        }
    }
}

/// Normalize any `argmin` runtime error into a status string.
impl From<Error> for OptError {
    fn from(err: Error) -> OptError {
        OptError::SolverFailed { status: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_failure_reports_last_interval() {
        let err = OptError::BracketExpansionFailed {
            lo: -1.0,
            hi: 4.0,
            f_lo: 2.0,
            f_hi: 3.0,
            tries: 60,
        };
        let msg = err.to_string();
        assert!(msg.contains("60"));
        assert!(msg.contains("[-1, 4]"));
    }
}
