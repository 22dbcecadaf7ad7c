//! Errors for the marginal-distribution layer (parameter validation, support
//! domains, and moment-matching failures).
//!
//! ## Conventions
//! - Every error carries the **variable name** so that failures surfacing from
//!   a combination-case solve can be traced back to the offending marginal.
//! - Probabilities handed to quantile functions must lie strictly inside
//!   `(0, 1)`; the boundary values map to infinite quantiles and are rejected.
//! - Shape parameters recovered from `(mean, stdv)` by a scalar root-solve
//!   normalize the solver failure into [`DistError::ShapeSolveFailed`] with a
//!   human-readable status.

/// Result alias for distribution-layer operations.
pub type DistResult<T> = Result<T, DistError>;

/// Unified error type for marginal-distribution construction and evaluation.
///
/// Covers invalid family parameters, quantile/CDF domain violations, and
/// degenerate density evaluations. Implements `Display`/`Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum DistError {
    // ---- Construction ----
    /// A family parameter is non-finite or outside its admissible range.
    InvalidParameter { name: String, value: f64, reason: &'static str },

    /// Recovering a shape parameter from (mean, stdv) failed.
    ShapeSolveFailed { name: String, cov: f64, status: String },

    /// A library-backed distribution does not report the moments needed for
    /// the solver initialization.
    MissingMoments { name: String },

    // ---- Evaluation ----
    /// Quantile requested outside the open interval (0, 1).
    QuantileOutOfRange { name: String, p: f64 },

    /// Density vanished (or was non-finite) where the equivalent-normal
    /// transform needs to divide by it.
    DegenerateDensity { name: String, x: f64, pdf: f64 },
}

impl std::error::Error for DistError {}

impl std::fmt::Display for DistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistError::InvalidParameter { name, value, reason } => {
                write!(f, "Invalid parameter for variable `{name}`: got {value}. {reason}")
            }
            DistError::ShapeSolveFailed { name, cov, status } => {
                write!(
                    f,
                    "Could not recover a shape parameter for variable `{name}` \
                     (coefficient of variation {cov}): {status}"
                )
            }
            DistError::MissingMoments { name } => {
                write!(f, "Library-backed distribution `{name}` does not report mean/stdv.")
            }
            DistError::QuantileOutOfRange { name, p } => {
                write!(f, "Quantile of `{name}` requested at p = {p}; p must lie in (0, 1).")
            }
            DistError::DegenerateDensity { name, x, pdf } => {
                write!(f, "Density of `{name}` at x = {x} is degenerate ({pdf}).")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_variable_name_and_value() {
        let err = DistError::QuantileOutOfRange { name: "R".to_string(), p: 1.2 };
        let msg = err.to_string();
        assert!(msg.contains("`R`"), "message should name the variable: {msg}");
        assert!(msg.contains("1.2"), "message should carry the offending value: {msg}");
    }

    #[test]
    fn display_for_invalid_parameter_includes_reason() {
        let err = DistError::InvalidParameter {
            name: "G".to_string(),
            value: -0.1,
            reason: "Standard deviation must be finite and > 0.",
        };
        assert!(err.to_string().contains("Standard deviation"));
    }
}
