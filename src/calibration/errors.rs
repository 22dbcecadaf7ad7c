//! Errors for the calibration engine, wrapping the lower layers with case
//! context.
use crate::combination::errors::ComboError;
use crate::form::errors::FormError;
use crate::optimization::errors::OptError;

/// Result alias for calibration operations.
pub type CalibResult<T> = Result<T, CalibError>;

/// Unified error type for the calibration engine.
///
/// Configuration problems are detected eagerly at construction; inner
/// design-point failures and outer-search failures abort `run()` with the
/// offending case attached. No partial outcome is ever produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibError {
    // ---- Configuration ----
    /// Declaration errors from the load-combination layer.
    Config(ComboError),

    /// The calibration variable is not among the declared constants.
    MissingCalibrationVariable { name: String },

    /// A random variable has no nominal value to normalize factors by.
    MissingNominalValue { variable: String },

    /// A nominal value is unusable as a factor denominator.
    InvalidNominalValue { variable: String, value: f64 },

    /// Target reliability index must be finite and > 0.
    InvalidTargetBeta { value: f64 },

    /// Calibration-method name did not parse.
    UnknownCalibrationMethod { name: String },

    // ---- Execution ----
    /// An inner design-point solve failed.
    Form { case: String, source: FormError },

    /// The outer design-parameter search failed (bracketing, root find, or
    /// the direct update loop).
    OuterSearchFailed { case: String, source: OptError },

    /// Results were requested before a successful `run()`.
    NotCalibrated,
}

impl CalibError {
    pub(crate) fn form(case: &str, source: FormError) -> Self {
        CalibError::Form { case: case.to_string(), source }
    }

    pub(crate) fn outer(case: &str, source: OptError) -> Self {
        CalibError::OuterSearchFailed { case: case.to_string(), source }
    }
}

impl std::error::Error for CalibError {}

impl std::fmt::Display for CalibError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibError::Config(source) => write!(f, "Configuration error: {source}"),
            CalibError::MissingCalibrationVariable { name } => {
                write!(f, "Calibration variable `{name}` is not among the declared constants.")
            }
            CalibError::MissingNominalValue { variable } => {
                write!(f, "No nominal value declared for variable `{variable}`.")
            }
            CalibError::InvalidNominalValue { variable, value } => {
                write!(
                    f,
                    "Nominal value for `{variable}` must be finite and non-zero; got {value}."
                )
            }
            CalibError::InvalidTargetBeta { value } => {
                write!(f, "Target reliability index must be finite and > 0; got {value}.")
            }
            CalibError::UnknownCalibrationMethod { name } => {
                write!(
                    f,
                    "Unknown calibration method `{name}`; valid options are case-insensitive \
                     'optimize' or 'alpha'."
                )
            }
            CalibError::Form { case, source } => {
                write!(f, "Design-point solve failed for case `{case}`: {source}")
            }
            CalibError::OuterSearchFailed { case, source } => {
                write!(f, "Design-parameter search failed for case `{case}`: {source}")
            }
            CalibError::NotCalibrated => {
                write!(f, "Calibration results requested before a successful run().")
            }
        }
    }
}

impl From<ComboError> for CalibError {
    fn from(err: ComboError) -> Self {
        CalibError::Config(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_failures_name_the_case_and_the_cause() {
        let err = CalibError::outer(
            "Q2_max",
            OptError::NotConverged { iterations: 100, residual: 0.2 },
        );
        let msg = err.to_string();
        assert!(msg.contains("`Q2_max`"));
        assert!(msg.contains("100"));
    }
}
