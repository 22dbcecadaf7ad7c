//! Errors for the design-point search (convergence, domain, and degeneracy
//! failures), always tagged with the combination-case label.
use crate::distributions::errors::DistError;
use crate::optimization::errors::OptError;

/// Result alias for design-point solver operations.
pub type FormResult<T> = Result<T, FormError>;

/// Unified error type for the first-order design-point search.
#[derive(Debug, Clone, PartialEq)]
pub enum FormError {
    // ---- Configuration ----
    /// The case declares no random variables, so there is no standardized
    /// space to search in.
    NoRandomVariables { case: String },

    /// Estimation-method name did not parse.
    UnknownEstimationMethod { name: String },

    // ---- Convergence ----
    /// Iteration cap reached before both the reliability-index change and the
    /// limit-state residual met tolerance.
    NotConverged { case: String, iterations: usize, beta_change: f64, residual: f64 },

    /// The scaled limit-state gradient vanished; the linearized surface is
    /// undefined.
    DegenerateGradient { case: String, norm: f64 },

    // ---- Evaluation ----
    /// The limit-state function returned NaN or an infinity.
    NonFiniteLimitState { case: String, value: f64 },

    /// A marginal-distribution operation failed at the trial point.
    Domain { case: String, source: DistError },

    /// The external optimizer failed inside the matrix strategy or a
    /// gradient evaluation.
    Optimizer { case: String, source: OptError },
}

impl FormError {
    pub(crate) fn domain(case: &str, source: DistError) -> Self {
        FormError::Domain { case: case.to_string(), source }
    }

    pub(crate) fn optimizer(case: &str, source: OptError) -> Self {
        FormError::Optimizer { case: case.to_string(), source }
    }
}

impl std::error::Error for FormError {}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::NoRandomVariables { case } => {
                write!(f, "Case `{case}` declares no random variables.")
            }
            FormError::UnknownEstimationMethod { name } => {
                write!(
                    f,
                    "Unknown estimation method `{name}`; valid options are case-insensitive \
                     'coeff' or 'matrix'."
                )
            }
            FormError::NotConverged { case, iterations, beta_change, residual } => {
                write!(
                    f,
                    "Design-point search for case `{case}` did not converge in {iterations} \
                     iterations (last beta change {beta_change}, scaled residual {residual})."
                )
            }
            FormError::DegenerateGradient { case, norm } => {
                write!(
                    f,
                    "Scaled limit-state gradient for case `{case}` is degenerate (norm {norm})."
                )
            }
            FormError::NonFiniteLimitState { case, value } => {
                write!(
                    f,
                    "Limit-state function for case `{case}` returned a non-finite value: {value}"
                )
            }
            FormError::Domain { case, source } => {
                write!(f, "Distribution failure in case `{case}`: {source}")
            }
            FormError::Optimizer { case, source } => {
                write!(f, "Optimizer failure in case `{case}`: {source}")
            }
        }
    }
}
