//! Strategy selection and shared plumbing for the design-point search.
//!
//! The search itself is one capability with two interchangeable
//! implementations, selected by [`EstimationMethod`]:
//! - [`EstimationMethod::Coefficient`]: the iterative equivalent-normal
//!   projection in [`crate::form::coefficient`].
//! - [`EstimationMethod::Matrix`]: the constrained minimization in
//!   [`crate::form::matrix`].
//!
//! Both consume one [`CombinationCase`] plus the shared limit-state function
//! and return a [`DesignPoint`]; for the same inputs they agree on the
//! reliability index and the design point within solver tolerance.
use crate::combination::case::CombinationCase;
use crate::form::{
    coefficient,
    design_point::DesignPoint,
    errors::{FormError, FormResult},
    limit_state::LimitState,
    matrix,
};
use crate::optimization::constrained::ConstrainedOptions;
use ndarray::Array1;
use std::str::FromStr;

/// Which design-point strategy the solver runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimationMethod {
    /// Iterative equivalent-normal projection (Rackwitz–Fiessler style).
    Coefficient,
    /// Constrained minimization of `||u||` on the limit-state surface.
    Matrix,
}

impl FromStr for EstimationMethod {
    type Err = FormError;

    /// Parse a strategy name (case-insensitive): `"coeff"`/`"coefficient"`
    /// or `"matrix"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "coeff" | "coefficient" => Ok(EstimationMethod::Coefficient),
            "matrix" => Ok(EstimationMethod::Matrix),
            _ => Err(FormError::UnknownEstimationMethod { name: s.to_string() }),
        }
    }
}

/// Tolerances and caps for one design-point solve.
///
/// - `tol_beta`: admissible change of the reliability index between
///   coefficient iterations.
/// - `tol_g`: admissible limit-state residual, scaled by the value at the
///   starting point.
/// - `max_iter`: coefficient-iteration cap.
/// - `constrained`: options forwarded to the matrix strategy's
///   augmented-Lagrangian loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormOptions {
    pub tol_beta: f64,
    pub tol_g: f64,
    pub max_iter: usize,
    pub constrained: ConstrainedOptions,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            tol_beta: 1e-8,
            tol_g: 1e-8,
            max_iter: 200,
            constrained: ConstrainedOptions::default(),
        }
    }
}

/// Front-end dispatching one of the two design-point strategies.
#[derive(Debug, Clone, Copy)]
pub struct DesignPointSolver {
    method: EstimationMethod,
    options: FormOptions,
}

impl DesignPointSolver {
    pub fn new(method: EstimationMethod) -> Self {
        Self { method, options: FormOptions::default() }
    }

    pub fn with_options(method: EstimationMethod, options: FormOptions) -> Self {
        Self { method, options }
    }

    pub fn method(&self) -> EstimationMethod {
        self.method
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Find the most-probable failure point of `limit_state` for `case`.
    ///
    /// # Errors
    /// See [`FormError`]; convergence failures carry the case label and the
    /// iteration count, domain failures the offending variable.
    pub fn solve(
        &self, case: &CombinationCase, limit_state: &dyn LimitState,
    ) -> FormResult<DesignPoint> {
        match self.method {
            EstimationMethod::Coefficient => coefficient::solve(case, limit_state, &self.options),
            EstimationMethod::Matrix => matrix::solve(case, limit_state, &self.options),
        }
    }
}

// ---- Shared helpers for both strategies ----

/// Map a standardized-space point to original units, variable by variable.
pub(crate) fn x_from_u(case: &CombinationCase, u: &Array1<f64>) -> Array1<f64> {
    Array1::from_iter(
        case.variables().iter().zip(u.iter()).map(|(var, ui)| var.from_standard_normal(*ui)),
    )
}

/// Evaluate the limit state at `x`, rejecting non-finite values.
pub(crate) fn evaluate(
    case: &CombinationCase, limit_state: &dyn LimitState, x: &Array1<f64>,
) -> FormResult<f64> {
    let value = limit_state.evaluate(&case.values_from(x));
    if !value.is_finite() {
        return Err(FormError::NonFiniteLimitState { case: case.label().to_string(), value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::RandomVariable;
    use crate::form::limit_state::VariableValues;
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    /// Two independent normals with a linear limit state have the closed-form
    /// reliability index (mu_R - mu_S) / sqrt(sigma_R^2 + sigma_S^2).
    fn two_normal_case() -> CombinationCase {
        let r = Arc::new(RandomVariable::normal("R", 10.0, 1.0).unwrap());
        let s = Arc::new(RandomVariable::normal("S", 5.0, 1.0).unwrap());
        CombinationCase::new("linear".to_string(), vec![r, s], vec![])
    }

    #[test]
    fn coefficient_strategy_matches_the_closed_form() {
        let case = two_normal_case();
        let g = |v: &VariableValues| v["R"] - v["S"];
        let solver = DesignPointSolver::new(EstimationMethod::Coefficient);
        let dp = solver.solve(&case, &g).expect("linear problem converges");
        assert_abs_diff_eq!(dp.beta(), 5.0 / 2.0_f64.sqrt(), epsilon = 1e-6);
        assert_abs_diff_eq!(dp.residual(), 0.0, epsilon = 1e-6);
        // alpha points toward failure: resistance down, load up.
        assert!(dp.alpha_of("R").unwrap() < 0.0);
        assert!(dp.alpha_of("S").unwrap() > 0.0);
        assert_abs_diff_eq!(dp.alpha().dot(dp.alpha()).sqrt(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn matrix_strategy_matches_the_closed_form() {
        let case = two_normal_case();
        let g = |v: &VariableValues| v["R"] - v["S"];
        let solver = DesignPointSolver::new(EstimationMethod::Matrix);
        let dp = solver.solve(&case, &g).expect("linear problem converges");
        assert_abs_diff_eq!(dp.beta(), 5.0 / 2.0_f64.sqrt(), epsilon = 1e-5);
        assert_abs_diff_eq!(dp.value_of("R").unwrap(), 7.5, epsilon = 1e-4);
        assert_abs_diff_eq!(dp.value_of("S").unwrap(), 7.5, epsilon = 1e-4);
    }

    #[test]
    fn both_strategies_agree_on_a_non_normal_case() {
        let r = Arc::new(RandomVariable::lognormal("R", 1.0, 0.15).unwrap());
        let q = Arc::new(RandomVariable::gumbel("Q1", 1.0, 0.2).unwrap());
        let case = CombinationCase::new(
            "Q1_max".to_string(),
            vec![r, q],
            vec![("z".to_string(), 2.5)],
        );
        let g = |v: &VariableValues| v["z"] * v["R"] - v["Q1"];
        let coeff = DesignPointSolver::new(EstimationMethod::Coefficient)
            .solve(&case, &g)
            .expect("coefficient strategy converges");
        let matrix = DesignPointSolver::new(EstimationMethod::Matrix)
            .solve(&case, &g)
            .expect("matrix strategy converges");
        assert_abs_diff_eq!(coeff.beta(), matrix.beta(), epsilon = 1e-3);
        for name in ["R", "Q1"] {
            let a = coeff.value_of(name).unwrap();
            let b = matrix.value_of(name).unwrap();
            assert!((a - b).abs() <= 1e-3 * a.abs().max(1.0), "{name}: {a} vs {b}");
        }
    }

    #[test]
    fn method_names_parse_case_insensitively() {
        assert_eq!("COEFF".parse::<EstimationMethod>().unwrap(), EstimationMethod::Coefficient);
        assert_eq!("matrix".parse::<EstimationMethod>().unwrap(), EstimationMethod::Matrix);
        assert!(matches!(
            "sorm".parse::<EstimationMethod>(),
            Err(FormError::UnknownEstimationMethod { .. })
        ));
    }

    #[test]
    fn empty_case_is_rejected() {
        let case = CombinationCase::new("empty".to_string(), vec![], vec![]);
        let g = |_: &VariableValues| 1.0;
        let solver = DesignPointSolver::new(EstimationMethod::Coefficient);
        assert!(matches!(
            solver.solve(&case, &g),
            Err(FormError::NoRandomVariables { .. })
        ));
    }
}
