//! Minimum-norm point on a constraint surface, via an augmented Lagrangian.
//!
//! Solves `min 0.5 ||u||^2  subject to  c(u) = 0` by looping multiplier
//! updates around `argmin`'s L-BFGS with a More–Thuente line search:
//!
//! `L(u) = 0.5 ||u||^2 + lambda c(u) + 0.5 mu c(u)^2`
//!
//! After each inner minimization the multiplier absorbs the remaining
//! constraint violation (`lambda += mu c(u)`); the penalty weight grows only
//! when the violation stalls. This is the standard formulation of the
//! design-point search: the minimizer is the most-probable failure point, the
//! objective at the optimum is the reliability index, and the multiplier
//! fixes the sensitivity direction through the stationarity condition
//! `u = -lambda grad c(u)`.
use crate::optimization::{
    errors::{OptError, OptResult},
    finite_diff::central_gradient,
};
use argmin::core::{CostFunction, Error, Executor, Gradient, State};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use ndarray::Array1;

/// Options for the augmented-Lagrangian loop.
///
/// - `tol_constraint`: admissible |c(u)| at the solution.
/// - `tol_step`: admissible movement of `u` between multiplier updates.
/// - `max_rounds`: cap on multiplier updates.
/// - `inner_max_iter`: L-BFGS iteration cap per round.
/// - `initial_penalty` / `penalty_growth` / `max_penalty`: penalty schedule;
///   the weight multiplies by `penalty_growth` whenever a round fails to cut
///   the violation to a quarter of its previous value.
/// - `lbfgs_mem`: L-BFGS memory length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstrainedOptions {
    pub tol_constraint: f64,
    pub tol_step: f64,
    pub max_rounds: usize,
    pub inner_max_iter: usize,
    pub initial_penalty: f64,
    pub penalty_growth: f64,
    pub max_penalty: f64,
    pub lbfgs_mem: usize,
}

impl ConstrainedOptions {
    /// Validated constructor.
    ///
    /// # Errors
    /// [`OptError::InvalidTolerance`] / [`OptError::InvalidMaxIter`] for
    /// non-positive tolerances, caps, or penalty parameters.
    pub fn new(
        tol_constraint: f64, tol_step: f64, max_rounds: usize, inner_max_iter: usize,
        initial_penalty: f64, penalty_growth: f64, max_penalty: f64, lbfgs_mem: usize,
    ) -> OptResult<Self> {
        for (tol, reason) in [
            (tol_constraint, "Constraint tolerance must be finite and > 0."),
            (tol_step, "Step tolerance must be finite and > 0."),
            (initial_penalty, "Initial penalty must be finite and > 0."),
            (max_penalty, "Penalty cap must be finite and > 0."),
        ] {
            if !tol.is_finite() || tol <= 0.0 {
                return Err(OptError::InvalidTolerance { tol, reason });
            }
        }
        if !penalty_growth.is_finite() || penalty_growth <= 1.0 {
            return Err(OptError::InvalidTolerance {
                tol: penalty_growth,
                reason: "Penalty growth must be finite and > 1.",
            });
        }
        if max_rounds == 0 || inner_max_iter == 0 || lbfgs_mem == 0 {
            return Err(OptError::InvalidMaxIter { max_iter: 0 });
        }
        Ok(Self {
            tol_constraint,
            tol_step,
            max_rounds,
            inner_max_iter,
            initial_penalty,
            penalty_growth,
            max_penalty,
            lbfgs_mem,
        })
    }
}

impl Default for ConstrainedOptions {
    fn default() -> Self {
        Self {
            tol_constraint: 1e-9,
            tol_step: 1e-7,
            max_rounds: 30,
            inner_max_iter: 200,
            initial_penalty: 10.0,
            penalty_growth: 10.0,
            max_penalty: 1e10,
            lbfgs_mem: 7,
        }
    }
}

/// Result of [`minimize_norm_on_surface`].
///
/// - `solution`: minimizer `u*`.
/// - `objective`: `||u*||` (not the squared or penalized value).
/// - `multiplier`: converged Lagrange multiplier.
/// - `constraint_residual`: `c(u*)`.
/// - `rounds`: multiplier updates performed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstrainedOutcome {
    pub solution: Array1<f64>,
    pub objective: f64,
    pub multiplier: f64,
    pub constraint_residual: f64,
    pub rounds: usize,
}

/// One augmented-Lagrangian subproblem with frozen multiplier and penalty.
struct AugmentedProblem<'a, C: Fn(&Array1<f64>) -> f64> {
    constraint: &'a C,
    multiplier: f64,
    penalty: f64,
}

impl<'a, C: Fn(&Array1<f64>) -> f64> CostFunction for AugmentedProblem<'a, C> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        let u = Array1::from(param.clone());
        let c = (self.constraint)(&u);
        if !c.is_finite() {
            return Err(OptError::ObjectiveFailed {
                status: format!("constraint returned a non-finite value: {c}"),
            }
            .into());
        }
        Ok(0.5 * u.dot(&u) + self.multiplier * c + 0.5 * self.penalty * c * c)
    }
}

impl<'a, C: Fn(&Array1<f64>) -> f64> Gradient for AugmentedProblem<'a, C> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, Error> {
        let u = Array1::from(param.clone());
        let c = (self.constraint)(&u);
        if !c.is_finite() {
            return Err(OptError::ObjectiveFailed {
                status: format!("constraint returned a non-finite value: {c}"),
            }
            .into());
        }
        let grad_c = central_gradient(self.constraint, &u).map_err(Error::from)?;
        let grad = &u + &(grad_c * (self.multiplier + self.penalty * c));
        Ok(grad.to_vec())
    }
}

/// Minimize `0.5 ||u||^2` subject to `constraint(u) = 0`.
///
/// # Behavior
/// - Runs up to `opts.max_rounds` augmented-Lagrangian rounds, each an
///   L-BFGS minimization capped at `opts.inner_max_iter` iterations.
/// - Declares convergence when the constraint violation and the inter-round
///   step are both inside tolerance.
/// - If an inner solve fails after the iterate already sits on the surface
///   (line searches are prone to this on the flat tail), the current iterate
///   is kept and the loop continues; a first-round failure propagates.
///
/// # Errors
/// - [`OptError::SolverFailed`] for unrecoverable backend failures.
/// - [`OptError::NotConverged`] when the round cap fires.
pub fn minimize_norm_on_surface<C>(
    constraint: &C, u0: Array1<f64>, opts: &ConstrainedOptions,
) -> OptResult<ConstrainedOutcome>
where C: Fn(&Array1<f64>) -> f64 {
    let mut u = u0;
    let mut multiplier = 0.0;
    let mut penalty = opts.initial_penalty;
    let mut last_violation = f64::INFINITY;

    for round in 1..=opts.max_rounds {
        let problem =
            AugmentedProblem { constraint, multiplier, penalty };
        let linesearch = MoreThuenteLineSearch::new();
        let solver = LBFGS::new(linesearch, opts.lbfgs_mem);
        let run = Executor::new(problem, solver)
            .configure(|state| state.param(u.to_vec()).max_iters(opts.inner_max_iter as u64))
            .run();
        let u_new = match run {
            Ok(result) => {
                let mut state = result.state().clone();
                match state.take_best_param() {
                    Some(best) => Array1::from(best),
                    None => u.clone(),
                }
            }
            Err(err) => {
                let on_surface = (constraint)(&u).abs() <= opts.tol_constraint * 1e3;
                if round > 1 && on_surface {
                    u.clone()
                } else {
                    return Err(OptError::SolverFailed { status: err.to_string() });
                }
            }
        };

        let violation = (constraint)(&u_new);
        if !violation.is_finite() {
            return Err(OptError::ObjectiveFailed {
                status: format!("constraint returned a non-finite value: {violation}"),
            });
        }
        let step = (&u_new - &u).mapv(|v| v * v).sum().sqrt();
        multiplier += penalty * violation;

        if violation.abs() <= opts.tol_constraint && step <= opts.tol_step {
            let objective = u_new.dot(&u_new).sqrt();
            return Ok(ConstrainedOutcome {
                solution: u_new,
                objective,
                multiplier,
                constraint_residual: violation,
                rounds: round,
            });
        }

        if violation.abs() > 0.25 * last_violation {
            penalty = (penalty * opts.penalty_growth).min(opts.max_penalty);
        }
        last_violation = violation.abs();
        u = u_new;
    }
    Err(OptError::NotConverged { iterations: opts.max_rounds, residual: last_violation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn recovers_the_projection_onto_a_linear_surface() {
        // min ||u|| s.t. u0 + u1 = 3 has the closed-form solution (1.5, 1.5)
        // with norm 3/sqrt(2).
        let constraint = |u: &Array1<f64>| u[0] + u[1] - 3.0;
        let out = minimize_norm_on_surface(&constraint, array![0.0, 0.0], &Default::default())
            .expect("linear surface should converge");
        assert_abs_diff_eq!(out.solution[0], 1.5, epsilon = 1e-5);
        assert_abs_diff_eq!(out.solution[1], 1.5, epsilon = 1e-5);
        assert_abs_diff_eq!(out.objective, 3.0 / 2.0_f64.sqrt(), epsilon = 1e-5);
        assert!(out.constraint_residual.abs() <= 1e-9);
    }

    #[test]
    fn multiplier_satisfies_stationarity() {
        // At the optimum u = -lambda grad c, so for c = u0 + u1 - 3 the
        // multiplier must approach -1.5.
        let constraint = |u: &Array1<f64>| u[0] + u[1] - 3.0;
        let out = minimize_norm_on_surface(&constraint, array![0.0, 0.0], &Default::default())
            .expect("linear surface should converge");
        assert_abs_diff_eq!(out.multiplier, -1.5, epsilon = 1e-4);
    }

    #[test]
    fn handles_a_curved_surface() {
        // min ||u|| s.t. u0^2 + u1 = 2 from the origin; the optimum satisfies
        // the stationarity system u = -lambda (2 u0, 1).
        let constraint = |u: &Array1<f64>| u[0] * u[0] + u[1] - 2.0;
        let out = minimize_norm_on_surface(&constraint, array![0.0, 0.0], &Default::default())
            .expect("curved surface should converge");
        assert!(out.constraint_residual.abs() <= 1e-8);
        // Stationarity: u1 = -lambda and u0 (1 + 2 lambda) = 0; with the
        // origin start, the solver lands on the u0 = 0 branch.
        assert_abs_diff_eq!(out.solution[0], 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(out.solution[1], 2.0, epsilon = 1e-4);
    }

    #[test]
    fn rejects_a_degenerate_penalty_schedule() {
        assert!(matches!(
            ConstrainedOptions::new(1e-9, 1e-7, 30, 200, 10.0, 1.0, 1e10, 7),
            Err(OptError::InvalidTolerance { .. })
        ));
    }
}
