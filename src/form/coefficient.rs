//! Iterative design-point search by equivalent-normal projection.
//!
//! At each iteration the current standardized point is mapped to original
//! units through the exact marginal transforms, the limit state and its
//! central-difference gradient are evaluated there, the gradient is scaled by
//! the per-variable equivalent-normal standard deviations, and the next
//! iterate is the projection of the origin onto the linearized limit-state
//! hyperplane:
//!
//! `u_{k+1} = ((G . u_k - g(x_k)) / ||G||^2) G`,  `G_i = (dg/dx_i) sigma_eq,i`
//!
//! The reliability index is `||u||`; the sensitivity vector is
//! `alpha = -G / ||G||`, unit-norm and oriented toward the failure domain.
//! Convergence requires **both** a stable reliability index and a small
//! scaled limit-state residual; the iteration cap turns into
//! [`FormError::NotConverged`] carrying the last residuals.
use crate::combination::case::CombinationCase;
use crate::form::{
    design_point::DesignPoint,
    errors::{FormError, FormResult},
    limit_state::LimitState,
    solver::{evaluate, x_from_u, FormOptions},
};
use crate::optimization::finite_diff::central_gradient;
use ndarray::Array1;

/// Floor under the starting limit-state magnitude used to scale the residual
/// tolerance.
const SCALE_FLOOR: f64 = 1e-8;

pub(crate) fn solve(
    case: &CombinationCase, limit_state: &dyn LimitState, opts: &FormOptions,
) -> FormResult<DesignPoint> {
    let vars = case.variables();
    let n = vars.len();
    if n == 0 {
        return Err(FormError::NoRandomVariables { case: case.label().to_string() });
    }
    let names: Vec<String> = vars.iter().map(|v| v.name().to_string()).collect();

    // Start from the mean point.
    let mut u = Array1::zeros(n);
    for (i, var) in vars.iter().enumerate() {
        u[i] = var.to_standard_normal(var.mean());
    }
    let x0 = x_from_u(case, &u);
    let g0 = evaluate(case, limit_state, &x0)?;
    let scale = if g0.abs() > SCALE_FLOOR { g0.abs() } else { 1.0 };

    let objective = |xa: &Array1<f64>| limit_state.evaluate(&case.values_from(xa));
    let mut beta_prev = f64::INFINITY;
    let mut last_change = f64::INFINITY;
    let mut last_residual = f64::INFINITY;

    for iteration in 1..=opts.max_iter {
        let x = x_from_u(case, &u);
        let g_val = evaluate(case, limit_state, &x)?;

        let mut sigma_eq = Array1::zeros(n);
        for (i, var) in vars.iter().enumerate() {
            let (_, sigma) = var
                .equivalent_normal(x[i])
                .map_err(|e| FormError::domain(case.label(), e))?;
            sigma_eq[i] = sigma;
        }

        let grad_x = central_gradient(&objective, &x)
            .map_err(|e| FormError::optimizer(case.label(), e))?;
        let g_vec = &grad_x * &sigma_eq;
        let norm2 = g_vec.dot(&g_vec);
        if !norm2.is_finite() || norm2 <= f64::MIN_POSITIVE {
            return Err(FormError::DegenerateGradient {
                case: case.label().to_string(),
                norm: norm2.sqrt(),
            });
        }

        let projection = (g_vec.dot(&u) - g_val) / norm2;
        u = g_vec.mapv(|v| v * projection);
        let beta = u.dot(&u).sqrt();

        last_change = (beta - beta_prev).abs();
        last_residual = g_val.abs() / scale;
        if last_change < opts.tol_beta && last_residual < opts.tol_g {
            let x_star = x_from_u(case, &u);
            let residual = evaluate(case, limit_state, &x_star)?;
            let norm = norm2.sqrt();
            let alpha = g_vec.mapv(|v| -v / norm);
            return Ok(DesignPoint::new(
                case.label().to_string(),
                names,
                x_star,
                u,
                alpha,
                beta,
                residual,
                iteration,
            ));
        }
        beta_prev = beta;
    }

    Err(FormError::NotConverged {
        case: case.label().to_string(),
        iterations: opts.max_iter,
        beta_change: last_change,
        residual: last_residual,
    })
}
