//! Design-point search as a constrained minimization.
//!
//! The most-probable failure point is the solution of
//!
//! `min ||u||  subject to  g(x(u)) = 0`
//!
//! with `x(u)` the per-variable inverse standardizing transform. The search
//! is delegated to the external optimizer
//! ([`minimize_norm_on_surface`]); the reliability index is the objective at
//! the optimum, and the sensitivity vector is recovered from the optimizer's
//! multiplier through the stationarity condition `u = -lambda grad g`.
//!
//! The constraint is scaled by the limit-state magnitude at the median point
//! so the same tolerances work across problems of very different physical
//! units.
use crate::combination::case::CombinationCase;
use crate::form::{
    design_point::DesignPoint,
    errors::{FormError, FormResult},
    limit_state::LimitState,
    solver::{evaluate, x_from_u, FormOptions},
};
use crate::optimization::{constrained::minimize_norm_on_surface, finite_diff::central_gradient};
use ndarray::Array1;

/// Floor under the median limit-state magnitude used for constraint scaling.
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

    let u0 = Array1::zeros(n);
    let x_median = x_from_u(case, &u0);
    let g_median = evaluate(case, limit_state, &x_median)?;
    let scale = if g_median.abs() > SCALE_FLOOR { g_median.abs() } else { 1.0 };

    let constraint = |ua: &Array1<f64>| {
        let x = x_from_u(case, ua);
        limit_state.evaluate(&case.values_from(&x)) / scale
    };

    let outcome = minimize_norm_on_surface(&constraint, u0, &opts.constrained)
        .map_err(|e| FormError::optimizer(case.label(), e))?;
    let u = outcome.solution;
    let beta = outcome.objective;

    let grad_c = central_gradient(&constraint, &u)
        .map_err(|e| FormError::optimizer(case.label(), e))?;
    let direction = grad_c.mapv(|v| -outcome.multiplier * v);
    let norm = direction.dot(&direction).sqrt();
    let mut alpha = if norm.is_finite() && norm > 1e-12 {
        direction.mapv(|v| v / norm)
    } else if beta > 1e-12 {
        u.mapv(|v| v / beta)
    } else {
        return Err(FormError::DegenerateGradient { case: case.label().to_string(), norm });
    };
    // Orientation follows the failure-side design point.
    if alpha.dot(&u) < 0.0 {
        alpha.mapv_inplace(|v| -v);
    }

    let x_star = x_from_u(case, &u);
    let residual = evaluate(case, limit_state, &x_star)?;
    Ok(DesignPoint::new(
        case.label().to_string(),
        names,
        x_star,
        u,
        alpha,
        beta,
        residual,
        outcome.rounds,
    ))
}
