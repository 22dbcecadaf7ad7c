//! Central-difference gradients for scalar fields over `ndarray` vectors.
//!
//! Used by the design-point solvers (limit-state gradients) and the
//! constrained minimizer (constraint gradients). Steps are relative to the
//! coordinate magnitude with a unit floor, which keeps the truncation and
//! rounding errors balanced for coordinates anywhere between `1e-3` and
//! `1e6` in magnitude.
use crate::optimization::errors::{OptError, OptResult};
use ndarray::Array1;

/// Relative step for central differences; `eps^(1/3)` balances truncation
/// against cancellation for a twice-differentiable objective.
fn central_step(x: f64) -> f64 {
    f64::EPSILON.cbrt() * x.abs().max(1.0)
}

/// Central-difference gradient of `f` at `x`.
///
/// # Errors
/// [`OptError::NonFiniteGradient`] when any directional difference comes out
/// non-finite (typically because `f` returned NaN near `x`).
pub fn central_gradient<F>(f: &F, x: &Array1<f64>) -> OptResult<Array1<f64>>
where F: Fn(&Array1<f64>) -> f64 {
    let mut grad = Array1::zeros(x.len());
    let mut probe = x.clone();
    for i in 0..x.len() {
        let xi = x[i];
        let h = central_step(xi);
        probe[i] = xi + h;
        let forward = f(&probe);
        probe[i] = xi - h;
        let backward = f(&probe);
        probe[i] = xi;
        let slope = (forward - backward) / (2.0 * h);
        if !slope.is_finite() {
            return Err(OptError::NonFiniteGradient { index: i, value: slope });
        }
        grad[i] = slope;
    }
    Ok(grad)
}
