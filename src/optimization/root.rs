//! Scalar root finding: geometric bracket expansion plus Brent's method.
//!
//! This is the 1-D search used by the outer calibration loop (driving the
//! per-case reliability index to its target), by the direct design-value
//! update (solving the limit state for the design parameter), and by the
//! moment-matching shape solves in the distribution layer. Brent iterations
//! run through `argmin`'s [`BrentRoot`] solver; this module contributes the
//! bracketing and the error normalization around it.
use crate::optimization::errors::{OptError, OptResult};
use argmin::core::{CostFunction, Error, Executor, State, TerminationReason, TerminationStatus};
use argmin::solver::brent::BrentRoot;

/// Growth factor for the bracket-expansion walk.
const EXPANSION_FACTOR: f64 = 1.6;

/// Maximum number of expansion steps before giving up on a sign change.
const MAX_EXPANSIONS: usize = 60;

/// Tolerance and iteration cap for a Brent root search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootOptions {
    pub tol: f64,
    pub max_iter: usize,
}

impl RootOptions {
    /// Construct validated root-search options.
    ///
    /// # Errors
    /// - [`OptError::InvalidTolerance`] for a non-finite or non-positive `tol`.
    /// - [`OptError::InvalidMaxIter`] for `max_iter == 0`.
    pub fn new(tol: f64, max_iter: usize) -> OptResult<Self> {
        if !tol.is_finite() || tol <= 0.0 {
            return Err(OptError::InvalidTolerance {
                tol,
                reason: "Root tolerance must be finite and > 0.",
            });
        }
        if max_iter == 0 {
            return Err(OptError::InvalidMaxIter { max_iter });
        }
        Ok(Self { tol, max_iter })
    }
}

impl Default for RootOptions {
    fn default() -> Self {
        Self { tol: 1e-11, max_iter: 100 }
    }
}

/// Adapter exposing a fallible scalar function as an `argmin` problem.
struct ScalarProblem<'a, F: Fn(f64) -> OptResult<f64>> {
    f: &'a F,
}

impl<'a, F: Fn(f64) -> OptResult<f64>> CostFunction for ScalarProblem<'a, F> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        let value = (self.f)(*x)?;
        if !value.is_finite() {
            return Err(OptError::NonFiniteObjective { x: *x, value }.into());
        }
        Ok(value)
    }
}

/// Expand a bracket around `x0` until `f` changes sign.
///
/// Starting from `[x0, x0 + step]`, the endpoint with the larger magnitude of
/// `f` is pushed outward geometrically (the classic downhill walk), so the
/// interval grows toward the nearest root regardless of which side it lies
/// on. Returns the bracket ordered as `(lo, hi)`.
///
/// # Errors
/// - Propagates objective failures from `f`.
/// - [`OptError::InvalidBracket`] when `step` is not finite and non-zero.
/// - [`OptError::BracketExpansionFailed`] after [`MAX_EXPANSIONS`] steps
///   without a sign change.
pub fn expand_bracket<F>(f: &F, x0: f64, step: f64) -> OptResult<(f64, f64)>
where F: Fn(f64) -> OptResult<f64> {
    if !step.is_finite() || step == 0.0 {
        return Err(OptError::InvalidBracket {
            lo: x0,
            hi: x0 + step,
            reason: "Expansion step must be finite and non-zero.",
        });
    }
    let mut a = x0;
    let mut fa = f(a)?;
    if fa == 0.0 {
        return Ok((a, a));
    }
    let mut b = x0 + step;
    let mut fb = f(b)?;
    for _ in 0..MAX_EXPANSIONS {
        if fa * fb < 0.0 {
            return Ok(if a < b { (a, b) } else { (b, a) });
        }
        if fb == 0.0 {
            return Ok((b, b));
        }
        if fa.abs() < fb.abs() {
            let next = a - EXPANSION_FACTOR * (b - a);
            b = a;
            fb = fa;
            a = next;
            fa = f(a)?;
        } else {
            let next = b + EXPANSION_FACTOR * (b - a);
            a = b;
            fa = fb;
            b = next;
            fb = f(b)?;
        }
    }
    let (lo, hi, f_lo, f_hi) = if a < b { (a, b, fa, fb) } else { (b, a, fb, fa) };
    Err(OptError::BracketExpansionFailed { lo, hi, f_lo, f_hi, tries: MAX_EXPANSIONS })
}

/// Find a root of `f` inside `bracket` with Brent's method.
///
/// A degenerate bracket (`lo == hi`) is taken as an already-located root and
/// returned as-is; otherwise `f(lo)` and `f(hi)` must straddle zero (use
/// [`expand_bracket`] first).
///
/// # Errors
/// - Propagates objective failures from `f`.
/// - [`OptError::NotConverged`] when the iteration cap fires before the
///   Brent interval collapses.
/// - [`OptError::SolverFailed`] for backend failures (including an
///   unbracketed root).
pub fn find_root<F>(f: &F, bracket: (f64, f64), opts: &RootOptions) -> OptResult<f64>
where F: Fn(f64) -> OptResult<f64> {
    let (lo, hi) = if bracket.0 <= bracket.1 { bracket } else { (bracket.1, bracket.0) };
    if !(lo.is_finite() && hi.is_finite()) {
        return Err(OptError::InvalidBracket {
            lo,
            hi,
            reason: "Bracket endpoints must be finite.",
        });
    }
    if lo == hi {
        return Ok(lo);
    }
    let problem = ScalarProblem { f };
    let solver = BrentRoot::new(lo, hi, opts.tol);
    let result = Executor::new(problem, solver)
        .configure(|state| state.max_iters(opts.max_iter as u64))
        .run()
        .map_err(OptError::from)?;
    let state = result.state();
    if let TerminationStatus::Terminated(TerminationReason::MaxItersReached) =
        state.get_termination_status()
    {
        return Err(OptError::NotConverged {
            iterations: state.get_iter() as usize,
            residual: state.get_best_cost(),
        });
    }
    state.get_best_param().copied().ok_or(OptError::MissingSolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn brent_finds_sqrt_two() {
        let f = |x: f64| -> OptResult<f64> { Ok(x * x - 2.0) };
        let root = find_root(&f, (0.0, 2.0), &RootOptions::default()).expect("bracketed root");
        assert_abs_diff_eq!(root, 2.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn expansion_walks_uphill_to_a_far_root() {
        // Root at x = 10, start far below with a small step.
        let f = |x: f64| -> OptResult<f64> { Ok(x - 10.0) };
        let (lo, hi) = expand_bracket(&f, 0.5, 0.25).expect("expansion should succeed");
        assert!(lo <= 10.0 && 10.0 <= hi, "bracket [{lo}, {hi}] must contain the root");
        let root = find_root(&f, (lo, hi), &RootOptions::default()).unwrap();
        assert_abs_diff_eq!(root, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn expansion_also_walks_downhill() {
        let f = |x: f64| -> OptResult<f64> { Ok(x + 4.0) };
        let (lo, hi) = expand_bracket(&f, 1.0, 0.5).expect("expansion should succeed");
        assert!(lo <= -4.0 && -4.0 <= hi);
    }

    #[test]
    fn expansion_fails_without_a_sign_change() {
        let f = |x: f64| -> OptResult<f64> { Ok(x * x + 1.0) };
        assert!(matches!(
            expand_bracket(&f, 0.0, 1.0),
            Err(OptError::BracketExpansionFailed { .. })
        ));
    }

    #[test]
    fn objective_failures_propagate_through_the_executor() {
        let f = |_x: f64| -> OptResult<f64> {
            Err(OptError::ObjectiveFailed { status: "inner solve failed".to_string() })
        };
        assert!(matches!(
            find_root(&f, (0.0, 1.0), &RootOptions::default()),
            Err(OptError::SolverFailed { .. })
        ));
    }
}
