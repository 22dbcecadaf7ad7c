//! The converged output of one design-point search.
use ndarray::Array1;

/// Most-probable failure point for one combination case at one trial value of
/// the design parameter.
///
/// Invariants (established by the solvers, never mutated afterwards):
/// - `x` and `u` are the same point expressed in original and
///   standardized-normal units, ordered like `names`.
/// - `beta >= 0` equals `||u||`.
/// - `alpha` is unit-norm and oriented toward the failure domain.
/// - `residual` is the limit-state value at `x`, numerically zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignPoint {
    case: String,
    names: Vec<String>,
    x: Array1<f64>,
    u: Array1<f64>,
    alpha: Array1<f64>,
    beta: f64,
    residual: f64,
    iterations: usize,
}

impl DesignPoint {
    pub(crate) fn new(
        case: String, names: Vec<String>, x: Array1<f64>, u: Array1<f64>, alpha: Array1<f64>,
        beta: f64, residual: f64, iterations: usize,
    ) -> Self {
        debug_assert_eq!(names.len(), x.len());
        debug_assert_eq!(names.len(), u.len());
        debug_assert_eq!(names.len(), alpha.len());
        debug_assert!((alpha.dot(&alpha).sqrt() - 1.0).abs() < 1e-6);
        Self { case, names, x, u, alpha, beta, residual, iterations }
    }

    /// Label of the combination case this point was solved for.
    pub fn case(&self) -> &str {
        &self.case
    }

    /// Random-variable names, in the order used by `x_star`, `u_star`, and
    /// `alpha`.
    pub fn variable_names(&self) -> &[String] {
        &self.names
    }

    /// Reliability index `||u*||`.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Design point in original units.
    pub fn x_star(&self) -> &Array1<f64> {
        &self.x
    }

    /// Design point in standardized-normal units.
    pub fn u_star(&self) -> &Array1<f64> {
        &self.u
    }

    /// Unit sensitivity vector (direction cosines of the limit-state surface
    /// normal at the design point).
    pub fn alpha(&self) -> &Array1<f64> {
        &self.alpha
    }

    /// Limit-state value at `x_star`; numerically zero after convergence.
    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// Inner iterations (or multiplier rounds, for the matrix strategy) spent
    /// reaching convergence.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Original-units coordinate of one variable, by name.
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.position(name).map(|i| self.x[i])
    }

    /// Sensitivity component of one variable, by name.
    pub fn alpha_of(&self, name: &str) -> Option<f64> {
        self.position(name).map(|i| self.alpha[i])
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}
