//! Marginal probability distributions for reliability models.
//!
//! Purpose
//! -------
//! Supply the distribution abstraction consumed by the load-combination
//! builder and the design-point solvers: named random variables with
//! quantile/CDF/PDF evaluation, the marginal standardizing transform to and
//! from standard-normal space, and equivalent-normal linearization.
//!
//! Key behaviors
//! -------------
//! - Moment-matching constructors per family (`normal`, `lognormal`,
//!   `gumbel`, `weibull`, ...) resolve distribution parameters from
//!   `(mean, stdv)` once, at setup time.
//! - `Constant` variables model deterministic quantities (design parameters,
//!   combination coefficients) as zero-dispersion degenerate marginals.
//! - All evaluation is pure; variables are shared read-only via `Arc`.
//!
//! Downstream usage
//! ----------------
//! - [`crate::combination`] groups variables into per-case evaluation sets.
//! - [`crate::form`] drives the transforms during the design-point search.
pub mod errors;
pub mod families;
pub mod variable;

pub use self::errors::{DistError, DistResult};
pub use self::families::{ContinuousModel, Marginal};
pub use self::variable::RandomVariable;
