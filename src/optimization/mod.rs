//! Optimization helpers shared by the solvers and the calibration loop.
//!
//! Purpose
//! -------
//! Wrap the external `argmin` solvers behind small, typed entry points:
//! scalar root finding with automatic bracketing ([`root`]), minimum-norm
//! points on a constraint surface ([`constrained`]), and central-difference
//! gradients ([`finite_diff`]). Backend failures are normalized into
//! [`errors::OptError`] values carrying a human-readable status; success is
//! reported through plain data structs.
//!
//! Downstream usage
//! ----------------
//! - [`crate::form`] uses the constrained minimizer (matrix strategy) and the
//!   gradient helper (coefficient strategy).
//! - [`crate::calibration`] uses bracketing plus Brent for the outer
//!   design-parameter search.
//! - [`crate::distributions`] root-solves shape parameters from moment
//!   identities.
pub mod constrained;
pub mod errors;
pub mod finite_diff;
pub mod root;

pub use self::constrained::{minimize_norm_on_surface, ConstrainedOptions, ConstrainedOutcome};
pub use self::errors::{OptError, OptResult};
pub use self::finite_diff::central_gradient;
pub use self::root::{expand_bracket, find_root, RootOptions};
