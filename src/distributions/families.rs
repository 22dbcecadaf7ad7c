//! Marginal distribution families for reliability analysis.
//!
//! This module defines [`Marginal`], the enumeration of supported marginal
//! distributions for random variables entering a limit-state function. Each
//! variant stores fully-resolved parameters; moment matching from
//! `(mean, stdv)` happens in the [`RandomVariable`](super::RandomVariable)
//! constructors before a variant is built.
//!
//! ## Families
//! - Normal, Lognormal, Gamma, Uniform, Beta (general support), Chi-square:
//!   backed by `statrs`.
//! - Shifted Exponential and Shifted Rayleigh: closed forms.
//! - Extreme-value types: Type-I largest (= Gumbel) and smallest, Type-II
//!   largest (Fréchet) and Type-III smallest (Weibull with lower bound), all
//!   in closed form. Type-II/III shape parameters are recovered from the
//!   coefficient of variation by a bracketed root-solve on the Γ-moment
//!   identity (see [`solve_type_ii_shape`] / [`solve_type_iii_shape`]).
//! - `Library`: any statrs-compatible continuous distribution behind a trait
//!   object, for families this crate does not name.
//! - `Constant`: degenerate zero-dispersion variable.
//!
//! ## Numerics
//! - Log-gamma differences are used for the Γ-moment identities.
//! - CDFs are total on the real line (0/1 outside support); quantile
//!   functions assume `p ∈ (0, 1)`, which callers validate.
use crate::optimization::{
    errors::OptResult,
    root::{find_root, RootOptions},
};
use statrs::distribution::{
    Beta, ChiSquared, Continuous, ContinuousCDF, Gamma, LogNormal, Normal, Uniform,
};
use statrs::function::gamma::ln_gamma;
use statrs::statistics::Distribution as Moments;
use std::sync::Arc;

/// Euler–Mascheroni constant, used by the Type-I moment relations.
pub(crate) const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

/// Interface for user-supplied, library-backed continuous marginals.
///
/// Blanket-implemented for every statrs distribution that exposes a density,
/// a CDF with quantile, and first/second moments, so a caller can hand any
/// such value straight to [`RandomVariable::library`](super::RandomVariable).
pub trait ContinuousModel: Send + Sync {
    fn cdf(&self, x: f64) -> f64;
    fn pdf(&self, x: f64) -> f64;
    fn inverse_cdf(&self, p: f64) -> f64;
    fn mean(&self) -> Option<f64>;
    fn std_dev(&self) -> Option<f64>;
}

impl<D> ContinuousModel for D
where D: Continuous<f64, f64> + ContinuousCDF<f64, f64> + Moments<f64> + Send + Sync
{
    fn cdf(&self, x: f64) -> f64 {
        ContinuousCDF::cdf(self, x)
    }

    fn pdf(&self, x: f64) -> f64 {
        Continuous::pdf(self, x)
    }

    fn inverse_cdf(&self, p: f64) -> f64 {
        ContinuousCDF::inverse_cdf(self, p)
    }

    fn mean(&self) -> Option<f64> {
        Moments::mean(self)
    }

    fn std_dev(&self) -> Option<f64> {
        Moments::std_dev(self)
    }
}

/// Marginal distribution of one random variable, with resolved parameters.
#[derive(Clone)]
pub enum Marginal {
    Normal(Normal),
    Lognormal(LogNormal),
    Gamma(Gamma),
    Uniform(Uniform),
    /// Beta on a general support `[lower, upper]`; `inner` lives on `[0, 1]`.
    Beta { inner: Beta, lower: f64, upper: f64 },
    ChiSquare(ChiSquared),
    /// `F(x) = 1 - exp(-rate (x - shift))` for `x >= shift`.
    ShiftedExponential { rate: f64, shift: f64 },
    /// `F(x) = 1 - exp(-(x - shift)^2 / (2 sigma^2))` for `x >= shift`.
    ShiftedRayleigh { sigma: f64, shift: f64 },
    /// Gumbel / Type-I largest value: `F(x) = exp(-exp(-(x - location)/scale))`.
    TypeILargest { location: f64, scale: f64 },
    /// Type-I smallest value: `F(x) = 1 - exp(-exp((x - location)/scale))`.
    TypeISmallest { location: f64, scale: f64 },
    /// Fréchet / Type-II largest value: `F(x) = exp(-(scale/x)^shape)` for `x > 0`.
    TypeIILargest { scale: f64, shape: f64 },
    /// Weibull / Type-III smallest value with lower bound:
    /// `F(x) = 1 - exp(-((x - lower)/(scale - lower))^shape)` for `x >= lower`.
    TypeIIISmallest { scale: f64, shape: f64, lower: f64 },
    /// Library-backed continuous distribution.
    Library(Arc<dyn ContinuousModel>),
    /// Degenerate zero-dispersion variable.
    Constant(f64),
}

impl std::fmt::Debug for Marginal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Marginal::Normal(d) => f.debug_tuple("Normal").field(d).finish(),
            Marginal::Lognormal(d) => f.debug_tuple("Lognormal").field(d).finish(),
            Marginal::Gamma(d) => f.debug_tuple("Gamma").field(d).finish(),
            Marginal::Uniform(d) => f.debug_tuple("Uniform").field(d).finish(),
            Marginal::Beta { inner, lower, upper } => f
                .debug_struct("Beta")
                .field("inner", inner)
                .field("lower", lower)
                .field("upper", upper)
                .finish(),
            Marginal::ChiSquare(d) => f.debug_tuple("ChiSquare").field(d).finish(),
            Marginal::ShiftedExponential { rate, shift } => f
                .debug_struct("ShiftedExponential")
                .field("rate", rate)
                .field("shift", shift)
                .finish(),
            Marginal::ShiftedRayleigh { sigma, shift } => f
                .debug_struct("ShiftedRayleigh")
                .field("sigma", sigma)
                .field("shift", shift)
                .finish(),
            Marginal::TypeILargest { location, scale } => f
                .debug_struct("TypeILargest")
                .field("location", location)
                .field("scale", scale)
                .finish(),
            Marginal::TypeISmallest { location, scale } => f
                .debug_struct("TypeISmallest")
                .field("location", location)
                .field("scale", scale)
                .finish(),
            Marginal::TypeIILargest { scale, shape } => f
                .debug_struct("TypeIILargest")
                .field("scale", scale)
                .field("shape", shape)
                .finish(),
            Marginal::TypeIIISmallest { scale, shape, lower } => f
                .debug_struct("TypeIIISmallest")
                .field("scale", scale)
                .field("shape", shape)
                .field("lower", lower)
                .finish(),
            Marginal::Library(_) => f.write_str("Library(..)"),
            Marginal::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
        }
    }
}

impl Marginal {
    /// Cumulative distribution function, total on the real line.
    ///
    /// statrs-backed arms use fully-qualified calls: their types implement
    /// both the statrs traits and the blanket [`ContinuousModel`], so plain
    /// method syntax would be ambiguous.
    pub fn cdf(&self, x: f64) -> f64 {
        match self {
            Marginal::Normal(d) => ContinuousCDF::cdf(d, x),
            Marginal::Lognormal(d) => {
                if x <= 0.0 {
                    0.0
                } else {
                    ContinuousCDF::cdf(d, x)
                }
            }
            Marginal::Gamma(d) => {
                if x <= 0.0 {
                    0.0
                } else {
                    ContinuousCDF::cdf(d, x)
                }
            }
            Marginal::Uniform(d) => ContinuousCDF::cdf(d, x),
            Marginal::Beta { inner, lower, upper } => {
                if x <= *lower {
                    0.0
                } else if x >= *upper {
                    1.0
                } else {
                    ContinuousCDF::cdf(inner, (x - lower) / (upper - lower))
                }
            }
            Marginal::ChiSquare(d) => {
                if x <= 0.0 {
                    0.0
                } else {
                    ContinuousCDF::cdf(d, x)
                }
            }
            Marginal::ShiftedExponential { rate, shift } => {
                if x <= *shift {
                    0.0
                } else {
                    1.0 - (-rate * (x - shift)).exp()
                }
            }
            Marginal::ShiftedRayleigh { sigma, shift } => {
                if x <= *shift {
                    0.0
                } else {
                    let t = (x - shift) / sigma;
                    1.0 - (-0.5 * t * t).exp()
                }
            }
            Marginal::TypeILargest { location, scale } => {
                (-(-(x - location) / scale).exp()).exp()
            }
            Marginal::TypeISmallest { location, scale } => {
                1.0 - (-((x - location) / scale).exp()).exp()
            }
            Marginal::TypeIILargest { scale, shape } => {
                if x <= 0.0 {
                    0.0
                } else {
                    (-(scale / x).powf(*shape)).exp()
                }
            }
            Marginal::TypeIIISmallest { scale, shape, lower } => {
                if x <= *lower {
                    0.0
                } else {
                    1.0 - (-((x - lower) / (scale - lower)).powf(*shape)).exp()
                }
            }
            Marginal::Library(d) => d.cdf(x),
            Marginal::Constant(v) => {
                if x < *v {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// Probability density function, zero outside the support.
    pub fn pdf(&self, x: f64) -> f64 {
        match self {
            Marginal::Normal(d) => Continuous::pdf(d, x),
            Marginal::Lognormal(d) => {
                if x <= 0.0 {
                    0.0
                } else {
                    Continuous::pdf(d, x)
                }
            }
            Marginal::Gamma(d) => {
                if x <= 0.0 {
                    0.0
                } else {
                    Continuous::pdf(d, x)
                }
            }
            Marginal::Uniform(d) => Continuous::pdf(d, x),
            Marginal::Beta { inner, lower, upper } => {
                if x <= *lower || x >= *upper {
                    0.0
                } else {
                    Continuous::pdf(inner, (x - lower) / (upper - lower)) / (upper - lower)
                }
            }
            Marginal::ChiSquare(d) => {
                if x <= 0.0 {
                    0.0
                } else {
                    Continuous::pdf(d, x)
                }
            }
            Marginal::ShiftedExponential { rate, shift } => {
                if x <= *shift {
                    0.0
                } else {
                    rate * (-rate * (x - shift)).exp()
                }
            }
            Marginal::ShiftedRayleigh { sigma, shift } => {
                if x <= *shift {
                    0.0
                } else {
                    let t = (x - shift) / sigma;
                    t / sigma * (-0.5 * t * t).exp()
                }
            }
            Marginal::TypeILargest { location, scale } => {
                let t = (x - location) / scale;
                (-t).exp() / scale * (-(-t).exp()).exp()
            }
            Marginal::TypeISmallest { location, scale } => {
                let t = (x - location) / scale;
                t.exp() / scale * (-t.exp()).exp()
            }
            Marginal::TypeIILargest { scale, shape } => {
                if x <= 0.0 {
                    0.0
                } else {
                    let t = scale / x;
                    shape / scale * t.powf(shape + 1.0) * (-t.powf(*shape)).exp()
                }
            }
            Marginal::TypeIIISmallest { scale, shape, lower } => {
                if x <= *lower {
                    0.0
                } else {
                    let width = scale - lower;
                    let t = (x - lower) / width;
                    shape / width * t.powf(shape - 1.0) * (-t.powf(*shape)).exp()
                }
            }
            Marginal::Library(d) => d.pdf(x),
            Marginal::Constant(_) => 0.0,
        }
    }

    /// Quantile function. Assumes `p` lies strictly inside `(0, 1)`; the
    /// domain check happens in [`RandomVariable::quantile`](super::RandomVariable::quantile).
    pub(crate) fn inverse_cdf(&self, p: f64) -> f64 {
        match self {
            Marginal::Normal(d) => ContinuousCDF::inverse_cdf(d, p),
            Marginal::Lognormal(d) => ContinuousCDF::inverse_cdf(d, p),
            Marginal::Gamma(d) => ContinuousCDF::inverse_cdf(d, p),
            Marginal::Uniform(d) => ContinuousCDF::inverse_cdf(d, p),
            Marginal::Beta { inner, lower, upper } => {
                lower + (upper - lower) * ContinuousCDF::inverse_cdf(inner, p)
            }
            Marginal::ChiSquare(d) => ContinuousCDF::inverse_cdf(d, p),
            Marginal::ShiftedExponential { rate, shift } => shift - (1.0 - p).ln() / rate,
            Marginal::ShiftedRayleigh { sigma, shift } => {
                shift + sigma * (-2.0 * (1.0 - p).ln()).sqrt()
            }
            Marginal::TypeILargest { location, scale } => location - scale * (-p.ln()).ln(),
            Marginal::TypeISmallest { location, scale } => {
                location + scale * (-(1.0 - p).ln()).ln()
            }
            Marginal::TypeIILargest { scale, shape } => scale * (-p.ln()).powf(-1.0 / shape),
            Marginal::TypeIIISmallest { scale, shape, lower } => {
                lower + (scale - lower) * (-(1.0 - p).ln()).powf(1.0 / shape)
            }
            Marginal::Library(d) => d.inverse_cdf(p),
            Marginal::Constant(v) => *v,
        }
    }

    /// Whether this marginal is the degenerate [`Marginal::Constant`] variant.
    pub fn is_constant(&self) -> bool {
        matches!(self, Marginal::Constant(_))
    }
}

// ---- Shape recovery for the extreme-value families ----

/// Solve the Type-II largest (Fréchet) shape `k > 2` from the coefficient of
/// variation, using `1 + cov^2 = Γ(1 - 2/k) / Γ(1 - 1/k)^2`.
pub(crate) fn solve_type_ii_shape(cov: f64) -> OptResult<f64> {
    let target = (1.0 + cov * cov).ln();
    let residual =
        |k: f64| -> OptResult<f64> { Ok(ln_gamma(1.0 - 2.0 / k) - 2.0 * ln_gamma(1.0 - 1.0 / k) - target) };
    find_root(&residual, (2.0 + 1e-6, 1_000.0), &RootOptions::default())
}

/// Solve the Type-III smallest (Weibull) shape `k > 0` from the coefficient of
/// variation about the lower bound, using
/// `1 + cov^2 = Γ(1 + 2/k) / Γ(1 + 1/k)^2`.
pub(crate) fn solve_type_iii_shape(cov: f64) -> OptResult<f64> {
    let target = (1.0 + cov * cov).ln();
    let residual =
        |k: f64| -> OptResult<f64> { Ok(ln_gamma(1.0 + 2.0 / k) - 2.0 * ln_gamma(1.0 + 1.0 / k) - target) };
    find_root(&residual, (0.05, 1_000.0), &RootOptions::default())
}
