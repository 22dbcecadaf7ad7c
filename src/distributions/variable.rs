//! Named random variables and their standardized-normal transforms.
//!
//! A [`RandomVariable`] couples an immutable symbolic name (the argument name
//! used by limit-state functions) with a resolved [`Marginal`] and cached
//! first/second moments. Construction happens once at model-setup time; the
//! value is read-only afterwards and shared by `Arc` across every combination
//! case that references the same name.
//!
//! ## Transforms
//! Non-normal marginals are handled through the marginal standardizing
//! transform `u = Φ⁻¹(F(x))` and its inverse `x = F⁻¹(Φ(u))`, plus the
//! equivalent-normal pair `(μ_eq, σ_eq)` used by the iterative design-point
//! search. Probabilities are clamped away from `{0, 1}` before inversion so a
//! wandering solver iterate cannot produce infinite standardized coordinates.
use crate::distributions::{
    errors::{DistError, DistResult},
    families::{
        solve_type_ii_shape, solve_type_iii_shape, ContinuousModel, Marginal, EULER_MASCHERONI,
    },
};
use statrs::distribution::{
    Beta, ChiSquared, Continuous, ContinuousCDF, Gamma, LogNormal, Normal, Uniform,
};
use statrs::function::gamma::ln_gamma;
use std::sync::Arc;

/// Probabilities are clamped into `[PROB_FLOOR, 1 - PROB_FLOOR]` before the
/// standard-normal inverse is applied.
const PROB_FLOOR: f64 = 1e-15;

/// Densities below this threshold are treated as degenerate by the
/// equivalent-normal transform.
const MIN_DENSITY: f64 = 1e-290;

/// Standard normal distribution used by every standardizing transform.
fn std_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("standard normal parameters are valid")
}

/// Validate a `(mean, stdv)` pair shared by most moment-matching constructors.
fn check_moments(name: &str, mean: f64, stdv: f64) -> DistResult<()> {
    if !mean.is_finite() {
        return Err(DistError::InvalidParameter {
            name: name.to_string(),
            value: mean,
            reason: "Mean must be finite.",
        });
    }
    if !stdv.is_finite() || stdv <= 0.0 {
        return Err(DistError::InvalidParameter {
            name: name.to_string(),
            value: stdv,
            reason: "Standard deviation must be finite and > 0.",
        });
    }
    Ok(())
}

/// One named marginal random variable of a reliability model.
///
/// - `name` identifies the variable inside limit-state functions and result
///   tables and is immutable once constructed.
/// - `marginal` holds the resolved distribution family.
/// - `mean`/`stdv` are cached at construction and reused by solver
///   initialization and nominal-value bookkeeping.
#[derive(Debug, Clone)]
pub struct RandomVariable {
    name: String,
    marginal: Marginal,
    mean: f64,
    stdv: f64,
}

impl RandomVariable {
    // ---- Constructors (moment matching mirrors the distribution layer of
    //      classical code-calibration tools) ----

    /// Normal variable from `(mean, stdv)`.
    pub fn normal(name: &str, mean: f64, stdv: f64) -> DistResult<Self> {
        check_moments(name, mean, stdv)?;
        let dist = Normal::new(mean, stdv).map_err(|_| DistError::InvalidParameter {
            name: name.to_string(),
            value: stdv,
            reason: "Normal parameters rejected by the distribution backend.",
        })?;
        Ok(Self { name: name.to_string(), marginal: Marginal::Normal(dist), mean, stdv })
    }

    /// Lognormal variable from `(mean, stdv)` of the variable itself
    /// (not of its logarithm). Requires `mean > 0`.
    pub fn lognormal(name: &str, mean: f64, stdv: f64) -> DistResult<Self> {
        check_moments(name, mean, stdv)?;
        if mean <= 0.0 {
            return Err(DistError::InvalidParameter {
                name: name.to_string(),
                value: mean,
                reason: "Lognormal mean must be > 0.",
            });
        }
        let cov = stdv / mean;
        let sigma_ln = (1.0 + cov * cov).ln().sqrt();
        let mu_ln = mean.ln() - 0.5 * sigma_ln * sigma_ln;
        let dist = LogNormal::new(mu_ln, sigma_ln).map_err(|_| DistError::InvalidParameter {
            name: name.to_string(),
            value: sigma_ln,
            reason: "Lognormal parameters rejected by the distribution backend.",
        })?;
        Ok(Self { name: name.to_string(), marginal: Marginal::Lognormal(dist), mean, stdv })
    }

    /// Gamma variable from `(mean, stdv)`: shape `(mean/stdv)^2`, rate
    /// `mean/stdv^2`. Requires `mean > 0`.
    pub fn gamma(name: &str, mean: f64, stdv: f64) -> DistResult<Self> {
        check_moments(name, mean, stdv)?;
        if mean <= 0.0 {
            return Err(DistError::InvalidParameter {
                name: name.to_string(),
                value: mean,
                reason: "Gamma mean must be > 0.",
            });
        }
        let shape = (mean / stdv) * (mean / stdv);
        let rate = mean / (stdv * stdv);
        let dist = Gamma::new(shape, rate).map_err(|_| DistError::InvalidParameter {
            name: name.to_string(),
            value: shape,
            reason: "Gamma parameters rejected by the distribution backend.",
        })?;
        Ok(Self { name: name.to_string(), marginal: Marginal::Gamma(dist), mean, stdv })
    }

    /// Uniform variable from `(mean, stdv)`; the support is
    /// `mean ± sqrt(3) stdv`.
    pub fn uniform(name: &str, mean: f64, stdv: f64) -> DistResult<Self> {
        check_moments(name, mean, stdv)?;
        let half = 3.0_f64.sqrt() * stdv;
        let dist = Uniform::new(mean - half, mean + half).map_err(|_| {
            DistError::InvalidParameter {
                name: name.to_string(),
                value: stdv,
                reason: "Uniform parameters rejected by the distribution backend.",
            }
        })?;
        Ok(Self { name: name.to_string(), marginal: Marginal::Uniform(dist), mean, stdv })
    }

    /// Beta variable from `(mean, stdv)` on a general support
    /// `[lower, upper]`. The standard shape parameters are recovered from the
    /// scaled moments and must come out strictly positive.
    pub fn beta(name: &str, mean: f64, stdv: f64, lower: f64, upper: f64) -> DistResult<Self> {
        check_moments(name, mean, stdv)?;
        if !(lower.is_finite() && upper.is_finite() && lower < upper) {
            return Err(DistError::InvalidParameter {
                name: name.to_string(),
                value: upper - lower,
                reason: "Beta support must satisfy lower < upper with finite bounds.",
            });
        }
        let m = (mean - lower) / (upper - lower);
        let s = stdv / (upper - lower);
        let common = m * (1.0 - m) / (s * s) - 1.0;
        let shape_a = m * common;
        let shape_b = (1.0 - m) * common;
        if !(shape_a > 0.0 && shape_b > 0.0) {
            return Err(DistError::InvalidParameter {
                name: name.to_string(),
                value: stdv,
                reason: "Beta moments are incompatible with the requested support.",
            });
        }
        let inner = Beta::new(shape_a, shape_b).map_err(|_| DistError::InvalidParameter {
            name: name.to_string(),
            value: shape_a,
            reason: "Beta parameters rejected by the distribution backend.",
        })?;
        Ok(Self {
            name: name.to_string(),
            marginal: Marginal::Beta { inner, lower, upper },
            mean,
            stdv,
        })
    }

    /// Chi-square variable with `dof` degrees of freedom
    /// (mean `dof`, variance `2 dof`).
    pub fn chi_square(name: &str, dof: f64) -> DistResult<Self> {
        if !dof.is_finite() || dof <= 0.0 {
            return Err(DistError::InvalidParameter {
                name: name.to_string(),
                value: dof,
                reason: "Chi-square degrees of freedom must be finite and > 0.",
            });
        }
        let dist = ChiSquared::new(dof).map_err(|_| DistError::InvalidParameter {
            name: name.to_string(),
            value: dof,
            reason: "Chi-square parameters rejected by the distribution backend.",
        })?;
        Ok(Self {
            name: name.to_string(),
            marginal: Marginal::ChiSquare(dist),
            mean: dof,
            stdv: (2.0 * dof).sqrt(),
        })
    }

    /// Shifted exponential variable from `(mean, stdv)`: rate `1/stdv`, shift
    /// `mean - stdv`.
    pub fn shifted_exponential(name: &str, mean: f64, stdv: f64) -> DistResult<Self> {
        check_moments(name, mean, stdv)?;
        let marginal = Marginal::ShiftedExponential { rate: 1.0 / stdv, shift: mean - stdv };
        Ok(Self { name: name.to_string(), marginal, mean, stdv })
    }

    /// Shifted Rayleigh variable from `(mean, stdv)`.
    pub fn shifted_rayleigh(name: &str, mean: f64, stdv: f64) -> DistResult<Self> {
        check_moments(name, mean, stdv)?;
        let sigma = stdv / (2.0 - std::f64::consts::FRAC_PI_2).sqrt();
        let shift = mean - sigma * (std::f64::consts::FRAC_PI_2).sqrt();
        Ok(Self {
            name: name.to_string(),
            marginal: Marginal::ShiftedRayleigh { sigma, shift },
            mean,
            stdv,
        })
    }

    /// Gumbel (Type-I largest value) variable from `(mean, stdv)`:
    /// scale `sqrt(6) stdv / π`, location `mean - γ_E scale`.
    pub fn gumbel(name: &str, mean: f64, stdv: f64) -> DistResult<Self> {
        check_moments(name, mean, stdv)?;
        let scale = 6.0_f64.sqrt() * stdv / std::f64::consts::PI;
        let location = mean - EULER_MASCHERONI * scale;
        Ok(Self {
            name: name.to_string(),
            marginal: Marginal::TypeILargest { location, scale },
            mean,
            stdv,
        })
    }

    /// Type-I largest value variable; alias of [`RandomVariable::gumbel`].
    pub fn type_i_largest(name: &str, mean: f64, stdv: f64) -> DistResult<Self> {
        Self::gumbel(name, mean, stdv)
    }

    /// Type-I smallest value variable from `(mean, stdv)` (mirror image of
    /// the Gumbel largest-value family).
    pub fn type_i_smallest(name: &str, mean: f64, stdv: f64) -> DistResult<Self> {
        check_moments(name, mean, stdv)?;
        let scale = 6.0_f64.sqrt() * stdv / std::f64::consts::PI;
        let location = mean + EULER_MASCHERONI * scale;
        Ok(Self {
            name: name.to_string(),
            marginal: Marginal::TypeISmallest { location, scale },
            mean,
            stdv,
        })
    }

    /// Type-II largest value (Fréchet) variable from `(mean, stdv)`. The
    /// shape is recovered from the coefficient of variation and must satisfy
    /// `shape > 2` for the variance to exist.
    pub fn type_ii_largest(name: &str, mean: f64, stdv: f64) -> DistResult<Self> {
        check_moments(name, mean, stdv)?;
        if mean <= 0.0 {
            return Err(DistError::InvalidParameter {
                name: name.to_string(),
                value: mean,
                reason: "Type-II largest mean must be > 0.",
            });
        }
        let cov = stdv / mean;
        let shape = solve_type_ii_shape(cov).map_err(|e| DistError::ShapeSolveFailed {
            name: name.to_string(),
            cov,
            status: e.to_string(),
        })?;
        let scale = mean / ln_gamma(1.0 - 1.0 / shape).exp();
        Ok(Self {
            name: name.to_string(),
            marginal: Marginal::TypeIILargest { scale, shape },
            mean,
            stdv,
        })
    }

    /// Type-III smallest value variable from `(mean, stdv)` with lower bound
    /// `lower < mean`. The shape is recovered from the coefficient of
    /// variation about the bound.
    pub fn type_iii_smallest(name: &str, mean: f64, stdv: f64, lower: f64) -> DistResult<Self> {
        check_moments(name, mean, stdv)?;
        if !lower.is_finite() || lower >= mean {
            return Err(DistError::InvalidParameter {
                name: name.to_string(),
                value: lower,
                reason: "Type-III smallest lower bound must be finite and < mean.",
            });
        }
        let cov = stdv / (mean - lower);
        let shape = solve_type_iii_shape(cov).map_err(|e| DistError::ShapeSolveFailed {
            name: name.to_string(),
            cov,
            status: e.to_string(),
        })?;
        let scale = lower + (mean - lower) / ln_gamma(1.0 + 1.0 / shape).exp();
        Ok(Self {
            name: name.to_string(),
            marginal: Marginal::TypeIIISmallest { scale, shape, lower },
            mean,
            stdv,
        })
    }

    /// Weibull variable from `(mean, stdv)`; Type-III smallest with a zero
    /// lower bound.
    pub fn weibull(name: &str, mean: f64, stdv: f64) -> DistResult<Self> {
        Self::type_iii_smallest(name, mean, stdv, 0.0)
    }

    /// Library-backed variable wrapping any statrs-compatible continuous
    /// distribution. The backend must report finite first/second moments.
    pub fn library<D>(name: &str, dist: D) -> DistResult<Self>
    where D: ContinuousModel + 'static {
        let mean = dist.mean().filter(|m| m.is_finite());
        let stdv = dist.std_dev().filter(|s| s.is_finite() && *s > 0.0);
        match (mean, stdv) {
            (Some(mean), Some(stdv)) => Ok(Self {
                name: name.to_string(),
                marginal: Marginal::Library(Arc::new(dist)),
                mean,
                stdv,
            }),
            _ => Err(DistError::MissingMoments { name: name.to_string() }),
        }
    }

    /// Constant (zero-dispersion) variable.
    pub fn constant(name: &str, value: f64) -> DistResult<Self> {
        if !value.is_finite() {
            return Err(DistError::InvalidParameter {
                name: name.to_string(),
                value,
                reason: "Constant value must be finite.",
            });
        }
        Ok(Self { name: name.to_string(), marginal: Marginal::Constant(value), mean: value, stdv: 0.0 })
    }

    // ---- Accessors ----

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn stdv(&self) -> f64 {
        self.stdv
    }

    pub fn marginal(&self) -> &Marginal {
        &self.marginal
    }

    pub fn is_constant(&self) -> bool {
        self.marginal.is_constant()
    }

    /// The fixed value if this variable is a constant.
    pub fn constant_value(&self) -> Option<f64> {
        match self.marginal {
            Marginal::Constant(v) => Some(v),
            _ => None,
        }
    }

    // ---- Probability functions ----

    /// `P(X <= x)`, total on the real line.
    pub fn cdf(&self, x: f64) -> f64 {
        self.marginal.cdf(x)
    }

    /// Density at `x`, zero outside the support.
    pub fn pdf(&self, x: f64) -> f64 {
        self.marginal.pdf(x)
    }

    /// Value `x` with `P(X <= x) = p`.
    ///
    /// # Errors
    /// [`DistError::QuantileOutOfRange`] unless `p` lies strictly inside
    /// `(0, 1)`. Constants return their fixed value for any `p`.
    pub fn quantile(&self, p: f64) -> DistResult<f64> {
        if let Marginal::Constant(v) = self.marginal {
            return Ok(v);
        }
        if !(p > 0.0 && p < 1.0) {
            return Err(DistError::QuantileOutOfRange { name: self.name.clone(), p });
        }
        Ok(self.marginal.inverse_cdf(p))
    }

    // ---- Standardizing transforms ----

    /// Map a native-space value to standardized-normal space:
    /// `u = Φ⁻¹(F(x))`, with the probability clamped away from `{0, 1}`.
    /// Constants map to the origin (zero standardized-space sensitivity).
    pub fn to_standard_normal(&self, x: f64) -> f64 {
        if self.is_constant() {
            return 0.0;
        }
        let p = self.cdf(x).clamp(PROB_FLOOR, 1.0 - PROB_FLOOR);
        ContinuousCDF::inverse_cdf(&std_normal(), p)
    }

    /// Map a standardized-normal coordinate back to native space:
    /// `x = F⁻¹(Φ(u))`. Constants return their fixed value for any `u`.
    pub fn from_standard_normal(&self, u: f64) -> f64 {
        if let Marginal::Constant(v) = self.marginal {
            return v;
        }
        let p = ContinuousCDF::cdf(&std_normal(), u).clamp(PROB_FLOOR, 1.0 - PROB_FLOOR);
        self.marginal.inverse_cdf(p)
    }

    /// Equivalent-normal parameters `(μ_eq, σ_eq)` at `x`:
    /// `σ_eq = φ(Φ⁻¹(F(x))) / f(x)` and `μ_eq = x - Φ⁻¹(F(x)) σ_eq`.
    ///
    /// Constants return `(value, 0.0)`.
    ///
    /// # Errors
    /// [`DistError::DegenerateDensity`] when `f(x)` is non-finite or too
    /// close to zero for the division to be meaningful.
    pub fn equivalent_normal(&self, x: f64) -> DistResult<(f64, f64)> {
        if let Marginal::Constant(v) = self.marginal {
            return Ok((v, 0.0));
        }
        let pdf = self.pdf(x);
        if !pdf.is_finite() || pdf < MIN_DENSITY {
            return Err(DistError::DegenerateDensity { name: self.name.clone(), x, pdf });
        }
        let std = std_normal();
        let z = ContinuousCDF::inverse_cdf(&std, self.cdf(x).clamp(PROB_FLOOR, 1.0 - PROB_FLOOR));
        let sigma_eq = Continuous::pdf(&std, z) / pdf;
        let mu_eq = x - z * sigma_eq;
        Ok((mu_eq, sigma_eq))
    }
}
