//! The calibration engine: drive per-case design-point searches while
//! adjusting the design parameter until every case meets the target
//! reliability index, then derive partial factors from the converged design
//! points.
//!
//! Purpose
//! -------
//! [`Calibration`] owns a validated [`LoadCombination`], a target reliability
//! index, nominal values for every random variable, and the name of the
//! calibration (design) variable. `run()` calibrates every declared
//! combination case and materializes the outcome tables.
//!
//! Key behaviors
//! -------------
//! - Two orthogonal configuration axes, fixed at construction: the inner
//!   design-point strategy ([`EstimationMethod`]) and the outer update rule
//!   ([`CalibrationMethod`]). Both calibration strategies share the same
//!   outer skeleton (build case, solve design point, update the trial value)
//!   and differ only in the update rule.
//! - Per-case design values are preserved, never averaged; the design value
//!   of the model is their maximum, and the governing case is the one with
//!   the largest reliability index when every case is re-evaluated there.
//! - `run()` is deterministic and idempotent: re-running with unchanged
//!   inputs reconverges to the same outcome within numeric tolerance.
//!
//! Failure semantics
//! -----------------
//! Configuration problems surface from `new()`. During `run()`, the first
//! evaluation of each case happens eagerly so domain/configuration failures
//! keep their own error type; failures inside the bracketed root search are
//! captured and re-surfaced with full context rather than degraded to a
//! backend status string. A convergence failure in any case aborts the whole
//! run; no partial tables are produced.
use crate::calibration::errors::{CalibError, CalibResult};
use crate::calibration::factors::{derive_tables, CaseTable, FactorInputs};
use crate::combination::load_combination::LoadCombination;
use crate::form::{
    design_point::DesignPoint,
    limit_state::VariableValues,
    solver::{DesignPointSolver, EstimationMethod, FormOptions},
};
use crate::optimization::{
    errors::{OptError, OptResult},
    root::{expand_bracket, find_root, RootOptions},
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Outer update rule for the design-parameter search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationMethod {
    /// Treat `beta(z) - beta_target` as a scalar root-find residual.
    Optimize,
    /// Update `z` directly from the governing sensitivities: map
    /// `u* = beta_target alpha` back to original units and solve the limit
    /// state for the design parameter.
    Alpha,
}

impl FromStr for CalibrationMethod {
    type Err = CalibError;

    /// Parse an update-rule name (case-insensitive): `"optimize"`/`"opt"` or
    /// `"alpha"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "optimize" | "opt" => Ok(CalibrationMethod::Optimize),
            "alpha" => Ok(CalibrationMethod::Alpha),
            _ => Err(CalibError::UnknownCalibrationMethod { name: s.to_string() }),
        }
    }
}

/// Tolerances and caps for the outer calibration loop.
///
/// - `tol_design`: convergence tolerance on the design-parameter value
///   (relative above magnitude one).
/// - `max_outer`: cap on outer iterations (Brent steps or direct updates).
/// - `bracket_step`: initial bracket-expansion step, relative to the
///   declared design-parameter magnitude.
/// - `form`: options forwarded to every inner design-point solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOptions {
    pub tol_design: f64,
    pub max_outer: usize,
    pub bracket_step: f64,
    pub form: FormOptions,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self { tol_design: 1e-7, max_outer: 100, bracket_step: 0.5, form: FormOptions::default() }
    }
}

/// Finalized results of one calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationOutcome {
    cases: Vec<String>,
    design_values: Vec<f64>,
    achieved_betas: Vec<f64>,
    betas_at_design: Vec<f64>,
    governing: String,
    design_points: Vec<DesignPoint>,
    x_star: CaseTable,
    phi: CaseTable,
    gamma: CaseTable,
    psi: CaseTable,
}

impl CalibrationOutcome {
    /// Case labels, in declaration order (row order of every table).
    pub fn cases(&self) -> &[String] {
        &self.cases
    }

    /// Converged design-parameter value per case.
    pub fn design_values(&self) -> &[f64] {
        &self.design_values
    }

    /// The model's design value: the maximum over the per-case values.
    pub fn design_value(&self) -> f64 {
        self.design_values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Reliability index achieved by each case at its own design value.
    pub fn achieved_betas(&self) -> &[f64] {
        &self.achieved_betas
    }

    /// Reliability index of each case re-evaluated at [`Self::design_value`].
    pub fn betas_at_design_value(&self) -> &[f64] {
        &self.betas_at_design
    }

    /// The governing combination case: largest reliability index at the
    /// design value.
    pub fn governing_case(&self) -> &str {
        &self.governing
    }

    /// Converged design point per case.
    pub fn design_points(&self) -> &[DesignPoint] {
        &self.design_points
    }

    /// Design-point coordinates per case and variable (the calibration
    /// variable column holds the per-case converged value).
    pub fn x_star(&self) -> &CaseTable {
        &self.x_star
    }

    /// Resistance factors per case and resistance variable.
    pub fn resistance_factors(&self) -> &CaseTable {
        &self.phi
    }

    /// Load factors per case and load/other variable.
    pub fn load_factors(&self) -> &CaseTable {
        &self.gamma
    }

    /// Combination factors per case and load/other variable.
    pub fn combination_factors(&self) -> &CaseTable {
        &self.psi
    }
}

/// Reliability-based calibration of a scalar design parameter.
pub struct Calibration {
    combination: LoadCombination,
    target_beta: f64,
    nominal: BTreeMap<String, f64>,
    calib_var: String,
    solver: DesignPointSolver,
    calib_method: CalibrationMethod,
    options: CalibrationOptions,
    outcome: Option<CalibrationOutcome>,
}

impl Calibration {
    /// Construct a calibration over a validated load combination.
    ///
    /// # Arguments
    /// - `combination`: the declared model.
    /// - `target_beta`: reliability index every case must reach.
    /// - `nominal`: nominal (characteristic) value per random-variable name,
    ///   the denominators of the partial factors.
    /// - `calib_var`: name of the design parameter; must be one of the
    ///   declared constants.
    /// - `est_method` / `calib_method`: inner and outer strategy selection.
    ///
    /// # Errors
    /// - [`CalibError::InvalidTargetBeta`] for a non-finite or non-positive
    ///   target.
    /// - [`CalibError::MissingCalibrationVariable`] when `calib_var` is not a
    ///   declared constant.
    /// - [`CalibError::MissingNominalValue`] / [`CalibError::InvalidNominalValue`]
    ///   when any random variable lacks a usable nominal value.
    pub fn new(
        combination: LoadCombination, target_beta: f64, nominal: BTreeMap<String, f64>,
        calib_var: &str, est_method: EstimationMethod, calib_method: CalibrationMethod,
    ) -> CalibResult<Self> {
        if !target_beta.is_finite() || target_beta <= 0.0 {
            return Err(CalibError::InvalidTargetBeta { value: target_beta });
        }
        if combination.constant(calib_var).is_none() {
            return Err(CalibError::MissingCalibrationVariable { name: calib_var.to_string() });
        }
        for name in combination.variable_names() {
            match nominal.get(&name) {
                None => return Err(CalibError::MissingNominalValue { variable: name }),
                Some(value) if !value.is_finite() || *value == 0.0 => {
                    return Err(CalibError::InvalidNominalValue { variable: name, value: *value })
                }
                Some(_) => {}
            }
        }
        Ok(Self {
            combination,
            target_beta,
            nominal,
            calib_var: calib_var.to_string(),
            solver: DesignPointSolver::new(est_method),
            calib_method,
            options: CalibrationOptions::default(),
            outcome: None,
        })
    }

    /// Replace the default tolerances and caps.
    pub fn with_options(mut self, options: CalibrationOptions) -> Self {
        self.options = options;
        self.solver = DesignPointSolver::with_options(self.solver.method(), options.form);
        self
    }

    pub fn target_beta(&self) -> f64 {
        self.target_beta
    }

    pub fn calibration_variable(&self) -> &str {
        &self.calib_var
    }

    /// The finalized outcome, if `run()` has completed.
    pub fn outcome(&self) -> Option<&CalibrationOutcome> {
        self.outcome.as_ref()
    }

    /// Converged design-parameter value per case.
    pub fn design_param_factors(&self) -> CalibResult<&[f64]> {
        self.outcome.as_ref().map(|o| o.design_values()).ok_or(CalibError::NotCalibrated)
    }

    /// Execute the calibration: calibrate every declared case, re-evaluate
    /// every case at the resulting design value, and derive the factor
    /// tables.
    pub fn run(&mut self) -> CalibResult<&CalibrationOutcome> {
        let labels: Vec<String> =
            self.combination.case_labels().iter().map(|s| s.to_string()).collect();
        let mut design_values = Vec::with_capacity(labels.len());
        let mut achieved_betas = Vec::with_capacity(labels.len());
        let mut design_points = Vec::with_capacity(labels.len());
        for label in &labels {
            let (z, dp) = match self.calib_method {
                CalibrationMethod::Optimize => self.calibrate_by_root(label)?,
                CalibrationMethod::Alpha => self.calibrate_by_alpha(label)?,
            };
            design_values.push(z);
            achieved_betas.push(dp.beta());
            design_points.push(dp);
        }

        let design_value = design_values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let betas_at_design = self.beta_at_design_param(design_value)?;
        let governing_idx = betas_at_design
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);

        let resistance_names = self.combination.resistance_names();
        let other_names = self.combination.other_names();
        let load_names = self.combination.load_names();
        let own_case: Vec<Option<&str>> = load_names
            .iter()
            .map(|name| {
                labels
                    .iter()
                    .find(|label| {
                        self.combination
                            .active_loads(label)
                            .map(|active| active.iter().any(|n| n == *name))
                            .unwrap_or(false)
                    })
                    .map(|s| s.as_str())
            })
            .collect();
        let nominal_of = |name: &str| -> f64 {
            *self.nominal.get(name).expect("nominal values validated at construction")
        };
        let tables = derive_tables(&FactorInputs {
            resistance_names,
            other_names,
            load_names,
            own_case,
            calib_var: self.calib_var.as_str(),
            nominal: &nominal_of,
            labels: &labels,
            design_values: &design_values,
            design_points: &design_points,
        });

        let outcome = CalibrationOutcome {
            governing: labels[governing_idx].clone(),
            cases: labels,
            design_values,
            achieved_betas,
            betas_at_design,
            design_points,
            x_star: tables.x_star,
            phi: tables.phi,
            gamma: tables.gamma,
            psi: tables.psi,
        };
        Ok(&*self.outcome.insert(outcome))
    }

    /// Reliability index per case at an arbitrary design-parameter value.
    ///
    /// Reuses the case build/solve pipeline without touching any calibration
    /// state, so repeated calls with the same `z` return identical results.
    pub fn beta_at_design_param(&self, z: f64) -> CalibResult<Vec<f64>> {
        self.combination
            .case_labels()
            .iter()
            .map(|label| self.solve_case(label, z).map(|dp| dp.beta()))
            .collect()
    }

    // ---- Inner plumbing ----

    /// Build one case at trial value `z` and run the configured design-point
    /// strategy on it.
    fn solve_case(&self, label: &str, z: f64) -> CalibResult<DesignPoint> {
        let case = self.combination.build_case(label, Some((&self.calib_var, z)))?;
        self.solver
            .solve(&case, self.combination.limit_state().as_ref())
            .map_err(|e| CalibError::form(label, e))
    }

    /// Declared value of the calibration constant, the starting trial.
    fn initial_design(&self) -> f64 {
        self.combination
            .constant(&self.calib_var)
            .and_then(|c| c.constant_value())
            .expect("calibration variable validated at construction")
    }

    /// `Optimize` rule: root-find `beta(z) - beta_target` over `z`.
    fn calibrate_by_root(&self, label: &str) -> CalibResult<(f64, DesignPoint)> {
        let z0 = self.initial_design();
        // Eager first evaluation: domain and configuration failures surface
        // here with their own error type instead of a root-search status.
        self.solve_case(label, z0)?;

        let captured: RefCell<Option<CalibError>> = RefCell::new(None);
        let residual = |z: f64| -> OptResult<f64> {
            match self.solve_case(label, z) {
                Ok(dp) => Ok(dp.beta() - self.target_beta),
                Err(err) => {
                    let status = err.to_string();
                    let mut slot = captured.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(err);
                    }
                    Err(OptError::ObjectiveFailed { status })
                }
            }
        };
        let rescue = |err: OptError| -> CalibError {
            captured.borrow_mut().take().unwrap_or_else(|| CalibError::outer(label, err))
        };

        let step = self.options.bracket_step * z0.abs().max(1.0);
        let bracket = expand_bracket(&residual, z0, step).map_err(&rescue)?;
        let root_opts = RootOptions { tol: self.options.tol_design, max_iter: self.options.max_outer };
        let z = find_root(&residual, bracket, &root_opts).map_err(&rescue)?;
        let dp = self.solve_case(label, z)?;
        Ok((z, dp))
    }

    /// `Alpha` rule: iterate design values derived from the case's
    /// sensitivity vector at the target reliability index.
    fn calibrate_by_alpha(&self, label: &str) -> CalibResult<(f64, DesignPoint)> {
        let mut z = self.initial_design();
        let mut last_step = f64::INFINITY;
        for _ in 1..=self.options.max_outer {
            let case = self.combination.build_case(label, Some((&self.calib_var, z)))?;
            let dp = self
                .solver
                .solve(&case, self.combination.limit_state().as_ref())
                .map_err(|e| CalibError::form(label, e))?;

            // Design values at the target reliability index from the current
            // sensitivities, through the exact inverse transform.
            let mut values = VariableValues::new();
            for (var, alpha) in case.variables().iter().zip(dp.alpha().iter()) {
                values.insert(var.name(), var.from_standard_normal(self.target_beta * alpha));
            }
            for (name, value) in case.constants() {
                if name != &self.calib_var {
                    values.insert(name, *value);
                }
            }

            let limit_state = self.combination.limit_state();
            let condition = |trial: f64| -> OptResult<f64> {
                let mut at_trial = values.clone();
                at_trial.insert(&self.calib_var, trial);
                let g = limit_state.evaluate(&at_trial);
                if !g.is_finite() {
                    return Err(OptError::ObjectiveFailed {
                        status: format!("limit state returned a non-finite value: {g}"),
                    });
                }
                Ok(g)
            };
            let step = self.options.bracket_step * z.abs().max(1.0);
            let bracket =
                expand_bracket(&condition, z, step).map_err(|e| CalibError::outer(label, e))?;
            let root_opts =
                RootOptions { tol: self.options.tol_design, max_iter: self.options.max_outer };
            let z_new = find_root(&condition, bracket, &root_opts)
                .map_err(|e| CalibError::outer(label, e))?;

            last_step = (z_new - z).abs();
            if last_step <= self.options.tol_design * z_new.abs().max(1.0) {
                let dp_final = self.solve_case(label, z_new)?;
                return Ok((z_new, dp_final));
            }
            z = z_new;
        }
        Err(CalibError::outer(
            label,
            OptError::NotConverged { iterations: self.options.max_outer, residual: last_step },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combination::load_combination::{LoadCombination, LoadPair};
    use crate::distributions::RandomVariable;
    use std::sync::Arc;

    fn toy_combination() -> LoadCombination {
        let q_max = Arc::new(RandomVariable::gumbel("Q1", 1.0, 0.2).unwrap());
        let q_pit = Arc::new(RandomVariable::gumbel("Q1", 0.89, 0.2).unwrap());
        let r = Arc::new(RandomVariable::lognormal("R", 1.0, 0.15).unwrap());
        let z = Arc::new(RandomVariable::constant("z", 1.0).unwrap());
        LoadCombination::new(
            |v: &VariableValues| v["z"] * v["R"] - v["Q1"],
            vec![("Q1".to_string(), LoadPair::new(q_max, q_pit))],
            vec![r],
            vec![],
            vec![z],
            vec![("Q1_max".to_string(), vec!["Q1".to_string()])],
        )
        .unwrap()
    }

    fn toy_nominal() -> BTreeMap<String, f64> {
        let mut nominal = BTreeMap::new();
        nominal.insert("R".to_string(), 0.77);
        nominal.insert("Q1".to_string(), 1.52);
        nominal
    }

    #[test]
    fn missing_calibration_variable_is_rejected() {
        let result = Calibration::new(
            toy_combination(),
            4.3,
            toy_nominal(),
            "phi",
            EstimationMethod::Coefficient,
            CalibrationMethod::Optimize,
        );
        assert!(matches!(result, Err(CalibError::MissingCalibrationVariable { .. })));
    }

    #[test]
    fn missing_nominal_value_is_rejected() {
        let mut nominal = toy_nominal();
        nominal.remove("Q1");
        let result = Calibration::new(
            toy_combination(),
            4.3,
            nominal,
            "z",
            EstimationMethod::Coefficient,
            CalibrationMethod::Optimize,
        );
        assert!(matches!(
            result,
            Err(CalibError::MissingNominalValue { variable }) if variable == "Q1"
        ));
    }

    #[test]
    fn non_positive_target_beta_is_rejected() {
        let result = Calibration::new(
            toy_combination(),
            -1.0,
            toy_nominal(),
            "z",
            EstimationMethod::Coefficient,
            CalibrationMethod::Optimize,
        );
        assert!(matches!(result, Err(CalibError::InvalidTargetBeta { .. })));
    }

    #[test]
    fn results_before_run_are_a_typed_error() {
        let calib = Calibration::new(
            toy_combination(),
            4.3,
            toy_nominal(),
            "z",
            EstimationMethod::Coefficient,
            CalibrationMethod::Optimize,
        )
        .unwrap();
        assert!(matches!(calib.design_param_factors(), Err(CalibError::NotCalibrated)));
        assert!(calib.outcome().is_none());
    }

    #[test]
    fn calibration_method_names_parse() {
        assert_eq!("OPTIMIZE".parse::<CalibrationMethod>().unwrap(), CalibrationMethod::Optimize);
        assert_eq!("alpha".parse::<CalibrationMethod>().unwrap(), CalibrationMethod::Alpha);
        assert!(matches!(
            "newton".parse::<CalibrationMethod>(),
            Err(CalibError::UnknownCalibrationMethod { .. })
        ));
    }
}
