//! Integration tests for the full calibration pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end flow: declared distributions, through
//!   load-combination assembly and per-case design-point solves, to converged
//!   design-parameter values and factor tables.
//! - Pin the results of two reference scenarios (a linear and a nonlinear
//!   limit state) against independently computed values.
//! - Exercise both estimation methods and both calibration update rules and
//!   require that they agree on the underlying design points.
//!
//! Coverage
//! --------
//! - `distributions`: moment-matching constructors and quantiles used for
//!   nominal values.
//! - `combination`: max/pit substitution across two load variables and two
//!   cases.
//! - `form`: coefficient and matrix strategies inside the calibration loop.
//! - `calibration`: root-find and direct-alpha update rules, factor tables,
//!   governing-case selection, and idempotent re-evaluation.
//!
//! Exclusions
//! ----------
//! - Fine-grained validation of the marginal transforms, the root finder,
//!   and the constrained minimizer; those are covered by unit tests in their
//!   modules.
use approx::assert_abs_diff_eq;
use rust_reliability::{
    Calibration, CalibrationMethod, CaseTable, EstimationMethod, LoadCombination, LoadPair,
    RandomVariable, VariableValues,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tolerance against independently computed reference values.
const REF_TOL: f64 = 2e-3;

/// Tolerance between two of this crate's own configurations.
const CROSS_TOL: f64 = 1e-4;

/// Linear combination model: `g = z R - (cg G + c1 Q1 + c2 Q2)` with a
/// lognormal resistance, a normal permanent load, and two Gumbel load
/// variables given in annual-maximum and point-in-time form. Returns the
/// combination, the nominal values, and the target reliability index.
fn linear_setup() -> (LoadCombination, BTreeMap<String, f64>, f64) {
    let q1_max = Arc::new(RandomVariable::gumbel("Q1", 1.0, 0.2).unwrap());
    let q1_pit = Arc::new(RandomVariable::gumbel("Q1", 0.89, 0.2).unwrap());
    let q2_max = Arc::new(RandomVariable::gumbel("Q2", 1.0, 0.4).unwrap());
    let q2_pit = Arc::new(RandomVariable::gumbel("Q2", 0.77, 0.4).unwrap());
    let r = Arc::new(RandomVariable::lognormal("R", 1.0, 0.15).unwrap());
    let g_perm = Arc::new(RandomVariable::normal("G", 1.0, 0.1).unwrap());
    let z = Arc::new(RandomVariable::constant("z", 1.0).unwrap());
    let cg = Arc::new(RandomVariable::constant("cg", 0.4).unwrap());
    let c1 = Arc::new(RandomVariable::constant("c1", 0.6).unwrap());
    let c2 = Arc::new(RandomVariable::constant("c2", 0.3).unwrap());

    let mut nominal = BTreeMap::new();
    nominal.insert("R".to_string(), r.quantile(0.05).unwrap());
    nominal.insert("G".to_string(), g_perm.mean());
    nominal.insert("Q1".to_string(), q1_max.quantile(0.98).unwrap());
    nominal.insert("Q2".to_string(), q2_max.quantile(0.98).unwrap());

    let lc = LoadCombination::new(
        |v: &VariableValues| {
            v["z"] * v["R"] - (v["cg"] * v["G"] + v["c1"] * v["Q1"] + v["c2"] * v["Q2"])
        },
        vec![
            ("Q1".to_string(), LoadPair::new(q1_max, q1_pit)),
            ("Q2".to_string(), LoadPair::new(q2_max, q2_pit)),
        ],
        vec![r],
        vec![g_perm],
        vec![z, cg, c1, c2],
        vec![
            ("Q1_max".to_string(), vec!["Q1".to_string()]),
            ("Q2_max".to_string(), vec!["Q2".to_string()]),
        ],
    )
    .expect("valid declarations");
    (lc, nominal, 4.3)
}

/// Nonlinear combination model: `g = z wR R - wS (Q1 + Q2)` with model
/// uncertainties on both sides and normal load variables.
fn nonlinear_setup() -> (LoadCombination, BTreeMap<String, f64>, f64) {
    let q1_max = Arc::new(RandomVariable::normal("Q1", 30.0, 3.0).unwrap());
    let q1_pit = Arc::new(RandomVariable::normal("Q1", 15.0, 3.0).unwrap());
    let q2_max = Arc::new(RandomVariable::normal("Q2", 20.0, 2.0).unwrap());
    let q2_pit = Arc::new(RandomVariable::normal("Q2", 10.0, 2.0).unwrap());
    let w_r = Arc::new(RandomVariable::lognormal("wR", 1.0, 0.05).unwrap());
    let w_s = Arc::new(RandomVariable::lognormal("wS", 1.0, 0.10).unwrap());
    let r = Arc::new(RandomVariable::normal("R", 60.0, 6.0).unwrap());
    let z = Arc::new(RandomVariable::constant("z", 1.0).unwrap());

    let mut nominal = BTreeMap::new();
    nominal.insert("wR".to_string(), 1.0);
    nominal.insert("wS".to_string(), 1.0);
    nominal.insert("R".to_string(), r.quantile(0.05).unwrap());
    nominal.insert("Q1".to_string(), q1_max.quantile(0.95).unwrap());
    nominal.insert("Q2".to_string(), q2_max.quantile(0.95).unwrap());

    let lc = LoadCombination::new(
        |v: &VariableValues| v["z"] * v["wR"] * v["R"] - v["wS"] * (v["Q1"] + v["Q2"]),
        vec![
            ("Q1".to_string(), LoadPair::new(q1_max, q1_pit)),
            ("Q2".to_string(), LoadPair::new(q2_max, q2_pit)),
        ],
        vec![r, w_r],
        vec![w_s],
        vec![z],
        vec![
            ("Q1_max".to_string(), vec!["Q1".to_string()]),
            ("Q2_max".to_string(), vec!["Q2".to_string()]),
        ],
    )
    .expect("valid declarations");
    (lc, nominal, 3.7)
}

fn calibrated(
    setup: fn() -> (LoadCombination, BTreeMap<String, f64>, f64), est: EstimationMethod,
    rule: CalibrationMethod,
) -> Calibration {
    let (lc, nominal, target) = setup();
    let mut calib =
        Calibration::new(lc, target, nominal, "z", est, rule).expect("valid configuration");
    calib.run().expect("calibration converges");
    calib
}

/// Assert one table against reference data, row by row.
fn assert_table(table: &CaseTable, cols: &[&str], rows: &[(&str, &[f64])], tol: f64) {
    assert_eq!(table.variable_names(), cols);
    for (case, expected) in rows {
        for (name, value) in cols.iter().zip(expected.iter()) {
            let actual = table.get(case, name).unwrap_or_else(|| {
                panic!("missing table entry ({case}, {name})");
            });
            assert!(
                (actual - value).abs() <= tol,
                "({case}, {name}): got {actual}, expected {value} within {tol}"
            );
        }
    }
}

fn assert_tables_match(a: &CaseTable, b: &CaseTable, tol: f64) {
    assert_eq!(a.case_labels(), b.case_labels());
    assert_eq!(a.variable_names(), b.variable_names());
    for case in a.case_labels() {
        for name in a.variable_names() {
            let left = a.get(case, name).unwrap();
            let right = b.get(case, name).unwrap();
            assert!(
                (left - right).abs() <= tol,
                "({case}, {name}): {left} vs {right} beyond {tol}"
            );
        }
    }
}

#[test]
fn linear_coefficient_optimize_matches_reference() {
    let calib = calibrated(linear_setup, EstimationMethod::Coefficient, CalibrationMethod::Optimize);
    let outcome = calib.outcome().unwrap();

    assert_table(
        outcome.x_star(),
        &["R", "G", "Q1", "Q2", "z"],
        &[
            ("Q1_max", &[0.6553, 1.0371, 1.6236, 2.0171, 3.0431]),
            ("Q2_max", &[0.6550, 1.0371, 1.5129, 2.2458, 3.0477]),
        ],
        REF_TOL,
    );
    assert_table(
        outcome.resistance_factors(),
        &["R"],
        &[("Q1_max", &[0.8469]), ("Q2_max", &[0.8465])],
        REF_TOL,
    );
    assert_table(
        outcome.load_factors(),
        &["G", "Q1", "Q2"],
        &[
            ("Q1_max", &[1.0371, 1.0692, 1.1026]),
            ("Q2_max", &[1.0371, 1.0692, 1.1026]),
        ],
        REF_TOL,
    );
    assert_table(
        outcome.combination_factors(),
        &["G", "Q1", "Q2"],
        &[("Q1_max", &[1.0, 1.0, 0.8982]), ("Q2_max", &[1.0, 0.9318, 1.0])],
        REF_TOL,
    );

    let design = calib.design_param_factors().unwrap();
    assert_abs_diff_eq!(design[0], 3.04313, epsilon = REF_TOL);
    assert_abs_diff_eq!(design[1], 3.04771, epsilon = REF_TOL);

    let betas = calib.beta_at_design_param(outcome.design_value()).unwrap();
    assert_abs_diff_eq!(betas[0], 4.30647, epsilon = REF_TOL);
    assert_abs_diff_eq!(betas[1], 4.30000, epsilon = REF_TOL);

    for beta in outcome.achieved_betas() {
        assert_abs_diff_eq!(*beta, 4.3, epsilon = 1e-4);
    }
    assert_eq!(outcome.governing_case(), "Q1_max");
}

#[test]
fn linear_matrix_optimize_reproduces_the_coefficient_tables() {
    let reference =
        calibrated(linear_setup, EstimationMethod::Coefficient, CalibrationMethod::Optimize);
    let calib = calibrated(linear_setup, EstimationMethod::Matrix, CalibrationMethod::Optimize);
    let a = reference.outcome().unwrap();
    let b = calib.outcome().unwrap();
    assert_tables_match(a.x_star(), b.x_star(), CROSS_TOL);
    assert_tables_match(a.resistance_factors(), b.resistance_factors(), CROSS_TOL);
    assert_tables_match(a.load_factors(), b.load_factors(), CROSS_TOL);
    assert_tables_match(a.combination_factors(), b.combination_factors(), CROSS_TOL);
    for (x, y) in a.design_values().iter().zip(b.design_values().iter()) {
        assert_abs_diff_eq!(x, y, epsilon = CROSS_TOL);
    }
}

#[test]
fn linear_matrix_alpha_reproduces_the_coefficient_tables() {
    let reference =
        calibrated(linear_setup, EstimationMethod::Coefficient, CalibrationMethod::Optimize);
    let calib = calibrated(linear_setup, EstimationMethod::Matrix, CalibrationMethod::Alpha);
    let a = reference.outcome().unwrap();
    let b = calib.outcome().unwrap();
    assert_tables_match(a.x_star(), b.x_star(), CROSS_TOL);
    assert_tables_match(a.resistance_factors(), b.resistance_factors(), CROSS_TOL);
    assert_tables_match(a.load_factors(), b.load_factors(), CROSS_TOL);
    assert_tables_match(a.combination_factors(), b.combination_factors(), CROSS_TOL);
}

#[test]
fn nonlinear_coefficient_optimize_matches_reference() {
    let calib =
        calibrated(nonlinear_setup, EstimationMethod::Coefficient, CalibrationMethod::Optimize);
    let outcome = calib.outcome().unwrap();

    assert_table(
        outcome.x_star(),
        &["R", "wR", "wS", "Q1", "Q2", "z"],
        &[
            ("Q1_max", &[44.4005, 0.9519, 1.2050, 33.8055, 11.6913, 1.2971]),
            ("Q2_max", &[44.7632, 0.9526, 1.2014, 19.1578, 21.8479, 1.1553]),
        ],
        // Coordinates up to ~45 in magnitude; keep the same relative margin.
        0.05,
    );
    assert_table(
        outcome.resistance_factors(),
        &["R", "wR"],
        &[("Q1_max", &[0.8857, 0.9519]), ("Q2_max", &[0.8929, 0.9526])],
        REF_TOL,
    );
    assert_table(
        outcome.load_factors(),
        &["wS", "Q1", "Q2"],
        &[
            ("Q1_max", &[1.2050, 0.9677, 0.9381]),
            ("Q2_max", &[1.2014, 0.9677, 0.9381]),
        ],
        REF_TOL,
    );
    assert_table(
        outcome.combination_factors(),
        &["wS", "Q1", "Q2"],
        &[("Q1_max", &[1.0, 1.0, 0.5351]), ("Q2_max", &[1.0, 0.5667, 1.0])],
        REF_TOL,
    );

    // Per-case design values stay distinct; they are never averaged.
    let design = calib.design_param_factors().unwrap();
    assert_abs_diff_eq!(design[0], 1.2971, epsilon = REF_TOL);
    assert_abs_diff_eq!(design[1], 1.1553, epsilon = REF_TOL);
    assert!((design[0] - design[1]).abs() > 0.1);

    let betas = calib.beta_at_design_param(outcome.design_value()).unwrap();
    assert_abs_diff_eq!(betas[0], 3.7001, epsilon = REF_TOL);
    assert_abs_diff_eq!(betas[1], 4.2834, epsilon = REF_TOL);
    // The governing case is the one with the larger index at the design value.
    assert_eq!(outcome.governing_case(), "Q2_max");
}

#[test]
fn nonlinear_matrix_runs_reproduce_the_coefficient_tables() {
    let reference =
        calibrated(nonlinear_setup, EstimationMethod::Coefficient, CalibrationMethod::Optimize);
    for rule in [CalibrationMethod::Optimize, CalibrationMethod::Alpha] {
        let calib = calibrated(nonlinear_setup, EstimationMethod::Matrix, rule);
        let a = reference.outcome().unwrap();
        let b = calib.outcome().unwrap();
        assert_tables_match(a.resistance_factors(), b.resistance_factors(), CROSS_TOL);
        assert_tables_match(a.load_factors(), b.load_factors(), CROSS_TOL);
        assert_tables_match(a.combination_factors(), b.combination_factors(), CROSS_TOL);
    }
}

#[test]
fn beta_reevaluation_is_idempotent() {
    let calib = calibrated(linear_setup, EstimationMethod::Coefficient, CalibrationMethod::Optimize);
    let z = calib.outcome().unwrap().design_value();
    let first = calib.beta_at_design_param(z).unwrap();
    let second = calib.beta_at_design_param(z).unwrap();
    assert_eq!(first, second);
}

#[test]
fn rerunning_reconverges_to_the_same_outcome() {
    let (lc, nominal, target) = linear_setup();
    let mut calib = Calibration::new(
        lc,
        target,
        nominal,
        "z",
        EstimationMethod::Coefficient,
        CalibrationMethod::Optimize,
    )
    .unwrap();
    let first = calib.run().unwrap().x_star().clone();
    let second = calib.run().unwrap().x_star().clone();
    assert_tables_match(&first, &second, 1e-9);
}

#[test]
fn design_value_is_monotone_in_the_target() {
    let mut designs = Vec::new();
    for target in [4.0, 4.3] {
        let (lc, nominal, _) = linear_setup();
        let mut calib = Calibration::new(
            lc,
            target,
            nominal,
            "z",
            EstimationMethod::Coefficient,
            CalibrationMethod::Optimize,
        )
        .unwrap();
        designs.push(calib.run().unwrap().design_value());
    }
    assert!(
        designs[1] >= designs[0],
        "raising the target index must not lower the design value: {designs:?}"
    );
}
