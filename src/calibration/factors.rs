//! Case-by-variable result tables and partial-factor derivation.
//!
//! The core computes with vectors keyed by `(case label, variable name)`;
//! [`CaseTable`] materializes those into a rectangular table only at the
//! result boundary. Factor derivation is deterministic in the stored design
//! points and nominal values, so recomputing from the same inputs is
//! idempotent.
use crate::form::design_point::DesignPoint;
use ndarray::{Array2, ArrayView1};

/// Rectangular `(case x variable) -> scalar` table with ordered labels.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseTable {
    rows: Vec<String>,
    cols: Vec<String>,
    values: Array2<f64>,
}

impl CaseTable {
    pub(crate) fn new(rows: Vec<String>, cols: Vec<String>) -> Self {
        let values = Array2::zeros((rows.len(), cols.len()));
        Self { rows, cols, values }
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[(row, col)] = value;
    }

    /// Case labels, in row order.
    pub fn case_labels(&self) -> &[String] {
        &self.rows
    }

    /// Variable names, in column order.
    pub fn variable_names(&self) -> &[String] {
        &self.cols
    }

    /// Scalar at `(case, variable)`, if both labels exist.
    pub fn get(&self, case: &str, variable: &str) -> Option<f64> {
        let row = self.rows.iter().position(|r| r == case)?;
        let col = self.cols.iter().position(|c| c == variable)?;
        Some(self.values[(row, col)])
    }

    /// One case's row, if the label exists.
    pub fn row(&self, case: &str) -> Option<ArrayView1<'_, f64>> {
        let row = self.rows.iter().position(|r| r == case)?;
        Some(self.values.row(row))
    }

    /// Raw storage, rows in case order and columns in variable order.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }
}

impl std::fmt::Display for CaseTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label_width =
            self.rows.iter().map(|r| r.len()).max().unwrap_or(0).max(4);
        write!(f, "{:label_width$}", "")?;
        for col in &self.cols {
            write!(f, " {col:>12}")?;
        }
        writeln!(f)?;
        for (i, row) in self.rows.iter().enumerate() {
            write!(f, "{row:label_width$}")?;
            for j in 0..self.cols.len() {
                write!(f, " {:>12.4}", self.values[(i, j)])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Inputs to the factor derivation, borrowed from the calibration engine.
pub(crate) struct FactorInputs<'a> {
    pub resistance_names: Vec<&'a str>,
    pub other_names: Vec<&'a str>,
    pub load_names: Vec<&'a str>,
    /// Per load name, the label of the case where it is active ("max"), if any.
    pub own_case: Vec<Option<&'a str>>,
    pub calib_var: &'a str,
    pub nominal: &'a dyn Fn(&str) -> f64,
    pub labels: &'a [String],
    pub design_values: &'a [f64],
    pub design_points: &'a [DesignPoint],
}

/// Derived factor tables: design-point coordinates, resistance factors,
/// load factors, and combination factors.
pub(crate) struct FactorTables {
    pub x_star: CaseTable,
    pub phi: CaseTable,
    pub gamma: CaseTable,
    pub psi: CaseTable,
}

/// Derive every factor table from converged per-case design points.
///
/// - `x*`: per-case coordinates for every random variable plus the
///   calibration variable at its per-case converged value.
/// - `phi`: `x*_r / nominal_r` per resistance variable.
/// - `gamma`: for "other" variables the per-case ratio `x*_v / nominal_v`;
///   for load variables the ratio taken from the variable's own "max" case,
///   constant across rows.
/// - `psi`: 1.0 for "other" variables and for a case's own active load
///   variable; otherwise `(x*_v / nominal_v) / gamma_v`.
pub(crate) fn derive_tables(inputs: &FactorInputs<'_>) -> FactorTables {
    let labels = inputs.labels.to_vec();
    let nominal = inputs.nominal;

    let mut x_cols: Vec<String> = inputs
        .resistance_names
        .iter()
        .chain(inputs.other_names.iter())
        .chain(inputs.load_names.iter())
        .map(|s| s.to_string())
        .collect();
    x_cols.push(inputs.calib_var.to_string());
    let mut x_star = CaseTable::new(labels.clone(), x_cols);
    for (i, dp) in inputs.design_points.iter().enumerate() {
        let mut j = 0;
        for name in
            inputs.resistance_names.iter().chain(inputs.other_names.iter()).chain(inputs.load_names.iter())
        {
            x_star.set(i, j, dp.value_of(name).unwrap_or(f64::NAN));
            j += 1;
        }
        x_star.set(i, j, inputs.design_values[i]);
    }

    let phi_cols: Vec<String> = inputs.resistance_names.iter().map(|s| s.to_string()).collect();
    let mut phi = CaseTable::new(labels.clone(), phi_cols);
    for (i, dp) in inputs.design_points.iter().enumerate() {
        for (j, name) in inputs.resistance_names.iter().enumerate() {
            let value = dp.value_of(name).unwrap_or(f64::NAN);
            phi.set(i, j, value / nominal(name));
        }
    }

    // Load factors for load variables come from the variable's own governing
    // case; "other" variables keep their per-case ratio.
    let own_case_ratio: Vec<f64> = inputs
        .load_names
        .iter()
        .zip(inputs.own_case.iter())
        .map(|(name, own)| match own {
            Some(label) => inputs
                .design_points
                .iter()
                .find(|dp| dp.case() == *label)
                .and_then(|dp| dp.value_of(name))
                .map(|x| x / nominal(name))
                .unwrap_or(f64::NAN),
            None => f64::NAN,
        })
        .collect();

    let gamma_cols: Vec<String> = inputs
        .other_names
        .iter()
        .chain(inputs.load_names.iter())
        .map(|s| s.to_string())
        .collect();
    let mut gamma = CaseTable::new(labels.clone(), gamma_cols.clone());
    let mut psi = CaseTable::new(labels, gamma_cols);
    for (i, dp) in inputs.design_points.iter().enumerate() {
        let mut j = 0;
        for name in &inputs.other_names {
            let ratio = dp.value_of(name).unwrap_or(f64::NAN) / nominal(name);
            gamma.set(i, j, ratio);
            psi.set(i, j, 1.0);
            j += 1;
        }
        for (k, name) in inputs.load_names.iter().enumerate() {
            let gamma_v = own_case_ratio[k];
            gamma.set(i, j, gamma_v);
            let active = inputs.own_case[k] == Some(dp.case());
            if active {
                psi.set(i, j, 1.0);
            } else {
                let ratio = dp.value_of(name).unwrap_or(f64::NAN) / nominal(name);
                psi.set(i, j, ratio / gamma_v);
            }
            j += 1;
        }
    }

    FactorTables { x_star, phi, gamma, psi }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup_by_labels() {
        let mut table = CaseTable::new(
            vec!["Q1_max".to_string(), "Q2_max".to_string()],
            vec!["R".to_string(), "G".to_string()],
        );
        table.set(0, 0, 0.65);
        table.set(1, 1, 1.04);
        assert_eq!(table.get("Q1_max", "R"), Some(0.65));
        assert_eq!(table.get("Q2_max", "G"), Some(1.04));
        assert_eq!(table.get("Q3_max", "R"), None);
        assert_eq!(table.get("Q1_max", "Z"), None);
    }

    #[test]
    fn display_renders_one_row_per_case() {
        let mut table =
            CaseTable::new(vec!["a".to_string()], vec!["x".to_string(), "y".to_string()]);
        table.set(0, 0, 1.0);
        table.set(0, 1, 2.5);
        let rendered = table.to_string();
        assert!(rendered.contains("x"));
        assert!(rendered.contains("2.5000"));
    }
}
