//! One assembled combination case: the concrete evaluation context handed to
//! a design-point solve.
use crate::distributions::RandomVariable;
use crate::form::limit_state::VariableValues;
use ndarray::Array1;
use std::sync::Arc;

/// Immutable per-case variable set.
///
/// `variables` holds the random (non-constant) variables in solver order:
/// resistance variables, then "other" variables, then one entry per declared
/// load variable in its max-or-pit role for this case. `constants` carries
/// every declared constant, with the design parameter already substituted at
/// its trial value.
#[derive(Debug, Clone)]
pub struct CombinationCase {
    label: String,
    variables: Vec<Arc<RandomVariable>>,
    constants: Vec<(String, f64)>,
}

impl CombinationCase {
    pub(crate) fn new(
        label: String, variables: Vec<Arc<RandomVariable>>, constants: Vec<(String, f64)>,
    ) -> Self {
        Self { label, variables, constants }
    }

    /// Case label, e.g. `"Q1_max"`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Random variables in solver order.
    pub fn variables(&self) -> &[Arc<RandomVariable>] {
        &self.variables
    }

    /// Declared constants as `(name, value)` pairs.
    pub fn constants(&self) -> &[(String, f64)] {
        &self.constants
    }

    /// Number of random variables, i.e. the dimension of the standardized
    /// space searched by the solvers.
    pub fn dimension(&self) -> usize {
        self.variables.len()
    }

    /// The random variable bound to `name` in this case, if any.
    pub fn variable(&self, name: &str) -> Option<&Arc<RandomVariable>> {
        self.variables.iter().find(|v| v.name() == name)
    }

    /// The constant value bound to `name` in this case, if any.
    pub fn constant(&self, name: &str) -> Option<f64> {
        self.constants.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Assemble the named value set for a limit-state evaluation from a
    /// vector of random-variable realizations in solver order.
    pub fn values_from(&self, x: &Array1<f64>) -> VariableValues {
        debug_assert_eq!(x.len(), self.variables.len());
        let mut values = VariableValues::new();
        for (var, value) in self.variables.iter().zip(x.iter()) {
            values.insert(var.name(), *value);
        }
        for (name, value) in &self.constants {
            values.insert(name, *value);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_case() -> CombinationCase {
        let r = Arc::new(RandomVariable::lognormal("R", 1.0, 0.15).unwrap());
        let q = Arc::new(RandomVariable::gumbel("Q1", 1.0, 0.2).unwrap());
        CombinationCase::new(
            "Q1_max".to_string(),
            vec![r, q],
            vec![("z".to_string(), 2.0), ("cg".to_string(), 0.4)],
        )
    }

    #[test]
    fn values_merge_randoms_and_constants() {
        let case = toy_case();
        let values = case.values_from(&ndarray::array![0.8, 1.4]);
        assert_eq!(values["R"], 0.8);
        assert_eq!(values["Q1"], 1.4);
        assert_eq!(values["z"], 2.0);
        assert_eq!(values["cg"], 0.4);
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn lookups_distinguish_randoms_from_constants() {
        let case = toy_case();
        assert_eq!(case.dimension(), 2);
        assert!(case.variable("R").is_some());
        assert!(case.variable("z").is_none());
        assert_eq!(case.constant("z"), Some(2.0));
        assert_eq!(case.constant("R"), None);
    }
}
