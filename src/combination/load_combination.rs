//! Load-combination declarations and per-case assembly.
//!
//! Purpose
//! -------
//! Hold the full probabilistic model once (limit-state function, the max/pit
//! pair behind every load variable, resistance and "other" variables,
//! constants, and the named combination cases), and assemble from it one
//! [`CombinationCase`] per `(case label, design-parameter value)` request.
//!
//! Key behaviors
//! -------------
//! - For a case's **active** load variables the annual-extreme ("max")
//!   distribution is substituted; every other load variable gets its
//!   point-in-time ("pit") parent. Resistance, other, and constant variables
//!   are attached unchanged.
//! - The design parameter is replaced by a fresh `Constant` carrying the
//!   trial value; shared [`RandomVariable`] instances are never mutated.
//! - All declaration errors surface eagerly from [`LoadCombination::new`] or
//!   [`LoadCombination::build_case`] as typed [`ComboError`] values.
//!
//! Invariants
//! ----------
//! - Variable identity is the **name**; role binding (max vs pit) is a
//!   case-local lookup, so two cases referencing `"Q1"` share nothing but the
//!   name and the declared pair.
//! - Every load variable appears in exactly one form per case, by
//!   construction.
use crate::combination::case::CombinationCase;
use crate::combination::errors::{ComboError, ComboResult};
use crate::distributions::RandomVariable;
use crate::form::limit_state::LimitState;
use std::collections::HashSet;
use std::sync::Arc;

/// The two roles a load variable can take across combination cases: the
/// annual-extreme distribution used when the variable's own case governs, and
/// the point-in-time parent used everywhere else.
#[derive(Debug, Clone)]
pub struct LoadPair {
    pub max: Arc<RandomVariable>,
    pub pit: Arc<RandomVariable>,
}

impl LoadPair {
    pub fn new(max: Arc<RandomVariable>, pit: Arc<RandomVariable>) -> Self {
        Self { max, pit }
    }
}

/// A validated load-combination model; see the module docs for semantics.
pub struct LoadCombination {
    limit_state: Arc<dyn LimitState>,
    loads: Vec<(String, LoadPair)>,
    resistance: Vec<Arc<RandomVariable>>,
    other: Vec<Arc<RandomVariable>>,
    constants: Vec<Arc<RandomVariable>>,
    cases: Vec<(String, Vec<String>)>,
}

impl LoadCombination {
    /// Construct and validate a load-combination model.
    ///
    /// # Arguments
    /// - `limit_state`: scalar limit-state function over named variables.
    /// - `loads`: per load-variable name, its max/pit distribution pair.
    /// - `resistance` / `other`: remaining random variables, in the order
    ///   result tables should list them.
    /// - `constants`: deterministic quantities, including the calibration
    ///   variable.
    /// - `cases`: per case label, the names of the load variables active (in
    ///   "max" form) for that case.
    ///
    /// # Errors
    /// - [`ComboError::NoLoadVariables`] / [`ComboError::NoCombinationCases`]
    ///   for empty declarations.
    /// - [`ComboError::MismatchedLoadPair`] when a pair's distributions do
    ///   not carry the entry's name.
    /// - [`ComboError::NotAConstant`] when a declared constant is not a
    ///   `Constant` marginal.
    /// - [`ComboError::DuplicateVariable`] when one name appears in several
    ///   declaration lists.
    /// - [`ComboError::EmptyCase`] / [`ComboError::UnknownLoadVariable`] for
    ///   malformed case declarations.
    pub fn new(
        limit_state: impl LimitState + 'static, loads: Vec<(String, LoadPair)>,
        resistance: Vec<Arc<RandomVariable>>, other: Vec<Arc<RandomVariable>>,
        constants: Vec<Arc<RandomVariable>>, cases: Vec<(String, Vec<String>)>,
    ) -> ComboResult<Self> {
        if loads.is_empty() {
            return Err(ComboError::NoLoadVariables);
        }
        if cases.is_empty() {
            return Err(ComboError::NoCombinationCases);
        }
        for (key, pair) in &loads {
            if pair.max.name() != key || pair.pit.name() != key {
                return Err(ComboError::MismatchedLoadPair {
                    key: key.clone(),
                    max_name: pair.max.name().to_string(),
                    pit_name: pair.pit.name().to_string(),
                });
            }
        }
        for constant in &constants {
            if !constant.is_constant() {
                return Err(ComboError::NotAConstant { name: constant.name().to_string() });
            }
        }
        let mut seen = HashSet::new();
        let all_names = resistance
            .iter()
            .map(|v| v.name())
            .chain(other.iter().map(|v| v.name()))
            .chain(loads.iter().map(|(key, _)| key.as_str()))
            .chain(constants.iter().map(|v| v.name()));
        for name in all_names {
            if !seen.insert(name.to_string()) {
                return Err(ComboError::DuplicateVariable { name: name.to_string() });
            }
        }
        for (label, active) in &cases {
            if active.is_empty() {
                return Err(ComboError::EmptyCase { label: label.clone() });
            }
            for name in active {
                if !loads.iter().any(|(key, _)| key == name) {
                    return Err(ComboError::UnknownLoadVariable {
                        case: label.clone(),
                        name: name.clone(),
                    });
                }
            }
        }
        Ok(Self {
            limit_state: Arc::new(limit_state),
            loads,
            resistance,
            other,
            constants,
            cases,
        })
    }

    /// Assemble the evaluation context for one combination case.
    ///
    /// `design_override` substitutes a fresh constant value for the named
    /// design parameter; pass `None` to keep every constant at its declared
    /// value.
    ///
    /// # Errors
    /// - [`ComboError::UnknownCase`] for an undeclared label.
    /// - [`ComboError::UnknownConstant`] when the override targets a name
    ///   that is not a declared constant.
    pub fn build_case(
        &self, label: &str, design_override: Option<(&str, f64)>,
    ) -> ComboResult<CombinationCase> {
        let active = self.active_loads(label)?;
        if let Some((name, _)) = design_override {
            if !self.constants.iter().any(|c| c.name() == name) {
                return Err(ComboError::UnknownConstant { name: name.to_string() });
            }
        }
        let mut variables =
            Vec::with_capacity(self.resistance.len() + self.other.len() + self.loads.len());
        variables.extend(self.resistance.iter().cloned());
        variables.extend(self.other.iter().cloned());
        for (key, pair) in &self.loads {
            let role = if active.iter().any(|name| name == key) { &pair.max } else { &pair.pit };
            variables.push(Arc::clone(role));
        }
        let constants = self
            .constants
            .iter()
            .map(|c| {
                let declared = c.constant_value().unwrap_or(c.mean());
                let value = match design_override {
                    Some((name, v)) if name == c.name() => v,
                    _ => declared,
                };
                (c.name().to_string(), value)
            })
            .collect();
        Ok(CombinationCase::new(label.to_string(), variables, constants))
    }

    /// Declared case labels, in declaration order.
    pub fn case_labels(&self) -> Vec<&str> {
        self.cases.iter().map(|(label, _)| label.as_str()).collect()
    }

    /// Names of the load variables active (in "max" form) for `label`.
    pub fn active_loads(&self, label: &str) -> ComboResult<&[String]> {
        self.cases
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, active)| active.as_slice())
            .ok_or_else(|| ComboError::UnknownCase { label: label.to_string() })
    }

    /// The shared limit-state function.
    pub fn limit_state(&self) -> &Arc<dyn LimitState> {
        &self.limit_state
    }

    pub fn resistance_names(&self) -> Vec<&str> {
        self.resistance.iter().map(|v| v.name()).collect()
    }

    pub fn other_names(&self) -> Vec<&str> {
        self.other.iter().map(|v| v.name()).collect()
    }

    pub fn load_names(&self) -> Vec<&str> {
        self.loads.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Every random-variable name in table order: resistance, then other,
    /// then loads.
    pub fn variable_names(&self) -> Vec<String> {
        self.resistance_names()
            .into_iter()
            .chain(self.other_names())
            .chain(self.load_names())
            .map(|s| s.to_string())
            .collect()
    }

    /// The declared constant named `name`, if any.
    pub fn constant(&self, name: &str) -> Option<&Arc<RandomVariable>> {
        self.constants.iter().find(|c| c.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::limit_state::VariableValues;

    fn toy_model() -> LoadCombination {
        let q1_max = Arc::new(RandomVariable::gumbel("Q1", 1.0, 0.2).unwrap());
        let q1_pit = Arc::new(RandomVariable::gumbel("Q1", 0.89, 0.2).unwrap());
        let q2_max = Arc::new(RandomVariable::gumbel("Q2", 1.0, 0.4).unwrap());
        let q2_pit = Arc::new(RandomVariable::gumbel("Q2", 0.77, 0.4).unwrap());
        let r = Arc::new(RandomVariable::lognormal("R", 1.0, 0.15).unwrap());
        let g = Arc::new(RandomVariable::normal("G", 1.0, 0.1).unwrap());
        let z = Arc::new(RandomVariable::constant("z", 1.0).unwrap());
        LoadCombination::new(
            |v: &VariableValues| v["z"] * v["R"] - (v["G"] + v["Q1"] + v["Q2"]),
            vec![
                ("Q1".to_string(), LoadPair::new(q1_max, q1_pit)),
                ("Q2".to_string(), LoadPair::new(q2_max, q2_pit)),
            ],
            vec![r],
            vec![g],
            vec![z],
            vec![
                ("Q1_max".to_string(), vec!["Q1".to_string()]),
                ("Q2_max".to_string(), vec!["Q2".to_string()]),
            ],
        )
        .expect("valid declarations")
    }

    #[test]
    fn active_load_gets_the_max_form_and_the_rest_the_pit_form() {
        let lc = toy_model();
        let case = lc.build_case("Q1_max", Some(("z", 3.0))).unwrap();
        let q1 = case.variable("Q1").unwrap();
        let q2 = case.variable("Q2").unwrap();
        // The max form of Q1 has mean 1.0; the pit form of Q2 has mean 0.77.
        assert!((q1.mean() - 1.0).abs() < 1e-12);
        assert!((q2.mean() - 0.77).abs() < 1e-12);
        assert_eq!(case.constant("z"), Some(3.0));
    }

    #[test]
    fn variable_order_is_resistance_other_loads() {
        let lc = toy_model();
        let case = lc.build_case("Q2_max", None).unwrap();
        let order: Vec<&str> = case.variables().iter().map(|v| v.name()).collect();
        assert_eq!(order, vec!["R", "G", "Q1", "Q2"]);
        assert_eq!(lc.variable_names(), vec!["R", "G", "Q1", "Q2"]);
    }

    #[test]
    fn building_an_undeclared_case_fails() {
        let lc = toy_model();
        assert!(matches!(
            lc.build_case("Q3_max", None),
            Err(ComboError::UnknownCase { .. })
        ));
    }

    #[test]
    fn overriding_an_unknown_constant_fails() {
        let lc = toy_model();
        assert!(matches!(
            lc.build_case("Q1_max", Some(("phi", 1.0))),
            Err(ComboError::UnknownConstant { .. })
        ));
    }

    #[test]
    fn case_referencing_an_undeclared_load_is_rejected_at_construction() {
        let q1_max = Arc::new(RandomVariable::gumbel("Q1", 1.0, 0.2).unwrap());
        let q1_pit = Arc::new(RandomVariable::gumbel("Q1", 0.89, 0.2).unwrap());
        let z = Arc::new(RandomVariable::constant("z", 1.0).unwrap());
        let result = LoadCombination::new(
            |v: &VariableValues| v["z"] - v["Q1"],
            vec![("Q1".to_string(), LoadPair::new(q1_max, q1_pit))],
            vec![],
            vec![],
            vec![z],
            vec![("Q9_max".to_string(), vec!["Q9".to_string()])],
        );
        assert!(matches!(result, Err(ComboError::UnknownLoadVariable { .. })));
    }

    #[test]
    fn non_constant_in_the_constant_list_is_rejected() {
        let q1_max = Arc::new(RandomVariable::gumbel("Q1", 1.0, 0.2).unwrap());
        let q1_pit = Arc::new(RandomVariable::gumbel("Q1", 0.89, 0.2).unwrap());
        let not_constant = Arc::new(RandomVariable::normal("z", 1.0, 0.1).unwrap());
        let result = LoadCombination::new(
            |v: &VariableValues| v["z"] - v["Q1"],
            vec![("Q1".to_string(), LoadPair::new(q1_max, q1_pit))],
            vec![],
            vec![],
            vec![not_constant],
            vec![("Q1_max".to_string(), vec!["Q1".to_string()])],
        );
        assert!(matches!(result, Err(ComboError::NotAConstant { .. })));
    }

    #[test]
    fn duplicate_names_across_lists_are_rejected() {
        let q1_max = Arc::new(RandomVariable::gumbel("Q1", 1.0, 0.2).unwrap());
        let q1_pit = Arc::new(RandomVariable::gumbel("Q1", 0.89, 0.2).unwrap());
        let r = Arc::new(RandomVariable::lognormal("Q1", 1.0, 0.15).unwrap());
        let z = Arc::new(RandomVariable::constant("z", 1.0).unwrap());
        let result = LoadCombination::new(
            |v: &VariableValues| v["z"] - v["Q1"],
            vec![("Q1".to_string(), LoadPair::new(q1_max, q1_pit))],
            vec![r],
            vec![],
            vec![z],
            vec![("Q1_max".to_string(), vec!["Q1".to_string()])],
        );
        assert!(matches!(result, Err(ComboError::DuplicateVariable { .. })));
    }
}
