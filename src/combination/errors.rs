//! Configuration errors for load-combination declarations and case building.
//!
//! These are detected eagerly, at `LoadCombination::new` or `build_case`
//! time, and are never retried: a malformed declaration cannot converge its
//! way out of being malformed.

/// Result alias for combination-layer operations.
pub type ComboResult<T> = Result<T, ComboError>;

/// Configuration errors raised while validating combination declarations or
/// assembling a per-case variable set.
#[derive(Debug, Clone, PartialEq)]
pub enum ComboError {
    /// The requested case label was never declared.
    UnknownCase { label: String },

    /// A case activates a load variable absent from the max/pit dictionary.
    UnknownLoadVariable { case: String, name: String },

    /// The max and pit distributions of one load entry carry different names.
    MismatchedLoadPair { key: String, max_name: String, pit_name: String },

    /// The same variable name appears in more than one declaration list.
    DuplicateVariable { name: String },

    /// A declared constant is not a `Constant` marginal.
    NotAConstant { name: String },

    /// A value override targets a name that is not a declared constant.
    UnknownConstant { name: String },

    /// No load variables were declared.
    NoLoadVariables,

    /// No combination cases were declared.
    NoCombinationCases,

    /// A combination case activates no load variables.
    EmptyCase { label: String },
}

impl std::error::Error for ComboError {}

impl std::fmt::Display for ComboError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComboError::UnknownCase { label } => {
                write!(f, "Combination case `{label}` was never declared.")
            }
            ComboError::UnknownLoadVariable { case, name } => {
                write!(
                    f,
                    "Case `{case}` activates load variable `{name}`, which is absent from the \
                     declared max/pit dictionary."
                )
            }
            ComboError::MismatchedLoadPair { key, max_name, pit_name } => {
                write!(
                    f,
                    "Load entry `{key}` pairs distributions named `{max_name}` (max) and \
                     `{pit_name}` (pit); all three names must match."
                )
            }
            ComboError::DuplicateVariable { name } => {
                write!(f, "Variable `{name}` is declared more than once.")
            }
            ComboError::NotAConstant { name } => {
                write!(f, "Declared constant `{name}` is not a Constant distribution.")
            }
            ComboError::UnknownConstant { name } => {
                write!(f, "Override targets `{name}`, which is not a declared constant.")
            }
            ComboError::NoLoadVariables => write!(f, "No load variables were declared."),
            ComboError::NoCombinationCases => write!(f, "No combination cases were declared."),
            ComboError::EmptyCase { label } => {
                write!(f, "Combination case `{label}` activates no load variables.")
            }
        }
    }
}
