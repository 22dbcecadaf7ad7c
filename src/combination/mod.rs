//! Load combinations: declaration, validation, and per-case assembly.
//!
//! Purpose
//! -------
//! Turn a declared probabilistic model (load variables with max/pit pairs,
//! resistance and other random variables, constants, named cases) into the
//! concrete, immutable [`CombinationCase`] objects the design-point solvers
//! consume, one per `(case, design-parameter value)` trial.
pub mod case;
pub mod errors;
pub mod load_combination;

pub use self::case::CombinationCase;
pub use self::errors::{ComboError, ComboResult};
pub use self::load_combination::{LoadCombination, LoadPair};
