pub mod error;
pub mod limits;
pub mod solvers;
pub mod time_value;
pub mod types;

#[cfg(feature = "mortgage")]
pub mod mortgage;

#[cfg(feature = "fixed_income")]
pub mod fixed_income;

#[cfg(feature = "xirr")]
pub mod xirr;

pub use error::FinCalcError;
pub use limits::{GuardConfig, SolverBudget};
pub use types::*;

/// Standard result type for all fincalc operations
pub type FinCalcResult<T> = Result<T, FinCalcError>;
