//! Cross-validated AUC evaluation of kernel matrices

pub mod cross_validation;
pub mod folds;
pub mod surrogate;

pub use self::cross_validation::*;
pub use self::folds::*;
pub use self::surrogate::*;
