//! Dual solvers for precomputed-kernel epsilon-SVR
//!
//! This module implements the Sequential Minimal Optimization (SMO) algorithm
//! with second-order working-set selection, following LIBSVM's formulation of
//! the regression dual.

pub mod shrinking;
pub mod smo;

pub use self::shrinking::*;
pub use self::smo::*;
