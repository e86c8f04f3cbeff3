//! Ranking metrics for scored test sets

pub mod roc;

pub use self::roc::*;
