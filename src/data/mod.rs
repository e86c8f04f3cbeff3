//! Loading and saving kernel matrices
//!
//! Kernel matrices normally come straight from the engine. The text format
//! here lets precomputed matrices be stored, shared and evaluated offline.

pub mod matrix_file;

pub use self::matrix_file::*;
