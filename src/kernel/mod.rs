//! Kernel matrices and the kernel engine adapter

pub mod config;
pub mod engine;
pub mod matrix;
pub mod native;
pub mod traits;

pub use self::config::*;
pub use self::engine::*;
pub use self::matrix::*;
pub use self::native::*;
pub use self::traits::*;
