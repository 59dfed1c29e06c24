//! Stylish Common Library
//!
//! Records shared by the verification suite and the read-only adapter over
//! the Stylish store that supplies ground truth.

pub mod db;
pub mod error;
pub mod types;

pub use db::{DataSource, Database};
pub use error::{Error, Result};
pub use types::*;

/// Suite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
