//! Shared vocabulary for Expense Lens.
//!
//! Record models and sentinels, the error type, display palette, number
//! formatting and the command-line settings used by every other crate.

pub mod error;
pub mod formatting;
pub mod models;
pub mod palette;
pub mod settings;

pub use error::{LensError, Result};
