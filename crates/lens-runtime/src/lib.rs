//! Runtime layer for Expense Lens.
//!
//! Fetches raw text from files or URLs, owns the per-user session state and
//! runs the background reload loop.

pub mod orchestrator;
pub mod session;
pub mod source;

pub use lens_core as core;
pub use lens_data as data;
