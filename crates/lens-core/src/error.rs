use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by Expense Lens.
#[derive(Error, Debug)]
pub enum LensError {
    /// A local data file could not be opened or read.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A remote source answered with a non-success status or could not be reached.
    #[error("Failed to fetch {source_name}: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    /// The session could not complete a load; previous data is kept.
    #[error("Load failed: {0}")]
    LoadFailed(String),

    /// A month range whose start sorts after its end.
    #[error("Invalid month range: {from} > {to}")]
    InvalidRange { from: String, to: String },

    /// A facet value that is not part of the current catalog.
    #[error("Unknown {facet} value: {value}")]
    UnknownFacetValue { facet: String, value: String },

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the lens crates.
pub type Result<T> = std::result::Result<T, LensError>;
