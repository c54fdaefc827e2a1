//! Error types for the soda_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for soda_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Brand or variant is not in the catalog
    #[error("Unknown drink: brand '{brand}', variant '{variant}'")]
    NotFound { brand: String, variant: String },

    /// Consumed volume was zero, negative or not a number
    #[error("Invalid volume: {0} fl oz (must be a positive number)")]
    InvalidVolume(f64),

    /// Goal store could not be read
    #[error("Goals unavailable: {0}")]
    GoalNotConfigured(String),

    /// Goal values out of range
    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    #[error("Unknown serving size '{0}' (use a listed size or a number of fl oz)")]
    UnknownSize(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn not_found(brand: &str, variant: &str) -> Self {
        Error::NotFound {
            brand: brand.to_string(),
            variant: variant.to_string(),
        }
    }
}
