//! # Estate Core
//!
//! Shared vocabulary of the real-estate dashboard: the chart catalog that maps
//! nav categories to precomputed chart images, and the data model exchanged
//! with the price-prediction backend.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ESTATE DASHBOARD                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  catalog     ChartCategory ──► ChartGroup { title, paths }    │
//! │  prediction  Metadata ──► form controls ──► Request ──► Result│
//! │  calendar    month numbers ──► month names                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod calendar;
pub mod catalog;
pub mod prediction;

pub use calendar::month_name;
pub use catalog::{ChartCatalog, ChartCategory, ChartGroup, TransactionType};
pub use prediction::{
    Bounds, Defaults, PredictionMetadata, PredictionRequest, PredictionResult, ValidationBounds,
};

/// Result type for estate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared across the dashboard crates
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Missing element: {0}")]
    MissingElement(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unknown chart category: {0}")]
    UnknownCategory(String),

    #[error("Unknown city: {0}")]
    UnknownCity(String),

    #[error("Unknown view: {0}")]
    UnknownView(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("View '{0}' is no longer active")]
    StaleView(String),

    #[error("Failed to load {path}: {reason}")]
    Load { path: String, reason: String },
}

impl Error {
    /// True for failures caused by the bounded request timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}
