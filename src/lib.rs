//! Orrery: Solar System orbit plots from JPL Horizons ephemerides
//!
//! This crate looks up heliocentric position vectors for the eight planets
//! over their most recent full orbit, closes each orbit into a loop, and
//! draws an inclined projection of the whole system as a figure file.
//!
//! Positions are never integrated from physical laws; every sample comes from
//! an [`EphemerisSource`].

use thiserror::Error;

pub mod bodies;
pub mod horizons;
pub mod orbit;
pub mod render;

// Re-export commonly used types
pub use bodies::Body;
pub use horizons::{
    CachedSource, EphemerisQuery, EphemerisSource, HorizonsClient, StaticSource, VectorRow,
};
pub use orbit::{OrbitDataset, OrbitPath};
pub use render::{OutputFormat, PlotConfig};

/// Main error type for the orrery library
#[derive(Debug, Error)]
pub enum OrreryError {
    /// The ephemeris service could not be reached or refused the request
    #[error("Ephemeris source unavailable for {body}: {reason}")]
    DataSourceUnavailable {
        /// Body whose request failed
        body: Body,
        /// Description of the failure
        reason: String,
    },

    /// The source returned fewer rows than one full orbit needs
    #[error(
        "Insufficient data for body {} ({body}): expected {expected} rows, got {received}",
        .body.id()
    )]
    InsufficientData {
        body: Body,
        expected: usize,
        received: usize,
    },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Malformed ephemeris response: {0}")]
    MalformedResponse(String),

    /// Coordinate sequences that break the closed-orbit shape
    #[error("Invalid orbit path: expected {expected}, got {got}")]
    InvalidPath { expected: String, got: String },

    #[error("Invalid plot configuration: {0}")]
    InvalidConfig(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for orrery operations
pub type Result<T> = std::result::Result<T, OrreryError>;
