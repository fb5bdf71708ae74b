//! Error types used by the crate.
//!
//! Errors fall into three groups:
//!
//! * [`ValidationError`]: the user asked for something that cannot be done (search without
//!   criteria, buffer without a selected feature, ...). The operation is aborted before any state
//!   is changed, and the user is notified synchronously.
//! * [`QueryError`]: the feature service failed. The failure is logged and reported with a
//!   generic notice. Results that are already displayed stay as they are.
//! * [`BufferError`]: the geometry collaborator could not build a buffer.
//!
//! None of them is fatal: the session stays interactive after any error.

use canopy_types::error::CanopyTypesError;
use thiserror::Error;

/// Invalid user input. Reported to the user, never logged as a failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// Search was requested without a name, road or area.
    #[error("Please enter a tree name or select a road/area")]
    NoCriteria,
    /// Buffer was requested before a feature was selected.
    #[error("Please click a tree on the map first.")]
    NoFeatureSelected,
    /// Buffer distance is not a number.
    #[error("Enter a valid distance in meters: '{0}' is not a number.")]
    InvalidDistance(String),
    /// Buffer distance is zero, negative or NaN.
    #[error("Enter a valid distance in meters: {0} is not positive.")]
    NonPositiveDistance(f64),
    /// Cluster mode was toggled before its renderer was prepared.
    #[error("Clustering is not available yet.")]
    ClusterNotReady,
    /// Row index outside of the displayed table.
    #[error("row {0} is not displayed")]
    UnknownRow(usize),
    /// Column index outside of the displayed table.
    #[error("column {0} is not displayed")]
    UnknownColumn(usize),
}

/// Failure of the remote feature service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    /// Could not reach the service.
    #[error("failed to load data: {0}")]
    Network(String),
    /// The service answered with an error object.
    #[error("service error {code}: {message}")]
    Service {
        /// Error code reported by the service.
        code: i64,
        /// Error message reported by the service.
        message: String,
    },
    /// The response could not be decoded.
    #[error("failed to decode response: {0}")]
    Decoding(String),
    /// The source does not support the requested operation.
    #[error("unsupported query: {0}")]
    Unsupported(String),
}

/// Failure of the buffer geometry collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BufferError {
    /// The geometry has no points to buffer.
    #[error("cannot buffer an empty geometry")]
    EmptyGeometry,
    /// The distance cannot be used for buffering.
    #[error("invalid buffer distance: {0}")]
    InvalidDistance(f64),
}

/// Crate error type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CanopyError {
    /// Invalid user input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Feature service failure.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// Buffer computation failure.
    #[error(transparent)]
    Buffer(#[from] BufferError),
    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<CanopyTypesError> for BufferError {
    fn from(_value: CanopyTypesError) -> Self {
        Self::EmptyGeometry
    }
}

impl From<CanopyTypesError> for QueryError {
    fn from(value: CanopyTypesError) -> Self {
        Self::Decoding(value.to_string())
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decoding(value.to_string())
    }
}

#[cfg(all(feature = "http", not(target_arch = "wasm32")))]
impl From<reqwest::Error> for QueryError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decoding(value.to_string())
        } else {
            Self::Network(value.to_string())
        }
    }
}
