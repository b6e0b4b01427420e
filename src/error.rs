//! Error types for the irrigation forecast pipeline

use thiserror::Error;

/// Main error type for the forecast and soil-water pipeline
#[derive(Error, Debug)]
pub enum IrrigationError {
    /// A requested field is absent from an observation record
    #[error("Missing field '{field}' in observation record {row}")]
    MissingField { field: String, row: usize },

    /// Rows of a table do not all have the same length
    #[error("Ragged table: row {row} has {found} values, expected {expected}")]
    RaggedTable {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Chunk size (or simulated chunk length) of zero
    #[error("Invalid chunk size: {size}")]
    InvalidChunkSize { size: usize },

    /// Transport failure or non-success status from an external service
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable {
        service: &'static str,
        message: String,
    },

    /// External service answered with something that is not the expected shape
    #[error("Unexpected {service} response: {message}")]
    UpstreamFormat {
        service: &'static str,
        message: String,
    },

    /// Fewer ET estimates than hours in the simulated window require
    #[error("Insufficient ET estimates: {required} required, {available} available")]
    InsufficientEstimates { required: usize, available: usize },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request input errors (coordinates, field lists)
    #[error("Invalid input: {message}")]
    Validation { message: String },
}

impl IrrigationError {
    pub fn missing_field<S: Into<String>>(field: S, row: usize) -> Self {
        Self::MissingField {
            field: field.into(),
            row,
        }
    }

    pub fn unavailable<S: Into<String>>(service: &'static str, message: S) -> Self {
        Self::UpstreamUnavailable {
            service,
            message: message.into(),
        }
    }

    pub fn format<S: Into<String>>(service: &'static str, message: S) -> Self {
        Self::UpstreamFormat {
            service,
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for failures caused by an external service rather than by our inputs
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::UpstreamFormat { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UpstreamUnavailable { service, .. } => {
                format!("Unable to reach the {service}. Please try again later.")
            }
            Self::UpstreamFormat { service, .. } => {
                format!("The {service} returned data that could not be read.")
            }
            Self::MissingField { field, .. } => {
                format!("Forecast data does not contain the field '{field}'.")
            }
            Self::InsufficientEstimates { .. } => {
                "Not enough evapotranspiration estimates to cover the chart window.".to_string()
            }
            Self::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            Self::Validation { message } => format!("Invalid request: {message}"),
            Self::RaggedTable { .. } | Self::InvalidChunkSize { .. } => {
                "Forecast data could not be prepared for charting.".to_string()
            }
        }
    }
}
