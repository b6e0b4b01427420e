//! Data models for the irrigation forecast pipeline
//!
//! - Location: field coordinates and the forecast window
//! - Observation: hourly records and raw field values from the forecast API

pub mod location;
pub mod observation;

pub use location::{ForecastWindow, Location};
pub use observation::{FieldValue, OBSERVATION_TIME, ObservationRecord};
