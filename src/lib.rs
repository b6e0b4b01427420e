//! `irrigation-forecast` - weather and soil-water-level data for irrigation dashboards
//!
//! This library fetches hourly forecasts, reshapes them into chart columns,
//! asks an ET estimation service for evapotranspiration per 3-hour chunk and
//! simulates the resulting soil-water level.

pub mod api;
pub mod chart;
pub mod chunk;
pub mod config;
pub mod error;
pub mod et;
pub mod http;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod rain;
pub mod table;
pub mod water_balance;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use chart::{GraphField, SwlChart, WeatherChart};
pub use config::IrrigationConfig;
pub use error::IrrigationError;
pub use et::{EtChunk, EtClient, EtEstimator, estimate_all};
pub use models::{FieldValue, ForecastWindow, Location, ObservationRecord};
pub use pipeline::{HttpPipeline, WeatherPipeline};
pub use water_balance::{SimulationParams, SwlPoint, SwlSeries, simulate};
pub use weather::{ForecastClient, ForecastSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, IrrigationError>;
