//! Forecast retrieval
//!
//! [`ForecastSource`] is the seam the pipeline depends on; [`ForecastClient`]
//! implements it over HTTP.

use async_trait::async_trait;

use crate::Result;
use crate::models::{ForecastWindow, Location, ObservationRecord};

pub mod forecast;

pub use forecast::ForecastClient;

/// Anything that can provide hourly observation records for a location
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Records covering at least `[window.start, window.end)`, ascending by
    /// observation time. Implementations must not retry internally.
    async fn fetch(
        &self,
        location: Location,
        window: ForecastWindow,
        fields: &[String],
    ) -> Result<Vec<ObservationRecord>>;
}
