//! Evapotranspiration estimates per 3-hour chunk
//!
//! Each chunk of hourly weather is posted to the ET estimation service, which
//! answers with a single cumulative ET value for that chunk. [`estimate_all`]
//! issues every chunk request at once and recombines the answers in chunk
//! order; one failure fails the whole set.

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::config::EtConfig;
use crate::http::{build_client, transport_error};
use crate::models::FieldValue;
use crate::{IrrigationError, Result};

const SERVICE: &str = "ET service";

/// Weather of one chunk, column-major, as the ET service expects it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EtChunk {
    /// Observation time of the first hour in the chunk
    pub datetime: String,
    pub temp: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub humidity: Vec<f64>,
    pub precip: Vec<f64>,
}

impl EtChunk {
    /// Build from a transposed chunk laid out as
    /// `[observation_time, temperature, wind speed, humidity, precipitation]`.
    pub fn from_columns(columns: &[Vec<FieldValue>]) -> Result<Self> {
        let [time, temp, wind_speed, humidity, precip] = columns else {
            return Err(IrrigationError::RaggedTable {
                row: 0,
                expected: 5,
                found: columns.len(),
            });
        };

        let datetime = time
            .first()
            .filter(|v| v.as_timestamp().is_some())
            .and_then(FieldValue::as_text)
            .ok_or_else(|| {
                IrrigationError::format("forecast API", "chunk has no valid observation time")
            })?
            .to_string();

        Ok(Self {
            temp: numeric_column("temperature", temp)?,
            wind_speed: numeric_column("wind speed", wind_speed)?,
            humidity: numeric_column("humidity", humidity)?,
            precip: numeric_column("precipitation", precip)?,
            datetime,
        })
    }
}

fn numeric_column(name: &str, column: &[FieldValue]) -> Result<Vec<f64>> {
    column
        .iter()
        .enumerate()
        .map(|(hour, value)| {
            value.as_f64().ok_or_else(|| {
                IrrigationError::format(
                    "forecast API",
                    format!("{name} value at hour {hour} of chunk is not numeric"),
                )
            })
        })
        .collect()
}

/// Anything that can turn one chunk into one ET estimate
#[async_trait]
pub trait EtEstimator: Send + Sync {
    async fn estimate(&self, chunk: &EtChunk) -> Result<f64>;
}

/// Estimate every chunk concurrently; results are in chunk order.
///
/// The first failure is returned and the remaining responses are discarded.
pub async fn estimate_all<E>(estimator: &E, chunks: &[EtChunk]) -> Result<Vec<f64>>
where
    E: EtEstimator + ?Sized,
{
    let start_time = Instant::now();
    let estimates = try_join_all(chunks.iter().map(|chunk| estimator.estimate(chunk))).await?;
    info!(
        "Estimated ET for {} chunks in {:.3}s",
        estimates.len(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(estimates)
}

#[derive(Serialize)]
struct EtRequest<'a> {
    station_id: &'a str,
    #[serde(flatten)]
    chunk: &'a EtChunk,
}

#[derive(Debug, Deserialize)]
struct EtResponse {
    success: Option<bool>,
    et: Option<f64>,
    error: Option<String>,
}

fn parse_estimate(body: &[u8]) -> Result<f64> {
    let response: EtResponse = serde_json::from_slice(body)
        .map_err(|e| IrrigationError::format(SERVICE, e.to_string()))?;

    if response.success == Some(false) {
        let reason = response.error.unwrap_or_else(|| "unknown error".to_string());
        return Err(IrrigationError::format(
            SERVICE,
            format!("estimation rejected: {reason}"),
        ));
    }
    response
        .et
        .filter(|et| et.is_finite())
        .ok_or_else(|| IrrigationError::format(SERVICE, "response has no numeric `et`"))
}

/// HTTP client for the ET estimation service
#[derive(Clone)]
pub struct EtClient {
    client: ClientWithMiddleware,
    url: Url,
    station_id: String,
}

impl EtClient {
    pub fn new(config: &EtConfig) -> Result<Self> {
        let url = Url::parse(&config.url)
            .map_err(|e| IrrigationError::config(format!("Invalid ET service URL: {e}")))?;
        Ok(Self {
            client: build_client(config.timeout_seconds, config.max_retries)?,
            url,
            station_id: config.station_id.clone(),
        })
    }

    #[must_use]
    pub fn station_id(&self) -> &str {
        &self.station_id
    }
}

#[async_trait]
impl EtEstimator for EtClient {
    #[instrument(skip(self, chunk), fields(datetime = %chunk.datetime))]
    async fn estimate(&self, chunk: &EtChunk) -> Result<f64> {
        let body = serde_json::to_vec(&EtRequest {
            station_id: &self.station_id,
            chunk,
        })
        .map_err(|e| IrrigationError::format(SERVICE, format!("cannot encode request: {e}")))?;

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("ET service answered HTTP {}", status);
            return Err(IrrigationError::unavailable(SERVICE, format!("HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| IrrigationError::unavailable(SERVICE, e.without_url().to_string()))?;
        let et = parse_estimate(&body)?;
        debug!("ET estimate {}", et);
        Ok(et)
    }
}
