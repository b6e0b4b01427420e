use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::ForecastSource;
use crate::config::{ApiKey, ForecastConfig};
use crate::http::{build_client, redact_query, transport_error};
use crate::models::{ForecastWindow, Location, ObservationRecord};
use crate::{IrrigationError, Result};

const SERVICE: &str = "forecast API";

/// Hourly forecast client for the ClimaCell-style v3 API
#[derive(Clone)]
pub struct ForecastClient {
    client: ClientWithMiddleware,
    url: Url,
    api_key: ApiKey,
}

impl fmt::Debug for ForecastClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastClient")
            .field("url", &self.url.as_str())
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

impl ForecastClient {
    /// Create a client from configuration. The API key is mandatory.
    pub fn new(config: &ForecastConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            IrrigationError::config(
                "Forecast API key is missing. Set forecast.api_key or IRRIGATION_FORECAST__API_KEY.",
            )
        })?;
        let url = Url::parse(&config.url)
            .map_err(|e| IrrigationError::config(format!("Invalid forecast URL: {e}")))?;
        let client = build_client(config.timeout_seconds, config.max_retries)?;

        Ok(Self {
            client,
            url,
            api_key,
        })
    }

    fn request_url(&self, location: Location, window: ForecastWindow, fields: &[String]) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("lat", &location.latitude.to_string())
            .append_pair("lon", &location.longitude.to_string())
            .append_pair("start_time", &iso_timestamp(window.start))
            .append_pair("end_time", &iso_timestamp(window.end))
            .append_pair("fields", &fields.join(","))
            .append_pair("apikey", self.api_key.expose());
        url
    }
}

fn iso_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a forecast body into records sorted by observation time
pub(crate) fn parse_records(body: &[u8]) -> Result<Vec<ObservationRecord>> {
    let mut records: Vec<ObservationRecord> = serde_json::from_slice(body)
        .map_err(|e| IrrigationError::format(SERVICE, format!("expected an array of records: {e}")))?;

    let mut times = Vec::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        let time = record.observation_time().ok_or_else(|| {
            IrrigationError::format(SERVICE, format!("record {row} has no valid observation_time"))
        })?;
        times.push(time);
    }

    if times.windows(2).any(|w| w[0] > w[1]) {
        debug!("Forecast records out of order, sorting by observation time");
        records.sort_by_key(|r| r.observation_time());
    }
    Ok(records)
}

#[async_trait]
impl ForecastSource for ForecastClient {
    #[instrument(skip(self, fields), fields(lat = location.latitude, lon = location.longitude))]
    async fn fetch(
        &self,
        location: Location,
        window: ForecastWindow,
        fields: &[String],
    ) -> Result<Vec<ObservationRecord>> {
        let start_time = Instant::now();
        let url = self.request_url(location, window, fields);
        debug!(
            "Forecast request {} for fields [{}]",
            redact_query(&url),
            fields.join(", ")
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Forecast API answered HTTP {}", status);
            return Err(IrrigationError::unavailable(
                SERVICE,
                format!("HTTP {status}"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| IrrigationError::unavailable(SERVICE, e.without_url().to_string()))?;

        let records = parse_records(&body).inspect_err(|e| {
            error!("Failed to parse forecast response: {}", e);
        })?;

        info!(
            "Retrieved {} hourly records in {:.3}s",
            records.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client() -> ForecastClient {
        let config = ForecastConfig {
            api_key: Some(ApiKey::new("test-key-123")),
            url: "https://forecast.example.com/v3/weather/forecast/hourly".to_string(),
            ..ForecastConfig::default()
        };
        ForecastClient::new(&config).unwrap()
    }

    #[test]
    fn test_missing_api_key() {
        let err = ForecastClient::new(&ForecastConfig::default()).unwrap_err();
        assert!(matches!(err, IrrigationError::Config { .. }));
    }

    #[test]
    fn test_request_url() {
        let location = Location::new(38.5, 48.25).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap();
        let fields = vec!["temp".to_string(), "humidity".to_string()];

        let url = client().request_url(location, ForecastWindow::new(start, end), &fields);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/v3/weather/forecast/hourly");
        assert!(pairs.contains(&("lat".into(), "38.5".into())));
        assert!(pairs.contains(&("lon".into(), "48.25".into())));
        assert!(pairs.contains(&("start_time".into(), "2024-01-01T00:00:00.000Z".into())));
        assert!(pairs.contains(&("end_time".into(), "2024-01-01T06:00:00.000Z".into())));
        assert!(pairs.contains(&("fields".into(), "temp,humidity".into())));
        assert!(pairs.contains(&("apikey".into(), "test-key-123".into())));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let debug = format!("{:?}", client());
        assert!(!debug.contains("test-key-123"));
    }

    #[test]
    fn test_parse_records_sorts_by_time() {
        let body = br#"[
            {"observation_time": {"value": "2024-01-01T01:00:00.000Z"}, "temp": {"value": 11}},
            {"observation_time": {"value": "2024-01-01T00:00:00.000Z"}, "temp": {"value": 10}}
        ]"#;
        let records = parse_records(body).unwrap();
        assert_eq!(records[0].number("temp"), Some(10.0));
        assert_eq!(records[1].number("temp"), Some(11.0));
    }

    #[test]
    fn test_parse_records_rejects_bad_shapes() {
        let err = parse_records(br#"{"message": "quota exceeded"}"#).unwrap_err();
        assert!(matches!(err, IrrigationError::UpstreamFormat { .. }));

        let err = parse_records(br#"[{"temp": {"value": 10}}]"#).unwrap_err();
        assert!(matches!(err, IrrigationError::UpstreamFormat { .. }));
    }
}
