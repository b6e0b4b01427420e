//! Shared HTTP client construction for the forecast and ET clients

use crate::{IrrigationError, Result};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

const USER_AGENT: &str = concat!("irrigation-forecast/", env!("CARGO_PKG_VERSION"));

/// Build a client with the given timeout.
///
/// The clients never retry on their own; a transient-retry layer is only
/// attached when the caller configures `max_retries > 0`.
pub fn build_client(timeout_seconds: u32, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| IrrigationError::config(format!("Failed to create HTTP client: {e}")))?;

    let mut builder = ClientBuilder::new(client);
    if max_retries > 0 {
        let policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
    }
    Ok(builder.build())
}

/// Map a send failure to `UpstreamUnavailable` without echoing the request URL
pub(crate) fn transport_error(service: &'static str, err: reqwest_middleware::Error) -> IrrigationError {
    let message = match err {
        reqwest_middleware::Error::Reqwest(e) => e.without_url().to_string(),
        reqwest_middleware::Error::Middleware(e) => e.to_string(),
    };
    IrrigationError::unavailable(service, message)
}

/// Request URL without its query string, safe to log
pub(crate) fn redact_query(url: &reqwest::Url) -> String {
    let mut redacted = url.clone();
    redacted.set_query(None);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        assert!(build_client(30, 0).is_ok());
        assert!(build_client(5, 3).is_ok());
    }

    #[test]
    fn test_redact_query() {
        let url = reqwest::Url::parse("https://api.example.com/v3/hourly?lat=1&apikey=secret").unwrap();
        let redacted = redact_query(&url);
        assert_eq!(redacted, "https://api.example.com/v3/hourly");
        assert!(!redacted.contains("secret"));
    }
}
