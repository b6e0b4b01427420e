//! Field location and forecast window

use crate::{IrrigationError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Geographic point a forecast is requested for
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Location {
    /// Create a location, rejecting out-of-range coordinates
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(IrrigationError::validation(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(IrrigationError::validation(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Half-open time window `[start, end)`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ForecastWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ForecastWindow {
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Dashboard default: from `now` until one hour before the same time tomorrow
    #[must_use]
    pub fn until_next_day(now: DateTime<Utc>) -> Self {
        Self {
            start: now,
            end: now + Duration::days(1) - Duration::hours(1),
        }
    }

    /// Number of hour steps `start + h·1h` that fall before `end`
    #[must_use]
    pub fn hour_count(&self) -> usize {
        let span = self.end - self.start;
        if span <= Duration::zero() {
            return 0;
        }
        let whole = span.num_hours();
        // any remainder, down to a nanosecond, holds one more hour start
        let partial = span > Duration::hours(whole);
        usize::try_from(whole).map_or(0, |hours| hours + usize::from(partial))
    }

    /// Hourly timestamps inside the window
    pub fn hours(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        (0..self.hour_count()).map(|h| self.start + Duration::hours(h as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_location_validation() {
        assert!(Location::new(38.665, 48.806).is_ok());
        assert!(matches!(
            Location::new(91.0, 0.0),
            Err(IrrigationError::Validation { .. })
        ));
        assert!(Location::new(0.0, -181.0).is_err());
    }

    #[test]
    fn test_until_next_day() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let window = ForecastWindow::until_next_day(now);
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 1, 2, 7, 0, 0).unwrap());
        assert_eq!(window.hour_count(), 23);
    }

    #[test]
    fn test_hour_count_partial_and_empty() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let window = ForecastWindow::new(start, start + Duration::minutes(150));
        assert_eq!(window.hour_count(), 3);

        let empty = ForecastWindow::new(start, start);
        assert_eq!(empty.hour_count(), 0);
        assert_eq!(empty.hours().count(), 0);

        let backwards = ForecastWindow::new(start, start - Duration::hours(2));
        assert_eq!(backwards.hour_count(), 0);
    }

    #[test]
    fn test_hour_count_fractional_second_end() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let window = ForecastWindow::new(start, start + Duration::hours(6) + Duration::milliseconds(500));
        assert_eq!(window.hour_count(), 7);
        assert_eq!(window.hours().last(), Some(start + Duration::hours(6)));

        let exact = ForecastWindow::new(start, start + Duration::hours(6));
        assert_eq!(exact.hour_count(), 6);

        let one_nano = ForecastWindow::new(start, start + Duration::nanoseconds(1));
        assert_eq!(one_nano.hour_count(), 1);
    }
}
