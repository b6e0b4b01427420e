//! Soil-water level estimate from per-chunk evapotranspiration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ForecastWindow;
use crate::{IrrigationError, Result};

/// One simulated hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwlPoint {
    pub timestamp: DateTime<Utc>,
    pub level: f64,
}

/// Hourly soil-water levels, strictly increasing in time
pub type SwlSeries = Vec<SwlPoint>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    /// Level at `window.start`
    pub initial_level: f64,
    /// Hours covered by each ET estimate
    pub chunk_hours: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            initial_level: 210.0,
            chunk_hours: 3,
        }
    }
}

/// Estimates needed to simulate every hour of `window`
pub fn required_estimates(window: &ForecastWindow, chunk_hours: usize) -> Result<usize> {
    if chunk_hours == 0 {
        return Err(IrrigationError::InvalidChunkSize { size: chunk_hours });
    }
    Ok(window.hour_count().div_ceil(chunk_hours))
}

/// Emit `(t, level)` for every hour of the window, then subtract that hour's
/// chunk estimate from the running level.
pub fn simulate(
    estimates: &[f64],
    window: &ForecastWindow,
    params: SimulationParams,
) -> Result<SwlSeries> {
    let required = required_estimates(window, params.chunk_hours)?;
    if estimates.len() < required {
        return Err(IrrigationError::InsufficientEstimates {
            required,
            available: estimates.len(),
        });
    }

    let mut level = params.initial_level;
    let series = window
        .hours()
        .enumerate()
        .map(|(hour, timestamp)| {
            let point = SwlPoint { timestamp, level };
            level -= estimates[hour / params.chunk_hours];
            point
        })
        .collect();
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn window(hours: i64) -> ForecastWindow {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ForecastWindow::new(start, start + Duration::hours(hours))
    }

    #[test]
    fn test_simulate_six_hours() {
        let series = simulate(&[10.0, 8.0], &window(6), SimulationParams::default()).unwrap();

        let levels: Vec<f64> = series.iter().map(|p| p.level).collect();
        assert_eq!(levels, vec![210.0, 200.0, 190.0, 180.0, 172.0, 164.0]);

        let hours: Vec<u32> = series
            .iter()
            .map(|p| chrono::Timelike::hour(&p.timestamp))
            .collect();
        assert_eq!(hours, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_simulate_insufficient_estimates() {
        let err = simulate(&[10.0, 8.0], &window(7), SimulationParams::default()).unwrap_err();
        assert!(matches!(
            err,
            IrrigationError::InsufficientEstimates {
                required: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn test_simulate_fractional_second_end() {
        let mut window = window(6);
        window.end += Duration::milliseconds(500);

        let err = simulate(&[10.0, 8.0], &window, SimulationParams::default()).unwrap_err();
        assert!(matches!(
            err,
            IrrigationError::InsufficientEstimates {
                required: 3,
                available: 2
            }
        ));

        let series = simulate(&[10.0, 8.0, 1.0], &window, SimulationParams::default()).unwrap();
        assert_eq!(series.len(), 7);
        assert_eq!(series[6].timestamp, window.start + Duration::hours(6));
        assert_eq!(series[6].level, 156.0);
    }

    #[test]
    fn test_simulate_extra_estimates_ignored() {
        let series = simulate(&[1.0, 2.0, 3.0, 4.0], &window(4), SimulationParams::default()).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series[3].level, 207.0);
    }

    #[test]
    fn test_simulate_custom_params() {
        let params = SimulationParams {
            initial_level: 100.0,
            chunk_hours: 1,
        };
        let series = simulate(&[1.0, 2.0, 3.0], &window(3), params).unwrap();
        let levels: Vec<f64> = series.iter().map(|p| p.level).collect();
        assert_eq!(levels, vec![100.0, 99.0, 97.0]);
    }

    #[test]
    fn test_simulate_empty_window() {
        let series = simulate(&[], &window(0), SimulationParams::default()).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_zero_chunk_hours() {
        let params = SimulationParams {
            initial_level: 210.0,
            chunk_hours: 0,
        };
        assert!(matches!(
            simulate(&[1.0], &window(1), params),
            Err(IrrigationError::InvalidChunkSize { size: 0 })
        ));
    }

    #[test]
    fn test_timestamps_strictly_increasing() {
        let series = simulate(&[1.0; 8], &window(24), SimulationParams::default()).unwrap();
        assert_eq!(series.len(), 24);
        assert!(
            series
                .windows(2)
                .all(|w| w[1].timestamp - w[0].timestamp == Duration::hours(1))
        );
    }
}
