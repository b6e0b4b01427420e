//! Runs of consecutive rainy hours in a forecast

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::models::ObservationRecord;

const PRECIPITATION: &str = "precipitation";
const PRECIPITATION_PROBABILITY: &str = "precipitation_probability";

/// Probability (percent) from which an hour counts as rainy
pub const RAIN_PROBABILITY_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainHour {
    /// Hour of day (UTC) of the observation
    pub hour: u32,
    pub precipitation: Option<f64>,
    pub precipitation_probability: Option<f64>,
}

/// Group rainy hours into runs of consecutive hours of day.
///
/// An hour is rainy when precipitation is above zero or its probability is at
/// least [`RAIN_PROBABILITY_THRESHOLD`]. Records without an observation time
/// are skipped.
#[must_use]
pub fn rain_intervals(records: &[ObservationRecord]) -> Vec<Vec<RainHour>> {
    let mut intervals: Vec<Vec<RainHour>> = Vec::new();

    for record in records {
        let precipitation = record.number(PRECIPITATION);
        let precipitation_probability = record.number(PRECIPITATION_PROBABILITY);
        let rainy = precipitation.is_some_and(|p| p > 0.0)
            || precipitation_probability.is_some_and(|p| p >= RAIN_PROBABILITY_THRESHOLD);
        if !rainy {
            continue;
        }
        let Some(time) = record.observation_time() else {
            continue;
        };

        let hour = RainHour {
            hour: time.hour(),
            precipitation,
            precipitation_probability,
        };
        match intervals.last_mut() {
            Some(run) if run.last().is_some_and(|prev| prev.hour + 1 == hour.hour) => {
                run.push(hour);
            }
            _ => intervals.push(vec![hour]),
        }
    }

    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldValue, OBSERVATION_TIME};

    fn hour(h: u32, precipitation: f64, probability: f64) -> ObservationRecord {
        ObservationRecord::new([
            (
                OBSERVATION_TIME,
                FieldValue::Text(format!("2024-01-01T{h:02}:00:00.000Z")),
            ),
            (PRECIPITATION, FieldValue::from(precipitation)),
            (PRECIPITATION_PROBABILITY, FieldValue::from(probability)),
        ])
    }

    #[test]
    fn test_groups_consecutive_hours() {
        let records = vec![
            hour(0, 0.0, 10.0),
            hour(1, 0.4, 60.0),
            hour(2, 0.0, 55.0),
            hour(3, 0.0, 20.0),
            hour(4, 1.2, 40.0),
            hour(5, 0.0, 0.0),
        ];

        let intervals = rain_intervals(&records);

        assert_eq!(intervals.len(), 2);
        let first: Vec<u32> = intervals[0].iter().map(|h| h.hour).collect();
        assert_eq!(first, vec![1, 2]);
        assert_eq!(intervals[1][0].hour, 4);
        assert_eq!(intervals[1][0].precipitation, Some(1.2));
    }

    #[test]
    fn test_no_rain() {
        let records = vec![hour(0, 0.0, 0.0), hour(1, 0.0, 49.0)];
        assert!(rain_intervals(&records).is_empty());
    }

    #[test]
    fn test_probability_threshold_is_inclusive() {
        let records = vec![hour(7, 0.0, 50.0)];
        assert_eq!(rain_intervals(&records).len(), 1);
    }
}
