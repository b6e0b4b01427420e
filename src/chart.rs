//! Chart data handed to the dashboard's charting front-end
//!
//! These are plain serializable structures. The concrete charting library
//! configuration is left to the front-end.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::table::ColumnTable;
use crate::water_balance::SwlSeries;
use crate::{IrrigationError, Result};

/// A forecast field to plot, with optional display name and unit suffix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphField {
    pub field: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
}

impl GraphField {
    pub fn new<S: Into<String>>(field: S) -> Self {
        Self {
            field: field.into(),
            name: None,
            suffix: None,
        }
    }

    #[must_use]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Display title: the name if set and non-empty, else the field id, capitalized
    #[must_use]
    pub fn title(&self) -> String {
        let label = self
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(self.field.as_str());
        capitalize(label)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisPosition {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartAxis {
    pub title: String,
    pub position: AxisPosition,
    pub suffix: Option<String>,
    pub series: ChartSeries,
}

/// Multi-axis line chart of hourly weather
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherChart {
    pub caption: String,
    /// Hour-of-day label per data point
    pub categories: Vec<String>,
    pub axes: Vec<ChartAxis>,
}

impl WeatherChart {
    /// Build from a column table `[observation_time, fields...]` in `fields` order
    pub fn from_columns(columns: &ColumnTable, fields: &[GraphField]) -> Result<Self> {
        let Some((times, values)) = columns.split_first() else {
            return Ok(Self {
                caption: "Weather".to_string(),
                categories: Vec::new(),
                axes: Vec::new(),
            });
        };
        if values.len() != fields.len() {
            return Err(IrrigationError::RaggedTable {
                row: 0,
                expected: fields.len() + 1,
                found: columns.len(),
            });
        }

        let categories = times
            .iter()
            .enumerate()
            .map(|(i, t)| {
                t.as_timestamp()
                    .map(|ts| ts.hour().to_string())
                    .ok_or_else(|| {
                        IrrigationError::format(
                            "forecast API",
                            format!("observation_time at hour {i} is not a timestamp"),
                        )
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let axes = fields
            .iter()
            .zip(values)
            .enumerate()
            .map(|(index, (field, column))| {
                let values = column
                    .iter()
                    .map(|v| {
                        v.as_f64().ok_or_else(|| {
                            IrrigationError::format(
                                "forecast API",
                                format!("field '{}' has a non-numeric value", field.field),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let title = field.title();
                Ok(ChartAxis {
                    position: if index == 0 {
                        AxisPosition::Left
                    } else {
                        AxisPosition::Right
                    },
                    suffix: field.suffix.clone(),
                    series: ChartSeries {
                        name: title.clone(),
                        values,
                    },
                    title,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            caption: "Weather".to_string(),
            categories,
            axes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceZone {
    pub label: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub label: String,
    pub value: f64,
}

/// Time-series chart of the simulated soil-water level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwlChart {
    pub caption: String,
    pub series: SwlSeries,
    pub target_zone: ReferenceZone,
    pub optimal_line: ReferenceLine,
}

/// Bands drawn on the SWL chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwlBands {
    pub target_min: f64,
    pub target_max: f64,
    pub optimal_level: f64,
}

impl Default for SwlBands {
    fn default() -> Self {
        Self {
            target_min: 120.0,
            target_max: 180.0,
            optimal_level: 145.0,
        }
    }
}

impl SwlChart {
    #[must_use]
    pub fn new(series: SwlSeries, bands: SwlBands) -> Self {
        Self {
            caption: "Soil water level".to_string(),
            series,
            target_zone: ReferenceZone {
                label: "Target".to_string(),
                min: bands.target_min,
                max: bands.target_max,
            },
            optimal_line: ReferenceLine {
                label: "Optimal level".to_string(),
                value: bands.optimal_level,
            },
        }
    }
}
