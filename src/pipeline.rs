//! Forecast to chart orchestration
//!
//! Two paths share the forecast source:
//! - weather chart: fetch → extract → transpose → [`WeatherChart`]
//! - SWL chart: fetch → extract → chunk → transpose per chunk → concurrent ET
//!   estimation → water balance → [`SwlChart`]
//!
//! Every stage propagates its error; no partial chart is produced.

use tracing::{debug, info, instrument};

use crate::chart::{GraphField, SwlBands, SwlChart, WeatherChart};
use crate::chunk::chunk;
use crate::config::{EtFieldNames, IrrigationConfig};
use crate::et::{EtChunk, EtClient, EtEstimator, estimate_all};
use crate::models::{ForecastWindow, Location, OBSERVATION_TIME};
use crate::rain::{RainHour, rain_intervals};
use crate::table::{extract, transpose};
use crate::water_balance::{SimulationParams, SwlSeries, simulate};
use crate::weather::{ForecastClient, ForecastSource};
use crate::{IrrigationError, Result};

/// Chart pipeline over a forecast source and an ET estimator
pub struct WeatherPipeline<F, E> {
    forecast: F,
    estimator: E,
    et_fields: EtFieldNames,
    params: SimulationParams,
    bands: SwlBands,
}

/// Pipeline backed by the HTTP clients
pub type HttpPipeline = WeatherPipeline<ForecastClient, EtClient>;

impl HttpPipeline {
    pub fn from_config(config: &IrrigationConfig) -> Result<Self> {
        let forecast = ForecastClient::new(&config.forecast)?;
        let estimator = EtClient::new(&config.et)?;
        Ok(WeatherPipeline::new(forecast, estimator)
            .with_et_fields(config.et.fields.clone())
            .with_simulation(SimulationParams {
                initial_level: config.simulation.initial_level,
                chunk_hours: config.simulation.chunk_hours,
            })
            .with_bands(SwlBands {
                target_min: config.simulation.target_min,
                target_max: config.simulation.target_max,
                optimal_level: config.simulation.optimal_level,
            }))
    }
}

impl<F, E> WeatherPipeline<F, E>
where
    F: ForecastSource,
    E: EtEstimator,
{
    pub fn new(forecast: F, estimator: E) -> Self {
        Self {
            forecast,
            estimator,
            et_fields: EtFieldNames::default(),
            params: SimulationParams::default(),
            bands: SwlBands::default(),
        }
    }

    #[must_use]
    pub fn with_et_fields(mut self, et_fields: EtFieldNames) -> Self {
        self.et_fields = et_fields;
        self
    }

    #[must_use]
    pub fn with_simulation(mut self, params: SimulationParams) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_bands(mut self, bands: SwlBands) -> Self {
        self.bands = bands;
        self
    }

    /// Hourly weather chart, one axis per requested field
    #[instrument(skip(self, fields), fields(field_count = fields.len()))]
    pub async fn weather_chart(
        &self,
        location: Location,
        window: ForecastWindow,
        fields: &[GraphField],
    ) -> Result<WeatherChart> {
        if fields.is_empty() {
            return Err(IrrigationError::validation("No weather fields requested"));
        }
        let field_ids: Vec<String> = fields.iter().map(|f| f.field.clone()).collect();
        let records = self.forecast.fetch(location, window, &field_ids).await?;
        if records.is_empty() && window.hour_count() > 0 {
            return Err(IrrigationError::format(
                "forecast API",
                "no records for the requested window",
            ));
        }

        let mut names = vec![OBSERVATION_TIME];
        names.extend(field_ids.iter().map(String::as_str));
        let table = extract(&records, &names)?;
        let columns = transpose(&table)?;

        let chart = WeatherChart::from_columns(&columns, fields)?;
        info!(
            "Built weather chart with {} hours and {} axes",
            chart.categories.len(),
            chart.axes.len()
        );
        Ok(chart)
    }

    /// One ET estimate per chunk of the forecast, in chunk order
    #[instrument(skip(self))]
    pub async fn et_estimates(
        &self,
        location: Location,
        window: ForecastWindow,
    ) -> Result<Vec<f64>> {
        let [temperature, wind_speed, humidity, precipitation] = self.et_fields.as_array();
        let field_ids: Vec<String> = [temperature, wind_speed, humidity, precipitation]
            .into_iter()
            .map(str::to_string)
            .collect();
        let records = self.forecast.fetch(location, window, &field_ids).await?;

        let names = [
            OBSERVATION_TIME,
            temperature,
            wind_speed,
            humidity,
            precipitation,
        ];
        let table = extract(&records, &names)?;
        let chunks = chunk(&table, self.params.chunk_hours)?;
        debug!("Split {} hours into {} chunks", table.len(), chunks.len());

        let et_chunks = chunks
            .into_iter()
            .map(|rows| transpose(rows).and_then(|columns| EtChunk::from_columns(&columns)))
            .collect::<Result<Vec<_>>>()?;

        estimate_all(&self.estimator, &et_chunks).await
    }

    /// Hourly soil-water level over `window`
    pub async fn swl_series(
        &self,
        location: Location,
        window: ForecastWindow,
    ) -> Result<SwlSeries> {
        let estimates = self.et_estimates(location, window).await?;
        simulate(&estimates, &window, self.params)
    }

    /// Soil-water level chart with target band and optimal-level line
    pub async fn swl_chart(&self, location: Location, window: ForecastWindow) -> Result<SwlChart> {
        let series = self.swl_series(location, window).await?;
        info!("Built SWL chart with {} hours", series.len());
        Ok(SwlChart::new(series, self.bands))
    }

    /// Runs of consecutive rainy hours in the forecast
    pub async fn rain_intervals(
        &self,
        location: Location,
        window: ForecastWindow,
    ) -> Result<Vec<Vec<RainHour>>> {
        let fields = vec![
            "precipitation".to_string(),
            "precipitation_probability".to_string(),
        ];
        let records = self.forecast.fetch(location, window, &fields).await?;
        Ok(rain_intervals(&records))
    }
}
