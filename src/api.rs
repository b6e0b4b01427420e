use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::IrrigationError;
use crate::chart::{GraphField, SwlChart, WeatherChart};
use crate::config::DefaultsConfig;
use crate::et::EtEstimator;
use crate::models::{ForecastWindow, Location};
use crate::pipeline::WeatherPipeline;
use crate::weather::ForecastSource;

pub struct AppState<F, E> {
    pub pipeline: WeatherPipeline<F, E>,
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Comma-separated forecast field ids (weather chart only)
    pub fields: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ChartQuery {
    fn location(&self, defaults: &DefaultsConfig) -> Result<Location, ApiError> {
        Ok(defaults.location_or(self.lat, self.lon)?)
    }

    fn window(&self) -> ForecastWindow {
        let default = ForecastWindow::until_next_day(Utc::now());
        ForecastWindow::new(
            self.start.unwrap_or(default.start),
            self.end.unwrap_or(default.end),
        )
    }

    fn graph_fields(&self, defaults: &DefaultsConfig) -> Vec<GraphField> {
        match &self.fields {
            Some(fields) => fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(GraphField::new)
                .collect(),
            None => defaults
                .weather_fields
                .iter()
                .map(|f| GraphField::new(f.as_str()))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

/// Pipeline failure rendered as a JSON error state for the dashboard
#[derive(Debug)]
pub struct ApiError(pub IrrigationError);

impl From<IrrigationError> for ApiError {
    fn from(err: IrrigationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            IrrigationError::UpstreamUnavailable { .. } | IrrigationError::UpstreamFormat { .. } => {
                StatusCode::BAD_GATEWAY
            }
            IrrigationError::Validation { .. } => StatusCode::BAD_REQUEST,
            IrrigationError::MissingField { .. } | IrrigationError::InsufficientEstimates { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            IrrigationError::RaggedTable { .. }
            | IrrigationError::InvalidChunkSize { .. }
            | IrrigationError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!("Chart request failed ({}): {}", status, self.0);
        let body = ErrorBody {
            error: self.0.user_message(),
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router<F, E>(state: Arc<AppState<F, E>>) -> Router
where
    F: ForecastSource + 'static,
    E: EtEstimator + 'static,
{
    Router::new()
        .route("/weather-chart", get(get_weather_chart::<F, E>))
        .route("/swl-chart", get(get_swl_chart::<F, E>))
        .with_state(state)
}

async fn get_weather_chart<F, E>(
    State(state): State<Arc<AppState<F, E>>>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<WeatherChart>, ApiError>
where
    F: ForecastSource + 'static,
    E: EtEstimator + 'static,
{
    let location = query.location(&state.defaults)?;
    let fields = query.graph_fields(&state.defaults);
    let chart = state
        .pipeline
        .weather_chart(location, query.window(), &fields)
        .await?;
    Ok(Json(chart))
}

async fn get_swl_chart<F, E>(
    State(state): State<Arc<AppState<F, E>>>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<SwlChart>, ApiError>
where
    F: ForecastSource + 'static,
    E: EtEstimator + 'static,
{
    let location = query.location(&state.defaults)?;
    let chart = state.pipeline.swl_chart(location, query.window()).await?;
    Ok(Json(chart))
}
