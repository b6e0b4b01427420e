use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{self, AppState};
use crate::et::EtEstimator;
use crate::weather::ForecastSource;

/// Chart API under `/api` with permissive CORS for the dashboard front-end
pub fn app<F, E>(state: AppState<F, E>) -> Router
where
    F: ForecastSource + 'static,
    E: EtEstimator + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(Arc::new(state)))
        .layer(cors)
}

pub async fn run<F, E>(state: AppState<F, E>, port: u16) -> Result<()>
where
    F: ForecastSource + 'static,
    E: EtEstimator + 'static,
{
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Chart API running at http://localhost:{}/api", port);
    axum::serve(listener, app(state))
        .await
        .context("HTTP server stopped")?;
    Ok(())
}
