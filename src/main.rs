use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use irrigation_forecast::api::AppState;
use irrigation_forecast::{
    ForecastWindow, GraphField, HttpPipeline, IrrigationConfig, Location, logging, web,
};

#[derive(Parser)]
#[command(name = "irrigation-forecast", version, about = "Weather and soil-water-level charts for irrigation planning")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct LocationArgs {
    /// Latitude of the field (defaults to the configured location)
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude of the field (defaults to the configured location)
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the hourly weather chart as JSON
    Weather {
        #[command(flatten)]
        location: LocationArgs,
        /// Forecast fields to chart
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// Print the soil-water-level chart as JSON
    Swl {
        #[command(flatten)]
        location: LocationArgs,
    },
    /// Print runs of rainy hours as JSON
    Rain {
        #[command(flatten)]
        location: LocationArgs,
    },
    /// Serve the chart API
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,
    },
}

impl LocationArgs {
    fn resolve(&self, config: &IrrigationConfig) -> Result<Location> {
        Ok(config.defaults.location_or(self.lat, self.lon)?)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to encode output")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = IrrigationConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose);

    let pipeline = HttpPipeline::from_config(&config).context("Failed to set up API clients")?;
    let window = ForecastWindow::until_next_day(Utc::now());

    match cli.command {
        Commands::Weather { location, fields } => {
            let location = location.resolve(&config)?;
            let fields: Vec<GraphField> = if fields.is_empty() {
                config.defaults.weather_fields.iter().map(|f| GraphField::new(f.as_str())).collect()
            } else {
                fields.into_iter().map(GraphField::new).collect()
            };
            let chart = pipeline.weather_chart(location, window, &fields).await?;
            print_json(&chart)?;
        }
        Commands::Swl { location } => {
            let location = location.resolve(&config)?;
            let chart = pipeline.swl_chart(location, window).await?;
            print_json(&chart)?;
        }
        Commands::Rain { location } => {
            let location = location.resolve(&config)?;
            let intervals = pipeline.rain_intervals(location, window).await?;
            print_json(&intervals)?;
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.defaults.port);
            let state = AppState {
                pipeline,
                defaults: config.defaults.clone(),
            };
            web::run(state, port).await?;
        }
    }

    Ok(())
}
