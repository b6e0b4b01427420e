use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level;
/// `verbose` forces debug output for this crate.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let default_directive = if verbose {
        format!("{},irrigation_forecast=debug", config.level)
    } else {
        config.level.clone()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // a second init (tests, embedding) keeps the first subscriber
    let _ = match config.format.as_str() {
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };
}
