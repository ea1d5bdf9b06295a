use color_eyre::eyre::Report;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Wire up error reports and the tracing subscriber. `RUST_LOG` selects
/// the filter, defaulting to `info`.
pub fn init() -> Result<(), Report> {
    color_eyre::install()?;
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(ErrorLayer::default())
        .try_init()?;
    Ok(())
}
