use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LOG_ENV;

// stdout carries IPC responses, so logs go to stderr.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;

    Ok(())
}
