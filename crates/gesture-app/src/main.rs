//! Radar Gesture Pipeline - Main Entry Point

use anyhow::Context;
use gesture_app::{init_logging, run, Settings, DEFAULT_SETTINGS_PATH};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string());
    let settings = Settings::load(&path).with_context(|| format!("loading settings from {}", path))?;

    init_logging(settings.level()?, settings.log_format).context("installing tracing subscriber")?;

    info!("=== Radar Gestures v{} ===", env!("CARGO_PKG_VERSION"));

    run(settings).await.context("pipeline stopped")?;
    info!("Pipeline stopped");
    Ok(())
}
