//! Radar Gesture Pipeline
//!
//! Wires the buffer service, acquisition, classification, detection, and
//! console into a running pipeline driven by the simulated radar clock.

pub mod settings;
pub mod tasks;

pub use settings::{LogFormat, Settings, SettingsError, DEFAULT_SETTINGS_PATH};
pub use tasks::{heartbeat, ConsoleLauncher, ProcessingTask};

use detection::{
    DetectionConfig, DetectionConfigError, DetectionLogic, DetectionMask, LedPanel, SharedState, SignalPanel,
};
use frame_acquisition::{
    AcquisitionError, AcquisitionTask, DataReadyInterrupt, FrameExchange, RadarClock, SimulatedRadar,
};
use gesture_engine::EnergyClassifier;
use radar_buffer::{BufferError, RadarDataManager};
use std::convert::Infallible;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Fatal pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error("Buffer service setup failed: {0}")]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Detection(#[from] DetectionConfigError),

    #[error("Output failed: {0}")]
    Io(#[from] io::Error),

    #[error("Task panicked: {0}")]
    TaskPanicked(String),
}

/// Initialize logging. Diagnostics go to stderr; stdout carries events and
/// console replies.
pub fn init_logging(level: Level, format: LogFormat) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    }
}

/// Run the pipeline until a task fails or Ctrl-C
pub async fn run(settings: Settings) -> Result<(), PipelineError> {
    let geometry = settings.radar.geometry;
    geometry.validate()?;

    let radar = SimulatedRadar::new(geometry, settings.radar.simulation.clone());
    let manager = Arc::new(RadarDataManager::new(
        Box::new(radar),
        geometry.frame_len(),
        settings.radar.buffer_frames,
    )?);
    let exchange = Arc::new(FrameExchange::new(&geometry));
    let state = Arc::new(SharedState::new(DetectionMask::default(), settings.verbose));
    let panel: Arc<dyn SignalPanel> = Arc::new(LedPanel::new());
    info!("{}", detection_summary(&state, &settings.detection));

    let acquisition = AcquisitionTask::new(manager.clone(), exchange.clone(), &geometry)?;
    let detection = DetectionLogic::new(settings.detection.clone(), state.clone(), panel.clone())?;
    let processing = ProcessingTask::new(
        exchange.clone(),
        &geometry,
        EnergyClassifier::new(settings.classifier.clone()),
        detection,
        io::stdout(),
    )
    .with_console(ConsoleLauncher {
        state: state.clone(),
        panel: panel.clone(),
        board: settings.board.clone(),
    });

    let mut tasks: JoinSet<Result<Infallible, PipelineError>> = JoinSet::new();
    tasks.spawn(async move { acquisition.run().await.map_err(PipelineError::from) });
    tasks.spawn(processing.run());
    let heartbeat_period = settings.heartbeat_period();
    let heartbeat_panel = panel.clone();
    tasks.spawn(async move { Ok(heartbeat(heartbeat_panel, heartbeat_period).await) });

    let clock = RadarClock::spawn(DataReadyInterrupt::new(manager.clone()), settings.radar.frame_period())?;
    info!(
        "Pipeline running: {} samples/frame, period {:?}",
        geometry.frame_len(),
        settings.radar.frame_period()
    );

    let outcome = supervise(&mut tasks).await;
    clock.stop();
    tasks.abort_all();

    let stats = manager.stats();
    info!(
        "Buffer stats: fed={} consumed={} overflows={} deferred={} faults={}, exchange drops={}",
        stats.frames_fed,
        stats.frames_consumed,
        stats.overflows,
        stats.deferred,
        stats.source_faults,
        exchange.dropped()
    );
    info!(
        "Buffer left {:.0}% full ({} frame capacity)",
        manager.fill_ratio() * 100.0,
        manager.capacity_frames()
    );
    outcome
}

/// Startup line describing what the pipeline will detect
fn detection_summary(state: &SharedState, config: &DetectionConfig) -> String {
    format!(
        "Detecting [{}], threshold {}, hold {} cycles",
        state.mask(),
        config.threshold,
        config.hold_cycles
    )
}

/// Wait for Ctrl-C or the first task to end
async fn supervise(tasks: &mut JoinSet<Result<Infallible, PipelineError>>) -> Result<(), PipelineError> {
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received");
            Ok(())
        }
        Some(result) = tasks.join_next() => match result {
            Ok(Ok(never)) => match never {},
            Ok(Err(e)) => {
                error!("Task failed: {}", e);
                Err(e)
            }
            Err(e) => {
                error!("Task panicked: {}", e);
                Err(PipelineError::TaskPanicked(e.to_string()))
            }
        },
    }
}
