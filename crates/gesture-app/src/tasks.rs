//! Pipeline tasks downstream of acquisition

use crate::PipelineError;
use console::{BoardInfo, ConsoleController};
use detection::{DetectionLogic, SharedState, SignalPanel, Step};
use frame_acquisition::{FrameExchange, FrameGeometry, PlanarFrame};
use gesture_engine::Classifier;
use std::convert::Infallible;
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything the console thread needs
pub struct ConsoleLauncher {
    pub state: Arc<SharedState>,
    pub panel: Arc<dyn SignalPanel>,
    pub board: BoardInfo,
}

impl ConsoleLauncher {
    /// Start the console on its own thread, reading stdin until it closes
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new().name("console".into()).spawn(move || {
            let mut console = ConsoleController::new(self.state, self.panel, self.board, io::stdout());
            if let Err(e) = console.run(io::stdin().lock()) {
                warn!("Console stopped: {}", e);
            }
        })
    }
}

/// Classify + detect stage.
///
/// Waits on the frame exchange, swaps the newest frame into its working
/// buffer, classifies it, and runs one detection cycle. Gesture events are
/// written as lines to `events`.
pub struct ProcessingTask<C, W> {
    exchange: Arc<FrameExchange>,
    working: PlanarFrame,
    classifier: C,
    detection: DetectionLogic,
    events: W,
    console: Option<ConsoleLauncher>,
    frames: u64,
}

impl<C: Classifier, W: Write + Send> ProcessingTask<C, W> {
    pub fn new(
        exchange: Arc<FrameExchange>,
        geometry: &FrameGeometry,
        classifier: C,
        detection: DetectionLogic,
        events: W,
    ) -> Self {
        Self {
            exchange,
            working: PlanarFrame::new(geometry),
            classifier,
            detection,
            events,
            console: None,
            frames: 0,
        }
    }

    /// Start the console when the task starts running
    pub fn with_console(mut self, console: ConsoleLauncher) -> Self {
        self.console = Some(console);
        self
    }

    /// Run forever. Only returns if an output stream fails.
    pub async fn run(mut self) -> Result<Infallible, PipelineError> {
        if let Some(console) = self.console.take() {
            console.spawn()?;
        }
        info!("Processing task started");

        loop {
            self.exchange.ready().await;
            self.process_pending()?;
        }
    }

    /// Process the pending frame, if any
    pub fn process_pending(&mut self) -> io::Result<Option<Step>> {
        if !self.exchange.take(&mut self.working) {
            // Woken by a publish whose frame an earlier pass already took
            return Ok(None);
        }
        self.frames += 1;

        let result = self.classifier.classify(&self.working);
        let step = self.detection.step(&result);
        if let Step::Detected(event) = step {
            write!(self.events, "{}\r\n", event)?;
            self.events.flush()?;
        }
        debug!("Frame {}: {:?} -> {:?}", self.working.sequence(), result, step);
        Ok(Some(step))
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn detection(&self) -> &DetectionLogic {
        &self.detection
    }

    pub fn events(&self) -> &W {
        &self.events
    }
}

/// Toggle the heartbeat output every `period`
pub async fn heartbeat(panel: Arc<dyn SignalPanel>, period: Duration) -> Infallible {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        panel.toggle_heartbeat();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detection::{DetectionConfig, LedPanel};
    use gesture_engine::{GestureClass, InferenceResult, ScriptedClassifier};

    fn geometry() -> FrameGeometry {
        FrameGeometry {
            samples_per_chirp: 2,
            chirps_per_frame: 2,
            rx_antennas: 3,
        }
    }

    fn processing(script: Vec<InferenceResult>) -> (ProcessingTask<ScriptedClassifier, Vec<u8>>, Arc<FrameExchange>) {
        let exchange = Arc::new(FrameExchange::new(&geometry()));
        let state = Arc::new(SharedState::default());
        let detection = DetectionLogic::new(DetectionConfig::default(), state, Arc::new(LedPanel::new())).unwrap();
        let task = ProcessingTask::new(
            exchange.clone(),
            &geometry(),
            ScriptedClassifier::new(script),
            detection,
            Vec::new(),
        );
        (task, exchange)
    }

    #[test]
    fn test_nothing_pending() {
        let (mut task, _) = processing(vec![]);
        assert_eq!(task.process_pending().unwrap(), None);
        assert_eq!(task.frames_processed(), 0);
    }

    #[test]
    fn test_detection_writes_event_line() {
        let (mut task, exchange) = processing(vec![InferenceResult::new(GestureClass::Push, 0.9)]);
        let mut frame = PlanarFrame::new(&geometry());
        exchange.publish(&mut frame);

        assert!(matches!(task.process_pending().unwrap(), Some(Step::Detected(_))));
        assert_eq!(
            String::from_utf8_lossy(task.events()),
            "[INFO]\"class\": \"PUSH\", \"score\": 0.900000\r\n"
        );
    }

    #[test]
    fn test_frame_not_seen_twice() {
        let (mut task, exchange) = processing(vec![]);
        let mut frame = PlanarFrame::new(&geometry());
        exchange.publish(&mut frame);

        assert!(task.process_pending().unwrap().is_some());
        assert_eq!(task.process_pending().unwrap(), None);
        assert_eq!(task.frames_processed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_toggles() {
        let panel = Arc::new(LedPanel::new());
        let handle = tokio::spawn(heartbeat(panel.clone(), Duration::from_millis(1000)));

        // First tick fires immediately
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(panel.heartbeat());
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(!panel.heartbeat());
        handle.abort();
    }
}
