//! Console state machine

use crate::command::{Command, COMMANDS};
use crate::keys::{BACKSPACE, DELETE, ENTER, ESC};
use crate::line::LineBuffer;
use crate::CommandError;
use detection::{DetectionMask, Indication, SessionMode, SharedState, SignalPanel};
use gesture_engine::{GestureClass, GestureSelector};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identity reported by `board_info`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardInfo {
    pub application: String,
    pub firmware: String,
    pub device_name: String,
    pub device_version: String,
}

impl Default for BoardInfo {
    fn default() -> Self {
        Self {
            application: "XENSIV Radar Gestures".to_string(),
            firmware: "0.5.0".to_string(),
            device_name: "KIT-BGT60TR13C-EMBEDD".to_string(),
            device_version: "1.0.0".to_string(),
        }
    }
}

/// Key-driven console.
///
/// In passive mode only ENTER is honoured. In settings mode keystrokes edit
/// a line that is decoded and executed on ENTER; ESC leaves settings mode.
/// Only the shared state and the signal panel are touched, never the
/// frame path.
pub struct ConsoleController<W: Write> {
    state: Arc<SharedState>,
    panel: Arc<dyn SignalPanel>,
    board: BoardInfo,
    out: W,
    line: LineBuffer,
    mode: SessionMode,
}

impl<W: Write> ConsoleController<W> {
    pub fn new(state: Arc<SharedState>, panel: Arc<dyn SignalPanel>, board: BoardInfo, out: W) -> Self {
        Self {
            state,
            panel,
            board,
            out,
            line: LineBuffer::new(),
            mode: SessionMode::Passive,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Current (unsubmitted) input line
    pub fn pending_line(&self) -> &str {
        self.line.as_str()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Process bytes until the input closes
    pub fn run<R: Read>(&mut self, input: R) -> io::Result<()> {
        info!("Console ready, press ENTER for settings mode");
        for byte in input.bytes() {
            self.on_key(byte?)?;
        }
        info!("Console input closed");
        Ok(())
    }

    /// Handle one keystroke
    pub fn on_key(&mut self, key: u8) -> io::Result<()> {
        match self.mode {
            SessionMode::Passive => {
                if key == ENTER {
                    self.enter_settings()?;
                }
            }
            SessionMode::Settings => match key {
                ESC => self.leave_settings()?,
                ENTER => self.submit()?,
                BACKSPACE | DELETE => {
                    if self.line.backspace() {
                        self.out.write_all(&[BACKSPACE])?;
                    }
                }
                _ => {
                    if self.line.push(key) {
                        self.out.write_all(&[key])?;
                    }
                }
            },
        }
        self.out.flush()
    }

    fn enter_settings(&mut self) -> io::Result<()> {
        self.mode = SessionMode::Settings;
        self.state.set_mode(SessionMode::Settings);
        self.line.clear();
        self.panel.indicate(Indication::Settings);
        info!("Console: settings mode");
        write!(self.out, "\r\nEnter settings mode\r\n> ")
    }

    fn leave_settings(&mut self) -> io::Result<()> {
        self.mode = SessionMode::Passive;
        self.state.set_mode(SessionMode::Passive);
        self.line.clear();
        self.panel.indicate(Indication::Searching);
        info!("Console: passive mode");
        write!(self.out, "\r\nQuit from settings menu\r\n\r\n")
    }

    fn submit(&mut self) -> io::Result<()> {
        let line = self.line.take();
        self.out.write_all(b"\r\n")?;

        match Command::parse(&line) {
            Ok(None) => {}
            Ok(Some(command)) => {
                debug!("Console command: {:?}", command);
                self.execute(command)?;
            }
            Err(err) => {
                warn!("Console: {}", err);
                self.reply_error(&err)?;
            }
        }
        write!(self.out, "> ")
    }

    fn reply_error(&mut self, err: &CommandError) -> io::Result<()> {
        match err {
            CommandError::UnknownCommand(_) => {
                write!(self.out, "Command not recognised.\r\n")?;
                self.help()
            }
            CommandError::WrongArity { .. } => write!(
                self.out,
                "Incorrect command parameter(s).  Enter \"help\" to view a list of available commands.\r\n\r\n"
            ),
            CommandError::InvalidValue { .. } => write!(self.out, "Invalid value.\r\n\r\n"),
        }
    }

    fn execute(&mut self, command: Command) -> io::Result<()> {
        match command {
            Command::Help => self.help(),
            Command::Verbose(enabled) => {
                self.state.set_verbose(enabled);
                info!("Verbose output {}", if enabled { "enabled" } else { "disabled" });
                write!(self.out, "ok\r\n")
            }
            Command::BoardInfo => {
                let board = &self.board;
                write!(
                    self.out,
                    "[BOARD_INFO]\r\n\
                     [BOARD_INFO] application {}\r\n\
                     [BOARD_INFO] firmware {}\r\n\
                     [BOARD_INFO] device_name {}\r\n\
                     [BOARD_INFO] device_version {}\r\n\
                     [BOARD_INFO]\r\n",
                    board.application, board.firmware, board.device_name, board.device_version
                )
            }
            Command::Config => {
                write!(self.out, "[CONFIG]\r\n")?;
                self.gestures_list_line()?;
                write!(self.out, "[CONFIG] gestures_detect {}\r\n", self.state.mask())?;
                write!(self.out, "[CONFIG]\r\n")
            }
            Command::GesturesList => {
                write!(self.out, "[CONFIG]\r\n")?;
                self.gestures_list_line()?;
                write!(self.out, "[CONFIG]\r\n")
            }
            Command::GesturesDetect { selectors, rejected } => self.gestures_detect(&selectors, &rejected),
            Command::Status => {
                let status = self.state.snapshot();
                let mode = match status.mode {
                    SessionMode::Passive => "passive",
                    SessionMode::Settings => "settings",
                };
                write!(
                    self.out,
                    "[STATUS] mode {}\r\n\
                     [STATUS] verbose {}\r\n\
                     [STATUS] last_result {} {:.6}\r\n\
                     [STATUS] last_event_ms {}\r\n\
                     [STATUS] gestures_detect {}\r\n",
                    mode,
                    if status.verbose { "enable" } else { "disable" },
                    status.last_result.class,
                    status.last_result.confidence,
                    status.last_event_ms,
                    status.mask
                )
            }
        }
    }

    fn help(&mut self) -> io::Result<()> {
        for spec in COMMANDS {
            write!(self.out, "{}\r\n", spec.help)?;
        }
        self.out.write_all(b"\r\n")
    }

    fn gestures_list_line(&mut self) -> io::Result<()> {
        write!(self.out, "[CONFIG] gestures_list")?;
        for class in GestureClass::SELECTABLE {
            write!(self.out, " {}", class)?;
        }
        self.out.write_all(b"\r\n")
    }

    /// Build the complete candidate mask first, then swap it in
    fn gestures_detect(&mut self, selectors: &[GestureSelector], rejected: &[String]) -> io::Result<()> {
        for token in rejected {
            warn!("Console: ignoring gesture '{}'", token);
            write!(self.out, "[MSG] ERROR Invalid gesture '{}'\r\n", token)?;
        }

        let mut candidate = DetectionMask::empty();
        for selector in selectors {
            candidate.select(*selector);
        }
        self.state.replace_mask(candidate);

        if selectors.is_empty() {
            // Nothing recognised: the empty candidate still replaces the mask
            return write!(self.out, "Invalid value.\r\n\r\n");
        }
        write!(self.out, "[CONFIG] gestures_detect {}\r\n", candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detection::LedPanel;
    use gesture_engine::InferenceResult;

    type TestConsole = ConsoleController<Vec<u8>>;

    fn setup() -> (TestConsole, Arc<SharedState>, Arc<LedPanel>) {
        let state = Arc::new(SharedState::default());
        let panel = Arc::new(LedPanel::new());
        let console = ConsoleController::new(state.clone(), panel.clone(), BoardInfo::default(), Vec::new());
        (console, state, panel)
    }

    fn output(console: &TestConsole) -> String {
        String::from_utf8_lossy(console.output()).into_owned()
    }

    fn type_line(console: &mut TestConsole, line: &str) {
        for &b in line.as_bytes() {
            console.on_key(b).unwrap();
        }
        console.on_key(ENTER).unwrap();
    }

    fn settings() -> (TestConsole, Arc<SharedState>, Arc<LedPanel>) {
        let (mut console, state, panel) = setup();
        console.on_key(ENTER).unwrap();
        (console, state, panel)
    }

    #[test]
    fn test_passive_ignores_keys() {
        let (mut console, state, _) = setup();
        for &b in b"help" {
            console.on_key(b).unwrap();
        }
        console.on_key(ESC).unwrap();
        assert_eq!(console.mode(), SessionMode::Passive);
        assert_eq!(state.mode(), SessionMode::Passive);
        assert!(console.output().is_empty());
    }

    #[test]
    fn test_enter_and_leave_settings() {
        let (mut console, state, panel) = setup();
        console.on_key(ENTER).unwrap();
        assert_eq!(state.mode(), SessionMode::Settings);
        assert_eq!(panel.current(), Indication::Settings);
        assert_eq!(output(&console), "\r\nEnter settings mode\r\n> ");

        console.on_key(b'x').unwrap();
        console.on_key(ESC).unwrap();
        assert_eq!(state.mode(), SessionMode::Passive);
        assert_eq!(panel.current(), Indication::Searching);
        assert!(console.pending_line().is_empty());
        assert!(output(&console).ends_with("\r\nQuit from settings menu\r\n\r\n"));
    }

    #[test]
    fn test_echo_and_backspace() {
        let (mut console, _, _) = settings();
        let start = console.output().len();
        for &b in b"ab" {
            console.on_key(b).unwrap();
        }
        console.on_key(BACKSPACE).unwrap();
        console.on_key(DELETE).unwrap();
        // Nothing left to erase, no echo
        console.on_key(BACKSPACE).unwrap();
        assert_eq!(&console.output()[start..], b"ab\x08\x08");
        assert!(console.pending_line().is_empty());
    }

    #[test]
    fn test_newline_ignored() {
        let (mut console, _, _) = settings();
        console.on_key(b'\n').unwrap();
        console.on_key(b'h').unwrap();
        assert_eq!(console.pending_line(), "h");
    }

    #[test]
    fn test_empty_line_reprompts() {
        let (mut console, _, _) = settings();
        console.on_key(ENTER).unwrap();
        assert_eq!(output(&console), "\r\nEnter settings mode\r\n> \r\n> ");
    }

    #[test]
    fn test_verbose_round_trip() {
        let (mut console, state, _) = settings();
        type_line(&mut console, "verbose enable");
        assert!(state.verbose());
        assert!(output(&console).ends_with("ok\r\n> "));

        type_line(&mut console, "verbose disable");
        assert!(!state.verbose());
    }

    #[test]
    fn test_verbose_garbage_keeps_flag() {
        let (mut console, state, _) = settings();
        state.set_verbose(true);
        type_line(&mut console, "verbose garbage");
        assert!(state.verbose());
        assert!(output(&console).ends_with("Invalid value.\r\n\r\n> "));
    }

    #[test]
    fn test_gestures_detect_any() {
        let (mut console, state, _) = settings();
        state.replace_mask(DetectionMask::empty());
        type_line(&mut console, "gestures_detect any");
        assert_eq!(state.mask(), DetectionMask::all());
        for class in GestureClass::SELECTABLE {
            assert!(state.mask().contains(class));
        }
    }

    #[test]
    fn test_gestures_detect_replaces_mask() {
        let (mut console, state, _) = settings();
        type_line(&mut console, "gestures_detect push swipe_up");

        let enabled: Vec<GestureClass> = state.mask().iter().collect();
        assert_eq!(enabled, vec![GestureClass::Push, GestureClass::SwipeUp]);
        assert!(output(&console).contains("[CONFIG] gestures_detect PUSH SWIPE_UP\r\n"));
    }

    #[test]
    fn test_gestures_detect_partial_tokens() {
        let (mut console, state, _) = settings();
        type_line(&mut console, "gestures_detect wave SWIPE_DOWN");
        let enabled: Vec<GestureClass> = state.mask().iter().collect();
        assert_eq!(enabled, vec![GestureClass::SwipeDown]);
        assert!(output(&console).contains("[MSG] ERROR Invalid gesture 'wave'\r\n"));
    }

    #[test]
    fn test_gestures_detect_nothing_recognised_clears_mask() {
        let (mut console, state, _) = settings();
        type_line(&mut console, "gestures_detect wave unknown_2");
        assert!(state.mask().is_empty());
        let out = output(&console);
        assert!(out.contains("[MSG] ERROR Invalid gesture 'wave'\r\n"));
        assert!(out.contains("[MSG] ERROR Invalid gesture 'unknown_2'\r\n"));
        assert!(out.contains("Invalid value.\r\n\r\n"));
    }

    #[test]
    fn test_config_report() {
        let (mut console, state, _) = settings();
        let mut push = DetectionMask::empty();
        push.insert(GestureClass::Push);
        state.replace_mask(push);

        type_line(&mut console, "config");
        assert!(output(&console).ends_with(
            "[CONFIG]\r\n\
             [CONFIG] gestures_list PUSH SWIPE_LEFT SWIPE_RIGHT SWIPE_UP SWIPE_DOWN\r\n\
             [CONFIG] gestures_detect PUSH\r\n\
             [CONFIG]\r\n> "
        ));
    }

    #[test]
    fn test_board_info() {
        let (mut console, _, _) = settings();
        type_line(&mut console, "board_info");
        let out = output(&console);
        assert!(out.contains("[BOARD_INFO] application XENSIV Radar Gestures\r\n"));
        assert!(out.contains("[BOARD_INFO] firmware 0.5.0\r\n"));
        assert!(out.contains("[BOARD_INFO] device_name KIT-BGT60TR13C-EMBEDD\r\n"));
    }

    #[test]
    fn test_unknown_command_lists_help() {
        let (mut console, _, _) = settings();
        type_line(&mut console, "reboot");
        let out = output(&console);
        assert!(out.contains("Command not recognised.\r\n"));
        for spec in COMMANDS {
            assert!(out.contains(spec.help));
        }
    }

    #[test]
    fn test_wrong_arity() {
        let (mut console, _, _) = settings();
        type_line(&mut console, "verbose");
        assert!(output(&console).contains("Incorrect command parameter(s)."));
    }

    #[test]
    fn test_status() {
        let (mut console, state, _) = settings();
        state.record_result(InferenceResult::new(GestureClass::SwipeLeft, 0.5));
        type_line(&mut console, "status");
        let out = output(&console);
        assert!(out.contains("[STATUS] mode settings\r\n"));
        assert!(out.contains("[STATUS] last_result SWIPE_LEFT 0.500000\r\n"));
    }

    #[test]
    fn test_run_reads_until_eof() {
        let (mut console, state, _) = setup();
        console.run(&b"\rverbose enable\r\x1b"[..]).unwrap();
        assert!(state.verbose());
        assert_eq!(console.mode(), SessionMode::Passive);
    }
}
