//! Console command table and parser

use crate::CommandError;
use gesture_engine::GestureSelector;

/// Accepted parameter count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

/// Command registration entry
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub arity: Arity,
}

/// Every command, in `help` listing order
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "help",
        help: "help - Lists all the registered commands",
        arity: Arity::Exact(0),
    },
    CommandSpec {
        name: "verbose",
        help: "verbose <enable|disable> - Enable/disable gesture events with detection timestamps",
        arity: Arity::Exact(1),
    },
    CommandSpec {
        name: "board_info",
        help: "board_info - Board information",
        arity: Arity::Exact(0),
    },
    CommandSpec {
        name: "config",
        help: "config - Solution configuration information",
        arity: Arity::Exact(0),
    },
    CommandSpec {
        name: "gestures_list",
        help: "gestures_list - Display all supported gestures",
        arity: Arity::Exact(0),
    },
    CommandSpec {
        name: "gestures_detect",
        help: "gestures_detect <Gestures|ALL> - eg: gestures_detect PUSH SWIPE_UP enables PUSH and SWIPE_UP",
        arity: Arity::AtLeast(1),
    },
    CommandSpec {
        name: "status",
        help: "status - Last inference result, verbose flag, last event time and mode",
        arity: Arity::Exact(0),
    },
];

/// Decoded console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Verbose(bool),
    BoardInfo,
    Config,
    GesturesList,
    /// Recognised selectors, plus tokens that did not name a selectable class
    GesturesDetect {
        selectors: Vec<GestureSelector>,
        rejected: Vec<String>,
    },
    Status,
}

impl Command {
    /// Decode one line. Returns `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let mut tokens = line.split_ascii_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(None);
        };
        let params: Vec<&str> = tokens.collect();

        let spec = COMMANDS
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;

        if !spec.arity.accepts(params.len()) {
            return Err(CommandError::WrongArity {
                command: spec.name,
                got: params.len(),
            });
        }

        let command = match spec.name {
            "help" => Command::Help,
            "verbose" => Command::Verbose(parse_switch(spec.name, params[0])?),
            "board_info" => Command::BoardInfo,
            "config" => Command::Config,
            "gestures_list" => Command::GesturesList,
            "gestures_detect" => {
                let mut selectors = Vec::with_capacity(params.len());
                let mut rejected = Vec::new();
                for token in params {
                    match token.parse::<GestureSelector>() {
                        Ok(GestureSelector::Class(class)) if !class.is_selectable() => {
                            rejected.push(token.to_string())
                        }
                        Ok(selector) => selectors.push(selector),
                        Err(_) => rejected.push(token.to_string()),
                    }
                }
                Command::GesturesDetect { selectors, rejected }
            }
            "status" => Command::Status,
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_switch(command: &'static str, value: &str) -> Result<bool, CommandError> {
    if value.eq_ignore_ascii_case("enable") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("disable") {
        Ok(false)
    } else {
        Err(CommandError::InvalidValue {
            command,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_engine::GestureClass;

    #[test]
    fn test_blank_line() {
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(Command::parse("   "), Ok(None));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::parse("help"), Ok(Some(Command::Help)));
        assert_eq!(Command::parse("  CONFIG "), Ok(Some(Command::Config)));
        assert_eq!(Command::parse("board_info"), Ok(Some(Command::BoardInfo)));
        assert_eq!(Command::parse("gestures_list"), Ok(Some(Command::GesturesList)));
        assert_eq!(Command::parse("status"), Ok(Some(Command::Status)));
    }

    #[test]
    fn test_verbose_values() {
        assert_eq!(Command::parse("verbose enable"), Ok(Some(Command::Verbose(true))));
        assert_eq!(Command::parse("verbose DISABLE"), Ok(Some(Command::Verbose(false))));
        assert!(matches!(
            Command::parse("verbose garbage"),
            Err(CommandError::InvalidValue { command: "verbose", .. })
        ));
    }

    #[test]
    fn test_verbose_help_describes_event_lines() {
        let verbose = COMMANDS.iter().find(|c| c.name == "verbose").unwrap();
        assert!(verbose.help.contains("timestamps"));
        assert!(!verbose.help.contains("every second"));
    }

    #[test]
    fn test_arity_checked() {
        assert_eq!(
            Command::parse("verbose"),
            Err(CommandError::WrongArity { command: "verbose", got: 0 })
        );
        assert_eq!(
            Command::parse("config now"),
            Err(CommandError::WrongArity { command: "config", got: 1 })
        );
        assert!(matches!(
            Command::parse("gestures_detect"),
            Err(CommandError::WrongArity { .. })
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse("reboot"),
            Err(CommandError::UnknownCommand("reboot".into()))
        );
    }

    #[test]
    fn test_gestures_detect_tokens() {
        let parsed = Command::parse("gestures_detect push wave unknown_1 ANY").unwrap();
        assert_eq!(
            parsed,
            Some(Command::GesturesDetect {
                selectors: vec![GestureSelector::Class(GestureClass::Push), GestureSelector::Any],
                rejected: vec!["wave".into(), "unknown_1".into()],
            })
        );
    }

    #[test]
    fn test_background_not_selectable() {
        let parsed = Command::parse("gestures_detect background").unwrap();
        assert_eq!(
            parsed,
            Some(Command::GesturesDetect {
                selectors: vec![],
                rejected: vec!["background".into()],
            })
        );
    }

    #[test]
    fn test_table_has_help_for_every_command() {
        for spec in COMMANDS {
            assert!(spec.help.starts_with(spec.name));
        }
    }
}
