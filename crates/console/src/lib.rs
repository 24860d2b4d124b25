//! Operator Console
//!
//! Byte-at-a-time console. ENTER opens settings mode, where a line editor
//! feeds a small command interpreter that adjusts the detection mask and
//! the verbose flag. ESC returns to passive mode.

mod command;
mod controller;
mod line;

pub use command::{Arity, Command, CommandSpec, COMMANDS};
pub use controller::{BoardInfo, ConsoleController};
pub use line::{LineBuffer, MAX_INPUT_LEN};

use thiserror::Error;

/// Errors decoding a console line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Wrong parameter count for '{command}': got {got}")]
    WrongArity { command: &'static str, got: usize },

    #[error("Invalid value '{value}' for '{command}'")]
    InvalidValue { command: &'static str, value: String },
}

/// Console key codes
pub mod keys {
    pub const ENTER: u8 = 0x0D;
    pub const ESC: u8 = 0x1B;
    pub const BACKSPACE: u8 = 0x08;
    pub const DELETE: u8 = 0x7F;
}
