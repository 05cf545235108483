//! Command errors.
//!
//! Each variant's `Display` text is exactly what goes on the wire after the
//! `-` prefix.

use crate::storage::StorageError;
use thiserror::Error;

/// Why a command could not be executed. No mutation happens on any of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Wrong number of arguments; holds the lower-cased verb
    #[error("ERR wrong number of arguments for '{0}' command")]
    Arity(String),

    #[error("ERR WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    /// Holds the verb as upper-cased for dispatch
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR empty command")]
    EmptyCommand,

    /// Anything unexpected caught at the dispatcher boundary
    #[error("ERR {0}")]
    Internal(String),
}

impl From<StorageError> for CommandError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::WrongType => CommandError::WrongType,
            // Out of range is reported the same way as not a number
            StorageError::NotAnInteger | StorageError::Overflow => CommandError::NotAnInteger,
        }
    }
}

/// Result type for command handlers.
pub type CommandResult<T> = Result<T, CommandError>;
