pub mod executable;
pub mod get;
pub mod set;

use bytes::Bytes;
use std::str;
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::response::Response;
use crate::store::Store;

use get::Get;
use set::Set;

/// Upper bound on a key's size in bytes, so hostile requests cannot grow the
/// store's key space arbitrarily. Values are already bounded by the maximum
/// frame size.
pub const MAX_KEY_SIZE: usize = 1024;

#[derive(Debug, PartialEq)]
pub enum Command {
    Get(Get),
    Set(Set),
}

impl Executable for Command {
    fn exec(self, store: Store) -> Response {
        match self {
            Command::Get(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
        }
    }
}

impl TryFrom<Bytes> for Command {
    type Error = CommandParserError;

    /// Parses a frame payload into a command. Total over all byte sequences:
    /// every input yields either a command or a parse error, never a panic.
    fn try_from(payload: Bytes) -> Result<Self, Self::Error> {
        let (verb, args) = match payload.iter().position(|&b| b == b' ') {
            Some(at) => (payload.slice(..at), payload.slice(at + 1..)),
            None => (payload.clone(), Bytes::new()),
        };

        match &verb[..] {
            b"GET" => Get::try_from(args).map(Command::Get),
            b"SET" => Set::try_from(args).map(Command::Set),
            _ => Err(CommandParserError::UnknownCommand),
        }
    }
}

/// Validates one key token: non-empty, within `MAX_KEY_SIZE`, UTF-8, and free
/// of separators.
pub(crate) fn parse_key(bytes: Bytes) -> Result<String, CommandParserError> {
    if bytes.is_empty() || bytes.len() > MAX_KEY_SIZE {
        return Err(CommandParserError::BadKey);
    }

    let key = str::from_utf8(&bytes).map_err(|_| CommandParserError::BadKey)?;
    if key.contains(' ') {
        return Err(CommandParserError::BadKey);
    }

    Ok(key.to_string())
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("bad key")]
    BadKey,
    #[error("unknown command")]
    UnknownCommand,
    #[error("missing value")]
    MissingValue,
}
