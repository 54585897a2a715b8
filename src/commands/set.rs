use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{parse_key, CommandParserError};
use crate::response::Response;
use crate::store::Store;

/// Set `key` to `value`, overwriting any previous value. The value runs from
/// the byte after the key separator to the end of the frame, so it may itself
/// contain spaces.
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: String,
    pub value: Bytes,
}

impl Executable for Set {
    fn exec(self, store: Store) -> Response {
        store.lock().set(self.key, self.value);
        Response::Ok
    }
}

impl TryFrom<Bytes> for Set {
    type Error = CommandParserError;

    fn try_from(args: Bytes) -> Result<Self, Self::Error> {
        if args.is_empty() {
            return Err(CommandParserError::BadKey);
        }

        let at = args
            .iter()
            .position(|&b| b == b' ')
            .ok_or(CommandParserError::MissingValue)?;

        let key = parse_key(args.slice(..at))?;
        let value = args.slice(at + 1..);

        Ok(Self { key, value })
    }
}
