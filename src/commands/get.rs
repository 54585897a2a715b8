use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{parse_key, CommandParserError};
use crate::response::Response;
use crate::store::Store;

/// Get the value of `key`. If the key does not exist, `NOTFOUND` is returned.
#[derive(Debug, PartialEq)]
pub struct Get {
    pub key: String,
}

impl Executable for Get {
    fn exec(self, store: Store) -> Response {
        let store = store.lock();

        match store.get(&self.key) {
            Some(value) => Response::Value(value),
            None => Response::NotFound,
        }
    }
}

impl TryFrom<Bytes> for Get {
    type Error = CommandParserError;

    fn try_from(args: Bytes) -> Result<Self, Self::Error> {
        let key = parse_key(args)?;
        Ok(Self { key })
    }
}
