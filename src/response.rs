use bytes::{Bytes, BytesMut};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError, PartialEq)]
#[error("invalid response payload")]
pub struct InvalidResponse;

/// A server reply, one per request frame.
///
/// The wire form is the frame payload itself: `OK`, `VALUE <value>`,
/// `NOTFOUND`, or `ERROR <reason>`.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Ok,
    Value(Bytes),
    NotFound,
    Error(String),
}

impl Response {
    pub fn encode(&self) -> Bytes {
        match self {
            Response::Ok => Bytes::from_static(b"OK"),
            Response::NotFound => Bytes::from_static(b"NOTFOUND"),
            Response::Value(value) => {
                let mut buf = BytesMut::with_capacity(6 + value.len());
                buf.extend_from_slice(b"VALUE ");
                buf.extend_from_slice(value);
                buf.freeze()
            }
            Response::Error(reason) => Bytes::from(format!("ERROR {reason}")),
        }
    }

    pub fn parse(payload: &[u8]) -> Result<Response, InvalidResponse> {
        match payload {
            b"OK" => Ok(Response::Ok),
            b"NOTFOUND" => Ok(Response::NotFound),
            _ if payload.starts_with(b"VALUE ") => {
                Ok(Response::Value(Bytes::copy_from_slice(&payload[6..])))
            }
            _ if payload.starts_with(b"ERROR ") => {
                let reason = std::str::from_utf8(&payload[6..]).map_err(|_| InvalidResponse)?;
                Ok(Response::Error(reason.to_string()))
            }
            _ => Err(InvalidResponse),
        }
    }
}
