use bytes::{BufMut, Bytes, BytesMut};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::codec;
use crate::connection::Connection;
use crate::response::Response;
use crate::Error;

/// A client for the framed key-value protocol. Requests and responses travel
/// in strict alternation over one connection, so each call writes one frame
/// and waits for exactly one response frame.
pub struct Client {
    connection: Connection,
}

impl Client {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Client, Error> {
        Self::connect_with_max_frame_size(addr, codec::DEFAULT_MAX_FRAME_SIZE).await
    }

    /// Connects with a non-default frame size cap. The cap must match the
    /// server's, otherwise frames the server accepts may be rejected locally.
    pub async fn connect_with_max_frame_size<A: ToSocketAddrs>(
        addr: A,
        max_frame_size: usize,
    ) -> Result<Client, Error> {
        let stream = TcpStream::connect(addr).await?;
        let peer_address = stream.peer_addr()?;

        Ok(Client {
            connection: Connection::new(stream, peer_address, max_frame_size),
        })
    }

    /// Fetches the value stored under `key`; `None` if the key is absent.
    pub async fn get(&mut self, key: &str) -> Result<Option<Bytes>, Error> {
        let payload = Bytes::from(format!("GET {key}"));
        self.connection.write_frame(payload).await?;

        match self.read_response().await? {
            Response::Value(value) => Ok(Some(value)),
            Response::NotFound => Ok(None),
            Response::Error(reason) => Err(reason.into()),
            response => Err(format!("unexpected response to GET: {:?}", response).into()),
        }
    }

    /// Stores `value` under `key`, overwriting any previous value.
    pub async fn set(&mut self, key: &str, value: impl Into<Bytes>) -> Result<(), Error> {
        let value = value.into();

        let mut payload = BytesMut::with_capacity(5 + key.len() + value.len());
        payload.extend_from_slice(b"SET ");
        payload.extend_from_slice(key.as_bytes());
        payload.put_u8(b' ');
        payload.extend_from_slice(&value);

        self.connection.write_frame(payload.freeze()).await?;

        match self.read_response().await? {
            Response::Ok => Ok(()),
            Response::Error(reason) => Err(reason.into()),
            response => Err(format!("unexpected response to SET: {:?}", response).into()),
        }
    }

    async fn read_response(&mut self) -> Result<Response, Error> {
        let payload = self
            .connection
            .read_frame()
            .await?
            .ok_or("connection closed by server")?;

        Ok(Response::parse(&payload)?)
    }
}
