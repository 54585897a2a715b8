use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use uuid::Uuid;

use crate::codec::{self, FrameCodec};

/// A framed view over one TCP socket. The codec buffers partially arrived
/// frames internally, so `read_frame` only ever yields complete payloads.
pub struct Connection {
    pub id: Uuid,
    pub peer_address: SocketAddr,
    frames: Framed<TcpStream, FrameCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream, peer_address: SocketAddr, max_frame_size: usize) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            peer_address,
            frames: Framed::new(stream, FrameCodec::new(max_frame_size)),
        }
    }

    /// Reads the next complete frame payload. Returns `None` on a clean EOF
    /// from the peer.
    pub async fn read_frame(&mut self) -> Result<Option<Bytes>, codec::Error> {
        self.frames.next().await.transpose()
    }

    /// Encodes `payload` as one frame and flushes it fully to the socket,
    /// retrying short writes until everything is on the wire.
    pub async fn write_frame(&mut self, payload: Bytes) -> Result<(), codec::Error> {
        self.frames.send(payload).await
    }
}
