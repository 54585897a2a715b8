use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error as ThisError;
use tokio_util::codec::{Decoder, Encoder};

/// Size of the length header prefixed to every frame.
pub const LENGTH_HEADER_SIZE: usize = 4;

/// Default cap on a frame's payload size.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Length-prefixed framing over a byte stream: a 4-byte big-endian payload
/// length followed by exactly that many payload bytes.
///
/// Partial arrivals are left in the buffer and reported as "not yet a frame"
/// (`Ok(None)`); a length header above `max_frame_size` is a protocol
/// violation and fails the decode.
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> FrameCodec {
        FrameCodec { max_frame_size }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_HEADER_SIZE {
            // Not enough data to read the length header.
            return Ok(None);
        }

        let mut header = [0u8; LENGTH_HEADER_SIZE];
        header.copy_from_slice(&src[..LENGTH_HEADER_SIZE]);
        let len = u32::from_be_bytes(header) as usize;

        // Reject oversized frames before buffering their payload, so a hostile
        // header cannot make us allocate unbounded memory.
        if len > self.max_frame_size {
            return Err(Error::FrameTooLarge {
                len,
                max: self.max_frame_size,
            });
        }

        if src.len() < LENGTH_HEADER_SIZE + len {
            // The full payload has not arrived yet. Reserve space for the rest
            // so subsequent reads land in one allocation.
            src.reserve(LENGTH_HEADER_SIZE + len - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_HEADER_SIZE);
        Ok(Some(src.split_to(len).freeze()))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if payload.len() > self.max_frame_size {
            return Err(Error::FrameTooLarge {
                len: payload.len(),
                max: self.max_frame_size,
            });
        }

        dst.reserve(LENGTH_HEADER_SIZE + payload.len());
        dst.put_u32(payload.len() as u32);
        dst.extend_from_slice(&payload);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn encoded(payload: &[u8]) -> BytesMut {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        codec
            .encode(Bytes::copy_from_slice(payload), &mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn round_trip() {
        let mut codec = FrameCodec::default();
        let mut buf = encoded(b"hello world");

        let frame = codec.decode(&mut buf).unwrap();

        assert_eq!(frame, Some(Bytes::from_static(b"hello world")));
        assert!(buf.is_empty());
    }

    #[test]
    fn round_trip_empty_payload() {
        let mut codec = FrameCodec::default();
        let mut buf = encoded(b"");

        let frame = codec.decode(&mut buf).unwrap();

        assert_eq!(frame, Some(Bytes::new()));
        assert!(buf.is_empty());
    }

    #[test]
    fn incomplete_header_is_not_a_frame() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&[0u8, 0, 0][..]);

        let frame = codec.decode(&mut buf).unwrap();

        assert_eq!(frame, None);
        // The partial header stays buffered for the next read.
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn incomplete_payload_is_not_a_frame() {
        let mut codec = FrameCodec::default();
        let mut buf = encoded(b"hello");
        buf.truncate(LENGTH_HEADER_SIZE + 3);

        let frame = codec.decode(&mut buf).unwrap();

        assert_eq!(frame, None);
        assert_eq!(buf.len(), LENGTH_HEADER_SIZE + 3);
    }

    #[test]
    fn one_byte_at_a_time() {
        let mut codec = FrameCodec::default();
        let wire = encoded(b"partial delivery");

        let mut buf = BytesMut::new();
        for (i, byte) in wire.iter().enumerate() {
            buf.put_u8(*byte);

            let frame = codec.decode(&mut buf).unwrap();
            if i < wire.len() - 1 {
                assert_eq!(frame, None);
            } else {
                assert_eq!(frame, Some(Bytes::from_static(b"partial delivery")));
            }
        }
    }

    #[test]
    fn random_chunk_sizes() {
        let mut rng = rand::thread_rng();

        let mut payload = vec![0u8; 1000];
        rng.fill(&mut payload[..]);

        let wire = encoded(&payload);

        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        let mut frames = Vec::new();

        let mut remaining = &wire[..];
        while !remaining.is_empty() {
            let chunk = rng.gen_range(1..=7).min(remaining.len());
            buf.extend_from_slice(&remaining[..chunk]);
            remaining = &remaining[chunk..];

            while let Some(frame) = codec.decode(&mut buf).unwrap() {
                frames.push(frame);
            }
        }

        assert_eq!(frames, vec![Bytes::from(payload)]);
    }

    #[test]
    fn two_frames_in_one_buffer() {
        let mut codec = FrameCodec::default();
        let mut buf = encoded(b"first");
        buf.extend_from_slice(&encoded(b"second"));

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Bytes::from_static(b"first"))
        );
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Bytes::from_static(b"second"))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn oversize_header_is_rejected() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::new();
        buf.put_u32(9);

        let err = codec.decode(&mut buf).unwrap_err();

        assert!(matches!(err, Error::FrameTooLarge { len: 9, max: 8 }));
    }

    #[test]
    fn oversize_header_is_rejected_before_payload_arrives() {
        // The declared length alone is enough to fail; no payload bytes needed.
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        buf.put_u32((DEFAULT_MAX_FRAME_SIZE + 1) as u32);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(Error::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn encode_rejects_oversize_payload() {
        let mut codec = FrameCodec::new(4);
        let mut buf = BytesMut::new();

        let err = codec
            .encode(Bytes::from_static(b"hello"), &mut buf)
            .unwrap_err();

        assert!(matches!(err, Error::FrameTooLarge { len: 5, max: 4 }));
        assert!(buf.is_empty());
    }
}
