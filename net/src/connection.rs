//! [`Connection`]: one bidirectional byte stream, framed by a [`Protocol`].
//! Generic over both the byte stream (a real TCP socket in production,
//! `tokio::io::duplex` halves in tests) and the protocol adapter, so
//! `polyrpc-client`/`polyrpc-server` write one dispatch loop that works
//! across all five wire protocols.

use std::marker::PhantomData;

use bytes::{Bytes, BytesMut};
use polyrpc_wire::frame::FrameCodec;
use polyrpc_wire::ParseOutcome;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;
use crate::protocol::{Protocol, RpcMeta};

/// Initial capacity for the read buffer; grows as the parser reports larger
/// deficits. The parser itself never allocates more than `ceiling` bytes for
/// one frame, but the buffer grows incrementally as bytes arrive.
const INITIAL_READ_CAPACITY: usize = 8 * 1024;

pub struct Connection<S, P: Protocol> {
    stream: S,
    read_buf: BytesMut,
    ceiling: usize,
    _protocol: PhantomData<P>,
}

impl<S, P> Connection<S, P>
where
    S: AsyncRead + AsyncWrite + Unpin,
    P: Protocol,
{
    #[must_use]
    pub fn new(stream: S, ceiling: usize) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(INITIAL_READ_CAPACITY),
            ceiling,
            _protocol: PhantomData,
        }
    }

    /// Encodes and writes one frame. Cancellation-safe only up to the point
    /// `write_all` is cancelled mid-write; callers that cancel a write must
    /// close the connection rather than reuse it: a partial write is
    /// terminal for this connection.
    pub async fn write_frame(&mut self, meta: &RpcMeta, payload: &[u8]) -> Result<(), TransportError> {
        let wire_meta = P::from_rpc_meta(meta);
        let bytes = <P::Codec as FrameCodec>::encode(&wire_meta, payload);
        self.stream.write_all(&bytes).await.map_err(TransportError::Write)?;
        self.stream.flush().await.map_err(TransportError::Write)
    }

    /// Reads and parses the next frame, pulling more bytes from the stream as
    /// the parser reports a deficit. Returns `Ok(None)` on a clean EOF with no
    /// partial frame buffered (end of a keep-alive connection); returns
    /// [`TransportError::ConnectionClosed`] if EOF arrives mid-frame.
    pub async fn read_frame(&mut self) -> Result<Option<(RpcMeta, Bytes)>, TransportError> {
        loop {
            match <P::Codec as FrameCodec>::decode(&mut self.read_buf, self.ceiling) {
                ParseOutcome::Frame(frame) => {
                    return Ok(Some((P::to_rpc_meta(&frame.meta), frame.payload)));
                }
                ParseOutcome::Error(error) => return Err(TransportError::Protocol(error)),
                ParseOutcome::NeedMoreBytes { needed } => {
                    let had_buffered = !self.read_buf.is_empty();
                    self.read_buf.reserve(needed);
                    let read = self
                        .stream
                        .read_buf(&mut self.read_buf)
                        .await
                        .map_err(TransportError::Read)?;
                    if read == 0 {
                        return if had_buffered {
                            Err(TransportError::ConnectionClosed)
                        } else {
                            Ok(None)
                        };
                    }
                }
            }
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
