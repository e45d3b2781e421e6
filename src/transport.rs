/*!
The frame-transport contract and generic adapters.

The engine assumes nothing about the channel beyond in-order, reliable
delivery of opaque byte frames with preserved boundaries. Concrete
transports (TCP, WebSocket, a relay room) live outside the core; what
ships here is the trait, an adapter over a callback pair, a 4-byte
big-endian length-prefix codec for raw byte streams, and an in-process
pair for loopback wiring and tests.
*/

use std::io::{Read, Write};
use std::sync::mpsc::{channel, Receiver, Sender};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    constants::MAX_FRAME_LEN,
    error::{transport_err, Error, Result},
};

/// A blocking, message-boundary-preserving byte-frame channel
pub trait FrameTransport {
    /// Transmit exactly one opaque byte frame
    fn send_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Block until exactly one opaque byte frame is received
    fn recv_frame(&mut self) -> Result<Vec<u8>>;
}

/// Adapter over a pair of opaque callbacks.
///
/// `send` returns whether the frame was transmitted; `recv` returns
/// `None` once the channel is gone. Both map onto transport errors.
pub struct CallbackTransport<S, R>
where
    S: FnMut(&[u8]) -> bool,
    R: FnMut() -> Option<Vec<u8>>,
{
    send: S,
    recv: R,
}

impl<S, R> CallbackTransport<S, R>
where
    S: FnMut(&[u8]) -> bool,
    R: FnMut() -> Option<Vec<u8>>,
{
    /// Wrap a send/recv callback pair
    pub fn new(send: S, recv: R) -> Self {
        Self { send, recv }
    }
}

impl<S, R> FrameTransport for CallbackTransport<S, R>
where
    S: FnMut(&[u8]) -> bool,
    R: FnMut() -> Option<Vec<u8>>,
{
    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        if (self.send)(frame) {
            Ok(())
        } else {
            transport_err("send callback failed")
        }
    }

    fn recv_frame(&mut self) -> Result<Vec<u8>> {
        (self.recv)().ok_or_else(|| Error::Transport("recv callback failed".into()))
    }
}

/// Length-prefixed framing over a raw byte stream.
///
/// Each frame is preceded by a 4-byte big-endian length header. Frames
/// larger than [`MAX_FRAME_LEN`] are rejected before allocation.
pub struct LengthPrefixed<S: Read + Write> {
    stream: S,
}

impl<S: Read + Write> LengthPrefixed<S> {
    /// Wrap a connected byte stream
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Give the stream back, e.g. to shut it down
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> FrameTransport for LengthPrefixed<S> {
    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() > MAX_FRAME_LEN {
            return transport_err("frame exceeds maximum length");
        }
        self.stream
            .write_u32::<BigEndian>(frame.len() as u32)
            .and_then(|_| self.stream.write_all(frame))
            .and_then(|_| self.stream.flush())
            .map_err(|e| Error::Transport(format!("stream write failed: {}", e)))
    }

    fn recv_frame(&mut self) -> Result<Vec<u8>> {
        let len = self
            .stream
            .read_u32::<BigEndian>()
            .map_err(|e| Error::Transport(format!("stream read failed: {}", e)))?
            as usize;
        if len > MAX_FRAME_LEN {
            return transport_err("frame exceeds maximum length");
        }
        let mut frame = vec![0u8; len];
        self.stream
            .read_exact(&mut frame)
            .map_err(|e| Error::Transport(format!("stream read failed: {}", e)))?;
        Ok(frame)
    }
}

/// One end of an in-process frame channel
pub struct MemoryTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

/// Build a connected pair of in-process transports.
///
/// Frames written to one end are received by the other, in order.
/// Dropping one end makes the peer's calls fail with a transport
/// error, which is the only close signal the core knows about.
pub fn memory_pair() -> (MemoryTransport, MemoryTransport) {
    let (tx_a, rx_b) = channel();
    let (tx_b, rx_a) = channel();
    (
        MemoryTransport { tx: tx_a, rx: rx_a },
        MemoryTransport { tx: tx_b, rx: rx_b },
    )
}

impl FrameTransport for MemoryTransport {
    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.tx
            .send(frame.to_vec())
            .map_err(|_| Error::Transport("peer closed the channel".into()))
    }

    fn recv_frame(&mut self) -> Result<Vec<u8>> {
        self.rx
            .recv()
            .map_err(|_| Error::Transport("peer closed the channel".into()))
    }
}
