//! Length-prefixed framing on the host's stdio stream.
//!
//! Each frame is a big-endian `u32` byte count followed by that many bytes
//! of UTF-8 JSON. A zero count is the host's shutdown signal; anything above
//! [`MAX_FRAME_LEN`] is treated as a desynchronized stream.

use crate::protocol::{Outbound, ProtocolError};
use std::io::{ErrorKind, Read, Write};

/// Largest inbound body accepted, in bytes.
pub const MAX_FRAME_LEN: u32 = 4096;

/// Where the reader is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    AwaitingLength,
    AwaitingBody { len: usize },
}

/// What a length prefix asks the reader to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthDecision {
    Shutdown,
    Oversized(u32),
    Body(usize),
}

pub fn classify_length(len: u32) -> LengthDecision {
    match len {
        0 => LengthDecision::Shutdown,
        n if n > MAX_FRAME_LEN => LengthDecision::Oversized(n),
        n => LengthDecision::Body(n as usize),
    }
}

/// Outcome of one call to [`FrameReader::next_frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// A complete body.
    Message(Vec<u8>),
    /// The host sent a zero length.
    Shutdown,
    /// The host sent a length above [`MAX_FRAME_LEN`]; no body was read.
    Oversized(u32),
    /// The input ended, possibly in the middle of a frame.
    Closed,
}

pub struct FrameReader<R> {
    reader: R,
    state: FrameState,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: FrameState::AwaitingLength,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Blocks until a full frame or a terminating condition arrives.
    pub fn next_frame(&mut self) -> Result<FrameEvent, ProtocolError> {
        loop {
            match self.state {
                FrameState::AwaitingLength => {
                    let mut prefix = [0u8; 4];
                    if !self.fill(&mut prefix)? {
                        return Ok(FrameEvent::Closed);
                    }
                    match classify_length(u32::from_be_bytes(prefix)) {
                        LengthDecision::Shutdown => return Ok(FrameEvent::Shutdown),
                        LengthDecision::Oversized(len) => return Ok(FrameEvent::Oversized(len)),
                        LengthDecision::Body(len) => self.state = FrameState::AwaitingBody { len },
                    }
                }
                FrameState::AwaitingBody { len } => {
                    let mut body = vec![0u8; len];
                    let complete = self.fill(&mut body)?;
                    self.state = FrameState::AwaitingLength;
                    if !complete {
                        tracing::warn!(expected = len, "Input closed in the middle of a frame");
                        return Ok(FrameEvent::Closed);
                    }
                    return Ok(FrameEvent::Message(body));
                }
            }
        }
    }

    /// Fills `buf` completely. Returns `false` if the stream ended first.
    fn fill(&mut self, buf: &mut [u8]) -> Result<bool, ProtocolError> {
        match self.reader.read_exact(buf) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
            Err(e) => Err(ProtocolError::Read(e)),
        }
    }
}

pub struct FrameWriter<W> {
    writer: W,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one frame and flushes; the host waits synchronously on it.
    pub fn send(&mut self, message: &Outbound) -> Result<(), ProtocolError> {
        let frame = encode_frame(message)?;
        self.writer.write_all(&frame).map_err(ProtocolError::Write)?;
        self.writer.flush().map_err(ProtocolError::Write)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub fn encode_frame(message: &Outbound) -> Result<Vec<u8>, ProtocolError> {
    let body = serde_json::to_vec(message).map_err(ProtocolError::Encode)?;
    let len = u32::try_from(body.len()).map_err(|_| ProtocolError::FrameTooLarge(body.len()))?;
    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}
