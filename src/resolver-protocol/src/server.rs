//! The resolver's request loop.

use crate::dispatch::Dispatcher;
use crate::framing::{FrameEvent, FrameReader, FrameWriter};
use crate::protocol::{decode_inbound, Inbound, Outbound, ProtocolError};
use std::io::{Read, Write};
use tracing::Span;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The host sent a zero-length frame.
    Shutdown,
    /// The host sent a length over the cap; the stream is considered desynchronized.
    Oversized(u32),
    /// The input stream ended.
    Closed,
}

/// Serves requests one at a time, in arrival order, until the host stops
/// the conversation.
pub struct RequestLoop<'a, R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    dispatcher: Dispatcher<'a>,
    span: Span,
}

impl<'a, R: Read, W: Write> RequestLoop<'a, R, W> {
    pub fn new(
        reader: FrameReader<R>,
        writer: FrameWriter<W>,
        dispatcher: Dispatcher<'a>,
        span: Span,
    ) -> Self {
        Self {
            reader,
            writer,
            dispatcher,
            span,
        }
    }

    /// Runs until shutdown, an oversized frame or end of input.
    ///
    /// A body that fails to decode only costs that one request. Read and
    /// write failures on the stream itself end the loop with an error.
    pub fn run(&mut self) -> Result<LoopExit, ProtocolError> {
        loop {
            let body = match self.reader.next_frame()? {
                FrameEvent::Message(body) => body,
                FrameEvent::Shutdown => {
                    tracing::info!(parent: &self.span, "Host requested shutdown");
                    return Ok(LoopExit::Shutdown);
                }
                FrameEvent::Oversized(len) => {
                    tracing::error!(parent: &self.span, len, "Frame length over limit, stopping");
                    return Ok(LoopExit::Oversized(len));
                }
                FrameEvent::Closed => {
                    tracing::info!(parent: &self.span, "Host closed input");
                    return Ok(LoopExit::Closed);
                }
            };

            let message = match decode_inbound(&body) {
                Ok(message) => message,
                Err(err) => {
                    tracing::warn!(
                        parent: &self.span,
                        error = %err,
                        body = %String::from_utf8_lossy(&body),
                        "Skipping undecodable request"
                    );
                    continue;
                }
            };
            if let Inbound::Resolve(request) = &message {
                tracing::debug!(parent: &self.span, qid = %request.qid, query = ?request.query, "Got request");
            }

            if let Some(reply) = self.dispatcher.handle(message) {
                if let Outbound::Results(response) = &reply {
                    tracing::debug!(
                        parent: &self.span,
                        qid = %response.qid,
                        results = response.results.len(),
                        "Sending response"
                    );
                }
                self.writer.send(&reply)?;
            }
        }
    }

    pub fn into_writer(self) -> FrameWriter<W> {
        self.writer
    }
}
