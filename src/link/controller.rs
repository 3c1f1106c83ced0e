//! Link controller: outbound sends and the inbound byte pump.
//!
//! Sends are fire-and-forget: success means the bytes reached the
//! transport, not that the MCU acted on them.  Correctness of a feed is
//! confirmed later, if at all, by an inbound ack frame.

use log::{debug, warn};

use crate::app::ports::FrameHandler;
use crate::error::LinkError;

use super::codec::{FrameParser, ParseEvent, encode_frame};
use super::transport::Transport;

/// Bytes pulled from the transport per read call.
const READ_CHUNK: usize = 64;

/// Counters for link health diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub frames_sent: u32,
    pub frames_received: u32,
    pub frames_discarded: u32,
}

/// Owns the transport and the streaming parser.
pub struct LinkController<T: Transport> {
    transport: T,
    parser: FrameParser,
    stats: LinkStats,
}

impl<T: Transport> LinkController<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            parser: FrameParser::new(),
            stats: LinkStats::default(),
        }
    }

    /// Encode a frame and write it to the transport.
    pub fn send(
        &mut self,
        target: u8,
        source: u8,
        command: u8,
        payload: &[u8],
    ) -> Result<(), LinkError> {
        let bytes = encode_frame(target, source, command, payload)
            .ok_or(LinkError::PayloadTooLong(payload.len()))?;

        let written = self.transport.write(&bytes).map_err(|e| {
            warn!("link: transport write error {:?}", e);
            LinkError::Transport
        })?;
        if written != bytes.len() {
            return Err(LinkError::ShortWrite {
                written,
                expected: bytes.len(),
            });
        }
        self.transport.flush().map_err(|e| {
            warn!("link: transport flush error {:?}", e);
            LinkError::Transport
        })?;

        self.stats.frames_sent = self.stats.frames_sent.wrapping_add(1);
        debug!("link: sent {:02X?}", bytes.as_slice());
        Ok(())
    }

    /// Drain every byte currently available, routing decoded frames to
    /// `handler`.  Returns the number of frames delivered.
    pub fn pump(&mut self, handler: &mut dyn FrameHandler) -> usize {
        let mut buf = [0u8; READ_CHUNK];
        let mut delivered = 0;

        loop {
            let n = match self.transport.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("link: transport read error {:?}", e);
                    break;
                }
            };

            for &byte in &buf[..n] {
                match self.parser.push(byte) {
                    Some(ParseEvent::Frame(frame)) => {
                        self.stats.frames_received = self.stats.frames_received.wrapping_add(1);
                        handler.on_frame(&frame);
                        delivered += 1;
                    }
                    Some(ParseEvent::Discard(_)) => {
                        self.stats.frames_discarded = self.stats.frames_discarded.wrapping_add(1);
                    }
                    None => {}
                }
            }
        }

        delivered
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
