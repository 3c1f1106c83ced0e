//! Frame encoder and streaming frame parser.
//!
//! The parser accumulates incoming bytes one at a time and yields a
//! resolution whenever a candidate frame completes.  It never blocks:
//! "incomplete" is a valid resting state between polling ticks, so a
//! frame may arrive one byte per call across many ticks.
//!
//! ```text
//!            0x55                     len ≥ 6, [1] == 0xAA,
//!   ┌──────┐ ───▶ ┌──────────────┐    len == 7 + LEN
//!   │ Idle │      │ Accumulating │ ─────────────────────▶ Frame / Discard
//!   └──────┘ ◀─── └──────────────┘                         (back to Idle)
//!      ▲  other      │ [1] != 0xAA
//!      └─────────────┘ (discard, back to Idle)
//! ```

use log::debug;

use super::frame::{
    Frame, HEADER_1, HEADER_2, MAX_FRAME_LEN, MAX_PAYLOAD_LEN, PREFIX_LEN, Payload, checksum,
};

/// Encoded frame bytes, sized for the largest possible frame.
pub type FrameBuf = heapless::Vec<u8, MAX_FRAME_LEN>;

/// Build `[0x55, 0xAA, target, source, command, len] ++ payload ++ [checksum]`.
///
/// Returns `None` if `payload` exceeds the one-byte length field.
pub fn encode_frame(target: u8, source: u8, command: u8, payload: &[u8]) -> Option<FrameBuf> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return None;
    }

    let mut buf = FrameBuf::new();
    buf.extend_from_slice(&[
        HEADER_1,
        HEADER_2,
        target,
        source,
        command,
        payload.len() as u8,
    ])
    .ok()?;
    buf.extend_from_slice(payload).ok()?;
    let sum = checksum(&buf);
    buf.push(sum).ok()?;
    Some(buf)
}

/// Why a candidate frame was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Second header byte was not `0xAA`.
    BadHeader,
    /// Trailing checksum did not match the computed one.
    Checksum { expected: u8, received: u8 },
}

/// Resolution of a candidate frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    Frame(Frame),
    Discard(DiscardReason),
}

/// Parser state, derived from the accumulation buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Buffer empty, waiting for `0x55`.
    Idle,
    /// A candidate frame is being accumulated.
    Accumulating,
}

/// Streaming, re-entrant frame parser.
pub struct FrameParser {
    buffer: FrameBuf,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            buffer: FrameBuf::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        if self.buffer.is_empty() {
            ParserState::Idle
        } else {
            ParserState::Accumulating
        }
    }

    /// Bytes currently held for the candidate frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Consume one byte.  Returns a [`ParseEvent`] when a candidate frame
    /// resolves, `None` while idle or still accumulating.
    pub fn push(&mut self, byte: u8) -> Option<ParseEvent> {
        if self.buffer.is_empty() {
            if byte == HEADER_1 {
                // Cannot fail: the buffer is empty.
                let _ = self.buffer.push(byte);
            } else {
                debug!("link: ignoring invalid data ({:02X})", byte);
            }
            return None;
        }

        if self.buffer.push(byte).is_err() {
            // Unreachable while the length byte bounds growth; resync anyway.
            self.reset();
            return Some(ParseEvent::Discard(DiscardReason::BadHeader));
        }

        if self.buffer.len() < PREFIX_LEN {
            return None;
        }

        if self.buffer[1] != HEADER_2 {
            debug!("link: invalid MCU frame header, clearing");
            self.reset();
            return Some(ParseEvent::Discard(DiscardReason::BadHeader));
        }

        let length = self.buffer[5] as usize;
        let total = PREFIX_LEN + length + 1;
        if self.buffer.len() < total {
            return None; // Incomplete frame, keep accumulating.
        }

        let (body, tail) = self.buffer.split_at(total - 1);
        let expected = checksum(body);
        let received = tail[0];

        let event = if expected == received {
            let frame = Frame {
                target: body[2],
                source: body[3],
                command: body[4],
                payload: Payload::from_slice(&body[PREFIX_LEN..]).unwrap_or_default(),
            };
            debug!(
                "link: MCU frame target:{:02X} source:{:02X} command:{:02X} length:{:02X}",
                frame.target, frame.source, frame.command, length
            );
            ParseEvent::Frame(frame)
        } else {
            debug!(
                "link: invalid MCU frame checksum (expected {:02X}, got {:02X})",
                expected, received
            );
            ParseEvent::Discard(DiscardReason::Checksum { expected, received })
        };

        self.reset();
        Some(event)
    }

    /// Feed a slice, handing every resolution to `on_event` in order.
    pub fn feed(&mut self, data: &[u8], mut on_event: impl FnMut(ParseEvent)) {
        for &byte in data {
            if let Some(event) = self.push(byte) {
                on_event(event);
            }
        }
    }

    /// Drop any partially accumulated frame.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
