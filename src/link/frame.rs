//! Frame type and wire constants for the feeder MCU link.
//!
//! ```text
//! ┌──────┬──────┬────────┬────────┬─────────┬─────┬──────────────┬──────────┐
//! │ 0x55 │ 0xAA │ TARGET │ SOURCE │ COMMAND │ LEN │ DATA[0..LEN) │ CHECKSUM │
//! └──────┴──────┴────────┴────────┴─────────┴─────┴──────────────┴──────────┘
//! CHECKSUM = (sum of all 6 + LEN preceding bytes) & 0xFF
//! ```
//!
//! Example ack from the motor controller (one portion dispensed):
//! `55 AA 03 07 00 08 69 02 00 04 00 00 00 01 81`

/// First header byte.
pub const HEADER_1: u8 = 0x55;
/// Second header byte.
pub const HEADER_2: u8 = 0xAA;

/// Header + addressing + command + length byte.
pub const PREFIX_LEN: usize = 6;
/// Largest payload the one-byte length field can describe.
pub const MAX_PAYLOAD_LEN: usize = 255;
/// Largest complete frame on the wire.
pub const MAX_FRAME_LEN: usize = PREFIX_LEN + MAX_PAYLOAD_LEN + 1;

// ── Addresses ─────────────────────────────────────────────────

/// Our own address on the link (ack frames target this).
pub const ADDR_SELF: u8 = 0x03;
/// Motor-controller sub-address (ack frames originate here).
pub const ADDR_CONTROLLER: u8 = 0x07;
/// Broadcast / main-board address used for outbound commands.
pub const ADDR_MAIN: u8 = 0x00;
/// Source address used for motor commands.
pub const ADDR_MOTOR_SOURCE: u8 = 0x06;

// ── Commands ──────────────────────────────────────────────────

/// Status/light command when sent, ack when received from the controller.
pub const CMD_STATUS: u8 = 0x00;

/// Light status payload: network connected, steady light.
pub const LIGHT_STEADY: u8 = 0x03;
/// Light status payload: network lost, slow blink.
pub const LIGHT_SLOW_BLINK: u8 = 0x02;

/// Motor opcode prefix of the "spin motor" payload. The final byte
/// (index 7) carries the portion count.
pub const FEED_OPCODE: [u8; 7] = [0x65, 0x02, 0x00, 0x04, 0x00, 0x00, 0x00];

/// Index of the portions byte in both feed commands and acks.
pub const PORTIONS_INDEX: usize = 7;

/// Payload bytes of a single frame.
pub type Payload = heapless::Vec<u8, MAX_PAYLOAD_LEN>;

/// One checksum-validated unit of the serial protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub target: u8,
    pub source: u8,
    pub command: u8,
    pub payload: Payload,
}

impl Frame {
    /// Build a frame from a payload slice.  Returns `None` if the payload
    /// does not fit the one-byte length field.
    pub fn new(target: u8, source: u8, command: u8, payload: &[u8]) -> Option<Self> {
        let payload = Payload::from_slice(payload).ok()?;
        Some(Self {
            target,
            source,
            command,
            payload,
        })
    }

    /// Whether this is a portions acknowledgement from the motor controller.
    pub fn is_ack(&self) -> bool {
        self.target == ADDR_SELF && self.source == ADDR_CONTROLLER && self.command == CMD_STATUS
    }

    /// Portions byte of an ack or feed payload, if present.
    pub fn portions(&self) -> Option<u8> {
        self.payload.get(PORTIONS_INDEX).copied()
    }
}

/// Low byte of the arithmetic sum of `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Payload of the "spin motor" command for `portions`.
pub fn feed_payload(portions: u8) -> [u8; 8] {
    let mut payload = [0u8; 8];
    payload[..FEED_OPCODE.len()].copy_from_slice(&FEED_OPCODE);
    payload[PORTIONS_INDEX] = portions;
    payload
}
