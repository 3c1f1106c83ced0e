//! Serial link to the motor-controller MCU.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Link Stack                           │
//! │                                                             │
//! │  ┌───────────┐   ┌──────────────┐   ┌────────────────────┐  │
//! │  │ Transport │──▶│ FrameParser  │──▶│  FrameHandler      │  │
//! │  │ (UART rx) │   │ (codec)      │   │  → FeederController│  │
//! │  └───────────┘   └──────────────┘   └────────────────────┘  │
//! │                                                             │
//! │  ┌───────────┐   ┌──────────────┐                           │
//! │  │ Transport │◀──│ encode_frame │◀── LinkController::send   │
//! │  │ (UART tx) │   │ (codec)      │                           │
//! │  └───────────┘   └──────────────┘                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod controller;
pub mod frame;
pub mod transport;
