//! Wire protocol: command set and framing codec.
//!
//! [`commands`] holds the command bytes and the literal acknowledgement
//! frames; [`frame`] builds, parses, and reads the framed packets that carry
//! them.

pub mod commands;
pub mod frame;

pub use frame::{checksum, encode, expect_ack, read_frame, Frame, ProtocolError};
