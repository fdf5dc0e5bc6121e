//! Framing codec for the chip's serial protocol.
//!
//! Every packet, outbound or inbound, uses the same layout:
//!
//! ```text
//! +------+------+---------+---------+--------+-----------+----------+
//! | 0x57 | 0xAB | address | command | length | payload   | checksum |
//! +------+------+---------+---------+--------+-----------+----------+
//!   head (2)       1 byte   1 byte    1 byte   len bytes    1 byte
//! ```
//!
//! The length byte counts the payload only. The trailing checksum is the sum
//! of every preceding byte modulo 256 and is carried on every frame. Replies
//! echo the request's command byte with the reply flag (0x80) set.

use thiserror::Error;

use crate::protocol::commands::{FRAME_HEAD, REPLY_FLAG};
use crate::transport::Transport;

/// Bytes before the payload: head (2), address, command, and length.
pub const HEADER_LEN: usize = 5;

/// Offset of the length byte within a frame.
pub const LENGTH_OFFSET: usize = 4;

/// Total frame size for a payload of `payload_len` bytes.
pub const fn frame_len(payload_len: usize) -> usize {
    HEADER_LEN + payload_len + 1
}

/// Errors produced while building or validating frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The response ended before a complete frame was received.
    #[error("insufficient data: need {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The response does not start with the 0x57 0xAB frame head.
    #[error("invalid frame head: {found:02X?}")]
    InvalidHead { found: [u8; 2] },

    /// The trailing checksum does not match the frame contents.
    #[error("checksum mismatch: frame carries 0x{carried:02X}, computed 0x{computed:02X}")]
    ChecksumMismatch { carried: u8, computed: u8 },

    /// The reply echoes a different command than the request sent.
    #[error("unexpected reply command: expected 0x{expected:02X}, got 0x{received:02X}")]
    UnexpectedReply { expected: u8, received: u8 },

    /// An acknowledgement differs from the literal success frame.
    #[error("unexpected acknowledgement: expected {expected:02X?}, got {received:02X?}")]
    UnexpectedAck {
        expected: Vec<u8>,
        received: Vec<u8>,
    },
}

/// Sums `bytes` modulo 256, the value every frame carries as its last byte.
///
/// # Examples
///
/// ```rust
/// use ch9329_core::protocol::checksum;
///
/// assert_eq!(checksum(&[0x57, 0xAB, 0x00, 0x01, 0x00]), 0x03);
/// ```
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

/// Builds a complete frame around `payload`.
///
/// The length byte is derived from the payload, so the declared length always
/// matches the bytes carried, and the trailing checksum covers everything
/// before it.
///
/// # Examples
///
/// ```rust
/// use ch9329_core::protocol::commands::{CMD_GET_INFO, DEFAULT_ADDRESS};
/// use ch9329_core::protocol::encode;
///
/// let frame = encode(DEFAULT_ADDRESS, CMD_GET_INFO, &[]);
/// assert_eq!(frame, [0x57, 0xAB, 0x00, 0x01, 0x00, 0x03]);
/// ```
pub fn encode(address: u8, command: u8, payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= u8::MAX as usize);
    let mut frame = Vec::with_capacity(frame_len(payload.len()));
    frame.extend_from_slice(&FRAME_HEAD);
    frame.push(address);
    frame.push(command);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);
    frame.push(checksum(&frame));
    frame
}

/// A validated inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Chip address echoed in the reply.
    pub address: u8,
    /// Command byte. Replies carry the request command with the reply flag
    /// set.
    pub command: u8,
    /// Command-specific payload.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Parses and validates one frame from the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InsufficientData`] if `bytes` is shorter than
    /// the frame's declared size, [`ProtocolError::InvalidHead`] if it does
    /// not start with 0x57 0xAB, and [`ProtocolError::ChecksumMismatch`] if
    /// the trailing byte does not re-sum.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < frame_len(0) {
            return Err(ProtocolError::InsufficientData {
                needed: frame_len(0),
                available: bytes.len(),
            });
        }
        if bytes[..2] != FRAME_HEAD {
            return Err(ProtocolError::InvalidHead {
                found: [bytes[0], bytes[1]],
            });
        }
        let payload_len = bytes[LENGTH_OFFSET] as usize;
        let total = frame_len(payload_len);
        if bytes.len() < total {
            return Err(ProtocolError::InsufficientData {
                needed: total,
                available: bytes.len(),
            });
        }
        let carried = bytes[total - 1];
        let computed = checksum(&bytes[..total - 1]);
        if carried != computed {
            return Err(ProtocolError::ChecksumMismatch { carried, computed });
        }
        Ok(Self {
            address: bytes[2],
            command: bytes[3],
            payload: bytes[HEADER_LEN..HEADER_LEN + payload_len].to_vec(),
        })
    }

    /// Checks that this frame answers `command`, meaning it echoes the
    /// command byte with the reply flag set.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnexpectedReply`] on any other command byte.
    pub fn expect_reply_to(&self, command: u8) -> Result<(), ProtocolError> {
        let expected = command | REPLY_FLAG;
        if self.command != expected {
            return Err(ProtocolError::UnexpectedReply {
                expected,
                received: self.command,
            });
        }
        Ok(())
    }
}

/// Compares a received acknowledgement against the literal expected frame.
///
/// The chip answers configuration writes with a fixed 7-byte frame. Any
/// deviation is reported byte for byte; nothing is retried.
///
/// # Errors
///
/// Returns [`ProtocolError::UnexpectedAck`] carrying both frames when they
/// differ.
pub fn expect_ack(received: &[u8], expected: &[u8]) -> Result<(), ProtocolError> {
    if received != expected {
        return Err(ProtocolError::UnexpectedAck {
            expected: expected.to_vec(),
            received: received.to_vec(),
        });
    }
    Ok(())
}

/// Reads one complete frame from `transport`.
///
/// The five header bytes are read first so the declared length says how much
/// more to expect. A timeout or end of stream before the frame completes is
/// reported as [`ProtocolError::InsufficientData`] with the byte counts.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidHead`] when the stream does not start
/// with the frame head, [`ProtocolError::InsufficientData`] when the chip
/// goes silent mid-frame, and [`crate::Error::Io`] for transport failures
/// other than a timeout.
pub fn read_frame<T: Transport + ?Sized>(transport: &mut T) -> crate::Result<Vec<u8>> {
    let mut frame = vec![0u8; HEADER_LEN];
    let filled = read_into(transport, &mut frame, 0)?;
    if filled < HEADER_LEN {
        return Err(ProtocolError::InsufficientData {
            needed: frame_len(0),
            available: filled,
        }
        .into());
    }
    if frame[..2] != FRAME_HEAD {
        return Err(ProtocolError::InvalidHead {
            found: [frame[0], frame[1]],
        }
        .into());
    }
    let total = frame_len(frame[LENGTH_OFFSET] as usize);
    frame.resize(total, 0);
    let filled = read_into(transport, &mut frame, HEADER_LEN)?;
    if filled < total {
        return Err(ProtocolError::InsufficientData {
            needed: total,
            available: filled,
        }
        .into());
    }
    Ok(frame)
}

/// Fills `buffer[filled..]` from the transport, retrying interrupted reads
/// and stopping early when the stream ends or a read times out. Returns how
/// far the buffer got.
fn read_into<T: Transport + ?Sized>(
    transport: &mut T,
    buffer: &mut [u8],
    mut filled: usize,
) -> crate::Result<usize> {
    use std::io::ErrorKind;

    while filled < buffer.len() {
        match transport.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

// ── Tests ──────────────────────────────────────────────────────────────────
