//! Error types shared by every driver operation.

use thiserror::Error;

use crate::protocol::ProtocolError;

/// Convenience alias for results produced by driver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the keyboard, mouse, and configuration channels.
#[derive(Debug, Error)]
pub enum Error {
    /// The key name has no entry in the HID key table.
    #[error("invalid key: {name:?}")]
    InvalidKey { name: String },

    /// The modifier name has no entry in the modifier table.
    #[error("invalid modifier: {name:?}")]
    InvalidModifier { name: String },

    /// More simultaneous keys or modifiers than one report can carry.
    #[error("too many {kind}: {supplied} requested, at most {max} fit in one report")]
    TooManyKeys {
        kind: &'static str,
        supplied: usize,
        max: usize,
    },

    /// Wheel delta outside the signed-byte range of the wire format.
    #[error("wheel delta {delta} outside the representable range [-127, 127]")]
    WheelOutOfRange { delta: i32 },

    /// Absolute coordinates cannot be scaled against zero screen bounds.
    #[error("screen bounds must be non-zero, got {width}x{height}")]
    InvalidBounds { width: u32, height: u32 },

    /// USB string descriptors are limited to 23 bytes on the chip.
    #[error("descriptor text is {len} bytes, the chip stores at most {max}")]
    DescriptorTooLong { len: usize, max: usize },

    /// The chip answered with a malformed or unexpected frame.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The underlying transport failed.
    #[error("transport I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
