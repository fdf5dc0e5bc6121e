//! Driver for the CH9329 serial-attached USB HID emulation chip.
//!
//! The chip hangs off a UART on one side and presents a USB keyboard and
//! mouse to a target machine on the other. Frames written to the serial
//! side are replayed into the target as HID input, which makes the chip a
//! building block for KVM-over-IP rigs, test benches, and BIOS-level
//! automation where software injection on the target is not an option.
//!
//! This crate implements the serial side: the framing codec with its
//! trailing modulo-256 checksum, the HID key and modifier tables, keyboard
//! and mouse report channels with human-like timing jitter, and the
//! read-modify-write configuration flow for VID/PID and USB string
//! descriptors.
//!
//! Opening the port stays with the embedding application. Anything
//! `io::Read + io::Write` acts as the [`transport::Transport`], so a
//! `serialport` handle plugs in directly.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//!
//! use ch9329_core::device::Keyboard;
//! use ch9329_core::transport::MockTransport;
//!
//! let mut port = MockTransport::new();
//! let mut keyboard = Keyboard::new(&mut port);
//! keyboard.write("hi", Duration::ZERO, Duration::ZERO)?;
//!
//! // One press and one release report per character.
//! assert_eq!(port.written.len(), 4);
//! # Ok::<(), ch9329_core::Error>(())
//! ```

pub mod device;
pub mod error;
pub mod keymap;
pub mod protocol;
pub mod transport;

pub use device::{
    ChipInfo, DeviceConfig, DeviceParameters, Keyboard, Mouse, MouseButton, StringDescriptor,
};
pub use error::{Error, Result};
pub use keymap::{lookup_key, lookup_modifier, KeyEntry};
pub use protocol::{Frame, ProtocolError};
pub use transport::{MockTransport, Transport};
