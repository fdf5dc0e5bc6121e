//! Device channels: keyboard, mouse, and configuration.
//!
//! Each channel borrows the transport mutably for as long as it is held, so
//! two channels can never interleave frames on the wire. Every operation is
//! synchronous: it returns once its frames are written and, where the
//! command has a reply, once that reply is validated.

use std::time::Duration;

use rand::Rng;

pub mod config;
pub mod keyboard;
pub mod mouse;

pub use config::{ChipInfo, DeviceConfig, DeviceParameters, StringDescriptor};
pub use keyboard::Keyboard;
pub use mouse::{Mouse, MouseButton};

/// Draws a uniform duration from `[lo, hi]`.
///
/// A degenerate interval (`hi <= lo`) yields `lo`, which keeps zero-jitter
/// typing deterministic.
pub(crate) fn jitter(lo: Duration, hi: Duration) -> Duration {
    if hi <= lo {
        return lo;
    }
    rand::rng().random_range(lo..=hi)
}
