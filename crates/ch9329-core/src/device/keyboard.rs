//! Keyboard channel: general key reports and jittered text typing.
//!
//! A report carries one modifier byte, one reserved byte, and six key slots:
//!
//! ```text
//! [modifiers, 0x00, key1, key2, key3, key4, key5, key6]
//! ```
//!
//! The chip holds whatever the last report said, so a keypress is two
//! frames: one with the key down and one all-zero release. Typing inserts a
//! randomized pause between the two and between characters, because some
//! BIOS and bootloader prompts drop input that arrives faster than a human
//! could produce it.

use std::thread;
use std::time::Duration;

use tracing::trace;

use crate::device::jitter;
use crate::error::{Error, Result};
use crate::keymap;
use crate::protocol::commands::{CMD_SEND_KB_GENERAL_DATA, DEFAULT_ADDRESS};
use crate::protocol::frame;
use crate::transport::Transport;

/// Slots for simultaneous non-modifier keys in one report.
pub const MAX_KEYS: usize = 6;
/// Distinct modifier names one report can carry.
pub const MAX_MODIFIERS: usize = 8;
/// Payload size of a general keyboard report.
pub const REPORT_LEN: usize = 8;

/// Keyboard channel over a borrowed transport.
pub struct Keyboard<'t, T: ?Sized> {
    transport: &'t mut T,
}

impl<'t, T: Transport + ?Sized> Keyboard<'t, T> {
    /// Creates a keyboard channel over `transport`.
    pub fn new(transport: &'t mut T) -> Self {
        Self { transport }
    }

    /// Sends one report holding `keys` pressed together with `modifiers`.
    ///
    /// Empty key names are ignored and duplicates collapse before the slot
    /// count is checked. Everything is validated before any bytes go out,
    /// so a failed call leaves the chip's key state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManyKeys`] when more than six distinct keys or
    /// eight distinct modifiers remain after deduplication,
    /// [`Error::InvalidKey`] or [`Error::InvalidModifier`] for unknown
    /// names, and [`Error::Io`] when the transport fails.
    pub fn send(&mut self, keys: &[&str], modifiers: &[&str]) -> Result<()> {
        let keys = dedup(keys.iter().copied().filter(|name| !name.is_empty()));
        let modifiers = dedup(modifiers.iter().copied());
        if keys.len() > MAX_KEYS {
            return Err(Error::TooManyKeys {
                kind: "keys",
                supplied: keys.len(),
                max: MAX_KEYS,
            });
        }
        if modifiers.len() > MAX_MODIFIERS {
            return Err(Error::TooManyKeys {
                kind: "modifiers",
                supplied: modifiers.len(),
                max: MAX_MODIFIERS,
            });
        }
        let mut modifier_byte = 0u8;
        for name in &modifiers {
            modifier_byte |= keymap::lookup_modifier(name)?;
        }
        self.send_report(modifier_byte, &keys)
    }

    /// Presses `key` together with `modifiers` and leaves it held.
    ///
    /// When the key's table entry demands shift ("A", "!"), the shift
    /// modifier is added implicitly.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Keyboard::send`].
    pub fn press(&mut self, key: &str, modifiers: &[&str]) -> Result<()> {
        let entry = keymap::lookup_key(key)?;
        if entry.requires_shift {
            let mut with_shift = modifiers.to_vec();
            with_shift.push("shift");
            self.send(&[key], &with_shift)
        } else {
            self.send(&[key], modifiers)
        }
    }

    /// Sends the all-zero report, releasing every key and modifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the transport fails.
    pub fn release(&mut self) -> Result<()> {
        self.send_report(0x00, &[])
    }

    /// Presses and releases `key`, holding it for a uniform random duration
    /// drawn from `[min_interval, max_interval]`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Keyboard::send`]. A transport failure on the
    /// press skips the release, so the caller may need to send one.
    pub fn press_and_release(
        &mut self,
        key: &str,
        modifiers: &[&str],
        min_interval: Duration,
        max_interval: Duration,
    ) -> Result<()> {
        self.press(key, modifiers)?;
        thread::sleep(jitter(min_interval, max_interval));
        self.release()
    }

    /// Types `text` one character at a time.
    ///
    /// Each character is pressed and released with a jittered hold, then
    /// followed by another jittered pause before the next one. The first
    /// unmapped character or transport failure stops the run, leaving the
    /// rest untyped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] for a character outside the table and
    /// [`Error::Io`] when the transport fails.
    pub fn write(
        &mut self,
        text: &str,
        min_interval: Duration,
        max_interval: Duration,
    ) -> Result<()> {
        for ch in text.chars() {
            let mut buf = [0u8; 4];
            let name = ch.encode_utf8(&mut buf);
            self.press_and_release(name, &[], min_interval, max_interval)?;
            thread::sleep(jitter(min_interval, max_interval));
        }
        Ok(())
    }

    fn send_report(&mut self, modifier_byte: u8, keys: &[&str]) -> Result<()> {
        debug_assert!(keys.len() <= MAX_KEYS);
        let mut payload = [0u8; REPORT_LEN];
        payload[0] = modifier_byte;
        for (slot, name) in keys.iter().enumerate() {
            payload[2 + slot] = keymap::lookup_key(name)?.code;
        }
        let packet = frame::encode(DEFAULT_ADDRESS, CMD_SEND_KB_GENERAL_DATA, &payload);
        trace!("keyboard TX {:02X?}", packet);
        self.transport.write(&packet)?;
        Ok(())
    }
}

/// Keeps the first occurrence of each name, preserving order.
fn dedup<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut unique: Vec<&str> = Vec::new();
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

// ── Tests ──────────────────────────────────────────────────────────────────
