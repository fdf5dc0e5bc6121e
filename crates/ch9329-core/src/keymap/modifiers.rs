//! Modifier-key bits for the first byte of a keyboard report.
//!
//! The layout follows the HID boot keyboard report: the low nibble holds the
//! left-hand modifiers, the high nibble their right-hand twins. Bare names
//! ("ctrl") alias the left-hand bit.

use crate::error::{Error, Result};

/// Modifier bits as carried in the report's first byte.
pub mod bits {
    /// Left control.
    pub const CTRL: u8 = 0b0000_0001;
    /// Left shift.
    pub const SHIFT: u8 = 0b0000_0010;
    /// Left alt.
    pub const ALT: u8 = 0b0000_0100;
    /// Left win (GUI).
    pub const WIN: u8 = 0b0000_1000;
    /// Right control.
    pub const CTRL_RIGHT: u8 = 0b0001_0000;
    /// Right shift.
    pub const SHIFT_RIGHT: u8 = 0b0010_0000;
    /// Right alt.
    pub const ALT_RIGHT: u8 = 0b0100_0000;
    /// Right win (GUI).
    pub const WIN_RIGHT: u8 = 0b1000_0000;
}

/// Every recognized modifier name.
pub const MODIFIER_NAMES: &[&str] = &[
    "ctrl",
    "ctrl_left",
    "ctrl_right",
    "shift",
    "shift_left",
    "shift_right",
    "alt",
    "alt_left",
    "alt_right",
    "win",
    "win_left",
    "win_right",
];

/// Maps a modifier name to its bit in the report's modifier byte.
///
/// # Errors
///
/// Returns [`Error::InvalidModifier`] carrying the name when it is unknown.
///
/// # Examples
///
/// ```rust
/// use ch9329_core::keymap::lookup_modifier;
///
/// assert_eq!(lookup_modifier("ctrl").unwrap(), 0x01);
/// assert_eq!(lookup_modifier("shift_right").unwrap(), 0x20);
/// assert!(lookup_modifier("meta").is_err());
/// ```
pub fn lookup_modifier(name: &str) -> Result<u8> {
    let bit = match name {
        "ctrl" | "ctrl_left" => bits::CTRL,
        "shift" | "shift_left" => bits::SHIFT,
        "alt" | "alt_left" => bits::ALT,
        "win" | "win_left" => bits::WIN,
        "ctrl_right" => bits::CTRL_RIGHT,
        "shift_right" => bits::SHIFT_RIGHT,
        "alt_right" => bits::ALT_RIGHT,
        "win_right" => bits::WIN_RIGHT,
        _ => {
            return Err(Error::InvalidModifier {
                name: name.to_string(),
            })
        }
    };
    Ok(bit)
}

// ── Tests ──────────────────────────────────────────────────────────────────
