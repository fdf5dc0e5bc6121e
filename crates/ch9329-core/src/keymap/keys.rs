//! HID usage table for keys.
//!
//! Names follow what a user would type: single characters map to themselves
//! ("a", "A", "?") and special keys get lowercase names ("enter", "f5",
//! "arrow_up"). Shifted characters share the usage code of their unshifted
//! key and are marked as requiring shift, which the keyboard channel turns
//! into an implicit shift modifier.

use crate::error::{Error, Result};

/// One entry of the HID key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry {
    /// HID usage code sent in one of the report's six key slots.
    pub code: u8,
    /// Whether the key demands shift to be held ("A", "!", "{").
    pub requires_shift: bool,
}

/// Maps a key name to its table entry.
///
/// # Errors
///
/// Returns [`Error::InvalidKey`] carrying the name when it is unknown.
///
/// # Examples
///
/// ```rust
/// use ch9329_core::keymap::lookup_key;
///
/// assert_eq!(lookup_key("a").unwrap().code, 0x04);
/// assert!(lookup_key("A").unwrap().requires_shift);
/// assert!(lookup_key("kanji").is_err());
/// ```
pub fn lookup_key(name: &str) -> Result<KeyEntry> {
    key_entry(name).ok_or_else(|| Error::InvalidKey {
        name: name.to_string(),
    })
}

fn key_entry(name: &str) -> Option<KeyEntry> {
    let (code, requires_shift) = match name {
        // Letters
        "a" => (0x04, false),
        "b" => (0x05, false),
        "c" => (0x06, false),
        "d" => (0x07, false),
        "e" => (0x08, false),
        "f" => (0x09, false),
        "g" => (0x0A, false),
        "h" => (0x0B, false),
        "i" => (0x0C, false),
        "j" => (0x0D, false),
        "k" => (0x0E, false),
        "l" => (0x0F, false),
        "m" => (0x10, false),
        "n" => (0x11, false),
        "o" => (0x12, false),
        "p" => (0x13, false),
        "q" => (0x14, false),
        "r" => (0x15, false),
        "s" => (0x16, false),
        "t" => (0x17, false),
        "u" => (0x18, false),
        "v" => (0x19, false),
        "w" => (0x1A, false),
        "x" => (0x1B, false),
        "y" => (0x1C, false),
        "z" => (0x1D, false),
        "A" => (0x04, true),
        "B" => (0x05, true),
        "C" => (0x06, true),
        "D" => (0x07, true),
        "E" => (0x08, true),
        "F" => (0x09, true),
        "G" => (0x0A, true),
        "H" => (0x0B, true),
        "I" => (0x0C, true),
        "J" => (0x0D, true),
        "K" => (0x0E, true),
        "L" => (0x0F, true),
        "M" => (0x10, true),
        "N" => (0x11, true),
        "O" => (0x12, true),
        "P" => (0x13, true),
        "Q" => (0x14, true),
        "R" => (0x15, true),
        "S" => (0x16, true),
        "T" => (0x17, true),
        "U" => (0x18, true),
        "V" => (0x19, true),
        "W" => (0x1A, true),
        "X" => (0x1B, true),
        "Y" => (0x1C, true),
        "Z" => (0x1D, true),

        // Digit row
        "1" => (0x1E, false),
        "2" => (0x1F, false),
        "3" => (0x20, false),
        "4" => (0x21, false),
        "5" => (0x22, false),
        "6" => (0x23, false),
        "7" => (0x24, false),
        "8" => (0x25, false),
        "9" => (0x26, false),
        "0" => (0x27, false),
        "!" => (0x1E, true),
        "@" => (0x1F, true),
        "#" => (0x20, true),
        "$" => (0x21, true),
        "%" => (0x22, true),
        "^" => (0x23, true),
        "&" => (0x24, true),
        "*" => (0x25, true),
        "(" => (0x26, true),
        ")" => (0x27, true),

        // Whitespace, both as characters and by name
        "enter" | "\n" => (0x28, false),
        "esc" => (0x29, false),
        "backspace" => (0x2A, false),
        "tab" | "\t" => (0x2B, false),
        "space" | " " => (0x2C, false),

        // Punctuation
        "-" => (0x2D, false),
        "_" => (0x2D, true),
        "=" => (0x2E, false),
        "+" => (0x2E, true),
        "[" => (0x2F, false),
        "{" => (0x2F, true),
        "]" => (0x30, false),
        "}" => (0x30, true),
        "\\" => (0x31, false),
        "|" => (0x31, true),
        ";" => (0x33, false),
        ":" => (0x33, true),
        "'" => (0x34, false),
        "\"" => (0x34, true),
        "`" => (0x35, false),
        "~" => (0x35, true),
        "," => (0x36, false),
        "<" => (0x36, true),
        "." => (0x37, false),
        ">" => (0x37, true),
        "/" => (0x38, false),
        "?" => (0x38, true),

        // Function row
        "caps_lock" => (0x39, false),
        "f1" => (0x3A, false),
        "f2" => (0x3B, false),
        "f3" => (0x3C, false),
        "f4" => (0x3D, false),
        "f5" => (0x3E, false),
        "f6" => (0x3F, false),
        "f7" => (0x40, false),
        "f8" => (0x41, false),
        "f9" => (0x42, false),
        "f10" => (0x43, false),
        "f11" => (0x44, false),
        "f12" => (0x45, false),

        // Navigation cluster
        "print_screen" => (0x46, false),
        "scroll_lock" => (0x47, false),
        "pause" => (0x48, false),
        "insert" => (0x49, false),
        "home" => (0x4A, false),
        "page_up" => (0x4B, false),
        "delete" => (0x4C, false),
        "end" => (0x4D, false),
        "page_down" => (0x4E, false),
        "arrow_right" => (0x4F, false),
        "arrow_left" => (0x50, false),
        "arrow_down" => (0x51, false),
        "arrow_up" => (0x52, false),
        "num_lock" => (0x53, false),

        _ => return None,
    };
    Some(KeyEntry {
        code,
        requires_shift,
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────
