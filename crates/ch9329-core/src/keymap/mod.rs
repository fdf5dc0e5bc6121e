//! Static HID key and modifier tables.
//!
//! Lookups are plain match statements over `&str` names, so they cost
//! nothing to construct and nothing to share. Unknown names come back as
//! typed errors carrying the offending string.

pub mod keys;
pub mod modifiers;

pub use keys::{lookup_key, KeyEntry};
pub use modifiers::{lookup_modifier, MODIFIER_NAMES};
