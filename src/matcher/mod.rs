//! Pattern matching for Ethereum addresses.
//!
//! A pattern constrains the start of the address (after `0x`), its end, or
//! both. Input is validated and lowercased once; matching is
//! case-insensitive.

mod pattern;

pub use pattern::{Component, Pattern, PatternError, ABSENT_TOKEN, MAX_COMPONENT_LEN};
