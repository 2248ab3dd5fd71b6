//! Prefix/suffix pattern parsing and matching.

use std::fmt;

use crate::crypto::{Address, ADDRESS_HEX_LEN};

/// Longest accepted prefix or suffix, in hex characters.
///
/// Expected work grows as 16^n; past six characters per component an
/// interactive request would wait far too long.
pub const MAX_COMPONENT_LEN: usize = 6;

/// Literal token meaning "no constraint on this component".
pub const ABSENT_TOKEN: &str = "-";

/// Which side of the address a pattern component constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Prefix,
    Suffix,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Prefix => write!(f, "prefix"),
            Component::Suffix => write!(f, "suffix"),
        }
    }
}

/// Rejections produced while validating a pattern request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("{component} must contain only hex characters (0-9, a-f), got {value:?}")]
    InvalidCharacter { component: Component, value: String },

    #[error("{component} is too long ({len} characters, max {max})")]
    TooLong {
        component: Component,
        len: usize,
        max: usize,
    },

    #[error("at least one of prefix or suffix is required")]
    Empty,
}

/// A validated, lowercase prefix/suffix search target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    prefix: String,
    suffix: String,
    prefix_nibbles: Vec<u8>,
    suffix_nibbles: Vec<u8>,
}

impl Pattern {
    /// Validates raw user text into a pattern.
    ///
    /// Empty input or [`ABSENT_TOKEN`] leaves a component unconstrained.
    /// Character checks run on both components before length checks.
    pub fn parse(raw_prefix: &str, raw_suffix: &str) -> Result<Self, PatternError> {
        let prefix = present(raw_prefix);
        let suffix = present(raw_suffix);

        check_hex(prefix, Component::Prefix)?;
        check_hex(suffix, Component::Suffix)?;

        let prefix = prefix.to_ascii_lowercase();
        let suffix = suffix.to_ascii_lowercase();

        check_len(&prefix, Component::Prefix)?;
        check_len(&suffix, Component::Suffix)?;

        Ok(Self {
            prefix_nibbles: to_nibbles(&prefix),
            suffix_nibbles: to_nibbles(&suffix),
            prefix,
            suffix,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// True when neither component constrains the address.
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }

    /// Tests a `0x`-prefixed address string. Case-insensitive.
    pub fn matches(&self, address: &str) -> bool {
        let address = address.to_ascii_lowercase();

        let prefix_ok = self.prefix.is_empty()
            || address
                .strip_prefix("0x")
                .is_some_and(|body| body.starts_with(&self.prefix));
        let suffix_ok = self.suffix.is_empty() || address.ends_with(&self.suffix);

        prefix_ok && suffix_ok
    }

    /// Same predicate as [`Pattern::matches`], evaluated on the raw address
    /// nibbles without building a string.
    #[inline]
    pub fn matches_address(&self, address: &Address) -> bool {
        let prefix_ok = self
            .prefix_nibbles
            .iter()
            .enumerate()
            .all(|(i, &n)| address.nibble(i) == n);
        if !prefix_ok {
            return false;
        }

        let offset = ADDRESS_HEX_LEN - self.suffix_nibbles.len();
        self.suffix_nibbles
            .iter()
            .enumerate()
            .all(|(i, &n)| address.nibble(offset + i) == n)
    }

    /// Expected number of attempts: 16^n over all constrained characters.
    pub fn estimated_difficulty(&self) -> u64 {
        let total_len = self.prefix.len() + self.suffix.len();
        16u64.saturating_pow(total_len as u32)
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> &'static str {
        match self.estimated_difficulty() {
            0..=1_000 => "Very Easy (< 1 second)",
            1_001..=100_000 => "Easy (seconds)",
            100_001..=10_000_000 => "Medium (minutes)",
            10_000_001..=1_000_000_000 => "Hard (hours)",
            _ => "Very Hard (days or more)",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}...{}", self.prefix, self.suffix)
    }
}

fn present(raw: &str) -> &str {
    let raw = raw.trim();
    if raw == ABSENT_TOKEN {
        ""
    } else {
        raw
    }
}

fn check_hex(value: &str, component: Component) -> Result<(), PatternError> {
    if value.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(PatternError::InvalidCharacter {
            component,
            value: value.to_string(),
        })
    }
}

fn check_len(value: &str, component: Component) -> Result<(), PatternError> {
    if value.len() > MAX_COMPONENT_LEN {
        return Err(PatternError::TooLong {
            component,
            len: value.len(),
            max: MAX_COMPONENT_LEN,
        });
    }
    Ok(())
}

fn to_nibbles(hex_str: &str) -> Vec<u8> {
    hex_str
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect()
}
