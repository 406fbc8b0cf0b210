//! KNX group addresses
//!
//! A group address is a 16-bit value. Configuration lines may write it as
//! `main/middle/sub` (5/3/8 bits), `main/sub` (5/11 bits) or as the raw integer.
//! The canonical textual form is always the 3-level one.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::BindingError;

/// Largest main group (5 bits)
const MAX_MAIN: u16 = 0x1F;
/// Largest middle group in 3-level notation (3 bits)
const MAX_MIDDLE: u16 = 0x07;
/// Largest sub group in 3-level notation (8 bits)
const MAX_SUB_3LEVEL: u16 = 0xFF;
/// Largest sub group in 2-level notation (11 bits)
const MAX_SUB_2LEVEL: u16 = 0x07FF;

/// KNX group address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupAddress(u16);

impl GroupAddress {
    /// Build a 3-level address, returning `None` when a component is out of range
    pub fn new(main: u16, middle: u16, sub: u16) -> Option<Self> {
        if main > MAX_MAIN || middle > MAX_MIDDLE || sub > MAX_SUB_3LEVEL {
            return None;
        }
        Some(Self((main << 11) | (middle << 8) | sub))
    }

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u16 {
        self.0
    }

    pub const fn main_group(&self) -> u16 {
        (self.0 >> 11) & MAX_MAIN
    }

    pub const fn middle_group(&self) -> u16 {
        (self.0 >> 8) & MAX_MIDDLE
    }

    pub const fn sub_group(&self) -> u16 {
        self.0 & MAX_SUB_3LEVEL
    }
}

/// Parse one numeric address component; only plain ASCII digits are accepted
fn parse_component(part: &str, max: u16) -> Option<u16> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = part.parse().ok()?;
    if value > u32::from(max) {
        return None;
    }
    u16::try_from(value).ok()
}

impl FromStr for GroupAddress {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let parts: Vec<&str> = text.split('/').collect();

        let parsed = match parts.as_slice() {
            [main, middle, sub] => {
                match (
                    parse_component(main, MAX_MAIN),
                    parse_component(middle, MAX_MIDDLE),
                    parse_component(sub, MAX_SUB_3LEVEL),
                ) {
                    (Some(main), Some(middle), Some(sub)) => {
                        Some(Self((main << 11) | (middle << 8) | sub))
                    },
                    _ => None,
                }
            },
            [main, sub] => match (
                parse_component(main, MAX_MAIN),
                parse_component(sub, MAX_SUB_2LEVEL),
            ) {
                (Some(main), Some(sub)) => Some(Self((main << 11) | sub)),
                _ => None,
            },
            [raw] => parse_component(raw, u16::MAX).map(Self),
            _ => None,
        };

        parsed.ok_or_else(|| BindingError::syntax(format!("Invalid group address '{}'", text)))
    }
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.main_group(),
            self.middle_group(),
            self.sub_group()
        )
    }
}

impl Serialize for GroupAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GroupAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
