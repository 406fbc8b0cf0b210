//! Parsed binding model
//!
//! ```text
//! ItemBinding            one configuration line
//!   └─ BindingGroup      one comma-separated segment (one logical datapoint)
//!        └─ EndpointBinding   one group address with DPT, role and flags
//! ```
//!
//! All types are immutable once built. Groups are assembled through
//! [`GroupBuilder`], which validates the clause records when the segment ends.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::address::GroupAddress;
use crate::error::{BindingError, Result};

/// Suffix marking a group address for start-stop dimming
pub const START_STOP_MARKER_SUFFIX: &str = "ss";

// ============================================================================
// Endpoint
// ============================================================================

/// Role of a group address within its datapoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    /// Outgoing values are written here
    Command,
    /// Only observed
    State,
}

impl EndpointRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointRole::Command => "command",
            EndpointRole::State => "state",
        }
    }
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One group address of a datapoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointBinding {
    pub address: GroupAddress,
    /// DPT id used to encode/decode values at this address
    pub type_id: String,
    pub role: EndpointRole,
    /// Start-stop dimming instead of absolute values
    pub alt_behavior: bool,
}

impl EndpointBinding {
    pub fn is_command(&self) -> bool {
        self.role == EndpointRole::Command
    }
}

// ============================================================================
// Auto refresh
// ============================================================================

/// Periodic read setting of a readable datapoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutoRefresh {
    /// Event driven only, no periodic read requests
    #[default]
    Disabled,
    /// Read every N seconds
    Interval(NonZeroU32),
}

impl AutoRefresh {
    /// Build from seconds, 0 meaning disabled
    pub fn from_secs(secs: u32) -> Self {
        NonZeroU32::new(secs).map_or(AutoRefresh::Disabled, AutoRefresh::Interval)
    }

    /// Interval in seconds, 0 when disabled
    pub fn as_secs(&self) -> u32 {
        match self {
            AutoRefresh::Disabled => 0,
            AutoRefresh::Interval(secs) => secs.get(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, AutoRefresh::Interval(_))
    }

    pub fn interval(&self) -> Option<Duration> {
        match self {
            AutoRefresh::Disabled => None,
            AutoRefresh::Interval(secs) => Some(Duration::from_secs(u64::from(secs.get()))),
        }
    }
}

impl Serialize for AutoRefresh {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.as_secs())
    }
}

// ============================================================================
// Group
// ============================================================================

/// Datapoint built from one comma-separated segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingGroup {
    /// Never empty; index 0 is the main endpoint
    endpoints: Vec<EndpointBinding>,
    readable: Option<usize>,
    refresh_interval: Option<NonZeroU32>,
}

impl BindingGroup {
    /// First endpoint parsed in the segment; the primary read/write target
    pub fn main(&self) -> &EndpointBinding {
        &self.endpoints[0]
    }

    pub fn main_address(&self) -> GroupAddress {
        self.main().address
    }

    /// Endpoint marked with `<`, if any
    pub fn readable(&self) -> Option<&EndpointBinding> {
        self.readable.map(|idx| &self.endpoints[idx])
    }

    pub fn readable_address(&self) -> Option<GroupAddress> {
        self.readable().map(|ep| ep.address)
    }

    pub fn refresh_interval_secs(&self) -> Option<NonZeroU32> {
        self.refresh_interval
    }

    pub fn auto_refresh(&self) -> AutoRefresh {
        self.refresh_interval
            .map_or(AutoRefresh::Disabled, AutoRefresh::Interval)
    }

    pub fn endpoints(&self) -> &[EndpointBinding] {
        &self.endpoints
    }

    pub fn all_addresses(&self) -> impl Iterator<Item = GroupAddress> + '_ {
        self.endpoints.iter().map(|ep| ep.address)
    }

    pub fn contains(&self, address: GroupAddress) -> bool {
        self.endpoint(address).is_some()
    }

    pub fn endpoint(&self, address: GroupAddress) -> Option<&EndpointBinding> {
        self.endpoints.iter().find(|ep| ep.address == address)
    }

    /// Number of addresses (main plus listening addresses)
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl Serialize for BindingGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BindingGroup", 4)?;
        state.serialize_field("main_address", &self.main_address())?;
        state.serialize_field("readable_address", &self.readable_address())?;
        state.serialize_field("refresh_interval_secs", &self.auto_refresh())?;
        state.serialize_field("endpoints", &self.endpoints)?;
        state.end()
    }
}

// ============================================================================
// Group builder
// ============================================================================

/// One parsed address clause, before group validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseRecord {
    pub endpoint: EndpointBinding,
    pub readable: bool,
    pub refresh_interval: Option<NonZeroU32>,
}

/// Collects the clauses of one segment and validates them on [`finish`](Self::finish)
#[derive(Debug)]
pub struct GroupBuilder<'a> {
    item_name: &'a str,
    clauses: Vec<ClauseRecord>,
}

impl<'a> GroupBuilder<'a> {
    pub fn new(item_name: &'a str) -> Self {
        Self {
            item_name,
            clauses: Vec::new(),
        }
    }

    pub fn push(&mut self, clause: ClauseRecord) {
        self.clauses.push(clause);
    }

    /// Validate and freeze the group
    ///
    /// Returns `Ok(None)` when the segment held no address at all.
    pub fn finish(self) -> Result<Option<BindingGroup>> {
        if self.clauses.is_empty() {
            return Ok(None);
        }

        let mut seen = HashSet::with_capacity(self.clauses.len());
        let mut endpoints = Vec::with_capacity(self.clauses.len());
        let mut readable = None;
        let mut refresh_interval = None;

        for (idx, clause) in self.clauses.into_iter().enumerate() {
            if clause.readable {
                if readable.is_some() {
                    return Err(BindingError::constraint("Only one readable GA allowed."));
                }
                readable = Some(idx);
                refresh_interval = clause.refresh_interval;
            }

            if !seen.insert(clause.endpoint.address) {
                return Err(BindingError::constraint(format!(
                    "Datapoint '{}' already exists for item '{}'.",
                    clause.endpoint.type_id, self.item_name
                )));
            }
            endpoints.push(clause.endpoint);
        }

        Ok(Some(BindingGroup {
            endpoints,
            readable,
            refresh_interval,
        }))
    }
}

// ============================================================================
// Item binding
// ============================================================================

/// All datapoints of one item, in line order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemBinding {
    item_name: String,
    /// Whether the owning item accepts commands
    commandable: bool,
    groups: Vec<BindingGroup>,
}

impl ItemBinding {
    pub fn new(item_name: impl Into<String>, commandable: bool, groups: Vec<BindingGroup>) -> Self {
        Self {
            item_name: item_name.into(),
            commandable,
            groups,
        }
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn is_commandable(&self) -> bool {
        self.commandable
    }

    pub fn groups(&self) -> &[BindingGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains_address(&self, address: GroupAddress) -> bool {
        self.groups.iter().any(|group| group.contains(address))
    }

    /// Groups whose address set contains `address`
    pub fn groups_with(&self, address: GroupAddress) -> impl Iterator<Item = &BindingGroup> + '_ {
        self.groups
            .iter()
            .filter(move |group| group.contains(address))
    }

    /// Whether local optimistic updates should be suppressed
    ///
    /// A group with a command address plus listening addresses means status
    /// echoes will come from the bus. `None` when there are no groups.
    pub fn auto_update_suppressed(&self) -> Option<bool> {
        if self.groups.is_empty() {
            return None;
        }
        Some(self.groups.iter().any(|group| group.len() > 1))
    }
}

impl fmt::Display for ItemBinding {
    /// Canonical binding line; parsing it again yields an equal binding
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (gi, group) in self.groups.iter().enumerate() {
            if gi > 0 {
                f.write_str(", ")?;
            }
            if self.commandable && !group.main().is_command() {
                f.write_str("+")?;
            }
            for (ei, ep) in group.endpoints.iter().enumerate() {
                if ei > 0 {
                    f.write_str("+")?;
                }
                if group.readable == Some(ei) {
                    f.write_str("<")?;
                    if let Some(secs) = group.refresh_interval {
                        write!(f, "({})", secs)?;
                    }
                }
                write!(f, "{}:{}", ep.type_id, ep.address)?;
                if ep.alt_behavior {
                    f.write_str(START_STOP_MARKER_SUFFIX)?;
                }
            }
        }
        Ok(())
    }
}
