//! Binding configuration parser
//!
//! Syntax of a binding line:
//!
//! ```text
//! [<][(refresh)][dptId:]mainGA[ss][+[<][dptId:]listeningGA[ss]]..., ...
//! ```
//!
//! Each comma-separated segment is one datapoint of the item. Without an
//! explicit DPT id the n-th segment is mapped to the n-th accepted command type
//! of the item (or data type for read-only items). `<` marks the address that
//! answers read requests, optionally followed by an auto refresh interval in
//! seconds. A trailing `ss` marks an address for start-stop dimming.
//!
//! Examples for a Switch: `1/1/10`, `1.001:1/1/10`, `<1/1/10+0/1/13+0/1/14`.
//! For a Rollershutter: `4/2/10, 4/2/11`, `<4/2/10+0/2/10, 5.006:4/2/11+0/2/11`.

use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

use crate::address::GroupAddress;
use crate::binding::{
    ClauseRecord, EndpointBinding, EndpointRole, GroupBuilder, ItemBinding,
    START_STOP_MARKER_SUFFIX,
};
use crate::dpt::{CoreTypeMapper, TypeMapper};
use crate::error::{BindingError, Result};
use crate::item::{BindableItem, ValueType};

const READABLE_MARKER: char = '<';
const SEGMENT_SEPARATOR: char = ',';
const CLAUSE_SEPARATOR: char = '+';
const TYPE_SEPARATOR: char = ':';

/// Parser for binding configuration lines
///
/// Holds no state besides the DPT mapper, so one instance can be shared
/// across threads and reused for any number of lines.
#[derive(Clone)]
pub struct BindingParser {
    mapper: Arc<dyn TypeMapper>,
}

impl Default for BindingParser {
    fn default() -> Self {
        Self::new(Arc::new(CoreTypeMapper::new()))
    }
}

impl std::fmt::Debug for BindingParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingParser").finish_non_exhaustive()
    }
}

impl BindingParser {
    pub fn new(mapper: Arc<dyn TypeMapper>) -> Self {
        Self { mapper }
    }

    pub fn mapper(&self) -> &Arc<dyn TypeMapper> {
        &self.mapper
    }

    /// Parse a whole binding line for `item`
    ///
    /// The first error aborts the line; no partial binding is returned.
    pub fn parse<I>(&self, item: &I, line: &str) -> Result<ItemBinding>
    where
        I: BindableItem + ?Sized,
    {
        let mut groups = Vec::new();

        for (segment_idx, segment) in line.trim().split(SEGMENT_SEPARATOR).enumerate() {
            let mut builder = GroupBuilder::new(item.name());

            for (clause_idx, clause) in segment.trim().split(CLAUSE_SEPARATOR).enumerate() {
                let clause = clause.trim();
                // "+x/y/z": the empty clause just makes the next one a listening address
                if clause.is_empty() {
                    continue;
                }
                builder.push(self.parse_clause(item, segment_idx, clause_idx, clause)?);
            }

            if let Some(group) = builder.finish()? {
                groups.push(group);
            }
        }

        debug!(
            "Parsed {} KNX datapoint(s) for item '{}'",
            groups.len(),
            item.name()
        );
        Ok(ItemBinding::new(item.name(), item.accepts_commands(), groups))
    }

    fn parse_clause<I>(
        &self,
        item: &I,
        segment_idx: usize,
        clause_idx: usize,
        clause: &str,
    ) -> Result<ClauseRecord>
    where
        I: BindableItem + ?Sized,
    {
        let (readable, refresh_interval, rest) = match clause.strip_prefix(READABLE_MARKER) {
            Some(rest) => {
                let (refresh, rest) = parse_refresh(rest)?;
                (true, refresh, rest)
            },
            None => (false, None, clause),
        };

        let (type_id, address_text) = match rest.split_once(TYPE_SEPARATOR) {
            Some((explicit, address)) => (explicit.trim().to_string(), address),
            None => (self.infer_type_id(item, segment_idx)?, rest),
        };

        if !self.mapper.is_supported(&type_id) {
            return Err(BindingError::unresolved(format!(
                "DPT {} is not supported by the KNX binding.",
                type_id
            )));
        }

        let mut address_text = address_text.trim();
        let alt_behavior = match address_text.strip_suffix(START_STOP_MARKER_SUFFIX) {
            Some(stripped) => {
                address_text = stripped;
                true
            },
            None => false,
        };
        let address: GroupAddress = address_text.parse()?;

        let role = if clause_idx == 0 && item.accepts_commands() {
            EndpointRole::Command
        } else {
            EndpointRole::State
        };

        Ok(ClauseRecord {
            endpoint: EndpointBinding {
                address,
                type_id,
                role,
                alt_behavior,
            },
            readable,
            refresh_interval,
        })
    }

    /// Guess the DPT of the `segment_idx`-th datapoint from the item's accepted types
    fn infer_type_id<I>(&self, item: &I, segment_idx: usize) -> Result<String>
    where
        I: BindableItem + ?Sized,
    {
        let value_type = select_value_type(item, segment_idx)?;
        match self.mapper.default_type_id(value_type) {
            Some(id) if !id.trim().is_empty() => Ok(id.to_string()),
            _ => Err(BindingError::unresolved(format!(
                "No DPT could be determined for the type '{}'.",
                value_type
            ))),
        }
    }
}

/// Value type matching the datapoint position
///
/// Commandable items use their command types; read-only items with several
/// data types use the data type at the same position, otherwise the only one.
fn select_value_type<I>(item: &I, segment_idx: usize) -> Result<ValueType>
where
    I: BindableItem + ?Sized,
{
    let commands = item.accepted_command_types();
    let data = item.accepted_data_types();

    let selected = if !commands.is_empty() {
        commands.get(segment_idx)
    } else if data.len() > 1 {
        data.get(segment_idx)
    } else {
        data.first()
    };

    selected.copied().ok_or_else(|| {
        BindingError::constraint(format!(
            "No more than {} datapoint definitions are allowed for this item.",
            segment_idx
        ))
    })
}

/// Parse the optional `(secs)` after the readable marker
///
/// Returns the interval and the remaining clause text.
fn parse_refresh(text: &str) -> Result<(Option<NonZeroU32>, &str)> {
    let Some(inner) = text.strip_prefix('(') else {
        return Ok((None, text));
    };
    let Some(end) = inner.find(')') else {
        return Err(BindingError::syntax(
            "Closing ')' missing on autorefresh time parameter.",
        ));
    };

    let value = &inner[..end];
    let rest = &inner[end + 1..];
    if value.is_empty() {
        return Err(BindingError::syntax(
            "Autorefresh time parameter: missing time. Empty brackets are not allowed.",
        ));
    }

    let secs: i64 = value.parse().map_err(|_| {
        BindingError::syntax(format!(
            "Autorefresh time must be a number, but was '{}'.",
            value
        ))
    })?;
    if secs <= 0 {
        return Err(BindingError::constraint(format!(
            "Autorefresh time must be positive, but was {}.",
            secs
        )));
    }

    let secs = u32::try_from(secs)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| {
            BindingError::constraint(format!("Autorefresh time {} is out of range.", secs))
        })?;
    Ok((Some(secs), rest))
}

/// Parse `line` with the built-in DPT tables
pub fn parse_binding_config<I>(item: &I, line: &str) -> Result<ItemBinding>
where
    I: BindableItem + ?Sized,
{
    BindingParser::default().parse(item, line)
}
