//! Semantic value types and bindable items
//!
//! Items accept an ordered list of command types and data types. The position
//! of a datapoint definition in a binding line selects the value type used to
//! guess its DPT, so the order of these lists is significant.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Value types
// ============================================================================

/// Semantic value types an item can receive or report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    OnOff,
    IncreaseDecrease,
    UpDown,
    StopMove,
    OpenClosed,
    Percent,
    Decimal,
    DateTime,
    String,
    Hsb,
    /// Undefined state; has no bus representation
    UnDef,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::OnOff => "OnOffType",
            ValueType::IncreaseDecrease => "IncreaseDecreaseType",
            ValueType::UpDown => "UpDownType",
            ValueType::StopMove => "StopMoveType",
            ValueType::OpenClosed => "OpenClosedType",
            ValueType::Percent => "PercentType",
            ValueType::Decimal => "DecimalType",
            ValueType::DateTime => "DateTimeType",
            ValueType::String => "StringType",
            ValueType::Hsb => "HSBType",
            ValueType::UnDef => "UnDefType",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Bindable items
// ============================================================================

/// An item that can carry a KNX binding
pub trait BindableItem {
    fn name(&self) -> &str;

    /// Command types in priority order; empty for read-only items
    fn accepted_command_types(&self) -> &[ValueType];

    /// Data (state) types in priority order
    fn accepted_data_types(&self) -> &[ValueType];

    fn accepts_commands(&self) -> bool {
        !self.accepted_command_types().is_empty()
    }
}

/// Item kinds known to the binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Switch,
    Dimmer,
    Rollershutter,
    Number,
    Contact,
    String,
    #[serde(alias = "date_time")]
    DateTime,
    Color,
}

impl ItemKind {
    pub const ALL: [ItemKind; 8] = [
        ItemKind::Switch,
        ItemKind::Dimmer,
        ItemKind::Rollershutter,
        ItemKind::Number,
        ItemKind::Contact,
        ItemKind::String,
        ItemKind::DateTime,
        ItemKind::Color,
    ];

    pub fn accepted_command_types(&self) -> &'static [ValueType] {
        use ValueType as V;
        match self {
            ItemKind::Switch => &[V::OnOff],
            ItemKind::Dimmer => &[V::OnOff, V::IncreaseDecrease, V::Percent],
            ItemKind::Rollershutter => &[V::UpDown, V::StopMove, V::Percent],
            ItemKind::Number => &[V::Decimal],
            ItemKind::Contact => &[],
            ItemKind::String => &[V::String],
            ItemKind::DateTime => &[V::DateTime],
            ItemKind::Color => &[V::Hsb, V::Percent, V::OnOff, V::IncreaseDecrease],
        }
    }

    pub fn accepted_data_types(&self) -> &'static [ValueType] {
        use ValueType as V;
        match self {
            ItemKind::Switch => &[V::OnOff, V::UnDef],
            ItemKind::Dimmer => &[V::OnOff, V::Percent, V::UnDef],
            ItemKind::Rollershutter => &[V::UnDef, V::UpDown, V::Percent],
            ItemKind::Number => &[V::Decimal, V::UnDef],
            ItemKind::Contact => &[V::OpenClosed, V::UnDef],
            ItemKind::String => &[V::String, V::DateTime, V::UnDef],
            ItemKind::DateTime => &[V::DateTime, V::UnDef],
            ItemKind::Color => &[V::Hsb, V::Percent, V::OnOff, V::UnDef],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Switch => "switch",
            ItemKind::Dimmer => "dimmer",
            ItemKind::Rollershutter => "rollershutter",
            ItemKind::Number => "number",
            ItemKind::Contact => "contact",
            ItemKind::String => "string",
            ItemKind::DateTime => "datetime",
            ItemKind::Color => "color",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ItemKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| format!("Unknown item kind: {}", s))
    }
}

/// Named item of a known kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl BindableItem for Item {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepted_command_types(&self) -> &[ValueType] {
        self.kind.accepted_command_types()
    }

    fn accepted_data_types(&self) -> &[ValueType] {
        self.kind.accepted_data_types()
    }
}
