//! Datapoint type (DPT) mapping
//!
//! The parser never encodes values itself; it only needs to know which DPT a
//! value type maps to by default and whether a DPT id is supported at all.

use crate::item::ValueType;

/// Mapping between semantic value types and DPT ids
pub trait TypeMapper: Send + Sync {
    /// Default DPT id used when a binding line gives none
    fn default_type_id(&self, value_type: ValueType) -> Option<&str>;

    /// Value type a DPT id decodes to, `None` for unknown ids
    fn value_type_of(&self, type_id: &str) -> Option<ValueType>;

    fn is_supported(&self, type_id: &str) -> bool {
        self.value_type_of(type_id).is_some()
    }
}

/// DPT ids supported by the binding and the value type each one decodes to
const SUPPORTED_DPTS: &[(&str, ValueType)] = &[
    // 1.xxx - 1 bit
    ("1.001", ValueType::OnOff),
    ("1.002", ValueType::OnOff),
    ("1.003", ValueType::OnOff),
    ("1.008", ValueType::UpDown),
    ("1.009", ValueType::OpenClosed),
    ("1.010", ValueType::StopMove),
    ("1.019", ValueType::OpenClosed),
    // 3.xxx - 3 bit controlled
    ("3.007", ValueType::IncreaseDecrease),
    ("3.008", ValueType::UpDown),
    // 5.xxx - 8 bit unsigned
    ("5.001", ValueType::Percent),
    ("5.003", ValueType::Decimal),
    ("5.004", ValueType::Decimal),
    ("5.005", ValueType::Decimal),
    ("5.006", ValueType::Decimal),
    ("5.010", ValueType::Decimal),
    // 6.xxx - 8 bit signed
    ("6.001", ValueType::Decimal),
    ("6.010", ValueType::Decimal),
    // 7.xxx - 16 bit unsigned
    ("7.001", ValueType::Decimal),
    ("7.012", ValueType::Decimal),
    // 8.xxx - 16 bit signed
    ("8.001", ValueType::Decimal),
    ("8.010", ValueType::Decimal),
    // 9.xxx - 16 bit float
    ("9.001", ValueType::Decimal),
    ("9.002", ValueType::Decimal),
    ("9.004", ValueType::Decimal),
    ("9.005", ValueType::Decimal),
    ("9.006", ValueType::Decimal),
    ("9.007", ValueType::Decimal),
    ("9.008", ValueType::Decimal),
    // 10.xxx / 11.xxx - time and date
    ("10.001", ValueType::DateTime),
    ("11.001", ValueType::DateTime),
    // 12.xxx / 13.xxx - 32 bit counters
    ("12.001", ValueType::Decimal),
    ("13.001", ValueType::Decimal),
    ("13.010", ValueType::Decimal),
    // 14.xxx - 32 bit float
    ("14.019", ValueType::Decimal),
    ("14.027", ValueType::Decimal),
    ("14.056", ValueType::Decimal),
    ("14.068", ValueType::Decimal),
    // 16.xxx - 14 byte strings
    ("16.000", ValueType::String),
    ("16.001", ValueType::String),
    // 17.xxx / 18.xxx - scenes
    ("17.001", ValueType::Decimal),
    ("18.001", ValueType::Decimal),
    // 19.xxx - date and time
    ("19.001", ValueType::DateTime),
    // 20.xxx - HVAC modes
    ("20.102", ValueType::String),
    // 232.xxx - RGB
    ("232.600", ValueType::Hsb),
];

/// Built-in DPT tables
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreTypeMapper;

impl CoreTypeMapper {
    pub fn new() -> Self {
        Self
    }

    /// All supported DPT ids in table order
    pub fn supported_type_ids(&self) -> impl Iterator<Item = &'static str> {
        SUPPORTED_DPTS.iter().map(|(id, _)| *id)
    }
}

impl TypeMapper for CoreTypeMapper {
    fn default_type_id(&self, value_type: ValueType) -> Option<&str> {
        match value_type {
            ValueType::OnOff => Some("1.001"),
            ValueType::IncreaseDecrease => Some("3.007"),
            ValueType::UpDown => Some("1.008"),
            ValueType::StopMove => Some("1.010"),
            ValueType::OpenClosed => Some("1.009"),
            ValueType::Percent => Some("5.001"),
            ValueType::Decimal => Some("9.001"),
            ValueType::DateTime => Some("10.001"),
            ValueType::String => Some("16.000"),
            ValueType::Hsb => Some("232.600"),
            ValueType::UnDef => None,
        }
    }

    fn value_type_of(&self, type_id: &str) -> Option<ValueType> {
        SUPPORTED_DPTS
            .iter()
            .find(|(id, _)| *id == type_id)
            .map(|(_, value_type)| *value_type)
    }
}
