//! VoltageEMS KNX binding configuration
//!
//! Compiles the compact per-item KNX binding lines (`"<(30)1.001:1/1/10+0/1/13"`)
//! into immutable datapoint bindings and answers address queries over them.
//!
//! # Key Components
//!
//! - **BindingParser**: line → `ItemBinding`, all-or-nothing
//! - **ItemBinding / BindingGroup / EndpointBinding**: parsed model
//! - **TypeMapper**: value type ↔ DPT id lookup (`CoreTypeMapper` built in)
//! - **BindingProvider**: item registry with command/poll/start-stop queries
//!
//! # Example
//! ```
//! use voltage_knx::{BindingProvider, GroupAddress, Item, ItemKind};
//!
//! let provider = BindingProvider::default();
//! let light = Item::new("Light_Kitchen", ItemKind::Switch);
//! provider
//!     .process_binding_configuration("home.items", &light, "<1/1/10+0/1/13")
//!     .unwrap();
//!
//! let ga: GroupAddress = "1/1/10".parse().unwrap();
//! assert!(provider.is_command_address(ga));
//! assert_eq!(provider.auto_update_suppressed("Light_Kitchen"), Some(true));
//! ```

pub mod address;
pub mod binding;
pub mod dpt;
pub mod error;
pub mod item;
pub mod parser;
pub mod provider;

// Re-exports
pub use address::GroupAddress;
pub use binding::{
    AutoRefresh, BindingGroup, EndpointBinding, EndpointRole, ItemBinding,
    START_STOP_MARKER_SUFFIX,
};
pub use dpt::{CoreTypeMapper, TypeMapper};
pub use error::{BindingError, Result};
pub use item::{BindableItem, Item, ItemKind, ValueType};
pub use parser::{parse_binding_config, BindingParser};
pub use provider::{
    BindingProvider, LoadFailure, LoadReport, ReadableDatapoint, KNX_BINDING_TYPE,
};
