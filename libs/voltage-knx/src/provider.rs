//! KNX binding provider
//!
//! Keeps the parsed binding of every item and answers the questions the bus
//! side asks about group addresses: which items listen, is it a command
//! address, should it be polled, is it start-stop dimmed.
//!
//! # Architecture
//!
//! ```text
//! BindingProvider
//!   ├─ parser: BindingParser (stateless)
//!   └─ table: RwLock<BindingTable>
//!        ├─ bindings: BTreeMap<item_name, Arc<ItemBinding>>
//!        └─ contexts: HashMap<context, BTreeSet<item_name>>
//! ```
//!
//! Writers replace whole `Arc<ItemBinding>` entries under the write lock;
//! readers see a consistent table under the read lock.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::address::GroupAddress;
use crate::binding::{AutoRefresh, BindingGroup, EndpointBinding, ItemBinding};
use crate::dpt::{CoreTypeMapper, TypeMapper};
use crate::error::{BindingError, Result};
use crate::item::{BindableItem, ValueType};
use crate::parser::BindingParser;

/// Binding type this provider registers for
pub const KNX_BINDING_TYPE: &str = "knx";

#[derive(Debug, Default)]
struct BindingTable {
    bindings: BTreeMap<String, Arc<ItemBinding>>,
    /// Items registered per configuration source
    contexts: HashMap<String, BTreeSet<String>>,
}

impl BindingTable {
    fn detach(&mut self, item_name: &str) {
        self.contexts.retain(|_, items| {
            items.remove(item_name);
            !items.is_empty()
        });
    }

    fn groups(&self) -> impl Iterator<Item = (&str, &BindingGroup)> + '_ {
        self.bindings.iter().flat_map(|(name, binding)| {
            binding
                .groups()
                .iter()
                .map(move |group| (name.as_str(), group))
        })
    }
}

/// Readable datapoint to be polled by the bus side
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReadableDatapoint {
    pub item_name: String,
    pub endpoint: EndpointBinding,
    pub auto_refresh: AutoRefresh,
}

/// Item rejected during a batch load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub item_name: String,
    pub error: BindingError,
}

/// Outcome of [`BindingProvider::load_items`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub failed: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Registry of item bindings plus the address queries built on it
pub struct BindingProvider {
    parser: BindingParser,
    mapper: Arc<dyn TypeMapper>,
    table: RwLock<BindingTable>,
}

impl Default for BindingProvider {
    fn default() -> Self {
        Self::new(Arc::new(CoreTypeMapper::new()))
    }
}

impl std::fmt::Debug for BindingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingProvider")
            .field("items", &self.len())
            .finish_non_exhaustive()
    }
}

impl BindingProvider {
    pub fn new(mapper: Arc<dyn TypeMapper>) -> Self {
        Self {
            parser: BindingParser::new(Arc::clone(&mapper)),
            mapper,
            table: RwLock::new(BindingTable::default()),
        }
    }

    pub fn binding_type(&self) -> &'static str {
        KNX_BINDING_TYPE
    }

    pub fn parser(&self) -> &BindingParser {
        &self.parser
    }

    // ==================== Registration ====================

    /// Parse `line` for `item` and store the result, replacing any previous binding
    ///
    /// On error nothing is stored and the previous binding (if any) stays.
    pub fn process_binding_configuration<I>(
        &self,
        context: &str,
        item: &I,
        line: &str,
    ) -> Result<Arc<ItemBinding>>
    where
        I: BindableItem + ?Sized,
    {
        let binding = Arc::new(self.parser.parse(item, line)?);

        let mut table = self.table.write();
        table.detach(item.name());
        table
            .contexts
            .entry(context.to_string())
            .or_default()
            .insert(item.name().to_string());
        table
            .bindings
            .insert(item.name().to_string(), Arc::clone(&binding));

        debug!(
            "Registered KNX binding for item '{}' from '{}': {}",
            item.name(),
            context,
            binding
        );
        Ok(binding)
    }

    /// Register many items; bad lines are logged and skipped
    pub fn load_items<'a, I, It>(&self, context: &str, items: It) -> LoadReport
    where
        I: BindableItem + ?Sized + 'a,
        It: IntoIterator<Item = (&'a I, &'a str)>,
    {
        let mut report = LoadReport::default();
        for (item, line) in items {
            match self.process_binding_configuration(context, item, line) {
                Ok(_) => report.loaded.push(item.name().to_string()),
                Err(error) => {
                    warn!("Rejected KNX binding for item '{}': {}", item.name(), error);
                    report.failed.push(LoadFailure {
                        item_name: item.name().to_string(),
                        error,
                    });
                },
            }
        }
        info!(
            "Loaded {} KNX item binding(s) from '{}', {} rejected",
            report.loaded.len(),
            context,
            report.failed.len()
        );
        report
    }

    /// Drop every item registered from `context`; returns how many were removed
    pub fn remove_configurations(&self, context: &str) -> usize {
        let mut table = self.table.write();
        let Some(items) = table.contexts.remove(context) else {
            return 0;
        };
        for name in &items {
            table.bindings.remove(name);
        }
        debug!("Removed {} KNX item binding(s) of '{}'", items.len(), context);
        items.len()
    }

    pub fn remove_item(&self, item_name: &str) -> Option<Arc<ItemBinding>> {
        let mut table = self.table.write();
        table.detach(item_name);
        table.bindings.remove(item_name)
    }

    pub fn binding(&self, item_name: &str) -> Option<Arc<ItemBinding>> {
        self.table.read().bindings.get(item_name).cloned()
    }

    /// Registered item names in sorted order
    pub fn item_names(&self) -> Vec<String> {
        self.table.read().bindings.keys().cloned().collect()
    }

    /// Current bindings in item-name order
    pub fn snapshot(&self) -> Vec<Arc<ItemBinding>> {
        self.table.read().bindings.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.table.read().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().bindings.is_empty()
    }

    // ==================== Address queries ====================

    /// Whether `address` is the command address of a datapoint
    ///
    /// True when some datapoint sends commands to `address`. Listening
    /// addresses and addresses of state-only datapoints don't count.
    pub fn is_command_address(&self, address: GroupAddress) -> bool {
        let table = self.table.read();
        let found = table
            .groups()
            .any(|(_, group)| group.main().is_command() && group.main_address() == address);
        found
    }

    /// All readable datapoints with their owning item
    pub fn readable_datapoints(&self) -> Vec<ReadableDatapoint> {
        let table = self.table.read();
        table
            .groups()
            .filter_map(|(name, group)| {
                group.readable().map(|endpoint| ReadableDatapoint {
                    item_name: name.to_string(),
                    endpoint: endpoint.clone(),
                    auto_refresh: group.auto_refresh(),
                })
            })
            .collect()
    }

    /// Auto refresh setting of the readable datapoint at `address`
    pub fn auto_refresh(&self, address: GroupAddress) -> AutoRefresh {
        let table = self.table.read();
        let refresh = table
            .groups()
            .find(|(_, group)| group.readable_address() == Some(address))
            .map_or(AutoRefresh::Disabled, |(_, group)| group.auto_refresh());
        refresh
    }

    /// Auto refresh interval in seconds, 0 when the address is not polled
    pub fn refresh_interval_secs(&self, address: GroupAddress) -> u32 {
        self.auto_refresh(address).as_secs()
    }

    pub fn is_auto_refresh_enabled(&self, address: GroupAddress) -> bool {
        self.auto_refresh(address).is_enabled()
    }

    /// Whether any datapoint marks `address` for start-stop dimming
    pub fn is_start_stop_address(&self, address: GroupAddress) -> bool {
        let table = self.table.read();
        let marked = table.groups().any(|(_, group)| {
            group
                .endpoint(address)
                .is_some_and(|endpoint| endpoint.alt_behavior)
        });
        marked
    }

    /// Names of the items with a datapoint on `address`
    pub fn listening_item_names(&self, address: GroupAddress) -> Vec<String> {
        let table = self.table.read();
        table
            .bindings
            .iter()
            .filter(|(_, binding)| binding.contains_address(address))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Whether auto-update should be suppressed for the item
    ///
    /// `None` when the item is unknown or has no datapoints.
    pub fn auto_update_suppressed(&self, item_name: &str) -> Option<bool> {
        self.table
            .read()
            .bindings
            .get(item_name)
            .and_then(|binding| binding.auto_update_suppressed())
    }

    /// Main endpoints of the item's datapoints that include `address`
    pub fn datapoints_for_address(
        &self,
        item_name: &str,
        address: GroupAddress,
    ) -> Vec<EndpointBinding> {
        let table = self.table.read();
        table
            .bindings
            .get(item_name)
            .map(|binding| {
                binding
                    .groups_with(address)
                    .map(|group| group.main().clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Main endpoints of the item whose DPT decodes to `value_type`
    pub fn datapoints_for_type(
        &self,
        item_name: &str,
        value_type: ValueType,
    ) -> Vec<EndpointBinding> {
        let table = self.table.read();
        table
            .bindings
            .get(item_name)
            .map(|binding| {
                binding
                    .groups()
                    .iter()
                    .map(|group| group.main())
                    .filter(|main| self.mapper.value_type_of(&main.type_id) == Some(value_type))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::item::{Item, ItemKind};
    use tracing_test::traced_test;

    fn ga(text: &str) -> GroupAddress {
        text.parse().unwrap()
    }

    fn provider_with(entries: &[(&str, ItemKind, &str)]) -> BindingProvider {
        let provider = BindingProvider::default();
        for (name, kind, line) in entries {
            provider
                .process_binding_configuration("test.items", &Item::new(*name, *kind), line)
                .unwrap();
        }
        provider
    }

    #[test]
    fn test_binding_type() {
        assert_eq!(BindingProvider::default().binding_type(), "knx");
    }

    #[test]
    fn test_command_address_queries() {
        let provider = provider_with(&[
            ("Light", ItemKind::Switch, "<1/1/10+0/1/13"),
            ("Window", ItemKind::Contact, "1/0/1"),
        ]);

        assert!(provider.is_command_address(ga("1/1/10")));
        assert!(!provider.is_command_address(ga("0/1/13")));
        assert!(!provider.is_command_address(ga("1/0/1")));
        assert!(!provider.is_command_address(ga("7/7/7")));
    }

    #[test]
    fn test_command_address_shared_with_listener() {
        // A_Status sorts first and only listens; B_Light sends to the same address
        let provider = provider_with(&[
            ("A_Status", ItemKind::Switch, "+1/1/10"),
            ("B_Light", ItemKind::Switch, "1/1/10"),
        ]);
        assert!(provider.is_command_address(ga("1/1/10")));

        let renamed = provider_with(&[
            ("A_Light", ItemKind::Switch, "1/1/10"),
            ("B_Status", ItemKind::Switch, "+1/1/10"),
        ]);
        assert!(renamed.is_command_address(ga("1/1/10")));
    }

    #[test]
    fn test_queries_release_read_lock() {
        let provider = provider_with(&[("Dim", ItemKind::Dimmer, "<(10)1/1/1, 4/2/10ss")]);
        assert!(provider.is_command_address(ga("1/1/1")));
        assert_eq!(provider.auto_refresh(ga("1/1/1")), AutoRefresh::from_secs(10));
        assert!(provider.is_start_stop_address(ga("4/2/10")));

        // A writer must get through after the queries above
        let dim = Item::new("Dim", ItemKind::Dimmer);
        provider
            .process_binding_configuration("test.items", &dim, "1/1/2")
            .unwrap();
        assert!(!provider.is_command_address(ga("1/1/1")));
        assert!(!provider.is_auto_refresh_enabled(ga("1/1/1")));
        assert!(!provider.is_start_stop_address(ga("4/2/10")));
    }

    #[test]
    fn test_readable_datapoints_and_refresh() {
        let provider = provider_with(&[
            ("Light", ItemKind::Switch, "<1/1/10+0/1/13"),
            ("Temp", ItemKind::Number, "<(30)4/2/10"),
            ("Shutter", ItemKind::Rollershutter, "4/2/20, 4/2/21"),
        ]);

        let readable = provider.readable_datapoints();
        assert_eq!(readable.len(), 2);
        assert_eq!(readable[0].item_name, "Light");
        assert_eq!(readable[0].auto_refresh, AutoRefresh::Disabled);
        assert_eq!(readable[1].item_name, "Temp");
        assert_eq!(readable[1].endpoint.address, ga("4/2/10"));

        assert_eq!(provider.refresh_interval_secs(ga("4/2/10")), 30);
        assert!(provider.is_auto_refresh_enabled(ga("4/2/10")));
        assert_eq!(provider.auto_refresh(ga("1/1/10")), AutoRefresh::Disabled);
        assert_eq!(provider.refresh_interval_secs(ga("4/2/20")), 0);
    }

    #[test]
    fn test_start_stop_any_group() {
        let provider = provider_with(&[
            ("DimA", ItemKind::Dimmer, "1/1/1, 4/2/10"),
            ("DimB", ItemKind::Dimmer, "1/1/2, 4/2/10ss"),
        ]);
        assert!(provider.is_start_stop_address(ga("4/2/10")));
        assert!(!provider.is_start_stop_address(ga("1/1/1")));
    }

    #[test]
    fn test_listening_item_names() {
        let provider = provider_with(&[
            ("Light", ItemKind::Switch, "1/1/10+0/1/13"),
            ("Status", ItemKind::Contact, "0/1/13"),
            ("Other", ItemKind::Switch, "2/2/2"),
        ]);
        assert_eq!(
            provider.listening_item_names(ga("0/1/13")),
            vec!["Light".to_string(), "Status".to_string()]
        );
        assert!(provider.listening_item_names(ga("9/0/0")).is_empty());
    }

    #[test]
    fn test_auto_update() {
        let provider = provider_with(&[
            ("Single", ItemKind::Switch, "1/1/10"),
            ("Multi", ItemKind::Switch, "1/1/11+0/1/13"),
            ("Empty", ItemKind::Switch, ""),
        ]);
        assert_eq!(provider.auto_update_suppressed("Single"), Some(false));
        assert_eq!(provider.auto_update_suppressed("Multi"), Some(true));
        assert_eq!(provider.auto_update_suppressed("Empty"), None);
        assert_eq!(provider.auto_update_suppressed("Unknown"), None);
    }

    #[test]
    fn test_datapoints_for_address_and_type() {
        let provider = provider_with(&[(
            "Shutter",
            ItemKind::Rollershutter,
            "<4/2/10+0/2/10, 4/2/11+0/2/10, 5.001:4/2/12",
        )]);

        let by_addr = provider.datapoints_for_address("Shutter", ga("0/2/10"));
        let mains: Vec<_> = by_addr.iter().map(|ep| ep.address).collect();
        assert_eq!(mains, vec![ga("4/2/10"), ga("4/2/11")]);

        let percent = provider.datapoints_for_type("Shutter", ValueType::Percent);
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].address, ga("4/2/12"));

        assert!(provider
            .datapoints_for_type("Shutter", ValueType::Hsb)
            .is_empty());
        assert!(provider
            .datapoints_for_address("Nobody", ga("4/2/10"))
            .is_empty());
    }

    #[test]
    fn test_reparse_replaces_binding() {
        let provider = provider_with(&[("Light", ItemKind::Switch, "1/1/10")]);
        let item = Item::new("Light", ItemKind::Switch);
        provider
            .process_binding_configuration("test.items", &item, "1/1/20")
            .unwrap();

        assert_eq!(provider.len(), 1);
        assert!(provider.listening_item_names(ga("1/1/10")).is_empty());
        assert_eq!(provider.listening_item_names(ga("1/1/20")), vec!["Light"]);
    }

    #[test]
    fn test_failed_reparse_keeps_previous() {
        let provider = provider_with(&[("Light", ItemKind::Switch, "1/1/10")]);
        let item = Item::new("Light", ItemKind::Switch);
        let err = provider
            .process_binding_configuration("test.items", &item, "1/1/10+1/1/10")
            .unwrap_err();
        assert!(matches!(err, BindingError::ConstraintViolation(_)));
        assert_eq!(
            provider.binding("Light").unwrap().groups()[0].main_address(),
            ga("1/1/10")
        );
    }

    #[test]
    fn test_remove_configurations_by_context() {
        let provider = BindingProvider::default();
        let light = Item::new("Light", ItemKind::Switch);
        let window = Item::new("Window", ItemKind::Contact);
        provider
            .process_binding_configuration("a.items", &light, "1/1/10")
            .unwrap();
        provider
            .process_binding_configuration("b.items", &window, "1/0/1")
            .unwrap();

        assert_eq!(provider.remove_configurations("a.items"), 1);
        assert_eq!(provider.item_names(), vec!["Window".to_string()]);
        assert_eq!(provider.remove_configurations("a.items"), 0);

        assert!(provider.remove_item("Window").is_some());
        assert!(provider.is_empty());
        assert_eq!(provider.remove_configurations("b.items"), 0);
    }

    #[test]
    fn test_item_moves_between_contexts() {
        let provider = BindingProvider::default();
        let light = Item::new("Light", ItemKind::Switch);
        provider
            .process_binding_configuration("a.items", &light, "1/1/10")
            .unwrap();
        provider
            .process_binding_configuration("b.items", &light, "1/1/11")
            .unwrap();

        assert_eq!(provider.remove_configurations("a.items"), 0);
        assert_eq!(provider.len(), 1);
        assert_eq!(provider.remove_configurations("b.items"), 1);
    }

    #[test]
    #[traced_test]
    fn test_load_items_skips_bad_lines() {
        let provider = BindingProvider::default();
        let light = Item::new("Light", ItemKind::Switch);
        let broken = Item::new("Broken", ItemKind::Switch);
        let shutter = Item::new("Shutter", ItemKind::Rollershutter);

        let report = provider.load_items(
            "home.items",
            [
                (&light, "1/1/10"),
                (&broken, "<()1/1/11"),
                (&shutter, "4/2/10, 4/2/11"),
            ],
        );

        assert!(!report.is_ok());
        assert_eq!(report.loaded, vec!["Light", "Shutter"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].item_name, "Broken");
        assert!(matches!(report.failed[0].error, BindingError::Syntax(_)));
        assert_eq!(provider.len(), 2);
        assert!(logs_contain("Rejected KNX binding for item 'Broken'"));
    }

    #[test]
    fn test_provider_is_shareable_across_threads() {
        let provider = Arc::new(provider_with(&[("Light", ItemKind::Switch, "<1/1/10")]));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let provider = Arc::clone(&provider);
                std::thread::spawn(move || provider.readable_datapoints().len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }
}
