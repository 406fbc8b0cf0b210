//! End-to-end tests for binding lines
//!
//! Covers the documented examples per item kind and the canonical round trip
//! (render → reparse yields the same binding).

// Allow unwrap() in tests for cleaner test code
#![allow(clippy::disallowed_methods)]

use voltage_knx::{
    parse_binding_config, BindableItem, BindingError, EndpointRole, GroupAddress, Item, ItemKind,
    ValueType,
};

fn ga(text: &str) -> GroupAddress {
    text.parse().unwrap()
}

/// Item with arbitrary accepted type lists
struct CustomItem {
    commands: Vec<ValueType>,
    data: Vec<ValueType>,
}

impl BindableItem for CustomItem {
    fn name(&self) -> &str {
        "Custom"
    }

    fn accepted_command_types(&self) -> &[ValueType] {
        &self.commands
    }

    fn accepted_data_types(&self) -> &[ValueType] {
        &self.data
    }
}

// ============================================================================
// Documented examples
// ============================================================================

#[test]
fn test_switch_examples() {
    let switch = Item::new("Light", ItemKind::Switch);
    for line in [
        "1/1/10",
        "1.001:1/1/10",
        "<1/1/10",
        "<1/1/10+0/1/13+0/1/14+0/1/15",
    ] {
        let binding = parse_binding_config(&switch, line).unwrap();
        assert_eq!(binding.len(), 1, "line {:?}", line);
        assert_eq!(binding.groups()[0].main_address(), ga("1/1/10"));
        assert_eq!(binding.groups()[0].main().role, EndpointRole::Command);
    }
}

#[test]
fn test_rollershutter_examples() {
    let shutter = Item::new("Shutter", ItemKind::Rollershutter);

    let binding = parse_binding_config(&shutter, "4/2/10").unwrap();
    assert_eq!(binding.groups()[0].main().type_id, "1.008");

    let binding = parse_binding_config(&shutter, "4/2/10, 4/2/11").unwrap();
    assert_eq!(binding.groups()[1].main().type_id, "1.010");

    let binding = parse_binding_config(&shutter, "1.008:4/2/10, 5.006:4/2/11").unwrap();
    assert_eq!(binding.groups()[0].main().type_id, "1.008");
    assert_eq!(binding.groups()[1].main().type_id, "5.006");

    let binding = parse_binding_config(&shutter, "<4/2/10+0/2/10, 5.006:4/2/11+0/2/11").unwrap();
    assert_eq!(binding.groups()[1].main().type_id, "5.006");
    assert_eq!(binding.groups()[0].readable_address(), Some(ga("4/2/10")));
    assert_eq!(binding.groups()[1].readable_address(), None);
    assert_eq!(
        binding.groups()[1].all_addresses().collect::<Vec<_>>(),
        vec![ga("4/2/11"), ga("0/2/11")]
    );
}

#[test]
fn test_listening_addresses_count() {
    let switch = Item::new("Light", ItemKind::Switch);
    let binding = parse_binding_config(&switch, "<1/1/10+0/1/13+0/1/14").unwrap();
    let group = &binding.groups()[0];

    assert_eq!(group.all_addresses().count(), 3);
    assert_eq!(group.endpoint(ga("0/1/13")).unwrap().role, EndpointRole::State);
    assert_eq!(group.endpoint(ga("0/1/14")).unwrap().role, EndpointRole::State);
    assert_eq!(binding.auto_update_suppressed(), Some(true));
}

// ============================================================================
// Error taxonomy
// ============================================================================

#[test]
fn test_one_command_type_two_segments() {
    let item = CustomItem {
        commands: vec![ValueType::OnOff],
        data: vec![],
    };
    let err = parse_binding_config(&item, "1/1/10, 1/1/11").unwrap_err();
    assert!(matches!(err, BindingError::ConstraintViolation(_)));
    assert!(err.message().contains("datapoint definitions"));
}

#[test]
fn test_explicit_dpt_beyond_accepted_types() {
    let item = CustomItem {
        commands: vec![ValueType::OnOff],
        data: vec![],
    };
    // Only inference needs a matching accepted type
    let binding = parse_binding_config(&item, "1/1/10, 1.001:1/1/11").unwrap();
    assert_eq!(binding.len(), 2);
}

#[test]
fn test_read_only_single_data_type_reused() {
    let item = CustomItem {
        commands: vec![],
        data: vec![ValueType::Decimal],
    };
    let binding = parse_binding_config(&item, "1/1/10, 1/1/11, 1/1/12").unwrap();
    assert_eq!(binding.len(), 3);
    assert!(binding
        .groups()
        .iter()
        .all(|g| g.main().type_id == "9.001" && g.main().role == EndpointRole::State));
}

#[test]
fn test_item_without_any_type() {
    let item = CustomItem {
        commands: vec![],
        data: vec![],
    };
    let err = parse_binding_config(&item, "1/1/10").unwrap_err();
    assert_eq!(
        err,
        BindingError::constraint("No more than 0 datapoint definitions are allowed for this item.")
    );
}

#[test]
fn test_first_error_wins() {
    let switch = Item::new("Light", ItemKind::Switch);
    // Unsupported DPT in the first segment is reported before the overflow in the second
    let err = parse_binding_config(&switch, "99.1:1/1/10, 1/1/11").unwrap_err();
    assert!(matches!(err, BindingError::UnresolvedType(_)));
}

#[test]
fn test_error_kinds() {
    let switch = Item::new("Light", ItemKind::Switch);
    let cases: [(&str, fn(&BindingError) -> bool); 6] = [
        ("<()4/2/10", |e| matches!(e, BindingError::Syntax(_))),
        ("<(x)4/2/10", |e| matches!(e, BindingError::Syntax(_))),
        ("4/2/x", |e| matches!(e, BindingError::Syntax(_))),
        ("<(0)4/2/10", |e| matches!(e, BindingError::ConstraintViolation(_))),
        ("4/2/10+4/2/10", |e| {
            matches!(e, BindingError::ConstraintViolation(_))
        }),
        ("7.777:4/2/10", |e| matches!(e, BindingError::UnresolvedType(_))),
    ];
    for (line, check) in cases {
        let err = parse_binding_config(&switch, line).unwrap_err();
        assert!(check(&err), "unexpected error for {:?}: {}", line, err);
    }
}

// ============================================================================
// Canonical round trip
// ============================================================================

#[test]
fn test_canonical_rendering() {
    let shutter = Item::new("Shutter", ItemKind::Rollershutter);
    let binding = parse_binding_config(&shutter, " <(60)4/2/10ss + 0/2/10 ,+4/2/11").unwrap();
    assert_eq!(
        binding.to_string(),
        "<(60)1.008:4/2/10ss+1.008:0/2/10, +1.010:4/2/11"
    );
}

#[test]
fn test_round_trip_is_identity() {
    let cases = [
        (ItemKind::Switch, "1/1/10"),
        (ItemKind::Switch, "<1/1/10+0/1/13+0/1/14"),
        (ItemKind::Switch, "+0/1/13+0/1/14"),
        (ItemKind::Number, "<(30)4/2/10"),
        (ItemKind::Number, "4/2/10+<(15)4/2/11ss"),
        (ItemKind::Dimmer, "1/1/1, 4/2/10ss, <5.001:1/1/3+1/1/4"),
        (ItemKind::Rollershutter, "<4/2/10+0/2/10, 5.001:4/2/11+0/2/11"),
        (ItemKind::Rollershutter, "4/2/10, 4/2/10"),
        (ItemKind::Contact, "<1/0/1+1/0/2"),
        (ItemKind::Color, "1/3/0, 1/3/1, 1/3/2"),
        (ItemKind::String, "16.001:3/0/1"),
        (ItemKind::Switch, ""),
    ];

    for (kind, line) in cases {
        let item = Item::new("RoundTrip", kind);
        let parsed = parse_binding_config(&item, line).unwrap();
        let rendered = parsed.to_string();
        let reparsed = parse_binding_config(&item, &rendered).unwrap();
        assert_eq!(parsed, reparsed, "{} line {:?} → {:?}", kind, line, rendered);
        assert_eq!(rendered, reparsed.to_string());
    }
}

#[test]
fn test_binding_serializes_to_json() {
    let item = Item::new("Temp", ItemKind::Number);
    let binding = parse_binding_config(&item, "<(30)4/2/10+4/2/11").unwrap();
    let json = serde_json::to_value(&binding).unwrap();

    assert_eq!(json["item_name"], "Temp");
    assert_eq!(json["groups"][0]["main_address"], "4/2/10");
    assert_eq!(json["groups"][0]["readable_address"], "4/2/10");
    assert_eq!(json["groups"][0]["refresh_interval_secs"], 30);
    assert_eq!(json["groups"][0]["endpoints"][1]["role"], "state");
    assert_eq!(json["groups"][0]["endpoints"][0]["type_id"], "9.001");
}
