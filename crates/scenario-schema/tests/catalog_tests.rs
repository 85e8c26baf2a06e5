use pretty_assertions::assert_eq;
use scenario_model::LoadOrder;
use scenario_schema::{CatalogError, LayoutOverrideEngine, PathSegment, WidgetKind};
use scenario_test_utils::{features_with_slots, sample_catalog, sample_scenario};
use serde_json::json;

fn key(name: &str) -> PathSegment {
    PathSegment::Key(name.to_string())
}

#[test]
fn test_sample_catalog_families() {
    let catalog = sample_catalog();
    assert_eq!(
        catalog.hypervisor_sections().collect::<Vec<_>>(),
        vec!["DEBUG_OPTIONS", "FEATURES"]
    );
    assert_eq!(
        catalog.vm_sections(LoadOrder::PostLaunched).collect::<Vec<_>>(),
        vec!["FEATURES", "name"]
    );
    assert!(catalog.vm_schema(LoadOrder::Service, "FEATURES").is_none());
    assert!(catalog.vm_schema(LoadOrder::PreLaunched, "name").is_none());
}

#[test]
fn test_sample_scenario_validates() {
    let catalog = sample_catalog();
    let scenario = sample_scenario();

    for (section, value) in scenario.hypervisor() {
        catalog.validate_section(None, section, value).unwrap();
    }
    for vm in scenario.vms() {
        for (section, value) in vm.sections() {
            catalog
                .validate_section(Some(vm.load_order()), section, value)
                .unwrap();
        }
    }
}

#[test]
fn test_live_validation_catches_bad_bdf_pattern() {
    let catalog = sample_catalog();
    let value = features_with_slots(&[("VM1", "zz:01.0")]);

    let err = catalog
        .validate_section(Some(LoadOrder::PostLaunched), "FEATURES", &value)
        .unwrap_err();
    let CatalogError::Violations(violations) = err else {
        panic!("expected violations, got {err:?}");
    };
    assert_eq!(violations.len(), 1);
    assert!(violations[0].starts_with("/IVSHMEM/IVSHMEM_REGION/0/IVSHMEM_VMS/IVSHMEM_VM/0/VBDF"));
}

#[test]
fn test_layout_for_features_schema() {
    let catalog = sample_catalog();
    let schema = catalog.vm_schema(LoadOrder::PostLaunched, "FEATURES").unwrap();
    let hints = LayoutOverrideEngine::new().overrides_for("FEATURES", schema);

    let slot_path = [
        key("IVSHMEM"),
        key("IVSHMEM_REGION"),
        PathSegment::Items,
        key("IVSHMEM_VMS"),
        key("IVSHMEM_VM"),
        PathSegment::Items,
    ];
    let slot = hints.get(&slot_path).unwrap();
    assert_eq!(slot.widget_for_key("VM_NAME"), WidgetKind::VmNameSelector);
    assert_eq!(slot.widget_for_key("VBDF"), WidgetKind::BdfTextField);

    // Region definitions allow extra keys; those render hidden.
    let region = hints.get(&slot_path[..3]).unwrap();
    assert_eq!(region.widget_for_key("IVSHMEM_SIZE_EXTRA"), WidgetKind::Hidden);
}

#[test]
fn test_hypervisor_ui_schema() {
    let catalog = sample_catalog();
    let schema = catalog.hypervisor_schema("DEBUG_OPTIONS").unwrap();
    let ui = LayoutOverrideEngine::new()
        .overrides_for("DEBUG_OPTIONS", schema)
        .to_ui_schema();
    assert_eq!(ui, json!({"BUILD_TYPE": {"ui:widget": "radio"}}));

    let features = catalog.hypervisor_schema("FEATURES").unwrap();
    let ui = LayoutOverrideEngine::new().overrides_for("FEATURES", features).to_ui_schema();
    assert_eq!(ui, json!({"additionalProperties": {"ui:widget": "hidden"}}));

    let ui = LayoutOverrideEngine::new()
        .with_hide_additional(false)
        .overrides_for("FEATURES", features)
        .to_ui_schema();
    assert_eq!(ui, json!({}));
}
