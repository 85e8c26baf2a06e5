use std::collections::HashSet;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use scenario_model::{Bdf, IvshmemRegion, IvshmemSlot, IvshmemTable, LoadOrder, Target, ValidationFailure};
use scenario_store::{ContextResolver, EditRequest, FormSyncEngine, SyncError, WriteOutcome};
use scenario_test_utils::{features_with_slots, sample_region, sample_store, POST_VM_2, SAMPLE_REGION};
use scenario_widgets::{BdfTextField, IvshmemGuard, RegionEditor, SlotState, VmNameSelector};

fn guarded_engine() -> FormSyncEngine {
    FormSyncEngine::new().with_guard(IvshmemGuard::new())
}

#[test]
fn test_duplicate_vm1_slot_rejected() {
    let store = sample_store();
    let context = ContextResolver::new()
        .resolve(&store, Target::Vm(POST_VM_2), "FEATURES")
        .unwrap();
    assert_eq!(context.form_data.load_order, Some(LoadOrder::PostLaunched));

    let table = IvshmemTable::from_section(&context.form_data.value).unwrap().unwrap();
    let mut region = table.region(SAMPLE_REGION).unwrap().clone();
    let before = region.clone();

    let err = region.try_push_slot(IvshmemSlot::new("VM1", "00:02.0")).unwrap_err();
    assert_eq!(
        err.failure(),
        Some(&ValidationFailure::DuplicateVmName {
            region: SAMPLE_REGION.to_string(),
            name: "VM1".to_string(),
        })
    );
    assert_eq!(region, before);
    assert_eq!(region, sample_region());
}

#[test]
fn test_guard_blocks_duplicate_write() {
    let mut store = sample_store();
    let before = store.origin_scenario_data().clone();

    let features = features_with_slots(&[("VM1", "00:01.0"), ("VM1", "00:02.0")]);
    let edit = EditRequest::vm(POST_VM_2, LoadOrder::PostLaunched, "FEATURES", features);

    let err = guarded_engine().apply(&mut store, &edit).unwrap_err();
    assert!(matches!(
        err,
        SyncError::Rejected {
            guard: "ivshmem",
            failure: ValidationFailure::DuplicateVmName { .. }
        }
    ));
    assert_eq!(store.origin_scenario_data(), &before);
}

#[test]
fn test_add_slot_end_to_end() {
    let mut store = sample_store();
    let resolver = ContextResolver::new();
    let context = resolver.resolve(&store, Target::Vm(POST_VM_2), "FEATURES").unwrap();

    let mut value = context.form_data.value.clone();
    let mut table = IvshmemTable::from_section(&value).unwrap().unwrap();
    let region = table.region_mut(SAMPLE_REGION).unwrap();

    // New slot is built through the widgets, then pushed once complete.
    region.slots_mut().push(IvshmemSlot::default());
    let selector = VmNameSelector::new(store.origin_scenario_data());
    assert_eq!(selector.available(region, 1), vec!["VM0", "VM2"]);
    assert_eq!(selector.select(region, 1, "VM0"), Ok(SlotState::PartiallyFilled));
    let mut field = BdfTextField::from_slot(&region.slots()[1]);
    assert_eq!(field.input("00:02.0", region, 1), Ok(SlotState::Valid));
    assert!(region.validate_slots().is_ok());

    table.write_into(&mut value).unwrap();
    let edit = EditRequest::vm(POST_VM_2, LoadOrder::PostLaunched, "FEATURES", value.clone());
    assert_eq!(guarded_engine().apply(&mut store, &edit), Ok(WriteOutcome::Applied));

    let stored = store.vm_section(POST_VM_2, "FEATURES").unwrap();
    assert_eq!(stored, &value);
    let stored_table = IvshmemTable::from_section(stored).unwrap().unwrap();
    let slots = stored_table.region(SAMPLE_REGION).unwrap().slots();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[1], IvshmemSlot::new("VM0", "00:02.0"));
    // Pass-through keys survive the round trip.
    assert_eq!(
        stored["IVSHMEM"]["IVSHMEM_REGION"][0]["IVSHMEM_SIZE"],
        serde_json::json!("2")
    );
}

#[test]
fn test_incomplete_slot_never_reaches_store() {
    let mut store = sample_store();
    let before = store.origin_scenario_data().clone();

    let features = features_with_slots(&[("VM1", "00:01.0"), ("VM0", "")]);
    let edit = EditRequest::vm(POST_VM_2, LoadOrder::PostLaunched, "FEATURES", features);

    assert!(guarded_engine().apply(&mut store, &edit).is_err());
    assert_eq!(store.origin_scenario_data(), &before);
}

fn features_with_raw_slots(slots: Value) -> Value {
    json!({
        "IVSHMEM": {
            "IVSHMEM_REGION": [{
                "NAME": SAMPLE_REGION,
                "PROVIDED_BY": "Hypervisor",
                "IVSHMEM_VMS": {"IVSHMEM_VM": slots}
            }]
        }
    })
}

#[test]
fn test_irregular_slots_never_reach_store() {
    let cases = [
        json!([
            {"VM_NAME": "VM1", "VBDF": "00:01.0"},
            {"VM_NAME": "VM1", "VBDF": "00:01.0"},
            {"VM_NAME": "VM0", "VBDF": null}
        ]),
        json!({"VM_NAME": "VM1", "VBDF": "zz"}),
        json!([{"VM_NAME": "VM1", "VBDF": 1}]),
        json!([{"VM_NAME": "VM1"}]),
        json!("VM1"),
    ];

    for slots in cases {
        let mut store = sample_store();
        let before = store.origin_scenario_data().clone();
        let features = features_with_raw_slots(slots.clone());
        let edit = EditRequest::vm(POST_VM_2, LoadOrder::PostLaunched, "FEATURES", features);

        assert!(
            matches!(
                guarded_engine().apply(&mut store, &edit),
                Err(SyncError::Rejected { guard: "ivshmem", .. })
            ),
            "accepted {slots}"
        );
        assert_eq!(store.origin_scenario_data(), &before);
    }
}

#[test]
fn test_single_valid_slot_object_is_written() {
    let mut store = sample_store();
    let features = features_with_raw_slots(json!({"VM_NAME": "VM1", "VBDF": "00:01.0"}));
    let edit = EditRequest::vm(POST_VM_2, LoadOrder::PostLaunched, "FEATURES", features.clone());

    assert_eq!(guarded_engine().apply(&mut store, &edit), Ok(WriteOutcome::Applied));
    assert_eq!(store.vm_section(POST_VM_2, "FEATURES").unwrap(), &features);
}

#[derive(Debug, Clone)]
enum SlotEdit {
    Push(String, String),
    Select(usize, String),
    Input(usize, String),
}

fn vm_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["VM0", "VM1", "VM2", "VM3"]).prop_map(str::to_string)
}

fn bdf_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => (0u8..3, 0u8..4, 0u8..2).prop_map(|(b, d, f)| format!("{b:02x}:{d:02X}.{f}")),
        1 => "[0-9a-fA-F:.]{0,9}",
    ]
}

fn slot_edit() -> impl Strategy<Value = SlotEdit> {
    prop_oneof![
        (vm_name(), bdf_text()).prop_map(|(n, b)| SlotEdit::Push(n, b)),
        (0usize..6, vm_name()).prop_map(|(i, n)| SlotEdit::Select(i, n)),
        (0usize..6, bdf_text()).prop_map(|(i, b)| SlotEdit::Input(i, b)),
    ]
}

fn field_value(text: impl Strategy<Value = String>) -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        6 => text.prop_map(|t| Some(Value::from(t))),
        1 => Just(Some(Value::Null)),
        1 => any::<u8>().prop_map(|n| Some(Value::from(n))),
        1 => Just(None),
    ]
}

fn raw_slot() -> impl Strategy<Value = Value> {
    (field_value(vm_name()), field_value(bdf_text())).prop_map(|(name, bdf)| {
        let mut slot = serde_json::Map::new();
        if let Some(name) = name {
            slot.insert("VM_NAME".to_string(), name);
        }
        if let Some(bdf) = bdf {
            slot.insert("VBDF".to_string(), bdf);
        }
        Value::Object(slot)
    })
}

fn raw_slot_list() -> impl Strategy<Value = Value> {
    (prop::collection::vec(raw_slot(), 0..5), any::<bool>()).prop_map(|(mut slots, collapse)| {
        if collapse && slots.len() == 1 {
            slots.remove(0)
        } else {
            Value::Array(slots)
        }
    })
}

fn assert_region_invariants(region: &IvshmemRegion) -> Result<(), TestCaseError> {
    let mut names = HashSet::new();
    let mut bdfs = HashSet::new();
    for slot in region.slots() {
        if !slot.vm_name.is_empty() {
            prop_assert!(names.insert(slot.vm_name.clone()), "duplicate name {}", slot.vm_name);
        }
        if !slot.bdf.is_empty() {
            let bdf: Bdf = slot.bdf.parse().map_err(|_| {
                TestCaseError::fail(format!("malformed BDF committed: {}", slot.bdf))
            })?;
            prop_assert!(bdfs.insert(bdf), "duplicate BDF {}", bdf);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_edits_keep_region_invariants(edits in prop::collection::vec(slot_edit(), 1..40)) {
        let selector = VmNameSelector::with_options(["VM0", "VM1", "VM2", "VM3"]);
        let mut region = sample_region();

        for edit in edits {
            match edit {
                SlotEdit::Push(name, bdf) => {
                    let _ = region.try_push_slot(IvshmemSlot::new(name, bdf));
                }
                SlotEdit::Select(index, name) => {
                    let _ = selector.select(&mut region, index, &name);
                }
                SlotEdit::Input(index, text) => {
                    let before = region.slots().get(index).map(|s| s.bdf.clone());
                    let mut field = BdfTextField::default();
                    if field.input(&text, &mut region, index).is_err() {
                        prop_assert_eq!(region.slots().get(index).map(|s| s.bdf.clone()), before);
                        prop_assert_eq!(field.committed(), "");
                    }
                }
            }
            assert_region_invariants(&region)?;
            prop_assert!(region.validate_slots().is_ok());
        }
    }

    #[test]
    fn prop_malformed_text_never_commits(text in "\\PC{0,12}") {
        prop_assume!(!Bdf::is_well_formed(&text));
        let mut region = sample_region();
        let mut field = BdfTextField::from_slot(&region.slots()[0]);

        let result = field.input(&text, &mut region, 0);
        prop_assert!(result.is_err());
        prop_assert_eq!(field.committed(), "00:01.0");
        prop_assert_eq!(field.error(), Some(&ValidationFailure::MalformedBdf(text.clone())));
        prop_assert_eq!(region, sample_region());
    }

    #[test]
    fn prop_guard_agrees_with_region_editor(
        slots in prop::collection::vec((vm_name(), bdf_text()), 0..6)
    ) {
        let pairs: Vec<(&str, &str)> = slots.iter().map(|(n, b)| (n.as_str(), b.as_str())).collect();
        let features = features_with_slots(&pairs);
        let table = IvshmemTable::from_section(&features).unwrap().unwrap();
        let region = &table.regions[0];

        let mut store = sample_store();
        let edit = EditRequest::vm(POST_VM_2, LoadOrder::PostLaunched, "FEATURES", features.clone());
        let applied = guarded_engine().apply(&mut store, &edit).is_ok();

        prop_assert_eq!(applied, region.validate_slots().is_ok());
    }

    #[test]
    fn prop_guard_commits_only_valid_slots(slots in raw_slot_list()) {
        let mut store = sample_store();
        let before = store.origin_scenario_data().clone();
        let features = features_with_raw_slots(slots);
        let edit = EditRequest::vm(POST_VM_2, LoadOrder::PostLaunched, "FEATURES", features);

        match guarded_engine().apply(&mut store, &edit) {
            Ok(outcome) => {
                prop_assert_eq!(outcome, WriteOutcome::Applied);
                let stored = store.vm_section(POST_VM_2, "FEATURES").unwrap();
                let table = IvshmemTable::from_section(stored).unwrap().unwrap();
                for region in &table.regions {
                    assert_region_invariants(region)?;
                    for slot in region.slots() {
                        prop_assert!(!slot.vm_name.is_empty() && !slot.bdf.is_empty());
                    }
                }
            }
            Err(err) => {
                let rejected = matches!(err, SyncError::Rejected { .. });
                prop_assert!(rejected);
                prop_assert_eq!(store.origin_scenario_data(), &before);
            }
        }
    }
}
