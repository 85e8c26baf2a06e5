//! Testing utilities for the scenario workspace
//!
//! Shared fixtures: a schema catalog, a three-VM scenario and helpers for
//! building IVSHMEM section values.

#![allow(missing_docs)]

use std::sync::Arc;

use scenario_model::{IvshmemRegion, IvshmemSlot, IvshmemTable, ScenarioConfig, VmId};
use scenario_schema::SchemaCatalog;
use scenario_store::ScenarioStore;
use serde_json::{json, Value};

pub const SERVICE_VM: VmId = VmId(0);
pub const POST_VM_1: VmId = VmId(1);
pub const POST_VM_2: VmId = VmId(2);

pub const SAMPLE_REGION: &str = "shm_region_0";

pub const SAMPLE_CATALOG_JSON: &str = r##"{
  "hv": {
    "DEBUG_OPTIONS": {
      "type": "object",
      "properties": {
        "BUILD_TYPE": {"type": "string", "enum": ["release", "debug"]},
        "SERIAL_CONSOLE": {"type": "string"}
      }
    },
    "FEATURES": {
      "type": "object",
      "properties": {"RDT": {"type": "boolean"}},
      "additionalProperties": true
    }
  },
  "vm": {
    "SERVICE_VM": {
      "name": {"type": "string"},
      "os_config": {
        "type": "object",
        "properties": {"kern_type": {"type": "string"}}
      }
    },
    "POST_LAUNCHED_VM": {
      "name": {"type": "string"},
      "FEATURES": {
        "type": "object",
        "properties": {
          "IVSHMEM": {
            "type": "object",
            "properties": {
              "IVSHMEM_REGION": {
                "type": "array",
                "items": {"$ref": "#/definitions/Region"}
              }
            }
          }
        },
        "definitions": {
          "Region": {
            "type": "object",
            "properties": {
              "NAME": {"type": "string"},
              "PROVIDED_BY": {"type": "string", "enum": ["Hypervisor", "Device Model"]},
              "IVSHMEM_SIZE": {"type": "string"},
              "IVSHMEM_VMS": {
                "type": "object",
                "properties": {
                  "IVSHMEM_VM": {
                    "type": "array",
                    "items": {
                      "type": "object",
                      "properties": {
                        "VM_NAME": {"type": "string"},
                        "VBDF": {"type": "string", "pattern": "^[0-9A-Fa-f]{2}:[0-9A-Fa-f]{2}\\.[0-9A-Fa-f]$"}
                      }
                    }
                  }
                }
              }
            },
            "additionalProperties": true
          }
        }
      }
    }
  }
}"##;

pub const SAMPLE_SCENARIO_JSON: &str = r#"{
  "hv": {
    "DEBUG_OPTIONS": {"BUILD_TYPE": "release", "SERIAL_CONSOLE": "/dev/ttyS0"},
    "FEATURES": {"RDT": false}
  },
  "vm": [
    {
      "@id": 0,
      "load_order": "SERVICE_VM",
      "hidden": {"load_order": "SERVICE_VM"},
      "name": "VM0",
      "os_config": {"kern_type": "KERNEL_BZIMAGE"}
    },
    {
      "@id": 1,
      "load_order": "POST_LAUNCHED_VM",
      "hidden": {"load_order": "POST_LAUNCHED_VM"},
      "name": "VM1"
    },
    {
      "@id": 2,
      "load_order": "POST_LAUNCHED_VM",
      "hidden": {"load_order": "POST_LAUNCHED_VM"},
      "name": "VM2",
      "FEATURES": {
        "IVSHMEM": {
          "IVSHMEM_REGION": [
            {
              "NAME": "shm_region_0",
              "PROVIDED_BY": "Hypervisor",
              "IVSHMEM_SIZE": "2",
              "IVSHMEM_VMS": {"IVSHMEM_VM": [{"VM_NAME": "VM1", "VBDF": "00:01.0"}]}
            }
          ]
        }
      }
    }
  ]
}"#;

pub fn sample_catalog() -> SchemaCatalog {
    SchemaCatalog::from_json(SAMPLE_CATALOG_JSON).unwrap()
}

pub fn sample_scenario() -> ScenarioConfig {
    ScenarioConfig::from_json(SAMPLE_SCENARIO_JSON).unwrap()
}

pub fn sample_store() -> ScenarioStore {
    ScenarioStore::new(Arc::new(sample_catalog()), sample_scenario())
}

/// The sample region with one `VM1 @ 00:01.0` slot
pub fn sample_region() -> IvshmemRegion {
    let mut region = IvshmemRegion::new(SAMPLE_REGION).with_slot(IvshmemSlot::new("VM1", "00:01.0"));
    region.provided_by = Some("Hypervisor".to_string());
    region.extra.insert("IVSHMEM_SIZE".to_string(), json!("2"));
    region
}

/// A `FEATURES` value holding the given regions
pub fn features_with_regions(regions: Vec<IvshmemRegion>) -> Value {
    let mut features = json!({});
    IvshmemTable { regions }.write_into(&mut features).unwrap();
    features
}

/// A `FEATURES` value holding one region with the given `(name, bdf)` slots
pub fn features_with_slots(slots: &[(&str, &str)]) -> Value {
    let region = slots
        .iter()
        .fold(IvshmemRegion::new(SAMPLE_REGION), |region, (name, bdf)| {
            region.with_slot(IvshmemSlot::new(*name, *bdf))
        });
    features_with_regions(vec![region])
}
