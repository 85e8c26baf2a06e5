//! Scenario CLI
//!
//! File-level driver around the binding engine: load a schema catalog and a
//! scenario from disk, resolve forms, apply renderer snapshots and check
//! virtual BDFs. Persistence stays here; the engine never touches files.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use scenario_model::{Bdf, LoadOrder, ModelError, ScenarioConfig, Target};
use scenario_schema::{LayoutOverrideEngine, SchemaCatalog};
use scenario_store::{ContextResolver, EngineConfig, FormSyncEngine, ScenarioStore, WriteOutcome};
use scenario_widgets::IvshmemGuard;
use serde_json::{json, Value};

/// Load a schema catalog; `.yaml`/`.yml` files are read as YAML, anything
/// else as JSON
///
/// # Errors
/// Returns error if the file cannot be read or is not a valid catalog
pub fn load_catalog(path: &Path) -> Result<SchemaCatalog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let catalog = if is_yaml {
        SchemaCatalog::from_yaml(&text)
    } else {
        SchemaCatalog::from_json(&text)
    };
    catalog.with_context(|| format!("parsing catalog {}", path.display()))
}

/// Load a scenario document
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    ScenarioConfig::from_json(&text).with_context(|| format!("parsing scenario {}", path.display()))
}

/// Load engine configuration, falling back to defaults without a file
///
/// # Errors
/// Returns error if the file cannot be read or is not valid TOML
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    EngineConfig::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Write a scenario as pretty JSON
///
/// # Errors
/// Returns error if serialization or the write fails
pub fn save_scenario(scenario: &ScenarioConfig, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(&scenario.to_value()?)?;
    fs::write(path, text).with_context(|| format!("writing scenario {}", path.display()))
}

/// Build a store from files on disk
///
/// # Errors
/// Returns error if either file fails to load
pub fn open_store(catalog: &Path, scenario: &Path, config: EngineConfig) -> Result<ScenarioStore> {
    let catalog = load_catalog(catalog)?;
    let scenario = load_scenario(scenario)?;
    tracing::info!(
        "Opened scenario with {} VMs against {} hypervisor sections",
        scenario.vm_count(),
        catalog.hypervisor_sections().count()
    );
    Ok(ScenarioStore::new(Arc::new(catalog), scenario).with_config(config))
}

/// Resolve a form and render it for the renderer
///
/// Returns `{"schema", "uiSchema", "formData"}`.
///
/// # Errors
/// Returns error if the target or section cannot be resolved
pub fn resolve_form(store: &ScenarioStore, raw_target: i64, section: &str) -> Result<Value> {
    let target = Target::from_raw(raw_target)?;
    let context = ContextResolver::from_config(store.config())
        .resolve(store, target, section)
        .with_context(|| format!("resolving {section} for {target}"))?;

    Ok(json!({
        "schema": context.schema,
        "uiSchema": context.ui_schema(),
        "formData": context.to_form_document(),
    }))
}

/// Apply a renderer snapshot with the IVSHMEM guard registered
///
/// # Errors
/// Returns error if the snapshot is malformed or refused
pub fn apply_snapshot(store: &mut ScenarioStore, snapshot: Value) -> Result<WriteOutcome> {
    let engine = FormSyncEngine::from_config(store.config()).with_guard(IvshmemGuard::new());
    let outcome = engine
        .apply_snapshot(store, snapshot)
        .context("applying form snapshot")?;
    if outcome == WriteOutcome::VmMissing {
        tracing::warn!("Snapshot targets no VM of its load order in the scenario; nothing written");
    }
    Ok(outcome)
}

/// Check BDF text against the `BB:DD.F` grammar
///
/// # Errors
/// [`ModelError::InvalidBdf`] for malformed text
pub fn check_bdf(text: &str) -> Result<Bdf, ModelError> {
    text.parse()
}

/// Ui schema for a section, without a scenario
///
/// `load_order` selects the VM family; `None` means hypervisor.
///
/// # Errors
/// Returns error if the catalog has no such section
pub fn ui_schema(
    catalog: &SchemaCatalog,
    load_order: Option<LoadOrder>,
    section: &str,
    config: &EngineConfig,
) -> Result<Value> {
    let schema = match load_order {
        None => catalog.hypervisor_schema(section),
        Some(order) => catalog.vm_schema(order, section),
    }
    .with_context(|| match load_order {
        None => format!("no hypervisor schema for {section}"),
        Some(order) => format!("no {order} schema for {section}"),
    })?;

    let layout = LayoutOverrideEngine::new()
        .with_hide_additional(config.hide_additional_properties)
        .overrides_for(section, schema);
    Ok(layout.to_ui_schema())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_bdf_grammar() {
        assert_eq!(check_bdf("00:1F.7").unwrap(), Bdf::new(0, 0x1f, 7));
        assert!(check_bdf("00:1F").is_err());
        assert!(check_bdf(" 00:1F.7").is_err());
    }

    #[test]
    fn missing_config_path_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }
}
