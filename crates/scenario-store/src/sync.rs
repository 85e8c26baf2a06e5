//! Form write-back
//!
//! [`FormSyncEngine`] turns one renderer snapshot into exactly one section
//! replace on the [`ScenarioStore`]. No schema validation happens on this
//! path; keys the schema does not declare pass through unchanged.

use scenario_model::{LoadOrder, Target, ValidationFailure, VmId};
use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::error::SyncError;
use crate::store::{ScenarioStore, WriteOutcome};

/// One user edit, tagged with the form identity it came from
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    /// Hypervisor or VM
    pub target: Target,
    /// Section being replaced
    pub section: String,
    /// Schema family of the VM; ignored for the hypervisor
    pub load_order: Option<LoadOrder>,
    /// Renderer snapshot holding the section value under `section`
    pub payload: Value,
}

impl EditRequest {
    /// Edit of a hypervisor section
    #[must_use]
    pub fn hypervisor(section: impl Into<String>, value: Value) -> Self {
        let section = section.into();
        Self {
            target: Target::Hypervisor,
            payload: wrap(&section, value),
            section,
            load_order: None,
        }
    }

    /// Edit of a VM section
    #[must_use]
    pub fn vm(id: VmId, load_order: LoadOrder, section: impl Into<String>, value: Value) -> Self {
        let section = section.into();
        Self {
            target: Target::Vm(id),
            payload: wrap(&section, value),
            section,
            load_order: Some(load_order),
        }
    }

    /// Decode the renderer's raw snapshot
    ///
    /// Expects `{"VMID": n, "mode": section, "load_order"?: ..., ...}`; the
    /// whole document becomes the payload.
    ///
    /// # Errors
    /// [`SyncError::InvalidSnapshot`] if an identity field is missing or
    /// has the wrong type
    pub fn from_form_document(document: Value) -> Result<Self, SyncError> {
        let raw_target = document
            .get("VMID")
            .and_then(Value::as_i64)
            .ok_or_else(|| SyncError::InvalidSnapshot("missing integer 'VMID'".to_string()))?;
        let target =
            Target::from_raw(raw_target).map_err(|e| SyncError::InvalidSnapshot(e.to_string()))?;

        let section = document
            .get("mode")
            .and_then(Value::as_str)
            .ok_or_else(|| SyncError::InvalidSnapshot("missing string 'mode'".to_string()))?
            .to_string();

        let load_order = match document.get("load_order") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(
                text.parse::<LoadOrder>()
                    .map_err(|e| SyncError::InvalidSnapshot(e.to_string()))?,
            ),
            Some(other) => {
                return Err(SyncError::InvalidSnapshot(format!(
                    "'load_order' must be a string, got {other}"
                )))
            }
        };

        Ok(Self {
            target,
            section,
            load_order,
            payload: document,
        })
    }

    /// Section value carried by the payload
    #[inline]
    #[must_use]
    pub fn section_value(&self) -> Option<&Value> {
        self.payload.get(&self.section)
    }
}

fn wrap(section: &str, value: Value) -> Value {
    let mut payload = Map::new();
    payload.insert(section.to_string(), value);
    Value::Object(payload)
}

/// Cross-field check run on a section value before it is written
///
/// Guards are the write-path backstop for resource invariants that widgets
/// enforce interactively. A guard ignores sections it does not own.
pub trait SectionGuard: Send + Sync {
    /// Guard name used in rejections and logs
    fn name(&self) -> &'static str;

    /// Check a section value about to be written for `target`
    ///
    /// # Errors
    /// The first rule the value breaks
    fn check(&self, target: Target, section: &str, value: &Value) -> Result<(), ValidationFailure>;
}

/// Applies [`EditRequest`]s to a [`ScenarioStore`]
pub struct FormSyncEngine {
    guards: Vec<Box<dyn SectionGuard>>,
    enforce_guards: bool,
}

impl Default for FormSyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FormSyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSyncEngine")
            .field("guards", &self.guard_names())
            .field("enforce_guards", &self.enforce_guards)
            .finish()
    }
}

impl FormSyncEngine {
    /// Create an engine with no guards
    #[must_use]
    pub fn new() -> Self {
        Self {
            guards: Vec::new(),
            enforce_guards: true,
        }
    }

    /// Create an engine honoring engine configuration
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            guards: Vec::new(),
            enforce_guards: config.enforce_resource_guards,
        }
    }

    /// Register a guard; guards run in registration order
    #[must_use]
    pub fn with_guard(mut self, guard: impl SectionGuard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    /// Names of registered guards
    #[must_use]
    pub fn guard_names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|g| g.name()).collect()
    }

    /// Replace one section with the edit's value
    ///
    /// Nothing is written unless every guard accepts the value. A VM edit
    /// carrying a load order only reaches a VM of that family.
    ///
    /// # Errors
    /// - [`SyncError::MissingSectionPayload`] if the payload lacks the section
    /// - [`SyncError::Rejected`] if a guard refuses the value
    /// - [`SyncError::Store`] if the store refuses the write
    pub fn apply(&self, store: &mut ScenarioStore, edit: &EditRequest) -> Result<WriteOutcome, SyncError> {
        let value = edit
            .section_value()
            .ok_or_else(|| SyncError::MissingSectionPayload(edit.section.clone()))?;

        if self.enforce_guards {
            for guard in &self.guards {
                if let Err(failure) = guard.check(edit.target, &edit.section, value) {
                    tracing::warn!(
                        "Guard {} rejected section {} for {}: {}",
                        guard.name(),
                        edit.section,
                        edit.target,
                        failure
                    );
                    return Err(SyncError::Rejected {
                        guard: guard.name(),
                        failure,
                    });
                }
            }
        }

        tracing::debug!("Applying section {} for {}", edit.section, edit.target);

        let outcome = match edit.target {
            Target::Hypervisor => {
                store.set_hypervisor_section(&edit.section, value.clone())?;
                WriteOutcome::Applied
            }
            Target::Vm(id) => match edit.load_order {
                Some(order) => store.set_vm_section_in(id, order, &edit.section, value.clone())?,
                None => store.set_vm_section(id, &edit.section, value.clone())?,
            },
        };
        Ok(outcome)
    }

    /// Decode a renderer snapshot and apply it
    ///
    /// # Errors
    /// As [`EditRequest::from_form_document`] and [`FormSyncEngine::apply`]
    pub fn apply_snapshot(&self, store: &mut ScenarioStore, snapshot: Value) -> Result<WriteOutcome, SyncError> {
        let edit = EditRequest::from_form_document(snapshot)?;
        self.apply(store, &edit)
    }
}
