//! Section schema catalog
//!
//! A pure lookup table populated once at startup:
//! - `hv`: section name → JSON-Schema
//! - `vm`: load order → section name → JSON-Schema
//!
//! Every schema is compiled with `jsonschema` when the catalog is built so a
//! malformed document fails at load rather than at first render. The compiled
//! validators are kept for live validation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use jsonschema::JSONSchema;
use scenario_model::LoadOrder;
use serde_json::Value;

use crate::error::CatalogError;

/// Read-only schema lookup for hypervisor and VM sections
#[derive(Clone, Default)]
pub struct SchemaCatalog {
    hypervisor: BTreeMap<String, Value>,
    vms: BTreeMap<LoadOrder, BTreeMap<String, Value>>,
    /// Keyed by location (`hv/<SECTION>`, `vm/<LOAD_ORDER>/<SECTION>`)
    compiled: BTreeMap<String, Arc<JSONSchema>>,
}

impl fmt::Debug for SchemaCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCatalog")
            .field("hypervisor", &self.hypervisor)
            .field("vms", &self.vms)
            .field("compiled", &self.compiled.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PartialEq for SchemaCatalog {
    fn eq(&self, other: &Self) -> bool {
        self.hypervisor == other.hypervisor && self.vms == other.vms
    }
}

impl SchemaCatalog {
    /// Start building a catalog
    #[inline]
    #[must_use]
    pub fn builder() -> SchemaCatalogBuilder {
        SchemaCatalogBuilder::default()
    }

    /// Parse a catalog document from JSON
    ///
    /// # Errors
    /// Returns error if the document is invalid or a schema does not compile
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a catalog document from YAML
    ///
    /// # Errors
    /// Returns error if the document is invalid or a schema does not compile
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Build from a catalog document `{"hv": {...}, "vm": {LOAD_ORDER: {...}}}`
    ///
    /// # Errors
    /// Returns error if the document has the wrong shape, names an unknown
    /// load order, or a schema does not compile
    pub fn from_value(document: Value) -> Result<Self, CatalogError> {
        let Value::Object(mut root) = document else {
            return Err(CatalogError::Malformed("catalog root must be an object".to_string()));
        };

        let mut builder = Self::builder();

        if let Some(hv) = root.remove("hv") {
            for (section, schema) in into_object(hv, "hv")? {
                builder = builder.hypervisor_section(section, schema);
            }
        }

        if let Some(vm) = root.remove("vm") {
            for (order, sections) in into_object(vm, "vm")? {
                let load_order: LoadOrder = order
                    .parse()
                    .map_err(|e: scenario_model::ModelError| CatalogError::Malformed(e.to_string()))?;
                builder = builder.load_order(load_order);
                for (section, schema) in into_object(sections, &format!("vm/{order}"))? {
                    builder = builder.vm_section(load_order, section, schema);
                }
            }
        }

        builder.build()
    }

    /// Schema for a hypervisor section
    #[inline]
    #[must_use]
    pub fn hypervisor_schema(&self, section: &str) -> Option<&Value> {
        self.hypervisor.get(section)
    }

    /// Schema for a VM section of the given class
    #[inline]
    #[must_use]
    pub fn vm_schema(&self, load_order: LoadOrder, section: &str) -> Option<&Value> {
        self.vms.get(&load_order).and_then(|sections| sections.get(section))
    }

    /// Check if a hypervisor section is known
    #[inline]
    #[must_use]
    pub fn has_hypervisor_section(&self, section: &str) -> bool {
        self.hypervisor.contains_key(section)
    }

    /// Hypervisor section names
    pub fn hypervisor_sections(&self) -> impl Iterator<Item = &str> {
        self.hypervisor.keys().map(String::as_str)
    }

    /// VM section names for a load order
    pub fn vm_sections(&self, load_order: LoadOrder) -> impl Iterator<Item = &str> {
        self.vms
            .get(&load_order)
            .into_iter()
            .flat_map(|sections| sections.keys().map(String::as_str))
    }

    /// Load orders with at least a (possibly empty) schema family
    pub fn load_orders(&self) -> impl Iterator<Item = LoadOrder> + '_ {
        self.vms.keys().copied()
    }

    /// Validate a section value against its schema
    ///
    /// For the rendering layer's live validation; the write path never calls
    /// this. `load_order` selects the VM family, `None` means hypervisor.
    ///
    /// # Errors
    /// [`CatalogError::NotFound`] if no schema applies,
    /// [`CatalogError::Violations`] listing every failure otherwise
    pub fn validate_section(
        &self,
        load_order: Option<LoadOrder>,
        section: &str,
        value: &Value,
    ) -> Result<(), CatalogError> {
        let (schema, location) = match load_order {
            None => (self.hypervisor_schema(section), hypervisor_location(section)),
            Some(order) => (self.vm_schema(order, section), vm_location(order, section)),
        };
        let schema = schema.ok_or_else(|| CatalogError::NotFound(location.clone()))?;

        let compiled = match self.compiled.get(&location) {
            Some(compiled) => Arc::clone(compiled),
            None => Arc::new(compile(schema, &location)?),
        };
        let violations: Vec<String> = match compiled.validate(value) {
            Ok(()) => return Ok(()),
            Err(errors) => errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        format!("<root>: {e}")
                    } else {
                        format!("{path}: {e}")
                    }
                })
                .collect(),
        };
        Err(CatalogError::Violations(violations))
    }
}

/// Builder for [`SchemaCatalog`]
#[derive(Debug, Default)]
pub struct SchemaCatalogBuilder {
    catalog: SchemaCatalog,
}

impl SchemaCatalogBuilder {
    /// Register a hypervisor section schema
    #[must_use]
    pub fn hypervisor_section(mut self, section: impl Into<String>, schema: Value) -> Self {
        self.catalog.hypervisor.insert(section.into(), schema);
        self
    }

    /// Register a VM section schema for a load order
    #[must_use]
    pub fn vm_section(mut self, load_order: LoadOrder, section: impl Into<String>, schema: Value) -> Self {
        self.catalog
            .vms
            .entry(load_order)
            .or_default()
            .insert(section.into(), schema);
        self
    }

    /// Declare a load order even if it has no sections
    #[must_use]
    pub fn load_order(mut self, load_order: LoadOrder) -> Self {
        self.catalog.vms.entry(load_order).or_default();
        self
    }

    /// Compile every schema and freeze the catalog
    ///
    /// # Errors
    /// Returns [`CatalogError::InvalidSchema`] for the first schema that does
    /// not compile
    pub fn build(self) -> Result<SchemaCatalog, CatalogError> {
        let mut catalog = self.catalog;

        let mut compiled = BTreeMap::new();
        for (section, schema) in &catalog.hypervisor {
            let location = hypervisor_location(section);
            compiled.insert(location.clone(), Arc::new(compile(schema, &location)?));
        }
        for (order, sections) in &catalog.vms {
            for (section, schema) in sections {
                let location = vm_location(*order, section);
                compiled.insert(location.clone(), Arc::new(compile(schema, &location)?));
            }
        }
        catalog.compiled = compiled;

        tracing::info!(
            "Schema catalog loaded: {} hypervisor section(s), {} load order(s)",
            catalog.hypervisor.len(),
            catalog.vms.len()
        );
        Ok(catalog)
    }
}

fn hypervisor_location(section: &str) -> String {
    format!("hv/{section}")
}

fn vm_location(load_order: LoadOrder, section: &str) -> String {
    format!("vm/{load_order}/{section}")
}

fn compile(schema: &Value, location: &str) -> Result<JSONSchema, CatalogError> {
    JSONSchema::compile(schema).map_err(|e| CatalogError::invalid_schema(location, e.to_string()))
}

fn into_object(value: Value, location: &str) -> Result<serde_json::Map<String, Value>, CatalogError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CatalogError::Malformed(format!(
            "{location} must be an object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
