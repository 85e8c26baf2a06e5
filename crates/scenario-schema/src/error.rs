//! Error types for the schema layer

/// Errors while loading or querying the schema catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Catalog document is not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Catalog document is not valid YAML
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Catalog document has the wrong shape
    #[error("malformed catalog: {0}")]
    Malformed(String),

    /// A section schema does not compile
    #[error("invalid schema at {location}: {message}")]
    InvalidSchema {
        /// `hv/<SECTION>` or `vm/<LOAD_ORDER>/<SECTION>`
        location: String,
        /// Compiler message
        message: String,
    },

    /// No schema registered for the requested section
    #[error("no schema for section: {0}")]
    NotFound(String),

    /// Value does not satisfy the section schema
    #[error("{} schema violation(s): {}", .0.len(), .0.join("; "))]
    Violations(Vec<String>),
}

impl CatalogError {
    /// Create invalid schema error for a location
    pub fn invalid_schema(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            location: location.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = CatalogError::NotFound("MEMORY".to_string());
        assert_eq!(err.to_string(), "no schema for section: MEMORY");
    }

    #[test]
    fn violations_display() {
        let err = CatalogError::Violations(vec!["/a: bad".to_string(), "/b: worse".to_string()]);
        assert_eq!(err.to_string(), "2 schema violation(s): /a: bad; /b: worse");
    }
}
