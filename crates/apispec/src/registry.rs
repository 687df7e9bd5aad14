//! Dialect selection.

use serde_json::Value;

use crate::dialect::{openapi3::OpenApi3, swagger2::Swagger2, Dialect};
use crate::error::Error;

/// Ordered list of registered dialects.
///
/// Populated once at startup and read-only afterwards; one registry can be
/// shared across any number of concurrent build or projection sessions.
pub struct DialectRegistry {
    dialects: Vec<Box<dyn Dialect>>,
}

impl DialectRegistry {
    pub fn new() -> Self {
        Self { dialects: Vec::new() }
    }

    /// A registry holding both supported dialects, older first.
    pub fn with_default_dialects() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Swagger2));
        registry.register(Box::new(OpenApi3));
        registry
    }

    pub fn register(&mut self, dialect: Box<dyn Dialect>) {
        self.dialects.push(dialect);
    }

    /// Returns the first registered dialect whose adequacy predicate matches
    /// the document.
    pub fn select(&self, root: &Value) -> Result<&dyn Dialect, Error> {
        self.dialects
            .iter()
            .find(|dialect| dialect.is_adequate(root))
            .map(Box::as_ref)
            .ok_or(Error::DialectNotRecognized)
    }

    /// Explicit lookup by dialect name, for output targeting.
    pub fn select_by_name(&self, name: &str) -> Result<&dyn Dialect, Error> {
        self.dialects
            .iter()
            .find(|dialect| dialect.name() == name)
            .map(Box::as_ref)
            .ok_or_else(|| Error::UnknownDialect(name.to_string()))
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::with_default_dialects()
    }
}
