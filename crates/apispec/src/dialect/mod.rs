//! The two supported dialects and the interface they share.

pub mod common;
pub mod openapi3;
pub mod swagger2;

use serde_json::Value;

use crate::error::Error;
use crate::model::Specification;

/// One document convention: how to recognize it, how to normalize it, and
/// (when supported) how to emit it.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this dialect claims the document, judged from its declared
    /// version key and major version.
    fn is_adequate(&self, root: &Value) -> bool;

    /// Builds the canonical model from a validated field tree.
    fn build(&self, root: &Value) -> Result<Specification, Error>;

    /// Projects the canonical model back into this dialect's document shape.
    fn project(&self, _spec: &Specification) -> Result<Value, Error> {
        Err(Error::EmissionUnsupported(self.name().to_string()))
    }
}

/// The text before the first `.` of a version string.
pub(crate) fn major_version(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_version_is_the_first_segment() {
        assert_eq!(major_version("2.0"), "2");
        assert_eq!(major_version("3.1.0"), "3");
        assert_eq!(major_version("3"), "3");
    }
}
