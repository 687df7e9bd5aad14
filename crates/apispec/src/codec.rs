//! Text codec boundary.
//!
//! Everything inside the crate works on a generic field tree
//! ([`serde_json::Value`]); this module is the only place that touches raw
//! text. Formats are keyed by content type, JSON as `application/json` and
//! YAML as `text/yaml`.

use serde_json::Value;

use crate::error::Error;
use crate::model::Specification;
use crate::registry::DialectRegistry;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_YAML: &str = "text/yaml";

/// Decodes raw text into a generic field tree.
pub fn decode_document(content_type: &str, input: &str) -> Result<Value, Error> {
    match content_type {
        CONTENT_TYPE_JSON => {
            serde_json::from_str(input).map_err(|e| Error::Decode(e.to_string()))
        }
        CONTENT_TYPE_YAML => {
            serde_yaml::from_str(input).map_err(|e| Error::Decode(e.to_string()))
        }
        other => Err(Error::UnknownContentType(other.to_string())),
    }
}

/// Encodes an emitted field tree back into text.
pub fn encode_document(content_type: &str, document: &Value) -> Result<String, Error> {
    match content_type {
        CONTENT_TYPE_JSON => {
            serde_json::to_string_pretty(document).map_err(|e| Error::Encode(e.to_string()))
        }
        CONTENT_TYPE_YAML => {
            serde_yaml::to_string(document).map_err(|e| Error::Encode(e.to_string()))
        }
        other => Err(Error::UnknownContentType(other.to_string())),
    }
}

/// Decodes the input, sniffs its dialect against the registry and builds the
/// canonical model in one step.
pub fn specification_from_str(
    registry: &DialectRegistry,
    content_type: &str,
    input: &str,
) -> Result<Specification, Error> {
    let root = decode_document(content_type, input)?;
    let dialect = registry.select(&root)?;
    dialect.build(&root)
}

/// Projects the model through the named dialect and encodes the result.
pub fn specification_to_string(
    registry: &DialectRegistry,
    content_type: &str,
    dialect_name: &str,
    spec: &Specification,
) -> Result<String, Error> {
    let dialect = registry.select_by_name(dialect_name)?;
    let document = dialect.project(spec)?;
    encode_document(content_type, &document)
}
