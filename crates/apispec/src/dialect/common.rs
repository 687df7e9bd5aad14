//! Document objects shared verbatim by both dialects' validation layers.
//!
//! Fields the canonical model has no use for are accepted and dropped by
//! serde; only cross-field rules that guard model construction are checked
//! explicitly.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;
use crate::resolver::MaybeRef;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct InfoObject {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub license: Option<LicenseObject>,
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LicenseObject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Raw shape of a `security` field: one single-key mapping per requirement.
pub(crate) type SecurityField = Vec<BTreeMap<String, Vec<String>>>;

/// The JSON-schema subset both dialects agree on.
///
/// `additionalProperties` is accepted only as a nested schema, never as a
/// boolean toggle, matching the older dialect's treatment in both builders.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SchemaObject {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    pub format: String,
    pub default: Option<Value>,
    pub required: Vec<String>,
    #[serde(rename = "enum")]
    pub enum_values: Vec<String>,
    pub properties: BTreeMap<String, MaybeRef<SchemaObject>>,
    pub items: Option<Box<MaybeRef<SchemaObject>>>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: Option<Box<MaybeRef<SchemaObject>>>,
}

impl SchemaObject {
    /// The description, falling back to the schema's own title.
    pub fn description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| self.title.clone())
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.type_name == "array" && self.items.is_none() {
            return Err(Error::Validation(
                "items must be set when `type` is array".into(),
            ));
        }
        Ok(())
    }
}
