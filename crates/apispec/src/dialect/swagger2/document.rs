//! Typed validation layer for the older dialect.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dialect::common::{InfoObject, SchemaObject, SecurityField};
use crate::error::Error;
use crate::resolver::MaybeRef;

pub(crate) const PARAMETER_LOCATIONS: &[&str] = &["query", "header", "path", "formData", "body"];
pub(crate) const COLLECTION_FORMATS: &[&str] = &["csv", "ssv", "tsv", "pipes", "multi"];
pub(crate) const SECURITY_SCHEME_TYPES: &[&str] = &["basic", "apiKey", "oauth2"];
pub(crate) const API_KEY_LOCATIONS: &[&str] = &["query", "header"];
pub(crate) const OAUTH2_FLOWS: &[&str] = &["implicit", "password", "application", "accessCode"];

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Swagger2Document {
    pub swagger: String,
    pub info: InfoObject,
    #[serde(default)]
    pub host: String,
    #[serde(default, rename = "basePath")]
    pub base_path: String,
    pub paths: BTreeMap<String, MaybeRef<PathItemObject>>,
    #[serde(default, rename = "securityDefinitions")]
    pub security_definitions: BTreeMap<String, SecuritySchemeObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PathItemObject {
    pub get: Option<OperationObject>,
    pub put: Option<OperationObject>,
    pub post: Option<OperationObject>,
    pub delete: Option<OperationObject>,
    pub options: Option<OperationObject>,
    pub head: Option<OperationObject>,
    pub patch: Option<OperationObject>,
    pub trace: Option<OperationObject>,
    pub parameters: Vec<MaybeRef<ParameterObject>>,
}

impl PathItemObject {
    /// Declared operations, in emission order.
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &OperationObject)> {
        [
            ("get", self.get.as_ref()),
            ("put", self.put.as_ref()),
            ("post", self.post.as_ref()),
            ("delete", self.delete.as_ref()),
            ("options", self.options.as_ref()),
            ("head", self.head.as_ref()),
            ("patch", self.patch.as_ref()),
            ("trace", self.trace.as_ref()),
        ]
        .into_iter()
        .filter_map(|(verb, operation)| operation.map(|operation| (verb, operation)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OperationObject {
    pub summary: String,
    pub description: String,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    pub parameters: Vec<MaybeRef<ParameterObject>>,
    pub responses: BTreeMap<String, MaybeRef<ResponseObject>>,
    pub deprecated: bool,
    pub security: SecurityField,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ParameterObject {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub description: String,
    pub required: Option<bool>,
    #[serde(rename = "type")]
    pub type_name: String,
    pub format: String,
    pub default: Option<serde_json::Value>,
    #[serde(rename = "collectionFormat")]
    pub collection_format: Option<String>,
    pub items: Option<MaybeRef<SchemaObject>>,
    pub schema: Option<MaybeRef<SchemaObject>>,
}

impl ParameterObject {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() {
            return Err(Error::Validation("`name` must be set".into()));
        }
        if !PARAMETER_LOCATIONS.contains(&self.location.as_str()) {
            return Err(Error::Validation(format!(
                "`in` must be one of: {}",
                PARAMETER_LOCATIONS.join(", ")
            )));
        }
        if self.location == "path" && self.required.is_none() {
            return Err(Error::Validation(
                "required must be true if `in` is set to `path`".into(),
            ));
        }
        if self.location == "body" {
            if self.schema.is_none() {
                return Err(Error::Validation(
                    "schema must be set if `in` is set to `body`".into(),
                ));
            }
        } else if self.type_name.is_empty() {
            return Err(Error::Validation(
                "type must be set if `in` is not set to `body`".into(),
            ));
        }
        if let Some(collection_format) = &self.collection_format {
            if !COLLECTION_FORMATS.contains(&collection_format.as_str()) {
                return Err(Error::Validation(format!(
                    "collectionFormat must be one of: {}",
                    COLLECTION_FORMATS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct HeaderObject {
    pub description: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub format: String,
    pub default: Option<serde_json::Value>,
    #[serde(rename = "collectionFormat")]
    pub collection_format: Option<String>,
    pub items: Option<MaybeRef<SchemaObject>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ResponseObject {
    pub description: Option<String>,
    pub schema: Option<MaybeRef<SchemaObject>>,
    pub headers: BTreeMap<String, HeaderObject>,
    /// Mime type to a mapping of example keys and values.
    pub examples: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SecuritySchemeObject {
    #[serde(rename = "type")]
    pub scheme_type: String,
    pub description: String,
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub flow: String,
    #[serde(rename = "authorizationUrl")]
    pub authorization_url: String,
    #[serde(rename = "tokenUrl")]
    pub token_url: String,
    pub scopes: Option<BTreeMap<String, String>>,
}

impl SecuritySchemeObject {
    pub fn validate(&self) -> Result<(), Error> {
        if !SECURITY_SCHEME_TYPES.contains(&self.scheme_type.as_str()) {
            return Err(Error::Validation(format!(
                "security scheme type must be one of: {}",
                SECURITY_SCHEME_TYPES.join(", ")
            )));
        }
        if self.scheme_type == "apiKey" {
            if self.name.is_empty() {
                return Err(Error::Validation(
                    "name must be set when using API key authentication".into(),
                ));
            }
            if !API_KEY_LOCATIONS.contains(&self.location.as_str()) {
                return Err(Error::Validation(
                    "in location must be set when using API key authentication".into(),
                ));
            }
        }
        if self.scheme_type == "oauth2" {
            if !OAUTH2_FLOWS.contains(&self.flow.as_str()) {
                return Err(Error::Validation(format!(
                    "flow must be one of: {}",
                    OAUTH2_FLOWS.join(", ")
                )));
            }
            if ["implicit", "accessCode"].contains(&self.flow.as_str())
                && self.authorization_url.is_empty()
            {
                return Err(Error::Validation(
                    "authorization URL must be set when using OAuth2 authentication".into(),
                ));
            }
            if ["password", "application", "accessCode"].contains(&self.flow.as_str())
                && self.token_url.is_empty()
            {
                return Err(Error::Validation(
                    "token URL must be set when using OAuth2 authentication".into(),
                ));
            }
            if self.scopes.is_none() {
                return Err(Error::Validation(
                    "scopes must be set when using OAuth2 authentication".into(),
                ));
            }
        }
        Ok(())
    }
}
