//! Typed validation layer for the newer dialect.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dialect::common::{InfoObject, SchemaObject, SecurityField};
use crate::error::Error;
use crate::resolver::MaybeRef;

pub(crate) const PARAMETER_LOCATIONS: &[&str] = &["query", "header", "path", "cookie"];
pub(crate) const SECURITY_SCHEME_TYPES: &[&str] = &["apiKey", "http", "oauth2", "openIdConnect"];
pub(crate) const API_KEY_LOCATIONS: &[&str] = &["query", "header", "cookie"];

/// Style applied when a parameter declares none, by location.
pub(crate) fn default_style(location: &str) -> &'static str {
    match location {
        "query" | "cookie" => "form",
        _ => "simple",
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OpenApi3Document {
    pub openapi: String,
    pub info: InfoObject,
    #[serde(default)]
    pub servers: Vec<ServerObject>,
    // Absent when every path item pruned away as empty on emission.
    #[serde(default)]
    pub paths: BTreeMap<String, MaybeRef<PathItemObject>>,
    #[serde(default)]
    pub components: ComponentsObject,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServerObject {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ComponentsObject {
    #[serde(rename = "securitySchemes")]
    pub security_schemes: BTreeMap<String, SecuritySchemeObject>,
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
    #[serde(rename = "requestBody")]
    pub request_body: Option<MaybeRef<RequestBodyObject>>,
    pub responses: BTreeMap<String, MaybeRef<ResponseObject>>,
    pub deprecated: bool,
    pub security: SecurityField,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ParameterObject {
    pub name: String,
    #[serde(rename = "in")]
    pub location: Option<String>,
    pub description: String,
    pub required: Option<bool>,
    pub style: Option<String>,
    pub explode: Option<bool>,
    pub schema: Option<MaybeRef<SchemaObject>>,
}

impl ParameterObject {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(location) = &self.location {
            if !PARAMETER_LOCATIONS.contains(&location.as_str()) {
                return Err(Error::Validation(format!(
                    "`in` must be one of: {}",
                    PARAMETER_LOCATIONS.join(", ")
                )));
            }
            if location == "path" && self.required.is_none() {
                return Err(Error::Validation(
                    "required must be true if `in` is set to `path`".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MediaTypeObject {
    pub schema: Option<MaybeRef<SchemaObject>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RequestBodyObject {
    pub description: String,
    pub required: bool,
    pub content: BTreeMap<String, MediaTypeObject>,
}

impl RequestBodyObject {
    pub fn validate(&self) -> Result<(), Error> {
        if self.content.is_empty() {
            return Err(Error::Validation(
                "content must be provided for each request body".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ResponseObject {
    pub description: Option<String>,
    pub headers: BTreeMap<String, MaybeRef<HeaderObject>>,
    pub content: BTreeMap<String, MediaTypeObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct HeaderObject {
    pub description: String,
    pub style: Option<String>,
    pub explode: Option<bool>,
    pub schema: Option<MaybeRef<SchemaObject>>,
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
    pub flows: BTreeMap<String, OAuthFlowObject>,
    #[serde(rename = "openIdConnectUrl")]
    pub open_id_connect_url: String,
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
        if self.scheme_type == "oauth2" && self.flows.is_empty() {
            return Err(Error::Validation(
                "flows must be set when using OAuth2 authentication".into(),
            ));
        }
        if self.scheme_type == "openIdConnect" && self.open_id_connect_url.is_empty() {
            return Err(Error::Validation(
                "OpenID connect URL must be set when using OpenID authentication".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OAuthFlowObject {
    #[serde(rename = "authorizationUrl")]
    pub authorization_url: String,
    #[serde(rename = "tokenUrl")]
    pub token_url: String,
    #[serde(rename = "refreshUrl")]
    pub refresh_url: String,
    pub scopes: BTreeMap<String, String>,
}
