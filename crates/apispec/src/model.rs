//! The canonical, dialect-independent model of an API description.
//!
//! All entities are produced in one top-down pass by a dialect's model
//! builder and are immutable afterwards. Schemas form a graph, not a tree:
//! a named schema referenced from several places (or from itself) is a
//! single node. The graph is represented as a [`SchemaArena`] addressed by
//! [`SchemaId`], so shared and cyclic schemas need no shared ownership.

use std::collections::BTreeMap;

use serde_json::Value;

/// Index of a schema node inside a [`SchemaArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaId(usize);

/// Owns every [`SchemaNode`] built during one session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaArena {
    nodes: Vec<SchemaNode>,
}

impl SchemaArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node and returns its index. Builders allocate a placeholder
    /// first and fill in children afterwards, so a cyclic reference always
    /// lands on a valid index.
    pub(crate) fn alloc(&mut self, node: SchemaNode) -> SchemaId {
        let id = SchemaId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: SchemaId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Root of the canonical model.
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    pub title: String,
    pub description: String,
    pub license_name: String,
    pub license_url: String,
    pub version: String,
    pub base_url: String,
    pub endpoints: Vec<Endpoint>,
    pub security_schemes: Vec<SecurityScheme>,
    /// Every schema node reachable from this specification.
    pub schemas: SchemaArena,
}

/// One path template and everything declared under it.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub url: String,
    /// Parameters shared by every method of this endpoint.
    pub parameters: Vec<Parameter>,
    pub methods: Vec<Method>,
}

/// One HTTP operation on an endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// Lower-case HTTP verb ("get", "post", ...).
    pub verb: String,
    pub operation_id: String,
    pub summary: String,
    pub description: String,
    pub deprecated: bool,
    /// Non-body parameters first; at most one body parameter, last.
    pub parameters: Vec<Parameter>,
    /// Status code (or "default") to response. Never empty.
    pub responses: BTreeMap<String, Response>,
    pub security_requirements: Vec<SecurityRequirement>,
}

/// Where a parameter travels. The union of both dialects' vocabularies;
/// each builder only ever produces its own dialect's subset, plus `Body`
/// for the request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
    FormData,
    Body,
}

impl ParameterLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Header => "header",
            Self::Path => "path",
            Self::Cookie => "cookie",
            Self::FormData => "formData",
            Self::Body => "body",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Component name, set when the parameter was reached through a
    /// reference. Named parameters are extracted on emission.
    pub title: Option<String>,
    pub name: String,
    pub description: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub type_name: String,
    pub format: String,
    pub default: Option<Value>,
    /// Canonical array encoding: csv, ssv, pipes, multi, ...
    pub collection_format: Option<String>,
    pub items: Option<SchemaId>,
}

/// A response header. Structurally a parameter without a location.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Component name, set when reached through a reference.
    pub title: Option<String>,
    pub name: String,
    pub description: String,
    pub type_name: String,
    pub format: String,
    pub default: Option<Value>,
    pub collection_format: Option<String>,
    pub items: Option<SchemaId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Component name, set when reached through a reference.
    pub name: Option<String>,
    pub description: String,
    pub schema: Option<SchemaId>,
    pub headers: Vec<Header>,
    pub examples: Vec<Example>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub mime_type: String,
    pub key: String,
    pub value: String,
}

/// One node of the schema graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// Component name, set when reached through a reference.
    pub name: Option<String>,
    /// Property key under which the node was declared inline, if any.
    pub key: Option<String>,
    pub description: String,
    pub type_name: String,
    pub format: String,
    pub default: Option<Value>,
    pub required: Vec<String>,
    pub enum_values: Vec<String>,
    /// Property key to child node. The key lives on the edge because a
    /// shared child can appear under different keys in different parents.
    pub properties: Vec<(String, SchemaId)>,
    pub items: Option<SchemaId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityScheme {
    /// Key under the document's security definitions section.
    pub title: String,
    pub name: String,
    pub description: String,
    /// Canonical type: basic, apiKey, oauth2 or openIdConnect.
    pub scheme_type: String,
    pub location: String,
    /// Canonical OAuth2 flow, in the older dialect's vocabulary:
    /// implicit, password, application or accessCode.
    pub flow: String,
    pub authorization_url: String,
    pub refresh_url: String,
    pub token_url: String,
    pub scopes: Vec<OAuthScope>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OAuthScope {
    pub name: String,
    pub description: String,
}

/// A method's demand for a named security scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityRequirement {
    pub name: String,
    pub scopes: Vec<String>,
}
