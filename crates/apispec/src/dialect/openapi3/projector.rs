//! Document projector for the newer dialect.
//!
//! Walks a canonical [`Specification`] and emits a document-shaped value
//! tree. Any entity carrying a declared name (a parameter, response, header,
//! request body or schema reached through a reference at build time) is
//! extracted into the `components` section and replaced by a pointer stub at
//! every call site. Serializing one component can discover further named
//! entities, so the components section is closed over by a fixed point:
//! every pass serializes the names registered so far and stops once a pass
//! discovers nothing new. Empty fields are pruned from the finished tree.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::model::{
    Endpoint, Header, Method, Parameter, ParameterLocation, Response, SchemaId, SecurityScheme,
    Specification,
};

/// Version tag stamped on every emitted document.
const VERSION_TAG: &str = "3.1.0";

pub(crate) fn project(spec: &Specification) -> Value {
    Projector::new(spec).run()
}

/// Canonical collection format back to a declared style and explode flag.
/// Unrecognized or absent formats carry no explicit style.
fn style_for(collection_format: Option<&str>) -> (Option<&'static str>, bool) {
    match collection_format {
        Some("csv") => (Some("form"), false),
        Some("ssv") => (Some("spaceDelimited"), false),
        Some("pipes") => (Some("pipeDelimited"), false),
        Some("multi") => (Some("form"), true),
        Some("matrix") => (Some("matrix"), false),
        Some("label") => (Some("label"), false),
        Some("deepObject") => (Some("deepObject"), false),
        _ => (None, false),
    }
}

/// Canonical OAuth2 flow name back to the newer dialect's vocabulary.
fn dialect_flow(flow: &str) -> &str {
    match flow {
        "application" => "clientCredentials",
        "accessCode" => "authorizationCode",
        other => other,
    }
}

fn reference(section: &str, name: &str) -> Value {
    json!({ "$ref": format!("#/components/{section}/{name}") })
}

/// One projection pass over a specification. The registries accumulate the
/// named entities discovered while walking the paths; `components_value`
/// drains them.
struct Projector<'a> {
    spec: &'a Specification,
    schemas: BTreeMap<String, SchemaId>,
    responses: BTreeMap<String, &'a Response>,
    parameters: BTreeMap<String, &'a Parameter>,
    request_bodies: BTreeMap<String, &'a Parameter>,
    headers: BTreeMap<String, &'a Header>,
}

impl<'a> Projector<'a> {
    fn new(spec: &'a Specification) -> Self {
        Self {
            spec,
            schemas: BTreeMap::new(),
            responses: BTreeMap::new(),
            parameters: BTreeMap::new(),
            request_bodies: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }

    fn run(&mut self) -> Value {
        let spec = self.spec;
        debug!(title = %spec.title, endpoints = spec.endpoints.len(), "projecting to openapi3");

        let mut paths = Map::new();
        for endpoint in &spec.endpoints {
            paths.insert(endpoint.url.clone(), self.endpoint_value(endpoint));
        }

        // Components go last: walking the paths is what populates them.
        let components = self.components_value();

        let document = json!({
            "openapi": VERSION_TAG,
            "info": {
                "title": spec.title,
                "description": spec.description,
                "version": spec.version,
                "license": {
                    "name": spec.license_name,
                    "url": spec.license_url,
                },
            },
            "servers": [{ "url": spec.base_url }],
            "paths": paths,
            "components": components,
        });

        clean(document).unwrap_or_else(|| json!({}))
    }

    fn endpoint_value(&mut self, endpoint: &'a Endpoint) -> Value {
        let mut map = Map::new();

        let parameters: Vec<Value> = endpoint
            .parameters
            .iter()
            .filter(|parameter| parameter.location != ParameterLocation::Body)
            .map(|parameter| self.parameter_value(parameter, true))
            .collect();
        if !parameters.is_empty() {
            map.insert("parameters".into(), Value::Array(parameters));
        }

        for method in &endpoint.methods {
            map.insert(method.verb.clone(), self.method_value(method));
        }

        Value::Object(map)
    }

    fn method_value(&mut self, method: &'a Method) -> Value {
        let mut map = Map::new();
        map.insert("summary".into(), Value::String(method.summary.clone()));
        map.insert(
            "description".into(),
            Value::String(method.description.clone()),
        );
        map.insert(
            "operationId".into(),
            Value::String(method.operation_id.clone()),
        );
        if method.deprecated {
            map.insert("deprecated".into(), Value::Bool(true));
        }

        let parameters: Vec<Value> = method
            .parameters
            .iter()
            .filter(|parameter| parameter.location != ParameterLocation::Body)
            .map(|parameter| self.parameter_value(parameter, true))
            .collect();
        if !parameters.is_empty() {
            map.insert("parameters".into(), Value::Array(parameters));
        }

        if let Some(body) = method
            .parameters
            .iter()
            .find(|parameter| parameter.location == ParameterLocation::Body)
        {
            map.insert("requestBody".into(), self.request_body_value(body, true));
        }

        let mut responses = Map::new();
        for (code, response) in &method.responses {
            responses.insert(code.clone(), self.response_value(response, true));
        }
        map.insert("responses".into(), Value::Object(responses));

        let security: Vec<Value> = method
            .security_requirements
            .iter()
            .map(|requirement| {
                let mut entry = Map::new();
                entry.insert(requirement.name.clone(), json!(requirement.scopes));
                Value::Object(entry)
            })
            .collect();
        if !security.is_empty() {
            map.insert("security".into(), Value::Array(security));
        }

        Value::Object(map)
    }

    fn parameter_value(&mut self, parameter: &'a Parameter, allow_ref: bool) -> Value {
        if allow_ref {
            if let Some(title) = &parameter.title {
                self.parameters.insert(title.clone(), parameter);
                return reference("parameters", title);
            }
        }

        let (style, explode) = style_for(parameter.collection_format.as_deref());

        let mut map = Map::new();
        map.insert("name".into(), Value::String(parameter.name.clone()));
        map.insert(
            "in".into(),
            Value::String(parameter.location.as_str().to_string()),
        );
        map.insert(
            "description".into(),
            Value::String(parameter.description.clone()),
        );
        if parameter.required {
            map.insert("required".into(), Value::Bool(true));
        }
        if let Some(style) = style {
            map.insert("style".into(), Value::String(style.to_string()));
        }
        if explode {
            map.insert("explode".into(), Value::Bool(true));
        }
        map.insert(
            "schema".into(),
            self.inline_schema(
                &parameter.type_name,
                &parameter.format,
                parameter.default.clone(),
                parameter.items,
            ),
        );
        Value::Object(map)
    }

    fn request_body_value(&mut self, parameter: &'a Parameter, allow_ref: bool) -> Value {
        if allow_ref {
            if let Some(title) = &parameter.title {
                self.request_bodies.insert(title.clone(), parameter);
                return reference("requestBodies", title);
            }
        }

        let schema = self.inline_schema(
            &parameter.type_name,
            &parameter.format,
            parameter.default.clone(),
            parameter.items,
        );

        let mut map = Map::new();
        map.insert(
            "description".into(),
            Value::String(parameter.description.clone()),
        );
        if parameter.required {
            map.insert("required".into(), Value::Bool(true));
        }
        map.insert(
            "content".into(),
            json!({ "application/json": { "schema": schema } }),
        );
        Value::Object(map)
    }

    fn response_value(&mut self, response: &'a Response, allow_ref: bool) -> Value {
        if allow_ref {
            if let Some(name) = &response.name {
                self.responses.insert(name.clone(), response);
                return reference("responses", name);
            }
        }

        let mut map = Map::new();
        map.insert(
            "description".into(),
            Value::String(response.description.clone()),
        );

        let mut headers = Map::new();
        for header in &response.headers {
            headers.insert(header.name.clone(), self.header_value(header, true));
        }
        if !headers.is_empty() {
            map.insert("headers".into(), Value::Object(headers));
        }

        if let Some(schema) = response.schema {
            let schema = self.schema_value(schema);
            map.insert(
                "content".into(),
                json!({ "application/json": { "schema": schema } }),
            );
        }

        Value::Object(map)
    }

    fn header_value(&mut self, header: &'a Header, allow_ref: bool) -> Value {
        if allow_ref {
            if let Some(title) = &header.title {
                self.headers.insert(title.clone(), header);
                return reference("headers", title);
            }
        }

        let (style, explode) = style_for(header.collection_format.as_deref());

        let mut map = Map::new();
        map.insert(
            "description".into(),
            Value::String(header.description.clone()),
        );
        if let Some(style) = style {
            map.insert("style".into(), Value::String(style.to_string()));
        }
        if explode {
            map.insert("explode".into(), Value::Bool(true));
        }
        map.insert(
            "schema".into(),
            self.inline_schema(
                &header.type_name,
                &header.format,
                header.default.clone(),
                header.items,
            ),
        );
        Value::Object(map)
    }

    /// Schema-shaped value for a parameter or header's flat type fields.
    fn inline_schema(
        &mut self,
        type_name: &str,
        format: &str,
        default: Option<Value>,
        items: Option<SchemaId>,
    ) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::String(type_name.to_string()));
        map.insert("format".into(), Value::String(format.to_string()));
        if let Some(default) = default {
            map.insert("default".into(), default);
        }
        if let Some(items) = items {
            let items = self.schema_value(items);
            map.insert("items".into(), items);
        }
        Value::Object(map)
    }

    /// A named node becomes a pointer stub and is queued for the components
    /// section; an anonymous node is inlined.
    fn schema_value(&mut self, id: SchemaId) -> Value {
        let node = self.spec.schemas.get(id);
        if let Some(name) = &node.name {
            self.schemas.insert(name.clone(), id);
            return reference("schemas", name);
        }
        self.schema_body(id)
    }

    fn schema_body(&mut self, id: SchemaId) -> Value {
        let node = self.spec.schemas.get(id);

        let mut map = Map::new();
        map.insert(
            "description".into(),
            Value::String(node.description.clone()),
        );
        map.insert("type".into(), Value::String(node.type_name.clone()));
        map.insert("format".into(), Value::String(node.format.clone()));
        if let Some(default) = &node.default {
            map.insert("default".into(), default.clone());
        }
        map.insert("required".into(), json!(node.required));
        map.insert("enum".into(), json!(node.enum_values));

        let mut properties = Map::new();
        for (key, child) in &node.properties {
            properties.insert(key.clone(), self.schema_value(*child));
        }
        if !properties.is_empty() {
            map.insert("properties".into(), Value::Object(properties));
        }
        if let Some(items) = node.items {
            let items = self.schema_value(items);
            map.insert("items".into(), items);
        }

        Value::Object(map)
    }

    /// Serializes every registered component, repeating until a pass
    /// discovers no new names. Serializing a named response can register a
    /// named schema, a named schema can register further named schemas, and
    /// so on; the loop terminates because the model's reachable graph is
    /// finite.
    fn components_value(&mut self) -> Value {
        let mut schemas: BTreeMap<String, Value> = BTreeMap::new();
        let mut responses: BTreeMap<String, Value> = BTreeMap::new();
        let mut parameters: BTreeMap<String, Value> = BTreeMap::new();
        let mut request_bodies: BTreeMap<String, Value> = BTreeMap::new();
        let mut headers: BTreeMap<String, Value> = BTreeMap::new();

        loop {
            let mut discovered = false;

            let pending: Vec<(String, SchemaId)> = self
                .schemas
                .iter()
                .filter(|(name, _)| !schemas.contains_key(*name))
                .map(|(name, id)| (name.clone(), *id))
                .collect();
            for (name, id) in pending {
                let value = self.schema_body(id);
                schemas.insert(name, value);
                discovered = true;
            }

            let pending: Vec<(String, &'a Response)> = self
                .responses
                .iter()
                .filter(|(name, _)| !responses.contains_key(*name))
                .map(|(name, response)| (name.clone(), *response))
                .collect();
            for (name, response) in pending {
                let value = self.response_value(response, false);
                responses.insert(name, value);
                discovered = true;
            }

            let pending: Vec<(String, &'a Parameter)> = self
                .parameters
                .iter()
                .filter(|(name, _)| !parameters.contains_key(*name))
                .map(|(name, parameter)| (name.clone(), *parameter))
                .collect();
            for (name, parameter) in pending {
                let value = self.parameter_value(parameter, false);
                parameters.insert(name, value);
                discovered = true;
            }

            let pending: Vec<(String, &'a Parameter)> = self
                .request_bodies
                .iter()
                .filter(|(name, _)| !request_bodies.contains_key(*name))
                .map(|(name, body)| (name.clone(), *body))
                .collect();
            for (name, body) in pending {
                let value = self.request_body_value(body, false);
                request_bodies.insert(name, value);
                discovered = true;
            }

            let pending: Vec<(String, &'a Header)> = self
                .headers
                .iter()
                .filter(|(name, _)| !headers.contains_key(*name))
                .map(|(name, header)| (name.clone(), *header))
                .collect();
            for (name, header) in pending {
                let value = self.header_value(header, false);
                headers.insert(name, value);
                discovered = true;
            }

            if !discovered {
                break;
            }
        }

        // Security schemes are global declarations, not discovered call by
        // call; emitting them all keeps unused schemes across a round trip.
        let security_schemes: BTreeMap<String, Value> = self
            .spec
            .security_schemes
            .iter()
            .map(|scheme| (scheme.title.clone(), security_scheme_value(scheme)))
            .collect();

        json!({
            "schemas": schemas,
            "responses": responses,
            "parameters": parameters,
            "requestBodies": request_bodies,
            "headers": headers,
            "securitySchemes": security_schemes,
        })
    }
}

fn security_scheme_value(scheme: &SecurityScheme) -> Value {
    let mut map = Map::new();

    // The older dialect's `basic` type is spelled `http` plus a scheme here.
    if scheme.scheme_type == "basic" {
        map.insert("type".into(), Value::String("http".to_string()));
        map.insert("scheme".into(), Value::String("basic".to_string()));
    } else {
        map.insert("type".into(), Value::String(scheme.scheme_type.clone()));
    }

    map.insert(
        "description".into(),
        Value::String(scheme.description.clone()),
    );
    map.insert("name".into(), Value::String(scheme.name.clone()));
    map.insert("in".into(), Value::String(scheme.location.clone()));

    if scheme.scheme_type == "oauth2" {
        let scopes: BTreeMap<&str, &str> = scheme
            .scopes
            .iter()
            .map(|scope| (scope.name.as_str(), scope.description.as_str()))
            .collect();
        let mut flows = Map::new();
        flows.insert(
            dialect_flow(&scheme.flow).to_string(),
            json!({
                "authorizationUrl": scheme.authorization_url,
                "tokenUrl": scheme.token_url,
                "refreshUrl": scheme.refresh_url,
                "scopes": scopes,
            }),
        );
        map.insert("flows".into(), Value::Object(flows));
    }

    Value::Object(map)
}

/// Recursively drops empty leaves (null, "", [], {}) and whatever collapses
/// to empty once its children are gone.
fn clean(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::Array(items) => {
            let items: Vec<Value> = items.into_iter().filter_map(clean).collect();
            (!items.is_empty()).then_some(Value::Array(items))
        }
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .filter_map(|(key, value)| clean(value).map(|value| (key, value)))
                .collect();
            (!map.is_empty()).then_some(Value::Object(map))
        }
        other => Some(other),
    }
}
