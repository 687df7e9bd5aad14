//! Model builder for the newer dialect.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::build::{build_security_requirements, from_value, BuildSession};
use crate::dialect::common::SchemaObject;
use crate::error::Error;
use crate::model::{
    Endpoint, Header, Method, OAuthScope, Parameter, ParameterLocation, Response, SecurityScheme,
    Specification,
};
use crate::resolver::MaybeRef;

use super::document::{
    default_style, HeaderObject, OpenApi3Document, OperationObject, ParameterObject,
    PathItemObject, RequestBodyObject, ResponseObject, SecuritySchemeObject,
};

/// Canonical collection format for a declared (or defaulted) style.
///
/// Parameters without a type carry no array encoding at all. `explode`
/// defaults to off; the dialect's own "form implies explode" default is
/// deliberately not applied, so that a style-less parameter normalizes to
/// `csv` and survives a round trip unchanged.
fn collection_format(
    location: &str,
    style: Option<&str>,
    explode: bool,
    type_name: &str,
) -> Option<String> {
    if type_name.is_empty() {
        return None;
    }
    let style = style.unwrap_or_else(|| default_style(location));
    let format = match style {
        "form" if explode => "multi",
        "form" | "simple" => "csv",
        "spaceDelimited" => "ssv",
        "pipeDelimited" => "pipes",
        other => other,
    };
    Some(format.to_string())
}

/// Maps the newer dialect's OAuth2 flow names onto the canonical ones.
fn canonical_flow(flow: &str) -> &str {
    match flow {
        "clientCredentials" => "application",
        "authorizationCode" => "accessCode",
        other => other,
    }
}

pub(crate) fn build(root: &Value) -> Result<Specification, Error> {
    let document: OpenApi3Document = from_value(root)?;
    debug!(version = %document.openapi, paths = document.paths.len(), "building openapi3 document");

    let mut session = BuildSession::new(root);

    let endpoints = document
        .paths
        .iter()
        .map(|(url, item)| build_endpoint(&mut session, url, item))
        .collect::<Result<Vec<_>, _>>()?;

    let security_schemes = document
        .components
        .security_schemes
        .iter()
        .map(|(title, scheme)| build_security_scheme(title, scheme))
        .collect::<Result<Vec<_>, _>>()?;

    let license = document.info.license.clone().unwrap_or_default();

    Ok(Specification {
        title: document.info.title.clone(),
        description: document.info.description.clone(),
        license_name: license.name,
        license_url: license.url,
        version: document.info.version.clone(),
        base_url: document
            .servers
            .first()
            .map(|server| server.url.clone())
            .unwrap_or_else(|| "/".to_string()),
        endpoints,
        security_schemes,
        schemas: session.finish(),
    })
}

fn parse_location(raw: &str) -> Result<ParameterLocation, Error> {
    match raw {
        "query" => Ok(ParameterLocation::Query),
        "header" => Ok(ParameterLocation::Header),
        "path" => Ok(ParameterLocation::Path),
        "cookie" => Ok(ParameterLocation::Cookie),
        other => Err(Error::Validation(format!(
            "invalid parameter location: {other}"
        ))),
    }
}

fn build_endpoint(
    session: &mut BuildSession,
    url: &str,
    node: &MaybeRef<PathItemObject>,
) -> Result<Endpoint, Error> {
    let (item, _) = session.deref(node)?;

    let parameters = item
        .parameters
        .iter()
        .map(|parameter| build_parameter(session, parameter))
        .collect::<Result<Vec<_>, _>>()?;

    let mut methods = Vec::new();
    for (verb, operation) in item.operations() {
        methods.push(build_method(session, verb, operation)?);
    }

    Ok(Endpoint {
        url: url.to_string(),
        parameters,
        methods,
    })
}

fn build_method(
    session: &mut BuildSession,
    verb: &str,
    operation: &OperationObject,
) -> Result<Method, Error> {
    if operation.responses.is_empty() {
        return Err(Error::Validation(
            "at least one response must be provided for each operation".into(),
        ));
    }

    let mut parameters = operation
        .parameters
        .iter()
        .map(|parameter| build_parameter(session, parameter))
        .collect::<Result<Vec<_>, _>>()?;

    // The request payload becomes the single body parameter, last.
    if let Some(request_body) = &operation.request_body {
        parameters.push(build_request_body(session, request_body)?);
    }

    let responses = operation
        .responses
        .iter()
        .map(|(code, node)| Ok((code.clone(), build_response(session, node)?)))
        .collect::<Result<BTreeMap<_, _>, Error>>()?;

    Ok(Method {
        verb: verb.to_string(),
        operation_id: operation.operation_id.clone(),
        summary: operation.summary.clone(),
        description: operation.description.clone(),
        deprecated: operation.deprecated,
        parameters,
        responses,
        security_requirements: build_security_requirements(&operation.security),
    })
}

fn build_parameter(
    session: &mut BuildSession,
    node: &MaybeRef<ParameterObject>,
) -> Result<Parameter, Error> {
    let (object, title) = session.deref(node)?;
    object.validate()?;

    let location_raw = object.location.clone().unwrap_or_else(|| "header".into());
    let location = parse_location(&location_raw)?;

    // Type, format and default live under the parameter's schema.
    let (schema, items) = match &object.schema {
        Some(node) => {
            let (schema, _) = session.deref::<SchemaObject>(node)?;
            schema.validate()?;
            let items = session.build_schema(schema.items.as_deref(), None, None)?;
            (Some(schema), items)
        }
        None => (None, None),
    };
    let type_name = schema
        .as_ref()
        .map(|schema| schema.type_name.clone())
        .unwrap_or_default();

    Ok(Parameter {
        title,
        name: object.name.clone(),
        description: object.description.clone(),
        location,
        required: object.required.unwrap_or(false),
        type_name: type_name.clone(),
        format: schema
            .as_ref()
            .map(|schema| schema.format.clone())
            .unwrap_or_default(),
        default: schema.as_ref().and_then(|schema| schema.default.clone()),
        collection_format: collection_format(
            &location_raw,
            object.style.as_deref(),
            object.explode.unwrap_or(false),
            &type_name,
        ),
        items,
    })
}

fn build_request_body(
    session: &mut BuildSession,
    node: &MaybeRef<RequestBodyObject>,
) -> Result<Parameter, Error> {
    let (object, title) = session.deref(node)?;
    object.validate()?;

    // The first declared media type describes the payload.
    let (schema, items) = match object
        .content
        .values()
        .next()
        .and_then(|media| media.schema.as_ref())
    {
        Some(node) => {
            let (schema, _) = session.deref::<SchemaObject>(node)?;
            schema.validate()?;
            let items = session.build_schema(schema.items.as_deref(), None, None)?;
            (Some(schema), items)
        }
        None => (None, None),
    };
    let type_name = schema
        .as_ref()
        .map(|schema| schema.type_name.clone())
        .unwrap_or_default();

    Ok(Parameter {
        title,
        name: "body".to_string(),
        description: object.description.clone(),
        location: ParameterLocation::Body,
        required: object.required,
        type_name: type_name.clone(),
        format: schema
            .as_ref()
            .map(|schema| schema.format.clone())
            .unwrap_or_default(),
        default: None,
        collection_format: collection_format("body", None, false, &type_name),
        items,
    })
}

fn build_response(
    session: &mut BuildSession,
    node: &MaybeRef<ResponseObject>,
) -> Result<Response, Error> {
    let (object, name) = session.deref(node)?;

    let description = object
        .description
        .clone()
        .ok_or_else(|| Error::Validation("description must be set for each response".into()))?;

    let schema = match object
        .content
        .values()
        .next()
        .and_then(|media| media.schema.as_ref())
    {
        Some(node) => session.build_schema(Some(node), None, None)?,
        None => None,
    };

    let headers = object
        .headers
        .iter()
        .map(|(header_name, header)| build_header(session, header_name, header))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Response {
        name,
        description,
        schema,
        headers,
        // The newer dialect keeps examples under media types; the canonical
        // model does not carry them over.
        examples: Vec::new(),
    })
}

fn build_header(
    session: &mut BuildSession,
    name: &str,
    node: &MaybeRef<HeaderObject>,
) -> Result<Header, Error> {
    let (object, title) = session.deref(node)?;

    let (schema, items) = match &object.schema {
        Some(node) => {
            let (schema, _) = session.deref::<SchemaObject>(node)?;
            schema.validate()?;
            let items = session.build_schema(schema.items.as_deref(), None, None)?;
            (Some(schema), items)
        }
        None => (None, None),
    };
    let type_name = schema
        .as_ref()
        .map(|schema| schema.type_name.clone())
        .unwrap_or_default();

    Ok(Header {
        title,
        name: name.to_string(),
        description: object.description.clone(),
        type_name: type_name.clone(),
        format: schema
            .as_ref()
            .map(|schema| schema.format.clone())
            .unwrap_or_default(),
        default: schema.as_ref().and_then(|schema| schema.default.clone()),
        collection_format: collection_format(
            "header",
            object.style.as_deref(),
            object.explode.unwrap_or(false),
            &type_name,
        ),
        items,
    })
}

fn build_security_scheme(
    title: &str,
    object: &SecuritySchemeObject,
) -> Result<SecurityScheme, Error> {
    object.validate()?;

    let (flow, oauth) = object
        .flows
        .iter()
        .next()
        .map(|(flow, oauth)| (canonical_flow(flow).to_string(), oauth.clone()))
        .unwrap_or_default();

    // The canonical model names the `http` scheme type `basic`.
    let scheme_type = if object.scheme_type == "http" {
        "basic".to_string()
    } else {
        object.scheme_type.clone()
    };

    Ok(SecurityScheme {
        title: title.to_string(),
        name: object.name.clone(),
        description: object.description.clone(),
        scheme_type,
        location: object.location.clone(),
        flow,
        authorization_url: oauth.authorization_url,
        refresh_url: oauth.refresh_url,
        token_url: oauth.token_url,
        scopes: oauth
            .scopes
            .into_iter()
            .map(|(name, description)| OAuthScope { name, description })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_yaml(input: &str) -> Result<Specification, Error> {
        let root: Value = serde_yaml::from_str(input).unwrap();
        build(&root)
    }

    #[test]
    fn base_url_comes_from_the_first_server() {
        let spec = build_yaml(
            r#"
openapi: "3.0.1"
info:
  title: Petstore
  version: "1.0.0"
servers:
  - url: https://api.example.com/v3
  - url: https://staging.example.com/v3
paths: {}
"#,
        )
        .unwrap();
        assert_eq!(spec.base_url, "https://api.example.com/v3");
    }

    #[test]
    fn base_url_defaults_to_root() {
        let spec = build_yaml(
            r#"
openapi: "3.0.1"
info:
  title: Petstore
  version: "1.0.0"
paths: {}
"#,
        )
        .unwrap();
        assert_eq!(spec.base_url, "/");
    }

    #[test]
    fn styles_normalize_to_collection_formats() {
        let spec = build_yaml(
            r#"
openapi: "3.1.0"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    get:
      parameters:
        - name: tags
          in: query
          style: spaceDelimited
          schema:
            type: array
            items:
              type: string
        - name: ids
          in: query
          style: form
          explode: true
          schema:
            type: array
            items:
              type: string
        - name: limit
          in: query
          schema:
            type: integer
      responses:
        "200":
          description: OK
"#,
        )
        .unwrap();

        let parameters = &spec.endpoints[0].methods[0].parameters;
        assert_eq!(parameters[0].collection_format.as_deref(), Some("ssv"));
        assert_eq!(parameters[1].collection_format.as_deref(), Some("multi"));
        // No declared style: a query parameter defaults to form, i.e. csv.
        assert_eq!(parameters[2].collection_format.as_deref(), Some("csv"));
    }

    #[test]
    fn request_body_becomes_the_single_body_parameter() {
        let spec = build_yaml(
            r#"
openapi: "3.1.0"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    post:
      parameters:
        - name: dryRun
          in: query
          schema:
            type: boolean
      requestBody:
        description: Pet to add
        required: true
        content:
          application/json:
            schema:
              type: object
      responses:
        "201":
          description: Created
"#,
        )
        .unwrap();

        let parameters = &spec.endpoints[0].methods[0].parameters;
        assert_eq!(parameters.len(), 2);

        let body = &parameters[1];
        assert_eq!(body.location, ParameterLocation::Body);
        assert_eq!(body.name, "body");
        assert_eq!(body.description, "Pet to add");
        assert!(body.required);
        assert_eq!(body.type_name, "object");
    }

    #[test]
    fn request_body_requires_content() {
        let err = build_yaml(
            r#"
openapi: "3.1.0"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    post:
      requestBody:
        description: Pet to add
      responses:
        "201":
          description: Created
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn fails_fast_on_operations_without_responses() {
        let err = build_yaml(
            r#"
openapi: "3.1.0"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    get:
      operationId: listPets
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn oauth2_flows_normalize_to_the_older_names() {
        let spec = build_yaml(
            r#"
openapi: "3.1.0"
info:
  title: Petstore
  version: "1.0.0"
paths: {}
components:
  securitySchemes:
    petstore_auth:
      type: oauth2
      flows:
        clientCredentials:
          tokenUrl: https://example.com/oauth/token
          refreshUrl: https://example.com/oauth/refresh
          scopes:
            read:pets: Read pets
"#,
        )
        .unwrap();

        let scheme = &spec.security_schemes[0];
        assert_eq!(scheme.flow, "application");
        assert_eq!(scheme.token_url, "https://example.com/oauth/token");
        assert_eq!(scheme.refresh_url, "https://example.com/oauth/refresh");
        assert_eq!(scheme.scopes[0].name, "read:pets");
    }

    #[test]
    fn http_schemes_canonicalize_to_basic() {
        let spec = build_yaml(
            r#"
openapi: "3.1.0"
info:
  title: Petstore
  version: "1.0.0"
paths: {}
components:
  securitySchemes:
    login:
      type: http
      scheme: basic
"#,
        )
        .unwrap();
        assert_eq!(spec.security_schemes[0].scheme_type, "basic");
    }

    #[test]
    fn response_schema_references_keep_their_name() {
        let spec = build_yaml(
            r##"
openapi: "3.1.0"
info:
  title: Petstore
  version: "1.0.0"
components:
  schemas:
    Pet:
      type: object
      properties:
        name:
          type: string
paths:
  /pets:
    get:
      responses:
        "200":
          description: OK
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Pet"
"##,
        )
        .unwrap();

        let response = &spec.endpoints[0].methods[0].responses["200"];
        let schema = spec.schemas.get(response.schema.unwrap());
        assert_eq!(schema.name.as_deref(), Some("Pet"));
        assert_eq!(schema.properties.len(), 1);
    }
}
