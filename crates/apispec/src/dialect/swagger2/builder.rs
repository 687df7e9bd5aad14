//! Model builder for the older dialect.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::build::{build_security_requirements, from_value, BuildSession};
use crate::error::Error;
use crate::model::{
    Endpoint, Example, Header, Method, OAuthScope, Parameter, ParameterLocation, Response,
    SecurityScheme, Specification,
};
use crate::resolver::MaybeRef;

use super::document::{
    HeaderObject, OperationObject, ParameterObject, PathItemObject, ResponseObject,
    SecuritySchemeObject, Swagger2Document,
};

pub(crate) fn build(root: &Value) -> Result<Specification, Error> {
    let document: Swagger2Document = from_value(root)?;
    debug!(version = %document.swagger, paths = document.paths.len(), "building swagger2 document");

    let mut session = BuildSession::new(root);

    let endpoints = document
        .paths
        .iter()
        .map(|(url, item)| build_endpoint(&mut session, url, item))
        .collect::<Result<Vec<_>, _>>()?;

    let security_schemes = document
        .security_definitions
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
        base_url: join_base_url(&document.host, &document.base_path),
        endpoints,
        security_schemes,
        schemas: session.finish(),
    })
}

fn join_base_url(host: &str, base_path: &str) -> String {
    if host.is_empty() {
        return base_path.to_string();
    }
    if base_path.is_empty() {
        return host.to_string();
    }
    format!(
        "{}/{}",
        host.trim_end_matches('/'),
        base_path.trim_start_matches('/')
    )
}

fn parse_location(raw: &str) -> Result<ParameterLocation, Error> {
    match raw {
        "query" => Ok(ParameterLocation::Query),
        "header" => Ok(ParameterLocation::Header),
        "path" => Ok(ParameterLocation::Path),
        "formData" => Ok(ParameterLocation::FormData),
        "body" => Ok(ParameterLocation::Body),
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

    // Non-body parameters keep their declared order; the body parameter, if
    // any, always goes last.
    let mut parameters = Vec::new();
    let mut body = None;
    for node in &operation.parameters {
        let parameter = build_parameter(session, node)?;
        if parameter.location == ParameterLocation::Body {
            if body.replace(parameter).is_some() {
                return Err(Error::Validation(
                    "at most one body parameter is allowed per operation".into(),
                ));
            }
        } else {
            parameters.push(parameter);
        }
    }
    parameters.extend(body);

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

    let location = parse_location(&object.location)?;

    if location == ParameterLocation::Body {
        // The payload's type, format and items come from its schema.
        let schema_node = object.schema.as_ref().ok_or_else(|| {
            Error::Validation("schema must be set if `in` is set to `body`".into())
        })?;
        let (schema, _) = session.deref(schema_node)?;
        schema.validate()?;

        return Ok(Parameter {
            title,
            name: object.name.clone(),
            description: object.description.clone(),
            location,
            required: object.required.unwrap_or(false),
            type_name: schema.type_name.clone(),
            format: schema.format.clone(),
            default: schema.default.clone(),
            collection_format: object.collection_format.clone(),
            items: session.build_schema(schema.items.as_deref(), None, None)?,
        });
    }

    Ok(Parameter {
        title,
        name: object.name.clone(),
        description: object.description.clone(),
        location,
        required: object.required.unwrap_or(false),
        type_name: object.type_name.clone(),
        format: object.format.clone(),
        default: object.default.clone(),
        collection_format: object.collection_format.clone(),
        items: session.build_schema(object.items.as_ref(), None, None)?,
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

    let headers = object
        .headers
        .iter()
        .map(|(header_name, header)| build_header(session, header_name, header))
        .collect::<Result<Vec<_>, _>>()?;

    let mut examples = Vec::new();
    for (mime_type, pairs) in &object.examples {
        for (key, value) in pairs {
            examples.push(Example {
                mime_type: mime_type.clone(),
                key: key.clone(),
                value: value.clone(),
            });
        }
    }

    Ok(Response {
        name,
        description,
        schema: session.build_schema(object.schema.as_ref(), None, None)?,
        headers,
        examples,
    })
}

fn build_header(
    session: &mut BuildSession,
    name: &str,
    object: &HeaderObject,
) -> Result<Header, Error> {
    Ok(Header {
        title: None,
        name: name.to_string(),
        description: object.description.clone(),
        type_name: object.type_name.clone(),
        format: object.format.clone(),
        default: object.default.clone(),
        collection_format: object.collection_format.clone(),
        items: session.build_schema(object.items.as_ref(), None, None)?,
    })
}

fn build_security_scheme(
    title: &str,
    object: &SecuritySchemeObject,
) -> Result<SecurityScheme, Error> {
    object.validate()?;

    Ok(SecurityScheme {
        title: title.to_string(),
        name: object.name.clone(),
        description: object.description.clone(),
        scheme_type: object.scheme_type.clone(),
        location: object.location.clone(),
        flow: object.flow.clone(),
        authorization_url: object.authorization_url.clone(),
        refresh_url: String::new(),
        token_url: object.token_url.clone(),
        scopes: object
            .scopes
            .iter()
            .flatten()
            .map(|(name, description)| OAuthScope {
                name: name.clone(),
                description: description.clone(),
            })
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
    fn builds_a_minimal_document() {
        let spec = build_yaml(
            r#"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    get:
      responses:
        "200":
          description: OK
"#,
        )
        .unwrap();

        assert_eq!(spec.title, "Petstore");
        assert_eq!(spec.endpoints.len(), 1);

        let endpoint = &spec.endpoints[0];
        assert_eq!(endpoint.url, "/pets");
        assert_eq!(endpoint.methods.len(), 1);

        let method = &endpoint.methods[0];
        assert_eq!(method.verb, "get");
        assert_eq!(method.responses.len(), 1);

        let response = &method.responses["200"];
        assert_eq!(response.description, "OK");
        assert!(response.schema.is_none());
        assert!(response.headers.is_empty());
        assert!(response.examples.is_empty());
    }

    #[test]
    fn fails_fast_on_operations_without_responses() {
        let err = build_yaml(
            r#"
swagger: "2.0"
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
    fn body_parameter_goes_last() {
        let spec = build_yaml(
            r#"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    post:
      parameters:
        - name: payload
          in: body
          schema:
            type: object
        - name: dryRun
          in: query
          type: boolean
      responses:
        "201":
          description: Created
"#,
        )
        .unwrap();

        let parameters = &spec.endpoints[0].methods[0].parameters;
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[0].name, "dryRun");
        assert_eq!(parameters[1].location, ParameterLocation::Body);
        assert_eq!(parameters[1].type_name, "object");
    }

    #[test]
    fn rejects_a_second_body_parameter() {
        let err = build_yaml(
            r#"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    post:
      parameters:
        - name: one
          in: body
          schema:
            type: object
        - name: two
          in: body
          schema:
            type: object
      responses:
        "201":
          description: Created
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn body_parameter_requires_a_schema() {
        let err = build_yaml(
            r#"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    post:
      parameters:
        - name: payload
          in: body
      responses:
        "201":
          description: Created
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn path_parameter_must_declare_required() {
        let err = build_yaml(
            r#"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets/{id}:
    get:
      parameters:
        - name: id
          in: path
          type: integer
      responses:
        "200":
          description: OK
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn resolves_parameter_references_with_names() {
        let spec = build_yaml(
            r##"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
parameters:
  Limit:
    name: limit
    in: query
    type: integer
paths:
  /pets:
    get:
      parameters:
        - $ref: "#/parameters/Limit"
      responses:
        "200":
          description: OK
"##,
        )
        .unwrap();

        let parameter = &spec.endpoints[0].methods[0].parameters[0];
        assert_eq!(parameter.title.as_deref(), Some("Limit"));
        assert_eq!(parameter.name, "limit");
    }

    // The original implementation iterated response examples in a way that
    // contradicts their declared two-level {mime -> {key -> value}} shape;
    // this builder follows the declared shape.
    #[test]
    fn examples_follow_the_declared_two_level_shape() {
        let spec = build_yaml(
            r#"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    get:
      responses:
        "200":
          description: OK
          examples:
            application/json:
              name: Rex
"#,
        )
        .unwrap();

        let examples = &spec.endpoints[0].methods[0].responses["200"].examples;
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].mime_type, "application/json");
        assert_eq!(examples[0].key, "name");
        assert_eq!(examples[0].value, "Rex");
    }

    #[test]
    fn joins_host_and_base_path() {
        let spec = build_yaml(
            r#"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
host: api.example.com
basePath: /v2
paths: {}
"#,
        )
        .unwrap();
        assert_eq!(spec.base_url, "api.example.com/v2");
    }

    #[test]
    fn builds_oauth2_security_definitions() {
        let spec = build_yaml(
            r#"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
paths: {}
securityDefinitions:
  petstore_auth:
    type: oauth2
    flow: application
    tokenUrl: https://example.com/oauth/token
    scopes:
      read:pets: Read pets
"#,
        )
        .unwrap();

        let scheme = &spec.security_schemes[0];
        assert_eq!(scheme.title, "petstore_auth");
        assert_eq!(scheme.flow, "application");
        assert_eq!(scheme.token_url, "https://example.com/oauth/token");
        assert_eq!(scheme.scopes[0].name, "read:pets");
    }

    #[test]
    fn security_requirements_are_flattened() {
        let spec = build_yaml(
            r#"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    get:
      security:
        - petstore_auth:
            - read:pets
      responses:
        "200":
          description: OK
"#,
        )
        .unwrap();

        let requirement = &spec.endpoints[0].methods[0].security_requirements[0];
        assert_eq!(requirement.name, "petstore_auth");
        assert_eq!(requirement.scopes, vec!["read:pets".to_string()]);
    }

    // additionalProperties is only accepted as a nested schema; the boolean
    // toggle the newer dialect's text allows is rejected here too.
    #[test]
    fn boolean_additional_properties_is_rejected() {
        let err = build_yaml(
            r##"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
definitions:
  Loose:
    type: object
    additionalProperties: true
paths:
  /pets:
    get:
      responses:
        "200":
          description: OK
          schema:
            $ref: "#/definitions/Loose"
"##,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
