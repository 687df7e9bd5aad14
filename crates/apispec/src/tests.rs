//! End-to-end tests across the codec, registry, builders and projector.

use serde_json::Value;

use crate::codec::{self, CONTENT_TYPE_YAML};
use crate::model::ParameterLocation;
use crate::registry::DialectRegistry;

#[test]
fn normalizes_an_older_dialect_document() {
    let registry = DialectRegistry::with_default_dialects();
    let spec = codec::specification_from_str(
        &registry,
        CONTENT_TYPE_YAML,
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
fn round_trip_through_the_newer_dialect_is_stable() {
    let registry = DialectRegistry::with_default_dialects();
    let input = r##"
openapi: "3.0.1"
info:
  title: Petstore
  description: A sample API
  license:
    name: MIT
    url: https://opensource.org/licenses/MIT
  version: "1.0.0"
servers:
  - url: https://api.example.com/v1
components:
  schemas:
    Pet:
      type: object
      required: [name]
      properties:
        name:
          type: string
        tag:
          type: string
  responses:
    NotFound:
      description: Resource missing
  parameters:
    Limit:
      name: limit
      in: query
      description: Max records
      schema:
        type: integer
        format: int32
  securitySchemes:
    petstore_auth:
      type: oauth2
      flows:
        clientCredentials:
          tokenUrl: https://example.com/oauth/token
          scopes:
            read:pets: Read pets
paths:
  /pets:
    get:
      operationId: listPets
      summary: List pets
      parameters:
        - $ref: "#/components/parameters/Limit"
      security:
        - petstore_auth: [read:pets]
      responses:
        "200":
          description: OK
          headers:
            X-RateLimit:
              description: Remaining calls
              schema:
                type: integer
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Pet"
        "404":
          $ref: "#/components/responses/NotFound"
    post:
      operationId: createPet
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
"##;

    let first = codec::specification_from_str(&registry, CONTENT_TYPE_YAML, input).unwrap();
    let emitted =
        codec::specification_to_string(&registry, CONTENT_TYPE_YAML, "openapi3", &first).unwrap();
    let second = codec::specification_from_str(&registry, CONTENT_TYPE_YAML, &emitted).unwrap();

    assert_eq!(first, second);
}

#[test]
fn converts_the_older_dialect_to_the_newer_one() {
    let registry = DialectRegistry::with_default_dialects();
    let spec = codec::specification_from_str(
        &registry,
        CONTENT_TYPE_YAML,
        r##"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
host: api.example.com
basePath: /v2
definitions:
  Pet:
    type: object
paths:
  /pets:
    get:
      parameters:
        - name: tags
          in: query
          type: array
          collectionFormat: multi
          items:
            type: string
      responses:
        "200":
          description: OK
          schema:
            $ref: "#/definitions/Pet"
"##,
    )
    .unwrap();

    let document = registry
        .select_by_name("openapi3")
        .unwrap()
        .project(&spec)
        .unwrap();

    assert_eq!(document["servers"][0]["url"], "api.example.com/v2");

    let parameter = &document["paths"]["/pets"]["get"]["parameters"][0];
    assert_eq!(parameter["style"], "form");
    assert_eq!(parameter["explode"], true);
    assert_eq!(parameter["schema"]["items"]["type"], "string");

    let response = &document["paths"]["/pets"]["get"]["responses"]["200"];
    assert_eq!(
        response["content"]["application/json"]["schema"],
        serde_json::json!({ "$ref": "#/components/schemas/Pet" })
    );
    assert_eq!(document["components"]["schemas"]["Pet"]["type"], "object");
}

#[test]
fn converted_documents_build_under_the_newer_dialect() {
    let registry = DialectRegistry::with_default_dialects();
    let spec = codec::specification_from_str(
        &registry,
        CONTENT_TYPE_YAML,
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
          required: true
          schema:
            type: object
      responses:
        "201":
          description: Created
"#,
    )
    .unwrap();

    let emitted =
        codec::specification_to_string(&registry, CONTENT_TYPE_YAML, "openapi3", &spec).unwrap();
    let root: Value = serde_yaml::from_str(&emitted).unwrap();
    assert_eq!(registry.select(&root).unwrap().name(), "openapi3");

    let rebuilt = codec::specification_from_str(&registry, CONTENT_TYPE_YAML, &emitted).unwrap();
    let body = &rebuilt.endpoints[0].methods[0].parameters[0];
    assert_eq!(body.location, ParameterLocation::Body);
    assert!(body.required);
    assert_eq!(body.type_name, "object");
}
