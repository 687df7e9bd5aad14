//! The newer dialect: version declared under the `openapi` key (major 3),
//! reusable nodes gathered in a dedicated `components` section, request
//! payloads expressed as `requestBody` with a media-type indirection, and
//! array encodings expressed as `style`/`explode` pairs. This dialect is
//! both a build source and the emission target.

mod builder;
mod document;
mod projector;

use serde_json::Value;

use crate::dialect::{major_version, Dialect};
use crate::error::Error;
use crate::model::Specification;

pub struct OpenApi3;

impl Dialect for OpenApi3 {
    fn name(&self) -> &'static str {
        "openapi3"
    }

    fn is_adequate(&self, root: &Value) -> bool {
        root.get("openapi")
            .and_then(Value::as_str)
            .is_some_and(|version| major_version(version) == "3")
    }

    fn build(&self, root: &Value) -> Result<Specification, Error> {
        builder::build(root)
    }

    fn project(&self, spec: &Specification) -> Result<Value, Error> {
        Ok(projector::project(spec))
    }
}
