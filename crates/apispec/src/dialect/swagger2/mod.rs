//! The older dialect: a single self-contained document declaring its version
//! under the `swagger` key (major 2), with reusable nodes spread over the
//! `definitions`, `parameters`, `responses` and `securityDefinitions`
//! sections. Build-only; this dialect is not an emission target.

mod builder;
mod document;

use serde_json::Value;

use crate::dialect::{major_version, Dialect};
use crate::error::Error;
use crate::model::Specification;

pub struct Swagger2;

impl Dialect for Swagger2 {
    fn name(&self) -> &'static str {
        "swagger2"
    }

    fn is_adequate(&self, root: &Value) -> bool {
        root.get("swagger")
            .and_then(Value::as_str)
            .is_some_and(|version| major_version(version) == "2")
    }

    fn build(&self, root: &Value) -> Result<Specification, Error> {
        builder::build(root)
    }
}
