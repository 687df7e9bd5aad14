//! API description normalizer.
//!
//! Reads Swagger 2.0 and OpenAPI 3.x documents into one canonical,
//! dialect-independent [`model::Specification`], and projects the model back
//! out as an OpenAPI 3.x document. Auto-detects the dialect from the root
//! `swagger` or `openapi` version field.

mod build;
#[cfg(test)]
mod tests;

pub mod codec;
pub mod dialect;
pub mod error;
pub mod model;
pub mod registry;
pub mod resolver;

pub use codec::{
    decode_document, encode_document, specification_from_str, specification_to_string,
};
pub use error::Error;
pub use model::Specification;
pub use registry::DialectRegistry;
