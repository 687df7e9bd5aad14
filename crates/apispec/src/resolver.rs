//! Intra-document pointer resolution.
//!
//! A pointer is a string of the form `#/segment/segment/...` walked as
//! successive mapping keys from the document root. The final segment doubles
//! as the resolved node's inferred component name.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

/// A node that is statically either an inline value or a pointer to one.
///
/// Deserializing probes the reference shape first, so a mapping carrying a
/// `$ref` key is always treated as a reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaybeRef<T> {
    Reference(Reference),
    Value(T),
}

/// A raw pointer-reference node.
#[derive(Debug, Clone, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub pointer: String,
}

/// Resolves `pointer` against `root`, returning the target node and its
/// inferred name (the final path segment).
pub fn resolve<'v, 'p>(root: &'v Value, pointer: &'p str) -> Result<(&'v Value, &'p str), Error> {
    let mut segments = pointer.split('/');

    if segments.next() != Some("#") {
        return Err(Error::UnanchoredReference {
            pointer: pointer.to_string(),
        });
    }

    let mut current = root;
    let mut name = "";

    for segment in segments {
        current = current.get(segment).ok_or_else(|| Error::DanglingReference {
            pointer: pointer.to_string(),
            segment: segment.to_string(),
        })?;
        name = segment;
    }

    Ok((current, name))
}
