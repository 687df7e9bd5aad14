//! Machinery shared by both dialects' model builders.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dialect::common::{SchemaObject, SecurityField};
use crate::error::Error;
use crate::model::{SchemaArena, SchemaId, SchemaNode, SecurityRequirement};
use crate::resolver::{self, MaybeRef};

/// Longest chain of reference-to-reference hops the builder will follow.
const MAX_REFERENCE_CHAIN: usize = 32;

/// Memo key: a named node's identity is its name alone; the local key under
/// which a reference appears varies per call site and must not split it.
type VisitKey = (Option<String>, Option<String>);

/// Mutable state of one model build. Never shared between documents: the
/// schema arena and the cycle memo table are scoped to a single session.
pub(crate) struct BuildSession<'a> {
    root: &'a Value,
    arena: SchemaArena,
    visited: HashMap<VisitKey, SchemaId>,
}

impl<'a> BuildSession<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            arena: SchemaArena::new(),
            visited: HashMap::new(),
        }
    }

    pub fn finish(self) -> SchemaArena {
        self.arena
    }

    /// Resolves a node to its inline value, following reference chains, and
    /// returns the value with its inferred component name (the last resolved
    /// segment, `None` when the node was inline to begin with).
    pub fn deref<T>(&self, node: &MaybeRef<T>) -> Result<(T, Option<String>), Error>
    where
        T: DeserializeOwned + Clone,
    {
        let reference = match node {
            MaybeRef::Value(value) => return Ok((value.clone(), None)),
            MaybeRef::Reference(reference) => reference,
        };

        let mut pointer = reference.pointer.clone();

        for _ in 0..MAX_REFERENCE_CHAIN {
            let (target, segment) = resolver::resolve(self.root, &pointer)?;
            let name = segment.to_string();

            match from_value::<MaybeRef<T>>(target)? {
                MaybeRef::Value(value) => return Ok((value, Some(name))),
                MaybeRef::Reference(next) => pointer = next.pointer,
            }
        }

        Err(Error::Validation(format!(
            "reference chain starting at '{}' does not terminate",
            reference.pointer
        )))
    }

    /// Builds a schema node into the arena and returns its index.
    ///
    /// A node reached through a reference is registered in the memo table
    /// before its children are expanded, so self-referential and mutually
    /// referential schemas resolve to the in-progress entity instead of
    /// recursing forever, and every occurrence of a named schema is the same
    /// arena node.
    pub fn build_schema(
        &mut self,
        node: Option<&MaybeRef<SchemaObject>>,
        name: Option<String>,
        key: Option<String>,
    ) -> Result<Option<SchemaId>, Error> {
        let node = match node {
            Some(node) => node,
            None => return Ok(None),
        };

        let reference = match node {
            MaybeRef::Value(schema) => return self.build_schema_value(schema, name, key),
            MaybeRef::Reference(reference) => reference,
        };

        let mut pointer = reference.pointer.clone();

        for _ in 0..MAX_REFERENCE_CHAIN {
            let (target, segment) = resolver::resolve(self.root, &pointer)?;
            let name = segment.to_string();

            if let Some(id) = self.visited.get(&(Some(name.clone()), None)) {
                return Ok(Some(*id));
            }

            match from_value::<MaybeRef<SchemaObject>>(target)? {
                MaybeRef::Value(schema) => {
                    return self.build_schema_value(&schema, Some(name), None)
                }
                MaybeRef::Reference(next) => pointer = next.pointer,
            }
        }

        Err(Error::Validation(format!(
            "reference chain starting at '{}' does not terminate",
            reference.pointer
        )))
    }

    fn build_schema_value(
        &mut self,
        schema: &SchemaObject,
        name: Option<String>,
        key: Option<String>,
    ) -> Result<Option<SchemaId>, Error> {
        schema.validate()?;

        // Placeholder first: children built below may point back here.
        let id = self.arena.alloc(SchemaNode {
            name: name.clone(),
            key: key.clone(),
            description: schema.description(),
            type_name: schema.type_name.clone(),
            format: schema.format.clone(),
            default: schema.default.clone(),
            required: schema.required.clone(),
            enum_values: schema.enum_values.clone(),
            properties: Vec::new(),
            items: None,
        });
        self.visited.insert((name, key), id);

        let mut properties = Vec::new();
        for (property_key, property) in &schema.properties {
            if let Some(child) =
                self.build_schema(Some(property), None, Some(property_key.clone()))?
            {
                properties.push((property_key.clone(), child));
            }
        }
        let items = self.build_schema(schema.items.as_deref(), None, None)?;

        let node = self.arena.get_mut(id);
        node.properties = properties;
        node.items = items;
        Ok(Some(id))
    }
}

/// Deserializes a field tree into a typed document object, surfacing the
/// declarative layer's message as a structural validation error.
pub(crate) fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, Error> {
    serde_json::from_value(value.clone()).map_err(|e| Error::Validation(e.to_string()))
}

/// Flattens a raw `security` field into canonical requirements.
pub(crate) fn build_security_requirements(field: &SecurityField) -> Vec<SecurityRequirement> {
    field
        .iter()
        .flat_map(|requirement| {
            requirement.iter().map(|(name, scopes)| SecurityRequirement {
                name: name.clone(),
                scopes: scopes.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_ref(pointer: &str) -> MaybeRef<SchemaObject> {
        serde_json::from_value(json!({ "$ref": pointer })).unwrap()
    }

    #[test]
    fn self_referential_schema_is_one_entity() {
        let root = json!({
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "next": { "$ref": "#/definitions/Node" }
                    }
                }
            }
        });

        let mut session = BuildSession::new(&root);
        let id = session
            .build_schema(Some(&schema_ref("#/definitions/Node")), None, None)
            .unwrap()
            .unwrap();

        let arena = session.finish();
        assert_eq!(arena.len(), 1);

        let node = arena.get(id);
        assert_eq!(node.name.as_deref(), Some("Node"));
        assert_eq!(node.properties, vec![("next".to_string(), id)]);
    }

    #[test]
    fn two_references_share_one_node() {
        let root = json!({
            "definitions": {
                "Pet": { "type": "object" }
            }
        });

        let mut session = BuildSession::new(&root);
        let first = session
            .build_schema(Some(&schema_ref("#/definitions/Pet")), None, None)
            .unwrap();
        let second = session
            .build_schema(Some(&schema_ref("#/definitions/Pet")), None, None)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(session.finish().len(), 1);
    }

    #[test]
    fn reference_chains_resolve_to_the_final_target() {
        let root = json!({
            "definitions": {
                "Alias": { "$ref": "#/definitions/Pet" },
                "Pet": { "type": "object" }
            }
        });

        let mut session = BuildSession::new(&root);
        let id = session
            .build_schema(Some(&schema_ref("#/definitions/Alias")), None, None)
            .unwrap()
            .unwrap();

        assert_eq!(session.finish().get(id).name.as_deref(), Some("Pet"));
    }

    #[test]
    fn circular_alias_chains_fail_instead_of_recursing() {
        let root = json!({
            "definitions": {
                "A": { "$ref": "#/definitions/B" },
                "B": { "$ref": "#/definitions/A" }
            }
        });

        let mut session = BuildSession::new(&root);
        let err = session
            .build_schema(Some(&schema_ref("#/definitions/A")), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn array_schema_without_items_is_rejected() {
        let root = json!({
            "definitions": {
                "Broken": { "type": "array" }
            }
        });

        let mut session = BuildSession::new(&root);
        let err = session
            .build_schema(Some(&schema_ref("#/definitions/Broken")), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
