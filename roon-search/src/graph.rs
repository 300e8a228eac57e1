//! Relationship graph walker.
//!
//! Starting from a root entity, follows every foreign-key and reverse edge to
//! find all related entities reachable by field paths, recording the relation
//! path (`answers__question`) that leads to each one.

use std::{collections::HashSet, sync::Arc};

use crate::{
    errors::SearchError,
    schema::{EntityDescriptor, PATH_SEPARATOR, SchemaRegistry},
};

/// An entity reached from the root through `prefix`.
#[derive(Debug, Clone)]
pub struct DiscoveredEntity {
    /// Name of the edge that reached this entity. Empty for the root.
    pub name: String,
    /// Composed relation path from the root. Empty for the root.
    pub prefix: String,
    pub descriptor: Arc<EntityDescriptor>,
}

/// Result of walking the relationship graph from one root.
///
/// Entry 0 is the root. The set of seen `(edge name, target table)` pairs is
/// the cycle guard: an edge already seen with the same target is not followed
/// again, even under a different prefix.
#[derive(Debug, Clone)]
pub struct Discovery {
    entries: Vec<DiscoveredEntity>,
    seen: HashSet<(String, String)>,
}

impl Discovery {
    #[must_use]
    pub fn root(&self) -> &DiscoveredEntity {
        &self.entries[0]
    }

    /// Every discovered entity except the root, in discovery order.
    pub fn nested(&self) -> impl Iterator<Item = &DiscoveredEntity> {
        self.entries.iter().skip(1)
    }
}

/// Walk the relationship graph from `root`.
///
/// Uses an explicit work stack, popping from the tail. Edges to entities that
/// are not registered are skipped, as are many-to-many edges.
///
/// # Errors
///
/// Returns `UnknownEntity` when `root` is not registered.
pub fn discover(registry: &SchemaRegistry, root: &str) -> Result<Discovery, SearchError> {
    let root_descriptor = registry.descriptor(root)?;

    let mut discovery = Discovery {
        entries: vec![DiscoveredEntity {
            name: String::new(),
            prefix: String::new(),
            descriptor: Arc::clone(root_descriptor),
        }],
        seen: HashSet::new(),
    };
    let mut stack = vec![0_usize];

    while let Some(current) = stack.pop() {
        let parent = discovery.entries[current].clone();

        for edge in parent.descriptor.relationships() {
            if !edge.is_traversable() {
                continue;
            }
            let key = (edge.name.clone(), edge.target.clone());
            if discovery.seen.contains(&key) {
                continue;
            }
            let Some(target) = registry.get(&edge.target) else {
                tracing::debug!(
                    root,
                    edge = %edge.name,
                    target = %edge.target,
                    "Skipping relationship to unregistered entity"
                );
                continue;
            };

            let prefix = if parent.prefix.is_empty() {
                edge.name.clone()
            } else {
                format!("{}{PATH_SEPARATOR}{}", parent.prefix, edge.name)
            };

            discovery.entries.push(DiscoveredEntity {
                name: edge.name.clone(),
                prefix,
                descriptor: Arc::clone(target),
            });
            discovery.seen.insert(key);
            stack.push(discovery.entries.len() - 1);
        }
    }

    Ok(discovery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntityDescriptor, FieldKind, RelationshipEdge, fixtures};

    fn prefixes(discovery: &Discovery) -> Vec<&str> {
        discovery.nested().map(|e| e.prefix.as_str()).collect()
    }

    #[test]
    fn test_discovers_reachable_entities_from_questions() {
        let registry = fixtures::registry();
        let discovery = discover(&registry, "questions").unwrap();

        assert_eq!(discovery.root().descriptor.name(), "questions");
        assert!(discovery.root().prefix.is_empty());

        let mut found = prefixes(&discovery);
        found.sort_unstable();
        assert_eq!(
            found,
            vec![
                "answers",
                "answers__canonical_for",
                "answers__question",
                "canonical_answer",
            ]
        );
    }

    #[test]
    fn test_unregistered_and_junction_edges_are_skipped() {
        let registry = fixtures::registry();
        let discovery = discover(&registry, "questions").unwrap();
        assert!(discovery.nested().all(|e| e.descriptor.name() != "users"));
        assert!(discovery.nested().all(|e| e.descriptor.name() != "question_topics"));
        assert!(discovery.nested().all(|e| !e.prefix.contains("tags")));
    }

    #[test]
    fn test_cycle_terminates() {
        let registry = SchemaRegistry::builder()
            .entity(
                EntityDescriptor::builder("nodes")
                    .field("node_id", FieldKind::Uuid)
                    .field("parent_id", FieldKind::Uuid)
                    .relationship(RelationshipEdge::to_one("parent", "nodes", "parent_id", "node_id"))
                    .relationship(RelationshipEdge::reverse_many(
                        "children", "nodes", "node_id", "parent_id",
                    ))
                    .build(),
            )
            .build()
            .unwrap();

        let discovery = discover(&registry, "nodes").unwrap();
        let mut found = prefixes(&discovery);
        found.sort_unstable();
        assert_eq!(found, vec!["children", "parent"]);
    }

    #[test]
    fn test_leaf_entity_has_only_root() {
        let registry = fixtures::registry();
        let discovery = discover(&registry, "answer_tags").unwrap();
        assert_eq!(discovery.nested().count(), 0);
    }

    #[test]
    fn test_unknown_root() {
        let registry = fixtures::registry();
        assert!(matches!(
            discover(&registry, "users"),
            Err(SearchError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_discovery_is_memoised_by_registry() {
        let registry = fixtures::registry();
        let first = registry.discovery("answers").unwrap();
        let second = registry.discovery("answers").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
