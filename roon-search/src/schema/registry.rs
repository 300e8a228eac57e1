use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use super::{
    EntityDescriptor, FieldKind, PATH_SEPARATOR, RelationshipEdge, RenameTable, Searchable,
};
use crate::{errors::SearchError, graph::Discovery};

/// One relationship crossed while resolving a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    /// Table the edge starts from.
    pub owner: String,
    pub edge: RelationshipEdge,
}

/// A field path resolved down to a concrete column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub hops: Vec<Hop>,
    /// Table that owns `column`.
    pub table: String,
    pub column: String,
    pub kind: FieldKind,
}

impl ResolvedPath {
    #[must_use]
    pub fn is_nested(&self) -> bool {
        !self.hops.is_empty()
    }
}

/// Every searchable entity, keyed by table name.
///
/// Built once at startup and shared behind an `Arc`. Relationship discovery
/// and merged rename tables are computed on first use per root and kept for
/// the life of the registry.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entities: HashMap<String, Arc<EntityDescriptor>>,
    discoveries: RwLock<HashMap<String, Arc<Discovery>>>,
    merged_renames: RwLock<HashMap<String, Arc<RenameTable>>>,
}

#[derive(Default)]
pub struct SchemaRegistryBuilder {
    entities: Vec<EntityDescriptor>,
}

impl SchemaRegistryBuilder {
    #[must_use]
    pub fn register<E: Searchable>(self) -> Self {
        self.entity(E::descriptor())
    }

    #[must_use]
    pub fn entity(mut self, descriptor: EntityDescriptor) -> Self {
        self.entities.push(descriptor);
        self
    }

    /// Finish the registry and check every entity's merged rename table.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedRename` when a rename (own or inherited from a
    /// related entity) points at a path that does not exist.
    pub fn build(self) -> Result<SchemaRegistry, SearchError> {
        let registry = SchemaRegistry {
            entities: self
                .entities
                .into_iter()
                .map(|d| (d.name().to_string(), Arc::new(d)))
                .collect(),
            ..SchemaRegistry::default()
        };

        let mut names: Vec<String> = registry.entities.keys().cloned().collect();
        names.sort();
        for name in &names {
            registry.renames(name)?;
        }

        tracing::debug!(entities = ?names, "Search schema registry built");
        Ok(registry)
    }
}

impl SchemaRegistry {
    #[must_use]
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    #[must_use]
    pub fn get(&self, table: &str) -> Option<&Arc<EntityDescriptor>> {
        self.entities.get(table)
    }

    #[must_use]
    pub fn contains(&self, table: &str) -> bool {
        self.entities.contains_key(table)
    }

    /// # Errors
    ///
    /// Returns `UnknownEntity` when `table` was never registered.
    pub fn descriptor(&self, table: &str) -> Result<&Arc<EntityDescriptor>, SearchError> {
        self.get(table)
            .ok_or_else(|| SearchError::UnknownEntity(table.to_string()))
    }

    /// Every entity reachable from `root`, memoised.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntity` when `root` was never registered.
    pub fn discovery(&self, root: &str) -> Result<Arc<Discovery>, SearchError> {
        if let Some(found) = self
            .discoveries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(root)
        {
            return Ok(Arc::clone(found));
        }

        let discovery = Arc::new(crate::graph::discover(self, root)?);
        self.discoveries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(root.to_string(), Arc::clone(&discovery));
        Ok(discovery)
    }

    /// Root renames followed by every discovered entity's renames, prefixed
    /// with its relation path. Memoised and validated on first use.
    ///
    /// # Errors
    ///
    /// `UnknownEntity` for an unregistered root, `UnresolvedRename` for a
    /// rename whose target does not resolve from `root`.
    pub fn renames(&self, root: &str) -> Result<Arc<RenameTable>, SearchError> {
        if let Some(found) = self
            .merged_renames
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(root)
        {
            return Ok(Arc::clone(found));
        }

        let discovery = self.discovery(root)?;
        let mut merged = discovery.root().descriptor.renames().clone();
        for nested in discovery.nested() {
            merged.extend(&nested.descriptor.renames().prefixed(&nested.prefix));
        }

        for (key, target) in merged.iter() {
            if self.resolve_path(root, target).is_err() {
                return Err(SearchError::UnresolvedRename {
                    entity: root.to_string(),
                    key: key.to_string(),
                    target: target.to_string(),
                });
            }
        }

        let merged = Arc::new(merged);
        self.merged_renames
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(root.to_string(), Arc::clone(&merged));
        Ok(merged)
    }

    /// Resolve a `__`-delimited path from `root` to a column.
    ///
    /// Every segment but the last must name a relationship whose target is
    /// registered. The last segment names a field, or a foreign-key edge, in
    /// which case the key column on the owning side is used.
    ///
    /// # Errors
    ///
    /// `UnknownField` when any segment fails to resolve.
    pub fn resolve_path(&self, root: &str, path: &str) -> Result<ResolvedPath, SearchError> {
        let unknown = || SearchError::unknown_field(root, path);

        let mut current = self.descriptor(root)?;
        let mut hops = Vec::new();
        let mut segments = path.split(PATH_SEPARATOR).peekable();

        while let Some(segment) = segments.next() {
            if segment.is_empty() {
                return Err(unknown());
            }

            if segments.peek().is_none() {
                if let Some(field) = current.field(segment) {
                    return Ok(ResolvedPath {
                        hops,
                        table: current.name().to_string(),
                        column: field.name.clone(),
                        kind: field.kind,
                    });
                }
                let edge = current
                    .relationship(segment)
                    .filter(|edge| edge.is_foreign_key())
                    .ok_or_else(unknown)?;
                let kind = current
                    .field(&edge.local_column)
                    .map_or(FieldKind::Other, |f| f.kind);
                return Ok(ResolvedPath {
                    hops,
                    table: current.name().to_string(),
                    column: edge.local_column.clone(),
                    kind,
                });
            }

            let edge = current.relationship(segment).ok_or_else(unknown)?;
            let next = self.get(&edge.target).ok_or_else(unknown)?;
            hops.push(Hop {
                owner: current.name().to_string(),
                edge: edge.clone(),
            });
            current = next;
        }

        Err(unknown())
    }
}
