use std::sync::Arc;

use sea_orm::{
    Condition, EntityTrait, QueryFilter, Select,
    sea_query::{Alias, Expr},
};

use super::predicate::Predicate;
use crate::{
    errors::SearchError,
    schema::{EntityDescriptor, FieldKind, SchemaRegistry},
};

/// Column that marks a record as active.
pub const ACTIVE_FIELD: &str = "is_active";

/// A filtered view over one root entity.
///
/// Every predicate is compiled as soon as it is added, so an invalid path
/// fails at `filter` rather than when the query runs.
#[derive(Debug, Clone)]
pub struct QueryScope {
    registry: Arc<SchemaRegistry>,
    root: Arc<EntityDescriptor>,
    predicates: Vec<Predicate>,
    condition: Condition,
    active_only: bool,
}

impl QueryScope {
    /// Unfiltered scope over `root`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntity` when `root` is not registered.
    pub fn new(registry: Arc<SchemaRegistry>, root: &str) -> Result<Self, SearchError> {
        let root = Arc::clone(registry.descriptor(root)?);
        Ok(Self {
            registry,
            root,
            predicates: Vec::new(),
            condition: Condition::all(),
            active_only: false,
        })
    }

    /// Narrow the scope. Predicates added one after another are ANDed.
    ///
    /// # Errors
    ///
    /// Any error from compiling `predicate` against the root schema.
    pub fn filter(mut self, predicate: Predicate) -> Result<Self, SearchError> {
        let compiled = predicate.compile(&self.registry, self.root.name())?;
        self.condition = self.condition.add(compiled);
        self.predicates.push(predicate);
        Ok(self)
    }

    /// Restrict to active records. Roots without an `is_active` flag are
    /// left as they are.
    #[must_use]
    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    /// Lift the active-only restriction.
    #[must_use]
    pub fn include_inactive(mut self) -> Self {
        self.active_only = false;
        self
    }

    #[must_use]
    pub fn is_active_only(&self) -> bool {
        self.active_only
    }

    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    #[must_use]
    pub fn root(&self) -> &EntityDescriptor {
        &self.root
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// The full condition, including the active-only restriction.
    #[must_use]
    pub fn condition(&self) -> Condition {
        let has_flag = self
            .root
            .field(ACTIVE_FIELD)
            .is_some_and(|f| f.kind == FieldKind::Boolean);

        if self.active_only && has_flag {
            self.condition.clone().add(
                Expr::col((Alias::new(self.root.name()), Alias::new(ACTIVE_FIELD))).eq(true),
            )
        } else {
            self.condition.clone()
        }
    }

    pub fn apply<E: EntityTrait>(&self, select: Select<E>) -> Select<E> {
        select.filter(self.condition())
    }
}
