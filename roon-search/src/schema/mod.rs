//! # Schema Reflection
//!
//! The engine never inspects entities at query time. Instead every searchable
//! entity is described once, up front, by an [`EntityDescriptor`]:
//!
//! - its scalar fields and their [`FieldKind`]
//! - its [`RelationshipEdge`]s to other entities
//! - its [`RenameTable`] of client-facing aliases
//!
//! Descriptors are usually reflected from a Sea-ORM entity through the
//! [`Searchable`] trait; tests and external schemas can declare them with
//! [`EntityDescriptor::builder`].

mod entity;
mod registry;

pub use entity::Searchable;
pub use registry::{Hop, ResolvedPath, SchemaRegistry, SchemaRegistryBuilder};

use sea_orm::{ColumnTrait, EntityTrait, IdenStatic, Iterable, sea_query::ColumnType};

/// Separator between relationship names in a field path.
pub const PATH_SEPARATOR: &str = "__";

/// Storage kind of a scalar field, as far as search cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Boolean,
    DateTime,
    Date,
    Text,
    Uuid,
    Integer,
    Float,
    Other,
}

impl FieldKind {
    #[must_use]
    pub fn is_temporal(self) -> bool {
        matches!(self, Self::DateTime | Self::Date)
    }
}

impl From<&ColumnType> for FieldKind {
    fn from(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::Boolean => Self::Boolean,
            ColumnType::DateTime | ColumnType::Timestamp | ColumnType::TimestampWithTimeZone => {
                Self::DateTime
            }
            ColumnType::Date => Self::Date,
            ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text => Self::Text,
            ColumnType::Uuid => Self::Uuid,
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned => Self::Integer,
            ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_) | ColumnType::Money(_) => {
                Self::Float
            }
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// Which side of the relationship holds the foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The owning entity holds the key (or the junction row does).
    Forward,
    /// The target holds a key pointing back at the owner.
    Reverse,
}

/// Through table of a many-to-many edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    pub table: String,
    /// Junction column matching the owner's `local_column`.
    pub owner_column: String,
    /// Junction column matching the target's `remote_column`.
    pub target_column: String,
}

/// A named edge from one entity to another.
///
/// Whatever the direction, filtering through the edge means
/// `owner.local_column IN (SELECT target.remote_column FROM target ...)`,
/// with one extra subquery level through the junction table when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipEdge {
    pub name: String,
    /// Table name of the target entity.
    pub target: String,
    pub cardinality: Cardinality,
    pub direction: Direction,
    pub local_column: String,
    pub remote_column: String,
    pub junction: Option<Junction>,
}

impl RelationshipEdge {
    /// Foreign key held by the owner, e.g. `answers.question_id -> questions.question_id`.
    pub fn to_one(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::ToOne,
            direction: Direction::Forward,
            local_column: foreign_key.into(),
            remote_column: target_key.into(),
            junction: None,
        }
    }

    /// Reverse accessor of a foreign key held by many target rows.
    pub fn reverse_many(
        name: impl Into<String>,
        target: impl Into<String>,
        key: impl Into<String>,
        target_foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::ToMany,
            direction: Direction::Reverse,
            local_column: key.into(),
            remote_column: target_foreign_key.into(),
            junction: None,
        }
    }

    /// Reverse accessor of a one-to-one key held by the target.
    pub fn reverse_one(
        name: impl Into<String>,
        target: impl Into<String>,
        key: impl Into<String>,
        target_foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            cardinality: Cardinality::ToOne,
            ..Self::reverse_many(name, target, key, target_foreign_key)
        }
    }

    pub fn many_to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        key: impl Into<String>,
        junction: Junction,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::ToMany,
            direction: Direction::Forward,
            local_column: key.into(),
            remote_column: target_key.into(),
            junction: Some(junction),
        }
    }

    /// Whether the graph walker follows this edge. Many-to-many edges are
    /// usable in field paths but never walked.
    #[must_use]
    pub fn is_traversable(&self) -> bool {
        self.junction.is_none()
    }

    /// A forward to-one edge names a column on the owner and can end a path.
    #[must_use]
    pub fn is_foreign_key(&self) -> bool {
        self.cardinality == Cardinality::ToOne
            && self.direction == Direction::Forward
            && self.junction.is_none()
    }
}

impl Junction {
    pub fn new(
        table: impl Into<String>,
        owner_column: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            owner_column: owner_column.into(),
            target_column: target_column.into(),
        }
    }
}

/// Ordered `client key -> storage path` aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTable {
    entries: Vec<(String, String)>,
}

impl RenameTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        self.insert(key, path);
        self
    }

    /// Add or replace an alias. Replacing keeps the original position.
    pub fn insert(&mut self, key: impl Into<String>, path: impl Into<String>) {
        let key = key.into();
        let path = path.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = path,
            None => self.entries.push((key, path)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copy with `prefix__` prepended to both sides of every entry.
    #[must_use]
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| {
                    (
                        format!("{prefix}{PATH_SEPARATOR}{k}"),
                        format!("{prefix}{PATH_SEPARATOR}{v}"),
                    )
                })
                .collect(),
        }
    }

    pub fn extend(&mut self, other: &Self) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }
}

/// Everything the engine knows about one searchable entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    relationships: Vec<RelationshipEdge>,
    renames: RenameTable,
}

impl EntityDescriptor {
    /// Start a declared descriptor for `table`.
    pub fn builder(table: impl Into<String>) -> EntityDescriptorBuilder {
        EntityDescriptorBuilder {
            descriptor: Self {
                name: table.into(),
                fields: Vec::new(),
                relationships: Vec::new(),
                renames: RenameTable::new(),
            },
        }
    }

    /// Start from the table name and columns of a Sea-ORM entity.
    #[must_use]
    pub fn reflect<E: EntityTrait>() -> EntityDescriptorBuilder {
        let mut builder = Self::builder(E::default().table_name());
        for column in E::Column::iter() {
            let kind = FieldKind::from(column.def().get_column_type());
            builder = builder.field(column.as_str(), kind);
        }
        builder
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn relationships(&self) -> &[RelationshipEdge] {
        &self.relationships
    }

    #[must_use]
    pub fn renames(&self) -> &RenameTable {
        &self.renames
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&RelationshipEdge> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn boolean_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Boolean)
            .map(|f| f.name.as_str())
    }
}

pub struct EntityDescriptorBuilder {
    descriptor: EntityDescriptor,
}

impl EntityDescriptorBuilder {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.descriptor.fields.push(FieldDescriptor {
            name: name.into(),
            kind,
        });
        self
    }

    #[must_use]
    pub fn relationship(mut self, edge: RelationshipEdge) -> Self {
        self.descriptor.relationships.push(edge);
        self
    }

    #[must_use]
    pub fn relationships(mut self, edges: impl IntoIterator<Item = RelationshipEdge>) -> Self {
        self.descriptor.relationships.extend(edges);
        self
    }

    #[must_use]
    pub fn rename(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        self.descriptor.renames.insert(key, path);
        self
    }

    #[must_use]
    pub fn renames(mut self, renames: RenameTable) -> Self {
        self.descriptor.renames.extend(&renames);
        self
    }

    #[must_use]
    pub fn build(self) -> EntityDescriptor {
        self.descriptor
    }
}

/// Declared Q&A schema shared by the unit tests of every engine module.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    fn audited(builder: EntityDescriptorBuilder) -> EntityDescriptorBuilder {
        builder
            .field("created_at", FieldKind::DateTime)
            .field("last_modified", FieldKind::DateTime)
            .field("is_active", FieldKind::Boolean)
            .field("deactivated_at", FieldKind::DateTime)
    }

    pub fn questions() -> EntityDescriptor {
        audited(
            EntityDescriptor::builder("questions")
                .field("question_id", FieldKind::Uuid)
                .field("title", FieldKind::Text)
                .field("context", FieldKind::Text)
                .field("canonical_answer_id", FieldKind::Uuid)
                .field("owner_id", FieldKind::Uuid),
        )
        .relationship(RelationshipEdge::to_one(
            "canonical_answer",
            "answers",
            "canonical_answer_id",
            "answer_id",
        ))
        .relationship(RelationshipEdge::to_one("owner", "users", "owner_id", "user_id"))
        .relationship(RelationshipEdge::reverse_many(
            "answers",
            "answers",
            "question_id",
            "question_id",
        ))
        .relationship(RelationshipEdge::many_to_many(
            "topics",
            "question_topics",
            "question_id",
            Junction::new("questions_topics", "question_id", "question_topic_id"),
            "question_topic_id",
        ))
        .rename("topic", "topics__title")
        .build()
    }

    pub fn answers() -> EntityDescriptor {
        audited(
            EntityDescriptor::builder("answers")
                .field("answer_id", FieldKind::Uuid)
                .field("description", FieldKind::Text)
                .field("question_id", FieldKind::Uuid),
        )
        .relationship(RelationshipEdge::to_one(
            "question",
            "questions",
            "question_id",
            "question_id",
        ))
        .relationship(RelationshipEdge::reverse_one(
            "canonical_for",
            "questions",
            "answer_id",
            "canonical_answer_id",
        ))
        .relationship(RelationshipEdge::many_to_many(
            "tags",
            "answer_tags",
            "answer_id",
            Junction::new("answers_tags", "answer_id", "answer_tag_id"),
            "answer_tag_id",
        ))
        .rename("tag", "tags__title")
        .build()
    }

    pub fn question_topics() -> EntityDescriptor {
        audited(
            EntityDescriptor::builder("question_topics")
                .field("question_topic_id", FieldKind::Uuid)
                .field("title", FieldKind::Text),
        )
        .build()
    }

    pub fn answer_tags() -> EntityDescriptor {
        audited(
            EntityDescriptor::builder("answer_tags")
                .field("answer_tag_id", FieldKind::Uuid)
                .field("title", FieldKind::Text),
        )
        .build()
    }

    pub fn registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .entity(questions())
            .entity(answers())
            .entity(question_topics())
            .entity(answer_tags())
            .build()
            .expect("fixture schema is valid")
    }
}
