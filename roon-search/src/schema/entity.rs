use sea_orm::EntityTrait;

use super::{EntityDescriptor, RelationshipEdge, RenameTable};

/// A Sea-ORM entity that can be searched.
///
/// Fields are reflected from the entity's columns. Relationships and renames
/// are declared, since Sea-ORM relations carry no reverse accessor names.
///
/// ```rust,ignore
/// impl Searchable for Entity {
///     const RESOURCE_NAME_SINGULAR: &'static str = "answer";
///     const RESOURCE_NAME_PLURAL: &'static str = "answers";
///
///     fn relationships() -> Vec<RelationshipEdge> {
///         vec![RelationshipEdge::to_one("question", "questions", "question_id", "question_id")]
///     }
///
///     fn renames() -> RenameTable {
///         RenameTable::new().with("tag", "tags__title")
///     }
/// }
/// ```
pub trait Searchable: EntityTrait {
    const RESOURCE_NAME_SINGULAR: &'static str;
    /// Key of the result list in search responses.
    const RESOURCE_NAME_PLURAL: &'static str;

    #[must_use]
    fn relationships() -> Vec<RelationshipEdge> {
        Vec::new()
    }

    #[must_use]
    fn renames() -> RenameTable {
        RenameTable::new()
    }

    #[must_use]
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::reflect::<Self>()
            .relationships(Self::relationships())
            .renames(Self::renames())
            .build()
    }
}
