use chrono::NaiveDateTime;
use roon_search::{RelationshipEdge, RenameTable, Searchable, schema::Junction};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "questions")]
#[schema(as = Question)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub question_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub context: Option<String>,
    #[sea_orm(nullable)]
    pub canonical_answer_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub owner_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub last_modified: NaiveDateTime,
    pub is_active: bool,
    #[sea_orm(nullable)]
    pub deactivated_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::answer::Entity")]
    Answers,
}

impl Related<super::answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl Related<super::question_topic::Entity> for Entity {
    fn to() -> RelationDef {
        super::questions_topics::Relation::QuestionTopic.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::questions_topics::Relation::Question.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Searchable for Entity {
    const RESOURCE_NAME_SINGULAR: &'static str = "question";
    const RESOURCE_NAME_PLURAL: &'static str = "questions";

    fn relationships() -> Vec<RelationshipEdge> {
        vec![
            RelationshipEdge::to_one(
                "canonical_answer",
                "answers",
                "canonical_answer_id",
                "answer_id",
            ),
            // Users live in the identity service and are never registered.
            RelationshipEdge::to_one("owner", "users", "owner_id", "user_id"),
            RelationshipEdge::reverse_many("answers", "answers", "question_id", "question_id"),
            RelationshipEdge::many_to_many(
                "topics",
                "question_topics",
                "question_id",
                Junction::new("questions_topics", "question_id", "question_topic_id"),
                "question_topic_id",
            ),
        ]
    }

    fn renames() -> RenameTable {
        RenameTable::new().with("topic", "topics__title")
    }
}
