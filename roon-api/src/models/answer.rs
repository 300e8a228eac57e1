use chrono::NaiveDateTime;
use roon_search::{RelationshipEdge, RenameTable, Searchable, schema::Junction};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "answers")]
#[schema(as = Answer)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub answer_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub question_id: Uuid,
    pub created_at: NaiveDateTime,
    pub last_modified: NaiveDateTime,
    pub is_active: bool,
    #[sea_orm(nullable)]
    pub deactivated_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::question::Entity",
        from = "Column::QuestionId",
        to = "super::question::Column::QuestionId",
        on_delete = "Cascade"
    )]
    Question,
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl Related<super::answer_tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::answers_tags::Relation::AnswerTag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::answers_tags::Relation::Answer.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Searchable for Entity {
    const RESOURCE_NAME_SINGULAR: &'static str = "answer";
    const RESOURCE_NAME_PLURAL: &'static str = "answers";

    fn relationships() -> Vec<RelationshipEdge> {
        vec![
            RelationshipEdge::to_one("question", "questions", "question_id", "question_id"),
            RelationshipEdge::reverse_one(
                "canonical_for",
                "questions",
                "answer_id",
                "canonical_answer_id",
            ),
            RelationshipEdge::many_to_many(
                "tags",
                "answer_tags",
                "answer_id",
                Junction::new("answers_tags", "answer_id", "answer_tag_id"),
                "answer_tag_id",
            ),
        ]
    }

    fn renames() -> RenameTable {
        RenameTable::new().with("tag", "tags__title")
    }
}
