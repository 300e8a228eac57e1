use chrono::NaiveDateTime;
use roon_search::{RelationshipEdge, Searchable, schema::Junction};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "question_topics")]
#[schema(as = QuestionTopic)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub question_topic_id: Uuid,
    #[sea_orm(unique)]
    pub title: String,
    pub created_at: NaiveDateTime,
    pub last_modified: NaiveDateTime,
    pub is_active: bool,
    #[sea_orm(nullable)]
    pub deactivated_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        super::questions_topics::Relation::Question.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::questions_topics::Relation::QuestionTopic.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Searchable for Entity {
    const RESOURCE_NAME_SINGULAR: &'static str = "topic";
    const RESOURCE_NAME_PLURAL: &'static str = "topics";

    fn relationships() -> Vec<RelationshipEdge> {
        vec![RelationshipEdge::many_to_many(
            "questions",
            "questions",
            "question_topic_id",
            Junction::new("questions_topics", "question_topic_id", "question_id"),
            "question_id",
        )]
    }
}
