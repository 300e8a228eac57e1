use chrono::NaiveDateTime;
use roon_search::{RelationshipEdge, Searchable, schema::Junction};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "answer_tags")]
#[schema(as = AnswerTag)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub answer_tag_id: Uuid,
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

impl Related<super::answer::Entity> for Entity {
    fn to() -> RelationDef {
        super::answers_tags::Relation::Answer.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::answers_tags::Relation::AnswerTag.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Searchable for Entity {
    const RESOURCE_NAME_SINGULAR: &'static str = "tag";
    const RESOURCE_NAME_PLURAL: &'static str = "tags";

    fn relationships() -> Vec<RelationshipEdge> {
        vec![RelationshipEdge::many_to_many(
            "answers",
            "answers",
            "answer_tag_id",
            Junction::new("answers_tags", "answer_tag_id", "answer_id"),
            "answer_id",
        )]
    }
}
