//! Junction between questions and their topics.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "questions_topics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub question_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub question_topic_id: Uuid,
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
    #[sea_orm(
        belongs_to = "super::question_topic::Entity",
        from = "Column::QuestionTopicId",
        to = "super::question_topic::Column::QuestionTopicId",
        on_delete = "Cascade"
    )]
    QuestionTopic,
}

impl ActiveModelBehavior for ActiveModel {}
