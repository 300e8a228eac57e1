//! Junction between answers and their tags.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "answers_tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub answer_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub answer_tag_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::answer::Entity",
        from = "Column::AnswerId",
        to = "super::answer::Column::AnswerId",
        on_delete = "Cascade"
    )]
    Answer,
    #[sea_orm(
        belongs_to = "super::answer_tag::Entity",
        from = "Column::AnswerTagId",
        to = "super::answer_tag::Column::AnswerTagId",
        on_delete = "Cascade"
    )]
    AnswerTag,
}

impl ActiveModelBehavior for ActiveModel {}
