//! Schema migrations.
//!
//! Tables are created from the entity definitions, so column types always
//! match what the search engine reflects.

use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::models::{answer, answer_tag, answers_tags, question, question_topic, questions_topics};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateQaTables)]
    }
}

pub struct CreateQaTables;

impl MigrationName for CreateQaTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_qa_tables"
    }
}

fn create_table<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    schema.create_table_from_entity(entity).if_not_exists().to_owned()
}

fn drop_table<E: EntityTrait>(entity: E) -> TableDropStatement {
    Table::drop().table(entity).if_exists().to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for CreateQaTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Parents first. questions.canonical_answer_id has no constraint.
        manager.create_table(create_table(&schema, question_topic::Entity)).await?;
        manager.create_table(create_table(&schema, answer_tag::Entity)).await?;
        manager.create_table(create_table(&schema, question::Entity)).await?;
        manager.create_table(create_table(&schema, answer::Entity)).await?;
        manager.create_table(create_table(&schema, questions_topics::Entity)).await?;
        manager.create_table(create_table(&schema, answers_tags::Entity)).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(drop_table(answers_tags::Entity)).await?;
        manager.drop_table(drop_table(questions_topics::Entity)).await?;
        manager.drop_table(drop_table(answer::Entity)).await?;
        manager.drop_table(drop_table(question::Entity)).await?;
        manager.drop_table(drop_table(answer_tag::Entity)).await?;
        manager.drop_table(drop_table(question_topic::Entity)).await?;
        Ok(())
    }
}
