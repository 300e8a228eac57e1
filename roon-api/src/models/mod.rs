//! Sea-ORM entities for the Q&A schema.
//!
//! Every searchable entity carries the audit columns `created_at`,
//! `last_modified`, `is_active` and `deactivated_at`.

pub mod answer;
pub mod answer_tag;
pub mod answers_tags;
pub mod question;
pub mod question_topic;
pub mod questions_topics;

pub use answer::Entity as Answer;
pub use answer_tag::Entity as AnswerTag;
pub use question::Entity as Question;
pub use question_topic::Entity as QuestionTopic;
