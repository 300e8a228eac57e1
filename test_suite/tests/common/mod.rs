use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{NaiveDate, NaiveDateTime};
use roon_api::{
    AppState, app,
    migration::Migrator,
    models::{answer, answer_tag, answers_tags, question, question_topic, questions_topics},
};
use roon_search::SearchConfig;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const SYSTEM_VERSION: &str = "test-version";

pub const TOPIC_BILLING: Uuid = Uuid::from_u128(0x100);
pub const TOPIC_SETUP: Uuid = Uuid::from_u128(0x101);
pub const TAG_URGENT: Uuid = Uuid::from_u128(0x200);
pub const TAG_LEGACY: Uuid = Uuid::from_u128(0x201);

/// "How do I reset my password?", billing, canonical answer `ANSWER_RESTART`
pub const QUESTION_RESET: Uuid = Uuid::from_u128(0x300);
/// "How to export data?", setup, no context
pub const QUESTION_EXPORT: Uuid = Uuid::from_u128(0x301);
/// "Why is billing late?", billing
pub const QUESTION_BILLING: Uuid = Uuid::from_u128(0x302);
/// "How to delete account?", inactive
pub const QUESTION_DELETED: Uuid = Uuid::from_u128(0x303);

/// Answers `QUESTION_RESET`, tagged urgent
pub const ANSWER_RESTART: Uuid = Uuid::from_u128(0x400);
/// Answers `QUESTION_BILLING`
pub const ANSWER_NIGHTLY: Uuid = Uuid::from_u128(0x401);
/// Answers `QUESTION_EXPORT`, inactive
pub const ANSWER_SETTINGS: Uuid = Uuid::from_u128(0x402);

pub fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[allow(dead_code)]
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

#[allow(dead_code)]
pub async fn setup_seeded_db() -> Result<DatabaseConnection, DbErr> {
    let db = setup_test_db().await?;
    seed(&db).await?;
    Ok(db)
}

async fn topic(db: &DatabaseConnection, id: Uuid, title: &str) -> Result<(), DbErr> {
    question_topic::ActiveModel {
        question_topic_id: Set(id),
        title: Set(title.to_string()),
        created_at: Set(at(2023, 1, 1)),
        last_modified: Set(at(2023, 1, 1)),
        is_active: Set(true),
        deactivated_at: Set(None),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn tag(db: &DatabaseConnection, id: Uuid, title: &str, active: bool) -> Result<(), DbErr> {
    answer_tag::ActiveModel {
        answer_tag_id: Set(id),
        title: Set(title.to_string()),
        created_at: Set(at(2023, 1, 1)),
        last_modified: Set(at(2023, 1, 1)),
        is_active: Set(active),
        deactivated_at: Set((!active).then(|| at(2023, 6, 1))),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn question(
    db: &DatabaseConnection,
    id: Uuid,
    title: &str,
    context: Option<&str>,
    created_at: NaiveDateTime,
    active: bool,
) -> Result<(), DbErr> {
    question::ActiveModel {
        question_id: Set(id),
        title: Set(title.to_string()),
        context: Set(context.map(str::to_string)),
        canonical_answer_id: Set(None),
        owner_id: Set(None),
        created_at: Set(created_at),
        last_modified: Set(created_at),
        is_active: Set(active),
        deactivated_at: Set((!active).then(|| at(2024, 7, 1))),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn answer(
    db: &DatabaseConnection,
    id: Uuid,
    question_id: Uuid,
    description: &str,
    created_at: NaiveDateTime,
    active: bool,
) -> Result<(), DbErr> {
    answer::ActiveModel {
        answer_id: Set(id),
        description: Set(description.to_string()),
        question_id: Set(question_id),
        created_at: Set(created_at),
        last_modified: Set(created_at),
        is_active: Set(active),
        deactivated_at: Set((!active).then(|| at(2024, 7, 1))),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn link_topic(db: &DatabaseConnection, question_id: Uuid, topic_id: Uuid) -> Result<(), DbErr> {
    questions_topics::ActiveModel {
        question_id: Set(question_id),
        question_topic_id: Set(topic_id),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn link_tag(db: &DatabaseConnection, answer_id: Uuid, tag_id: Uuid) -> Result<(), DbErr> {
    answers_tags::ActiveModel {
        answer_id: Set(answer_id),
        answer_tag_id: Set(tag_id),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn seed(db: &DatabaseConnection) -> Result<(), DbErr> {
    topic(db, TOPIC_BILLING, "billing").await?;
    topic(db, TOPIC_SETUP, "setup").await?;
    tag(db, TAG_URGENT, "urgent", true).await?;
    tag(db, TAG_LEGACY, "legacy", false).await?;

    question(
        db,
        QUESTION_RESET,
        "How do I reset my password?",
        Some("Account setup help"),
        at(2024, 1, 10),
        true,
    )
    .await?;
    question(db, QUESTION_EXPORT, "How to export data?", None, at(2024, 3, 5), true).await?;
    question(
        db,
        QUESTION_BILLING,
        "Why is billing late?",
        Some("Invoices arrive after the due date"),
        at(2024, 6, 20),
        true,
    )
    .await?;
    question(
        db,
        QUESTION_DELETED,
        "How to delete account?",
        Some("Old question"),
        at(2023, 11, 1),
        false,
    )
    .await?;

    answer(
        db,
        ANSWER_RESTART,
        QUESTION_RESET,
        "Use the restart link on the login page",
        at(2024, 1, 11),
        true,
    )
    .await?;
    answer(db, ANSWER_NIGHTLY, QUESTION_BILLING, "Billing runs nightly", at(2024, 6, 21), true)
        .await?;
    answer(
        db,
        ANSWER_SETTINGS,
        QUESTION_EXPORT,
        "Export from the settings page",
        at(2024, 3, 6),
        false,
    )
    .await?;

    question::ActiveModel {
        question_id: Set(QUESTION_RESET),
        canonical_answer_id: Set(Some(ANSWER_RESTART)),
        ..Default::default()
    }
    .update(db)
    .await?;

    link_topic(db, QUESTION_RESET, TOPIC_BILLING).await?;
    link_topic(db, QUESTION_EXPORT, TOPIC_SETUP).await?;
    link_topic(db, QUESTION_BILLING, TOPIC_BILLING).await?;
    link_tag(db, ANSWER_RESTART, TAG_URGENT).await?;
    link_tag(db, ANSWER_NIGHTLY, TAG_LEGACY).await?;
    Ok(())
}

#[allow(dead_code)]
pub async fn setup_test_app() -> Router {
    let db = setup_seeded_db().await.expect("Failed to seed database");
    let state = AppState::new(db, SearchConfig::default(), SYSTEM_VERSION)
        .expect("Search schema should be valid");
    app(state)
}

#[allow(dead_code)]
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

#[allow(dead_code)]
pub async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[allow(dead_code)]
pub async fn post_raw(app: &Router, uri: &str, body: &'static str) -> StatusCode {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    app.clone().oneshot(request).await.unwrap().status()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Titles of the `questions` list in a search response, in order.
#[allow(dead_code)]
pub fn titles(body: &Value) -> Vec<String> {
    body["questions"]
        .as_array()
        .unwrap_or(&Vec::new())
        .iter()
        .filter_map(|q| q["title"].as_str().map(str::to_string))
        .collect()
}

#[allow(dead_code)]
pub fn ids(body: &Value, resources: &str, key: &str) -> Vec<String> {
    body[resources]
        .as_array()
        .unwrap_or(&Vec::new())
        .iter()
        .filter_map(|item| item[key].as_str().map(str::to_string))
        .collect()
}
