//! # roon-api
//!
//! HTTP service over the Roon Q&A schema. Every resource gets a search
//! endpoint (`GET` with a query string or `POST` with a JSON object) and an
//! info endpoint, both backed by [`roon_search::SearchEngine`].
//!
//! ```text
//! GET  /heartbeat[?system_version=true]
//! GET  /api/v1
//! GET  /api/v1/{questions,answers,topics,tags}/search?<params>
//! POST /api/v1/{questions,answers,topics,tags}/search
//! GET  /api/v1/{questions,answers,topics,tags}/{id}
//! GET  /api-docs/openapi.json
//! ```

pub mod config;
pub mod logging;
pub mod migration;
pub mod models;
pub mod openapi;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use roon_search::{SchemaRegistry, SearchConfig, SearchEngine, SearchError};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;

use crate::models::{Answer, AnswerTag, Question, QuestionTopic};

/// Resource names served under `/api/v1`.
pub const RESOURCES: [&str; 4] = ["answers", "questions", "topics", "tags"];

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub engine: Arc<SearchEngine>,
    pub system_version: String,
}

impl AppState {
    /// # Errors
    ///
    /// Fails when a declared rename does not resolve against the schema.
    pub fn new(
        db: DatabaseConnection,
        search: SearchConfig,
        system_version: impl Into<String>,
    ) -> Result<Self, SearchError> {
        Ok(Self {
            db,
            engine: Arc::new(SearchEngine::new(registry()?, search)),
            system_version: system_version.into(),
        })
    }
}

/// Registry of every searchable entity.
///
/// # Errors
///
/// Fails when a declared rename does not resolve against the schema.
pub fn registry() -> Result<SchemaRegistry, SearchError> {
    SchemaRegistry::builder()
        .register::<Question>()
        .register::<Answer>()
        .register::<QuestionTopic>()
        .register::<AnswerTag>()
        .build()
}

/// The full application with request tracing.
pub fn app(state: AppState) -> Router {
    routes::router(state).layer(TraceLayer::new_for_http())
}
