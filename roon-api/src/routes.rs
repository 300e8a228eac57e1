use std::{collections::HashMap, sync::Arc};

use axum::{
    Json, Router,
    extract::{
        Path, Query, RawQuery, State,
        rejection::{JsonRejection, PathRejection},
    },
    routing::get,
};
use roon_search::{ApiError, ParameterSet, QueryScope, Searchable};
use sea_orm::PrimaryKeyTrait;
use serde::Serialize;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{AppState, openapi};

/// Mount `/{resources}/search` and `/{resources}/{id}` for `E`.
pub fn resource_router<E>() -> Router<AppState>
where
    E: Searchable,
    E::Model: Serialize + Sync,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    Router::new()
        .route(
            &format!("/{}/search", E::RESOURCE_NAME_PLURAL),
            get(search_query::<E>).post(search_body::<E>),
        )
        .route(
            &format!("/{}/{{id}}", E::RESOURCE_NAME_PLURAL),
            get(get_one::<E>),
        )
}

/// `GET /{resources}/search?<params>`
pub async fn search_query<E>(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, ApiError>
where
    E: Searchable,
    E::Model: Serialize + Sync,
{
    let params = ParameterSet::from_query_str(query.as_deref().unwrap_or_default());
    run_search::<E>(&state, &params).await
}

/// `POST /{resources}/search` with a JSON object body.
pub async fn search_body<E>(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
    E: Searchable,
    E::Model: Serialize + Sync,
{
    let Json(body) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let params = ParameterSet::from_json(body)?;
    run_search::<E>(&state, &params).await
}

async fn run_search<E>(state: &AppState, params: &ParameterSet) -> Result<Json<Value>, ApiError>
where
    E: Searchable,
    E::Model: Serialize + Sync,
{
    let page = state.engine.execute::<E, _>(&state.db, params).await?;
    tracing::debug!(
        resources = E::RESOURCE_NAME_PLURAL,
        total_count = page.pagination_info.total_count,
        "Search complete"
    );
    let body = page.into_body(E::RESOURCE_NAME_PLURAL).map_err(|err| {
        ApiError::internal("Server Error, contact Roon to resolve", Some(err.to_string()))
    })?;
    Ok(Json(body))
}

/// `GET /{resources}/{id}`. Inactive records are reported as missing.
pub async fn get_one<E>(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<E::Model>, ApiError>
where
    E: Searchable,
    E::Model: Serialize + Sync,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    let Path(id) = id.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let scope = QueryScope::new(Arc::clone(state.engine.registry()), E::default().table_name())?
        .active_only();

    scope
        .apply(E::find_by_id(id))
        .one(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(E::RESOURCE_NAME_SINGULAR, Some(id.to_string())))
}

/// Basic health check. `?system_version=<anything>` adds the running version.
pub async fn heartbeat(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    if params.get("system_version").is_some_and(|v| !v.is_empty()) {
        Json(json!({"success": true, "system_version": state.system_version}))
    } else {
        Json(json!({"success": true}))
    }
}

/// `GET /api/v1`: search URL of every resource.
pub async fn api_root() -> Json<Value> {
    let urls: Map<String, Value> = crate::RESOURCES
        .iter()
        .map(|resources| {
            (
                (*resources).to_string(),
                Value::String(format!("/api/v1/{resources}/search")),
            )
        })
        .collect();
    Json(Value::Object(urls))
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::document())
}

pub fn router(state: AppState) -> Router {
    use crate::models::{Answer, AnswerTag, Question, QuestionTopic};

    let api = Router::new()
        .route("/", get(api_root))
        .merge(resource_router::<Answer>())
        .merge(resource_router::<Question>())
        .merge(resource_router::<QuestionTopic>())
        .merge(resource_router::<AnswerTag>());

    Router::new()
        .route("/heartbeat", get(heartbeat))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api/v1", api)
        .with_state(state)
}
