//! OpenAPI description of the search responses.

use roon_search::PaginationInfo;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::models::{answer, answer_tag, question, question_topic};

#[derive(Serialize, ToSchema)]
pub struct QuestionSearchResponse {
    pub pagination_info: PaginationInfo,
    pub questions: Vec<question::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct AnswerSearchResponse {
    pub pagination_info: PaginationInfo,
    pub answers: Vec<answer::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct TopicSearchResponse {
    pub pagination_info: PaginationInfo,
    pub topics: Vec<question_topic::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct TagSearchResponse {
    pub pagination_info: PaginationInfo,
    pub tags: Vec<answer_tag::Model>,
}

/// Body of every 4xx/5xx response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    /// `<reason>: <detail>`, e.g. `Date search error: ...`
    pub error_reason: String,
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Roon API", description = "Search over questions, answers, topics and tags"),
    components(schemas(
        PaginationInfo,
        question::Model,
        answer::Model,
        question_topic::Model,
        answer_tag::Model,
        QuestionSearchResponse,
        AnswerSearchResponse,
        TopicSearchResponse,
        TagSearchResponse,
        ErrorBody,
    ))
)]
pub struct ApiDoc;

#[must_use]
pub fn document() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
