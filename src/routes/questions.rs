use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{AppJson, AppPath, AppQuery};
use super::ApiState;
use crate::error::AppResult;
use crate::models::Question;
use crate::services::question_service::{CreateQuestion, UpdateQuestion};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFilter {
    pub survey_id: Option<Uuid>,
}

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/questions", get(find_all).post(create))
        .route(
            "/questions/:id",
            get(find_one).patch(update).delete(remove),
        )
}

async fn create(
    State(state): State<ApiState>,
    AppJson(req): AppJson<CreateQuestion>,
) -> AppResult<(StatusCode, Json<Question>)> {
    let question = state.questions.create(req).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

async fn find_all(
    State(state): State<ApiState>,
    AppQuery(filter): AppQuery<QuestionFilter>,
) -> AppResult<Json<Vec<Question>>> {
    Ok(Json(state.questions.find_all(filter.survey_id).await?))
}

async fn find_one(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Question>> {
    Ok(Json(state.questions.find_one(id).await?))
}

async fn update(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateQuestion>,
) -> AppResult<Json<Question>> {
    Ok(Json(state.questions.update(id, req).await?))
}

async fn remove(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    state.questions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
