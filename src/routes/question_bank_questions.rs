use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{AppJson, AppPath, AppQuery};
use super::ApiState;
use crate::error::{AppError, AppResult};
use crate::models::{Question, QuestionBankQuestion};
use crate::services::question_bank_service::{CreateBankQuestion, UpdateBankQuestion};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankFilter {
    pub organization_id: Option<Uuid>,
}

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/question-bank-questions", get(find_all).post(create))
        .route(
            "/question-bank-questions/:id",
            get(find_one).patch(update).delete(remove),
        )
        .route(
            "/question-bank-questions/:id/add-to-survey/:survey_id",
            post(add_to_survey),
        )
}

async fn create(
    State(state): State<ApiState>,
    AppJson(req): AppJson<CreateBankQuestion>,
) -> AppResult<(StatusCode, Json<QuestionBankQuestion>)> {
    let question = state.question_bank.create(req).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

async fn find_all(
    State(state): State<ApiState>,
    AppQuery(filter): AppQuery<BankFilter>,
) -> AppResult<Json<Vec<QuestionBankQuestion>>> {
    let organization_id = filter.organization_id.ok_or_else(|| {
        AppError::InvalidInput("organizationId query parameter is required".to_string())
    })?;
    Ok(Json(state.question_bank.find_all(organization_id).await?))
}

async fn find_one(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<QuestionBankQuestion>> {
    Ok(Json(state.question_bank.find_one(id).await?))
}

async fn update(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateBankQuestion>,
) -> AppResult<Json<QuestionBankQuestion>> {
    Ok(Json(state.question_bank.update(id, req).await?))
}

async fn remove(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    state.question_bank.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to_survey(
    State(state): State<ApiState>,
    AppPath((id, survey_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<(StatusCode, Json<Question>)> {
    let question = state.question_bank.add_to_survey(id, survey_id).await?;
    Ok((StatusCode::CREATED, Json(question)))
}
