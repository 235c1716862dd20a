use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{AppJson, AppPath, AppQuery};
use super::ApiState;
use crate::error::AppResult;
use crate::models::{Survey, SurveyDetail};
use crate::services::survey_service::{CreateSurvey, UpdateSurvey};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyFilter {
    pub property_id: Option<Uuid>,
}

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/surveys", get(find_all).post(create))
        .route("/surveys/:id", get(find_one).patch(update).delete(remove))
}

async fn create(
    State(state): State<ApiState>,
    AppJson(req): AppJson<CreateSurvey>,
) -> AppResult<(StatusCode, Json<Survey>)> {
    let survey = state.surveys.create(req).await?;
    Ok((StatusCode::CREATED, Json(survey)))
}

async fn find_all(
    State(state): State<ApiState>,
    AppQuery(filter): AppQuery<SurveyFilter>,
) -> AppResult<Json<Vec<Survey>>> {
    Ok(Json(state.surveys.find_all(filter.property_id).await?))
}

async fn find_one(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<SurveyDetail>> {
    Ok(Json(state.surveys.find_one(id).await?))
}

async fn update(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateSurvey>,
) -> AppResult<Json<Survey>> {
    Ok(Json(state.surveys.update(id, req).await?))
}

async fn remove(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    state.surveys.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
