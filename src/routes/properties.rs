use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{AppJson, AppPath, AppQuery};
use super::ApiState;
use crate::error::AppResult;
use crate::models::Property;
use crate::services::property_service::{CreateProperty, UpdateProperty};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilter {
    pub organization_id: Option<Uuid>,
}

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/properties", get(find_all).post(create))
        .route(
            "/properties/:id",
            get(find_one).patch(update).delete(remove),
        )
}

async fn create(
    State(state): State<ApiState>,
    AppJson(req): AppJson<CreateProperty>,
) -> AppResult<(StatusCode, Json<Property>)> {
    let property = state.properties.create(req).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

async fn find_all(
    State(state): State<ApiState>,
    AppQuery(filter): AppQuery<PropertyFilter>,
) -> AppResult<Json<Vec<Property>>> {
    Ok(Json(state.properties.find_all(filter.organization_id).await?))
}

async fn find_one(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Property>> {
    Ok(Json(state.properties.find_one(id).await?))
}

async fn update(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateProperty>,
) -> AppResult<Json<Property>> {
    Ok(Json(state.properties.update(id, req).await?))
}

async fn remove(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    state.properties.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
