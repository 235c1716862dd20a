use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{AppJson, AppPath, AppQuery};
use super::ApiState;
use crate::error::AppResult;
use crate::models::Organization;
use crate::services::organization_service::{
    default_organization_name, CreateOrganization, UpdateOrganization,
};

#[derive(Debug, Deserialize)]
pub struct EnsureQuery {
    pub name: Option<String>,
}

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/organizations", get(find_all).post(create))
        .route("/organizations/clerk/:clerk_org_id", get(find_by_clerk_org_id))
        .route("/organizations/clerk/:clerk_org_id/ensure", get(ensure))
        .route(
            "/organizations/:id",
            get(find_one).patch(update).delete(remove),
        )
}

async fn create(
    State(state): State<ApiState>,
    AppJson(req): AppJson<CreateOrganization>,
) -> AppResult<(StatusCode, Json<Organization>)> {
    let org = state.organizations.create(req).await?;
    Ok((StatusCode::CREATED, Json(org)))
}

async fn find_all(State(state): State<ApiState>) -> AppResult<Json<Vec<Organization>>> {
    Ok(Json(state.organizations.find_all().await?))
}

async fn find_by_clerk_org_id(
    State(state): State<ApiState>,
    AppPath(clerk_org_id): AppPath<String>,
) -> AppResult<Json<Organization>> {
    Ok(Json(
        state.organizations.find_by_clerk_org_id(&clerk_org_id).await?,
    ))
}

async fn ensure(
    State(state): State<ApiState>,
    AppPath(clerk_org_id): AppPath<String>,
    AppQuery(query): AppQuery<EnsureQuery>,
) -> AppResult<Json<Organization>> {
    let name = query
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| default_organization_name(&clerk_org_id));
    Ok(Json(
        state.organizations.find_or_create(&clerk_org_id, &name).await?,
    ))
}

async fn find_one(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Organization>> {
    Ok(Json(state.organizations.find_one(id).await?))
}

async fn update(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateOrganization>,
) -> AppResult<Json<Organization>> {
    Ok(Json(state.organizations.update(id, req).await?))
}

async fn remove(
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    state.organizations.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
