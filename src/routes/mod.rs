use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{
    OrganizationServiceImpl, PropertyServiceImpl, QuestionBankServiceImpl, QuestionServiceImpl,
    SurveyServiceImpl,
};
use crate::store::SurveyStore;
use crate::webhook::{self, WebhookState};

pub mod extract;
pub mod organizations;
pub mod properties;
pub mod question_bank_questions;
pub mod questions;
pub mod surveys;

/// Shared handles for the REST resource routes.
#[derive(Clone)]
pub struct ApiState {
    pub organizations: Arc<OrganizationServiceImpl>,
    pub properties: Arc<PropertyServiceImpl>,
    pub surveys: Arc<SurveyServiceImpl>,
    pub questions: Arc<QuestionServiceImpl>,
    pub question_bank: Arc<QuestionBankServiceImpl>,
}

impl ApiState {
    pub fn new(pool: PgPool, survey_store: Arc<dyn SurveyStore>) -> Self {
        Self {
            organizations: Arc::new(OrganizationServiceImpl::new(pool.clone())),
            properties: Arc::new(PropertyServiceImpl::new(pool.clone())),
            surveys: Arc::new(SurveyServiceImpl::new(pool.clone())),
            questions: Arc::new(QuestionServiceImpl::new(pool.clone())),
            question_bank: Arc::new(QuestionBankServiceImpl::new(pool, survey_store)),
        }
    }
}

pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .merge(organizations::routes())
        .merge(properties::routes())
        .merge(surveys::routes())
        .merge(questions::routes())
        .merge(question_bank_questions::routes())
        .with_state(state)
}

/// Full application: REST resources, Clerk webhook, health, CORS and tracing.
pub fn build_app(config: &Config, api: ApiState, webhooks: WebhookState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(api_router(api))
        .merge(webhook::router(webhooks))
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
