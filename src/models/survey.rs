use serde::Serialize;
use sqlx::FromRow;

use super::{Property, Question};

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: uuid::Uuid,
    pub property_id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Survey with its property and its questions in display order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDetail {
    #[serde(flatten)]
    pub survey: Survey,
    pub property: Property,
    pub questions: Vec<Question>,
}
