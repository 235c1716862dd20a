use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

use super::{QuestionOptions, QuestionType};

/// Reusable question template owned by an organization.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBankQuestion {
    pub id: uuid::Uuid,
    pub organization_id: uuid::Uuid,
    pub text: String,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub question_type: QuestionType,
    pub options: Option<Json<QuestionOptions>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
