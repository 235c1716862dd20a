use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionType {
    Text,
    MultipleChoice,
    Rating,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::MultipleChoice => "multipleChoice",
            QuestionType::Rating => "rating",
        }
    }
}

impl TryFrom<String> for QuestionType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "text" => Ok(QuestionType::Text),
            "multipleChoice" => Ok(QuestionType::MultipleChoice),
            "rating" => Ok(QuestionType::Rating),
            other => Err(format!("unknown question type: {}", other)),
        }
    }
}

/// Type-dependent payload: choices for multipleChoice, bounds for rating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: uuid::Uuid,
    pub survey_id: uuid::Uuid,
    pub text: String,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub question_type: QuestionType,
    pub options: Option<Json<QuestionOptions>>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub question_bank_question_id: Option<uuid::Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
