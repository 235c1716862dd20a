use serde::Deserialize;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{map_reference_error, require, require_if_present};
use crate::error::{AppError, AppResult};
use crate::models::{Question, QuestionOptions, QuestionType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestion {
    pub survey_id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Option<QuestionOptions>,
    pub order: i32,
    pub question_bank_question_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestion {
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub options: Option<QuestionOptions>,
    pub order: Option<i32>,
}

fn validate_order(order: Option<i32>) -> AppResult<()> {
    match order {
        Some(o) if o < 0 => Err(AppError::InvalidInput(
            "order must not be negative".to_string(),
        )),
        _ => Ok(()),
    }
}

pub struct QuestionServiceImpl {
    pool: PgPool,
}

impl QuestionServiceImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, req: CreateQuestion) -> AppResult<Question> {
        require("text", &req.text)?;
        validate_order(Some(req.order))?;

        sqlx::query_as::<_, Question>(
            "INSERT INTO questions
                 (survey_id, text, question_type, options, sort_order, question_bank_question_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(req.survey_id)
        .bind(&req.text)
        .bind(req.question_type.as_str())
        .bind(req.options.map(Json))
        .bind(req.order)
        .bind(req.question_bank_question_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_reference_error(e, "survey or question bank question"))
    }

    /// Questions ordered by `order`; equal orders keep insertion order.
    pub async fn find_all(&self, survey_id: Option<Uuid>) -> AppResult<Vec<Question>> {
        let rows = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions
             WHERE ($1::uuid IS NULL OR survey_id = $1)
             ORDER BY sort_order, created_at",
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_one(&self, id: Uuid) -> AppResult<Question> {
        sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question with ID {} not found", id)))
    }

    pub async fn update(&self, id: Uuid, req: UpdateQuestion) -> AppResult<Question> {
        require_if_present("text", req.text.as_deref())?;
        validate_order(req.order)?;

        sqlx::query_as::<_, Question>(
            "UPDATE questions SET
                 text = COALESCE($2, text),
                 question_type = COALESCE($3, question_type),
                 options = COALESCE($4, options),
                 sort_order = COALESCE($5, sort_order),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&req.text)
        .bind(req.question_type.map(|t| t.as_str()))
        .bind(req.options.map(Json))
        .bind(req.order)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Question with ID {} not found", id)))
    }

    pub async fn remove(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Question with ID {} not found",
                id
            )));
        }
        Ok(())
    }
}
