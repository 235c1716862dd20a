use std::sync::Arc;

use serde::Deserialize;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{map_reference_error, require, require_if_present};
use crate::error::{AppError, AppResult};
use crate::models::{Question, QuestionBankQuestion, QuestionOptions, QuestionType};
use crate::store::SurveyStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBankQuestion {
    pub organization_id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Option<QuestionOptions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBankQuestion {
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub options: Option<QuestionOptions>,
}

pub struct QuestionBankServiceImpl {
    pool: PgPool,
    store: Arc<dyn SurveyStore>,
}

impl QuestionBankServiceImpl {
    pub fn new(pool: PgPool, store: Arc<dyn SurveyStore>) -> Self {
        Self { pool, store }
    }

    pub async fn create(&self, req: CreateBankQuestion) -> AppResult<QuestionBankQuestion> {
        require("text", &req.text)?;

        sqlx::query_as::<_, QuestionBankQuestion>(
            "INSERT INTO question_bank_questions (organization_id, text, question_type, options)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(req.organization_id)
        .bind(&req.text)
        .bind(req.question_type.as_str())
        .bind(req.options.map(Json))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_reference_error(e, "organization"))
    }

    /// Newest first.
    pub async fn find_all(&self, organization_id: Uuid) -> AppResult<Vec<QuestionBankQuestion>> {
        let rows = sqlx::query_as::<_, QuestionBankQuestion>(
            "SELECT * FROM question_bank_questions
             WHERE organization_id = $1
             ORDER BY created_at DESC",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_one(&self, id: Uuid) -> AppResult<QuestionBankQuestion> {
        self.store
            .find_bank_question(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: UpdateBankQuestion,
    ) -> AppResult<QuestionBankQuestion> {
        require_if_present("text", req.text.as_deref())?;

        sqlx::query_as::<_, QuestionBankQuestion>(
            "UPDATE question_bank_questions SET
                 text = COALESCE($2, text),
                 question_type = COALESCE($3, question_type),
                 options = COALESCE($4, options),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&req.text)
        .bind(req.question_type.map(|t| t.as_str()))
        .bind(req.options.map(Json))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    pub async fn remove(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM question_bank_questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Copies a bank question into a survey as its new last question.
    pub async fn add_to_survey(&self, bank_question_id: Uuid, survey_id: Uuid) -> AppResult<Question> {
        let bank_question = self.find_one(bank_question_id).await?;
        let question = self
            .store
            .append_question_from_bank(&bank_question, survey_id)
            .await?;
        tracing::info!(
            "Question bank question {} added to survey {} at order {}",
            bank_question_id,
            survey_id,
            question.sort_order
        );
        Ok(question)
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("QuestionBankQuestion with ID {} not found", id))
}
