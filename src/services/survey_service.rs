use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{map_reference_error, require, require_if_present};
use crate::error::{AppError, AppResult};
use crate::models::{Property, Question, Survey, SurveyDetail};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurvey {
    pub property_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSurvey {
    pub property_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
}

pub struct SurveyServiceImpl {
    pool: PgPool,
}

impl SurveyServiceImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, req: CreateSurvey) -> AppResult<Survey> {
        require("title", &req.title)?;

        sqlx::query_as::<_, Survey>(
            "INSERT INTO surveys (property_id, title, description)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(req.property_id)
        .bind(&req.title)
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_reference_error(e, "property"))
    }

    pub async fn find_all(&self, property_id: Option<Uuid>) -> AppResult<Vec<Survey>> {
        let rows = sqlx::query_as::<_, Survey>(
            "SELECT * FROM surveys
             WHERE ($1::uuid IS NULL OR property_id = $1)
             ORDER BY created_at",
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Survey with its property and its questions in ascending order.
    pub async fn find_one(&self, id: Uuid) -> AppResult<SurveyDetail> {
        let survey = sqlx::query_as::<_, Survey>("SELECT * FROM surveys WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Survey with ID {} not found", id)))?;

        let property = sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1")
            .bind(survey.property_id)
            .fetch_one(&self.pool)
            .await?;

        let questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE survey_id = $1 ORDER BY sort_order, created_at",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(SurveyDetail {
            survey,
            property,
            questions,
        })
    }

    pub async fn update(&self, id: Uuid, req: UpdateSurvey) -> AppResult<Survey> {
        require_if_present("title", req.title.as_deref())?;

        sqlx::query_as::<_, Survey>(
            "UPDATE surveys SET
                 property_id = COALESCE($2, property_id),
                 title = COALESCE($3, title),
                 description = COALESCE($4, description),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(req.property_id)
        .bind(&req.title)
        .bind(&req.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_reference_error(e, "property"))?
        .ok_or_else(|| AppError::NotFound(format!("Survey with ID {} not found", id)))
    }

    pub async fn remove(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM surveys WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Survey with ID {} not found", id)));
        }
        Ok(())
    }
}
