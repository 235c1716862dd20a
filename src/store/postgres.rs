use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{next_order, IdentityStore, MembershipUpsert, SurveyStore};
use crate::error::{AppError, AppResult};
use crate::models::{Organization, Question, QuestionBankQuestion, User};

/// PostgreSQL backed store. Upserts rely on the unique Clerk id columns.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_organization_by_clerk_id(
        &self,
        clerk_org_id: &str,
    ) -> AppResult<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations WHERE clerk_org_id = $1",
        )
        .bind(clerk_org_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    async fn upsert_organization(
        &self,
        clerk_org_id: &str,
        name: &str,
    ) -> AppResult<Organization> {
        let org = sqlx::query_as::<_, Organization>(
            "INSERT INTO organizations (clerk_org_id, name)
             VALUES ($1, $2)
             ON CONFLICT (clerk_org_id)
             DO UPDATE SET name = EXCLUDED.name, updated_at = NOW()
             RETURNING *",
        )
        .bind(clerk_org_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(org)
    }

    async fn delete_organization_by_clerk_id(&self, clerk_org_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM organizations WHERE clerk_org_id = $1")
            .bind(clerk_org_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE clerk_id = $1")
            .bind(clerk_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user_profile(
        &self,
        clerk_id: &str,
        email: &str,
        name: Option<&str>,
    ) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users
             SET email = COALESCE(NULLIF($2, ''), email), name = $3, updated_at = NOW()
             WHERE clerk_id = $1
             RETURNING *",
        )
        .bind(clerk_id)
        .bind(email)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn upsert_membership_user(&self, upsert: &MembershipUpsert) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (clerk_id, email, name, organization_id, role)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (clerk_id) DO UPDATE SET
                 email = COALESCE(NULLIF($6, ''), users.email),
                 name = COALESCE(EXCLUDED.name, users.name),
                 organization_id = EXCLUDED.organization_id,
                 role = EXCLUDED.role,
                 updated_at = NOW()
             RETURNING *",
        )
        .bind(&upsert.clerk_id)
        .bind(upsert.email_for_create())
        .bind(upsert.name.as_deref())
        .bind(upsert.organization_id)
        .bind(&upsert.role)
        .bind(&upsert.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn clear_user_role(&self, clerk_id: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = NULL, updated_at = NOW() WHERE clerk_id = $1 RETURNING *",
        )
        .bind(clerk_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_user_by_clerk_id(&self, clerk_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE clerk_id = $1")
            .bind(clerk_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SurveyStore for PgStore {
    async fn find_bank_question(&self, id: Uuid) -> AppResult<Option<QuestionBankQuestion>> {
        let question = sqlx::query_as::<_, QuestionBankQuestion>(
            "SELECT * FROM question_bank_questions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn append_question_from_bank(
        &self,
        bank_question: &QuestionBankQuestion,
        survey_id: Uuid,
    ) -> AppResult<Question> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the survey serializes concurrent appends.
        let survey: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM surveys WHERE id = $1 FOR UPDATE")
                .bind(survey_id)
                .fetch_optional(&mut *tx)
                .await?;
        if survey.is_none() {
            return Err(AppError::NotFound(format!(
                "Survey with ID {} not found",
                survey_id
            )));
        }

        let current_max: Option<i32> = sqlx::query_scalar(
            "SELECT sort_order FROM questions
             WHERE survey_id = $1
             ORDER BY sort_order DESC
             LIMIT 1",
        )
        .bind(survey_id)
        .fetch_optional(&mut *tx)
        .await?;

        let question = sqlx::query_as::<_, Question>(
            "INSERT INTO questions
                 (survey_id, text, question_type, options, sort_order, question_bank_question_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(survey_id)
        .bind(&bank_question.text)
        .bind(bank_question.question_type.as_str())
        .bind(&bank_question.options)
        .bind(next_order(current_max)?)
        .bind(bank_question.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(question)
    }
}
