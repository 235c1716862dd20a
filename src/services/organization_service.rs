use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{require, require_if_present};
use crate::error::{AppError, AppResult};
use crate::models::Organization;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganization {
    pub clerk_org_id: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganization {
    pub clerk_org_id: Option<String>,
    pub name: Option<String>,
}

pub struct OrganizationServiceImpl {
    pool: PgPool,
}

impl OrganizationServiceImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, req: CreateOrganization) -> AppResult<Organization> {
        require("clerkOrgId", &req.clerk_org_id)?;
        require("name", &req.name)?;

        sqlx::query_as::<_, Organization>(
            "INSERT INTO organizations (clerk_org_id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(&req.clerk_org_id)
        .bind(&req.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_clerk_id_conflict(e, &req.clerk_org_id))
    }

    pub async fn find_all(&self) -> AppResult<Vec<Organization>> {
        let rows = sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_one(&self, id: Uuid) -> AppResult<Organization> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organization with ID {} not found", id)))
    }

    pub async fn find_by_clerk_org_id(&self, clerk_org_id: &str) -> AppResult<Organization> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE clerk_org_id = $1")
            .bind(clerk_org_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Organization with Clerk ID {} not found",
                    clerk_org_id
                ))
            })
    }

    /// Returns the organization for `clerk_org_id`, creating it with `name`
    /// if needed. An existing organization keeps its name. Single statement,
    /// so concurrent callers end up with the same row.
    pub async fn find_or_create(&self, clerk_org_id: &str, name: &str) -> AppResult<Organization> {
        require("clerkOrgId", clerk_org_id)?;

        let org = sqlx::query_as::<_, Organization>(
            "INSERT INTO organizations (clerk_org_id, name)
             VALUES ($1, $2)
             ON CONFLICT (clerk_org_id)
             DO UPDATE SET clerk_org_id = EXCLUDED.clerk_org_id
             RETURNING *",
        )
        .bind(clerk_org_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(org)
    }

    pub async fn update(&self, id: Uuid, req: UpdateOrganization) -> AppResult<Organization> {
        require_if_present("clerkOrgId", req.clerk_org_id.as_deref())?;
        require_if_present("name", req.name.as_deref())?;

        sqlx::query_as::<_, Organization>(
            "UPDATE organizations
             SET clerk_org_id = COALESCE($2, clerk_org_id),
                 name = COALESCE($3, name),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&req.clerk_org_id)
        .bind(&req.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_clerk_id_conflict(e, req.clerk_org_id.as_deref().unwrap_or_default())
        })?
        .ok_or_else(|| AppError::NotFound(format!("Organization with ID {} not found", id)))
    }

    pub async fn remove(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Organization with ID {} not found",
                id
            )));
        }
        Ok(())
    }
}

/// Unique violation on `clerk_org_id` becomes a 400.
fn map_clerk_id_conflict(e: sqlx::Error, clerk_org_id: &str) -> AppError {
    let is_unique = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if is_unique {
        AppError::InvalidInput(format!(
            "Organization with Clerk ID {} already exists",
            clerk_org_id
        ))
    } else {
        AppError::Database(e)
    }
}

/// Name used by `ensure` when the caller gives none.
pub fn default_organization_name(clerk_org_id: &str) -> String {
    let prefix: String = clerk_org_id.chars().take(8).collect();
    format!("Organization {}", prefix)
}
