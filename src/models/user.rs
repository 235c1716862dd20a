use serde::Serialize;
use sqlx::FromRow;

/// Application user mirrored from Clerk. Always attached to an organization.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: uuid::Uuid,
    pub clerk_id: String,
    pub email: String,
    pub name: Option<String>,
    pub organization_id: uuid::Uuid,
    pub role: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
