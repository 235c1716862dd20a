// Fixtures for tests that run against a real PostgreSQL database.
// They are #[ignore]d and only run with `--ignored` and DATABASE_URL set.

use sqlx::PgPool;
use uuid::Uuid;

use super::{create_pool, run_migrations};

/// Pool on `DATABASE_URL` with migrations applied, or None when unset.
pub async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };
    let pool = create_pool(&url).await.expect("connect to DATABASE_URL");
    run_migrations(&pool).await.expect("apply migrations");
    Some(pool)
}

/// Clerk-style id that no other test run will reuse.
pub fn unique_clerk_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

pub async fn insert_organization(pool: &PgPool) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO organizations (clerk_org_id, name) VALUES ($1, $2) RETURNING id",
    )
    .bind(unique_clerk_id("org"))
    .bind("Fixture Org")
    .fetch_one(pool)
    .await
    .expect("insert organization")
}

/// Organization, property and survey; returns (organization_id, survey_id).
pub async fn insert_survey(pool: &PgPool) -> (Uuid, Uuid) {
    let organization_id = insert_organization(pool).await;
    let property_id: Uuid = sqlx::query_scalar(
        "INSERT INTO properties
             (organization_id, name, address, property_type, subtype, management_model,
              city, state, country, size_sq_ft, class)
         VALUES ($1, 'Harbor View', '1 Pier Rd', 'residential', 'multifamily', 'third-party',
                 'Portland', 'OR', 'US', 120000, 'A')
         RETURNING id",
    )
    .bind(organization_id)
    .fetch_one(pool)
    .await
    .expect("insert property");
    let survey_id: Uuid = sqlx::query_scalar(
        "INSERT INTO surveys (property_id, title) VALUES ($1, 'Resident survey') RETURNING id",
    )
    .bind(property_id)
    .fetch_one(pool)
    .await
    .expect("insert survey");
    (organization_id, survey_id)
}

pub async fn delete_organization(pool: &PgPool, id: Uuid) {
    sqlx::query("DELETE FROM organizations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .expect("delete organization");
}
