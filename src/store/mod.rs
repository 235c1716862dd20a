// Persistence seam for the webhook reconciler and question-bank instantiation

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Organization, Question, QuestionBankQuestion, User};

/// Stored when a membership event carries no email; `user.updated` corrects it later.
pub const PLACEHOLDER_EMAIL: &str = "unknown@example.com";

/// User fields carried by an organization membership event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipUpsert {
    pub clerk_id: String,
    /// Empty when the event had no identifier.
    pub email: String,
    pub name: Option<String>,
    pub organization_id: Uuid,
    pub role: String,
}

impl MembershipUpsert {
    /// Email written when the user row is first created.
    pub fn email_for_create(&self) -> &str {
        if self.email.is_empty() {
            PLACEHOLDER_EMAIL
        } else {
            &self.email
        }
    }
}

/// Organizations and users keyed by their Clerk ids.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_organization_by_clerk_id(
        &self,
        clerk_org_id: &str,
    ) -> AppResult<Option<Organization>>;

    /// Creates the organization or renames the existing one.
    async fn upsert_organization(&self, clerk_org_id: &str, name: &str)
        -> AppResult<Organization>;

    /// Returns false when no organization had this Clerk id.
    async fn delete_organization_by_clerk_id(&self, clerk_org_id: &str) -> AppResult<bool>;

    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> AppResult<Option<User>>;

    /// Updates an existing user's profile. An empty email keeps the stored one.
    async fn update_user_profile(
        &self,
        clerk_id: &str,
        email: &str,
        name: Option<&str>,
    ) -> AppResult<Option<User>>;

    /// Creates the user or moves it to the given organization and role.
    /// On update, empty email and missing name leave the stored values alone.
    async fn upsert_membership_user(&self, upsert: &MembershipUpsert) -> AppResult<User>;

    /// Sets role to null, keeping the organization link. None when the user is absent.
    async fn clear_user_role(&self, clerk_id: &str) -> AppResult<Option<User>>;

    /// Returns false when no user had this Clerk id.
    async fn delete_user_by_clerk_id(&self, clerk_id: &str) -> AppResult<bool>;
}

/// Question-bank lookups and ordered question appends.
#[async_trait]
pub trait SurveyStore: Send + Sync {
    async fn find_bank_question(&self, id: Uuid) -> AppResult<Option<QuestionBankQuestion>>;

    /// Copies the bank question into the survey after its current highest order.
    /// Appends to the same survey are serialized, so orders never collide.
    async fn append_question_from_bank(
        &self,
        bank_question: &QuestionBankQuestion,
        survey_id: Uuid,
    ) -> AppResult<Question>;
}

/// Next order for a survey whose highest existing order is `current_max`.
pub fn next_order(current_max: Option<i32>) -> AppResult<i32> {
    match current_max {
        None => Ok(0),
        Some(max) => max.checked_add(1).ok_or_else(|| {
            AppError::InvalidInput("Survey has no room for another question".to_string())
        }),
    }
}
