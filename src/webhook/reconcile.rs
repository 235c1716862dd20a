use std::sync::Arc;

use serde_json::Value;

use super::events::{ClerkEvent, DeletedObject, MembershipData, OrganizationData, UserData};
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::store::{IdentityStore, MembershipUpsert};

/// What reconciling one event did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A row was created, updated or deleted.
    Applied,
    /// Nothing to write: deferred creation, absent row, or incomplete membership data.
    Skipped,
    /// Event type this service does not act on.
    Unhandled,
}

/// Where a Clerk user stands locally. A user row only exists once a
/// membership event has supplied its organization.
#[derive(Debug, Clone)]
pub enum UserLink {
    Unseen,
    Linked(User),
}

/// Applies Clerk events to organizations and users.
pub struct WebhookReconciler {
    store: Arc<dyn IdentityStore>,
}

impl WebhookReconciler {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Processes an event and logs any failure. Never fails: the sender gets a
    /// success response either way so transient errors do not trigger retries.
    pub async fn handle_event(&self, event_type: &str, data: Value) {
        match self.process(event_type, data).await {
            Ok(outcome) => {
                tracing::debug!("Clerk event {} reconciled: {:?}", event_type, outcome);
            }
            Err(e) => {
                tracing::error!("Failed to process Clerk event {}: {}", event_type, e);
            }
        }
    }

    pub async fn process(&self, event_type: &str, data: Value) -> AppResult<Outcome> {
        let event = ClerkEvent::parse(event_type, data).map_err(|e| {
            AppError::InvalidInput(format!("Malformed {} payload: {}", event_type, e))
        })?;
        self.apply(event).await
    }

    pub async fn apply(&self, event: ClerkEvent) -> AppResult<Outcome> {
        match event {
            ClerkEvent::UserCreated(user) => Ok(self.user_created(&user)),
            ClerkEvent::UserUpdated(user) => self.user_updated(&user).await,
            ClerkEvent::UserDeleted(deleted) => self.user_deleted(&deleted).await,
            ClerkEvent::OrganizationCreated(org) => self.upsert_organization(&org, "created").await,
            ClerkEvent::OrganizationUpdated(org) => self.upsert_organization(&org, "updated").await,
            ClerkEvent::OrganizationDeleted(deleted) => self.organization_deleted(&deleted).await,
            ClerkEvent::MembershipCreated(membership)
            | ClerkEvent::MembershipUpdated(membership) => {
                self.membership_upserted(&membership).await
            }
            ClerkEvent::MembershipDeleted(membership) => {
                self.membership_deleted(&membership).await
            }
            ClerkEvent::Unhandled(event_type) => {
                tracing::info!("Unhandled Clerk event: {}", event_type);
                Ok(Outcome::Unhandled)
            }
        }
    }

    pub async fn resolve_user_link(&self, clerk_id: &str) -> AppResult<UserLink> {
        Ok(match self.store.find_user_by_clerk_id(clerk_id).await? {
            Some(user) => UserLink::Linked(user),
            None => UserLink::Unseen,
        })
    }

    fn user_created(&self, user: &UserData) -> Outcome {
        // users.organization_id is required; the row is created by the first membership event
        tracing::info!(
            "User {} ({}) created in Clerk, waiting for organization membership",
            user.id,
            user.primary_email()
        );
        Outcome::Skipped
    }

    async fn user_updated(&self, user: &UserData) -> AppResult<Outcome> {
        match self.resolve_user_link(&user.id).await? {
            UserLink::Unseen => {
                tracing::info!(
                    "User {} not found, skipping update until organization membership",
                    user.id
                );
                Ok(Outcome::Skipped)
            }
            UserLink::Linked(_) => {
                let name = user.display_name();
                self.store
                    .update_user_profile(&user.id, user.primary_email(), name.as_deref())
                    .await?;
                tracing::info!("User updated: {}", user.id);
                Ok(Outcome::Applied)
            }
        }
    }

    async fn user_deleted(&self, deleted: &DeletedObject) -> AppResult<Outcome> {
        let Some(clerk_id) = deleted.id.as_deref() else {
            tracing::warn!("Missing id in user.deleted event");
            return Ok(Outcome::Skipped);
        };
        if self.store.delete_user_by_clerk_id(clerk_id).await? {
            tracing::info!("User deleted: {}", clerk_id);
            Ok(Outcome::Applied)
        } else {
            tracing::warn!("User {} not found, nothing to delete", clerk_id);
            Ok(Outcome::Skipped)
        }
    }

    async fn upsert_organization(
        &self,
        org: &OrganizationData,
        action: &str,
    ) -> AppResult<Outcome> {
        let stored = self.store.upsert_organization(&org.id, &org.name).await?;
        tracing::info!("Organization {}: {} ({})", action, org.id, stored.id);
        Ok(Outcome::Applied)
    }

    async fn organization_deleted(&self, deleted: &DeletedObject) -> AppResult<Outcome> {
        let Some(clerk_org_id) = deleted.id.as_deref() else {
            tracing::warn!("Missing id in organization.deleted event");
            return Ok(Outcome::Skipped);
        };
        if self
            .store
            .delete_organization_by_clerk_id(clerk_org_id)
            .await?
        {
            tracing::info!("Organization deleted: {}", clerk_org_id);
            Ok(Outcome::Applied)
        } else {
            tracing::warn!("Organization {} not found, nothing to delete", clerk_org_id);
            Ok(Outcome::Skipped)
        }
    }

    async fn membership_upserted(&self, membership: &MembershipData) -> AppResult<Outcome> {
        let Some(user_id) = membership.user_id() else {
            tracing::warn!("Missing userId in organizationMembership event");
            return Ok(Outcome::Skipped);
        };
        let Some(clerk_org_id) = membership.organization_id() else {
            tracing::warn!(
                "Missing organizationId in organizationMembership event for user {}",
                user_id
            );
            return Ok(Outcome::Skipped);
        };
        let Some(role) = membership.role() else {
            tracing::warn!(
                "Missing role in organizationMembership event for user {}",
                user_id
            );
            return Ok(Outcome::Skipped);
        };

        // Membership events never create organizations.
        let Some(org) = self.store.find_organization_by_clerk_id(clerk_org_id).await? else {
            tracing::warn!(
                "Organization {} does not exist, cannot add user {}",
                clerk_org_id,
                user_id
            );
            return Ok(Outcome::Skipped);
        };

        let upsert = MembershipUpsert {
            clerk_id: user_id.to_string(),
            email: membership.email().to_string(),
            name: membership.display_name(),
            organization_id: org.id,
            role: role.to_string(),
        };
        self.store.upsert_membership_user(&upsert).await?;

        tracing::info!(
            "User {} added to organization {} with role: {}",
            user_id,
            org.id,
            role
        );
        Ok(Outcome::Applied)
    }

    async fn membership_deleted(&self, membership: &MembershipData) -> AppResult<Outcome> {
        let Some(user_id) = membership.user_id() else {
            tracing::warn!("Missing userId in organizationMembership.deleted event");
            return Ok(Outcome::Skipped);
        };

        // organization_id is NOT NULL, so the user keeps its organization and loses the role.
        match self.store.clear_user_role(user_id).await? {
            Some(_) => {
                tracing::info!("User {} role cleared (still in organization)", user_id);
                Ok(Outcome::Applied)
            }
            None => {
                tracing::warn!("User {} not found, cannot clear role", user_id);
                Ok(Outcome::Skipped)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, PLACEHOLDER_EMAIL};
    use serde_json::json;

    fn setup() -> (Arc<MemoryStore>, WebhookReconciler) {
        let store = Arc::new(MemoryStore::new());
        let reconciler = WebhookReconciler::new(store.clone());
        (store, reconciler)
    }

    fn membership(user_id: &str, org_id: &str, role: &str) -> Value {
        json!({
            "id": "orgmem_1",
            "role": role,
            "organization": {"id": org_id, "name": "Acme"},
            "public_user_data": {
                "user_id": user_id,
                "identifier": "a@b.com",
                "first_name": "A"
            }
        })
    }

    #[tokio::test]
    async fn test_user_created_is_deferred() {
        let (store, reconciler) = setup();
        let outcome = reconciler
            .process(
                "user.created",
                json!({
                    "id": "user_1",
                    "email_addresses": [{"email_address": "a@b.com"}],
                    "first_name": "A"
                }),
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped);
        assert!(store.users().is_empty());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_membership_created_scenario() {
        let (store, reconciler) = setup();
        let org = store.seed_organization("org1", "Acme");

        let outcome = reconciler
            .process(
                "organizationMembership.created",
                json!({
                    "public_user_data": {"user_id": "u1", "identifier": "a@b.com", "first_name": "A"},
                    "organization": {"id": "org1"},
                    "role": "admin"
                }),
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(store.write_count(), 1);
        let users = store.users();
        assert_eq!(users.len(), 1);
        let user = &users[0];
        assert_eq!(user.clerk_id, "u1");
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.name.as_deref(), Some("A"));
        assert_eq!(user.role.as_deref(), Some("admin"));
        assert_eq!(user.organization_id, org.id);
    }

    #[tokio::test]
    async fn test_membership_missing_fields_writes_nothing() {
        let (store, reconciler) = setup();
        store.seed_organization("org1", "Acme");

        let payloads = [
            json!({"organization": {"id": "org1"}, "role": "admin", "public_user_data": {}}),
            json!({"organization": {"id": "org1"}, "role": "admin"}),
            json!({"role": "admin", "public_user_data": {"user_id": "u1"}}),
            json!({"organization": {"id": "org1"}, "public_user_data": {"user_id": "u1"}}),
            json!({"organization_id": "", "role": "admin", "public_user_data": {"user_id": "u1"}}),
        ];
        for payload in payloads {
            let outcome = reconciler
                .process("organizationMembership.created", payload)
                .await
                .unwrap();
            assert_eq!(outcome, Outcome::Skipped);
        }
        assert_eq!(store.write_count(), 0);
        assert!(store.users().is_empty());
    }

    #[tokio::test]
    async fn test_membership_for_unknown_organization_writes_nothing() {
        let (store, reconciler) = setup();
        let outcome = reconciler
            .process(
                "organizationMembership.created",
                membership("u1", "org_missing", "admin"),
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped);
        assert_eq!(store.write_count(), 0);
        assert!(store.organizations().is_empty());
        assert!(store.users().is_empty());
    }

    #[tokio::test]
    async fn test_membership_uses_top_level_organization_id() {
        let (store, reconciler) = setup();
        let org = store.seed_organization("org1", "Acme");
        reconciler
            .process(
                "organizationMembership.created",
                json!({
                    "organization_id": "org1",
                    "role": "org:member",
                    "public_user_data": {"user_id": "u1"}
                }),
            )
            .await
            .unwrap();
        let users = store.users();
        assert_eq!(users[0].organization_id, org.id);
        assert_eq!(users[0].email, PLACEHOLDER_EMAIL);
        assert_eq!(users[0].name, None);
    }

    #[tokio::test]
    async fn test_membership_updated_keeps_existing_profile() {
        let (store, reconciler) = setup();
        let first = store.seed_organization("org1", "Acme");
        let second = store.seed_organization("org2", "Globex");
        store.seed_user("u1", "real@example.com", first.id);

        reconciler
            .process(
                "organizationMembership.updated",
                json!({
                    "organization": {"id": "org2"},
                    "role": "admin",
                    "public_user_data": {"user_id": "u1", "identifier": "", "first_name": null}
                }),
            )
            .await
            .unwrap();

        let users = store.users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "real@example.com");
        assert_eq!(users[0].organization_id, second.id);
        assert_eq!(users[0].role.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_user_updated_only_touches_linked_users() {
        let (store, reconciler) = setup();
        let payload = json!({
            "id": "u1",
            "email_addresses": [{"email_address": "new@example.com"}],
            "first_name": "Ada",
            "last_name": "Lovelace"
        });

        let outcome = reconciler.process("user.updated", payload.clone()).await.unwrap();
        assert_eq!(outcome, Outcome::Skipped);
        assert!(store.users().is_empty());
        assert_eq!(store.write_count(), 0);

        let org = store.seed_organization("org1", "Acme");
        store.seed_user("u1", PLACEHOLDER_EMAIL, org.id);
        let outcome = reconciler.process("user.updated", payload).await.unwrap();
        assert_eq!(outcome, Outcome::Applied);

        let user = &store.users()[0];
        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.name.as_deref(), Some("Ada Lovelace"));
    }

    #[tokio::test]
    async fn test_user_deleted_tolerates_absence() {
        let (store, reconciler) = setup();
        let outcome = reconciler
            .process("user.deleted", json!({"id": "u1", "deleted": true}))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped);

        let org = store.seed_organization("org1", "Acme");
        store.seed_user("u1", "a@b.com", org.id);
        let outcome = reconciler
            .process("user.deleted", json!({"id": "u1", "deleted": true}))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert!(store.users().is_empty());
    }

    #[tokio::test]
    async fn test_organization_created_twice_is_one_row() {
        let (store, reconciler) = setup();
        reconciler
            .process("organization.created", json!({"id": "org1", "name": "Acme"}))
            .await
            .unwrap();
        reconciler
            .process("organization.created", json!({"id": "org1", "name": "Acme Corp"}))
            .await
            .unwrap();

        let orgs = store.organizations();
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "Acme Corp");
    }

    #[tokio::test]
    async fn test_organization_updated_creates_when_missing() {
        let (store, reconciler) = setup();
        let outcome = reconciler
            .process("organization.updated", json!({"id": "org1", "name": "Acme"}))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(store.organizations()[0].clerk_org_id, "org1");
    }

    #[tokio::test]
    async fn test_organization_deleted_tolerates_absence() {
        let (store, reconciler) = setup();
        let outcome = reconciler
            .process("organization.deleted", json!({"id": "org1", "deleted": true}))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped);

        store.seed_organization("org1", "Acme");
        let outcome = reconciler
            .process("organization.deleted", json!({"id": "org1", "deleted": true}))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert!(store.organizations().is_empty());
    }

    #[tokio::test]
    async fn test_membership_deleted_clears_role_only() {
        let (store, reconciler) = setup();
        let org = store.seed_organization("org1", "Acme");
        store.seed_user("u1", "a@b.com", org.id);

        let outcome = reconciler
            .process(
                "organizationMembership.deleted",
                membership("u1", "org1", "admin"),
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);

        let user = &store.users()[0];
        assert_eq!(user.role, None);
        assert_eq!(user.organization_id, org.id);
    }

    #[tokio::test]
    async fn test_membership_deleted_for_unknown_user() {
        let (store, reconciler) = setup();
        let org = store.seed_organization("org1", "Acme");
        store.seed_user("someone_else", "x@example.com", org.id);

        let outcome = reconciler
            .process(
                "organizationMembership.deleted",
                membership("u1", "org1", "admin"),
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped);
        assert_eq!(store.users()[0].role.as_deref(), Some("org:member"));
    }

    #[tokio::test]
    async fn test_unhandled_event() {
        let (store, reconciler) = setup();
        let outcome = reconciler
            .process("session.created", json!({"id": "sess_1"}))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Unhandled);
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_swallowed_by_handle_event() {
        let (store, reconciler) = setup();
        assert!(reconciler
            .process("organization.created", json!({"id": 42}))
            .await
            .is_err());
        // Boundary variant returns normally.
        reconciler
            .handle_event("organization.created", json!({"id": 42}))
            .await;
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_user_lifecycle_through_membership() {
        let (store, reconciler) = setup();
        reconciler
            .handle_event("organization.created", json!({"id": "org1", "name": "Acme"}))
            .await;
        reconciler
            .handle_event("user.created", json!({"id": "u1"}))
            .await;
        assert!(matches!(
            reconciler.resolve_user_link("u1").await.unwrap(),
            UserLink::Unseen
        ));

        reconciler
            .handle_event(
                "organizationMembership.created",
                membership("u1", "org1", "org:admin"),
            )
            .await;
        assert!(matches!(
            reconciler.resolve_user_link("u1").await.unwrap(),
            UserLink::Linked(user) if user.role.as_deref() == Some("org:admin")
        ));
    }
}
