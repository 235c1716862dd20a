// Clerk webhook intake: signature check, typed events, reconciliation

pub mod events;
pub mod handler;
pub mod reconcile;
pub mod signature;

pub use events::ClerkEvent;
pub use handler::{router, WebhookState};
pub use reconcile::{Outcome, WebhookReconciler};
pub use signature::{WebhookHeaders, WebhookVerifier};
