use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const ENVELOPE_OBJECT: &str = "event";

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("body is not a JSON object")]
    NotAnObject,

    #[error("unexpected object kind {0:?}")]
    UnexpectedObject(String),

    #[error("data is not a JSON object")]
    DataNotAnObject,
}

/// Outer shape of every Clerk delivery.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
    pub object: String,
}

impl WebhookEnvelope {
    /// Parses a delivery body. Only a JSON object with `type`, an object
    /// `data` and `object: "event"` is accepted.
    pub fn from_slice(body: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(EnvelopeError::NotAnObject);
        }
        let envelope: WebhookEnvelope = serde_json::from_value(value)?;
        if envelope.object != ENVELOPE_OBJECT {
            return Err(EnvelopeError::UnexpectedObject(envelope.object));
        }
        if !envelope.data.is_object() {
            return Err(EnvelopeError::DataNotAnObject);
        }
        Ok(envelope)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailAddress {
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Option<Vec<EmailAddress>>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserData {
    /// First listed address, or empty when Clerk sent none.
    pub fn primary_email(&self) -> &str {
        self.email_addresses
            .as_deref()
            .and_then(|list| list.first())
            .and_then(|e| e.email_address.as_deref())
            .unwrap_or("")
    }

    pub fn display_name(&self) -> Option<String> {
        display_name(self.first_name.as_deref(), self.last_name.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationData {
    pub id: String,
    pub name: String,
}

/// Payload of `*.deleted` events.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletedObject {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationRef {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicUserData {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Membership payload. Every field is optional here; the reconciler decides
/// what is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MembershipData {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub organization: Option<OrganizationRef>,
    #[serde(default)]
    pub public_user_data: Option<PublicUserData>,
}

impl MembershipData {
    pub fn user_id(&self) -> Option<&str> {
        non_empty(
            self.public_user_data
                .as_ref()
                .and_then(|p| p.user_id.as_deref()),
        )
    }

    /// Nested organization id, falling back to the top-level field.
    pub fn organization_id(&self) -> Option<&str> {
        non_empty(self.organization.as_ref().and_then(|o| o.id.as_deref()))
            .or_else(|| non_empty(self.organization_id.as_deref()))
    }

    pub fn role(&self) -> Option<&str> {
        non_empty(self.role.as_deref())
    }

    pub fn email(&self) -> &str {
        self.public_user_data
            .as_ref()
            .and_then(|p| p.identifier.as_deref())
            .unwrap_or("")
    }

    pub fn display_name(&self) -> Option<String> {
        let public = self.public_user_data.as_ref();
        display_name(
            public.and_then(|p| p.first_name.as_deref()),
            public.and_then(|p| p.last_name.as_deref()),
        )
    }
}

#[derive(Debug, Clone)]
pub enum ClerkEvent {
    UserCreated(UserData),
    UserUpdated(UserData),
    UserDeleted(DeletedObject),
    OrganizationCreated(OrganizationData),
    OrganizationUpdated(OrganizationData),
    OrganizationDeleted(DeletedObject),
    MembershipCreated(MembershipData),
    MembershipUpdated(MembershipData),
    MembershipDeleted(MembershipData),
    Unhandled(String),
}

impl ClerkEvent {
    /// Types the payload according to `event_type`. Unknown types are kept as
    /// `Unhandled` without looking at the payload.
    pub fn parse(event_type: &str, data: Value) -> Result<Self, serde_json::Error> {
        let event = match event_type {
            "user.created" => ClerkEvent::UserCreated(serde_json::from_value(data)?),
            "user.updated" => ClerkEvent::UserUpdated(serde_json::from_value(data)?),
            "user.deleted" => ClerkEvent::UserDeleted(serde_json::from_value(data)?),
            "organization.created" => {
                ClerkEvent::OrganizationCreated(serde_json::from_value(data)?)
            }
            "organization.updated" => {
                ClerkEvent::OrganizationUpdated(serde_json::from_value(data)?)
            }
            "organization.deleted" => {
                ClerkEvent::OrganizationDeleted(serde_json::from_value(data)?)
            }
            "organizationMembership.created" => {
                ClerkEvent::MembershipCreated(serde_json::from_value(data)?)
            }
            "organizationMembership.updated" => {
                ClerkEvent::MembershipUpdated(serde_json::from_value(data)?)
            }
            "organizationMembership.deleted" => {
                ClerkEvent::MembershipDeleted(serde_json::from_value(data)?)
            }
            other => ClerkEvent::Unhandled(other.to_string()),
        };
        Ok(event)
    }
}

/// "First Last" trimmed, or None when both parts are blank.
pub fn display_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let joined = format!("{} {}", first.unwrap_or(""), last.unwrap_or(""));
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}
