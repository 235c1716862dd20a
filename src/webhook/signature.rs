use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use http::HeaderMap;
use ring::hmac;
use thiserror::Error;

use crate::error::{AppError, AppResult};

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

/// Allowed clock skew between the sender's timestamp and ours, both directions.
pub const DEFAULT_TOLERANCE_SECONDS: i64 = 300;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("webhook secret is not valid base64")]
    InvalidSecret,

    #[error("timestamp header is not a unix timestamp")]
    InvalidTimestamp,

    #[error("message timestamp {0} is outside the tolerance window")]
    TimestampOutOfRange(i64),

    #[error("no matching signature found")]
    NoMatchingSignature,
}

/// The three Svix headers, empty values treated as absent.
#[derive(Debug, Clone, Default)]
pub struct WebhookHeaders {
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub signature: Option<String>,
}

impl WebhookHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            id: get(HEADER_ID),
            timestamp: get(HEADER_TIMESTAMP),
            signature: get(HEADER_SIGNATURE),
        }
    }
}

/// Verifies Svix-signed webhook deliveries: base64 HMAC-SHA256 over
/// `{id}.{timestamp}.{body}` keyed by the decoded `whsec_` secret.
pub struct WebhookVerifier {
    key: hmac::Key,
    tolerance_seconds: i64,
}

impl WebhookVerifier {
    pub fn new(secret: &str, tolerance_seconds: i64) -> Result<Self, SignatureError> {
        let key_bytes = match secret.strip_prefix(SECRET_PREFIX) {
            Some(encoded) => BASE64
                .decode(encoded)
                .map_err(|_| SignatureError::InvalidSecret)?,
            None => secret.as_bytes().to_vec(),
        };
        Ok(Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, &key_bytes),
            tolerance_seconds,
        })
    }

    /// Gate for an inbound delivery. `body` must be the exact bytes received.
    pub fn verify(&self, headers: &WebhookHeaders, body: &[u8]) -> AppResult<()> {
        self.verify_at(headers, body, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, headers: &WebhookHeaders, body: &[u8], now: i64) -> AppResult<()> {
        let (Some(id), Some(timestamp), Some(signature)) = (
            headers.id.as_deref(),
            headers.timestamp.as_deref(),
            headers.signature.as_deref(),
        ) else {
            return Err(AppError::Unauthorized("Missing webhook headers".to_string()));
        };

        if body.is_empty() {
            return Err(AppError::BadRequest("Raw body not available".to_string()));
        }

        self.check(id, timestamp, signature, body, now)
            .map_err(|e| {
                tracing::error!("Webhook verification failed: {}", e);
                AppError::Unauthorized("Invalid webhook signature".to_string())
            })
    }

    fn check(
        &self,
        id: &str,
        timestamp: &str,
        signature_header: &str,
        body: &[u8],
        now: i64,
    ) -> Result<(), SignatureError> {
        let sent_at: i64 = timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        if now.abs_diff(sent_at) > self.tolerance_seconds.unsigned_abs() {
            return Err(SignatureError::TimestampOutOfRange(sent_at));
        }

        let content = signed_content(id, timestamp, body);

        // Header may carry several space separated "v1,<sig>" entries during secret rotation.
        let matched = signature_header
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| BASE64.decode(sig).ok())
            .any(|sig| hmac::verify(&self.key, &content, &sig).is_ok());

        if matched {
            Ok(())
        } else {
            Err(SignatureError::NoMatchingSignature)
        }
    }

    /// Produces a `v1,<sig>` header value for the given message.
    pub fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> String {
        let tag = hmac::sign(&self.key, &signed_content(id, timestamp, body));
        format!("{},{}", SIGNATURE_VERSION, BASE64.encode(tag.as_ref()))
    }
}

fn signed_content(id: &str, timestamp: &str, body: &[u8]) -> Vec<u8> {
    let mut content = Vec::with_capacity(id.len() + timestamp.len() + body.len() + 2);
    content.extend_from_slice(id.as_bytes());
    content.push(b'.');
    content.extend_from_slice(timestamp.as_bytes());
    content.push(b'.');
    content.extend_from_slice(body);
    content
}
