pub mod repo;

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::publication::PublicationType;

/// Normalized device identifier. Clients send it either as a plain string or
/// as a `{ "visitorId": … }` object; absence maps to the `"unknown"` sentinel
/// so core logic never has to branch on payload shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHash(String);

impl DeviceHash {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn from_payload(payload: Option<&Value>) -> Self {
        match payload {
            Some(Value::String(s)) if !s.trim().is_empty() => Self(s.trim().to_string()),
            Some(Value::Object(map)) => match map.get("visitorId").and_then(Value::as_str) {
                Some(id) if !id.trim().is_empty() => Self(id.trim().to_string()),
                // Unexpected object shapes still yield a stable-ish value
                // rather than being dropped on the floor.
                _ => Self(Value::Object(map.clone()).to_string().chars().take(100).collect()),
            },
            _ => Self(Self::UNKNOWN.to_string()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One fingerprint row to persist after a successful submission.
#[derive(Debug, Clone)]
pub struct NewFingerprint {
    pub account_id: Uuid,
    pub publication_type: PublicationType,
    pub publication_id: Option<Uuid>,
    pub device_hash: String,
    pub ip_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub content_hash: Option<String>,
    pub user_agent: Option<String>,
}

/// A past publication attempt as seen by the fraud rules. Rows are written
/// once and only ever read afterwards.
#[derive(Debug, Clone)]
pub struct FingerprintRecord {
    pub account_id: Uuid,
    pub publication_type: PublicationType,
    /// Coordinates as submitted; `None` when the client sent no GPS fix.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait FingerprintStore: Send + Sync {
    async fn record(&self, fingerprint: NewFingerprint) -> anyhow::Result<()>;

    /// All records sharing a device hash since `since`, any account.
    /// Eventually consistent reads are acceptable here.
    async fn device_history(
        &self,
        device_hash: &str,
        since: OffsetDateTime,
    ) -> anyhow::Result<Vec<FingerprintRecord>>;
}
