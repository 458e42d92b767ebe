pub mod entitlement;
pub mod fraud;
pub mod hash;
pub mod orchestrator;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::fingerprint::DeviceHash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PublicationType {
    Vehicle,
    Business,
}

impl PublicationType {
    pub fn as_str(self) -> &'static str {
        match self {
            PublicationType::Vehicle => "VEHICLE",
            PublicationType::Business => "BUSINESS",
        }
    }
}

/// Request-scoped signals the engine needs besides the draft itself.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub ip_address: String,
    pub device_hash: DeviceHash,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    /// Collects IP, device hash and user agent from the request. The device
    /// fingerprint payload is whatever the client sent in the body; it is
    /// normalized here so nothing downstream branches on its shape.
    pub fn from_request(headers: &HeaderMap, fingerprint: Option<&serde_json::Value>) -> Self {
        Self {
            ip_address: client_ip(headers),
            device_hash: DeviceHash::from_payload(fingerprint),
            user_agent: headers
                .get(axum::http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string()),
        }
    }
}

fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(client_ip(&headers), "1.2.3.4");
    }

    #[test]
    fn client_ip_falls_back_to_real_ip_then_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(client_ip(&headers), "9.9.9.9");
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }
}
