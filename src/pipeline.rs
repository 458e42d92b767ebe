use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::publication::PublicationType;

/// Event sink for "something happened" notifications (new listing in town,
/// etc). The engine only needs "emit this event", not the transport, so the
/// socket/broker lives behind this seam.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &str, payload: serde_json::Value);
}

/// Default publisher: structured log lines. Real deployments swap in a
/// socket or message-bus implementation.
pub struct LogPublisher;

impl EventPublisher for LogPublisher {
    fn publish(&self, event: &str, payload: serde_json::Value) {
        info!(event, %payload, "event published");
    }
}

/// Hand-off to the image/content review pipeline. Invoked after a successful
/// submission; its outcome never influences the publication decision.
#[async_trait]
pub trait ModerationPipeline: Send + Sync {
    async fn review(
        &self,
        kind: PublicationType,
        listing_id: Uuid,
        images: &[String],
    ) -> anyhow::Result<()>;
}

/// Default pipeline: records that a review was queued. The actual reviewer
/// runs elsewhere and picks listings up from its own side.
pub struct LogModeration;

#[async_trait]
impl ModerationPipeline for LogModeration {
    async fn review(
        &self,
        kind: PublicationType,
        listing_id: Uuid,
        images: &[String],
    ) -> anyhow::Result<()> {
        info!(kind = kind.as_str(), %listing_id, images = images.len(), "moderation review queued");
        Ok(())
    }
}

/// Best-effort reverse geocoding against Nominatim. Failures are logged by
/// callers and never affect a listing's validity.
#[derive(Clone)]
pub struct Geocoder {
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    country_code: Option<String>,
}

impl Geocoder {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub async fn country_code(&self, latitude: f64, longitude: f64) -> anyhow::Result<Option<String>> {
        let url = format!(
            "https://nominatim.openstreetmap.org/reverse?format=json&lat={latitude}&lon={longitude}&zoom=3&addressdetails=1"
        );
        let res = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, "marketgate/1.0")
            .send()
            .await?
            .error_for_status()?
            .json::<ReverseResponse>()
            .await?;
        Ok(res
            .address
            .and_then(|a| a.country_code)
            .map(|c| c.to_uppercase()))
    }
}

impl Default for Geocoder {
    fn default() -> Self {
        Self::new()
    }
}
