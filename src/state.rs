use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use crate::accounts::repo::PgAccounts;
use crate::accounts::AccountStore;
use crate::config::AppConfig;
use crate::fingerprint::repo::PgFingerprints;
use crate::fingerprint::FingerprintStore;
use crate::pipeline::{EventPublisher, Geocoder, LogModeration, LogPublisher, ModerationPipeline};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub accounts: Arc<dyn AccountStore>,
    pub fingerprints: Arc<dyn FingerprintStore>,
    pub events: Arc<dyn EventPublisher>,
    pub moderation: Arc<dyn ModerationPipeline>,
    pub geocoder: Arc<Geocoder>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self::from_parts(db, config))
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>) -> Self {
        Self {
            accounts: Arc::new(PgAccounts::new(db.clone())),
            fingerprints: Arc::new(PgFingerprints::new(db.clone())),
            events: Arc::new(LogPublisher),
            moderation: Arc::new(LogModeration),
            geocoder: Arc::new(Geocoder::new()),
            db,
            config,
        }
    }
}
