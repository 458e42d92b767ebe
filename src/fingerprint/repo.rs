use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{FingerprintRecord, FingerprintStore, NewFingerprint};
use crate::publication::PublicationType;

#[derive(Debug, Clone, FromRow)]
struct FingerprintRow {
    account_id: Uuid,
    publication_type: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: OffsetDateTime,
}

impl From<FingerprintRow> for FingerprintRecord {
    fn from(r: FingerprintRow) -> Self {
        Self {
            account_id: r.account_id,
            publication_type: if r.publication_type == "BUSINESS" {
                PublicationType::Business
            } else {
                PublicationType::Vehicle
            },
            latitude: r.latitude,
            longitude: r.longitude,
            created_at: r.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgFingerprints {
    db: PgPool,
}

impl PgFingerprints {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FingerprintStore for PgFingerprints {
    async fn record(&self, fp: NewFingerprint) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO publication_fingerprints
                (account_id, publication_type, publication_id, device_hash,
                 ip_address, latitude, longitude, content_hash, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(fp.account_id)
        .bind(fp.publication_type.as_str())
        .bind(fp.publication_id)
        .bind(&fp.device_hash)
        .bind(&fp.ip_address)
        .bind(fp.latitude)
        .bind(fp.longitude)
        .bind(&fp.content_hash)
        .bind(&fp.user_agent)
        .execute(&self.db)
        .await
        .context("insert publication fingerprint")?;
        Ok(())
    }

    async fn device_history(
        &self,
        device_hash: &str,
        since: OffsetDateTime,
    ) -> anyhow::Result<Vec<FingerprintRecord>> {
        let rows = sqlx::query_as::<_, FingerprintRow>(
            r#"
            SELECT account_id, publication_type, latitude, longitude, created_at
            FROM publication_fingerprints
            WHERE device_hash = $1 AND created_at >= $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(device_hash)
        .bind(since)
        .fetch_all(&self.db)
        .await
        .context("query device history")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
