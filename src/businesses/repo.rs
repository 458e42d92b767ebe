use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::publication::orchestrator::{ListingPersistence, PublicationDecision};
use crate::publication::PublicationType;

use super::dto::CreateBusinessRequest;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Business {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub website: Option<String>,
    pub hours: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub images: Vec<String>,
    pub services: Vec<String>,
    pub is_active: bool,
    pub is_free_publication: bool,
    pub content_hash: Option<String>,
    pub published_at: OffsetDateTime,
    pub expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl Business {
    pub fn effective_status(&self, now: OffsetDateTime) -> &'static str {
        let expired = self.expires_at.is_some_and(|t| t <= now);
        if self.is_active && !expired {
            "ACTIVE"
        } else {
            "INACTIVE"
        }
    }
}

#[derive(Clone)]
pub struct PgBusinesses {
    db: PgPool,
}

impl PgBusinesses {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Business>> {
        let rows = sqlx::query_as::<_, Business>(
            r#"
            SELECT * FROM businesses
            WHERE account_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await
        .context("list businesses by owner")?;
        Ok(rows)
    }

    pub async fn set_country(&self, id: Uuid, country: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE businesses SET country = $2 WHERE id = $1")
            .bind(id)
            .bind(country)
            .execute(&self.db)
            .await
            .context("set business country")?;
        Ok(())
    }
}

#[async_trait]
impl ListingPersistence for PgBusinesses {
    type Draft = CreateBusinessRequest;
    type Listing = Business;

    fn kind(&self) -> PublicationType {
        PublicationType::Business
    }

    async fn has_recent_duplicate(
        &self,
        owner: Uuid,
        content_hash: &str,
        since: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let found: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM businesses
            WHERE account_id = $1 AND content_hash = $2 AND created_at >= $3
            LIMIT 1
            "#,
        )
        .bind(owner)
        .bind(content_hash)
        .bind(since)
        .fetch_optional(&self.db)
        .await
        .context("look up duplicate business")?;
        Ok(found.is_some())
    }

    async fn insert(
        &self,
        owner: Uuid,
        draft: &CreateBusinessRequest,
        decision: &PublicationDecision,
    ) -> anyhow::Result<Business> {
        let business = sqlx::query_as::<_, Business>(
            r#"
            INSERT INTO businesses
                (account_id, name, category, description, address, city, state,
                 phone, whatsapp, website, hours, latitude, longitude, images,
                 services, is_active, is_free_publication, content_hash,
                 published_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20)
            RETURNING *
            "#,
        )
        .bind(owner)
        .bind(draft.name.as_deref().unwrap_or_default().trim())
        .bind(draft.category.as_deref().unwrap_or_default().trim())
        .bind(&draft.description)
        .bind(draft.address.as_deref().unwrap_or_default().trim())
        .bind(draft.city.as_deref().unwrap_or_default().trim())
        .bind(&draft.state)
        .bind(&draft.phone)
        .bind(&draft.whatsapp)
        .bind(&draft.website)
        .bind(&draft.hours)
        .bind(draft.latitude.unwrap_or_default())
        .bind(draft.longitude.unwrap_or_default())
        .bind(&draft.images)
        .bind(&draft.services)
        .bind(decision.entitlement.is_active)
        .bind(decision.entitlement.is_free_publication)
        .bind(&decision.content_hash)
        .bind(decision.now)
        .bind(decision.entitlement.expires_at)
        .fetch_one(&self.db)
        .await
        .context("insert business")?;
        Ok(business)
    }

    fn listing_id(listing: &Business) -> Uuid {
        listing.id
    }
}
