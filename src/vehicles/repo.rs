use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::publication::orchestrator::{ListingPersistence, PublicationDecision};
use crate::publication::PublicationType;

use super::dto::CreateVehicleRequest;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub account_id: Uuid,
    pub title: String,
    pub description: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub currency: String,
    pub city: String,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub color: Option<String>,
    pub vehicle_type: Option<String>,
    pub transmission: Option<String>,
    pub fuel: Option<String>,
    pub engine: Option<String>,
    pub mileage: Option<i32>,
    pub images: Vec<String>,
    pub is_active: bool,
    pub is_free_publication: bool,
    pub content_hash: Option<String>,
    pub published_at: OffsetDateTime,
    pub expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl Vehicle {
    /// Visibility as reported to clients: active and not past its window.
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
pub struct PgVehicles {
    db: PgPool,
}

impl PgVehicles {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE account_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await
        .context("list vehicles by owner")?;
        Ok(rows)
    }

    pub async fn set_country(&self, id: Uuid, country: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE vehicles SET country = $2 WHERE id = $1")
            .bind(id)
            .bind(country)
            .execute(&self.db)
            .await
            .context("set vehicle country")?;
        Ok(())
    }
}

#[async_trait]
impl ListingPersistence for PgVehicles {
    type Draft = CreateVehicleRequest;
    type Listing = Vehicle;

    fn kind(&self) -> PublicationType {
        PublicationType::Vehicle
    }

    async fn has_recent_duplicate(
        &self,
        owner: Uuid,
        content_hash: &str,
        since: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let found: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM vehicles
            WHERE account_id = $1 AND content_hash = $2 AND created_at >= $3
            LIMIT 1
            "#,
        )
        .bind(owner)
        .bind(content_hash)
        .bind(since)
        .fetch_optional(&self.db)
        .await
        .context("look up duplicate vehicle content")?;
        Ok(found.is_some())
    }

    async fn insert(
        &self,
        owner: Uuid,
        draft: &CreateVehicleRequest,
        decision: &PublicationDecision,
    ) -> anyhow::Result<Vehicle> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles
                (account_id, title, description, brand, model, year, price, currency,
                 city, latitude, longitude, color, vehicle_type, transmission, fuel,
                 engine, mileage, images, is_active, is_free_publication, content_hash,
                 published_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23)
            RETURNING *
            "#,
        )
        .bind(owner)
        .bind(draft.title.as_deref().unwrap_or_default().trim())
        .bind(draft.description.as_deref().unwrap_or_default().trim())
        .bind(draft.brand.as_deref().unwrap_or_default().trim())
        .bind(draft.model.as_deref().unwrap_or_default().trim())
        .bind(draft.year.unwrap_or_default())
        .bind(draft.price.unwrap_or_default())
        .bind(draft.currency.as_deref().unwrap_or("MXN"))
        .bind(draft.city.as_deref().unwrap_or_default().trim())
        .bind(draft.latitude)
        .bind(draft.longitude)
        .bind(&draft.color)
        .bind(&draft.vehicle_type)
        .bind(&draft.transmission)
        .bind(&draft.fuel)
        .bind(&draft.engine)
        .bind(draft.mileage)
        .bind(&draft.images)
        .bind(decision.entitlement.is_active)
        .bind(decision.entitlement.is_free_publication)
        .bind(&decision.content_hash)
        .bind(decision.now)
        .bind(decision.entitlement.expires_at)
        .fetch_one(&self.db)
        .await
        .context("insert vehicle")?;
        Ok(vehicle)
    }

    fn listing_id(listing: &Vehicle) -> Uuid {
        listing.id
    }
}
