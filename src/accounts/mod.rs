pub mod repo;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::publication::PublicationType;

/// The identity that owns publications.
///
/// `vehicles_published` / `businesses_published` are lifetime counters: they
/// only ever increase, even when listings are deleted. They are the sole
/// basis for first-publication benefits; counting current rows would re-grant
/// free tiers after a delete.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub credits: i64,
    pub fraud_strikes: i32,
    pub vehicles_published: i64,
    pub businesses_published: i64,
    pub created_at: OffsetDateTime,
}

impl Account {
    pub fn lifetime_count(&self, kind: PublicationType) -> i64 {
        match kind {
            PublicationType::Vehicle => self.vehicles_published,
            PublicationType::Business => self.businesses_published,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeOutcome {
    Charged { remaining: i64 },
    InsufficientCredits,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Account>>;

    async fn add_strikes(&self, id: Uuid, amount: i32) -> anyhow::Result<()>;

    async fn increment_lifetime(&self, id: Uuid, kind: PublicationType) -> anyhow::Result<()>;

    /// Debits one credit and appends the matching ledger row in a single
    /// transaction. The decrement is conditional on a sufficient balance so
    /// two racing submissions can never both spend the last credit.
    async fn charge_credit(
        &self,
        id: Uuid,
        description: &str,
        details: serde_json::Value,
    ) -> anyhow::Result<ChargeOutcome>;
}
