use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Account, AccountStore, ChargeOutcome};
use crate::publication::PublicationType;

#[derive(Clone)]
pub struct PgAccounts {
    db: PgPool,
}

impl PgAccounts {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for PgAccounts {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, is_admin, credits, fraud_strikes,
                   vehicles_published, businesses_published, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find account")?;
        Ok(account)
    }

    async fn add_strikes(&self, id: Uuid, amount: i32) -> anyhow::Result<()> {
        sqlx::query("UPDATE accounts SET fraud_strikes = fraud_strikes + $2 WHERE id = $1")
            .bind(id)
            .bind(amount)
            .execute(&self.db)
            .await
            .context("add fraud strikes")?;
        Ok(())
    }

    async fn increment_lifetime(&self, id: Uuid, kind: PublicationType) -> anyhow::Result<()> {
        let sql = match kind {
            PublicationType::Vehicle => {
                "UPDATE accounts SET vehicles_published = vehicles_published + 1 WHERE id = $1"
            }
            PublicationType::Business => {
                "UPDATE accounts SET businesses_published = businesses_published + 1 WHERE id = $1"
            }
        };
        sqlx::query(sql)
            .bind(id)
            .execute(&self.db)
            .await
            .context("increment lifetime publication count")?;
        Ok(())
    }

    async fn charge_credit(
        &self,
        id: Uuid,
        description: &str,
        details: serde_json::Value,
    ) -> anyhow::Result<ChargeOutcome> {
        let mut tx = self.db.begin().await.context("begin charge tx")?;

        // Conditional decrement is the enforcement point against a
        // double-spend race: the row only comes back if the balance covered it.
        let remaining: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE accounts
            SET credits = credits - 1
            WHERE id = $1 AND credits >= 1
            RETURNING credits
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("conditional credit decrement")?;

        let Some((remaining,)) = remaining else {
            tx.rollback().await.context("rollback charge tx")?;
            return Ok(ChargeOutcome::InsufficientCredits);
        };

        sqlx::query(
            r#"
            INSERT INTO credit_transactions (account_id, amount, description, details)
            VALUES ($1, -1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(description)
        .bind(&details)
        .execute(&mut *tx)
        .await
        .context("append credit transaction")?;

        tx.commit().await.context("commit charge tx")?;
        Ok(ChargeOutcome::Charged { remaining })
    }
}
