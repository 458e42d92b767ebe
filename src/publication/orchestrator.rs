use async_trait::async_trait;
use serde_json::json;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::accounts::{AccountStore, ChargeOutcome};
use crate::config::{AdminPolicy, EntitlementPolicy, FraudPolicy};
use crate::error::{ApiError, FieldError};
use crate::fingerprint::{FingerprintStore, NewFingerprint};
use crate::state::AppState;

use super::entitlement::{self, Entitlement, EntitlementInput};
use super::fraud::{FraudEvaluator, FraudReason, FraudSignals};
use super::{PublicationType, RequestMeta};

/// What the orchestrator needs from a draft before anything runs.
pub trait ListingDraft {
    /// Field-level validation; a malformed submission must never consume a
    /// fraud check or a credit.
    fn validate(&self) -> Result<(), Vec<FieldError>>;
    /// Similarity hash; `None` for listing types without content hashing.
    fn content_hash(&self) -> Option<String>;
    fn coordinates(&self) -> Option<(f64, f64)>;
    /// Human description for the credit ledger line.
    fn describe(&self) -> String;
}

/// Resolved decision handed to the listing store when persisting.
#[derive(Debug, Clone)]
pub struct PublicationDecision {
    pub entitlement: Entitlement,
    pub fraud: Option<FraudReason>,
    pub content_hash: Option<String>,
    pub now: OffsetDateTime,
}

/// Persistence seam for one listing type.
#[async_trait]
pub trait ListingPersistence: Send + Sync {
    type Draft: ListingDraft + Send + Sync;
    type Listing: Send;

    fn kind(&self) -> PublicationType;

    /// Whether this owner already has a listing with this content hash
    /// created since `since`.
    async fn has_recent_duplicate(
        &self,
        owner: Uuid,
        content_hash: &str,
        since: OffsetDateTime,
    ) -> anyhow::Result<bool>;

    async fn insert(
        &self,
        owner: Uuid,
        draft: &Self::Draft,
        decision: &PublicationDecision,
    ) -> anyhow::Result<Self::Listing>;

    fn listing_id(listing: &Self::Listing) -> Uuid;
}

/// Borrowed view of the engine's collaborators and policies.
pub struct Engine<'a> {
    pub accounts: &'a dyn AccountStore,
    pub fingerprints: &'a dyn FingerprintStore,
    pub entitlement: &'a EntitlementPolicy,
    pub fraud: &'a FraudPolicy,
    pub admin: &'a AdminPolicy,
}

impl<'a> Engine<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            accounts: &*state.accounts,
            fingerprints: &*state.fingerprints,
            entitlement: &state.config.entitlement,
            fraud: &state.config.fraud,
            admin: &state.config.admin,
        }
    }
}

/// Outcome of one accepted submission. Fraud-flagged submissions land here
/// too: they are accepted into a draft state, never rejected.
#[derive(Debug)]
pub struct Submission<L> {
    pub listing: L,
    pub entitlement: Entitlement,
    pub fraud: Option<FraudReason>,
    pub restricted: bool,
    pub credit_charged: bool,
}

impl<L> Submission<L> {
    pub fn status(&self) -> &'static str {
        if self.entitlement.is_active {
            "ACTIVE"
        } else {
            "INACTIVE"
        }
    }

    pub fn message(&self) -> &'static str {
        if self.restricted {
            "Free benefits on this account are restricted after repeated abuse. Activation requires credits."
        } else if self.fraud.is_some() {
            "A duplicate publication was detected. This listing requires a security review before it goes live."
        } else if self.credit_charged {
            "Listing created. 1 credit was deducted from your account."
        } else if self.entitlement.is_active {
            "Listing published with a free activation window."
        } else {
            "Listing saved as a draft. You need credits to activate it."
        }
    }
}

/// Runs the submission pipeline: validate, hash, fraud, entitlement, charge,
/// persist, fingerprint, count — strictly in that order.
pub async fn submit<S: ListingPersistence>(
    engine: &Engine<'_>,
    store: &S,
    account_id: Uuid,
    draft: &S::Draft,
    meta: &RequestMeta,
) -> Result<Submission<S::Listing>, ApiError> {
    draft.validate().map_err(ApiError::Validation)?;

    let account = engine
        .accounts
        .find(account_id)
        .await?
        .ok_or(ApiError::AccountNotFound)?;

    let kind = store.kind();
    let now = OffsetDateTime::now_utc();
    let is_admin = account.is_admin || engine.admin.is_admin_email(&account.email);
    let lifetime = account.lifetime_count(kind);
    let content_hash = draft.content_hash();
    let coordinates = draft.coordinates();

    let fraud = if is_admin {
        None
    } else {
        let has_recent_duplicate = match &content_hash {
            Some(hash) => {
                store
                    .has_recent_duplicate(account_id, hash, now - engine.fraud.duplicate_window)
                    .await?
            }
            None => false,
        };
        let evaluator = FraudEvaluator {
            policy: engine.fraud,
            fingerprints: engine.fingerprints,
            accounts: engine.accounts,
        };
        evaluator
            .evaluate(
                now,
                &FraudSignals {
                    account_id,
                    publication_type: kind,
                    lifetime_count: lifetime,
                    coordinates,
                    device_hash: &meta.device_hash,
                    has_recent_duplicate,
                },
            )
            .await?
    };

    let restricted = !is_admin && account.fraud_strikes >= engine.fraud.restricted_strikes;
    let entitlement = entitlement::resolve(
        engine.entitlement,
        kind,
        now,
        &EntitlementInput {
            is_admin,
            is_fraudulent: fraud.is_some(),
            is_restricted: restricted,
            lifetime_count: lifetime,
            credits: account.credits,
        },
    );

    let mut credit_charged = false;
    if entitlement.charge_credit {
        let description = format!("Publication: {}", draft.describe());
        let details = json!({ "type": kind.as_str(), "action": "PUBLISH" });
        match engine
            .accounts
            .charge_credit(account_id, &description, details)
            .await?
        {
            ChargeOutcome::Charged { .. } => credit_charged = true,
            // Lost the race on the last credit. Abort with a specific error
            // instead of silently falling back to a draft: the client must
            // be able to tell "you chose draft" from "your payment failed".
            ChargeOutcome::InsufficientCredits => return Err(ApiError::InsufficientCredits),
        }
    }

    let decision = PublicationDecision {
        entitlement,
        fraud,
        content_hash: content_hash.clone(),
        now,
    };
    let listing = store.insert(account_id, draft, &decision).await?;
    let listing_id = S::listing_id(&listing);

    // The listing exists from here on. Failures below are recoverable
    // inconsistencies for offline reconciliation, not request failures:
    // "my ad was saved" is the dominant guarantee.
    if let Err(e) = engine
        .fingerprints
        .record(NewFingerprint {
            account_id,
            publication_type: kind,
            publication_id: Some(listing_id),
            device_hash: meta.device_hash.as_str().to_string(),
            ip_address: meta.ip_address.clone(),
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lon)| lon),
            content_hash,
            user_agent: meta.user_agent.clone(),
        })
        .await
    {
        warn!(%listing_id, error = %e, "fingerprint not recorded, listing kept");
    }

    if fraud.is_none() {
        // A flagged attempt does not consume a "life": a legitimate future
        // attempt must not be penalized for abuse of this identity.
        if let Err(e) = engine.accounts.increment_lifetime(account_id, kind).await {
            warn!(%listing_id, error = %e, "lifetime counter not incremented, listing kept");
        }
    }

    Ok(Submission {
        listing,
        entitlement,
        fraud,
        restricted,
        credit_charged,
    })
}
