use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use crate::auth::AuthAccount;
use crate::error::ApiError;
use crate::publication::orchestrator::{self, Engine};
use crate::publication::RequestMeta;
use crate::state::AppState;

use super::dto::{BusinessListItem, BusinessSubmitted, CreateBusinessRequest};
use super::repo::PgBusinesses;
use super::services;

pub fn router() -> Router<AppState> {
    Router::new().route("/businesses", post(create_business).get(list_businesses))
}

#[instrument(skip(state, headers, body))]
async fn create_business(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    headers: HeaderMap,
    Json(body): Json<CreateBusinessRequest>,
) -> Result<(StatusCode, Json<BusinessSubmitted>), ApiError> {
    let meta = RequestMeta::from_request(&headers, body.device_fingerprint.as_ref());
    let store = PgBusinesses::new(state.db.clone());
    let engine = Engine::new(&state);

    let submission = orchestrator::submit(&engine, &store, account_id, &body, &meta).await?;
    services::spawn_post_publish(&state, &submission.listing);

    let response = BusinessSubmitted {
        id: submission.listing.id,
        name: submission.listing.name.clone(),
        status: submission.status(),
        message: submission.message(),
        is_free_publication: submission.entitlement.is_free_publication,
        credit_charged: submission.credit_charged,
        expires_at: submission.entitlement.expires_at,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state))]
async fn list_businesses(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
) -> Result<Json<Vec<BusinessListItem>>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let businesses = PgBusinesses::new(state.db.clone())
        .list_by_owner(account_id)
        .await?;
    let items = businesses
        .into_iter()
        .map(|b| BusinessListItem {
            id: b.id,
            status: b.effective_status(now),
            name: b.name,
            category: b.category,
            city: b.city,
            expires_at: b.expires_at,
            created_at: b.created_at,
        })
        .collect();
    Ok(Json(items))
}
