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

use super::dto::{CreateVehicleRequest, VehicleListItem, VehicleSubmitted};
use super::repo::PgVehicles;
use super::services;

pub fn router() -> Router<AppState> {
    Router::new().route("/vehicles", post(create_vehicle).get(list_vehicles))
}

#[instrument(skip(state, headers, body))]
async fn create_vehicle(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    headers: HeaderMap,
    Json(body): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<VehicleSubmitted>), ApiError> {
    let meta = RequestMeta::from_request(&headers, body.device_fingerprint.as_ref());
    let store = PgVehicles::new(state.db.clone());
    let engine = Engine::new(&state);

    let submission = orchestrator::submit(&engine, &store, account_id, &body, &meta).await?;
    services::spawn_post_publish(&state, &submission.listing);

    let response = VehicleSubmitted {
        id: submission.listing.id,
        title: submission.listing.title.clone(),
        status: submission.status(),
        message: submission.message(),
        is_free_publication: submission.entitlement.is_free_publication,
        expires_at: submission.entitlement.expires_at,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state))]
async fn list_vehicles(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
) -> Result<Json<Vec<VehicleListItem>>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let vehicles = PgVehicles::new(state.db.clone())
        .list_by_owner(account_id)
        .await?;
    let items = vehicles
        .into_iter()
        .map(|v| VehicleListItem {
            id: v.id,
            status: v.effective_status(now),
            title: v.title,
            brand: v.brand,
            model: v.model,
            year: v.year,
            price: v.price,
            city: v.city,
            expires_at: v.expires_at,
            created_at: v.created_at,
        })
        .collect();
    Ok(Json(items))
}
