use serde_json::json;
use tracing::warn;

use crate::publication::PublicationType;
use crate::state::AppState;

use super::repo::{PgVehicles, Vehicle};

/// Fire-and-forget effects after a vehicle is saved: reverse-geocode the
/// country, queue the security review, announce the listing. None of these
/// may delay or fail the submission response.
pub fn spawn_post_publish(state: &AppState, vehicle: &Vehicle) {
    if let (Some(lat), Some(lon)) = (vehicle.latitude, vehicle.longitude) {
        let st = state.clone();
        let id = vehicle.id;
        tokio::spawn(async move {
            let country = match st.geocoder.country_code(lat, lon).await {
                Ok(Some(country)) => country,
                Ok(None) => st.config.admin.default_country.clone(),
                Err(e) => {
                    warn!(vehicle_id = %id, error = %e, "reverse geocoding failed");
                    st.config.admin.default_country.clone()
                }
            };
            if let Err(e) = PgVehicles::new(st.db.clone()).set_country(id, &country).await {
                warn!(vehicle_id = %id, error = %e, "country update failed");
            }
        });
    }

    {
        let st = state.clone();
        let id = vehicle.id;
        let images = vehicle.images.clone();
        tokio::spawn(async move {
            if let Err(e) = st.moderation.review(PublicationType::Vehicle, id, &images).await {
                warn!(vehicle_id = %id, error = %e, "moderation hand-off failed");
            }
        });
    }

    if vehicle.is_active {
        state.events.publish(
            "vehicle.published",
            json!({
                "id": vehicle.id,
                "brand": vehicle.brand,
                "model": vehicle.model,
                "year": vehicle.year,
                "price": vehicle.price,
                "city": vehicle.city,
            }),
        );
    }
}
