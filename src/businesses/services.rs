use serde_json::json;
use tracing::warn;

use crate::publication::PublicationType;
use crate::state::AppState;

use super::repo::{Business, PgBusinesses};

/// Post-save effects for businesses, mirroring the vehicle side: country
/// enrichment, security review, announcement. All detached from the request.
pub fn spawn_post_publish(state: &AppState, business: &Business) {
    {
        let st = state.clone();
        let id = business.id;
        let (lat, lon) = (business.latitude, business.longitude);
        tokio::spawn(async move {
            let country = match st.geocoder.country_code(lat, lon).await {
                Ok(Some(country)) => country,
                Ok(None) => st.config.admin.default_country.clone(),
                Err(e) => {
                    warn!(business_id = %id, error = %e, "reverse geocoding failed");
                    st.config.admin.default_country.clone()
                }
            };
            if let Err(e) = PgBusinesses::new(st.db.clone()).set_country(id, &country).await {
                warn!(business_id = %id, error = %e, "country update failed");
            }
        });
    }

    {
        let st = state.clone();
        let id = business.id;
        let images = business.images.clone();
        tokio::spawn(async move {
            if let Err(e) = st.moderation.review(PublicationType::Business, id, &images).await {
                warn!(business_id = %id, error = %e, "moderation hand-off failed");
            }
        });
    }

    if business.is_active {
        state.events.publish(
            "business.published",
            json!({
                "id": business.id,
                "name": business.name,
                "category": business.category,
                "city": business.city,
            }),
        );
    }
}
