use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::FieldError;
use crate::publication::hash::business_content_hash;
use crate::publication::orchestrator::ListingDraft;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusinessRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub device_fingerprint: Option<serde_json::Value>,
}

impl ListingDraft for CreateBusinessRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("name", &self.name),
            ("category", &self.category),
            ("address", &self.address),
            ("city", &self.city),
        ] {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                errors.push(FieldError::required(field));
            }
        }
        if self.latitude.is_none() {
            errors.push(FieldError::required("latitude"));
        }
        if self.longitude.is_none() {
            errors.push(FieldError::required("longitude"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    // Businesses are deduplicated by name and spot rather than attributes:
    // the same shop re-listed on the same corner hashes the same.
    fn content_hash(&self) -> Option<String> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(business_content_hash(
                self.name.as_deref().unwrap_or(""),
                lat,
                lon,
            )),
            _ => None,
        }
    }

    fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        self.name.as_deref().unwrap_or("").to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct BusinessSubmitted {
    pub id: Uuid,
    pub name: String,
    pub status: &'static str,
    pub message: &'static str,
    pub is_free_publication: bool,
    pub credit_charged: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct BusinessListItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub city: String,
    pub status: &'static str,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateBusinessRequest {
        CreateBusinessRequest {
            name: Some("Taller El Rayo".into()),
            category: Some("auto-repair".into()),
            address: Some("Av. Vallarta 1234".into()),
            city: Some("Guadalajara".into()),
            latitude: Some(20.6736),
            longitude: Some(-103.3925),
            description: None,
            state: None,
            phone: None,
            whatsapp: None,
            website: None,
            hours: None,
            images: vec![],
            services: vec![],
            device_fingerprint: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn content_hash_keys_on_name_and_spot() {
        let a = valid_request();
        let renamed_description = CreateBusinessRequest {
            description: Some("Now with free estimates".into()),
            ..valid_request()
        };
        assert_eq!(a.content_hash(), renamed_description.content_hash());
        assert!(a.content_hash().is_some());

        let moved = CreateBusinessRequest {
            latitude: Some(20.7400),
            ..valid_request()
        };
        assert_ne!(a.content_hash(), moved.content_hash());
    }

    #[test]
    fn missing_coordinates_are_reported() {
        let req = CreateBusinessRequest {
            latitude: None,
            longitude: None,
            ..valid_request()
        };
        let errors = req.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["latitude", "longitude"]);
    }
}
