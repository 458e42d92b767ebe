use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::FieldError;
use crate::publication::hash::{vehicle_content_hash, VehicleIdentity};
use crate::publication::orchestrator::ListingDraft;

/// Vehicle submission body. Required fields are `Option` here so validation
/// can report every missing field at once instead of failing on the first.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<f64>,
    pub city: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub fuel: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub mileage: Option<i32>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Raw fingerprint payload: a string, `{ "visitorId": … }`, or absent.
    #[serde(default)]
    pub device_fingerprint: Option<serde_json::Value>,
}

impl ListingDraft for CreateVehicleRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("brand", &self.brand),
            ("model", &self.model),
            ("city", &self.city),
        ] {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                errors.push(FieldError::required(field));
            }
        }
        match self.year {
            None => errors.push(FieldError::required("year")),
            Some(y) if y < 1900 => errors.push(FieldError {
                field: "year",
                message: "must be 1900 or later",
            }),
            _ => {}
        }
        match self.price {
            None => errors.push(FieldError::required("price")),
            Some(p) if p < 0.0 => errors.push(FieldError {
                field: "price",
                message: "must not be negative",
            }),
            _ => {}
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn content_hash(&self) -> Option<String> {
        Some(vehicle_content_hash(&VehicleIdentity {
            brand: self.brand.as_deref().unwrap_or(""),
            model: self.model.as_deref().unwrap_or(""),
            year: self.year.unwrap_or(0),
            color: self.color.as_deref(),
            vehicle_type: self.vehicle_type.as_deref(),
            transmission: self.transmission.as_deref(),
            engine: self.engine.as_deref(),
        }))
    }

    fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} {} {}",
            self.brand.as_deref().unwrap_or(""),
            self.model.as_deref().unwrap_or(""),
            self.year.unwrap_or(0),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct VehicleSubmitted {
    pub id: Uuid,
    pub title: String,
    pub status: &'static str,
    pub message: &'static str,
    pub is_free_publication: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct VehicleListItem {
    pub id: Uuid,
    pub title: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
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

    pub(crate) fn valid_request() -> CreateVehicleRequest {
        CreateVehicleRequest {
            title: Some("Clean Corolla".into()),
            description: Some("One owner, dealer serviced".into()),
            brand: Some("Toyota".into()),
            model: Some("Corolla".into()),
            year: Some(2019),
            price: Some(185_000.0),
            city: Some("Guadalajara".into()),
            currency: None,
            latitude: Some(20.6597),
            longitude: Some(-103.3496),
            color: Some("Red".into()),
            vehicle_type: None,
            transmission: None,
            fuel: None,
            engine: None,
            mileage: None,
            images: vec![],
            device_fingerprint: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let req = CreateVehicleRequest {
            title: None,
            brand: Some("  ".into()),
            ..valid_request()
        };
        let errors = req.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"brand"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn numeric_ranges_are_checked() {
        let req = CreateVehicleRequest {
            year: Some(1850),
            price: Some(-1.0),
            ..valid_request()
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn reworded_title_keeps_the_same_content_hash() {
        let a = valid_request();
        let b = CreateVehicleRequest {
            title: Some("PRICE DROP!! Toyota Corolla".into()),
            price: Some(179_000.0),
            ..valid_request()
        };
        assert_eq!(a.content_hash(), b.content_hash());
    }
}
