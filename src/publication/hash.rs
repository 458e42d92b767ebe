use sha2::{Digest, Sha256};

/// The attribute subset that identifies a physical vehicle. Title wording,
/// price and photos are deliberately excluded so a reworded repost of the
/// same car still hashes identically.
#[derive(Debug, Clone)]
pub struct VehicleIdentity<'a> {
    pub brand: &'a str,
    pub model: &'a str,
    pub year: i32,
    pub color: Option<&'a str>,
    pub vehicle_type: Option<&'a str>,
    pub transmission: Option<&'a str>,
    pub engine: Option<&'a str>,
}

/// Stable similarity hash over the vehicle's identifying attributes.
/// Case and whitespace are stripped first so trivial edits don't evade it.
pub fn vehicle_content_hash(v: &VehicleIdentity<'_>) -> String {
    let year = v.year.to_string();
    let parts = [
        v.brand,
        v.model,
        &year,
        v.color.unwrap_or(""),
        v.vehicle_type.unwrap_or(""),
        v.transmission.unwrap_or(""),
        v.engine.unwrap_or(""),
    ];
    let joined = parts.map(normalize).join("|");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hex::encode(hasher.finalize())
}

/// Similarity hash for a business: normalized name plus its coordinates
/// snapped to a roughly 100 m grid. A re-listed shop with the same name on
/// the same corner hashes identically even when the description changes.
pub fn business_content_hash(name: &str, latitude: f64, longitude: f64) -> String {
    let joined = format!("{}|{latitude:.3}|{longitude:.3}", normalize(name));

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hex::encode(hasher.finalize())
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
