use std::collections::HashSet;

use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::accounts::AccountStore;
use crate::config::FraudPolicy;
use crate::fingerprint::{DeviceHash, FingerprintRecord, FingerprintStore};

use super::PublicationType;

/// Why a submission was flagged. Ordering matters: rules are checked in this
/// order and the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraudReason {
    /// Same device, different account, while claiming first-ever benefits.
    DeviceReuse,
    /// Several distinct accounts publishing from the same spot and device.
    LocationClustering,
    /// The same account republished the same physical item inside the window.
    DuplicateContent,
}

impl FraudReason {
    pub fn message(self) -> &'static str {
        match self {
            FraudReason::DeviceReuse => "multi-account device reuse",
            FraudReason::LocationClustering => "location clustering",
            FraudReason::DuplicateContent => "duplicate content republished",
        }
    }

    /// Multi-account deception is penalized harder than simple content
    /// reuse; both multipliers are policy, not algorithm.
    pub fn strike_penalty(self, policy: &FraudPolicy) -> i32 {
        match self {
            FraudReason::DeviceReuse | FraudReason::LocationClustering => {
                policy.device_strike_penalty
            }
            FraudReason::DuplicateContent => policy.content_strike_penalty,
        }
    }
}

/// The signals one submission brings to the fraud rules.
#[derive(Debug, Clone)]
pub struct FraudSignals<'a> {
    pub account_id: Uuid,
    pub publication_type: PublicationType,
    /// Lifetime count for this type; 0 means the account is claiming
    /// first-ever benefits.
    pub lifetime_count: i64,
    /// Submission coordinates, if the client sent any. A missing GPS fix is
    /// not a location: the clustering rule is skipped when this is `None`.
    pub coordinates: Option<(f64, f64)>,
    pub device_hash: &'a DeviceHash,
    /// Whether this account already published this content hash recently.
    /// Fetched by the caller from the listing store.
    pub has_recent_duplicate: bool,
}

/// Pure rule evaluation over already-fetched device history.
pub fn assess(
    policy: &FraudPolicy,
    now: OffsetDateTime,
    signals: &FraudSignals<'_>,
    device_history: &[FingerprintRecord],
) -> Option<FraudReason> {
    // An absent fingerprint is not a signal; device rules are skipped, the
    // content rule below still applies.
    if !signals.device_hash.is_unknown() {
        let foreign = device_history
            .iter()
            .any(|r| r.account_id != signals.account_id);
        if foreign && signals.lifetime_count == 0 {
            return Some(FraudReason::DeviceReuse);
        }

        if let Some((lat, lon)) = signals.coordinates {
            let cluster_since = now - policy.cluster_window;
            let nearby: HashSet<Uuid> = device_history
                .iter()
                .filter(|r| r.created_at >= cluster_since)
                .filter(|r| match (r.latitude, r.longitude) {
                    (Some(r_lat), Some(r_lon)) => {
                        distance_meters(r_lat, r_lon, lat, lon) <= policy.cluster_radius_m
                    }
                    _ => false,
                })
                .map(|r| r.account_id)
                .collect();
            if nearby.len() >= policy.cluster_min_accounts {
                return Some(FraudReason::LocationClustering);
            }
        }
    }

    if signals.has_recent_duplicate && signals.lifetime_count > 0 {
        return Some(FraudReason::DuplicateContent);
    }

    None
}

/// Runs the rules against stored history and applies the strike penalty in
/// the same call path. The strike must land even if the rest of the
/// submission later fails: the fraud signal itself is real either way.
pub struct FraudEvaluator<'a> {
    pub policy: &'a FraudPolicy,
    pub fingerprints: &'a dyn FingerprintStore,
    pub accounts: &'a dyn AccountStore,
}

impl FraudEvaluator<'_> {
    pub async fn evaluate(
        &self,
        now: OffsetDateTime,
        signals: &FraudSignals<'_>,
    ) -> anyhow::Result<Option<FraudReason>> {
        let history = if signals.device_hash.is_unknown() {
            Vec::new()
        } else {
            self.fingerprints
                .device_history(signals.device_hash.as_str(), now - self.policy.device_lookback)
                .await?
        };

        let verdict = assess(self.policy, now, signals, &history);
        if let Some(reason) = verdict {
            warn!(
                account_id = %signals.account_id,
                kind = signals.publication_type.as_str(),
                reason = reason.message(),
                "fraud detected"
            );
            self.accounts
                .add_strikes(signals.account_id, reason.strike_penalty(self.policy))
                .await?;
        }
        Ok(verdict)
    }
}

/// Haversine great-circle distance in meters.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use serde_json::json;
    use time::Duration;

    const SPOT: (f64, f64) = (19.4326, -99.1332);

    fn record(account_id: Uuid, lat: f64, lon: f64, age_days: i64) -> FingerprintRecord {
        FingerprintRecord {
            account_id,
            publication_type: PublicationType::Vehicle,
            latitude: Some(lat),
            longitude: Some(lon),
            created_at: OffsetDateTime::now_utc() - Duration::days(age_days),
        }
    }

    fn unlocated_record(account_id: Uuid, age_days: i64) -> FingerprintRecord {
        FingerprintRecord {
            latitude: None,
            longitude: None,
            ..record(account_id, 0.0, 0.0, age_days)
        }
    }

    fn signals<'a>(device: &'a DeviceHash, lifetime_count: i64) -> FraudSignals<'a> {
        FraudSignals {
            account_id: Uuid::new_v4(),
            publication_type: PublicationType::Vehicle,
            lifetime_count,
            coordinates: Some(SPOT),
            device_hash: device,
            has_recent_duplicate: false,
        }
    }

    fn known_device() -> DeviceHash {
        DeviceHash::from_payload(Some(&json!("device-1")))
    }

    #[test]
    fn distance_between_known_points_is_sane() {
        // Zocalo to Bellas Artes, Mexico City: roughly 1.2 km.
        let d = distance_meters(19.4326, -99.1332, 19.4352, -99.1413);
        assert!(d > 800.0 && d < 1600.0, "got {d}");
        assert!(distance_meters(19.0, -99.0, 19.0, -99.0) < 1.0);
    }

    #[test]
    fn unknown_device_skips_device_rules() {
        let cfg = config::test_config();
        let device = DeviceHash::from_payload(None);
        let s = signals(&device, 0);
        let history = vec![record(Uuid::new_v4(), SPOT.0, SPOT.1, 1)];
        assert_eq!(assess(&cfg.fraud, OffsetDateTime::now_utc(), &s, &history), None);
    }

    #[test]
    fn unknown_device_still_catches_duplicate_content() {
        let cfg = config::test_config();
        let device = DeviceHash::from_payload(None);
        let mut s = signals(&device, 2);
        s.has_recent_duplicate = true;
        assert_eq!(
            assess(&cfg.fraud, OffsetDateTime::now_utc(), &s, &[]),
            Some(FraudReason::DuplicateContent)
        );
    }

    #[test]
    fn cross_account_reuse_only_flags_first_ever_claims() {
        let cfg = config::test_config();
        let device = known_device();
        let now = OffsetDateTime::now_utc();

        let s = signals(&device, 0);
        let history = vec![record(Uuid::new_v4(), 0.0, 0.0, 30)];
        assert_eq!(assess(&cfg.fraud, now, &s, &history), Some(FraudReason::DeviceReuse));

        // Same history, but the account has publications already: allowed.
        let veteran = signals(&device, 3);
        assert_eq!(assess(&cfg.fraud, now, &veteran, &history), None);
    }

    #[test]
    fn own_history_on_same_device_is_fine() {
        let cfg = config::test_config();
        let device = known_device();
        let s = signals(&device, 0);
        let history = vec![record(s.account_id, SPOT.0, SPOT.1, 10)];
        assert_eq!(assess(&cfg.fraud, OffsetDateTime::now_utc(), &s, &history), None);
    }

    #[test]
    fn location_cluster_needs_enough_distinct_accounts() {
        let cfg = config::test_config();
        let device = known_device();
        let s = signals(&device, 5);
        let now = OffsetDateTime::now_utc();

        // Two distinct accounts at the same spot: below the threshold of 3.
        let two = vec![
            record(Uuid::new_v4(), SPOT.0, SPOT.1, 1),
            record(Uuid::new_v4(), SPOT.0, SPOT.1, 2),
        ];
        assert_eq!(assess(&cfg.fraud, now, &s, &two), None);

        let mut three = two.clone();
        three.push(record(Uuid::new_v4(), SPOT.0, SPOT.1, 3));
        assert_eq!(
            assess(&cfg.fraud, now, &s, &three),
            Some(FraudReason::LocationClustering)
        );
    }

    #[test]
    fn far_away_or_stale_records_do_not_cluster() {
        let cfg = config::test_config();
        let device = known_device();
        let s = signals(&device, 5);
        let now = OffsetDateTime::now_utc();

        // Three accounts, but kilometers away.
        let far = vec![
            record(Uuid::new_v4(), SPOT.0 + 0.5, SPOT.1, 1),
            record(Uuid::new_v4(), SPOT.0 + 0.5, SPOT.1, 1),
            record(Uuid::new_v4(), SPOT.0 + 0.5, SPOT.1, 1),
        ];
        assert_eq!(assess(&cfg.fraud, now, &s, &far), None);

        // Three accounts at the spot, but outside the cluster window.
        let stale = vec![
            record(Uuid::new_v4(), SPOT.0, SPOT.1, 30),
            record(Uuid::new_v4(), SPOT.0, SPOT.1, 30),
            record(Uuid::new_v4(), SPOT.0, SPOT.1, 30),
        ];
        assert_eq!(assess(&cfg.fraud, now, &s, &stale), None);
    }

    #[test]
    fn submissions_without_coordinates_never_cluster() {
        let cfg = config::test_config();
        let device = known_device();
        let now = OffsetDateTime::now_utc();

        // Three distinct accounts on the same device, none with a GPS fix.
        // They must not be treated as co-located anywhere, least of all at
        // the (0,0) origin.
        let unlocated = vec![
            unlocated_record(Uuid::new_v4(), 1),
            unlocated_record(Uuid::new_v4(), 1),
            unlocated_record(Uuid::new_v4(), 2),
        ];

        let mut s = signals(&device, 5);
        s.coordinates = None;
        assert_eq!(assess(&cfg.fraud, now, &s, &unlocated), None);

        let located = signals(&device, 5);
        assert_eq!(assess(&cfg.fraud, now, &located, &unlocated), None);
    }

    #[test]
    fn duplicate_content_spares_the_first_publication() {
        let cfg = config::test_config();
        let device = known_device();
        let mut s = signals(&device, 0);
        s.has_recent_duplicate = true;
        assert_eq!(assess(&cfg.fraud, OffsetDateTime::now_utc(), &s, &[]), None);
    }

    #[test]
    fn penalties_follow_policy() {
        let cfg = config::test_config();
        assert_eq!(FraudReason::DeviceReuse.strike_penalty(&cfg.fraud), 2);
        assert_eq!(FraudReason::LocationClustering.strike_penalty(&cfg.fraud), 2);
        assert_eq!(FraudReason::DuplicateContent.strike_penalty(&cfg.fraud), 1);
    }
}
