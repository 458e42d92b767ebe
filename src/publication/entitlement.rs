use time::OffsetDateTime;

use crate::config::EntitlementPolicy;

use super::PublicationType;

/// Everything the resolver needs to know about the submitting account.
#[derive(Debug, Clone, Copy)]
pub struct EntitlementInput {
    pub is_admin: bool,
    pub is_fraudulent: bool,
    pub is_restricted: bool,
    /// Lifetime publication count for this listing type, deletions included.
    pub lifetime_count: i64,
    pub credits: i64,
}

/// The resolved monetization tier for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entitlement {
    pub is_active: bool,
    pub expires_at: Option<OffsetDateTime>,
    pub is_free_publication: bool,
    pub charge_credit: bool,
}

/// Ordered decision table over the account's history and flags; the first
/// matching branch wins.
///
/// Admins publish free for years. Fraud and restriction park the listing in
/// a draft state without charging. The very first publication gets a long
/// free window, early follow-ups a short one, and after the free ceiling the
/// account either spends a credit or stays inactive.
pub fn resolve(
    policy: &EntitlementPolicy,
    kind: PublicationType,
    now: OffsetDateTime,
    input: &EntitlementInput,
) -> Entitlement {
    let tier = policy.tier(kind);

    if input.is_admin {
        return Entitlement {
            is_active: true,
            expires_at: Some(now + policy.admin_window),
            is_free_publication: true,
            charge_credit: false,
        };
    }
    if input.is_fraudulent {
        return Entitlement {
            is_active: false,
            expires_at: None,
            is_free_publication: false,
            charge_credit: false,
        };
    }
    if input.is_restricted {
        return Entitlement {
            is_active: false,
            expires_at: Some(now + policy.restricted_grace),
            is_free_publication: false,
            charge_credit: false,
        };
    }
    if input.lifetime_count == 0 {
        return Entitlement {
            is_active: true,
            expires_at: Some(now + tier.first_window),
            is_free_publication: true,
            charge_credit: false,
        };
    }
    if input.lifetime_count < tier.secondary_free_ceiling {
        return Entitlement {
            is_active: true,
            expires_at: Some(now + tier.secondary_window),
            is_free_publication: true,
            charge_credit: false,
        };
    }
    if input.credits >= 1 {
        return Entitlement {
            is_active: true,
            expires_at: Some(now + tier.paid_window),
            is_free_publication: false,
            charge_credit: true,
        };
    }
    Entitlement {
        is_active: false,
        expires_at: None,
        is_free_publication: false,
        charge_credit: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use time::Duration;

    fn input() -> EntitlementInput {
        EntitlementInput {
            is_admin: false,
            is_fraudulent: false,
            is_restricted: false,
            lifetime_count: 0,
            credits: 0,
        }
    }

    fn resolve_vehicle(input: &EntitlementInput) -> (Entitlement, OffsetDateTime) {
        let cfg = config::test_config();
        let now = OffsetDateTime::now_utc();
        (
            resolve(&cfg.entitlement, PublicationType::Vehicle, now, input),
            now,
        )
    }

    #[test]
    fn first_vehicle_gets_six_months_free_regardless_of_credits() {
        for credits in [0, 5] {
            let (e, now) = resolve_vehicle(&EntitlementInput { credits, ..input() });
            assert!(e.is_active);
            assert!(e.is_free_publication);
            assert!(!e.charge_credit);
            assert_eq!(e.expires_at, Some(now + Duration::days(180)));
        }
    }

    #[test]
    fn early_vehicles_get_seven_days_free() {
        for count in [1, 24] {
            let (e, now) = resolve_vehicle(&EntitlementInput {
                lifetime_count: count,
                ..input()
            });
            assert!(e.is_active);
            assert!(e.is_free_publication);
            assert_eq!(e.expires_at, Some(now + Duration::days(7)));
        }
    }

    #[test]
    fn past_ceiling_with_credit_charges_for_a_month() {
        let (e, now) = resolve_vehicle(&EntitlementInput {
            lifetime_count: 25,
            credits: 1,
            ..input()
        });
        assert!(e.is_active);
        assert!(!e.is_free_publication);
        assert!(e.charge_credit);
        assert_eq!(e.expires_at, Some(now + Duration::days(30)));
    }

    #[test]
    fn past_ceiling_without_credit_is_blocked() {
        let (e, _) = resolve_vehicle(&EntitlementInput {
            lifetime_count: 40,
            credits: 0,
            ..input()
        });
        assert!(!e.is_active);
        assert!(!e.charge_credit);
        assert_eq!(e.expires_at, None);
    }

    #[test]
    fn admin_wins_over_everything() {
        let (e, now) = resolve_vehicle(&EntitlementInput {
            is_admin: true,
            is_fraudulent: true,
            is_restricted: true,
            lifetime_count: 99,
            ..input()
        });
        assert!(e.is_active);
        assert!(e.is_free_publication);
        assert!(!e.charge_credit);
        assert_eq!(e.expires_at, Some(now + Duration::days(3650)));
    }

    #[test]
    fn fraud_parks_the_listing_unpaid() {
        let (e, _) = resolve_vehicle(&EntitlementInput {
            is_fraudulent: true,
            lifetime_count: 3,
            credits: 9,
            ..input()
        });
        assert!(!e.is_active);
        assert!(!e.is_free_publication);
        assert!(!e.charge_credit);
        assert_eq!(e.expires_at, None);
    }

    #[test]
    fn restricted_account_gets_inactive_grace_window() {
        let (e, now) = resolve_vehicle(&EntitlementInput {
            is_restricted: true,
            lifetime_count: 3,
            credits: 9,
            ..input()
        });
        assert!(!e.is_active);
        assert_eq!(e.expires_at, Some(now + Duration::days(30)));
    }

    #[test]
    fn second_business_has_no_free_window() {
        let cfg = config::test_config();
        let now = OffsetDateTime::now_utc();
        let e = resolve(
            &cfg.entitlement,
            PublicationType::Business,
            now,
            &EntitlementInput {
                lifetime_count: 1,
                credits: 1,
                ..input()
            },
        );
        assert!(e.is_active);
        assert!(e.charge_credit);
        assert!(!e.is_free_publication);

        let first = resolve(
            &cfg.entitlement,
            PublicationType::Business,
            now,
            &EntitlementInput {
                lifetime_count: 0,
                ..input()
            },
        );
        assert!(first.is_free_publication);
        assert_eq!(first.expires_at, Some(now + Duration::days(90)));
    }
}
