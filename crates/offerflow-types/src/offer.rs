//! Offer records
//!
//! `MatchOffer` drives the settlement state machine. `DepositOffer` is an
//! ancillary tiered bonus definition polled by the wallet service; it takes
//! no part in settlement.

use crate::{MatchId, OfferId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A per-match join-threshold offer
///
/// `is_processed` is monotonic: it flips false -> true exactly once, at the
/// end of a settlement pass, and only the settlement engine mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOffer {
    pub id: OfferId,
    pub match_id: MatchId,
    pub match_name: String,
    pub offer_name: String,
    /// Numeric offer category tag, interpreted by the client apps
    pub offer_type: u32,
    /// Number of distinct contests a user must join to complete the offer
    pub required_contests: u32,
    /// Share of the signup bonus converted on completion, 0..=100
    pub conversion_percentage: f64,
    pub is_active: bool,
    pub is_processed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a [`MatchOffer`]; ids and timestamps are assigned by
/// the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOfferDraft {
    pub match_id: MatchId,
    pub match_name: String,
    pub offer_name: String,
    pub offer_type: u32,
    pub required_contests: u32,
    pub conversion_percentage: f64,
}

impl MatchOffer {
    /// Materialize a validated draft into a persistable record
    pub fn from_draft(draft: MatchOfferDraft) -> Self {
        let now = Utc::now();
        Self {
            id: OfferId::new(),
            match_id: draft.match_id,
            match_name: draft.match_name,
            offer_name: draft.offer_name,
            offer_type: draft.offer_type,
            required_contests: draft.required_contests,
            conversion_percentage: draft.conversion_percentage,
            is_active: true,
            is_processed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One bonus tier of a deposit offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusTier {
    pub min_deposit: f64,
    pub bonus_percentage: f64,
}

/// A time-windowed, tiered deposit bonus definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositOffer {
    pub id: OfferId,
    pub offer_name: String,
    pub offer_type: u32,
    pub description: String,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub tiers: Vec<BonusTier>,
    /// Cap on the bonus a single user can receive, if any
    pub max_bonus_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a [`DepositOffer`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositOfferDraft {
    pub offer_name: String,
    pub offer_type: u32,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub tiers: Vec<BonusTier>,
    pub max_bonus_amount: Option<f64>,
}

impl DepositOffer {
    pub fn from_draft(draft: DepositOfferDraft) -> Self {
        let now = Utc::now();
        Self {
            id: OfferId::new(),
            offer_name: draft.offer_name,
            offer_type: draft.offer_type,
            description: draft.description,
            is_active: true,
            start_date: draft.start_date,
            end_date: draft.end_date,
            tiers: draft.tiers,
            max_bonus_amount: draft.max_bonus_amount,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the offer window contains the given instant
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date <= now && now <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft() -> MatchOfferDraft {
        MatchOfferDraft {
            match_id: MatchId::new("M1"),
            match_name: "IND vs AUS".to_string(),
            offer_name: "Join 3 Win Big".to_string(),
            offer_type: 1,
            required_contests: 3,
            conversion_percentage: 10.0,
        }
    }

    #[test]
    fn new_match_offer_starts_active_and_unprocessed() {
        let offer = MatchOffer::from_draft(draft());
        assert!(offer.is_active);
        assert!(!offer.is_processed);
    }

    #[test]
    fn deposit_offer_window_check() {
        let now = Utc::now();
        let offer = DepositOffer::from_draft(DepositOfferDraft {
            offer_name: "Monsoon Mania".to_string(),
            offer_type: 2,
            description: "Tiered deposit bonus".to_string(),
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            tiers: vec![BonusTier { min_deposit: 5000.0, bonus_percentage: 3.0 }],
            max_bonus_amount: Some(1000.0),
        });
        assert!(offer.is_live_at(now));
        assert!(!offer.is_live_at(now + Duration::days(2)));
    }
}
