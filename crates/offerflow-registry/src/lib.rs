//! OfferFlow Registry - Offer definition storage and validation
//!
//! The registry owns `MatchOffer` and `DepositOffer` records. Creation goes
//! through validation (thresholds, percentages, unique keys); the only
//! post-creation mutation of a match offer is the `is_processed` flag, which
//! the store flips with a conditional transition so a settlement pass marks
//! an offer processed at most once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use offerflow_types::{
    DepositOffer, DepositOfferDraft, MatchOffer, MatchOfferDraft, OfferFlowError, Result,
};

pub mod store;

pub use store::OfferStore;

/// Validating front door for offer creation and scheduler queries
#[derive(Clone)]
pub struct OfferRegistry {
    store: Arc<OfferStore>,
}

impl OfferRegistry {
    pub fn new(store: Arc<OfferStore>) -> Self {
        Self { store }
    }

    /// Access the underlying store (shared with the settlement engine)
    pub fn store(&self) -> Arc<OfferStore> {
        Arc::clone(&self.store)
    }

    /// Validate and persist a new match offer
    pub async fn create_match_offer(&self, draft: MatchOfferDraft) -> Result<MatchOffer> {
        if draft.match_id.as_str().is_empty() {
            return Err(OfferFlowError::invalid_input("match_id", "must not be empty"));
        }
        if draft.offer_name.is_empty() {
            return Err(OfferFlowError::invalid_input("offer_name", "must not be empty"));
        }
        if draft.match_name.is_empty() {
            return Err(OfferFlowError::invalid_input("match_name", "must not be empty"));
        }
        if draft.required_contests == 0 {
            return Err(OfferFlowError::invalid_input(
                "required_contests",
                "must be greater than zero",
            ));
        }
        if !draft.conversion_percentage.is_finite()
            || !(0.0..=100.0).contains(&draft.conversion_percentage)
        {
            return Err(OfferFlowError::invalid_input(
                "conversion_percentage",
                "must be between 0 and 100",
            ));
        }

        let offer = MatchOffer::from_draft(draft);
        self.store.insert_match_offer(offer.clone()).await?;
        info!(
            match_id = %offer.match_id,
            offer_name = %offer.offer_name,
            required_contests = offer.required_contests,
            "match offer created"
        );
        Ok(offer)
    }

    /// Active offers not yet settled, for an external scheduler to pick up
    pub async fn list_unprocessed(&self) -> Vec<MatchOffer> {
        self.store.list_unprocessed().await
    }

    /// Validate and persist a new deposit offer
    pub async fn create_deposit_offer(&self, draft: DepositOfferDraft) -> Result<DepositOffer> {
        if draft.offer_name.is_empty() {
            return Err(OfferFlowError::invalid_input("offer_name", "must not be empty"));
        }
        if draft.start_date >= draft.end_date {
            return Err(OfferFlowError::invalid_input(
                "end_date",
                "must be after start_date",
            ));
        }
        if draft.tiers.is_empty() {
            return Err(OfferFlowError::invalid_input("tiers", "must not be empty"));
        }
        for tier in &draft.tiers {
            if tier.min_deposit < 0.0 {
                return Err(OfferFlowError::invalid_input(
                    "tiers.min_deposit",
                    "must not be negative",
                ));
            }
            if !(0.0..=100.0).contains(&tier.bonus_percentage) {
                return Err(OfferFlowError::invalid_input(
                    "tiers.bonus_percentage",
                    "must be between 0 and 100",
                ));
            }
        }
        if let Some(cap) = draft.max_bonus_amount {
            if cap < 0.0 {
                return Err(OfferFlowError::invalid_input(
                    "max_bonus_amount",
                    "must not be negative",
                ));
            }
        }

        let offer = DepositOffer::from_draft(draft);
        self.store.insert_deposit_offer(offer.clone()).await?;
        info!(offer_name = %offer.offer_name, "deposit offer created");
        Ok(offer)
    }

    /// Deposit offers whose window contains `now`, polled by the wallet service
    pub async fn active_deposit_offers(&self, now: DateTime<Utc>) -> Vec<DepositOffer> {
        self.store.active_deposit_offers(now).await
    }
}
