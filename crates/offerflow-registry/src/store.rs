//! In-memory offer store
//!
//! Keyed by `MatchId`. The write lock covers every read-modify-write, so
//! unique-key checks and the processed-flag transition are atomic with the
//! mutation they guard.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use offerflow_types::{DepositOffer, MatchId, MatchOffer, OfferFlowError, Result};

/// Thread-safe store for offer definitions
#[derive(Clone)]
pub struct OfferStore {
    match_offers: Arc<RwLock<HashMap<MatchId, MatchOffer>>>,
    deposit_offers: Arc<RwLock<Vec<DepositOffer>>>,
}

impl OfferStore {
    pub fn new() -> Self {
        Self {
            match_offers: Arc::new(RwLock::new(HashMap::new())),
            deposit_offers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Insert a match offer, enforcing unique `match_id` and `offer_name`
    pub async fn insert_match_offer(&self, offer: MatchOffer) -> Result<()> {
        let mut offers = self.match_offers.write().await;
        if offers.contains_key(&offer.match_id) {
            return Err(OfferFlowError::DuplicateOffer {
                field: "match_id".to_string(),
                value: offer.match_id.to_string(),
            });
        }
        if offers.values().any(|o| o.offer_name == offer.offer_name) {
            return Err(OfferFlowError::DuplicateOffer {
                field: "offer_name".to_string(),
                value: offer.offer_name.clone(),
            });
        }
        offers.insert(offer.match_id.clone(), offer);
        Ok(())
    }

    /// The active offer for a match, if any
    pub async fn find_active(&self, match_id: &MatchId) -> Option<MatchOffer> {
        let offers = self.match_offers.read().await;
        offers.get(match_id).filter(|o| o.is_active).cloned()
    }

    /// The offer for a match if it has not been settled yet
    pub async fn find_unprocessed(&self, match_id: &MatchId) -> Option<MatchOffer> {
        let offers = self.match_offers.read().await;
        offers.get(match_id).filter(|o| !o.is_processed).cloned()
    }

    /// All active offers with `is_processed = false`
    pub async fn list_unprocessed(&self) -> Vec<MatchOffer> {
        let offers = self.match_offers.read().await;
        offers
            .values()
            .filter(|o| o.is_active && !o.is_processed)
            .cloned()
            .collect()
    }

    /// All active offers, settled or not (backfill input)
    pub async fn list_active(&self) -> Vec<MatchOffer> {
        let offers = self.match_offers.read().await;
        offers.values().filter(|o| o.is_active).cloned().collect()
    }

    /// Conditional transition of `is_processed`: set true only if currently
    /// false. Returns whether the flag flipped. Errors if the offer is
    /// missing entirely.
    pub async fn mark_processed(&self, match_id: &MatchId) -> Result<bool> {
        let mut offers = self.match_offers.write().await;
        let offer = offers
            .get_mut(match_id)
            .ok_or_else(|| OfferFlowError::OfferNotFound {
                match_id: match_id.to_string(),
            })?;

        if offer.is_processed {
            return Ok(false);
        }
        offer.is_processed = true;
        offer.updated_at = Utc::now();
        info!(match_id = %match_id, "offer marked processed");
        Ok(true)
    }

    /// Insert a deposit offer, enforcing unique `offer_name`
    pub async fn insert_deposit_offer(&self, offer: DepositOffer) -> Result<()> {
        let mut offers = self.deposit_offers.write().await;
        if offers.iter().any(|o| o.offer_name == offer.offer_name) {
            return Err(OfferFlowError::DuplicateOffer {
                field: "offer_name".to_string(),
                value: offer.offer_name.clone(),
            });
        }
        offers.push(offer);
        Ok(())
    }

    /// Deposit offers live at the given instant
    pub async fn active_deposit_offers(&self, now: DateTime<Utc>) -> Vec<DepositOffer> {
        let offers = self.deposit_offers.read().await;
        offers.iter().filter(|o| o.is_live_at(now)).cloned().collect()
    }
}

impl Default for OfferStore {
    fn default() -> Self {
        Self::new()
    }
}
