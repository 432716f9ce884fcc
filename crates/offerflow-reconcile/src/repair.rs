//! Status repair sweep
//!
//! Promotes InProgress rows that already meet their active offer's threshold,
//! recovering rows written before the offer existed or left behind by a
//! crashed tracking call. The promotion is re-checked under the row's write
//! lock, so a concurrent join or settlement pass cannot be clobbered.

use std::sync::Arc;

use tracing::info;

use offerflow_progress::ProgressStore;
use offerflow_registry::OfferStore;
use offerflow_types::{ProgressKey, ProgressStatus, Result};

pub struct StatusRepair {
    offers: Arc<OfferStore>,
    progress: Arc<ProgressStore>,
}

impl StatusRepair {
    pub fn new(offers: Arc<OfferStore>, progress: Arc<ProgressStore>) -> Self {
        Self { offers, progress }
    }

    /// Sweep all InProgress rows; returns how many were promoted to Completed
    pub async fn repair_statuses(&self) -> Result<usize> {
        let candidates = self.progress.list_in_progress().await;
        info!(count = candidates.len(), "checking in-progress rows");

        let mut fixed = 0;
        for row in candidates {
            let Some(offer) = self.offers.find_active(&row.match_id).await else {
                continue;
            };
            if row.contests_joined_count < offer.required_contests {
                continue;
            }

            let required = offer.required_contests;
            let key = ProgressKey::new(row.user_id.clone(), row.match_id.clone());
            let promoted = self
                .progress
                .modify(&key, |p| {
                    p.status == ProgressStatus::InProgress
                        && p.contests_joined_count >= required
                        && p.advance(ProgressStatus::Completed)
                })
                .await
                .unwrap_or(false);

            if promoted {
                info!(user_id = %row.user_id, match_id = %row.match_id, "status repaired to COMPLETED");
                fixed += 1;
            }
        }
        Ok(fixed)
    }
}
