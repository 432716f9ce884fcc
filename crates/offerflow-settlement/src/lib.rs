//! OfferFlow Settlement - Best-effort conversion of completed offers
//!
//! A settlement pass reads every Completed row for a match, converts each
//! user's signup bonus through the wallet ledger, and marks rows Processed.
//! Row failures are isolated: a wallet error for one user never aborts the
//! batch. After every row has been attempted the offer's `is_processed` flag
//! flips exactly once, regardless of how many rows failed.
//!
//! Rows left at Completed by a failed conversion are NOT retried by this
//! path; a re-trigger on a processed offer is a guarded no-op.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use offerflow_progress::ProgressStore;
use offerflow_registry::OfferStore;
use offerflow_types::{
    MatchId, MatchOffer, OfferFlowError, OfferProgress, ProgressKey, ProgressStatus, Result,
};
use offerflow_wallet::WalletLedger;

/// Outcome of a settlement trigger
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    /// No unprocessed offer exists for the match; nothing was done
    NothingToProcess,
    /// Another settlement pass for this match is already running
    AlreadySettling,
    /// A pass ran to completion and the offer is now processed
    Settled(SettlementReport),
}

/// What one settlement pass did
#[derive(Debug, Clone)]
pub struct SettlementReport {
    pub match_id: MatchId,
    /// Rows that reached Processed
    pub processed: usize,
    /// Rows left at Completed after a per-row failure
    pub failed: usize,
    /// Subset of processed rows where no conversion was needed (balance <= 0
    /// or a zero conversion amount)
    pub skipped_conversions: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Conversion amount for a bonus balance: a percentage share, clamped to the
/// balance itself
pub fn conversion_amount(balance: f64, percentage: f64) -> f64 {
    ((balance * percentage) / 100.0).min(balance)
}

/// Drives completed progress rows through bonus conversion
#[derive(Clone)]
pub struct SettlementEngine {
    offers: Arc<OfferStore>,
    progress: Arc<ProgressStore>,
    wallet: Arc<dyn WalletLedger>,
    /// Matches with a pass currently in flight (single-flight guard)
    settling: Arc<Mutex<HashSet<MatchId>>>,
}

impl SettlementEngine {
    pub fn new(
        offers: Arc<OfferStore>,
        progress: Arc<ProgressStore>,
        wallet: Arc<dyn WalletLedger>,
    ) -> Self {
        Self {
            offers,
            progress,
            wallet,
            settling: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Run one settlement pass for a match
    ///
    /// Idempotent: once an offer is processed, later triggers report
    /// `NothingToProcess`. Two concurrent triggers for the same match cannot
    /// both proceed; the loser reports `AlreadySettling`.
    pub async fn settle_match(&self, match_id: &MatchId) -> Result<SettlementOutcome> {
        {
            let mut settling = self.settling.lock().await;
            if !settling.insert(match_id.clone()) {
                warn!(match_id = %match_id, "settlement already in flight, trigger ignored");
                return Ok(SettlementOutcome::AlreadySettling);
            }
        }

        let result = self.settle_inner(match_id).await;
        self.settling.lock().await.remove(match_id);
        result
    }

    async fn settle_inner(&self, match_id: &MatchId) -> Result<SettlementOutcome> {
        let Some(offer) = self.offers.find_unprocessed(match_id).await else {
            info!(match_id = %match_id, "no unprocessed offer for match, nothing to process");
            return Ok(SettlementOutcome::NothingToProcess);
        };

        let started_at = Utc::now();
        let completed = self
            .progress
            .list_with_status(match_id, ProgressStatus::Completed)
            .await;

        let mut processed = 0;
        let mut failed = 0;
        let mut skipped_conversions = 0;

        for row in &completed {
            match self.settle_row(&offer, row).await {
                Ok(converted) => {
                    processed += 1;
                    if !converted {
                        skipped_conversions += 1;
                    }
                }
                Err(e) => {
                    // Row stays Completed; the batch moves on.
                    warn!(
                        user_id = %row.user_id,
                        match_id = %match_id,
                        error = %e,
                        "settlement failed for user, skipping"
                    );
                    failed += 1;
                }
            }
        }

        // Flips at most once; failed rows do not block it.
        self.offers.mark_processed(match_id).await?;

        let report = SettlementReport {
            match_id: match_id.clone(),
            processed,
            failed,
            skipped_conversions,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            match_id = %match_id,
            processed = report.processed,
            failed = report.failed,
            "settlement pass finished"
        );
        Ok(SettlementOutcome::Settled(report))
    }

    /// Settle one row: convert if there is a positive balance, then advance
    /// the row to Processed. Returns whether a conversion was performed.
    async fn settle_row(&self, offer: &MatchOffer, row: &OfferProgress) -> Result<bool> {
        let details = self.wallet.bonus_balance(&row.user_id).await?;
        let balance = details.signup_bonus_balance;

        let mut converted = false;
        if balance > 0.0 {
            let amount = conversion_amount(balance, offer.conversion_percentage);
            if amount > 0.0 {
                let reason = format!("Offer conversion for match: {}", offer.match_id);
                self.wallet
                    .convert_bonus(&row.user_id, amount, &reason)
                    .await?;
                converted = true;
            }
        }

        let key = ProgressKey::new(row.user_id.clone(), row.match_id.clone());
        self.progress
            .modify(&key, |p| {
                if p.status == ProgressStatus::Completed {
                    p.advance(ProgressStatus::Processed);
                }
            })
            .await
            .ok_or_else(|| {
                OfferFlowError::storage(format!("progress row vanished for {key}"))
            })?;

        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offerflow_progress::ProgressTracker;
    use offerflow_types::{ContestId, MatchOfferDraft, UserId};
    use offerflow_wallet::InMemoryWallet;

    struct Fixture {
        engine: SettlementEngine,
        tracker: ProgressTracker,
        wallet: Arc<InMemoryWallet>,
        offers: Arc<OfferStore>,
        progress: Arc<ProgressStore>,
    }

    async fn fixture(required: u32, percentage: f64) -> Fixture {
        let offers = Arc::new(OfferStore::new());
        offers
            .insert_match_offer(MatchOffer::from_draft(MatchOfferDraft {
                match_id: MatchId::new("M1"),
                match_name: "test".to_string(),
                offer_name: "join-n".to_string(),
                offer_type: 1,
                required_contests: required,
                conversion_percentage: percentage,
            }))
            .await
            .unwrap();

        let progress = Arc::new(ProgressStore::new());
        let wallet = Arc::new(InMemoryWallet::new());
        let engine = SettlementEngine::new(
            Arc::clone(&offers),
            Arc::clone(&progress),
            wallet.clone() as Arc<dyn WalletLedger>,
        );
        let tracker = ProgressTracker::new(Arc::clone(&offers), Arc::clone(&progress));
        Fixture {
            engine,
            tracker,
            wallet,
            offers,
            progress,
        }
    }

    async fn complete_offer(fx: &Fixture, user: &str, contests: &[&str]) {
        for c in contests {
            fx.tracker
                .record_contest_join(UserId::new(user), MatchId::new("M1"), ContestId::new(*c))
                .await
                .unwrap();
        }
    }

    fn report(outcome: SettlementOutcome) -> SettlementReport {
        match outcome {
            SettlementOutcome::Settled(r) => r,
            other => panic!("expected Settled, got {other:?}"),
        }
    }

    #[test]
    fn conversion_amount_is_clamped_to_balance() {
        assert_eq!(conversion_amount(500.0, 10.0), 50.0);
        assert_eq!(conversion_amount(500.0, 100.0), 500.0);
        assert_eq!(conversion_amount(0.0, 10.0), 0.0);
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        let fx = fixture(3, 10.0).await;
        complete_offer(&fx, "U1", &["C1", "C2", "C3"]).await;
        fx.wallet.set_balance(UserId::new("U1"), 500.0).await;

        let r = report(fx.engine.settle_match(&MatchId::new("M1")).await.unwrap());
        assert_eq!(r.processed, 1);
        assert_eq!(r.failed, 0);

        let conversions = fx.wallet.conversions().await;
        assert_eq!(conversions.len(), 1);
        assert_eq!(conversions[0].amount, 50.0);

        let key = ProgressKey::new(UserId::new("U1"), MatchId::new("M1"));
        let row = fx.progress.get(&key).await.unwrap();
        assert_eq!(row.status, ProgressStatus::Processed);
        assert!(fx.offers.find_unprocessed(&MatchId::new("M1")).await.is_none());
    }

    #[tokio::test]
    async fn second_trigger_is_nothing_to_process() {
        let fx = fixture(1, 10.0).await;
        complete_offer(&fx, "U1", &["C1"]).await;
        fx.wallet.set_balance(UserId::new("U1"), 100.0).await;

        report(fx.engine.settle_match(&MatchId::new("M1")).await.unwrap());
        let second = fx.engine.settle_match(&MatchId::new("M1")).await.unwrap();
        assert!(matches!(second, SettlementOutcome::NothingToProcess));
        assert_eq!(fx.wallet.conversions().await.len(), 1);
    }

    #[tokio::test]
    async fn wallet_failure_for_one_user_does_not_block_others() {
        let fx = fixture(1, 10.0).await;
        complete_offer(&fx, "UA", &["C1"]).await;
        complete_offer(&fx, "UB", &["C2"]).await;
        fx.wallet.set_balance(UserId::new("UA"), 100.0).await;
        fx.wallet.set_balance(UserId::new("UB"), 100.0).await;
        fx.wallet.fail_user(UserId::new("UA")).await;

        let r = report(fx.engine.settle_match(&MatchId::new("M1")).await.unwrap());
        assert_eq!(r.processed, 1);
        assert_eq!(r.failed, 1);

        let a = fx
            .progress
            .get(&ProgressKey::new(UserId::new("UA"), MatchId::new("M1")))
            .await
            .unwrap();
        let b = fx
            .progress
            .get(&ProgressKey::new(UserId::new("UB"), MatchId::new("M1")))
            .await
            .unwrap();
        assert_eq!(a.status, ProgressStatus::Completed);
        assert_eq!(b.status, ProgressStatus::Processed);

        // The offer is processed even with a stuck row (legacy semantics).
        assert!(fx.offers.find_unprocessed(&MatchId::new("M1")).await.is_none());
    }

    #[tokio::test]
    async fn zero_balance_rows_are_processed_without_conversion() {
        let fx = fixture(1, 10.0).await;
        complete_offer(&fx, "U1", &["C1"]).await;
        fx.wallet.set_balance(UserId::new("U1"), 0.0).await;

        let r = report(fx.engine.settle_match(&MatchId::new("M1")).await.unwrap());
        assert_eq!(r.processed, 1);
        assert_eq!(r.skipped_conversions, 1);
        assert!(fx.wallet.conversions().await.is_empty());

        let row = fx
            .progress
            .get(&ProgressKey::new(UserId::new("U1"), MatchId::new("M1")))
            .await
            .unwrap();
        assert_eq!(row.status, ProgressStatus::Processed);
    }

    #[tokio::test]
    async fn zero_completed_rows_still_marks_the_offer() {
        let fx = fixture(3, 10.0).await;
        // One join, not enough to complete.
        complete_offer(&fx, "U1", &["C1"]).await;

        let r = report(fx.engine.settle_match(&MatchId::new("M1")).await.unwrap());
        assert_eq!(r.processed, 0);
        assert!(fx.offers.find_unprocessed(&MatchId::new("M1")).await.is_none());
    }

    #[tokio::test]
    async fn in_progress_rows_are_untouched_by_settlement() {
        let fx = fixture(3, 10.0).await;
        complete_offer(&fx, "U1", &["C1"]).await;
        fx.wallet.set_balance(UserId::new("U1"), 100.0).await;

        report(fx.engine.settle_match(&MatchId::new("M1")).await.unwrap());
        let row = fx
            .progress
            .get(&ProgressKey::new(UserId::new("U1"), MatchId::new("M1")))
            .await
            .unwrap();
        assert_eq!(row.status, ProgressStatus::InProgress);
        assert!(fx.wallet.conversions().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_match_is_nothing_to_process() {
        let fx = fixture(1, 10.0).await;
        let outcome = fx.engine.settle_match(&MatchId::new("ghost")).await.unwrap();
        assert!(matches!(outcome, SettlementOutcome::NothingToProcess));
    }

    #[tokio::test]
    async fn concurrent_triggers_convert_at_most_once() {
        let fx = fixture(1, 10.0).await;
        complete_offer(&fx, "U1", &["C1"]).await;
        fx.wallet.set_balance(UserId::new("U1"), 100.0).await;

        let e1 = fx.engine.clone();
        let e2 = fx.engine.clone();
        let match_id = MatchId::new("M1");
        let (a, b) = tokio::join!(
            e1.settle_match(&match_id),
            e2.settle_match(&match_id),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(fx.wallet.conversions().await.len(), 1);
    }
}
