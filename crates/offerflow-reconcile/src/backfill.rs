//! Backfill runner
//!
//! Rebuilds progress rows for every active offer from the participation
//! service, with a bounded worker pool per match. Per-user failures are
//! logged and isolated so one bad lookup never sinks the run.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use offerflow_progress::ProgressTracker;
use offerflow_registry::OfferStore;
use offerflow_types::{MatchId, Result, UserId};

use crate::ParticipationSource;

/// Counts from one backfill run
#[derive(Debug, Clone, Default)]
pub struct BackfillReport {
    pub matches_scanned: usize,
    /// Users whose progress rows were written
    pub users_backfilled: usize,
    /// Users skipped because the participation service returned no contests
    pub users_skipped: usize,
    /// Users whose lookup or write failed
    pub users_failed: usize,
}

/// Drives the backfill over all active offers
pub struct BackfillRunner {
    offers: Arc<OfferStore>,
    tracker: ProgressTracker,
    participants: Arc<dyn ParticipationSource>,
    /// Maximum in-flight user lookups per match
    concurrency: usize,
}

impl BackfillRunner {
    pub fn new(
        offers: Arc<OfferStore>,
        tracker: ProgressTracker,
        participants: Arc<dyn ParticipationSource>,
        concurrency: usize,
    ) -> Self {
        Self {
            offers,
            tracker,
            participants,
            concurrency: concurrency.max(1),
        }
    }

    /// Backfill progress for every active offer
    pub async fn backfill_active_offers(&self) -> Result<BackfillReport> {
        let offers = self.offers.list_active().await;
        info!(count = offers.len(), "backfilling active offers");

        let mut report = BackfillReport::default();
        for offer in offers {
            report.matches_scanned += 1;
            self.backfill_match(&offer.match_id, &mut report).await;
        }
        info!(
            matches = report.matches_scanned,
            backfilled = report.users_backfilled,
            failed = report.users_failed,
            "backfill finished"
        );
        Ok(report)
    }

    async fn backfill_match(&self, match_id: &MatchId, report: &mut BackfillReport) {
        let users = match self.participants.participants_by_match(match_id).await {
            Ok(users) => users,
            Err(e) => {
                warn!(match_id = %match_id, error = %e, "participant lookup failed, skipping match");
                return;
            }
        };
        if users.is_empty() {
            info!(match_id = %match_id, "no participations found, skipping match");
            return;
        }

        let outcomes = stream::iter(users)
            .map(|user| self.backfill_user(user, match_id.clone()))
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        for outcome in outcomes {
            match outcome {
                UserOutcome::Backfilled => report.users_backfilled += 1,
                UserOutcome::Skipped => report.users_skipped += 1,
                UserOutcome::Failed => report.users_failed += 1,
            }
        }
    }

    async fn backfill_user(&self, user_id: UserId, match_id: MatchId) -> UserOutcome {
        let contests = match self
            .participants
            .contests_by_user_match(&user_id, &match_id)
            .await
        {
            Ok(contests) => contests,
            Err(e) => {
                warn!(user_id = %user_id, match_id = %match_id, error = %e, "contest lookup failed");
                return UserOutcome::Failed;
            }
        };
        if contests.is_empty() {
            return UserOutcome::Skipped;
        }

        match self
            .tracker
            .overwrite_progress(user_id.clone(), match_id.clone(), contests)
            .await
        {
            Ok(_) => UserOutcome::Backfilled,
            Err(e) => {
                warn!(user_id = %user_id, match_id = %match_id, error = %e, "progress write failed");
                UserOutcome::Failed
            }
        }
    }
}

enum UserOutcome {
    Backfilled,
    Skipped,
    Failed,
}
