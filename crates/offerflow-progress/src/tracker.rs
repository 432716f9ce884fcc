//! Progress tracker
//!
//! Entry point for join events from the contest service, and for the offline
//! backfill path that replays an authoritative participation snapshot.

use std::sync::Arc;

use tracing::{debug, info};

use offerflow_registry::OfferStore;
use offerflow_types::{
    ContestId, MatchId, OfferProgress, ProgressKey, ProgressStatus, Result, UserId,
};

use crate::ProgressStore;

/// Outcome of a tracking call
#[derive(Debug, Clone)]
pub enum TrackOutcome {
    /// No active offer exists for the match; nothing was recorded
    NoActiveOffer,
    /// The row was created or updated
    Tracked {
        progress: OfferProgress,
        /// True only on the call that flipped the row to Completed
        newly_completed: bool,
    },
}

impl TrackOutcome {
    /// The updated row, if the event was recorded
    pub fn progress(&self) -> Option<&OfferProgress> {
        match self {
            TrackOutcome::NoActiveOffer => None,
            TrackOutcome::Tracked { progress, .. } => Some(progress),
        }
    }
}

/// Maintains per-(user, match) completion state from join events
#[derive(Clone)]
pub struct ProgressTracker {
    offers: Arc<OfferStore>,
    progress: Arc<ProgressStore>,
}

impl ProgressTracker {
    pub fn new(offers: Arc<OfferStore>, progress: Arc<ProgressStore>) -> Self {
        Self { offers, progress }
    }

    /// Access the underlying progress store (shared with the settlement engine)
    pub fn progress_store(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    /// Record one contest join for a user
    ///
    /// Idempotent under retries: a contest id already in the joined set is a
    /// no-op, and a row already Completed never regresses or re-completes.
    pub async fn record_contest_join(
        &self,
        user_id: UserId,
        match_id: MatchId,
        contest_id: ContestId,
    ) -> Result<TrackOutcome> {
        let Some(offer) = self.offers.find_active(&match_id).await else {
            debug!(match_id = %match_id, "no active offer for match, join ignored");
            return Ok(TrackOutcome::NoActiveOffer);
        };

        let required = offer.required_contests;
        let key = ProgressKey::new(user_id.clone(), match_id.clone());

        let (progress, newly_completed) = self
            .progress
            .upsert_with(key, move |row| {
                row.add_contest(contest_id);
                let newly_completed = row.contests_joined_count >= required
                    && row.status == ProgressStatus::InProgress
                    && row.advance(ProgressStatus::Completed);
                (row.clone(), newly_completed)
            })
            .await?;

        if newly_completed {
            info!(
                user_id = %user_id,
                match_id = %match_id,
                count = progress.contests_joined_count,
                "offer completed"
            );
        } else {
            debug!(
                user_id = %user_id,
                match_id = %match_id,
                count = progress.contests_joined_count,
                "join recorded"
            );
        }

        Ok(TrackOutcome::Tracked {
            progress,
            newly_completed,
        })
    }

    /// Replace a user's joined set from an authoritative participation
    /// snapshot (backfill path), re-evaluating completion. Status never
    /// regresses even if the snapshot shrinks the set.
    pub async fn overwrite_progress(
        &self,
        user_id: UserId,
        match_id: MatchId,
        contest_ids: Vec<ContestId>,
    ) -> Result<TrackOutcome> {
        let Some(offer) = self.offers.find_active(&match_id).await else {
            return Ok(TrackOutcome::NoActiveOffer);
        };

        let required = offer.required_contests;
        let key = ProgressKey::new(user_id.clone(), match_id.clone());

        let (progress, newly_completed) = self
            .progress
            .upsert_with(key, move |row| {
                row.overwrite_contests(contest_ids);
                let newly_completed = row.contests_joined_count >= required
                    && row.status == ProgressStatus::InProgress
                    && row.advance(ProgressStatus::Completed);
                (row.clone(), newly_completed)
            })
            .await?;

        info!(
            user_id = %user_id,
            match_id = %match_id,
            count = progress.contests_joined_count,
            newly_completed,
            "progress backfilled"
        );

        Ok(TrackOutcome::Tracked {
            progress,
            newly_completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offerflow_types::{MatchOffer, MatchOfferDraft};

    async fn tracker_with_offer(required: u32) -> ProgressTracker {
        let offers = Arc::new(OfferStore::new());
        offers
            .insert_match_offer(MatchOffer::from_draft(MatchOfferDraft {
                match_id: MatchId::new("M1"),
                match_name: "test".to_string(),
                offer_name: "join-n".to_string(),
                offer_type: 1,
                required_contests: required,
                conversion_percentage: 10.0,
            }))
            .await
            .unwrap();
        ProgressTracker::new(offers, Arc::new(ProgressStore::new()))
    }

    async fn join(t: &ProgressTracker, contest: &str) -> TrackOutcome {
        t.record_contest_join(
            UserId::new("U1"),
            MatchId::new("M1"),
            ContestId::new(contest),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn no_active_offer_is_a_noop() {
        let tracker = tracker_with_offer(3).await;
        let outcome = tracker
            .record_contest_join(
                UserId::new("U1"),
                MatchId::new("other-match"),
                ContestId::new("C1"),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, TrackOutcome::NoActiveOffer));
        assert!(tracker.progress_store().is_empty().await);
    }

    #[tokio::test]
    async fn completes_exactly_at_threshold() {
        let tracker = tracker_with_offer(3).await;
        join(&tracker, "C1").await;
        join(&tracker, "C2").await;

        let outcome = join(&tracker, "C3").await;
        let TrackOutcome::Tracked { progress, newly_completed } = outcome else {
            panic!("expected Tracked");
        };
        assert!(newly_completed);
        assert_eq!(progress.status, ProgressStatus::Completed);
        assert_eq!(progress.contests_joined_count, 3);
    }

    #[tokio::test]
    async fn duplicate_join_is_idempotent() {
        let tracker = tracker_with_offer(3).await;
        join(&tracker, "C1").await;
        let outcome = join(&tracker, "C1").await;

        let progress = outcome.progress().unwrap();
        assert_eq!(progress.contests_joined_count, 1);
        assert_eq!(progress.status, ProgressStatus::InProgress);
    }

    #[tokio::test]
    async fn rejoin_after_completion_never_regresses() {
        let tracker = tracker_with_offer(3).await;
        join(&tracker, "C1").await;
        join(&tracker, "C2").await;
        join(&tracker, "C3").await;

        let outcome = join(&tracker, "C1").await;
        let TrackOutcome::Tracked { progress, newly_completed } = outcome else {
            panic!("expected Tracked");
        };
        assert!(!newly_completed);
        assert_eq!(progress.status, ProgressStatus::Completed);
        assert_eq!(progress.contests_joined_count, 3);
    }

    #[tokio::test]
    async fn completion_fires_once_even_past_threshold() {
        let tracker = tracker_with_offer(2).await;
        join(&tracker, "C1").await;
        let second = join(&tracker, "C2").await;
        let third = join(&tracker, "C3").await;

        let TrackOutcome::Tracked { newly_completed, .. } = second else {
            panic!("expected Tracked");
        };
        assert!(newly_completed);
        let TrackOutcome::Tracked { newly_completed, .. } = third else {
            panic!("expected Tracked");
        };
        assert!(!newly_completed);
    }

    #[tokio::test]
    async fn overwrite_completes_eligible_rows() {
        let tracker = tracker_with_offer(2).await;
        let outcome = tracker
            .overwrite_progress(
                UserId::new("U1"),
                MatchId::new("M1"),
                vec![ContestId::new("C1"), ContestId::new("C2"), ContestId::new("C1")],
            )
            .await
            .unwrap();

        let TrackOutcome::Tracked { progress, newly_completed } = outcome else {
            panic!("expected Tracked");
        };
        assert!(newly_completed);
        assert_eq!(progress.contests_joined_count, 2);
    }
}
