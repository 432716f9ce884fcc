//! OfferFlow Reconcile - Offline backfill and status repair
//!
//! These paths run out of band, never during real-time tracking. They drive
//! the same tracker primitives as the live path instead of duplicating the
//! counting logic: backfill replays authoritative participation snapshots
//! through `overwrite_progress`, and the repair sweep promotes InProgress
//! rows that already meet their offer's threshold.

use offerflow_types::{ContestId, MatchId, Result, UserId};

pub mod backfill;
pub mod http;
pub mod repair;

pub use backfill::{BackfillReport, BackfillRunner};
pub use http::{HttpParticipationSource, ParticipationClientConfig};
pub use repair::StatusRepair;

/// Boundary contract to the contest participation service
#[async_trait::async_trait]
pub trait ParticipationSource: Send + Sync {
    /// Distinct users who entered any contest of the match
    async fn participants_by_match(&self, match_id: &MatchId) -> Result<Vec<UserId>>;

    /// Contest ids a user joined within one match
    async fn contests_by_user_match(
        &self,
        user_id: &UserId,
        match_id: &MatchId,
    ) -> Result<Vec<ContestId>>;
}
