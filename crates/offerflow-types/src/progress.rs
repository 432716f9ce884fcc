//! Per-user offer progress
//!
//! One `OfferProgress` row exists per (user, match) pair. Rows are created on
//! the first join event and never deleted; a Processed row is the audit trail
//! of a settled offer.

use crate::{ContestId, MatchId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a progress row. Transitions are forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    InProgress,
    Completed,
    Processed,
}

impl ProgressStatus {
    /// Whether advancing to `next` respects the forward-only ordering
    pub fn can_advance_to(self, next: ProgressStatus) -> bool {
        self.rank() < next.rank()
    }

    fn rank(self) -> u8 {
        match self {
            ProgressStatus::InProgress => 0,
            ProgressStatus::Completed => 1,
            ProgressStatus::Processed => 2,
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProgressStatus::InProgress => "IN_PROGRESS",
            ProgressStatus::Completed => "COMPLETED",
            ProgressStatus::Processed => "PROCESSED",
        };
        write!(f, "{s}")
    }
}

/// Progress of one user toward one match offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferProgress {
    pub user_id: UserId,
    pub match_id: MatchId,
    /// Distinct contests the user has joined, in join order
    pub joined_contests: Vec<ContestId>,
    /// Derived: always equal to `joined_contests.len()`
    pub contests_joined_count: u32,
    pub status: ProgressStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OfferProgress {
    /// Fresh row for a (user, match) pair with no joins yet
    pub fn new(user_id: UserId, match_id: MatchId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            match_id,
            joined_contests: Vec::new(),
            contests_joined_count: 0,
            status: ProgressStatus::InProgress,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a contest to the joined set if absent, recomputing the count.
    /// Returns true if the contest was newly added.
    pub fn add_contest(&mut self, contest_id: ContestId) -> bool {
        let added = if self.joined_contests.contains(&contest_id) {
            false
        } else {
            self.joined_contests.push(contest_id);
            true
        };
        self.contests_joined_count = self.joined_contests.len() as u32;
        if added {
            self.updated_at = Utc::now();
        }
        added
    }

    /// Replace the joined set wholesale from an authoritative snapshot,
    /// dropping duplicates and recomputing the count.
    pub fn overwrite_contests(&mut self, contest_ids: Vec<ContestId>) {
        self.joined_contests.clear();
        for id in contest_ids {
            if !self.joined_contests.contains(&id) {
                self.joined_contests.push(id);
            }
        }
        self.contests_joined_count = self.joined_contests.len() as u32;
        self.updated_at = Utc::now();
    }

    /// Advance the status, refusing any backward move.
    /// Returns true if the status actually changed.
    pub fn advance(&mut self, next: ProgressStatus) -> bool {
        if self.status.can_advance_to(next) {
            self.status = next;
            self.updated_at = Utc::now();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> OfferProgress {
        OfferProgress::new(UserId::new("u1"), MatchId::new("m1"))
    }

    #[test]
    fn duplicate_joins_do_not_grow_the_set() {
        let mut p = row();
        assert!(p.add_contest(ContestId::new("c1")));
        assert!(!p.add_contest(ContestId::new("c1")));
        assert_eq!(p.contests_joined_count, 1);
        assert_eq!(p.joined_contests.len(), 1);
    }

    #[test]
    fn count_tracks_the_set() {
        let mut p = row();
        p.add_contest(ContestId::new("c1"));
        p.add_contest(ContestId::new("c2"));
        assert_eq!(p.contests_joined_count as usize, p.joined_contests.len());
    }

    #[test]
    fn status_never_regresses() {
        let mut p = row();
        assert!(p.advance(ProgressStatus::Completed));
        assert!(!p.advance(ProgressStatus::InProgress));
        assert!(p.advance(ProgressStatus::Processed));
        assert!(!p.advance(ProgressStatus::Completed));
        assert_eq!(p.status, ProgressStatus::Processed);
    }

    #[test]
    fn overwrite_dedupes_and_recounts() {
        let mut p = row();
        p.add_contest(ContestId::new("c9"));
        p.overwrite_contests(vec![
            ContestId::new("c1"),
            ContestId::new("c2"),
            ContestId::new("c1"),
        ]);
        assert_eq!(p.contests_joined_count, 2);
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let s = serde_json::to_string(&ProgressStatus::InProgress).unwrap();
        assert_eq!(s, "\"IN_PROGRESS\"");
    }
}
