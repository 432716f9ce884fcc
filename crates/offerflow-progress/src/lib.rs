//! OfferFlow Progress - Per-user, per-match progress tracking
//!
//! The tracker turns contest-join events into progress rows and detects
//! completion against the match offer's threshold. All mutations of one
//! (user, match) key run under the store's write lock, so concurrent joins
//! for the same key are serialized and never lost to a last-write-wins merge.

pub mod store;
pub mod tracker;

pub use store::ProgressStore;
pub use tracker::{ProgressTracker, TrackOutcome};
