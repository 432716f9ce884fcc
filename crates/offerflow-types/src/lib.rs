//! OfferFlow Types - Canonical domain types for offer tracking & settlement
//!
//! This crate contains all foundational types for OfferFlow with zero
//! dependencies on other offerflow crates. It defines:
//!
//! - Identity types (UserId, MatchId, ContestId, OfferId)
//! - Match offer and deposit offer records
//! - Per-user progress records and the progress status machine
//! - Error taxonomy
//!
//! # Invariants
//!
//! 1. `contests_joined_count` is always recomputable from `joined_contests`
//! 2. Progress status only moves forward: InProgress -> Completed -> Processed
//! 3. An offer's `is_processed` flag flips false -> true at most once

pub mod error;
pub mod identity;
pub mod offer;
pub mod progress;

pub use error::*;
pub use identity::*;
pub use offer::*;
pub use progress::*;

/// Version of the OfferFlow types schema
pub const TYPES_VERSION: &str = "0.1.0";
