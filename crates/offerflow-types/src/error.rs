//! Error types for OfferFlow
//!
//! Validation and not-found conditions are resolved locally and reported as
//! structured results; dependency failures during settlement are isolated per
//! row and never abort a batch. API-facing responses expose only the stable
//! message and `error_code`.

use thiserror::Error;

/// Result type for OfferFlow operations
pub type Result<T> = std::result::Result<T, OfferFlowError>;

/// OfferFlow error types
#[derive(Debug, Clone, Error)]
pub enum OfferFlowError {
    // ========================================================================
    // Validation & Conflict Errors
    // ========================================================================

    /// Invalid input
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    /// Duplicate unique key on offer creation
    #[error("Duplicate offer: {field} '{value}' already exists")]
    DuplicateOffer { field: String, value: String },

    // ========================================================================
    // Not-Found Errors
    // ========================================================================

    /// No offer record for the match
    #[error("No offer found for match {match_id}")]
    OfferNotFound { match_id: String },

    /// No progress row for the (user, match) pair
    #[error("No progress found for user {user_id} in match {match_id}")]
    ProgressNotFound { user_id: String, match_id: String },

    /// Wallet service has no wallet for the user
    #[error("Wallet not found for user {user_id}")]
    WalletNotFound { user_id: String },

    // ========================================================================
    // Dependency Errors
    // ========================================================================

    /// Wallet service unreachable or returned an unusable response
    #[error("Wallet service unavailable: {reason}")]
    WalletUnavailable { reason: String },

    /// Wallet service refused the conversion
    #[error("Bonus conversion rejected for user {user_id}: {reason}")]
    ConversionRejected { user_id: String, reason: String },

    /// Contest participation service unreachable
    #[error("Participation service unavailable: {reason}")]
    ParticipationUnavailable { reason: String },

    // ========================================================================
    // General Errors
    // ========================================================================

    /// Persistence failure on a single record write
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl OfferFlowError {
    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a retriable error
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::WalletUnavailable { .. }
                | Self::ParticipationUnavailable { .. }
                | Self::Storage { .. }
                | Self::Internal { .. }
        )
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::DuplicateOffer { .. } => "DUPLICATE_OFFER",
            Self::OfferNotFound { .. } => "OFFER_NOT_FOUND",
            Self::ProgressNotFound { .. } => "PROGRESS_NOT_FOUND",
            Self::WalletNotFound { .. } => "WALLET_NOT_FOUND",
            Self::WalletUnavailable { .. } => "WALLET_UNAVAILABLE",
            Self::ConversionRejected { .. } => "CONVERSION_REJECTED",
            Self::ParticipationUnavailable { .. } => "PARTICIPATION_UNAVAILABLE",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
