//! OfferFlow Wallet - External wallet ledger boundary
//!
//! The settlement engine only ever talks to the [`WalletLedger`] trait.
//! Transport, credentials, and timeout policy live in the implementations:
//! [`HttpWalletLedger`] for production, [`InMemoryWallet`] as a substitutable
//! test double with failure injection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use offerflow_types::{Result, UserId};

pub mod http;
pub mod memory;

pub use http::{HttpWalletLedger, WalletClientConfig};
pub use memory::InMemoryWallet;

/// Balance details returned by the wallet service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletDetails {
    /// Non-withdrawable signup credit eligible for conversion
    pub signup_bonus_balance: f64,
}

/// Acknowledgement of a completed bonus conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionAck {
    pub user_id: UserId,
    pub amount: f64,
    pub reason: String,
    pub converted_at: DateTime<Utc>,
}

/// Boundary contract to the external wallet ledger
#[async_trait::async_trait]
pub trait WalletLedger: Send + Sync {
    /// Query a user's signup bonus balance
    ///
    /// Fails `WalletNotFound` if the user has no wallet, `WalletUnavailable`
    /// on transport problems or an unusable response.
    async fn bonus_balance(&self, user_id: &UserId) -> Result<WalletDetails>;

    /// Move `amount` of bonus balance into usable balance
    ///
    /// Fails `WalletUnavailable` on transport problems, `ConversionRejected`
    /// if the ledger refuses the conversion.
    async fn convert_bonus(
        &self,
        user_id: &UserId,
        amount: f64,
        reason: &str,
    ) -> Result<ConversionAck>;
}
