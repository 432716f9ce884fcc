//! In-memory wallet double for tests and the demo
//!
//! Balances are settable, conversions are recorded for assertions, and any
//! user can be marked as failing to exercise per-row failure isolation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use offerflow_types::{OfferFlowError, Result, UserId};

use crate::{ConversionAck, WalletDetails, WalletLedger};

#[derive(Clone)]
pub struct InMemoryWallet {
    balances: Arc<RwLock<HashMap<UserId, f64>>>,
    failing: Arc<RwLock<HashSet<UserId>>>,
    conversions: Arc<RwLock<Vec<ConversionAck>>>,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            conversions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Seed a user's signup bonus balance
    pub async fn set_balance(&self, user_id: UserId, balance: f64) {
        self.balances.write().await.insert(user_id, balance);
    }

    /// Make every call for this user fail with `WalletUnavailable`
    pub async fn fail_user(&self, user_id: UserId) {
        self.failing.write().await.insert(user_id);
    }

    /// Stop failing calls for this user
    pub async fn heal_user(&self, user_id: &UserId) {
        self.failing.write().await.remove(user_id);
    }

    /// All conversions performed so far, in order
    pub async fn conversions(&self) -> Vec<ConversionAck> {
        self.conversions.read().await.clone()
    }

    async fn check_available(&self, user_id: &UserId) -> Result<()> {
        if self.failing.read().await.contains(user_id) {
            return Err(OfferFlowError::WalletUnavailable {
                reason: format!("injected failure for user {user_id}"),
            });
        }
        Ok(())
    }
}

impl Default for InMemoryWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl WalletLedger for InMemoryWallet {
    async fn bonus_balance(&self, user_id: &UserId) -> Result<WalletDetails> {
        self.check_available(user_id).await?;
        let balances = self.balances.read().await;
        let balance = balances
            .get(user_id)
            .copied()
            .ok_or_else(|| OfferFlowError::WalletNotFound {
                user_id: user_id.to_string(),
            })?;
        Ok(WalletDetails {
            signup_bonus_balance: balance,
        })
    }

    async fn convert_bonus(
        &self,
        user_id: &UserId,
        amount: f64,
        reason: &str,
    ) -> Result<ConversionAck> {
        self.check_available(user_id).await?;

        let mut balances = self.balances.write().await;
        let balance = balances
            .get_mut(user_id)
            .ok_or_else(|| OfferFlowError::WalletNotFound {
                user_id: user_id.to_string(),
            })?;

        if amount <= 0.0 || amount > *balance {
            return Err(OfferFlowError::ConversionRejected {
                user_id: user_id.to_string(),
                reason: format!("amount {amount} not within bonus balance {balance}"),
            });
        }
        *balance -= amount;

        let ack = ConversionAck {
            user_id: user_id.clone(),
            amount,
            reason: reason.to_string(),
            converted_at: Utc::now(),
        };
        self.conversions.write().await.push(ack.clone());
        info!(user_id = %user_id, amount, "bonus converted");
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn conversion_reduces_bonus_balance() {
        let wallet = InMemoryWallet::new();
        let user = UserId::new("U1");
        wallet.set_balance(user.clone(), 500.0).await;

        wallet.convert_bonus(&user, 50.0, "test").await.unwrap();

        let details = wallet.bonus_balance(&user).await.unwrap();
        assert_eq!(details.signup_bonus_balance, 450.0);
        assert_eq!(wallet.conversions().await.len(), 1);
    }

    #[tokio::test]
    async fn over_balance_conversion_is_rejected() {
        let wallet = InMemoryWallet::new();
        let user = UserId::new("U1");
        wallet.set_balance(user.clone(), 10.0).await;

        let err = wallet.convert_bonus(&user, 50.0, "test").await.unwrap_err();
        assert_eq!(err.error_code(), "CONVERSION_REJECTED");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let wallet = InMemoryWallet::new();
        let err = wallet.bonus_balance(&UserId::new("ghost")).await.unwrap_err();
        assert_eq!(err.error_code(), "WALLET_NOT_FOUND");
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_unavailable() {
        let wallet = InMemoryWallet::new();
        let user = UserId::new("U1");
        wallet.set_balance(user.clone(), 100.0).await;
        wallet.fail_user(user.clone()).await;

        let err = wallet.bonus_balance(&user).await.unwrap_err();
        assert_eq!(err.error_code(), "WALLET_UNAVAILABLE");

        wallet.heal_user(&user).await;
        assert!(wallet.bonus_balance(&user).await.is_ok());
    }
}
