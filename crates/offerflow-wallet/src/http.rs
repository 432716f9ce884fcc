//! HTTP wallet ledger client
//!
//! Talks to the wallet service under a shared service credential. Every
//! request carries the configured timeout; transport errors and undecodable
//! responses surface as `WalletUnavailable` so the settlement engine treats
//! them as per-row failures.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use offerflow_types::{OfferFlowError, Result, UserId};

use crate::{ConversionAck, WalletDetails, WalletLedger};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the wallet service
#[derive(Debug, Clone)]
pub struct WalletClientConfig {
    pub base_url: String,
    /// Shared internal service credential, sent as a bearer token
    pub api_token: String,
    pub timeout: Duration,
}

impl WalletClientConfig {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load from `WALLET_SERVICE_URL`, `INTERNAL_API_TOKEN`, and optional
    /// `WALLET_TIMEOUT_SECS` (reads a `.env` file if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("WALLET_SERVICE_URL")
            .map_err(|_| OfferFlowError::invalid_input("WALLET_SERVICE_URL", "not set"))?;
        let api_token = std::env::var("INTERNAL_API_TOKEN")
            .map_err(|_| OfferFlowError::invalid_input("INTERNAL_API_TOKEN", "not set"))?;
        let timeout = std::env::var("WALLET_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Ok(Self {
            base_url,
            api_token,
            timeout,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WalletDetailsResponse {
    signup_bonus_balance: f64,
}

/// Production [`WalletLedger`] backed by the wallet service HTTP API
pub struct HttpWalletLedger {
    client: reqwest::Client,
    config: WalletClientConfig,
}

impl HttpWalletLedger {
    pub fn new(config: WalletClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OfferFlowError::internal(format!("http client build failed: {e}")))?;
        Ok(Self { client, config })
    }

    fn transport_error(e: reqwest::Error) -> OfferFlowError {
        let reason = if e.is_timeout() {
            "request timed out".to_string()
        } else {
            e.to_string()
        };
        OfferFlowError::WalletUnavailable { reason }
    }
}

#[async_trait::async_trait]
impl WalletLedger for HttpWalletLedger {
    async fn bonus_balance(&self, user_id: &UserId) -> Result<WalletDetails> {
        let url = format!("{}/api/wallet/details/{}", self.config.base_url, user_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(OfferFlowError::WalletNotFound {
                user_id: user_id.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(OfferFlowError::WalletUnavailable {
                reason: format!("wallet details returned status {}", response.status()),
            });
        }

        let details: WalletDetailsResponse =
            response.json().await.map_err(|e| {
                warn!(user_id = %user_id, error = %e, "undecodable wallet details");
                OfferFlowError::WalletUnavailable {
                    reason: "invalid wallet details response".to_string(),
                }
            })?;

        Ok(WalletDetails {
            signup_bonus_balance: details.signup_bonus_balance,
        })
    }

    async fn convert_bonus(
        &self,
        user_id: &UserId,
        amount: f64,
        reason: &str,
    ) -> Result<ConversionAck> {
        let url = format!("{}/api/wallet/convert-bonus", self.config.base_url);
        let body = json!({
            "userId": user_id,
            "amountToConvert": amount,
            "reason": reason,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            if status.is_client_error() {
                return Err(OfferFlowError::ConversionRejected {
                    user_id: user_id.to_string(),
                    reason: format!("wallet service returned status {status}"),
                });
            }
            return Err(OfferFlowError::WalletUnavailable {
                reason: format!("convert-bonus returned status {status}"),
            });
        }

        Ok(ConversionAck {
            user_id: user_id.clone(),
            amount,
            reason: reason.to_string(),
            converted_at: Utc::now(),
        })
    }
}
