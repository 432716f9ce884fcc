//! HTTP participation client
//!
//! Mirrors the wallet client: shared bearer credential, per-request timeout,
//! transport errors mapped to `ParticipationUnavailable`.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use offerflow_types::{ContestId, MatchId, OfferFlowError, Result, UserId};

use crate::ParticipationSource;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection settings for the contest participation service
#[derive(Debug, Clone)]
pub struct ParticipationClientConfig {
    pub base_url: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl ParticipationClientConfig {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load from `CONTEST_SERVICE_URL`, `INTERNAL_API_TOKEN`, and optional
    /// `CONTEST_TIMEOUT_SECS` (reads a `.env` file if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("CONTEST_SERVICE_URL")
            .map_err(|_| OfferFlowError::invalid_input("CONTEST_SERVICE_URL", "not set"))?;
        let api_token = std::env::var("INTERNAL_API_TOKEN")
            .map_err(|_| OfferFlowError::invalid_input("INTERNAL_API_TOKEN", "not set"))?;
        let timeout = std::env::var("CONTEST_TIMEOUT_SECS")
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
struct ParticipationEntry {
    user: String,
}

#[derive(Debug, Deserialize)]
struct ParticipantsResponse {
    #[serde(rename = "userIds")]
    user_ids: Vec<ParticipationEntry>,
}

#[derive(Debug, Deserialize)]
struct ContestsResponse {
    #[serde(rename = "contestIds")]
    contest_ids: Vec<String>,
}

/// Production [`ParticipationSource`] backed by the contest service HTTP API
pub struct HttpParticipationSource {
    client: reqwest::Client,
    config: ParticipationClientConfig,
}

impl HttpParticipationSource {
    pub fn new(config: ParticipationClientConfig) -> Result<Self> {
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
        OfferFlowError::ParticipationUnavailable { reason }
    }
}

#[async_trait::async_trait]
impl ParticipationSource for HttpParticipationSource {
    async fn participants_by_match(&self, match_id: &MatchId) -> Result<Vec<UserId>> {
        let url = format!(
            "{}/api/v1/user/internal/participants-by-match/{}",
            self.config.base_url, match_id
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(OfferFlowError::ParticipationUnavailable {
                reason: format!("participants-by-match returned status {}", response.status()),
            });
        }

        let body: ParticipantsResponse = response.json().await.map_err(|e| {
            warn!(match_id = %match_id, error = %e, "undecodable participants response");
            OfferFlowError::ParticipationUnavailable {
                reason: "invalid participants response".to_string(),
            }
        })?;

        // Participation entries repeat per contest; deduplicate users while
        // keeping first-seen order.
        let mut users: Vec<UserId> = Vec::new();
        for entry in body.user_ids {
            let user = UserId::new(entry.user);
            if !users.contains(&user) {
                users.push(user);
            }
        }
        Ok(users)
    }

    async fn contests_by_user_match(
        &self,
        user_id: &UserId,
        match_id: &MatchId,
    ) -> Result<Vec<ContestId>> {
        let url = format!(
            "{}/api/v1/user/internal/participations-by-user-match",
            self.config.base_url
        );
        let response = self
            .client
            .get(&url)
            .query(&[("userId", user_id.as_str()), ("matchId", match_id.as_str())])
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(OfferFlowError::ParticipationUnavailable {
                reason: format!(
                    "participations-by-user-match returned status {}",
                    response.status()
                ),
            });
        }

        let body: ContestsResponse = response.json().await.map_err(|e| {
            warn!(user_id = %user_id, match_id = %match_id, error = %e, "undecodable contests response");
            OfferFlowError::ParticipationUnavailable {
                reason: "invalid contests response".to_string(),
            }
        })?;

        Ok(body.contest_ids.into_iter().map(ContestId::new).collect())
    }
}
