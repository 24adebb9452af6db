//! Short-lived registration token.
//!
//! The token is fetched lazily and reused until it is older than the TTL or a submission
//! comes back 401. The manager is owned by the session and borrowed mutably for the whole
//! submission, so at most one refresh can be in flight.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::api::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub value: String,
    pub issued_at: DateTime<Utc>,
}

impl AuthToken {
    /// True while `now - issued_at < ttl`. A clock that went backwards counts as fresh.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match now.signed_duration_since(self.issued_at).to_std() {
            Ok(age) => age < ttl,
            Err(_) => true,
        }
    }
}

#[derive(Debug)]
pub struct TokenManager {
    api: ApiClient,
    ttl: Duration,
    cached: Option<AuthToken>,
}

impl TokenManager {
    pub fn new(api: ApiClient, ttl: Duration) -> Self {
        Self {
            api,
            ttl,
            cached: None,
        }
    }

    /// How long an issued token is reused.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The held token, which may already be past its TTL.
    pub fn cached(&self) -> Option<&AuthToken> {
        self.cached.as_ref()
    }

    /// A token younger than the TTL, fetching a new one from `/token` if needed.
    ///
    /// A failed fetch leaves nothing cached.
    pub async fn ensure_token(&mut self) -> Result<AuthToken, ApiError> {
        self.ensure_token_at(Utc::now()).await
    }

    /// Same as [`Self::ensure_token`] with an explicit clock.
    pub async fn ensure_token_at(&mut self, now: DateTime<Utc>) -> Result<AuthToken, ApiError> {
        if let Some(token) = self.cached.as_ref().filter(|t| t.is_fresh_at(now, self.ttl)) {
            debug!("TokenManager: reusing token issued at {}", token.issued_at);
            return Ok(token.clone());
        }

        let value = self.api.fetch_token().await?;
        let token = AuthToken {
            value,
            issued_at: now,
        };
        info!("TokenManager: new token issued at {now}");
        self.cached = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token; the next `ensure_token` fetches a new one.
    pub fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            info!("TokenManager: token invalidated");
        }
    }
}
