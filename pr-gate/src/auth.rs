//! GitHub App authentication: signed app assertions and the per-installation
//! token cache.
//!
//! Flow: build a short-lived RS256 JWT (issued-at backdated by a clock-skew
//! margin, expiry capped at the provider's 10-minute maximum), exchange it at
//! `POST /app/installations/{id}/access_tokens` for a scoped installation
//! token, and cache the result keyed by installation id. A cached token is
//! considered stale 10 minutes before its true expiry.
//!
//! Concurrent callers hitting a cache miss for the same installation may each
//! run an exchange; the cache tolerates redundant refreshes instead of
//! requiring single-flight.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::CredentialError;

/// Refresh margin: a token is re-exchanged this long before it truly expires.
const REFRESH_MARGIN: Duration = Duration::from_secs(10 * 60);

/// Clock-skew backdate applied to the assertion's issued-at claim.
const IAT_BACKDATE_SECS: u64 = 60;

/// Assertion lifetime; GitHub rejects anything above 10 minutes.
const ASSERTION_TTL_SECS: u64 = 600;

#[derive(Debug, Serialize)]
struct AppClaims {
    iss: String,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    /// Point in time after which the cached entry is treated as stale.
    refresh_after: SystemTime,
}

/// Installation-token cache, shared across all event handlers.
///
/// Owns the signing key and the HTTP client used for exchanges. The token
/// itself never leaves this type except as the return value of
/// [`InstallationTokenCache::get_token`].
pub struct InstallationTokenCache {
    http: reqwest::Client,
    base_api: String,
    app_id: String,
    private_key_pem: String,
    cache: RwLock<HashMap<u64, CachedToken>>,
}

impl InstallationTokenCache {
    pub fn new(http: reqwest::Client, base_api: String, app_id: String, private_key_pem: String) -> Self {
        Self {
            http,
            base_api,
            app_id,
            private_key_pem,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a valid installation token, exchanging a fresh assertion on a
    /// cache miss or when the cached token is inside the refresh margin.
    pub async fn get_token(&self, installation_id: u64) -> Result<String, CredentialError> {
        let now = SystemTime::now();
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&installation_id) {
                if now < entry.refresh_after {
                    return Ok(entry.token.clone());
                }
            }
        }

        let jwt = self.sign_assertion()?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.base_api, installation_id
        );

        info!(installation_id, "requesting new installation access token");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(jwt)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let snippet = text.chars().take(240).collect::<String>();
            return Err(CredentialError::Exchange {
                status: status.as_u16(),
                snippet,
            });
        }

        let body: InstallationTokenResponse = resp
            .json()
            .await
            .map_err(|e| CredentialError::InvalidResponse(e.to_string()))?;

        let expires_at = DateTime::parse_from_rfc3339(&body.expires_at)
            .map_err(|e| CredentialError::InvalidResponse(format!("bad expires_at: {e}")))?
            .with_timezone(&Utc);
        let expires_at_system =
            UNIX_EPOCH + Duration::from_secs(expires_at.timestamp().max(0) as u64);
        let refresh_after = expires_at_system
            .checked_sub(REFRESH_MARGIN)
            .unwrap_or(UNIX_EPOCH);

        {
            let mut cache = self.cache.write().await;
            cache.insert(
                installation_id,
                CachedToken {
                    token: body.token.clone(),
                    refresh_after,
                },
            );
        }

        debug!(installation_id, "installation token cached");
        Ok(body.token)
    }

    /// Builds the signed app assertion used for the exchange.
    fn sign_assertion(&self) -> Result<String, CredentialError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let claims = AppClaims {
            iss: self.app_id.clone(),
            iat: now.saturating_sub(IAT_BACKDATE_SECS),
            exp: now + ASSERTION_TTL_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.private_key_pem.as_bytes())
            .map_err(CredentialError::BadKey)?;
        encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(CredentialError::Jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_margin_marks_token_stale_before_expiry() {
        let expires = SystemTime::now() + Duration::from_secs(3600);
        let entry = CachedToken {
            token: "t".into(),
            refresh_after: expires.checked_sub(REFRESH_MARGIN).unwrap(),
        };
        // Fresh right now...
        assert!(SystemTime::now() < entry.refresh_after);
        // ...but stale once within ten minutes of expiry.
        let nine_minutes_left = expires.checked_sub(Duration::from_secs(9 * 60)).unwrap();
        assert!(nine_minutes_left >= entry.refresh_after);
    }
}
