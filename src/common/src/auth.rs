//! Bearer-token session management.
//!
//! `AuthSession` is owned exclusively by `ExchangeClient` and mutated only
//! by `require_authenticated`. The controller is single-threaded, so no
//! locking is required; a parallelised caller would need to guard this
//! behind a mutex and keep the staleness check atomic with the login.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::credentials::Credentials;
use crate::error::Error;

const REAUTHENTICATE_AFTER: Duration = Duration::hours(5);

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user_id: String,
}

/// Holds exchange credentials and the current bearer token, refreshing it
/// on a 5-hour time budget.
pub struct AuthSession {
    host: &'static str,
    credentials: Credentials,
    token: String,
    user_id: String,
    last_login_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    pub fn new(host: &'static str, credentials: Credentials) -> Self {
        Self {
            host,
            credentials,
            token: String::new(),
            user_id: String::new(),
            last_login_at: None,
        }
    }

    pub fn advanced_api(&self) -> bool {
        self.credentials.advanced_api
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.last_login_at {
            None => true,
            Some(last) => now - last > REAUTHENTICATE_AFTER,
        }
    }

    /// Ensure a valid bearer token is present, logging in if unset or
    /// stale by more than 5 hours.
    pub async fn require_authenticated(&mut self, client: &Client) -> Result<(), Error> {
        self.require_authenticated_at(client, Utc::now()).await
    }

    async fn require_authenticated_at(
        &mut self,
        client: &Client,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        if !self.is_stale(now) {
            return Ok(());
        }

        let response = client
            .post(format!("{}/v1/log_in", self.host))
            .json(&serde_json::json!({
                "email": self.credentials.email,
                "password": self.credentials.password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let reason = response
                .status()
                .canonical_reason()
                .unwrap_or("unknown")
                .to_string();
            warn!(status, "login failed");
            return Err(Error::transport(status, reason));
        }

        let body: LoginResponse = response.json().await?;
        self.token = body.token;
        self.user_id = body.user_id;
        self.last_login_at = Some(now);
        info!(user_id = %self.user_id, "authenticated");
        Ok(())
    }

    /// `Authorization: "<user_id> <token>"`, per the exchange's wire
    /// contract.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.user_id, self.token)
    }
}
