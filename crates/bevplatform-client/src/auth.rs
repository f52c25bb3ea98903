//! Login, token refresh and logout.

use std::sync::Arc;

use bevplatform_core::User;
use bevplatform_store::Tokens;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::http::ApiClient;

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenPair {
    access: String,
    refresh: String,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct AccessToken {
    access: String,
}

impl ApiClient {
    /// Obtain a token pair, store it in the session and load the current user.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        info!(username, "logging in");
        let body = serde_json::to_value(Credentials { username, password })?;
        let pair: TokenPair = self
            .request(Method::POST, "token/", &[], Some(body), false)
            .await?;
        let tokens = Tokens {
            access: pair.access,
            refresh: pair.refresh,
            username: username.to_string(),
        };
        self.reported(self.session.save(&tokens).await.map_err(ApiError::from))?;
        self.select_current_user(username).await
    }

    /// Pick up a session saved earlier; `None` when nobody is logged in.
    ///
    /// The saved access token may have expired since it was written, so it is
    /// renewed from the refresh token before the user is loaded.
    pub async fn resume(&self) -> Result<Option<User>, ApiError> {
        let Some(tokens) = self.session.load().await? else {
            return Ok(None);
        };
        self.refresh().await?;
        self.select_current_user(&tokens.username).await.map(Some)
    }

    async fn select_current_user(&self, username: &str) -> Result<User, ApiError> {
        self.fetch_users().await?;
        let user = self.reported(
            self.store
                .user_by_username(username)
                .ok_or_else(|| ApiError::UnknownUser(username.to_string())),
        )?;
        info!(username, profile = ?user.profile, "logged in");
        self.store.user().set(user.clone());
        Ok(user)
    }

    /// Exchange the refresh token for a new access token.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let tokens = self.reported(
            self.session
                .load()
                .await
                .map_err(ApiError::from)
                .and_then(|t| t.ok_or(ApiError::NotAuthenticated)),
        )?;
        let body = serde_json::to_value(RefreshRequest {
            refresh: &tokens.refresh,
        })?;
        let fresh: AccessToken = self
            .request(Method::POST, "token/refresh/", &[], Some(body), false)
            .await?;
        self.reported(
            self.session
                .replace_access(fresh.access)
                .await
                .map_err(ApiError::from),
        )?;
        info!("access token refreshed");
        Ok(())
    }

    /// Refresh the access token on a fixed interval until a refresh fails,
    /// at which point the session is logged out.
    pub fn spawn_token_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let client = Arc::clone(self);
        let period = client.config.token_refresh_interval;
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if let Err(err) = client.refresh().await {
                    warn!(error = %err, "token refresh failed, logging out");
                    if let Err(err) = client.logout().await {
                        warn!(error = %err, "logout after failed refresh");
                    }
                    client
                        .store
                        .notify_error("Din session er udløbet. Log ind igen.");
                    break;
                }
            }
        })
    }

    /// Forget the tokens and every cached entity.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.session.clear().await?;
        self.store.reset();
        info!("logged out");
        Ok(())
    }
}
