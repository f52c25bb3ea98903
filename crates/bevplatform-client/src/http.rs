//! HTTP client for the case-management REST API.

use std::sync::Arc;

use bevplatform_store::{SessionStore, Store};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{self, ApiError};

/// Query parameters for list endpoints.
pub type Query<'a> = &'a [(&'a str, String)];

/// REST client bound to one server, one state store and one session.
///
/// Every authenticated request carries the session's access token as a bearer
/// token, raises the store's loading counter while in flight, and reports
/// failures to the store as notifications before returning them.
pub struct ApiClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: ClientConfig,
    pub(crate) store: Arc<Store>,
    pub(crate) session: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        store: Arc<Store>,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            config,
            store,
            session,
        })
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ── Verbs ──

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> Result<T, ApiError> {
        self.request(Method::GET, path, query, None, true).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.reported(serde_json::to_value(body).map_err(ApiError::from))?;
        self.store.clear_field_errors();
        self.request(Method::POST, path, &[], Some(body), true).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.reported(serde_json::to_value(body).map_err(ApiError::from))?;
        self.store.clear_field_errors();
        self.request(Method::PATCH, path, &[], Some(body), true).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, path, &[], None, true).await?;
        Ok(())
    }

    // ── Plumbing ──

    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<Value>,
        authenticated: bool,
    ) -> Result<T, ApiError> {
        let bytes = self.send(method, path, query, body, authenticated).await?;
        self.reported(serde_json::from_slice(&bytes).map_err(ApiError::from))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<Value>,
        authenticated: bool,
    ) -> Result<Vec<u8>, ApiError> {
        let result = self
            .try_send(method, path, query, body, authenticated)
            .await;
        self.reported(result)
    }

    async fn try_send(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<Value>,
        authenticated: bool,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.config.api_url(path);
        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }
        if authenticated {
            let tokens = self
                .session
                .load()
                .await?
                .ok_or(ApiError::NotAuthenticated)?;
            request = request.bearer_auth(&tokens.access);
        }

        let _loading = self.store.begin_request();
        debug!(method = %method, url = %url, "sending request");
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    /// Pass `result` through, reporting an error to the store on the way.
    pub(crate) fn reported<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(err) = &result {
            warn!(error = %err, "request failed");
            error::report(&self.store, err);
        }
        result
    }
}
