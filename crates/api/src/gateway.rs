//! Resilient request gateway
//!
//! Every API call goes through here. The gateway attaches the stored
//! bearer credential (or rides the shared cookie jar), and on a 401
//! recovers with a strictly bounded sequence: re-exchange the stored
//! credential and retry once; then acquire one fresh credential from the
//! identity bridge within a timeout, exchange it, and retry once more;
//! then clear credentials and surface `SignInRequired` with the intended
//! destination. Non-401 failures pass through untouched.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use lablink_auth::{
    AuthBackend, CredentialStore, ProviderBridge, SessionHandle, StoredCredential, UserProfile,
};
use lablink_common::{Error, Result};

pub struct RequestGateway {
    http: reqwest::Client,
    base_url: String,
    store: Arc<CredentialStore>,
    backend: AuthBackend,
    bridge: Arc<ProviderBridge>,
    session: SessionHandle,
    prompt_timeout: Duration,
}

impl RequestGateway {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        store: Arc<CredentialStore>,
        backend: AuthBackend,
        bridge: Arc<ProviderBridge>,
        session: SessionHandle,
        prompt_timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            backend,
            bridge,
            session,
            prompt_timeout,
        }
    }

    /// GET `path` and deserialize the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(Method::GET, path, None).await?;
        response
            .json()
            .await
            .map_err(|e| Error::Request(format!("failed to parse response: {e}")))
    }

    /// POST `body` as JSON to `path` and deserialize the JSON response.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::POST, path, Some(body)).await?;
        response
            .json()
            .await
            .map_err(|e| Error::Request(format!("failed to parse response: {e}")))
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let path = normalize_path(path);
        let url = format!("{}{}", self.base_url, path);

        let response = self.send_once(&method, &url, body.as_ref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return finish(response).await;
        }

        tracing::debug!(%path, "Received 401, attempting session recovery");

        // Stage 1: re-exchange the stored credential, retry once.
        if let Some(token) = self.store.token() {
            if self.refresh_session(&token).await {
                let retry = self.send_once(&method, &url, body.as_ref()).await?;
                if retry.status() != StatusCode::UNAUTHORIZED {
                    return finish(retry).await;
                }
            }
        }

        // Stage 2: one fresh credential from the provider, bounded wait,
        // retry once more.
        match self.bridge.acquire_with_timeout(self.prompt_timeout).await {
            Ok(raw) => {
                let profile = lablink_auth::decode_id_token(&raw).map(UserProfile::from);
                self.store.set(StoredCredential {
                    id_token: raw.clone(),
                    profile,
                });
                if self.refresh_session(&raw).await {
                    let retry = self.send_once(&method, &url, body.as_ref()).await?;
                    if retry.status() != StatusCode::UNAUTHORIZED {
                        return finish(retry).await;
                    }
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "Fresh credential unavailable");
            }
        }

        // Recovery exhausted: sign out locally, drop credentials, and
        // hand the caller the intended destination for the post-sign-in
        // redirect.
        tracing::warn!(%path, "Session recovery exhausted, sign-in required");
        self.session.force_signed_out();
        self.store.clear();
        Err(Error::SignInRequired { return_to: path })
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let mut request = self.http.request(method.clone(), url);
        if let Some(token) = self.store.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))
    }

    /// Exchange `token` for a fresh server session, updating the stored
    /// record with the server-asserted profile on success.
    async fn refresh_session(&self, token: &str) -> bool {
        match self.backend.login(token).await {
            Ok(profile) => {
                self.store.set(StoredCredential {
                    id_token: token.to_string(),
                    profile: Some(profile),
                });
                true
            }
            Err(err) => {
                tracing::debug!(error = %err, "Session refresh failed");
                false
            }
        }
    }
}

async fn finish(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read error body".to_string());
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

/// Collapse accidental doubled leading slashes and ensure a single one.
/// Cosmetic correctness applied before every request.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    format!("/{trimmed}")
}
