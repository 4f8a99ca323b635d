//! HTTP client for the backend's auth endpoints
//!
//! Exchanges a federated credential for a cookie session
//! (`POST /api/auth/login`), hydrates from an existing session
//! (`GET /api/auth/me`), and terminates sessions (`POST /api/auth/logout`).
//! Shares its `reqwest::Client` (and therefore its cookie jar) with the
//! request gateway so the session cookie rides on every later call.

use serde::Deserialize;

use crate::error::AuthError;
use crate::types::UserProfile;

/// Client for `/api/auth/*` on the LabLink backend.
#[derive(Clone)]
pub struct AuthBackend {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    user: UserProfile,
}

impl AuthBackend {
    /// Create a new auth backend client.
    ///
    /// `http` should have its cookie store enabled and be the same client
    /// the gateway uses.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange a raw ID token for a server-side session.
    ///
    /// On success the backend sets a session cookie on the shared jar and
    /// returns the server-asserted profile.
    pub async fn login(&self, id_token: &str) -> Result<UserProfile, AuthError> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "id_token": id_token }))
            .send()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read response body".to_string());
            return Err(AuthError::Exchange(format!(
                "login returned {}: {}",
                status, body
            )));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Exchange(format!("failed to parse login response: {e}")))?;

        tracing::debug!(email = %body.user.email, "Credential exchange succeeded");
        Ok(body.user)
    }

    /// Ask the backend who the ambient credentials belong to.
    ///
    /// Sends the stored bearer token when one exists; otherwise relies on
    /// the cookie jar. `NotSignedIn` is the expected answer for anonymous
    /// visitors.
    pub async fn me(&self, bearer: Option<&str>) -> Result<UserProfile, AuthError> {
        let mut request = self.http.get(self.url("/api/auth/me"));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AuthError::NotSignedIn);
        }
        if !status.is_success() {
            return Err(AuthError::Exchange(format!("me returned {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Exchange(format!("failed to parse session profile: {e}")))
    }

    /// Terminate the server-side session.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.url("/api/auth/logout"))
            .send()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Exchange(format!(
                "logout returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
