//! ID-token claims types

use serde::{Deserialize, Serialize};

/// Claims read from a Google ID token payload.
///
/// Decoded purely for display convenience; the signature is never checked
/// client-side. Every security-relevant decision happens server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdClaims {
    /// Email address asserted by the provider
    #[serde(default)]
    pub email: String,
    /// Display name
    pub name: Option<String>,
    /// Avatar URL
    pub picture: Option<String>,
    /// Hosted domain (Google Workspace accounts)
    pub hd: Option<String>,
    /// Expiry, seconds since epoch
    pub exp: Option<i64>,
}

impl IdClaims {
    /// Domain portion of the claimed email, lowercased
    pub fn email_domain(&self) -> Option<String> {
        self.email
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_ascii_lowercase())
            .filter(|domain| !domain.is_empty())
    }
}
