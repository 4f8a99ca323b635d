//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default institutional email domain accepted at sign-in
pub const DEFAULT_ALLOWED_DOMAIN: &str = "ucdavis.edu";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the LabLink backend API
    pub api_base: String,

    /// Google OAuth client identifier; when absent the identity provider
    /// bridge is inert and only cookie sessions work
    pub google_client_id: Option<String>,

    /// Email domains accepted at sign-in (lowercase)
    pub allowed_domains: Vec<String>,

    /// File the credential store persists to; `None` keeps credentials
    /// in memory only
    pub credential_file: Option<PathBuf>,

    /// Bound on waiting for a silent credential prompt, in seconds
    pub prompt_timeout_secs: u64,

    /// Runtime configuration
    pub rust_log: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let api_base = env::var("LABLINK_API_BASE")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let google_client_id = env::var("GOOGLE_CLIENT_ID").ok().filter(|v| !v.is_empty());

        let allowed_domains = env::var("LABLINK_ALLOWED_DOMAINS")
            .map(|raw| parse_domains(&raw))
            .unwrap_or_default();
        let allowed_domains = if allowed_domains.is_empty() {
            vec![DEFAULT_ALLOWED_DOMAIN.to_string()]
        } else {
            allowed_domains
        };

        let credential_file = env::var("LABLINK_CREDENTIAL_FILE").ok().map(PathBuf::from);

        let prompt_timeout_secs = env::var("LABLINK_PROMPT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "lablink=debug".to_string());

        Ok(Self {
            api_base,
            google_client_id,
            allowed_domains,
            credential_file,
            prompt_timeout_secs,
            rust_log,
        })
    }
}

fn parse_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}
