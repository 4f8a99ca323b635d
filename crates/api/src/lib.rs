//! LabLink backend API client
//!
//! Wires the session core to a resilient HTTP gateway and exposes typed
//! endpoint methods for professors, departments, matching, and email.

mod client;
mod gateway;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use lablink_auth::{
    AuthBackend, BridgeConfig, CredentialSource, CredentialStore, ProviderBridge,
    SessionSynchronizer,
};
use lablink_common::{Config, Error, Result};

pub use client::ApiClient;
pub use gateway::RequestGateway;

/// The fully wired client stack.
pub struct LabLinkClient {
    /// Stateful session core; call [`SessionSynchronizer::start`] to begin
    /// bootstrap hydration and credential intake.
    pub session: SessionSynchronizer,
    /// Typed endpoint surface
    pub api: ApiClient,
    /// Identity provider bridge; widget callbacks feed
    /// [`ProviderBridge::handle_credential`]
    pub bridge: Arc<ProviderBridge>,
}

/// Build the client stack from configuration: one HTTP client with a
/// shared cookie jar, the credential store, the identity bridge over
/// `source`, the session synchronizer, and the typed API client.
pub fn build(config: &Config, source: Arc<dyn CredentialSource>) -> Result<LabLinkClient> {
    let http = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

    let store = Arc::new(CredentialStore::new(config.credential_file.clone()));
    let bridge = Arc::new(ProviderBridge::new(
        BridgeConfig {
            client_id: config.google_client_id.clone(),
            allowed_domains: config.allowed_domains.clone(),
        },
        source,
    ));
    let backend = AuthBackend::new(http.clone(), &config.api_base);
    let prompt_timeout = Duration::from_secs(config.prompt_timeout_secs);

    let session = SessionSynchronizer::new(
        backend.clone(),
        store.clone(),
        bridge.clone(),
        prompt_timeout,
    );
    let gateway = RequestGateway::new(
        http,
        &config.api_base,
        store,
        backend,
        bridge.clone(),
        session.handle(),
        prompt_timeout,
    );

    Ok(LabLinkClient {
        session,
        api: ApiClient::new(gateway),
        bridge,
    })
}
