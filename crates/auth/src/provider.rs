//! Identity provider bridge
//!
//! Wraps the third-party federated sign-in widget behind a trait so the
//! session core never talks to the widget directly. The bridge normalizes
//! raw widget callbacks into an internal credential broadcast and enforces
//! the institutional domain allow-list before anything is accepted.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::claims::IdClaims;
use crate::error::AuthError;
use crate::token::decode_id_token;

/// Seam to the federated sign-in widget.
///
/// Real implementations forward to the embedding shell's widget bindings;
/// tests use [`MockCredentialSource`].
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// Ask the provider for one fresh raw credential, silently where
    /// possible. Resolves once or fails; callers bound the wait.
    async fn request_credential(&self) -> Result<String, AuthError>;

    /// Prevent automatic account re-selection on the next prompt.
    async fn disable_auto_select(&self);

    /// Revoke the provider grant for a specific account.
    async fn revoke(&self, email: &str);
}

/// Commands a [`ChannelCredentialSource`] forwards to the embedding shell.
#[derive(Debug)]
pub enum ProviderCommand {
    /// Ask the widget for one fresh credential. Resolve the sender with
    /// the raw token, or drop it to signal a dismissed prompt.
    Prompt(oneshot::Sender<String>),
    DisableAutoSelect,
    Revoke(String),
}

/// Credential source backed by a command channel.
///
/// Each prompt is a single explicit resolve/reject exchange instead of a
/// polled shared variable: the shell drains [`ProviderCommand`]s, drives
/// the widget, and resolves the prompt's sender.
pub struct ChannelCredentialSource {
    commands: mpsc::UnboundedSender<ProviderCommand>,
}

impl ChannelCredentialSource {
    /// Create a source plus the receiver the embedding shell drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProviderCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { commands: tx }, rx)
    }
}

#[async_trait::async_trait]
impl CredentialSource for ChannelCredentialSource {
    async fn request_credential(&self) -> Result<String, AuthError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(ProviderCommand::Prompt(tx))
            .map_err(|_| AuthError::Provider("widget channel closed".to_string()))?;
        rx.await
            .map_err(|_| AuthError::Provider("credential prompt dismissed".to_string()))
    }

    async fn disable_auto_select(&self) {
        let _ = self.commands.send(ProviderCommand::DisableAutoSelect);
    }

    async fn revoke(&self, email: &str) {
        let _ = self
            .commands
            .send(ProviderCommand::Revoke(email.to_string()));
    }
}

/// Scripted behavior for one mock prompt.
#[derive(Debug)]
pub enum ScriptedPrompt {
    /// Resolve with this raw credential
    Credential(String),
    /// Fail with a provider error
    Unavailable,
    /// Never resolve (exercises bounded waits)
    Hang,
}

/// Mock credential source that replays scripted prompts and records
/// revocations for test assertions. Thread-safe via `Arc<Mutex<>>`.
#[derive(Clone, Default)]
pub struct MockCredentialSource {
    prompts: Arc<Mutex<VecDeque<ScriptedPrompt>>>,
    revoked: Arc<Mutex<Vec<String>>>,
    auto_select_disabled: Arc<Mutex<usize>>,
}

impl MockCredentialSource {
    /// Create a mock with no scripted prompts; requests fail until one
    /// is scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a scripted prompt outcome.
    pub fn script(&self, prompt: ScriptedPrompt) {
        self.lock_prompts().push_back(prompt);
    }

    /// Emails revoked so far.
    pub fn revoked_emails(&self) -> Vec<String> {
        self.revoked
            .lock()
            .expect("revoked lock poisoned")
            .clone()
    }

    /// How many times auto-selection was disabled.
    pub fn auto_select_disabled_count(&self) -> usize {
        *self
            .auto_select_disabled
            .lock()
            .expect("auto-select lock poisoned")
    }

    fn lock_prompts(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedPrompt>> {
        self.prompts
            .lock()
            .expect("prompts lock poisoned")
    }
}

#[async_trait::async_trait]
impl CredentialSource for MockCredentialSource {
    async fn request_credential(&self) -> Result<String, AuthError> {
        let next = self.lock_prompts().pop_front();
        match next {
            Some(ScriptedPrompt::Credential(raw)) => Ok(raw),
            Some(ScriptedPrompt::Unavailable) | None => {
                Err(AuthError::Provider("widget not loaded".to_string()))
            }
            Some(ScriptedPrompt::Hang) => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
        }
    }

    async fn disable_auto_select(&self) {
        *self
            .auto_select_disabled
            .lock()
            .expect("auto-select lock poisoned") += 1;
    }

    async fn revoke(&self, email: &str) {
        self.revoked
            .lock()
            .expect("revoked lock poisoned")
            .push(email.to_string());
    }
}

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// OAuth client identifier; `None` leaves the bridge inert
    pub client_id: Option<String>,
    /// Email domains accepted at sign-in (lowercase)
    pub allowed_domains: Vec<String>,
}

/// Normalizes widget callbacks into credential broadcasts and enforces
/// the domain allow-list.
pub struct ProviderBridge {
    config: BridgeConfig,
    source: Arc<dyn CredentialSource>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<String>>>,
}

impl ProviderBridge {
    pub fn new(config: BridgeConfig, source: Arc<dyn CredentialSource>) -> Self {
        Self {
            config,
            source,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Whether the bridge is configured with a client identifier. An
    /// inert bridge accepts nothing and never errors.
    pub fn is_active(&self) -> bool {
        self.config.client_id.is_some()
    }

    /// Receive accepted raw credentials as they arrive from the widget.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_subscribers().push(tx);
        rx
    }

    /// Handle a raw credential from the widget callback.
    ///
    /// Decodes it, enforces the allow-list, and on acceptance broadcasts
    /// only the raw credential; decoding is repeated downstream so the
    /// bridge stays decoupled from session logic. Rejected credentials
    /// are discarded without persisting or broadcasting anything.
    pub fn handle_credential(&self, raw: &str) -> Result<(), AuthError> {
        if !self.is_active() {
            tracing::debug!("Identity bridge inert (no client id), dropping credential");
            return Ok(());
        }

        let claims = decode_id_token(raw).ok_or(AuthError::MalformedCredential)?;
        self.check_policy(&claims)?;

        tracing::debug!(email = %claims.email, "Credential accepted, broadcasting");
        self.broadcast(raw);
        Ok(())
    }

    /// Obtain one fresh credential from the widget within `timeout`,
    /// subject to the same policy as callback credentials. Used for
    /// silent renewal and gateway recovery; the result is returned to the
    /// caller rather than broadcast.
    pub async fn acquire_with_timeout(&self, timeout: Duration) -> Result<String, AuthError> {
        if !self.is_active() {
            return Err(AuthError::Provider("no client id configured".to_string()));
        }

        let raw = tokio::time::timeout(timeout, self.source.request_credential())
            .await
            .map_err(|_| AuthError::PromptTimeout)??;

        let claims = decode_id_token(&raw).ok_or(AuthError::MalformedCredential)?;
        self.check_policy(&claims)?;
        Ok(raw)
    }

    /// Forward auto-select disabling to the provider.
    pub async fn disable_auto_select(&self) {
        self.source.disable_auto_select().await;
    }

    /// Forward grant revocation to the provider.
    pub async fn revoke(&self, email: &str) {
        self.source.revoke(email).await;
    }

    /// Accept if either the email's domain or the hosted-domain claim is
    /// on the allow-list (case-insensitive).
    fn check_policy(&self, claims: &IdClaims) -> Result<(), AuthError> {
        let email_domain = claims.email_domain();
        let hosted_domain = claims.hd.as_deref().map(str::to_ascii_lowercase);

        let allowed = self.config.allowed_domains.iter().any(|allowed| {
            email_domain.as_deref() == Some(allowed.as_str())
                || hosted_domain.as_deref() == Some(allowed.as_str())
        });
        if allowed {
            return Ok(());
        }

        let rejected = email_domain
            .or(hosted_domain)
            .unwrap_or_else(|| "unknown".to_string());
        tracing::warn!(domain = %rejected, "Credential rejected by domain policy");
        Err(AuthError::DomainNotAllowed(rejected))
    }

    fn broadcast(&self, raw: &str) {
        // Prune subscribers whose receiving side is gone.
        self.lock_subscribers()
            .retain(|tx| tx.send(raw.to_string()).is_ok());
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<String>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}
