//! Session synchronizer
//!
//! Owns sign-in/sign-out state: hydrates from an existing server session
//! on startup, exchanges bridge credentials for cookie sessions, schedules
//! silent renewal ahead of credential expiry, and clears everything on
//! sign-out. Constructed per instance so tests get a fresh one; all
//! spawned tasks are cancelled when the synchronizer is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::backend::AuthBackend;
use crate::provider::ProviderBridge;
use crate::store::{CredentialStore, StoredCredential};
use crate::token::decode_id_token;
use crate::types::UserProfile;

/// Never renew sooner than this
const MIN_RENEWAL_DELAY_SECS: i64 = 30;
/// Renew this far ahead of credential expiry
const RENEWAL_MARGIN_SECS: i64 = 300;

/// Delay before silently renewing a credential expiring at `exp`:
/// `max(30s, exp − now − 5min)`.
pub fn renewal_delay(exp: i64, now: i64) -> Duration {
    let secs = (exp - now - RENEWAL_MARGIN_SECS).max(MIN_RENEWAL_DELAY_SECS);
    Duration::from_secs(secs as u64)
}

/// Read-only view of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub signed_in: bool,
    pub profile: Option<UserProfile>,
    /// True when the profile comes from a locally decoded credential
    /// because the server exchange failed; weaker trust than a confirmed
    /// session.
    pub degraded: bool,
}

enum SessionState {
    SignedOut,
    /// Credential received, server exchange in flight
    Pending,
    SignedIn { profile: UserProfile, degraded: bool },
}

struct Inner {
    backend: AuthBackend,
    store: Arc<CredentialStore>,
    bridge: Arc<ProviderBridge>,
    prompt_timeout: Duration,
    state: Mutex<SessionState>,
    /// Set once an explicit credential intake (or sign-out) has resolved;
    /// passive hydration racing behind it must not override the result.
    intake_applied: AtomicBool,
    renewal: Mutex<Option<JoinHandle<()>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// The stateful session core.
pub struct SessionSynchronizer {
    inner: Arc<Inner>,
}

impl SessionSynchronizer {
    pub fn new(
        backend: AuthBackend,
        store: Arc<CredentialStore>,
        bridge: Arc<ProviderBridge>,
        prompt_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                store,
                bridge,
                prompt_timeout,
                state: Mutex::new(SessionState::SignedOut),
                intake_applied: AtomicBool::new(false),
                renewal: Mutex::new(None),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Kick off bootstrap hydration and start consuming credentials the
    /// bridge broadcasts. Call once after construction.
    pub fn start(&self) {
        let weak = Arc::downgrade(&self.inner);
        let bootstrap = tokio::spawn(async move {
            if let Some(inner) = weak.upgrade() {
                inner.hydrate().await;
            }
        });

        let mut credentials = self.inner.bridge.subscribe();
        let weak = Arc::downgrade(&self.inner);
        let intake = tokio::spawn(async move {
            while let Some(raw) = credentials.recv().await {
                let Some(inner) = weak.upgrade() else { break };
                inner.handle_credential(&raw).await;
            }
        });

        let mut tasks = self.inner.lock_tasks();
        tasks.push(bootstrap);
        tasks.push(intake);
    }

    /// Hydrate from an existing server session. Failure is the expected
    /// answer for anonymous visitors and changes nothing.
    pub async fn hydrate(&self) {
        self.inner.hydrate().await;
    }

    /// Feed one raw credential through intake, bypassing the bridge
    /// broadcast. The bridge's policy must already have accepted it.
    pub async fn handle_credential(&self, raw: &str) {
        self.inner.handle_credential(raw).await;
    }

    /// Handle for collaborators (the request gateway) that may need to
    /// force a local sign-out.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.snapshot().signed_in
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.snapshot().profile
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match &*self.inner.lock_state() {
            SessionState::SignedIn { profile, degraded } => SessionSnapshot {
                signed_in: true,
                profile: Some(profile.clone()),
                degraded: *degraded,
            },
            SessionState::SignedOut | SessionState::Pending => SessionSnapshot {
                signed_in: false,
                profile: None,
                degraded: false,
            },
        }
    }

    /// Sign out immediately and irreversibly: local state and persisted
    /// credentials are cleared synchronously, then the backend session is
    /// terminated and the provider grant revoked in the background.
    /// Network failures never revert the local sign-out.
    pub fn sign_out(&self) {
        let email = match &*self.inner.lock_state() {
            SessionState::SignedIn { profile, .. } => Some(profile.email.clone()),
            _ => None,
        };

        self.inner.store.clear();
        *self.inner.lock_state() = SessionState::SignedOut;
        // Explicit user action outranks any hydration still in flight.
        self.inner.intake_applied.store(true, Ordering::SeqCst);
        self.inner.cancel_renewal();

        tracing::info!("Signed out");

        let inner = self.inner.clone();
        let cleanup = tokio::spawn(async move {
            if let Err(err) = inner.backend.logout().await {
                tracing::warn!(error = %err, "Backend logout failed; local sign-out stands");
            }
            inner.bridge.disable_auto_select().await;
            if let Some(email) = email {
                inner.bridge.revoke(&email).await;
            }
        });
        self.inner.lock_tasks().push(cleanup);
    }
}

/// Cloneable handle for collaborators that need to force a local
/// sign-out without owning the synchronizer.
#[derive(Clone)]
pub struct SessionHandle {
    inner: std::sync::Weak<Inner>,
}

impl SessionHandle {
    /// Drop to `signed-out` locally and clear persisted credentials.
    /// Used when credential recovery is exhausted; backend and provider
    /// cleanup stay with the caller.
    pub fn force_signed_out(&self) {
        let Some(inner) = self.inner.upgrade() else { return };
        inner.store.clear();
        *inner.lock_state() = SessionState::SignedOut;
        inner.intake_applied.store(true, Ordering::SeqCst);
        inner.cancel_renewal();
    }
}

impl Drop for SessionSynchronizer {
    fn drop(&mut self) {
        self.inner.cancel_renewal();
        for task in self.inner.lock_tasks().drain(..) {
            task.abort();
        }
    }
}

impl Inner {
    async fn hydrate(self: &Arc<Self>) {
        let bearer = self.store.token();
        match self.backend.me(bearer.as_deref()).await {
            Ok(profile) => {
                // Checked while holding the state lock: intake sets the
                // flag before it takes this lock to write its result, so
                // a racing intake either already won here or will
                // overwrite after we release.
                let mut state = self.lock_state();
                if self.intake_applied.load(Ordering::SeqCst) {
                    tracing::debug!("Hydration superseded by explicit sign-in");
                    return;
                }
                tracing::info!(email = %profile.email, "Hydrated existing session");
                *state = SessionState::SignedIn {
                    profile,
                    degraded: false,
                };
                if let Some(exp) = bearer.as_deref().and_then(|t| decode_id_token(t)?.exp) {
                    self.schedule_renewal(exp);
                }
            }
            Err(err) => {
                // Anonymous visitors land here; never an error for the user.
                tracing::debug!(error = %err, "No existing session");
            }
        }
    }

    async fn handle_credential(self: &Arc<Self>, raw: &str) {
        let claims = decode_id_token(raw);

        {
            let mut state = self.lock_state();
            if matches!(*state, SessionState::SignedOut) {
                *state = SessionState::Pending;
            }
        }

        match self.backend.login(raw).await {
            Ok(profile) => {
                // Server-asserted claims win over the local decode.
                self.intake_applied.store(true, Ordering::SeqCst);
                self.store.set(StoredCredential {
                    id_token: raw.to_string(),
                    profile: Some(profile.clone()),
                });
                tracing::info!(email = %profile.email, "Signed in (server session)");
                *self.lock_state() = SessionState::SignedIn {
                    profile,
                    degraded: false,
                };
            }
            Err(err) => match claims.clone() {
                Some(claims) => {
                    // Availability fallback: adopt the unverified local
                    // decode, flagged as degraded rather than trusted.
                    tracing::warn!(error = %err, "Exchange failed, adopting locally decoded profile");
                    self.intake_applied.store(true, Ordering::SeqCst);
                    let profile = UserProfile::from(claims);
                    self.store.set(StoredCredential {
                        id_token: raw.to_string(),
                        profile: Some(profile.clone()),
                    });
                    *self.lock_state() = SessionState::SignedIn {
                        profile,
                        degraded: true,
                    };
                }
                None => {
                    tracing::warn!(error = %err, "Exchange failed and credential is undecodable");
                    *self.lock_state() = SessionState::SignedOut;
                }
            },
        }

        if let Some(exp) = claims.and_then(|c| c.exp) {
            self.schedule_renewal(exp);
        }
    }

    /// (Re)schedule the single silent-renewal timer for a credential
    /// expiring at `exp`. A new credential supersedes any pending timer.
    fn schedule_renewal(self: &Arc<Self>, exp: i64) {
        let delay = renewal_delay(exp, Utc::now().timestamp());
        tracing::debug!(delay_secs = delay.as_secs(), "Scheduling silent renewal");

        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else { return };
            match inner
                .bridge
                .acquire_with_timeout(inner.prompt_timeout)
                .await
            {
                Ok(raw) => inner.handle_credential(&raw).await,
                Err(err) => {
                    tracing::warn!(error = %err, "Silent renewal failed; keeping current session")
                }
            }
        });

        if let Some(previous) = self.lock_renewal().replace(handle) {
            previous.abort();
        }
    }

    fn cancel_renewal(&self) {
        if let Some(handle) = self.lock_renewal().take() {
            handle.abort();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_renewal(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.renewal.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
