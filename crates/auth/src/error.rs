//! Authentication errors

/// Errors raised by the session core
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Credential could not be decoded into claims
    #[error("Malformed credential")]
    MalformedCredential,

    /// Claimed email/hosted domain failed the allow-list policy
    #[error("Email domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Identity provider widget unavailable or prompt dismissed
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// Bounded wait for a silent credential prompt elapsed
    #[error("Credential prompt timed out")]
    PromptTimeout,

    /// Backend refused or failed the credential-for-session exchange
    #[error("Session exchange failed: {0}")]
    Exchange(String),

    /// Backend reports no current session (expected for anonymous visitors)
    #[error("Not signed in")]
    NotSignedIn,
}
