//! Session/authentication synchronization core for the LabLink client
//!
//! Owns the full lifecycle of a user's identity: decoding federated ID
//! tokens, persisting credentials, enforcing the institutional domain
//! policy, exchanging credentials for cookie sessions, scheduling silent
//! renewal ahead of expiry, and signing out.

mod backend;
mod claims;
mod error;
mod provider;
mod session;
mod store;
mod token;
mod types;

pub use backend::AuthBackend;
pub use claims::IdClaims;
pub use error::AuthError;
pub use provider::{
    BridgeConfig, ChannelCredentialSource, CredentialSource, MockCredentialSource,
    ProviderBridge, ProviderCommand, ScriptedPrompt,
};
pub use session::{renewal_delay, SessionHandle, SessionSnapshot, SessionSynchronizer};
pub use store::{CredentialStore, StoredCredential};
pub use token::decode_id_token;
pub use types::UserProfile;
