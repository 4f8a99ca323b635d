//! Session-scoped identity types

use serde::{Deserialize, Serialize};

use crate::claims::IdClaims;

/// The signed-in user's identity as exposed to consumers.
///
/// Derived either from the backend's session endpoint or, in degraded
/// mode, from a locally decoded credential. Consumers read it but never
/// mutate it; the session synchronizer owns the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl From<IdClaims> for UserProfile {
    fn from(claims: IdClaims) -> Self {
        Self {
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
        }
    }
}
