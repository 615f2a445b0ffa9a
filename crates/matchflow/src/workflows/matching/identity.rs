use serde::{Deserialize, Serialize};

use super::domain::Actor;

/// Opaque bearer credential presented by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessToken(pub String);

impl AccessToken {
    /// Parse an `Authorization` header value of the form `Bearer <token>`.
    pub fn from_bearer(header: &str) -> Option<Self> {
        let (scheme, token) = header.trim().split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty())
            .then(|| Self(token.to_string()))
    }
}

/// Resolves credentials to actors. Injected so that no code path can skip authorization.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &AccessToken) -> Result<Actor, IdentityError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("unknown or expired credential")]
    UnknownToken,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}
