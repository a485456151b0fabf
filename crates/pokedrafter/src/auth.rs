//! Authentication hook for validating user identity.
//!
//! Pokedrafter doesn't issue or check credentials itself. The server calls
//! an [`Authenticator`] during the handshake and trusts the [`UserId`] it
//! returns for the rest of the connection.

use std::collections::HashMap;

use pokedrafter_protocol::UserId;

use crate::AuthError;

/// Validates a client's auth token and returns their identity.
///
/// # Example
///
/// ```rust
/// use pokedrafter::{AuthError, Authenticator};
/// use pokedrafter_protocol::UserId;
///
/// /// Accepts any numeric token as the user id. Development only.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
///         let id: u64 = token
///             .parse()
///             .map_err(|_| AuthError("token must be a number".into()))?;
///         Ok(UserId(id))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates `token` and returns the user it belongs to.
    ///
    /// An empty string is passed when the handshake carried no token.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<UserId, AuthError>> + Send;
}

/// A fixed table of tokens, loaded up front.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    tokens: HashMap<String, UserId>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `token` for `user`, replacing any earlier owner of the token.
    pub fn with_token(mut self, token: impl Into<String>, user: UserId) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }
}

impl Authenticator for TokenTable {
    async fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        self.tokens
            .get(token)
            .copied()
            .ok_or_else(|| AuthError("unknown token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_table_resolves_known_tokens() {
        let auth = TokenTable::new()
            .with_token("ash", UserId(1))
            .with_token("misty", UserId(2));
        assert_eq!(auth.authenticate("misty").await.unwrap(), UserId(2));
    }

    #[tokio::test]
    async fn test_token_table_rejects_unknown_and_empty_tokens() {
        let auth = TokenTable::new().with_token("ash", UserId(1));
        assert!(auth.authenticate("brock").await.is_err());
        assert!(auth.authenticate("").await.is_err());
    }
}
