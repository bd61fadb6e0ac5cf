//! Session validation port for bearer tokens.
//!
//! Implementations must check signature, issuer, audience, and expiry
//! before trusting any claim.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts the caller.
///
/// # Contract
///
/// - `AuthError::InvalidToken` for malformed tokens or bad signatures
/// - `AuthError::TokenExpired` for expired tokens
/// - `AuthError::InvalidClaims` when the client group claim is missing or
///   ambiguous
/// - `AuthError::ServiceUnavailable` when the key set cannot be fetched
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// `token` is the raw JWT, without the `Bearer ` prefix.
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ClientId, UserId};
    use std::collections::HashMap;

    struct FixedTokens(HashMap<String, AuthenticatedUser>);

    #[async_trait]
    impl SessionValidator for FixedTokens {
        async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            self.0.get(token).cloned().ok_or(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn validator_resolves_known_token() {
        let user = AuthenticatedUser::new(UserId::new("alice").unwrap(), ClientId::new(), vec![]);
        let validator = FixedTokens(HashMap::from([("t-1".to_string(), user)]));

        assert_eq!(validator.validate("t-1").await.unwrap().username.as_str(), "alice");
        assert!(matches!(validator.validate("t-2").await, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn session_validator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn SessionValidator>();
    }
}
