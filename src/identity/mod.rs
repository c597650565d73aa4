//! Identity verification for inbound requests.
//!
//! Token verification itself is an external collaborator: this module only
//! defines the port that yields a verified user identifier, plus a static
//! token-map adapter used by tests. Every other module trusts the verified
//! [`UserId`] exclusively and never an identifier carried in a request body.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Verified identifier of an authenticated user.
///
/// # Examples
///
/// ```
/// use factotum::identity::UserId;
///
/// let id = UserId::new();
/// assert!(!id.as_ref().is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for UserId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors returned when a credential cannot be verified.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthenticationError {
    /// No credential was supplied with the request.
    #[error("missing credential")]
    MissingCredential,

    /// The supplied credential is invalid or expired.
    #[error("invalid or expired credential")]
    InvalidCredential,
}

/// Port for credential verification.
///
/// Implementations map an opaque credential (bearer token, signed cookie)
/// onto a verified [`UserId`] or reject the request before any store access.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies a credential and returns the user it identifies.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when the credential is missing,
    /// malformed, or does not identify a known user.
    async fn verify(&self, credential: &str) -> Result<UserId, AuthenticationError>;
}

/// Static token-map verifier for tests and local development.
///
/// Stands in for the production token validator: each registered token maps
/// directly to a user identifier.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenVerifier {
    /// Creates a verifier with no registered tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for the given user.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, user_id: UserId) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, credential: &str) -> Result<UserId, AuthenticationError> {
        if credential.trim().is_empty() {
            return Err(AuthenticationError::MissingCredential);
        }
        self.tokens
            .get(credential)
            .copied()
            .ok_or(AuthenticationError::InvalidCredential)
    }
}
