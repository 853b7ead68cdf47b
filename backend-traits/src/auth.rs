//! Identity Provider Abstraction
//!
//! Contract for the hosted identity service. The provider owns credentials
//! and sessions; this core only consumes the opaque session it hands out and
//! derives its own view of the signed-in user from it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The authenticated identity as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identifier shared with the profile row.
    pub id: String,
    pub email: String,
    /// Display name captured at sign-up, if any.
    pub display_name: Option<String>,
}

/// An active session. Opaque to this core beyond the identity it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
}

/// Credential and session operations on the hosted identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account.
    ///
    /// # Errors
    /// - `BackendError::Conflict` if the email is already registered
    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<()>;

    /// Authenticate and establish a session.
    ///
    /// # Errors
    /// - `BackendError::OperationFailed` for invalid credentials
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Tear down the current session, if any.
    async fn sign_out(&self) -> Result<()>;

    /// The currently active session, or `None` when signed out.
    async fn current_session(&self) -> Result<Option<Session>>;
}
