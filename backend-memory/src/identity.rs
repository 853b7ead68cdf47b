//! In-memory `IdentityProvider` with a registered-user map and a single
//! current-session slot, matching the one-client shape of the hosted
//! provider.

use async_trait::async_trait;
use backend_traits::auth::{Identity, IdentityProvider, Session};
use backend_traits::error::{BackendError, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

struct Account {
    password: String,
    identity: Identity,
}

#[derive(Default)]
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    session: RwLock<Option<Session>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(BackendError::Conflict(format!(
                "account already exists: {email}"
            )));
        }
        accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity: Identity {
                    id: Uuid::new_v4().to_string(),
                    email: email.to_string(),
                    display_name: Some(display_name.to_string()),
                },
            },
        );
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(email)
            .filter(|account| account.password == password)
            .ok_or_else(|| BackendError::OperationFailed("invalid login credentials".into()))?;

        let session = Session {
            identity: account.identity.clone(),
        };
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        *self.session.write().await = None;
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = MemoryIdentityProvider::new();
        provider
            .sign_up("ana@example.com", "secret", "Ana")
            .await
            .unwrap();

        let session = provider.sign_in("ana@example.com", "secret").await.unwrap();
        assert_eq!(session.identity.email, "ana@example.com");
        assert_eq!(session.identity.display_name.as_deref(), Some("Ana"));

        let current = provider.current_session().await.unwrap();
        assert_eq!(current, Some(session));
    }

    #[tokio::test]
    async fn test_sign_in_rejects_bad_password() {
        let provider = MemoryIdentityProvider::new();
        provider
            .sign_up("ana@example.com", "secret", "Ana")
            .await
            .unwrap();
        assert!(provider.sign_in("ana@example.com", "wrong").await.is_err());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let provider = MemoryIdentityProvider::new();
        provider
            .sign_up("ana@example.com", "secret", "Ana")
            .await
            .unwrap();
        provider.sign_in("ana@example.com", "secret").await.unwrap();
        provider.sign_out().await.unwrap();
        assert!(provider.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_conflicts() {
        let provider = MemoryIdentityProvider::new();
        provider
            .sign_up("ana@example.com", "secret", "Ana")
            .await
            .unwrap();
        let err = provider
            .sign_up("ana@example.com", "other", "Ana")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Conflict(_)));
    }
}
