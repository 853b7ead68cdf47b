//! Two-phase session resolution.
//!
//! Phase one derives an optimistic [`AuthUser`] synchronously from the
//! provider session, so UI surfaces render without waiting on the store.
//! Phase two runs in the background: it heals the user's profile row and
//! confirms the admin flag against the grant table, then publishes the
//! refined view through the watch channel and emits `AdminConfirmed`.
//!
//! The optimistic admin guess is root-email-only; a granted admin briefly
//! renders as a regular user until confirmation lands. Admin-gated writes
//! are enforced server-side, so the stale window costs nothing but a
//! repaint.

use crate::error::{Result, SessionError};
use backend_traits::auth::{IdentityProvider, Session};
use backend_traits::{Filter, TableStore};
use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
use core_runtime::CoreConfig;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

const PROFILES: &str = "profiles";
const ADMINS: &str = "admins";

/// Shortest accepted username at sign-up.
pub const MIN_USERNAME_LEN: usize = 3;

/// The resolved view of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub username: String,
    /// Optimistic until `AdminConfirmed` is emitted for this user.
    pub is_admin: bool,
}

pub struct SessionResolver {
    tables: Arc<dyn TableStore>,
    identity: Arc<dyn IdentityProvider>,
    root_admin_email: String,
    events: EventBus,
    state: Arc<watch::Sender<Option<AuthUser>>>,
}

impl SessionResolver {
    pub fn new(
        tables: Arc<dyn TableStore>,
        identity: Arc<dyn IdentityProvider>,
        root_admin_email: impl Into<String>,
        events: EventBus,
    ) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            tables,
            identity,
            root_admin_email: root_admin_email.into(),
            events,
            state: Arc::new(state),
        }
    }

    pub fn from_config(config: &CoreConfig, events: EventBus) -> Self {
        Self::new(
            Arc::clone(&config.table_store),
            Arc::clone(&config.identity_provider),
            config.root_admin_email.clone(),
            events,
        )
    }

    /// The current resolved user, if signed in.
    pub fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().clone()
    }

    /// Watch the resolved-user view. The receiver sees both the optimistic
    /// and the confirmed value of each sign-in.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.state.subscribe()
    }

    /// Resolves a provider session into the user view.
    ///
    /// Publishes the optimistic view immediately and returns it; profile
    /// healing and admin confirmation continue in the background.
    pub fn resolve(&self, session: Option<&Session>) -> Option<AuthUser> {
        let Some(session) = session else {
            let _ = self.state.send(None);
            let _ = self.events.emit(CoreEvent::Session(SessionEvent::SignedOut));
            return None;
        };

        let optimistic = self.optimistic_user(session);

        let _ = self.state.send(Some(optimistic.clone()));
        let _ = self
            .events
            .emit(CoreEvent::Session(SessionEvent::SignedIn {
                user_id: optimistic.id.clone(),
                email: optimistic.email.clone(),
            }));

        let tables = Arc::clone(&self.tables);
        let root_admin = self.root_admin_email.clone();
        let events = self.events.clone();
        let state = Arc::clone(&self.state);
        let user = optimistic.clone();
        tokio::spawn(async move {
            confirm(tables, root_admin, events, state, user).await;
        });

        Some(optimistic)
    }

    /// Re-resolves from whatever session the provider currently holds.
    /// Intended for startup.
    pub async fn bootstrap(&self) -> Result<Option<AuthUser>> {
        let session = self.identity.current_session().await?;
        Ok(self.resolve(session.as_ref()))
    }

    /// Registers an account. The session is not established; the caller
    /// signs in separately.
    pub async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<()> {
        let username = username.trim();
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(SessionError::InvalidUsername(format!(
                "username must be at least {MIN_USERNAME_LEN} characters"
            )));
        }
        self.identity.sign_up(email, password, username).await?;
        Ok(())
    }

    /// Authenticates and resolves the resulting session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let session = self.identity.sign_in(email, password).await?;
        let user = self.optimistic_user(&session);
        self.resolve(Some(&session));
        Ok(user)
    }

    /// Tears down the session and clears the resolved view.
    pub async fn sign_out(&self) -> Result<()> {
        self.identity.sign_out().await?;
        self.resolve(None);
        Ok(())
    }

    fn optimistic_user(&self, session: &Session) -> AuthUser {
        let identity = &session.identity;
        AuthUser {
            id: identity.id.clone(),
            email: identity.email.clone(),
            username: derive_username(identity.display_name.as_deref(), &identity.email),
            is_admin: identity.email.eq_ignore_ascii_case(&self.root_admin_email),
        }
    }
}

/// Background half of resolution: profile healing and admin confirmation.
async fn confirm(
    tables: Arc<dyn TableStore>,
    root_admin: String,
    events: EventBus,
    state: Arc<watch::Sender<Option<AuthUser>>>,
    user: AuthUser,
) {
    // Keep the profile row in step with the provider's account data; a
    // failure here leaves a stale row, nothing worse.
    let profile = json!({
        "id": user.id,
        "email": user.email,
        "username": user.username,
    });
    if let Err(e) = tables.upsert(PROFILES, profile, &["id"]).await {
        warn!(user_id = %user.id, error = %e, "profile upsert failed; row may be stale");
    }

    let is_admin = if user.email.eq_ignore_ascii_case(&root_admin) {
        true
    } else {
        match tables
            .select(ADMINS, &[Filter::eq("email", user.email.as_str())])
            .await
        {
            Ok(grants) => !grants.is_empty(),
            Err(e) => {
                warn!(user_id = %user.id, error = %e,
                    "admin lookup failed; keeping optimistic flag");
                user.is_admin
            }
        }
    };

    let confirmed = AuthUser { is_admin, ..user };
    let user_id = confirmed.id.clone();
    // Publish even when unchanged so watchers see resolution settle.
    let _ = state.send(Some(confirmed));
    let _ = events.emit(CoreEvent::Session(SessionEvent::AdminConfirmed {
        user_id,
        is_admin,
    }));
}

/// Username shown for a session: the display name when present, otherwise
/// the email's local part.
fn derive_username(display_name: Option<&str>, email: &str) -> String {
    if let Some(name) = display_name {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_memory::{MemoryBlobStore, MemoryIdentityProvider, MemoryTableStore};

    #[test]
    fn test_username_prefers_display_name() {
        assert_eq!(derive_username(Some("Ana M"), "ana@example.com"), "Ana M");
        assert_eq!(derive_username(Some("  "), "ana@example.com"), "ana");
        assert_eq!(derive_username(None, "ana@example.com"), "ana");
    }

    #[tokio::test]
    async fn test_from_config_starts_signed_out() {
        let config = CoreConfig::builder()
            .table_store(Arc::new(MemoryTableStore::with_catalog_schema()))
            .blob_store(Arc::new(MemoryBlobStore::new()))
            .identity_provider(Arc::new(MemoryIdentityProvider::new()))
            .root_admin_email("admin@lege.music")
            .build()
            .unwrap();

        let resolver = SessionResolver::from_config(&config, EventBus::new(8));
        assert!(resolver.current_user().is_none());
        assert!(resolver.resolve(None).is_none());
    }
}
