use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::claims::token_expired;
use super::dto::{StoredSession, User};
use crate::lookup::AuthHeaders;
use crate::storage::{load_slot, save_slot, SlotStorage, AUTH_SLOT};

/// Shared handle to the signed-in session, persisted in the `auth-storage` slot.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<RwLock<StoredSession>>,
    slots: Arc<dyn SlotStorage>,
}

impl SessionHandle {
    pub async fn load(slots: Arc<dyn SlotStorage>) -> Self {
        let stored: StoredSession = load_slot(slots.as_ref(), AUTH_SLOT).await.unwrap_or_default();
        Self {
            inner: Arc::new(RwLock::new(stored)),
            slots,
        }
    }

    /// A fresh signed-out session that does not read the slot.
    pub fn signed_out(slots: Arc<dyn SlotStorage>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoredSession::default())),
            slots,
        }
    }

    pub async fn current(&self) -> StoredSession {
        self.inner.read().await.clone()
    }

    pub async fn establish(&self, user: User, token: String) {
        let mut s = self.inner.write().await;
        *s = StoredSession {
            user: Some(user),
            token: Some(token),
        };
        info!("session established");
        self.persist(&s).await;
    }

    pub async fn sign_out(&self) {
        let mut s = self.inner.write().await;
        *s = StoredSession::default();
        info!("signed out");
        self.persist(&s).await;
    }

    /// Re-evaluates the stored session. Half-filled sessions and expired JWTs
    /// are cleared.
    pub async fn check_auth(&self) -> bool {
        let current = self.current().await;
        let valid = match (&current.user, &current.token) {
            (Some(_), Some(token)) => token_expired(token) != Some(true),
            _ => false,
        };
        if !valid && current != StoredSession::default() {
            warn!("stored session is no longer valid");
            self.sign_out().await;
        }
        valid
    }

    /// Called with the session write guard held, so slot writes follow the
    /// order of session changes.
    async fn persist(&self, snapshot: &StoredSession) {
        if let Err(e) = save_slot(self.slots.as_ref(), AUTH_SLOT, snapshot).await {
            error!(error = %e, "persist session failed");
        }
    }
}

/// `Authorization: Bearer <token>` when signed in, otherwise empty.
#[async_trait]
impl AuthHeaders for SessionHandle {
    async fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.inner.read().await.token.as_deref() {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(v) => {
                    headers.insert(AUTHORIZATION, v);
                }
                Err(e) => warn!(error = %e, "stored token is not a valid header value"),
            }
        }
        headers
    }
}
