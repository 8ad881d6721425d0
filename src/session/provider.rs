//! Session context: who is signed in, their current ID token, and auth-state
//! notifications. One `SessionProvider` is created per application and handed to
//! whatever needs it; clones share the same session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::identity::{Credential, IdentityProvider};
use super::store::SessionStore;
use crate::domain::User;
use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// The initial session has not been restored yet.
    Unresolved,
    SignedOut,
    SignedIn(User),
}

impl AuthState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthState::Unresolved)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

type Listener = Arc<dyn Fn(&AuthState) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

struct SessionInner {
    identity: Arc<dyn IdentityProvider>,
    store: Option<SessionStore>,
    credential: tokio::sync::Mutex<Option<Credential>>,
    state: watch::Sender<AuthState>,
    listeners: Mutex<Listeners>,
}

impl SessionInner {
    fn listeners(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct SessionProvider {
    inner: Arc<SessionInner>,
}

impl SessionProvider {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Option<SessionStore>) -> Self {
        let (state, _) = watch::channel(AuthState::Unresolved);
        Self {
            inner: Arc::new(SessionInner {
                identity,
                store,
                credential: tokio::sync::Mutex::new(None),
                state,
                listeners: Mutex::new(Listeners::default()),
            }),
        }
    }

    /// Resolves the initial state from the session store, if one is configured.
    /// An unreadable store resolves to signed out.
    #[instrument(skip(self))]
    pub async fn restore(&self) {
        let stored = match &self.inner.store {
            Some(store) => store.load().await.unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring unreadable session");
                None
            }),
            None => None,
        };
        self.restore_from(stored).await;
    }

    pub async fn restore_from(&self, credential: Option<Credential>) {
        let state = match &credential {
            Some(credential) => AuthState::SignedIn(credential.user.clone()),
            None => AuthState::SignedOut,
        };
        *self.inner.credential.lock().await = credential;
        debug!(signed_in = state.user().is_some(), "Session restored");
        self.publish(state);
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().user().cloned()
    }

    /// Watch channel of auth states, for callers that want to await a transition.
    pub fn changes(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Returns a valid ID token for the signed-in user, refreshing it when it is
    /// about to expire.
    #[instrument(skip(self))]
    pub async fn current_id_token(&self) -> Result<String, AuthError> {
        let mut guard = self.inner.credential.lock().await;
        let credential = guard.as_mut().ok_or(AuthError::NotSignedIn)?;

        if credential.expires_soon(Utc::now()) {
            debug!("ID token expiring, refreshing");
            let fresh = self.inner.identity.refresh(credential).await?;
            *credential = fresh;
            self.persist(credential).await;
        }
        Ok(credential.id_token.clone())
    }

    #[instrument(skip(self, token))]
    pub async fn sign_in_with_custom_token(&self, token: &str) -> Result<User, AuthError> {
        let credential = self.inner.identity.sign_in_with_custom_token(token).await?;
        let user = credential.user.clone();
        self.persist(&credential).await;
        *self.inner.credential.lock().await = Some(credential);
        info!(uid = %user.uid, "Signed in");
        self.publish(AuthState::SignedIn(user.clone()));
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        *self.inner.credential.lock().await = None;
        if let Some(store) = &self.inner.store {
            if let Err(e) = store.clear().await {
                warn!(error = %e, "Failed to clear stored session");
            }
        }
        info!("Signed out");
        self.publish(AuthState::SignedOut);
    }

    /// Registers `callback` for auth-state changes. It fires right away with the
    /// current state once that state is resolved, then on every sign-in and
    /// sign-out. Delivery stops when the returned subscription is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn on_auth_state_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        let callback: Listener = Arc::new(callback);
        let (id, current) = {
            let mut listeners = self.inner.listeners();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, Arc::clone(&callback)));
            (id, self.inner.state.borrow().clone())
        };
        if current.is_resolved() {
            callback(&current);
        }
        Subscription {
            id,
            session: Arc::downgrade(&self.inner),
        }
    }

    async fn persist(&self, credential: &Credential) {
        if let Some(store) = &self.inner.store {
            if let Err(e) = store.save(credential).await {
                warn!(error = %e, "Failed to persist session");
            }
        }
    }

    fn publish(&self, state: AuthState) {
        let listeners: Vec<Listener> = {
            let listeners = self.inner.listeners();
            self.inner.state.send_replace(state.clone());
            listeners.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(&state);
        }
    }
}

/// Handle returned by [`SessionProvider::on_auth_state_changed`].
pub struct Subscription {
    id: u64,
    session: Weak<SessionInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.session.upgrade() {
            inner.listeners().entries.retain(|(id, _)| *id != self.id);
        }
    }
}
