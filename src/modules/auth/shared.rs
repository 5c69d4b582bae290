use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::errors::SessionError;
use super::model::{Account, ProfileUpdate, Session};
use super::session::SessionManager;

/// Cloneable handle that serializes every call onto one `SessionManager`.
///
/// Operations never overlap, so concurrent profile saves cannot lose updates
/// against the backing store.
pub struct SharedSession<M> {
    inner: Arc<Mutex<M>>,
}

impl<M> Clone for SharedSession<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: SessionManager> SharedSession<M> {
    pub fn new(manager: M) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    // A panic mid-operation leaves the last fully written state, so keep going
    fn lock(&self) -> MutexGuard<'_, M> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the underlying manager
    pub fn with<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn initialize(&self) -> Result<Option<Session>, SessionError> {
        self.lock().initialize()
    }

    pub fn current_user(&self) -> Option<Session> {
        self.lock().current_user().cloned()
    }

    pub fn current_account(&self) -> Result<Option<Account>, SessionError> {
        self.lock().current_account()
    }

    pub fn is_initializing(&self) -> bool {
        self.lock().is_initializing()
    }

    pub fn signup(&self, name: &str, email: &str, password: &str) -> Result<Session, SessionError> {
        self.lock().signup(name, email, password)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        self.lock().login(email, password)
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.lock().logout()
    }

    pub fn update_profile(&self, update: ProfileUpdate) -> Result<Option<Session>, SessionError> {
        self.lock().update_profile(update)
    }
}
