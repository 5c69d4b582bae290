//! Session store: who is logged in, backed by a durable key-value store.
//!
//! The store keeps two entries in the backing store:
//! - `users`: JSON array of every registered [`Account`]
//! - `user`: JSON [`Session`] for the logged-in user, absent when logged out
//!
//! State moves `Unknown -> LoggedOut | LoggedIn` once, on initialization, and
//! never returns to `Unknown`.

use log::{debug, error, warn};
use rand::Rng;

use super::errors::{require_field, SessionError};
use super::model::{Account, ProfileUpdate, Session};
use super::password::{burn_verification, hash_password};
use super::policy::{DuplicateEmailPolicy, LoggedOutUpdatePolicy, SessionPolicy};
use super::store::AccountStore;
use crate::modules::storage::KeyValueStore;
use crate::modules::utils::logging::{format_sensitive, log_auth_event, log_data_operation};
use crate::modules::utils::time::{get_current_timestamp, get_current_timestamp_millis};
use crate::{ACCOUNTS_KEY, SESSION_KEY};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// The persisted session has not been read yet
    Unknown,
    LoggedOut,
    LoggedIn(Session),
}

/// Operations a front-end needs from the session layer.
///
/// Hand this to consumers explicitly instead of reaching for a global.
pub trait SessionManager {
    /// Read the persisted session. Runs once; later calls return the current user.
    fn initialize(&mut self) -> Result<Option<Session>, SessionError>;

    fn current_user(&self) -> Option<&Session>;

    /// Stored account behind the current session, including its timestamps
    fn current_account(&self) -> Result<Option<Account>, SessionError>;

    fn is_initializing(&self) -> bool;

    fn signup(&mut self, name: &str, email: &str, password: &str) -> Result<Session, SessionError>;

    fn login(&mut self, email: &str, password: &str) -> Result<Session, SessionError>;

    /// Idempotent.
    fn logout(&mut self) -> Result<(), SessionError>;

    /// `Ok(None)` when nobody is logged in and the policy says to ignore it.
    fn update_profile(&mut self, update: ProfileUpdate) -> Result<Option<Session>, SessionError>;
}

pub struct SessionStore<S: KeyValueStore> {
    store: S,
    state: SessionState,
    policy: SessionPolicy,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, SessionPolicy::default())
    }

    pub fn with_policy(store: S, policy: SessionPolicy) -> Self {
        Self {
            store,
            state: SessionState::Unknown,
            policy,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn backing_store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Snapshot of the `users` collection
    pub fn accounts(&self) -> Result<AccountStore, SessionError> {
        Ok(AccountStore::load(&self.store)?)
    }

    fn ensure_initialized(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Unknown {
            self.initialize()?;
        }
        Ok(())
    }

    fn read_persisted_session(&self) -> Result<Option<Session>, SessionError> {
        let raw = match self.store.get(SESSION_KEY)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if !session.id.is_empty() => Ok(Some(session)),
            Ok(_) => {
                warn!("Ignoring persisted session without an id");
                Ok(None)
            }
            Err(e) => {
                warn!("Ignoring malformed persisted session: {}", e);
                Ok(None)
            }
        }
    }

    fn save_accounts(
        &mut self,
        accounts: &AccountStore,
        email: &str,
        operation: &str,
    ) -> Result<(), SessionError> {
        match accounts.save(&mut self.store) {
            Ok(()) => {
                log_data_operation(operation, email, ACCOUNTS_KEY, true, None);
                Ok(())
            }
            Err(e) => {
                let details = e.to_string();
                log_data_operation(operation, email, ACCOUNTS_KEY, false, Some(details.as_str()));
                Err(e.into())
            }
        }
    }

    fn persist_session(&mut self, session: &Session) -> Result<(), SessionError> {
        let data = serde_json::to_string(session).map_err(crate::StorageError::from)?;
        self.store.set(SESSION_KEY, &data)?;
        Ok(())
    }

    /// Write `users` then `user`. If the session write fails, `users` is put back
    /// as it was so a failed operation leaves nothing half-written.
    fn commit(
        &mut self,
        accounts: &AccountStore,
        session: &Session,
        operation: &str,
    ) -> Result<(), SessionError> {
        let previous = self.store.get(ACCOUNTS_KEY)?;
        self.save_accounts(accounts, &session.email, operation)?;

        if let Err(e) = self.persist_session(session) {
            let restored = match &previous {
                Some(data) => self.store.set(ACCOUNTS_KEY, data),
                None => self.store.remove(ACCOUNTS_KEY),
            };
            match restored {
                Ok(()) => warn!("{} failed writing the session; accounts restored", operation),
                Err(restore_err) => error!(
                    "{} failed writing the session and accounts could not be restored: {}",
                    operation, restore_err
                ),
            }
            return Err(e);
        }
        Ok(())
    }

    fn reject_login(email: &str, iterations: Option<u32>, password: &str) -> SessionError {
        if let Some(iterations) = iterations {
            burn_verification(password, iterations);
        }
        log_auth_event("login", email, false, Some("invalid credentials"));
        SessionError::InvalidCredentials
    }
}

/// Opaque, practically unique id: millisecond clock plus a random suffix
pub fn generate_account_id() -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!("{}-{:08x}", get_current_timestamp_millis(), suffix)
}

impl<S: KeyValueStore> SessionManager for SessionStore<S> {
    fn initialize(&mut self) -> Result<Option<Session>, SessionError> {
        if self.state != SessionState::Unknown {
            return Ok(self.current_user().cloned());
        }

        // A storage failure leaves the state Unknown so the caller can retry
        let session = self.read_persisted_session()?;
        self.state = match &session {
            Some(session) => {
                debug!("Restored session for {}", format_sensitive(&session.email));
                SessionState::LoggedIn(session.clone())
            }
            None => SessionState::LoggedOut,
        };
        Ok(session)
    }

    fn current_user(&self) -> Option<&Session> {
        match &self.state {
            SessionState::LoggedIn(session) => Some(session),
            _ => None,
        }
    }

    fn current_account(&self) -> Result<Option<Account>, SessionError> {
        let id = match self.current_user() {
            Some(session) => session.id.clone(),
            None => return Ok(None),
        };
        let accounts = AccountStore::load(&self.store)?;
        Ok(accounts.find_by_id(&id).cloned())
    }

    fn is_initializing(&self) -> bool {
        self.state == SessionState::Unknown
    }

    fn signup(&mut self, name: &str, email: &str, password: &str) -> Result<Session, SessionError> {
        self.ensure_initialized()?;
        require_field("name", name)?;
        require_field("email", email)?;
        require_field("password", password)?;
        self.policy.password_policy.check(password)?;

        let mut accounts = AccountStore::load(&self.store)?;
        if accounts.find_by_email(email).is_some() {
            match self.policy.duplicate_email {
                DuplicateEmailPolicy::Reject => {
                    log_auth_event("signup", email, false, Some("email already registered"));
                    return Err(SessionError::DuplicateEmail(email.to_string()));
                }
                DuplicateEmailPolicy::Overwrite => {
                    warn!(
                        "Signup replaces the existing account for {}",
                        format_sensitive(email)
                    );
                }
            }
        }

        let now = get_current_timestamp();
        let hashed = hash_password(password, self.policy.hash_iterations);
        let account = Account {
            id: generate_account_id(),
            name: name.trim().to_string(),
            email: email.to_string(),
            password_hash: hashed.hash,
            salt: hashed.salt,
            iterations: hashed.iterations,
            phone: String::new(),
            emblem: None,
            created_at: now,
            last_login: now,
        };
        let session = account.to_session();

        accounts.upsert_by_email(account);
        self.commit(&accounts, &session, "signup")?;
        self.state = SessionState::LoggedIn(session.clone());

        log_auth_event("signup", email, true, None);
        Ok(session)
    }

    fn login(&mut self, email: &str, password: &str) -> Result<Session, SessionError> {
        self.ensure_initialized()?;
        require_field("email", email)?;
        require_field("password", password)?;

        let mut accounts = AccountStore::load(&self.store)?;
        let account = match accounts.find_by_email_mut(email) {
            Some(account) if account.verify_password(password) => account,
            Some(_) => return Err(Self::reject_login(email, None, password)),
            None => {
                let iterations = self.policy.hash_iterations;
                return Err(Self::reject_login(email, Some(iterations), password));
            }
        };

        account.last_login = get_current_timestamp();
        let session = account.to_session();

        self.commit(&accounts, &session, "login")?;
        self.state = SessionState::LoggedIn(session.clone());

        log_auth_event("login", email, true, None);
        Ok(session)
    }

    fn logout(&mut self) -> Result<(), SessionError> {
        let previous = self.current_user().map(|s| s.email.clone());

        self.store.remove(SESSION_KEY)?;
        self.state = SessionState::LoggedOut;

        if let Some(email) = previous {
            log_auth_event("logout", &email, true, None);
        }
        Ok(())
    }

    fn update_profile(&mut self, update: ProfileUpdate) -> Result<Option<Session>, SessionError> {
        self.ensure_initialized()?;

        let current = match &self.state {
            SessionState::LoggedIn(session) => session.clone(),
            _ => {
                return match self.policy.logged_out_update {
                    LoggedOutUpdatePolicy::Ignore => {
                        debug!("Profile update ignored: nobody is logged in");
                        Ok(None)
                    }
                    LoggedOutUpdatePolicy::Reject => Err(SessionError::NotAuthenticated),
                };
            }
        };

        require_field("name", &update.name)?;
        require_field("email", &update.email)?;

        let mut accounts = AccountStore::load(&self.store)?;
        if accounts.find_by_id(&current.id).is_none() {
            warn!("Session refers to account {} which no longer exists", current.id);
            return Err(SessionError::AccountMissing(current.id));
        }

        let taken = accounts
            .find_by_email(&update.email)
            .map_or(false, |other| other.id != current.id);
        if taken {
            match self.policy.duplicate_email {
                DuplicateEmailPolicy::Reject => {
                    return Err(SessionError::DuplicateEmail(update.email));
                }
                DuplicateEmailPolicy::Overwrite => {
                    let removed = accounts.remove_email_except(&update.email, &current.id);
                    warn!(
                        "Email change to {} discarded {} other account(s)",
                        format_sensitive(&update.email),
                        removed.len()
                    );
                }
            }
        }

        let session = match accounts.find_by_id_mut(&current.id) {
            Some(account) => {
                account.name = update.name.trim().to_string();
                account.email = update.email.clone();
                account.phone = update.phone.trim().to_string();
                if let Some(emblem) = update.emblem {
                    account.emblem = Some(emblem);
                }
                account.to_session()
            }
            None => return Err(SessionError::AccountMissing(current.id)),
        };

        self.commit(&accounts, &session, "update_profile")?;
        self.state = SessionState::LoggedIn(session.clone());

        log_auth_event("update_profile", &session.email, true, None);
        Ok(Some(session))
    }
}
