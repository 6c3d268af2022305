// bluemoon-rbac/src/utils/session.rs
use actix_session::Session;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::{debug, warn};
use crate::error::BluemoonError;
use crate::utils::structs::UserRecord;

pub const ROLE_KEY: &str = "role";
pub const CURRENT_USER_KEY: &str = "currentUser";
pub const IS_LOGGED_IN_KEY: &str = "isLoggedIn";
pub const USER_INFO_KEY: &str = "userInfo";
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const TOKEN_KEY: &str = "token";

/// Every key written at login. Logout removes all of them.
pub const SESSION_KEYS: &[&str] = &[
    CURRENT_USER_KEY,
    IS_LOGGED_IN_KEY,
    USER_INFO_KEY,
    ACCESS_TOKEN_KEY,
    TOKEN_KEY,
    ROLE_KEY,
];

/// Read/clear access to the session store of the current visitor.
///
/// The access layer never talks to a concrete store; it only sees this trait,
/// so the cookie session in production and [`MemorySession`] in tests are
/// interchangeable.
pub trait SessionProvider {
    fn read_key(&self, key: &str) -> Result<Option<String>, BluemoonError>;

    fn write_key(&self, key: &str, value: &str) -> Result<(), BluemoonError>;

    fn remove_key(&self, key: &str) -> Result<(), BluemoonError>;

    /// User object already loaded for the current request, if any.
    fn loaded_user(&self) -> Option<UserRecord> {
        None
    }

    /// The persisted `currentUser` record.
    fn current_user(&self) -> Result<Option<UserRecord>, BluemoonError> {
        match self.read_key(CURRENT_USER_KEY)? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| BluemoonError::MalformedSession(e.to_string())),
            _ => Ok(None),
        }
    }

    /// Remove every session key. All removals are attempted; the first
    /// failure is reported afterwards.
    fn clear_session(&self) -> Result<(), BluemoonError> {
        let mut first_error = None;
        for key in SESSION_KEYS {
            if let Err(e) = self.remove_key(key) {
                warn!("failed to remove session key {}: {}", key, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Raw role token of the current visitor.
///
/// Sources, first non-blank wins: the dedicated `role` key, the `role` of the
/// user loaded for this request, then `role`/`vaiTro` of the persisted
/// `currentUser` record. Store failures and malformed records are logged and
/// count as "no role".
pub fn resolve_raw_role(provider: &dyn SessionProvider) -> Option<String> {
    match provider.read_key(ROLE_KEY) {
        Ok(value) => {
            if let Some(role) = non_blank(value) {
                debug!("role resolved from session key");
                return Some(role);
            }
        }
        Err(e) => warn!("could not read role key: {}", e),
    }

    if let Some(role) = provider.loaded_user().and_then(|u| non_blank(u.role)) {
        debug!("role resolved from loaded user");
        return Some(role);
    }

    match provider.current_user() {
        Ok(Some(user)) => user.raw_role().map(str::to_string),
        Ok(None) => None,
        Err(e) => {
            warn!("error getting user role: {}", e);
            None
        }
    }
}

/// Persist a freshly authenticated user. Keys left by an earlier login are
/// removed first.
pub fn store_login(
    provider: &dyn SessionProvider,
    user: &UserRecord,
    access_token: Option<&str>,
) -> Result<(), BluemoonError> {
    provider.clear_session()?;
    let encoded = serde_json::to_string(user)
        .map_err(|e| BluemoonError::SessionStore(e.to_string()))?;
    provider.write_key(CURRENT_USER_KEY, &encoded)?;
    provider.write_key(IS_LOGGED_IN_KEY, "true")?;
    if let Some(role) = user.raw_role() {
        provider.write_key(ROLE_KEY, role)?;
    }
    if let Some(token) = access_token {
        provider.write_key(ACCESS_TOKEN_KEY, token)?;
    }
    Ok(())
}

/// `isLoggedIn` is set and a user record can be read.
pub fn is_logged_in(provider: &dyn SessionProvider) -> bool {
    let flag = provider.read_key(IS_LOGGED_IN_KEY).ok().flatten();
    flag.as_deref() == Some("true") && matches!(provider.current_user(), Ok(Some(_)))
}

impl SessionProvider for Session {
    fn read_key(&self, key: &str) -> Result<Option<String>, BluemoonError> {
        self.get::<String>(key)
            .map_err(|e| BluemoonError::SessionStore(e.to_string()))
    }

    fn write_key(&self, key: &str, value: &str) -> Result<(), BluemoonError> {
        self.insert(key, value)
            .map_err(|e| BluemoonError::SessionStore(e.to_string()))
    }

    fn remove_key(&self, key: &str) -> Result<(), BluemoonError> {
        self.remove(key);
        Ok(())
    }

    fn clear_session(&self) -> Result<(), BluemoonError> {
        for key in SESSION_KEYS {
            self.remove(key);
        }
        self.clear();
        Ok(())
    }
}

/// Cookie session plus the user attached to the request by upstream
/// middleware, if any.
pub struct RequestSession<'a> {
    session: &'a Session,
    loaded: Option<UserRecord>,
}

impl<'a> RequestSession<'a> {
    pub fn new(session: &'a Session, loaded: Option<UserRecord>) -> Self {
        Self { session, loaded }
    }
}

impl SessionProvider for RequestSession<'_> {
    fn read_key(&self, key: &str) -> Result<Option<String>, BluemoonError> {
        self.session.read_key(key)
    }

    fn write_key(&self, key: &str, value: &str) -> Result<(), BluemoonError> {
        self.session.write_key(key, value)
    }

    fn remove_key(&self, key: &str) -> Result<(), BluemoonError> {
        self.session.remove_key(key)
    }

    fn loaded_user(&self) -> Option<UserRecord> {
        self.loaded.clone()
    }

    fn clear_session(&self) -> Result<(), BluemoonError> {
        self.session.clear_session()
    }
}

/// In-process session store, used by the CLI and tests.
#[derive(Debug, Default)]
pub struct MemorySession {
    values: RefCell<HashMap<String, String>>,
    loaded: Option<UserRecord>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: &str) -> Self {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_loaded_user(mut self, user: UserRecord) -> Self {
        self.loaded = Some(user);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

impl SessionProvider for MemorySession {
    fn read_key(&self, key: &str) -> Result<Option<String>, BluemoonError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn write_key(&self, key: &str, value: &str) -> Result<(), BluemoonError> {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_key(&self, key: &str) -> Result<(), BluemoonError> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }

    fn loaded_user(&self) -> Option<UserRecord> {
        self.loaded.clone()
    }
}
