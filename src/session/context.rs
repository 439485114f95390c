use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use super::claims::{decode_claims, Claims, DecodeError};
use super::role::UserRole;
use crate::navigation::{Navigator, Route};

/// The logged in viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub role: UserRole,
    pub first_name: String,
}

impl Session {
    pub fn from_claims(token: String, claims: Claims) -> Self {
        Self {
            token,
            role: claims.role,
            first_name: claims.first_name,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Injectable session store.
///
/// Lives for one run of the console and is never persisted. Clones share the
/// same underlying session: it is written only by [`SessionContext::login`]
/// and [`SessionContext::logout`] and read by everything else.
#[derive(Clone)]
pub struct SessionContext {
    session: Arc<RwLock<Option<Session>>>,
    navigator: Navigator,
}

impl SessionContext {
    pub fn new(navigator: Navigator) -> Self {
        Self {
            session: Arc::new(RwLock::new(None)),
            navigator,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.session.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.session.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Stores `token` as the current session. The token must decode, a token
    /// whose claims can't be read is never stored.
    pub fn login(&self, token: &str) -> Result<Session, DecodeError> {
        let claims = decode_claims(token)?;
        let session = Session::from_claims(token.trim().to_string(), claims);
        debug!(
            "Session started for {} ({})",
            session.first_name, session.role
        );
        *self.write() = Some(session.clone());
        Ok(session)
    }

    /// Clears the session and sends the navigator to the login screen.
    pub fn logout(&self) {
        let previous = self.write().take();
        if let Some(session) = previous {
            info!("Logged out {} ({})", session.first_name, session.role);
        }
        self.navigator.navigate(Route::Login);
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.token.clone())
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }
}
