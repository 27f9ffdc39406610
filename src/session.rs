//! Authenticated session: login, logout, hydration and role policy.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`AuthSession`] is constructed once at startup and shared by `Arc` with the
//! route guard and every view. It is the only component that touches the
//! token store; everything else reads session facts through it.
//!
//! INVARIANTS
//! ==========
//! - In memory and on disk the session is either absent or the complete
//!   payload of one successful login. Login writes all three store keys under
//!   the session lock; logout removes all three under the same lock.
//! - The persisted payload is read at most once per manager. The outcome,
//!   including "nothing stored", is cached until the next login or logout.
//! - Role checks fail closed: a session without `groups` holds no role.
//!
//! No refresh, no expiry tracking, no retries. An expired access token is only
//! noticed when a downstream request is rejected; the user logs in again.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::forms::{self, FormError};
use crate::net::types::{Credentials, LoginResponse};
use crate::net::{ApiError, Backend};
use crate::store::{ACCESS_TOKEN_KEY, AUTH_DATA_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS, TokenStore};

pub const ADMIN_GROUP: &str = "admin";
pub const SUPERADMIN_GROUP: &str = "superadmin";

// =============================================================================
// SESSION
// =============================================================================

/// Identity and role state derived from one login response. Serialized with
/// the backend's field names under the `authData` key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub groups: Option<BTreeSet<String>>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access.is_some()
    }

    #[must_use]
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.as_ref().is_some_and(|g| g.contains(group))
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_group(ADMIN_GROUP)
    }

    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.has_group(SUPERADMIN_GROUP)
    }

    /// Staff is anyone holding a role the portal recognizes.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.is_admin() || self.is_super_admin()
    }
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self {
            access: response.access,
            refresh: response.refresh,
            email: response.email,
            groups: response.groups.map(|g| g.into_iter().collect()),
            permissions: response.permissions,
        }
    }
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Actions a view may gate on. The policy lives here so pages ask "may I do
/// X" instead of re-deriving role booleans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    ViewDemandes,
    UpdateDemandeStatus,
    DeleteDemande,
    ViewMunicipalites,
    ManageMunicipalites,
    ListUsers,
    ManageUsers,
    ViewStatistics,
}

impl Capability {
    /// Groups granting this capability; holding any one of them suffices.
    #[must_use]
    pub fn granted_to(self) -> &'static [&'static str] {
        match self {
            Self::ViewDemandes
            | Self::UpdateDemandeStatus
            | Self::DeleteDemande
            | Self::ViewMunicipalites
            | Self::ViewStatistics => &[ADMIN_GROUP, SUPERADMIN_GROUP],
            Self::ManageMunicipalites | Self::ListUsers | Self::ManageUsers => &[SUPERADMIN_GROUP],
        }
    }
}

/// Evaluate `capability` against an optional session. Absent session, missing
/// access token or missing groups all deny.
#[must_use]
pub fn has_capability(session: Option<&Session>, capability: Capability) -> bool {
    session.is_some_and(|s| s.is_authenticated() && capability.granted_to().iter().any(|g| s.has_group(g)))
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Credentials failed the login form rules; nothing was sent.
    #[error("invalid login form: {0}")]
    InvalidForm(#[from] FormError),

    /// The login request failed or was rejected.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The backend answered 2xx without both `access` and `refresh`.
    #[error("login response is missing access or refresh token")]
    MissingTokens,

    #[error("session payload could not be serialized: {0}")]
    Encode(#[from] serde_json::Error),
}

// =============================================================================
// MANAGER
// =============================================================================

pub struct AuthSession {
    backend: Arc<dyn Backend>,
    store: Arc<dyn TokenStore>,
    /// `None` until the store has been consulted, then the cached outcome.
    current: Mutex<Option<Option<Session>>>,
}

impl AuthSession {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, store: Arc<dyn TokenStore>) -> Self {
        Self { backend, store, current: Mutex::new(None) }
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Authenticate against the backend and persist the resulting session.
    ///
    /// Nothing is mutated unless the response carries both tokens.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidForm`] when the credentials fail the form rules.
    /// - [`AuthError::Api`] on transport failure, non-2xx or undecodable body.
    /// - [`AuthError::MissingTokens`] when a 2xx payload lacks a token.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        forms::validate_credentials(email, password)?;

        let credentials = Credentials { email: email.trim().to_owned(), password: password.to_owned() };
        let response = self.backend.login(&credentials).await.inspect_err(|e| {
            tracing::warn!(email = %credentials.email, error = %e, "login request failed");
        })?;

        let (Some(access), Some(refresh)) = (response.access.clone(), response.refresh.clone()) else {
            tracing::error!(email = %credentials.email, "login response missing tokens");
            return Err(AuthError::MissingTokens);
        };

        let session = Session::from(response);
        let serialized = serde_json::to_string(&session)?;

        {
            let mut current = self.lock();
            self.store.put(AUTH_DATA_KEY, &serialized);
            self.store.put(ACCESS_TOKEN_KEY, &access);
            self.store.put(REFRESH_TOKEN_KEY, &refresh);
            *current = Some(Some(session.clone()));
        }

        tracing::info!(email = %credentials.email, groups = ?session.groups, "login succeeded");
        Ok(session)
    }

    /// Current session, hydrating from the store on first call.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        let mut current = self.lock();
        if let Some(cached) = current.as_ref() {
            return cached.clone();
        }
        let hydrated = self.load_persisted();
        *current = Some(hydrated.clone());
        hydrated
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session().is_some_and(|s| s.is_authenticated())
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.session().and_then(|s| s.access)
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.session().and_then(|s| s.refresh)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.session().is_some_and(|s| s.is_admin())
    }

    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.session().is_some_and(|s| s.is_super_admin())
    }

    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        has_capability(self.session().as_ref(), capability)
    }

    /// Drop the session from memory and storage. Idempotent, never fails.
    pub fn logout(&self) {
        let mut current = self.lock();
        for key in SESSION_KEYS {
            self.store.remove(key);
        }
        *current = Some(None);
        tracing::debug!("session cleared");
    }

    /// Ask the backend to blacklist the refresh token, then [`logout`](Self::logout).
    ///
    /// The remote call is best effort: its failure is logged and the local
    /// session is cleared regardless.
    pub async fn revoke_and_logout(&self) {
        if let (Some(access), Some(refresh)) = (self.access_token(), self.refresh_token()) {
            if let Err(e) = self.backend.logout(&access, &refresh).await {
                tracing::warn!(error = %e, "refresh token revocation failed");
            }
        }
        self.logout();
    }

    fn load_persisted(&self) -> Option<Session> {
        let raw = self.store.get(AUTH_DATA_KEY)?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "persisted session is corrupt; treating as logged out");
                None
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Option<Session>>> {
        self.current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
