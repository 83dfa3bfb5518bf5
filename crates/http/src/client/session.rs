//! Logged-in identity and role
//!
//! [`Session`] is the single place the rest of the application asks "who is
//! logged in and what may they see". It loads the identity once at startup
//! and exposes explicit mutation points for login and logout.

use super::{ClientError, JobTrackClient};
use crate::types::{AccountType, Me};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Login view
pub const LOGIN_ROUTE: &str = "/login";

/// Home view for a role
pub fn home_for(role: AccountType) -> &'static str {
    match role {
        AccountType::Applicant => "/applicant/jobs",
        AccountType::Employer => "/employer/jobs",
    }
}

/// Snapshot of session state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub me: Option<Me>,
    pub loading: bool,
    pub has_new_application_draft: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            me: None,
            loading: true, // Nothing is known until bootstrap finishes
            has_new_application_draft: false,
        }
    }
}

/// Result of checking a guarded view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Identity is still being loaded; render nothing yet
    Pending,
    Allow,
    RedirectToLogin,
    /// Logged in with a different role; go to that role's home
    RedirectTo(&'static str),
}

/// Session over a [`JobTrackClient`]
pub struct Session {
    client: JobTrackClient,
    state: RwLock<SessionState>,
}

impl Session {
    /// Create a session without loading the identity
    pub fn new(client: JobTrackClient) -> Self {
        Self {
            client,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Create a session and load the identity if an access token is stored.
    ///
    /// A failed identity fetch means the stored token is unusable: identity
    /// and tokens are both cleared. Loading ends in every case.
    pub async fn bootstrap(client: JobTrackClient) -> Self {
        let session = Self::new(client);

        if session.client.is_logged_in() {
            if let Err(err) = session.refresh_me().await {
                warn!(error = %err, "Stored session is no longer valid");
                session.clear_me();
                session.client.tokens().clear();
            }
        } else {
            debug!("No stored access token, starting anonymous");
        }

        session.write().loading = false;
        session
    }

    /// Underlying API client
    pub fn client(&self) -> &JobTrackClient {
        &self.client
    }

    pub fn state(&self) -> SessionState {
        self.read().clone()
    }

    pub fn me(&self) -> Option<Me> {
        self.read().me.clone()
    }

    pub fn account_type(&self) -> Option<AccountType> {
        self.read().me.as_ref().map(|me| me.account_type)
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    /// Logged in means an access token is stored
    pub fn is_authenticated(&self) -> bool {
        self.client.is_logged_in()
    }

    /// Fetch the identity and store it
    pub async fn refresh_me(&self) -> Result<Me, ClientError> {
        let me = self.client.me().await?;
        self.write().me = Some(me.clone());
        Ok(me)
    }

    /// Forget the identity (tokens are left alone)
    pub fn clear_me(&self) {
        self.write().me = None;
    }

    /// Log in, then load the identity
    pub async fn login(&self, username: &str, password: &str) -> Result<Me, ClientError> {
        self.client.login(username, password).await?;
        let me = self.refresh_me().await?;
        info!(username = %me.username, role = me.account_type.code(), "Session started");
        Ok(me)
    }

    /// Log out server-side (best-effort) and clear identity and tokens
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.client.logout().await;
        self.clear_me();
        self.write().has_new_application_draft = false;
        result
    }

    pub fn has_new_application_draft(&self) -> bool {
        self.read().has_new_application_draft
    }

    /// Flag that the user just started an application from a posting
    pub fn mark_new_application_draft(&self, value: bool) {
        self.write().has_new_application_draft = value;
    }

    /// Guard for views that only need a logged-in user
    pub fn require_auth(&self) -> Access {
        if self.is_authenticated() {
            Access::Allow
        } else {
            Access::RedirectToLogin
        }
    }

    /// Guard for views restricted to one role
    pub fn require_role(&self, role: AccountType) -> Access {
        let state = self.read();
        if state.loading {
            return Access::Pending;
        }
        match state.me.as_ref().map(|me| me.account_type) {
            None => Access::RedirectToLogin,
            Some(actual) if actual == role => Access::Allow,
            Some(actual) => Access::RedirectTo(home_for(actual)),
        }
    }

    /// Where the root view sends the user; `None` while loading
    pub fn home_route(&self) -> Option<&'static str> {
        let state = self.read();
        if state.loading {
            return None;
        }
        Some(
            state
                .me
                .as_ref()
                .map_or(LOGIN_ROUTE, |me| home_for(me.account_type)),
        )
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
