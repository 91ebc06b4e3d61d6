//! Session guard.
//!
//! An opaque session token lives in the `warbler_session` cookie and maps to a
//! user id in an in-memory [`SessionStore`]. Each request resolves the cookie
//! into a [`Session`], which is handed explicitly to every service call that
//! needs an authorization decision.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use warbler_types::error::{Result, WarblerError};
use warbler_types::models::{User, UserId};

pub const SESSION_COOKIE: &str = "warbler_session";

/// Session token (UUID stored in cookie)
pub type SessionToken = String;

/// Who is making the current request.
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Anonymous,
    Authenticated { token: SessionToken, user: User },
}

impl Session {
    pub fn user(&self) -> Option<&User> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { user, .. } => Some(user),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user().map(|u| u.id)
    }

    /// The signed-in user, or `Unauthorized` for anonymous requests.
    pub fn require_viewer(&self) -> Result<&User> {
        self.user().ok_or(WarblerError::Unauthorized)
    }

    /// The signed-in user's id, or `Unauthorized` for anonymous requests.
    pub fn require_user(&self) -> Result<UserId> {
        self.require_viewer().map(|u| u.id)
    }

    /// Like [`Session::require_user`], and the user must also be `owner`.
    pub fn require_owner(&self, owner: UserId) -> Result<UserId> {
        let user_id = self.require_user()?;
        if user_id != owner {
            return Err(WarblerError::Unauthorized);
        }
        Ok(user_id)
    }
}

/// In-memory session store
///
/// Maps session tokens to user ids. Sessions are ephemeral and lost on
/// server restart.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionToken, UserId>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session for a user and return its token.
    pub async fn create_session(&self, user_id: UserId) -> SessionToken {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.insert(token.clone(), user_id);
        token
    }

    pub async fn get_user(&self, token: &str) -> Option<UserId> {
        let sessions = self.sessions.read().await;
        sessions.get(token).copied()
    }

    pub async fn destroy_session(&self, token: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
    }

    /// Drops every session belonging to `user_id`. Returns how many were removed.
    pub async fn destroy_user_sessions(&self, user_id: UserId) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, uid| *uid != user_id);
        before - sessions.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Anonymous → Authenticated: opens a session and sets the cookie.
    pub async fn login(&self, cookies: &Cookies, user: User) -> Session {
        let token = self.create_session(user.id).await;
        let mut cookie = Cookie::new(SESSION_COOKIE, token.clone());
        cookie.set_http_only(true);
        cookie.set_path("/");
        cookies.add(cookie);
        Session::Authenticated { token, user }
    }

    /// Authenticated → Anonymous: destroys the session and clears the cookie.
    pub async fn logout(&self, cookies: &Cookies, session: &Session) {
        if let Session::Authenticated { token, .. } = session {
            self.destroy_session(token).await;
        }
        clear_cookie(cookies);
    }
}

pub(crate) fn clear_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookies.remove(cookie);
}
