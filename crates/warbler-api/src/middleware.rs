use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use tracing::{debug, warn};

use crate::auth::AppState;
use crate::respond::blocking;
use crate::session::{self, SESSION_COOKIE, Session};

/// Resolve the session cookie into a [`Session`] and attach it to the request.
///
/// Every route sees a `Session`; gating happens in the services that receive
/// it. Tokens that are unknown, or whose user has since been deleted, resolve
/// to `Session::Anonymous` and the stale cookie is cleared.
pub async fn resolve_session(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Response {
    let session = match cookies.get(SESSION_COOKIE) {
        Some(cookie) => {
            let token = cookie.value().to_string();
            lookup(&state, &cookies, token).await
        }
        None => Session::Anonymous,
    };

    req.extensions_mut().insert(session);
    next.run(req).await
}

async fn lookup(state: &AppState, cookies: &Cookies, token: String) -> Session {
    let Some(user_id) = state.sessions.get_user(&token).await else {
        debug!("Unknown session token, treating request as anonymous");
        session::clear_cookie(cookies);
        return Session::Anonymous;
    };

    let found = blocking(state, move |s| {
        Ok(s.db.get_user(user_id)?.map(|row| row.into_user()))
    })
    .await;

    match found {
        Ok(Some(user)) => Session::Authenticated { token, user },
        Ok(None) => {
            state.sessions.destroy_session(&token).await;
            session::clear_cookie(cookies);
            Session::Anonymous
        }
        Err(e) => {
            warn!("Session lookup for user {} failed: {}", user_id, e);
            Session::Anonymous
        }
    }
}
