//! Response helpers shared by the handlers.

use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use tower_cookies::Cookies;
use tracing::{error, warn};

use warbler_types::error::{Result, WarblerError};
use warbler_types::models::User;

use crate::auth::{AppState, AppStateInner};
use crate::flash::{self, Flash};
use crate::templates;

/// 302 Found. axum's `Redirect` only offers 303/307/308.
pub fn redirect(to: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, to.to_string())]).into_response()
}

/// Run blocking store work (and Argon2) off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T>
where
    F: FnOnce(&AppStateInner) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(state.as_ref()))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            WarblerError::Internal(e.to_string())
        })?
}

/// Default translation of a domain error into a response.
pub fn fail(cookies: &Cookies, viewer: Option<&User>, err: WarblerError) -> Response {
    match err {
        WarblerError::Unauthorized | WarblerError::BadCredentials => {
            warn!(
                "Access denied for {}",
                viewer.map_or("anonymous".to_string(), |u| format!("user {}", u.id))
            );
            flash::set(cookies, Flash::Unauthorized);
            redirect("/")
        }
        WarblerError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            Html(templates::error_page(
                viewer,
                "Not found",
                &format!("That {what} does not exist."),
            )),
        )
            .into_response(),
        WarblerError::Type(msg) | WarblerError::Value(msg) => (
            StatusCode::BAD_REQUEST,
            Html(templates::error_page(viewer, "Bad request", &msg)),
        )
            .into_response(),
        WarblerError::Internal(msg) => {
            error!("Internal error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(templates::error_page(
                    viewer,
                    "Something went wrong",
                    "Please try again later.",
                )),
            )
                .into_response()
        }
    }
}
