pub mod auth;
pub mod authenticator;
pub mod flash;
pub mod graph;
pub mod messages;
pub mod middleware;
pub mod respond;
pub mod service;
pub mod session;
pub mod templates;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};
use tower_cookies::CookieManagerLayer;

pub use auth::{AppState, AppStateInner};

/// All Warbler routes. Every request passes through the cookie manager and
/// then [`middleware::resolve_session`], so handlers can take `Cookies` and
/// `Extension<Session>`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(auth::home))
        .route("/signup", get(auth::signup_form).post(auth::signup))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route(
            "/messages/new",
            get(messages::new_message_form).post(messages::add_message),
        )
        .route(
            "/messages/{id}",
            get(messages::show_message).post(messages::toggle_like),
        )
        .route("/messages/{id}/delete", post(messages::delete_message))
        .route("/messages/like/{id}", post(messages::like))
        .route("/messages/unlike/{id}", post(messages::unlike))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::show_user))
        .route("/users/{id}/following", get(users::show_following))
        .route("/users/{id}/followers", get(users::show_followers))
        .route("/users/{id}/likes", get(users::show_likes))
        .route("/users/follow/{id}", post(users::follow))
        .route("/users/stop-following/{id}", post(users::stop_following))
        .route(
            "/users/profile",
            get(users::profile_form).post(users::update_profile),
        )
        .route("/users/delete", post(users::delete_user))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_session,
        ))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
