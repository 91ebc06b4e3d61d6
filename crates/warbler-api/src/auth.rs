use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tower_cookies::Cookies;
use tracing::info;

use warbler_db::Database;
use warbler_types::api::{LoginForm, SignupRequest, form_value};
use warbler_types::error::WarblerError;

use crate::authenticator::Authenticator;
use crate::flash::{self, Flash};
use crate::graph::SocialGraph;
use crate::respond::{blocking, fail, redirect};
use crate::session::{Session, SessionStore};
use crate::templates;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionStore,
}

impl AppStateInner {
    pub fn new(db: Database) -> AppState {
        Arc::new(Self {
            db,
            sessions: SessionStore::new(),
        })
    }
}

/// GET /: landing page for visitors, timeline for signed-in users.
pub async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
) -> Response {
    let notice = flash::take(&cookies);
    let Some(user) = session.user().cloned() else {
        return Html(templates::home_anon(notice)).into_response();
    };

    let user_id = user.id;
    let result = blocking(&state, move |s| {
        let graph = SocialGraph::new(&s.db);
        Ok((graph.timeline(user_id)?, graph.liked_ids(user_id)?))
    })
    .await;

    match result {
        Ok((messages, liked)) => {
            Html(templates::home(&user, notice, &messages, &liked)).into_response()
        }
        Err(e) => fail(&cookies, Some(&user), e),
    }
}

pub async fn signup_form(Extension(session): Extension<Session>, cookies: Cookies) -> Response {
    if session.user().is_some() {
        return redirect("/");
    }
    Html(templates::signup_page(flash::take(&cookies), None)).into_response()
}

/// POST /signup: create the account and log it in.
pub async fn signup(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let payload = form_value(fields, &["image_url"]);
    let result = match SignupRequest::from_value(&payload) {
        Ok(req) => blocking(&state, move |s| Authenticator::new(&s.db).signup(&req)).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(user) => {
            state.sessions.login(&cookies, user).await;
            redirect("/")
        }
        Err(WarblerError::Type(msg) | WarblerError::Value(msg)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(templates::signup_page(None, Some(&msg))),
        )
            .into_response(),
        Err(e) => fail(&cookies, None, e),
    }
}

pub async fn login_form(Extension(session): Extension<Session>, cookies: Cookies) -> Response {
    if session.user().is_some() {
        return redirect("/");
    }
    Html(templates::login_page(flash::take(&cookies), None)).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Response {
    let result = blocking(&state, move |s| {
        Authenticator::new(&s.db).authenticate(&form.username, &form.password)
    })
    .await;

    match result {
        Ok(Some(user)) => {
            info!("User {} logged in", user.username);
            state.sessions.login(&cookies, user).await;
            flash::set(&cookies, Flash::Welcome);
            redirect("/")
        }
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Html(templates::login_page(None, Some("Invalid credentials."))),
        )
            .into_response(),
        Err(e) => fail(&cookies, None, e),
    }
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
) -> Response {
    state.sessions.logout(&cookies, &session).await;
    flash::set(&cookies, Flash::LoggedOut);
    redirect("/login")
}
