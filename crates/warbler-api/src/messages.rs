use std::collections::HashMap;

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tower_cookies::Cookies;

use warbler_types::api::NewMessage;
use warbler_types::error::WarblerError;
use warbler_types::models::MessageId;

use crate::auth::AppState;
use crate::flash::{self, Flash};
use crate::graph::SocialGraph;
use crate::respond::{blocking, fail, redirect};
use crate::service::MutationService;
use crate::session::Session;
use crate::templates;

pub async fn new_message_form(Extension(session): Extension<Session>, cookies: Cookies) -> Response {
    match session.user() {
        Some(viewer) => Html(templates::new_message_page(viewer, None, "")).into_response(),
        None => fail(&cookies, None, WarblerError::Unauthorized),
    }
}

/// POST /messages/new
///
/// Takes the raw form so an anonymous caller is turned away before the body
/// is checked.
pub async fn add_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let viewer = match session.require_viewer() {
        Ok(viewer) => viewer.clone(),
        Err(e) => return fail(&cookies, None, e),
    };

    let text = fields.get("text").cloned().unwrap_or_default();
    let result = match NewMessage::from_form(fields, viewer.id) {
        Ok(new) => {
            let caller = session.clone();
            blocking(&state, move |s| {
                MutationService::new(&s.db).post_message(&caller, &new.text)
            })
            .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(message) => redirect(&format!("/users/{}", message.user_id)),
        Err(WarblerError::Type(msg) | WarblerError::Value(msg)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(templates::new_message_page(&viewer, Some(&msg), &text)),
        )
            .into_response(),
        Err(e) => fail(&cookies, Some(&viewer), e),
    }
}

pub async fn show_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Path(id): Path<MessageId>,
) -> Response {
    let notice = flash::take(&cookies);
    let viewer = session.user_id();
    let result = blocking(&state, move |s| {
        let graph = SocialGraph::new(&s.db);
        let message = graph.message(id)?;
        let liked = match viewer {
            Some(me) => graph.has_liked(me, id)?,
            None => false,
        };
        Ok((message, liked))
    })
    .await;

    match result {
        Ok((message, liked)) => {
            Html(templates::message_show(session.user(), notice, &message, liked)).into_response()
        }
        Err(e) => fail(&cookies, session.user(), e),
    }
}

/// POST /messages/{id}: like or unlike, then back to the message.
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Path(id): Path<MessageId>,
) -> Response {
    let caller = session.clone();
    let result = blocking(&state, move |s| MutationService::new(&s.db).toggle_like(&caller, id)).await;

    match result {
        Ok(_) => redirect(&format!("/messages/{id}")),
        Err(e) => fail(&cookies, session.user(), e),
    }
}

pub async fn delete_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Path(id): Path<MessageId>,
) -> Response {
    let caller = session.clone();
    let result =
        blocking(&state, move |s| MutationService::new(&s.db).delete_message(&caller, id)).await;

    match result {
        Ok(message) => {
            flash::set(&cookies, Flash::MessageDeleted);
            redirect(&format!("/users/{}", message.user_id))
        }
        Err(e) => fail(&cookies, session.user(), e),
    }
}

/// POST /messages/like/{id}
pub async fn like(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Path(id): Path<MessageId>,
) -> Response {
    let caller = session.clone();
    let result = blocking(&state, move |s| {
        MutationService::new(&s.db).like(&caller, id)?;
        caller.require_user()
    })
    .await;

    match result {
        Ok(me) => redirect(&format!("/users/{me}/likes")),
        Err(e) => fail(&cookies, session.user(), e),
    }
}

/// POST /messages/unlike/{id}
pub async fn unlike(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Path(id): Path<MessageId>,
) -> Response {
    let caller = session.clone();
    let result = blocking(&state, move |s| {
        MutationService::new(&s.db).unlike(&caller, id)?;
        caller.require_user()
    })
    .await;

    match result {
        Ok(me) => redirect(&format!("/users/{me}/likes")),
        Err(e) => fail(&cookies, session.user(), e),
    }
}
