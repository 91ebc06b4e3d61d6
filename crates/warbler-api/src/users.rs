use std::collections::HashMap;

use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tower_cookies::Cookies;
use tracing::debug;

use warbler_types::api::{ProfileForm, SearchQuery};
use warbler_types::error::WarblerError;
use warbler_types::models::UserId;

use crate::auth::AppState;
use crate::flash::{self, Flash};
use crate::graph::SocialGraph;
use crate::respond::{blocking, fail, redirect};
use crate::service::MutationService;
use crate::session::{self, Session};
use crate::templates;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Query(query): Query<SearchQuery>,
) -> Response {
    let search = query.q.filter(|q| !q.trim().is_empty());
    let term = search.clone();
    let result = blocking(&state, move |s| SocialGraph::new(&s.db).users(term.as_deref())).await;

    match result {
        Ok(users) => {
            Html(templates::users_index(session.user(), &users, search.as_deref())).into_response()
        }
        Err(e) => fail(&cookies, session.user(), e),
    }
}

/// GET /users/{id}: public profile with the user's messages.
pub async fn show_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Path(user_id): Path<UserId>,
) -> Response {
    let notice = flash::take(&cookies);
    let viewer = session.user_id();
    let result = blocking(&state, move |s| {
        let graph = SocialGraph::new(&s.db);
        let user = graph.user(user_id)?;
        let stats = graph.stats(user_id)?;
        let messages = graph.messages_by(user_id)?;
        let (liked, following) = match viewer {
            Some(me) => (graph.liked_ids(me)?, graph.is_following(me, user_id)?),
            None => (Vec::new(), false),
        };
        Ok((user, stats, messages, liked, following))
    })
    .await;

    match result {
        Ok((user, stats, messages, liked, following)) => Html(templates::user_show(
            session.user(),
            notice,
            &user,
            &stats,
            &messages,
            &liked,
            following,
        ))
        .into_response(),
        Err(e) => fail(&cookies, session.user(), e),
    }
}

pub async fn show_following(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Path(user_id): Path<UserId>,
) -> Response {
    follow_page(state, session, cookies, user_id, Direction::Following).await
}

pub async fn show_followers(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Path(user_id): Path<UserId>,
) -> Response {
    follow_page(state, session, cookies, user_id, Direction::Followers).await
}

#[derive(Clone, Copy)]
enum Direction {
    Following,
    Followers,
}

async fn follow_page(
    state: AppState,
    session: Session,
    cookies: Cookies,
    user_id: UserId,
    direction: Direction,
) -> Response {
    let caller = session.clone();
    let result = blocking(&state, move |s| {
        let service = MutationService::new(&s.db);
        let (user, users) = match direction {
            Direction::Following => service.following_of(&caller, user_id)?,
            Direction::Followers => service.followers_of(&caller, user_id)?,
        };
        let stats = SocialGraph::new(&s.db).stats(user_id)?;
        Ok((caller.require_viewer()?.clone(), user, users, stats))
    })
    .await;

    let heading = match direction {
        Direction::Following => "Following",
        Direction::Followers => "Followers",
    };
    match result {
        Ok((viewer, user, users, stats)) => {
            Html(templates::follow_list(&viewer, &user, &stats, heading, &users)).into_response()
        }
        Err(e) => fail(&cookies, session.user(), e),
    }
}

pub async fn show_likes(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Path(user_id): Path<UserId>,
) -> Response {
    let caller = session.clone();
    let result = blocking(&state, move |s| {
        let service = MutationService::new(&s.db);
        let (user, messages) = service.likes_of(&caller, user_id)?;
        let viewer = caller.require_viewer()?.clone();
        let graph = SocialGraph::new(&s.db);
        let liked = graph.liked_ids(viewer.id)?;
        Ok((viewer, user, messages, graph.stats(user_id)?, liked))
    })
    .await;

    match result {
        Ok((viewer, user, messages, stats, liked)) => Html(templates::likes_page(
            &viewer, &user, &stats, &messages, &liked,
        ))
        .into_response(),
        Err(e) => fail(&cookies, session.user(), e),
    }
}

/// POST /users/follow/{id}
pub async fn follow(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Path(target): Path<UserId>,
) -> Response {
    let caller = session.clone();
    let result = blocking(&state, move |s| {
        MutationService::new(&s.db).follow(&caller, target)?;
        caller.require_user()
    })
    .await;

    match result {
        Ok(me) => redirect(&format!("/users/{me}/following")),
        Err(e) => fail(&cookies, session.user(), e),
    }
}

/// POST /users/stop-following/{id}
pub async fn stop_following(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Path(target): Path<UserId>,
) -> Response {
    let caller = session.clone();
    let result = blocking(&state, move |s| {
        MutationService::new(&s.db).unfollow(&caller, target)?;
        caller.require_user()
    })
    .await;

    match result {
        Ok(me) => redirect(&format!("/users/{me}/following")),
        Err(e) => fail(&cookies, session.user(), e),
    }
}

pub async fn profile_form(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
) -> Response {
    let caller = session.clone();
    let result = blocking(&state, move |s| MutationService::new(&s.db).own_profile(&caller)).await;

    match result {
        Ok(user) => Html(templates::profile_form(&user, &user, None)).into_response(),
        Err(e) => fail(&cookies, session.user(), e),
    }
}

/// POST /users/profile: apply profile edits after re-checking the password.
///
/// Takes the raw form so the session is checked before the body.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let viewer = match session.require_viewer() {
        Ok(viewer) => viewer.clone(),
        Err(e) => return fail(&cookies, None, e),
    };

    let result = match ProfileForm::from_form(fields) {
        Ok(form) => {
            let (update, password) = form.into_parts();
            let caller = session.clone();
            blocking(&state, move |s| {
                MutationService::new(&s.db).update_profile(&caller, &update, &password)
            })
            .await
        }
        Err(e) => Err(e),
    };

    let rejection = match result {
        Ok(user) => {
            flash::set(&cookies, Flash::ProfileUpdated);
            return redirect(&format!("/users/{}", user.id));
        }
        Err(WarblerError::BadCredentials) => "Invalid password.".to_string(),
        Err(WarblerError::Type(msg) | WarblerError::Value(msg)) => msg,
        Err(e) => return fail(&cookies, Some(&viewer), e),
    };

    debug!("Profile update for user {} rejected: {}", viewer.id, rejection);
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Html(templates::profile_form(&viewer, &viewer, Some(&rejection))),
    )
        .into_response()
}

/// POST /users/delete: remove the account and end every session it had.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
) -> Response {
    let caller = session.clone();
    let result = blocking(&state, move |s| MutationService::new(&s.db).delete_account(&caller)).await;

    match result {
        Ok(user_id) => {
            let ended = state.sessions.destroy_user_sessions(user_id).await;
            debug!("Ended {} sessions for deleted user {}", ended, user_id);
            session::clear_cookie(&cookies);
            flash::set(&cookies, Flash::AccountDeleted);
            redirect("/signup")
        }
        Err(e) => fail(&cookies, session.user(), e),
    }
}
