//! HTML templates for the web interface
//!
//! Simple inline HTML templates without a template engine. Class names follow
//! Bootstrap so a stock stylesheet can be dropped in.

use warbler_types::api::MESSAGE_MAX_LEN;
use warbler_types::models::{Message, MessageId, ProfileStats, User};

use crate::flash::Flash;

const COMMON_STYLES: &str = r#"
    body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Arial, sans-serif; background: #f5f8fa; margin: 0; }
    .navbar { background: #fff; border-bottom: 1px solid #e6ecf0; padding: 10px 20px; display: flex; gap: 16px; align-items: center; }
    .container { max-width: 900px; margin: 20px auto; padding: 0 20px; }
    .alert { padding: 10px 14px; border-radius: 4px; margin-bottom: 16px; }
    .alert-danger { background: #f8d7da; color: #721c24; }
    .alert-success { background: #d4edda; color: #155724; }
    .alert-info { background: #d1ecf1; color: #0c5460; }
    .list-group { list-style: none; padding: 0; }
    .list-group-item { background: #fff; border: 1px solid #e6ecf0; padding: 12px; margin-bottom: -1px; }
    .timeline-image { width: 48px; height: 48px; border-radius: 50%; }
    .card { background: #fff; border: 1px solid #e6ecf0; padding: 12px; margin-bottom: 12px; }
    .join-message { text-align: center; }
    .single-message { font-size: 1.4em; }
    .text-muted { color: #657786; }
"#;

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn navbar(viewer: Option<&User>) -> String {
    let links = match viewer {
        Some(user) => format!(
            r#"<a href="/users/{id}">@{name}</a>
        <a href="/messages/new">New Message</a>
        <a href="/logout">Log out</a>"#,
            id = user.id,
            name = html_escape(&user.username),
        ),
        None => r#"<a href="/signup">Sign up</a>
        <a href="/login">Log in</a>"#
            .to_string(),
    };

    format!(
        r#"<nav class="navbar">
        <a href="/"><strong>Warbler</strong></a>
        <form action="/users" method="GET">
            <input name="q" placeholder="Search Warbler">
        </form>
        {links}
    </nav>"#
    )
}

fn flash_html(flash: Option<Flash>) -> String {
    flash.map_or(String::new(), |f| {
        format!(r#"<div class="alert alert-{}">{}</div>"#, f.category(), f.text())
    })
}

fn error_html(error: Option<&str>) -> String {
    error.map_or(String::new(), |e| {
        format!(r#"<div class="alert alert-danger">{}</div>"#, html_escape(e))
    })
}

fn layout(title: &str, viewer: Option<&User>, flash: Option<Flash>, body: &str) -> String {
    let nav = navbar(viewer);
    let flash = flash_html(flash);
    let title = html_escape(title);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title} | Warbler</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    {nav}
    <div class="container">
        {flash}
        {body}
    </div>
</body>
</html>"#
    )
}

fn like_button(message: &Message, liked: bool) -> String {
    let (action, label) = if liked {
        ("unlike", "Unlike")
    } else {
        ("like", "Like")
    };
    format!(
        r#"<form method="POST" action="/messages/{action}/{id}" class="messages-like">
                <button type="submit">{label}</button>
            </form>"#,
        id = message.id,
    )
}

fn message_list(messages: &[Message], liked: &[MessageId], viewer: Option<&User>) -> String {
    if messages.is_empty() {
        return r#"<p class="text-muted">No messages yet.</p>"#.to_string();
    }
    let items: String = messages
        .iter()
        .map(|m| {
            let button = if viewer.is_some() {
                like_button(m, liked.contains(&m.id))
            } else {
                String::new()
            };
            format!(
                r#"<li class="list-group-item">
            <a href="/messages/{id}"><img src="{avatar}" alt="" class="timeline-image"></a>
            <div class="message-area">
                <a href="/users/{user_id}">@{name}</a>
                <span class="text-muted">{ts}</span>
                <p>{text}</p>
            </div>
            {button}
        </li>"#,
                id = m.id,
                avatar = html_escape(m.author_avatar()),
                user_id = m.user_id,
                name = html_escape(&m.username),
                ts = m.timestamp.format("%d %B %Y"),
                text = html_escape(&m.text),
            )
        })
        .collect();
    format!(r#"<ul class="list-group" id="messages">{items}</ul>"#)
}

fn user_cards(users: &[User]) -> String {
    if users.is_empty() {
        return r#"<p class="text-muted">Nobody here yet.</p>"#.to_string();
    }
    users
        .iter()
        .map(|u| {
            let bio = u
                .bio
                .as_deref()
                .map(|b| format!(r#"<p class="card-bio">{}</p>"#, html_escape(b)))
                .unwrap_or_default();
            format!(
                r#"<div class="card user-card">
            <a href="/users/{id}">
                <img src="{avatar}" alt="" class="timeline-image">
                <p>@{name}</p>
            </a>
            {bio}
        </div>"#,
                id = u.id,
                avatar = html_escape(u.avatar()),
                name = html_escape(&u.username),
            )
        })
        .collect()
}

/// Header, sidebar and stat counts shared by every per-user page.
fn profile_frame(viewer: Option<&User>, user: &User, stats: &ProfileStats, content: &str) -> String {
    let bio = user.bio.as_deref().map(html_escape).unwrap_or_default();
    let location = user.location.as_deref().map(html_escape).unwrap_or_default();
    let owner_actions = match viewer {
        Some(v) if v.id == user.id => r#"<a href="/users/profile">Edit Profile</a>
            <form method="POST" action="/users/delete">
                <button type="submit">Delete Profile</button>
            </form>"#
            .to_string(),
        _ => String::new(),
    };

    format!(
        r#"<div id="warbler-hero" style="background-image: url('{header}')"></div>
        <img src="{avatar}" alt="Image for {name}" id="profile-avatar">
        <ul class="user-stats">
            <li>Messages <a href="/users/{id}">{messages}</a></li>
            <li>Following <a href="/users/{id}/following">{following}</a></li>
            <li>Followers <a href="/users/{id}/followers">{followers}</a></li>
            <li>Likes <a href="/users/{id}/likes">{likes}</a></li>
        </ul>
        <aside id="sidebar">
            <h4 id="sidebar-username">@{name}</h4>
            <p class="user-bio">{bio}</p>
            <p class="user-location">{location}</p>
            {owner_actions}
        </aside>
        <section class="profile-content">
            {content}
        </section>"#,
        header = html_escape(user.header_image()),
        avatar = html_escape(user.avatar()),
        name = html_escape(&user.username),
        id = user.id,
        messages = stats.messages,
        following = stats.following,
        followers = stats.followers,
        likes = stats.likes,
    )
}

// -- Pages --

/// Landing page for anonymous visitors.
pub fn home_anon(flash: Option<Flash>) -> String {
    let body = r#"<div class="home-hero">
            <h1>What's Happening?</h1>
            <h4>New to Warbler?</h4>
            <p>Sign up now to get your own personalized timeline!</p>
            <a href="/signup" class="btn btn-primary">Sign up</a>
        </div>"#;
    layout("Home", None, flash, body)
}

/// Timeline for a signed-in user.
pub fn home(viewer: &User, flash: Option<Flash>, messages: &[Message], liked: &[MessageId]) -> String {
    let list = message_list(messages, liked, Some(viewer));
    let body = format!(
        r#"<aside class="home-sidebar">
            <a href="/users/{id}"><h4>@{name}</h4></a>
        </aside>
        <section class="timeline">
            {list}
        </section>"#,
        id = viewer.id,
        name = html_escape(&viewer.username),
    );
    layout("Home", Some(viewer), flash, &body)
}

pub fn signup_page(flash: Option<Flash>, error: Option<&str>) -> String {
    let error = error_html(error);
    let body = format!(
        r#"<h2 class="join-message">Join Warbler today.</h2>
        {error}
        <form method="POST" action="/signup" id="user_form">
            <input name="username" placeholder="Username" required>
            <input name="email" type="email" placeholder="E-mail" required>
            <input name="password" type="password" placeholder="Password" required>
            <input name="image_url" placeholder="(Optional) Image URL">
            <button type="submit">Sign me up!</button>
        </form>"#
    );
    layout("Sign up", None, flash, &body)
}

pub fn login_page(flash: Option<Flash>, error: Option<&str>) -> String {
    let error = error_html(error);
    let body = format!(
        r#"<h2 class="join-message">Welcome back.</h2>
        {error}
        <form method="POST" action="/login" id="user_form">
            <input name="username" placeholder="Username" required>
            <input name="password" type="password" placeholder="Password" required>
            <button type="submit">Log in</button>
        </form>"#
    );
    layout("Log in", None, flash, &body)
}

pub fn users_index(viewer: Option<&User>, users: &[User], search: Option<&str>) -> String {
    let heading = match search {
        Some(q) => format!("<h3>Results for '{}'</h3>", html_escape(q)),
        None => "<h3>All users</h3>".to_string(),
    };
    let cards = user_cards(users);
    let body = format!(r#"{heading}<div class="user-list">{cards}</div>"#);
    layout("Users", viewer, None, &body)
}

pub fn user_show(
    viewer: Option<&User>,
    flash: Option<Flash>,
    user: &User,
    stats: &ProfileStats,
    messages: &[Message],
    liked: &[MessageId],
    is_following: bool,
) -> String {
    let follow = match viewer {
        Some(v) if v.id != user.id => {
            let (action, label) = if is_following {
                ("stop-following", "Unfollow")
            } else {
                ("follow", "Follow")
            };
            format!(
                r#"<form method="POST" action="/users/{action}/{id}">
                <button type="submit">{label}</button>
            </form>"#,
                id = user.id,
            )
        }
        _ => String::new(),
    };
    let list = message_list(messages, liked, viewer);
    let content = format!("{follow}{list}");
    let body = profile_frame(viewer, user, stats, &content);
    layout(&user.username, viewer, flash, &body)
}

/// Following or followers list for `user`.
pub fn follow_list(
    viewer: &User,
    user: &User,
    stats: &ProfileStats,
    heading: &str,
    users: &[User],
) -> String {
    let content = format!(
        r#"<h3>{heading}</h3><div class="user-list">{cards}</div>"#,
        heading = html_escape(heading),
        cards = user_cards(users),
    );
    let body = profile_frame(Some(viewer), user, stats, &content);
    layout(heading, Some(viewer), None, &body)
}

pub fn likes_page(
    viewer: &User,
    user: &User,
    stats: &ProfileStats,
    messages: &[Message],
    liked: &[MessageId],
) -> String {
    let content = format!(
        r#"<h3>Liked messages</h3>{}"#,
        message_list(messages, liked, Some(viewer))
    );
    let body = profile_frame(Some(viewer), user, stats, &content);
    layout("Likes", Some(viewer), None, &body)
}

pub fn message_show(viewer: Option<&User>, flash: Option<Flash>, message: &Message, liked: bool) -> String {
    let actions = match viewer {
        Some(v) => {
            let delete = if v.id == message.user_id {
                format!(
                    r#"<form method="POST" action="/messages/{id}/delete">
                <button type="submit">Delete</button>
            </form>"#,
                    id = message.id,
                )
            } else {
                String::new()
            };
            let label = if liked { "Unlike" } else { "Like" };
            format!(
                r#"<form method="POST" action="/messages/{id}">
                <button type="submit">{label}</button>
            </form>
            {delete}"#,
                id = message.id,
            )
        }
        None => String::new(),
    };
    let body = format!(
        r#"<div class="message-detail">
            <a href="/users/{user_id}"><img src="{avatar}" alt="" class="timeline-image"></a>
            <a href="/users/{user_id}">@{name}</a>
            <span class="text-muted">{ts}</span>
            <p class="single-message">{text}</p>
            {actions}
        </div>"#,
        user_id = message.user_id,
        avatar = html_escape(message.author_avatar()),
        name = html_escape(&message.username),
        ts = message.timestamp.format("%d %B %Y %H:%M"),
        text = html_escape(&message.text),
    );
    layout("Message", viewer, flash, &body)
}

pub fn new_message_page(viewer: &User, error: Option<&str>, text: &str) -> String {
    let error = error_html(error);
    let body = format!(
        r#"<h2>What's happening?</h2>
        {error}
        <form method="POST" action="/messages/new">
            <textarea name="text" maxlength="{MESSAGE_MAX_LEN}" placeholder="What's happening?">{text}</textarea>
            <button type="submit">Add my message!</button>
        </form>"#,
        text = html_escape(text),
    );
    layout("New message", Some(viewer), None, &body)
}

pub fn profile_form(viewer: &User, user: &User, error: Option<&str>) -> String {
    let error = error_html(error);
    let field = |v: Option<&str>| v.map(html_escape).unwrap_or_default();
    let body = format!(
        r#"<h2 class="join-message">Edit Your Profile.</h2>
        {error}
        <form method="POST" action="/users/profile" id="user_form">
            <input name="username" value="{username}" placeholder="Username">
            <input name="email" type="email" value="{email}" placeholder="E-mail">
            <input name="image_url" value="{image_url}" placeholder="(Optional) Image URL">
            <input name="header_image_url" value="{header}" placeholder="(Optional) Header Image URL">
            <textarea name="bio" placeholder="(Optional) Tell us about yourself">{bio}</textarea>
            <input name="location" value="{location}" placeholder="(Optional) Location">
            <p>To confirm changes, enter your password:</p>
            <input name="password" type="password" placeholder="Password">
            <button type="submit">Edit this user!</button>
            <a href="/users/{id}">Cancel</a>
        </form>"#,
        username = html_escape(&user.username),
        email = html_escape(&user.email),
        image_url = field(user.image_url.as_deref()),
        header = field(user.header_image_url.as_deref()),
        bio = field(user.bio.as_deref()),
        location = field(user.location.as_deref()),
        id = user.id,
    );
    layout("Edit profile", Some(viewer), None, &body)
}

pub fn error_page(viewer: Option<&User>, title: &str, message: &str) -> String {
    let body = format!(
        r#"<div class="error-page">
            <h2>{title}</h2>
            <p>{message}</p>
            <a href="/">Back home</a>
        </div>"#,
        title = html_escape(title),
        message = html_escape(message),
    );
    layout(title, viewer, None, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            username: "<b>bob</b>".into(),
            email: "bob@test.com".into(),
            image_url: None,
            header_image_url: None,
            bio: Some("hi & bye".into()),
            location: None,
        }
    }

    #[test]
    fn user_content_is_escaped() {
        let html = user_show(None, None, &user(), &ProfileStats::default(), &[], &[], false);
        assert!(html.contains(r#"<h4 id="sidebar-username">@&lt;b&gt;bob&lt;/b&gt;</h4>"#));
        assert!(html.contains("hi &amp; bye"));
        assert!(!html.contains("<b>bob</b>"));
    }

    #[test]
    fn anonymous_landing_shows_flash_and_call_to_action() {
        let html = home_anon(Some(Flash::Unauthorized));
        assert!(html.contains(r#"<div class="alert alert-danger">Access unauthorized.</div>"#));
        assert!(html.contains("<p>Sign up now to get your own personalized timeline!</p>"));
    }

    #[test]
    fn profile_form_is_prefilled() {
        let u = user();
        let html = profile_form(&u, &u, None);
        assert!(html.contains(r#"id="user_form""#));
        assert!(html.contains(r#"value="bob@test.com""#));
    }
}
