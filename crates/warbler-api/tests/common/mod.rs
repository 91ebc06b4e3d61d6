//! In-process client for driving the router: keeps a cookie jar and can
//! follow redirects.

#![allow(dead_code)]

use std::collections::HashMap;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use tower::ServiceExt;

use warbler_api::authenticator::Authenticator;
use warbler_api::session::SESSION_COOKIE;
use warbler_api::{AppState, AppStateInner};
use warbler_db::Database;
use warbler_types::api::SignupRequest;
use warbler_types::models::{Message, User};

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

pub struct TestClient {
    pub state: AppState,
    router: Router,
    jar: HashMap<String, String>,
}

impl TestClient {
    pub fn new() -> Self {
        let db = Database::open_in_memory().unwrap();
        let state = AppStateInner::new(db);
        let router = warbler_api::router(state.clone());
        Self {
            state,
            router,
            jar: HashMap::new(),
        }
    }

    pub fn signup(&self, username: &str, email: &str, password: &str) -> User {
        Authenticator::new(&self.state.db)
            .signup(&SignupRequest::new(username, email, password, None))
            .unwrap()
    }

    pub fn post_message(&self, user: &User, text: &str) -> Message {
        let row = self.state.db.insert_message(text, user.id).unwrap();
        row.into_message()
    }

    /// Opens a session for `user` and stores its cookie.
    pub async fn login_as(&mut self, user: &User) {
        let token = self.state.sessions.create_session(user.id).await;
        self.jar.insert(SESSION_COOKIE.to_string(), token);
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let req = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn post(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        let req = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(encode_form(form)))
            .unwrap();
        self.send(req).await
    }

    /// Follows 302s with GET until a non-redirect response.
    pub async fn follow(&mut self, mut resp: TestResponse) -> TestResponse {
        for _ in 0..5 {
            if resp.status != StatusCode::FOUND {
                return resp;
            }
            let to = resp.location.clone().expect("redirect without Location");
            resp = self.get(&to).await;
        }
        panic!("too many redirects");
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.jar.is_empty() {
            let cookie = self
                .jar
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn send(&mut self, req: Request<Body>) -> TestResponse {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();

        for value in resp.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let pair = raw.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                if value.is_empty() {
                    self.jar.remove(name.trim());
                } else {
                    self.jar.insert(name.trim().to_string(), value.to_string());
                }
            }
        }

        let location = resp
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

fn encode_form(form: &[(&str, &str)]) -> String {
    form.iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
