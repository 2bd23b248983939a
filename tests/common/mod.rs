//! Shared helpers for the HTTP integration tests.
//!
//! The router is built exactly as in production but over [`InMemoryStore`]
//! and a minimum-cost Argon2 hasher, so no database is needed.

#![allow(dead_code)]

use std::sync::Arc;

use argon2::Params;
use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tower::ServiceExt;

use notekeeper::models::{NewUser, Note, User};
use notekeeper::services::{Argon2Hasher, AuthService, Keys, NoteService, UserService};
use notekeeper::startup::{AppState, router};
use notekeeper::store::InMemoryStore;

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let hasher = Argon2Hasher::new(Params::new(8, 1, 1, None).expect("valid argon2 params"));
        let user_service = UserService::new(Arc::new(store.clone()), Arc::new(hasher));
        let note_service = NoteService::new(Arc::new(store));
        let auth_service = AuthService::new(
            user_service.clone(),
            Keys::new(b"integration-test-secret"),
            chrono::Duration::hours(1),
        );
        let state = AppState {
            user_service,
            note_service,
            auth_service,
        };
        Self {
            router: router(state.clone()),
            state,
        }
    }

    /// Registers `username` and returns the user plus a ready-to-send
    /// `Cookie` header value for its session.
    pub async fn signed_in(&self, username: &str) -> (User, String) {
        let user = self
            .state
            .user_service
            .register(NewUser::new(
                username,
                format!("{username}@example.com"),
                "password123",
            ))
            .await
            .expect("registration should succeed");
        let token = self
            .state
            .auth_service
            .issue_token(user.id)
            .expect("token issuance should succeed");
        (user, format!("jwt={token}"))
    }

    pub async fn note_for(&self, user: &User, title: &str, content: &str) -> Note {
        self.state
            .note_service
            .create_note(title, content, user)
            .await
            .expect("note creation should succeed")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(LOCATION)
        .expect("response should redirect")
        .to_str()
        .unwrap()
}

/// `name=value` pairs of every `Set-Cookie` header.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| {
            v.to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap()
                .trim()
                .to_string()
        })
        .collect()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
