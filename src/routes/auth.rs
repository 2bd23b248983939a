use askama::Template;
use axum::Form;
use axum::RequestPartsExt;
use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::TypedHeader;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::headers::{Authorization, authorization::Bearer};
use email_address::EmailAddress;
use serde::Deserialize;
use tracing::instrument;

use crate::errors::{AuthError, ServiceError};
use crate::models::{NewUser, User};
use crate::routes::flash::{Banners, Flash};
use crate::routes::render;
use crate::startup::AppState;

pub const SESSION_COOKIE: &str = "jwt";

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    banners: Banners,
    username: String,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    banners: Banners,
    errors: Vec<String>,
    username: String,
    email: String,
}

impl RegisterTemplate {
    fn redisplay(form: RegisterForm, banners: Banners, errors: Vec<String>) -> Self {
        Self {
            banners,
            errors,
            username: form.username,
            email: form.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    error: Option<String>,
    logout: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    username: String,
    email: String,
    password: String,
    confirm_password: String,
}

impl RegisterForm {
    /// Returns an empty `Vec` if valid; otherwise human-readable errors.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let username_len = self.username.trim().chars().count();
        if !(3..=50).contains(&username_len) {
            errors.push("Username must be between 3 and 50 characters".to_string());
        }

        if !EmailAddress::is_valid(self.email.trim()) {
            errors.push("Please provide a valid email address".to_string());
        }

        if self.password.chars().count() < 6 {
            errors.push("Password must be at least 6 characters long".to_string());
        }

        errors
    }
}

/// The authenticated user, resolved from the session cookie or a bearer token.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    #[instrument(name = "Resolving current user", skip(parts, state))]
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie_token = parts
            .extract::<CookieJar>()
            .await
            .ok()
            .and_then(|jar| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()));

        let token = if let Some(t) = cookie_token {
            t
        } else {
            let TypedHeader(Authorization(bearer)) = parts
                .extract::<TypedHeader<Authorization<Bearer>>>()
                .await
                .map_err(|_| {
                    tracing::debug!("No session found in cookies or headers");
                    AuthError::InvalidToken
                })?;
            bearer.token().to_string()
        };

        let user = state.auth_service.authenticate(&token).await?;
        Ok(CurrentUser(user))
    }
}

pub async fn login_page(Query(params): Query<LoginParams>, jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = Flash::take(jar);
    let mut banners = Banners::from(flash);
    if params.error.is_some() {
        banners.alert = Some("Invalid username or password".into());
    }
    if params.logout.is_some() {
        banners.notice = Some("You have been logged out successfully".into());
    }

    let template = LoginTemplate {
        banners,
        username: String::new(),
    };
    (jar, render(template))
}

#[instrument(name = "Web: Login POST", skip(state, jar, payload))]
pub async fn login_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(payload): Form<LoginForm>,
) -> Result<impl IntoResponse, AuthError> {
    tracing::info!("Request to login user received");
    let user = state
        .auth_service
        .login(payload.username.trim(), &payload.password)
        .await?;

    let token = state.auth_service.issue_token(user.id)?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((jar.add(cookie), Redirect::to("/dashboard")))
}

#[instrument(name = "Web: Logout", skip(jar))]
pub async fn logout_handler(jar: CookieJar) -> impl IntoResponse {
    let updated_jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (updated_jar, Redirect::to("/login?logout"))
}

pub async fn register_page(jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = Flash::take(jar);
    let template = RegisterTemplate {
        banners: Banners::from(flash),
        errors: Vec::new(),
        username: String::new(),
        email: String::new(),
    };
    (jar, render(template))
}

#[instrument(name = "Web: Register POST", skip(state, jar, form), fields(username = %form.username))]
pub async fn register_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let errors = form.validate();
    if !errors.is_empty() {
        return render(RegisterTemplate::redisplay(form, Banners::default(), errors));
    }

    if form.password != form.confirm_password {
        let banners = Banners::alert("Passwords do not match");
        return render(RegisterTemplate::redisplay(form, banners, Vec::new()));
    }

    let new_user = NewUser::new(form.username.trim(), form.email.trim(), form.password.as_str());
    match state.user_service.register(new_user).await {
        Ok(_) => (Flash::Registered.set(jar), Redirect::to("/login")).into_response(),
        Err(e @ ServiceError::DuplicateIdentity(_)) => {
            let banners = Banners::alert(e.to_string());
            render(RegisterTemplate::redisplay(form, banners, Vec::new()))
        }
        Err(e) => e.into_response(),
    }
}
