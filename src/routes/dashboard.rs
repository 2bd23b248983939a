use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    routes::{NoteView, auth::CurrentUser, flash::Banners, flash::Flash, render},
    startup::AppState,
};

#[derive(Template)]
#[template(path = "notes/dashboard.html")]
struct DashboardTemplate {
    banners: Banners,
    username: String,
    notes: Vec<NoteView>,
    note_count: usize,
    total_count: i64,
    search: String,
}

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    search: Option<String>,
}

pub async fn home() -> Redirect {
    Redirect::to("/dashboard")
}

#[instrument(
    name = "Web: Dashboard",
    skip(state, user, jar, params),
    fields(user_id = %user.0.id)
)]
pub async fn dashboard_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<DashboardParams>,
    jar: CookieJar,
) -> Response {
    let CurrentUser(user) = user;
    let search = params.search.unwrap_or_default();

    let notes = match state.note_service.search_notes(&user, Some(&search)).await {
        Ok(notes) => notes,
        Err(e) => return e.into_response(),
    };
    let total_count = match state.note_service.count_notes_by_user(&user).await {
        Ok(count) => count,
        Err(e) => return e.into_response(),
    };

    let (jar, flash) = Flash::take(jar);
    let template = DashboardTemplate {
        banners: Banners::from(flash),
        username: user.username,
        note_count: notes.len(),
        notes: notes.into_iter().map(NoteView::from).collect(),
        total_count,
        search: search.trim().to_string(),
    };
    (jar, render(template)).into_response()
}
