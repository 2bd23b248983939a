use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    errors::ServiceError,
    models::NoteId,
    routes::{NoteView, auth::CurrentUser, flash::Banners, flash::Flash, render},
    startup::AppState,
};

const MAX_TITLE_CHARS: usize = 255;

#[derive(Template)]
#[template(path = "notes/form.html")]
struct NoteFormTemplate {
    banners: Banners,
    errors: Vec<String>,
    note_id: Option<NoteId>,
    title: String,
    content: String,
}

impl NoteFormTemplate {
    fn redisplay(note_id: Option<NoteId>, form: NoteForm, banners: Banners, errors: Vec<String>) -> Self {
        Self {
            banners,
            errors,
            note_id,
            title: form.title,
            content: form.content,
        }
    }
}

#[derive(Template)]
#[template(path = "notes/view.html")]
struct NoteViewTemplate {
    banners: Banners,
    note: NoteView,
}

#[derive(Debug, Deserialize)]
pub struct NoteForm {
    title: String,
    #[serde(default)]
    content: String,
}

impl NoteForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push("Title is required".to_string());
        } else if self.title.chars().count() > MAX_TITLE_CHARS {
            errors.push(format!("Title must not exceed {MAX_TITLE_CHARS} characters"));
        }
        errors
    }
}

/// Ownership and existence failures all land on the dashboard.
fn back_to_dashboard(jar: CookieJar, flash: Flash) -> Response {
    (flash.set(jar), Redirect::to("/dashboard")).into_response()
}

fn not_found_or(jar: CookieJar, err: ServiceError) -> Response {
    match err {
        ServiceError::NotFoundOrDenied => back_to_dashboard(jar, Flash::NoteNotFound),
        other => other.into_response(),
    }
}

pub async fn new_note_page(_user: CurrentUser, jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = Flash::take(jar);
    let template = NoteFormTemplate {
        banners: Banners::from(flash),
        errors: Vec::new(),
        note_id: None,
        title: String::new(),
        content: String::new(),
    };
    (jar, render(template))
}

#[instrument(name = "Web: Create note", skip(state, user, jar, form), fields(user_id = %user.0.id))]
pub async fn create_note(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
    Form(form): Form<NoteForm>,
) -> Response {
    let errors = form.validate();
    if !errors.is_empty() {
        return render(NoteFormTemplate::redisplay(None, form, Banners::default(), errors));
    }

    match state
        .note_service
        .create_note(&form.title, &form.content, &user.0)
        .await
    {
        Ok(note) => {
            tracing::info!(note_id = note.id, "Note created");
            back_to_dashboard(jar, Flash::NoteCreated)
        }
        Err(ServiceError::Validation(msg)) => render(NoteFormTemplate::redisplay(
            None,
            form,
            Banners::alert(format!("Error creating note: {msg}")),
            Vec::new(),
        )),
        Err(e) => e.into_response(),
    }
}

#[instrument(name = "Web: View note", skip(state, user, jar), fields(user_id = %user.0.id))]
pub async fn view_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<NoteId>,
    jar: CookieJar,
) -> Response {
    match state.note_service.get_note_by_id_and_user(id, &user.0).await {
        Ok(note) => {
            let (jar, flash) = Flash::take(jar);
            let template = NoteViewTemplate {
                banners: Banners::from(flash),
                note: NoteView::from(note),
            };
            (jar, render(template)).into_response()
        }
        Err(e) => not_found_or(jar, e),
    }
}

#[instrument(name = "Web: Edit note page", skip(state, user, jar), fields(user_id = %user.0.id))]
pub async fn edit_note_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<NoteId>,
    jar: CookieJar,
) -> Response {
    match state.note_service.get_note_by_id_and_user(id, &user.0).await {
        Ok(note) => {
            let (jar, flash) = Flash::take(jar);
            let template = NoteFormTemplate {
                banners: Banners::from(flash),
                errors: Vec::new(),
                note_id: Some(note.id),
                title: note.title,
                content: note.content,
            };
            (jar, render(template)).into_response()
        }
        Err(e) => not_found_or(jar, e),
    }
}

#[instrument(name = "Web: Update note", skip(state, user, jar, form), fields(user_id = %user.0.id))]
pub async fn update_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<NoteId>,
    jar: CookieJar,
    Form(form): Form<NoteForm>,
) -> Response {
    let errors = form.validate();
    if !errors.is_empty() {
        return render(NoteFormTemplate::redisplay(Some(id), form, Banners::default(), errors));
    }

    match state
        .note_service
        .update_note(id, &form.title, &form.content, &user.0)
        .await
    {
        Ok(_) => (
            Flash::NoteUpdated.set(jar),
            Redirect::to(&format!("/notes/{id}")),
        )
            .into_response(),
        Err(ServiceError::Validation(msg)) => render(NoteFormTemplate::redisplay(
            Some(id),
            form,
            Banners::alert(msg),
            Vec::new(),
        )),
        Err(e) => not_found_or(jar, e),
    }
}

#[instrument(name = "Web: Delete note", skip(state, user, jar), fields(user_id = %user.0.id))]
pub async fn delete_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<NoteId>,
    jar: CookieJar,
) -> Response {
    let flash = match state.note_service.delete_note_by_id_and_user(id, &user.0).await {
        Ok(()) => Flash::NoteDeleted,
        Err(ServiceError::NotFoundOrDenied) => Flash::NoteNotFound,
        Err(e) => {
            tracing::error!("Failed to delete note: {:?}", e);
            Flash::Unexpected
        }
    };
    back_to_dashboard(jar, flash)
}
