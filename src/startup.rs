use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::configuration::Settings;
use crate::routes::auth::{login_page, login_post, logout_handler, register_page, register_post};
use crate::routes::dashboard::{dashboard_handler, home};
use crate::routes::notes::{
    create_note, delete_note, edit_note_page, new_note_page, update_note, view_note,
};
use crate::services::{Argon2Hasher, AuthService, Keys, NoteService, UserService};
use crate::store::{PgNoteRepository, PgUserRepository};

#[derive(Clone, Debug)]
pub struct AppState {
    pub user_service: UserService,
    pub note_service: NoteService,
    pub auth_service: AuthService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(login_post))
        .route("/logout", post(logout_handler))
        .route("/register", get(register_page).post(register_post))
        .route("/dashboard", get(dashboard_handler))
        .route("/notes", post(create_note))
        .route("/notes/new", get(new_note_page))
        .route("/notes/{id}", get(view_note).post(update_note))
        .route("/notes/{id}/edit", get(edit_note_page))
        .route("/notes/{id}/delete", post(delete_note))
        .nest_service("/assets", ServeDir::new("public"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(cfg: Settings) -> anyhow::Result<()> {
    let pg_pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(cfg.database.with_db());

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!("Database migrations applied");

    let user_repo = PgUserRepository::new(pg_pool.clone());
    let note_repo = PgNoteRepository::new(pg_pool);

    let user_service = UserService::new(Arc::new(user_repo), Arc::new(Argon2Hasher::default()));
    let note_service = NoteService::new(Arc::new(note_repo));
    let auth_service = AuthService::new(
        user_service.clone(),
        Keys::new(cfg.application.jwt_secret.expose_secret().as_bytes()),
        cfg.application.session_lifetime(),
    );

    let app_state = AppState {
        user_service,
        note_service,
        auth_service,
    };
    let app = router(app_state);

    let address = cfg.application.address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Listening on {}", address);
    axum::serve(listener, app).await?;
    Ok(())
}
