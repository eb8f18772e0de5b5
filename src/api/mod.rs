pub mod dto;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use handlers::ApiDoc;

use crate::{
    auth::Authenticator,
    media::MediaStore,
    notify::Mailer,
    storage::{CaptureStore, ReadingStore},
};

/// Shared service handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub readings: Arc<dyn ReadingStore>,
    pub captures: Arc<dyn CaptureStore>,
    pub media: Arc<dyn MediaStore>,
    pub mailer: Arc<dyn Mailer>,
    pub auth: Arc<dyn Authenticator>,
    pub login_url: String,
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/flower/new_data", post(handlers::new_flower_data))
        .route("/email/new", post(handlers::new_email))
        .route("/health", get(handlers::health))
        .split_for_parts();

    router
        .route("/", get(handlers::index))
        .route("/flower/data", get(handlers::flower_data))
        .route("/flower/new_picture", post(handlers::new_flower_picture))
        .route(
            "/flower/new_gif",
            get(handlers::new_gif).post(handlers::new_gif),
        )
        .route("/upload_gif_finished", post(handlers::upload_gif_finished))
        .route("/flower/picture", get(handlers::flower_picture))
        .route("/flower/gif", get(handlers::flower_gif))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .with_state(state)
}
