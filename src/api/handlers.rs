use askama::Template;
use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use tracing::{info, warn};
use utoipa::OpenApi;

use super::{dto::EmailRequest, errors::ApiError, AppState};
use crate::{
    auth::{Authenticator, Visitor},
    db::models::{CaptureKind, CaptureSlot, NewCapture, NewReading},
    ingest::ReadingPayload,
    media::MediaStore,
    notify::{Mailer, OutgoingEmail},
    storage::{CaptureStore, ReadingStore},
    templates::{DataTemplate, IndexTemplate},
};

/// Cap on rows shown by the data page.
const DATA_PAGE_LIMIT: i64 = 1000;

/// Multipart field name the webcam posts its snapshot under.
const SNAPSHOT_FIELD: &str = "webcam.jpg";

/// Multipart field name of the finished animation upload.
const ANIMATION_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Ingest one telemetry reading. The body is parsed leniently (values may be
/// strings or numbers) but validated strictly: one bad field rejects the
/// whole record.
#[utoipa::path(
    post,
    path = "/flower/new_data",
    request_body = ReadingPayload,
    responses(
        (status = 200, description = "Reading stored", body = String),
        (status = 400, description = "Missing or malformed field"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "telemetry"
)]
pub async fn new_flower_data(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<&'static str, ApiError> {
    let payload: ReadingPayload = serde_json::from_value(body)?;
    let reading = NewReading::try_from(payload)?;
    let stored = state.readings.insert(reading).await?;

    info!(
        id = %stored.id,
        flower = %stored.flower_name,
        session = %stored.grow_session,
        recorded_at = %stored.recorded_at,
        "telemetry reading ingested"
    );
    Ok("Success")
}

// ---------------------------------------------------------------------------
// Capture uploads
// ---------------------------------------------------------------------------

/// Replace the webcam snapshot slot with the uploaded bytes.
pub async fn new_flower_picture(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<&'static str, ApiError> {
    let (content_type, bytes) = read_part(multipart, SNAPSHOT_FIELD, "image/jpeg").await?;
    let size = bytes.len();
    state
        .captures
        .replace(NewCapture::snapshot(bytes, content_type))
        .await?;

    info!(bytes = size, "webcam snapshot replaced");
    Ok("Success")
}

/// Hand out the destination for the animation upload that follows.
pub async fn new_gif() -> &'static str {
    "/upload_gif_finished"
}

/// Receive the finished animation upload: park the bytes in the media store,
/// swing the slot over to the fresh reference, then release the old file.
/// The response echoes the stored reference.
pub async fn upload_gif_finished(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<String, ApiError> {
    let (content_type, bytes) = read_part(multipart, ANIMATION_FIELD, "image/gif").await?;
    let media_ref = state
        .media
        .store(extension_for(&content_type), &bytes)
        .await?;

    let previous = state
        .captures
        .replace(NewCapture::animation(media_ref.clone(), content_type))
        .await?;

    // The slot has already moved on; a file we fail to remove is only
    // orphaned disk space.
    if let Some(previous) = previous {
        if let Err(e) = state.media.remove(&previous).await {
            warn!(media_ref = %previous, error = %e, "failed to remove replaced media file");
        }
    }

    info!(media_ref = %media_ref, "animation replaced");
    Ok(media_ref)
}

/// Pull the bytes of the multipart field named `field`, falling back to
/// `default_content_type` when the part does not declare one.
async fn read_part(
    mut multipart: Multipart,
    field: &str,
    default_content_type: &str,
) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(part) = multipart.next_field().await? {
        if part.name() != Some(field) {
            continue;
        }
        let content_type = part
            .content_type()
            .unwrap_or(default_content_type)
            .to_owned();
        let bytes = part.bytes().await?;
        return Ok((content_type, bytes.to_vec()));
    }
    Err(ApiError::Validation(format!(
        "multipart field {field:?} is required"
    )))
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/gif" => "gif",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "video/webm" => "webm",
        _ => "bin",
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Forward one notification email to the SMTP relay.
#[utoipa::path(
    post,
    path = "/email/new",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Notification submitted", body = String),
        (status = 400, description = "Malformed body or recipient"),
        (status = 500, description = "Mail transport failure"),
    ),
    tag = "notifications"
)]
pub async fn new_email(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<&'static str, ApiError> {
    let request: EmailRequest = serde_json::from_value(body)?;
    state
        .mailer
        .send(OutgoingEmail {
            receiver: request.receiver,
            subject: request.subject,
            body: request.body,
        })
        .await?;
    Ok("Success")
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, ApiError> {
    let page = IndexTemplate {
        user: state.auth.identify(&headers).name().map(ToOwned::to_owned),
        notice: None,
        login_url: state.login_url.clone(),
    };
    Ok(Html(page.render()?))
}

pub async fn flower_data(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, ApiError> {
    let readings = state.readings.list(DATA_PAGE_LIMIT).await?;
    let page = DataTemplate {
        user: state.auth.identify(&headers).name().map(ToOwned::to_owned),
        login_url: state.login_url.clone(),
        readings,
    };
    Ok(Html(page.render()?))
}

// ---------------------------------------------------------------------------
// Gated capture reads
// ---------------------------------------------------------------------------

pub async fn flower_picture(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve_capture(&state, &headers, CaptureKind::Snapshot, "/flower/picture").await
}

pub async fn flower_gif(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve_capture(&state, &headers, CaptureKind::Animation, "/flower/gif").await
}

/// Shared admin gate and slot read for the two capture routes.
async fn serve_capture(
    state: &AppState,
    headers: &HeaderMap,
    kind: CaptureKind,
    path: &str,
) -> Result<Response, ApiError> {
    let viewer = match state.auth.identify(headers) {
        Visitor::Anonymous => {
            let target = format!("{}?next={path}", state.login_url);
            return Ok(Redirect::to(&target).into_response());
        }
        Visitor::Known {
            name,
            is_admin: false,
        } => {
            let page = IndexTemplate {
                user: Some(name),
                notice: Some("Only Admins allowed for Webcam".to_owned()),
                login_url: state.login_url.clone(),
            };
            return Ok((StatusCode::FORBIDDEN, Html(page.render()?)).into_response());
        }
        Visitor::Known { name, .. } => name,
    };

    let CaptureSlot {
        content_type,
        data,
        media_ref,
        updated_at,
        ..
    } = state.captures.get(kind).await?.ok_or(ApiError::NotFound)?;

    let (content_type, bytes) = match kind {
        // Snapshot payloads are JPEG but are served under an image/png
        // label; the webcam page depends on that header.
        CaptureKind::Snapshot => {
            ("image/png".to_owned(), data.ok_or(ApiError::NotFound)?)
        }
        CaptureKind::Animation => {
            let media_ref = media_ref.ok_or(ApiError::NotFound)?;
            let bytes = state
                .media
                .load(&media_ref)
                .await?
                .ok_or(ApiError::NotFound)?;
            (content_type, bytes)
        }
    };

    info!(
        kind = %kind,
        viewer = %viewer,
        bytes = bytes.len(),
        captured_at = %updated_at,
        "capture served"
    );
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(new_flower_data, new_email, health),
    components(schemas(ReadingPayload, EmailRequest)),
    tags(
        (name = "telemetry", description = "Sensor telemetry endpoints"),
        (name = "notifications", description = "Outgoing notification endpoints"),
        (name = "system",  description = "System endpoints"),
    ),
    info(
        title = "Flower Station API",
        version = "0.1.0",
        description = "Telemetry ingestion, capture slots and notifications for the home gardening project"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
