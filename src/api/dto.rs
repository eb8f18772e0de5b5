use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /email/new`. Forwarded verbatim — the service adds
/// only the configured sender address.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EmailRequest {
    pub receiver: String,
    pub subject: String,
    pub body: String,
}
