//! Web page templates.

use askama::Template;

use crate::db::models::SensorReading;

/// Landing page. `notice` carries the error banner shown to authenticated
/// non-admins turned away from the capture routes.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub user: Option<String>,
    pub notice: Option<String>,
    pub login_url: String,
}

/// Reading history table, ordered by timestamp ascending.
#[derive(Template)]
#[template(path = "data.html")]
pub struct DataTemplate {
    pub user: Option<String>,
    pub login_url: String,
    pub readings: Vec<SensorReading>,
}
