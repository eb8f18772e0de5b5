use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One immutable telemetry record. Rows are only ever inserted — there is no
/// update or delete path, and duplicates across (flower_name, grow_session,
/// recorded_at) are accepted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SensorReading {
    pub id: Uuid,
    pub flower_name: String,
    pub grow_session: String,
    /// Wall-clock time reported by the sensor, no timezone attached.
    pub recorded_at: NaiveDateTime,
    pub temperature: f64,
    pub light: i64,
    pub water: f64,
    pub battery: i64,
    pub ecb: f64,
    pub ec_porus: f64,
    pub dli: f64,
    pub ea: f64,
}

/// A validated reading ready to be persisted; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub flower_name: String,
    pub grow_session: String,
    pub recorded_at: NaiveDateTime,
    pub temperature: f64,
    pub light: i64,
    pub water: f64,
    pub battery: i64,
    pub ecb: f64,
    pub ec_porus: f64,
    pub dli: f64,
    pub ea: f64,
}

// ---------------------------------------------------------------------------
// Capture slots
// ---------------------------------------------------------------------------

/// The two singleton capture slots. The string form is the slot's primary key
/// in `capture_slots`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    Snapshot,
    Animation,
}

impl CaptureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureKind::Snapshot => "snapshot",
            CaptureKind::Animation => "animation",
        }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current occupant of a capture slot. Snapshots carry their bytes
/// inline (`data`), animations carry a media-store reference (`media_ref`).
#[derive(Debug, Clone)]
pub struct CaptureSlot {
    pub kind: CaptureKind,
    pub content_type: String,
    pub data: Option<Vec<u8>>,
    pub media_ref: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Replacement content for a capture slot.
#[derive(Debug, Clone)]
pub struct NewCapture {
    pub kind: CaptureKind,
    pub content_type: String,
    pub data: Option<Vec<u8>>,
    pub media_ref: Option<String>,
}

impl NewCapture {
    pub fn snapshot(data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            kind: CaptureKind::Snapshot,
            content_type: content_type.into(),
            data: Some(data),
            media_ref: None,
        }
    }

    pub fn animation(media_ref: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            kind: CaptureKind::Animation,
            content_type: content_type.into(),
            data: None,
            media_ref: Some(media_ref.into()),
        }
    }
}
