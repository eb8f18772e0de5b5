//! Persistence seams for readings and capture slots.
//!
//! Handlers only ever see these traits; production wires in the Postgres
//! implementations, tests substitute the in-memory ones.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;

use crate::db::models::{CaptureKind, CaptureSlot, NewCapture, NewReading, SensorReading};

/// Append-only store of telemetry readings.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Persist one reading and return it with its assigned id.
    async fn insert(&self, reading: NewReading) -> Result<SensorReading>;

    /// Up to `limit` readings ordered by `recorded_at` ascending.
    async fn list(&self, limit: i64) -> Result<Vec<SensorReading>>;
}

/// Singleton-per-kind capture storage. `replace` must be atomic: two racing
/// writers leave exactly one slot row behind, holding one of the two uploads
/// whole.
#[async_trait]
pub trait CaptureStore: Send + Sync {
    /// Replace the slot for `capture.kind` wholesale. Returns the media
    /// reference the slot held before, so the caller can release it.
    async fn replace(&self, capture: NewCapture) -> Result<Option<String>>;

    /// The current occupant of the slot, if any.
    async fn get(&self, kind: CaptureKind) -> Result<Option<CaptureSlot>>;
}
