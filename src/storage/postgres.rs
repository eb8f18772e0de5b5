use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{CaptureStore, ReadingStore};
use crate::db::models::{CaptureKind, CaptureSlot, NewCapture, NewReading, SensorReading};

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgReadingStore {
    pool: PgPool,
}

impl PgReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn insert(&self, reading: NewReading) -> Result<SensorReading> {
        let row = sqlx::query_as::<_, SensorReading>(
            r#"
            INSERT INTO sensor_readings
                (flower_name, grow_session, recorded_at, temperature, light,
                 water, battery, ecb, ec_porus, dli, ea)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, flower_name, grow_session, recorded_at, temperature,
                      light, water, battery, ecb, ec_porus, dli, ea
            "#,
        )
        .bind(&reading.flower_name)
        .bind(&reading.grow_session)
        .bind(reading.recorded_at)
        .bind(reading.temperature)
        .bind(reading.light)
        .bind(reading.water)
        .bind(reading.battery)
        .bind(reading.ecb)
        .bind(reading.ec_porus)
        .bind(reading.dli)
        .bind(reading.ea)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(&self, limit: i64) -> Result<Vec<SensorReading>> {
        let rows = sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT id, flower_name, grow_session, recorded_at, temperature,
                   light, water, battery, ecb, ec_porus, dli, ea
            FROM sensor_readings
            ORDER BY recorded_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Capture slots
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgCaptureStore {
    pool: PgPool,
}

impl PgCaptureStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row shape minus `kind` — slots are always addressed by kind, so it never
/// needs to round-trip.
#[derive(FromRow)]
struct SlotRow {
    content_type: String,
    data: Option<Vec<u8>>,
    media_ref: Option<String>,
    updated_at: DateTime<Utc>,
}

impl SlotRow {
    fn into_slot(self, kind: CaptureKind) -> CaptureSlot {
        CaptureSlot {
            kind,
            content_type: self.content_type,
            data: self.data,
            media_ref: self.media_ref,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait]
impl CaptureStore for PgCaptureStore {
    async fn replace(&self, capture: NewCapture) -> Result<Option<String>> {
        // Row lock on the existing slot so the previous media_ref read and
        // the upsert are one atomic step; concurrent writers serialize here.
        let mut tx = self.pool.begin().await?;

        let previous: Option<Option<String>> = sqlx::query_scalar(
            "SELECT media_ref FROM capture_slots WHERE kind = $1 FOR UPDATE",
        )
        .bind(capture.kind.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO capture_slots (kind, content_type, data, media_ref, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (kind) DO UPDATE
            SET content_type = EXCLUDED.content_type,
                data         = EXCLUDED.data,
                media_ref    = EXCLUDED.media_ref,
                updated_at   = EXCLUDED.updated_at
            "#,
        )
        .bind(capture.kind.as_str())
        .bind(&capture.content_type)
        .bind(&capture.data)
        .bind(&capture.media_ref)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(previous.flatten())
    }

    async fn get(&self, kind: CaptureKind) -> Result<Option<CaptureSlot>> {
        let row = sqlx::query_as::<_, SlotRow>(
            "SELECT content_type, data, media_ref, updated_at FROM capture_slots WHERE kind = $1",
        )
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_slot(kind)))
    }
}
