use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CaptureStore, ReadingStore};
use crate::db::models::{CaptureKind, CaptureSlot, NewCapture, NewReading, SensorReading};

/// In-memory [`ReadingStore`], used by the handler tests.
///
/// Wrapped in `Arc` so it can be cheaply cloned into the router state while
/// the test keeps a handle for assertions.
#[derive(Clone, Default)]
pub struct MemoryReadingStore {
    inner: Arc<RwLock<Vec<SensorReading>>>,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[async_trait]
impl ReadingStore for MemoryReadingStore {
    async fn insert(&self, reading: NewReading) -> Result<SensorReading> {
        let row = SensorReading {
            id: Uuid::new_v4(),
            flower_name: reading.flower_name,
            grow_session: reading.grow_session,
            recorded_at: reading.recorded_at,
            temperature: reading.temperature,
            light: reading.light,
            water: reading.water,
            battery: reading.battery,
            ecb: reading.ecb,
            ec_porus: reading.ec_porus,
            dli: reading.dli,
            ea: reading.ea,
        };
        self.inner.write().await.push(row.clone());
        Ok(row)
    }

    async fn list(&self, limit: i64) -> Result<Vec<SensorReading>> {
        let mut rows = self.inner.read().await.clone();
        rows.sort_by_key(|r| r.recorded_at);
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

/// In-memory [`CaptureStore`]. A `HashMap` keyed by [`CaptureKind`] under a
/// single write lock gives the same replace-is-atomic guarantee the Postgres
/// upsert does.
#[derive(Clone, Default)]
pub struct MemoryCaptureStore {
    inner: Arc<RwLock<HashMap<CaptureKind, CaptureSlot>>>,
}

impl MemoryCaptureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CaptureStore for MemoryCaptureStore {
    async fn replace(&self, capture: NewCapture) -> Result<Option<String>> {
        let slot = CaptureSlot {
            kind: capture.kind,
            content_type: capture.content_type,
            data: capture.data,
            media_ref: capture.media_ref,
            updated_at: Utc::now(),
        };
        let kind = slot.kind;
        let previous = self.inner.write().await.insert(kind, slot);
        Ok(previous.and_then(|s| s.media_ref))
    }

    async fn get(&self, kind: CaptureKind) -> Result<Option<CaptureSlot>> {
        Ok(self.inner.read().await.get(&kind).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::ingest::TIMESTAMP_FORMAT;

    fn reading(flower: &str, recorded_at: &str) -> NewReading {
        NewReading {
            flower_name: flower.to_owned(),
            grow_session: "s1".to_owned(),
            recorded_at: NaiveDateTime::parse_from_str(recorded_at, TIMESTAMP_FORMAT).unwrap(),
            temperature: 21.5,
            light: 300,
            water: 1.2,
            battery: 80,
            ecb: 0.5,
            ec_porus: 0.3,
            dli: 12.4,
            ea: 0.1,
        }
    }

    #[tokio::test]
    async fn list_orders_by_recorded_at_ascending() {
        let store = MemoryReadingStore::new();
        store.insert(reading("b", "2021-05-02 08:00:00")).await.unwrap();
        store.insert(reading("a", "2021-05-01 08:00:00")).await.unwrap();
        store.insert(reading("c", "2021-05-03 08:00:00")).await.unwrap();

        let rows = store.list(1000).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.flower_name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn list_honours_limit() {
        let store = MemoryReadingStore::new();
        for hour in 10..14 {
            store
                .insert(reading("x", &format!("2021-05-01 {hour}:00:00")))
                .await
                .unwrap();
        }
        assert_eq!(store.list(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_readings_are_both_kept() {
        let store = MemoryReadingStore::new();
        store.insert(reading("a", "2021-05-01 08:00:00")).await.unwrap();
        store.insert(reading("a", "2021-05-01 08:00:00")).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn replace_keeps_exactly_one_slot() {
        let store = MemoryCaptureStore::new();
        store
            .replace(NewCapture::snapshot(b"first".to_vec(), "image/jpeg"))
            .await
            .unwrap();
        store
            .replace(NewCapture::snapshot(b"second".to_vec(), "image/jpeg"))
            .await
            .unwrap();

        let slot = store.get(CaptureKind::Snapshot).await.unwrap().unwrap();
        assert_eq!(slot.data.as_deref(), Some(b"second".as_ref()));
    }

    #[tokio::test]
    async fn replace_returns_previous_media_ref() {
        let store = MemoryCaptureStore::new();
        let first = store
            .replace(NewCapture::animation("old.gif", "image/gif"))
            .await
            .unwrap();
        assert_eq!(first, None);

        let second = store
            .replace(NewCapture::animation("new.gif", "image/gif"))
            .await
            .unwrap();
        assert_eq!(second.as_deref(), Some("old.gif"));
    }

    #[tokio::test]
    async fn kinds_are_independent_slots() {
        let store = MemoryCaptureStore::new();
        store
            .replace(NewCapture::snapshot(b"jpeg".to_vec(), "image/jpeg"))
            .await
            .unwrap();
        store
            .replace(NewCapture::animation("a.gif", "image/gif"))
            .await
            .unwrap();

        assert!(store.get(CaptureKind::Snapshot).await.unwrap().is_some());
        assert!(store.get(CaptureKind::Animation).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn racing_replacements_leave_one_whole_slot() {
        let store = MemoryCaptureStore::new();
        let a = store.replace(NewCapture::snapshot(b"aaaa".to_vec(), "image/jpeg"));
        let b = store.replace(NewCapture::snapshot(b"bbbb".to_vec(), "image/jpeg"));
        let (ra, rb) = tokio::join!(a, b);
        ra.unwrap();
        rb.unwrap();

        let slot = store.get(CaptureKind::Snapshot).await.unwrap().unwrap();
        let bytes = slot.data.unwrap();
        assert!(bytes == b"aaaa" || bytes == b"bbbb");
    }

    #[tokio::test]
    async fn empty_slot_reads_as_none() {
        let store = MemoryCaptureStore::new();
        assert!(store.get(CaptureKind::Snapshot).await.unwrap().is_none());
    }
}
