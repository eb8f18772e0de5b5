//! Validation and coercion of inbound telemetry payloads.
//!
//! Sensors post loosely-typed JSON: every value may arrive either as its
//! native JSON type or as a string (`"Light": "300"` and `"Light": 300` are
//! both accepted). This module turns such a payload into a typed
//! [`NewReading`] or rejects it with an error naming the offending field.
//! Rejection is all-or-nothing — a single bad field drops the whole record.

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::db::models::NewReading;

/// Wire format for reading timestamps: 24-hour, no timezone, no fractional
/// seconds. Anything else is a hard failure.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Request body for `POST /flower/new_data`.
///
/// Every key is required; deserialization itself rejects payloads with a key
/// missing. Values are coerced field-by-field in [`NewReading::try_from`].
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReadingPayload {
    #[serde(rename = "FlowerName")]
    pub flower_name: Value,
    #[serde(rename = "GrowSession")]
    pub grow_session: Value,
    #[serde(rename = "TimeStamp")]
    pub timestamp: Value,
    #[serde(rename = "Temperature")]
    pub temperature: Value,
    #[serde(rename = "Light")]
    pub light: Value,
    #[serde(rename = "Water")]
    pub water: Value,
    #[serde(rename = "Battery")]
    pub battery: Value,
    #[serde(rename = "Ecb")]
    pub ecb: Value,
    #[serde(rename = "EcPorus")]
    pub ec_porus: Value,
    #[serde(rename = "DLI")]
    pub dli: Value,
    #[serde(rename = "Ea")]
    pub ea: Value,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("field {field:?} must be a text value")]
    NotText { field: &'static str },
    #[error("field {field:?} must be a decimal number")]
    NotDecimal { field: &'static str },
    #[error("field {field:?} must be an integer")]
    NotInteger { field: &'static str },
    #[error("field \"TimeStamp\" must match the format YYYY-MM-DD HH:MM:SS")]
    BadTimestamp,
}

impl TryFrom<ReadingPayload> for NewReading {
    type Error = IngestError;

    fn try_from(p: ReadingPayload) -> Result<Self, IngestError> {
        Ok(NewReading {
            flower_name: text("FlowerName", &p.flower_name)?,
            grow_session: text("GrowSession", &p.grow_session)?,
            recorded_at: timestamp(&p.timestamp)?,
            temperature: decimal("Temperature", &p.temperature)?,
            light: integer("Light", &p.light)?,
            water: decimal("Water", &p.water)?,
            battery: integer("Battery", &p.battery)?,
            ecb: decimal("Ecb", &p.ecb)?,
            ec_porus: decimal("EcPorus", &p.ec_porus)?,
            dli: decimal("DLI", &p.dli)?,
            ea: decimal("Ea", &p.ea)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Field coercers
// ---------------------------------------------------------------------------

/// Labels are kept as-is when they arrive as strings; scalar numbers and
/// booleans are stringified. Compound values are rejected.
fn text(field: &'static str, v: &Value) -> Result<String, IngestError> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(IngestError::NotText { field }),
    }
}

fn decimal(field: &'static str, v: &Value) -> Result<f64, IngestError> {
    match v {
        Value::Number(n) => n.as_f64().ok_or(IngestError::NotDecimal { field }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| IngestError::NotDecimal { field }),
        _ => Err(IngestError::NotDecimal { field }),
    }
}

/// Integers must be whole: a JSON number with a fractional part fails, as
/// does a string like `"80.5"`.
fn integer(field: &'static str, v: &Value) -> Result<i64, IngestError> {
    match v {
        Value::Number(n) => n.as_i64().ok_or(IngestError::NotInteger { field }),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| IngestError::NotInteger { field }),
        _ => Err(IngestError::NotInteger { field }),
    }
}

fn timestamp(v: &Value) -> Result<NaiveDateTime, IngestError> {
    let Value::String(s) = v else {
        return Err(IngestError::BadTimestamp);
    };
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map_err(|_| IngestError::BadTimestamp)
}
