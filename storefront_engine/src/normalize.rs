//! Turns loosely shaped order payloads into canonical [`Order`]s.
//!
//! The order service is not consistent about how it ships orders. Push events may wrap the order in a `{ "data": … }`
//! envelope or send it bare, ids may be numbers or strings, and timestamps arrive as text (with or without a UTC
//! offset). Every order that enters the engine, whether from a push event, the creation response or the history
//! endpoint, goes through [`normalize_order`], so the rest of the engine only ever sees one shape.
use chrono::{DateTime, NaiveDateTime, Utc};
use log::*;
use serde::Deserialize;
use serde_json::Value;
use sf_common::Price;
use thiserror::Error;

use crate::data_types::{CartItem, DeliveryMethod, Order, OrderId, OrderStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("Payload is not an order object: {0}")]
    NotAnOrder(String),
    #[error("Order payload has no id")]
    MissingId,
    #[error("Order {0} has an unknown status: {1}")]
    UnknownStatus(String, String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Wrapped { data: RawOrder },
    Bare(RawOrder),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawOrder {
    id: Option<Value>,
    items: Option<Vec<Value>>,
    total_amount: Option<f64>,
    delivery_method: Option<String>,
    status: Option<Value>,
    created_at: Option<Value>,
    updated_at: Option<Value>,
}

/// Normalizes a single order payload, wrapped or bare.
///
/// `received_at` stands in for any timestamp that is missing or cannot be parsed. A payload without an id, or with a
/// status outside the known lifecycle, is rejected. A missing status is read as `pending`.
pub fn normalize_order(payload: &Value, received_at: DateTime<Utc>) -> Result<Order, PayloadError> {
    if !payload.is_object() {
        return Err(PayloadError::NotAnOrder(truncate(payload.to_string())));
    }
    let raw = match Envelope::deserialize(payload) {
        Ok(Envelope::Wrapped { data }) => data,
        Ok(Envelope::Bare(raw)) => raw,
        Err(e) => return Err(PayloadError::NotAnOrder(e.to_string())),
    };
    let id = match raw.id {
        Some(Value::String(s)) if !s.trim().is_empty() => OrderId(s),
        Some(Value::Number(n)) => OrderId(n.to_string()),
        _ => return Err(PayloadError::MissingId),
    };
    let status = match raw.status {
        None | Some(Value::Null) => OrderStatus::Pending,
        Some(v) => parse_status(&v).ok_or_else(|| PayloadError::UnknownStatus(id.0.clone(), v.to_string()))?,
    };
    let items = raw
        .items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<CartItem>(v) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("📦️ Skipping an unreadable line item in order {id}. {e}");
                None
            },
        })
        .collect::<Vec<CartItem>>();
    let total_amount = match raw.total_amount {
        Some(t) => Price::new(t),
        None => items.iter().map(|i| i.total_price).sum(),
    };
    let delivery_method = raw
        .delivery_method
        .and_then(|m| {
            m.parse::<DeliveryMethod>().map_err(|e| warn!("📦️ Order {id}: {e}. Assuming pickup.")).ok()
        })
        .unwrap_or_default();
    let created_at = timestamp_or(raw.created_at.as_ref(), received_at);
    let (updated_at, updated_at_known) = match read_timestamp(raw.updated_at.as_ref()) {
        Some(t) => (t, true),
        None => (received_at, false),
    };
    Ok(Order { id, items, total_amount, delivery_method, status, created_at, updated_at, updated_at_known })
}

/// Normalizes a list of orders, dropping (and logging) any that are malformed.
pub fn normalize_orders(payloads: &[Value], received_at: DateTime<Utc>) -> Vec<Order> {
    payloads
        .iter()
        .filter_map(|p| match normalize_order(p, received_at) {
            Ok(order) => Some(order),
            Err(e) => {
                warn!("📦️ Dropping malformed order. {e}");
                None
            },
        })
        .collect()
}

/// Status may be sent as its name (in any case) or as the numeric index of the lifecycle stage.
fn parse_status(value: &Value) -> Option<OrderStatus> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => match n.as_u64()? {
            0 => Some(OrderStatus::Pending),
            1 => Some(OrderStatus::Preparing),
            2 => Some(OrderStatus::Ready),
            3 => Some(OrderStatus::Completed),
            _ => None,
        },
        _ => None,
    }
}

fn timestamp_or(value: Option<&Value>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    read_timestamp(value).unwrap_or(fallback)
}

fn read_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Some(Value::String(s)) => parse_timestamp(s),
        Some(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    if parsed.is_none() {
        if let Some(v) = value {
            debug!("📦️ Unreadable timestamp {v}. Using the time of receipt instead.");
        }
    }
    parsed
}

/// Parses an RFC 3339 timestamp, or an ISO 8601 one without an offset, which is taken to be UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn truncate(mut s: String) -> String {
    if s.len() > 64 {
        let mut end = 64;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
        s.push('…');
    }
    s
}
