use super::{optional_key, ForeignKey, Record, Table};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const ENTRY_EVENT: &str = "entry";
pub const EXIT_EVENT: &str = "exit";

/// A typed, timestamped transition of a batch between parties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyChainEvent {
    pub id: Uuid,
    #[serde(default, deserialize_with = "optional_key")]
    pub product_id: Option<ForeignKey>,
    pub batch_number: String,
    pub event_type: String,
    #[serde(default, deserialize_with = "optional_key")]
    pub from_user: Option<ForeignKey>,
    #[serde(default, deserialize_with = "optional_key")]
    pub to_user: Option<ForeignKey>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

impl Record for SupplyChainEvent {
    const TABLE: Table = Table::SupplyChainEvents;
}

/// Insert payload for an event
#[derive(Debug, Clone, Serialize)]
pub struct NewSupplyChainEvent {
    pub product_id: Uuid,
    pub batch_number: String,
    pub event_type: String,
    pub from_user: Option<Uuid>,
    pub to_user: Option<Uuid>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    pub quantity: Option<Decimal>,
    pub location: Option<String>,
    pub metadata: Value,
}

impl NewSupplyChainEvent {
    pub fn new(product_id: Uuid, batch_number: impl Into<String>, event_type: &str) -> Self {
        Self {
            product_id,
            batch_number: batch_number.into(),
            event_type: event_type.to_string(),
            from_user: None,
            to_user: None,
            quantity: None,
            location: None,
            metadata: Value::Object(Default::default()),
        }
    }
}
