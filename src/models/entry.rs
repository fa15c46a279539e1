use super::{blank_to_none, optional_id, optional_key, selected_id, ForeignKey, Record, Table};
use crate::validation::{positive_quantity, FormContract};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Intake of a product batch (`entry_products`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default, deserialize_with = "optional_key")]
    pub product_id: Option<ForeignKey>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub quantity: Decimal,
    pub batch_number: String,
    /// User the batch was received from
    #[serde(default, deserialize_with = "optional_key")]
    pub received_from: Option<ForeignKey>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub received_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for EntryRecord {
    const TABLE: Table = Table::EntryProducts;
}

/// Entry form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewEntry {
    #[validate(required)]
    #[serde(default, deserialize_with = "selected_id")]
    pub product_id: Option<Uuid>,

    #[validate(required, custom = "positive_quantity")]
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub quantity: Option<Decimal>,

    #[validate(length(
        min = 3,
        max = 50,
        message = "Batch number must be between 3 and 50 characters"
    ))]
    #[serde(default)]
    pub batch_number: String,

    #[serde(default, deserialize_with = "optional_id")]
    pub received_from: Option<Uuid>,

    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters"))]
    #[serde(default)]
    pub notes: Option<String>,
}

impl FormContract for NewEntry {
    const FIELD_ORDER: &'static [&'static str] = &[
        "product_id",
        "quantity",
        "batch_number",
        "received_from",
        "notes",
    ];
    const REQUIRED_MESSAGES: &'static [(&'static str, &'static str)] = &[
        ("product_id", "Please select a product"),
        ("quantity", "Quantity must be positive"),
    ];
}

impl NewEntry {
    pub fn normalize(mut self) -> Self {
        self.batch_number = self.batch_number.trim().to_string();
        self.notes = blank_to_none(self.notes);
        self
    }
}
