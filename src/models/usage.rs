use super::{blank_to_none, optional_key, selected_id, ForeignKey, Record, Table};
use crate::validation::{positive_quantity, FormContract};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Local consumption of a previously entered batch (`used_today`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default, deserialize_with = "optional_key")]
    pub entry_product_id: Option<ForeignKey>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub quantity: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub used_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for UsageRecord {
    const TABLE: Table = Table::UsedToday;
}

/// Usage form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewUsage {
    #[validate(required)]
    #[serde(default, deserialize_with = "selected_id")]
    pub entry_product_id: Option<Uuid>,

    #[validate(required, custom = "positive_quantity")]
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub quantity: Option<Decimal>,

    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters"))]
    #[serde(default)]
    pub notes: Option<String>,
}

impl FormContract for NewUsage {
    const FIELD_ORDER: &'static [&'static str] = &["entry_product_id", "quantity", "notes"];
    const REQUIRED_MESSAGES: &'static [(&'static str, &'static str)] = &[
        ("entry_product_id", "Select a product"),
        ("quantity", "Quantity must be positive"),
    ];
}

impl NewUsage {
    pub fn normalize(mut self) -> Self {
        self.notes = blank_to_none(self.notes);
        self
    }
}
