use super::{blank_to_none, optional_id, optional_key, selected_id, ForeignKey, Record, Table};
use crate::validation::{positive_quantity, FormContract};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Outgoing transfer of a previously entered batch (`exit_products`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default, deserialize_with = "optional_key")]
    pub entry_product_id: Option<ForeignKey>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "optional_key")]
    pub assigned_to: Option<ForeignKey>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub exit_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for ExitRecord {
    const TABLE: Table = Table::ExitProducts;
}

/// Exit form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewExit {
    #[validate(required)]
    #[serde(default, deserialize_with = "selected_id")]
    pub entry_product_id: Option<Uuid>,

    #[validate(required, custom = "positive_quantity")]
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub quantity: Option<Decimal>,

    #[serde(default, deserialize_with = "optional_id")]
    pub assigned_to: Option<Uuid>,

    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters"))]
    #[serde(default)]
    pub notes: Option<String>,
}

impl FormContract for NewExit {
    const FIELD_ORDER: &'static [&'static str] =
        &["entry_product_id", "quantity", "assigned_to", "notes"];
    const REQUIRED_MESSAGES: &'static [(&'static str, &'static str)] = &[
        ("entry_product_id", "Please select an entry product"),
        ("quantity", "Quantity must be positive"),
    ];
}

impl NewExit {
    pub fn normalize(mut self) -> Self {
        self.notes = blank_to_none(self.notes);
        self
    }
}
