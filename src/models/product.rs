use super::{blank_to_none, Record, Table};
use crate::validation::FormContract;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A product registered by a producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Unit of measure quantities are recorded in (kg, crate, litre)
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub certification: Option<String>,
    /// Owning user
    pub created_by: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Product {
    const TABLE: Table = Table::Products;
}

/// Product registration form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NewProduct {
    #[validate(length(
        min = 2,
        max = 100,
        message = "Product name must be between 2 and 100 characters"
    ))]
    pub name: String,

    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    #[validate(length(
        min = 2,
        max = 50,
        message = "Category must be between 2 and 50 characters"
    ))]
    pub category: String,

    #[validate(length(min = 1, max = 20, message = "Unit must be between 1 and 20 characters"))]
    pub unit: String,

    #[validate(length(
        min = 2,
        max = 100,
        message = "Origin must be between 2 and 100 characters"
    ))]
    pub origin: String,

    #[validate(length(
        min = 2,
        max = 100,
        message = "Certification must be between 2 and 100 characters"
    ))]
    pub certification: String,
}

impl FormContract for NewProduct {
    const FIELD_ORDER: &'static [&'static str] = &[
        "name",
        "description",
        "category",
        "unit",
        "origin",
        "certification",
    ];
}

impl NewProduct {
    pub fn normalize(mut self) -> Self {
        self.description = blank_to_none(self.description);
        self
    }
}

/// Insert payload for a product; ownership travels as `created_by`
#[derive(Debug, Serialize)]
pub struct ProductInsert<'a> {
    pub created_by: Uuid,
    #[serde(flatten)]
    pub draft: &'a NewProduct,
}
