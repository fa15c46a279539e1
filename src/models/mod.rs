//! Row types for the hosted tables and the drafts submitted to create them.
//!
//! Rows are owned by the backend; this crate only reads them per fetch cycle
//! and never updates or deletes them.

use serde::{
    de::{DeserializeOwned, Error as _},
    Deserialize, Deserializer, Serialize,
};
use std::fmt;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

pub mod entry;
pub mod exit;
pub mod product;
pub mod profile;
pub mod supply_chain_event;
pub mod usage;
pub mod user_role;

pub use entry::{EntryRecord, NewEntry};
pub use exit::{ExitRecord, NewExit};
pub use product::{NewProduct, Product};
pub use profile::Profile;
pub use supply_chain_event::{NewSupplyChainEvent, SupplyChainEvent};
pub use usage::{NewUsage, UsageRecord};
pub use user_role::{UserRole, UserRoleRecord};

/// Tables exposed by the hosted backend
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    Products,
    EntryProducts,
    ExitProducts,
    UsedToday,
    Profiles,
    SupplyChainEvents,
    UserRoles,
}

impl Table {
    /// Column the backend stamps with the creation time of a row.
    pub fn created_column(self) -> &'static str {
        match self {
            Table::SupplyChainEvents => "timestamp",
            _ => "created_at",
        }
    }
}

/// A row type bound to the table it is read from.
pub trait Record: DeserializeOwned + Send + 'static {
    const TABLE: Table;
}

/// A foreign-key value exactly as it arrived from the backend.
///
/// Well-formed ids resolve through lookup indices; anything else is kept as
/// `Raw` so that the reference still counts as present but never resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForeignKey {
    Id(Uuid),
    Raw(String),
}

impl ForeignKey {
    pub fn id(&self) -> Option<Uuid> {
        match self {
            ForeignKey::Id(id) => Some(*id),
            ForeignKey::Raw(_) => None,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, ForeignKey::Raw(raw) if raw.trim().is_empty())
    }
}

impl From<Uuid> for ForeignKey {
    fn from(id: Uuid) -> Self {
        ForeignKey::Id(id)
    }
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForeignKey::Id(id) => write!(f, "{}", id),
            ForeignKey::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Reads an optional foreign key, treating an empty string like null.
pub(crate) fn optional_key<'de, D>(deserializer: D) -> Result<Option<ForeignKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let key = Option::<ForeignKey>::deserialize(deserializer)?;
    Ok(key.filter(|key| !key.is_blank()))
}

/// Reads the batch or product a draft points at. A blank or malformed id
/// reads as nothing selected, which the form's `required` rule reports.
pub(crate) fn selected_id<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_key(deserializer)?.and_then(|key| key.id()))
}

/// Reads an optional party reference on a draft, treating an empty string
/// like null.
pub(crate) fn optional_id<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match optional_key(deserializer)? {
        Some(ForeignKey::Raw(raw)) => Err(D::Error::custom(format!("invalid user id: {}", raw))),
        key => Ok(key.and_then(|key| key.id())),
    }
}

/// Insert payload for drafts owned by the submitting user.
#[derive(Debug, Serialize)]
pub struct UserOwned<'a, D: Serialize> {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub draft: &'a D,
}

pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
