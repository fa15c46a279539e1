//! Client-side joins of the inventory views.
//!
//! Every function here is pure: it takes the primary rows of one fetch cycle
//! plus lookup indices over the secondary tables and never fails on a
//! missing or malformed reference. Unresolved references become sentinel
//! names instead.

use crate::index::LookupIndex;
use crate::models::{EntryRecord, ExitRecord, ForeignKey, Product, Profile, UsageRecord};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

pub const UNKNOWN_PRODUCT: &str = "Unknown product";
pub const UNKNOWN_USER: &str = "Unknown user";

pub type ProductIndex<'a> = LookupIndex<'a, Uuid, Product>;
pub type ProfileIndex<'a> = LookupIndex<'a, Uuid, Profile>;
pub type EntryIndex<'a> = LookupIndex<'a, Uuid, EntryRecord>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryView {
    #[serde(flatten)]
    pub entry: EntryRecord,
    pub product_name: String,
    /// Only present when the entry names a supplier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitView {
    #[serde(flatten)]
    pub exit: ExitRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageView {
    pub id: Uuid,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub quantity: Decimal,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub product_name: String,
}

/// Display name of an optional party reference: absent when the reference is
/// null, `UNKNOWN_USER` when it does not resolve.
pub(crate) fn party_name(key: Option<&ForeignKey>, profiles: &ProfileIndex<'_>) -> Option<String> {
    key.map(|key| {
        profiles
            .resolve(key)
            .map(|profile| profile.full_name.clone())
            .unwrap_or_else(|| UNKNOWN_USER.to_string())
    })
}

fn product_name(key: Option<&ForeignKey>, products: &ProductIndex<'_>) -> String {
    products
        .resolve_opt(key)
        .map(|product| product.name.clone())
        .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string())
}

pub fn assemble_entries(
    entries: Vec<EntryRecord>,
    products: &ProductIndex<'_>,
    profiles: &ProfileIndex<'_>,
) -> Vec<EntryView> {
    entries
        .into_iter()
        .map(|entry| EntryView {
            product_name: product_name(entry.product_id.as_ref(), products),
            source_name: party_name(entry.received_from.as_ref(), profiles),
            entry,
        })
        .collect()
}

/// Joins exit → entry → product. When the entry hop is missing neither the
/// product nor the batch is known and both stay absent.
pub fn assemble_exits(
    exits: Vec<ExitRecord>,
    entries: &EntryIndex<'_>,
    products: &ProductIndex<'_>,
    profiles: &ProfileIndex<'_>,
) -> Vec<ExitView> {
    exits
        .into_iter()
        .map(|exit| {
            let entry = entries.resolve_opt(exit.entry_product_id.as_ref());
            ExitView {
                product_name: entry
                    .map(|entry| product_name(entry.product_id.as_ref(), products)),
                batch_number: entry.map(|entry| entry.batch_number.clone()),
                assignee_name: party_name(exit.assigned_to.as_ref(), profiles),
                exit,
            }
        })
        .collect()
}

pub fn assemble_usage(
    usage: Vec<UsageRecord>,
    entries: &EntryIndex<'_>,
    products: &ProductIndex<'_>,
) -> Vec<UsageView> {
    usage
        .into_iter()
        .map(|record| {
            let product_key = entries
                .resolve_opt(record.entry_product_id.as_ref())
                .and_then(|entry| entry.product_id.as_ref());
            UsageView {
                id: record.id,
                quantity: record.quantity,
                notes: record.notes,
                created_at: record.created_at,
                product_name: product_name(product_key, products),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn product(name: &str) -> Product {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": name,
            "created_by": Uuid::new_v4(),
        }))
        .unwrap()
    }

    fn profile(name: &str) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            address: None,
            phone: None,
            created_at: None,
        }
    }

    fn entry(product_id: Option<ForeignKey>, received_from: Option<ForeignKey>) -> EntryRecord {
        EntryRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_id,
            quantity: dec!(10),
            batch_number: "LOT-001".into(),
            received_from,
            notes: None,
            received_date: None,
            created_at: None,
        }
    }

    fn exit(entry_product_id: Option<ForeignKey>, assigned_to: Option<ForeignKey>) -> ExitRecord {
        ExitRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            entry_product_id,
            quantity: dec!(4),
            assigned_to,
            notes: None,
            exit_date: None,
            created_at: None,
        }
    }

    #[test]
    fn entries_resolve_product_and_supplier() {
        let products = vec![product("Ragi")];
        let profiles = vec![profile("Asha Farms")];
        let rows = vec![entry(
            Some(products[0].id.into()),
            Some(profiles[0].id.into()),
        )];

        let views = assemble_entries(
            rows,
            &build_index(&products, |p| p.id),
            &build_index(&profiles, |p| p.id),
        );
        assert_eq!(views[0].product_name, "Ragi");
        assert_eq!(views[0].source_name.as_deref(), Some("Asha Farms"));
    }

    #[test]
    fn unresolved_product_falls_back_to_sentinel() {
        let products: Vec<Product> = vec![];
        let profiles: Vec<Profile> = vec![];
        let rows = vec![
            entry(Some(Uuid::new_v4().into()), None),
            entry(Some(ForeignKey::Raw("garbage".into())), None),
            entry(None, None),
        ];
        let views = assemble_entries(
            rows,
            &build_index(&products, |p| p.id),
            &build_index(&profiles, |p| p.id),
        );
        assert!(views.iter().all(|v| v.product_name == UNKNOWN_PRODUCT));
    }

    #[test]
    fn source_name_is_omitted_when_no_supplier_is_named() {
        let products: Vec<Product> = vec![];
        let profiles: Vec<Profile> = vec![];
        let views = assemble_entries(
            vec![entry(None, None), entry(None, Some(Uuid::new_v4().into()))],
            &build_index(&products, |p| p.id),
            &build_index(&profiles, |p| p.id),
        );

        let absent = serde_json::to_value(&views[0]).unwrap();
        assert!(absent.get("source_name").is_none());
        assert_eq!(absent["batch_number"], "LOT-001");

        assert_eq!(views[1].source_name.as_deref(), Some(UNKNOWN_USER));
    }

    #[test]
    fn exits_without_a_resolved_entry_carry_no_product_or_batch() {
        let products: Vec<Product> = vec![];
        let entries: Vec<EntryRecord> = vec![];
        let profiles: Vec<Profile> = vec![];
        let views = assemble_exits(
            vec![exit(Some(Uuid::new_v4().into()), None)],
            &build_index(&entries, |e| e.id),
            &build_index(&products, |p| p.id),
            &build_index(&profiles, |p| p.id),
        );

        assert_eq!(views[0].product_name, None);
        assert_eq!(views[0].batch_number, None);
        let json = serde_json::to_value(&views[0]).unwrap();
        assert!(json.get("product_name").is_none());
        assert!(json.get("assignee_name").is_none());
    }

    #[test]
    fn exits_follow_entry_to_product() {
        let products = vec![product("Jaggery")];
        let profiles = vec![profile("Ravi Traders")];
        let entries = vec![
            entry(Some(products[0].id.into()), None),
            entry(Some(Uuid::new_v4().into()), None),
        ];
        let views = assemble_exits(
            vec![
                exit(Some(entries[0].id.into()), Some(profiles[0].id.into())),
                exit(Some(entries[1].id.into()), Some(Uuid::new_v4().into())),
            ],
            &build_index(&entries, |e| e.id),
            &build_index(&products, |p| p.id),
            &build_index(&profiles, |p| p.id),
        );

        assert_eq!(views[0].product_name.as_deref(), Some("Jaggery"));
        assert_eq!(views[0].batch_number.as_deref(), Some("LOT-001"));
        assert_eq!(views[0].assignee_name.as_deref(), Some("Ravi Traders"));

        assert_eq!(views[1].product_name.as_deref(), Some(UNKNOWN_PRODUCT));
        assert_eq!(views[1].assignee_name.as_deref(), Some(UNKNOWN_USER));
    }

    #[test]
    fn usage_flattens_both_hops() {
        let products = vec![product("Turmeric")];
        let entries = vec![entry(Some(products[0].id.into()), None)];
        let usage = |entry_product_id: Option<ForeignKey>| UsageRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            entry_product_id,
            quantity: dec!(1.5),
            notes: Some("kitchen".into()),
            used_date: None,
            created_at: None,
        };

        let views = assemble_usage(
            vec![usage(Some(entries[0].id.into())), usage(Some(Uuid::new_v4().into())), usage(None)],
            &build_index(&entries, |e| e.id),
            &build_index(&products, |p| p.id),
        );
        let names: Vec<_> = views.iter().map(|v| v.product_name.as_str()).collect();
        assert_eq!(names, vec!["Turmeric", UNKNOWN_PRODUCT, UNKNOWN_PRODUCT]);
        assert_eq!(views[0].quantity, dec!(1.5));
    }
}
