//! Property-based tests for the form contracts and the view assembler.

use agritrace::{
    assembler::{assemble_entries, UNKNOWN_PRODUCT},
    index::build_index,
    models::{EntryRecord, ForeignKey, NewEntry, Product, Profile},
    validation::FormContract,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

fn batch_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{2,4}-[0-9]{1,40}".prop_filter("3..=50 chars", |s| (3..=50).contains(&s.len()))
}

fn positive_quantity() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000, 0u32..4).prop_map(|(units, scale)| Decimal::new(units, scale))
}

fn non_positive_quantity() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..=0, 0u32..4).prop_map(|(units, scale)| Decimal::new(units, scale))
}

fn entry_form(quantity: Decimal, batch: String) -> NewEntry {
    NewEntry {
        product_id: Some(Uuid::new_v4()),
        quantity: Some(quantity),
        batch_number: batch,
        received_from: None,
        notes: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn well_formed_entries_pass(quantity in positive_quantity(), batch in batch_strategy()) {
        prop_assert!(entry_form(quantity, batch).check().is_ok());
    }

    #[test]
    fn non_positive_quantity_is_the_reported_violation(
        quantity in non_positive_quantity(),
        batch in "[A-Z]{0,80}",
    ) {
        // Quantity precedes batch number, so it wins whatever the batch looks like.
        let violation = entry_form(quantity, batch).check().unwrap_err();
        prop_assert_eq!(violation.field, "quantity");
        prop_assert_eq!(violation.message, "Quantity must be positive");
    }

    #[test]
    fn every_entry_gets_a_product_name(known in prop::collection::vec(any::<bool>(), 0..20)) {
        let products: Vec<Product> = (0..3)
            .map(|i| Product {
                id: Uuid::new_v4(),
                name: format!("Product {}", i),
                description: None,
                category: None,
                unit: None,
                origin: None,
                certification: None,
                created_by: Uuid::new_v4(),
                created_at: None,
                updated_at: None,
            })
            .collect();
        let profiles: Vec<Profile> = Vec::new();

        let entries: Vec<EntryRecord> = known
            .iter()
            .enumerate()
            .map(|(i, known)| EntryRecord {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                product_id: Some(if *known {
                    ForeignKey::Id(products[i % products.len()].id)
                } else {
                    ForeignKey::Id(Uuid::new_v4())
                }),
                quantity: Decimal::ONE,
                batch_number: format!("LOT-{}", i),
                received_from: None,
                notes: None,
                received_date: None,
                created_at: None,
            })
            .collect();

        let views = assemble_entries(
            entries,
            &build_index(&products, |p| p.id),
            &build_index(&profiles, |p| p.id),
        );

        prop_assert_eq!(views.len(), known.len());
        for (view, known) in views.iter().zip(&known) {
            if *known {
                prop_assert!(view.product_name.starts_with("Product "));
            } else {
                prop_assert_eq!(view.product_name.as_str(), UNKNOWN_PRODUCT);
            }
            prop_assert!(view.source_name.is_none());
        }
    }
}
