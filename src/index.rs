//! Primary-key lookup over a fetched row set.

use crate::models::ForeignKey;
use std::collections::HashMap;
use std::hash::Hash;
use uuid::Uuid;

/// Borrowed key → row mapping built once per fetch cycle.
#[derive(Debug)]
pub struct LookupIndex<'a, K, R> {
    rows: HashMap<K, &'a R>,
}

/// Indexes `rows` by `key`. When two rows share a key the later one wins.
pub fn build_index<'a, K, R, I, F>(rows: I, key: F) -> LookupIndex<'a, K, R>
where
    I: IntoIterator<Item = &'a R>,
    F: Fn(&R) -> K,
    K: Eq + Hash,
    R: 'a,
{
    let rows = rows.into_iter();
    let mut map = HashMap::with_capacity(rows.size_hint().0);
    for row in rows {
        map.insert(key(row), row);
    }
    LookupIndex { rows: map }
}

impl<'a, K: Eq + Hash, R> LookupIndex<'a, K, R> {
    pub fn get(&self, key: &K) -> Option<&'a R> {
        self.rows.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a, R> LookupIndex<'a, Uuid, R> {
    /// Follows a foreign key. Raw (malformed) keys never resolve.
    pub fn resolve(&self, key: &ForeignKey) -> Option<&'a R> {
        key.id().and_then(|id| self.get(&id))
    }

    pub fn resolve_opt(&self, key: Option<&ForeignKey>) -> Option<&'a R> {
        key.and_then(|key| self.resolve(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug)]
    struct Row {
        id: Uuid,
        label: &'static str,
    }

    #[test]
    fn later_rows_win_on_duplicate_keys() {
        let id = Uuid::new_v4();
        let rows = vec![
            Row { id, label: "first" },
            Row { id, label: "second" },
        ];
        let index = build_index(&rows, |row| row.id);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&id).map(|row| row.label), Some("second"));
    }

    #[test]
    fn raw_keys_never_resolve() {
        let id = Uuid::new_v4();
        let rows = vec![Row { id, label: "only" }];
        let index = build_index(&rows, |row| row.id);
        assert!(index.resolve(&ForeignKey::Id(id)).is_some());
        assert!(index.resolve(&ForeignKey::Raw(id.to_string() + "x")).is_none());
        assert!(index.resolve_opt(None).is_none());
    }

    proptest! {
        #[test]
        fn every_key_maps_to_its_last_row(keys in prop::collection::vec(0u8..16, 0..64)) {
            let rows: Vec<(u8, usize)> = keys.iter().copied().zip(0..).collect();
            let index = build_index(&rows, |row| row.0);

            for key in &keys {
                let last = rows.iter().rev().find(|row| row.0 == *key).map(|row| row.1);
                prop_assert_eq!(index.get(key).map(|row| row.1), last);
            }
            let distinct: std::collections::HashSet<_> = keys.iter().collect();
            prop_assert_eq!(index.len(), distinct.len());
        }
    }
}
