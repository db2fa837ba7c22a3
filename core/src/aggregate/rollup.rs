//! Multi-key rollup shared by every builder.
//!
//! # Architecture
//!
//! ```text
//! records + [key1, key2] + reduce        →  Rollup tree
//! ┌──────────────────────────┐              Branch
//! │ Biscoe  Adelie           │              ├── Biscoe ─ Branch
//! │ Biscoe  Gentoo           │     →        │            ├── Adelie ─ Leaf(reduce([r1]))
//! │ Dream   Adelie           │              │            └── Gentoo ─ Leaf(reduce([r2]))
//! └──────────────────────────┘              └── Dream ── Branch
//!                                                        └── Adelie ─ Leaf(reduce([r3]))
//! ```
//!
//! Each level is an ordered map keyed by value, so traversal order never
//! depends on record order. Cost is O(records × keys) map insertions.

use serde::Serialize;
use std::collections::BTreeMap;

/// Key extractor; `None` or an empty string means the record lacks the key.
pub type KeyFn<'a, T> = &'a dyn Fn(&T) -> Option<String>;

/// Result of a rollup: a leaf holding the reduced value, or one sub-tree per key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rollup<R> {
    Leaf(R),
    Branch(BTreeMap<String, Rollup<R>>),
}

impl<R> Rollup<R> {
    /// Reduced value, if this is a leaf.
    pub fn value(&self) -> Option<&R> {
        match self {
            Rollup::Leaf(v) => Some(v),
            Rollup::Branch(_) => None,
        }
    }

    /// Sub-trees, if this is a branch.
    pub fn children(&self) -> Option<&BTreeMap<String, Rollup<R>>> {
        match self {
            Rollup::Leaf(_) => None,
            Rollup::Branch(map) => Some(map),
        }
    }

    /// Sub-tree under `key`, if this is a branch holding it.
    pub fn child(&self, key: &str) -> Option<&Rollup<R>> {
        self.children().and_then(|map| map.get(key))
    }

    /// Every leaf with its key path, in key order.
    pub fn leaves(&self) -> Vec<(Vec<&str>, &R)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, path: &mut Vec<&'a str>, out: &mut Vec<(Vec<&'a str>, &'a R)>) {
        match self {
            Rollup::Leaf(v) => out.push((path.clone(), v)),
            Rollup::Branch(map) => {
                for (key, sub) in map {
                    path.push(key);
                    sub.collect_leaves(path, out);
                    path.pop();
                }
            }
        }
    }
}

impl Rollup<usize> {
    /// Sum of every count below this node.
    pub fn total(&self) -> usize {
        match self {
            Rollup::Leaf(n) => *n,
            Rollup::Branch(map) => map.values().map(Rollup::total).sum(),
        }
    }
}

fn key_of<T>(key: KeyFn<'_, T>, record: &T) -> Option<String> {
    key(record).filter(|k| !k.is_empty())
}

/// Group `records` by `keys` in order and reduce every leaf.
///
/// Records lacking any key are skipped before grouping. With no keys the
/// result is a single leaf over all remaining records.
pub fn rollup<T, R, F>(records: &[T], keys: &[KeyFn<'_, T>], reduce: F) -> Rollup<R>
where
    F: Fn(&[&T]) -> R,
{
    let complete: Vec<&T> = records
        .iter()
        .filter(|r| keys.iter().all(|k| key_of(*k, r).is_some()))
        .collect();
    group(&complete, keys, &reduce)
}

fn group<T, R, F>(records: &[&T], keys: &[KeyFn<'_, T>], reduce: &F) -> Rollup<R>
where
    F: Fn(&[&T]) -> R,
{
    let Some((key, rest)) = keys.split_first() else {
        return Rollup::Leaf(reduce(records));
    };

    let mut parts: BTreeMap<String, Vec<&T>> = BTreeMap::new();
    for &record in records {
        if let Some(k) = key_of(*key, record) {
            parts.entry(k).or_default().push(record);
        }
    }

    Rollup::Branch(
        parts
            .into_iter()
            .map(|(k, members)| (k, group(&members, rest, reduce)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        island: &'static str,
        species: &'static str,
        mass: f64,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { island: "Dream", species: "Adelie", mass: 3.0 },
            Row { island: "Biscoe", species: "Gentoo", mass: 5.0 },
            Row { island: "Biscoe", species: "Adelie", mass: 4.0 },
            Row { island: "Biscoe", species: "Gentoo", mass: 6.0 },
            Row { island: "", species: "Adelie", mass: 9.0 },
        ]
    }

    fn island(r: &Row) -> Option<String> {
        Some(r.island.to_string())
    }

    fn species(r: &Row) -> Option<String> {
        Some(r.species.to_string())
    }

    const BY_ISLAND_SPECIES: [KeyFn<'static, Row>; 2] = [&island, &species];

    #[test]
    fn test_two_level_counts() {
        let tree = rollup(&rows(), &BY_ISLAND_SPECIES, |leaf| leaf.len());

        assert_eq!(tree.child("Biscoe").and_then(|t| t.child("Gentoo")).and_then(Rollup::value), Some(&2));
        assert_eq!(tree.child("Biscoe").and_then(|t| t.child("Adelie")).and_then(Rollup::value), Some(&1));
        assert_eq!(tree.child("Dream").map(Rollup::total), Some(1));
        assert_eq!(tree.total(), 4);
    }

    #[test]
    fn test_missing_key_skips_record() {
        let tree = rollup(&rows(), &BY_ISLAND_SPECIES[..1], |leaf| leaf.len());
        assert!(tree.child("").is_none());
        assert_eq!(tree.total(), 4);
    }

    #[test]
    fn test_custom_reducer() {
        let tree = rollup(&rows(), &BY_ISLAND_SPECIES[1..], |leaf| {
            leaf.iter().map(|r| r.mass).sum::<f64>() / leaf.len() as f64
        });
        // The record without an island still counts when only species is a key
        assert_eq!(tree.child("Adelie").and_then(Rollup::value), Some(&((3.0 + 4.0 + 9.0) / 3.0)));
        assert_eq!(tree.child("Gentoo").and_then(Rollup::value), Some(&5.5));
    }

    #[test]
    fn test_leaves_in_key_order() {
        let tree = rollup(&rows(), &BY_ISLAND_SPECIES, |leaf| leaf.len());
        let paths: Vec<Vec<&str>> = tree.leaves().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec![vec!["Biscoe", "Adelie"], vec!["Biscoe", "Gentoo"], vec!["Dream", "Adelie"]]
        );
    }

    #[test]
    fn test_no_keys_is_single_leaf() {
        let tree = rollup(&rows(), &[], |leaf| leaf.len());
        assert_eq!(tree, Rollup::Leaf(5));
    }

    #[test]
    fn test_empty_input_is_empty_branch() {
        let tree = rollup(&Vec::<Row>::new(), &BY_ISLAND_SPECIES[..1], |leaf| leaf.len());
        assert_eq!(tree, Rollup::Branch(BTreeMap::new()));
    }
}
