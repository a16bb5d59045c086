//! # Sorted Set Container
//!
//! Purpose: Back the `SortedSet` payload kind: a member-to-score
//! association ordered first by score, then by member bytes, matching
//! Redis's `ZADD`/`ZRANGE` ordering rules.
//!
//! ## Design Principles
//! 1. **Two Indices, One Owner**: A `HashMap<member, score>` gives O(1) score
//!    lookup; a `BTreeMap<ScoreKey, ()>` gives ordered iteration and rank
//!    queries. Both are updated together so they never disagree about
//!    membership.
//! 2. **Total Order on Scores**: Scores are compared with `f64::total_cmp`
//!    rather than `partial_cmp`, so a `BTreeMap` key is never asked to order
//!    a `NaN` against anything and panic.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Capability contract for the `SortedSet` payload kind.
pub trait SortedSet: Default {
    /// Creates an empty sorted set.
    fn new() -> Self
    where
        Self: Sized,
    {
        Self::default()
    }

    /// Number of members.
    fn len(&self) -> usize;

    /// True if the sorted set holds no members.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts or updates `member` with `score`, returning its prior score.
    fn insert(&mut self, member: Vec<u8>, score: f64) -> Option<f64>;

    /// Removes `member`, returning true if it was present.
    fn remove(&mut self, member: &[u8]) -> bool;

    /// Returns `member`'s current score, if present.
    fn score(&self, member: &[u8]) -> Option<f64>;

    /// Iterates members in ascending (score, member) order.
    fn iter_ordered(&self) -> Box<dyn Iterator<Item = (&[u8], f64)> + '_>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ScoreKey(f64, Vec<u8>);

impl Ord for ScoreKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then_with(|| self.1.cmp(&other.1))
    }
}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Baseline `SortedSet` implementation: a member->score map plus a
/// score-ordered index keyed by `(score, member)`.
#[derive(Debug, Clone, Default)]
pub struct OrderedSortedSet {
    by_member: HashMap<Vec<u8>, f64>,
    by_score: BTreeMap<ScoreKey, ()>,
}

impl SortedSet for OrderedSortedSet {
    fn len(&self) -> usize {
        self.by_member.len()
    }

    fn insert(&mut self, member: Vec<u8>, score: f64) -> Option<f64> {
        let prior = self.by_member.insert(member.clone(), score);
        if let Some(old_score) = prior {
            self.by_score.remove(&ScoreKey(old_score, member.clone()));
        }
        self.by_score.insert(ScoreKey(score, member), ());
        prior
    }

    fn remove(&mut self, member: &[u8]) -> bool {
        match self.by_member.remove(member) {
            Some(score) => {
                self.by_score.remove(&ScoreKey(score, member.to_vec()));
                true
            }
            None => false,
        }
    }

    fn score(&self, member: &[u8]) -> Option<f64> {
        self.by_member.get(member).copied()
    }

    fn iter_ordered(&self) -> Box<dyn Iterator<Item = (&[u8], f64)> + '_> {
        Box::new(self.by_score.keys().map(|key| (key.1.as_slice(), key.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_score_roundtrip() {
        let mut zset = OrderedSortedSet::new();
        assert_eq!(zset.insert(b"a".to_vec(), 1.0), None);
        assert_eq!(zset.score(b"a"), Some(1.0));
        assert_eq!(zset.insert(b"a".to_vec(), 2.0), Some(1.0));
        assert_eq!(zset.score(b"a"), Some(2.0));
    }

    #[test]
    fn iterates_in_score_then_member_order() {
        let mut zset = OrderedSortedSet::new();
        zset.insert(b"charlie".to_vec(), 3.0);
        // inserted in reverse lexicographic order on purpose: ties must break
        // on member bytes, not insertion order.
        zset.insert(b"bravo".to_vec(), 1.0);
        zset.insert(b"alpha".to_vec(), 1.0);

        let ordered: Vec<_> = zset.iter_ordered().map(|(m, s)| (m.to_vec(), s)).collect();
        assert_eq!(
            ordered,
            vec![
                (b"alpha".to_vec(), 1.0),
                (b"bravo".to_vec(), 1.0),
                (b"charlie".to_vec(), 3.0),
            ]
        );
    }

    #[test]
    fn remove_drops_from_both_indices() {
        let mut zset = OrderedSortedSet::new();
        zset.insert(b"a".to_vec(), 1.0);
        assert!(zset.remove(b"a"));
        assert!(!zset.remove(b"a"));
        assert_eq!(zset.len(), 0);
        assert_eq!(zset.iter_ordered().count(), 0);
    }
}
