// multi-key grouping
//
// Records are nested level by level. Inside each level, groups appear in the
// order their key was first seen in the input, never sorted.
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::error::{ReconcileError, Result};
use crate::core::options::MissingKeyPolicy;
use crate::core::types::GroupKey;

/// A node of the grouped tree. The root has no key and depth 0; innermost
/// groups hold the records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group<R> {
    key: Option<GroupKey>,
    depth: usize,
    body: GroupBody<R>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBody<R> {
    Groups(Vec<Group<R>>),
    Records(Vec<R>),
}

impl<R> Group<R> {
    pub fn key(&self) -> Option<&GroupKey> {
        self.key.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn body(&self) -> &GroupBody<R> {
        &self.body
    }

    pub fn is_root(&self) -> bool {
        self.key.is_none()
    }

    pub fn is_no_parent(&self) -> bool {
        self.key.as_ref().is_some_and(GroupKey::is_no_parent)
    }

    /// Child groups; empty for innermost groups.
    pub fn groups(&self) -> &[Group<R>] {
        match &self.body {
            GroupBody::Groups(g) => g,
            GroupBody::Records(_) => &[],
        }
    }

    /// Records held directly by this group; empty above the innermost level.
    pub fn records(&self) -> &[R] {
        match &self.body {
            GroupBody::Groups(_) => &[],
            GroupBody::Records(r) => r,
        }
    }

    pub fn find(&self, key: &GroupKey) -> Option<&Group<R>> {
        self.groups().iter().find(|g| g.key.as_ref() == Some(key))
    }

    //every record below this group, in grouping order
    pub fn iter_records(&self) -> Box<dyn Iterator<Item = &R> + '_> {
        match &self.body {
            GroupBody::Records(r) => Box::new(r.iter()),
            GroupBody::Groups(g) => Box::new(g.iter().flat_map(|c| c.iter_records())),
        }
    }

    pub fn record_count(&self) -> usize {
        match &self.body {
            GroupBody::Records(r) => r.len(),
            GroupBody::Groups(g) => g.iter().map(Group::record_count).sum(),
        }
    }
}

type KeyFn<'f, R> = Box<dyn Fn(&R) -> GroupKey + 'f>;

/// Ordered list of key extractors applied outermost first.
///
/// Required levels are added with [`key`](Self::key); the optional parent
/// reference with [`parent_key`](Self::parent_key).
pub struct Grouper<'f, R> {
    levels: Vec<KeyFn<'f, R>>,
    missing_keys: MissingKeyPolicy,
}

impl<R> Default for Grouper<'_, R> {
    fn default() -> Self {
        Self::new()
    }
}

struct Keyed<R> {
    keys: Vec<GroupKey>,
    record: R,
}

impl<'f, R> Grouper<'f, R> {
    pub fn new() -> Self {
        Self {
            levels: Vec::new(),
            missing_keys: MissingKeyPolicy::default(),
        }
    }

    /// Required level. Return `None` (or `GroupKey::Missing`) when the record
    /// lacks the field.
    pub fn key<F, K>(mut self, f: F) -> Self
    where
        F: Fn(&R) -> K + 'f,
        K: Into<GroupKey>,
    {
        self.levels.push(Box::new(move |r| f(r).into()));
        self
    }

    /// Optional parent reference; `None` becomes `GroupKey::NoParent`.
    pub fn parent_key<F, K>(mut self, f: F) -> Self
    where
        F: Fn(&R) -> Option<K> + 'f,
        K: Into<GroupKey>,
    {
        self.levels.push(Box::new(move |r| GroupKey::parent(f(r))));
        self
    }

    pub fn missing_keys(mut self, policy: MissingKeyPolicy) -> Self {
        self.missing_keys = policy;
        self
    }

    pub fn levels(&self) -> usize {
        self.levels.len()
    }

    pub fn group<I>(&self, records: I) -> Result<Group<R>>
    where
        I: IntoIterator<Item = R>,
    {
        if self.levels.is_empty() {
            return Err(ReconcileError::NoKeyLevels);
        }

        let mut keyed = Vec::new();
        for (idx, record) in records.into_iter().enumerate() {
            let keys: Vec<GroupKey> = self.levels.iter().map(|f| f(&record)).collect();

            if let Some(level) = keys.iter().position(GroupKey::is_missing) {
                match self.missing_keys {
                    MissingKeyPolicy::Reject => {
                        return Err(ReconcileError::MissingKey { record: idx, level });
                    }
                    MissingKeyPolicy::Permit => {
                        warn!(record = idx, level, "grouping record under a missing key");
                    }
                }
            }
            keyed.push(Keyed { keys, record });
        }

        let count = keyed.len();
        let groups = nest(keyed, 0, self.levels.len());
        debug!(records = count, top_level_groups = groups.len(), "grouped records");

        Ok(Group {
            key: None,
            depth: 0,
            body: GroupBody::Groups(groups),
        })
    }
}

fn nest<R>(items: Vec<Keyed<R>>, level: usize, levels: usize) -> Vec<Group<R>> {
    let mut buckets: IndexMap<GroupKey, Vec<Keyed<R>>> = IndexMap::new();
    for item in items {
        buckets.entry(item.keys[level].clone()).or_default().push(item);
    }

    let depth = level + 1;
    buckets
        .into_iter()
        .map(|(key, items)| {
            let body = if depth == levels {
                GroupBody::Records(items.into_iter().map(|k| k.record).collect())
            } else {
                GroupBody::Groups(nest(items, depth, levels))
            };
            Group { key: Some(key), depth, body }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        a: u32,
        b: u32,
        p: Option<u32>,
    }

    fn row(a: u32, b: u32, p: Option<u32>) -> Row {
        Row { a, b, p }
    }

    #[derive(Debug)]
    struct Loose {
        k: Option<&'static str>,
        p: Option<&'static str>,
    }

    fn loose(k: Option<&'static str>, p: Option<&'static str>) -> Loose {
        Loose { k, p }
    }

    fn grouper<'f>() -> Grouper<'f, Row> {
        Grouper::new()
            .key(|r: &Row| r.a)
            .key(|r: &Row| r.b)
            .parent_key(|r: &Row| r.p)
    }

    #[test]
    fn groups_three_levels_in_first_occurrence_order() {
        let rows = vec![
            row(2, 1, None),
            row(1, 1, None),
            row(2, 3, Some(9)),
            row(2, 1, Some(4)),
            row(1, 1, None),
        ];

        let root = grouper().group(rows).unwrap();

        assert!(root.is_root());
        assert_eq!(root.depth(), 0);

        let top: Vec<_> = root.groups().iter().map(|g| g.key().unwrap().clone()).collect();
        assert_eq!(top, vec![GroupKey::from(2u32), GroupKey::from(1u32)]);

        let a2 = root.find(&GroupKey::from(2u32)).unwrap();
        assert_eq!(a2.depth(), 1);
        let bs: Vec<_> = a2.groups().iter().map(|g| g.key().unwrap().clone()).collect();
        assert_eq!(bs, vec![GroupKey::from(1u32), GroupKey::from(3u32)]);

        let b1 = a2.find(&GroupKey::from(1u32)).unwrap();
        let ps: Vec<_> = b1.groups().iter().map(|g| g.key().unwrap().clone()).collect();
        assert_eq!(ps, vec![GroupKey::NoParent, GroupKey::from(4u32)]);

        let leaf = b1.find(&GroupKey::NoParent).unwrap();
        assert_eq!(leaf.depth(), 3);
        assert!(leaf.is_no_parent());
        assert!(leaf.groups().is_empty());
        assert_eq!(leaf.records(), &[row(2, 1, None)]);

        let a1_leaf = root
            .find(&GroupKey::from(1u32))
            .and_then(|g| g.find(&GroupKey::from(1u32)))
            .and_then(|g| g.find(&GroupKey::NoParent))
            .unwrap();
        assert_eq!(a1_leaf.records().len(), 2);

        assert_eq!(root.record_count(), 5);
    }

    #[test]
    fn empty_input_yields_bare_root() {
        let root = grouper().group(Vec::new()).unwrap();
        assert!(root.groups().is_empty());
        assert_eq!(root.record_count(), 0);
    }

    #[test]
    fn grouper_without_levels_is_rejected() {
        let err = Grouper::<Row>::new().group(vec![row(1, 1, None)]).unwrap_err();
        assert!(matches!(err, ReconcileError::NoKeyLevels));
    }

    #[test]
    fn missing_required_key_fails_fast_by_default() {
        let rows = vec![loose(Some("x"), None), loose(None, Some("p"))];
        let err = Grouper::new()
            .key(|r: &Loose| r.k)
            .parent_key(|r: &Loose| r.p)
            .group(rows)
            .unwrap_err();

        match err {
            ReconcileError::MissingKey { record, level } => {
                assert_eq!(record, 1);
                assert_eq!(level, 0);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn missing_required_key_buckets_when_permitted() {
        let rows = vec![loose(Some("x"), None), loose(None, Some("p")), loose(None, None)];
        let root = Grouper::new()
            .key(|r: &Loose| r.k)
            .parent_key(|r: &Loose| r.p)
            .missing_keys(MissingKeyPolicy::Permit)
            .group(rows)
            .unwrap();

        let missing = root.find(&GroupKey::Missing).unwrap();
        assert_eq!(missing.groups().len(), 2);
        assert_eq!(missing.record_count(), 2);
    }

    #[test]
    fn iter_records_follows_grouping_order() {
        let rows = vec![row(1, 1, None), row(2, 1, None), row(1, 2, None)];
        let root = grouper().group(rows).unwrap();
        let order: Vec<_> = root.iter_records().map(|r| (r.a, r.b)).collect();
        assert_eq!(order, vec![(1, 1), (1, 2), (2, 1)]);
    }
}
