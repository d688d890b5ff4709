//! In-memory hierarchy of issue types with decomposed storage
//!
//! The [`Hierarchy`] knows nothing about spreadsheets or XML. It stores the
//! extracted records in an arena and keeps two indexes over it:
//! - `by_key`: index key → arena slot
//! - `by_parent`: parent identifier → ordered list of child keys
//!
//! A record's index key is its identifier, unless that identifier has already
//! been seen, in which case it is stored under `{id}#{n}` with the smallest
//! `n ≥ 2` that is still free. The same key is used in both indexes.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::instrument;

use crate::domain::IssueRecord;

/// An in-memory representation of a typology.
#[derive(Debug, Default)]
pub struct Hierarchy {
    /// Records in source order.
    records: Vec<IssueRecord>,

    /// The index key of each record, parallel to `records`.
    keys: Vec<String>,

    /// Lookup from index key to arena slot.
    by_key: HashMap<String, usize>,

    /// Child keys of each parent identifier, in first-seen order.
    /// The empty string holds the root-level issues.
    by_parent: HashMap<String, Vec<String>>,

    /// Keys that were synthesized because an identifier repeated.
    duplicates: Vec<Duplicate>,
}

/// A record whose identifier was already taken when it was ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    /// The identifier as it appears in the source.
    pub id: String,
    /// The key the record was stored under instead.
    pub key: String,
}

/// Errors that can occur while walking the hierarchy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    /// No record has an empty parent identifier.
    #[error("No root-level issue types were found")]
    NoRoots,

    /// A child list refers to a key with no stored record.
    ///
    /// [`Hierarchy::ingest`] stores a record for every key it lists, so this
    /// is a consistency guard rather than a reachable outcome.
    #[error("issue type '{0}' is referenced but was never defined")]
    UnresolvedReference(String),

    /// A key was reached twice during the walk.
    ///
    /// Every key sits in exactly one child list, so a walk from the roots
    /// cannot meet a key twice. Parent cycles are never reached from a root
    /// and show up in [`Walk::orphans`] instead.
    #[error("issue type '{0}' is its own ancestor")]
    CyclicReference(String),
}

/// A record placed in the hierarchy, as seen during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueNode<'a> {
    /// The index key (differs from `record.id()` for duplicates).
    pub key: &'a str,
    /// The record content.
    pub record: &'a IssueRecord,
    /// Nesting depth, `0` for root-level issues.
    pub depth: usize,
}

/// A single step of a depth-first walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    /// Enter a node. Its children follow, then the matching [`Step::Close`].
    Open(IssueNode<'a>),
    /// Leave the most recently opened node.
    Close,
}

/// The result of walking the hierarchy from the root.
#[derive(Debug)]
pub struct Walk<'a> {
    /// Open/close steps in document order.
    pub steps: Vec<Step<'a>>,
    /// Keys of records that are not reachable from the root, in source order.
    pub orphans: Vec<&'a str>,
    /// The deepest level reached.
    pub max_depth: usize,
}

impl Walk<'_> {
    /// The number of nodes visited.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, Step::Open(_)))
            .count()
    }
}

struct Frame<'a> {
    children: std::slice::Iter<'a, String>,
    depth: usize,
    opened: bool,
}

impl Hierarchy {
    /// Creates a new hierarchy with pre-allocated capacity for the given number
    /// of records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            keys: Vec::with_capacity(capacity),
            by_key: HashMap::with_capacity(capacity),
            by_parent: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Adds a record, returning the key it was stored under.
    ///
    /// Records must be ingested in source order; child lists keep that order.
    pub fn ingest(&mut self, record: IssueRecord) -> &str {
        let key = self.free_key(record.id());
        if key != record.id() {
            tracing::warn!(id = record.id(), %key, "duplicate issue type id");
            self.duplicates.push(Duplicate {
                id: record.id().to_string(),
                key: key.clone(),
            });
        }

        let slot = self.records.len();
        self.by_key.insert(key.clone(), slot);
        self.by_parent
            .entry(record.parent_id().to_string())
            .or_default()
            .push(key.clone());
        self.records.push(record);
        self.keys.push(key);

        &self.keys[slot]
    }

    fn free_key(&self, id: &str) -> String {
        if !self.by_key.contains_key(id) {
            return id.to_string();
        }
        (2_usize..)
            .map(|n| format!("{id}#{n}"))
            .find(|candidate| !self.by_key.contains_key(candidate))
            .unwrap_or_else(|| unreachable!("the key space is unbounded"))
    }

    /// Retrieves a record by its index key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&IssueRecord> {
        self.by_key.get(key).map(|&slot| &self.records[slot])
    }

    /// The child keys listed under a parent identifier, in source order.
    ///
    /// The empty string yields the root-level keys.
    #[must_use]
    pub fn children(&self, parent_id: &str) -> &[String] {
        self.by_parent.get(parent_id).map_or(&[][..], Vec::as_slice)
    }

    /// Records whose identifier had already been taken.
    #[must_use]
    pub fn duplicates(&self) -> &[Duplicate] {
        &self.duplicates
    }

    /// The number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were ingested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Walks the hierarchy depth-first from the root-level issues.
    ///
    /// Siblings are visited in the order they were ingested. The walk uses an
    /// explicit stack, so deep hierarchies do not grow the call stack.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::NoRoots`] if there are no root-level issues.
    /// The other variants guard the index invariants and do not occur for a
    /// hierarchy built with [`Hierarchy::ingest`].
    #[instrument(level = "debug", skip(self), fields(records = self.records.len()))]
    pub fn walk(&self) -> Result<Walk<'_>, HierarchyError> {
        let roots = self.children("");
        if roots.is_empty() {
            return Err(HierarchyError::NoRoots);
        }

        let mut steps = Vec::with_capacity(self.records.len() * 2);
        let mut visited: HashSet<&str> = HashSet::with_capacity(self.records.len());
        let mut max_depth = 0;
        let mut stack = vec![Frame {
            children: roots.iter(),
            depth: 0,
            opened: false,
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(key) = frame.children.next() else {
                if stack.pop().is_some_and(|frame| frame.opened) {
                    steps.push(Step::Close);
                }
                continue;
            };
            let depth = frame.depth;

            let &slot = self
                .by_key
                .get(key)
                .ok_or_else(|| HierarchyError::UnresolvedReference(key.clone()))?;
            if !visited.insert(key.as_str()) {
                return Err(HierarchyError::CyclicReference(key.clone()));
            }

            max_depth = max_depth.max(depth);
            steps.push(Step::Open(IssueNode {
                key,
                record: &self.records[slot],
                depth,
            }));
            stack.push(Frame {
                children: self.children(key).iter(),
                depth: depth + 1,
                opened: true,
            });
        }

        let orphans = self
            .keys
            .iter()
            .map(String::as_str)
            .filter(|key| !visited.contains(key))
            .collect();

        Ok(Walk {
            steps,
            orphans,
            max_depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use non_empty_string::NonEmptyString;

    use super::*;

    fn record(id: &str, parent: &str) -> IssueRecord {
        IssueRecord::new(
            NonEmptyString::new(id.to_string()).unwrap(),
            NonEmptyString::new(format!("Issue {id}")).unwrap(),
        )
        .with_parent(parent)
    }

    fn build(rows: &[(&str, &str)]) -> Hierarchy {
        let mut hierarchy = Hierarchy::default();
        for (id, parent) in rows {
            hierarchy.ingest(record(id, parent));
        }
        hierarchy
    }

    /// Renders a walk as `key@depth` for opens and `/` for closes.
    fn trace(walk: &Walk<'_>) -> Vec<String> {
        walk.steps
            .iter()
            .map(|step| match step {
                Step::Open(node) => format!("{}@{}", node.key, node.depth),
                Step::Close => "/".to_string(),
            })
            .collect()
    }

    #[test]
    fn roots_keep_insertion_order() {
        let hierarchy = build(&[("a", ""), ("b", ""), ("c", "")]);

        let walk = hierarchy.walk().unwrap();

        assert_eq!(trace(&walk), ["a@0", "/", "b@0", "/", "c@0", "/"]);
        assert_eq!(walk.max_depth, 0);
    }

    #[test]
    fn depth_follows_parent_links() {
        let hierarchy = build(&[("a", ""), ("b", "a"), ("c", "b"), ("d", "a")]);

        let walk = hierarchy.walk().unwrap();

        assert_eq!(
            trace(&walk),
            ["a@0", "b@1", "c@2", "/", "/", "d@1", "/", "/"]
        );
        assert_eq!(walk.max_depth, 2);
        assert_eq!(walk.node_count(), 4);
    }

    #[test]
    fn children_may_precede_their_parent() {
        let hierarchy = build(&[("b", "a"), ("a", "")]);

        let walk = hierarchy.walk().unwrap();

        assert_eq!(trace(&walk), ["a@0", "b@1", "/", "/"]);
    }

    #[test]
    fn duplicate_under_same_parent_keeps_both() {
        let mut hierarchy = Hierarchy::default();
        let first = hierarchy.ingest(record("X", "")).to_string();
        let second = hierarchy.ingest(record("X", "")).to_string();

        assert_eq!(first, "X");
        assert_eq!(second, "X#2");
        assert_eq!(hierarchy.children(""), ["X", "X#2"]);
        assert_eq!(
            hierarchy.duplicates(),
            [Duplicate {
                id: "X".to_string(),
                key: "X#2".to_string()
            }]
        );

        let walk = hierarchy.walk().unwrap();
        assert_eq!(trace(&walk), ["X@0", "/", "X#2@0", "/"]);
    }

    #[test]
    fn duplicate_under_other_parent_resolves_to_its_own_content() {
        let mut hierarchy = Hierarchy::default();
        hierarchy.ingest(record("A", ""));
        hierarchy.ingest(record("B", ""));
        hierarchy.ingest(record("X", "A").with_notes("first"));
        hierarchy.ingest(record("X", "B").with_notes("second"));

        let walk = hierarchy.walk().unwrap();
        let notes: Vec<_> = walk
            .steps
            .iter()
            .filter_map(|step| match step {
                Step::Open(node) if node.record.id() == "X" => Some(node.record.notes()),
                _ => None,
            })
            .collect();

        assert_eq!(notes, ["first", "second"]);
    }

    #[test]
    fn repeated_duplicates_get_increasing_suffixes() {
        let hierarchy = build(&[("X", ""), ("X", ""), ("X", "")]);
        assert_eq!(hierarchy.children(""), ["X", "X#2", "X#3"]);
    }

    #[test]
    fn synthesized_key_skips_taken_literal_ids() {
        let hierarchy = build(&[("X#2", ""), ("X", ""), ("X", "")]);
        assert_eq!(hierarchy.children(""), ["X#2", "X", "X#3"]);
    }

    #[test]
    fn unreachable_records_are_reported_as_orphans() {
        let hierarchy = build(&[("a", ""), ("b", "missing"), ("self", "self")]);

        let walk = hierarchy.walk().unwrap();

        assert_eq!(trace(&walk), ["a@0", "/"]);
        assert_eq!(walk.orphans, ["b", "self"]);
    }

    #[test]
    fn parent_cycles_become_orphans() {
        let hierarchy = build(&[("root", ""), ("p", "q"), ("q", "p")]);

        let walk = hierarchy.walk().unwrap();

        assert_eq!(walk.orphans, ["p", "q"]);
    }

    #[test]
    fn duplicate_id_under_its_own_descendant_does_not_loop() {
        let hierarchy = build(&[("a", ""), ("b", "a"), ("a", "b")]);

        let walk = hierarchy.walk().unwrap();

        assert_eq!(trace(&walk), ["a@0", "b@1", "a#2@2", "/", "/", "/"]);
        assert!(walk.orphans.is_empty());
    }

    #[test]
    fn no_roots_is_an_error() {
        let hierarchy = build(&[("a", "b"), ("b", "a")]);
        assert_eq!(hierarchy.walk().unwrap_err(), HierarchyError::NoRoots);
    }

    #[test]
    fn empty_hierarchy_has_no_roots() {
        let hierarchy = Hierarchy::with_capacity(4);
        assert!(hierarchy.is_empty());
        assert_eq!(hierarchy.walk().unwrap_err(), HierarchyError::NoRoots);
    }

    #[test]
    fn get_looks_up_by_key() {
        let hierarchy = build(&[("X", ""), ("X", "")]);

        assert_eq!(hierarchy.len(), 2);
        assert_eq!(hierarchy.get("X#2").map(IssueRecord::id), Some("X"));
        assert!(hierarchy.get("Y").is_none());
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let ids: Vec<String> = (0..10_000).map(|i| format!("n{i}")).collect();
        let mut hierarchy = Hierarchy::with_capacity(ids.len());
        hierarchy.ingest(record(&ids[0], ""));
        for pair in ids.windows(2) {
            hierarchy.ingest(record(&pair[1], &pair[0]));
        }

        let walk = hierarchy.walk().unwrap();

        assert_eq!(walk.max_depth, 9_999);
        assert_eq!(walk.steps.len(), 20_000);
    }
}
