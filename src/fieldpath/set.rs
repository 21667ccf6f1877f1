//! Set of field paths, stored as a tree keyed by segment.

use super::path::{FieldPath, PathError, Segment};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// FieldSet is a set of field paths.
///
/// Paths are stored as a tree: `members` holds the segments that end a path
/// at this level, `children` holds the subtrees of longer paths. A path and
/// one of its extensions (`metadata.labels` and `metadata.labels.app`) can
/// both be members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    members: BTreeSet<Segment>,
    children: BTreeMap<Segment, FieldSet>,
}

impl FieldSet {
    /// Creates a new empty set.
    pub fn new() -> Self {
        FieldSet {
            members: BTreeSet::new(),
            children: BTreeMap::new(),
        }
    }

    /// Builds a set by parsing each dotted/bracketed path string.
    pub fn parse_all<'a, I>(paths: I) -> Result<FieldSet, PathError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = FieldSet::new();
        for path in paths {
            set.insert(&FieldPath::parse(path)?);
        }
        Ok(set)
    }

    /// Returns true if the set contains no paths.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.children.is_empty()
    }

    /// Returns the number of paths in the set.
    pub fn len(&self) -> usize {
        self.members.len() + self.children.values().map(FieldSet::len).sum::<usize>()
    }

    /// Returns true if the set contains the given path.
    pub fn has(&self, path: &FieldPath) -> bool {
        self.has_segments(path.as_slice())
    }

    fn has_segments(&self, segments: &[Segment]) -> bool {
        match segments {
            [] => false,
            [last] => self.members.contains(last),
            [first, rest @ ..] => self
                .children
                .get(first)
                .is_some_and(|child| child.has_segments(rest)),
        }
    }

    /// Inserts a path into the set. The empty path is ignored.
    pub fn insert(&mut self, path: &FieldPath) {
        self.insert_segments(path.as_slice());
    }

    fn insert_segments(&mut self, segments: &[Segment]) {
        match segments {
            [] => {}
            [last] => {
                self.members.insert(last.clone());
            }
            [first, rest @ ..] => self
                .children
                .entry(first.clone())
                .or_default()
                .insert_segments(rest),
        }
    }

    /// Returns the union of two sets.
    pub fn union(&self, other: &FieldSet) -> FieldSet {
        let mut result = self.clone();
        result.union_into(other);
        result
    }

    fn union_into(&mut self, other: &FieldSet) {
        self.members.extend(other.members.iter().cloned());
        for (key, other_child) in &other.children {
            match self.children.get_mut(key) {
                Some(self_child) => self_child.union_into(other_child),
                None => {
                    self.children.insert(key.clone(), other_child.clone());
                }
            }
        }
    }

    /// Returns the intersection of two sets.
    pub fn intersection(&self, other: &FieldSet) -> FieldSet {
        let members = self.members.intersection(&other.members).cloned().collect();

        let mut children = BTreeMap::new();
        for (key, self_child) in &self.children {
            if let Some(other_child) = other.children.get(key) {
                let child = self_child.intersection(other_child);
                if !child.is_empty() {
                    children.insert(key.clone(), child);
                }
            }
        }

        FieldSet { members, children }
    }

    /// Returns the difference of two sets (self - other).
    pub fn difference(&self, other: &FieldSet) -> FieldSet {
        let members = self.members.difference(&other.members).cloned().collect();

        let mut children = BTreeMap::new();
        for (key, self_child) in &self.children {
            let child = match other.children.get(key) {
                Some(other_child) => self_child.difference(other_child),
                None => self_child.clone(),
            };
            if !child.is_empty() {
                children.insert(key.clone(), child);
            }
        }

        FieldSet { members, children }
    }

    /// Iterates over all paths in the set.
    pub fn iterate<F>(&self, mut f: F)
    where
        F: FnMut(&FieldPath),
    {
        self.iterate_with_path(&mut FieldPath::new(), &mut f);
    }

    fn iterate_with_path<F>(&self, current: &mut FieldPath, f: &mut F)
    where
        F: FnMut(&FieldPath),
    {
        for member in &self.members {
            current.push(member.clone());
            f(current);
            current.pop();
        }

        for (key, child) in &self.children {
            current.push(key.clone());
            child.iterate_with_path(current, f);
            current.pop();
        }
    }

    /// Returns every path in the set, sorted.
    pub fn paths(&self) -> Vec<FieldPath> {
        let mut paths = Vec::with_capacity(self.len());
        self.iterate(|path| paths.push(path.clone()));
        paths.sort();
        paths
    }

    /// Returns the string form of every path, sorted by path.
    pub fn to_strings(&self) -> Vec<String> {
        self.paths().iter().map(ToString::to_string).collect()
    }
}

impl FromIterator<FieldPath> for FieldSet {
    fn from_iter<T: IntoIterator<Item = FieldPath>>(iter: T) -> Self {
        let mut set = FieldSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<FieldPath> for FieldSet {
    fn extend<T: IntoIterator<Item = FieldPath>>(&mut self, iter: T) {
        for path in iter {
            self.insert(&path);
        }
    }
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.paths().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", path)?;
        }
        Ok(())
    }
}
