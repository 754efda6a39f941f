//! Shortest unique flag aliases
//!
//! Paths are inserted into a trie keyed by their segments in reverse, so
//! every node stands for a trailing suffix and counts how many paths end
//! with it. A path's alias is its shortest suffix that no other path shares.

use crate::error::{Error, Result};
use crate::path::FieldPath;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
struct SuffixNode {
    children: HashMap<String, SuffixNode>,
    terminals: usize,
}

impl SuffixNode {
    fn insert(&mut self, path: &FieldPath) {
        let mut node = self;
        for segment in path.segments().iter().rev() {
            node = node.children.entry(segment.clone()).or_default();
            node.terminals += 1;
        }
    }

    /// Number of segments in the shortest suffix of `path` owned by it alone
    fn unique_suffix_len(&self, path: &FieldPath) -> usize {
        let mut node = self;
        for (depth, segment) in path.segments().iter().rev().enumerate() {
            match node.children.get(segment) {
                Some(child) if child.terminals <= 1 => return depth + 1,
                Some(child) => node = child,
                None => return depth + 1,
            }
        }
        path.len()
    }
}

/// Bijection between full dotted paths and their short aliases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagAliases {
    by_alias: BTreeMap<String, FieldPath>,
    by_path: BTreeMap<FieldPath, String>,
}

impl FlagAliases {
    pub fn alias_of(&self, path: &FieldPath) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    pub fn path_of(&self, alias: &str) -> Option<&FieldPath> {
        self.by_alias.get(alias)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// `(full path, alias)` pairs ordered by path
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &str)> {
        self.by_path.iter().map(|(p, a)| (p, a.as_str()))
    }
}

/// Compute the shortest unique trailing-suffix alias of every path
///
/// A path that is itself a suffix of another path keeps its full form.
pub fn shorten(paths: &[FieldPath]) -> Result<FlagAliases> {
    let mut trie = SuffixNode::default();
    let mut aliases = FlagAliases::default();

    for path in paths {
        if path.is_empty() {
            return Err(Error::StructuralMismatch("empty flag path".to_string()));
        }
        if aliases.by_path.insert(path.clone(), String::new()).is_some() {
            return Err(Error::StructuralMismatch(format!(
                "duplicate flag path '{path}'"
            )));
        }
        trie.insert(path);
    }

    for path in paths {
        let alias = path.suffix(trie.unique_suffix_len(path)).join();
        aliases.by_alias.insert(alias.clone(), path.clone());
        aliases.by_path.insert(path.clone(), alias);
    }
    Ok(aliases)
}
