//! Place-name index for autocomplete
//!
//! A sparse trie keyed by cleaned names (see [`clean_name`]). Each terminal
//! node remembers the display name last inserted under its key and every
//! location sharing that key. Children are kept in a `BTreeMap`, so every
//! traversal visits them in ascending character order and results are
//! deterministic for identical input.

use crate::VertexId;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Single-character wildcard accepted by [`NameIndex::pattern_search`]
pub const WILDCARD: char = '.';

/// Normalize a name into a search key
///
/// Drops every character that is not an ASCII letter or a space, then
/// lower-cases the rest. Idempotent and lossy: several display names can
/// collapse onto the same key.
pub fn clean_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A named location attached to a graph vertex
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocationRecord {
    pub id: VertexId,
    pub lon: f64,
    pub lat: f64,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
struct TrieNode {
    /// Display name, set only on terminal nodes
    name: Option<String>,
    locations: Vec<LocationRecord>,
    children: BTreeMap<char, TrieNode>,
}

/// Prefix trie over cleaned place names
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    root: TrieNode,
    keys: usize,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` under `cleaned_key`, creating nodes as needed
    ///
    /// Records accumulate; the display name is that of the latest insertion.
    pub fn insert(&mut self, cleaned_key: &str, display_name: &str, record: LocationRecord) {
        let mut node = &mut self.root;
        for c in cleaned_key.chars() {
            node = node.children.entry(c).or_default();
        }

        if node.name.is_none() {
            self.keys += 1;
        }
        node.name = Some(display_name.to_string());
        node.locations.push(record);
    }

    fn find(&self, key: &str) -> Option<&TrieNode> {
        key.chars()
            .try_fold(&self.root, |node, c| node.children.get(&c))
    }

    /// Display names of every key starting with `cleaned_prefix`
    ///
    /// Depth-first, a terminal before its descendants, children in ascending
    /// character order. Empty when no key has this prefix.
    pub fn prefix_search(&self, cleaned_prefix: &str) -> Vec<String> {
        let mut results = Vec::new();
        if let Some(node) = self.find(cleaned_prefix) {
            collect_names(node, &mut results);
        }
        results
    }

    /// All locations stored under exactly `cleaned_key`
    ///
    /// `None` when no terminal exists at that path, including when the path
    /// exists only as the prefix of longer keys.
    pub fn exact_lookup(&self, cleaned_key: &str) -> Option<&[LocationRecord]> {
        let node = self.find(cleaned_key)?;
        node.name.as_ref()?;
        Some(&node.locations)
    }

    /// Whether a terminal exists for `cleaned_key`
    #[inline]
    pub fn contains(&self, cleaned_key: &str) -> bool {
        self.exact_lookup(cleaned_key).is_some()
    }

    /// Display names of keys matching `pattern` position by position
    ///
    /// [`WILDCARD`] matches any single character. Only keys with exactly as
    /// many characters as the pattern can match.
    pub fn pattern_search(&self, pattern: &str) -> Vec<String> {
        let pattern: Vec<char> = pattern.chars().collect();
        let mut results = Vec::new();
        collect_matches(&self.root, &pattern, &mut results);
        results
    }

    /// Number of distinct keys
    #[inline]
    pub fn len(&self) -> usize {
        self.keys
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys == 0
    }
}

fn collect_names(node: &TrieNode, results: &mut Vec<String>) {
    if let Some(name) = &node.name {
        results.push(name.clone());
    }
    for child in node.children.values() {
        collect_names(child, results);
    }
}

fn collect_matches(node: &TrieNode, pattern: &[char], results: &mut Vec<String>) {
    let Some((&first, rest)) = pattern.split_first() else {
        if let Some(name) = &node.name {
            results.push(name.clone());
        }
        return;
    };

    if first == WILDCARD {
        for child in node.children.values() {
            collect_matches(child, rest, results);
        }
    } else if let Some(child) = node.children.get(&first) {
        collect_matches(child, rest, results);
    }
}
