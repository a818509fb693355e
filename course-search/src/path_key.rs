//! Tree relationships between facet values, read straight off their keys.
//!
//! A key is a one-letter tag, a dash, then the node path: `P-00020003` is a
//! node with descendants, `L-000200030005` a leaf. A node is an ancestor of
//! every key whose path extends its own. No tree is ever materialized.

use std::borrow::Cow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyTag {
    Leaf,
    Parent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathKey<'a> {
    pub tag: KeyTag,
    pub path: &'a str,
}

impl<'a> PathKey<'a> {
    /// `None` for keys without an `L-`/`P-` tag; those are opaque values.
    pub fn parse(key: &'a str) -> Option<Self> {
        let tag = match key.get(..2)? {
            "L-" => KeyTag::Leaf,
            "P-" => KeyTag::Parent,
            _ => return None,
        };
        Some(Self {
            tag,
            path: &key[2..],
        })
    }

    pub fn is_parent(&self) -> bool {
        self.tag == KeyTag::Parent
    }
}

/// True when `key` is a parent node and `of_key` lies strictly below it.
pub fn is_ancestor(key: &str, of_key: &str) -> bool {
    let (Some(node), Some(other)) = (PathKey::parse(key), PathKey::parse(of_key)) else {
        return false;
    };
    node.is_parent() && other.path.len() > node.path.len() && other.path.starts_with(node.path)
}

pub fn is_descendant(key: &str, of_key: &str) -> bool {
    is_ancestor(of_key, key)
}

/// `P-X` and `L-X` denote the same tree position under different tags.
fn same_position(a: &str, b: &str) -> bool {
    match (PathKey::parse(a), PathKey::parse(b)) {
        (Some(left), Some(right)) => a != b && left.path == right.path,
        _ => false,
    }
}

/// True when selecting `new_key` must deselect `existing`.
pub fn supersedes(new_key: &str, existing: &str) -> bool {
    is_ancestor(existing, new_key)
        || is_descendant(existing, new_key)
        || same_position(existing, new_key)
}

/// Selection of a non-drilldown filter after adding `new_key`.
///
/// Ancestors and descendants of `new_key` are dropped, unrelated values keep
/// their order, and `new_key` goes last. When `new_key` is already selected the
/// input comes back borrowed, untouched.
pub fn resolve_on_add<'a>(existing: &'a [String], new_key: &str) -> Cow<'a, [String]> {
    if existing.iter().any(|value| value == new_key) {
        return Cow::Borrowed(existing);
    }
    let mut next: Vec<String> = existing
        .iter()
        .filter(|value| !supersedes(new_key, value))
        .cloned()
        .collect();
    next.push(new_key.to_string());
    Cow::Owned(next)
}
