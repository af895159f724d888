//! Path trie that maps dotted key patterns to values.
//!
//! Responsibilities:
//! - Store values under patterns made of literal and `*` segments.
//! - Resolve a concrete key to the value of the best matching pattern.
//!
//! Does NOT handle:
//! - Conflict detection between registrations (see `schema::SchemaRegistry`).
//! - Locking; callers wrap the matcher in their own lock.
//!
//! Invariants:
//! - `*` in a pattern matches exactly one segment, and only patterns create
//!   wildcard nodes. Lookups never allocate nodes.
//! - At every level an exact child is tried first; the wildcard child is the
//!   only fallback, taken when the exact child is missing or its branch yields
//!   no value.

use std::collections::HashMap;

use crate::constants::{KEY_SEPARATOR, WILDCARD};

#[derive(Debug)]
struct Node<T> {
    children: HashMap<String, Node<T>>,
    wildcard: Option<Box<Node<T>>>,
    content: Option<T>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            wildcard: None,
            content: None,
        }
    }
}

impl<T> Node<T> {
    fn find(&self, parts: &[&str]) -> Option<&T> {
        let Some((head, rest)) = parts.split_first() else {
            return self.content.as_ref();
        };

        if *head == WILDCARD {
            return self.wildcard.as_ref().and_then(|w| w.find(rest));
        }

        self.children
            .get(*head)
            .and_then(|child| child.find(rest))
            .or_else(|| self.wildcard.as_ref().and_then(|w| w.find(rest)))
    }

    fn find_exact(&self, parts: &[&str]) -> Option<&T> {
        let Some((head, rest)) = parts.split_first() else {
            return self.content.as_ref();
        };

        if *head == WILDCARD {
            self.wildcard.as_ref().and_then(|w| w.find_exact(rest))
        } else {
            self.children.get(*head).and_then(|c| c.find_exact(rest))
        }
    }

    fn node_mut(&mut self, parts: &[&str]) -> &mut Node<T> {
        let Some((head, rest)) = parts.split_first() else {
            return self;
        };

        let next = if *head == WILDCARD {
            self.wildcard.get_or_insert_with(Box::default).as_mut()
        } else {
            self.children.entry((*head).to_string()).or_default()
        };
        next.node_mut(rest)
    }
}

/// A segment trie keyed by separator-delimited patterns.
#[derive(Debug)]
pub struct Matcher<T> {
    separator: String,
    root: Node<T>,
    len: usize,
}

impl<T> Default for Matcher<T> {
    fn default() -> Self {
        Self::new(KEY_SEPARATOR)
    }
}

impl<T> Matcher<T> {
    /// Create an empty matcher splitting keys on `separator`.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            root: Node::default(),
            len: 0,
        }
    }

    fn split<'a>(&self, path: &'a str) -> Vec<&'a str> {
        path.split(self.separator.as_str()).collect()
    }

    /// Store `content` under `pattern`, returning the value it replaces.
    pub fn set(&mut self, pattern: &str, content: T) -> Option<T> {
        let parts = self.split(pattern);
        let previous = self.root.node_mut(&parts).content.replace(content);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Resolve a concrete key.
    pub fn get(&self, path: &str) -> Option<&T> {
        self.root.find(&self.split(path))
    }

    /// Look up the value stored under exactly this pattern, without any
    /// wildcard fallback.
    pub fn get_pattern(&self, pattern: &str) -> Option<&T> {
        self.root.find_exact(&self.split(pattern))
    }

    /// Number of patterns holding a value.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
