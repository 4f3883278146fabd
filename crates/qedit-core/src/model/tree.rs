//! Tree model
//!
//! The questionnaire is an explicit forest: item payloads live in one map
//! keyed by `linkId`, and the structure lives in separate ordered child
//! lists. Re-parenting or reordering only touches the lists.
//!
//! Only the dispatcher and the importer mutate a tree; everything public here
//! is a read-only structural query.

use super::item::Item;
use super::metadata::Metadata;
use super::translation::Translation;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Owner of a child list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Parent {
    /// The document itself (top-level items)
    Root,
    /// An item, by link id
    Item(String),
}

impl Parent {
    pub fn item(link_id: impl Into<String>) -> Self {
        Parent::Item(link_id.into())
    }

    pub fn link_id(&self) -> Option<&str> {
        match self {
            Parent::Root => None,
            Parent::Item(id) => Some(id),
        }
    }
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parent::Root => f.write_str("<root>"),
            Parent::Item(id) => f.write_str(id),
        }
    }
}

/// A broken structural invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("child list references unknown item '{0}'")]
    DanglingReference(String),

    #[error("item '{0}' appears in more than one child list")]
    MultipleParents(String),

    #[error("item '{0}' is not reachable from the root")]
    Unreachable(String),

    #[error("item stored under '{key}' has linkId '{link_id}'")]
    KeyMismatch { key: String, link_id: String },

    #[error("child list of '{0}' has no owning item")]
    OrphanChildList(String),

    #[error("item '{link_id}' has more than one coding with id '{id}'")]
    DuplicateCodingId { link_id: String, id: String },
}

/// The document: items, structure, metadata and translations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    items: HashMap<String, Item>,
    root: Vec<String>,
    children: HashMap<String, Vec<String>>,
    pub metadata: Metadata,
    languages: IndexMap<String, Translation>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, link_id: &str) -> Option<&Item> {
        self.items.get(link_id)
    }

    pub fn contains(&self, link_id: &str) -> bool {
        self.items.contains_key(link_id)
    }

    /// Top-level items in document order
    pub fn root(&self) -> &[String] {
        &self.root
    }

    /// Ordered children of an item (empty for leaves and unknown ids)
    pub fn children(&self, link_id: &str) -> &[String] {
        self.children
            .get(link_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Child list owned by `parent`, `None` if the parent item does not exist
    pub fn child_list(&self, parent: &Parent) -> Option<&[String]> {
        match parent {
            Parent::Root => Some(&self.root),
            Parent::Item(id) if self.items.contains_key(id) => Some(self.children(id)),
            Parent::Item(_) => None,
        }
    }

    /// Owner of the list containing `link_id`
    pub fn parent(&self, link_id: &str) -> Option<Parent> {
        self.position(link_id).map(|(parent, _)| parent)
    }

    /// Owner and index of `link_id` in its child list
    pub fn position(&self, link_id: &str) -> Option<(Parent, usize)> {
        if !self.items.contains_key(link_id) {
            return None;
        }
        if let Some(index) = self.root.iter().position(|id| id == link_id) {
            return Some((Parent::Root, index));
        }
        self.children.iter().find_map(|(owner, list)| {
            list.iter()
                .position(|id| id == link_id)
                .map(|index| (Parent::Item(owner.clone()), index))
        })
    }

    /// Pre-order walk of everything below `link_id` (the item itself excluded)
    ///
    /// The iterator is lazy and `Clone`, so a walk can be restarted.
    pub fn descendants(&self, link_id: &str) -> Descendants<'_> {
        Descendants::new(self, self.children(link_id))
    }

    /// Pre-order walk of the whole document
    pub fn walk(&self) -> Descendants<'_> {
        Descendants::new(self, &self.root)
    }

    /// Whether `candidate` lies strictly inside the subtree of `ancestor`
    pub fn is_descendant(&self, candidate: &str, ancestor: &str) -> bool {
        self.descendants(ancestor).any(|id| id == candidate)
    }

    /// Configured additional languages and their overlays
    pub fn languages(&self) -> &IndexMap<String, Translation> {
        &self.languages
    }

    pub fn translation(&self, language: &str) -> Option<&Translation> {
        self.languages.get(language)
    }

    /// Verify every structural invariant
    ///
    /// - every listed id has an item and every item key matches its linkId
    /// - no id is listed twice (single parent)
    /// - every item is reachable from the root
    /// - coding ids are unique within an item's code list
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (key, item) in &self.items {
            if key != &item.link_id {
                return Err(InvariantViolation::KeyMismatch {
                    key: key.clone(),
                    link_id: item.link_id.clone(),
                });
            }
            let mut coding_ids = HashSet::with_capacity(item.code.len());
            for id in item.code.iter().filter_map(|c| c.id.as_deref()) {
                if !coding_ids.insert(id) {
                    return Err(InvariantViolation::DuplicateCodingId {
                        link_id: item.link_id.clone(),
                        id: id.to_string(),
                    });
                }
            }
        }
        for owner in self.children.keys() {
            if !self.items.contains_key(owner) {
                return Err(InvariantViolation::OrphanChildList(owner.clone()));
            }
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(self.items.len());
        let mut stack: Vec<&str> = self.root.iter().rev().map(String::as_str).collect();
        while let Some(id) = stack.pop() {
            if !self.items.contains_key(id) {
                return Err(InvariantViolation::DanglingReference(id.to_string()));
            }
            if !seen.insert(id) {
                return Err(InvariantViolation::MultipleParents(id.to_string()));
            }
            stack.extend(self.children(id).iter().rev().map(String::as_str));
        }

        if let Some(unreached) = self.items.keys().find(|id| !seen.contains(id.as_str())) {
            return Err(InvariantViolation::Unreachable(unreached.clone()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutation, crate-internal. Callers re-check invariants before commit.
    // ------------------------------------------------------------------

    pub(crate) fn item_mut(&mut self, link_id: &str) -> Option<&mut Item> {
        self.items.get_mut(link_id)
    }

    /// Insert `item` into `parent` at `index` (clamped)
    pub(crate) fn insert(&mut self, parent: &Parent, index: usize, item: Item) {
        let link_id = item.link_id.clone();
        self.items.insert(link_id.clone(), item);
        self.attach(parent, index, link_id);
    }

    /// Put an existing item id into a child list at `index` (clamped)
    pub(crate) fn attach(&mut self, parent: &Parent, index: usize, link_id: String) {
        let list = match parent {
            Parent::Root => &mut self.root,
            Parent::Item(owner) => self.children.entry(owner.clone()).or_default(),
        };
        let index = index.min(list.len());
        list.insert(index, link_id);
    }

    /// Take `link_id` out of its child list, keeping the item and its subtree
    pub(crate) fn detach(&mut self, link_id: &str) -> Option<(Parent, usize)> {
        let (parent, index) = self.position(link_id)?;
        match &parent {
            Parent::Root => {
                self.root.remove(index);
            }
            Parent::Item(owner) => {
                if let Some(list) = self.children.get_mut(owner) {
                    list.remove(index);
                    if list.is_empty() {
                        self.children.remove(owner);
                    }
                }
            }
        }
        Some((parent, index))
    }

    /// Remove an item with all descendants; returns the removed ids
    pub(crate) fn remove_subtree(&mut self, link_id: &str) -> Vec<String> {
        if self.detach(link_id).is_none() {
            return Vec::new();
        }
        let mut removed = vec![link_id.to_string()];
        removed.extend(self.descendants(link_id).map(String::from));
        for id in &removed {
            self.items.remove(id);
            self.children.remove(id);
        }
        for translation in self.languages.values_mut() {
            for id in &removed {
                translation.remove_item(id);
            }
        }
        removed
    }

    pub(crate) fn languages_mut(&mut self) -> &mut IndexMap<String, Translation> {
        &mut self.languages
    }
}

/// Lazy pre-order iterator over link ids
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<&'a str>,
}

impl<'a> Descendants<'a> {
    fn new(tree: &'a Tree, start: &'a [String]) -> Self {
        Self {
            tree,
            stack: start.iter().rev().map(String::as_str).collect(),
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().map(String::as_str));
        Some(id)
    }
}
