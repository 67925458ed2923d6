//! Generic path-segmented hierarchical item registry

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

/// Separator between path segments
pub const PATH_SEPARATOR: char = '/';

/// Reserved name of a tree's top-level node
pub const ROOT_NAME: &str = "root";

/// Registry errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Named insert collided with an existing key
    #[error("an item named '{path}' already exists")]
    DuplicateItem {
        /// Path of the colliding item
        path: String,
    },

    /// Named item lookup or removal found nothing at the final segment
    #[error("no item found at '{path}'")]
    ItemNotFound {
        /// Path that failed to resolve to an item
        path: String,
    },

    /// An intermediate path segment does not exist
    #[error("no node found while resolving '{path}'")]
    PathNotFound {
        /// Path that failed to resolve to a node
        path: String,
    },

    /// The path carries no usable final segment
    #[error("'{path}' is not a valid item path")]
    InvalidPath {
        /// The rejected path
        path: String,
    },
}

/// What a named insert does when the key is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with [`RegistryError::DuplicateItem`]
    Reject,
    /// Silently overwrite the existing item
    Replace,
}

/// A node in a path-keyed item tree
///
/// Every node owns a map of named items (keys unique within the node), an
/// ordered pool of anonymous items, and its child nodes. Paths like
/// `"hud/overlays/minimap"` descend one child per segment; insert-like
/// operations create missing segments, read- and remove-like operations
/// fail on them. Empty segments from doubled or trailing separators are
/// skipped, so `"hud/"` and `"hud"` address the same node.
#[derive(Debug)]
pub struct UriTree<T> {
    name: String,
    named_items: HashMap<String, T>,
    anonymous_items: Vec<T>,
    children: HashMap<String, UriTree<T>>,
}

impl<T> Default for UriTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
}

/// Split an item path into its node segments and final item name
fn split_item_path(path: &str) -> Result<(Vec<&str>, &str), RegistryError> {
    let mut segs: Vec<&str> = segments(path).collect();
    match segs.pop() {
        Some(name) => Ok((segs, name)),
        None => Err(RegistryError::InvalidPath {
            path: path.to_string(),
        }),
    }
}

impl<T> UriTree<T> {
    /// Create an empty tree rooted at [`ROOT_NAME`]
    pub fn new() -> Self {
        Self::with_name(ROOT_NAME)
    }

    fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            named_items: HashMap::new(),
            anonymous_items: Vec::new(),
            children: HashMap::new(),
        }
    }

    /// This node's segment name within its parent
    pub fn name(&self) -> &str {
        &self.name
    }

    fn descend(&self, segs: &[&str], full_path: &str) -> Result<&Self, RegistryError> {
        let mut node = self;
        for seg in segs {
            node = node
                .children
                .get(*seg)
                .ok_or_else(|| RegistryError::PathNotFound {
                    path: full_path.to_string(),
                })?;
        }
        Ok(node)
    }

    fn descend_mut(&mut self, segs: &[&str], full_path: &str) -> Result<&mut Self, RegistryError> {
        let mut node = self;
        for seg in segs {
            node = node
                .children
                .get_mut(*seg)
                .ok_or_else(|| RegistryError::PathNotFound {
                    path: full_path.to_string(),
                })?;
        }
        Ok(node)
    }

    fn descend_or_create(&mut self, segs: &[&str]) -> &mut Self {
        let mut node = self;
        for seg in segs {
            node = node
                .children
                .entry((*seg).to_string())
                .or_insert_with(|| UriTree::with_name(seg));
        }
        node
    }

    /// Insert a named item, rejecting duplicates
    ///
    /// Missing path segments are created on the way down.
    pub fn insert_item(&mut self, path: &str, item: T) -> Result<(), RegistryError> {
        self.insert_item_with(path, item, DuplicatePolicy::Reject)
    }

    /// Insert a named item with an explicit duplicate policy
    pub fn insert_item_with(
        &mut self,
        path: &str,
        item: T,
        on_duplicate: DuplicatePolicy,
    ) -> Result<(), RegistryError> {
        let (parents, name) = split_item_path(path)?;
        let node = self.descend_or_create(&parents);
        if on_duplicate == DuplicatePolicy::Reject && node.named_items.contains_key(name) {
            return Err(RegistryError::DuplicateItem {
                path: path.to_string(),
            });
        }
        node.named_items.insert(name.to_string(), item);
        log::debug!("registered item at '{}'", path);
        Ok(())
    }

    /// Append an item to the anonymous pool of the node at `group_path`
    ///
    /// Missing segments are created; anonymous items carry no identity key,
    /// so there is no duplicate check. An empty path addresses this node.
    pub fn insert_anonymous_item(&mut self, group_path: &str, item: T) {
        let segs: Vec<&str> = segments(group_path).collect();
        self.descend_or_create(&segs).anonymous_items.push(item);
    }

    /// Append an item to this node's anonymous pool
    pub fn add_anonymous_item(&mut self, item: T) {
        self.anonymous_items.push(item);
    }

    /// Look up a named item
    pub fn get_item(&self, path: &str) -> Result<&T, RegistryError> {
        let (parents, name) = split_item_path(path)?;
        let node = self.descend(&parents, path)?;
        node.named_items
            .get(name)
            .ok_or_else(|| RegistryError::ItemNotFound {
                path: path.to_string(),
            })
    }

    /// Look up a named item mutably
    pub fn get_item_mut(&mut self, path: &str) -> Result<&mut T, RegistryError> {
        let (parents, name) = split_item_path(path)?;
        let node = self.descend_mut(&parents, path)?;
        node.named_items
            .get_mut(name)
            .ok_or_else(|| RegistryError::ItemNotFound {
                path: path.to_string(),
            })
    }

    /// Resolve the node at `path`, creating every missing segment
    ///
    /// Creation applies to the terminal segment as well, mirroring the
    /// insert operations: a subnode fetched for a future insert must not
    /// fail just because nothing was stored there yet. Use
    /// [`find_subnode`](Self::find_subnode) for a non-creating lookup.
    pub fn subnode(&mut self, path: &str) -> &mut UriTree<T> {
        let segs: Vec<&str> = segments(path).collect();
        self.descend_or_create(&segs)
    }

    /// Resolve the node at `path` without creating anything
    pub fn find_subnode(&self, path: &str) -> Result<&UriTree<T>, RegistryError> {
        let segs: Vec<&str> = segments(path).collect();
        self.descend(&segs, path)
    }

    /// Resolve the node at `path` mutably without creating anything
    pub fn find_subnode_mut(&mut self, path: &str) -> Result<&mut UriTree<T>, RegistryError> {
        let segs: Vec<&str> = segments(path).collect();
        self.descend_mut(&segs, path)
    }

    /// Remove and return a named item
    pub fn remove_item(&mut self, path: &str) -> Result<T, RegistryError> {
        let (parents, name) = split_item_path(path)?;
        let node = self.descend_mut(&parents, path)?;
        let removed = node
            .named_items
            .remove(name)
            .ok_or_else(|| RegistryError::ItemNotFound {
                path: path.to_string(),
            })?;
        log::debug!("removed item at '{}'", path);
        Ok(removed)
    }

    /// Remove the first anonymous item matching `predicate`
    ///
    /// Searches this node's pool first; with `recursive`, descends
    /// depth-first through children until one match is removed. At most one
    /// item is removed per call. Sibling visit order is unspecified.
    pub fn remove_anonymous_item_where(
        &mut self,
        predicate: &mut dyn FnMut(&T) -> bool,
        recursive: bool,
    ) -> Option<T> {
        if let Some(pos) = self.anonymous_items.iter().position(|item| predicate(item)) {
            return Some(self.anonymous_items.remove(pos));
        }
        if recursive {
            for child in self.children.values_mut() {
                if let Some(found) = child.remove_anonymous_item_where(predicate, true) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Remove the first anonymous item equal to `item`
    pub fn remove_anonymous_item(&mut self, item: &T, recursive: bool) -> Result<T, RegistryError>
    where
        T: PartialEq,
    {
        self.remove_anonymous_item_where(&mut |candidate| candidate == item, recursive)
            .ok_or_else(|| RegistryError::ItemNotFound {
                path: self.name.clone(),
            })
    }

    /// Remove the first anonymous item equal to `item` from the node at
    /// `group_path` only (non-recursive)
    pub fn remove_anonymous_item_in(
        &mut self,
        group_path: &str,
        item: &T,
    ) -> Result<T, RegistryError>
    where
        T: PartialEq,
    {
        let segs: Vec<&str> = segments(group_path).collect();
        let node = self.descend_mut(&segs, group_path)?;
        node.remove_anonymous_item_where(&mut |candidate| candidate == item, false)
            .ok_or_else(|| RegistryError::ItemNotFound {
                path: group_path.to_string(),
            })
    }

    /// Empty both the named map and the anonymous pool
    pub fn clear_items(&mut self, recursive: bool) {
        self.named_items.clear();
        self.anonymous_items.clear();
        if recursive {
            for child in self.children.values_mut() {
                child.clear_items(true);
            }
        }
    }

    /// Empty only the named map, leaving anonymous items untouched
    pub fn clear_named_items(&mut self, recursive: bool) {
        self.named_items.clear();
        if recursive {
            for child in self.children.values_mut() {
                child.clear_named_items(true);
            }
        }
    }

    /// Drop named items whose key matches `pattern`
    pub fn clear_named_items_matching(&mut self, pattern: &Regex, recursive: bool) {
        self.named_items.retain(|name, _| !pattern.is_match(name));
        if recursive {
            for child in self.children.values_mut() {
                child.clear_named_items_matching(pattern, true);
            }
        }
    }

    /// Empty only the anonymous pool, leaving named items untouched
    pub fn clear_anonymous_items(&mut self, recursive: bool) {
        self.anonymous_items.clear();
        if recursive {
            for child in self.children.values_mut() {
                child.clear_anonymous_items(true);
            }
        }
    }

    /// Iterate this node's named items
    pub fn named_items(&self) -> impl Iterator<Item = (&str, &T)> {
        self.named_items.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// This node's anonymous items in insertion order
    pub fn anonymous_items(&self) -> &[T] {
        &self.anonymous_items
    }

    /// Iterate this node's direct children
    pub fn children(&self) -> impl Iterator<Item = &UriTree<T>> {
        self.children.values()
    }

    /// Whether this node holds no items and no children
    pub fn is_empty(&self) -> bool {
        self.named_items.is_empty() && self.anonymous_items.is_empty() && self.children.is_empty()
    }

    /// Number of items stored at this node (named plus anonymous)
    pub fn local_item_count(&self) -> usize {
        self.named_items.len() + self.anonymous_items.len()
    }

    /// Visit every item at this node, named before anonymous
    pub fn for_each_item_mut(&mut self, visit: &mut dyn FnMut(&mut T), recursive: bool) {
        for item in self.named_items.values_mut() {
            visit(item);
        }
        for item in &mut self.anonymous_items {
            visit(item);
        }
        if recursive {
            for child in self.children.values_mut() {
                child.for_each_item_mut(visit, true);
            }
        }
    }
}
