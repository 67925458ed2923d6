//! Hierarchical path-keyed registries
//!
//! The registry is the storage backbone for form management: a tree of
//! nodes addressed by slash-separated paths, where every node carries both
//! a named item map and an anonymous item pool.

mod uri_tree;

pub use uri_tree::{DuplicatePolicy, RegistryError, UriTree, PATH_SEPARATOR, ROOT_NAME};
