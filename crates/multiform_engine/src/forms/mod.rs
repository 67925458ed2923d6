//! Multiform lifecycle and form management
//!
//! A multiform is a named, independently activatable unit of game logic
//! with its own construct/reconstruct/deconstruct lifecycle and render
//! hook. Each multiform exclusively owns a [`FormGroup`] holding its
//! [`Form`] items, and a [`MultiformManager`] drives activation switches
//! between registered multiforms.

mod form;
mod group;
mod manager;
mod multiform;

pub use form::{Form, FormBehavior, FormId};
pub use group::FormGroup;
pub use manager::{ManagerError, ManagerLink, MultiformManager};
pub use multiform::{
    ArgValue, Multiform, MultiformArgs, MultiformCore, MultiformDescriptor, MultiformError,
};
