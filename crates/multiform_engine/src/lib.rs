//! # Multiform Engine
//!
//! A game-engine layer for multiform lifecycle and display management.
//!
//! ## Features
//!
//! - **Multiforms**: named, independently activatable units of game logic
//!   with isolated construct/reconstruct/deconstruct lifecycles
//! - **Form registry**: a hierarchical, path-keyed registry of named and
//!   anonymous forms owned by each multiform
//! - **Display management**: resolution, fullscreen, border, vsync and
//!   mouse-visibility state mediated against an opaque native window layer
//! - **Resolution broadcast**: mutation-safe listener sets notified on
//!   every resolution change
//!
//! ## Quick Start
//!
//! ```rust
//! use multiform_engine::prelude::*;
//!
//! struct Menu {
//!     core: MultiformCore,
//! }
//!
//! impl Menu {
//!     fn new() -> Self {
//!         Self {
//!             core: MultiformCore::of::<Self>(None, MultiformDescriptor::new().with_name("menu")),
//!         }
//!     }
//! }
//!
//! impl Multiform for Menu {
//!     fn core(&self) -> &MultiformCore {
//!         &self.core
//!     }
//!
//!     fn core_mut(&mut self) -> &mut MultiformCore {
//!         &mut self.core
//!     }
//!
//!     fn construct(&mut self, _args: &MultiformArgs) {
//!         self.core.add_form(Form::named("title", Box::new(()))).unwrap();
//!         self.core.set_renderer(|| { /* draw the menu */ });
//!     }
//! }
//!
//! fn main() -> Result<(), ManagerError> {
//!     let mut manager = MultiformManager::new();
//!     manager.register(Box::new(Menu::new()))?;
//!     manager.switch_to("menu", &MultiformArgs::new())?;
//!     manager.render()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod display;
pub mod forms;
pub mod foundation;
pub mod registry;

/// Common imports for engine users
pub mod prelude {
    pub use crate::config::{ConfigError, ConfigFile};
    pub use crate::display::{
        DisplayConfig, DisplayError, DisplayManager, DisplayProperty, FileOptions, MemoryOptions,
        OptionsStore, Orientation, Resolution, ResolutionChange, ResolutionListener,
        ResolutionPolicy, WindowChanges, WindowSettings, WindowSink,
    };
    pub use crate::forms::{
        ArgValue, Form, FormBehavior, FormGroup, FormId, ManagerError, Multiform, MultiformArgs,
        MultiformCore, MultiformDescriptor, MultiformError, MultiformManager,
    };
    pub use crate::foundation::observer::{ObserverHandle, ObserverSet};
    pub use crate::foundation::time::Timer;
    pub use crate::registry::{DuplicatePolicy, RegistryError, UriTree};
}
