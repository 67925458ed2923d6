//! Display and window state management
//!
//! The display manager mediates resolution, fullscreen, border, vsync and
//! mouse-visibility state against an opaque native window layer
//! ([`WindowSink`]), persists every toggle through an options store, and
//! broadcasts resolution changes to registered listeners.

mod manager;
mod options;
mod resolution;
mod window;

use thiserror::Error;

pub use manager::{DisplayConfig, DisplayManager, ResolutionListener};
pub use options::{FileOptions, MemoryOptions, OptionsStore};
pub use resolution::{Orientation, Resolution, ResolutionChange, ResolutionPolicy};
pub use window::{DisplayProperty, WindowChanges, WindowSettings, WindowSink};

/// Display errors
#[derive(Error, Debug)]
pub enum DisplayError {
    /// The host configuration marked this property as fixed
    #[error("display property {property} is fixed by the host configuration")]
    UntoggleableProperty {
        /// The property that cannot change
        property: DisplayProperty,
    },

    /// The requested resolution violates the active constraint
    #[error("resolution {requested} rejected: {reason}")]
    InvalidResolution {
        /// The rejected resolution
        requested: Resolution,
        /// Why it was rejected
        reason: String,
    },
}
