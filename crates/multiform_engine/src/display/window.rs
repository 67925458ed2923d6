//! Native window boundary
//!
//! The engine never talks to a windowing backend directly. It accumulates
//! a [`WindowSettings`] batch plus a [`WindowChanges`] mask of what
//! differs, and pushes both through a [`WindowSink`], which acknowledges
//! the batch. Backends (GLFW, SDL, winit, a test recorder) implement the
//! sink.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::display::Resolution;

bitflags! {
    /// Mask of window properties touched since the last applied batch
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WindowChanges: u32 {
        /// Fullscreen state changed
        const FULLSCREEN = 1 << 0;
        /// Border state changed
        const BORDERLESS = 1 << 1;
        /// Vsync state changed
        const VSYNC = 1 << 2;
        /// Resolution changed
        const RESOLUTION = 1 << 3;
        /// Mouse cursor visibility changed
        const MOUSE_VISIBILITY = 1 << 4;
    }
}

/// One toggleable display property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayProperty {
    /// Exclusive fullscreen
    Fullscreen,
    /// Borderless window
    Borderless,
    /// Vertical sync
    VSync,
    /// Window resolution
    Resolution,
    /// Mouse cursor visibility
    MouseVisibility,
}

impl DisplayProperty {
    /// The change-mask bit this property maps to
    pub fn as_change(self) -> WindowChanges {
        match self {
            Self::Fullscreen => WindowChanges::FULLSCREEN,
            Self::Borderless => WindowChanges::BORDERLESS,
            Self::VSync => WindowChanges::VSYNC,
            Self::Resolution => WindowChanges::RESOLUTION,
            Self::MouseVisibility => WindowChanges::MOUSE_VISIBILITY,
        }
    }
}

impl fmt::Display for DisplayProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fullscreen => "fullscreen",
            Self::Borderless => "borderless",
            Self::VSync => "vsync",
            Self::Resolution => "resolution",
            Self::MouseVisibility => "mouse_visibility",
        };
        f.write_str(name)
    }
}

/// Complete window state pushed to the native layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSettings {
    /// Exclusive fullscreen
    pub fullscreen: bool,
    /// Borderless window
    pub borderless: bool,
    /// Vertical sync
    pub vsync: bool,
    /// Window resolution
    pub resolution: Resolution,
    /// Mouse cursor visibility
    pub mouse_visible: bool,
}

/// The native window/graphics configuration boundary
pub trait WindowSink {
    /// Push a settings batch
    ///
    /// `changed` marks which fields differ from the last acknowledged
    /// batch (all bits set on the initial push). Returns whether the
    /// native layer applied the changes.
    fn apply(&mut self, settings: &WindowSettings, changed: WindowChanges) -> bool;
}
