//! Resolution types and constraints

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::display::DisplayError;

/// A display resolution in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Resolution {
    /// Create a resolution
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Which way the resolution is oriented
    pub fn orientation(self) -> Orientation {
        match self.width.cmp(&self.height) {
            std::cmp::Ordering::Greater => Orientation::Landscape,
            std::cmp::Ordering::Less => Orientation::Portrait,
            std::cmp::Ordering::Equal => Orientation::Square,
        }
    }

    /// Width over height; zero when the height is zero
    pub fn aspect_ratio(self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Whether both dimensions are nonzero
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Orientation of a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Wider than tall
    Landscape,
    /// Taller than wide
    Portrait,
    /// Equal dimensions
    Square,
}

/// Host constraint on runtime resolution changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Any valid resolution is accepted
    #[default]
    Free,
    /// Only landscape (or square) resolutions are accepted
    LandscapeOnly,
    /// Only portrait (or square) resolutions are accepted
    PortraitOnly,
    /// The configured resolution can never change
    Static,
}

impl ResolutionPolicy {
    /// Check `requested` against this policy
    ///
    /// `configured` is the resolution pinned by the host configuration,
    /// only consulted by [`ResolutionPolicy::Static`].
    pub fn validate(
        self,
        requested: Resolution,
        configured: Resolution,
    ) -> Result<(), DisplayError> {
        match self {
            Self::Free => Ok(()),
            Self::LandscapeOnly if requested.orientation() == Orientation::Portrait => {
                Err(DisplayError::InvalidResolution {
                    requested,
                    reason: "portrait resolution rejected by landscape-only policy".to_string(),
                })
            }
            Self::PortraitOnly if requested.orientation() == Orientation::Landscape => {
                Err(DisplayError::InvalidResolution {
                    requested,
                    reason: "landscape resolution rejected by portrait-only policy".to_string(),
                })
            }
            Self::Static if requested != configured => Err(DisplayError::InvalidResolution {
                requested,
                reason: format!("display resolution is pinned to {}", configured),
            }),
            _ => Ok(()),
        }
    }
}

/// What every listener in one notification pass observes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionChange {
    /// The resolution before the change
    pub previous: Resolution,
    /// The resolution now in effect
    pub current: Resolution,
    /// UI scale of the new resolution against the reference resolution
    pub scale: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation() {
        assert_eq!(
            Resolution::new(1920, 1080).orientation(),
            Orientation::Landscape
        );
        assert_eq!(
            Resolution::new(1080, 1920).orientation(),
            Orientation::Portrait
        );
        assert_eq!(Resolution::new(512, 512).orientation(), Orientation::Square);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(Resolution::new(1920, 1080).to_string(), "1920x1080");
    }

    #[test]
    fn test_policy_orientation_constraints() {
        let configured = Resolution::new(1280, 720);
        let portrait = Resolution::new(720, 1280);
        let square = Resolution::new(640, 640);

        assert!(ResolutionPolicy::Free.validate(portrait, configured).is_ok());
        assert!(ResolutionPolicy::LandscapeOnly
            .validate(portrait, configured)
            .is_err());
        assert!(ResolutionPolicy::LandscapeOnly
            .validate(square, configured)
            .is_ok());
        assert!(ResolutionPolicy::PortraitOnly
            .validate(configured, configured)
            .is_err());
    }

    #[test]
    fn test_static_policy_pins_configured_resolution() {
        let configured = Resolution::new(1280, 720);
        assert!(ResolutionPolicy::Static
            .validate(configured, configured)
            .is_ok());
        assert!(ResolutionPolicy::Static
            .validate(Resolution::new(1920, 1080), configured)
            .is_err());
    }
}
