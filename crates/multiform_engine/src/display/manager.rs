//! Display manager

use serde::{Deserialize, Serialize};

use crate::config::ConfigFile;
use crate::display::{
    DisplayError, DisplayProperty, OptionsStore, Resolution, ResolutionChange, ResolutionPolicy,
    WindowChanges, WindowSettings, WindowSink,
};
use crate::foundation::observer::{ObserverHandle, ObserverSet};

/// A resolution-change callback
pub type ResolutionListener = Box<dyn FnMut(&ResolutionChange)>;

mod keys {
    pub const FULLSCREEN: &str = "display/fullscreen";
    pub const BORDERLESS: &str = "display/borderless";
    pub const VSYNC: &str = "display/vsync";
    pub const RESOLUTION: &str = "display/resolution";
    pub const MOUSE_VISIBLE: &str = "display/mouse_visible";
}

/// Host display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Start in exclusive fullscreen
    pub fullscreen: bool,
    /// Start borderless
    pub borderless: bool,
    /// Start with vsync on
    pub vsync: bool,
    /// Start with a visible mouse cursor
    pub mouse_visible: bool,
    /// Constraint on runtime resolution changes
    pub resolution_policy: ResolutionPolicy,
    /// Properties the host forbids changing at runtime
    pub fixed: Vec<DisplayProperty>,
    /// Initial window resolution
    pub resolution: Resolution,
    /// Resolution the UI was designed against, used for scale computation
    pub reference_resolution: Resolution,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fullscreen: false,
            borderless: false,
            vsync: true,
            mouse_visible: true,
            resolution_policy: ResolutionPolicy::Free,
            fixed: Vec::new(),
            resolution: Resolution::new(1280, 720),
            reference_resolution: Resolution::new(1280, 720),
        }
    }
}

impl ConfigFile for DisplayConfig {}

/// Mediator between display state, the native window layer, and the
/// options store
///
/// Setters validate against the host configuration, update state, stage a
/// change bit and persist the new value; nothing reaches the native layer
/// until [`apply_changes`](DisplayManager::apply_changes) pushes the
/// staged batch. A batch that changes the resolution triggers one
/// notification pass over the registered listeners.
pub struct DisplayManager {
    settings: WindowSettings,
    configured_resolution: Resolution,
    reference_resolution: Resolution,
    policy: ResolutionPolicy,
    fixed: WindowChanges,
    pending: WindowChanges,
    previous_resolution: Option<Resolution>,
    sink: Box<dyn WindowSink>,
    options: Box<dyn OptionsStore>,
    resolution_listeners: ObserverSet<ResolutionListener>,
}

impl DisplayManager {
    /// Create a manager and push the initial window state
    ///
    /// Persisted options override the configured defaults for every
    /// property the host did not mark fixed; a persisted resolution that
    /// violates the resolution policy is discarded with a warning.
    pub fn new(
        config: DisplayConfig,
        sink: Box<dyn WindowSink>,
        options: Box<dyn OptionsStore>,
    ) -> Self {
        let fixed = config
            .fixed
            .iter()
            .fold(WindowChanges::empty(), |mask, property| {
                mask | property.as_change()
            });

        let restore_bool = |key: &str, fallback: bool, property: DisplayProperty| {
            if fixed.contains(property.as_change()) {
                fallback
            } else {
                options.get::<bool>(key).unwrap_or(fallback)
            }
        };

        let fullscreen = restore_bool(keys::FULLSCREEN, config.fullscreen, DisplayProperty::Fullscreen);
        let borderless = restore_bool(keys::BORDERLESS, config.borderless, DisplayProperty::Borderless);
        let vsync = restore_bool(keys::VSYNC, config.vsync, DisplayProperty::VSync);
        let mouse_visible = restore_bool(
            keys::MOUSE_VISIBLE,
            config.mouse_visible,
            DisplayProperty::MouseVisibility,
        );

        let resolution = if fixed.contains(WindowChanges::RESOLUTION) {
            config.resolution
        } else {
            match options.get::<Resolution>(keys::RESOLUTION) {
                Some(persisted)
                    if persisted.is_valid()
                        && config
                            .resolution_policy
                            .validate(persisted, config.resolution)
                            .is_ok() =>
                {
                    persisted
                }
                Some(persisted) => {
                    log::warn!(
                        "discarding persisted resolution {} (violates display policy)",
                        persisted
                    );
                    config.resolution
                }
                None => config.resolution,
            }
        };

        let settings = WindowSettings {
            fullscreen,
            borderless,
            vsync,
            resolution,
            mouse_visible,
        };

        let mut sink = sink;
        sink.apply(&settings, WindowChanges::all());
        log::info!(
            "display initialized at {} (fullscreen: {}, vsync: {})",
            settings.resolution,
            settings.fullscreen,
            settings.vsync
        );

        Self {
            settings,
            configured_resolution: config.resolution,
            reference_resolution: config.reference_resolution,
            policy: config.resolution_policy,
            fixed,
            pending: WindowChanges::empty(),
            previous_resolution: None,
            sink,
            options,
            resolution_listeners: ObserverSet::new(),
        }
    }

    fn ensure_toggleable(&self, property: DisplayProperty) -> Result<(), DisplayError> {
        if self.fixed.contains(property.as_change()) {
            return Err(DisplayError::UntoggleableProperty { property });
        }
        Ok(())
    }

    /// Set exclusive fullscreen
    pub fn set_fullscreen(&mut self, on: bool) -> Result<(), DisplayError> {
        self.ensure_toggleable(DisplayProperty::Fullscreen)?;
        if self.settings.fullscreen != on {
            self.settings.fullscreen = on;
            self.pending |= WindowChanges::FULLSCREEN;
            self.options.set(keys::FULLSCREEN, &on);
        }
        Ok(())
    }

    /// Flip exclusive fullscreen
    pub fn toggle_fullscreen(&mut self) -> Result<(), DisplayError> {
        self.set_fullscreen(!self.settings.fullscreen)
    }

    /// Set borderless mode
    pub fn set_borderless(&mut self, on: bool) -> Result<(), DisplayError> {
        self.ensure_toggleable(DisplayProperty::Borderless)?;
        if self.settings.borderless != on {
            self.settings.borderless = on;
            self.pending |= WindowChanges::BORDERLESS;
            self.options.set(keys::BORDERLESS, &on);
        }
        Ok(())
    }

    /// Flip borderless mode
    pub fn toggle_borderless(&mut self) -> Result<(), DisplayError> {
        self.set_borderless(!self.settings.borderless)
    }

    /// Set vertical sync
    pub fn set_vsync(&mut self, on: bool) -> Result<(), DisplayError> {
        self.ensure_toggleable(DisplayProperty::VSync)?;
        if self.settings.vsync != on {
            self.settings.vsync = on;
            self.pending |= WindowChanges::VSYNC;
            self.options.set(keys::VSYNC, &on);
        }
        Ok(())
    }

    /// Flip vertical sync
    pub fn toggle_vsync(&mut self) -> Result<(), DisplayError> {
        self.set_vsync(!self.settings.vsync)
    }

    /// Set mouse cursor visibility
    pub fn set_mouse_visible(&mut self, on: bool) -> Result<(), DisplayError> {
        self.ensure_toggleable(DisplayProperty::MouseVisibility)?;
        if self.settings.mouse_visible != on {
            self.settings.mouse_visible = on;
            self.pending |= WindowChanges::MOUSE_VISIBILITY;
            self.options.set(keys::MOUSE_VISIBLE, &on);
        }
        Ok(())
    }

    /// Flip mouse cursor visibility
    pub fn toggle_mouse_visibility(&mut self) -> Result<(), DisplayError> {
        self.set_mouse_visible(!self.settings.mouse_visible)
    }

    /// Request a new resolution
    ///
    /// Validated against the fixed-property set and the resolution policy;
    /// the change takes effect at the next
    /// [`apply_changes`](DisplayManager::apply_changes).
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), DisplayError> {
        self.ensure_toggleable(DisplayProperty::Resolution)?;
        if !resolution.is_valid() {
            return Err(DisplayError::InvalidResolution {
                requested: resolution,
                reason: "both dimensions must be nonzero".to_string(),
            });
        }
        self.policy.validate(resolution, self.configured_resolution)?;
        if self.settings.resolution != resolution {
            if self.previous_resolution.is_none() {
                self.previous_resolution = Some(self.settings.resolution);
            }
            self.settings.resolution = resolution;
            self.pending |= WindowChanges::RESOLUTION;
            self.options.set(keys::RESOLUTION, &resolution);
        }
        Ok(())
    }

    /// Push the staged batch to the native layer
    ///
    /// Returns whether the native layer acknowledged the batch; on a
    /// rejected batch the staged changes are kept for a retry. An
    /// acknowledged batch containing a resolution change runs one
    /// notification pass, delivering the same [`ResolutionChange`] to
    /// every listener registered at pass start.
    pub fn apply_changes(&mut self) -> bool {
        if self.pending.is_empty() {
            return true;
        }
        let changed = self.pending;
        if !self.sink.apply(&self.settings, changed) {
            log::warn!("window sink rejected changes {:?}", changed);
            return false;
        }
        self.pending = WindowChanges::empty();

        if changed.contains(WindowChanges::RESOLUTION) {
            if let Some(previous) = self.previous_resolution.take() {
                let current = self.settings.resolution;
                if previous != current {
                    let change = ResolutionChange {
                        previous,
                        current,
                        scale: self.scale_for(current),
                    };
                    log::info!(
                        "resolution changed {} -> {} (scale {:.2})",
                        previous,
                        current,
                        change.scale
                    );
                    self.resolution_listeners
                        .notify(|listener| listener(&change));
                }
            }
        }
        true
    }

    fn scale_for(&self, resolution: Resolution) -> f32 {
        resolution.height as f32 / self.reference_resolution.height as f32
    }

    /// Register a resolution-change listener
    pub fn on_resolution_change(
        &self,
        listener: impl FnMut(&ResolutionChange) + 'static,
    ) -> ObserverHandle {
        self.resolution_listeners.register(Box::new(listener))
    }

    /// Remove a previously registered listener
    pub fn remove_resolution_listener(&self, handle: ObserverHandle) -> bool {
        self.resolution_listeners.remove(handle)
    }

    /// A handle to the listener set
    ///
    /// Listener bodies hold one of these to register or remove listeners
    /// from inside a notification pass.
    pub fn resolution_listeners(&self) -> ObserverSet<ResolutionListener> {
        self.resolution_listeners.clone()
    }

    /// Current resolution
    pub fn resolution(&self) -> Resolution {
        self.settings.resolution
    }

    /// Current UI scale against the reference resolution
    pub fn scale(&self) -> f32 {
        self.scale_for(self.settings.resolution)
    }

    /// Whether exclusive fullscreen is on
    pub fn fullscreen(&self) -> bool {
        self.settings.fullscreen
    }

    /// Whether the window is borderless
    pub fn borderless(&self) -> bool {
        self.settings.borderless
    }

    /// Whether vsync is on
    pub fn vsync(&self) -> bool {
        self.settings.vsync
    }

    /// Whether the mouse cursor is visible
    pub fn mouse_visible(&self) -> bool {
        self.settings.mouse_visible
    }

    /// The complete current window state
    pub fn settings(&self) -> &WindowSettings {
        &self.settings
    }

    /// Changes staged since the last acknowledged batch
    pub fn pending_changes(&self) -> WindowChanges {
        self.pending
    }

    /// Read access to the backing options store
    pub fn options(&self) -> &dyn OptionsStore {
        self.options.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MemoryOptions;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingSink {
        batches: Rc<RefCell<Vec<(WindowSettings, WindowChanges)>>>,
        reject: bool,
    }

    impl WindowSink for RecordingSink {
        fn apply(&mut self, settings: &WindowSettings, changed: WindowChanges) -> bool {
            self.batches.borrow_mut().push((*settings, changed));
            !self.reject
        }
    }

    fn manager_with(config: DisplayConfig) -> (DisplayManager, Rc<RefCell<Vec<(WindowSettings, WindowChanges)>>>) {
        let batches = Rc::new(RefCell::new(Vec::new()));
        let sink = RecordingSink {
            batches: Rc::clone(&batches),
            reject: false,
        };
        let manager = DisplayManager::new(config, Box::new(sink), Box::new(MemoryOptions::new()));
        (manager, batches)
    }

    #[test]
    fn test_initial_state_is_pushed_once() {
        let (manager, batches) = manager_with(DisplayConfig::default());

        assert_eq!(batches.borrow().len(), 1);
        assert_eq!(batches.borrow()[0].1, WindowChanges::all());
        assert_eq!(manager.resolution(), Resolution::new(1280, 720));
        assert!(manager.pending_changes().is_empty());
    }

    #[test]
    fn test_toggles_stage_until_applied() {
        let (mut manager, batches) = manager_with(DisplayConfig::default());

        manager.toggle_fullscreen().unwrap();
        manager.toggle_vsync().unwrap();
        assert_eq!(batches.borrow().len(), 1);
        assert_eq!(
            manager.pending_changes(),
            WindowChanges::FULLSCREEN | WindowChanges::VSYNC
        );

        assert!(manager.apply_changes());
        assert_eq!(batches.borrow().len(), 2);
        let (settings, changed) = batches.borrow()[1];
        assert!(settings.fullscreen);
        assert!(!settings.vsync);
        assert_eq!(changed, WindowChanges::FULLSCREEN | WindowChanges::VSYNC);
        assert!(manager.pending_changes().is_empty());
    }

    #[test]
    fn test_fixed_property_cannot_change() {
        let config = DisplayConfig {
            fixed: vec![DisplayProperty::Fullscreen],
            ..DisplayConfig::default()
        };
        let (mut manager, _) = manager_with(config);

        assert!(matches!(
            manager.set_fullscreen(true),
            Err(DisplayError::UntoggleableProperty {
                property: DisplayProperty::Fullscreen
            })
        ));
        assert!(!manager.fullscreen());
    }

    #[test]
    fn test_resolution_policy_enforced() {
        let config = DisplayConfig {
            resolution_policy: ResolutionPolicy::LandscapeOnly,
            ..DisplayConfig::default()
        };
        let (mut manager, _) = manager_with(config);

        assert!(matches!(
            manager.set_resolution(Resolution::new(720, 1280)),
            Err(DisplayError::InvalidResolution { .. })
        ));
        assert!(manager.set_resolution(Resolution::new(1920, 1080)).is_ok());
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let (mut manager, _) = manager_with(DisplayConfig::default());
        assert!(matches!(
            manager.set_resolution(Resolution::new(0, 1080)),
            Err(DisplayError::InvalidResolution { .. })
        ));
    }

    #[test]
    fn test_mouse_toggle_flips_mouse_visibility_only() {
        let (mut manager, _) = manager_with(DisplayConfig::default());
        assert!(manager.mouse_visible());
        assert!(!manager.borderless());

        manager.toggle_mouse_visibility().unwrap();

        assert!(!manager.mouse_visible());
        assert!(!manager.borderless());
        assert_eq!(
            manager.pending_changes(),
            WindowChanges::MOUSE_VISIBILITY
        );
    }

    #[test]
    fn test_listeners_observe_one_frozen_change() {
        let (mut manager, _) = manager_with(DisplayConfig::default());
        let seen: Rc<RefCell<Vec<ResolutionChange>>> = Rc::new(RefCell::new(Vec::new()));

        for _ in 0..2 {
            let seen = Rc::clone(&seen);
            manager.on_resolution_change(move |change| seen.borrow_mut().push(*change));
        }

        manager.set_resolution(Resolution::new(1920, 1080)).unwrap();
        manager.apply_changes();

        let events = seen.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], events[1]);
        assert_eq!(events[0].previous, Resolution::new(1280, 720));
        assert_eq!(events[0].current, Resolution::new(1920, 1080));
        assert!((events[0].scale - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_reverted_resolution_does_not_notify() {
        let (mut manager, _) = manager_with(DisplayConfig::default());
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        manager.on_resolution_change(move |_| *counter.borrow_mut() += 1);

        manager.set_resolution(Resolution::new(1920, 1080)).unwrap();
        manager.set_resolution(Resolution::new(1280, 720)).unwrap();
        manager.apply_changes();

        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_listener_registered_mid_pass_sees_next_change() {
        let (mut manager, _) = manager_with(DisplayConfig::default());
        let late_hits = Rc::new(RefCell::new(0));

        let listeners = manager.resolution_listeners();
        let hits = Rc::clone(&late_hits);
        let armed = Rc::new(RefCell::new(false));
        manager.on_resolution_change(move |_| {
            let mut armed = armed.borrow_mut();
            if !*armed {
                *armed = true;
                let hits = Rc::clone(&hits);
                listeners.register(Box::new(move |_| *hits.borrow_mut() += 1));
            }
        });

        manager.set_resolution(Resolution::new(1920, 1080)).unwrap();
        manager.apply_changes();
        assert_eq!(*late_hits.borrow(), 0);

        manager.set_resolution(Resolution::new(2560, 1440)).unwrap();
        manager.apply_changes();
        assert_eq!(*late_hits.borrow(), 1);
    }

    #[test]
    fn test_removed_listener_misses_next_change() {
        let (mut manager, _) = manager_with(DisplayConfig::default());
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let handle = manager.on_resolution_change(move |_| *counter.borrow_mut() += 1);

        manager.set_resolution(Resolution::new(1920, 1080)).unwrap();
        manager.apply_changes();
        assert_eq!(*hits.borrow(), 1);

        assert!(manager.remove_resolution_listener(handle));
        manager.set_resolution(Resolution::new(2560, 1440)).unwrap();
        manager.apply_changes();
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_rejected_batch_keeps_pending_changes() {
        let batches = Rc::new(RefCell::new(Vec::new()));
        let sink = RecordingSink {
            batches: Rc::clone(&batches),
            reject: true,
        };
        let mut manager = DisplayManager::new(
            DisplayConfig::default(),
            Box::new(sink),
            Box::new(MemoryOptions::new()),
        );

        manager.toggle_fullscreen().unwrap();
        assert!(!manager.apply_changes());
        assert_eq!(manager.pending_changes(), WindowChanges::FULLSCREEN);
    }

    #[test]
    fn test_persisted_options_override_config() {
        let mut options = MemoryOptions::new();
        {
            let store: &mut dyn OptionsStore = &mut options;
            store.set(keys::FULLSCREEN, &true);
            store.set(keys::RESOLUTION, &Resolution::new(1920, 1080));
        }

        let manager = DisplayManager::new(
            DisplayConfig::default(),
            Box::new(RecordingSink::default()),
            Box::new(options),
        );

        assert!(manager.fullscreen());
        assert_eq!(manager.resolution(), Resolution::new(1920, 1080));
    }

    #[test]
    fn test_persisted_resolution_discarded_when_policy_violated() {
        let mut options = MemoryOptions::new();
        {
            let store: &mut dyn OptionsStore = &mut options;
            store.set(keys::RESOLUTION, &Resolution::new(720, 1280));
        }

        let config = DisplayConfig {
            resolution_policy: ResolutionPolicy::LandscapeOnly,
            ..DisplayConfig::default()
        };
        let manager = DisplayManager::new(
            config,
            Box::new(RecordingSink::default()),
            Box::new(options),
        );

        assert_eq!(manager.resolution(), Resolution::new(1280, 720));
    }

    #[test]
    fn test_setting_persists_to_options() {
        let (mut manager, _) = manager_with(DisplayConfig::default());
        manager.set_vsync(false).unwrap();

        assert_eq!(manager.options().get::<bool>(keys::VSYNC), Some(false));
    }

    #[test]
    fn test_display_config_file_round_trip() {
        let dir = std::env::temp_dir();
        let config = DisplayConfig {
            fullscreen: true,
            resolution_policy: ResolutionPolicy::LandscapeOnly,
            fixed: vec![DisplayProperty::VSync],
            ..DisplayConfig::default()
        };

        for name in ["multiform_display.toml", "multiform_display.ron"] {
            let path = dir.join(format!("{}_{}", std::process::id(), name));
            config.save(&path).unwrap();
            let loaded = DisplayConfig::load(&path).unwrap();
            assert!(loaded.fullscreen);
            assert_eq!(loaded.resolution_policy, ResolutionPolicy::LandscapeOnly);
            assert_eq!(loaded.fixed, vec![DisplayProperty::VSync]);
            let _ = std::fs::remove_file(&path);
        }
    }
}
