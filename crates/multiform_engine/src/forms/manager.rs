//! Multiform registration and activation switching

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use thiserror::Error;

use crate::forms::{Multiform, MultiformArgs, MultiformError};

/// Manager errors
#[derive(Error, Debug)]
pub enum ManagerError {
    /// The named multiform was never registered
    #[error("no multiform named '{name}' is registered")]
    UnknownMultiform {
        /// The unresolved name
        name: String,
    },

    /// A multiform with this name is already registered
    #[error("a multiform named '{name}' is already registered")]
    DuplicateMultiform {
        /// The colliding name
        name: String,
    },

    /// An error surfaced by the multiform itself
    #[error(transparent)]
    Multiform(#[from] MultiformError),
}

pub(crate) enum ManagerRequest {
    Deactivate { multiform: String },
}

/// A multiform's handle back to its owning manager
///
/// Registration hands every multiform a clone of this link. Requests pushed
/// through it are queued and drained by the manager at its next update, so
/// a multiform can ask for its own deactivation from inside `update`
/// without the manager being mid-borrow.
#[derive(Clone)]
pub struct ManagerLink {
    requests: Rc<RefCell<VecDeque<ManagerRequest>>>,
}

impl ManagerLink {
    fn new() -> Self {
        Self {
            requests: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub(crate) fn request_deactivation(&self, multiform: &str) {
        log::debug!("deactivation requested for multiform '{}'", multiform);
        self.requests.borrow_mut().push_back(ManagerRequest::Deactivate {
            multiform: multiform.to_string(),
        });
    }

    fn take_requests(&self) -> Vec<ManagerRequest> {
        self.requests.borrow_mut().drain(..).collect()
    }
}

/// Owner and driver of registered multiforms
///
/// At most one multiform is active at a time. Switching deconstructs the
/// previously active instance, then runs the activation protocol on the
/// target. Deactivation requests raised during an update are honored after
/// the update completes.
pub struct MultiformManager {
    multiforms: HashMap<String, Box<dyn Multiform>>,
    active: Option<String>,
    link: ManagerLink,
}

impl Default for MultiformManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiformManager {
    /// Create a manager with no registered multiforms
    pub fn new() -> Self {
        Self {
            multiforms: HashMap::new(),
            active: None,
            link: ManagerLink::new(),
        }
    }

    /// Register a multiform under its resolved name
    pub fn register(&mut self, mut multiform: Box<dyn Multiform>) -> Result<(), ManagerError> {
        let name = multiform.core().name().to_string();
        if self.multiforms.contains_key(&name) {
            return Err(ManagerError::DuplicateMultiform { name });
        }
        multiform.core_mut().post_register(self.link.clone())?;
        log::info!("registered multiform '{}'", name);
        self.multiforms.insert(name, multiform);
        Ok(())
    }

    /// Deconstruct the active multiform (if any) and activate `name`
    pub fn switch_to(&mut self, name: &str, args: &MultiformArgs) -> Result<(), ManagerError> {
        if !self.multiforms.contains_key(name) {
            return Err(ManagerError::UnknownMultiform {
                name: name.to_string(),
            });
        }
        if let Some(previous) = self.active.take() {
            if let Some(multiform) = self.multiforms.get_mut(&previous) {
                log::info!("deconstructing multiform '{}'", previous);
                multiform.deconstruct();
            }
        }
        if let Some(target) = self.multiforms.get_mut(name) {
            target.internal_construct(args);
            self.active = Some(name.to_string());
        }
        Ok(())
    }

    /// Advance the active multiform, then honor staged deactivations
    pub fn update(&mut self, delta_time: f32) {
        if let Some(name) = self.active.clone() {
            if let Some(multiform) = self.multiforms.get_mut(&name) {
                multiform.update(delta_time);
                multiform.core_mut().update_forms(delta_time);
            }
        }
        self.process_requests();
    }

    fn process_requests(&mut self) {
        for request in self.link.take_requests() {
            match request {
                ManagerRequest::Deactivate { multiform } => {
                    if self.active.as_deref() == Some(multiform.as_str()) {
                        self.active = None;
                    }
                    if let Some(instance) = self.multiforms.get_mut(&multiform) {
                        log::info!("deactivating multiform '{}'", multiform);
                        instance.deconstruct();
                    }
                }
            }
        }
    }

    /// Render the active multiform; a frame with nothing active is a no-op
    pub fn render(&mut self) -> Result<(), ManagerError> {
        if let Some(name) = self.active.as_ref() {
            if let Some(multiform) = self.multiforms.get_mut(name) {
                multiform.render()?;
            }
        }
        Ok(())
    }

    /// Name of the currently active multiform
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Whether a multiform with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.multiforms.contains_key(name)
    }

    /// Number of registered multiforms
    pub fn len(&self) -> usize {
        self.multiforms.len()
    }

    /// Whether no multiforms are registered
    pub fn is_empty(&self) -> bool {
        self.multiforms.is_empty()
    }

    /// Look up a registered multiform
    pub fn get(&self, name: &str) -> Option<&dyn Multiform> {
        self.multiforms.get(name).map(|boxed| boxed.as_ref())
    }

    /// Look up a registered multiform mutably
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Multiform + 'static)> {
        self.multiforms.get_mut(name).map(|boxed| boxed.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{MultiformCore, MultiformDescriptor};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Trace {
        events: RefCell<Vec<String>>,
    }

    impl Trace {
        fn push(&self, event: impl Into<String>) {
            self.events.borrow_mut().push(event.into());
        }

        fn events(&self) -> Vec<String> {
            self.events.borrow().clone()
        }
    }

    struct Traced {
        core: MultiformCore,
        trace: Rc<Trace>,
    }

    impl Traced {
        fn boxed(name: &str, reconstructable: bool, trace: Rc<Trace>) -> Box<dyn Multiform> {
            let mut descriptor = MultiformDescriptor::new().with_name(name);
            if reconstructable {
                descriptor = descriptor.reconstructable();
            }
            Box::new(Self {
                core: MultiformCore::of::<Self>(None, descriptor),
                trace,
            })
        }
    }

    impl Multiform for Traced {
        fn core(&self) -> &MultiformCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut MultiformCore {
            &mut self.core
        }

        fn construct(&mut self, _args: &MultiformArgs) {
            self.trace.push(format!("{}:construct", self.core.name()));
        }

        fn reconstruct(&mut self, _args: &MultiformArgs) {
            self.trace.push(format!("{}:reconstruct", self.core.name()));
        }

        fn deconstruct(&mut self) {
            self.trace.push(format!("{}:deconstruct", self.core.name()));
        }

        fn update(&mut self, _delta_time: f32) {
            self.trace.push(format!("{}:update", self.core.name()));
        }
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let trace = Rc::new(Trace::default());
        let mut manager = MultiformManager::new();
        manager
            .register(Traced::boxed("menu", false, Rc::clone(&trace)))
            .unwrap();

        assert!(matches!(
            manager.register(Traced::boxed("menu", false, trace)),
            Err(ManagerError::DuplicateMultiform { .. })
        ));
    }

    #[test]
    fn test_switch_to_unknown_fails() {
        let mut manager = MultiformManager::new();
        assert!(matches!(
            manager.switch_to("ghost", &MultiformArgs::new()),
            Err(ManagerError::UnknownMultiform { .. })
        ));
    }

    #[test]
    fn test_switch_lifecycle_and_reconstruction() {
        let trace = Rc::new(Trace::default());
        let mut manager = MultiformManager::new();
        manager
            .register(Traced::boxed("menu", false, Rc::clone(&trace)))
            .unwrap();
        manager
            .register(Traced::boxed("game", true, Rc::clone(&trace)))
            .unwrap();
        let args = MultiformArgs::new();

        manager.switch_to("menu", &args).unwrap();
        manager.switch_to("game", &args).unwrap();
        manager.switch_to("menu", &args).unwrap();
        manager.switch_to("game", &args).unwrap();

        assert_eq!(
            trace.events(),
            vec![
                "menu:construct",
                "menu:deconstruct",
                "game:construct",
                "game:deconstruct",
                "menu:construct",
                "menu:deconstruct",
                "game:reconstruct",
            ]
        );
        assert_eq!(manager.active(), Some("game"));
    }

    #[test]
    fn test_self_deactivation_is_deferred_to_update_end() {
        let trace = Rc::new(Trace::default());
        let mut manager = MultiformManager::new();
        manager
            .register(Traced::boxed("menu", false, Rc::clone(&trace)))
            .unwrap();
        manager.switch_to("menu", &MultiformArgs::new()).unwrap();

        manager.get("menu").unwrap().core().deactivate().unwrap();
        assert_eq!(manager.active(), Some("menu"));

        manager.update(0.016);

        assert_eq!(manager.active(), None);
        assert_eq!(
            trace.events(),
            vec!["menu:construct", "menu:update", "menu:deconstruct"]
        );
    }

    #[test]
    fn test_render_with_no_active_is_noop() {
        let mut manager = MultiformManager::new();
        assert!(manager.render().is_ok());
    }
}
