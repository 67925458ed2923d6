//! Multiform lifecycle core
//!
//! The activation protocol: a manager calls
//! [`internal_construct`](Multiform::internal_construct) every time it
//! switches to an instance. The first activation always runs
//! [`construct`](Multiform::construct); later activations run
//! [`reconstruct`](Multiform::reconstruct) when the multiform declared
//! itself reconstructable, and a full `construct` otherwise. The activation
//! counter only ever grows.

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

use crate::forms::manager::ManagerLink;
use crate::forms::{Form, FormGroup, FormId};
use crate::registry::RegistryError;

/// Multiform errors
#[derive(Error, Debug)]
pub enum MultiformError {
    /// `render` was called before any renderer was installed
    #[error("no renderer installed; install one with set_renderer during construction")]
    UnsetRenderer,

    /// The operation needs a manager registration that never happened
    #[error("multiform '{name}' is not registered with a manager")]
    NotRegistered {
        /// Name of the unregistered multiform
        name: String,
    },

    /// A second manager registration was attempted
    #[error("multiform '{name}' is already registered with a manager")]
    AlreadyRegistered {
        /// Name of the multiform
        name: String,
    },

    /// A form registry operation failed
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Construction-time traits of a concrete multiform
///
/// The explicit replacement for runtime type introspection: a concrete
/// multiform declares its name and reconstruction eligibility here, and
/// [`MultiformCore::of`] resolves both once, caching them as immutable
/// state.
#[derive(Debug, Clone, Default)]
pub struct MultiformDescriptor {
    name: Option<String>,
    reconstructable: bool,
}

impl MultiformDescriptor {
    /// An unnamed, non-reconstructable descriptor
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the declared name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark later activations as eligible for the lighter re-entry routine
    #[must_use]
    pub fn reconstructable(mut self) -> Self {
        self.reconstructable = true;
        self
    }
}

/// One opaque construction argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Boolean flag
    Bool(bool),
    /// Integer parameter
    Int(i64),
    /// Floating-point parameter
    Float(f64),
    /// String parameter
    Str(String),
}

/// Opaque key/value construction parameters passed through the manager
#[derive(Debug, Clone, Default)]
pub struct MultiformArgs {
    args: HashMap<String, ArgValue>,
}

impl MultiformArgs {
    /// Create an empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument (builder pattern)
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: ArgValue) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    /// Get an argument by key
    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.args.get(key)
    }

    /// Get a boolean argument if present
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(ArgValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    /// Get an integer argument if present
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(ArgValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// Get a float argument if present
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(ArgValue::Float(value)) => Some(*value),
            _ => None,
        }
    }

    /// Get a string argument if present
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(ArgValue::Str(value)) => Some(value.as_str()),
            _ => None,
        }
    }
}

fn short_type_name<M>() -> String {
    let full = std::any::type_name::<M>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}

/// Shared state of every multiform
///
/// Concrete multiforms embed one core and expose it through
/// [`Multiform::core`]/[`Multiform::core_mut`]. The core owns the form
/// registry exclusively; it is created fresh with the core and never
/// replaced.
pub struct MultiformCore {
    name: String,
    times_activated: u32,
    reconstructable: bool,
    forms: FormGroup,
    renderer: Option<Box<dyn FnMut()>>,
    manager: Option<ManagerLink>,
}

impl MultiformCore {
    /// Create the core for concrete multiform type `M`
    ///
    /// The name resolves in priority order: the explicit argument, then the
    /// descriptor's declared name, then the short type name of `M`.
    pub fn of<M>(explicit_name: Option<&str>, descriptor: MultiformDescriptor) -> Self {
        let MultiformDescriptor {
            name: declared_name,
            reconstructable,
        } = descriptor;
        let name = explicit_name
            .map(str::to_owned)
            .or(declared_name)
            .unwrap_or_else(short_type_name::<M>);
        Self {
            name,
            times_activated: 0,
            reconstructable,
            forms: FormGroup::new(),
            renderer: None,
            manager: None,
        }
    }

    /// The multiform's resolved name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many times this instance has been activated
    pub fn times_activated(&self) -> u32 {
        self.times_activated
    }

    /// Whether later activations run the lighter re-entry routine
    pub fn reconstructable(&self) -> bool {
        self.reconstructable
    }

    /// Whether a manager has registered this instance
    pub fn registered(&self) -> bool {
        self.manager.is_some()
    }

    pub(crate) fn note_activation(&mut self) {
        self.times_activated += 1;
    }

    /// Record the owning manager; callable exactly once
    pub fn post_register(&mut self, link: ManagerLink) -> Result<(), MultiformError> {
        if self.manager.is_some() {
            return Err(MultiformError::AlreadyRegistered {
                name: self.name.clone(),
            });
        }
        self.manager = Some(link);
        Ok(())
    }

    /// Ask the owning manager to deactivate this instance
    ///
    /// The manager performs the actual deconstruction at its next update;
    /// nothing happens synchronously here.
    pub fn deactivate(&self) -> Result<(), MultiformError> {
        let link = self
            .manager
            .as_ref()
            .ok_or_else(|| MultiformError::NotRegistered {
                name: self.name.clone(),
            })?;
        link.request_deactivation(&self.name);
        Ok(())
    }

    /// Install the render callable
    ///
    /// Construction-time configuration: concrete multiforms call this from
    /// `construct`, not external code at runtime.
    pub fn set_renderer(&mut self, renderer: impl FnMut() + 'static) {
        self.renderer = Some(Box::new(renderer));
    }

    /// Invoke the installed renderer
    pub fn render(&mut self) -> Result<(), MultiformError> {
        match self.renderer.as_mut() {
            Some(renderer) => {
                renderer();
                Ok(())
            }
            None => Err(MultiformError::UnsetRenderer),
        }
    }

    /// Read access to the owned form registry
    pub fn forms(&self) -> &FormGroup {
        &self.forms
    }

    /// Add a form, taking ownership of it
    ///
    /// The form's parent back-reference is set to this multiform. A named
    /// form is registered under its name (which may be a path); a nameless
    /// form joins the root anonymous pool.
    pub fn add_form(&mut self, mut form: Form) -> Result<(), MultiformError> {
        form.set_parent(Some(&self.name));
        match form.name().map(str::to_owned) {
            Some(name) => self.forms.insert_item(&name, form)?,
            None => self.forms.add_anonymous_item(form),
        }
        Ok(())
    }

    /// Add several forms; stops at the first failure
    pub fn add_forms(
        &mut self,
        forms: impl IntoIterator<Item = Form>,
    ) -> Result<(), MultiformError> {
        for form in forms {
            self.add_form(form)?;
        }
        Ok(())
    }

    /// Add a form to the root anonymous pool
    pub fn add_anonymous_form(&mut self, mut form: Form) {
        form.set_parent(Some(&self.name));
        self.forms.add_anonymous_item(form);
    }

    /// Add a form to the anonymous pool of `group`, creating the group
    /// path as needed
    pub fn add_anonymous_form_in(&mut self, group: &str, mut form: Form) {
        form.set_parent(Some(&self.name));
        self.forms.insert_anonymous_item(group, form);
    }

    /// Add several forms to the root anonymous pool
    pub fn add_anonymous_forms(&mut self, forms: impl IntoIterator<Item = Form>) {
        for form in forms {
            self.add_anonymous_form(form);
        }
    }

    /// Look up a named form
    pub fn form(&self, path: &str) -> Result<&Form, MultiformError> {
        Ok(self.forms.get_item(path)?)
    }

    /// Look up a named form mutably
    pub fn form_mut(&mut self, path: &str) -> Result<&mut Form, MultiformError> {
        Ok(self.forms.get_item_mut(path)?)
    }

    /// The anonymous forms of `group` in insertion order
    ///
    /// An empty group path addresses the root pool.
    pub fn anonymous_forms(&self, group: &str) -> Result<&[Form], MultiformError> {
        Ok(self.forms.find_subnode(group)?.anonymous_items())
    }

    /// Remove a named form, transferring ownership back to the caller
    pub fn remove_form(&mut self, path: &str) -> Result<Form, MultiformError> {
        let mut form = self.forms.remove_item(path)?;
        form.set_parent(None);
        Ok(form)
    }

    /// Remove an anonymous form by id, searching descendants when
    /// `recursive`
    pub fn remove_anonymous_form(
        &mut self,
        id: FormId,
        recursive: bool,
    ) -> Result<Form, MultiformError> {
        let mut form = self
            .forms
            .remove_anonymous_item_where(&mut |form| form.id() == id, recursive)
            .ok_or(RegistryError::ItemNotFound {
                path: id.to_string(),
            })?;
        form.set_parent(None);
        Ok(form)
    }

    /// Remove an anonymous form by id from `group` only
    pub fn remove_anonymous_form_in(
        &mut self,
        group: &str,
        id: FormId,
    ) -> Result<Form, MultiformError> {
        let node = self.forms.find_subnode_mut(group)?;
        let mut form = node
            .remove_anonymous_item_where(&mut |form| form.id() == id, false)
            .ok_or(RegistryError::ItemNotFound {
                path: id.to_string(),
            })?;
        form.set_parent(None);
        Ok(form)
    }

    /// Drop every form, named and anonymous
    pub fn clear_forms(&mut self, recursive: bool) {
        self.forms.clear_items(recursive);
    }

    /// Drop only named forms
    pub fn clear_named_forms(&mut self, recursive: bool) {
        self.forms.clear_named_items(recursive);
    }

    /// Drop named forms whose key matches `pattern`
    pub fn clear_named_forms_matching(&mut self, pattern: &Regex, recursive: bool) {
        self.forms.clear_named_items_matching(pattern, recursive);
    }

    /// Drop only anonymous forms
    pub fn clear_anonymous_forms(&mut self, recursive: bool) {
        self.forms.clear_anonymous_items(recursive);
    }

    /// Advance every owned form by `delta_time` seconds
    pub fn update_forms(&mut self, delta_time: f32) {
        self.forms
            .for_each_item_mut(&mut |form| form.update(delta_time), true);
    }
}

/// A named, independently activatable unit of game logic
///
/// Implementors embed a [`MultiformCore`] and override the lifecycle hooks
/// they care about. Only `construct` is required; `reconstruct` falls back
/// to a full `construct` and `deconstruct`/`update` default to no-ops.
pub trait Multiform {
    /// The embedded core
    fn core(&self) -> &MultiformCore;

    /// The embedded core, mutably
    fn core_mut(&mut self) -> &mut MultiformCore;

    /// Build this multiform's state from scratch
    fn construct(&mut self, args: &MultiformArgs);

    /// Lighter re-entry routine for repeat activations
    fn reconstruct(&mut self, args: &MultiformArgs) {
        self.construct(args);
    }

    /// Tear down before deactivation
    fn deconstruct(&mut self) {}

    /// Per-frame logic hook
    fn update(&mut self, _delta_time: f32) {}

    /// Activation entry point, called by the manager on every switch to
    /// this instance
    ///
    /// Increments the activation counter, then dispatches to `reconstruct`
    /// when the instance is reconstructable and this is at least its second
    /// activation, and to `construct` otherwise.
    fn internal_construct(&mut self, args: &MultiformArgs) {
        let repeat_activation = self.core().times_activated() > 0;
        self.core_mut().note_activation();
        if repeat_activation && self.core().reconstructable() {
            log::info!(
                "reconstructing multiform '{}' (activation #{})",
                self.core().name(),
                self.core().times_activated()
            );
            self.reconstruct(args);
        } else {
            log::info!(
                "constructing multiform '{}' (activation #{})",
                self.core().name(),
                self.core().times_activated()
            );
            self.construct(args);
        }
    }

    /// Invoke the currently installed renderer
    fn render(&mut self) -> Result<(), MultiformError> {
        self.core_mut().render()
    }

    /// The multiform's resolved name
    fn name(&self) -> &str {
        self.core().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Probe {
        core: MultiformCore,
        constructed: Rc<Cell<u32>>,
        reconstructed: Rc<Cell<u32>>,
    }

    impl Probe {
        fn new(reconstructable: bool) -> Self {
            let descriptor = if reconstructable {
                MultiformDescriptor::new().with_name("probe").reconstructable()
            } else {
                MultiformDescriptor::new().with_name("probe")
            };
            Self {
                core: MultiformCore::of::<Self>(None, descriptor),
                constructed: Rc::new(Cell::new(0)),
                reconstructed: Rc::new(Cell::new(0)),
            }
        }
    }

    impl Multiform for Probe {
        fn core(&self) -> &MultiformCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut MultiformCore {
            &mut self.core
        }

        fn construct(&mut self, _args: &MultiformArgs) {
            self.constructed.set(self.constructed.get() + 1);
        }

        fn reconstruct(&mut self, _args: &MultiformArgs) {
            self.reconstructed.set(self.reconstructed.get() + 1);
        }
    }

    #[test]
    fn test_name_resolution_priority() {
        let explicit = MultiformCore::of::<Probe>(
            Some("explicit"),
            MultiformDescriptor::new().with_name("declared"),
        );
        assert_eq!(explicit.name(), "explicit");

        let declared =
            MultiformCore::of::<Probe>(None, MultiformDescriptor::new().with_name("declared"));
        assert_eq!(declared.name(), "declared");

        let fallback = MultiformCore::of::<Probe>(None, MultiformDescriptor::new());
        assert_eq!(fallback.name(), "Probe");
    }

    #[test]
    fn test_first_activation_constructs() {
        let mut probe = Probe::new(true);
        let args = MultiformArgs::new();

        assert_eq!(probe.core().times_activated(), 0);
        probe.internal_construct(&args);
        assert_eq!(probe.core().times_activated(), 1);
        assert_eq!(probe.constructed.get(), 1);
        assert_eq!(probe.reconstructed.get(), 0);
    }

    #[test]
    fn test_second_activation_reconstructs_when_eligible() {
        let mut probe = Probe::new(true);
        let args = MultiformArgs::new();

        probe.internal_construct(&args);
        probe.internal_construct(&args);

        assert_eq!(probe.core().times_activated(), 2);
        assert_eq!(probe.constructed.get(), 1);
        assert_eq!(probe.reconstructed.get(), 1);
    }

    #[test]
    fn test_second_activation_constructs_when_not_eligible() {
        let mut probe = Probe::new(false);
        let args = MultiformArgs::new();

        probe.internal_construct(&args);
        probe.internal_construct(&args);

        assert_eq!(probe.core().times_activated(), 2);
        assert_eq!(probe.constructed.get(), 2);
        assert_eq!(probe.reconstructed.get(), 0);
    }

    #[test]
    fn test_render_without_renderer_fails() {
        let mut probe = Probe::new(false);
        assert!(matches!(
            probe.render(),
            Err(MultiformError::UnsetRenderer)
        ));
    }

    #[test]
    fn test_render_invokes_installed_renderer() {
        let mut probe = Probe::new(false);
        let frames = Rc::new(Cell::new(0));
        let counter = Rc::clone(&frames);
        probe
            .core_mut()
            .set_renderer(move || counter.set(counter.get() + 1));

        probe.render().unwrap();
        probe.render().unwrap();
        assert_eq!(frames.get(), 2);
    }

    #[test]
    fn test_add_form_sets_parent() {
        let mut probe = Probe::new(false);
        probe
            .core_mut()
            .add_form(Form::named("hud/health", Box::new(())))
            .unwrap();

        let form = probe.core().form("hud/health").unwrap();
        assert_eq!(form.parent(), Some("probe"));
    }

    #[test]
    fn test_remove_form_then_get_fails() {
        let mut probe = Probe::new(false);
        probe
            .core_mut()
            .add_form(Form::named("cursor", Box::new(())))
            .unwrap();

        let removed = probe.core_mut().remove_form("cursor").unwrap();
        assert_eq!(removed.parent(), None);
        assert!(matches!(
            probe.core().form("cursor"),
            Err(MultiformError::Registry(RegistryError::ItemNotFound { .. }))
        ));
    }

    #[test]
    fn test_duplicate_form_name_rejected() {
        let mut probe = Probe::new(false);
        probe
            .core_mut()
            .add_form(Form::named("cursor", Box::new(())))
            .unwrap();

        assert!(matches!(
            probe.core_mut().add_form(Form::named("cursor", Box::new(()))),
            Err(MultiformError::Registry(RegistryError::DuplicateItem { .. }))
        ));
    }

    #[test]
    fn test_nameless_form_joins_anonymous_pool() {
        let mut probe = Probe::new(false);
        probe
            .core_mut()
            .add_form(Form::anonymous(Box::new(())))
            .unwrap();

        let pool = probe.core().anonymous_forms("").unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].parent(), Some("probe"));
    }

    #[test]
    fn test_anonymous_group_membership() {
        let mut probe = Probe::new(false);
        let a = Form::anonymous(Box::new(()));
        let b = Form::anonymous(Box::new(()));
        let a_id = a.id();
        probe.core_mut().add_anonymous_form_in("particles", a);
        probe.core_mut().add_anonymous_form_in("particles", b);

        assert_eq!(probe.core().anonymous_forms("particles").unwrap().len(), 2);

        let removed = probe
            .core_mut()
            .remove_anonymous_form_in("particles", a_id)
            .unwrap();
        assert_eq!(removed.id(), a_id);
        assert_eq!(probe.core().anonymous_forms("particles").unwrap().len(), 1);
    }

    #[test]
    fn test_recursive_anonymous_removal() {
        let mut probe = Probe::new(false);
        let form = Form::anonymous(Box::new(()));
        let id = form.id();
        probe.core_mut().add_anonymous_form_in("fx/sparks", form);

        assert!(probe.core_mut().remove_anonymous_form(id, false).is_err());
        assert!(probe.core_mut().remove_anonymous_form(id, true).is_ok());
    }

    #[test]
    fn test_deactivate_unregistered_fails() {
        let probe = Probe::new(false);
        assert!(matches!(
            probe.core().deactivate(),
            Err(MultiformError::NotRegistered { .. })
        ));
    }
}
