//! Form leaf entities

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_FORM_ID: AtomicU64 = AtomicU64::new(0);

/// Stable identity of a form
///
/// Assigned once at creation and never reused within a process. Anonymous
/// forms are removable only through their id, so callers that intend to
/// remove one later should keep the id from [`Form::id`] before handing the
/// form over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormId(u64);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "form#{}", self.0)
    }
}

/// Game-logic payload hook of a form
///
/// The unit type implements this with no behavior, which is convenient for
/// forms that are pure registry entries.
pub trait FormBehavior {
    /// Advance the form's own logic by `delta_time` seconds
    fn update(&mut self, _delta_time: f32) {}
}

impl FormBehavior for () {}

/// A named or anonymous leaf item owned by exactly one multiform at a time
pub struct Form {
    id: FormId,
    name: Option<String>,
    parent: Option<String>,
    behavior: Box<dyn FormBehavior>,
}

impl Form {
    /// Create a form addressable by name (the name may be a registry path
    /// such as `"hud/health"`)
    pub fn named(name: impl Into<String>, behavior: Box<dyn FormBehavior>) -> Self {
        Self {
            id: FormId(NEXT_FORM_ID.fetch_add(1, Ordering::Relaxed)),
            name: Some(name.into()),
            parent: None,
            behavior,
        }
    }

    /// Create a form retrievable only through group membership
    pub fn anonymous(behavior: Box<dyn FormBehavior>) -> Self {
        Self {
            id: FormId(NEXT_FORM_ID.fetch_add(1, Ordering::Relaxed)),
            name: None,
            parent: None,
            behavior,
        }
    }

    /// This form's process-unique id
    pub fn id(&self) -> FormId {
        self.id
    }

    /// The form's name, if it has one
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether this form has no lookup key
    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    /// Name of the multiform currently owning this form
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub(crate) fn set_parent(&mut self, owner: Option<&str>) {
        self.parent = owner.map(str::to_owned);
    }

    /// Advance the form's behavior by `delta_time` seconds
    pub fn update(&mut self, delta_time: f32) {
        self.behavior.update(delta_time);
    }

    /// The form's behavior payload
    pub fn behavior(&self) -> &dyn FormBehavior {
        self.behavior.as_ref()
    }

    /// Mutable access to the behavior payload
    pub fn behavior_mut(&mut self) -> &mut dyn FormBehavior {
        self.behavior.as_mut()
    }
}

impl PartialEq for Form {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}
