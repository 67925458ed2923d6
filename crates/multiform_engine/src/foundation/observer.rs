//! Mutation-safe observer sets
//!
//! Observers frequently register or unregister other observers from inside
//! a notification callback (a component swapping its sub-components in
//! response to the very event it was notified about). Iterating the live
//! set while that happens corrupts the pass, so [`ObserverSet`] freezes a
//! snapshot of the membership at pass start and stages every mid-pass
//! mutation, reconciling adds then removes once the pass completes.

use crate::foundation::collections::{Handle, HandleMap};
use std::cell::RefCell;
use std::rc::Rc;

/// Handle identifying one registered observer
pub type ObserverHandle = Handle;

struct Inner<T> {
    /// Primary set; a slot holds `None` while its observer is staged for a
    /// later pass or temporarily checked out during invocation.
    entries: HandleMap<Option<T>>,
    notifying: bool,
    to_add: Vec<(ObserverHandle, T)>,
    to_remove: Vec<ObserverHandle>,
}

/// A set of observers that tolerates mutation during notification
///
/// Cloning yields another handle to the same underlying set, which is how a
/// notification callback gets access to `register`/`remove` mid-pass. The
/// set is single-threaded; enumeration order within a pass is unspecified.
pub struct ObserverSet<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for ObserverSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for ObserverSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ObserverSet<T> {
    /// Create an empty observer set
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                entries: HandleMap::with_key(),
                notifying: false,
                to_add: Vec::new(),
                to_remove: Vec::new(),
            })),
        }
    }

    /// Register an observer and return its handle
    ///
    /// During a notification pass the observer is staged: its handle is
    /// reserved immediately, but it joins the set (and is first eligible
    /// for notification) only after the pass completes.
    pub fn register(&self, observer: T) -> ObserverHandle {
        let mut inner = self.inner.borrow_mut();
        if inner.notifying {
            let handle = inner.entries.insert(None);
            inner.to_add.push((handle, observer));
            log::debug!("observer registration staged until pass completes");
            handle
        } else {
            inner.entries.insert(Some(observer))
        }
    }

    /// Remove an observer by handle
    ///
    /// Returns `true` if the handle was known at the time of the call.
    /// During a notification pass the removal is staged and applied after
    /// the pass, so the observer is still invoked if the pass has not yet
    /// reached it.
    pub fn remove(&self, handle: ObserverHandle) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.entries.contains_key(handle) {
            return false;
        }
        if inner.notifying {
            inner.to_remove.push(handle);
            log::debug!("observer removal staged until pass completes");
        } else {
            inner.entries.remove(handle);
        }
        true
    }

    /// Whether the handle currently refers to a live or staged observer
    pub fn contains(&self, handle: ObserverHandle) -> bool {
        self.inner.borrow().entries.contains_key(handle)
    }

    /// Number of live and staged observers
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Whether the set holds no observers
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Invoke `visit` once for every observer present at pass start
    ///
    /// The membership is frozen when the pass begins: observers registered
    /// from inside a callback are not visited until the next pass, and
    /// observers removed from inside a callback are still visited in this
    /// one. Staged adds are applied before staged removes once the pass
    /// completes. Recursive notification of the same set is not supported.
    pub fn notify(&self, mut visit: impl FnMut(&mut T)) {
        let snapshot: Vec<ObserverHandle> = {
            let mut inner = self.inner.borrow_mut();
            debug_assert!(!inner.notifying, "recursive ObserverSet::notify");
            inner.notifying = true;
            inner.entries.keys().collect()
        };

        for handle in snapshot {
            // Check the observer out of its slot so the callback can
            // re-enter this set through a clone without a double borrow.
            let checked_out = self
                .inner
                .borrow_mut()
                .entries
                .get_mut(handle)
                .and_then(Option::take);
            if let Some(mut observer) = checked_out {
                visit(&mut observer);
                if let Some(slot) = self.inner.borrow_mut().entries.get_mut(handle) {
                    *slot = Some(observer);
                }
            }
        }

        let mut inner = self.inner.borrow_mut();
        inner.notifying = false;
        let staged_adds: Vec<(ObserverHandle, T)> = inner.to_add.drain(..).collect();
        for (handle, observer) in staged_adds {
            if let Some(slot) = inner.entries.get_mut(handle) {
                *slot = Some(observer);
            }
        }
        let staged_removes: Vec<ObserverHandle> = inner.to_remove.drain(..).collect();
        for handle in staged_removes {
            inner.entries.remove(handle);
        }
    }
}
