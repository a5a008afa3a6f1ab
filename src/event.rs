//! Explicit listener registration for lines and documents.
//!
//! Listeners are owned by whoever registered them: they stay registered until
//! removed with the [`ListenerId`] handed out on registration.

use core::fmt::{Debug, Formatter};

/// Handle returned on registration, used to deregister a listener again.
#[derive(Debug, Eq, PartialEq, Clone, Copy, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Boxed callback for events of type `E`.
type Callback<E> = Box<dyn FnMut(&E) + Send>;

/// Ordered list of callbacks, notified in registration order.
pub(crate) struct Listeners<E> {
    /// Id handed out to the next registration.
    next_id: u64,
    /// Registered callbacks.
    entries: Vec<(ListenerId, Callback<E>)>,
}

impl<E> Listeners<E> {
    /// Empty list.
    pub(crate) const fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Register a callback, it stays until removed with the returned id.
    pub(crate) fn add(&mut self, callback: impl FnMut(&E) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Returns false if the id was not registered (anymore).
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Call every callback with `event`.
    pub(crate) fn fire(&mut self, event: &E) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
    }

    /// Number of registered callbacks.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Debug for Listeners<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("Listeners({})", self.entries.len()))
    }
}
