//! Listener registration handles.
//!
//! Every `on_*` registration returns a [`Subscription`]. Dropping it (or
//! calling [`unsubscribe`](Subscription::unsubscribe), which reads
//! better at call sites) removes the listener — so a frame that unmounts
//! its adapter cannot leak callbacks into the registry. Tests assert the
//! count goes back to zero across frame-lifecycle simulations.

use std::sync::{Mutex, Weak};

use crate::client::Inner;

/// Which registry a subscription belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListenerKind {
    Auth,
    Frame,
}

/// A live listener registration. Removing it is not optional: dropping
/// the handle unregisters the listener.
pub struct Subscription {
    pub(crate) id: u64,
    pub(crate) kind: ListenerKind,
    /// Weak: a subscription must not keep a dead client's state alive.
    pub(crate) inner: Weak<Mutex<Inner>>,
}

impl Subscription {
    /// Removes the listener now. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.lock().expect("client mutex poisoned");
            match self.kind {
                ListenerKind::Auth => {
                    inner.auth_listeners.remove(&self.id);
                }
                ListenerKind::Frame => {
                    inner.frame_listeners.remove(&self.id);
                }
            }
        }
    }
}
