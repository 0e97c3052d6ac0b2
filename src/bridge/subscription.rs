use crate::host::{HostEnvironment, ListenerId};
use crate::types::{GlobalKey, SET_GLOBALS_EVENT_TYPE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

struct Registration {
    env: Arc<dyn HostEnvironment>,
    listener_id: ListenerId,
    key: GlobalKey,
    active: Arc<AtomicBool>,
}

impl Registration {
    fn release(&self) {
        // swap makes release idempotent, even when called from inside the
        // listener it is removing
        if self.active.swap(false, Ordering::SeqCst) {
            self.env
                .remove_event_listener(SET_GLOBALS_EVENT_TYPE, self.listener_id);
            debug!(key = %self.key, listener = %self.listener_id, "unsubscribed from host global");
        }
    }
}

/// Clonable teardown handle for a [`Subscription`].
///
/// Disposing is idempotent and safe to call from within the change callback
/// of the subscription it tears down.
#[derive(Clone)]
pub struct Disposer {
    registration: Option<Arc<Registration>>,
}

impl Disposer {
    pub fn dispose(&self) {
        if let Some(registration) = &self.registration {
            registration.release();
        }
    }

    pub fn is_active(&self) -> bool {
        self.registration
            .as_ref()
            .is_some_and(|registration| registration.active.load(Ordering::SeqCst))
    }
}

/// Guard for one listener on the host's change channel. Dropping it
/// unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    key: GlobalKey,
    registration: Option<Arc<Registration>>,
}

impl Subscription {
    pub(crate) fn registered(
        env: Arc<dyn HostEnvironment>,
        key: GlobalKey,
        listener_id: ListenerId,
        active: Arc<AtomicBool>,
    ) -> Self {
        Self {
            key,
            registration: Some(Arc::new(Registration {
                env,
                listener_id,
                key,
                active,
            })),
        }
    }

    /// A subscription that was never attached to anything: there was no host
    /// environment to listen on.
    pub fn inert(key: GlobalKey) -> Self {
        Self {
            key,
            registration: None,
        }
    }

    pub fn key(&self) -> GlobalKey {
        self.key
    }

    pub fn is_active(&self) -> bool {
        self.disposer().is_active()
    }

    pub fn disposer(&self) -> Disposer {
        Disposer {
            registration: self.registration.clone(),
        }
    }

    pub fn unsubscribe(&self) {
        self.disposer().dispose();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
