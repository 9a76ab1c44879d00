use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use stride_tracer::event::{EventFilter, EventKind};
use stride_tracer::source::EventCallback;

use crate::probe::Shared;

/// Callback currently registered on a probe.
pub(crate) struct Hook {
    pub generation: u64,
    pub filter: EventFilter,
    pub callback: EventCallback,
    pub enabled: Arc<AtomicBool>,
}

impl Hook {
    /// Returns the callback if events of the given kind must reach it.
    pub fn accept(&self, kind: EventKind) -> Option<EventCallback> {
        (self.enabled.load(Ordering::Acquire) && self.filter.matches(kind))
            .then(|| Arc::clone(&self.callback))
    }
}

/// Registration of a callback on a [Probe](crate::Probe).
///
/// Dropping it unregisters the callback, unless a newer registration already
/// superseded it.
pub struct ProbeRegistration {
    pub(crate) shared: Arc<Shared>,
    pub(crate) generation: u64,
    pub(crate) enabled: Arc<AtomicBool>,
}

impl stride_tracer::source::Registration for ProbeRegistration {
    fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl Drop for ProbeRegistration {
    fn drop(&mut self) {
        let mut hook = self.shared.hook.write();

        if hook
            .as_ref()
            .is_some_and(|hook| hook.generation == self.generation)
        {
            *hook = None;
            tracing::debug!(generation = self.generation, "probe unregistered");
        }
    }
}
