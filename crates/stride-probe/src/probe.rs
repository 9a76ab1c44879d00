use std::borrow::Cow;
use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;
use stride_tracer::binding::{Binding, Frame};
use stride_tracer::event::{EventFilter, EventKind, Receiver, TypeDescriptor};
use stride_tracer::source::{ContextId, EventCallback, InstrumentationSource, RawEvent};

use crate::registration::{Hook, ProbeRegistration};

/// Manual instrumentation source.
///
/// Cloning a probe is cheap, and every clone reports to the same
/// registration. At most one registration is active at a time: registering
/// a new callback supersedes the previous one.
///
/// Event locations are the ones of the code calling the probe.
#[derive(Clone, Default)]
pub struct Probe {
    shared: Arc<Shared>,
}

#[derive(Default)]
pub(crate) struct Shared {
    pub hook: RwLock<Option<Hook>>,
    generations: AtomicU64,
}

impl Probe {
    /// Creates a probe without registration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports an event of any kind.
    #[track_caller]
    pub fn emit(
        &self,
        kind: EventKind,
        receiver: &Receiver,
        method: Option<&'static str>,
        frame: &Frame,
    ) {
        self.emit_at(Location::caller(), kind, receiver, method, frame.binding());
    }

    /// Reports a call to a function of the traced code.
    #[track_caller]
    pub fn call(&self, receiver: &Receiver, method: &'static str, frame: &Frame) {
        self.emit_at(
            Location::caller(),
            EventKind::Call,
            receiver,
            Some(method),
            frame.binding(),
        );
    }

    /// Reports a return from a function of the traced code.
    #[track_caller]
    pub fn ret(&self, receiver: &Receiver, method: &'static str, frame: &Frame) {
        self.emit_at(
            Location::caller(),
            EventKind::Return,
            receiver,
            Some(method),
            frame.binding(),
        );
    }

    /// Reports a call to a native function.
    #[track_caller]
    pub fn native_call(&self, receiver: &Receiver, method: &'static str, frame: &Frame) {
        self.emit_at(
            Location::caller(),
            EventKind::NativeCall,
            receiver,
            Some(method),
            frame.binding(),
        );
    }

    /// Reports a return from a native function.
    #[track_caller]
    pub fn native_return(&self, receiver: &Receiver, method: &'static str, frame: &Frame) {
        self.emit_at(
            Location::caller(),
            EventKind::NativeReturn,
            receiver,
            Some(method),
            frame.binding(),
        );
    }

    /// Reports that execution reached a new line.
    #[track_caller]
    pub fn line(&self, receiver: &Receiver, frame: &Frame) {
        self.emit_at(
            Location::caller(),
            EventKind::Line,
            receiver,
            None,
            frame.binding(),
        );
    }

    /// Reports the raise of an error within `method`.
    #[track_caller]
    pub fn raise(&self, receiver: &Receiver, method: &'static str, frame: &Frame) {
        self.emit_at(
            Location::caller(),
            EventKind::Raise,
            receiver,
            Some(method),
            frame.binding(),
        );
    }

    /// Reports the opening of a type definition.
    #[track_caller]
    pub fn scope_open(&self, ty: &Arc<TypeDescriptor>) {
        self.emit_at(
            Location::caller(),
            EventKind::ScopeOpen,
            &Receiver::of_type(ty),
            None,
            Binding::detached(),
        );
    }

    /// Reports the closing of a type definition.
    #[track_caller]
    pub fn scope_close(&self, ty: &Arc<TypeDescriptor>) {
        self.emit_at(
            Location::caller(),
            EventKind::ScopeClose,
            &Receiver::of_type(ty),
            None,
            Binding::detached(),
        );
    }

    /// Reports that new code was loaded.
    #[track_caller]
    pub fn code_load(&self, frame: &Frame) {
        self.emit_at(
            Location::caller(),
            EventKind::CodeLoad,
            &Receiver::None,
            None,
            frame.binding(),
        );
    }

    /// Reports a call to a function of the traced code, and returns a guard
    /// reporting the matching return when dropped.
    ///
    /// No return is reported if the guard is dropped while unwinding.
    #[track_caller]
    pub fn enter<'a>(
        &'a self,
        receiver: &Receiver,
        method: &'static str,
        frame: &Frame,
    ) -> CallGuard<'a> {
        let location = Location::caller();
        let binding = frame.binding();

        self.emit_at(
            location,
            EventKind::Call,
            receiver,
            Some(method),
            binding.clone(),
        );

        CallGuard {
            probe: self,
            location,
            receiver: receiver.clone(),
            method,
            binding,
        }
    }

    /// Returns whether an enabled registration currently observes this probe.
    pub fn is_observed(&self) -> bool {
        self.shared
            .hook
            .read()
            .as_ref()
            .is_some_and(|hook| hook.enabled.load(Ordering::Acquire))
    }

    fn emit_at(
        &self,
        location: &'static Location<'static>,
        kind: EventKind,
        receiver: &Receiver,
        method: Option<&'static str>,
        binding: Binding,
    ) {
        // the callback may block, so it must be called without holding the lock
        let Some(callback) = self
            .shared
            .hook
            .read()
            .as_ref()
            .and_then(|hook| hook.accept(kind))
        else {
            return;
        };

        callback(RawEvent {
            kind,
            path: Cow::Borrowed(location.file()),
            line: location.line(),
            receiver: receiver.clone(),
            method: method.map(Cow::Borrowed),
            binding,
            context: ContextId::current(),
        });
    }
}

impl InstrumentationSource for Probe {
    type Registration = ProbeRegistration;

    fn register(&self, filter: EventFilter, callback: EventCallback) -> Self::Registration {
        let generation = self.shared.generations.fetch_add(1, Ordering::AcqRel) + 1;
        let enabled = Arc::new(AtomicBool::new(false));

        let previous = self.shared.hook.write().replace(Hook {
            generation,
            filter,
            callback,
            enabled: Arc::clone(&enabled),
        });

        if let Some(previous) = previous {
            tracing::warn!(
                generation,
                superseded = previous.generation,
                "probe registration superseded, the previous tracer won't receive events anymore"
            );
        } else {
            tracing::debug!(generation, "probe registered");
        }

        ProbeRegistration {
            shared: Arc::clone(&self.shared),
            generation,
            enabled,
        }
    }
}

/// Guard of a call reported by [Probe::enter].
#[must_use = "dropping the guard reports the return right away"]
pub struct CallGuard<'a> {
    probe: &'a Probe,
    location: &'static Location<'static>,
    receiver: Receiver,
    method: &'static str,
    binding: Binding,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }

        self.probe.emit_at(
            self.location,
            EventKind::Return,
            &self.receiver,
            Some(self.method),
            self.binding.clone(),
        );
    }
}
