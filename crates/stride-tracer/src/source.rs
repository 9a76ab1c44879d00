use std::borrow::Cow;
use std::sync::Arc;
use std::thread::ThreadId;

use crate::binding::Binding;
use crate::event::{EventFilter, EventKind, Receiver};

/// Trait implementing the registration logic of an instrumentation source.
///
/// An instrumentation source observes the execution of the traced code and
/// reports each step matching a registration's [filter](EventFilter) to its
/// callback, synchronously, on the thread executing that step.
pub trait InstrumentationSource: Send + Sync + 'static {
    /// Registration returned by this source.
    type Registration: Registration;

    /// Registers a callback for events matching `filter`.
    ///
    /// The returned registration starts **disabled**. Dropping it
    /// unregisters the callback.
    fn register(&self, filter: EventFilter, callback: EventCallback) -> Self::Registration;
}

/// Trait for controlling a callback registered to an instrumentation source.
pub trait Registration: Send + Sync + 'static {
    /// Starts reporting events to the callback.
    fn enable(&self);

    /// Stops reporting events to the callback.
    fn disable(&self);

    /// Returns whether events are reported to the callback.
    fn is_enabled(&self) -> bool;
}

/// Callback receiving raw events from an instrumentation source.
pub type EventCallback = Arc<dyn Fn(RawEvent) + Send + Sync>;

/// Raw event, as reported by an instrumentation source.
#[derive(Debug)]
pub struct RawEvent {
    /// Kind of the event.
    pub kind: EventKind,

    /// Source path where the event occurred.
    pub path: Cow<'static, str>,

    /// Source line where the event occurred.
    pub line: u32,

    /// Receiver at the point of the event.
    pub receiver: Receiver,

    /// Method identifier associated with the event.
    pub method: Option<Cow<'static, str>>,

    /// Live-state handle over the frame where the event occurred.
    pub binding: Binding,

    /// Thread of control on which the event occurred.
    pub context: ContextId,
}

/// Identity of a thread of control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(ThreadId);

impl ContextId {
    /// Returns the identity of the calling thread.
    pub fn current() -> Self {
        Self(std::thread::current().id())
    }
}

impl From<ThreadId> for ContextId {
    fn from(id: ThreadId) -> Self {
        Self(id)
    }
}
