use std::sync::Arc;

use super::pauser::{self, SharedPauser};
use super::{TraceState, Tracer};
use crate::config::TraceConfig;
use crate::error::BoxError;
use crate::event::{Event, EventFilter};
use crate::source::{ContextId, InstrumentationSource};

/// Builder for [Tracer].
///
/// It is usually created by calling [Tracer::builder], and allows to
/// specify which instrumentation source observes which callable, and when
/// to pause it.
pub struct Builder<S> {
    state: S,
}

impl Builder<NeedsSource> {
    pub(super) const fn new() -> Self {
        Self { state: NeedsSource }
    }

    /// Specifies the instrumentation source observing the traced callable.
    pub fn with_source<S: InstrumentationSource>(self, source: S) -> Builder<NeedsTarget<S>> {
        Builder {
            state: NeedsTarget { source },
        }
    }
}

impl<S> Builder<NeedsTarget<S>> {
    /// Specifies the callable to trace.
    ///
    /// It runs once per trace, in the execution context.
    pub fn with_target<F>(self, target: F) -> Builder<Ready<S>>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Builder {
            state: Ready {
                source: self.state.source,
                target: Arc::new(target),
                filter: EventFilter::default(),
                pauser: SharedPauser::default(),
            },
        }
    }
}

impl<S> Builder<Ready<S>> {
    /// Specifies the kinds of events reported by the instrumentation source.
    ///
    /// Defaults to [calls and returns](EventFilter::calls_and_returns).
    pub fn events(mut self, filter: EventFilter) -> Self {
        self.state.filter = filter;
        self
    }

    /// Specifies when to pause the traced callable.
    ///
    /// Defaults to pausing on calls and returns.
    /// See [Tracer::pause_when].
    pub fn pause_when<F>(self, predicate: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + 'static,
    {
        self.state.pauser.replace(pauser::infallible(predicate));
        self
    }

    /// Specifies when to pause the traced callable, with a fallible predicate.
    ///
    /// See [Tracer::try_pause_when].
    pub fn try_pause_when<F, E>(self, predicate: F) -> Self
    where
        F: FnMut(&Event) -> Result<bool, E> + Send + 'static,
        E: Into<BoxError>,
    {
        self.state.pauser.replace(pauser::fallible(predicate));
        self
    }

    /// Applies a tracing configuration.
    ///
    /// # Errors
    ///
    /// [Error::InvalidArgument](crate::Error::InvalidArgument) if the
    /// configuration names unknown event kinds.
    pub fn with_config(self, config: &TraceConfig) -> crate::Result<Self> {
        let mut builder = self.events(config.event_filter()?);

        if let Some(kinds) = config.pause_kinds()? {
            builder = builder.pause_when(move |event| kinds.contains(&event.kind()));
        }

        Ok(builder)
    }
}

impl<S: InstrumentationSource> Builder<Ready<S>> {
    /// Builds the tracer.
    ///
    /// The calling thread is recorded as the tracer's calling context.
    pub fn build(self) -> Tracer<S> {
        let Ready {
            source,
            target,
            filter,
            pauser,
        } = self.state;

        Tracer {
            source: Arc::new(source),
            target,
            filter,
            pauser,
            caller: ContextId::current(),
            state: TraceState::NotStarted,
            trace: None,
            traces: 0,
        }
    }
}

pub struct NeedsSource;

pub struct NeedsTarget<S> {
    source: S,
}

pub struct Ready<S> {
    source: S,
    target: super::Target,
    filter: EventFilter,
    pauser: SharedPauser,
}
