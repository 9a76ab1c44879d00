mod builder;
mod channel;
mod context;
mod pauser;
mod sequence;

use std::sync::Arc;

pub use self::builder::Builder;
use self::builder::NeedsSource;
use self::channel::{Delivery, Endpoint};
use self::context::{ExecutionContext, TraceJob};
use self::pauser::SharedPauser;
pub use self::sequence::EventSequence;
use crate::error::{BoxError, ContextVanished};
use crate::event::{Event, EventFilter};
use crate::source::{ContextId, InstrumentationSource};

/// Traced callable. It is run once per trace.
pub(crate) type Target = Arc<dyn Fn() + Send + Sync>;

/// Lifecycle state of a [Tracer].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceState {
    /// No trace was started yet.
    NotStarted,

    /// The traced callable is running.
    Running,

    /// The traced callable is suspended on an event.
    Paused,

    /// The last trace completed (or was stopped).
    Finished,

    /// The last trace failed.
    Errored,
}

impl TraceState {
    /// Returns whether a trace is unfinished.
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

/// Step tracer.
///
/// The tracer runs its target callable in a dedicated execution context,
/// and suspends it on every event accepted by the pause predicate, until
/// [resumed](Self::resume).
///
/// Every driving operation takes `&mut self`: a tracer is driven by a single
/// calling context at a time.
pub struct Tracer<S> {
    /// Instrumentation source observing the traced callable.
    source: Arc<S>,

    /// Callable run by every trace.
    target: Target,

    /// Kinds of events reported by the instrumentation source.
    filter: EventFilter,

    /// Pause predicate, shared with the running execution context.
    pauser: SharedPauser,

    /// Calling context, captured when the tracer is built.
    caller: ContextId,

    /// Lifecycle state of the last trace.
    state: TraceState,

    /// Resources of the current trace, if any.
    trace: Option<ActiveTrace>,

    /// Number of traces started so far, which also identifies the current
    /// one (in logs and thread names).
    traces: u64,
}

impl Tracer<()> {
    /// Creates a tracer builder.
    pub const fn builder() -> Builder<NeedsSource> {
        Builder::new()
    }
}

impl<S: InstrumentationSource> Tracer<S> {
    /// Starts a new trace.
    ///
    /// Blocks until the traced callable pauses on its first event (which is
    /// returned), or completes without pausing (`None` is returned).
    ///
    /// The trace registers a callback on the instrumentation source. If the
    /// source supports a single registration at a time (like
    /// `stride_probe::Probe`), starting a trace supersedes the one of any
    /// other tracer sharing that source, which then misses its remaining
    /// events.
    ///
    /// # Errors
    ///
    /// - [Error::InProgress](crate::Error::InProgress) if the previous trace
    ///   is unfinished. The previous trace is left untouched.
    /// - [Error::Pause](crate::Error::Pause) if the pause predicate failed.
    /// - [Error::Internal](crate::Error::Internal) if the tracer failed.
    /// - [Error::TargetPanicked](crate::Error::TargetPanicked) if the traced
    ///   callable panicked.
    #[tracing::instrument(name = "Start", skip(self), fields(trace = self.traces + 1))]
    pub fn start(&mut self) -> crate::Result<Option<Event>> {
        if self.state.is_in_progress() {
            return Err(crate::Error::InProgress);
        }

        // leftover of a failed trace
        self.trace = None;

        self.traces += 1;

        let job = TraceJob {
            id: self.traces,
            target: Arc::clone(&self.target),
            filter: self.filter.clone(),
            pauser: self.pauser.clone(),
            caller: self.caller,
        };

        let (context, endpoint) = ExecutionContext::spawn(Arc::clone(&self.source), job)?;

        tracing::info!(context = ?context.id(), "execution context spawned");

        self.trace = Some(ActiveTrace {
            context: Some(context),
            endpoint: Some(endpoint),
        });
        self.state = TraceState::Running;

        self.wait()
    }

    /// Resumes the paused trace.
    ///
    /// Blocks until the traced callable pauses on its next event (which is
    /// returned), or completes (`None` is returned).
    ///
    /// If no trace was started yet, one is [started](Self::start). If the
    /// last trace is finished or failed, `None` is returned.
    ///
    /// # Errors
    ///
    /// Same as [start](Self::start).
    #[tracing::instrument(name = "Resume", skip(self), fields(trace = self.traces))]
    pub fn resume(&mut self) -> crate::Result<Option<Event>> {
        match self.state {
            TraceState::NotStarted => self.start(),
            TraceState::Running => Err(crate::Error::InProgress),
            TraceState::Paused => {
                let resumed = self
                    .trace
                    .as_ref()
                    .and_then(|trace| trace.endpoint.as_ref())
                    .map(Endpoint::resume);

                match resumed {
                    Some(Ok(())) => {
                        self.state = TraceState::Running;
                        self.wait()
                    }
                    _ => Err(self.vanished()),
                }
            }
            TraceState::Finished | TraceState::Errored => Ok(None),
        }
    }

    /// Forcibly terminates the current trace, if any.
    ///
    /// A paused execution context is unwound from its suspension point: no
    /// more traced code runs, although destructors of the traced code's
    /// locals do. The thread of the execution context is joined.
    ///
    /// If the traced code catches the unwind, it is unwound again at its next
    /// instrumented step. Traced code catching the unwind, then running
    /// without reaching any instrumented step, can't be stopped: this call
    /// blocks until it completes.
    ///
    /// This is a no-op if no trace was started, or if the last one finished.
    #[tracing::instrument(name = "Stop", skip(self), fields(trace = self.traces))]
    pub fn stop(&mut self) {
        let Some(trace) = self.trace.take() else {
            return;
        };

        drop(trace);

        if self.state.is_in_progress() {
            self.state = TraceState::Finished;
        }

        tracing::info!(state = ?self.state, "trace stopped");
    }

    fn wait(&mut self) -> crate::Result<Option<Event>> {
        let delivery = self
            .trace
            .as_ref()
            .and_then(|trace| trace.endpoint.as_ref())
            .and_then(Endpoint::receive);

        match delivery {
            Some(Delivery::Paused(event)) => {
                self.state = TraceState::Paused;
                Ok(Some(event))
            }
            Some(Delivery::Finished) => {
                self.state = TraceState::Finished;
                self.trace = None;

                tracing::info!("trace finished");
                Ok(None)
            }
            Some(Delivery::Failed(e)) => {
                self.retire_endpoint();
                self.state = TraceState::Errored;
                Err(e)
            }
            None => Err(self.vanished()),
        }
    }

    fn vanished(&mut self) -> crate::Error {
        self.retire_endpoint();
        self.state = TraceState::Errored;
        crate::Error::internal(ContextVanished)
    }

    /// Retires the rendezvous of a failed trace, without joining its
    /// execution context.
    fn retire_endpoint(&mut self) {
        if let Some(endpoint) = self.trace.as_mut().and_then(|trace| trace.endpoint.take()) {
            endpoint.stop();
        }
    }
}

impl<S> Tracer<S> {
    /// Replaces the pause predicate.
    ///
    /// The predicate is evaluated inside the execution context, once per
    /// event reported by the instrumentation source. Returning `true`
    /// suspends the traced callable on the event.
    ///
    /// The new predicate applies to every evaluation that has not happened
    /// yet, including the ones of a paused trace.
    pub fn pause_when<F>(&mut self, predicate: F)
    where
        F: Fn(&Event) -> bool + Send + 'static,
    {
        self.pauser.replace(pauser::infallible(predicate));
    }

    /// Replaces the pause predicate with a fallible one.
    ///
    /// An error returned by the predicate fails the trace with
    /// [Error::Pause](crate::Error::Pause).
    pub fn try_pause_when<F, E>(&mut self, predicate: F)
    where
        F: FnMut(&Event) -> Result<bool, E> + Send + 'static,
        E: Into<BoxError>,
    {
        self.pauser.replace(pauser::fallible(predicate));
    }

    /// Returns the kinds of events reported during a trace.
    pub const fn events(&self) -> &EventFilter {
        &self.filter
    }

    /// Replaces the kinds of events reported, starting from the next trace.
    pub fn set_events(&mut self, filter: EventFilter) {
        self.filter = filter;
    }

    /// Returns the lifecycle state of this tracer.
    pub const fn state(&self) -> TraceState {
        self.state
    }

    /// Returns whether a trace was ever started.
    pub fn is_started(&self) -> bool {
        self.state != TraceState::NotStarted
    }

    /// Returns whether the traced callable is running.
    pub fn is_running(&self) -> bool {
        self.state == TraceState::Running
    }

    /// Returns whether the traced callable is paused on an event.
    pub fn is_sleeping(&self) -> bool {
        self.state == TraceState::Paused
    }

    /// Returns whether the last trace is finished.
    pub fn is_finished(&self) -> bool {
        self.state == TraceState::Finished
    }

    /// Returns whether the last trace failed.
    pub fn is_errored(&self) -> bool {
        self.state == TraceState::Errored
    }
}

/// Resources of one trace.
///
/// Dropping it stops the execution context and joins its thread.
struct ActiveTrace {
    context: Option<ExecutionContext>,
    endpoint: Option<Endpoint>,
}

impl Drop for ActiveTrace {
    fn drop(&mut self) {
        if let Some(endpoint) = self.endpoint.take() {
            endpoint.stop();
        }

        if let Some(context) = self.context.take() {
            context.join();
        }
    }
}
