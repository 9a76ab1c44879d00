use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use super::Target;
use super::channel::{self, Delivery, Endpoint, Handoff, Signal};
use super::pauser::SharedPauser;
use crate::error::PanicError;
use crate::event::{Event, EventFilter};
use crate::source::{ContextId, EventCallback, InstrumentationSource, RawEvent, Registration};

/// Everything an execution context needs to run one trace.
pub(crate) struct TraceJob {
    pub id: u64,
    pub target: Target,
    pub filter: EventFilter,
    pub pauser: SharedPauser,
    pub caller: ContextId,
}

/// Unwind payload terminating an execution context.
struct TraceExit;

/// Dedicated thread running the traced callable.
pub(crate) struct ExecutionContext {
    id: ContextId,
    thread: JoinHandle<()>,
}

impl ExecutionContext {
    /// Spawns the execution context of a new trace.
    ///
    /// The traced callable starts running right away, and the first
    /// delivery is waiting on the returned endpoint.
    pub fn spawn<S: InstrumentationSource>(
        source: Arc<S>,
        job: TraceJob,
    ) -> crate::Result<(Self, Endpoint)> {
        let (handoff, endpoint) = channel::rendezvous();

        let thread = std::thread::Builder::new()
            .name(format!("stride-trace-{}", job.id))
            .spawn(move || run(&*source, job, handoff))
            .map_err(crate::Error::internal)?;

        let id = thread.thread().id().into();

        Ok((Self { id, thread }, endpoint))
    }

    /// Returns the identity of this execution context.
    pub const fn id(&self) -> ContextId {
        self.id
    }

    /// Waits for the thread to exit.
    pub fn join(self) {
        if self.thread.join().is_err() {
            tracing::warn!(context = ?self.id, "execution context panicked while exiting");
        }
    }
}

fn run<S: InstrumentationSource>(source: &S, job: TraceJob, handoff: Handoff) {
    let span = tracing::info_span!("ExecutionContext", trace = job.id);
    let _guard = span.enter();

    let dispatcher = Arc::new(Dispatcher {
        context: ContextId::current(),
        caller: job.caller,
        pauser: job.pauser,
        handoff,
        handling: AtomicBool::new(false),
        terminated: AtomicBool::new(false),
    });

    let callback: EventCallback = {
        let dispatcher = Arc::clone(&dispatcher);
        Arc::new(move |raw: RawEvent| dispatcher.dispatch(raw))
    };

    let registration = panic::catch_unwind(AssertUnwindSafe(|| {
        let registration = source.register(job.filter, callback);
        registration.enable();
        registration
    }));

    let registration = match registration {
        Ok(registration) => registration,
        Err(payload) => {
            let error = PanicError::from_payload(payload);
            tracing::warn!(%error, "failed to enable instrumentation");
            dispatcher.finish(Delivery::Failed(crate::Error::internal(error)));
            return;
        }
    };

    tracing::debug!("instrumentation enabled");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| (job.target)()));

    registration.disable();
    tracing::debug!("instrumentation disabled");

    match outcome {
        Ok(()) => {
            tracing::info!("traced callable completed");
            dispatcher.finish(Delivery::Finished);
        }
        Err(payload) if payload.is::<TraceExit>() => {
            tracing::info!("execution context terminated");
        }
        Err(payload) => {
            let PanicError(reason) = PanicError::from_payload(payload);
            tracing::warn!(%reason, "traced callable panicked");

            // no-op if the trace was terminated while the panic unwound
            dispatcher.finish(Delivery::Failed(crate::Error::TargetPanicked(reason)));
        }
    }
}

/// Receives the raw events of one trace, on behalf of its execution context.
struct Dispatcher {
    /// Identity of the execution context.
    context: ContextId,

    /// Identity of the calling context, to which failures are delivered.
    caller: ContextId,

    pauser: SharedPauser,
    handoff: Handoff,

    /// Set while an event is being handled, so that events produced by the
    /// handling itself (e.g., by the pause predicate) are suppressed.
    handling: AtomicBool,

    /// Set once the trace is over, successfully or not.
    terminated: AtomicBool,
}

impl Dispatcher {
    fn dispatch(&self, raw: RawEvent) {
        if raw.context != self.context {
            tracing::trace!(kind = %raw.kind, "suppressed event from foreign context");
            return;
        }

        if self.terminated.load(Ordering::Acquire) {
            // the traced code caught the termination, it fires again
            if !std::thread::panicking() {
                tracing::debug!(kind = %raw.kind, "termination was caught, unwinding again");
                panic::resume_unwind(Box::new(TraceExit));
            }

            return;
        }

        if self.handling.swap(true, Ordering::AcqRel) {
            tracing::trace!(kind = %raw.kind, "suppressed event from the tracer");
            return;
        }

        let _handling = HandlingGuard(&self.handling);

        let verdict = panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(raw)))
            .unwrap_or_else(|payload| {
                Err(crate::Error::internal(PanicError::from_payload(payload)))
            });

        match verdict {
            Ok(Some(event)) => self.pause(event),
            Ok(None) => (),
            Err(e) => self.fail(e),
        }
    }

    fn evaluate(&self, raw: RawEvent) -> crate::Result<Option<Event>> {
        let event = Event::from_raw(raw)?;

        let pause = self.pauser.evaluate(&event)?;

        Ok(pause.then_some(event))
    }

    fn pause(&self, event: Event) {
        tracing::debug!(
            kind = %event.kind(),
            location = %event.location(),
            method = event.method(),
            "pausing"
        );

        if self.handoff.deliver(Delivery::Paused(event)).is_err() {
            self.terminate();
            return;
        }

        match self.handoff.suspend() {
            Signal::Resume => tracing::trace!("resumed"),
            Signal::Stop => {
                tracing::info!("stop requested");
                self.terminate();
            }
        }
    }

    fn fail(&self, error: crate::Error) {
        tracing::warn!(%error, caller = ?self.caller, "trace failed");

        self.terminated.store(true, Ordering::Release);
        let _ = self.handoff.deliver(Delivery::Failed(error));

        self.terminate()
    }

    fn finish(&self, delivery: Delivery) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }

        let _ = self.handoff.deliver(delivery);
    }

    /// Unwinds the execution context from its current point.
    ///
    /// If the execution context is already unwinding (e.g., the event came
    /// from a destructor of the panicking traced code), this only marks the
    /// trace as terminated, and lets the ongoing unwind complete.
    fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);

        if !std::thread::panicking() {
            panic::resume_unwind(Box::new(TraceExit))
        }
    }
}

struct HandlingGuard<'a>(&'a AtomicBool);

impl Drop for HandlingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
