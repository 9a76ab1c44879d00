use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{BoxError, PanicError, PauseError};
use crate::event::Event;

type PauseFn = Box<dyn FnMut(&Event) -> Result<bool, BoxError> + Send>;

/// Pause predicate, shared between a tracer and its execution context.
///
/// Replacing the predicate takes effect for every evaluation that has not
/// happened yet, including the ones of an in-flight trace.
#[derive(Clone)]
pub(crate) struct SharedPauser(Arc<Mutex<PauseFn>>);

impl SharedPauser {
    pub fn new(predicate: PauseFn) -> Self {
        Self(Arc::new(Mutex::new(predicate)))
    }

    pub fn replace(&self, predicate: PauseFn) {
        *self.0.lock() = predicate;
    }

    /// Evaluates the predicate against `event`.
    ///
    /// An error returned by the predicate, or a panic, becomes a [PauseError].
    pub fn evaluate(&self, event: &Event) -> Result<bool, PauseError> {
        let mut predicate = self.0.lock();

        match panic::catch_unwind(AssertUnwindSafe(|| (&mut **predicate)(event))) {
            Ok(Ok(pause)) => Ok(pause),
            Ok(Err(e)) => Err(PauseError(e)),
            Err(payload) => Err(PauseError(Box::new(PanicError::from_payload(payload)))),
        }
    }
}

impl Default for SharedPauser {
    /// Pauses on calls and returns.
    fn default() -> Self {
        Self::new(Box::new(|event| Ok(event.is_call() || event.is_return())))
    }
}

pub(crate) fn infallible<F>(predicate: F) -> PauseFn
where
    F: Fn(&Event) -> bool + Send + 'static,
{
    Box::new(move |event| Ok(predicate(event)))
}

pub(crate) fn fallible<F, E>(mut predicate: F) -> PauseFn
where
    F: FnMut(&Event) -> Result<bool, E> + Send + 'static,
    E: Into<BoxError>,
{
    Box::new(move |event| predicate(event).map_err(Into::into))
}
