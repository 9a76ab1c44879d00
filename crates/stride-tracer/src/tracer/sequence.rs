use super::Tracer;
use crate::event::Event;
use crate::source::InstrumentationSource;

/// Iterator draining a tracer, one [resume](Tracer::resume) per item.
///
/// It ends when the trace completes, or right after yielding an error.
pub struct EventSequence<'a, S> {
    tracer: &'a mut Tracer<S>,
    done: bool,
}

impl<S: InstrumentationSource> Iterator for EventSequence<'_, S> {
    type Item = crate::Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.tracer.resume() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: InstrumentationSource> Tracer<S> {
    /// Returns an iterator over the events of the trace.
    ///
    /// The trace is started on the first iteration if it wasn't already.
    pub fn sequence(&mut self) -> EventSequence<'_, S> {
        EventSequence {
            tracer: self,
            done: false,
        }
    }

    /// Runs the trace to completion, returning every event it paused on, in
    /// order.
    ///
    /// # Errors
    ///
    /// Fails as soon as [resume](Self::resume) fails.
    pub fn collect(&mut self) -> crate::Result<Vec<Event>> {
        self.sequence().collect()
    }
}
