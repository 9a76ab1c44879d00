use std::time::Duration;

use stride_tracer::event::Event;

/// Event of a trace, along with the time spent in its call when it is a
/// return.
#[derive(Clone, Debug)]
pub struct TimedEvent {
    /// The event.
    pub event: Event,

    /// Time elapsed since the matching call, for returns that have one.
    pub elapsed: Option<Duration>,
}

/// Pairs every return with the most recent unmatched call of the same
/// receiver and method, preserving the order of `events`.
///
/// Returns without a matching call are kept, without duration.
pub fn pair_durations(events: impl IntoIterator<Item = Event>) -> Vec<TimedEvent> {
    // indices of the calls waiting for their return
    let mut open_calls: Vec<usize> = Vec::new();
    let mut timed: Vec<TimedEvent> = Vec::new();

    for event in events {
        let elapsed = if event.is_return() {
            open_calls
                .iter()
                .rposition(|&i| {
                    let call = &timed[i].event;
                    call.receiver() == event.receiver() && call.method() == event.method()
                })
                .map(|pos| {
                    let call = &timed[open_calls.remove(pos)].event;
                    event.created_at().saturating_sub(call.created_at())
                })
        } else {
            None
        };

        if event.is_call() {
            open_calls.push(timed.len());
        }

        timed.push(TimedEvent { event, elapsed });
    }

    timed
}
