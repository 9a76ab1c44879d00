use std::io::Write;
use std::time::{Duration, Instant};

use stride_tracer::source::InstrumentationSource;
use stride_tracer::tracer::Tracer;

use crate::pairing::{TimedEvent, pair_durations};
use crate::printer::Printer;

/// Options of an analysis report.
#[derive(Clone, Debug)]
pub struct AnalyzeOptions {
    /// Number of decimals of the printed durations.
    pub precision: usize,

    /// Whether the report is colored.
    pub color: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            precision: 4,
            color: true,
        }
    }
}

/// Outcome of an analysis.
#[derive(Debug)]
pub struct Report {
    /// Number of calls, native or not.
    pub calls: usize,

    /// Number of calls to native functions.
    pub native_calls: usize,

    /// Number of calls to functions of the traced code.
    pub host_calls: usize,

    /// Wall-clock duration of the trace.
    pub duration: Duration,

    /// Every call and return of the trace, in order.
    pub events: Vec<TimedEvent>,
}

impl Report {
    fn new(events: Vec<TimedEvent>, duration: Duration) -> Self {
        let native_calls = events
            .iter()
            .filter(|timed| timed.event.is_native_call())
            .count();

        let host_calls = events
            .iter()
            .filter(|timed| timed.event.is_host_call())
            .count();

        Self {
            calls: native_calls + host_calls,
            native_calls,
            host_calls,
            duration,
            events,
        }
    }

    /// Returns the share of calls to native functions, in percent.
    pub fn native_share(&self) -> f64 {
        share(self.native_calls, self.calls)
    }

    /// Returns the share of calls to functions of the traced code, in
    /// percent.
    pub fn host_share(&self) -> f64 {
        share(self.host_calls, self.calls)
    }
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }

    count as f64 * 100.0 / total as f64
}

/// Call/return analyzer.
///
/// It drives a tracer to completion, pausing on every call and return, and
/// reports how the traced callable spent its time.
pub struct Analyzer<S> {
    tracer: Tracer<S>,
}

impl<S: InstrumentationSource> Analyzer<S> {
    /// Creates an analyzer out of a tracer.
    ///
    /// The pause predicate of the tracer is replaced.
    pub fn new(mut tracer: Tracer<S>) -> Self {
        tracer.pause_when(|event| event.is_call() || event.is_return());

        Self { tracer }
    }

    /// Runs a new trace, and writes its report to `writer`.
    ///
    /// # Errors
    ///
    /// Fails if the trace fails, or if the report could not be written.
    #[tracing::instrument(name = "Analyze", skip_all)]
    pub fn analyze(
        &mut self,
        writer: &mut impl Write,
        options: &AnalyzeOptions,
    ) -> crate::Result<Report> {
        // a failed analysis leaves an errored trace behind
        self.tracer.stop();

        let started = Instant::now();
        let events = self.tracer.start().and_then(|first| {
            let mut events = first.into_iter().collect::<Vec<_>>();
            events.extend(self.tracer.collect()?);
            Ok(events)
        })?;
        let duration = started.elapsed();

        tracing::info!(events = events.len(), ?duration, "trace analyzed");

        let report = Report::new(pair_durations(events), duration);

        Printer::new(writer, options).print(&report)?;

        Ok(report)
    }

    /// Returns the underlying tracer.
    pub fn into_inner(self) -> Tracer<S> {
        self.tracer
    }
}
