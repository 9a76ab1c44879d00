use std::io::Write;
use std::path::Path;

use console::Style;
use stride_tracer::event::Event;

use crate::analyzer::{AnalyzeOptions, Report};
use crate::pairing::TimedEvent;

pub(crate) struct Printer<'a, W> {
    writer: &'a mut W,
    precision: usize,
    bold: Style,
    underline: Style,
    green: Style,
    blue: Style,
}

impl<'a, W: Write> Printer<'a, W> {
    pub fn new(writer: &'a mut W, options: &AnalyzeOptions) -> Self {
        let style = |style: Style| style.force_styling(options.color);

        Self {
            writer,
            precision: options.precision,
            bold: style(Style::new().bold()),
            underline: style(Style::new().underlined()),
            green: style(Style::new().green()),
            blue: style(Style::new().blue()),
        }
    }

    pub fn print(&mut self, report: &Report) -> std::io::Result<()> {
        self.print_about()?;
        self.print_summary(report)?;
        self.print_trace(report)
    }

    fn print_about(&mut self) -> std::io::Result<()> {
        writeln!(self.writer, "{}", self.bold.apply_to("About"))?;
        writeln!(
            self.writer,
            "This analysis was brought to you by {}.",
            self.bold.apply_to("stride")
        )
    }

    fn print_summary(&mut self, report: &Report) -> std::io::Result<()> {
        let precision = self.precision;

        writeln!(self.writer)?;
        writeln!(self.writer, "{}", self.bold.apply_to("Summary"))?;
        writeln!(
            self.writer,
            "There was a total of {} method call(s).",
            report.calls
        )?;
        writeln!(
            self.writer,
            "{} ({:.2}%) method calls were to native methods.",
            report.native_calls,
            report.native_share()
        )?;
        writeln!(
            self.writer,
            "{} ({:.2}%) method calls were to methods of the traced code.",
            report.host_calls,
            report.host_share()
        )?;
        writeln!(
            self.writer,
            "The trace took {:.precision$}s.",
            report.duration.as_secs_f64()
        )
    }

    fn print_trace(&mut self, report: &Report) -> std::io::Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", self.bold.apply_to("Trace"))?;
        writeln!(
            self.writer,
            "{}{}{}",
            self.underline.apply_to(format!("{:<38}", "Path")),
            self.underline.apply_to(format!("{:<25}", "Event")),
            self.underline.apply_to("Method"),
        )?;

        let mut depth = 0usize;

        for timed in &report.events {
            let event = &timed.event;

            let indent = if event.is_call() {
                depth += 1;
                depth * 2
            } else if event.is_return() {
                let indent = depth * 2;
                depth = depth.saturating_sub(1);
                indent
            } else {
                depth * 2
            };

            self.print_event(timed, indent)?;
        }

        Ok(())
    }

    fn print_event(&mut self, timed: &TimedEvent, indent: usize) -> std::io::Result<()> {
        let event = &timed.event;

        write!(
            self.writer,
            "{:<38}{}{:indent$}{}{}",
            short_location(event),
            self.green.apply_to(format!("{:<25}", event.kind().name())),
            "",
            self.blue.apply_to("-> "),
            event.signature().unwrap_or_default(),
        )?;

        match timed.elapsed {
            Some(elapsed) => writeln!(
                self.writer,
                " ({:.precision$}s)",
                elapsed.as_secs_f64(),
                precision = self.precision
            ),
            None => writeln!(self.writer),
        }
    }
}

/// Returns `dir/file:line`, out of the event's location.
fn short_location(event: &Event) -> String {
    let path = Path::new(event.path());

    let file = path.file_name().map(|name| name.to_string_lossy());
    let dir = path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy());

    match (dir, file) {
        (Some(dir), Some(file)) => format!("{dir}/{file}:{}", event.line()),
        (None, Some(file)) => format!("{file}:{}", event.line()),
        _ => event.location(),
    }
}
