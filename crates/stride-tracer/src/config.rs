use std::collections::BTreeSet;

use crate::event::{EventFilter, EventKind};

/// Configuration of a tracer (KDL format).
///
/// ```kdl
/// events "call" "return"
/// pause-on "call"
/// ```
#[derive(Debug, PartialEq, knus::Decode)]
pub struct TraceConfig {
    /// Kinds of events to report (`*` for all of them).
    ///
    /// Defaults to calls and returns when empty.
    #[knus(child, default, unwrap(arguments))]
    pub events: Vec<String>,

    /// Kinds of events to pause on.
    ///
    /// Defaults to calls and returns when empty.
    #[knus(child, default, unwrap(arguments))]
    pub pause_on: Vec<String>,
}

impl TraceConfig {
    /// Parses a configuration from KDL text.
    ///
    /// `file_name` only shows up in diagnostics.
    pub fn parse(file_name: &str, text: &str) -> Result<Self, knus::Error> {
        knus::parse(file_name, text)
    }

    /// Returns the filter of reported events.
    ///
    /// # Errors
    ///
    /// [Error::InvalidArgument](crate::Error::InvalidArgument) on unknown
    /// kinds.
    pub fn event_filter(&self) -> crate::Result<EventFilter> {
        if self.events.is_empty() {
            return Ok(EventFilter::default());
        }

        EventFilter::from_names(&self.events)
    }

    /// Returns the kinds of events to pause on, if configured.
    ///
    /// # Errors
    ///
    /// [Error::InvalidArgument](crate::Error::InvalidArgument) on unknown
    /// kinds.
    pub fn pause_kinds(&self) -> crate::Result<Option<BTreeSet<EventKind>>> {
        if self.pause_on.is_empty() {
            return Ok(None);
        }

        self.pause_on
            .iter()
            .map(|name| name.parse())
            .collect::<crate::Result<_>>()
            .map(Some)
    }
}
