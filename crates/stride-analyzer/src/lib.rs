//! This crate provides a call/return analyzer (built on `stride-tracer`).
//!
//! The analyzer runs a traced callable to completion, pairs every return
//! with its call, and writes a human-readable report: a summary of the
//! calls made, then the full call trace with the time spent in each call.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stride_analyzer::{AnalyzeOptions, Analyzer};
//! use stride_probe::Probe;
//! use stride_tracer::binding::Frame;
//! use stride_tracer::event::{Receiver, TypeDescriptor};
//! use stride_tracer::tracer::Tracer;
//!
//! fn main() -> stride_analyzer::Result<()> {
//!     let probe = Probe::new();
//!     let math = Arc::new(TypeDescriptor::new("Math").type_method("add"));
//!
//!     let tracer = Tracer::builder()
//!         .with_source(probe.clone())
//!         .with_target(move || {
//!             let frame = Frame::new();
//!             let _call = probe.enter(&Receiver::of_type(&math), "add", &frame);
//!         })
//!         .build();
//!
//!     let report = Analyzer::new(tracer)
//!         .analyze(&mut std::io::stdout(), &AnalyzeOptions::default())?;
//!
//!     assert_eq!(report.calls, 1);
//!
//!     Ok(())
//! }
//! ```

mod analyzer;
mod error;
mod pairing;
mod printer;

pub use self::analyzer::{AnalyzeOptions, Analyzer, Report};
pub use self::error::{Error, Result};
pub use self::pairing::{TimedEvent, pair_durations};
