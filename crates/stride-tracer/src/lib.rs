//! This crate allows to run a callable under a step tracer: the callable is
//! suspended at chosen execution events, inspected, then resumed.
//!
//! Two main components are provided:
//! - A [Tracer](self::tracer::Tracer), driving the traced callable from the
//!   calling context, one [Event](self::event::Event) at a time.
//! - A trait to implement a custom instrumentation source, responsible for
//!   observing the traced code and reporting its execution steps.
//!
//! # Stepping through traced code
//!
//! This is the main use case of this crate.
//!
//! The traced callable runs in a dedicated execution context. Every event
//! accepted by the pause predicate suspends it, and hands the event over to
//! the caller until the trace is [resumed](self::tracer::Tracer::resume).
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stride_probe::Probe;
//! use stride_tracer::binding::Frame;
//! use stride_tracer::event::{Receiver, TypeDescriptor};
//! use stride_tracer::tracer::Tracer;
//!
//! fn main() -> stride_tracer::Result<()> {
//!     let probe = Probe::new();
//!     let math = Arc::new(TypeDescriptor::new("Math").type_method("add"));
//!
//!     // initialize the tracer
//!     let mut tracer = Tracer::builder()
//!         .with_source(probe.clone())
//!         .with_target(move || {
//!             let frame = Frame::new().with("x", 1).with("y", 2);
//!             let _call = probe.enter(&Receiver::of_type(&math), "add", &frame);
//!             frame.set("sum", 3);
//!         })
//!         .build();
//!
//!     // step through every call and return
//!     while let Some(event) = tracer.resume()? {
//!         println!("{} {:?}", event.kind(), event.signature());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Implementing a custom instrumentation source
//!
//! This is the advanced use case of this crate.
//!
//! The [InstrumentationSource](self::source::InstrumentationSource) trait
//! allows to plug any event producer into the tracer, as long as it reports
//! events synchronously, on the thread executing the traced code.
//!
//! Most of the time, you won't need to go this far. Code instrumented by
//! hand can use the probe provided by `stride-probe`.

/// Module containing the live-state handles carried by events.
pub mod binding;

mod config;
mod error;

/// Module containing the events reported during a trace.
pub mod event;

/// Module containing traits for implementing a custom instrumentation source.
pub mod source;

/// Module implementing the step tracer.
pub mod tracer;

pub use self::config::TraceConfig;
pub use self::error::{BoxError, Error, InternalError, PanicError, PauseError, Result};
