//! This crate provides a manual instrumentation source (to be used with
//! `stride-tracer`).
//!
//! Traced code reports its own execution steps through a [Probe], which
//! forwards them to the tracer currently registered on it.
//!
//! <div class="warning">
//!
//! *A probe only reports events while a tracer registered on it is running.
//! Outside of a trace, every emission is a cheap no-op.*
//!
//! </div>
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use stride_probe::Probe;
//! use stride_tracer::binding::Frame;
//! use stride_tracer::event::{Receiver, TypeDescriptor};
//!
//! fn add(probe: &Probe, math: &Arc<TypeDescriptor>, x: i64, y: i64) -> i64 {
//!     let frame = Frame::new().with("x", x).with("y", y);
//!
//!     // emits a call now, and a return when dropped
//!     let _call = probe.enter(&Receiver::of_type(math), "add", &frame);
//!
//!     frame.set("sum", x + y);
//!     x + y
//! }
//! ```

mod probe;
mod registration;

pub use self::probe::{CallGuard, Probe};
pub use self::registration::ProbeRegistration;
