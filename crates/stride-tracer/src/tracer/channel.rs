//! Rendezvous between the calling context and the execution context.
//!
//! Both directions are zero-capacity channels: a send only completes once
//! the other side receives, so at most one delivery is ever in flight and
//! the execution context cannot run ahead of its caller.

use std::sync::mpsc::{self, Receiver, SyncSender};

use parking_lot::Mutex;

use crate::event::Event;

/// What the execution context hands to the calling context.
pub(crate) enum Delivery {
    /// The trace paused on an event.
    Paused(Event),

    /// The traced callable completed.
    Finished,

    /// The trace failed.
    Failed(crate::Error),
}

/// What the calling context hands to a suspended execution context.
pub(crate) enum Signal {
    Resume,
    Stop,
}

/// The calling context is gone.
pub(crate) struct Disconnected;

/// Creates a fresh rendezvous for one trace.
pub(crate) fn rendezvous() -> (Handoff, Endpoint) {
    let (delivery_tx, delivery_rx) = mpsc::sync_channel(0);
    let (signal_tx, signal_rx) = mpsc::sync_channel(0);

    let handoff = Handoff {
        deliveries: delivery_tx,
        signals: Mutex::new(signal_rx),
    };

    let endpoint = Endpoint {
        deliveries: delivery_rx,
        signals: signal_tx,
    };

    (handoff, endpoint)
}

/// Execution-context side of the rendezvous.
pub(crate) struct Handoff {
    deliveries: SyncSender<Delivery>,
    signals: Mutex<Receiver<Signal>>,
}

impl Handoff {
    /// Blocks until the calling context receives `delivery`.
    pub fn deliver(&self, delivery: Delivery) -> Result<(), Disconnected> {
        self.deliveries.send(delivery).map_err(|_| Disconnected)
    }

    /// Blocks until the calling context resumes or stops the trace.
    ///
    /// A vanished calling context reads as [Signal::Stop].
    pub fn suspend(&self) -> Signal {
        self.signals.lock().recv().unwrap_or(Signal::Stop)
    }
}

/// Calling-context side of the rendezvous.
pub(crate) struct Endpoint {
    deliveries: Receiver<Delivery>,
    signals: SyncSender<Signal>,
}

impl Endpoint {
    /// Blocks until the execution context delivers something.
    ///
    /// Returns `None` if the execution context went away silently.
    pub fn receive(&self) -> Option<Delivery> {
        self.deliveries.recv().ok()
    }

    /// Unblocks the suspended execution context.
    pub fn resume(&self) -> Result<(), Disconnected> {
        self.signals.send(Signal::Resume).map_err(|_| Disconnected)
    }

    /// Asks a suspended execution context to terminate, and retires the
    /// rendezvous.
    pub fn stop(self) {
        // fails if the execution context isn't suspended, in which case
        // dropping the endpoint is enough
        let _ = self.signals.try_send(Signal::Stop);
    }
}
