mod kind;
mod receiver;

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

pub use self::kind::{EventFilter, EventKind};
pub use self::receiver::{Receiver, TypeDescriptor};
use crate::binding::Binding;
use crate::source::RawEvent;

/// Snapshot of one intercepted execution step.
#[derive(Clone, Debug)]
pub struct Event {
    kind: EventKind,
    created_at: Duration,
    path: Cow<'static, str>,
    line: u32,
    receiver: Receiver,
    method: Option<Cow<'static, str>>,
    binding: Binding,
}

impl Event {
    /// Wraps a raw event, timestamping it.
    pub(crate) fn from_raw(raw: RawEvent) -> crate::Result<Self> {
        let created_at = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(crate::Error::internal)?;

        Ok(Self {
            kind: raw.kind,
            created_at,
            path: raw.path,
            line: raw.line,
            receiver: raw.receiver,
            method: raw.method,
            binding: raw.binding,
        })
    }

    /// Returns the kind of this event.
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the creation time of this event, since the Unix epoch.
    pub const fn created_at(&self) -> Duration {
        self.created_at
    }

    /// Returns the source path where this event occurred.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the source line where this event occurred.
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Returns `path:line`.
    pub fn location(&self) -> String {
        format!("{}:{}", self.path, self.line)
    }

    /// Returns the receiver at the point of this event.
    pub const fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// Returns the type associated with the receiver of this event.
    pub fn module(&self) -> Option<&Arc<TypeDescriptor>> {
        self.receiver.module()
    }

    /// Returns the method identifier associated with this event.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Returns the live-state handle of the frame where this event occurred.
    ///
    /// See [Binding] for the validity rules of the handle.
    pub const fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Returns whether this event is a call, native or not.
    pub const fn is_call(&self) -> bool {
        self.kind.is_call()
    }

    /// Returns whether this event is a return, native or not.
    pub const fn is_return(&self) -> bool {
        self.kind.is_return()
    }

    /// Returns whether this event is a call to a native function.
    pub fn is_native_call(&self) -> bool {
        self.kind == EventKind::NativeCall
    }

    /// Returns whether this event is a call to a function of the traced code.
    pub fn is_host_call(&self) -> bool {
        self.kind == EventKind::Call
    }

    /// Returns whether this event is a return from a native function.
    pub fn is_native_return(&self) -> bool {
        self.kind == EventKind::NativeReturn
    }

    /// Returns whether this event is a return from a function of the traced code.
    pub fn is_host_return(&self) -> bool {
        self.kind == EventKind::Return
    }

    /// Returns whether this event is the raise of an error.
    pub fn is_raise(&self) -> bool {
        self.kind == EventKind::Raise
    }

    /// Returns whether this event opens a type or namespace definition.
    pub fn is_scope_open(&self) -> bool {
        self.kind == EventKind::ScopeOpen
    }

    /// Best-effort display of the method of this event, e.g. `Planet#echo`
    /// for an instance method or `Math.add` for a type-level one.
    ///
    /// Native functions carry no precise scope information, so their
    /// notation is decided from the method tables of the receiver's type,
    /// falling back on the shape of the receiver.
    pub fn signature(&self) -> Option<String> {
        let method = self.method()?;

        let Some(module) = self.module() else {
            return Some(method.to_owned());
        };

        let instance_notation = if self.kind.is_native() {
            if module.has_instance_method(method) {
                true
            } else if module.has_type_method(method) {
                false
            } else {
                !self.receiver.is_type()
            }
        } else {
            !self.receiver.is_type() && module.has_instance_method(method)
        };

        let sep = if instance_notation { '#' } else { '.' };

        Some(format!("{}{sep}{method}", module.name()))
    }
}
