use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Locals = Mutex<BTreeMap<String, Value>>;

/// Value of a variable within an instrumented frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absence of value.
    #[default]
    Nil,

    /// Boolean value.
    Bool(bool),

    /// Integer value.
    Int(i64),

    /// Floating-point value.
    Float(f64),

    /// String value.
    Str(String),
}

impl Value {
    /// Returns the integer held by this value, if any.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float held by this value, if any.
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean held by this value, if any.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string held by this value, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Returns whether this value is [Value::Nil].
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Nil
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Variables of an instrumented frame.
///
/// A frame is owned by the traced code. Events emitted from the frame carry
/// a [Binding] to it, through which the tracer's caller reads and writes
/// the variables while the traced code is paused.
#[derive(Debug, Default)]
pub struct Frame {
    locals: Arc<Locals>,
}

impl Frame {
    /// Creates a frame without variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a variable, consuming and returning the frame.
    pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Defines or overwrites a variable.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.locals.lock().insert(name.into(), value.into());
    }

    /// Returns the current value of a variable.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.locals.lock().get(name).cloned()
    }

    /// Returns a live-state handle over this frame.
    pub fn binding(&self) -> Binding {
        Binding {
            locals: Arc::downgrade(&self.locals),
        }
    }
}

/// Live-state handle over the frame where an event occurred.
///
/// The handle never owns the frame. It is only meaningful while the
/// execution context is suspended on the event that carried it: once the
/// trace is resumed, the traced code may modify or drop the frame, and what
/// the handle then observes is unspecified. Using a binding after resuming
/// is a contract violation.
#[derive(Clone, Debug, Default)]
pub struct Binding {
    locals: Weak<Locals>,
}

impl Binding {
    /// Creates a binding attached to no frame.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Returns whether the frame behind this binding still exists.
    pub fn is_live(&self) -> bool {
        self.locals.strong_count() > 0
    }

    /// Reads a variable of the frame.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.locals.upgrade()?.lock().get(name).cloned()
    }

    /// Writes a variable of the frame.
    ///
    /// Returns `false` when the frame no longer exists.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        let Some(locals) = self.locals.upgrade() else {
            return false;
        };

        locals.lock().insert(name.into(), value.into());
        true
    }

    /// Returns the names of the variables defined in the frame.
    pub fn local_names(&self) -> Vec<String> {
        self.locals
            .upgrade()
            .map(|locals| locals.lock().keys().cloned().collect())
            .unwrap_or_default()
    }
}
