use std::any::Any;

/// Boxed error, used as the cause of tracer failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The pause predicate failed while evaluating an event.
#[derive(thiserror::Error, Debug)]
#[error("the pause predicate failed")]
pub struct PauseError(#[source] pub BoxError);

impl PauseError {
    /// Returns the error (or panic) raised by the pause predicate.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.0
    }
}

/// The tracer failed while handling an event.
#[derive(thiserror::Error, Debug)]
#[error("the tracer encountered an internal error")]
pub struct InternalError(#[source] pub BoxError);

impl InternalError {
    /// Returns the underlying failure.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.0
    }
}

/// Panic captured inside the execution context.
///
/// The message is the panic payload, when it is a string.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct PanicError(pub String);

impl PanicError {
    pub(crate) fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_owned(),
                Err(_) => "Box<dyn Any>".to_owned(),
            },
        };

        Self(message)
    }
}

/// The execution context went away without signalling the caller.
#[derive(thiserror::Error, Debug)]
#[error("the execution context exited without signalling")]
pub(crate) struct ContextVanished;

/// Error type of this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The pause predicate failed.
    #[error(transparent)]
    Pause(#[from] PauseError),

    /// The tracer itself failed.
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// A trace was started while the previous one is unfinished.
    #[error("a trace is already in progress")]
    InProgress,

    /// The traced callable panicked.
    #[error("the traced callable panicked: {0}")]
    TargetPanicked(String),

    /// An argument failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn internal(cause: impl Into<BoxError>) -> Self {
        Self::Internal(InternalError(cause.into()))
    }
}

/// Result type of this crate.
pub type Result<T> = core::result::Result<T, Error>;
