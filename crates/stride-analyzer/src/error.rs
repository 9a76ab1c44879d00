/// Error type of this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The analyzed trace failed.
    #[error(transparent)]
    Tracer(#[from] stride_tracer::Error),

    /// The report could not be written.
    #[error("failed to write the report")]
    Io(#[from] std::io::Error),
}

/// Result type of this crate.
pub type Result<T> = core::result::Result<T, Error>;
