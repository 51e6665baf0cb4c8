//! Error types shared by every transform.
//!
//! All errors are terminal for the stream they occur in: nothing in this
//! crate retries or degrades. [`TransformError::kind`] tells the caller
//! which of the two fatal categories an error belongs to.

use thiserror::Error;

use crate::stream::ElementType;

/// Convenience result type used across the crate.
pub type Result<T> = std::result::Result<T, TransformError>;

/// The two fatal error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A precondition was violated before processing began, or a logic
    /// violation was detected mid-stream.
    Configuration,
    /// A configured feature is accepted by the parser but not implemented.
    Unimplemented,
}

/// Error types for transform construction, negotiation and application.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The stream storage kind is not dense.
    #[error("{0} supports only dense input streams")]
    UnsupportedStorage(String),

    /// The stream element type is neither 32-bit nor 64-bit float.
    #[error("Unsupported element type: {0:?}")]
    UnsupportedElementType(ElementType),

    /// Invalid configuration value or unreadable configuration resource.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A sample does not satisfy the shape/type contract of the stream.
    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    /// A sample was applied before stream negotiation.
    #[error("{0} was applied before stream negotiation")]
    NotNegotiated(&'static str),

    /// The requested feature is reserved but not implemented.
    #[error("Not implemented: {0}")]
    Unimplemented(String),

    /// A failure inside one stage of a transform chain.
    #[error("Transform stage {index} ({name}) failed: {source}")]
    Stage {
        index: usize,
        name: &'static str,
        #[source]
        source: Box<TransformError>,
    },
}

impl TransformError {
    /// Build a [`TransformError::InvalidConfig`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Build a [`TransformError::InvalidSample`] value.
    pub fn sample(msg: impl Into<String>) -> Self {
        Self::InvalidSample(msg.into())
    }

    /// Build a [`TransformError::Unimplemented`] value.
    pub fn unimplemented(msg: impl Into<String>) -> Self {
        Self::Unimplemented(msg.into())
    }

    /// Fatal category of this error. Chain stage errors report the kind of
    /// the error they wrap.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unimplemented(_) => ErrorKind::Unimplemented,
            Self::Stage { source, .. } => source.kind(),
            _ => ErrorKind::Configuration,
        }
    }
}
