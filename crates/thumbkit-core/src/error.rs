//! Error type returned by [`Transformer::transform`](crate::Transformer::transform).

use thiserror::Error;

use crate::codec::CodecError;
use crate::metadata::MetadataError;

/// Which end of the transform an open failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Destination,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Source => f.write_str("input"),
            Endpoint::Destination => f.write_str("output"),
        }
    }
}

/// Errors produced by a transform.
#[derive(Debug, Error)]
pub enum Error {
    /// The request itself is malformed or asks for nothing.
    #[error("{0}")]
    InvalidArgument(String),

    /// The source is not one of the accepted formats.
    #[error("unsupported source format: {0}")]
    UnsupportedFormat(String),

    /// The source or destination could not be opened.
    #[error("could not open {endpoint}: {source}")]
    Open {
        endpoint: Endpoint,
        #[source]
        source: CodecError,
    },

    /// A resize, crop or rotate step failed in the codec.
    #[error("{operation} failed: {source}")]
    Transform {
        operation: &'static str,
        #[source]
        source: CodecError,
    },

    /// Reading or writing the orientation tag failed.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Encoding or writing the final image failed.
    #[error("write failed: {0}")]
    Write(#[source] CodecError),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub(crate) fn transform(operation: &'static str) -> impl FnOnce(CodecError) -> Self {
        move |source| Error::Transform { operation, source }
    }

    pub(crate) fn open(endpoint: Endpoint) -> impl FnOnce(CodecError) -> Self {
        move |source| Error::Open { endpoint, source }
    }
}
