//! Core error type definitions

use crate::constants::AUTHORIZER_COMPONENT;
use std::fmt;

/// Result type alias for nsgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for nsgate operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request carried no namespace
    #[error("error 403 ({}): Forbidden: missing namespace", AUTHORIZER_COMPONENT)]
    MissingNamespace,

    /// The namespace does not start with `/`
    #[error(
        "error 403 ({}): Forbidden: invalid namespace '{namespace}': a namespace must start with /",
        AUTHORIZER_COMPONENT
    )]
    InvalidNamespace { namespace: String },

    /// No credential was presented
    #[error("error 403 ({}): Forbidden: missing token", AUTHORIZER_COMPONENT)]
    MissingCredential,

    /// Restrictions could not be extracted from the credential
    #[error("error 403 ({}): Forbidden: invalid token: {message}", AUTHORIZER_COMPONENT)]
    InvalidCredential { message: String },

    /// The permission backend failed. Rendered exactly as the upstream error.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// A payload could not be decoded
    #[error("unable to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// A payload could not be encoded
    #[error("unable to encode {what}: {source}")]
    Encode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// Restriction narrowing was refused
    #[error("invalid restrictions: {message}")]
    Restriction { message: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

/// Opaque error returned by a permission retriever.
///
/// It is carried through the authorizer untouched, so callers see the
/// upstream message verbatim and can tell a backend outage from a denial.
pub struct RetrievalError(Box<dyn std::error::Error + Send + Sync>);

impl RetrievalError {
    /// Wrap any upstream error.
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }

    /// Build a retrieval error from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(message.to_string().into())
    }
}

impl fmt::Debug for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for RetrievalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}
