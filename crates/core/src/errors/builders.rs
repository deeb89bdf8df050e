//! Builder and classification methods for errors

use super::types::Error;

impl Error {
    /// Create an invalid namespace error
    #[must_use]
    pub fn invalid_namespace(namespace: impl Into<String>) -> Self {
        Error::InvalidNamespace {
            namespace: namespace.into(),
        }
    }

    /// Create an invalid credential error
    #[must_use]
    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Error::InvalidCredential {
            message: message.into(),
        }
    }

    /// Create a decode error
    #[must_use]
    pub fn decode(what: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Decode {
            what: what.into(),
            source,
        }
    }

    /// Create an encode error
    #[must_use]
    pub fn encode(what: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Encode {
            what: what.into(),
            source,
        }
    }

    /// Create a restriction narrowing error
    #[must_use]
    pub fn restriction(message: impl Into<String>) -> Self {
        Error::Restriction {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// True for caller-facing "forbidden" outcomes.
    pub fn is_forbidden(&self) -> bool {
        matches!(
            self,
            Error::MissingNamespace
                | Error::InvalidNamespace { .. }
                | Error::MissingCredential
                | Error::InvalidCredential { .. }
        )
    }

    /// True when the permission backend could not answer.
    pub fn is_retrieval(&self) -> bool {
        matches!(self, Error::Retrieval(_))
    }

    /// HTTP-style status for the error.
    pub fn status_code(&self) -> u16 {
        match self {
            e if e.is_forbidden() => 403,
            Error::Retrieval(_) => 502,
            Error::Decode { .. } | Error::Restriction { .. } => 400,
            _ => 500,
        }
    }
}
