//! Conversions into the core error type and tests for error rendering

use super::types::Error;

impl From<std::net::AddrParseError> for Error {
    fn from(err: std::net::AddrParseError) -> Self {
        Error::restriction(format!("invalid address: {err}"))
    }
}
