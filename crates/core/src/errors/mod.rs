//! Error types for nsgate operations

mod builders;
mod conversions;
mod types;

pub use types::{Error, Result, RetrievalError};
