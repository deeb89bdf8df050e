//! Core domain types, errors and notification plumbing for `nsgate`.
//!
//! This crate holds the building blocks shared by the namespaced cache and the
//! authorization engine:
//!
//! - **`errors`**: the `Error` enum and `Result` alias used by every crate in
//!   the workspace. Forbidden-class errors carry an HTTP-style status.
//! - **`namespace`**: validation and parent/child relations for slash-delimited
//!   namespace paths.
//! - **`types`**: `PermissionMap`, `Restrictions` and CIDR handling.
//! - **`events`**: the `NotificationBus` capability, its in-process
//!   implementation and the subscription task helper.
//! - **`lifecycle`**: explicit shutdown signalling for background tasks.

pub mod constants;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod namespace;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, RetrievalError, Result},
    events::{
        LocalNotificationBus, NotificationBus, NotificationMessage, Publication, Subscription,
    },
    lifecycle::{Shutdown, ShutdownSignal},
    types::{Cidr, PermissionMap, Permissions, Restrictions},
};
