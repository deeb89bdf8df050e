//! Authorization decisions for namespaced APIs.
//!
//! The [`Authorizer`] answers "may these claims perform this operation on
//! this resource in this namespace". Permission maps come from a
//! [`PermissionRetriever`] and are cached per namespace with a jittered TTL.
//! The cache drops whole namespace subtrees when change notifications arrive
//! on a [`NotificationBus`](nsgate_core::NotificationBus).
//!
//! The [`PushDispatchFilter`](push::PushDispatchFilter) reuses the same
//! decision to select which change events reach long-lived push sessions.

pub mod authorizer;
pub mod bridge;
pub mod config;
pub mod extractor;
pub mod push;
pub mod request;
pub mod retriever;
pub mod testing;

pub use authorizer::{
    Authorizer, AuthorizerBuilder, CheckOptions, DecisionCache, OperationTransformer,
};
pub use bridge::{invalidation_target, ChangeEventBridge};
pub use config::{AuthorizerConfig, AuthorizerConfigBuilder};
pub use extractor::{ClaimsRestrictionExtractor, RestrictionExtractor};
pub use push::{ChangeEvent, EventType, PushDispatchFilter, PushSession, PushedEntity};
pub use request::{ApiRequest, AuthAction};
pub use retriever::{AuthorizationPolicy, PermissionRetriever, PolicyRetriever, RetrieverOptions};
