//! Test doubles for the authorization capabilities.

use crate::extractor::RestrictionExtractor;
use crate::retriever::{PermissionRetriever, RetrieverOptions};
use async_trait::async_trait;
use nsgate_core::{Error, PermissionMap, Restrictions, Result, RetrievalError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

type Handler = Box<
    dyn Fn(&[String], &str, &RetrieverOptions) -> std::result::Result<PermissionMap, RetrievalError>
        + Send
        + Sync,
>;

/// Arguments of a call made to a [`MockRetriever`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub claims: Vec<String>,
    pub namespace: String,
    pub options: RetrieverOptions,
}

/// Retriever answering with a replaceable closure and counting its calls.
pub struct MockRetriever {
    handler: Mutex<Handler>,
    calls: AtomicUsize,
    last_call: Mutex<Option<RecordedCall>>,
}

impl MockRetriever {
    /// A retriever returning an empty permission map.
    pub fn new() -> Self {
        Self::with_handler(|_, _, _| Ok(PermissionMap::new()))
    }

    /// A retriever always returning `permissions`.
    pub fn granting(permissions: PermissionMap) -> Self {
        Self::with_handler(move |_, _, _| Ok(permissions.clone()))
    }

    /// A retriever always failing with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_handler(move |_, _, _| Err(RetrievalError::msg(&message)))
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&[String], &str, &RetrieverOptions) -> std::result::Result<PermissionMap, RetrievalError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            handler: Mutex::new(Box::new(handler)),
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }

    /// Replace the answering closure.
    pub fn mock_permissions<F>(&self, handler: F)
    where
        F: Fn(&[String], &str, &RetrieverOptions) -> std::result::Result<PermissionMap, RetrievalError>
            + Send
            + Sync
            + 'static,
    {
        *self.handler.lock() = Box::new(handler);
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.last_call.lock().clone()
    }
}

impl Default for MockRetriever {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionRetriever for MockRetriever {
    async fn permissions(
        &self,
        claims: &[String],
        namespace: &str,
        options: &RetrieverOptions,
    ) -> std::result::Result<PermissionMap, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock() = Some(RecordedCall {
            claims: claims.to_vec(),
            namespace: namespace.to_string(),
            options: options.clone(),
        });

        let handler = self.handler.lock();
        (*handler)(claims, namespace, options)
    }
}

/// Extractor returning fixed restrictions, or a fixed failure.
#[derive(Debug, Clone)]
pub struct StaticExtractor {
    outcome: std::result::Result<Restrictions, String>,
}

impl Default for StaticExtractor {
    fn default() -> Self {
        Self::new(Restrictions::default())
    }
}

impl StaticExtractor {
    pub fn new(restrictions: Restrictions) -> Self {
        Self {
            outcome: Ok(restrictions),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
        }
    }
}

impl RestrictionExtractor for StaticExtractor {
    fn restrictions(&self, _credential: &str) -> Result<Restrictions> {
        self.outcome.clone().map_err(Error::invalid_credential)
    }
}
