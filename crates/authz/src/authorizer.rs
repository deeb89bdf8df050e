//! The authorization decision engine

use crate::config::AuthorizerConfig;
use crate::extractor::{ClaimsRestrictionExtractor, RestrictionExtractor};
use crate::request::{ApiRequest, AuthAction};
use crate::retriever::{PermissionRetriever, RetrieverOptions};
use nsgate_cache::{cache_key, NamespacedCache};
use nsgate_core::{namespace, Error, NotificationBus, PermissionMap, Restrictions, Result, ShutdownSignal};
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Context of an authorization check.
pub type CheckOptions = RetrieverOptions;

/// Decision cache shared between authorizers.
pub type DecisionCache = NamespacedCache<PermissionMap>;

/// Rewrites a request operation into the verb checked against permissions.
pub trait OperationTransformer: Send + Sync {
    fn transform(&self, operation: &str) -> String;
}

impl<F> OperationTransformer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn transform(&self, operation: &str) -> String {
        self(operation)
    }
}

/// Decides whether claims may perform an operation on a resource of a
/// namespace.
///
/// Permission maps are resolved through a [`PermissionRetriever`] and cached
/// per namespace and per decision context. Each cached map lives for the
/// configured base TTL plus a random jitter, which spreads the refresh of
/// entries populated together. Attach the authorizer to a
/// [`NotificationBus`] to drop cached maps when policies change.
pub struct Authorizer {
    retriever: Arc<dyn PermissionRetriever>,
    extractor: Arc<dyn RestrictionExtractor>,
    transformer: Option<Arc<dyn OperationTransformer>>,
    cache: Arc<DecisionCache>,
    config: AuthorizerConfig,
}

impl Authorizer {
    /// Start building an authorizer resolving permissions with `retriever`.
    pub fn builder(retriever: impl PermissionRetriever + 'static) -> AuthorizerBuilder {
        AuthorizerBuilder::new(Arc::new(retriever))
    }

    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    /// The decision cache.
    pub fn cache(&self) -> &Arc<DecisionCache> {
        &self.cache
    }

    /// Start invalidating the cache from the notifications of `bus` until
    /// `shutdown` fires.
    pub fn attach(&self, bus: &dyn NotificationBus, shutdown: ShutdownSignal) -> Vec<JoinHandle<()>> {
        self.cache.start(bus, shutdown)
    }

    /// Restrictions embedded in `credential`.
    pub fn restrictions(&self, credential: &str) -> Result<Restrictions> {
        self.extractor.restrictions(credential)
    }

    /// Returns whether `claims` may perform `operation` on `resource` in
    /// `namespace`.
    ///
    /// Retrieval failures are returned as [`Error::Retrieval`] with the
    /// upstream error untouched, and are never cached.
    pub async fn check_authorization(
        &self,
        claims: &[String],
        operation: &str,
        namespace: &str,
        resource: &str,
        options: &CheckOptions,
    ) -> Result<bool> {
        if self.config.is_ignored(resource) {
            return Ok(true);
        }

        namespace::validate(namespace)?;

        let key = cache_key(claims, &options.source_ip, &options.id, &options.restrictions);

        if let Some(entry) = self.cache.get(namespace, &key) {
            debug!(namespace, resource, operation, "Authorization cache hit");
            return Ok(entry.value().allows(operation, resource));
        }

        debug!(namespace, resource, operation, "Authorization cache miss");

        let permissions = self
            .retriever
            .permissions(claims, namespace, options)
            .await?;

        let allowed = permissions.allows(operation, resource);
        self.cache.set(namespace, &key, permissions, self.jittered_ttl());

        Ok(allowed)
    }

    /// Authorize an inbound API call.
    pub async fn is_authorized(&self, request: &ApiRequest) -> Result<AuthAction> {
        if self.config.is_ignored(&request.resource) {
            return Ok(AuthAction::Ok);
        }

        let credential = request.credential().ok_or(Error::MissingCredential)?;

        let restrictions = self.restrictions(credential).map_err(|e| match e {
            Error::InvalidCredential { .. } => e,
            other => Error::invalid_credential(other.to_string()),
        })?;

        let operation = match &self.transformer {
            Some(transformer) => transformer.transform(&request.operation),
            None => request.operation.clone(),
        };

        let options = CheckOptions::default()
            .with_restrictions(restrictions)
            .with_id(request.object_id.as_str())
            .with_source_ip(request.source_ip.as_str());

        let allowed = self
            .check_authorization(
                &request.claims,
                &operation,
                &request.namespace,
                &request.resource,
                &options,
            )
            .await
            .map_err(|e| {
                warn!(error = %e, resource = %request.resource, "Unable to authorize request");
                e
            })?;

        Ok(AuthAction::from(allowed))
    }

    fn jittered_ttl(&self) -> Duration {
        let jitter_ms = u64::try_from(self.config.cache_ttl_jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.config.cache_ttl;
        }

        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms));
        self.config.cache_ttl.saturating_add(jitter)
    }
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("config", &self.config)
            .field("cached", &self.cache.len())
            .field("transformer", &self.transformer.is_some())
            .finish()
    }
}

/// Builder for [`Authorizer`]
pub struct AuthorizerBuilder {
    retriever: Arc<dyn PermissionRetriever>,
    extractor: Arc<dyn RestrictionExtractor>,
    transformer: Option<Arc<dyn OperationTransformer>>,
    cache: Option<Arc<DecisionCache>>,
    config: AuthorizerConfig,
}

impl AuthorizerBuilder {
    pub fn new(retriever: Arc<dyn PermissionRetriever>) -> Self {
        Self {
            retriever,
            extractor: Arc::new(ClaimsRestrictionExtractor),
            transformer: None,
            cache: None,
            config: AuthorizerConfig::default(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: AuthorizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Extract restrictions with `extractor` instead of reading JWT claims
    #[must_use]
    pub fn extractor(mut self, extractor: impl RestrictionExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    #[must_use]
    pub fn operation_transformer(mut self, transformer: impl OperationTransformer + 'static) -> Self {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    /// Use an existing cache instead of creating one from the configuration
    #[must_use]
    pub fn cache(mut self, cache: Arc<DecisionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<Authorizer> {
        self.config.validate()?;

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(NamespacedCache::new(self.config.cache.clone())));

        Ok(Authorizer {
            retriever: self.retriever,
            extractor: self.extractor,
            transformer: self.transformer,
            cache,
            config: self.config,
        })
    }
}
