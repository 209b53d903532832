use crate::{RouteRecord, RuleConfig, ServiceDescriptor};
use async_trait::async_trait;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures reported by a backing store.
///
/// A missing object is never an error; lookups return `Ok(None)` instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} was modified concurrently")]
    Conflict {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    /// The object has a deletion timestamp and cannot be converged until
    /// it is gone.
    #[error("{kind} {namespace}/{name} is being deleted")]
    Terminating {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("{kind} request failed: {source}")]
    Request {
        kind: &'static str,
        #[source]
        source: BoxError,
    },
}

#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn get_route(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RouteRecord>, StoreError>;

    /// Persists a new route, returning the stored record.
    async fn create_route(&self, route: RouteRecord) -> Result<RouteRecord, StoreError>;

    /// Replaces a stored route. Fails with [`StoreError::Conflict`] if the
    /// record's resource version is stale.
    async fn update_route(&self, route: RouteRecord) -> Result<RouteRecord, StoreError>;

    async fn delete_route(&self, route: &RouteRecord) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ServiceStore: Send + Sync {
    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceDescriptor>, StoreError>;

    async fn list_services(&self) -> Result<Vec<ServiceDescriptor>, StoreError>;
}

#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn get_rule(&self, name: &str) -> Result<Option<RuleConfig>, StoreError>;
}

// === impl StoreError ===

impl StoreError {
    pub fn request(kind: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Request {
            kind,
            source: source.into(),
        }
    }
}
