use crate::metrics::ConvergenceMetrics;
use autoingress_controller_core::{
    RouteRecord, RouteSpec, RouteStore, RuleConfig, ServiceDescriptor, StoreError,
};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Applies desired route state to a [`RouteStore`].
///
/// Every operation is idempotent so it may be retried or repeated freely.
pub struct Convergence<S> {
    store: Arc<S>,
    metrics: ConvergenceMetrics,
}

// === impl Convergence ===

impl<S: RouteStore> Convergence<S> {
    pub fn new(store: Arc<S>, metrics: ConvergenceMetrics) -> Self {
        Self { store, metrics }
    }

    /// Ensures a route exists for `service` under `rule` when the service's
    /// name matches one of the rule's prefixes.
    ///
    /// Non-matching services are skipped. Returns false only if a matching
    /// route failed to converge.
    pub async fn ensure_matching(&self, service: &ServiceDescriptor, rule: &RuleConfig) -> bool {
        if !rule.matches(&service.name) {
            trace!(service = %service.id(), rule = %rule.name, "Service does not match rule");
            return true;
        }

        match RouteSpec::build(service, rule) {
            Ok(spec) => self.ensure_route(&spec).await,
            Err(error) => {
                // Retrying cannot help until the service itself changes.
                warn!(%error, rule = %rule.name, "Skipping service");
                true
            }
        }
    }

    /// Drives the stored route toward `spec`.
    ///
    /// A missing route is created with the finalizer already attached. The
    /// stored route is then always updated with the desired spec so that
    /// out-of-band edits and rule changes are reverted. Returns false if any
    /// store call failed or the route is still being deleted; nothing is
    /// written after a failed lookup.
    pub async fn ensure_route(&self, spec: &RouteSpec) -> bool {
        let ok = match self.try_ensure_route(spec).await {
            Ok(()) => true,
            Err(error) => {
                warn!(namespace = %spec.namespace, name = %spec.name, %error, "Failed to converge route");
                false
            }
        };
        self.metrics.ensure(ok);
        ok
    }

    /// Deletes a route after releasing its finalizer.
    ///
    /// A missing route is not an error. If releasing the finalizer or the
    /// delete itself fails, the error is returned.
    pub async fn delete_route(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let res = self.try_delete_route(namespace, name).await;
        if let Err(error) = &res {
            warn!(%namespace, %name, %error, "Failed to delete route");
        }
        self.metrics.delete(res.is_ok());
        res
    }

    async fn try_ensure_route(&self, spec: &RouteSpec) -> Result<(), StoreError> {
        let current = match self.store.get_route(&spec.namespace, &spec.name).await? {
            Some(route) => route,
            None => {
                let mut route = RouteRecord::new(spec.clone());
                route.add_finalizer();
                let created = self.store.create_route(route).await?;
                info!(namespace = %spec.namespace, name = %spec.name, host = %spec.host, "Created route");
                created
            }
        };

        if current.terminating {
            return self.release_terminating(current).await;
        }

        let mut desired = current;
        desired.converge(spec);
        self.store.update_route(desired).await?;
        debug!(namespace = %spec.namespace, name = %spec.name, "Updated route");
        Ok(())
    }

    /// Finalizers cannot be added to an object that is being deleted, so a
    /// terminating route is only released. The caller retries once the
    /// deletion completes.
    async fn release_terminating(&self, mut route: RouteRecord) -> Result<(), StoreError> {
        let namespace = route.namespace().to_string();
        let name = route.name().to_string();
        if route.remove_finalizer() {
            self.store.update_route(route).await?;
            debug!(%namespace, %name, "Released terminating route");
        }
        Err(StoreError::Terminating {
            kind: "route",
            namespace,
            name,
        })
    }

    async fn try_delete_route(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let Some(mut route) = self.store.get_route(namespace, name).await? else {
            debug!(%namespace, %name, "Route already absent");
            return Ok(());
        };

        if route.remove_finalizer() {
            route = self.store.update_route(route).await?;
        }
        self.store.delete_route(&route).await?;
        info!(%namespace, %name, "Deleted route");
        Ok(())
    }
}
