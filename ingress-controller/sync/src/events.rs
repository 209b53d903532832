use crate::{queue::Handle, registry::SharedRegistry, Convergence};
use anyhow::{bail, Result};
use async_trait::async_trait;
use autoingress_controller_core::{
    route_name, service_name_for, split_route_name, RouteStore, RuleConfig, ServiceDescriptor,
    ServiceStore,
};
use std::sync::Arc;
use tracing::{debug, info};

/// A change to one of the watched kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Service(ServiceEvent),
    Route(RouteEvent),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceEvent {
    Created(ServiceDescriptor),
    Updated {
        old: ServiceDescriptor,
        new: ServiceDescriptor,
    },
    Deleted(ServiceDescriptor),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteEvent {
    /// A generated route was deleted or marked for deletion.
    Deleted { namespace: String, name: String },
}

/// Keeps routes in sync with individual service and route changes.
pub struct EventRouter<S> {
    registry: SharedRegistry,
    convergence: Arc<Convergence<S>>,
    store: Arc<S>,
}

// === impl EventRouter ===

impl<S> EventRouter<S>
where
    S: RouteStore + ServiceStore,
{
    pub fn new(registry: SharedRegistry, convergence: Arc<Convergence<S>>, store: Arc<S>) -> Self {
        Self {
            registry,
            convergence,
            store,
        }
    }

    pub async fn service_created(&self, svc: &ServiceDescriptor) -> Result<()> {
        let mut failed = 0;
        for rule in self.registry.snapshot() {
            if !self.convergence.ensure_matching(svc, &rule).await {
                failed += 1;
            }
        }
        check(failed, "route(s) failed to converge")
    }

    /// Re-applies every matching rule to `new`. When the service's identity
    /// changed, routes derived from `old` are deleted first.
    ///
    /// Routes of a service that stopped matching a rule are left in place.
    pub async fn service_updated(
        &self,
        old: &ServiceDescriptor,
        new: &ServiceDescriptor,
    ) -> Result<()> {
        let renamed = !old.same_identity(new);
        let mut failed = 0;
        for rule in self.registry.snapshot() {
            if renamed {
                let name = route_name(&old.name, &rule.name);
                if self.convergence.delete_route(&old.namespace, &name).await.is_err() {
                    failed += 1;
                }
            }
            if !self.convergence.ensure_matching(new, &rule).await {
                failed += 1;
            }
        }
        check(failed, "route operation(s) failed")
    }

    /// Deletes the route the service would have under every registered rule,
    /// whether or not it ever matched.
    pub async fn service_deleted(&self, svc: &ServiceDescriptor) -> Result<()> {
        let mut failed = 0;
        for rule in self.registry.snapshot() {
            let name = route_name(&svc.name, &rule.name);
            if self.convergence.delete_route(&svc.namespace, &name).await.is_err() {
                failed += 1;
            }
        }
        check(failed, "route(s) failed to delete")
    }

    /// Reacts to a generated route going away.
    ///
    /// If the owning service still exists and still matches the rule the
    /// route was derived from, the route is recreated, completing the
    /// finalizer handshake first if the old object is still terminating.
    /// Otherwise the route is deleted again so that its finalizer is
    /// released.
    pub async fn route_deleted(&self, namespace: &str, name: &str) -> Result<()> {
        let owners = self.owners(name);
        if owners.is_empty() {
            debug!(%namespace, %name, "Not a generated route name");
            return Ok(());
        }

        let mut failed = 0;
        for (service_name, rule) in owners {
            let svc = self.store.get_service(namespace, &service_name).await?;
            match (svc, rule) {
                (Some(svc), Some(rule)) if rule.matches(&svc.name) => {
                    if self.is_terminating(namespace, name).await?
                        && self.convergence.delete_route(namespace, name).await.is_err()
                    {
                        failed += 1;
                        continue;
                    }
                    info!(%namespace, %name, "Recreating route");
                    if !self.convergence.ensure_matching(&svc, &rule).await {
                        failed += 1;
                    }
                }
                _ => {
                    if self.convergence.delete_route(namespace, name).await.is_err() {
                        failed += 1;
                    }
                }
            }
        }
        check(failed, "route operation(s) failed")
    }

    /// Resolves the services and rules a route name may have been derived
    /// from. Registered rule names disambiguate names containing the
    /// separator; otherwise the name is split on the first separator.
    fn owners(&self, route: &str) -> Vec<(String, Option<Arc<RuleConfig>>)> {
        let owners = self
            .registry
            .snapshot()
            .into_iter()
            .filter_map(|rule| {
                let svc = service_name_for(route, &rule.name)?.to_string();
                Some((svc, Some(rule)))
            })
            .collect::<Vec<_>>();
        if !owners.is_empty() {
            return owners;
        }

        split_route_name(route)
            .map(|(svc, _)| (svc.to_string(), None))
            .into_iter()
            .collect()
    }

    async fn is_terminating(&self, namespace: &str, name: &str) -> Result<bool> {
        let route = self.store.get_route(namespace, name).await?;
        Ok(route.is_some_and(|r| r.terminating))
    }
}

#[async_trait]
impl<S> Handle<Event> for EventRouter<S>
where
    S: RouteStore + ServiceStore + 'static,
{
    async fn handle(&self, event: &Event) -> Result<()> {
        match event {
            Event::Service(ServiceEvent::Created(svc)) => self.service_created(svc).await,
            Event::Service(ServiceEvent::Updated { old, new }) => {
                self.service_updated(old, new).await
            }
            Event::Service(ServiceEvent::Deleted(svc)) => self.service_deleted(svc).await,
            Event::Route(RouteEvent::Deleted { namespace, name }) => {
                self.route_deleted(namespace, name).await
            }
        }
    }
}

pub(crate) fn check(failed: usize, what: &str) -> Result<()> {
    if failed > 0 {
        bail!("{failed} {what}");
    }
    Ok(())
}
