use crate::{events::check, queue::Handle, registry::SharedRegistry, Convergence};
use anyhow::Result;
use async_trait::async_trait;
use autoingress_controller_core::{route_name, RouteStore, RuleConfig, RuleStore, ServiceStore};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleEvent {
    /// A rule was created or updated.
    Reconcile(String),

    /// A rule was deleted. Carries its last observed configuration.
    Removed(RuleConfig),
}

/// Registers rules as they are observed and resyncs every service against
/// them.
pub struct Reconciler<S> {
    registry: SharedRegistry,
    convergence: Arc<Convergence<S>>,
    store: Arc<S>,
}

// === impl Reconciler ===

impl<S> Reconciler<S>
where
    S: RouteStore + ServiceStore + RuleStore,
{
    pub fn new(registry: SharedRegistry, convergence: Arc<Convergence<S>>, store: Arc<S>) -> Self {
        Self {
            registry,
            convergence,
            store,
        }
    }

    /// Fetches the named rule, registers it and resyncs all services against
    /// it.
    ///
    /// Rules without prefixes are never registered. A rule that no longer
    /// exists, or no longer has prefixes, is deregistered without touching
    /// its routes.
    pub async fn reconcile(&self, name: &str) -> Result<()> {
        let rule = match self.store.get_rule(name).await? {
            Some(rule) if !rule.is_inert() => Arc::new(rule),
            rule => {
                if self.registry.remove(name).is_some() {
                    info!(rule = %name, "Deregistered rule");
                }
                if rule.is_some() {
                    debug!(rule = %name, "Rule has no service prefixes");
                } else {
                    debug!(rule = %name, "Rule not found");
                }
                return Ok(());
            }
        };

        let previous = self.registry.upsert(rule.clone());
        info!(rule = %name, prefixes = ?rule.name_prefixes, updated = previous.is_some(), "Registered rule");
        self.resync(&rule, previous.as_deref()).await
    }

    /// Deregisters a deleted rule and deletes the routes of every service it
    /// matches.
    pub async fn remove(&self, rule: &RuleConfig) -> Result<()> {
        if self.registry.remove(&rule.name).is_some() {
            info!(rule = %rule.name, "Deregistered rule");
        }

        let mut failed = 0;
        for svc in self.store.list_services().await? {
            if !rule.matches(&svc.name) {
                continue;
            }
            let name = route_name(&svc.name, &rule.name);
            if self.convergence.delete_route(&svc.namespace, &name).await.is_err() {
                failed += 1;
            }
        }
        check(failed, "route(s) failed to delete")
    }

    /// Evaluates every known service against `rule` only.
    ///
    /// Services that matched `previous` but no longer match have their route
    /// for this rule deleted.
    async fn resync(&self, rule: &RuleConfig, previous: Option<&RuleConfig>) -> Result<()> {
        let services = self.store.list_services().await?;
        debug!(rule = %rule.name, services = services.len(), "Resyncing");

        let mut failed = 0;
        for svc in &services {
            if rule.matches(&svc.name) {
                if !self.convergence.ensure_matching(svc, rule).await {
                    failed += 1;
                }
            } else if previous.is_some_and(|p| p.matches(&svc.name)) {
                let name = route_name(&svc.name, &rule.name);
                if self.convergence.delete_route(&svc.namespace, &name).await.is_err() {
                    failed += 1;
                }
            }
        }
        check(failed, "route operation(s) failed")
    }
}

#[async_trait]
impl<S> Handle<RuleEvent> for Reconciler<S>
where
    S: RouteStore + ServiceStore + RuleStore + 'static,
{
    async fn handle(&self, event: &RuleEvent) -> Result<()> {
        match event {
            RuleEvent::Reconcile(name) => self.reconcile(name).await,
            RuleEvent::Removed(rule) => self.remove(rule).await,
        }
    }
}
