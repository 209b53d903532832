//! Translates watch updates into controller events.
//!
//! Each index is fed by a `kubert::index` watch driver and forwards the
//! changes it observes to the queue of its kind. Indexes only remember what
//! they need to describe a deletion.

use autoingress_controller_core::{RuleConfig, ServiceDescriptor};
use autoingress_controller_k8s_api::{self as k8s, AutoIngress, Ingress, ResourceExt, Service};
use autoingress_controller_sync::{queue, Event, RouteEvent, RuleEvent, ServiceEvent};
use kubert::index::{ClusterRemoved, NamespacedRemoved};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info_span, warn};


pub type SharedServiceIndex = Arc<RwLock<ServiceIndex>>;
pub type SharedRouteIndex = Arc<RwLock<RouteIndex>>;
pub type SharedRuleIndex = Arc<RwLock<RuleIndex>>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct NsName {
    namespace: String,
    name: String,
}

/// Tracks the last observed state of every service.
pub struct ServiceIndex {
    services: HashMap<NsName, ServiceDescriptor>,
    tx: queue::Sender<Event>,
}

/// Watches generated routes for deletions.
pub struct RouteIndex {
    tx: queue::Sender<Event>,
}

/// Tracks the last observed configuration of every rule.
pub struct RuleIndex {
    rules: HashMap<String, RuleConfig>,
    tx: queue::Sender<RuleEvent>,
}

// === impl ServiceIndex ===

impl ServiceIndex {
    pub fn shared(tx: queue::Sender<Event>) -> SharedServiceIndex {
        Arc::new(RwLock::new(Self {
            services: HashMap::new(),
            tx,
        }))
    }

    fn send(&self, event: ServiceEvent) {
        if !self.tx.send(Event::Service(event)) {
            warn!("Service queue closed");
        }
    }

    /// Records a service, returning the event that describes the change.
    ///
    /// Unchanged services only produce an event when `resync` is set.
    fn observe(&mut self, svc: ServiceDescriptor, resync: bool) -> Option<ServiceEvent> {
        let key = NsName {
            namespace: svc.namespace.clone(),
            name: svc.name.clone(),
        };
        match self.services.insert(key, svc.clone()) {
            None => Some(ServiceEvent::Created(svc)),
            Some(old) if resync || old != svc => Some(ServiceEvent::Updated { old, new: svc }),
            Some(_) => None,
        }
    }

    fn forget(&mut self, namespace: String, name: String) -> Option<ServiceEvent> {
        let svc = self.services.remove(&NsName { namespace, name })?;
        Some(ServiceEvent::Deleted(svc))
    }
}

impl kubert::index::IndexNamespacedResource<Service> for ServiceIndex {
    fn apply(&mut self, svc: Service) {
        let Some(svc) = k8s::service_descriptor(&svc) else {
            return;
        };
        let _span = info_span!("apply", ns = %svc.namespace, name = %svc.name).entered();

        match self.observe(svc, false) {
            Some(event) => self.send(event),
            None => debug!("Service unchanged"),
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        let _span = info_span!("delete", ns = %namespace, %name).entered();

        match self.forget(namespace, name) {
            Some(event) => self.send(event),
            None => debug!("Service was never observed"),
        }
    }

    fn reset(&mut self, services: Vec<Service>, removed: NamespacedRemoved) {
        let _span = info_span!("reset").entered();

        for svc in services.iter().filter_map(k8s::service_descriptor) {
            if let Some(event) = self.observe(svc, true) {
                self.send(event);
            }
        }
        for (namespace, names) in removed {
            for name in names {
                if let Some(event) = self.forget(namespace.clone(), name) {
                    self.send(event);
                }
            }
        }
    }
}

// === impl RouteIndex ===

impl RouteIndex {
    pub fn shared(tx: queue::Sender<Event>) -> SharedRouteIndex {
        Arc::new(RwLock::new(Self { tx }))
    }

    fn send(&self, namespace: String, name: String) {
        let event = Event::Route(RouteEvent::Deleted { namespace, name });
        if !self.tx.send(event) {
            warn!("Route queue closed");
        }
    }
}

impl kubert::index::IndexNamespacedResource<Ingress> for RouteIndex {
    fn apply(&mut self, ingress: Ingress) {
        if ingress.metadata.deletion_timestamp.is_none() {
            return;
        }
        let namespace = ingress.namespace().unwrap_or_default();
        let name = ingress.name_any();
        debug!(ns = %namespace, %name, "Route marked for deletion");
        self.send(namespace, name);
    }

    fn delete(&mut self, namespace: String, name: String) {
        debug!(ns = %namespace, %name, "Route deleted");
        self.send(namespace, name);
    }
}

// === impl RuleIndex ===

impl RuleIndex {
    pub fn shared(tx: queue::Sender<RuleEvent>) -> SharedRuleIndex {
        Arc::new(RwLock::new(Self {
            rules: HashMap::new(),
            tx,
        }))
    }

    fn send(&self, event: RuleEvent) {
        if !self.tx.send(event) {
            warn!("Rule queue closed");
        }
    }
}

impl kubert::index::IndexClusterResource<AutoIngress> for RuleIndex {
    fn apply(&mut self, rule: AutoIngress) {
        let rule = rule.rule_config();
        let name = rule.name.clone();
        debug!(%name, "Rule applied");
        self.rules.insert(name.clone(), rule);
        self.send(RuleEvent::Reconcile(name));
    }

    fn delete(&mut self, name: String) {
        let _span = info_span!("delete", %name).entered();

        match self.rules.remove(&name) {
            Some(rule) => self.send(RuleEvent::Removed(rule)),
            None => warn!("Deleted rule was never observed"),
        }
    }

    fn reset(&mut self, rules: Vec<AutoIngress>, removed: ClusterRemoved) {
        for rule in rules {
            self.apply(rule);
        }
        for name in removed {
            self.delete(name);
        }
    }
}
